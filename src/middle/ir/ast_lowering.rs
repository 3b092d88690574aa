use std::{cmp::Ordering, collections::BTreeMap};

use hashbrown::HashMap;
use tracing::{debug, trace};

use crate::{
    frontend::ast::{
        Ast, BinaryOperator, Declaration, Expression, FunctionDeclaration, Statement, TypeSpec,
        VariableDeclaration,
    },
    index::Index,
    middle::{
        ir::{
            self, Block, BlockId, Instruction, IrGenError, Opcode, Operand, OperandKind, Ssa, Type,
        },
        primitive::{self, PrimitiveKind},
        sema,
    },
};

/// Lowers a checked AST. Globals become objects with a folded constant value
/// and functions become verified block lists.
pub fn lower_to_ir(ast: &Ast) -> Result<ir::Module, IrGenError> {
    let mut module = ir::Module::default();
    let mut globals = HashMap::new();

    for declaration in &ast.declarations {
        match declaration {
            Declaration::Variable(variable) => {
                module.objects.push(lower_global(variable)?);
                globals.insert(variable.name.clone(), variable.ty.clone());
            }
            Declaration::Function(function) => {
                let function = BodyLoweringContext::lower_function(function, &globals)?;
                function.verify()?;

                debug!(
                    "lowered `{}` into {} blocks",
                    function.name,
                    function.blocks.len()
                );

                module.functions.push(function);
            }
            Declaration::Class(_) => {
                return Err(IrGenError::Unsupported {
                    construct: "Class declarations",
                });
            }
            Declaration::Parameter(_) => {
                return Err(IrGenError::Unsupported {
                    construct: "Parameters outside of a function",
                });
            }
        }
    }

    Ok(module)
}

pub fn lower_type(ty: &TypeSpec) -> Result<Type, IrGenError> {
    if ty.is_pointer() {
        return Ok(Type::pointer());
    }

    match ty.as_primitive() {
        Some(kind) => Ok(kind.into()),
        None => Err(IrGenError::UnsupportedType { ty: ty.to_string() }),
    }
}

fn literal_operand(value: i128) -> Result<Operand, IrGenError> {
    primitive::literal_type(value)
        .and_then(|kind| Operand::constant(kind, value))
        .ok_or(IrGenError::Unsupported {
            construct: "Integer literals wider than 64 bits",
        })
}

fn bit_size(ty: &TypeSpec) -> Option<u32> {
    ty.as_primitive().and_then(|kind| kind.bit_size())
}

fn lower_global(variable: &VariableDeclaration) -> Result<ir::Object, IrGenError> {
    let non_constant = || IrGenError::NonConstantGlobal {
        name: variable.name.clone(),
    };

    let ty = lower_type(&variable.ty)?;

    let value = variable.value.as_ref().ok_or_else(non_constant)?;
    let (value, _) = fold_constant(value).ok_or_else(non_constant)?;

    let constant = variable
        .ty
        .as_primitive()
        .and_then(|kind| Operand::constant(kind, value))
        .ok_or_else(|| IrGenError::UnsupportedType {
            ty: variable.ty.to_string(),
        })?;

    trace!("global `{}` folded to {value}", variable.name);

    Ok(ir::Object {
        name: variable.name.clone(),
        value: Operand::new(ty.clone(), constant.kind),
        ty,
    })
}

/// Evaluates a constant expression, wrapping at each node's width
fn fold_constant(expression: &Expression) -> Option<(i128, PrimitiveKind)> {
    match expression {
        Expression::NumericLiteral(value) => Some((*value, primitive::literal_type(*value)?)),
        Expression::Cast { expression, ty } => {
            let (value, _) = fold_constant(expression)?;
            let kind = ty.as_primitive()?;

            Some((kind.wrap(value), kind))
        }
        Expression::Binary { lhs, operator, rhs } => {
            let (lhs, lhs_kind) = fold_constant(lhs)?;
            let (rhs, rhs_kind) = fold_constant(rhs)?;
            let kind = primitive::biggest_type(lhs_kind, rhs_kind)?;

            let value = match operator {
                BinaryOperator::Add => lhs.wrapping_add(rhs),
                BinaryOperator::Multiply => lhs.wrapping_mul(rhs),
                BinaryOperator::Subtract | BinaryOperator::Modulus | BinaryOperator::Equals => {
                    return None;
                }
            };

            Some((kind.wrap(value), kind))
        }
        Expression::LvalueToRvalue(_)
        | Expression::MemberAccess { .. }
        | Expression::Assignment { .. }
        | Expression::FunctionCall { .. }
        | Expression::Unary { .. }
        | Expression::StringLiteral(_)
        | Expression::IdentifierLiteral(_) => None,
    }
}

#[derive(Debug, Clone)]
struct Binding {
    /// Pointer to the value
    slot: Ssa,
    ty: TypeSpec,
}

struct BodyLoweringContext<'a> {
    globals: &'a HashMap<String, TypeSpec>,
    function: ir::Function,

    /// Innermost last, parameters live in the first one
    scopes: Vec<HashMap<String, Binding>>,

    next_ssa: Ssa,
    next_block: BlockId,

    /// Block receiving instructions, if one is open
    current: Option<Block>,
    /// Label for the next block to be opened, if something already branches
    /// to it
    pending: Option<BlockId>,
}

impl<'a> BodyLoweringContext<'a> {
    fn lower_function(
        declaration: &FunctionDeclaration,
        globals: &'a HashMap<String, TypeSpec>,
    ) -> Result<ir::Function, IrGenError> {
        let mut arguments = Vec::new();
        let mut parameters = HashMap::new();
        let mut locals = BTreeMap::new();

        for (i, parameter) in declaration.parameters.iter().enumerate() {
            let ssa = Ssa::new(i);

            arguments.push((lower_type(&parameter.ty)?, ssa));
            locals.insert(parameter.name.clone(), ssa);
            parameters.insert(
                parameter.name.clone(),
                Binding {
                    slot: ssa,
                    ty: parameter.ty.clone(),
                },
            );
        }

        let mut context = Self {
            globals,
            function: ir::Function {
                name: declaration.name.clone(),
                return_type: lower_type(&declaration.return_type)?,
                arguments,
                locals,
                prologue: Vec::new(),
                blocks: Vec::new(),
            },
            scopes: vec![parameters],
            next_ssa: Ssa::new(declaration.parameters.len()),
            next_block: BlockId::ZERO,
            current: None,
            pending: None,
        };

        let entry = context.create_label();
        context.pending = Some(entry);

        match &declaration.body {
            Statement::Compound(statements) => context.lower_block(statements)?,
            statement => context.lower_statement(statement)?,
        }

        context.finish(entry)
    }

    fn finish(mut self, entry: BlockId) -> Result<ir::Function, IrGenError> {
        if let Some(block) = self.current.take() {
            return Err(IrGenError::UnterminatedBlock {
                function: self.function.name,
                block: block.id,
            });
        }

        self.function.prologue.push(Instruction::branch(entry));

        Ok(self.function)
    }

    fn create_ssa(&mut self) -> Ssa {
        let ssa = self.next_ssa;
        self.next_ssa.increment_by(1);
        ssa
    }

    fn create_label(&mut self) -> BlockId {
        let label = self.next_block;
        self.next_block.increment_by(1);
        label
    }

    /// Appends to the open block, opening one first if needed. Terminators
    /// close the block.
    fn push_instruction(&mut self, instruction: Instruction) {
        let mut block = match self.current.take() {
            Some(block) => block,
            None => {
                let id = match self.pending.take() {
                    Some(id) => id,
                    None => self.create_label(),
                };

                trace!("opening {id} in `{}`", self.function.name);

                Block::new(id)
            }
        };

        let terminates = instruction.opcode.is_terminator();
        block.instructions.push(instruction);

        if terminates {
            self.function.blocks.push(block);
        } else {
            self.current = Some(block);
        }
    }

    fn emit(&mut self, opcode: Opcode, operands: Vec<Operand>) -> Ssa {
        let result = self.create_ssa();

        self.push_instruction(Instruction {
            result: Some(result),
            opcode,
            operands,
        });

        result
    }

    fn emit_without_result(&mut self, opcode: Opcode, operands: Vec<Operand>) {
        self.push_instruction(Instruction {
            result: None,
            opcode,
            operands,
        });
    }

    /// Makes `label` the next block, branching to it from whatever block
    /// would otherwise be left without a terminator
    fn fall_through_to(&mut self, label: BlockId) {
        if self.current.is_some() || self.pending.is_some() {
            self.push_instruction(Instruction::branch(label));
        }

        self.pending = Some(label);
    }

    fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn unknown_name(&self, name: &str) -> IrGenError {
        IrGenError::UnknownName {
            function: self.function.name.clone(),
            name: name.to_owned(),
        }
    }

    fn lower_block(&mut self, statements: &[Statement]) -> Result<(), IrGenError> {
        self.scopes.push(HashMap::new());

        let result = statements
            .iter()
            .try_for_each(|statement| self.lower_statement(statement));

        self.scopes.pop();

        result
    }

    fn lower_statement(&mut self, statement: &Statement) -> Result<(), IrGenError> {
        match statement {
            Statement::Compound(statements) => {
                let inner = self.create_label();
                self.fall_through_to(inner);

                self.lower_block(statements)?;

                if self.current.is_some() {
                    let after = self.create_label();
                    self.fall_through_to(after);
                }

                Ok(())
            }
            Statement::Declaration(declaration) => match declaration.as_ref() {
                Declaration::Variable(variable) => self.lower_local(variable),
                Declaration::Function(_) | Declaration::Class(_) | Declaration::Parameter(_) => {
                    Err(IrGenError::Unsupported {
                        construct: "Nested declarations other than variables",
                    })
                }
            },
            Statement::Return(value) => {
                let ssa = self.lower_expression(value)?;
                let ty = lower_type(&self.type_of(value)?)?;

                self.emit_without_result(Opcode::Return, vec![Operand::ssa(ssa, ty)]);

                Ok(())
            }
            Statement::Expression(expression) => {
                self.lower_expression(expression)?;
                Ok(())
            }
            Statement::If {
                condition,
                positive,
                negative,
            } => self.lower_if(condition, positive, negative.as_deref()),
        }
    }

    fn lower_local(&mut self, variable: &VariableDeclaration) -> Result<(), IrGenError> {
        let ty = lower_type(&variable.ty)?;
        let slot = self.create_ssa();

        self.function.prologue.push(Instruction {
            result: Some(slot),
            opcode: Opcode::Reserve,
            operands: vec![Operand::of_type(ty)],
        });

        self.function.locals.insert(variable.name.clone(), slot);

        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(
                variable.name.clone(),
                Binding {
                    slot,
                    ty: variable.ty.clone(),
                },
            );
        }

        let value = variable.value.as_ref().ok_or(IrGenError::Unsupported {
            construct: "Local variables without an initializer",
        })?;

        let stored = match value {
            Expression::NumericLiteral(literal) => literal_operand(*literal)?,
            _ => {
                let ssa = self.lower_expression(value)?;
                Operand::ssa(ssa, lower_type(&self.type_of(value)?)?)
            }
        };

        self.emit_without_result(
            Opcode::Store,
            vec![Operand::ssa(slot, Type::pointer()), stored],
        );

        Ok(())
    }

    fn lower_if(
        &mut self,
        condition: &Expression,
        positive: &Statement,
        negative: Option<&Statement>,
    ) -> Result<(), IrGenError> {
        let value = self.lower_expression(condition)?;
        let ty = lower_type(&self.type_of(condition)?)?;

        let then_label = self.create_label();
        let else_label = negative.map(|_| self.create_label());
        let join_label = self.create_label();

        self.emit_without_result(
            Opcode::Br,
            vec![
                Operand::ssa(value, ty),
                Operand::label(then_label),
                Operand::label(else_label.unwrap_or(join_label)),
            ],
        );

        self.pending = Some(then_label);
        self.lower_statement(positive)?;
        self.fall_through_to(join_label);

        if let (Some(negative), Some(else_label)) = (negative, else_label) {
            self.pending = Some(else_label);
            self.lower_statement(negative)?;
            self.fall_through_to(join_label);
        }

        Ok(())
    }

    /// Lowers an expression, giving the SSA number holding its value
    fn lower_expression(&mut self, expression: &Expression) -> Result<Ssa, IrGenError> {
        match expression {
            Expression::NumericLiteral(value) => {
                let constant = literal_operand(*value)?;
                Ok(self.emit(Opcode::Const, vec![constant]))
            }
            Expression::Cast {
                expression: inner,
                ty,
            } => self.lower_cast(inner, ty),
            Expression::Binary { lhs, operator, rhs } => {
                let opcode = match operator {
                    BinaryOperator::Add => Opcode::Add,
                    BinaryOperator::Multiply => Opcode::Mul,
                    BinaryOperator::Subtract | BinaryOperator::Modulus | BinaryOperator::Equals => {
                        return Err(IrGenError::Unsupported {
                            construct: "Operators other than `+` and `*`",
                        });
                    }
                };

                let lhs_value = self.lower_expression(lhs)?;
                let rhs_value = self.lower_expression(rhs)?;

                let lhs_type = lower_type(&self.type_of(lhs)?)?;
                let rhs_type = lower_type(&self.type_of(rhs)?)?;

                Ok(self.emit(
                    opcode,
                    vec![
                        Operand::ssa(lhs_value, lhs_type),
                        Operand::ssa(rhs_value, rhs_type),
                    ],
                ))
            }
            Expression::LvalueToRvalue(lvalue) => self.lower_load(lvalue),
            // A bare name used as a value still has to be read
            Expression::IdentifierLiteral(_) => self.lower_load(expression),
            Expression::Assignment { assignee, value } => {
                let address = self.address_of(assignee)?;
                let stored = self.lower_expression(value)?;
                let ty = lower_type(&self.type_of(value)?)?;

                self.emit_without_result(Opcode::Store, vec![address, Operand::ssa(stored, ty)]);

                Ok(stored)
            }
            Expression::FunctionCall { .. } => Err(IrGenError::Unsupported {
                construct: "Function calls",
            }),
            Expression::MemberAccess { .. } => Err(IrGenError::Unsupported {
                construct: "Member accesses",
            }),
            Expression::StringLiteral(_) => Err(IrGenError::Unsupported {
                construct: "String literals",
            }),
            Expression::Unary { .. } => Err(IrGenError::Unsupported {
                construct: "Unary operators",
            }),
        }
    }

    fn lower_cast(&mut self, inner: &Expression, target: &TypeSpec) -> Result<Ssa, IrGenError> {
        let value = self.lower_expression(inner)?;
        let source = self.type_of(inner)?;

        if source == *target {
            return Ok(value);
        }

        let (Some(source_size), Some(target_size)) = (bit_size(&source), bit_size(target)) else {
            return Err(IrGenError::Unsupported {
                construct: "Casts between strings and integers",
            });
        };

        let opcode = match target_size.cmp(&source_size) {
            // Only the type changes
            Ordering::Equal => return Ok(value),
            Ordering::Less => Opcode::Trunc,
            Ordering::Greater => {
                if source.as_primitive().is_some_and(|kind| kind.is_unsigned()) {
                    Opcode::Zext
                } else {
                    Opcode::Sext
                }
            }
        };

        Ok(self.emit(
            opcode,
            vec![
                Operand::ssa(value, lower_type(&source)?),
                Operand::of_type(lower_type(target)?),
            ],
        ))
    }

    fn lower_load(&mut self, lvalue: &Expression) -> Result<Ssa, IrGenError> {
        let address = self.address_of(lvalue)?;
        let ty = lower_type(&self.type_of(lvalue)?)?;

        Ok(self.emit(Opcode::Load, vec![address, Operand::of_type(ty)]))
    }

    /// Pointer operand for the storage an lvalue names
    fn address_of(&self, lvalue: &Expression) -> Result<Operand, IrGenError> {
        match lvalue {
            Expression::IdentifierLiteral(name) => {
                if let Some(binding) = self.lookup(name) {
                    return Ok(Operand::ssa(binding.slot, Type::pointer()));
                }

                if self.globals.contains_key(name) {
                    return Ok(Operand::new(
                        Type::pointer(),
                        OperandKind::Name(name.clone()),
                    ));
                }

                Err(self.unknown_name(name))
            }
            Expression::StringLiteral(_) => Err(IrGenError::Unsupported {
                construct: "String literals",
            }),
            Expression::MemberAccess { .. } => Err(IrGenError::Unsupported {
                construct: "Member accesses",
            }),
            _ => Err(IrGenError::Unsupported {
                construct: "Addresses of temporaries",
            }),
        }
    }

    fn type_of(&self, expression: &Expression) -> Result<TypeSpec, IrGenError> {
        match expression {
            Expression::NumericLiteral(value) => primitive::literal_type(*value)
                .map(TypeSpec::primitive)
                .ok_or(IrGenError::Unsupported {
                    construct: "Integer literals wider than 64 bits",
                }),
            Expression::StringLiteral(_) => Ok(TypeSpec::primitive(PrimitiveKind::String)),
            Expression::IdentifierLiteral(name) => match self.lookup(name) {
                Some(binding) => Ok(binding.ty.clone()),
                None => self
                    .globals
                    .get(name)
                    .cloned()
                    .ok_or_else(|| self.unknown_name(name)),
            },
            Expression::Cast { ty, .. } => Ok(ty.clone()),
            Expression::LvalueToRvalue(expression) => self.type_of(expression),
            Expression::Assignment { assignee, .. } => self.type_of(assignee),
            Expression::Binary { lhs, rhs, .. } => {
                let lhs = self.type_of(lhs)?;
                let rhs = self.type_of(rhs)?;

                sema::common_type(&lhs, &rhs).ok_or_else(|| IrGenError::NoCommonType {
                    lhs: lhs.to_string(),
                    rhs: rhs.to_string(),
                })
            }
            Expression::FunctionCall { .. } => Err(IrGenError::Unsupported {
                construct: "Function calls",
            }),
            Expression::MemberAccess { .. } => Err(IrGenError::Unsupported {
                construct: "Member accesses",
            }),
            Expression::Unary { .. } => Err(IrGenError::Unsupported {
                construct: "Unary operators",
            }),
        }
    }
}
