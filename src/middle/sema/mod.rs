//! Name resolution and type checking. The checked AST is rebuilt with every
//! implicit conversion spelled out as an explicit node, so later stages never
//! have to reason about value categories or promotion.

use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    frontend::ast::{
        Ast, BinaryOperator, Declaration, Expression, FunctionDeclaration, ParameterDeclaration,
        Statement, TypeSpec, UnaryOperator, VariableDeclaration,
    },
    middle::primitive::{self, PrimitiveKind},
};

use self::scope::{ScopeId, ScopeKind, ScopeTree, Symbol, SymbolKind};

pub mod scope;

/// Integer literals are assumed to be of this type unless promoted
pub const DEFAULT_LITERAL_TYPE: PrimitiveKind = PrimitiveKind::I32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemaError {
    #[error("Use of undeclared variable or function `{name}`")]
    UndeclaredIdentifier { name: String },
    #[error("Attempted to redeclare `{name}`")]
    Redeclaration { name: String },
    #[error("Attempted to use invalid type `{ty}`")]
    DisallowedType { ty: TypeSpec },
    #[error("Invalid operator `{operator}` for types `{lhs}` and `{rhs}`")]
    InadmissibleOperator {
        operator: BinaryOperator,
        lhs: TypeSpec,
        rhs: TypeSpec,
    },
    #[error("Invalid unary operator `{operator}` for an operand of type `{ty}`")]
    InadmissibleUnaryOperator { operator: UnaryOperator, ty: TypeSpec },
    #[error("No common type for `{lhs}` and `{rhs}`")]
    NoCommonType { lhs: TypeSpec, rhs: TypeSpec },
    #[error("Integer literal `{value}` does not fit in any integer type")]
    LiteralOutOfRange { value: i128 },
    #[error("Initializer element of global var `{name}` is not constant")]
    NonConstantGlobal { name: String },
    #[error("Invalid use of return outside of a function")]
    ReturnOutsideFunction,
    #[error("Type `{ty}` has no default value")]
    MissingZeroValue { ty: TypeSpec },
    #[error("Left hand side of assignment is not assignable")]
    NotAnLvalue,
    #[error("Condition must be an integer but has type `{ty}`")]
    NonIntegerCondition { ty: TypeSpec },
    #[error("`{name}` is not a function")]
    NotAFunction { name: String },
    #[error("`{name}` expects {expected} arguments but {found} were given")]
    ArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("{construct} are not supported yet")]
    Unsupported { construct: &'static str },
    #[error("Symbol `{name}` was inserted twice into the same scope")]
    DuplicateSymbol { name: String },
}

impl SemaError {
    /// Errors which can only be caused by a bug in the compiler itself
    pub fn is_internal(&self) -> bool {
        matches!(self, SemaError::DuplicateSymbol { .. })
    }
}

/// The type two integer operands are promoted to. Pointers take part as
/// 64-bit unsigned integers.
pub fn common_type(lhs: &TypeSpec, rhs: &TypeSpec) -> Option<TypeSpec> {
    let lhs_primitive = lhs.as_primitive()?;
    let rhs_primitive = rhs.as_primitive()?;

    let biggest = primitive::biggest_type(lhs_primitive, rhs_primitive)?;

    Some(if biggest == lhs_primitive {
        lhs.clone()
    } else {
        rhs.clone()
    })
}

/// Whether an initializer can be evaluated at compile time
pub fn can_be_folded(expression: &Expression) -> bool {
    match expression {
        Expression::Cast { expression, .. } | Expression::LvalueToRvalue(expression) => {
            can_be_folded(expression)
        }
        Expression::Binary { lhs, rhs, .. } => can_be_folded(lhs) && can_be_folded(rhs),
        Expression::NumericLiteral(_) => true,
        Expression::IdentifierLiteral(_)
        | Expression::StringLiteral(_)
        | Expression::MemberAccess { .. }
        | Expression::Assignment { .. }
        | Expression::FunctionCall { .. }
        | Expression::Unary { .. } => false,
    }
}

fn literal_type_spec(value: i128) -> Result<TypeSpec, SemaError> {
    primitive::literal_type(value)
        .map(TypeSpec::primitive)
        .ok_or(SemaError::LiteralOutOfRange { value })
}

fn zero_value(ty: &TypeSpec) -> Result<Expression, SemaError> {
    if ty.is_integer() {
        Ok(Expression::NumericLiteral(0))
    } else {
        Err(SemaError::MissingZeroValue { ty: ty.clone() })
    }
}

fn ends_with_return(statement: &Statement) -> bool {
    match statement {
        Statement::Return(_) => true,
        Statement::Compound(statements) => statements.last().is_some_and(ends_with_return),
        _ => false,
    }
}

#[derive(Debug)]
pub struct Sema {
    scopes: ScopeTree,
    stack: Vec<ScopeId>,
}

impl Sema {
    pub fn check_ast(ast: Ast) -> Result<Ast, SemaError> {
        let mut sema = Self {
            scopes: ScopeTree::new(),
            stack: vec![ScopeId::GLOBAL],
        };

        let declarations = ast
            .declarations
            .into_iter()
            .map(|declaration| sema.check_declaration(declaration))
            .collect::<Result<Vec<_>, _>>()?;

        debug!("checked {} top level declarations", declarations.len());

        Ok(Ast { declarations })
    }

    fn current_scope(&self) -> ScopeId {
        self.stack.last().copied().unwrap_or(ScopeId::GLOBAL)
    }

    fn enter_block(&mut self) {
        let parent = self.current_scope();
        let scope = self.scopes.push_block(parent);
        self.stack.push(scope);
    }

    fn exit_scope(&mut self) {
        self.stack.pop();
    }

    fn declare(&mut self, symbol: Symbol) -> Result<(), SemaError> {
        let scope = self.current_scope();

        if self.scopes.lookup_local(scope, &symbol.name).is_some() {
            return Err(SemaError::Redeclaration { name: symbol.name });
        }

        trace!("declaring `{}` with type `{}`", symbol.name, symbol.ty);

        self.scopes
            .insert(scope, symbol)
            .map_err(|symbol| SemaError::DuplicateSymbol { name: symbol.name })
    }

    fn check_type_spec(&self, ty: &TypeSpec) -> Result<(), SemaError> {
        if self.scopes.is_type_allowed(self.current_scope(), &ty.name) {
            Ok(())
        } else {
            Err(SemaError::DisallowedType { ty: ty.clone() })
        }
    }

    fn lookup(&self, name: &str) -> Result<&Symbol, SemaError> {
        self.scopes
            .lookup(self.current_scope(), name)
            .ok_or_else(|| SemaError::UndeclaredIdentifier {
                name: name.to_owned(),
            })
    }

    fn check_declaration(&mut self, declaration: Declaration) -> Result<Declaration, SemaError> {
        match declaration {
            Declaration::Function(function) => Ok(Declaration::Function(Box::new(
                self.check_function_declaration(*function)?,
            ))),
            Declaration::Variable(variable) => Ok(Declaration::Variable(
                self.check_variable_declaration(variable)?,
            )),
            Declaration::Parameter(parameter) => Ok(Declaration::Parameter(
                self.check_parameter_declaration(parameter)?,
            )),
            Declaration::Class(_) => Err(SemaError::Unsupported {
                construct: "Class declarations",
            }),
        }
    }

    fn check_function_declaration(
        &mut self,
        function: FunctionDeclaration,
    ) -> Result<FunctionDeclaration, SemaError> {
        debug!("checking function `{}`", function.name);

        self.check_type_spec(&function.return_type)?;

        self.declare(Symbol {
            name: function.name.clone(),
            ty: function.return_type.clone(),
            kind: SymbolKind::Function {
                parameters: function.parameters.iter().map(|p| p.ty.clone()).collect(),
            },
        })?;

        let parent = self.current_scope();
        let scope = self.scopes.push_function(
            parent,
            &function.name,
            function.return_type.clone(),
        );
        self.stack.push(scope);

        let result = self.check_function_body(function);

        self.exit_scope();

        result
    }

    fn check_function_body(
        &mut self,
        function: FunctionDeclaration,
    ) -> Result<FunctionDeclaration, SemaError> {
        let parameters = function
            .parameters
            .into_iter()
            .map(|parameter| self.check_parameter_declaration(parameter))
            .collect::<Result<Vec<_>, _>>()?;

        let mut statements = match self.check_statement(function.body)? {
            Statement::Compound(statements) => statements,
            other => vec![other],
        };

        if !statements.last().is_some_and(ends_with_return) {
            trace!("appending implicit return to `{}`", function.name);

            let value = zero_value(&function.return_type)?;
            statements.push(self.check_return_statement(value)?);
        }

        Ok(FunctionDeclaration {
            parameters,
            body: Statement::Compound(statements),
            ..function
        })
    }

    fn check_parameter_declaration(
        &mut self,
        parameter: ParameterDeclaration,
    ) -> Result<ParameterDeclaration, SemaError> {
        self.check_type_spec(&parameter.ty)?;

        self.declare(Symbol {
            name: parameter.name.clone(),
            ty: parameter.ty.clone(),
            kind: SymbolKind::Parameter,
        })?;

        Ok(parameter)
    }

    fn check_variable_declaration(
        &mut self,
        variable: VariableDeclaration,
    ) -> Result<VariableDeclaration, SemaError> {
        self.check_type_spec(&variable.ty)?;

        self.declare(Symbol {
            name: variable.name.clone(),
            ty: variable.ty.clone(),
            kind: SymbolKind::Variable,
        })?;

        let value = match variable.value {
            Some(value) => self.check_expression(value)?.into_rvalue(),
            None => zero_value(&variable.ty)?,
        };

        let value = self.coerce(value, &variable.ty)?;

        if self.current_scope() == ScopeId::GLOBAL && !can_be_folded(&value) {
            return Err(SemaError::NonConstantGlobal {
                name: variable.name,
            });
        }

        Ok(VariableDeclaration {
            value: Some(value),
            ..variable
        })
    }

    fn check_statement(&mut self, statement: Statement) -> Result<Statement, SemaError> {
        match statement {
            Statement::Compound(statements) => {
                self.enter_block();

                let result = statements
                    .into_iter()
                    .map(|statement| self.check_statement(statement))
                    .collect::<Result<Vec<_>, _>>();

                self.exit_scope();

                Ok(Statement::Compound(result?))
            }
            Statement::Declaration(declaration) => Ok(Statement::Declaration(Box::new(
                self.check_declaration(*declaration)?,
            ))),
            Statement::Return(value) => self.check_return_statement(value),
            Statement::Expression(expression) => {
                Ok(Statement::Expression(self.check_expression(expression)?))
            }
            Statement::If {
                condition,
                positive,
                negative,
            } => {
                let condition = self.check_expression(condition)?.into_rvalue();
                let ty = self.expression_type(&condition)?;

                if !ty.is_integer() {
                    return Err(SemaError::NonIntegerCondition { ty });
                }

                let positive = Box::new(self.check_statement(*positive)?);
                let negative = match negative {
                    Some(negative) => Some(Box::new(self.check_statement(*negative)?)),
                    None => None,
                };

                Ok(Statement::If {
                    condition,
                    positive,
                    negative,
                })
            }
        }
    }

    fn check_return_statement(&mut self, value: Expression) -> Result<Statement, SemaError> {
        let ScopeKind::Function { return_type, .. } =
            &self.scopes.enclosing_non_block(self.current_scope()).kind
        else {
            return Err(SemaError::ReturnOutsideFunction);
        };
        let return_type = return_type.clone();

        let value = self.check_expression(value)?.into_rvalue();

        Ok(Statement::Return(self.coerce(value, &return_type)?))
    }

    /// Casts `expression` to `ty` unless it already has that type
    fn coerce(&self, expression: Expression, ty: &TypeSpec) -> Result<Expression, SemaError> {
        if self.expression_type(&expression)? == *ty {
            Ok(expression)
        } else {
            Ok(expression.cast(ty.clone()))
        }
    }

    fn check_expression(&mut self, expression: Expression) -> Result<Expression, SemaError> {
        match expression {
            Expression::Binary { lhs, operator, rhs } => {
                self.check_binary_expression(*lhs, operator, *rhs)
            }
            Expression::Unary { operator, operand } => {
                let operand = self.check_expression(*operand)?;

                // Negative literals are folded right away
                match (operator, operand) {
                    (UnaryOperator::Negate, Expression::NumericLiteral(value)) => {
                        let negated = Expression::NumericLiteral(-value);
                        self.expression_type(&negated)?;
                        Ok(negated)
                    }
                    (operator, operand) => Err(SemaError::InadmissibleUnaryOperator {
                        operator,
                        ty: self.expression_type(&operand)?,
                    }),
                }
            }
            Expression::IdentifierLiteral(name) => {
                if let SymbolKind::Function { .. } = self.lookup(&name)?.kind {
                    return Err(SemaError::Unsupported {
                        construct: "Function references",
                    });
                }

                Ok(Expression::IdentifierLiteral(name))
            }
            Expression::NumericLiteral(value) => {
                literal_type_spec(value)?;
                Ok(Expression::NumericLiteral(value))
            }
            Expression::StringLiteral(value) => Ok(Expression::StringLiteral(value)),
            Expression::Cast { expression, ty } => {
                self.check_type_spec(&ty)?;

                let expression = self.check_expression(*expression)?.into_rvalue();

                Ok(expression.cast(ty))
            }
            Expression::LvalueToRvalue(expression) => Ok(Expression::LvalueToRvalue(Box::new(
                self.check_expression(*expression)?,
            ))),
            Expression::Assignment { assignee, value } => {
                let assignee = self.check_expression(*assignee)?;

                // String literals are lvalues but can't be stored to
                if !assignee.is_lvalue() || matches!(assignee, Expression::StringLiteral(_)) {
                    return Err(SemaError::NotAnLvalue);
                }

                let ty = self.expression_type(&assignee)?;
                let value = self.check_expression(*value)?.into_rvalue();
                let value = self.coerce(value, &ty)?;

                Ok(Expression::Assignment {
                    assignee: Box::new(assignee),
                    value: Box::new(value),
                })
            }
            Expression::FunctionCall { callee, arguments } => {
                self.check_function_call(*callee, arguments)
            }
            Expression::MemberAccess { .. } => Err(SemaError::Unsupported {
                construct: "Member accesses",
            }),
        }
    }

    fn check_function_call(
        &mut self,
        callee: Expression,
        arguments: Vec<Expression>,
    ) -> Result<Expression, SemaError> {
        let Expression::IdentifierLiteral(name) = &callee else {
            return Err(SemaError::NotAFunction {
                name: "expression".to_owned(),
            });
        };

        let SymbolKind::Function { parameters } = &self.lookup(name)?.kind else {
            return Err(SemaError::NotAFunction { name: name.clone() });
        };
        let parameters = parameters.clone();

        let is_variadic = parameters
            .last()
            .is_some_and(|p| p.as_primitive() == Some(PrimitiveKind::Variadic));
        let fixed = if is_variadic {
            parameters.len() - 1
        } else {
            parameters.len()
        };

        if arguments.len() < fixed || (!is_variadic && arguments.len() > fixed) {
            return Err(SemaError::ArgumentCount {
                name: name.clone(),
                expected: fixed,
                found: arguments.len(),
            });
        }

        let arguments = arguments
            .into_iter()
            .enumerate()
            .map(|(i, argument)| {
                let argument = self.check_expression(argument)?.into_rvalue();

                match parameters.get(i).filter(|_| i < fixed) {
                    Some(ty) => self.coerce(argument, ty),
                    None => Ok(argument),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Expression::FunctionCall {
            callee: Box::new(callee),
            arguments,
        })
    }

    fn check_binary_expression(
        &mut self,
        lhs: Expression,
        operator: BinaryOperator,
        rhs: Expression,
    ) -> Result<Expression, SemaError> {
        let lhs = self.check_expression(lhs)?;
        let rhs = self.check_expression(rhs)?;

        let lhs_type = self.expression_type(&lhs)?;
        let rhs_type = self.expression_type(&rhs)?;

        let admissible = [&lhs_type, &rhs_type].iter().all(|ty| {
            ty.as_primitive()
                .is_some_and(|primitive| primitive.supports_binary_op(operator))
        });

        if !admissible {
            return Err(SemaError::InadmissibleOperator {
                operator,
                lhs: lhs_type,
                rhs: rhs_type,
            });
        }

        let common = common_type(&lhs_type, &rhs_type).ok_or_else(|| SemaError::NoCommonType {
            lhs: lhs_type.clone(),
            rhs: rhs_type.clone(),
        })?;

        let lhs = promote_operand(lhs.into_rvalue(), &lhs_type, &common);
        let rhs = promote_operand(rhs.into_rvalue(), &rhs_type, &common);

        Ok(Expression::Binary {
            lhs: Box::new(lhs),
            operator,
            rhs: Box::new(rhs),
        })
    }

    /// The type of an already checked expression
    pub fn expression_type(&self, expression: &Expression) -> Result<TypeSpec, SemaError> {
        match expression {
            Expression::NumericLiteral(value) => literal_type_spec(*value),
            Expression::StringLiteral(_) => Ok(TypeSpec::primitive(PrimitiveKind::String)),
            Expression::IdentifierLiteral(name) => Ok(self.lookup(name)?.ty.clone()),
            Expression::Cast { ty, .. } => Ok(ty.clone()),
            Expression::LvalueToRvalue(expression) => self.expression_type(expression),
            Expression::Assignment { assignee, .. } => self.expression_type(assignee),
            Expression::Binary { lhs, rhs, .. } => {
                let lhs = self.expression_type(lhs)?;
                let rhs = self.expression_type(rhs)?;

                common_type(&lhs, &rhs).ok_or(SemaError::NoCommonType { lhs, rhs })
            }
            Expression::FunctionCall { callee, .. } => match callee.as_ref() {
                Expression::IdentifierLiteral(name) => Ok(self.lookup(name)?.ty.clone()),
                _ => Err(SemaError::NotAFunction {
                    name: "expression".to_owned(),
                }),
            },
            Expression::Unary { operator, operand } => Err(SemaError::InadmissibleUnaryOperator {
                operator: *operator,
                ty: self.expression_type(operand)?,
            }),
            Expression::MemberAccess { .. } => Err(SemaError::Unsupported {
                construct: "Member accesses",
            }),
        }
    }
}

/// Casts a binary operand to the common type. Literals are only cast when
/// the common type isn't the default literal type.
fn promote_operand(operand: Expression, ty: &TypeSpec, common: &TypeSpec) -> Expression {
    if *ty == *common {
        return operand;
    }

    let is_literal = matches!(operand, Expression::NumericLiteral(_));

    if is_literal && *common == TypeSpec::primitive(DEFAULT_LITERAL_TYPE) {
        operand
    } else {
        operand.cast(common.clone())
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::frontend::{SourceFile, import::ImportResolver, parser::Parser};

    fn check(source: &str) -> Result<Ast, SemaError> {
        let resolver = ImportResolver::new(Vec::new());
        let ast = Parser::parse_ast(&SourceFile::from_memory(source), &resolver)
            .expect("source should parse");

        Sema::check_ast(ast)
    }

    fn ty(name: &str) -> TypeSpec {
        TypeSpec::new(0, name)
    }

    fn identifier(name: &str) -> Expression {
        Expression::IdentifierLiteral(name.into())
    }

    fn function_body(ast: &Ast, index: usize) -> &[Statement] {
        match &ast.declarations[index] {
            Declaration::Function(function) => match &function.body {
                Statement::Compound(statements) => statements,
                other => panic!("body was not normalized: {other:?}"),
            },
            other => panic!("expected a function, got {other:?}"),
        }
    }

    fn variable_value(ast: &Ast, index: usize) -> &Expression {
        match &ast.declarations[index] {
            Declaration::Variable(VariableDeclaration {
                value: Some(value), ..
            }) => value,
            other => panic!("expected an initialized variable, got {other:?}"),
        }
    }

    #[test]
    fn empty_body_gets_default_return() {
        let ast = check("func f() : i32 { }").unwrap();

        assert_eq!(
            function_body(&ast, 0),
            &[Statement::Return(
                Expression::NumericLiteral(0).cast(ty("i32"))
            )]
        );
    }

    #[test]
    fn non_compound_body_is_wrapped() {
        let ast = check("func f() : u32 return 1;").unwrap();

        assert_eq!(
            function_body(&ast, 0),
            &[Statement::Return(Expression::NumericLiteral(1))]
        );
    }

    #[test]
    fn nested_trailing_return_is_kept() {
        let ast = check("func f() : u32 { { return 1; } }").unwrap();
        let body = function_body(&ast, 0);

        assert_eq!(body.len(), 1);
        assert!(ends_with_return(&body[0]));
    }

    #[test]
    fn trailing_if_still_gets_a_return() {
        let ast = check("func f(a: u32) : u32 { if (a) return 1; else return 2; }").unwrap();
        let body = function_body(&ast, 0);

        assert_eq!(body.len(), 2);
        assert_eq!(body[1], Statement::Return(Expression::NumericLiteral(0)));
    }

    #[test]
    fn every_checked_function_ends_in_return() {
        let ast = check(indoc! {"
            func a() : i32 { var x : i32 = 1; }
            func b() : u64 { {} }
            func c(p: i64) : i64 { p = 2; return p; }
            func d() : u32 { { var y : u32 = 1; } }
        "})
        .unwrap();

        for declaration in &ast.declarations {
            let Declaration::Function(function) = declaration else {
                panic!("expected function");
            };

            assert!(ends_with_return(&function.body), "{}", function.name);
        }
    }

    #[test]
    fn operands_are_materialized() {
        let ast = check("func add(a: i32, b: i32) : i32 { return a + b; }").unwrap();

        assert_eq!(
            function_body(&ast, 0),
            &[Statement::Return(Expression::Binary {
                lhs: Box::new(Expression::LvalueToRvalue(Box::new(identifier("a")))),
                operator: BinaryOperator::Add,
                rhs: Box::new(Expression::LvalueToRvalue(Box::new(identifier("b")))),
            })]
        );
    }

    #[test]
    fn narrower_operand_is_widened() {
        let ast = check("func f(a: i32, b: i64) : i64 { return a * b; }").unwrap();

        assert_eq!(
            function_body(&ast, 0),
            &[Statement::Return(Expression::Binary {
                lhs: Box::new(
                    Expression::LvalueToRvalue(Box::new(identifier("a"))).cast(ty("i64"))
                ),
                operator: BinaryOperator::Multiply,
                rhs: Box::new(Expression::LvalueToRvalue(Box::new(identifier("b")))),
            })]
        );
    }

    #[test]
    fn literal_is_cast_to_wider_common_type() {
        let ast = check("func f(a: u64) : u64 { return a + 1; }").unwrap();

        assert_eq!(
            function_body(&ast, 0),
            &[Statement::Return(Expression::Binary {
                lhs: Box::new(Expression::LvalueToRvalue(Box::new(identifier("a")))),
                operator: BinaryOperator::Add,
                rhs: Box::new(Expression::NumericLiteral(1).cast(ty("u64"))),
            })]
        );
    }

    #[test]
    fn return_value_is_cast_to_return_type() {
        let ast = check("var g : u64 = 1; func f() : i32 { return g; }").unwrap();

        assert_eq!(
            function_body(&ast, 1),
            &[Statement::Return(
                Expression::LvalueToRvalue(Box::new(identifier("g"))).cast(ty("i32"))
            )]
        );
    }

    #[test]
    fn global_initializers() {
        let ast = check("var x : i32 = 2 * 3; var y : i32; var z : u32 = -5;").unwrap();

        assert_eq!(
            variable_value(&ast, 0),
            &Expression::Binary {
                lhs: Box::new(Expression::NumericLiteral(2)),
                operator: BinaryOperator::Multiply,
                rhs: Box::new(Expression::NumericLiteral(3)),
            }
            .cast(ty("i32"))
        );
        assert_eq!(
            variable_value(&ast, 1),
            &Expression::NumericLiteral(0).cast(ty("i32"))
        );
        assert_eq!(
            variable_value(&ast, 2),
            &Expression::NumericLiteral(-5).cast(ty("u32"))
        );
    }

    #[test]
    fn non_constant_global_is_rejected() {
        assert_eq!(
            check("var a : i32 = 1; var b : i32 = a;"),
            Err(SemaError::NonConstantGlobal { name: "b".into() })
        );
    }

    #[test]
    fn shadowing_in_nested_scope_is_allowed() {
        let ast = check(indoc! {"
            var x : u64 = 1;
            func f(x: i32) : i32 {
                {
                    var x : u32 = 2;
                    return x;
                }
            }
        "})
        .unwrap();

        // The inner `x` is a u32, so the return needs a cast to i32
        let Statement::Compound(inner) = &function_body(&ast, 1)[0] else {
            panic!("expected nested compound");
        };

        assert_eq!(
            inner[1],
            Statement::Return(
                Expression::LvalueToRvalue(Box::new(identifier("x"))).cast(ty("i32"))
            )
        );
    }

    #[test]
    fn redeclaration_in_same_scope_is_rejected() {
        assert_eq!(
            check("func f() : i32 { var a : i32 = 1; var a : i32 = 2; return a; }"),
            Err(SemaError::Redeclaration { name: "a".into() })
        );
        assert_eq!(
            check("var a : i32; func a() : i32 { return 0; }"),
            Err(SemaError::Redeclaration { name: "a".into() })
        );
        assert_eq!(
            check("func f(a: i32, a: u32) : i32 { return 0; }"),
            Err(SemaError::Redeclaration { name: "a".into() })
        );
    }

    #[test]
    fn undeclared_identifier_is_rejected() {
        assert_eq!(
            check("func f() : i32 { return nope; }"),
            Err(SemaError::UndeclaredIdentifier {
                name: "nope".into()
            })
        );
    }

    #[test]
    fn disallowed_types_are_rejected() {
        assert_eq!(
            check("var a : i16;"),
            Err(SemaError::DisallowedType { ty: ty("i16") })
        );
        assert_eq!(
            check("func new() { }"),
            Err(SemaError::DisallowedType {
                ty: ty("IMPLICIT THIS")
            })
        );
    }

    #[test]
    fn only_add_and_multiply_are_admissible() {
        assert_eq!(
            check("func f(a: i32) : i32 { return a - 1; }"),
            Err(SemaError::InadmissibleOperator {
                operator: BinaryOperator::Subtract,
                lhs: ty("i32"),
                rhs: ty("u32"),
            })
        );
        assert!(matches!(
            check("func f(a: String) : i32 { return a + 1; }"),
            Err(SemaError::InadmissibleOperator { .. })
        ));
    }

    #[test]
    fn negation_only_applies_to_literals() {
        assert!(matches!(
            check("func f(a: i32) : i32 { return -a; }"),
            Err(SemaError::InadmissibleUnaryOperator { .. })
        ));
    }

    #[test]
    fn missing_zero_value_is_an_error() {
        assert_eq!(
            check("func f() : String { }"),
            Err(SemaError::MissingZeroValue { ty: ty("String") })
        );
    }

    #[test]
    fn conditions_must_be_integers() {
        assert_eq!(
            check("func f(s: String) : i32 { if (s) return 1; return 0; }"),
            Err(SemaError::NonIntegerCondition { ty: ty("String") })
        );
    }

    #[test]
    fn assignment_requires_a_name() {
        assert_eq!(
            check("func f() : i32 { 1 = 2; return 0; }"),
            Err(SemaError::NotAnLvalue)
        );
    }

    #[test]
    fn calls_are_checked_against_the_callee() {
        assert!(check("func g(a: i32) : i32 { return a; } func f() : i32 { return g(1); }").is_ok());
        assert_eq!(
            check("func g(a: i32) : i32 { return a; } func f() : i32 { return g(); }"),
            Err(SemaError::ArgumentCount {
                name: "g".into(),
                expected: 1,
                found: 0,
            })
        );
        assert_eq!(
            check("var g : i32; func f() : i32 { return g(); }"),
            Err(SemaError::NotAFunction { name: "g".into() })
        );
    }

    #[test]
    fn classes_are_unsupported() {
        assert!(matches!(
            check("class Foo { }"),
            Err(SemaError::Unsupported { .. })
        ));
    }

    #[test]
    fn attributes_stay_on_checked_declarations() {
        use crate::frontend::ast::Attribute;

        let ast = check(indoc! {"
            var @attrib(public no_mangle) counter : u32 = 1;
            func @attrib(private) f() : i32 { return 0; }
        "})
        .unwrap();

        let Declaration::Variable(variable) = &ast.declarations[0] else {
            panic!("expected a variable");
        };
        assert_eq!(variable.attributes, vec![Attribute::Public, Attribute::NoMangle]);

        let Declaration::Function(function) = &ast.declarations[1] else {
            panic!("expected a function");
        };
        assert_eq!(function.attributes, vec![Attribute::Private]);
    }
}
