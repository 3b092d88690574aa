use core::fmt;

use colored::Colorize;
use itertools::Itertools;

use crate::{
    index::Index,
    middle::ir::{Block, BlockId, Function, Instruction, Module, Object, Operand, OperandKind, Ssa, Type},
};

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Module:")?;

        for object in &self.objects {
            writeln!(f, "{object}")?;
        }

        for function in &self.functions {
            write!(f, "{function}")?;
        }

        Ok(())
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}, {} = {}",
            "object".magenta(),
            format!("${}", self.name).blue(),
            self.ty,
            self.value
        )
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} {} {}({}) {{",
            "function".magenta(),
            self.return_type,
            format!("${}", self.name).blue(),
            self.arguments
                .iter()
                .map(|(ty, ssa)| format!("{} {ty}", ssa.to_string().yellow()))
                .join(", ")
        )?;

        for instruction in &self.prologue {
            writeln!(f, "    {instruction}")?;
        }

        for block in &self.blocks {
            write!(f, "{block}")?;
        }

        writeln!(f, "}}")
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {}:", self.id.to_string().bright_red())?;

        for instruction in &self.instructions {
            writeln!(f, "    {instruction}")?;
        }

        Ok(())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(result) = self.result {
            write!(f, "{} = ", result.to_string().yellow())?;
        }

        write!(f, "{}", self.opcode.to_string().cyan())?;

        if !self.operands.is_empty() {
            write!(f, " {}", self.operands.iter().join(", "))?;
        }

        Ok(())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ty)?;

        match &self.kind {
            OperandKind::ConstI32(value) => write!(f, " {}", value.to_string().purple()),
            OperandKind::ConstI64(value) => write!(f, " {}", value.to_string().purple()),
            OperandKind::ConstU32(value) => write!(f, " {}", value.to_string().purple()),
            OperandKind::ConstU64(value) => write!(f, " {}", value.to_string().purple()),
            OperandKind::Type => Ok(()),
            OperandKind::Ssa(ssa) => write!(f, " {}", ssa.to_string().yellow()),
            OperandKind::Name(name) => write!(f, " {}", format!("${name}").blue()),
            OperandKind::Label(label) => write!(f, " {}", label.to_string().bright_red()),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type {}", self.name.green())
    }
}

impl fmt::Display for Ssa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ".BB{}", self.index())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use crate::{
        index::Index,
        middle::{
            ir::{Block, BlockId, Function, Instruction, Module, Object, Opcode, Operand, OperandKind, Ssa, Type},
            primitive::PrimitiveKind,
        },
    };

    #[test]
    fn prints_objects_and_functions() {
        let i32_type = Type::from(PrimitiveKind::I32);

        let module = Module {
            objects: vec![Object {
                name: "x".into(),
                ty: i32_type.clone(),
                value: Operand::constant(PrimitiveKind::I32, 6).unwrap(),
            }],
            functions: vec![Function {
                name: "id".into(),
                return_type: i32_type.clone(),
                arguments: vec![(i32_type.clone(), Ssa::new(0))],
                locals: BTreeMap::from([("a".to_owned(), Ssa::new(0))]),
                prologue: vec![Instruction::branch(BlockId::ZERO)],
                blocks: vec![Block {
                    id: BlockId::ZERO,
                    instructions: vec![
                        Instruction {
                            result: Some(Ssa::new(1)),
                            opcode: Opcode::Load,
                            operands: vec![
                                Operand::new(Type::pointer(), OperandKind::Name("x".into())),
                                Operand::of_type(i32_type.clone()),
                            ],
                        },
                        Instruction {
                            result: None,
                            opcode: Opcode::Return,
                            operands: vec![Operand::ssa(Ssa::new(1), i32_type)],
                        },
                    ],
                }],
            }],
        };

        assert_eq!(
            strip_ansi_escapes::strip_str(module.to_string()),
            indoc! {"
                Module:
                object $x, type i32 = type i32 6
                function type i32 $id(#0 type i32) {
                    br type label .BB0
                  .BB0:
                    #1 = load type ptr $x, type i32
                    return type i32 #1
                }
            "}
        );
    }

    #[test]
    fn empty_module_prints_header() {
        assert_eq!(Module::default().to_string(), "Module:\n");
    }
}
