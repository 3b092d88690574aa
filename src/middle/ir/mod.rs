//! SSA form IR. Expression trees are flattened into numbered instructions and
//! control flow is spelled out as labelled blocks, each ending in exactly one
//! terminator.

use std::collections::BTreeMap;

use strum::Display;
use thiserror::Error;

use crate::{index::simple_index, middle::primitive::PrimitiveKind};

pub mod ast_lowering;
pub mod pretty_print;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Module {
    pub objects: Vec<Object>,
    pub functions: Vec<Function>,
}

/// A global with a constant initial value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub name: String,
    pub ty: Type,
    pub value: Operand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub name: String,
    pub return_type: Type,
    pub arguments: Vec<(Type, Ssa)>,
    /// Stack slot (or argument) holding each named value
    pub locals: BTreeMap<String, Ssa>,
    /// Slot reservations, always followed by a branch to the first block
    pub prologue: Vec<Instruction>,
    pub blocks: Vec<Block>,
}

impl Function {
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|block| block.id == id)
    }

    /// Checks that every block is terminated exactly once and that every
    /// branch target exists.
    pub fn verify(&self) -> Result<(), IrGenError> {
        for block in &self.blocks {
            if block.terminator().is_none() {
                return Err(IrGenError::UnterminatedBlock {
                    function: self.name.clone(),
                    block: block.id,
                });
            }

            let body = &block.instructions[..block.instructions.len() - 1];

            if body.iter().any(|i| i.opcode.is_terminator()) {
                return Err(IrGenError::InstructionAfterTerminator {
                    function: self.name.clone(),
                    block: block.id,
                });
            }
        }

        let instructions = self
            .prologue
            .iter()
            .chain(self.blocks.iter().flat_map(|block| &block.instructions));

        for instruction in instructions {
            for operand in &instruction.operands {
                if let OperandKind::Label(label) = operand.kind {
                    if self.block(label).is_none() {
                        return Err(IrGenError::UndefinedLabel {
                            function: self.name.clone(),
                            label,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: BlockId,
    pub instructions: Vec<Instruction>,
}

impl Block {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            instructions: Vec::new(),
        }
    }

    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions
            .last()
            .filter(|instruction| instruction.opcode.is_terminator())
    }
}

simple_index! {
    /// Number of an instruction result or function argument
    pub struct Ssa;
}

simple_index! {
    /// Identifies a block within a function, printed as `.BB<n>`
    pub struct BlockId;
}

impl BlockId {
    pub const ZERO: Self = Self(0);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub result: Option<Ssa>,
    pub opcode: Opcode,
    pub operands: Vec<Operand>,
}

impl Instruction {
    pub fn branch(target: BlockId) -> Self {
        Self {
            result: None,
            opcode: Opcode::Br,
            operands: vec![Operand::label(target)],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Opcode {
    /// Allocates a stack slot, yielding a pointer to it
    Reserve,
    Store,
    Load,
    Trunc,
    Sext,
    Zext,
    Const,
    Add,
    Mul,
    Return,
    /// `br label` or `br condition, label, label`
    Br,
}

impl Opcode {
    pub fn is_terminator(self) -> bool {
        matches!(self, Opcode::Return | Opcode::Br)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    I32,
    U32,
    I64,
    U64,
    String,
    /// Reserved for values whose type is decided later
    Variable,
    Variadic,
    Pointer,
    Label,
    /// Reserved for user defined types
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub kind: TypeKind,
    pub name: String,
}

impl Type {
    pub fn new(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Opaque pointer, used for every pointer type and every stack slot
    pub fn pointer() -> Self {
        Self::new(TypeKind::Pointer, "ptr")
    }

    pub fn label() -> Self {
        Self::new(TypeKind::Label, "label")
    }
}

impl From<PrimitiveKind> for Type {
    fn from(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::I32 => Self::new(TypeKind::I32, "i32"),
            PrimitiveKind::I64 => Self::new(TypeKind::I64, "i64"),
            PrimitiveKind::U32 => Self::new(TypeKind::U32, "u32"),
            PrimitiveKind::U64 => Self::new(TypeKind::U64, "u64"),
            PrimitiveKind::String => Self::new(TypeKind::String, "string"),
            PrimitiveKind::Variadic => Self::new(TypeKind::Variadic, "variadic"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub ty: Type,
    pub kind: OperandKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperandKind {
    ConstI32(i32),
    ConstI64(i64),
    ConstU32(u32),
    ConstU64(u64),
    /// Only the type itself, e.g. what to reserve or cast to
    Type,
    Ssa(Ssa),
    /// A global, referred to by name
    Name(String),
    Label(BlockId),
}

impl Operand {
    pub fn new(ty: Type, kind: OperandKind) -> Self {
        Self { ty, kind }
    }

    pub fn ssa(ssa: Ssa, ty: Type) -> Self {
        Self::new(ty, OperandKind::Ssa(ssa))
    }

    pub fn of_type(ty: Type) -> Self {
        Self::new(ty, OperandKind::Type)
    }

    pub fn label(label: BlockId) -> Self {
        Self::new(Type::label(), OperandKind::Label(label))
    }

    /// A constant of the given integer kind, wrapped to its width
    pub fn constant(kind: PrimitiveKind, value: i128) -> Option<Self> {
        let constant = match kind {
            PrimitiveKind::I32 => OperandKind::ConstI32(value as i32),
            PrimitiveKind::I64 => OperandKind::ConstI64(value as i64),
            PrimitiveKind::U32 => OperandKind::ConstU32(value as u32),
            PrimitiveKind::U64 => OperandKind::ConstU64(value as u64),
            PrimitiveKind::String | PrimitiveKind::Variadic => return None,
        };

        Some(Self::new(kind.into(), constant))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IrGenError {
    #[error("Type `{ty}` can't be lowered")]
    UnsupportedType { ty: String },
    #[error("{construct} can't be lowered yet")]
    Unsupported { construct: &'static str },
    #[error("No value named `{name}` exists in `{function}`")]
    UnknownName { function: String, name: String },
    #[error("No common type for `{lhs}` and `{rhs}`")]
    NoCommonType { lhs: String, rhs: String },
    #[error("Initializer of global `{name}` can't be evaluated at compile time")]
    NonConstantGlobal { name: String },
    #[error("Block {block} of `{function}` doesn't end in a terminator")]
    UnterminatedBlock { function: String, block: BlockId },
    #[error("Block {block} of `{function}` has instructions after its terminator")]
    InstructionAfterTerminator { function: String, block: BlockId },
    #[error("`{function}` branches to {label} which doesn't exist")]
    UndefinedLabel { function: String, label: BlockId },
}

impl IrGenError {
    /// Errors which mean an earlier stage let something invalid through
    pub fn is_internal(&self) -> bool {
        !matches!(
            self,
            IrGenError::UnsupportedType { .. } | IrGenError::Unsupported { .. }
        )
    }
}
