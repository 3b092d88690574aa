//! Everything after parsing. The AST is checked and normalized by [`sema`],
//! then flattened into the SSA form in [`ir`].

pub mod ir;
pub mod primitive;
pub mod sema;
