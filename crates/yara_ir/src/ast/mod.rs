//! Condition-expression AST: node kinds, ids, and the arena that owns them.

pub mod arena;
pub mod expr;
pub mod ty;

pub use arena::ExprArena;
pub use expr::{
    BinaryOp, ExprId, ExprKind, ExprRange, IntFunctionKind, NameRange, Quantifier, UnaryOp,
};
pub use ty::ExprType;
