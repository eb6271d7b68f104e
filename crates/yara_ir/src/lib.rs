//! Intermediate representation for the yaramod engine: spans, interned
//! names, literals, the lossless token stream, the condition-expression
//! arena, module symbol schema, and the dual visitor framework.

pub mod ast;
pub mod hex;
pub mod literal;
pub mod name;
pub mod regexp;
pub mod rule;
pub mod span;
pub mod symbol;
pub mod token;
pub mod visitor;

pub use ast::{ExprArena, ExprId, ExprKind, ExprType};
pub use literal::{IntegerLiteral, IntegerMultiplier, Literal, LiteralKind};
pub use name::{Name, SharedInterner, StringInterner};
pub use rule::{Import, MetaEntry, StringBody, StringDef, StringModifiers};
pub use span::{Span, SpanError};
pub use symbol::{FunctionOverload, Structure, StructureError, Symbol, ValueType};
pub use token::{Token, TokenId, TokenKind, TokenRange, TokenStream};
pub use visitor::{ModifyingVisitor, ObservingVisitor, VisitResult};
