//! Parses, represents, transforms, and emits YARA rule source losslessly.
//!
//! This crate sits on top of the engine's layered sub-crates
//! ([`yara_lexer`], [`yara_parse`], [`yara_ir`], [`yara_fmt`],
//! [`yara_modules`]) and exposes the two containers users actually touch:
//! [`YaraFile`], the editable handle onto a parsed (or freshly built) source
//! file, and [`Rule`], a mutator handle onto one of its rules. The four
//! builders under [`builder`] construct new rules, files, conditions, and
//! hex strings from scratch.
//!
//! A single [`yara_ir::TokenStream`] is the source of truth for every
//! `YaraFile`: every mutation, whether a pure token splice (tags, meta,
//! strings) or one that needs a fresh condition expression, ends by leaving
//! that stream in a state that reproduces valid YARA source when formatted.
//! The type is not `Sync`; share a `YaraFile` across threads the way any
//! other `&mut`-based container would be shared, behind a lock.

pub mod builder;
mod file;
mod rule;

pub use builder::{BuiltRule, YaraExpressionBuilder, YaraFileBuilder, YaraHexStringBuilder, YaraRuleBuilder};
pub use file::{LoadError, SymbolRef, YaraFile};
pub use rule::Rule;

// Re-exports of the sub-crates' types callers need to inspect a `Rule`'s
// fields or walk a condition expression, without depending on those crates
// directly.
pub use yara_diagnostic::{BuilderError, LexError, ModuleError, ParseError, SemanticError};
pub use yara_ir::ast::{BinaryOp, ExprId, ExprKind, Quantifier, UnaryOp};
pub use yara_ir::hex::HexUnit;
pub use yara_ir::literal::{IntegerLiteral, IntegerMultiplier, Literal, LiteralKind};
pub use yara_ir::rule::{Import, MetaEntry, StringBody, StringDef, StringModifiers};
pub use yara_ir::{ExprArena, Name, StringInterner};
pub use yara_modules::{Module, ModulePool, ModulePoolConfig};
pub use yara_parse::ParsedRule;
