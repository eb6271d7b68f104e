//! The condition-expression AST.
//!
//! Nodes are stored by value in an [`crate::ast::arena::ExprArena`] and
//! referenced through [`ExprId`] indices rather than `Box<Expr>`, the way
//! the teacher's expression arena avoids per-node heap allocation.

use crate::name::Name;

/// An index into an [`crate::ast::arena::ExprArena`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ExprId(pub(crate) u32);

impl ExprId {
    pub const INVALID: ExprId = ExprId(u32::MAX);

    #[must_use]
    pub fn is_valid(self) -> bool {
        self != ExprId::INVALID
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A contiguous run of [`ExprId`]s stored in the arena's flat list pool.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ExprRange {
    pub(crate) start: u32,
    pub(crate) len: u32,
}

impl ExprRange {
    pub const EMPTY: ExprRange = ExprRange { start: 0, len: 0 };

    #[must_use]
    pub fn len(self) -> usize {
        self.len as usize
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// A contiguous run of interned [`Name`]s, used for `for` loop bindings.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct NameRange {
    pub(crate) start: u32,
    pub(crate) len: u32,
}

impl NameRange {
    pub const EMPTY: NameRange = NameRange { start: 0, len: 0 };

    #[must_use]
    pub fn len(self) -> usize {
        self.len as usize
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    BitNot,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Contains,
    IContains,
    StartsWith,
    IStartsWith,
    EndsWith,
    IEndsWith,
    Matches,
}

/// `intN`/`uintN` families, with an endianness flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntFunctionKind {
    Int8, Int16, Int32,
    Uint8, Uint16, Uint32,
    Int8be, Int16be, Int32be,
    Uint8be, Uint16be, Uint32be,
}

/// The count (or percentage) required by an `of`/`for ... of` expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quantifier {
    All,
    Any,
    None,
    /// An arbitrary counting expression, e.g. `3 of them` or `50% of them`.
    Count(ExprId),
    Percentage(ExprId),
}

/// One node of the condition-expression tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExprKind {
    IntegerLiteral(i64),
    FloatLiteral(f64),
    BoolLiteral(bool),
    TextLiteral(Name),

    Filesize,
    Entrypoint,
    Them,
    /// The `this` keyword, referring to the structure a module schema is
    /// currently nested under (e.g. inside a `for` over that structure).
    This,

    StringRef(Name),
    /// A string reference inside a string set, e.g. `$a*` matching any
    /// string whose identifier starts with `a`.
    StringWildcard(Name),
    StringCount(Name),
    StringOffset { name: Name, index: ExprId },
    StringLength { name: Name, index: ExprId },
    StringAt { name: Name, offset: ExprId },
    StringIn { name: Name, range: ExprId },

    Range { low: ExprId, high: ExprId },

    Identifier(Name),
    Field { receiver: ExprId, field: Name },
    Index { receiver: ExprId, index: ExprId },
    Call { callee: ExprId, args: ExprRange },
    IntFunction { kind: IntFunctionKind, arg: ExprId },

    Unary { op: UnaryOp, operand: ExprId },
    Binary { op: BinaryOp, left: ExprId, right: ExprId },
    Defined(ExprId),
    /// A regexp literal used as an operand of `matches`, stored as its raw
    /// lexeme; structural parsing into [`crate::regexp::RegexpUnit`] happens
    /// on demand rather than eagerly for every condition expression.
    RegexpLiteral(Name),

    /// A parenthesized list of string refs/wildcards, e.g. `($a, $b*)`.
    StringSet(ExprRange),
    /// A parenthesized list of arbitrary expressions, used as a `for`
    /// iterable, e.g. `for i in (1, 2, 3)`.
    List(ExprRange),

    Of { quantifier: Quantifier, set: ExprId, in_range: Option<ExprId> },
    ForStrings { quantifier: Quantifier, set: ExprId, body: ExprId },
    ForIteration { quantifier: Quantifier, bindings: NameRange, iterable: ExprId, body: ExprId },

    /// A `with <name> = <value>, ... : (<body>)` scoped binding: evaluates
    /// `body` with each `names[i]` locally bound to `values[i]`.
    With { names: NameRange, values: ExprRange, body: ExprId },

    /// Placeholder left behind when parsing could not produce a valid node
    /// (the grammar stops at the first error, per the engine's no-recovery
    /// policy, but a placeholder keeps earlier arena indices meaningful).
    Error,
}
