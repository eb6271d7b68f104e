//! Struct-of-arrays storage for condition-expression trees.

use crate::ast::expr::{ExprId, ExprKind, ExprRange, NameRange};
use crate::ast::ty::ExprType;
use crate::name::Name;
use crate::span::Span;
use crate::token::TokenRange;

#[cold]
fn panic_capacity_exceeded() -> ! {
    panic!("expression arena exceeded u32 capacity")
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or_else(|_| panic_capacity_exceeded())
}

/// Owns every expression node parsed for one file, indexed by [`ExprId`].
///
/// Each node carries, alongside its `ExprKind` and source `Span`, the
/// [`TokenRange`] in the file's shared `TokenStream` that rendered it and
/// the [`ExprType`] the parser's semantic actions derived for it. The token
/// range is what lets [`crate::visitor::ModifyingVisitor`] keep the token
/// stream in lockstep with arena edits instead of only rewriting the tree.
#[derive(Default)]
pub struct ExprArena {
    kinds: Vec<ExprKind>,
    spans: Vec<Span>,
    tokens: Vec<TokenRange>,
    types: Vec<ExprType>,
    expr_lists: Vec<ExprId>,
    name_lists: Vec<Name>,
}

impl ExprArena {
    #[must_use]
    pub fn new() -> Self {
        ExprArena::default()
    }

    /// Allocates a new node and returns its id.
    pub fn push(&mut self, kind: ExprKind, span: Span, tokens: TokenRange, ty: ExprType) -> ExprId {
        let id = to_u32(self.kinds.len());
        self.kinds.push(kind);
        self.spans.push(span);
        self.tokens.push(tokens);
        self.types.push(ty);
        ExprId(id)
    }

    #[must_use]
    pub fn kind(&self, id: ExprId) -> ExprKind {
        self.kinds[id.index()]
    }

    pub fn set_kind(&mut self, id: ExprId, kind: ExprKind) {
        self.kinds[id.index()] = kind;
    }

    #[must_use]
    pub fn span(&self, id: ExprId) -> Span {
        self.spans[id.index()]
    }

    #[must_use]
    pub fn tokens(&self, id: ExprId) -> TokenRange {
        self.tokens[id.index()]
    }

    pub fn set_tokens(&mut self, id: ExprId, tokens: TokenRange) {
        self.tokens[id.index()] = tokens;
    }

    #[must_use]
    pub fn ty(&self, id: ExprId) -> ExprType {
        self.types[id.index()]
    }

    pub fn set_ty(&mut self, id: ExprId, ty: ExprType) {
        self.types[id.index()] = ty;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Copies `items` into the flat expr-list pool and returns the range
    /// describing their position, for use in `Call`/`StringSet`/`List`
    /// nodes.
    pub fn push_expr_list(&mut self, items: &[ExprId]) -> ExprRange {
        let start = to_u32(self.expr_lists.len());
        self.expr_lists.extend_from_slice(items);
        ExprRange { start, len: to_u32(items.len()) }
    }

    #[must_use]
    pub fn expr_list(&self, range: ExprRange) -> &[ExprId] {
        let start = range.start as usize;
        &self.expr_lists[start..start + range.len as usize]
    }

    /// Copies `items` into the flat name-list pool for `for` loop bindings.
    pub fn push_name_list(&mut self, items: &[Name]) -> NameRange {
        let start = to_u32(self.name_lists.len());
        self.name_lists.extend_from_slice(items);
        NameRange { start, len: to_u32(items.len()) }
    }

    #[must_use]
    pub fn name_list(&self, range: NameRange) -> &[Name] {
        let start = range.start as usize;
        &self.name_lists[start..start + range.len as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::expr::{BinaryOp, ExprKind};
    use crate::token::{Token, TokenKind, TokenStream};

    fn range_of(stream: &mut TokenStream, kind: TokenKind) -> TokenRange {
        let id = stream.emplace_back(Token::dummy(kind));
        TokenRange::single(id)
    }

    #[test]
    fn push_and_lookup_round_trips() {
        let mut arena = ExprArena::new();
        let mut stream = TokenStream::new();
        let ta = range_of(&mut stream, TokenKind::IntegerLiteral(1, crate::literal::IntegerMultiplier::None, Name::EMPTY));
        let tb = range_of(&mut stream, TokenKind::IntegerLiteral(2, crate::literal::IntegerMultiplier::None, Name::EMPTY));
        let a = arena.push(ExprKind::IntegerLiteral(1), Span::new(0, 1), ta, ExprType::Int);
        let b = arena.push(ExprKind::IntegerLiteral(2), Span::new(2, 3), tb, ExprType::Int);
        let sum = arena.push(
            ExprKind::Binary { op: BinaryOp::Add, left: a, right: b },
            Span::new(0, 3),
            TokenRange { first: ta.first, last: tb.last },
            ExprType::Int,
        );
        assert_eq!(arena.kind(a), ExprKind::IntegerLiteral(1));
        assert_eq!(arena.ty(sum), ExprType::Int);
        assert_eq!(arena.tokens(sum), TokenRange { first: ta.first, last: tb.last });
        match arena.kind(sum) {
            ExprKind::Binary { op: BinaryOp::Add, left, right } => {
                assert_eq!(left, a);
                assert_eq!(right, b);
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn expr_list_round_trips() {
        let mut arena = ExprArena::new();
        let mut stream = TokenStream::new();
        let ta = range_of(&mut stream, TokenKind::IntegerLiteral(1, crate::literal::IntegerMultiplier::None, Name::EMPTY));
        let tb = range_of(&mut stream, TokenKind::IntegerLiteral(2, crate::literal::IntegerMultiplier::None, Name::EMPTY));
        let a = arena.push(ExprKind::IntegerLiteral(1), Span::DUMMY, ta, ExprType::Int);
        let b = arena.push(ExprKind::IntegerLiteral(2), Span::DUMMY, tb, ExprType::Int);
        let range = arena.push_expr_list(&[a, b]);
        assert_eq!(arena.expr_list(range), &[a, b]);
    }

    #[test]
    fn set_tokens_and_set_ty_overwrite_in_place() {
        let mut arena = ExprArena::new();
        let mut stream = TokenStream::new();
        let t = range_of(&mut stream, TokenKind::KwTrue);
        let id = arena.push(ExprKind::BoolLiteral(true), Span::DUMMY, t, ExprType::Undefined);
        arena.set_ty(id, ExprType::Bool);
        assert_eq!(arena.ty(id), ExprType::Bool);
        let t2 = range_of(&mut stream, TokenKind::KwFalse);
        arena.set_tokens(id, t2);
        assert_eq!(arena.tokens(id), t2);
    }
}
