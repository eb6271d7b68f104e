//! Observing and modifying traversal over the condition-expression tree.
//!
//! [`ObservingVisitor`] mirrors a read-only walk with default `visit_*`
//! methods that delegate to free `walk_*` functions — override only the
//! nodes you care about. [`ModifyingVisitor`] additionally lets a visitor
//! replace or delete a subtree. The arena is value data and easy to edit in
//! isolation, but emission replays the token stream, not the arena, so every
//! edit also repairs the stream: a replacement erases the old child's token
//! range and splices in tokens for the new node; a deletion erases the
//! range and, in a list or an `and`/`or` chain, the separator that went with
//! it. Ancestor nodes whose own first/last token coincided with the edited
//! child's boundary are rewired to the new boundary.

use crate::ast::arena::ExprArena;
use crate::ast::expr::{BinaryOp, ExprId, ExprKind, ExprRange, Quantifier};
use crate::ast::ty::ExprType;
use crate::literal::IntegerMultiplier;
use crate::name::StringInterner;
use crate::token::{Token, TokenId, TokenKind, TokenRange, TokenStream};

/// A read-only visitor over condition expressions.
pub trait ObservingVisitor {
    fn visit_expr(&mut self, arena: &ExprArena, id: ExprId) {
        walk_expr(self, arena, id);
    }
}

/// Default traversal for [`ObservingVisitor`]: visits every child of `id`.
pub fn walk_expr<V: ObservingVisitor + ?Sized>(visitor: &mut V, arena: &ExprArena, id: ExprId) {
    match arena.kind(id) {
        ExprKind::Binary { left, right, .. } => {
            visitor.visit_expr(arena, left);
            visitor.visit_expr(arena, right);
        }
        ExprKind::Unary { operand, .. } | ExprKind::Defined(operand) => {
            visitor.visit_expr(arena, operand);
        }
        ExprKind::Field { receiver, .. } => visitor.visit_expr(arena, receiver),
        ExprKind::Index { receiver, index } => {
            visitor.visit_expr(arena, receiver);
            visitor.visit_expr(arena, index);
        }
        ExprKind::Call { callee, args } => {
            visitor.visit_expr(arena, callee);
            for &arg in arena.expr_list(args) {
                visitor.visit_expr(arena, arg);
            }
        }
        ExprKind::IntFunction { arg, .. } => visitor.visit_expr(arena, arg),
        ExprKind::Range { low, high } => {
            visitor.visit_expr(arena, low);
            visitor.visit_expr(arena, high);
        }
        ExprKind::StringOffset { index, .. } | ExprKind::StringLength { index, .. } => {
            visitor.visit_expr(arena, index);
        }
        ExprKind::StringAt { offset, .. } => visitor.visit_expr(arena, offset),
        ExprKind::StringIn { range, .. } => visitor.visit_expr(arena, range),
        ExprKind::StringSet(range) | ExprKind::List(range) => {
            for &item in arena.expr_list(range) {
                visitor.visit_expr(arena, item);
            }
        }
        ExprKind::Of { quantifier, set, in_range } => {
            walk_quantifier(visitor, arena, quantifier);
            visitor.visit_expr(arena, set);
            if let Some(r) = in_range {
                visitor.visit_expr(arena, r);
            }
        }
        ExprKind::ForStrings { quantifier, set, body } => {
            walk_quantifier(visitor, arena, quantifier);
            visitor.visit_expr(arena, set);
            visitor.visit_expr(arena, body);
        }
        ExprKind::ForIteration { quantifier, iterable, body, .. } => {
            walk_quantifier(visitor, arena, quantifier);
            visitor.visit_expr(arena, iterable);
            visitor.visit_expr(arena, body);
        }
        ExprKind::With { values, body, .. } => {
            for &v in arena.expr_list(values) {
                visitor.visit_expr(arena, v);
            }
            visitor.visit_expr(arena, body);
        }
        ExprKind::IntegerLiteral(_)
        | ExprKind::FloatLiteral(_)
        | ExprKind::BoolLiteral(_)
        | ExprKind::TextLiteral(_)
        | ExprKind::Filesize
        | ExprKind::Entrypoint
        | ExprKind::Them
        | ExprKind::This
        | ExprKind::StringRef(_)
        | ExprKind::StringWildcard(_)
        | ExprKind::StringCount(_)
        | ExprKind::Identifier(_)
        | ExprKind::RegexpLiteral(_)
        | ExprKind::Error => {}
    }
}

fn walk_quantifier<V: ObservingVisitor + ?Sized>(visitor: &mut V, arena: &ExprArena, q: Quantifier) {
    match q {
        Quantifier::Count(e) | Quantifier::Percentage(e) => visitor.visit_expr(arena, e),
        Quantifier::All | Quantifier::Any | Quantifier::None => {}
    }
}

/// Outcome of visiting one node with a [`ModifyingVisitor`].
pub enum VisitResult {
    /// Leave the node as-is and continue descending into its children.
    Keep,
    /// Replace the node with a freshly built node, and stop descending
    /// (the replacement's own children are not re-visited). The old node's
    /// token range is erased and, for leaf kinds, new tokens are spliced in
    /// its place; composite kinds keep the old tokens, since the trait
    /// carries no spelling for a rebuilt subtree.
    Replace(ExprKind),
    /// Remove the node and erase its token range. Valid anywhere; inside a
    /// list-valued parent (a `Call`'s arguments, a `StringSet`, a `List`)
    /// the element is dropped entirely and one adjacent comma goes with it;
    /// as an `and`/`or` operand the whole binary collapses to the surviving
    /// side and the operator keyword goes with it; anywhere else the node
    /// is replaced with `ExprKind::Error`.
    Delete,
}

/// A visitor that may rewrite the tree as it walks it.
pub trait ModifyingVisitor {
    fn visit_expr(&mut self, arena: &mut ExprArena, id: ExprId) -> VisitResult {
        let _ = (arena, id);
        VisitResult::Keep
    }
}

/// Builds the token a leaf `ExprKind` would render as, when it has a single
/// natural token spelling. Composite kinds (anything with a child `ExprId`)
/// have no single spelling and return `None`.
fn leaf_token_kind(kind: ExprKind, interner: &StringInterner) -> Option<TokenKind> {
    match kind {
        ExprKind::IntegerLiteral(v) => {
            let source = interner.intern(&v.to_string());
            Some(TokenKind::IntegerLiteral(v, IntegerMultiplier::None, source))
        }
        ExprKind::FloatLiteral(f) => Some(TokenKind::FloatLiteral(f)),
        ExprKind::BoolLiteral(true) => Some(TokenKind::KwTrue),
        ExprKind::BoolLiteral(false) => Some(TokenKind::KwFalse),
        ExprKind::TextLiteral(name) => Some(TokenKind::StringLiteral(name)),
        ExprKind::Filesize => Some(TokenKind::KwFilesize),
        ExprKind::Entrypoint => Some(TokenKind::KwEntrypoint),
        ExprKind::Them => Some(TokenKind::KwThem),
        ExprKind::This => Some(TokenKind::KwThis),
        ExprKind::StringRef(name) => Some(TokenKind::StringId(name)),
        ExprKind::StringWildcard(name) => Some(TokenKind::StringIdWildcard(name)),
        ExprKind::StringCount(name) => Some(TokenKind::StringCount(name)),
        ExprKind::Identifier(name) => Some(TokenKind::Identifier(name)),
        ExprKind::RegexpLiteral(name) => Some(TokenKind::RegexpLiteral(name)),
        _ => None,
    }
}

/// Erases every token in `range`, inclusive of both ends.
fn erase_range(tokens: &mut TokenStream, range: TokenRange) {
    let mut cur = Some(range.first);
    while let Some(id) = cur {
        let next = tokens.next_id(id);
        let last = id == range.last;
        tokens.erase(id);
        if last {
            break;
        }
        cur = next;
    }
}

/// Applies `visitor` to the subtree rooted at `id`, returning the
/// (possibly new) id of the surviving root, or `None` if the root itself
/// was deleted. `tokens` is the same stream the parser built `arena` from;
/// `interner` resolves the `Name`s leaf replacements need to synthesize a
/// spelling for.
pub fn visit_expr_mut<V: ModifyingVisitor + ?Sized>(
    visitor: &mut V,
    arena: &mut ExprArena,
    tokens: &mut TokenStream,
    interner: &StringInterner,
    id: ExprId,
) -> Option<ExprId> {
    apply_mut(visitor, arena, tokens, interner, id)
}

fn apply_mut<V: ModifyingVisitor + ?Sized>(
    visitor: &mut V,
    arena: &mut ExprArena,
    tokens: &mut TokenStream,
    interner: &StringInterner,
    id: ExprId,
) -> Option<ExprId> {
    match visitor.visit_expr(arena, id) {
        VisitResult::Delete => {
            erase_range(tokens, arena.tokens(id));
            None
        }
        VisitResult::Replace(new_kind) => {
            let span = arena.span(id);
            let ty = arena.ty(id);
            let old_range = arena.tokens(id);
            let new_range = match leaf_token_kind(new_kind, interner) {
                Some(tk) => {
                    let new_id = tokens.emplace_before(old_range.first, Token::new(tk, span));
                    erase_range(tokens, old_range);
                    TokenRange::single(new_id)
                }
                None => old_range,
            };
            Some(arena.push(new_kind, span, new_range, ty))
        }
        VisitResult::Keep => {
            visit_children_mut(visitor, arena, tokens, interner, id);
            Some(id)
        }
    }
}

/// Applies `apply_mut` to a required child, substituting `ExprKind::Error`
/// at a fresh placeholder token if the visitor deleted it, so the parent's
/// token range keeps exactly one token in the gap the child used to occupy.
fn required<V: ModifyingVisitor + ?Sized>(
    visitor: &mut V,
    arena: &mut ExprArena,
    tokens: &mut TokenStream,
    interner: &StringInterner,
    child: ExprId,
) -> ExprId {
    let span = arena.span(child);
    let range = arena.tokens(child);
    let after = tokens.next_id(range.last);
    let before = tokens.prev_id(range.first);
    match apply_mut(visitor, arena, tokens, interner, child) {
        Some(new_id) => new_id,
        None => {
            let placeholder = match after {
                Some(a) => tokens.emplace_before(a, Token::new(TokenKind::Error, span)),
                None => match before {
                    Some(b) => tokens.emplace_after(b, Token::new(TokenKind::Error, span)),
                    None => tokens.emplace_back(Token::new(TokenKind::Error, span)),
                },
            };
            arena.push(ExprKind::Error, span, TokenRange::single(placeholder), ExprType::Undefined)
        }
    }
}

fn is_comma(tokens: &TokenStream, id: TokenId) -> bool {
    tokens.get(id).map(|t| t.kind) == Some(TokenKind::Comma)
}

fn list_mut<V: ModifyingVisitor + ?Sized>(
    visitor: &mut V,
    arena: &mut ExprArena,
    tokens: &mut TokenStream,
    interner: &StringInterner,
    range: ExprRange,
) -> ExprRange {
    let items: Vec<ExprId> = arena.expr_list(range).to_vec();
    let mut kept = Vec::with_capacity(items.len());
    for item in items {
        let item_range = arena.tokens(item);
        let after = tokens.next_id(item_range.last);
        let before = tokens.prev_id(item_range.first);
        match apply_mut(visitor, arena, tokens, interner, item) {
            Some(new_id) => kept.push(new_id),
            None => {
                let comma = after
                    .filter(|&a| is_comma(tokens, a))
                    .or_else(|| before.filter(|&b| is_comma(tokens, b)));
                if let Some(c) = comma {
                    tokens.erase(c);
                }
            }
        }
    }
    arena.push_expr_list(&kept)
}

fn quantifier_mut<V: ModifyingVisitor + ?Sized>(
    visitor: &mut V,
    arena: &mut ExprArena,
    tokens: &mut TokenStream,
    interner: &StringInterner,
    q: Quantifier,
) -> Quantifier {
    match q {
        Quantifier::Count(e) => Quantifier::Count(required(visitor, arena, tokens, interner, e)),
        Quantifier::Percentage(e) => Quantifier::Percentage(required(visitor, arena, tokens, interner, e)),
        other @ (Quantifier::All | Quantifier::Any | Quantifier::None) => other,
    }
}

fn visit_children_mut<V: ModifyingVisitor + ?Sized>(
    visitor: &mut V,
    arena: &mut ExprArena,
    tokens: &mut TokenStream,
    interner: &StringInterner,
    id: ExprId,
) {
    let kind = arena.kind(id);
    match kind {
        ExprKind::Binary { op, left, right } if matches!(op, BinaryOp::And | BinaryOp::Or) => {
            let left_tokens = arena.tokens(left);
            let right_tokens = arena.tokens(right);
            let new_left = apply_mut(visitor, arena, tokens, interner, left);
            let new_right = apply_mut(visitor, arena, tokens, interner, right);
            match (new_left, new_right) {
                (Some(l), Some(r)) => {
                    arena.set_tokens(id, TokenRange { first: arena.tokens(l).first, last: arena.tokens(r).last });
                    arena.set_kind(id, ExprKind::Binary { op, left: l, right: r });
                }
                (Some(l), None) => {
                    // right operand deleted: the `and`/`or` token sat right
                    // after left's own tokens, since trivia isn't in this
                    // stream.
                    if let Some(op_tok) = tokens.next_id(left_tokens.last) {
                        tokens.erase(op_tok);
                    }
                    arena.set_tokens(id, arena.tokens(l));
                    arena.set_ty(id, arena.ty(l));
                    arena.set_kind(id, arena.kind(l));
                }
                (None, Some(r)) => {
                    if let Some(op_tok) = tokens.prev_id(right_tokens.first) {
                        tokens.erase(op_tok);
                    }
                    arena.set_tokens(id, arena.tokens(r));
                    arena.set_ty(id, arena.ty(r));
                    arena.set_kind(id, arena.kind(r));
                }
                (None, None) => {
                    // Both operands gone: nothing sensible to collapse to.
                    arena.set_kind(id, ExprKind::Error);
                }
            }
        }
        ExprKind::Binary { op, left, right } => {
            let left = required(visitor, arena, tokens, interner, left);
            let right = required(visitor, arena, tokens, interner, right);
            arena.set_tokens(id, TokenRange { first: arena.tokens(left).first, last: arena.tokens(right).last });
            arena.set_kind(id, ExprKind::Binary { op, left, right });
        }
        ExprKind::Unary { op, operand } => {
            let old_first = arena.tokens(id).first;
            let operand = required(visitor, arena, tokens, interner, operand);
            arena.set_tokens(id, TokenRange { first: old_first, last: arena.tokens(operand).last });
            arena.set_kind(id, ExprKind::Unary { op, operand });
        }
        ExprKind::Defined(inner) => {
            let inner = required(visitor, arena, tokens, interner, inner);
            arena.set_kind(id, ExprKind::Defined(inner));
        }
        ExprKind::Field { receiver, field } => {
            let old_last = arena.tokens(id).last;
            let receiver = required(visitor, arena, tokens, interner, receiver);
            arena.set_tokens(id, TokenRange { first: arena.tokens(receiver).first, last: old_last });
            arena.set_kind(id, ExprKind::Field { receiver, field });
        }
        ExprKind::Index { receiver, index } => {
            let old_last = arena.tokens(id).last;
            let receiver = required(visitor, arena, tokens, interner, receiver);
            let index = required(visitor, arena, tokens, interner, index);
            arena.set_tokens(id, TokenRange { first: arena.tokens(receiver).first, last: old_last });
            arena.set_kind(id, ExprKind::Index { receiver, index });
        }
        ExprKind::Call { callee, args } => {
            let old_last = arena.tokens(id).last;
            let callee = required(visitor, arena, tokens, interner, callee);
            let args = list_mut(visitor, arena, tokens, interner, args);
            arena.set_tokens(id, TokenRange { first: arena.tokens(callee).first, last: old_last });
            arena.set_kind(id, ExprKind::Call { callee, args });
        }
        ExprKind::IntFunction { kind: fn_kind, arg } => {
            let arg = required(visitor, arena, tokens, interner, arg);
            arena.set_kind(id, ExprKind::IntFunction { kind: fn_kind, arg });
        }
        ExprKind::Range { low, high } => {
            let low = required(visitor, arena, tokens, interner, low);
            let high = required(visitor, arena, tokens, interner, high);
            arena.set_kind(id, ExprKind::Range { low, high });
        }
        ExprKind::StringOffset { name, index } => {
            let index = required(visitor, arena, tokens, interner, index);
            arena.set_kind(id, ExprKind::StringOffset { name, index });
        }
        ExprKind::StringLength { name, index } => {
            let index = required(visitor, arena, tokens, interner, index);
            arena.set_kind(id, ExprKind::StringLength { name, index });
        }
        ExprKind::StringAt { name, offset } => {
            let offset = required(visitor, arena, tokens, interner, offset);
            arena.set_kind(id, ExprKind::StringAt { name, offset });
        }
        ExprKind::StringIn { name, range } => {
            let range = required(visitor, arena, tokens, interner, range);
            arena.set_kind(id, ExprKind::StringIn { name, range });
        }
        ExprKind::StringSet(range) => {
            let range = list_mut(visitor, arena, tokens, interner, range);
            arena.set_kind(id, ExprKind::StringSet(range));
        }
        ExprKind::List(range) => {
            let range = list_mut(visitor, arena, tokens, interner, range);
            arena.set_kind(id, ExprKind::List(range));
        }
        ExprKind::Of { quantifier, set, in_range } => {
            let old_first = arena.tokens(id).first;
            let quantifier = quantifier_mut(visitor, arena, tokens, interner, quantifier);
            let set = required(visitor, arena, tokens, interner, set);
            let in_range = in_range.map(|r| required(visitor, arena, tokens, interner, r));
            let new_first = match quantifier {
                Quantifier::Count(e) | Quantifier::Percentage(e) => arena.tokens(e).first,
                Quantifier::All | Quantifier::Any | Quantifier::None => old_first,
            };
            let new_last = match in_range {
                Some(r) => arena.tokens(r).last,
                None => arena.tokens(set).last,
            };
            arena.set_tokens(id, TokenRange { first: new_first, last: new_last });
            arena.set_kind(id, ExprKind::Of { quantifier, set, in_range });
        }
        ExprKind::ForStrings { quantifier, set, body } => {
            let quantifier = quantifier_mut(visitor, arena, tokens, interner, quantifier);
            let set = required(visitor, arena, tokens, interner, set);
            let body = required(visitor, arena, tokens, interner, body);
            arena.set_kind(id, ExprKind::ForStrings { quantifier, set, body });
        }
        ExprKind::ForIteration { quantifier, bindings, iterable, body } => {
            let quantifier = quantifier_mut(visitor, arena, tokens, interner, quantifier);
            let iterable = required(visitor, arena, tokens, interner, iterable);
            let body = required(visitor, arena, tokens, interner, body);
            arena.set_kind(id, ExprKind::ForIteration { quantifier, bindings, iterable, body });
        }
        ExprKind::With { names, values, body } => {
            let values = list_mut(visitor, arena, tokens, interner, values);
            let body = required(visitor, arena, tokens, interner, body);
            arena.set_kind(id, ExprKind::With { names, values, body });
        }
        ExprKind::IntegerLiteral(_)
        | ExprKind::FloatLiteral(_)
        | ExprKind::BoolLiteral(_)
        | ExprKind::TextLiteral(_)
        | ExprKind::Filesize
        | ExprKind::Entrypoint
        | ExprKind::Them
        | ExprKind::This
        | ExprKind::StringRef(_)
        | ExprKind::StringWildcard(_)
        | ExprKind::StringCount(_)
        | ExprKind::Identifier(_)
        | ExprKind::RegexpLiteral(_)
        | ExprKind::Error => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::expr::BinaryOp;
    use crate::span::Span;

    fn push_tok(stream: &mut TokenStream, kind: TokenKind) -> TokenRange {
        TokenRange::single(stream.emplace_back(Token::dummy(kind)))
    }

    fn int_lit(arena: &mut ExprArena, stream: &mut TokenStream, v: i64) -> ExprId {
        let t = push_tok(stream, TokenKind::IntegerLiteral(v, IntegerMultiplier::None, crate::name::Name::EMPTY));
        arena.push(ExprKind::IntegerLiteral(v), Span::DUMMY, t, ExprType::Int)
    }

    fn stream_kinds(stream: &TokenStream) -> Vec<TokenKind> {
        stream.iter().map(|(_, t)| t.kind).collect()
    }

    struct CountLiterals(usize);
    impl ObservingVisitor for CountLiterals {
        fn visit_expr(&mut self, arena: &ExprArena, id: ExprId) {
            if matches!(arena.kind(id), ExprKind::IntegerLiteral(_)) {
                self.0 += 1;
            }
            walk_expr(self, arena, id);
        }
    }

    #[test]
    fn observing_visitor_counts_leaves() {
        let mut arena = ExprArena::new();
        let mut stream = TokenStream::new();
        let a = int_lit(&mut arena, &mut stream, 1);
        let b = int_lit(&mut arena, &mut stream, 2);
        let sum = arena.push(
            ExprKind::Binary { op: BinaryOp::Add, left: a, right: b },
            Span::DUMMY,
            TokenRange { first: arena.tokens(a).first, last: arena.tokens(b).last },
            ExprType::Int,
        );
        let mut counter = CountLiterals(0);
        counter.visit_expr(&arena, sum);
        assert_eq!(counter.0, 2);
    }

    struct ReplaceTen;
    impl ModifyingVisitor for ReplaceTen {
        fn visit_expr(&mut self, arena: &mut ExprArena, id: ExprId) -> VisitResult {
            match arena.kind(id) {
                ExprKind::IntegerLiteral(10) => VisitResult::Replace(ExprKind::IntegerLiteral(111)),
                _ => VisitResult::Keep,
            }
        }
    }

    /// `10 + 10 > 5` rewritten to `111 + 111 > 5`, with no `10` left in the
    /// token stream: the arena and the stream it renders from must agree.
    #[test]
    fn replacing_a_literal_repairs_the_token_stream() {
        let interner = StringInterner::new();
        let mut arena = ExprArena::new();
        let mut stream = TokenStream::new();
        let a = int_lit(&mut arena, &mut stream, 10);
        let b = int_lit(&mut arena, &mut stream, 10);
        let sum = arena.push(
            ExprKind::Binary { op: BinaryOp::Add, left: a, right: b },
            Span::DUMMY,
            TokenRange { first: arena.tokens(a).first, last: arena.tokens(b).last },
            ExprType::Int,
        );
        let five_tok = push_tok(&mut stream, TokenKind::IntegerLiteral(5, IntegerMultiplier::None, crate::name::Name::EMPTY));
        let five = arena.push(ExprKind::IntegerLiteral(5), Span::DUMMY, five_tok, ExprType::Int);
        let cmp = arena.push(
            ExprKind::Binary { op: BinaryOp::Gt, left: sum, right: five },
            Span::DUMMY,
            TokenRange { first: arena.tokens(sum).first, last: arena.tokens(five).last },
            ExprType::Bool,
        );

        let new_root = visit_expr_mut(&mut ReplaceTen, &mut arena, &mut stream, &interner, cmp).unwrap();

        match arena.kind(new_root) {
            ExprKind::Binary { left: new_sum, right: new_five, op: BinaryOp::Gt } => {
                match arena.kind(new_sum) {
                    ExprKind::Binary { left, right, op: BinaryOp::Add } => {
                        assert_eq!(arena.kind(left), ExprKind::IntegerLiteral(111));
                        assert_eq!(arena.kind(right), ExprKind::IntegerLiteral(111));
                    }
                    other => panic!("unexpected kind: {other:?}"),
                }
                assert_eq!(arena.kind(new_five), ExprKind::IntegerLiteral(5));
            }
            other => panic!("unexpected kind: {other:?}"),
        }

        let kinds = stream_kinds(&stream);
        assert!(!kinds.iter().any(|k| *k == TokenKind::IntegerLiteral(10, IntegerMultiplier::None, crate::name::Name::EMPTY)));
        let elevens = kinds.iter().filter(|k| matches!(k, TokenKind::IntegerLiteral(111, ..))).count();
        assert_eq!(elevens, 2);
    }

    struct DeleteOdd;
    impl ModifyingVisitor for DeleteOdd {
        fn visit_expr(&mut self, arena: &mut ExprArena, id: ExprId) -> VisitResult {
            match arena.kind(id) {
                ExprKind::IntegerLiteral(v) if v % 2 == 1 => VisitResult::Delete,
                _ => VisitResult::Keep,
            }
        }
    }

    #[test]
    fn deleting_a_list_member_shrinks_the_list_and_erases_its_comma() {
        let interner = StringInterner::new();
        let mut arena = ExprArena::new();
        let mut stream = TokenStream::new();
        let lparen = push_tok(&mut stream, TokenKind::LParenEnumeration);
        let a = int_lit(&mut arena, &mut stream, 1);
        let comma1 = push_tok(&mut stream, TokenKind::Comma);
        let b = int_lit(&mut arena, &mut stream, 2);
        let comma2 = push_tok(&mut stream, TokenKind::Comma);
        let c = int_lit(&mut arena, &mut stream, 3);
        let rparen = push_tok(&mut stream, TokenKind::RParen);
        let range = arena.push_expr_list(&[a, b, c]);
        let list = arena.push(
            ExprKind::List(range),
            Span::DUMMY,
            TokenRange { first: lparen.first, last: rparen.first },
            ExprType::Undefined,
        );

        let new_root = visit_expr_mut(&mut DeleteOdd, &mut arena, &mut stream, &interner, list).unwrap();
        match arena.kind(new_root) {
            ExprKind::List(r) => {
                assert_eq!(r.len(), 1);
                assert_eq!(arena.kind(arena.expr_list(r)[0]), ExprKind::IntegerLiteral(2));
            }
            other => panic!("unexpected kind: {other:?}"),
        }

        let kinds = stream_kinds(&stream);
        assert_eq!(kinds, vec![TokenKind::LParenEnumeration, TokenKind::IntegerLiteral(2, IntegerMultiplier::None, crate::name::Name::EMPTY), TokenKind::RParen]);
        let _ = (comma1, comma2);
    }

    #[test]
    fn deleting_a_required_child_substitutes_error() {
        let interner = StringInterner::new();
        let mut arena = ExprArena::new();
        let mut stream = TokenStream::new();
        let a = int_lit(&mut arena, &mut stream, 2);
        let b = int_lit(&mut arena, &mut stream, 3);
        let sum = arena.push(
            ExprKind::Binary { op: BinaryOp::Add, left: a, right: b },
            Span::DUMMY,
            TokenRange { first: arena.tokens(a).first, last: arena.tokens(b).last },
            ExprType::Int,
        );
        let new_root = visit_expr_mut(&mut DeleteOdd, &mut arena, &mut stream, &interner, sum).unwrap();
        match arena.kind(new_root) {
            ExprKind::Binary { left, right, .. } => {
                assert_eq!(arena.kind(left), ExprKind::IntegerLiteral(2));
                assert_eq!(arena.kind(right), ExprKind::Error);
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn deleting_an_and_operand_collapses_to_the_survivor_and_erases_the_keyword() {
        let interner = StringInterner::new();
        let mut arena = ExprArena::new();
        let mut stream = TokenStream::new();
        let a = int_lit(&mut arena, &mut stream, 2);
        let and_tok = push_tok(&mut stream, TokenKind::KwAnd);
        let b = int_lit(&mut arena, &mut stream, 3);
        let both = arena.push(
            ExprKind::Binary { op: BinaryOp::And, left: a, right: b },
            Span::DUMMY,
            TokenRange { first: arena.tokens(a).first, last: arena.tokens(b).last },
            ExprType::Bool,
        );
        let new_root = visit_expr_mut(&mut DeleteOdd, &mut arena, &mut stream, &interner, both).unwrap();
        assert_eq!(arena.kind(new_root), ExprKind::IntegerLiteral(2));
        let kinds = stream_kinds(&stream);
        assert_eq!(kinds, vec![TokenKind::IntegerLiteral(2, IntegerMultiplier::None, crate::name::Name::EMPTY)]);
        let _ = and_tok;
    }
}
