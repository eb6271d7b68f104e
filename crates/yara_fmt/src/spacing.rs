//! Token-adjacency spacing cascade.
//!
//! Spacing between two replayed tokens is driven entirely by their kinds,
//! the way the lexer's three distinct left-paren kinds let later stages stay
//! kind-driven instead of re-deriving grammatical context from the AST.

use yara_ir::TokenKind;

/// Whether `next` should be separated from the previously emitted token by a
/// space, given whether that previous token left us expecting an operand
/// (relevant for telling a unary `-`/`~` from the binary operator).
#[must_use]
pub fn needs_space(prev: TokenKind, next: TokenKind, prev_expects_operand: bool) -> bool {
    use TokenKind::*;

    if matches!(next, Comma | Dot | RParen | RBracket | Colon) {
        return false;
    }
    if matches!(prev, LParenPlain | LParenCall | LParenEnumeration | LBracket | Dot) {
        return false;
    }
    if matches!(next, LParenCall | LBracket) {
        return false;
    }
    if matches!(prev, Minus | Tilde) && prev_expects_operand {
        return false;
    }
    // A bare identifier right after a regexp literal is its flags (`/foo/i`),
    // never a separate operand.
    if matches!(prev, RegexpLiteral(_)) && matches!(next, Identifier(_)) {
        return false;
    }
    true
}

/// True when having just emitted `kind`, a following `-`/`~` would be parsed
/// as a unary operator rather than a binary one.
#[must_use]
pub fn expects_operand_next(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        LParenPlain
            | LParenCall
            | LParenEnumeration
            | LBracket
            | LBrace
            | Comma
            | Colon
            | Equals
            | KwAt
            | KwIn
            | DotDot
            | Pipe
            | Caret
            | Amp
            | Shl
            | Shr
            | Lt
            | Le
            | Gt
            | Ge
            | EqEq
            | Ne
            | Plus
            | Minus
            | Star
            | Backslash
            | Percent
            | Tilde
            | KwAnd
            | KwOr
            | KwNot
            | KwOf
            | KwMatches
            | KwContains
            | KwIcontains
            | KwStartswith
            | KwIstartswith
            | KwEndswith
            | KwIendswith
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_paren_binds_tight_to_its_callee() {
        assert!(!needs_space(TokenKind::Identifier(yara_ir::Name::EMPTY), TokenKind::LParenCall, false));
    }

    #[test]
    fn comma_never_gets_a_leading_space() {
        assert!(!needs_space(TokenKind::StringId(yara_ir::Name::EMPTY), TokenKind::Comma, false));
    }

    #[test]
    fn unary_minus_after_an_operator_binds_tight() {
        assert!(!needs_space(TokenKind::Equals, TokenKind::Minus, true));
    }

    #[test]
    fn binary_minus_between_operands_gets_spaces() {
        assert!(needs_space(TokenKind::IntegerLiteral(1, yara_ir::IntegerMultiplier::None, yara_ir::Name::EMPTY), TokenKind::Minus, false));
    }
}
