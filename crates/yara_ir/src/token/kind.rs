//! Token kind tags.

use crate::literal::{IntegerMultiplier, Literal};
use crate::name::Name;

/// Every distinct lexeme kind the scanner can produce. Three left-paren
/// variants are kept distinct (rather than a single `LParen`) because the
/// pretty-printer's bracket-aware line-breaking cascade treats a grouping
/// paren, a call's argument-list paren, and an `of (...)` enumeration paren
/// differently.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Value, multiplier, and the exact source lexeme (`"0x1F"`, `"10KB"`)
    /// so the pretty-printer can reproduce the literal's original spelling.
    IntegerLiteral(i64, IntegerMultiplier, Name),
    FloatLiteral(f64),
    StringLiteral(Name),
    Identifier(Name),
    StringId(Name),
    StringIdWildcard(Name),
    StringCount(Name),
    StringOffset(Name),
    StringLength(Name),
    RuleName(Name),

    // Keywords
    KwRule,
    KwPrivate,
    KwGlobal,
    KwMeta,
    KwStrings,
    KwCondition,
    KwImport,
    KwInclude,
    KwTrue,
    KwFalse,
    KwNot,
    KwAnd,
    KwOr,
    KwOf,
    KwAny,
    KwAll,
    KwNone,
    KwThem,
    KwThis,
    KwWith,
    KwFor,
    KwIn,
    KwAt,
    KwEntrypoint,
    KwFilesize,
    KwMatches,
    KwContains,
    KwIcontains,
    KwStartswith,
    KwIstartswith,
    KwEndswith,
    KwIendswith,
    KwWide,
    KwAscii,
    KwNocase,
    KwFullword,
    KwXor,
    KwBase64,
    KwBase64wide,
    KwDefined,
    KwInt8, KwInt16, KwInt32, KwInt8be, KwInt16be, KwInt32be,
    KwUint8, KwUint16, KwUint32, KwUint8be, KwUint16be, KwUint32be,

    // Punctuation / operators
    LBrace,
    RBrace,
    LParenPlain,
    LParenCall,
    LParenEnumeration,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Equals,
    Comma,
    Dot,
    DotDot,
    Pipe,
    Minus,
    Plus,
    Star,
    Backslash,
    Slash,
    Percent,
    Tilde,
    Shl,
    Shr,
    Amp,
    Caret,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    Ne,
    Arrow,

    // Trivia (emitted only in lossless mode; the parser skips these)
    Whitespace,
    Newline,
    LineComment(Name),
    BlockComment(Name),

    /// Regexp literal body, stored as a flat lexeme; structure is parsed
    /// lazily by `yara_ir::regexp`.
    RegexpLiteral(Name),
    /// Hex-string body, stored as a flat lexeme; structure is parsed lazily
    /// by `yara_ir::hex`.
    HexStringLiteral(Name),

    Eof,
    Error,
}

const TAG_INTEGER_LITERAL: u8 = 0;
const TAG_FLOAT_LITERAL: u8 = 1;
const TAG_STRING_LITERAL: u8 = 2;
const TAG_IDENTIFIER: u8 = 3;
const TAG_TRIVIA: u8 = 4;
const TAG_KEYWORD: u8 = 5;
const TAG_PUNCTUATION: u8 = 6;
const TAG_PATTERN_LITERAL: u8 = 7;
const TAG_END: u8 = 8;

impl TokenKind {
    /// Coarse discriminant used for fast dispatch tables, independent of the
    /// exact variant (e.g. all keywords share one tag).
    #[must_use]
    pub fn discriminant_index(&self) -> u8 {
        use TokenKind::*;
        match self {
            IntegerLiteral(..) => TAG_INTEGER_LITERAL,
            FloatLiteral(_) => TAG_FLOAT_LITERAL,
            StringLiteral(_) => TAG_STRING_LITERAL,
            Identifier(_) | StringId(_) | StringIdWildcard(_) | StringCount(_)
            | StringOffset(_) | StringLength(_) | RuleName(_) => TAG_IDENTIFIER,
            Whitespace | Newline | LineComment(_) | BlockComment(_) => TAG_TRIVIA,
            RegexpLiteral(_) | HexStringLiteral(_) => TAG_PATTERN_LITERAL,
            Eof | Error => TAG_END,
            k if k.keyword_str().is_some() => TAG_KEYWORD,
            _ => TAG_PUNCTUATION,
        }
    }

    #[must_use]
    pub fn can_start_expr(&self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            IntegerLiteral(..)
                | FloatLiteral(_)
                | StringLiteral(_)
                | Identifier(_)
                | StringId(_)
                | StringIdWildcard(_)
                | StringCount(_)
                | StringOffset(_)
                | StringLength(_)
                | KwTrue
                | KwFalse
                | KwNot
                | KwAny
                | KwAll
                | KwNone
                | KwThis
                | KwWith
                | KwFor
                | KwDefined
                | KwEntrypoint
                | KwFilesize
                | KwInt8 | KwInt16 | KwInt32 | KwInt8be | KwInt16be | KwInt32be
                | KwUint8 | KwUint16 | KwUint32 | KwUint8be | KwUint16be | KwUint32be
                | LParenPlain
                | Minus
                | Tilde
        )
    }

    #[must_use]
    pub fn is_pattern_modifier_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::KwWide
                | TokenKind::KwAscii
                | TokenKind::KwNocase
                | TokenKind::KwFullword
                | TokenKind::KwXor
                | TokenKind::KwBase64
                | TokenKind::KwBase64wide
        )
    }

    #[must_use]
    pub fn keyword_str(&self) -> Option<&'static str> {
        use TokenKind::*;
        Some(match self {
            KwRule => "rule",
            KwPrivate => "private",
            KwGlobal => "global",
            KwMeta => "meta",
            KwStrings => "strings",
            KwCondition => "condition",
            KwImport => "import",
            KwInclude => "include",
            KwTrue => "true",
            KwFalse => "false",
            KwNot => "not",
            KwAnd => "and",
            KwOr => "or",
            KwOf => "of",
            KwAny => "any",
            KwAll => "all",
            KwNone => "none",
            KwThem => "them",
            KwThis => "this",
            KwWith => "with",
            KwFor => "for",
            KwIn => "in",
            KwAt => "at",
            KwEntrypoint => "entrypoint",
            KwFilesize => "filesize",
            KwMatches => "matches",
            KwContains => "contains",
            KwIcontains => "icontains",
            KwStartswith => "startswith",
            KwIstartswith => "istartswith",
            KwEndswith => "endswith",
            KwIendswith => "iendswith",
            KwWide => "wide",
            KwAscii => "ascii",
            KwNocase => "nocase",
            KwFullword => "fullword",
            KwXor => "xor",
            KwBase64 => "base64",
            KwBase64wide => "base64wide",
            KwDefined => "defined",
            KwInt8 => "int8",
            KwInt16 => "int16",
            KwInt32 => "int32",
            KwInt8be => "int8be",
            KwInt16be => "int16be",
            KwInt32be => "int32be",
            KwUint8 => "uint8",
            KwUint16 => "uint16",
            KwUint32 => "uint32",
            KwUint8be => "uint8be",
            KwUint16be => "uint16be",
            KwUint32be => "uint32be",
            _ => return None,
        })
    }

    #[must_use]
    pub fn literal(&self) -> Option<Literal> {
        match self {
            TokenKind::IntegerLiteral(v, mult, source) => {
                Some(Literal::Integer(crate::literal::IntegerLiteral {
                    value: mult.apply(*v),
                    source: *source,
                }))
            }
            TokenKind::FloatLiteral(f) => Some(Literal::Float(*f)),
            TokenKind::StringLiteral(n) => Some(Literal::Text(*n)),
            TokenKind::KwTrue => Some(Literal::Bool(true)),
            TokenKind::KwFalse => Some(Literal::Bool(false)),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Newline | TokenKind::LineComment(_) | TokenKind::BlockComment(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_str_round_trips() {
        assert_eq!(TokenKind::KwRule.keyword_str(), Some("rule"));
        assert_eq!(TokenKind::Identifier(Name::EMPTY).keyword_str(), None);
    }

    #[test]
    fn trivia_is_flagged() {
        assert!(TokenKind::Newline.is_trivia());
        assert!(!TokenKind::KwRule.is_trivia());
    }

    #[test]
    fn can_start_expr_accepts_unary_minus() {
        assert!(TokenKind::Minus.can_start_expr());
        assert!(!TokenKind::RParen.can_start_expr());
    }
}
