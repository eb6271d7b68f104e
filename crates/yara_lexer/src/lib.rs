//! Stateful scanner for YARA rule source, producing a lossless
//! [`yara_ir::TokenStream`] that preserves every comment and whitespace
//! lexeme so the pretty-printer can replay it.

mod raw;
mod scanner;

pub use scanner::{Mode, Scanner};

use yara_diagnostic::LexError;
use yara_ir::{Span, StringInterner, Token, TokenKind, TokenStream};

/// Scans the whole of `source` in default mode (no hex/regexp/string
/// sub-scanning requests) and returns a complete lossless token stream. The
/// parser drives [`Scanner`] directly when it needs to switch modes mid-file
/// for a hex-string or regexp body.
pub fn lex(source: &str, interner: &StringInterner) -> Result<TokenStream, LexError> {
    let mut scanner = Scanner::new(source, interner);
    let mut stream = TokenStream::with_capacity(source.len() / 4);
    while let Some(token) = scanner.next_token()? {
        stream.emplace_back(token);
    }
    let eof_pos = u32::try_from(source.len()).unwrap_or(u32::MAX);
    stream.emplace_back(Token::new(TokenKind::Eof, Span::point(eof_pos)));
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_a_minimal_rule_skeleton() {
        let interner = StringInterner::new();
        let stream = lex("rule foo { condition: true }", &interner).unwrap();
        let kinds: Vec<_> = stream.iter().map(|(_, t)| t.kind).filter(|k| !k.is_trivia()).collect();
        assert_eq!(kinds.last(), Some(&TokenKind::Eof));
        assert!(matches!(kinds[0], TokenKind::KwRule));
    }

    #[test]
    fn preserves_comments_in_the_stream() {
        let interner = StringInterner::new();
        let stream = lex("rule foo // a comment\n{ condition: true }", &interner).unwrap();
        let comment = stream.iter().find_map(|(_, t)| match t.kind {
            TokenKind::LineComment(name) => Some(interner.lookup(name)),
            _ => None,
        });
        assert_eq!(comment, Some("// a comment"));
    }
}
