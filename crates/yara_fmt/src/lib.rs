//! Pretty-printer: replays a [`yara_ir::TokenStream`] back into YARA source.
//!
//! Two renderings are exposed through [`Formatter`]: [`Formatter::format`],
//! an auto-formatted layout that rebuilds line breaks and indentation from
//! scratch (but keeps the author's choice of which brackets span multiple
//! lines), and [`Formatter::format_compact`], a dense one-line-per-rule
//! rendering with comments dropped.
//!
//! The crate never constructs an AST; it only ever looks at the flat token
//! stream the parser produced (or a stream built directly through a
//! `yaramod` builder), the same way `yara_parse` only ever looks forward.

mod autoformat;
mod comments;
mod emitter;
mod render;
mod spacing;

pub use autoformat::Formatter;
pub use emitter::{Emitter, StringEmitter};
pub use render::escape_string;

#[cfg(test)]
mod tests {
    use yara_ir::StringInterner;
    use yara_lexer::Scanner;
    use yara_ir::{Span, Token, TokenKind, TokenStream};

    use super::*;

    fn stream_for(source: &str, interner: &StringInterner) -> TokenStream {
        let mut scanner = Scanner::new(source, interner);
        let mut stream = TokenStream::new();
        while let Some(tok) = scanner.next_token().unwrap() {
            stream.emplace_back(tok);
        }
        stream.emplace_back(Token::new(TokenKind::Eof, Span::DUMMY));
        stream
    }

    #[test]
    fn formats_a_rule_with_every_section() {
        let interner = StringInterner::new();
        let source = "rule example{meta:author=\"me\" strings:$a=\"x\" condition:$a}";
        let stream = stream_for(source, &interner);
        let text = Formatter::new(&stream, &interner).format();
        assert!(text.contains("rule example {"));
        assert!(text.contains("meta:\n"));
        assert!(text.contains("author = \"me\"\n"));
        assert!(text.contains("strings:\n"));
        assert!(text.contains("$a = \"x\"\n"));
        assert!(text.contains("condition:\n"));
        assert!(text.contains("$a\n"));
    }

    #[test]
    fn aligns_trailing_comments_to_the_widest_line() {
        let interner = StringInterner::new();
        let source = "rule r {\n    condition:\n        1 == 1 // short\n        and 22 == 22 // longer one\n}";
        let stream = stream_for(source, &interner);
        let text = Formatter::new(&stream, &interner).format();
        let short_col = text.lines().find(|l| l.contains("// short")).unwrap().find("//").unwrap();
        let long_col = text.lines().find(|l| l.contains("// longer")).unwrap().find("//").unwrap();
        assert_eq!(short_col, long_col);
    }

    #[test]
    fn round_trips_a_call_expression_inline() {
        let interner = StringInterner::new();
        let source = "rule r { condition: uint32(0) == 0x12345678 }";
        let stream = stream_for(source, &interner);
        let text = Formatter::new(&stream, &interner).format();
        assert!(text.contains("uint32(0) == 0x12345678"));
    }
}
