//! Two-pass auto-format: mark pass then insert-aware emission.
//!
//! The mark pass walks the raw token stream once, pushing an entry for
//! every opening bracket and flagging it the moment a source `Newline`
//! token appears while it's the innermost open bracket; the matching close
//! bracket inherits the same flag. A flagged bracket is a "sector": its
//! contents always get their own lines on replay, the unflagged ones stay
//! inline. Rather than materializing a second token stream with inserted
//! newline tokens (spec's literal "insert pass"), the emission pass folds
//! insertion into direct text output: wherever the mark pass says a break
//! is required, it writes one immediately instead of creating a token for a
//! later pass to discover.
//!
//! Comment alignment runs as its own two-pass cycle nested inside emission:
//! a first, throwaway call to [`Formatter::emit`] with no alignment map
//! records the column reached by the last non-comment token on every line;
//! a second call replays identically but pads trailing comments out to
//! those recorded columns.

use rustc_hash::FxHashMap;
use yara_ir::{StringInterner, Token, TokenId, TokenKind, TokenStream};

use crate::comments::{self, LineWidths};
use crate::emitter::{Emitter, StringEmitter};
use crate::render::token_text;
use crate::spacing::{expects_operand_next, needs_space};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Meta,
    Strings,
    Condition,
}

struct Frame {
    /// Indent level for tokens nested directly inside this bracket.
    indent: usize,
    /// Whether the mark pass found this bracket's contents spanning
    /// multiple lines in the source.
    breaks: bool,
}

fn is_comment(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::LineComment(_) | TokenKind::BlockComment(_))
}

fn is_open_bracket(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::LBrace | TokenKind::LParenPlain | TokenKind::LParenCall | TokenKind::LParenEnumeration | TokenKind::LBracket
    )
}

fn is_close_bracket(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket)
}

/// Mark pass: flags each bracket token id (both the opener and its matching
/// closer) with whether the source had a newline inside it.
fn mark_sectors(stream: &TokenStream) -> FxHashMap<TokenId, bool> {
    let mut stack: Vec<(TokenId, bool)> = Vec::new();
    let mut flags = FxHashMap::default();
    for (id, tok) in stream.iter() {
        if is_open_bracket(tok.kind) {
            stack.push((id, false));
        } else if tok.kind == TokenKind::Newline {
            if let Some(top) = stack.last_mut() {
                top.1 = true;
            }
        } else if is_close_bracket(tok.kind) {
            if let Some((open_id, flag)) = stack.pop() {
                flags.insert(open_id, flag);
                flags.insert(id, flag);
            }
        }
    }
    flags
}

/// Replays a [`TokenStream`] into formatted or compact YARA source.
pub struct Formatter<'a> {
    stream: &'a TokenStream,
    interner: &'a StringInterner,
}

impl<'a> Formatter<'a> {
    #[must_use]
    pub fn new(stream: &'a TokenStream, interner: &'a StringInterner) -> Self {
        Formatter { stream, interner }
    }

    /// Auto-formatted rendering: bracket-aware line breaks, rule/meta/string
    /// entries each on their own line, column-aligned trailing comments.
    #[must_use]
    pub fn format(&self) -> String {
        let sectors = mark_sectors(self.stream);
        let tokens = self.relevant_tokens();
        let (_, widths) = self.emit(&tokens, &sectors, None);
        self.emit(&tokens, &sectors, Some(&widths)).0
    }

    /// Dense rendering: one line per rule, default spacing only, no
    /// comments (a `//` comment with nothing to its right would otherwise
    /// swallow the rest of the line once newlines are collapsed).
    #[must_use]
    pub fn format_compact(&self) -> String {
        let mut out = StringEmitter::new();
        let mut prev_kind: Option<TokenKind> = None;
        let mut prev_expects_operand = true;
        for (_, tok) in self.stream.iter() {
            let kind = tok.kind;
            if matches!(kind, TokenKind::Whitespace | TokenKind::Newline | TokenKind::Eof) || is_comment(kind) {
                continue;
            }
            if matches!(kind, TokenKind::KwRule) && prev_kind.is_some() {
                out.emit_newline(0);
            }
            if let Some(prev) = prev_kind {
                if needs_space(prev, kind, prev_expects_operand) {
                    out.emit_space();
                }
            }
            out.emit(&token_text(kind, self.interner));
            prev_expects_operand = expects_operand_next(kind);
            prev_kind = Some(kind);
        }
        out.emit_newline(0);
        out.into_string()
    }

    fn relevant_tokens(&self) -> Vec<(TokenId, Token)> {
        self.stream
            .iter()
            .filter(|(_, t)| !matches!(t.kind, TokenKind::Whitespace | TokenKind::Newline | TokenKind::Eof))
            .map(|(id, t)| (id, *t))
            .collect()
    }

    #[allow(clippy::too_many_lines)]
    fn emit(&self, tokens: &[(TokenId, Token)], sectors: &FxHashMap<TokenId, bool>, align: Option<&LineWidths>) -> (String, LineWidths) {
        let mut out = StringEmitter::new();
        let mut widths = LineWidths::default();
        let mut bracket_stack: Vec<Frame> = Vec::new();
        let mut section: Option<Section> = None;
        let mut prev_kind: Option<TokenKind> = None;
        let mut prev_expects_operand = true;
        let mut at_line_start = true;
        let mut line = 0usize;
        let mut rule_count = 0usize;
        let mut pending_break: Option<usize> = None;

        for &(id, tok) in tokens {
            let kind = tok.kind;
            let prev_before = prev_kind;

            if is_comment(kind) {
                if at_line_start {
                    // Standalone comment line: already correctly indented
                    // by whatever break brought us here.
                } else {
                    match align {
                        Some(widths) => out.emit(&comments::padding(widths, line, out.current_column())),
                        None => out.emit_space(),
                    }
                }
                out.emit(&token_text(kind, self.interner));
                prev_kind = Some(kind);
                at_line_start = false;
                if matches!(kind, TokenKind::LineComment(_)) {
                    // A line comment runs to end of line; whatever follows
                    // must start a new one or it would be swallowed by it.
                    pending_break = Some(bracket_stack.last().map_or(0, |f| f.indent));
                }
                continue;
            }

            let break_indent = pending_break.take().or_else(|| self.forced_break_indent(kind, prev_before, section, &bracket_stack, at_line_start));

            if let Some(indent) = break_indent {
                if matches!(kind, TokenKind::KwRule) && rule_count > 0 && bracket_stack.is_empty() {
                    out.emit_newline(0);
                }
                out.emit_newline(indent);
                line += 1;
                at_line_start = true;
            } else if let Some(prev) = prev_before {
                if needs_space(prev, kind, prev_expects_operand) {
                    out.emit_space();
                }
            }

            out.emit(&token_text(kind, self.interner));
            comments::record_width(&mut widths, line, out.current_column());
            prev_expects_operand = expects_operand_next(kind);
            prev_kind = Some(kind);
            at_line_start = false;

            match kind {
                TokenKind::KwRule => rule_count += 1,
                TokenKind::KwMeta => section = Some(Section::Meta),
                TokenKind::KwStrings => section = Some(Section::Strings),
                TokenKind::KwCondition => section = Some(Section::Condition),
                TokenKind::Colon if matches!(prev_before, Some(TokenKind::KwMeta | TokenKind::KwStrings | TokenKind::KwCondition)) => {
                    pending_break = Some(bracket_stack.last().map_or(0, |f| f.indent) + 1);
                }
                _ if is_open_bracket(kind) => {
                    let breaks = sectors.get(&id).copied().unwrap_or(false);
                    let indent = bracket_stack.len() + 1;
                    bracket_stack.push(Frame { indent, breaks });
                    if breaks {
                        pending_break = Some(indent);
                    }
                }
                _ if is_close_bracket(kind) => {
                    bracket_stack.pop();
                }
                TokenKind::Comma => {
                    if let Some(frame) = bracket_stack.last() {
                        if frame.breaks {
                            pending_break = Some(frame.indent);
                        }
                    }
                }
                TokenKind::RBrace if bracket_stack.is_empty() => section = None,
                _ => {}
            }
        }
        out.emit_newline(0);
        (out.into_string(), widths)
    }

    fn forced_break_indent(
        &self,
        kind: TokenKind,
        prev_kind: Option<TokenKind>,
        section: Option<Section>,
        bracket_stack: &[Frame],
        at_line_start: bool,
    ) -> Option<usize> {
        use TokenKind::*;
        match kind {
            KwRule | KwImport | KwInclude if bracket_stack.is_empty() && prev_kind.is_some() => Some(0),
            KwMeta | KwStrings | KwCondition if !matches!(prev_kind, Some(LBrace) | None) => {
                Some(bracket_stack.last().map_or(0, |f| f.indent))
            }
            Identifier(_) if section == Some(Section::Meta) && !matches!(prev_kind, Some(Equals | Colon | KwMeta) | None) => {
                Some(bracket_stack.last().map_or(0, |f| f.indent) + 1)
            }
            StringId(_) if section == Some(Section::Strings) && !matches!(prev_kind, Some(Equals | Colon | KwStrings) | None) => {
                Some(bracket_stack.last().map_or(0, |f| f.indent) + 1)
            }
            RBrace | RParen | RBracket if !at_line_start => {
                bracket_stack.last().filter(|f| f.breaks).map(|f| f.indent.saturating_sub(1))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yara_ir::Span;

    fn source_stream(source: &str, interner: &StringInterner) -> TokenStream {
        let mut scanner = yara_lexer::Scanner::new(source, interner);
        let mut stream = TokenStream::new();
        loop {
            match scanner.next_token().unwrap() {
                Some(tok) => {
                    stream.emplace_back(tok);
                }
                None => {
                    stream.emplace_back(Token::new(TokenKind::Eof, Span::DUMMY));
                    break;
                }
            }
        }
        stream
    }

    #[test]
    fn keeps_a_single_line_rule_inline_when_source_had_no_newlines() {
        let interner = StringInterner::new();
        let stream = source_stream("rule r { condition: true }", &interner);
        let text = Formatter::new(&stream, &interner).format();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("rule r { condition: true }"));
    }

    #[test]
    fn breaks_rule_body_onto_its_own_lines_when_source_did() {
        let interner = StringInterner::new();
        let source = "rule r {\n    strings:\n        $a = \"x\"\n    condition:\n        $a\n}";
        let stream = source_stream(source, &interner);
        let text = Formatter::new(&stream, &interner).format();
        assert!(text.contains("strings:\n"));
        assert!(text.contains("$a = \"x\"\n"));
        assert!(text.contains("condition:\n"));
    }

    #[test]
    fn compact_mode_renders_one_line_and_drops_comments() {
        let interner = StringInterner::new();
        let source = "rule r { // hello\n condition: true }";
        let stream = source_stream(source, &interner);
        let text = Formatter::new(&stream, &interner).format_compact();
        assert_eq!(text.trim(), "rule r { condition: true }");
    }

    #[test]
    fn two_rules_get_a_blank_line_between_them() {
        let interner = StringInterner::new();
        let source = "rule a { condition: true }\nrule b { condition: false }";
        let stream = source_stream(source, &interner);
        let text = Formatter::new(&stream, &interner).format();
        assert!(text.contains("}\n\nrule b"));
    }
}
