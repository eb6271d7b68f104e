//! Low-level token-stream splicing shared by [`crate::rule::Rule`]'s
//! mutators and the builders in [`crate::builder`].
//!
//! A rule's structural anchors (its name, its `{`/`}`, its `meta:`/
//! `strings:`/`condition:` keywords) are located by token-kind adjacency,
//! walking [`TokenId`] links rather than comparing [`yara_ir::Span`]s: a
//! token spliced in by a prior mutation carries `Span::DUMMY`, so span
//! arithmetic stops being meaningful the moment a file has been edited
//! once. Kind-adjacency keeps working regardless.

use std::path::Path;

use yara_diagnostic::ParseError;
use yara_ir::{Name, StringInterner, Token, TokenId, TokenKind, TokenStream};

pub(crate) fn next_significant(stream: &TokenStream, id: TokenId) -> Option<TokenId> {
    let mut cur = stream.next_id(id);
    while let Some(c) = cur {
        if !stream.get(c).is_some_and(|t| t.kind.is_trivia()) {
            return Some(c);
        }
        cur = stream.next_id(c);
    }
    None
}

fn prev_significant(stream: &TokenStream, id: TokenId) -> Option<TokenId> {
    let mut cur = stream.prev_id(id);
    while let Some(c) = cur {
        if !stream.get(c).is_some_and(|t| t.kind.is_trivia()) {
            return Some(c);
        }
        cur = stream.prev_id(c);
    }
    None
}

/// Token ids marking one rule's structural boundaries within a host stream.
pub(crate) struct RuleAnchors {
    /// First token of the rule, including any leading `private`/`global`.
    pub start: TokenId,
    pub name: TokenId,
    pub lbrace: TokenId,
    pub rbrace: TokenId,
}

/// Finds the rule named `name`, scanning from the stream's head.
pub(crate) fn locate_rule(stream: &TokenStream, name: Name) -> Option<RuleAnchors> {
    let mut cur = stream.head();
    while let Some(id) = cur {
        if stream.get(id).is_some_and(|t| t.kind == TokenKind::KwRule) {
            if let Some(name_id) = next_significant(stream, id) {
                if stream.get(name_id).is_some_and(|t| t.kind == TokenKind::Identifier(name)) {
                    if let Some((lbrace, rbrace)) = rule_braces(stream, name_id) {
                        return Some(RuleAnchors { start: rule_start(stream, id), name: name_id, lbrace, rbrace });
                    }
                }
            }
        }
        cur = stream.next_id(id);
    }
    None
}

fn rule_start(stream: &TokenStream, kw_rule: TokenId) -> TokenId {
    let mut start = kw_rule;
    while let Some(p) = prev_significant(stream, start) {
        match stream.get(p).map(|t| t.kind) {
            Some(TokenKind::KwPrivate | TokenKind::KwGlobal) => start = p,
            _ => break,
        }
    }
    start
}

fn rule_braces(stream: &TokenStream, name_id: TokenId) -> Option<(TokenId, TokenId)> {
    let mut cur = stream.next_id(name_id);
    let mut lbrace = None;
    while let Some(id) = cur {
        if stream.get(id)?.kind == TokenKind::LBrace {
            lbrace = Some(id);
            break;
        }
        cur = stream.next_id(id);
    }
    let lbrace = lbrace?;
    let mut depth = 1i32;
    let mut cur = stream.next_id(lbrace);
    while let Some(id) = cur {
        match stream.get(id)?.kind {
            TokenKind::LBrace => depth += 1,
            TokenKind::RBrace => {
                depth -= 1;
                if depth == 0 {
                    return Some((lbrace, id));
                }
            }
            _ => {}
        }
        cur = stream.next_id(id);
    }
    None
}

/// Finds `section`'s `:` token within `(lbrace, rbrace)`, or `None` if the
/// section is absent from this rule.
pub(crate) fn locate_section_colon(
    stream: &TokenStream,
    lbrace: TokenId,
    rbrace: TokenId,
    section: TokenKind,
) -> Option<TokenId> {
    let mut cur = stream.next_id(lbrace);
    while let Some(id) = cur {
        if id == rbrace {
            return None;
        }
        if stream.get(id).is_some_and(|t| t.kind == section) {
            return next_significant(stream, id);
        }
        cur = stream.next_id(id);
    }
    None
}

/// Finds `section`'s own keyword token within `(lbrace, rbrace)`, or `None`
/// if the section is absent.
pub(crate) fn locate_section_keyword(
    stream: &TokenStream,
    lbrace: TokenId,
    rbrace: TokenId,
    section: TokenKind,
) -> Option<TokenId> {
    let mut cur = stream.next_id(lbrace);
    while let Some(id) = cur {
        if id == rbrace {
            return None;
        }
        if stream.get(id).is_some_and(|t| t.kind == section) {
            return Some(id);
        }
        cur = stream.next_id(id);
    }
    None
}

/// Parses a throwaway source fragment with the host's own interner, so
/// names it introduces land in the same `Name` space as the host stream.
pub(crate) fn parse_fragment(interner: &StringInterner, source: &str) -> Result<TokenStream, ParseError> {
    let (_file, stream, _arena) = yara_parse::parse(source, interner, Path::new("."))?;
    Ok(stream)
}

/// Clones of every token strictly between `start` and `end` (both
/// exclusive), in order.
pub(crate) fn tokens_between(stream: &TokenStream, start: TokenId, end: TokenId) -> Vec<Token> {
    let mut out = Vec::new();
    let mut cur = stream.next_id(start);
    while let Some(id) = cur {
        if id == end {
            break;
        }
        if let Some(tok) = stream.get(id) {
            out.push(*tok);
        }
        cur = stream.next_id(id);
    }
    out
}

/// Token ids strictly between `start` and `end` (both exclusive), in order.
pub(crate) fn ids_between(stream: &TokenStream, start: TokenId, end: TokenId) -> Vec<TokenId> {
    let mut out = Vec::new();
    let mut cur = stream.next_id(start);
    while let Some(id) = cur {
        if id == end {
            break;
        }
        out.push(id);
        cur = stream.next_id(id);
    }
    out
}

/// Builds a standalone stream from owned tokens, suitable for
/// [`TokenStream::splice_before`]/`splice_append`.
pub(crate) fn stream_of(tokens: Vec<Token>) -> TokenStream {
    let mut s = TokenStream::new();
    for t in tokens {
        s.emplace_back(t);
    }
    s
}
