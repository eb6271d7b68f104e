//! `rule ... { meta: ... strings: ... condition: ... }` grammar.

use yara_diagnostic::ParseError;
use yara_ir::literal::{IntegerLiteral, Literal};
use yara_ir::rule::{MetaEntry, StringBody, StringDef, StringModifiers};
use yara_ir::{ExprId, Name, Span, StringInterner, TokenKind};
use yara_modules::ModulePool;

use crate::arena_builder::ArenaBuilder;
use crate::context::RuleContext;
use crate::cursor::Cursor;
use crate::grammar::expr::ExprParser;
use crate::grammar::hex::parse_hex_body;
use crate::grammar::regexp::parse_regexp_body;

/// A fully parsed `rule` block.
#[derive(Debug)]
pub struct ParsedRule {
    pub name: Name,
    pub is_private: bool,
    pub is_global: bool,
    pub tags: Vec<Name>,
    pub meta: Vec<MetaEntry>,
    pub strings: Vec<StringDef>,
    pub condition: ExprId,
    pub span: Span,
}

pub struct RuleParser<'p, 'src> {
    pub cursor: &'p mut Cursor<'src>,
    pub arena: &'p mut ArenaBuilder,
    pub interner: &'src StringInterner,
    pub modules: Option<&'p ModulePool>,
    /// Names of rules already parsed earlier in this file, for backward-only
    /// rule-name references in a condition.
    pub known_rules: &'p [Name],
}

type PResult<T> = Result<T, ParseError>;

impl<'p, 'src> RuleParser<'p, 'src> {
    fn expect_identifier(&mut self) -> PResult<Name> {
        match self.cursor.current_kind().map_err(ParseError::Lex)? {
            TokenKind::Identifier(name) => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                Ok(name)
            }
            other => Err(ParseError::UnexpectedToken {
                span: self.cursor.current_span().unwrap_or(Span::DUMMY),
                expected: "an identifier".into(),
                found: format!("{other:?}"),
            }),
        }
    }

    pub fn parse_rule(&mut self) -> PResult<ParsedRule> {
        let start = self.cursor.current_span().map_err(ParseError::Lex)?;
        let mut is_private = false;
        let mut is_global = false;
        loop {
            match self.cursor.current_kind().map_err(ParseError::Lex)? {
                TokenKind::KwPrivate => {
                    is_private = true;
                    self.cursor.advance().map_err(ParseError::Lex)?;
                }
                TokenKind::KwGlobal => {
                    is_global = true;
                    self.cursor.advance().map_err(ParseError::Lex)?;
                }
                _ => break,
            }
        }
        self.cursor.expect(TokenKind::KwRule, "'rule'")?;
        let name = self.expect_identifier()?;

        let mut tags = Vec::new();
        if self.cursor.check(&TokenKind::Colon).map_err(ParseError::Lex)? {
            self.cursor.advance().map_err(ParseError::Lex)?;
            tags.push(self.expect_identifier()?);
            while matches!(self.cursor.current_kind().map_err(ParseError::Lex)?, TokenKind::Identifier(_)) {
                tags.push(self.expect_identifier()?);
            }
        }

        self.cursor.expect(TokenKind::LBrace, "'{'")?;

        let mut ctx = RuleContext::new();
        let mut meta = Vec::new();
        let mut strings = Vec::new();

        if self.cursor.check(&TokenKind::KwMeta).map_err(ParseError::Lex)? {
            self.cursor.advance().map_err(ParseError::Lex)?;
            self.cursor.expect(TokenKind::Colon, "':'")?;
            while matches!(self.cursor.current_kind().map_err(ParseError::Lex)?, TokenKind::Identifier(_)) {
                meta.push(self.parse_meta_entry()?);
            }
        }

        if self.cursor.check(&TokenKind::KwStrings).map_err(ParseError::Lex)? {
            self.cursor.advance().map_err(ParseError::Lex)?;
            self.cursor.expect(TokenKind::Colon, "':'")?;
            while matches!(self.cursor.current_kind().map_err(ParseError::Lex)?, TokenKind::StringId(_)) {
                let def = self.parse_string_def()?;
                let text = self.interner.lookup(def.name);
                if let Some(prev) = ctx.declare_string(def.name, text, def.span) {
                    let _ = prev;
                    return Err(ParseError::DuplicateStringId { span: def.span, name: format!("{:?}", def.name) });
                }
                strings.push(def);
            }
        }

        ctx.known_rules = self.known_rules.to_vec();

        self.cursor.expect(TokenKind::KwCondition, "'condition'")?;
        self.cursor.expect(TokenKind::Colon, "':'")?;
        let condition = {
            let mut expr_parser = ExprParser {
                cursor: self.cursor,
                arena: self.arena,
                ctx: &mut ctx,
                interner: self.interner,
                modules: self.modules,
            };
            expr_parser.parse_condition()?
        };

        let end = self.cursor.current_span().map_err(ParseError::Lex)?;
        self.cursor.expect(TokenKind::RBrace, "'}'")?;

        Ok(ParsedRule {
            name,
            is_private,
            is_global,
            tags,
            meta,
            strings,
            condition,
            span: start.merge(end),
        })
    }

    fn parse_meta_entry(&mut self) -> PResult<MetaEntry> {
        let key = self.expect_identifier()?;
        self.cursor.expect(TokenKind::Equals, "'='")?;
        let negate = self.cursor.check(&TokenKind::Minus).map_err(ParseError::Lex)?;
        if negate {
            self.cursor.advance().map_err(ParseError::Lex)?;
        }
        let value = match self.cursor.current_kind().map_err(ParseError::Lex)? {
            TokenKind::StringLiteral(n) => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                Literal::Text(n)
            }
            TokenKind::IntegerLiteral(v, mult, source) => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                let magnitude = mult.apply(v);
                Literal::Integer(IntegerLiteral { value: if negate { -magnitude } else { magnitude }, source })
            }
            TokenKind::KwTrue => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                Literal::Bool(true)
            }
            TokenKind::KwFalse => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                Literal::Bool(false)
            }
            other => {
                return Err(ParseError::UnexpectedToken {
                    span: self.cursor.current_span().unwrap_or(Span::DUMMY),
                    expected: "a meta value".into(),
                    found: format!("{other:?}"),
                })
            }
        };
        Ok(MetaEntry { key, value })
    }

    fn parse_string_modifiers(&mut self) -> PResult<StringModifiers> {
        let mut m = StringModifiers::default();
        loop {
            match self.cursor.current_kind().map_err(ParseError::Lex)? {
                TokenKind::KwWide => {
                    m.wide = true;
                    self.cursor.advance().map_err(ParseError::Lex)?;
                }
                TokenKind::KwAscii => {
                    m.ascii = true;
                    self.cursor.advance().map_err(ParseError::Lex)?;
                }
                TokenKind::KwNocase => {
                    m.nocase = true;
                    self.cursor.advance().map_err(ParseError::Lex)?;
                }
                TokenKind::KwFullword => {
                    m.fullword = true;
                    self.cursor.advance().map_err(ParseError::Lex)?;
                }
                TokenKind::KwPrivate => {
                    m.private = true;
                    self.cursor.advance().map_err(ParseError::Lex)?;
                }
                TokenKind::KwXor => {
                    self.cursor.advance().map_err(ParseError::Lex)?;
                    m.xor = Some(self.parse_optional_byte_range(0, 255)?);
                }
                TokenKind::KwBase64 => {
                    self.cursor.advance().map_err(ParseError::Lex)?;
                    m.base64 = Some(self.parse_optional_alphabet()?);
                }
                TokenKind::KwBase64wide => {
                    self.cursor.advance().map_err(ParseError::Lex)?;
                    m.base64wide = Some(self.parse_optional_alphabet()?);
                }
                _ => break,
            }
        }
        Ok(m)
    }

    fn parse_optional_byte_range(&mut self, default_lo: u8, default_hi: u8) -> PResult<(u8, u8)> {
        if !self.cursor.check(&TokenKind::LParenPlain).map_err(ParseError::Lex)? {
            return Ok((default_lo, default_hi));
        }
        self.cursor.advance().map_err(ParseError::Lex)?;
        let lo = self.expect_small_integer()?;
        self.cursor.expect(TokenKind::Minus, "'-'")?;
        let hi = self.expect_small_integer()?;
        self.cursor.expect(TokenKind::RParen, "')'")?;
        Ok((lo, hi))
    }

    fn expect_small_integer(&mut self) -> PResult<u8> {
        match self.cursor.current_kind().map_err(ParseError::Lex)? {
            TokenKind::IntegerLiteral(v, mult, _) => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                Ok(mult.apply(v) as u8)
            }
            other => Err(ParseError::UnexpectedToken {
                span: self.cursor.current_span().unwrap_or(Span::DUMMY),
                expected: "an integer".into(),
                found: format!("{other:?}"),
            }),
        }
    }

    fn parse_optional_alphabet(&mut self) -> PResult<Option<Name>> {
        if !self.cursor.check(&TokenKind::LParenPlain).map_err(ParseError::Lex)? {
            return Ok(None);
        }
        self.cursor.advance().map_err(ParseError::Lex)?;
        let name = match self.cursor.current_kind().map_err(ParseError::Lex)? {
            TokenKind::StringLiteral(n) => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                n
            }
            other => {
                return Err(ParseError::UnexpectedToken {
                    span: self.cursor.current_span().unwrap_or(Span::DUMMY),
                    expected: "an alphabet string".into(),
                    found: format!("{other:?}"),
                })
            }
        };
        self.cursor.expect(TokenKind::RParen, "')'")?;
        Ok(Some(name))
    }

    fn parse_string_def(&mut self) -> PResult<StringDef> {
        let span = self.cursor.current_span().map_err(ParseError::Lex)?;
        let TokenKind::StringId(name) = self.cursor.current_kind().map_err(ParseError::Lex)? else {
            unreachable!("parse_string_def requires a leading string id");
        };
        self.cursor.advance().map_err(ParseError::Lex)?;
        self.cursor.expect(TokenKind::Equals, "'='")?;

        let body = match self.cursor.current_kind().map_err(ParseError::Lex)? {
            TokenKind::StringLiteral(text) => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                StringBody::Plain(text)
            }
            TokenKind::LBrace => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                self.cursor.set_mode(yara_lexer::Mode::HexString);
                let tok = self.cursor.expect(TokenKind::HexStringLiteral(Name::EMPTY), "a hex-string body")?;
                let TokenKind::HexStringLiteral(raw) = tok.kind else { unreachable!() };
                let units = parse_hex_body(self.interner.lookup(raw), tok.span)?;
                self.cursor.expect(TokenKind::RBrace, "'}'")?;
                StringBody::Hex(units)
            }
            TokenKind::Slash => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                self.cursor.set_mode(yara_lexer::Mode::Regexp);
                let tok = self.cursor.expect(TokenKind::RegexpLiteral(Name::EMPTY), "a regexp body")?;
                let TokenKind::RegexpLiteral(raw) = tok.kind else { unreachable!() };
                let pattern_text = self.interner.lookup(raw);
                // Parse structurally once up front so malformed patterns are
                // reported at definition time rather than on first use.
                parse_regexp_body(pattern_text, tok.span)?;
                let (case_insensitive, dot_all) = self.parse_regexp_flags()?;
                StringBody::Regex { pattern: raw, case_insensitive, dot_all }
            }
            other => {
                return Err(ParseError::UnexpectedToken {
                    span,
                    expected: "a string, hex, or regexp body".into(),
                    found: format!("{other:?}"),
                })
            }
        };

        let modifiers = self.parse_string_modifiers()?;
        Ok(StringDef { name, body, modifiers, span })
    }

    /// The lexer's regexp sub-scanner stops at (and consumes) the closing
    /// `/`; trailing `i`/`s` flags land back in default mode as a plain
    /// identifier immediately afterward.
    fn parse_regexp_flags(&mut self) -> PResult<(bool, bool)> {
        let mut case_insensitive = false;
        let mut dot_all = false;
        if let TokenKind::Identifier(name) = self.cursor.current_kind().map_err(ParseError::Lex)? {
            let text = self.interner.lookup(name);
            if !text.is_empty() && text.chars().all(|c| c == 'i' || c == 's') {
                case_insensitive = text.contains('i');
                dot_all = text.contains('s');
                self.cursor.advance().map_err(ParseError::Lex)?;
            }
        }
        Ok((case_insensitive, dot_all))
    }
}
