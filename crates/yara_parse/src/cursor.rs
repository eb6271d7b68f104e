//! Token cursor: pulls tokens from the [`yara_lexer::Scanner`] on demand,
//! appending every lexeme (including trivia) into the [`TokenStream`] being
//! built, and exposes lookahead over non-trivia tokens only. Mode switches
//! requested by the grammar take effect on the very next pull.

use yara_diagnostic::{LexError, ParseError};
use yara_ir::{Span, StringInterner, Token, TokenId, TokenKind, TokenStream};
use yara_lexer::{Mode, Scanner};

pub struct Cursor<'src> {
    scanner: Scanner<'src>,
    stream: TokenStream,
    /// Ids of non-trivia tokens pulled so far, in order.
    significant: Vec<TokenId>,
    pos: usize,
    eof_id: Option<TokenId>,
    /// Id of the last token `advance` consumed, so grammar productions can
    /// recover "the token I just ate" without threading it through every
    /// `expect` call site.
    last_id: Option<TokenId>,
}

impl<'src> Cursor<'src> {
    #[must_use]
    pub fn new(source: &'src str, interner: &'src StringInterner) -> Self {
        Cursor {
            scanner: Scanner::new(source, interner),
            stream: TokenStream::new(),
            significant: Vec::new(),
            pos: 0,
            eof_id: None,
            last_id: None,
        }
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.scanner.set_mode(mode);
    }

    fn pull_one(&mut self) -> Result<(), LexError> {
        loop {
            match self.scanner.next_token()? {
                Some(tok) if tok.is_trivia() => {
                    self.stream.emplace_back(tok);
                }
                Some(tok) => {
                    let id = self.stream.emplace_back(tok);
                    self.significant.push(id);
                    return Ok(());
                }
                None => {
                    let id = self.stream.emplace_back(Token::dummy(TokenKind::Eof));
                    self.significant.push(id);
                    self.eof_id = Some(id);
                    return Ok(());
                }
            }
        }
    }

    fn ensure(&mut self, index: usize) -> Result<(), LexError> {
        while self.significant.len() <= index {
            if self.eof_id.is_some() {
                // Already hit EOF; keep returning the same sentinel so
                // lookahead past the end of input is well-defined.
                let id = *self.significant.last().unwrap();
                self.significant.push(id);
                continue;
            }
            self.pull_one()?;
        }
        Ok(())
    }

    pub fn current_id(&mut self) -> Result<TokenId, LexError> {
        self.ensure(self.pos)?;
        Ok(self.significant[self.pos])
    }

    pub fn current(&mut self) -> Result<Token, LexError> {
        let id = self.current_id()?;
        Ok(*self.stream.get(id).expect("cursor token id must be live"))
    }

    pub fn current_kind(&mut self) -> Result<TokenKind, LexError> {
        Ok(self.current()?.kind)
    }

    pub fn current_span(&mut self) -> Result<Span, LexError> {
        Ok(self.current()?.span)
    }

    pub fn peek_kind(&mut self, ahead: usize) -> Result<TokenKind, LexError> {
        self.ensure(self.pos + ahead)?;
        let id = self.significant[self.pos + ahead];
        Ok(self.stream.get(id).expect("cursor token id must be live").kind)
    }

    pub fn is_at_end(&mut self) -> Result<bool, LexError> {
        Ok(self.current_kind()? == TokenKind::Eof)
    }

    /// Consumes the current token and returns its id.
    pub fn advance(&mut self) -> Result<TokenId, LexError> {
        let id = self.current_id()?;
        if self.current_kind()? != TokenKind::Eof {
            self.pos += 1;
        }
        self.last_id = Some(id);
        Ok(id)
    }

    /// Id of the token most recently consumed by `advance` (directly, or
    /// via `expect`). `None` before the first token is consumed.
    #[must_use]
    pub fn last_id(&self) -> Option<TokenId> {
        self.last_id
    }

    pub fn check(&mut self, kind: &TokenKind) -> Result<bool, LexError> {
        Ok(std::mem::discriminant(&self.current_kind()?) == std::mem::discriminant(kind))
    }

    #[cold]
    fn make_expect_error(&mut self, expected: &str) -> ParseError {
        let found = self.current_kind().map(describe).unwrap_or_else(|_| "<lex error>".into());
        let span = self.current_span().unwrap_or(Span::DUMMY);
        ParseError::UnexpectedToken { span, expected: expected.to_string(), found }
    }

    /// Consumes the current token if it matches the discriminant of `kind`,
    /// otherwise reports a `ParseError`.
    pub fn expect(&mut self, kind: TokenKind, expected_desc: &str) -> Result<Token, ParseError> {
        let matches = self.check(&kind).map_err(ParseError::Lex)?;
        if matches {
            let id = self.advance().map_err(ParseError::Lex)?;
            Ok(*self.stream.get(id).expect("cursor token id must be live"))
        } else {
            Err(self.make_expect_error(expected_desc))
        }
    }

    /// Rewrites an already-emitted token's kind in place. Used to retag a
    /// generic `LParenPlain` as `LParenCall`/`LParenEnumeration` once the
    /// grammar has determined which bracket role it plays, so the
    /// pretty-printer doesn't have to re-derive that context later.
    pub fn retag(&mut self, id: TokenId, kind: TokenKind) {
        if let Some(tok) = self.stream.get_mut(id) {
            tok.kind = kind;
        }
    }

    /// Finishes parsing and returns the lossless token stream built so far.
    #[must_use]
    pub fn into_stream(self) -> TokenStream {
        self.stream
    }

    #[must_use]
    pub fn stream(&self) -> &TokenStream {
        &self.stream
    }
}

fn describe(kind: TokenKind) -> String {
    if let Some(kw) = kind.keyword_str() {
        return format!("'{kw}'");
    }
    format!("{kind:?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_over_trivia_transparently() {
        let interner = StringInterner::new();
        let mut cursor = Cursor::new("rule   foo", &interner);
        assert_eq!(cursor.current_kind().unwrap(), TokenKind::KwRule);
        cursor.advance().unwrap();
        assert!(matches!(cursor.current_kind().unwrap(), TokenKind::Identifier(_)));
    }

    #[test]
    fn peek_past_eof_stays_at_eof() {
        let interner = StringInterner::new();
        let mut cursor = Cursor::new("rule", &interner);
        cursor.advance().unwrap();
        assert_eq!(cursor.current_kind().unwrap(), TokenKind::Eof);
        assert_eq!(cursor.peek_kind(5).unwrap(), TokenKind::Eof);
    }

    #[test]
    fn expect_reports_mismatch() {
        let interner = StringInterner::new();
        let mut cursor = Cursor::new("rule", &interner);
        let err = cursor.expect(TokenKind::LBrace, "'{'").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }
}
