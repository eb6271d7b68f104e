//! Structural parser for regexp pattern bodies (`ab.*c{2,4}`).
//!
//! Like [`crate::grammar::hex`], this parses the lexer's flat
//! `RegexpLiteral` lexeme text into a [`RegexpUnit`] tree on demand, since
//! the surrounding condition/string grammar only needs the raw lexeme most
//! of the time.

use std::iter::Peekable;
use std::str::Chars;

use yara_diagnostic::ParseError;
use yara_ir::regexp::{ClassItem, RegexpError, RegexpUnit, RepetitionOp};
use yara_ir::Span;

pub fn parse_regexp_body(body: &str, span: Span) -> Result<RegexpUnit, ParseError> {
    let mut chars = body.chars().peekable();
    let unit = parse_alternation(&mut chars, span)?;
    if let Some(c) = chars.next() {
        return Err(unexpected(c, span));
    }
    Ok(unit)
}

fn unexpected(found: char, span: Span) -> ParseError {
    ParseError::UnexpectedToken { span, expected: "a regexp atom".into(), found: found.to_string() }
}

fn parse_alternation(chars: &mut Peekable<Chars<'_>>, span: Span) -> Result<RegexpUnit, ParseError> {
    let mut branches = vec![parse_concat(chars, span)?];
    while chars.peek() == Some(&'|') {
        chars.next();
        branches.push(parse_concat(chars, span)?);
    }
    if branches.len() == 1 {
        Ok(branches.pop().unwrap())
    } else {
        Ok(RegexpUnit::Alternation(branches))
    }
}

fn parse_concat(chars: &mut Peekable<Chars<'_>>, span: Span) -> Result<RegexpUnit, ParseError> {
    let mut units = Vec::new();
    while let Some(&c) = chars.peek() {
        if c == '|' || c == ')' {
            break;
        }
        units.push(parse_repeat(chars, span)?);
    }
    if units.len() == 1 {
        Ok(units.pop().unwrap())
    } else {
        Ok(RegexpUnit::Concat(units))
    }
}

fn consume_lazy(chars: &mut Peekable<Chars<'_>>) -> bool {
    if chars.peek() == Some(&'?') {
        chars.next();
        false
    } else {
        true
    }
}

fn parse_number(chars: &mut Peekable<Chars<'_>>) -> Option<u32> {
    let mut digits = String::new();
    while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
        digits.push(chars.next().unwrap());
    }
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

fn parse_repeat(chars: &mut Peekable<Chars<'_>>, span: Span) -> Result<RegexpUnit, ParseError> {
    let atom = parse_atom(chars, span)?;
    match chars.peek() {
        Some('*') => {
            chars.next();
            let greedy = consume_lazy(chars);
            Ok(atom.repeat(RepetitionOp::Star, greedy))
        }
        Some('+') => {
            chars.next();
            let greedy = consume_lazy(chars);
            Ok(atom.repeat(RepetitionOp::Plus, greedy))
        }
        Some('?') => {
            chars.next();
            let greedy = consume_lazy(chars);
            Ok(atom.repeat(RepetitionOp::Optional, greedy))
        }
        Some('{') => {
            chars.next();
            let min = parse_number(chars).unwrap_or(0);
            let max = if chars.peek() == Some(&',') {
                chars.next();
                if chars.peek() == Some(&'}') { None } else { parse_number(chars) }
            } else {
                Some(min)
            };
            match chars.next() {
                Some('}') => {}
                Some(other) => return Err(unexpected(other, span)),
                None => return Err(ParseError::UnclosedDelimiter { span, open: "{" }),
            }
            let greedy = consume_lazy(chars);
            let op = RepetitionOp::range(min, max).map_err(|RegexpError::InvalidRange { min, max }| {
                ParseError::InvalidRegexpRepetition { span, min, max }
            })?;
            Ok(atom.repeat(op, greedy))
        }
        _ => Ok(atom),
    }
}

fn parse_atom(chars: &mut Peekable<Chars<'_>>, span: Span) -> Result<RegexpUnit, ParseError> {
    match chars.next() {
        Some('.') => Ok(RegexpUnit::AnyChar),
        Some('^') => Ok(RegexpUnit::StartAnchor),
        Some('$') => Ok(RegexpUnit::EndAnchor),
        Some('(') => {
            let capturing = if chars.peek() == Some(&'?') {
                chars.next();
                if chars.peek() == Some(&':') {
                    chars.next();
                }
                false
            } else {
                true
            };
            let inner = parse_alternation(chars, span)?;
            match chars.next() {
                Some(')') => {}
                Some(other) => return Err(unexpected(other, span)),
                None => return Err(ParseError::UnclosedDelimiter { span, open: "(" }),
            }
            Ok(RegexpUnit::Group { capturing, body: Box::new(inner) })
        }
        Some('[') => parse_class(chars, span),
        Some('\\') => parse_escape(chars, span),
        Some(c) => Ok(RegexpUnit::Text(c.to_string())),
        None => Err(ParseError::UnexpectedToken { span, expected: "a regexp atom".into(), found: "end of pattern".into() }),
    }
}

fn parse_escape(chars: &mut Peekable<Chars<'_>>, span: Span) -> Result<RegexpUnit, ParseError> {
    match chars.next() {
        Some('b') => Ok(RegexpUnit::WordBoundary { negated: false }),
        Some('B') => Ok(RegexpUnit::WordBoundary { negated: true }),
        Some(c @ ('d' | 'D' | 'w' | 'W' | 's' | 'S')) => {
            Ok(RegexpUnit::Class { negated: false, items: vec![ClassItem::Shorthand(c)] })
        }
        Some(c) => Ok(RegexpUnit::Text(c.to_string())),
        None => Err(ParseError::UnexpectedToken { span, expected: "an escaped character".into(), found: "end of pattern".into() }),
    }
}

fn parse_class(chars: &mut Peekable<Chars<'_>>, span: Span) -> Result<RegexpUnit, ParseError> {
    let negated = if chars.peek() == Some(&'^') {
        chars.next();
        true
    } else {
        false
    };
    let mut items = Vec::new();
    loop {
        match chars.next() {
            Some(']') => break,
            Some('\\') => {
                let c = chars.next().ok_or(ParseError::UnclosedDelimiter { span, open: "[" })?;
                items.push(ClassItem::Shorthand(c));
            }
            Some(c) => {
                let mut lookahead = chars.clone();
                if lookahead.next() == Some('-') {
                    if let Some(hi) = lookahead.peek().copied() {
                        if hi != ']' {
                            chars.next();
                            let hi = chars.next().unwrap();
                            items.push(ClassItem::Range(c, hi));
                            continue;
                        }
                    }
                }
                items.push(ClassItem::Char(c));
            }
            None => return Err(ParseError::UnclosedDelimiter { span, open: "[" }),
        }
    }
    Ok(RegexpUnit::Class { negated, items })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_concatenated_text() {
        let unit = parse_regexp_body("abc", Span::DUMMY).unwrap();
        match unit {
            RegexpUnit::Concat(parts) => assert_eq!(parts.len(), 3),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_star_repetition() {
        let unit = parse_regexp_body("a*", Span::DUMMY).unwrap();
        assert!(matches!(unit, RegexpUnit::Repetition { op: RepetitionOp::Star, greedy: true, .. }));
    }

    #[test]
    fn lazy_repetition_clears_greedy_flag() {
        let unit = parse_regexp_body("a+?", Span::DUMMY).unwrap();
        assert!(matches!(unit, RegexpUnit::Repetition { op: RepetitionOp::Plus, greedy: false, .. }));
    }

    #[test]
    fn parses_bounded_range_repetition() {
        let unit = parse_regexp_body("a{2,4}", Span::DUMMY).unwrap();
        match unit {
            RegexpUnit::Repetition { op: RepetitionOp::Range { min: 2, max: Some(4) }, .. } => {}
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn inverted_range_is_reported() {
        let err = parse_regexp_body("a{4,2}", Span::DUMMY).unwrap_err();
        assert!(matches!(err, ParseError::InvalidRegexpRepetition { min: 4, max: 2, .. }));
    }

    #[test]
    fn parses_character_class_with_range() {
        let unit = parse_regexp_body("[a-z]", Span::DUMMY).unwrap();
        match unit {
            RegexpUnit::Class { negated: false, items } => assert_eq!(items, vec![ClassItem::Range('a', 'z')]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parses_alternation_of_groups() {
        let unit = parse_regexp_body("(ab|cd)", Span::DUMMY).unwrap();
        match unit {
            RegexpUnit::Group { capturing: true, body } => assert!(matches!(*body, RegexpUnit::Alternation(_))),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
