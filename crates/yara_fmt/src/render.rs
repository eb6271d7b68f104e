//! Renders a single token's text, independent of surrounding layout.

use yara_ir::{StringInterner, TokenKind};

/// Text a token contributes to the output, with no leading/trailing spacing
/// of its own — spacing between tokens is [`crate::spacing`]'s job.
#[must_use]
pub fn token_text(kind: TokenKind, interner: &StringInterner) -> String {
    use TokenKind::*;
    if let Some(kw) = kind.keyword_str() {
        return kw.to_string();
    }
    match kind {
        // Replayed verbatim from source (`0x1F`, `10KB`) rather than
        // re-derived from the expanded value, since hex/multiplier spelling
        // can't be reconstructed from the value alone.
        IntegerLiteral(_, _, source) => interner.lookup(source).to_string(),
        FloatLiteral(f) => render_float(f),
        StringLiteral(name) => format!("\"{}\"", escape_string(interner.lookup(name))),
        Identifier(name) | RuleName(name) => interner.lookup(name).to_string(),
        StringId(name) => format!("${}", interner.lookup(name)),
        StringIdWildcard(name) => format!("${}*", interner.lookup(name)),
        StringCount(name) => format!("#{}", interner.lookup(name)),
        StringOffset(name) => format!("@{}", interner.lookup(name)),
        StringLength(name) => format!("!{}", interner.lookup(name)),
        RegexpLiteral(name) => format!("/{}/", interner.lookup(name)),
        HexStringLiteral(name) => format!("{{ {} }}", interner.lookup(name).trim()),
        LineComment(name) | BlockComment(name) => interner.lookup(name).trim_end().to_string(),

        LBrace => "{".into(),
        RBrace => "}".into(),
        LParenPlain | LParenCall | LParenEnumeration => "(".into(),
        RParen => ")".into(),
        LBracket => "[".into(),
        RBracket => "]".into(),
        Colon => ":".into(),
        Equals => "=".into(),
        Comma => ",".into(),
        Dot => ".".into(),
        DotDot => "..".into(),
        Pipe => "|".into(),
        Minus => "-".into(),
        Plus => "+".into(),
        Star => "*".into(),
        Backslash => "\\".into(),
        Slash => "/".into(),
        Percent => "%".into(),
        Tilde => "~".into(),
        Shl => "<<".into(),
        Shr => ">>".into(),
        Amp => "&".into(),
        Caret => "^".into(),
        Lt => "<".into(),
        Le => "<=".into(),
        Gt => ">".into(),
        Ge => ">=".into(),
        EqEq => "==".into(),
        Ne => "!=".into(),
        Arrow => "->".into(),

        Whitespace | Newline | Eof | Error => String::new(),
    }
}

fn render_float(f: f64) -> String {
    if f.fract() == 0.0 && f.is_finite() {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

/// Inverse of the scanner's `unescape`: turns the stored (already-unescaped)
/// string-literal content back into YARA source syntax.
#[must_use]
pub fn escape_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 || (c as u32) == 0x7f => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_control_characters_as_hex() {
        assert_eq!(escape_string("a\nb"), "a\\nb");
        assert_eq!(escape_string("\x01"), "\\x01");
    }

    #[test]
    fn float_with_no_fraction_keeps_a_decimal_point() {
        assert_eq!(render_float(3.0), "3.0");
        assert_eq!(render_float(3.5), "3.5");
    }

    #[test]
    fn integer_literal_replays_its_source_lexeme() {
        let interner = StringInterner::new();
        let source = interner.intern("10KB");
        assert_eq!(token_text(TokenKind::IntegerLiteral(10240, yara_ir::IntegerMultiplier::Kilo, source), &interner), "10KB");
    }

    #[test]
    fn hex_integer_literal_keeps_its_hex_spelling() {
        let interner = StringInterner::new();
        let source = interner.intern("0x1F");
        assert_eq!(token_text(TokenKind::IntegerLiteral(0x1F, yara_ir::IntegerMultiplier::None, source), &interner), "0x1F");
    }
}
