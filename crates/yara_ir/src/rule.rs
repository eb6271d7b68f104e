//! String definitions and rule metadata shared by the parser and the
//! top-level `Rule`/`YaraFile` containers built in the root crate.

use crate::hex::HexUnit;
use crate::literal::Literal;
use crate::name::Name;
use crate::span::Span;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StringModifiers {
    pub wide: bool,
    pub ascii: bool,
    pub nocase: bool,
    pub fullword: bool,
    pub private: bool,
    /// `xor` or `xor(lo-hi)`; `None` means the modifier is absent.
    pub xor: Option<(u8, u8)>,
    /// `base64` or `base64("alphabet")`.
    pub base64: Option<Option<Name>>,
    pub base64wide: Option<Option<Name>>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StringBody {
    Plain(Name),
    Hex(Vec<HexUnit>),
    /// Raw regexp lexeme; structural parsing happens on demand.
    Regex { pattern: Name, case_insensitive: bool, dot_all: bool },
}

#[derive(Clone, Debug, PartialEq)]
pub struct StringDef {
    pub name: Name,
    pub body: StringBody,
    pub modifiers: StringModifiers,
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MetaEntry {
    pub key: Name,
    pub value: Literal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Import {
    pub module: Name,
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::StringInterner;

    #[test]
    fn string_modifiers_default_to_all_off() {
        let m = StringModifiers::default();
        assert!(!m.wide && !m.ascii && !m.nocase && !m.fullword && !m.private);
        assert!(m.xor.is_none());
    }

    #[test]
    fn plain_string_body_holds_interned_text() {
        let interner = StringInterner::new();
        let text = interner.intern("malware");
        let body = StringBody::Plain(text);
        assert_eq!(body, StringBody::Plain(text));
    }
}
