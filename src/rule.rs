//! [`Rule`]: a mutator handle onto one rule of a [`crate::YaraFile`].

use tracing::debug;
use yara_diagnostic::ParseError;
use yara_ir::rule::{MetaEntry, StringDef};
use yara_ir::{ExprId, Token, TokenKind};
use yara_parse::ParsedRule;

use crate::file::YaraFile;
use crate::splice;

/// A value meta entries accept: YARA's grammar allows only text, integer,
/// and boolean meta values (no float, unlike condition-expression
/// literals).
#[derive(Clone, Debug, PartialEq)]
pub enum MetaValue {
    Text(String),
    Integer(i64),
    Bool(bool),
}

impl MetaValue {
    fn render(&self) -> String {
        match self {
            MetaValue::Text(s) => format!("\"{}\"", yara_fmt::escape_string(s)),
            MetaValue::Integer(v) => v.to_string(),
            MetaValue::Bool(b) => b.to_string(),
        }
    }
}

/// A handle onto one rule inside its owning [`YaraFile`]. Read accessors
/// work whether the handle came from [`YaraFile::rule`] or
/// [`YaraFile::rule_mut`]; the mutators require the latter.
pub struct Rule<'f> {
    file: &'f mut YaraFile,
    name: String,
}

impl<'f> Rule<'f> {
    pub(crate) fn new_mut(file: &'f mut YaraFile, name: &str) -> Self {
        Rule { file, name: name.to_string() }
    }

    fn parsed(&self) -> &ParsedRule {
        self.file
            .file
            .rules
            .iter()
            .find(|r| self.file.interner.lookup(r.name) == self.name)
            .unwrap_or_else(|| unreachable!("Rule handle outlived its rule in the owning YaraFile"))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_private(&self) -> bool {
        self.parsed().is_private
    }

    #[must_use]
    pub fn is_global(&self) -> bool {
        self.parsed().is_global
    }

    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        self.parsed().tags.iter().map(|n| self.file.interner.lookup(*n)).collect()
    }

    #[must_use]
    pub fn meta(&self) -> &[MetaEntry] {
        &self.parsed().meta
    }

    #[must_use]
    pub fn strings(&self) -> &[StringDef] {
        &self.parsed().strings
    }

    #[must_use]
    pub fn condition(&self) -> ExprId {
        self.parsed().condition
    }

    fn anchors(&self) -> splice::RuleAnchors {
        let interned = self.file.interner.intern(&self.name);
        // Reparsed on every mutation, so this always resolves; `locate_rule`
        // is re-run rather than cached since a prior mutation may have
        // moved every token id in the stream.
        splice::locate_rule(&self.file.stream, interned).unwrap_or_else(|| {
            unreachable!("Rule handle's name vanished from its own file's token stream")
        })
    }

    /// Adds `tag` to the rule's tag list (after `rule name`, before `{`),
    /// creating the `:` separator if this is the first tag.
    pub fn add_tag(&mut self, tag: &str) -> Result<(), ParseError> {
        let tag_name = self.file.interner.intern(tag);
        let anchors = self.anchors();
        if self.tags().contains(&tag) {
            return Ok(());
        }
        let colon_or_lbrace = splice::next_significant(&self.file.stream, anchors.name);
        let has_colon = colon_or_lbrace.is_some_and(|id| {
            self.file.stream.get(id).is_some_and(|t| t.kind == TokenKind::Colon) && id != anchors.lbrace
        });
        if !has_colon {
            self.file.stream.emplace_after(anchors.name, Token::dummy(TokenKind::Colon));
        }
        self.file.stream.emplace_before(anchors.lbrace, Token::dummy(TokenKind::Identifier(tag_name)));
        debug!(rule = %self.name, tag, "added tag");
        self.file.resync()
    }

    /// Removes `tag` from the rule's tag list, and the `:` separator too if
    /// it was the only tag.
    pub fn remove_tag(&mut self, tag: &str) -> Result<bool, ParseError> {
        let tag_name = self.file.interner.intern(tag);
        let anchors = self.anchors();
        let ids = splice::ids_between(&self.file.stream, anchors.name, anchors.lbrace);
        let Some(&tag_id) = ids.iter().find(|&&id| {
            self.file.stream.get(id).is_some_and(|t| t.kind == TokenKind::Identifier(tag_name))
        }) else {
            return Ok(false);
        };
        self.file.stream.erase(tag_id);
        let remaining_ids = splice::ids_between(&self.file.stream, anchors.name, anchors.lbrace);
        let colon_id = remaining_ids.iter().find(|&&id| self.file.stream.get(id).is_some_and(|t| t.kind == TokenKind::Colon));
        let any_tag_left = remaining_ids
            .iter()
            .any(|&id| matches!(self.file.stream.get(id).map(|t| t.kind), Some(TokenKind::Identifier(_))));
        if !any_tag_left {
            if let Some(&colon_id) = colon_id {
                self.file.stream.erase(colon_id);
            }
        }
        debug!(rule = %self.name, tag, "removed tag");
        self.file.resync()?;
        Ok(true)
    }

    /// Adds a `meta:` entry, creating the `meta:` section header if the
    /// rule has none yet. New entries land immediately after `meta:`.
    pub fn add_meta(&mut self, key: &str, value: MetaValue) -> Result<(), ParseError> {
        let key_name = self.file.interner.intern(key);
        let anchors = self.anchors();
        let colon = splice::locate_section_colon(&self.file.stream, anchors.lbrace, anchors.rbrace, TokenKind::KwMeta);
        let anchor = match colon {
            Some(colon) => colon,
            None => {
                let kw = self.file.stream.emplace_after(anchors.lbrace, Token::dummy(TokenKind::KwMeta));
                self.file.stream.emplace_after(kw, Token::dummy(TokenKind::Colon))
            }
        };
        let fragment_source = format!("rule __f__ {{ meta: k = {} condition: true }}", value.render());
        let fragment = splice::parse_fragment(&self.file.interner, &fragment_source)?;
        let eq = fragment.find(None, |t| t.kind == TokenKind::Equals).unwrap_or_else(|| {
            unreachable!("builder-rendered meta fragment always contains '='")
        });
        let cond = fragment
            .find(None, |t| t.kind == TokenKind::KwCondition)
            .unwrap_or_else(|| unreachable!("builder-rendered meta fragment always contains 'condition'"));
        let value_tokens = splice::tokens_between(&fragment, eq, cond);
        let mut insert_after = anchor;
        insert_after = self.file.stream.emplace_after(insert_after, Token::dummy(TokenKind::Identifier(key_name)));
        insert_after = self.file.stream.emplace_after(insert_after, Token::dummy(TokenKind::Equals));
        for tok in value_tokens {
            insert_after = self.file.stream.emplace_after(insert_after, tok);
        }
        let _ = insert_after;
        debug!(rule = %self.name, key, "added meta entry");
        self.file.resync()
    }

    /// Removes every `meta:` entry with key `key`. Leaves an empty `meta:`
    /// header in place rather than also deleting the section, matching how
    /// the formatter tolerates an empty section.
    pub fn remove_meta(&mut self, key: &str) -> Result<bool, ParseError> {
        let key_name = self.file.interner.intern(key);
        let anchors = self.anchors();
        let Some(colon) = splice::locate_section_colon(&self.file.stream, anchors.lbrace, anchors.rbrace, TokenKind::KwMeta)
        else {
            return Ok(false);
        };
        let strings_or_condition_start =
            splice::locate_section_keyword(&self.file.stream, anchors.lbrace, anchors.rbrace, TokenKind::KwStrings)
                .or_else(|| splice::locate_section_keyword(&self.file.stream, anchors.lbrace, anchors.rbrace, TokenKind::KwCondition))
                .unwrap_or(anchors.rbrace);
        let entry_ids = splice::ids_between(&self.file.stream, colon, strings_or_condition_start);
        let mut removed = false;
        let mut i = 0;
        while i < entry_ids.len() {
            let id = entry_ids[i];
            if self.file.stream.get(id).is_some_and(|t| t.kind == TokenKind::Identifier(key_name)) {
                // Entry runs from this identifier up to (not including) the
                // next identifier that starts a new entry, or the section
                // end.
                let mut j = i + 1;
                while j < entry_ids.len()
                    && !matches!(self.file.stream.get(entry_ids[j]).map(|t| t.kind), Some(TokenKind::Identifier(_)))
                {
                    j += 1;
                }
                for &eid in &entry_ids[i..j] {
                    self.file.stream.erase(eid);
                }
                removed = true;
                i = j;
            } else {
                i += 1;
            }
        }
        if removed {
            debug!(rule = %self.name, key, "removed meta entry");
            self.file.resync()?;
        }
        Ok(removed)
    }

    /// Replaces the rule's condition expression. `expr_source` is parsed
    /// standalone (wrapped in a throwaway rule) before splicing, so a
    /// malformed expression is rejected without disturbing the file.
    pub fn set_condition(&mut self, expr_source: &str) -> Result<(), ParseError> {
        let fragment_source = format!("rule __f__ {{ condition: {expr_source} }}");
        let fragment = splice::parse_fragment(&self.file.interner, &fragment_source)?;
        let frag_colon = fragment
            .find(None, |t| t.kind == TokenKind::KwCondition)
            .and_then(|kw| splice::next_significant(&fragment, kw))
            .unwrap_or_else(|| unreachable!("builder-rendered condition fragment always contains 'condition:'"));
        let frag_rbrace = fragment
            .find_backwards(None, |t| t.kind == TokenKind::RBrace)
            .unwrap_or_else(|| unreachable!("builder-rendered condition fragment always contains '}'"));
        let new_tokens = splice::tokens_between(&fragment, frag_colon, frag_rbrace);

        let anchors = self.anchors();
        let host_colon = splice::locate_section_colon(&self.file.stream, anchors.lbrace, anchors.rbrace, TokenKind::KwCondition)
            .unwrap_or_else(|| unreachable!("a parsed rule always has a condition"));
        for id in splice::ids_between(&self.file.stream, host_colon, anchors.rbrace) {
            self.file.stream.erase(id);
        }
        self.file.stream.splice_before(anchors.rbrace, splice::stream_of(new_tokens));
        debug!(rule = %self.name, "set condition");
        self.file.resync()
    }

    /// Adds a `strings:` entry `$id = <body>`, where `body` is raw YARA
    /// source for the string's value and modifiers (`"evil" nocase`,
    /// `{ AA ?? BB }`, `/foo/i`). Creates the `strings:` section header if
    /// the rule has none yet.
    pub fn add_string(&mut self, id: &str, body: &str) -> Result<(), ParseError> {
        let id_name = self.file.interner.intern(id);
        let anchors = self.anchors();
        let cond_kw = splice::locate_section_keyword(&self.file.stream, anchors.lbrace, anchors.rbrace, TokenKind::KwCondition)
            .unwrap_or_else(|| unreachable!("a parsed rule always has a condition"));
        let colon = match splice::locate_section_colon(&self.file.stream, anchors.lbrace, anchors.rbrace, TokenKind::KwStrings) {
            Some(colon) => colon,
            None => {
                let kw = self.file.stream.emplace_before(cond_kw, Token::dummy(TokenKind::KwStrings));
                self.file.stream.emplace_after(kw, Token::dummy(TokenKind::Colon))
            }
        };

        let fragment_source = format!("rule __f__ {{ strings: $__s__ = {body} condition: true }}");
        let fragment = splice::parse_fragment(&self.file.interner, &fragment_source)?;
        let eq = fragment
            .find(None, |t| t.kind == TokenKind::Equals)
            .unwrap_or_else(|| unreachable!("builder-rendered string fragment always contains '='"));
        let frag_cond = fragment
            .find(None, |t| t.kind == TokenKind::KwCondition)
            .unwrap_or_else(|| unreachable!("builder-rendered string fragment always contains 'condition'"));
        let body_tokens = splice::tokens_between(&fragment, eq, frag_cond);

        let mut insert_after = colon;
        insert_after = self.file.stream.emplace_after(insert_after, Token::dummy(TokenKind::StringId(id_name)));
        insert_after = self.file.stream.emplace_after(insert_after, Token::dummy(TokenKind::Equals));
        for tok in body_tokens {
            insert_after = self.file.stream.emplace_after(insert_after, tok);
        }
        let _ = insert_after;
        debug!(rule = %self.name, id, "added string");
        self.file.resync()
    }

    /// Removes the `$id = ...` string definition, including its modifiers.
    pub fn remove_string(&mut self, id: &str) -> Result<bool, ParseError> {
        let id_name = self.file.interner.intern(id);
        let anchors = self.anchors();
        let Some(colon) = splice::locate_section_colon(&self.file.stream, anchors.lbrace, anchors.rbrace, TokenKind::KwStrings)
        else {
            return Ok(false);
        };
        let cond_kw = splice::locate_section_keyword(&self.file.stream, anchors.lbrace, anchors.rbrace, TokenKind::KwCondition)
            .unwrap_or_else(|| unreachable!("a parsed rule always has a condition"));
        let entry_ids = splice::ids_between(&self.file.stream, colon, cond_kw);
        let mut removed = false;
        let mut i = 0;
        while i < entry_ids.len() {
            let id_tok = entry_ids[i];
            if self.file.stream.get(id_tok).is_some_and(|t| t.kind == TokenKind::StringId(id_name)) {
                let mut j = i + 1;
                while j < entry_ids.len()
                    && !matches!(self.file.stream.get(entry_ids[j]).map(|t| t.kind), Some(TokenKind::StringId(_)))
                {
                    j += 1;
                }
                for &eid in &entry_ids[i..j] {
                    self.file.stream.erase(eid);
                }
                removed = true;
                i = j;
            } else {
                i += 1;
            }
        }
        if removed {
            debug!(rule = %self.name, id, "removed string");
            self.file.resync()?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::YaraFile;

    fn one_rule() -> YaraFile {
        YaraFile::parse_str("rule foo { condition: true }").unwrap()
    }

    #[test]
    fn add_tag_creates_the_separator_on_first_tag() {
        let mut file = one_rule();
        file.rule_mut("foo").unwrap().add_tag("malware").unwrap();
        assert_eq!(file.rule("foo").unwrap().tags, vec![file.interner().intern("malware")]);
        assert!(file.format().contains("rule foo : malware"));
    }

    #[test]
    fn add_tag_twice_does_not_duplicate() {
        let mut file = one_rule();
        let mut rule = file.rule_mut("foo").unwrap();
        rule.add_tag("a").unwrap();
        rule.add_tag("a").unwrap();
        assert_eq!(rule.tags(), vec!["a"]);
    }

    #[test]
    fn remove_last_tag_drops_the_colon() {
        let mut file = one_rule();
        let mut rule = file.rule_mut("foo").unwrap();
        rule.add_tag("a").unwrap();
        assert!(rule.remove_tag("a").unwrap());
        assert!(!file.format().contains(':'));
    }

    #[test]
    fn add_meta_creates_the_section_header() {
        let mut file = one_rule();
        let mut rule = file.rule_mut("foo").unwrap();
        rule.add_meta("author", MetaValue::Text("me".into())).unwrap();
        assert_eq!(rule.meta().len(), 1);
        assert!(file.format().contains("meta:"));
        assert!(file.format().contains("author = \"me\""));
    }

    #[test]
    fn remove_meta_drops_the_matching_entry_only() {
        let mut file = one_rule();
        let mut rule = file.rule_mut("foo").unwrap();
        rule.add_meta("a", MetaValue::Integer(1)).unwrap();
        rule.add_meta("b", MetaValue::Integer(2)).unwrap();
        assert!(rule.remove_meta("a").unwrap());
        assert_eq!(rule.meta().len(), 1);
    }

    #[test]
    fn add_string_creates_the_section_header() {
        let mut file = one_rule();
        let mut rule = file.rule_mut("foo").unwrap();
        rule.add_string("a", "\"evil\" nocase").unwrap();
        assert_eq!(rule.strings().len(), 1);
        assert!(file.format().contains("$a = \"evil\" nocase"));
    }

    #[test]
    fn set_condition_replaces_the_expression() {
        let mut file = one_rule();
        let mut rule = file.rule_mut("foo").unwrap();
        rule.set_condition("filesize > 100").unwrap();
        assert!(file.format().contains("filesize > 100"));
    }
}
