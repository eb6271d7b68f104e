//! [`YaraRuleBuilder`]: accumulates one rule's fields and renders+reparses
//! them into a [`BuiltRule`], the way [`crate::rule::Rule::set_condition`]
//! reparses a throwaway fragment before trusting it.

use yara_diagnostic::BuilderError;
use yara_ir::StringInterner;

use super::BuiltRule;

#[derive(Clone, Debug, Default)]
pub struct YaraRuleBuilder {
    name: Option<String>,
    is_private: bool,
    is_global: bool,
    tags: Vec<String>,
    meta: Vec<(String, String)>,
    strings: Vec<(String, String)>,
    condition: Option<String>,
}

impl YaraRuleBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn private(mut self, private: bool) -> Self {
        self.is_private = private;
        self
    }

    #[must_use]
    pub fn global(mut self, global: bool) -> Self {
        self.is_global = global;
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Adds a meta entry. `rendered_value` is already-quoted YARA source for
    /// the value (e.g. produced by [`crate::rule::MetaValue::render`] or a
    /// literal like `"42"`/`"true"`).
    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, rendered_value: impl Into<String>) -> Self {
        self.meta.push((key.into(), rendered_value.into()));
        self
    }

    /// Adds a `$id = body` string, where `body` is raw source for the
    /// value and its modifiers (see [`super::hex::YaraHexStringBuilder`] for
    /// hex bodies).
    #[must_use]
    pub fn string(mut self, id: impl Into<String>, body: impl Into<String>) -> Self {
        self.strings.push((id.into(), body.into()));
        self
    }

    #[must_use]
    pub fn condition(mut self, expr_source: impl Into<String>) -> Self {
        self.condition = Some(expr_source.into());
        self
    }

    pub(crate) fn render(&self) -> Result<String, BuilderError> {
        let name = self.name.clone().ok_or(BuilderError::MissingField { field: "name" })?;
        let condition = self.condition.clone().ok_or(BuilderError::EmptyCondition)?;
        if condition.trim().is_empty() {
            return Err(BuilderError::EmptyCondition);
        }

        let mut out = String::new();
        if self.is_private {
            out.push_str("private ");
        }
        if self.is_global {
            out.push_str("global ");
        }
        out.push_str("rule ");
        out.push_str(&name);
        if !self.tags.is_empty() {
            out.push_str(" : ");
            out.push_str(&self.tags.join(" "));
        }
        out.push_str(" {\n");
        if !self.meta.is_empty() {
            out.push_str("meta:\n");
            for (key, value) in &self.meta {
                out.push_str(&format!("{key} = {value}\n"));
            }
        }
        if !self.strings.is_empty() {
            out.push_str("strings:\n");
            for (id, body) in &self.strings {
                out.push_str(&format!("${id} = {body}\n"));
            }
        }
        out.push_str("condition:\n");
        out.push_str(&condition);
        out.push_str("\n}\n");
        Ok(out)
    }

    /// Renders the accumulated fields into YARA source and reparses them,
    /// so a malformed condition or string body is rejected here rather than
    /// surfacing later from [`crate::YaraFile::add_rule`].
    pub fn get(self, interner: &StringInterner) -> Result<BuiltRule, BuilderError> {
        let source = self.render()?;
        let (file, stream, _arena) = yara_parse::parse(&source, interner, std::path::Path::new("."))?;
        let name = file
            .rules
            .first()
            .map(|r| r.name)
            .ok_or(BuilderError::MissingField { field: "name" })?;
        Ok(BuiltRule { name, stream })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_minimal_rule() {
        let interner = StringInterner::new();
        let built = YaraRuleBuilder::new().name("foo").condition("true").get(&interner).unwrap();
        assert_eq!(interner.lookup(built.name), "foo");
    }

    #[test]
    fn missing_condition_is_rejected() {
        let interner = StringInterner::new();
        let err = YaraRuleBuilder::new().name("foo").get(&interner).unwrap_err();
        assert!(matches!(err, BuilderError::EmptyCondition));
    }

    #[test]
    fn missing_name_is_rejected() {
        let interner = StringInterner::new();
        let err = YaraRuleBuilder::new().condition("true").get(&interner).unwrap_err();
        assert!(matches!(err, BuilderError::MissingField { field: "name" }));
    }

    #[test]
    fn builds_a_rule_with_tags_meta_and_strings() {
        let interner = StringInterner::new();
        let built = YaraRuleBuilder::new()
            .name("full")
            .tag("malware")
            .meta("author", "\"me\"")
            .string("a", "\"evil\" nocase")
            .condition("$a")
            .get(&interner)
            .unwrap();
        assert_eq!(interner.lookup(built.name), "full");
    }
}
