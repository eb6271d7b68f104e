//! [`YaraFileBuilder`]: assembles `import`s and rules into a whole
//! [`crate::YaraFile`], rendering+reparsing the result the same way
//! [`super::rule::YaraRuleBuilder`] validates a single rule.

use yara_diagnostic::BuilderError;

use super::YaraRuleBuilder;
use crate::YaraFile;

#[derive(Clone, Debug, Default)]
pub struct YaraFileBuilder {
    imports: Vec<String>,
    rules: Vec<YaraRuleBuilder>,
}

impl YaraFileBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn import(mut self, module: impl Into<String>) -> Self {
        self.imports.push(module.into());
        self
    }

    #[must_use]
    pub fn rule(mut self, rule: YaraRuleBuilder) -> Self {
        self.rules.push(rule);
        self
    }

    fn render(&self) -> Result<String, BuilderError> {
        let mut out = String::new();
        for module in &self.imports {
            out.push_str(&format!("import \"{module}\"\n"));
        }
        for rule in &self.rules {
            out.push_str(&rule.render()?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Renders every accumulated import and rule into one file and parses
    /// it: a builder's emitted text is validated by reparsing it before
    /// it's trusted as a [`YaraFile`], the same discipline
    /// [`super::rule::YaraRuleBuilder::get`] applies to a single rule.
    pub fn get(self) -> Result<YaraFile, BuilderError> {
        let interner = yara_ir::StringInterner::new();
        let source = self.render()?;
        let parsed = yara_parse::parse(&source, &interner, std::path::Path::new("."))?;
        Ok(YaraFile::from_parts(parsed, interner, std::path::PathBuf::from(".")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_file_with_an_import_and_a_rule() {
        let file = YaraFileBuilder::new()
            .import("pe")
            .rule(YaraRuleBuilder::new().name("foo").condition("pe.is_pe"))
            .get()
            .unwrap();
        assert_eq!(file.imports().len(), 1);
        assert_eq!(file.rule_names(), vec!["foo"]);
    }

    #[test]
    fn empty_file_builds_to_nothing() {
        let file = YaraFileBuilder::new().get().unwrap();
        assert!(file.rule_names().is_empty());
        assert!(file.imports().is_empty());
    }
}
