//! [`YaraFile`]: an editable handle onto a parsed YARA source file.

use std::path::{Path, PathBuf};

use tracing::debug;
use yara_diagnostic::ParseError;
use yara_ir::rule::Import;
use yara_ir::{ExprArena, Name, StringInterner, TokenKind, TokenStream};
use yara_parse::{ParsedFile, ParsedRule};

use crate::builder::BuiltRule;
use crate::rule::Rule;
use crate::splice;

/// Failure to load a [`YaraFile`] from disk: either the file could not be
/// read, or it could be read but not parsed.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Where a name resolves, in the order a condition expression would try:
/// the file's own rules, then its imported modules, then the handful of
/// always-available globals (`filesize`, `entrypoint`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolRef {
    Rule(Name),
    Module(Name),
    Global(&'static str),
}

/// A parsed (or freshly built) YARA file: its rules, its `import`s, and the
/// single lossless token stream every render and every mutation goes
/// through.
///
/// Not `Sync`; a `YaraFile` shared across threads needs the same kind of
/// external lock any other `&mut`-based container would.
pub struct YaraFile {
    pub(crate) file: ParsedFile,
    pub(crate) stream: TokenStream,
    pub(crate) arena: ExprArena,
    pub(crate) interner: StringInterner,
    pub(crate) base_dir: PathBuf,
}

impl YaraFile {
    /// Parses `source` with no `include` base directory (relative
    /// `include`s resolve against the current directory).
    pub fn parse_str(source: &str) -> Result<Self, ParseError> {
        Self::parse_str_in(source, Path::new("."))
    }

    /// Parses `source`, resolving `include` directives relative to
    /// `base_dir`.
    pub fn parse_str_in(source: &str, base_dir: impl AsRef<Path>) -> Result<Self, ParseError> {
        let interner = StringInterner::new();
        let base_dir = base_dir.as_ref().to_path_buf();
        let (file, stream, arena) = yara_parse::parse(source, &interner, &base_dir)?;
        Ok(YaraFile { file, stream, arena, interner, base_dir })
    }

    /// Assembles a `YaraFile` from an already-parsed triple, used by
    /// [`crate::builder::YaraFileBuilder::get`] once it has rendered and
    /// reparsed its accumulated imports and rules.
    pub(crate) fn from_parts(
        (file, stream, arena): (ParsedFile, TokenStream, ExprArena),
        interner: StringInterner,
        base_dir: PathBuf,
    ) -> Self {
        YaraFile { file, stream, arena, interner, base_dir }
    }

    /// Reads and parses `path`, resolving `include`s relative to its parent
    /// directory.
    pub fn parse_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io { path: path.to_path_buf(), source })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
        Ok(Self::parse_str_in(&text, base_dir)?)
    }

    #[must_use]
    pub fn interner(&self) -> &StringInterner {
        &self.interner
    }

    #[must_use]
    pub fn arena(&self) -> &ExprArena {
        &self.arena
    }

    #[must_use]
    pub fn imports(&self) -> &[Import] {
        &self.file.imports
    }

    #[must_use]
    pub fn rule_names(&self) -> Vec<&str> {
        self.file.rules.iter().map(|r| self.interner.lookup(r.name)).collect()
    }

    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&ParsedRule> {
        self.file.rules.iter().find(|r| self.interner.lookup(r.name) == name)
    }

    #[must_use]
    pub fn rule_mut(&mut self, name: &str) -> Option<Rule<'_>> {
        if !self.file.rules.iter().any(|r| self.interner.lookup(r.name) == name) {
            return None;
        }
        Some(Rule::new_mut(self, name))
    }

    /// Resolves `name` against the file's own rules, then its imports, then
    /// the always-available globals. Module-internal symbols (fields of an
    /// imported module's own schema) are outside this lookup; pass a
    /// [`yara_modules::ModulePool`] loaded separately to resolve those.
    #[must_use]
    pub fn find_symbol(&self, name: &str) -> Option<SymbolRef> {
        if let Some(r) = self.file.rules.iter().find(|r| self.interner.lookup(r.name) == name) {
            return Some(SymbolRef::Rule(r.name));
        }
        if let Some(imp) = self.file.imports.iter().find(|i| self.interner.lookup(i.module) == name) {
            return Some(SymbolRef::Module(imp.module));
        }
        match name {
            "filesize" => Some(SymbolRef::Global("filesize")),
            "entrypoint" => Some(SymbolRef::Global("entrypoint")),
            _ => None,
        }
    }

    /// Splices `module` in as a new `import` directive, ahead of the first
    /// rule (or at the end of the stream, for an empty file).
    pub fn add_import(&mut self, module: &str) -> Result<(), ParseError> {
        let name = self.interner.intern(module);
        if self.file.imports.iter().any(|i| i.module == name) {
            return Ok(());
        }
        let before = self.stream.find(None, |t| t.kind == TokenKind::KwRule);
        let fragment = splice::stream_of(vec![
            yara_ir::Token::dummy(TokenKind::KwImport),
            yara_ir::Token::dummy(TokenKind::StringLiteral(name)),
            yara_ir::Token::dummy(TokenKind::Newline),
        ]);
        match before {
            Some(at) => {
                self.stream.splice_before(at, fragment);
            }
            None => {
                self.stream.splice_append(fragment);
            }
        }
        debug!(module, "added import");
        self.resync()
    }

    /// Removes the `import "module"` directive, if present.
    pub fn remove_import(&mut self, module: &str) -> Result<bool, ParseError> {
        let name = self.interner.intern(module);
        let Some(kw) = self.stream.find(None, |t| t.kind == TokenKind::KwImport) else { return Ok(false) };
        let mut cur = Some(kw);
        while let Some(id) = cur {
            if self.stream.get(id).is_some_and(|t| t.kind == TokenKind::KwImport) {
                if let Some(lit_id) = splice::next_significant(&self.stream, id) {
                    if self.stream.get(lit_id).is_some_and(|t| t.kind == TokenKind::StringLiteral(name)) {
                        self.stream.erase(lit_id);
                        self.stream.erase(id);
                        debug!(module, "removed import");
                        self.resync()?;
                        return Ok(true);
                    }
                }
            }
            cur = self.stream.next_id(id);
        }
        Ok(false)
    }

    /// Appends `built`'s rule to the end of the file, separated by a blank
    /// line from whatever precedes it.
    pub fn add_rule(&mut self, built: BuiltRule) -> Result<Rule<'_>, ParseError> {
        if !self.file.rules.is_empty() || !self.file.imports.is_empty() {
            self.stream.emplace_back(yara_ir::Token::dummy(TokenKind::Newline));
            self.stream.emplace_back(yara_ir::Token::dummy(TokenKind::Newline));
        }
        self.stream.splice_append(built.stream);
        debug!(rule = self.interner.lookup(built.name), "added rule");
        self.resync()?;
        Ok(Rule::new_mut(self, self.interner.lookup(built.name)))
    }

    /// Removes the named rule entirely, including its tokens.
    pub fn remove_rule(&mut self, name: &str) -> Result<bool, ParseError> {
        let interned = self.interner.intern(name);
        let Some(anchors) = splice::locate_rule(&self.stream, interned) else { return Ok(false) };
        let mut ids = vec![anchors.start];
        let mut cur = self.stream.next_id(anchors.start);
        while let Some(id) = cur {
            ids.push(id);
            if id == anchors.rbrace {
                break;
            }
            cur = self.stream.next_id(id);
        }
        for id in ids {
            self.stream.erase(id);
        }
        debug!(name, "removed rule");
        self.resync()?;
        Ok(true)
    }

    #[must_use]
    pub fn format(&self) -> String {
        yara_fmt::Formatter::new(&self.stream, &self.interner).format()
    }

    #[must_use]
    pub fn format_compact(&self) -> String {
        yara_fmt::Formatter::new(&self.stream, &self.interner).format_compact()
    }

    /// Re-derives the semantic layer (`ParsedFile`/`ExprArena`) from the
    /// current token stream, keeping the stream itself as the record of
    /// truth for formatting. Every mutator ends by calling this: splicing
    /// tokens in or out always invalidates the cached rule/meta/string
    /// vectors and, for condition edits, the expression arena, so rebuilding
    /// both from a full reparse of the current text is simpler and safer
    /// than patching each cached field by hand.
    pub(crate) fn resync(&mut self) -> Result<(), ParseError> {
        let rendered = yara_fmt::Formatter::new(&self.stream, &self.interner).format_compact();
        let (file, _stream, arena) = yara_parse::parse(&rendered, &self.interner, &self.base_dir)?;
        self.file = file;
        self.arena = arena;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_reformats_a_minimal_file() {
        let file = YaraFile::parse_str("rule foo { condition: true }").unwrap();
        assert_eq!(file.rule_names(), vec!["foo"]);
        assert!(file.format().contains("rule foo"));
    }

    #[test]
    fn add_import_is_idempotent() {
        let mut file = YaraFile::parse_str("rule foo { condition: true }").unwrap();
        file.add_import("pe").unwrap();
        file.add_import("pe").unwrap();
        assert_eq!(file.imports().len(), 1);
        assert_eq!(file.interner().lookup(file.imports()[0].module), "pe");
    }

    #[test]
    fn remove_import_drops_the_directive() {
        let mut file = YaraFile::parse_str("import \"pe\"\nrule foo { condition: true }").unwrap();
        assert!(file.remove_import("pe").unwrap());
        assert!(file.imports().is_empty());
        assert!(!file.format().contains("import"));
    }

    #[test]
    fn remove_rule_drops_it_from_the_file() {
        let mut file =
            YaraFile::parse_str("rule a { condition: true }\nrule b { condition: false }").unwrap();
        assert!(file.remove_rule("a").unwrap());
        assert_eq!(file.rule_names(), vec!["b"]);
    }

    #[test]
    fn find_symbol_checks_rules_then_imports_then_globals() {
        let file = YaraFile::parse_str("import \"pe\"\nrule foo { condition: true }").unwrap();
        assert_eq!(file.find_symbol("foo"), Some(SymbolRef::Rule(file.interner.intern("foo"))));
        assert_eq!(file.find_symbol("pe"), Some(SymbolRef::Module(file.interner.intern("pe"))));
        assert_eq!(file.find_symbol("filesize"), Some(SymbolRef::Global("filesize")));
        assert_eq!(file.find_symbol("nope"), None);
    }
}
