//! Per-rule parsing context carried while parsing one rule's condition.

use std::collections::BTreeMap;
use std::path::PathBuf;

use rustc_hash::FxHashMap;
use yara_ir::{Name, Span};

/// Tracks the string identifiers defined by the rule currently being
/// parsed, so the condition parser can reject references to undefined
/// strings (`$a` when only `$b` was declared), and resolve wildcard
/// references (`$a*`) against the set of strings whose name starts with
/// the given prefix.
#[derive(Default)]
pub struct RuleContext {
    pub current_strings: FxHashMap<Name, Span>,
    /// String identifier text, sorted, for wildcard prefix lookups.
    string_trie: BTreeMap<String, Name>,
    /// Identifiers bound by an enclosing `for` loop, innermost last.
    pub local_symbols: Vec<Name>,
    pub inside_string_loop: bool,
    /// Names of rules already fully parsed earlier in this file (and its
    /// includes), available for backward-only rule-name references in a
    /// condition (YARA has no forward rule references).
    pub known_rules: Vec<Name>,
}

impl RuleContext {
    #[must_use]
    pub fn new() -> Self {
        RuleContext::default()
    }

    pub fn declare_string(&mut self, name: Name, text: &str, span: Span) -> Option<Span> {
        self.string_trie.insert(text.to_string(), name);
        self.current_strings.insert(name, span)
    }

    #[must_use]
    pub fn is_string_defined(&self, name: Name) -> bool {
        self.current_strings.contains_key(&name)
    }

    /// Names of every declared string whose text starts with `prefix`,
    /// in declaration-sorted (lexicographic) order.
    #[must_use]
    pub fn wildcard_matches(&self, prefix: &str) -> Vec<Name> {
        self.string_trie
            .range(prefix.to_string()..)
            .take_while(|(text, _)| text.starts_with(prefix))
            .map(|(_, &name)| name)
            .collect()
    }

    pub fn push_local(&mut self, name: Name) {
        self.local_symbols.push(name);
    }

    pub fn pop_local(&mut self) {
        self.local_symbols.pop();
    }

    #[must_use]
    pub fn is_local(&self, name: Name) -> bool {
        self.local_symbols.contains(&name)
    }

    #[must_use]
    pub fn is_known_rule(&self, name: Name) -> bool {
        self.known_rules.contains(&name)
    }
}

/// File-level parsing context: the stack of `include` paths currently being
/// expanded, used to detect cycles.
#[derive(Default)]
pub struct FileContext {
    pub include_stack: Vec<PathBuf>,
}

impl FileContext {
    #[must_use]
    pub fn new() -> Self {
        FileContext::default()
    }

    #[must_use]
    pub fn is_cyclic(&self, path: &PathBuf) -> bool {
        self.include_stack.contains(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_matches_returns_longest_common_prefix_set() {
        let mut ctx = RuleContext::new();
        ctx.declare_string(Name::from_raw(1), "a1", Span::DUMMY);
        ctx.declare_string(Name::from_raw(2), "a2", Span::DUMMY);
        ctx.declare_string(Name::from_raw(3), "b1", Span::DUMMY);
        let mut matches = ctx.wildcard_matches("a");
        matches.sort_by_key(yara_ir::Name::raw);
        assert_eq!(matches, vec![Name::from_raw(1), Name::from_raw(2)]);
    }

    #[test]
    fn wildcard_matches_is_empty_when_nothing_matches() {
        let mut ctx = RuleContext::new();
        ctx.declare_string(Name::from_raw(1), "a1", Span::DUMMY);
        assert!(ctx.wildcard_matches("z").is_empty());
    }
}
