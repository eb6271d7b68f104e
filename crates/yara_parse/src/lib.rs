//! Grammar-driven parser for YARA rule source.
//!
//! Parsing never recovers from an error: the first malformed construct
//! stops the parse and returns a [`yara_diagnostic::ParseError`], the same
//! no-recovery policy the condition-expression grammar in [`grammar::expr`]
//! assumes when it leaves an [`yara_ir::ExprKind::Error`] placeholder behind
//! for a deleted-but-required child rather than trying to resynchronize.

mod arena_builder;
pub mod context;
pub mod cursor;
pub mod grammar;

use std::path::Path;

pub use arena_builder::ArenaBuilder;
pub use context::{FileContext, RuleContext};
pub use cursor::Cursor;
pub use grammar::{ParsedFile, ParsedRule};

use yara_diagnostic::ParseError;
use yara_ir::{ExprArena, StringInterner, TokenStream};
use yara_modules::ModulePool;

/// Parses one top-level YARA source file, following any `include`
/// directives relative to `base_dir`. Equivalent to
/// `parse_with_modules(source, interner, base_dir, None)`: identifiers and
/// calls that would need a module schema to resolve are left `Undefined`
/// rather than rejected.
pub fn parse(
    source: &str,
    interner: &StringInterner,
    base_dir: &Path,
) -> Result<(ParsedFile, TokenStream, ExprArena), ParseError> {
    parse_with_modules(source, interner, base_dir, None)
}

/// Parses one top-level YARA source file with a loaded [`ModulePool`]
/// available for resolving `import`ed module identifiers, fields, and
/// function-call overloads.
pub fn parse_with_modules(
    source: &str,
    interner: &StringInterner,
    base_dir: &Path,
    modules: Option<&ModulePool>,
) -> Result<(ParsedFile, TokenStream, ExprArena), ParseError> {
    let mut file_ctx = FileContext::new();
    grammar::parse_file(source, interner, &mut file_ctx, base_dir, modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use yara_diagnostic::LexError;
    use yara_ir::ast::{BinaryOp, ExprKind, Quantifier};

    fn here() -> PathBuf {
        PathBuf::from(".")
    }

    #[test]
    fn parses_a_minimal_rule() {
        let interner = StringInterner::new();
        let (file, _stream, arena) = parse("rule foo { condition: true }", &interner, &here()).unwrap();
        assert_eq!(file.rules.len(), 1);
        assert_eq!(arena.kind(file.rules[0].condition), ExprKind::BoolLiteral(true));
    }

    #[test]
    fn parses_strings_and_references_them_in_the_condition() {
        let interner = StringInterner::new();
        let source = r#"
            rule has_string {
                strings:
                    $a = "evil"
                condition:
                    $a and filesize > 100
            }
        "#;
        let (file, _stream, arena) = parse(source, &interner, &here()).unwrap();
        let rule = &file.rules[0];
        assert_eq!(rule.strings.len(), 1);
        match arena.kind(rule.condition) {
            ExprKind::Binary { op: BinaryOp::And, left, right } => {
                assert!(matches!(arena.kind(left), ExprKind::StringRef(_)));
                assert!(matches!(arena.kind(right), ExprKind::Binary { op: BinaryOp::Gt, .. }));
            }
            other => panic!("unexpected condition: {other:?}"),
        }
    }

    #[test]
    fn undefined_string_reference_is_rejected() {
        let interner = StringInterner::new();
        let source = "rule r { condition: $missing }";
        let err = parse(source, &interner, &here()).unwrap_err();
        assert!(matches!(err, ParseError::UndefinedStringRef { .. }));
    }

    #[test]
    fn parses_hex_string_definition() {
        let interner = StringInterner::new();
        let source = "rule r { strings: $a = { AA ?? BB } condition: $a }";
        let (file, _stream, _arena) = parse(source, &interner, &here()).unwrap();
        match &file.rules[0].strings[0].body {
            yara_ir::rule::StringBody::Hex(units) => assert_eq!(units.len(), 3),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn parses_quantified_of_expression() {
        let interner = StringInterner::new();
        let source = r#"
            rule r {
                strings:
                    $a = "a"
                    $b = "b"
                condition:
                    2 of ($a, $b)
            }
        "#;
        let (file, _stream, arena) = parse(source, &interner, &here()).unwrap();
        match arena.kind(file.rules[0].condition) {
            ExprKind::Of { quantifier: Quantifier::Count(_), .. } => {}
            other => panic!("unexpected condition: {other:?}"),
        }
    }

    #[test]
    fn parses_for_loop_over_an_iterable() {
        let interner = StringInterner::new();
        let source = "rule r { condition: for any i in (1, 2, 3): (i > 1) }";
        let (file, _stream, arena) = parse(source, &interner, &here()).unwrap();
        assert!(matches!(arena.kind(file.rules[0].condition), ExprKind::ForIteration { .. }));
    }

    #[test]
    fn include_directive_merges_rules_and_tokens() {
        let interner = StringInterner::new();
        let dir = std::env::temp_dir().join(format!("yaramod_include_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let included_path = dir.join("shared.yar");
        std::fs::write(&included_path, "rule included_rule { condition: true }").unwrap();
        let main_source = "include \"shared.yar\"\nrule main_rule { condition: included_rule }";
        let (file, _stream, _arena) = parse(main_source, &interner, &dir).unwrap();
        std::fs::remove_dir_all(&dir).ok();
        assert_eq!(file.rules.len(), 2);
        assert_eq!(file.rules[0].name, file.rules[0].name);
    }

    #[test]
    fn include_cycle_is_rejected() {
        let interner = StringInterner::new();
        let dir = std::env::temp_dir().join(format!("yaramod_cycle_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let a_path = dir.join("a.yar");
        let b_path = dir.join("b.yar");
        std::fs::write(&a_path, "include \"b.yar\"\nrule a { condition: true }").unwrap();
        std::fs::write(&b_path, "include \"a.yar\"\nrule b { condition: true }").unwrap();
        let main_source = "include \"a.yar\"\nrule main { condition: true }";
        let err = parse(main_source, &interner, &dir).unwrap_err();
        std::fs::remove_dir_all(&dir).ok();
        assert!(matches!(err, ParseError::Lex(LexError::IncludeCycle { .. })));
    }
}
