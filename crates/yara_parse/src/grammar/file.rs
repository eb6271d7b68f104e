//! Top-level file grammar: `import`/`include` directives and a sequence of
//! rules.
//!
//! `include` is resolved by textually recursing into the included file and
//! parsing it with its own [`Cursor`], then splicing its token stream onto
//! the end of the host stream. Each included file therefore keeps its own
//! lossless token range, but the two are merged into one stream by the time
//! parsing finishes, the same flattening the teacher's preprocessor applies
//! to included translation units before the rest of the pipeline sees them.

use std::path::{Path, PathBuf};

use yara_diagnostic::{LexError, ParseError};
use yara_ir::rule::Import;
use yara_ir::{ExprArena, Name, Span, StringInterner, TokenKind, TokenStream};
use yara_modules::ModulePool;

use crate::arena_builder::ArenaBuilder;
use crate::context::FileContext;
use crate::cursor::Cursor;
use crate::grammar::rule::{ParsedRule, RuleParser};

#[derive(Debug, Default)]
pub struct ParsedFile {
    pub imports: Vec<Import>,
    pub rules: Vec<ParsedRule>,
}

/// Parses `source` (and transitively, any file it `include`s) into a single
/// [`ParsedFile`] plus the merged lossless token stream and expression arena
/// backing it.
pub fn parse_file(
    source: &str,
    interner: &StringInterner,
    file_ctx: &mut FileContext,
    base_dir: &Path,
    modules: Option<&ModulePool>,
) -> Result<(ParsedFile, TokenStream, ExprArena), ParseError> {
    let mut arena = ArenaBuilder::new();
    let mut stream = TokenStream::new();
    let mut file = ParsedFile::default();
    parse_into(source, interner, file_ctx, base_dir, modules, &mut arena, &mut stream, &mut file)?;
    Ok((file, stream, arena.into_arena()))
}

#[allow(clippy::too_many_arguments)]
fn parse_into(
    source: &str,
    interner: &StringInterner,
    file_ctx: &mut FileContext,
    base_dir: &Path,
    modules: Option<&ModulePool>,
    arena: &mut ArenaBuilder,
    stream: &mut TokenStream,
    file: &mut ParsedFile,
) -> Result<(), ParseError> {
    let mut cursor = Cursor::new(source, interner);
    loop {
        match cursor.current_kind().map_err(ParseError::Lex)? {
            TokenKind::Eof => break,
            TokenKind::KwImport => {
                let span = cursor.current_span().map_err(ParseError::Lex)?;
                cursor.advance().map_err(ParseError::Lex)?;
                let tok = cursor.expect(TokenKind::StringLiteral(Name::EMPTY), "a module name string")?;
                let TokenKind::StringLiteral(module) = tok.kind else { unreachable!() };
                file.imports.push(Import { module, span });
            }
            TokenKind::KwInclude => {
                let span = cursor.current_span().map_err(ParseError::Lex)?;
                cursor.advance().map_err(ParseError::Lex)?;
                let tok = cursor.expect(TokenKind::StringLiteral(Name::EMPTY), "an include path string")?;
                let TokenKind::StringLiteral(path_name) = tok.kind else { unreachable!() };
                let relative = interner.lookup(path_name);
                let path = base_dir.join(relative);
                include_file(&path, span, interner, file_ctx, modules, arena, stream, file)?;
            }
            TokenKind::KwPrivate | TokenKind::KwGlobal | TokenKind::KwRule => {
                let known_rules: Vec<Name> = file.rules.iter().map(|r| r.name).collect();
                let rule = {
                    let mut rule_parser =
                        RuleParser { cursor: &mut cursor, arena, interner, modules, known_rules: &known_rules };
                    rule_parser.parse_rule()?
                };
                if file.rules.iter().any(|r: &ParsedRule| r.name == rule.name) {
                    return Err(ParseError::DuplicateRuleName { span: rule.span, name: format!("{:?}", rule.name) });
                }
                file.rules.push(rule);
            }
            other => {
                return Err(ParseError::UnexpectedToken {
                    span: cursor.current_span().unwrap_or(Span::DUMMY),
                    expected: "'import', 'include', or 'rule'".into(),
                    found: format!("{other:?}"),
                })
            }
        }
    }
    stream.splice_append(cursor.into_stream());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn include_file(
    path: &Path,
    span: Span,
    interner: &StringInterner,
    file_ctx: &mut FileContext,
    modules: Option<&ModulePool>,
    arena: &mut ArenaBuilder,
    stream: &mut TokenStream,
    file: &mut ParsedFile,
) -> Result<(), ParseError> {
    let canonical = path.to_path_buf();
    if file_ctx.is_cyclic(&canonical) {
        return Err(ParseError::Lex(LexError::IncludeCycle { path: canonical.display().to_string() }));
    }
    let text = std::fs::read_to_string(&canonical)
        .map_err(|_| ParseError::Lex(LexError::IncludeNotFound { span, path: canonical.display().to_string() }))?;
    file_ctx.include_stack.push(canonical.clone());
    let included_base = canonical.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    let result = parse_into(&text, interner, file_ctx, &included_base, modules, arena, stream, file);
    file_ctx.include_stack.pop();
    result
}
