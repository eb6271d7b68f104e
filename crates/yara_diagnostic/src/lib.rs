//! Error taxonomy for the yaramod engine: one leaf error enum per stage
//! (lexing, parsing, semantic analysis, module loading, builders, and
//! visitor-driven rewrites), each carrying a source [`Span`].

use yara_ir::Span;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("{span}: unterminated string literal")]
    UnterminatedString { span: Span },
    #[error("{span}: unterminated hex string")]
    UnterminatedHexString { span: Span },
    #[error("{span}: unterminated regexp")]
    UnterminatedRegexp { span: Span },
    #[error("{span}: unterminated block comment")]
    UnterminatedComment { span: Span },
    #[error("{span}: invalid escape sequence '\\{ch}'")]
    InvalidEscape { span: Span, ch: char },
    #[error("{span}: unexpected character '{ch}'")]
    UnexpectedChar { span: Span, ch: char },
    #[error("{span}: included file could not be read: {path}")]
    IncludeNotFound { span: Span, path: String },
    #[error("include cycle detected: {path}")]
    IncludeCycle { path: String },
}

/// Parsing never recovers: the first error reported by the grammar driver
/// stops the parse, so there is no hard/soft severity split to model.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("{span}: expected {expected}, found {found}")]
    UnexpectedToken { span: Span, expected: String, found: String },
    #[error("{span}: unclosed '{open}'")]
    UnclosedDelimiter { span: Span, open: &'static str },
    #[error("{span}: duplicate string identifier '{name}'")]
    DuplicateStringId { span: Span, name: String },
    #[error("{span}: duplicate rule name '{name}'")]
    DuplicateRuleName { span: Span, name: String },
    #[error("{span}: undefined string reference '{name}'")]
    UndefinedStringRef { span: Span, name: String },
    #[error("{span}: invalid hex-string jump bound: {min} > {max}")]
    InvalidHexJump { span: Span, min: u32, max: u32 },
    #[error("{span}: invalid regexp repetition bound: {min} > {max}")]
    InvalidRegexpRepetition { span: Span, min: u32, max: u32 },
    #[error(transparent)]
    Semantic(#[from] SemanticError),
    #[error(transparent)]
    Lex(#[from] LexError),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SemanticError {
    #[error("{span}: unknown identifier '{name}'")]
    UnknownIdentifier { span: Span, name: String },
    #[error("{span}: '{name}' is not callable")]
    NotCallable { span: Span, name: String },
    #[error("{span}: no overload of '{name}' accepts the given argument types")]
    NoMatchingOverload { span: Span, name: String },
    #[error("{span}: '{field}' is not a member of '{structure}'")]
    UnknownField { span: Span, structure: String, field: String },
    #[error("{span}: {message}")]
    TypeMismatch { span: Span, message: String },
    #[error("{span}: wildcard '{prefix}*' does not match any defined string")]
    EmptyWildcard { span: Span, prefix: String },
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ModuleError {
    #[error("module schema directory not found: {path}")]
    DirectoryNotFound { path: String },
    #[error("failed to parse module schema '{path}': {message}")]
    InvalidSchema { path: String, message: String },
    #[error("unknown schema 'kind': '{kind}'")]
    UnknownKind { kind: String },
    #[error("unknown value 'type': '{ty}'")]
    UnknownType { ty: String },
    #[error("dangling structure reference: '{target}'")]
    UnknownReference { target: String },
    #[error("colliding definitions for module '{module}'")]
    CollidingDefinition { module: String },
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuilderError {
    #[error("builder produced an incomplete rule: missing {field}")]
    MissingField { field: &'static str },
    #[error("builder condition expression is empty")]
    EmptyCondition,
    #[error("builder-emitted source failed to reparse: {0}")]
    Reparse(#[from] ParseError),
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum VisitorResultError {
    #[error("a modifying visitor deleted a node with no valid replacement at {span}")]
    InvalidDeletion { span: Span },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_displays_span_and_message() {
        let err = ParseError::UnexpectedToken {
            span: Span::new(3, 4),
            expected: "'{'".into(),
            found: "';'".into(),
        };
        assert_eq!(err.to_string(), "3..4: expected '{', found ';'");
    }

    #[test]
    fn lex_error_wraps_into_parse_error() {
        let lex = LexError::UnterminatedString { span: Span::new(0, 1) };
        let parse: ParseError = lex.clone().into();
        assert_eq!(parse.to_string(), lex.to_string());
    }

    #[test]
    fn semantic_error_wraps_into_parse_error() {
        let sem = SemanticError::TypeMismatch { span: Span::new(0, 1), message: "bad types".into() };
        let parse: ParseError = sem.clone().into();
        assert_eq!(parse.to_string(), sem.to_string());
    }
}
