//! `logos`-derived token table for default-mode scanning. Hex-string,
//! regexp, and quoted-string bodies are not representable as a single
//! `logos` DFA (they nest brackets/escapes the default grammar doesn't), so
//! those are scanned by hand in [`crate::scanner`] once the parser asks the
//! scanner to switch mode.

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub enum RawToken {
    #[regex(r"[ \t]+")]
    Whitespace,
    #[regex(r"\r\n|\n")]
    Newline,
    #[regex(r"//[^\n]*")]
    LineComment,
    #[regex(r"/\*([^*]|\*[^/])*\*/")]
    BlockComment,

    #[token("rule")] KwRule,
    #[token("private")] KwPrivate,
    #[token("global")] KwGlobal,
    #[token("meta")] KwMeta,
    #[token("strings")] KwStrings,
    #[token("condition")] KwCondition,
    #[token("import")] KwImport,
    #[token("include")] KwInclude,
    #[token("true")] KwTrue,
    #[token("false")] KwFalse,
    #[token("not")] KwNot,
    #[token("and")] KwAnd,
    #[token("or")] KwOr,
    #[token("of")] KwOf,
    #[token("any")] KwAny,
    #[token("all")] KwAll,
    #[token("none")] KwNone,
    #[token("them")] KwThem,
    #[token("this")] KwThis,
    #[token("with")] KwWith,
    #[token("for")] KwFor,
    #[token("in")] KwIn,
    #[token("at")] KwAt,
    #[token("entrypoint")] KwEntrypoint,
    #[token("filesize")] KwFilesize,
    #[token("matches")] KwMatches,
    #[token("contains")] KwContains,
    #[token("icontains")] KwIcontains,
    #[token("startswith")] KwStartswith,
    #[token("istartswith")] KwIstartswith,
    #[token("endswith")] KwEndswith,
    #[token("iendswith")] KwIendswith,
    #[token("wide")] KwWide,
    #[token("ascii")] KwAscii,
    #[token("nocase")] KwNocase,
    #[token("fullword")] KwFullword,
    #[token("xor")] KwXor,
    #[token("base64wide")] KwBase64wide,
    #[token("base64")] KwBase64,
    #[token("defined")] KwDefined,
    #[token("int8be")] KwInt8be,
    #[token("int16be")] KwInt16be,
    #[token("int32be")] KwInt32be,
    #[token("int8")] KwInt8,
    #[token("int16")] KwInt16,
    #[token("int32")] KwInt32,
    #[token("uint8be")] KwUint8be,
    #[token("uint16be")] KwUint16be,
    #[token("uint32be")] KwUint32be,
    #[token("uint8")] KwUint8,
    #[token("uint16")] KwUint16,
    #[token("uint32")] KwUint32,

    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*\*")]
    StringIdWildcard,
    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*")]
    StringId,
    #[token("$")]
    AnonymousStringId,
    #[regex(r"#[A-Za-z_][A-Za-z0-9_]*")]
    StringCount,
    #[regex(r"@[A-Za-z_][A-Za-z0-9_]*")]
    StringOffset,
    #[regex(r"![A-Za-z_][A-Za-z0-9_]*")]
    StringLength,

    #[regex(r"0[xX][0-9A-Fa-f]+")]
    HexInteger,
    #[regex(r"[0-9]+(KB|MB)?")]
    DecimalInteger,
    #[regex(r"[0-9]+\.[0-9]+")]
    Float,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLiteral,
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,

    #[token("{")] LBrace,
    #[token("}")] RBrace,
    #[token("(")] LParen,
    #[token(")")] RParen,
    #[token("[")] LBracket,
    #[token("]")] RBracket,
    #[token(":")] Colon,
    #[token("=")] Equals,
    #[token(",")] Comma,
    #[token("..")] DotDot,
    #[token(".")] Dot,
    #[token("|")] Pipe,
    #[token("-")] Minus,
    #[token("+")] Plus,
    #[token("*")] Star,
    #[token("\\")] Backslash,
    #[token("/")] Slash,
    #[token("%")] Percent,
    #[token("~")] Tilde,
    #[token("<<")] Shl,
    #[token(">>")] Shr,
    #[token("&")] Amp,
    #[token("^")] Caret,
    #[token("<=")] Le,
    #[token("<")] Lt,
    #[token(">=")] Ge,
    #[token(">")] Gt,
    #[token("==")] EqEq,
    #[token("!=")] Ne,
    #[token("->")] Arrow,

    Error,
}
