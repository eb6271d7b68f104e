//! Fluent builders for constructing YARA source from scratch: expressions,
//! hex-string bodies, single rules, and whole files.
//!
//! [`YaraRuleBuilder`] and [`YaraFileBuilder`] both render their accumulated
//! fields into YARA source text and reparse it before handing back a
//! result, rather than assembling an [`yara_ir::ast::arena::ExprArena`]
//! directly — there's no safe way to merge two arenas (no such primitive
//! exists on `ExprArena`), so going through source text and the ordinary
//! parser is both simpler and gives builder users the same validation a
//! hand-written `.yar` file gets.

mod expr;
mod file;
mod hex;
mod rule;

pub use expr::YaraExpressionBuilder;
pub use file::YaraFileBuilder;
pub use hex::YaraHexStringBuilder;
pub use rule::YaraRuleBuilder;

use yara_ir::{Name, TokenStream};

/// A rule built by [`YaraRuleBuilder::get`], ready to hand to
/// [`crate::YaraFile::add_rule`].
pub struct BuiltRule {
    pub(crate) name: Name,
    pub(crate) stream: TokenStream,
}

impl BuiltRule {
    #[must_use]
    pub fn name(&self, interner: &yara_ir::StringInterner) -> String {
        interner.lookup(self.name).to_string()
    }
}
