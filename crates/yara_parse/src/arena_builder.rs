//! Thin instrumented wrapper around [`yara_ir::ExprArena`] used while
//! parsing a single file, so node allocation shows up in trace logs the same
//! way token pulls and rule completions do.

use tracing::trace;
use yara_ir::ast::{ExprId, ExprRange, ExprType, NameRange};
use yara_ir::{ExprArena, ExprKind, Name, Span, TokenRange};

#[derive(Default)]
pub struct ArenaBuilder {
    arena: ExprArena,
}

impl ArenaBuilder {
    #[must_use]
    pub fn new() -> Self {
        ArenaBuilder::default()
    }

    pub fn push(&mut self, kind: ExprKind, span: Span, tokens: TokenRange, ty: ExprType) -> ExprId {
        let id = self.arena.push(kind, span, tokens, ty);
        trace!(id = id.index(), ?kind, ?ty, "expr node");
        id
    }

    #[must_use]
    pub fn ty(&self, id: ExprId) -> ExprType {
        self.arena.ty(id)
    }

    #[must_use]
    pub fn tokens(&self, id: ExprId) -> TokenRange {
        self.arena.tokens(id)
    }

    pub fn push_expr_list(&mut self, items: &[ExprId]) -> ExprRange {
        self.arena.push_expr_list(items)
    }

    pub fn push_name_list(&mut self, items: &[Name]) -> NameRange {
        self.arena.push_name_list(items)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    #[must_use]
    pub fn into_arena(self) -> ExprArena {
        self.arena
    }

    #[must_use]
    pub fn arena(&self) -> &ExprArena {
        &self.arena
    }
}
