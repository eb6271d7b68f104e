//! Precedence-climbing parser for the condition-expression language.
//!
//! Tiers, loosest to tightest: `or`, `and`, `not`, relational
//! (`contains`/`matches`/`==`/...), bitwise-or, bitwise-xor, bitwise-and,
//! shift, additive, multiplicative, unary, postfix (`.field`, `[index]`,
//! `(call)`), primary.
//!
//! Every node pushed into the arena carries the [`TokenRange`] of tokens it
//! was built from (so a later [`yara_ir::visitor::ModifyingVisitor`] can
//! splice the token stream in lockstep with an arena edit) and an
//! [`ExprType`] derived right here by the same semantic actions that build
//! the node. `ExprType::Undefined` is used wherever full resolution would
//! need a module schema this parse wasn't given; type-mismatch checks treat
//! it as compatible with anything.

use yara_diagnostic::{ParseError, SemanticError};
use yara_ir::ast::{BinaryOp, ExprId, ExprKind, ExprType, IntFunctionKind, Quantifier, UnaryOp};
use yara_ir::symbol::{Symbol, ValueType};
use yara_ir::{Name, Span, StringInterner, TokenId, TokenKind, TokenRange};
use yara_modules::ModulePool;

use crate::context::RuleContext;
use crate::cursor::Cursor;
use crate::ArenaBuilder;

pub struct ExprParser<'p, 'src> {
    pub cursor: &'p mut Cursor<'src>,
    pub arena: &'p mut ArenaBuilder,
    pub ctx: &'p mut RuleContext,
    pub interner: &'src StringInterner,
    pub modules: Option<&'p ModulePool>,
}

type PResult<T> = Result<T, ParseError>;

impl<'p, 'src> ExprParser<'p, 'src> {
    pub fn parse_condition(&mut self) -> PResult<ExprId> {
        self.parse_or()
    }

    fn require(span: Span, cond: bool, message: impl Into<String>) -> PResult<()> {
        if cond {
            Ok(())
        } else {
            Err(ParseError::Semantic(SemanticError::TypeMismatch { span, message: message.into() }))
        }
    }

    fn binary_result_type(op: BinaryOp, l: ExprType, r: ExprType, span: Span) -> PResult<ExprType> {
        match op {
            BinaryOp::And | BinaryOp::Or => {
                Self::require(span, l.is_bool() && r.is_bool(), "'and'/'or' require boolean operands")?;
                Ok(ExprType::Bool)
            }
            BinaryOp::Eq | BinaryOp::Neq | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                Self::require(span, l.comparable_with(r), "relational operator requires comparable operand types")?;
                Ok(ExprType::Bool)
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                Self::require(span, l.is_numeric() && r.is_numeric(), "arithmetic operator requires numeric operands")?;
                Ok(if l == ExprType::Float || r == ExprType::Float { ExprType::Float } else { ExprType::Int })
            }
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr => {
                Self::require(span, l.is_int() && r.is_int(), "bitwise operator requires integer operands")?;
                Ok(ExprType::Int)
            }
            BinaryOp::Contains
            | BinaryOp::IContains
            | BinaryOp::StartsWith
            | BinaryOp::IStartsWith
            | BinaryOp::EndsWith
            | BinaryOp::IEndsWith => {
                Self::require(span, l.is_string() && r.is_string(), "string predicate requires string operands")?;
                Ok(ExprType::Bool)
            }
            BinaryOp::Matches => {
                Self::require(span, l.is_string(), "'matches' requires a string left-hand side")?;
                Ok(ExprType::Bool)
            }
        }
    }

    fn unary_result_type(op: UnaryOp, operand: ExprType, span: Span) -> PResult<ExprType> {
        match op {
            UnaryOp::Neg => {
                Self::require(span, operand.is_numeric(), "unary '-' requires a numeric operand")?;
                Ok(operand)
            }
            UnaryOp::BitNot => {
                Self::require(span, operand.is_int(), "'~' requires an integer operand")?;
                Ok(ExprType::Int)
            }
            UnaryOp::Not => {
                Self::require(span, operand.is_bool(), "'not' requires a boolean operand")?;
                Ok(ExprType::Bool)
            }
        }
    }

    fn value_type_to_expr(ty: ValueType) -> ExprType {
        match ty {
            ValueType::Integer => ExprType::Int,
            ValueType::Float => ExprType::Float,
            ValueType::Bool => ExprType::Bool,
            ValueType::Text => ExprType::String,
        }
    }

    fn value_type_assignable(param: ValueType, arg: ExprType) -> bool {
        if arg == ExprType::Undefined {
            return true;
        }
        matches!(
            (param, arg),
            (ValueType::Integer, ExprType::Int)
                | (ValueType::Float, ExprType::Float)
                | (ValueType::Integer, ExprType::Float)
                | (ValueType::Float, ExprType::Int)
                | (ValueType::Bool, ExprType::Bool)
                | (ValueType::Text, ExprType::String)
        )
    }

    fn symbol_type(sym: &Symbol) -> ExprType {
        match sym {
            Symbol::Value { ty, .. } => Self::value_type_to_expr(*ty),
            Symbol::Array { .. } | Symbol::Dictionary { .. } | Symbol::Structure { .. } | Symbol::Reference { .. } => {
                ExprType::Object
            }
            Symbol::Function { .. } => ExprType::Object,
        }
    }

    /// Resolves `id`'s module symbol, following `Identifier`/`Field`/`Index`
    /// chains against the loaded module catalogue. Returns `None` whenever
    /// the chain can't be resolved (no catalogue loaded, or it bottoms out
    /// on something other than a module-rooted identifier).
    fn resolve_symbol(&self, id: ExprId) -> Option<Symbol> {
        let modules = self.modules?;
        match self.arena.arena().kind(id) {
            ExprKind::Identifier(name) => {
                let module = modules.get(name)?;
                Some(Symbol::Structure { name, attributes: module.root.clone() })
            }
            ExprKind::Field { receiver, field } => {
                let parent = self.resolve_symbol(receiver)?;
                let structure = match parent {
                    Symbol::Structure { attributes, .. } => attributes,
                    Symbol::Reference { target, .. } => modules.get(target)?.root.clone(),
                    _ => return None,
                };
                structure.get(field).cloned()
            }
            ExprKind::Index { receiver, .. } => match self.resolve_symbol(receiver)? {
                Symbol::Array { element, .. } | Symbol::Dictionary { value: element, .. } => Some(*element),
                _ => None,
            },
            _ => None,
        }
    }

    fn describe_expr(&self, id: ExprId) -> String {
        match self.arena.arena().kind(id) {
            ExprKind::Identifier(name) => self.interner.lookup(name).to_string(),
            ExprKind::Field { field, .. } => self.interner.lookup(field).to_string(),
            _ => "<expression>".to_string(),
        }
    }

    fn resolve_identifier_type(&self, name: Name, span: Span) -> PResult<ExprType> {
        if self.ctx.is_known_rule(name) {
            return Ok(ExprType::Bool);
        }
        if self.ctx.is_local(name) {
            return Ok(ExprType::Undefined);
        }
        let Some(modules) = self.modules else { return Ok(ExprType::Undefined) };
        if modules.get(name).is_some() {
            return Ok(ExprType::Object);
        }
        Err(ParseError::Semantic(SemanticError::UnknownIdentifier {
            span,
            name: self.interner.lookup(name).to_string(),
        }))
    }

    fn resolve_field_type(&self, receiver: ExprId, field: Name, span: Span) -> PResult<ExprType> {
        if self.modules.is_none() {
            return Ok(ExprType::Undefined);
        }
        let modules = self.modules.unwrap();
        let Some(parent) = self.resolve_symbol(receiver) else { return Ok(ExprType::Undefined) };
        let structure = match parent {
            Symbol::Structure { attributes, .. } => attributes,
            Symbol::Reference { target, .. } => match modules.get(target) {
                Some(m) => m.root.clone(),
                None => return Ok(ExprType::Undefined),
            },
            _ => return Ok(ExprType::Undefined),
        };
        match structure.get(field) {
            Some(sym) => Ok(Self::symbol_type(sym)),
            None => Err(ParseError::Semantic(SemanticError::UnknownField {
                span,
                structure: self.describe_expr(receiver),
                field: self.interner.lookup(field).to_string(),
            })),
        }
    }

    fn resolve_index_type(&self, receiver: ExprId) -> ExprType {
        match self.resolve_symbol(receiver) {
            Some(Symbol::Array { element, .. } | Symbol::Dictionary { value: element, .. }) => {
                Self::symbol_type(&element)
            }
            _ => ExprType::Undefined,
        }
    }

    fn resolve_call_type(&self, callee: ExprId, args: &[ExprId], span: Span) -> PResult<ExprType> {
        if self.modules.is_none() {
            return Ok(ExprType::Undefined);
        }
        let Some(sym) = self.resolve_symbol(callee) else { return Ok(ExprType::Undefined) };
        let Symbol::Function { name, overloads } = sym else {
            return Err(ParseError::Semantic(SemanticError::NotCallable { span, name: self.describe_expr(callee) }));
        };
        let arg_types: Vec<ExprType> = args.iter().map(|&a| self.arena.ty(a)).collect();
        let matching = overloads.iter().find(|ov| {
            ov.params.len() == arg_types.len()
                && ov.params.iter().zip(&arg_types).all(|(p, a)| Self::value_type_assignable(*p, *a))
        });
        match matching {
            Some(ov) => Ok(Self::value_type_to_expr(ov.return_type)),
            None => Err(ParseError::Semantic(SemanticError::NoMatchingOverload {
                span,
                name: self.interner.lookup(name).to_string(),
            })),
        }
    }

    fn parse_or(&mut self) -> PResult<ExprId> {
        let start = self.cursor.current_id().map_err(ParseError::Lex)?;
        let mut left = self.parse_and()?;
        while self.cursor.check(&TokenKind::KwOr).map_err(ParseError::Lex)? {
            let span = self.cursor.current_span().map_err(ParseError::Lex)?;
            self.cursor.advance().map_err(ParseError::Lex)?;
            let right = self.parse_and()?;
            let ty = Self::binary_result_type(BinaryOp::Or, self.arena.ty(left), self.arena.ty(right), span)?;
            let last = self.cursor.last_id().unwrap_or(start);
            left = self.arena.push(
                ExprKind::Binary { op: BinaryOp::Or, left, right },
                span,
                TokenRange { first: start, last },
                ty,
            );
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> PResult<ExprId> {
        let start = self.cursor.current_id().map_err(ParseError::Lex)?;
        let mut left = self.parse_not()?;
        while self.cursor.check(&TokenKind::KwAnd).map_err(ParseError::Lex)? {
            let span = self.cursor.current_span().map_err(ParseError::Lex)?;
            self.cursor.advance().map_err(ParseError::Lex)?;
            let right = self.parse_not()?;
            let ty = Self::binary_result_type(BinaryOp::And, self.arena.ty(left), self.arena.ty(right), span)?;
            let last = self.cursor.last_id().unwrap_or(start);
            left = self.arena.push(
                ExprKind::Binary { op: BinaryOp::And, left, right },
                span,
                TokenRange { first: start, last },
                ty,
            );
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> PResult<ExprId> {
        if self.cursor.check(&TokenKind::KwNot).map_err(ParseError::Lex)? {
            let start = self.cursor.current_id().map_err(ParseError::Lex)?;
            let span = self.cursor.current_span().map_err(ParseError::Lex)?;
            self.cursor.advance().map_err(ParseError::Lex)?;
            let operand = self.parse_not()?;
            let ty = Self::unary_result_type(UnaryOp::Not, self.arena.ty(operand), span)?;
            let last = self.cursor.last_id().unwrap_or(start);
            return Ok(self.arena.push(
                ExprKind::Unary { op: UnaryOp::Not, operand },
                span,
                TokenRange { first: start, last },
                ty,
            ));
        }
        self.parse_relational()
    }

    fn relational_op(kind: TokenKind) -> Option<BinaryOp> {
        Some(match kind {
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Le => BinaryOp::Le,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::Ge => BinaryOp::Ge,
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::Ne => BinaryOp::Neq,
            TokenKind::KwContains => BinaryOp::Contains,
            TokenKind::KwIcontains => BinaryOp::IContains,
            TokenKind::KwStartswith => BinaryOp::StartsWith,
            TokenKind::KwIstartswith => BinaryOp::IStartsWith,
            TokenKind::KwEndswith => BinaryOp::EndsWith,
            TokenKind::KwIendswith => BinaryOp::IEndsWith,
            TokenKind::KwMatches => BinaryOp::Matches,
            _ => return None,
        })
    }

    fn parse_relational(&mut self) -> PResult<ExprId> {
        let start = self.cursor.current_id().map_err(ParseError::Lex)?;
        let mut left = self.parse_bitor()?;
        loop {
            let kind = self.cursor.current_kind().map_err(ParseError::Lex)?;
            let Some(op) = Self::relational_op(kind) else { break };
            let span = self.cursor.current_span().map_err(ParseError::Lex)?;
            self.cursor.advance().map_err(ParseError::Lex)?;
            let right = if op == BinaryOp::Matches { self.parse_regexp_operand()? } else { self.parse_bitor()? };
            let ty = Self::binary_result_type(op, self.arena.ty(left), self.arena.ty(right), span)?;
            let last = self.cursor.last_id().unwrap_or(start);
            left = self.arena.push(ExprKind::Binary { op, left, right }, span, TokenRange { first: start, last }, ty);
        }
        Ok(left)
    }

    fn parse_regexp_operand(&mut self) -> PResult<ExprId> {
        // The opening '/' is still lexed in Default mode (so ordinary
        // whitespace-skipping finds it); only once it's consumed does
        // switching to `Mode::Regexp` land the scanner in the right place
        // for `next_regexp_body` to scan the pattern itself.
        let start = self.cursor.current_id().map_err(ParseError::Lex)?;
        let open_span = self.cursor.expect(TokenKind::Slash, "'/'")?.span;
        self.cursor.set_mode(yara_lexer::Mode::Regexp);
        let tok = self.cursor.expect(TokenKind::RegexpLiteral(Name::EMPTY), "a regexp literal")?;
        let TokenKind::RegexpLiteral(name) = tok.kind else { unreachable!() };
        self.consume_regexp_flags()?;
        let last = self.cursor.last_id().unwrap_or(start);
        Ok(self.arena.push(
            ExprKind::RegexpLiteral(name),
            open_span.merge(tok.span),
            TokenRange { first: start, last },
            ExprType::Regexp,
        ))
    }

    /// The lexer's regexp sub-scanner stops at (and consumes) the closing
    /// `/`; trailing `i`/`s` flags land back in default mode as a plain
    /// identifier immediately afterward.
    fn consume_regexp_flags(&mut self) -> PResult<()> {
        if let TokenKind::Identifier(name) = self.cursor.current_kind().map_err(ParseError::Lex)? {
            let text = self.interner.lookup(name);
            if !text.is_empty() && text.chars().all(|c| c == 'i' || c == 's') {
                self.cursor.advance().map_err(ParseError::Lex)?;
            }
        }
        Ok(())
    }

    fn parse_bitor(&mut self) -> PResult<ExprId> {
        self.parse_left_assoc(Self::parse_bitxor, &[(TokenKind::Pipe, BinaryOp::BitOr)])
    }

    fn parse_bitxor(&mut self) -> PResult<ExprId> {
        self.parse_left_assoc(Self::parse_bitand, &[(TokenKind::Caret, BinaryOp::BitXor)])
    }

    fn parse_bitand(&mut self) -> PResult<ExprId> {
        self.parse_left_assoc(Self::parse_shift, &[(TokenKind::Amp, BinaryOp::BitAnd)])
    }

    fn parse_shift(&mut self) -> PResult<ExprId> {
        self.parse_left_assoc(
            Self::parse_additive,
            &[(TokenKind::Shl, BinaryOp::Shl), (TokenKind::Shr, BinaryOp::Shr)],
        )
    }

    fn parse_additive(&mut self) -> PResult<ExprId> {
        self.parse_left_assoc(
            Self::parse_multiplicative,
            &[(TokenKind::Plus, BinaryOp::Add), (TokenKind::Minus, BinaryOp::Sub)],
        )
    }

    fn parse_multiplicative(&mut self) -> PResult<ExprId> {
        self.parse_left_assoc(
            Self::parse_unary,
            &[(TokenKind::Star, BinaryOp::Mul), (TokenKind::Backslash, BinaryOp::Div), (TokenKind::Percent, BinaryOp::Mod)],
        )
    }

    fn parse_left_assoc(
        &mut self,
        mut next: impl FnMut(&mut Self) -> PResult<ExprId>,
        ops: &[(TokenKind, BinaryOp)],
    ) -> PResult<ExprId> {
        let start = self.cursor.current_id().map_err(ParseError::Lex)?;
        let mut left = next(self)?;
        loop {
            let kind = self.cursor.current_kind().map_err(ParseError::Lex)?;
            let Some(&(_, op)) = ops.iter().find(|(k, _)| std::mem::discriminant(k) == std::mem::discriminant(&kind))
            else {
                break;
            };
            let span = self.cursor.current_span().map_err(ParseError::Lex)?;
            self.cursor.advance().map_err(ParseError::Lex)?;
            let right = next(self)?;
            let ty = Self::binary_result_type(op, self.arena.ty(left), self.arena.ty(right), span)?;
            let last = self.cursor.last_id().unwrap_or(start);
            left = self.arena.push(ExprKind::Binary { op, left, right }, span, TokenRange { first: start, last }, ty);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> PResult<ExprId> {
        let kind = self.cursor.current_kind().map_err(ParseError::Lex)?;
        let (op, unary_kind) = match kind {
            TokenKind::Minus => (UnaryOp::Neg, true),
            TokenKind::Tilde => (UnaryOp::BitNot, true),
            _ => (UnaryOp::Neg, false),
        };
        if unary_kind {
            let start = self.cursor.current_id().map_err(ParseError::Lex)?;
            let span = self.cursor.current_span().map_err(ParseError::Lex)?;
            self.cursor.advance().map_err(ParseError::Lex)?;
            let operand = self.parse_unary()?;
            let ty = Self::unary_result_type(op, self.arena.ty(operand), span)?;
            let last = self.cursor.last_id().unwrap_or(start);
            return Ok(self.arena.push(ExprKind::Unary { op, operand }, span, TokenRange { first: start, last }, ty));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> PResult<ExprId> {
        let mut expr = self.parse_primary()?;
        loop {
            let start = self.arena.tokens(expr).first;
            match self.cursor.current_kind().map_err(ParseError::Lex)? {
                TokenKind::Dot => {
                    let span = self.cursor.current_span().map_err(ParseError::Lex)?;
                    self.cursor.advance().map_err(ParseError::Lex)?;
                    let field = self.expect_identifier_name()?;
                    let ty = self.resolve_field_type(expr, field, span)?;
                    let last = self.cursor.last_id().unwrap_or(start);
                    expr = self.arena.push(ExprKind::Field { receiver: expr, field }, span, TokenRange { first: start, last }, ty);
                }
                TokenKind::LBracket => {
                    self.cursor.advance().map_err(ParseError::Lex)?;
                    let index = self.parse_condition_as_arithmetic()?;
                    Self::require(
                        self.arena.arena().span(index),
                        self.arena.ty(index).is_int(),
                        "array/dictionary index must be an integer",
                    )?;
                    let span = self.cursor.current_span().map_err(ParseError::Lex)?;
                    self.cursor.expect(TokenKind::RBracket, "']'")?;
                    let ty = self.resolve_index_type(expr);
                    let last = self.cursor.last_id().unwrap_or(start);
                    expr = self.arena.push(ExprKind::Index { receiver: expr, index }, span, TokenRange { first: start, last }, ty);
                }
                TokenKind::LParenPlain => {
                    let paren_id = self.cursor.advance().map_err(ParseError::Lex)?;
                    self.cursor.retag(paren_id, TokenKind::LParenCall);
                    let span = self.cursor.current_span().map_err(ParseError::Lex)?;
                    let mut args = Vec::new();
                    if !self.cursor.check(&TokenKind::RParen).map_err(ParseError::Lex)? {
                        loop {
                            args.push(self.parse_condition_as_arithmetic()?);
                            if self.cursor.check(&TokenKind::Comma).map_err(ParseError::Lex)? {
                                self.cursor.advance().map_err(ParseError::Lex)?;
                                continue;
                            }
                            break;
                        }
                    }
                    self.cursor.expect(TokenKind::RParen, "')'")?;
                    let ty = self.resolve_call_type(expr, &args, span)?;
                    let range = self.arena.push_expr_list(&args);
                    let last = self.cursor.last_id().unwrap_or(start);
                    expr = self.arena.push(ExprKind::Call { callee: expr, args: range }, span, TokenRange { first: start, last }, ty);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Arithmetic-level parse used for call arguments and array indices:
    /// these never contain top-level boolean `and`/`or`, only arithmetic.
    fn parse_condition_as_arithmetic(&mut self) -> PResult<ExprId> {
        self.parse_bitor()
    }

    /// Consumes a `(` expected to open a call/enumeration body, retagging it
    /// to `retag_as` for the pretty-printer. Unlike the postfix-chain sites
    /// (which already matched `LParenPlain` in the same `match`), the
    /// call sites here reach this position after consuming unrelated
    /// tokens first, so the `(` itself still needs validating.
    fn expect_lparen(&mut self, retag_as: TokenKind, context: &'static str) -> PResult<()> {
        if self.cursor.current_kind().map_err(ParseError::Lex)? != TokenKind::LParenPlain {
            return Err(ParseError::UnexpectedToken {
                span: self.cursor.current_span().unwrap_or(yara_ir::Span::DUMMY),
                expected: context.into(),
                found: format!("{:?}", self.cursor.current_kind().map_err(ParseError::Lex)?),
            });
        }
        let paren_id = self.cursor.advance().map_err(ParseError::Lex)?;
        self.cursor.retag(paren_id, retag_as);
        Ok(())
    }

    fn expect_identifier_name(&mut self) -> PResult<Name> {
        let kind = self.cursor.current_kind().map_err(ParseError::Lex)?;
        match kind {
            TokenKind::Identifier(name) => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                Ok(name)
            }
            _ => Err(ParseError::UnexpectedToken {
                span: self.cursor.current_span().unwrap_or(yara_ir::Span::DUMMY),
                expected: "an identifier".into(),
                found: format!("{kind:?}"),
            }),
        }
    }

    fn parse_primary(&mut self) -> PResult<ExprId> {
        let start = self.cursor.current_id().map_err(ParseError::Lex)?;
        let span = self.cursor.current_span().map_err(ParseError::Lex)?;
        match self.cursor.current_kind().map_err(ParseError::Lex)? {
            TokenKind::KwTrue => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                Ok(self.arena.push(ExprKind::BoolLiteral(true), span, TokenRange::single(start), ExprType::Bool))
            }
            TokenKind::KwFalse => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                Ok(self.arena.push(ExprKind::BoolLiteral(false), span, TokenRange::single(start), ExprType::Bool))
            }
            TokenKind::KwFilesize => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                Ok(self.arena.push(ExprKind::Filesize, span, TokenRange::single(start), ExprType::Int))
            }
            TokenKind::KwEntrypoint => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                Ok(self.arena.push(ExprKind::Entrypoint, span, TokenRange::single(start), ExprType::Int))
            }
            TokenKind::KwThem => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                Ok(self.arena.push(ExprKind::Them, span, TokenRange::single(start), ExprType::Undefined))
            }
            TokenKind::KwThis => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                Ok(self.arena.push(ExprKind::This, span, TokenRange::single(start), ExprType::Undefined))
            }
            TokenKind::KwWith => self.parse_with_expr(),
            TokenKind::KwDefined => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                self.cursor.expect(TokenKind::LParenPlain, "'('")?;
                let inner = self.parse_or()?;
                self.cursor.expect(TokenKind::RParen, "')'")?;
                let last = self.cursor.last_id().unwrap_or(start);
                Ok(self.arena.push(ExprKind::Defined(inner), span, TokenRange { first: start, last }, ExprType::Bool))
            }
            TokenKind::FloatLiteral(f) => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                Ok(self.arena.push(ExprKind::FloatLiteral(f), span, TokenRange::single(start), ExprType::Float))
            }
            TokenKind::IntegerLiteral(v, mult, _) => {
                if self.looks_like_of_count()? {
                    return self.parse_of_with_count();
                }
                self.cursor.advance().map_err(ParseError::Lex)?;
                Ok(self.arena.push(ExprKind::IntegerLiteral(mult.apply(v)), span, TokenRange::single(start), ExprType::Int))
            }
            TokenKind::StringLiteral(n) => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                Ok(self.arena.push(ExprKind::TextLiteral(n), span, TokenRange::single(start), ExprType::String))
            }
            TokenKind::StringId(name) => self.parse_string_ref(name, span, start),
            TokenKind::StringIdWildcard(_) => Err(ParseError::UnexpectedToken {
                span,
                expected: "a concrete string reference".into(),
                found: "a wildcard string reference outside a string set".into(),
            }),
            TokenKind::StringCount(name) => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                Ok(self.arena.push(ExprKind::StringCount(name), span, TokenRange::single(start), ExprType::Int))
            }
            TokenKind::StringOffset(name) => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                let index = self.parse_optional_bracket_index()?;
                let last = self.cursor.last_id().unwrap_or(start);
                Ok(self.arena.push(ExprKind::StringOffset { name, index }, span, TokenRange { first: start, last }, ExprType::Int))
            }
            TokenKind::StringLength(name) => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                let index = self.parse_optional_bracket_index()?;
                let last = self.cursor.last_id().unwrap_or(start);
                Ok(self.arena.push(ExprKind::StringLength { name, index }, span, TokenRange { first: start, last }, ExprType::Int))
            }
            TokenKind::Identifier(name) => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                let ty = self.resolve_identifier_type(name, span)?;
                Ok(self.arena.push(ExprKind::Identifier(name), span, TokenRange::single(start), ty))
            }
            k @ (TokenKind::KwInt8
            | TokenKind::KwInt16
            | TokenKind::KwInt32
            | TokenKind::KwInt8be
            | TokenKind::KwInt16be
            | TokenKind::KwInt32be
            | TokenKind::KwUint8
            | TokenKind::KwUint16
            | TokenKind::KwUint32
            | TokenKind::KwUint8be
            | TokenKind::KwUint16be
            | TokenKind::KwUint32be) => self.parse_int_function(k, span, start),
            TokenKind::KwAny | TokenKind::KwAll | TokenKind::KwNone => self.parse_of_from_keyword(),
            TokenKind::KwFor => self.parse_for_expr(),
            TokenKind::LParenPlain => self.parse_parenthesized(),
            other => Err(ParseError::UnexpectedToken {
                span,
                expected: "an expression".into(),
                found: format!("{other:?}"),
            }),
        }
    }

    fn looks_like_of_count(&mut self) -> PResult<bool> {
        let next = self.cursor.peek_kind(1).map_err(ParseError::Lex)?;
        if next == TokenKind::KwOf {
            return Ok(true);
        }
        if next == TokenKind::Percent {
            let after = self.cursor.peek_kind(2).map_err(ParseError::Lex)?;
            return Ok(after == TokenKind::KwOf);
        }
        Ok(false)
    }

    /// Called once `looks_like_of_count` has confirmed the current token is
    /// an integer literal directly followed by `of` or `% of`. Consumes the
    /// literal itself rather than recursing back through the precedence
    /// tiers, since re-entering `parse_primary` on the same token would see
    /// the identical lookahead and recurse forever.
    fn parse_of_with_count(&mut self) -> PResult<ExprId> {
        let start = self.cursor.current_id().map_err(ParseError::Lex)?;
        let span = self.cursor.current_span().map_err(ParseError::Lex)?;
        let TokenKind::IntegerLiteral(v, mult, _) = self.cursor.current_kind().map_err(ParseError::Lex)? else {
            unreachable!("parse_of_with_count requires a leading integer literal");
        };
        self.cursor.advance().map_err(ParseError::Lex)?;
        let count = self.arena.push(ExprKind::IntegerLiteral(mult.apply(v)), span, TokenRange::single(start), ExprType::Int);
        let quantifier = if self.cursor.check(&TokenKind::Percent).map_err(ParseError::Lex)? {
            self.cursor.advance().map_err(ParseError::Lex)?;
            Quantifier::Percentage(count)
        } else {
            Quantifier::Count(count)
        };
        self.finish_of_expr(quantifier, span, start)
    }

    fn parse_of_from_keyword(&mut self) -> PResult<ExprId> {
        let start = self.cursor.current_id().map_err(ParseError::Lex)?;
        let span = self.cursor.current_span().map_err(ParseError::Lex)?;
        let quantifier = match self.cursor.current_kind().map_err(ParseError::Lex)? {
            TokenKind::KwAny => Quantifier::Any,
            TokenKind::KwAll => Quantifier::All,
            TokenKind::KwNone => Quantifier::None,
            other => unreachable!("parse_of_from_keyword called on {other:?}"),
        };
        self.cursor.advance().map_err(ParseError::Lex)?;
        self.finish_of_expr(quantifier, span, start)
    }

    fn finish_of_expr(&mut self, quantifier: Quantifier, span: Span, start: yara_ir::TokenId) -> PResult<ExprId> {
        self.cursor.expect(TokenKind::KwOf, "'of'")?;
        let set = self.parse_string_set_or_them()?;
        let in_range = if self.cursor.check(&TokenKind::KwIn).map_err(ParseError::Lex)? {
            self.cursor.advance().map_err(ParseError::Lex)?;
            Some(self.parse_range()?)
        } else {
            None
        };
        let last = self.cursor.last_id().unwrap_or(start);
        Ok(self.arena.push(ExprKind::Of { quantifier, set, in_range }, span, TokenRange { first: start, last }, ExprType::Bool))
    }

    fn parse_string_set_or_them(&mut self) -> PResult<ExprId> {
        let start = self.cursor.current_id().map_err(ParseError::Lex)?;
        let span = self.cursor.current_span().map_err(ParseError::Lex)?;
        if self.cursor.check(&TokenKind::KwThem).map_err(ParseError::Lex)? {
            self.cursor.advance().map_err(ParseError::Lex)?;
            return Ok(self.arena.push(ExprKind::Them, span, TokenRange::single(start), ExprType::Undefined));
        }
        self.cursor.expect(TokenKind::LParenPlain, "'(' or 'them'")?;
        let mut items = Vec::new();
        loop {
            let item_start = self.cursor.current_id().map_err(ParseError::Lex)?;
            let item_span = self.cursor.current_span().map_err(ParseError::Lex)?;
            match self.cursor.current_kind().map_err(ParseError::Lex)? {
                TokenKind::StringId(name) => {
                    self.cursor.advance().map_err(ParseError::Lex)?;
                    items.push(self.arena.push(
                        ExprKind::StringRef(name),
                        item_span,
                        TokenRange::single(item_start),
                        ExprType::Bool,
                    ));
                }
                TokenKind::StringIdWildcard(name) => {
                    self.cursor.advance().map_err(ParseError::Lex)?;
                    let prefix = self.interner.lookup(name);
                    if self.ctx.wildcard_matches(prefix).is_empty() {
                        return Err(ParseError::Semantic(SemanticError::EmptyWildcard {
                            span: item_span,
                            prefix: prefix.to_string(),
                        }));
                    }
                    items.push(self.arena.push(
                        ExprKind::StringWildcard(name),
                        item_span,
                        TokenRange::single(item_start),
                        ExprType::Bool,
                    ));
                }
                other => {
                    return Err(ParseError::UnexpectedToken {
                        span: item_span,
                        expected: "a string reference".into(),
                        found: format!("{other:?}"),
                    })
                }
            }
            if self.cursor.check(&TokenKind::Comma).map_err(ParseError::Lex)? {
                self.cursor.advance().map_err(ParseError::Lex)?;
                continue;
            }
            break;
        }
        self.cursor.expect(TokenKind::RParen, "')'")?;
        let range = self.arena.push_expr_list(&items);
        let last = self.cursor.last_id().unwrap_or(start);
        Ok(self.arena.push(ExprKind::StringSet(range), span, TokenRange { first: start, last }, ExprType::Undefined))
    }

    fn parse_range(&mut self) -> PResult<ExprId> {
        let start = self.cursor.current_id().map_err(ParseError::Lex)?;
        let span = self.cursor.current_span().map_err(ParseError::Lex)?;
        self.cursor.expect(TokenKind::LParenPlain, "'('")?;
        let low = self.parse_additive()?;
        Self::require(self.arena.arena().span(low), self.arena.ty(low).is_int(), "range bound must be an integer")?;
        self.cursor.expect(TokenKind::DotDot, "'..'")?;
        let high = self.parse_additive()?;
        Self::require(self.arena.arena().span(high), self.arena.ty(high).is_int(), "range bound must be an integer")?;
        self.cursor.expect(TokenKind::RParen, "')'")?;
        let last = self.cursor.last_id().unwrap_or(start);
        Ok(self.arena.push(ExprKind::Range { low, high }, span, TokenRange { first: start, last }, ExprType::Undefined))
    }

    fn parse_string_ref(&mut self, name: Name, span: Span, start: yara_ir::TokenId) -> PResult<ExprId> {
        self.cursor.advance().map_err(ParseError::Lex)?;
        if !self.ctx.is_string_defined(name) {
            return Err(ParseError::UndefinedStringRef { span, name: format!("{name:?}") });
        }
        match self.cursor.current_kind().map_err(ParseError::Lex)? {
            TokenKind::KwAt => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                let offset = self.parse_additive()?;
                Self::require(
                    self.arena.arena().span(offset),
                    self.arena.ty(offset).is_int(),
                    "string offset must be an integer",
                )?;
                let last = self.cursor.last_id().unwrap_or(start);
                Ok(self.arena.push(ExprKind::StringAt { name, offset }, span, TokenRange { first: start, last }, ExprType::Bool))
            }
            TokenKind::KwIn => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                let range = self.parse_range()?;
                let last = self.cursor.last_id().unwrap_or(start);
                Ok(self.arena.push(ExprKind::StringIn { name, range }, span, TokenRange { first: start, last }, ExprType::Bool))
            }
            _ => Ok(self.arena.push(ExprKind::StringRef(name), span, TokenRange::single(start), ExprType::Bool)),
        }
    }

    fn parse_optional_bracket_index(&mut self) -> PResult<ExprId> {
        if self.cursor.check(&TokenKind::LBracket).map_err(ParseError::Lex)? {
            self.cursor.advance().map_err(ParseError::Lex)?;
            let index = self.parse_additive()?;
            Self::require(self.arena.arena().span(index), self.arena.ty(index).is_int(), "string occurrence index must be an integer")?;
            self.cursor.expect(TokenKind::RBracket, "']'")?;
            Ok(index)
        } else {
            Ok(ExprId::INVALID)
        }
    }

    fn parse_int_function(&mut self, kind: TokenKind, span: Span, start: yara_ir::TokenId) -> PResult<ExprId> {
        let fn_kind = match kind {
            TokenKind::KwInt8 => IntFunctionKind::Int8,
            TokenKind::KwInt16 => IntFunctionKind::Int16,
            TokenKind::KwInt32 => IntFunctionKind::Int32,
            TokenKind::KwInt8be => IntFunctionKind::Int8be,
            TokenKind::KwInt16be => IntFunctionKind::Int16be,
            TokenKind::KwInt32be => IntFunctionKind::Int32be,
            TokenKind::KwUint8 => IntFunctionKind::Uint8,
            TokenKind::KwUint16 => IntFunctionKind::Uint16,
            TokenKind::KwUint32 => IntFunctionKind::Uint32,
            TokenKind::KwUint8be => IntFunctionKind::Uint8be,
            TokenKind::KwUint16be => IntFunctionKind::Uint16be,
            TokenKind::KwUint32be => IntFunctionKind::Uint32be,
            other => unreachable!("parse_int_function called on {other:?}"),
        };
        self.cursor.advance().map_err(ParseError::Lex)?;
        self.expect_lparen(TokenKind::LParenCall, "'('")?;
        let arg = self.parse_condition_as_arithmetic()?;
        Self::require(self.arena.arena().span(arg), self.arena.ty(arg).is_int(), "int-read functions require an integer offset")?;
        self.cursor.expect(TokenKind::RParen, "')'")?;
        let last = self.cursor.last_id().unwrap_or(start);
        Ok(self.arena.push(ExprKind::IntFunction { kind: fn_kind, arg }, span, TokenRange { first: start, last }, ExprType::Int))
    }

    fn parse_for_expr(&mut self) -> PResult<ExprId> {
        let start = self.cursor.current_id().map_err(ParseError::Lex)?;
        let span = self.cursor.current_span().map_err(ParseError::Lex)?;
        self.cursor.advance().map_err(ParseError::Lex)?;
        let quantifier = match self.cursor.current_kind().map_err(ParseError::Lex)? {
            TokenKind::KwAll => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                Quantifier::All
            }
            TokenKind::KwAny => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                Quantifier::Any
            }
            TokenKind::KwNone => {
                self.cursor.advance().map_err(ParseError::Lex)?;
                Quantifier::None
            }
            _ => {
                // A bare integer literal here would otherwise be
                // misidentified by `parse_primary`'s own "N of ..." shorthand
                // (it can't tell this integer is already a `for` quantifier
                // count), so a leading literal is consumed directly rather
                // than through the precedence tiers.
                let count_start = self.cursor.current_id().map_err(ParseError::Lex)?;
                let count_span = self.cursor.current_span().map_err(ParseError::Lex)?;
                let count = if let TokenKind::IntegerLiteral(v, mult, _) =
                    self.cursor.current_kind().map_err(ParseError::Lex)?
                {
                    self.cursor.advance().map_err(ParseError::Lex)?;
                    self.arena.push(
                        ExprKind::IntegerLiteral(mult.apply(v)),
                        count_span,
                        TokenRange::single(count_start),
                        ExprType::Int,
                    )
                } else {
                    self.parse_additive()?
                };
                if self.cursor.check(&TokenKind::Percent).map_err(ParseError::Lex)? {
                    self.cursor.advance().map_err(ParseError::Lex)?;
                    Quantifier::Percentage(count)
                } else {
                    Quantifier::Count(count)
                }
            }
        };

        if self.cursor.check(&TokenKind::KwOf).map_err(ParseError::Lex)? {
            self.cursor.advance().map_err(ParseError::Lex)?;
            let set = self.parse_string_set_or_them()?;
            self.cursor.expect(TokenKind::Colon, "':'")?;
            self.expect_lparen(TokenKind::LParenEnumeration, "'('")?;
            self.ctx.inside_string_loop = true;
            let body = self.parse_or()?;
            self.ctx.inside_string_loop = false;
            self.cursor.expect(TokenKind::RParen, "')'")?;
            let last = self.cursor.last_id().unwrap_or(start);
            return Ok(self.arena.push(
                ExprKind::ForStrings { quantifier, set, body },
                span,
                TokenRange { first: start, last },
                ExprType::Bool,
            ));
        }

        let mut bindings = vec![self.expect_identifier_name()?];
        while self.cursor.check(&TokenKind::Comma).map_err(ParseError::Lex)? {
            self.cursor.advance().map_err(ParseError::Lex)?;
            bindings.push(self.expect_identifier_name()?);
        }
        self.cursor.expect(TokenKind::KwIn, "'in'")?;
        let iterable = self.parse_iterable()?;
        self.cursor.expect(TokenKind::Colon, "':'")?;
        self.expect_lparen(TokenKind::LParenEnumeration, "'('")?;
        for &b in &bindings {
            self.ctx.push_local(b);
        }
        let body = self.parse_or()?;
        for _ in &bindings {
            self.ctx.pop_local();
        }
        self.cursor.expect(TokenKind::RParen, "')'")?;
        let binding_range = self.arena.push_name_list(&bindings);
        let last = self.cursor.last_id().unwrap_or(start);
        Ok(self.arena.push(
            ExprKind::ForIteration { quantifier, bindings: binding_range, iterable, body },
            span,
            TokenRange { first: start, last },
            ExprType::Bool,
        ))
    }

    /// `with <name> = <value>, ... : (<body>)`: scoped local bindings
    /// available inside `body`, evaluating to whatever `body` evaluates to.
    fn parse_with_expr(&mut self) -> PResult<ExprId> {
        let start = self.cursor.current_id().map_err(ParseError::Lex)?;
        let span = self.cursor.current_span().map_err(ParseError::Lex)?;
        self.cursor.advance().map_err(ParseError::Lex)?;

        let mut names = Vec::new();
        let mut values = Vec::new();
        loop {
            let name = self.expect_identifier_name()?;
            self.cursor.expect(TokenKind::Equals, "'='")?;
            let value = self.parse_bitor()?;
            self.ctx.push_local(name);
            names.push(name);
            values.push(value);
            if self.cursor.check(&TokenKind::Comma).map_err(ParseError::Lex)? {
                self.cursor.advance().map_err(ParseError::Lex)?;
                continue;
            }
            break;
        }
        self.cursor.expect(TokenKind::Colon, "':'")?;
        self.expect_lparen(TokenKind::LParenEnumeration, "'('")?;
        let body = self.parse_or()?;
        self.cursor.expect(TokenKind::RParen, "')'")?;
        for _ in &names {
            self.ctx.pop_local();
        }

        let names_range = self.arena.push_name_list(&names);
        let values_range = self.arena.push_expr_list(&values);
        let ty = self.arena.ty(body);
        let last = self.cursor.last_id().unwrap_or(start);
        Ok(self.arena.push(
            ExprKind::With { names: names_range, values: values_range, body },
            span,
            TokenRange { first: start, last },
            ty,
        ))
    }

    fn parse_iterable(&mut self) -> PResult<ExprId> {
        if self.cursor.check(&TokenKind::LParenPlain).map_err(ParseError::Lex)? {
            let start = self.cursor.current_id().map_err(ParseError::Lex)?;
            let span = self.cursor.current_span().map_err(ParseError::Lex)?;
            self.cursor.advance().map_err(ParseError::Lex)?;
            let first = self.parse_additive()?;
            if self.cursor.check(&TokenKind::DotDot).map_err(ParseError::Lex)? {
                self.cursor.advance().map_err(ParseError::Lex)?;
                let high = self.parse_additive()?;
                self.cursor.expect(TokenKind::RParen, "')'")?;
                let last = self.cursor.last_id().unwrap_or(start);
                return Ok(self.arena.push(
                    ExprKind::Range { low: first, high },
                    span,
                    TokenRange { first: start, last },
                    ExprType::Undefined,
                ));
            }
            let mut items = vec![first];
            while self.cursor.check(&TokenKind::Comma).map_err(ParseError::Lex)? {
                self.cursor.advance().map_err(ParseError::Lex)?;
                items.push(self.parse_additive()?);
            }
            self.cursor.expect(TokenKind::RParen, "')'")?;
            let range = self.arena.push_expr_list(&items);
            let last = self.cursor.last_id().unwrap_or(start);
            return Ok(self.arena.push(ExprKind::List(range), span, TokenRange { first: start, last }, ExprType::Undefined));
        }
        self.parse_postfix()
    }

    fn parse_parenthesized(&mut self) -> PResult<ExprId> {
        self.cursor.advance().map_err(ParseError::Lex)?;
        let inner = self.parse_or()?;
        self.cursor.expect(TokenKind::RParen, "')'")?;
        Ok(inner)
    }
}
