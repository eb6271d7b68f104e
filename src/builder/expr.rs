//! [`YaraExpressionBuilder`]: a fluent, text-accumulating builder for
//! condition expressions.
//!
//! There is no standalone expression parser entry point in this crate's
//! sub-crates (only whole-file parsing exists), so a builder that needs to
//! validate what it produces has to wrap it in a throwaway rule first — this
//! is exactly what [`crate::rule::Rule::set_condition`] and
//! [`super::rule::YaraRuleBuilder`] do with the source this type renders.
//! Every combinator here therefore just accumulates well-formed YARA source
//! text; `and`/`or` always fully parenthesize both operands so the result is
//! correct regardless of what precedence the caller had in mind.

/// Accumulates source text for one condition expression.
///
/// Consumed by every method (`self` by value), so expressions are built by
/// chaining: `YaraExpressionBuilder::filesize().gt(YaraExpressionBuilder::literal_int(100))`.
#[derive(Clone, Debug, Default)]
pub struct YaraExpressionBuilder {
    text: String,
}

impl YaraExpressionBuilder {
    #[must_use]
    pub fn raw(source: impl Into<String>) -> Self {
        YaraExpressionBuilder { text: source.into() }
    }

    #[must_use]
    pub fn literal_int(value: i64) -> Self {
        Self::raw(value.to_string())
    }

    #[must_use]
    pub fn literal_float(value: f64) -> Self {
        Self::raw(if value.fract() == 0.0 { format!("{value:.1}") } else { value.to_string() })
    }

    #[must_use]
    pub fn literal_bool(value: bool) -> Self {
        Self::raw(value.to_string())
    }

    #[must_use]
    pub fn literal_text(value: &str) -> Self {
        Self::raw(format!("\"{}\"", yara_fmt::escape_string(value)))
    }

    #[must_use]
    pub fn filesize() -> Self {
        Self::raw("filesize")
    }

    #[must_use]
    pub fn entrypoint() -> Self {
        Self::raw("entrypoint")
    }

    #[must_use]
    pub fn them() -> Self {
        Self::raw("them")
    }

    #[must_use]
    pub fn identifier(name: &str) -> Self {
        Self::raw(name)
    }

    #[must_use]
    pub fn string_ref(id: &str) -> Self {
        Self::raw(format!("${id}"))
    }

    #[must_use]
    pub fn string_count(id: &str) -> Self {
        Self::raw(format!("#{id}"))
    }

    #[must_use]
    pub fn string_offset(id: &str, index: Self) -> Self {
        Self::raw(format!("@{id}[{}]", index.text))
    }

    #[must_use]
    pub fn string_length(id: &str, index: Self) -> Self {
        Self::raw(format!("!{id}[{}]", index.text))
    }

    #[must_use]
    pub fn string_at(id: &str, offset: Self) -> Self {
        Self::raw(format!("${id} at {}", offset.text))
    }

    #[must_use]
    pub fn string_in(id: &str, range: Self) -> Self {
        Self::raw(format!("${id} in {}", range.text))
    }

    #[must_use]
    pub fn range(low: Self, high: Self) -> Self {
        Self::raw(format!("({}..{})", low.text, high.text))
    }

    #[must_use]
    pub fn int_function(name: &str, arg: Self) -> Self {
        Self::raw(format!("{name}({})", arg.text))
    }

    #[must_use]
    pub fn call(callee: &str, args: Vec<Self>) -> Self {
        let args = args.into_iter().map(|a| a.text).collect::<Vec<_>>().join(", ");
        Self::raw(format!("{callee}({args})"))
    }

    #[must_use]
    pub fn field(self, field: &str) -> Self {
        Self::raw(format!("{}.{field}", self.text))
    }

    #[must_use]
    pub fn index(self, index: Self) -> Self {
        Self::raw(format!("{}[{}]", self.text, index.text))
    }

    #[must_use]
    pub fn defined(self) -> Self {
        Self::raw(format!("defined {}", self.paren()))
    }

    #[must_use]
    pub fn not(self) -> Self {
        Self::raw(format!("not {}", self.paren()))
    }

    #[must_use]
    pub fn neg(self) -> Self {
        Self::raw(format!("-{}", self.paren()))
    }

    #[must_use]
    pub fn bitnot(self) -> Self {
        Self::raw(format!("~{}", self.paren()))
    }

    #[must_use]
    pub fn and(self, other: Self) -> Self {
        self.binary("and", other)
    }

    #[must_use]
    pub fn or(self, other: Self) -> Self {
        self.binary("or", other)
    }

    #[must_use]
    pub fn eq(self, other: Self) -> Self {
        self.binary("==", other)
    }

    #[must_use]
    pub fn neq(self, other: Self) -> Self {
        self.binary("!=", other)
    }

    #[must_use]
    pub fn lt(self, other: Self) -> Self {
        self.binary("<", other)
    }

    #[must_use]
    pub fn le(self, other: Self) -> Self {
        self.binary("<=", other)
    }

    #[must_use]
    pub fn gt(self, other: Self) -> Self {
        self.binary(">", other)
    }

    #[must_use]
    pub fn ge(self, other: Self) -> Self {
        self.binary(">=", other)
    }

    #[must_use]
    pub fn add(self, other: Self) -> Self {
        self.binary("+", other)
    }

    #[must_use]
    pub fn sub(self, other: Self) -> Self {
        self.binary("-", other)
    }

    #[must_use]
    pub fn mul(self, other: Self) -> Self {
        self.binary("*", other)
    }

    #[must_use]
    pub fn div(self, other: Self) -> Self {
        self.binary("\\", other)
    }

    #[must_use]
    pub fn modulo(self, other: Self) -> Self {
        self.binary("%", other)
    }

    #[must_use]
    pub fn bitand(self, other: Self) -> Self {
        self.binary("&", other)
    }

    #[must_use]
    pub fn bitor(self, other: Self) -> Self {
        self.binary("|", other)
    }

    #[must_use]
    pub fn bitxor(self, other: Self) -> Self {
        self.binary("^", other)
    }

    #[must_use]
    pub fn shl(self, other: Self) -> Self {
        self.binary("<<", other)
    }

    #[must_use]
    pub fn shr(self, other: Self) -> Self {
        self.binary(">>", other)
    }

    #[must_use]
    pub fn contains(self, other: Self) -> Self {
        self.binary("contains", other)
    }

    #[must_use]
    pub fn icontains(self, other: Self) -> Self {
        self.binary("icontains", other)
    }

    #[must_use]
    pub fn starts_with(self, other: Self) -> Self {
        self.binary("startswith", other)
    }

    #[must_use]
    pub fn istarts_with(self, other: Self) -> Self {
        self.binary("istartswith", other)
    }

    #[must_use]
    pub fn ends_with(self, other: Self) -> Self {
        self.binary("endswith", other)
    }

    #[must_use]
    pub fn iends_with(self, other: Self) -> Self {
        self.binary("iendswith", other)
    }

    #[must_use]
    pub fn matches(self, regexp_source: &str) -> Self {
        Self::raw(format!("{} matches /{regexp_source}/", self.paren()))
    }

    #[must_use]
    pub fn string_set(ids: &[&str]) -> Self {
        let ids = ids.iter().map(|id| format!("${id}")).collect::<Vec<_>>().join(", ");
        Self::raw(format!("({ids})"))
    }

    #[must_use]
    pub fn list(items: Vec<Self>) -> Self {
        let items = items.into_iter().map(|i| i.text).collect::<Vec<_>>().join(", ");
        Self::raw(format!("({items})"))
    }

    #[must_use]
    pub fn of_any(set: Self) -> Self {
        Self::raw(format!("any of {}", set.text))
    }

    #[must_use]
    pub fn of_all(set: Self) -> Self {
        Self::raw(format!("all of {}", set.text))
    }

    #[must_use]
    pub fn of_count(count: Self, set: Self) -> Self {
        Self::raw(format!("{} of {}", count.text, set.text))
    }

    #[must_use]
    pub fn in_range(self, range: Self) -> Self {
        Self::raw(format!("{} in {}", self.text, range.text))
    }

    #[must_use]
    pub fn for_iteration(quantifier: Self, bindings: &[&str], iterable: Self, body: Self) -> Self {
        Self::raw(format!("for {} {} in {} : ({})", quantifier.text, bindings.join(", "), iterable.text, body.text))
    }

    #[must_use]
    pub fn for_strings(quantifier: Self, set: Self, body: Self) -> Self {
        Self::raw(format!("for {} of {} : ({})", quantifier.text, set.text, body.text))
    }

    fn binary(self, op: &str, other: Self) -> Self {
        Self::raw(format!("{} {op} {}", self.paren(), other.paren()))
    }

    fn paren(&self) -> String {
        format!("({})", self.text)
    }

    /// Consumes the builder, returning the expression source it accumulated.
    #[must_use]
    pub fn get(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::YaraExpressionBuilder as E;

    #[test]
    fn fully_parenthesizes_a_mixed_and_or_chain() {
        let expr = E::filesize().gt(E::literal_int(100)).and(E::string_ref("a").or(E::string_ref("b"))).get();
        assert_eq!(expr, "((filesize) > (100)) and (($a) or ($b))");
    }

    #[test]
    fn renders_an_of_expression() {
        let expr = E::of_any(E::string_set(&["a", "b"])).get();
        assert_eq!(expr, "any of ($a, $b)");
    }
}
