//! Safety walker: decides whether an expression can be evaluated remotely.
//!
//! The walk is a pure bottom-up check. A composite node is safe only when all
//! of its children are safe and its own operator, function or type passes the
//! capability model. Unknown node kinds are never safe.

use crate::capability::{self, CapabilityContext};
use crate::catalog::{require_function, require_operator, Catalog, OperatorKind};
use crate::error::Result;
use crate::expressions::{ArrayOperand, BoolOp, Expression, SqlType};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Why a fragment has to stay local. Not an error: the caller simply
/// evaluates the fragment itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    UnsupportedNode { kind: String },
    UnsupportedOperator { name: String },
    UnsupportedFunction { name: String },
    UnsupportedType { ty: SqlType },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnsupportedNode { kind } => write!(f, "unsupported node: {kind}"),
            Rejection::UnsupportedOperator { name } => write!(f, "unsupported operator: {name}"),
            Rejection::UnsupportedFunction { name } => write!(f, "unsupported function: {name}"),
            Rejection::UnsupportedType { ty } => write!(f, "unsupported type: {ty:?}"),
        }
    }
}

/// Outcome of walking one expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Safe,
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_safe(&self) -> bool {
        matches!(self, Verdict::Safe)
    }

    fn node(kind: impl Into<String>) -> Self {
        Verdict::Rejected(Rejection::UnsupportedNode { kind: kind.into() })
    }

    fn operator(name: impl Into<String>) -> Self {
        Verdict::Rejected(Rejection::UnsupportedOperator { name: name.into() })
    }

    fn function(name: impl Into<String>) -> Self {
        Verdict::Rejected(Rejection::UnsupportedFunction { name: name.into() })
    }

    fn ty(ty: SqlType) -> Self {
        Verdict::Rejected(Rejection::UnsupportedType { ty })
    }
}

/// Short-circuit on the first rejected child
macro_rules! check_children {
    ($walker:expr, $children:expr) => {{
        let verdict = $walker.walk_all($children)?;
        if !verdict.is_safe() {
            return Ok(verdict);
        }
    }};
}

/// Pushdown safety checker for one relation and remote version.
pub struct SafetyWalker<'a> {
    catalog: &'a dyn Catalog,
    context: &'a CapabilityContext,
}

impl<'a> SafetyWalker<'a> {
    pub fn new(catalog: &'a dyn Catalog, context: &'a CapabilityContext) -> Self {
        Self { catalog, context }
    }

    /// Walk `expr`, reporting why it must stay local if it is not safe.
    ///
    /// Errors only on catalog misses, which indicate a contract violation.
    pub fn check(&self, expr: &Expression) -> Result<Verdict> {
        self.walk(expr)
    }

    pub fn is_safe(&self, expr: &Expression) -> Result<bool> {
        Ok(self.walk(expr)?.is_safe())
    }

    fn walk_all<'e>(&self, exprs: impl IntoIterator<Item = &'e Expression>) -> Result<Verdict> {
        for expr in exprs {
            let verdict = self.walk(expr)?;
            if !verdict.is_safe() {
                return Ok(verdict);
            }
        }
        Ok(Verdict::Safe)
    }

    fn walk(&self, expr: &Expression) -> Result<Verdict> {
        let version = self.context.version;
        match expr {
            Expression::Column(column) => {
                if column.relation != self.context.relation || column.levels_up != 0 {
                    return Ok(Verdict::node("column of another relation"));
                }
                if column.attnum < 1 {
                    return Ok(Verdict::node("system column"));
                }
                Ok(Verdict::Safe)
            }

            Expression::Literal(literal) => {
                if capability::can_translate_literal(literal, version) {
                    Ok(Verdict::Safe)
                } else if literal.value.as_deref().is_some_and(capability::is_non_finite_number) {
                    Ok(Verdict::node("non-finite numeric constant"))
                } else {
                    Ok(Verdict::ty(literal.ty))
                }
            }

            Expression::Operator(op) => {
                check_children!(self, &op.args);
                let info = require_operator(self.catalog, op.operator)?;
                if !info.builtin
                    || info.kind != OperatorKind::Binary
                    || op.args.len() != 2
                    || !capability::can_translate_operator(&info.name, version)
                {
                    return Ok(Verdict::operator(info.name.as_str()));
                }
                Ok(Verdict::Safe)
            }

            Expression::Distinct(op) => {
                check_children!(self, &op.args);
                let info = require_operator(self.catalog, op.operator)?;
                if !info.builtin
                    || op.args.len() != 2
                    || !capability::can_translate_distinct(&info.name, version)
                {
                    return Ok(Verdict::operator(format!("IS DISTINCT FROM ({})", info.name)));
                }
                Ok(Verdict::Safe)
            }

            Expression::Bool(b) => {
                if b.args.is_empty() {
                    return Ok(Verdict::node("empty boolean expression"));
                }
                if b.op == BoolOp::Not && b.args.len() != 1 {
                    return Ok(Verdict::node("NOT over several arguments"));
                }
                self.walk_all(&b.args)
            }

            Expression::NullTest(test) => self.walk(&test.arg),

            Expression::BooleanTest(test) => {
                // without a native BOOLEAN only integer-backed columns can be tested
                if !version.has_native_boolean() && !self.is_emulated_boolean_column(&test.arg) {
                    return Ok(Verdict::node("boolean test without native boolean type"));
                }
                self.walk(&test.arg)
            }

            Expression::ArrayMembership(membership) => {
                let array = match &membership.array {
                    ArrayOperand::Literal(array) => array,
                    ArrayOperand::Expression(inner) => {
                        return Ok(Verdict::node(format!("non-literal array ({})", inner.kind_name())))
                    }
                };
                let info = require_operator(self.catalog, membership.operator)?;
                let membership_form = (info.name == "=" && membership.use_or)
                    || (info.name == "<>" && !membership.use_or);
                if !info.builtin || !membership_form {
                    let quantifier = if membership.use_or { "ANY" } else { "ALL" };
                    return Ok(Verdict::operator(format!("{} {quantifier}", info.name)));
                }
                if !capability::can_translate_array_element(array.element_type, version) {
                    return Ok(Verdict::ty(array.element_type));
                }
                if !capability::can_translate_array(array, version) {
                    return Ok(Verdict::node("non-finite numeric constant"));
                }
                self.walk(&membership.operand)
            }

            Expression::Function(call) => {
                if !capability::can_translate_type(call.result_type) {
                    return Ok(Verdict::ty(call.result_type));
                }
                check_children!(self, &call.args);
                if call.implicit_coercion {
                    if call.args.is_empty() {
                        return Ok(Verdict::node("coercion without argument"));
                    }
                    return Ok(Verdict::Safe);
                }
                let info = require_function(self.catalog, call.function)?;
                if !info.builtin || !capability::can_translate_function(&info.name, &call.args, version) {
                    return Ok(Verdict::function(info.name.as_str()));
                }
                Ok(Verdict::Safe)
            }

            Expression::Relabel(relabel) => {
                if !relabel.implicit {
                    return Ok(Verdict::node("explicit cast"));
                }
                self.walk(&relabel.arg)
            }

            Expression::Unsupported(node) => Ok(Verdict::node(node.kind.as_str())),
        }
    }

    fn is_emulated_boolean_column(&self, expr: &Expression) -> bool {
        self.context.implicit_bool_type
            && matches!(expr, Expression::Column(column) if column.ty == SqlType::Bool)
    }
}

/// Convenience wrapper around [`SafetyWalker::is_safe`]
pub fn is_pushdown_safe(
    expr: &Expression,
    catalog: &dyn Catalog,
    context: &CapabilityContext,
) -> Result<bool> {
    SafetyWalker::new(catalog, context).is_safe(expr)
}

/// Restriction clauses split by where they will be evaluated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedConditions {
    /// Sent to the remote engine in the WHERE clause
    pub remote: Vec<Expression>,
    /// Evaluated locally after fetching
    pub local: Vec<Expression>,
}

/// Split restriction clauses into remotely and locally evaluated lists,
/// preserving their order. With pushdowns disabled nothing is sent remotely.
pub fn classify_conditions(
    conditions: impl IntoIterator<Item = Expression>,
    catalog: &dyn Catalog,
    context: &CapabilityContext,
) -> Result<ClassifiedConditions> {
    let walker = SafetyWalker::new(catalog, context);
    let mut classified = ClassifiedConditions::default();
    for condition in conditions {
        if !context.pushdown_enabled {
            classified.local.push(condition);
            continue;
        }
        match walker.check(&condition)? {
            Verdict::Safe => {
                debug!(kind = condition.kind_name(), "pushing down to remote");
                classified.remote.push(condition);
            }
            Verdict::Rejected(reason) => {
                debug!(kind = condition.kind_name(), %reason, "keeping local");
                classified.local.push(condition);
            }
        }
    }
    debug!(
        remote = classified.remote.len(),
        local = classified.local.len(),
        pushdown_enabled = context.pushdown_enabled,
        "classified restriction clauses"
    );
    Ok(classified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::expressions::{ArrayLiteral, BoolTestKind};
    use crate::version::RemoteVersion;

    const REL: u32 = 1;

    fn ctx(version: RemoteVersion) -> CapabilityContext {
        CapabilityContext::new(version, REL)
    }

    fn col(attnum: i16, ty: SqlType) -> Expression {
        Expression::column(REL, attnum, ty)
    }

    fn verdict(catalog: &InMemoryCatalog, version: RemoteVersion, expr: &Expression) -> Verdict {
        let context = ctx(version);
        SafetyWalker::new(catalog, &context).check(expr).unwrap()
    }

    #[test]
    fn test_columns() {
        let catalog = InMemoryCatalog::with_builtins();
        let v = RemoteVersion::V3_0;
        assert!(verdict(&catalog, v, &col(1, SqlType::Int4)).is_safe());
        assert!(!verdict(&catalog, v, &col(0, SqlType::Int4)).is_safe());
        assert!(!verdict(&catalog, v, &col(-1, SqlType::Int4)).is_safe());
        assert!(!verdict(&catalog, v, &Expression::column(2, 1, SqlType::Int4)).is_safe());

        let mut outer = col(1, SqlType::Int4);
        if let Expression::Column(c) = &mut outer {
            c.levels_up = 1;
        }
        assert!(!verdict(&catalog, v, &outer).is_safe());
    }

    #[test]
    fn test_comparison_and_like() {
        let catalog = InMemoryCatalog::with_builtins();
        let eq = catalog.binary_operator("=").unwrap();
        let like = catalog.binary_operator("~~").unwrap();
        let expr = Expression::and(vec![
            Expression::binary(eq, col(1, SqlType::Int4), Expression::int4(5)),
            Expression::binary(like, col(2, SqlType::Text), Expression::text("x%")),
        ]);
        assert!(verdict(&catalog, RemoteVersion::V1_5, &expr).is_safe());
    }

    #[test]
    fn test_operator_rejections() {
        let mut catalog = InMemoryCatalog::with_builtins();
        let plus = catalog.binary_operator("+").unwrap();
        let expr = Expression::binary(plus, col(1, SqlType::Int4), Expression::int4(1));
        assert_eq!(
            verdict(&catalog, RemoteVersion::V4_0, &expr),
            Verdict::Rejected(Rejection::UnsupportedOperator { name: "+".into() })
        );

        let custom = catalog.add_operator("=", OperatorKind::Binary, false);
        let expr = Expression::binary(custom, col(1, SqlType::Int4), Expression::int4(1));
        assert!(!verdict(&catalog, RemoteVersion::V4_0, &expr).is_safe());

        let shl = catalog.binary_operator("<<").unwrap();
        let expr = Expression::binary(shl, col(1, SqlType::Int4), Expression::int4(2));
        assert!(!verdict(&catalog, RemoteVersion::V2_0, &expr).is_safe());
        assert!(verdict(&catalog, RemoteVersion::V2_1, &expr).is_safe());
    }

    #[test]
    fn test_child_rejection_propagates() {
        let catalog = InMemoryCatalog::with_builtins();
        let eq = catalog.binary_operator("=").unwrap();
        let expr = Expression::or(vec![
            Expression::binary(eq, col(1, SqlType::Int4), Expression::int4(5)),
            Expression::not(Expression::unsupported("sub_link")),
        ]);
        assert_eq!(
            verdict(&catalog, RemoteVersion::V3_0, &expr),
            Verdict::Rejected(Rejection::UnsupportedNode {
                kind: "sub_link".into()
            })
        );
    }

    #[test]
    fn test_malformed_bool_expressions() {
        let catalog = InMemoryCatalog::with_builtins();
        let not_two = Expression::Bool(Box::new(crate::expressions::BoolExpr {
            op: BoolOp::Not,
            args: vec![col(1, SqlType::Bool), col(2, SqlType::Bool)],
        }));
        assert!(!verdict(&catalog, RemoteVersion::V3_0, &not_two).is_safe());
        assert!(!verdict(&catalog, RemoteVersion::V3_0, &Expression::and(vec![])).is_safe());
    }

    #[test]
    fn test_non_finite_floats_stay_local() {
        let catalog = InMemoryCatalog::with_builtins();
        let eq = catalog.binary_operator("=").unwrap();
        let v = RemoteVersion::V4_0;
        let non_finite = Verdict::Rejected(Rejection::UnsupportedNode {
            kind: "non-finite numeric constant".into(),
        });

        for special in ["NaN", "Infinity", "-Infinity"] {
            let expr = Expression::binary(eq, col(1, SqlType::Float8), Expression::literal(SqlType::Float8, special));
            assert_eq!(verdict(&catalog, v, &expr), non_finite, "{special}");

            let list = ArrayLiteral::of(SqlType::Float8, ["1", special]);
            let expr = Expression::in_list(eq, col(1, SqlType::Float8), list);
            assert_eq!(verdict(&catalog, v, &expr), non_finite, "{special}");
        }

        let finite = Expression::binary(eq, col(1, SqlType::Float8), Expression::literal(SqlType::Float8, "1.5e10"));
        assert!(verdict(&catalog, v, &finite).is_safe());
    }

    #[test]
    fn test_boolean_literals_need_native_type() {
        let catalog = InMemoryCatalog::with_builtins();
        let eq = catalog.binary_operator("=").unwrap();
        let expr = Expression::binary(eq, col(3, SqlType::Bool), Expression::boolean(true));
        assert!(!verdict(&catalog, RemoteVersion::V2_5, &expr).is_safe());
        assert!(verdict(&catalog, RemoteVersion::V3_0, &expr).is_safe());
    }

    #[test]
    fn test_tests_recurse_only() {
        let catalog = InMemoryCatalog::with_builtins();
        for kind in BoolTestKind::ALL {
            let expr = Expression::boolean_test(col(3, SqlType::Bool), kind);
            assert!(verdict(&catalog, RemoteVersion::V3_0, &expr).is_safe());
        }
        let expr = Expression::is_null(Expression::column(9, 1, SqlType::Int4));
        assert!(!verdict(&catalog, RemoteVersion::V3_0, &expr).is_safe());
    }

    #[test]
    fn test_boolean_tests_before_native_boolean() {
        let catalog = InMemoryCatalog::with_builtins();
        let eq = catalog.binary_operator("=").unwrap();
        let emulated = CapabilityContext {
            implicit_bool_type: true,
            ..ctx(RemoteVersion::V2_5)
        };
        let plain = ctx(RemoteVersion::V2_5);
        let check = |context: &CapabilityContext, expr: &Expression| {
            SafetyWalker::new(&catalog, context).check(expr).unwrap()
        };

        for kind in BoolTestKind::ALL {
            let over_column = Expression::boolean_test(col(3, SqlType::Bool), kind);
            assert!(check(&emulated, &over_column).is_safe(), "{kind:?}");
            assert!(!check(&plain, &over_column).is_safe(), "{kind:?}");

            let over_predicate = Expression::boolean_test(
                Expression::binary(eq, col(1, SqlType::Int4), Expression::int4(1)),
                kind,
            );
            assert_eq!(
                check(&emulated, &over_predicate),
                Verdict::Rejected(Rejection::UnsupportedNode {
                    kind: "boolean test without native boolean type".into()
                })
            );
            assert!(check(&ctx(RemoteVersion::V3_0), &over_predicate).is_safe());
        }

        let over_int = Expression::boolean_test(col(1, SqlType::Int4), BoolTestKind::IsTrue);
        assert!(!check(&emulated, &over_int).is_safe());
    }

    #[test]
    fn test_array_membership() {
        let catalog = InMemoryCatalog::with_builtins();
        let eq = catalog.binary_operator("=").unwrap();
        let ne = catalog.binary_operator("<>").unwrap();
        let lt = catalog.binary_operator("<").unwrap();
        let ints = ArrayLiteral::of(SqlType::Int4, ["1", "2"]);
        let v = RemoteVersion::V2_5;

        assert!(verdict(&catalog, v, &Expression::in_list(eq, col(1, SqlType::Int4), ints.clone())).is_safe());
        assert!(verdict(&catalog, v, &Expression::not_in_list(ne, col(1, SqlType::Int4), ints.clone())).is_safe());
        // = ALL and <> ANY are not membership tests
        assert!(!verdict(&catalog, v, &Expression::not_in_list(eq, col(1, SqlType::Int4), ints.clone())).is_safe());
        assert!(!verdict(&catalog, v, &Expression::in_list(ne, col(1, SqlType::Int4), ints.clone())).is_safe());
        assert!(!verdict(&catalog, v, &Expression::in_list(lt, col(1, SqlType::Int4), ints)).is_safe());

        let tstz = ArrayLiteral::of(SqlType::TimestampTz, ["2024-01-01 00:00:00+00"]);
        assert_eq!(
            verdict(&catalog, v, &Expression::in_list(eq, col(5, SqlType::TimestampTz), tstz)),
            Verdict::Rejected(Rejection::UnsupportedType {
                ty: SqlType::TimestampTz
            })
        );

        let sub_select = Expression::ArrayMembership(Box::new(crate::expressions::ArrayMembership {
            operator: eq,
            operand: col(1, SqlType::Int4),
            array: ArrayOperand::Expression(Expression::unsupported("sub_link")),
            use_or: true,
        }));
        assert!(!verdict(&catalog, v, &sub_select).is_safe());
    }

    #[test]
    fn test_functions() {
        let mut catalog = InMemoryCatalog::with_builtins();
        let upper = catalog.builtin_function("upper").unwrap();
        let now = catalog.builtin_function("now").unwrap();
        let int4 = catalog.builtin_function("int4").unwrap();
        let text = SqlType::Text;

        let call = Expression::func(upper, vec![col(2, text)], text);
        assert!(!verdict(&catalog, RemoteVersion::V1_5, &call).is_safe());
        assert!(verdict(&catalog, RemoteVersion::V2_0, &call).is_safe());

        let call = Expression::func(now, vec![], SqlType::TimestampTz);
        assert_eq!(
            verdict(&catalog, RemoteVersion::V4_0, &call),
            Verdict::Rejected(Rejection::UnsupportedType {
                ty: SqlType::TimestampTz
            })
        );

        // implicit coercions pass through whatever function implements them
        let cast = Expression::implicit_coercion(int4, col(6, SqlType::Int2), SqlType::Int4);
        assert!(verdict(&catalog, RemoteVersion::V1_5, &cast).is_safe());

        let udf = catalog.add_function("upper", false);
        let call = Expression::func(udf, vec![col(2, text)], text);
        assert_eq!(
            verdict(&catalog, RemoteVersion::V4_0, &call),
            Verdict::Rejected(Rejection::UnsupportedFunction {
                name: "upper".into()
            })
        );
    }

    #[test]
    fn test_relabel() {
        let catalog = InMemoryCatalog::with_builtins();
        let implicit = Expression::relabel(col(2, SqlType::Varchar), SqlType::Text, true);
        let explicit = Expression::relabel(col(2, SqlType::Varchar), SqlType::Text, false);
        assert!(verdict(&catalog, RemoteVersion::V2_5, &implicit).is_safe());
        assert!(!verdict(&catalog, RemoteVersion::V2_5, &explicit).is_safe());
    }

    #[test]
    fn test_distinct() {
        let catalog = InMemoryCatalog::with_builtins();
        let eq = catalog.binary_operator("=").unwrap();
        let expr = Expression::distinct(eq, col(1, SqlType::Int4), Expression::int4(3));
        assert!(!verdict(&catalog, RemoteVersion::V1_5, &expr).is_safe());
        assert!(verdict(&catalog, RemoteVersion::V2_0, &expr).is_safe());
    }

    #[test]
    fn test_catalog_miss_is_error() {
        let catalog = InMemoryCatalog::new();
        let context = ctx(RemoteVersion::V3_0);
        let expr = Expression::binary(
            crate::expressions::OperatorId(42),
            col(1, SqlType::Int4),
            Expression::int4(1),
        );
        let err = SafetyWalker::new(&catalog, &context).check(&expr).unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_classify_conditions() {
        let catalog = InMemoryCatalog::with_builtins();
        let eq = catalog.binary_operator("=").unwrap();
        let safe = Expression::binary(eq, col(1, SqlType::Int4), Expression::int4(5));
        let unsafe_ = Expression::unsupported("case");

        let context = ctx(RemoteVersion::V3_0);
        let classified =
            classify_conditions(vec![safe.clone(), unsafe_.clone()], &catalog, &context).unwrap();
        assert_eq!(classified.remote, vec![safe.clone()]);
        assert_eq!(classified.local, vec![unsafe_.clone()]);

        let disabled = CapabilityContext {
            pushdown_enabled: false,
            ..context
        };
        let classified =
            classify_conditions(vec![safe.clone(), unsafe_.clone()], &catalog, &disabled).unwrap();
        assert!(classified.remote.is_empty());
        assert_eq!(classified.local, vec![safe, unsafe_]);
    }
}
