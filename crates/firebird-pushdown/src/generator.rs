//! Firebird SQL generator for walker-approved expressions.
//!
//! Every node kind the walker accepts has exactly one rendering rule here.
//! Rendering a node the walker would reject is an internal error.
//!
//! Output goes through a [`SqlWriter`], which owns the text being built and,
//! in parameterized mode, the out-of-band parameter list. Without a parameter
//! list literals are inlined, which is what EXPLAIN output uses.
//!
//! # Example
//!
//! ```
//! use firebird_pushdown::catalog::InMemoryCatalog;
//! use firebird_pushdown::expressions::{Expression, SqlType};
//! use firebird_pushdown::generator::Generator;
//! use firebird_pushdown::relation::RelationDescriptor;
//! use firebird_pushdown::version::RemoteVersion;
//!
//! let catalog = InMemoryCatalog::with_builtins();
//! let relation = RelationDescriptor::new(1, "t").column("b", SqlType::Text);
//! let ilike = catalog.binary_operator("~~*").unwrap();
//! let expr = Expression::binary(ilike, Expression::column(1, 1, SqlType::Text), Expression::text("X%"));
//!
//! let generator = Generator::new(&catalog, &relation, RemoteVersion::V3_0);
//! let sql = generator.render_expression(&expr, None).unwrap();
//! assert_eq!(sql.as_deref(), Some("(LOWER(b) LIKE LOWER('X%'))"));
//! ```

use crate::capability::{self, FunctionRendering, OperatorRendering};
use crate::catalog::{require_function, require_operator, Catalog};
use crate::error::{Error, Result};
use crate::expressions::{
    ArrayLiteral, ArrayMembership, ArrayOperand, BoolOp, BoolTestKind, BooleanTest, ColumnRef,
    Expression, FunctionCall, Literal, NullTestKind, OpExpr, SqlType,
};
use crate::identifiers::quote_string_literal;
use crate::options::parse_bool;
use crate::relation::RelationDescriptor;
use crate::version::RemoteVersion;
use tracing::{debug, trace, warn};

/// Placeholder for a positional parameter
pub const PLACEHOLDER: &str = "?";

/// Accumulates generated SQL and, when parameterized, the literal values that
/// replace each placeholder, in placeholder order.
pub struct SqlWriter<'p> {
    sql: String,
    params: Option<&'p mut Vec<Literal>>,
}

/// Rollback point in a [`SqlWriter`]
#[derive(Debug, Clone, Copy)]
struct Mark {
    sql: usize,
    params: usize,
}

impl<'p> SqlWriter<'p> {
    /// `params` of `None` inlines every literal
    pub fn new(params: Option<&'p mut Vec<Literal>>) -> Self {
        Self {
            sql: String::new(),
            params,
        }
    }

    pub fn is_parameterized(&self) -> bool {
        self.params.is_some()
    }

    pub fn push_str(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    pub fn as_str(&self) -> &str {
        &self.sql
    }

    pub fn len(&self) -> usize {
        self.sql.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub fn finish(self) -> String {
        self.sql
    }

    /// Emit a placeholder bound to `literal`. Inline mode has no list to
    /// append to, so callers check [`is_parameterized`](Self::is_parameterized) first.
    fn placeholder(&mut self, literal: Literal) {
        if let Some(params) = self.params.as_deref_mut() {
            params.push(literal);
        }
        self.sql.push_str(PLACEHOLDER);
    }

    fn mark(&self) -> Mark {
        Mark {
            sql: self.sql.len(),
            params: self.params.as_ref().map_or(0, |p| p.len()),
        }
    }

    fn rollback(&mut self, mark: Mark) {
        self.sql.truncate(mark.sql);
        if let Some(params) = self.params.as_deref_mut() {
            params.truncate(mark.params);
        }
    }

    /// Parenthesize everything written since `start`, unless already wrapped
    fn wrap_from(&mut self, start: usize) {
        if !is_fully_parenthesized(&self.sql[start..]) {
            self.sql.insert(start, '(');
            self.sql.push(')');
        }
    }
}

/// Whether `sql` is a single parenthesized group, e.g. `(a = 1)` but not
/// `(a = 1) OR (b = 2)`. Quoted literals and identifiers are skipped.
pub fn is_fully_parenthesized(sql: &str) -> bool {
    let bytes = sql.as_bytes();
    if bytes.first() != Some(&b'(') || bytes.last() != Some(&b')') {
        return false;
    }
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            // doubled quotes toggle out and straight back in
            if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'\'' | b'"' => quote = Some(b),
            b'(' => depth += 1,
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i != bytes.len() - 1 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0 && quote.is_none()
}

/// Per-descent rendering flags, passed by value so each subtree sees the
/// setting of its own position.
#[derive(Debug, Clone, Copy)]
struct RenderContext {
    /// Render emulated boolean columns as `col <> 0`
    emulate_booleans: bool,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self {
            emulate_booleans: true,
        }
    }
}

impl RenderContext {
    /// Context for the direct operand of a NULL test or boolean test, which
    /// must see a bare column
    fn for_test_operand(self, operand: &Expression) -> Self {
        if matches!(operand, Expression::Column(_)) {
            Self {
                emulate_booleans: false,
            }
        } else {
            self
        }
    }
}

/// Skip the rest of the current node when a child rendered nothing
macro_rules! emit {
    ($rendered:expr) => {
        if !$rendered? {
            return Ok(false);
        }
    };
}

/// Piece of a boolean-test template
enum Piece {
    Text(&'static str),
    Operand,
}

use Piece::{Operand as A, Text as T};

fn boolean_test_template(kind: BoolTestKind, emulated: bool) -> &'static [Piece] {
    match (kind, emulated) {
        (BoolTestKind::IsTrue, false) => &[T("("), A, T(" IS TRUE)")],
        (BoolTestKind::IsNotTrue, false) => &[T("(("), A, T(" IS FALSE) OR ("), A, T(" IS NULL))")],
        (BoolTestKind::IsFalse, false) => &[T("("), A, T(" IS FALSE)")],
        (BoolTestKind::IsNotFalse, false) => &[T("(("), A, T(" IS TRUE) OR ("), A, T(" IS NULL))")],
        (BoolTestKind::IsTrue, true) => &[T("("), A, T(" <> 0)")],
        (BoolTestKind::IsNotTrue, true) => &[T("(("), A, T(" = 0) OR ("), A, T(" IS NULL))")],
        (BoolTestKind::IsFalse, true) => &[T("("), A, T(" = 0)")],
        (BoolTestKind::IsNotFalse, true) => &[T("(("), A, T(" <> 0) OR ("), A, T(" IS NULL))")],
        (BoolTestKind::IsUnknown, _) => &[T("("), A, T(" IS NULL)")],
        (BoolTestKind::IsNotUnknown, _) => &[T("("), A, T(" IS NOT NULL)")],
    }
}

/// Render a non-null literal inline in Firebird syntax
pub fn inline_literal(ty: SqlType, value: &str, version: RemoteVersion) -> Result<String> {
    match ty {
        t if t.is_numeric() => inline_number(value),
        SqlType::Bool if version.has_native_boolean() => match parse_bool(value) {
            Some(true) => Ok("true".to_string()),
            Some(false) => Ok("false".to_string()),
            None => Err(Error::internal(format!("invalid boolean literal \"{value}\""))),
        },
        SqlType::Bool | SqlType::Oid | SqlType::Bit | SqlType::Varbit => Err(Error::internal(
            format!("literal of type {ty:?} cannot be rendered for Firebird {version}"),
        )),
        _ => Ok(quote_string_literal(value)),
    }
}

fn inline_number(value: &str) -> Result<String> {
    if capability::is_non_finite_number(value) {
        return Err(Error::internal(format!("numeric constant {value} has no Firebird literal")));
    }
    Ok(value.to_string())
}

/// Render one IN-list element. Array elements are always inlined.
fn inline_array_element(ty: SqlType, value: Option<&str>, version: RemoteVersion) -> Result<String> {
    let Some(value) = value else {
        return Ok("NULL".to_string());
    };
    match ty {
        t if t.is_character() || t.is_datetime() => Ok(quote_string_literal(value)),
        t if t.is_numeric() => inline_number(value),
        SqlType::Bool if version.has_native_boolean() => match parse_bool(value) {
            Some(true) => Ok("TRUE".to_string()),
            Some(false) => Ok("FALSE".to_string()),
            None => Err(Error::internal(format!("invalid boolean array element \"{value}\""))),
        },
        _ => Err(Error::internal(format!(
            "array elements of type {ty:?} cannot be rendered"
        ))),
    }
}

/// Renders approved expressions for one relation and remote version.
pub struct Generator<'a> {
    catalog: &'a dyn Catalog,
    relation: &'a RelationDescriptor,
    version: RemoteVersion,
}

impl<'a> Generator<'a> {
    pub fn new(
        catalog: &'a dyn Catalog,
        relation: &'a RelationDescriptor,
        version: RemoteVersion,
    ) -> Self {
        Self {
            catalog,
            relation,
            version,
        }
    }

    pub fn version(&self) -> RemoteVersion {
        self.version
    }

    pub fn relation(&self) -> &RelationDescriptor {
        self.relation
    }

    /// Render one expression. `Ok(None)` means the expression produced no
    /// text at all (an IN test over an empty array).
    pub fn render_expression(
        &self,
        expr: &Expression,
        params: Option<&mut Vec<Literal>>,
    ) -> Result<Option<String>> {
        let mut writer = SqlWriter::new(params);
        if self.render(expr, RenderContext::default(), &mut writer)? {
            Ok(Some(writer.finish()))
        } else {
            Ok(None)
        }
    }

    /// Render `conditions` as ` WHERE (c1) AND (c2) ...`, or an empty string
    /// when nothing is emitted.
    pub fn where_clause(
        &self,
        conditions: &[Expression],
        params: Option<&mut Vec<Literal>>,
    ) -> Result<String> {
        let mut writer = SqlWriter::new(params);
        self.write_where_clause(conditions, &mut writer)?;
        let clause = writer.finish();
        debug!(sql = %clause, "rendered WHERE clause");
        Ok(clause)
    }

    /// Append the WHERE clause for `conditions` to `writer`.
    ///
    /// Returns the indices of the conditions that produced no text. The
    /// remote side does not filter on those, so the caller has to.
    pub fn write_where_clause(
        &self,
        conditions: &[Expression],
        writer: &mut SqlWriter<'_>,
    ) -> Result<Vec<usize>> {
        let mut first = true;
        let mut unrendered = Vec::new();
        for (index, condition) in conditions.iter().enumerate() {
            let mark = writer.mark();
            writer.push_str(if first { " WHERE " } else { " AND " });
            let start = writer.len();
            if !self.render(condition, RenderContext::default(), writer)? {
                writer.rollback(mark);
                unrendered.push(index);
                continue;
            }
            writer.wrap_from(start);
            first = false;
        }
        Ok(unrendered)
    }

    fn render(&self, expr: &Expression, cx: RenderContext, w: &mut SqlWriter<'_>) -> Result<bool> {
        let mark = w.mark();
        let emitted = self.render_node(expr, cx, w)?;
        if !emitted {
            w.rollback(mark);
        }
        Ok(emitted)
    }

    fn render_node(&self, expr: &Expression, cx: RenderContext, w: &mut SqlWriter<'_>) -> Result<bool> {
        trace!(kind = expr.kind_name(), "rendering node");
        match expr {
            Expression::Column(column) => self.render_column(column, cx, w),
            Expression::Literal(literal) => self.render_literal(literal, w),
            Expression::Operator(op) => self.render_operator(op, cx, w),
            Expression::Distinct(op) => self.render_distinct(op, cx, w),
            Expression::Bool(b) => match b.op {
                BoolOp::Not => {
                    let [arg] = b.args.as_slice() else {
                        return Err(Error::internal("NOT expects exactly one argument"));
                    };
                    w.push_str("(NOT ");
                    emit!(self.render(arg, cx, w));
                    w.push_str(")");
                    Ok(true)
                }
                BoolOp::And | BoolOp::Or => {
                    if b.args.is_empty() {
                        return Err(Error::internal("empty boolean expression"));
                    }
                    let separator = if b.op == BoolOp::And { " AND " } else { " OR " };
                    w.push_str("(");
                    emit!(self.render_list(&b.args, separator, cx, w));
                    w.push_str(")");
                    Ok(true)
                }
            },
            Expression::NullTest(test) => {
                w.push_str("(");
                emit!(self.render(&test.arg, cx.for_test_operand(&test.arg), w));
                w.push_str(match test.kind {
                    NullTestKind::IsNull => " IS NULL)",
                    NullTestKind::IsNotNull => " IS NOT NULL)",
                });
                Ok(true)
            }
            Expression::BooleanTest(test) => self.render_boolean_test(test, cx, w),
            Expression::ArrayMembership(membership) => self.render_membership(membership, cx, w),
            Expression::Function(call) => self.render_function(call, cx, w),
            Expression::Relabel(relabel) => {
                if !relabel.implicit {
                    return Err(Error::internal("attempting to render an explicit cast"));
                }
                self.render(&relabel.arg, cx, w)
            }
            Expression::Unsupported(node) => Err(Error::internal(format!(
                "unhandled node kind \"{}\" reached the generator",
                node.kind
            ))),
        }
    }

    fn render_list(
        &self,
        args: &[Expression],
        separator: &str,
        cx: RenderContext,
        w: &mut SqlWriter<'_>,
    ) -> Result<bool> {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                w.push_str(separator);
            }
            emit!(self.render(arg, cx, w));
        }
        Ok(true)
    }

    fn render_column(&self, column: &ColumnRef, cx: RenderContext, w: &mut SqlWriter<'_>) -> Result<bool> {
        if column.relation != self.relation.id || column.levels_up != 0 || column.attnum < 1 {
            return Err(Error::internal(format!(
                "column {} of relation {} does not belong to foreign table \"{}\"",
                column.attnum, column.relation, self.relation.name
            )));
        }
        let descriptor = self.relation.require_attribute(column.attnum)?;
        w.push_str(&self.relation.quoted_column_name(descriptor));
        if cx.emulate_booleans && self.relation.emulates_boolean(descriptor, self.version) {
            w.push_str(" <> 0");
        }
        Ok(true)
    }

    fn render_literal(&self, literal: &Literal, w: &mut SqlWriter<'_>) -> Result<bool> {
        let Some(value) = literal.value.as_deref() else {
            w.push_str("NULL");
            return Ok(true);
        };
        if !capability::can_translate_literal(literal, self.version) {
            return Err(Error::internal(format!(
                "literal of type {:?} cannot be rendered for Firebird {}",
                literal.ty, self.version
            )));
        }
        if w.is_parameterized() {
            let bound = if literal.ty == SqlType::Bool {
                let text = inline_literal(literal.ty, value, self.version)?;
                Literal {
                    ty: literal.ty,
                    value: Some(text),
                }
            } else {
                literal.clone()
            };
            w.placeholder(bound);
        } else {
            w.push_str(&inline_literal(literal.ty, value, self.version)?);
        }
        Ok(true)
    }

    fn binary_args<'e>(op: &'e OpExpr, what: &str) -> Result<(&'e Expression, &'e Expression)> {
        match op.args.as_slice() {
            [left, right] => Ok((left, right)),
            args => Err(Error::internal(format!(
                "{what} expects two arguments, got {}",
                args.len()
            ))),
        }
    }

    fn render_operator(&self, op: &OpExpr, cx: RenderContext, w: &mut SqlWriter<'_>) -> Result<bool> {
        let info = require_operator(self.catalog, op.operator)?;
        if !info.builtin {
            return Err(Error::internal(format!(
                "operator \"{}\" is not a built-in",
                info.name
            )));
        }
        let rendering = capability::operator_capability(&info.name)
            .filter(|c| self.version >= c.since)
            .map(|c| c.rendering)
            .ok_or_else(|| Error::internal(format!("unable to handle operator {}", info.name)))?;
        let (left, right) = Self::binary_args(op, "operator")?;

        match rendering {
            OperatorRendering::Infix(symbol) => {
                w.push_str("(");
                emit!(self.render(left, cx, w));
                w.push_str(" ");
                w.push_str(symbol);
                w.push_str(" ");
                emit!(self.render(right, cx, w));
                w.push_str(")");
            }
            OperatorRendering::CaseInsensitiveLike { negated } => {
                w.push_str("(LOWER(");
                emit!(self.render(left, cx, w));
                w.push_str(if negated { ") NOT LIKE LOWER(" } else { ") LIKE LOWER(" });
                emit!(self.render(right, cx, w));
                w.push_str("))");
            }
            OperatorRendering::Function(name) => {
                w.push_str("(");
                w.push_str(name);
                w.push_str("(");
                emit!(self.render(left, cx, w));
                w.push_str(", ");
                emit!(self.render(right, cx, w));
                w.push_str("))");
            }
        }
        Ok(true)
    }

    fn render_distinct(&self, op: &OpExpr, cx: RenderContext, w: &mut SqlWriter<'_>) -> Result<bool> {
        let info = require_operator(self.catalog, op.operator)?;
        if !info.builtin || !capability::can_translate_distinct(&info.name, self.version) {
            return Err(Error::internal(format!(
                "unable to handle IS DISTINCT FROM over operator {}",
                info.name
            )));
        }
        let (left, right) = Self::binary_args(op, "IS DISTINCT FROM")?;
        w.push_str("(");
        emit!(self.render(left, cx, w));
        w.push_str(" IS DISTINCT FROM ");
        emit!(self.render(right, cx, w));
        w.push_str(")");
        Ok(true)
    }

    /// Whether a boolean test over `operand` uses the integer-emulated form
    fn boolean_test_is_emulated(&self, operand: &Expression) -> bool {
        match operand {
            Expression::Column(column) if column.relation == self.relation.id => self
                .relation
                .attribute(column.attnum)
                .is_some_and(|descriptor| self.relation.emulates_boolean(descriptor, self.version)),
            _ => false,
        }
    }

    fn render_boolean_test(&self, test: &BooleanTest, cx: RenderContext, w: &mut SqlWriter<'_>) -> Result<bool> {
        let operand_cx = cx.for_test_operand(&test.arg);
        let emulated = self.boolean_test_is_emulated(&test.arg);
        if !emulated && !self.version.has_native_boolean() {
            return Err(Error::internal(format!(
                "boolean test over {} cannot be rendered for Firebird {}",
                test.arg.kind_name(),
                self.version
            )));
        }
        let template = boolean_test_template(test.kind, emulated);
        for piece in template {
            match piece {
                Piece::Text(text) => w.push_str(text),
                Piece::Operand => emit!(self.render(&test.arg, operand_cx, w)),
            }
        }
        Ok(true)
    }

    fn render_membership(
        &self,
        membership: &ArrayMembership,
        cx: RenderContext,
        w: &mut SqlWriter<'_>,
    ) -> Result<bool> {
        let array: &ArrayLiteral = match &membership.array {
            ArrayOperand::Literal(array) => array,
            ArrayOperand::Expression(_) => {
                return Err(Error::internal("only literal arrays can be rendered"));
            }
        };
        let info = require_operator(self.catalog, membership.operator)?;
        let negated = match (info.name.as_str(), membership.use_or) {
            ("=", true) => false,
            ("<>", false) => true,
            (name, _) => {
                return Err(Error::internal(format!(
                    "operator {name} is not an IN or NOT IN membership test"
                )))
            }
        };

        if array.elements.is_empty() {
            // the enclosing condition has to be evaluated locally
            warn!(
                relation = %self.relation.name,
                negated,
                "empty array in membership test, no predicate emitted"
            );
            return Ok(false);
        }

        w.push_str("(");
        emit!(self.render(&membership.operand, cx, w));
        w.push_str(if negated { " NOT IN (" } else { " IN (" });
        for (i, element) in array.elements.iter().enumerate() {
            if i > 0 {
                w.push_str(", ");
            }
            let text = inline_array_element(array.element_type, element.as_deref(), self.version)?;
            w.push_str(&text);
        }
        w.push_str("))");
        Ok(true)
    }

    fn render_function(&self, call: &FunctionCall, cx: RenderContext, w: &mut SqlWriter<'_>) -> Result<bool> {
        if call.implicit_coercion {
            let Some(arg) = call.args.first() else {
                return Err(Error::internal("implicit coercion without an argument"));
            };
            return self.render(arg, cx, w);
        }

        let info = require_function(self.catalog, call.function)?;
        let capability = capability::function_capability(&info.name)
            .filter(|c| info.builtin && c.accepts(&call.args, self.version))
            .ok_or_else(|| {
                Error::internal(format!("unable to handle function {}", info.name))
            })?;
        let args = call.args.as_slice();

        match capability.rendering {
            FunctionRendering::Call(name) => {
                w.push_str(name);
                w.push_str("(");
                emit!(self.render_list(args, ", ", cx, w));
                w.push_str(")");
            }
            FunctionRendering::Logarithm => {
                w.push_str(if args.len() == 1 { "LOG10(" } else { "LOG(" });
                emit!(self.render_list(args, ", ", cx, w));
                w.push_str(")");
            }
            FunctionRendering::Concat => {
                w.push_str("(");
                emit!(self.render_list(args, " || ", cx, w));
                w.push_str(")");
            }
            FunctionRendering::Position { haystack, needle } => {
                w.push_str("POSITION(");
                emit!(self.render(&args[needle], cx, w));
                w.push_str(" IN ");
                emit!(self.render(&args[haystack], cx, w));
                w.push_str(")");
            }
            FunctionRendering::Substring => {
                w.push_str("SUBSTRING(");
                emit!(self.render(&args[0], cx, w));
                w.push_str(" FROM ");
                emit!(self.render(&args[1], cx, w));
                if let Some(length) = args.get(2) {
                    w.push_str(" FOR ");
                    emit!(self.render(length, cx, w));
                }
                w.push_str(")");
            }
            FunctionRendering::Trim(side) => {
                w.push_str("TRIM(");
                w.push_str(side.keyword());
                if let Some(characters) = args.get(1) {
                    w.push_str(" ");
                    emit!(self.render(characters, cx, w));
                }
                w.push_str(" FROM ");
                emit!(self.render(&args[0], cx, w));
                w.push_str(")");
            }
            FunctionRendering::Overlay => {
                w.push_str("OVERLAY(");
                emit!(self.render(&args[0], cx, w));
                w.push_str(" PLACING ");
                emit!(self.render(&args[1], cx, w));
                w.push_str(" FROM ");
                emit!(self.render(&args[2], cx, w));
                if let Some(length) = args.get(3) {
                    w.push_str(" FOR ");
                    emit!(self.render(length, cx, w));
                }
                w.push_str(")");
            }
        }
        Ok(true)
    }
}
