//! Expression trees handed over by the host planner.
//!
//! The host engine classifies restriction clauses before a remote statement is
//! built. Each clause arrives as an [`Expression`], a closed tagged enum with one
//! variant per node kind the translator understands. Node kinds the translator
//! does not model are carried as [`Expression::Unsupported`] so that both the
//! walker and the generator stay exhaustive matches.
//!
//! | Group | Variants |
//! |---|---|
//! | **Leaves** | `Column`, `Literal` |
//! | **Operators** | `Operator`, `Distinct` |
//! | **Boolean logic** | `Bool`, `NullTest`, `BooleanTest` |
//! | **Membership** | `ArrayMembership` |
//! | **Calls and casts** | `Function`, `Relabel` |
//!
//! Operator and function identities are opaque numeric ids resolved through the
//! injected [`Catalog`](crate::catalog::Catalog).

use serde::{Deserialize, Serialize};

/// Identity of a relation in the host query's range table
pub type RelationId = u32;

/// Ordinal column position; values below 1 denote system columns
pub type AttrNumber = i16;

/// Host-engine operator identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperatorId(pub u32);

/// Host-engine function identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FunctionId(pub u32);

/// Declared type of a column, literal or function result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlType {
    Bool,
    Bytea,
    Char,
    Name,
    Int2,
    Int4,
    Int8,
    Text,
    Oid,
    Float4,
    Float8,
    Bpchar,
    Varchar,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Interval,
    Numeric,
    Bit,
    Varbit,
    /// A type without a dedicated variant, identified by its host id
    Other(u32),
}

impl SqlType {
    /// Character types, rendered as quoted string literals
    pub fn is_character(self) -> bool {
        matches!(
            self,
            SqlType::Text | SqlType::Char | SqlType::Bpchar | SqlType::Varchar | SqlType::Name
        )
    }

    /// Integer types
    pub fn is_integer(self) -> bool {
        matches!(self, SqlType::Int2 | SqlType::Int4 | SqlType::Int8)
    }

    /// Numeric types, rendered as bare text
    pub fn is_numeric(self) -> bool {
        self.is_integer()
            || matches!(self, SqlType::Float4 | SqlType::Float8 | SqlType::Numeric)
    }

    /// Date/time types with a quoted literal form in the remote dialect
    pub fn is_datetime(self) -> bool {
        matches!(self, SqlType::Date | SqlType::Time | SqlType::Timestamp)
    }
}

/// Represent a pushdown candidate expression as a single recursive node.
///
/// Heap-allocated variants are boxed to keep the enum small.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expression {
    Column(ColumnRef),
    Literal(Literal),
    Operator(Box<OpExpr>),
    /// `a IS DISTINCT FROM b`, carried with the underlying equality operator
    Distinct(Box<OpExpr>),
    Bool(Box<BoolExpr>),
    NullTest(Box<NullTest>),
    BooleanTest(Box<BooleanTest>),
    ArrayMembership(Box<ArrayMembership>),
    Function(Box<FunctionCall>),
    Relabel(Box<Relabel>),
    /// A host node kind with no translation (sub-select, parameter, CASE, ...)
    Unsupported(UnsupportedNode),
}

impl Expression {
    /// Column of `relation` at nesting level zero
    pub fn column(relation: RelationId, attnum: AttrNumber, ty: SqlType) -> Self {
        Expression::Column(ColumnRef {
            relation,
            levels_up: 0,
            attnum,
            ty,
        })
    }

    pub fn literal(ty: SqlType, value: impl Into<String>) -> Self {
        Expression::Literal(Literal {
            ty,
            value: Some(value.into()),
        })
    }

    pub fn int4(value: i32) -> Self {
        Self::literal(SqlType::Int4, value.to_string())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::literal(SqlType::Text, value)
    }

    pub fn boolean(value: bool) -> Self {
        Self::literal(SqlType::Bool, if value { "t" } else { "f" })
    }

    pub fn null(ty: SqlType) -> Self {
        Expression::Literal(Literal { ty, value: None })
    }

    pub fn op(operator: OperatorId, args: Vec<Expression>) -> Self {
        Expression::Operator(Box::new(OpExpr { operator, args }))
    }

    pub fn binary(operator: OperatorId, left: Expression, right: Expression) -> Self {
        Self::op(operator, vec![left, right])
    }

    pub fn distinct(operator: OperatorId, left: Expression, right: Expression) -> Self {
        Expression::Distinct(Box::new(OpExpr {
            operator,
            args: vec![left, right],
        }))
    }

    pub fn and(args: Vec<Expression>) -> Self {
        Expression::Bool(Box::new(BoolExpr {
            op: BoolOp::And,
            args,
        }))
    }

    pub fn or(args: Vec<Expression>) -> Self {
        Expression::Bool(Box::new(BoolExpr { op: BoolOp::Or, args }))
    }

    pub fn not(arg: Expression) -> Self {
        Expression::Bool(Box::new(BoolExpr {
            op: BoolOp::Not,
            args: vec![arg],
        }))
    }

    pub fn is_null(arg: Expression) -> Self {
        Expression::NullTest(Box::new(NullTest {
            arg,
            kind: NullTestKind::IsNull,
        }))
    }

    pub fn is_not_null(arg: Expression) -> Self {
        Expression::NullTest(Box::new(NullTest {
            arg,
            kind: NullTestKind::IsNotNull,
        }))
    }

    pub fn boolean_test(arg: Expression, kind: BoolTestKind) -> Self {
        Expression::BooleanTest(Box::new(BooleanTest { arg, kind }))
    }

    /// `operand IN (...)` over a literal array (`= ANY`)
    pub fn in_list(operator: OperatorId, operand: Expression, array: ArrayLiteral) -> Self {
        Expression::ArrayMembership(Box::new(ArrayMembership {
            operator,
            operand,
            array: ArrayOperand::Literal(array),
            use_or: true,
        }))
    }

    /// `operand NOT IN (...)` over a literal array (`<> ALL`)
    pub fn not_in_list(operator: OperatorId, operand: Expression, array: ArrayLiteral) -> Self {
        Expression::ArrayMembership(Box::new(ArrayMembership {
            operator,
            operand,
            array: ArrayOperand::Literal(array),
            use_or: false,
        }))
    }

    pub fn func(function: FunctionId, args: Vec<Expression>, result_type: SqlType) -> Self {
        Expression::Function(Box::new(FunctionCall {
            function,
            args,
            result_type,
            implicit_coercion: false,
        }))
    }

    /// A coercion the host planner inserted implicitly
    pub fn implicit_coercion(function: FunctionId, arg: Expression, result_type: SqlType) -> Self {
        Expression::Function(Box::new(FunctionCall {
            function,
            args: vec![arg],
            result_type,
            implicit_coercion: true,
        }))
    }

    pub fn relabel(arg: Expression, result_type: SqlType, implicit: bool) -> Self {
        Expression::Relabel(Box::new(Relabel {
            arg,
            result_type,
            implicit,
        }))
    }

    pub fn unsupported(kind: impl Into<String>) -> Self {
        Expression::Unsupported(UnsupportedNode { kind: kind.into() })
    }

    /// Short node-kind name used in diagnostics
    pub fn kind_name(&self) -> &str {
        match self {
            Expression::Column(_) => "column",
            Expression::Literal(_) => "literal",
            Expression::Operator(_) => "operator",
            Expression::Distinct(_) => "distinct",
            Expression::Bool(_) => "bool_expr",
            Expression::NullTest(_) => "null_test",
            Expression::BooleanTest(_) => "boolean_test",
            Expression::ArrayMembership(_) => "array_membership",
            Expression::Function(_) => "function",
            Expression::Relabel(_) => "relabel",
            Expression::Unsupported(node) => &node.kind,
        }
    }
}

/// Reference to a column of a relation in the host query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub relation: RelationId,
    /// Query nesting distance; zero for the current query level
    #[serde(default)]
    pub levels_up: u32,
    pub attnum: AttrNumber,
    pub ty: SqlType,
}

/// A constant in its host textual form; `None` is SQL NULL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Literal {
    pub ty: SqlType,
    pub value: Option<String>,
}

/// Prefix or binary operator application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpExpr {
    pub operator: OperatorId,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolOp {
    And,
    Or,
    Not,
}

/// N-ary AND/OR, or unary NOT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoolExpr {
    pub op: BoolOp,
    pub args: Vec<Expression>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullTestKind {
    IsNull,
    IsNotNull,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullTest {
    pub arg: Expression,
    pub kind: NullTestKind,
}

/// The six boolean test forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolTestKind {
    IsTrue,
    IsNotTrue,
    IsFalse,
    IsNotFalse,
    IsUnknown,
    IsNotUnknown,
}

impl BoolTestKind {
    pub const ALL: [BoolTestKind; 6] = [
        BoolTestKind::IsTrue,
        BoolTestKind::IsNotTrue,
        BoolTestKind::IsFalse,
        BoolTestKind::IsNotFalse,
        BoolTestKind::IsUnknown,
        BoolTestKind::IsNotUnknown,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanTest {
    pub arg: Expression,
    pub kind: BoolTestKind,
}

/// Constant array on the right-hand side of a membership test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayLiteral {
    pub element_type: SqlType,
    pub elements: Vec<Option<String>>,
}

impl ArrayLiteral {
    pub fn new(element_type: SqlType, elements: Vec<Option<String>>) -> Self {
        Self {
            element_type,
            elements,
        }
    }

    /// Array without NULL elements
    pub fn of<I, S>(element_type: SqlType, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            element_type,
            elements: values.into_iter().map(|v| Some(v.into())).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayOperand {
    Literal(ArrayLiteral),
    /// Any non-constant array source (sub-select, parameter, column)
    Expression(Expression),
}

/// `operand op ANY(array)` when `use_or`, otherwise `operand op ALL(array)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayMembership {
    pub operator: OperatorId,
    pub operand: Expression,
    pub array: ArrayOperand,
    pub use_or: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub function: FunctionId,
    pub args: Vec<Expression>,
    pub result_type: SqlType,
    /// Whether the call is a coercion the host inserted implicitly
    #[serde(default)]
    pub implicit_coercion: bool,
}

/// Binary-compatible relabeling of a value to another type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relabel {
    pub arg: Expression,
    pub result_type: SqlType,
    /// No-op implicit coercion; explicit casts are never pushed down
    pub implicit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsupportedNode {
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_classes() {
        assert!(SqlType::Varchar.is_character());
        assert!(SqlType::Int8.is_integer());
        assert!(SqlType::Numeric.is_numeric());
        assert!(!SqlType::Numeric.is_integer());
        assert!(SqlType::Timestamp.is_datetime());
        assert!(!SqlType::TimestampTz.is_datetime());
        assert!(!SqlType::Bool.is_numeric());
    }

    #[test]
    fn test_constructors() {
        let expr = Expression::and(vec![
            Expression::is_null(Expression::column(1, 2, SqlType::Text)),
            Expression::not(Expression::column(1, 3, SqlType::Bool)),
        ]);
        match &expr {
            Expression::Bool(b) => {
                assert_eq!(b.op, BoolOp::And);
                assert_eq!(b.args.len(), 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(expr.kind_name(), "bool_expr");
        assert_eq!(Expression::unsupported("sub_link").kind_name(), "sub_link");
    }

    #[test]
    fn test_serde_shape() {
        let expr = Expression::column(7, 1, SqlType::Int4);
        let json = serde_json::to_string(&expr).unwrap();
        assert_eq!(
            json,
            r#"{"column":{"relation":7,"levels_up":0,"attnum":1,"ty":"int4"}}"#
        );
        let back: Expression = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expr);
    }
}
