//! Versioned capability model.
//!
//! One canonical table per object kind lists everything that can be sent to
//! the remote engine. Each entry records the Firebird version that introduced
//! it and the rendering rule the generator applies, so an approved capability
//! cannot exist without a way to print it.

use crate::expressions::{ArrayLiteral, Expression, Literal, RelationId, SqlType};
use crate::version::RemoteVersion;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Inputs the walker needs besides the expression tree itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityContext {
    /// Negotiated remote engine version
    pub version: RemoteVersion,
    /// Relation currently being planned
    pub relation: RelationId,
    /// Legacy integer-boolean emulation enabled for the relation's server.
    /// Before Firebird 3.0 boolean tests are pushed only over such columns.
    pub implicit_bool_type: bool,
    /// When false, every predicate is evaluated locally
    pub pushdown_enabled: bool,
}

impl CapabilityContext {
    pub fn new(version: RemoteVersion, relation: RelationId) -> Self {
        Self {
            version,
            relation,
            implicit_bool_type: false,
            pushdown_enabled: true,
        }
    }
}

/// Accepted argument count of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    /// `None` means unbounded
    pub max: Option<usize>,
}

impl Arity {
    pub const fn exact(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    pub const fn range(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    pub const fn variadic(min: usize) -> Self {
        Self { min, max: None }
    }

    pub fn matches(&self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }
}

/// Extra argument constraints beyond arity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentShape {
    Any,
    /// Every argument after the first is a non-null integer literal
    IntegerLiteralTail,
}

impl ArgumentShape {
    fn accepts(self, args: &[Expression]) -> bool {
        match self {
            ArgumentShape::Any => true,
            ArgumentShape::IntegerLiteralTail => args.iter().skip(1).all(|arg| {
                matches!(
                    arg,
                    Expression::Literal(Literal { ty, value: Some(_) }) if ty.is_integer()
                )
            }),
        }
    }
}

/// How an approved operator is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorRendering {
    /// `(left SYMBOL right)`
    Infix(&'static str),
    /// `(LOWER(left) [NOT] LIKE LOWER(right))`
    CaseInsensitiveLike { negated: bool },
    /// `(NAME(left, right))`
    Function(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimSide {
    Leading,
    Trailing,
}

impl TrimSide {
    pub fn keyword(self) -> &'static str {
        match self {
            TrimSide::Leading => "LEADING",
            TrimSide::Trailing => "TRAILING",
        }
    }
}

/// How an approved function call is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionRendering {
    /// `NAME(arg, ...)`
    Call(&'static str),
    /// `LOG10(x)` with one argument, `LOG(b, x)` with two
    Logarithm,
    /// `(a || b || ...)`
    Concat,
    /// `POSITION(needle IN haystack)`, argument indexes normalized per call form
    Position { haystack: usize, needle: usize },
    /// `SUBSTRING(s FROM n [FOR m])`
    Substring,
    /// `TRIM(LEADING|TRAILING [chars] FROM s)`
    Trim(TrimSide),
    /// `OVERLAY(s PLACING r FROM n [FOR m])`
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorCapability {
    /// Host operator symbol
    pub name: &'static str,
    pub since: RemoteVersion,
    pub rendering: OperatorRendering,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionCapability {
    /// Host function name
    pub name: &'static str,
    pub since: RemoteVersion,
    pub arity: Arity,
    pub shape: ArgumentShape,
    pub rendering: FunctionRendering,
}

impl FunctionCapability {
    pub fn accepts(&self, args: &[Expression], version: RemoteVersion) -> bool {
        version >= self.since && self.arity.matches(args.len()) && self.shape.accepts(args)
    }
}

const fn op(name: &'static str, since: RemoteVersion, rendering: OperatorRendering) -> OperatorCapability {
    OperatorCapability {
        name,
        since,
        rendering,
    }
}

const fn call(
    name: &'static str,
    since: RemoteVersion,
    arity: Arity,
    remote: &'static str,
) -> FunctionCapability {
    FunctionCapability {
        name,
        since,
        arity,
        shape: ArgumentShape::Any,
        rendering: FunctionRendering::Call(remote),
    }
}

const fn special(
    name: &'static str,
    since: RemoteVersion,
    arity: Arity,
    rendering: FunctionRendering,
) -> FunctionCapability {
    FunctionCapability {
        name,
        since,
        arity,
        shape: ArgumentShape::Any,
        rendering,
    }
}

/// Every operator that can be pushed down
pub const OPERATOR_CAPABILITIES: &[OperatorCapability] = &[
    op("=", RemoteVersion::V1_5, OperatorRendering::Infix("=")),
    op("<>", RemoteVersion::V1_5, OperatorRendering::Infix("<>")),
    op(">", RemoteVersion::V1_5, OperatorRendering::Infix(">")),
    op("<", RemoteVersion::V1_5, OperatorRendering::Infix("<")),
    op(">=", RemoteVersion::V1_5, OperatorRendering::Infix(">=")),
    op("<=", RemoteVersion::V1_5, OperatorRendering::Infix("<=")),
    op("~~", RemoteVersion::V1_5, OperatorRendering::Infix("LIKE")),
    op("!~~", RemoteVersion::V1_5, OperatorRendering::Infix("NOT LIKE")),
    op(
        "~~*",
        RemoteVersion::V1_5,
        OperatorRendering::CaseInsensitiveLike { negated: false },
    ),
    op(
        "!~~*",
        RemoteVersion::V1_5,
        OperatorRendering::CaseInsensitiveLike { negated: true },
    ),
    op("<<", RemoteVersion::V2_1, OperatorRendering::Function("BIN_SHL")),
    op(">>", RemoteVersion::V2_1, OperatorRendering::Function("BIN_SHR")),
];

/// `IS DISTINCT FROM` is available from Firebird 2.0, over equality only
pub const DISTINCT_SINCE: RemoteVersion = RemoteVersion::V2_0;

/// Every function that can be pushed down
pub const FUNCTION_CAPABILITIES: &[FunctionCapability] = &[
    // 1.5
    special("concat", RemoteVersion::V1_5, Arity::variadic(1), FunctionRendering::Concat),
    call("coalesce", RemoteVersion::V1_5, Arity::variadic(2), "COALESCE"),
    // 2.0
    call("bit_length", RemoteVersion::V2_0, Arity::exact(1), "BIT_LENGTH"),
    call("char_length", RemoteVersion::V2_0, Arity::exact(1), "CHAR_LENGTH"),
    call("character_length", RemoteVersion::V2_0, Arity::exact(1), "CHARACTER_LENGTH"),
    call("lower", RemoteVersion::V2_0, Arity::exact(1), "LOWER"),
    call("octet_length", RemoteVersion::V2_0, Arity::exact(1), "OCTET_LENGTH"),
    call("upper", RemoteVersion::V2_0, Arity::exact(1), "UPPER"),
    FunctionCapability {
        name: "substring",
        since: RemoteVersion::V2_0,
        arity: Arity::range(2, 3),
        shape: ArgumentShape::IntegerLiteralTail,
        rendering: FunctionRendering::Substring,
    },
    // 2.1
    call("abs", RemoteVersion::V2_1, Arity::exact(1), "ABS"),
    call("acos", RemoteVersion::V2_1, Arity::exact(1), "ACOS"),
    call("asin", RemoteVersion::V2_1, Arity::exact(1), "ASIN"),
    call("atan", RemoteVersion::V2_1, Arity::exact(1), "ATAN"),
    call("atan2", RemoteVersion::V2_1, Arity::exact(2), "ATAN2"),
    call("ceil", RemoteVersion::V2_1, Arity::exact(1), "CEIL"),
    call("ceiling", RemoteVersion::V2_1, Arity::exact(1), "CEILING"),
    call("cos", RemoteVersion::V2_1, Arity::exact(1), "COS"),
    call("cot", RemoteVersion::V2_1, Arity::exact(1), "COT"),
    call("exp", RemoteVersion::V2_1, Arity::exact(1), "EXP"),
    call("floor", RemoteVersion::V2_1, Arity::exact(1), "FLOOR"),
    special("ltrim", RemoteVersion::V2_1, Arity::range(1, 2), FunctionRendering::Trim(TrimSide::Leading)),
    call("length", RemoteVersion::V2_1, Arity::exact(1), "CHAR_LENGTH"),
    special("log", RemoteVersion::V2_1, Arity::range(1, 2), FunctionRendering::Logarithm),
    call("mod", RemoteVersion::V2_1, Arity::exact(2), "MOD"),
    call("nullif", RemoteVersion::V2_1, Arity::exact(2), "NULLIF"),
    special("overlay", RemoteVersion::V2_1, Arity::range(3, 4), FunctionRendering::Overlay),
    special(
        "position",
        RemoteVersion::V2_1,
        Arity::exact(2),
        FunctionRendering::Position { haystack: 0, needle: 1 },
    ),
    call("pow", RemoteVersion::V2_1, Arity::exact(2), "POWER"),
    call("power", RemoteVersion::V2_1, Arity::exact(2), "POWER"),
    call("reverse", RemoteVersion::V2_1, Arity::exact(1), "REVERSE"),
    special("rtrim", RemoteVersion::V2_1, Arity::range(1, 2), FunctionRendering::Trim(TrimSide::Trailing)),
    call("sign", RemoteVersion::V2_1, Arity::exact(1), "SIGN"),
    call("sin", RemoteVersion::V2_1, Arity::exact(1), "SIN"),
    call("sqrt", RemoteVersion::V2_1, Arity::exact(1), "SQRT"),
    special(
        "strpos",
        RemoteVersion::V2_1,
        Arity::exact(2),
        FunctionRendering::Position { haystack: 0, needle: 1 },
    ),
    call("tan", RemoteVersion::V2_1, Arity::exact(1), "TAN"),
    call("trunc", RemoteVersion::V2_1, Arity::range(1, 2), "TRUNC"),
    // 2.5
    call("lpad", RemoteVersion::V2_5, Arity::range(2, 3), "LPAD"),
    call("rpad", RemoteVersion::V2_5, Arity::range(2, 3), "RPAD"),
];

static OPERATORS_BY_NAME: LazyLock<HashMap<&'static str, &'static OperatorCapability>> =
    LazyLock::new(|| OPERATOR_CAPABILITIES.iter().map(|c| (c.name, c)).collect());

static FUNCTIONS_BY_NAME: LazyLock<HashMap<&'static str, &'static FunctionCapability>> =
    LazyLock::new(|| FUNCTION_CAPABILITIES.iter().map(|c| (c.name, c)).collect());

/// Table entry for a host operator, regardless of version
pub fn operator_capability(name: &str) -> Option<&'static OperatorCapability> {
    OPERATORS_BY_NAME.get(name).copied()
}

/// Table entry for a host function, regardless of version
pub fn function_capability(name: &str) -> Option<&'static FunctionCapability> {
    FUNCTIONS_BY_NAME.get(name).copied()
}

/// Whether a built-in binary operator can be sent to this remote version
pub fn can_translate_operator(name: &str, version: RemoteVersion) -> bool {
    operator_capability(name).is_some_and(|c| version >= c.since)
}

/// Whether a distinct-comparison over this operator can be sent
pub fn can_translate_distinct(name: &str, version: RemoteVersion) -> bool {
    name == "=" && version >= DISTINCT_SINCE
}

/// Whether a built-in function call with these arguments can be sent
pub fn can_translate_function(name: &str, args: &[Expression], version: RemoteVersion) -> bool {
    function_capability(name).is_some_and(|c| c.accepts(args, version))
}

/// Whether values of this type have a faithful remote representation
pub fn can_translate_type(ty: SqlType) -> bool {
    matches!(
        ty,
        SqlType::Text
            | SqlType::Char
            | SqlType::Bpchar
            | SqlType::Varchar
            | SqlType::Name
            | SqlType::Int2
            | SqlType::Int4
            | SqlType::Int8
            | SqlType::Float4
            | SqlType::Float8
            | SqlType::Numeric
            | SqlType::Date
            | SqlType::Time
            | SqlType::Timestamp
    )
}

/// Whether a literal can be printed in the remote dialect.
///
/// NULL is always printable. Boolean literals need a native boolean type.
pub fn can_translate_literal(literal: &Literal, version: RemoteVersion) -> bool {
    let Some(value) = literal.value.as_deref() else {
        return true;
    };
    match literal.ty {
        SqlType::Bool => version.has_native_boolean(),
        SqlType::Oid | SqlType::Bit | SqlType::Varbit => false,
        ty if ty.is_numeric() => !is_non_finite_number(value),
        _ => true,
    }
}

/// Whether elements of an IN-list array can be printed
pub fn can_translate_array_element(ty: SqlType, version: RemoteVersion) -> bool {
    can_translate_type(ty) || (ty == SqlType::Bool && version.has_native_boolean())
}

/// Whether a whole IN-list array can be printed, element values included
pub fn can_translate_array(array: &ArrayLiteral, version: RemoteVersion) -> bool {
    can_translate_array_element(array.element_type, version)
        && (!array.element_type.is_numeric()
            || !array.elements.iter().flatten().any(|v| is_non_finite_number(v)))
}

/// `NaN`, `Infinity` and `-Infinity` in the host's spelling. Firebird has no
/// literal for them and would read the bare word as an identifier.
pub fn is_non_finite_number(value: &str) -> bool {
    let unsigned = value.trim().trim_start_matches(['+', '-']);
    ["nan", "infinity", "inf"]
        .iter()
        .any(|special| unsigned.eq_ignore_ascii_case(special))
}
