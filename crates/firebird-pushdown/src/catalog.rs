//! Read-only metadata about host operators and functions.
//!
//! The walker and generator only see operator/function identities inside an
//! expression tree. Names, fixity and whether an object is a built-in are
//! resolved through a [`Catalog`] supplied by the caller, so tests can drive the
//! whole pipeline from a fixed [`InMemoryCatalog`].

use crate::error::{Error, Result};
use crate::expressions::{FunctionId, OperatorId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Operator fixity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    Binary,
    Prefix,
}

/// Operator metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorInfo {
    /// Operator symbol as known to the host, e.g. `=` or `~~*`
    pub name: String,
    pub kind: OperatorKind,
    /// Whether the operator lives in the host's system namespace.
    /// User-defined operators are never pushed down.
    pub builtin: bool,
}

/// Function metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    /// Lower-case function name, e.g. `substring`
    pub name: String,
    pub builtin: bool,
}

/// Catalog abstraction for operator and function metadata.
///
/// Lookups are synchronous. The host planner has already validated every id it
/// hands over, so a miss is a contract violation rather than user error.
pub trait Catalog: Send + Sync {
    /// Lookup an operator by identity.
    fn operator(&self, id: OperatorId) -> Option<&OperatorInfo>;

    /// Lookup a function by identity.
    fn function(&self, id: FunctionId) -> Option<&FunctionInfo>;
}

/// Resolve an operator, treating a miss as an internal error
pub(crate) fn require_operator(catalog: &dyn Catalog, id: OperatorId) -> Result<&OperatorInfo> {
    catalog
        .operator(id)
        .ok_or_else(|| Error::internal(format!("cache lookup failed for operator {}", id.0)))
}

/// Resolve a function, treating a miss as an internal error
pub(crate) fn require_function(catalog: &dyn Catalog, id: FunctionId) -> Result<&FunctionInfo> {
    catalog
        .function(id)
        .ok_or_else(|| Error::internal(format!("cache lookup failed for function {}", id.0)))
}

/// Built-in binary operators registered by [`InMemoryCatalog::with_builtins`]
const BUILTIN_BINARY_OPERATORS: &[&str] = &[
    "=", "<>", "<", ">", "<=", ">=", "~~", "!~~", "~~*", "!~~*", "<<", ">>", "+", "-", "*", "/",
    "%", "||", "~", "~*", "&&", "@>",
];

/// Built-in prefix operators registered by [`InMemoryCatalog::with_builtins`]
const BUILTIN_PREFIX_OPERATORS: &[&str] = &["-", "~", "@"];

/// Built-in functions registered by [`InMemoryCatalog::with_builtins`]
const BUILTIN_FUNCTIONS: &[&str] = &[
    "abs", "acos", "asin", "atan", "atan2", "bit_length", "ceil", "ceiling", "char_length",
    "character_length", "coalesce", "concat", "cos", "cot", "exp", "floor", "length", "log",
    "lower", "lpad", "ltrim", "mod", "nullif", "octet_length", "overlay", "position", "pow",
    "power", "reverse", "rpad", "rtrim", "sign", "sin", "sqrt", "strpos", "substring", "tan",
    "trunc", "upper", "int4", "int8", "text", "varchar", "numeric", "float8", "now", "random",
    "md5", "initcap", "replace", "split_part", "date_trunc", "to_char",
];

/// Minimal in-memory catalog for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    operators: HashMap<OperatorId, OperatorInfo>,
    functions: HashMap<FunctionId, FunctionInfo>,
    operator_names: HashMap<(String, OperatorKind, bool), OperatorId>,
    function_names: HashMap<(String, bool), FunctionId>,
    next_id: u32,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Catalog pre-populated with the host's common built-in operators and
    /// functions, including some that have no remote translation.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        for name in BUILTIN_BINARY_OPERATORS {
            catalog.add_operator(*name, OperatorKind::Binary, true);
        }
        for name in BUILTIN_PREFIX_OPERATORS {
            catalog.add_operator(*name, OperatorKind::Prefix, true);
        }
        for name in BUILTIN_FUNCTIONS {
            catalog.add_function(*name, true);
        }
        catalog
    }

    fn allocate_id(&mut self) -> u32 {
        // Ids start at 1 even for a Default-constructed catalog
        self.next_id = self.next_id.max(1);
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Register an operator, returning its assigned identity.
    pub fn add_operator(
        &mut self,
        name: impl Into<String>,
        kind: OperatorKind,
        builtin: bool,
    ) -> OperatorId {
        let name = name.into();
        let id = OperatorId(self.allocate_id());
        self.operator_names.insert((name.clone(), kind, builtin), id);
        self.operators.insert(
            id,
            OperatorInfo {
                name,
                kind,
                builtin,
            },
        );
        id
    }

    /// Register a function, returning its assigned identity.
    pub fn add_function(&mut self, name: impl Into<String>, builtin: bool) -> FunctionId {
        let name = name.into().to_lowercase();
        let id = FunctionId(self.allocate_id());
        self.function_names.insert((name.clone(), builtin), id);
        self.functions.insert(id, FunctionInfo { name, builtin });
        id
    }

    /// Identity of the built-in binary operator with this symbol
    pub fn binary_operator(&self, name: &str) -> Option<OperatorId> {
        self.operator_names
            .get(&(name.to_string(), OperatorKind::Binary, true))
            .copied()
    }

    /// Identity of the built-in prefix operator with this symbol
    pub fn prefix_operator(&self, name: &str) -> Option<OperatorId> {
        self.operator_names
            .get(&(name.to_string(), OperatorKind::Prefix, true))
            .copied()
    }

    /// Identity of the built-in function with this name
    pub fn builtin_function(&self, name: &str) -> Option<FunctionId> {
        self.function_names
            .get(&(name.to_lowercase(), true))
            .copied()
    }
}

impl Catalog for InMemoryCatalog {
    fn operator(&self, id: OperatorId) -> Option<&OperatorInfo> {
        self.operators.get(&id)
    }

    fn function(&self, id: FunctionId) -> Option<&FunctionInfo> {
        self.functions.get(&id)
    }
}
