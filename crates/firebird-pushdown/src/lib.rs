//! Firebird Pushdown - predicate pushdown and SQL generation for a Firebird
//! foreign data wrapper
//!
//! This library decides which parts of a host query can run on a remote
//! Firebird server and turns them into Firebird SQL.
//!
//! # Architecture
//!
//! 1. **Capability model** - versioned allow-lists of operators, functions and types
//! 2. **Safety walker** - accepts or rejects an expression tree for pushdown
//! 3. **Generator** - renders approved expressions in the Firebird dialect
//! 4. **Statement builder** - assembles SELECT/INSERT/UPDATE/DELETE statements
//!    with their parameter slots and retrieved-column mapping
//! 5. **Row identity** - carries `RDB$DB_KEY` from a scan to the modify statement
//!
//! Catalog metadata is injected through the [`Catalog`] trait, and per-table
//! configuration arrives as typed [`options`].

pub mod capability;
pub mod catalog;
pub mod error;
pub mod expressions;
pub mod generator;
pub mod identifiers;
pub mod options;
pub mod relation;
pub mod row_identity;
pub mod statement;
pub mod version;
pub mod walker;

pub use capability::CapabilityContext;
pub use catalog::{Catalog, InMemoryCatalog};
pub use error::{Error, Result};
pub use expressions::{Expression, Literal, SqlType};
pub use generator::Generator;
pub use options::{ColumnOptions, RelationOptions, ServerOptions, TableOptions};
pub use relation::{ColumnDescriptor, RelationDescriptor};
pub use row_identity::{reassemble, split, Carriers, RowIdentity};
pub use statement::{AttrsUsed, ParamSlot, RemoteStatement, RetrievedAttr, StatementBuilder};
pub use version::RemoteVersion;
pub use walker::{classify_conditions, is_pushdown_safe, Rejection, SafetyWalker, Verdict};

use tracing::warn;

/// A planned remote scan: the statement to run and the conditions the host
/// must still check on every fetched row.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPlan {
    pub statement: RemoteStatement,
    pub local_conditions: Vec<Expression>,
}

/// Plan a scan of `relation`: classify `conditions`, push the safe ones into
/// the WHERE clause and project the columns in `attrs`.
///
/// # Example
///
/// ```
/// use firebird_pushdown::{plan_scan, AttrsUsed, Expression, InMemoryCatalog};
/// use firebird_pushdown::{RelationDescriptor, RemoteVersion, SqlType};
///
/// let catalog = InMemoryCatalog::with_builtins();
/// let relation = RelationDescriptor::new(1, "t")
///     .column("a", SqlType::Int4)
///     .column("b", SqlType::Text);
/// let eq = catalog.binary_operator("=").unwrap();
/// let condition = Expression::binary(eq, Expression::column(1, 1, SqlType::Int4), Expression::int4(5));
///
/// let plan = plan_scan(&relation, &catalog, RemoteVersion::V3_0, &AttrsUsed::whole_row(), vec![condition], false).unwrap();
/// assert_eq!(plan.statement.sql, "SELECT a, b FROM t WHERE (a = 5)");
/// assert!(plan.local_conditions.is_empty());
/// ```
pub fn plan_scan(
    relation: &RelationDescriptor,
    catalog: &dyn Catalog,
    version: RemoteVersion,
    attrs: &AttrsUsed,
    conditions: Vec<Expression>,
    parameterized: bool,
) -> Result<ScanPlan> {
    let context = relation.capability_context(version);
    let classified = classify_conditions(conditions, catalog, &context)?;
    let (statement, unrendered) = StatementBuilder::new(catalog, relation, version).select_statement(
        attrs,
        &classified.remote,
        parameterized,
    )?;

    let mut local_conditions = classified.local;
    for (index, condition) in classified.remote.into_iter().enumerate() {
        if unrendered.contains(&index) {
            warn!(kind = condition.kind_name(), "condition rendered no SQL, evaluating locally");
            local_conditions.push(condition);
        }
    }
    Ok(ScanPlan {
        statement,
        local_conditions,
    })
}

/// Render a single expression with literals inlined.
///
/// Returns `Ok(None)` when the expression produces no SQL at all.
pub fn render(
    expression: &Expression,
    catalog: &dyn Catalog,
    relation: &RelationDescriptor,
    version: RemoteVersion,
) -> Result<Option<String>> {
    Generator::new(catalog, relation, version).render_expression(expression, None)
}
