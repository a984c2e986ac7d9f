//! Remote statement assembly: SELECT, INSERT, UPDATE and DELETE.
//!
//! Every statement carries its parameter slots in placeholder order. The SQL
//! text and the slot list are produced by the same loop, and
//! [`RemoteStatement::bind`] reads values back through that list, so the
//! number and order of `?` markers always agree with the bound values.

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::expressions::{AttrNumber, Expression, Literal};
use crate::generator::{Generator, SqlWriter, PLACEHOLDER};
use crate::relation::RelationDescriptor;
use crate::row_identity::{RowIdentity, ROW_IDENTITY_COLUMN};
use crate::version::RemoteVersion;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// Columns a query needs from the relation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttrsUsed {
    /// Whole-row reference: every live column is used
    pub whole_row: bool,
    /// The row-identity pseudo-column is requested
    pub row_identity: bool,
    pub columns: BTreeSet<AttrNumber>,
}

impl AttrsUsed {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn whole_row() -> Self {
        Self {
            whole_row: true,
            ..Default::default()
        }
    }

    pub fn columns(columns: impl IntoIterator<Item = AttrNumber>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn with_row_identity(mut self) -> Self {
        self.row_identity = true;
        self
    }

    pub fn insert(&mut self, attnum: AttrNumber) {
        self.columns.insert(attnum);
    }

    pub fn contains(&self, attnum: AttrNumber) -> bool {
        self.whole_row || self.columns.contains(&attnum)
    }

    pub fn is_empty(&self) -> bool {
        !self.whole_row && !self.row_identity && self.columns.is_empty()
    }
}

/// What one result column of a remote statement maps back to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievedAttr {
    Column(AttrNumber),
    RowIdentity,
}

/// Source of one positional parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamSlot {
    /// Literal lifted out of a parameterized WHERE clause
    Literal(Literal),
    /// Value of a target column of the row being written
    Column(AttrNumber),
    /// Identity of the row being updated or deleted
    RowIdentity,
}

/// Transport format of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamFormat {
    Text,
    /// Sixteen hex digits decoded remotely into the 8-byte key
    DbKey,
}

impl ParamSlot {
    pub fn format(&self) -> ParamFormat {
        match self {
            ParamSlot::RowIdentity => ParamFormat::DbKey,
            ParamSlot::Literal(_) | ParamSlot::Column(_) => ParamFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
        })
    }
}

/// Values of the row being written, by attribute number
pub trait SourceRow {
    /// Text form of the column value, `None` for NULL
    fn value(&self, attnum: AttrNumber) -> Option<&str>;
}

/// Positional row: attribute `n` is element `n - 1`
impl SourceRow for Vec<Option<String>> {
    fn value(&self, attnum: AttrNumber) -> Option<&str> {
        if attnum < 1 {
            return None;
        }
        self.get(attnum as usize - 1).and_then(|v| v.as_deref())
    }
}

impl SourceRow for BTreeMap<AttrNumber, String> {
    fn value(&self, attnum: AttrNumber) -> Option<&str> {
        self.get(&attnum).map(String::as_str)
    }
}

/// A generated statement with everything needed to execute it and map its
/// results back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStatement {
    pub kind: StatementKind,
    pub sql: String,
    /// One slot per placeholder, in order
    pub params: Vec<ParamSlot>,
    /// One entry per result column, in order
    pub retrieved_attrs: Vec<RetrievedAttr>,
    /// `rdb$db_key` appears in the projection
    pub row_identity_used: bool,
}

impl RemoteStatement {
    /// Number of `?` markers in the statement text outside quoted strings and
    /// identifiers.
    pub fn placeholder_count(&self) -> usize {
        let mut count = 0;
        let mut quote: Option<char> = None;
        for c in self.sql.chars() {
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => {}
                None if c == '\'' || c == '"' => quote = Some(c),
                None if c == '?' => count += 1,
                None => {}
            }
        }
        count
    }

    pub fn param_formats(&self) -> Vec<ParamFormat> {
        self.params.iter().map(ParamSlot::format).collect()
    }

    /// Produce the parameter values for one execution, in placeholder order.
    ///
    /// `identity` is required whenever the statement has a row-identity slot.
    pub fn bind(
        &self,
        row: &dyn SourceRow,
        identity: Option<RowIdentity>,
    ) -> Result<Vec<Option<String>>> {
        self.params
            .iter()
            .map(|slot| match slot {
                ParamSlot::Literal(literal) => Ok(literal.value.clone()),
                ParamSlot::Column(attnum) => Ok(row.value(*attnum).map(str::to_string)),
                ParamSlot::RowIdentity => identity
                    .map(|id| Some(id.to_hex()))
                    .ok_or_else(|| {
                        Error::internal(format!("{} statement needs a row identity", self.kind))
                    }),
            })
            .collect()
    }
}

/// Where a target list is being rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListPosition {
    Select,
    Returning,
}

/// Builds remote statements for one relation.
pub struct StatementBuilder<'a> {
    catalog: &'a dyn Catalog,
    relation: &'a RelationDescriptor,
    version: RemoteVersion,
}

impl<'a> StatementBuilder<'a> {
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

    /// `SELECT <columns> FROM <relation> [WHERE ...]`.
    ///
    /// `remote_conditions` must already be approved by the walker. When
    /// `parameterized` is false literals are inlined, as for EXPLAIN output.
    ///
    /// A condition that renders to nothing (an IN test over an empty array
    /// somewhere inside it) is left out of the WHERE clause entirely. Use
    /// [`plan_scan`](crate::plan_scan) to get such conditions handed back for
    /// local evaluation.
    pub fn build_select(
        &self,
        attrs: &AttrsUsed,
        remote_conditions: &[Expression],
        parameterized: bool,
    ) -> Result<RemoteStatement> {
        Ok(self.select_statement(attrs, remote_conditions, parameterized)?.0)
    }

    /// [`build_select`](Self::build_select), also returning the indices of
    /// `remote_conditions` that did not make it into the WHERE clause
    pub(crate) fn select_statement(
        &self,
        attrs: &AttrsUsed,
        remote_conditions: &[Expression],
        parameterized: bool,
    ) -> Result<(RemoteStatement, Vec<usize>)> {
        let mut sql = String::from("SELECT ");
        let retrieved_attrs = self.write_target_list(attrs, ListPosition::Select, &mut sql);
        sql.push_str(" FROM ");
        sql.push_str(&self.relation.from_item());

        let mut literals = Vec::new();
        let generator = Generator::new(self.catalog, self.relation, self.version);
        let mut writer = SqlWriter::new(parameterized.then_some(&mut literals));
        let unrendered = generator.write_where_clause(remote_conditions, &mut writer)?;
        sql.push_str(&writer.finish());

        let statement = RemoteStatement {
            kind: StatementKind::Select,
            row_identity_used: retrieved_attrs.contains(&RetrievedAttr::RowIdentity),
            sql,
            params: literals.into_iter().map(ParamSlot::Literal).collect(),
            retrieved_attrs,
        };
        self.log_built(&statement);
        Ok((statement, unrendered))
    }

    /// `INSERT INTO <relation> (<targets>) VALUES (?, ...) [RETURNING ...]`
    pub fn build_insert(
        &self,
        target_attrs: &[AttrNumber],
        returning: &AttrsUsed,
    ) -> Result<RemoteStatement> {
        self.require_updatable("inserts")?;

        let mut sql = String::from("INSERT INTO ");
        sql.push_str(&self.relation.from_item());
        let mut params = Vec::with_capacity(target_attrs.len());

        if target_attrs.is_empty() {
            sql.push_str(" DEFAULT VALUES");
        } else {
            sql.push_str(" (");
            for (i, &attnum) in target_attrs.iter().enumerate() {
                let column = self.relation.require_attribute(attnum)?;
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(&self.relation.quoted_column_name(column));
                params.push(ParamSlot::Column(attnum));
            }
            sql.push_str(")\n VALUES (");
            sql.push_str(&vec![PLACEHOLDER; params.len()].join(", "));
            sql.push(')');
        }

        // AFTER INSERT row triggers see the full remote row
        let returning = if self.relation.has_after_insert_row_trigger {
            AttrsUsed {
                whole_row: true,
                ..returning.clone()
            }
        } else {
            returning.clone()
        };
        let retrieved_attrs = self.write_returning(&returning, &mut sql);

        let statement = RemoteStatement {
            kind: StatementKind::Insert,
            sql,
            params,
            retrieved_attrs,
            row_identity_used: false,
        };
        self.log_built(&statement);
        Ok(statement)
    }

    /// `UPDATE <relation> SET a = ?, ... WHERE rdb$db_key = ? [RETURNING ...]`
    pub fn build_update(
        &self,
        target_attrs: &[AttrNumber],
        returning: &AttrsUsed,
    ) -> Result<RemoteStatement> {
        self.require_updatable("updates")?;
        if target_attrs.is_empty() {
            return Err(Error::internal(format!(
                "UPDATE on \"{}\" without target columns",
                self.relation.name
            )));
        }

        let mut sql = String::from("UPDATE ");
        sql.push_str(&self.relation.from_item());
        sql.push_str(" SET ");
        let mut params = Vec::with_capacity(target_attrs.len() + 1);
        for (i, &attnum) in target_attrs.iter().enumerate() {
            let column = self.relation.require_attribute(attnum)?;
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&self.relation.quoted_column_name(column));
            sql.push_str(" = ");
            sql.push_str(PLACEHOLDER);
            params.push(ParamSlot::Column(attnum));
        }
        self.write_identity_predicate(&mut sql, &mut params);
        let retrieved_attrs = self.write_returning(returning, &mut sql);

        let statement = RemoteStatement {
            kind: StatementKind::Update,
            sql,
            params,
            retrieved_attrs,
            row_identity_used: false,
        };
        self.log_built(&statement);
        Ok(statement)
    }

    /// `DELETE FROM <relation> WHERE rdb$db_key = ? [RETURNING ...]`
    pub fn build_delete(&self, returning: &AttrsUsed) -> Result<RemoteStatement> {
        self.require_updatable("deletes")?;

        let mut sql = String::from("DELETE FROM ");
        sql.push_str(&self.relation.from_item());
        let mut params = Vec::with_capacity(1);
        self.write_identity_predicate(&mut sql, &mut params);
        let retrieved_attrs = self.write_returning(returning, &mut sql);

        let statement = RemoteStatement {
            kind: StatementKind::Delete,
            sql,
            params,
            retrieved_attrs,
            row_identity_used: false,
        };
        self.log_built(&statement);
        Ok(statement)
    }

    fn require_updatable(&self, operation: &str) -> Result<()> {
        if self.relation.options.is_updatable() {
            Ok(())
        } else {
            Err(Error::read_only(&self.relation.name, operation))
        }
    }

    fn write_identity_predicate(&self, sql: &mut String, params: &mut Vec<ParamSlot>) {
        sql.push_str(" WHERE ");
        sql.push_str(ROW_IDENTITY_COLUMN);
        sql.push_str(" = ");
        sql.push_str(PLACEHOLDER);
        params.push(ParamSlot::RowIdentity);
    }

    /// Append ` RETURNING ...` when anything is requested.
    ///
    /// Firebird only accepts RETURNING for statements affecting at most one
    /// row, which holds here since every modify targets a single row identity.
    fn write_returning(&self, returning: &AttrsUsed, sql: &mut String) -> Vec<RetrievedAttr> {
        if returning.is_empty() {
            return Vec::new();
        }
        sql.push_str(" RETURNING ");
        self.write_target_list(returning, ListPosition::Returning, sql)
    }

    /// Append the used columns in ordinal order, then `rdb$db_key` if
    /// requested, or `NULL` when nothing is selected.
    fn write_target_list(
        &self,
        attrs: &AttrsUsed,
        position: ListPosition,
        sql: &mut String,
    ) -> Vec<RetrievedAttr> {
        let mut retrieved = Vec::new();

        for (attnum, column) in self.relation.live_columns() {
            if !attrs.contains(attnum) {
                continue;
            }
            if !retrieved.is_empty() {
                sql.push_str(", ");
            }
            let name = self.relation.quoted_column_name(column);
            if !self.relation.emulates_boolean(column, self.version) {
                sql.push_str(&name);
            } else if self.version.has_native_boolean() {
                sql.push_str(&name);
                sql.push_str(" <> 0");
            } else if position == ListPosition::Select {
                // pre-3.0: normalize any non-zero integer to 1, keep NULL
                sql.push_str(&format!("CASE WHEN {name} <> 0 THEN 1 ELSE {name} END AS {name}"));
            } else {
                sql.push_str(&name);
            }
            retrieved.push(RetrievedAttr::Column(attnum));
        }

        if attrs.row_identity {
            if !retrieved.is_empty() {
                sql.push_str(", ");
            }
            sql.push_str(ROW_IDENTITY_COLUMN);
            retrieved.push(RetrievedAttr::RowIdentity);
        }

        if retrieved.is_empty() {
            sql.push_str("NULL");
        }
        retrieved
    }

    fn log_built(&self, statement: &RemoteStatement) {
        debug!(
            relation = %self.relation.name,
            kind = %statement.kind,
            params = statement.params.len(),
            sql = %statement.sql,
            "built remote statement"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::expressions::SqlType;
    use crate::options::{RelationOptions, ServerOptions, TableOptions};
    use crate::relation::ColumnDescriptor;

    fn orders() -> RelationDescriptor {
        RelationDescriptor::new(3, "orders")
            .column("id", SqlType::Int4)
            .push_column(ColumnDescriptor::new("legacy", SqlType::Text).dropped())
            .column("note", SqlType::Text)
            .column("paid", SqlType::Bool)
    }

    fn emulated(rel: RelationDescriptor) -> RelationDescriptor {
        rel.with_options(RelationOptions::new(
            ServerOptions {
                implicit_bool_type: true,
                ..Default::default()
            },
            TableOptions::default(),
        ))
    }

    #[test]
    fn test_attrs_used() {
        let mut attrs = AttrsUsed::none();
        assert!(attrs.is_empty());
        attrs.insert(2);
        assert!(attrs.contains(2));
        assert!(!attrs.contains(1));
        assert!(AttrsUsed::whole_row().contains(99));
        assert!(!AttrsUsed::none().with_row_identity().is_empty());
    }

    #[test]
    fn test_select_projection() {
        let catalog = InMemoryCatalog::with_builtins();
        let rel = orders();
        let builder = StatementBuilder::new(&catalog, &rel, RemoteVersion::V3_0);

        let stmt = builder.build_select(&AttrsUsed::whole_row(), &[], true).unwrap();
        assert_eq!(stmt.sql, "SELECT id, note, paid FROM orders");
        assert_eq!(
            stmt.retrieved_attrs,
            vec![RetrievedAttr::Column(1), RetrievedAttr::Column(3), RetrievedAttr::Column(4)]
        );
        assert!(!stmt.row_identity_used);

        let stmt = builder
            .build_select(&AttrsUsed::columns([3]).with_row_identity(), &[], true)
            .unwrap();
        assert_eq!(stmt.sql, "SELECT note, rdb$db_key FROM orders");
        assert_eq!(
            stmt.retrieved_attrs,
            vec![RetrievedAttr::Column(3), RetrievedAttr::RowIdentity]
        );
        assert!(stmt.row_identity_used);
    }

    #[test]
    fn test_select_nothing_projects_null() {
        let catalog = InMemoryCatalog::with_builtins();
        let rel = orders();
        let builder = StatementBuilder::new(&catalog, &rel, RemoteVersion::V3_0);
        let stmt = builder.build_select(&AttrsUsed::none(), &[], true).unwrap();
        assert_eq!(stmt.sql, "SELECT NULL FROM orders");
        assert!(stmt.retrieved_attrs.is_empty());

        // only the dropped column referenced
        let stmt = builder.build_select(&AttrsUsed::columns([2]), &[], true).unwrap();
        assert_eq!(stmt.sql, "SELECT NULL FROM orders");
    }

    #[test]
    fn test_select_boolean_projection_by_version() {
        let catalog = InMemoryCatalog::with_builtins();
        let rel = emulated(orders());
        let attrs = AttrsUsed::columns([1, 4]);

        let stmt = StatementBuilder::new(&catalog, &rel, RemoteVersion::V2_5)
            .build_select(&attrs, &[], true)
            .unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT id, CASE WHEN paid <> 0 THEN 1 ELSE paid END AS paid FROM orders"
        );

        let stmt = StatementBuilder::new(&catalog, &rel, RemoteVersion::V3_0)
            .build_select(&attrs, &[], true)
            .unwrap();
        assert_eq!(stmt.sql, "SELECT id, paid FROM orders");
    }

    #[test]
    fn test_select_with_where() {
        let catalog = InMemoryCatalog::with_builtins();
        let rel = orders();
        let builder = StatementBuilder::new(&catalog, &rel, RemoteVersion::V3_0);
        let gt = catalog.binary_operator(">").unwrap();
        let conditions = vec![Expression::binary(
            gt,
            Expression::column(3, 1, SqlType::Int4),
            Expression::int4(100),
        )];

        let stmt = builder.build_select(&AttrsUsed::columns([1]), &conditions, true).unwrap();
        assert_eq!(stmt.sql, "SELECT id FROM orders WHERE (id > ?)");
        assert_eq!(stmt.params.len(), 1);
        assert_eq!(stmt.placeholder_count(), 1);

        let explain = builder.build_select(&AttrsUsed::columns([1]), &conditions, false).unwrap();
        assert_eq!(explain.sql, "SELECT id FROM orders WHERE (id > 100)");
        assert!(explain.params.is_empty());
    }

    #[test]
    fn test_insert() {
        let catalog = InMemoryCatalog::with_builtins();
        let rel = orders();
        let builder = StatementBuilder::new(&catalog, &rel, RemoteVersion::V2_5);

        let stmt = builder.build_insert(&[1, 3], &AttrsUsed::none()).unwrap();
        assert_eq!(stmt.sql, "INSERT INTO orders (id, note)\n VALUES (?, ?)");
        assert_eq!(stmt.params, vec![ParamSlot::Column(1), ParamSlot::Column(3)]);
        assert!(stmt.retrieved_attrs.is_empty());

        let stmt = builder.build_insert(&[], &AttrsUsed::none()).unwrap();
        assert_eq!(stmt.sql, "INSERT INTO orders DEFAULT VALUES");
        assert!(stmt.params.is_empty());

        assert!(builder.build_insert(&[2], &AttrsUsed::none()).unwrap_err().is_internal());
    }

    #[test]
    fn test_insert_returning_and_trigger() {
        let catalog = InMemoryCatalog::with_builtins();
        let rel = orders();
        let builder = StatementBuilder::new(&catalog, &rel, RemoteVersion::V2_5);
        let stmt = builder.build_insert(&[3], &AttrsUsed::columns([1])).unwrap();
        assert_eq!(stmt.sql, "INSERT INTO orders (note)\n VALUES (?) RETURNING id");
        assert_eq!(stmt.retrieved_attrs, vec![RetrievedAttr::Column(1)]);

        let mut triggered = orders();
        triggered.has_after_insert_row_trigger = true;
        let builder = StatementBuilder::new(&catalog, &triggered, RemoteVersion::V2_5);
        let stmt = builder.build_insert(&[3], &AttrsUsed::none()).unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO orders (note)\n VALUES (?) RETURNING id, note, paid"
        );
    }

    #[test]
    fn test_returning_keeps_legacy_booleans_plain() {
        let catalog = InMemoryCatalog::with_builtins();
        let rel = emulated(orders());
        let stmt = StatementBuilder::new(&catalog, &rel, RemoteVersion::V2_5)
            .build_update(&[4], &AttrsUsed::columns([4]))
            .unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE orders SET paid = ? WHERE rdb$db_key = ? RETURNING paid"
        );
    }

    #[test]
    fn test_update_and_delete() {
        let catalog = InMemoryCatalog::with_builtins();
        let rel = orders();
        let builder = StatementBuilder::new(&catalog, &rel, RemoteVersion::V3_0);

        let stmt = builder.build_update(&[3, 4], &AttrsUsed::none()).unwrap();
        assert_eq!(stmt.sql, "UPDATE orders SET note = ?, paid = ? WHERE rdb$db_key = ?");
        assert_eq!(
            stmt.params,
            vec![ParamSlot::Column(3), ParamSlot::Column(4), ParamSlot::RowIdentity]
        );
        assert_eq!(
            stmt.param_formats(),
            vec![ParamFormat::Text, ParamFormat::Text, ParamFormat::DbKey]
        );
        assert!(builder.build_update(&[], &AttrsUsed::none()).unwrap_err().is_internal());

        let stmt = builder.build_delete(&AttrsUsed::none()).unwrap();
        assert_eq!(stmt.sql, "DELETE FROM orders WHERE rdb$db_key = ?");
        assert_eq!(stmt.params, vec![ParamSlot::RowIdentity]);
    }

    #[test]
    fn test_read_only_relations() {
        let catalog = InMemoryCatalog::with_builtins();
        let rel = orders().with_options(RelationOptions::new(
            ServerOptions::default(),
            TableOptions {
                updatable: Some(false),
                ..Default::default()
            },
        ));
        let builder = StatementBuilder::new(&catalog, &rel, RemoteVersion::V3_0);
        assert!(matches!(
            builder.build_delete(&AttrsUsed::none()),
            Err(Error::ReadOnly { .. })
        ));
        assert!(builder.build_select(&AttrsUsed::whole_row(), &[], true).is_ok());
    }

    #[test]
    fn test_bind_follows_slots() {
        let catalog = InMemoryCatalog::with_builtins();
        let rel = orders();
        let builder = StatementBuilder::new(&catalog, &rel, RemoteVersion::V3_0);
        let stmt = builder.build_update(&[4, 1], &AttrsUsed::none()).unwrap();

        let row: Vec<Option<String>> = vec![Some("42".into()), None, Some("n".into()), None];
        let identity = RowIdentity::from_bytes([0, 0, 0, 0x81, 0, 0, 0, 0x02]);
        let values = stmt.bind(&row, Some(identity)).unwrap();
        assert_eq!(
            values,
            vec![None, Some("42".to_string()), Some("0000008100000002".to_string())]
        );
        assert_eq!(values.len(), stmt.placeholder_count());

        assert!(stmt.bind(&row, None).unwrap_err().is_internal());
    }

    #[test]
    fn test_placeholder_count_skips_quoted_text() {
        let stmt = RemoteStatement {
            kind: StatementKind::Select,
            sql: "SELECT \"a?\" FROM t WHERE (b = '?') AND (c = ?)".into(),
            params: vec![],
            retrieved_attrs: vec![],
            row_identity_used: false,
        };
        assert_eq!(stmt.placeholder_count(), 1);
    }
}
