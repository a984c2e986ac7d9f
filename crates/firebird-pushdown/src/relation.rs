//! Descriptor of the foreign relation being planned.

use crate::capability::CapabilityContext;
use crate::error::{Error, Result};
use crate::expressions::{AttrNumber, RelationId, SqlType};
use crate::identifiers::quote_identifier;
use crate::options::{ColumnOptions, RelationOptions};
use crate::version::RemoteVersion;
use serde::{Deserialize, Serialize};

/// One column of the local foreign table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub ty: SqlType,
    #[serde(default)]
    pub dropped: bool,
    #[serde(default)]
    pub options: ColumnOptions,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, ty: SqlType) -> Self {
        Self {
            name: name.into(),
            ty,
            dropped: false,
            options: ColumnOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ColumnOptions) -> Self {
        self.options = options;
        self
    }

    pub fn dropped(mut self) -> Self {
        self.dropped = true;
        self
    }

    /// Name of the column on the remote side
    pub fn remote_name(&self) -> &str {
        self.options.column_name.as_deref().unwrap_or(&self.name)
    }
}

/// A foreign relation: local definition plus its effective options.
///
/// Columns are stored in ordinal order; attribute number `n` is `columns[n - 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDescriptor {
    pub id: RelationId,
    /// Local relation name, used remotely unless `table_name` overrides it
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub options: RelationOptions,
    /// The local table has an AFTER INSERT row trigger
    #[serde(default)]
    pub has_after_insert_row_trigger: bool,
}

impl RelationDescriptor {
    pub fn new(id: RelationId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            columns: Vec::new(),
            options: RelationOptions::default(),
            has_after_insert_row_trigger: false,
        }
    }

    /// Append a column with default options
    pub fn column(mut self, name: impl Into<String>, ty: SqlType) -> Self {
        self.columns.push(ColumnDescriptor::new(name, ty));
        self
    }

    pub fn push_column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_options(mut self, options: RelationOptions) -> Self {
        self.options = options;
        self
    }

    /// Column at attribute number `attnum`, if it exists and is not dropped
    pub fn attribute(&self, attnum: AttrNumber) -> Option<&ColumnDescriptor> {
        if attnum < 1 {
            return None;
        }
        self.columns
            .get(attnum as usize - 1)
            .filter(|column| !column.dropped)
    }

    /// Like [`attribute`](Self::attribute), but a miss is a contract violation
    pub fn require_attribute(&self, attnum: AttrNumber) -> Result<&ColumnDescriptor> {
        self.attribute(attnum).ok_or_else(|| {
            Error::internal(format!(
                "attribute {attnum} of relation \"{}\" does not exist",
                self.name
            ))
        })
    }

    /// Live columns with their attribute numbers, in ordinal order.
    ///
    /// Columns past the largest [`AttrNumber`] are not addressable and are
    /// skipped.
    pub fn live_columns(&self) -> impl Iterator<Item = (AttrNumber, &ColumnDescriptor)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, column)| !column.dropped)
            .map_while(|(i, column)| Some((AttrNumber::try_from(i + 1).ok()?, column)))
    }

    /// Whether identifiers of `column` are always quoted
    pub fn quotes_column(&self, column: &ColumnDescriptor) -> bool {
        column
            .options
            .quote_identifier
            .unwrap_or_else(|| self.options.quote_identifiers())
    }

    /// Remote column name, quoted per the effective policy
    pub fn quoted_column_name(&self, column: &ColumnDescriptor) -> String {
        quote_identifier(column.remote_name(), self.quotes_column(column))
    }

    /// Whether `column` holds a boolean emulated as an integer on the remote side.
    ///
    /// Requires the server-level switch. Before Firebird 3.0 every boolean
    /// column is emulated; from 3.0 only those flagged per column.
    pub fn emulates_boolean(&self, column: &ColumnDescriptor, version: RemoteVersion) -> bool {
        column.ty == SqlType::Bool
            && self.options.implicit_bool_type()
            && (!version.has_native_boolean() || column.options.implicit_bool_type)
    }

    /// The FROM item: the remote table name, or a parenthesized query
    pub fn from_item(&self) -> String {
        match (&self.options.table.query, &self.options.table.table_name) {
            (Some(query), _) => format!("( {query} )"),
            (None, Some(table)) => quote_identifier(table, self.options.quote_identifiers()),
            (None, None) => quote_identifier(&self.name, self.options.quote_identifiers()),
        }
    }

    /// Capability inputs for planning this relation against `version`
    pub fn capability_context(&self, version: RemoteVersion) -> CapabilityContext {
        CapabilityContext {
            version,
            relation: self.id,
            implicit_bool_type: self.options.implicit_bool_type(),
            pushdown_enabled: self.options.pushdowns_enabled(),
        }
    }
}
