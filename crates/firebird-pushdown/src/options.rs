//! Foreign server, user mapping, table and column options.
//!
//! Options arrive from the host as ordered `(name, value)` text pairs. Each
//! context has a fixed set of valid names; anything else is rejected with a
//! hint listing what the context accepts. The typed structs below are what
//! the rest of the crate consumes.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Default Firebird server port
pub const DEFAULT_PORT: u16 = 3050;

/// Object an option list is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionContext {
    Server,
    UserMapping,
    ForeignTable,
    Column,
}

impl OptionContext {
    /// Option names accepted in this context, in declaration order
    pub fn valid_options(self) -> &'static [&'static str] {
        match self {
            OptionContext::Server => &[
                "address",
                "port",
                "database",
                "disable_pushdowns",
                "updatable",
                "quote_identifiers",
                "implicit_bool_type",
                "batch_size",
                "truncatable",
            ],
            OptionContext::UserMapping => &["username", "password"],
            OptionContext::ForeignTable => &[
                "query",
                "table_name",
                "updatable",
                "estimated_row_count",
                "quote_identifier",
                "batch_size",
                "truncatable",
            ],
            OptionContext::Column => &["column_name", "quote_identifier", "implicit_bool_type"],
        }
    }

    pub fn is_valid_option(self, name: &str) -> bool {
        self.valid_options().contains(&name)
    }
}

/// Validate an option list for a context without keeping the values.
///
/// Checks names against the context, rejects options given more than once and
/// type-checks every value.
pub fn validate_options<K, V>(context: OptionContext, options: &[(K, V)]) -> Result<()>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    match context {
        OptionContext::Server => ServerOptions::from_options(options).map(|_| ()),
        OptionContext::UserMapping => UserMappingOptions::from_options(options).map(|_| ()),
        OptionContext::ForeignTable => TableOptions::from_options(options).map(|_| ()),
        OptionContext::Column => ColumnOptions::from_options(options).map(|_| ()),
    }
}

/// Walk an option list, checking names and duplicates, handing each accepted
/// pair to `apply`.
fn for_each_option<K, V, F>(context: OptionContext, options: &[(K, V)], mut apply: F) -> Result<()>
where
    K: AsRef<str>,
    V: AsRef<str>,
    F: FnMut(&str, &str) -> Result<()>,
{
    let mut seen = HashSet::new();
    for (name, value) in options {
        let (name, value) = (name.as_ref(), value.as_ref());
        if !context.is_valid_option(name) {
            let valid = context.valid_options().join(", ");
            return Err(Error::invalid_option_with_hint(
                format!("invalid option \"{name}\""),
                format!("valid options in this context are: {valid}"),
            ));
        }
        if !seen.insert(name) {
            let message = if name == "password" {
                "conflicting or redundant options: password".to_string()
            } else {
                format!("conflicting or redundant options: {name} ({value})")
            };
            return Err(Error::invalid_option(message));
        }
        apply(name, value)?;
    }
    Ok(())
}

/// Parse a boolean the way the host does: `true`/`false`, `yes`/`no`,
/// `on`/`off`, `1`/`0`, case-insensitive, with unique prefixes accepted.
pub fn parse_bool(value: &str) -> Option<bool> {
    let v = value.to_ascii_lowercase();
    let first = *v.as_bytes().first()?;
    match first {
        b't' if "true".starts_with(&v) => Some(true),
        b'f' if "false".starts_with(&v) => Some(false),
        b'y' if "yes".starts_with(&v) => Some(true),
        b'n' if "no".starts_with(&v) => Some(false),
        // A lone "o" is ambiguous
        b'o' if v.len() >= 2 && "on".starts_with(&v) => Some(true),
        b'o' if v.len() >= 2 && "off".starts_with(&v) => Some(false),
        b'1' if v.len() == 1 => Some(true),
        b'0' if v.len() == 1 => Some(false),
        _ => None,
    }
}

fn bool_option(name: &str, value: &str) -> Result<bool> {
    parse_bool(value)
        .ok_or_else(|| Error::invalid_option(format!("{name} requires a Boolean value")))
}

fn int_option<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse::<T>().map_err(|_| {
        Error::invalid_option(format!(
            "an error was encountered when parsing the provided \"{name}\" value"
        ))
    })
}

fn batch_size_option(value: &str) -> Result<u32> {
    let size: i64 = int_option("batch_size", value)?;
    if size < 1 || size > i64::from(u32::MAX) {
        return Err(Error::invalid_option(
            "\"batch_size\" must have a value of 1 or greater",
        ));
    }
    Ok(size as u32)
}

/// Foreign server options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerOptions {
    pub address: Option<String>,
    pub port: u16,
    pub database: Option<String>,
    /// Keep every predicate local
    pub disable_pushdowns: bool,
    pub updatable: bool,
    pub quote_identifiers: bool,
    /// Enable legacy integer-boolean emulation for this server
    pub implicit_bool_type: bool,
    pub batch_size: Option<u32>,
    pub truncatable: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            address: None,
            port: DEFAULT_PORT,
            database: None,
            disable_pushdowns: false,
            updatable: true,
            quote_identifiers: false,
            implicit_bool_type: false,
            batch_size: None,
            truncatable: true,
        }
    }
}

impl ServerOptions {
    pub fn from_options<K, V>(options: &[(K, V)]) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut parsed = Self::default();
        for_each_option(OptionContext::Server, options, |name, value| {
            match name {
                "address" => parsed.address = Some(value.to_string()),
                "port" => {
                    let port: i64 = int_option("port", value)?;
                    if !(1..=65535).contains(&port) {
                        return Err(Error::invalid_option(
                            "\"port\" must have a value between 1 and 65535",
                        ));
                    }
                    parsed.port = port as u16;
                }
                "database" => parsed.database = Some(value.to_string()),
                "disable_pushdowns" => parsed.disable_pushdowns = bool_option(name, value)?,
                "updatable" => parsed.updatable = bool_option(name, value)?,
                "quote_identifiers" => parsed.quote_identifiers = bool_option(name, value)?,
                "implicit_bool_type" => parsed.implicit_bool_type = bool_option(name, value)?,
                "batch_size" => parsed.batch_size = Some(batch_size_option(value)?),
                "truncatable" => parsed.truncatable = bool_option(name, value)?,
                _ => {}
            }
            Ok(())
        })?;
        Ok(parsed)
    }
}

/// User mapping options
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserMappingOptions {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for UserMappingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserMappingOptions")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .finish()
    }
}

impl UserMappingOptions {
    pub fn from_options<K, V>(options: &[(K, V)]) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut parsed = Self::default();
        for_each_option(OptionContext::UserMapping, options, |name, value| {
            match name {
                "username" => parsed.username = Some(value.to_string()),
                "password" => parsed.password = Some(value.to_string()),
                _ => {}
            }
            Ok(())
        })?;
        Ok(parsed)
    }
}

/// Foreign table options. Unset values fall back to the server level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    /// Remote query standing in for a table
    pub query: Option<String>,
    /// Remote table name, when it differs from the local one
    pub table_name: Option<String>,
    pub updatable: Option<bool>,
    pub estimated_row_count: Option<u64>,
    pub quote_identifier: Option<bool>,
    pub batch_size: Option<u32>,
    pub truncatable: Option<bool>,
}

impl TableOptions {
    pub fn from_options<K, V>(options: &[(K, V)]) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut parsed = Self::default();
        for_each_option(OptionContext::ForeignTable, options, |name, value| {
            match name {
                "query" => {
                    if parsed.table_name.is_some() {
                        return Err(Error::invalid_option(
                            "conflicting options: 'query' cannot be used with 'table_name'",
                        ));
                    }
                    parsed.query = Some(value.to_string());
                }
                "table_name" => {
                    if parsed.query.is_some() {
                        return Err(Error::invalid_option(
                            "conflicting options: table cannot be used with query",
                        ));
                    }
                    parsed.table_name = Some(value.to_string());
                }
                "updatable" => parsed.updatable = Some(bool_option(name, value)?),
                "estimated_row_count" => {
                    parsed.estimated_row_count = Some(int_option(name, value)?)
                }
                "quote_identifier" => parsed.quote_identifier = Some(bool_option(name, value)?),
                "batch_size" => parsed.batch_size = Some(batch_size_option(value)?),
                "truncatable" => parsed.truncatable = Some(bool_option(name, value)?),
                _ => {}
            }
            Ok(())
        })?;

        if parsed.query.is_some() && parsed.updatable == Some(true) {
            return Err(Error::invalid_option(
                "foreign tables defined with the \"query\" option cannot be set as \"updatable\"",
            ));
        }
        Ok(parsed)
    }

    /// Whether the relation is defined by a remote query rather than a table
    pub fn is_query(&self) -> bool {
        self.query.is_some()
    }
}

/// Foreign table column options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnOptions {
    /// Remote column name, when it differs from the local one
    pub column_name: Option<String>,
    pub quote_identifier: Option<bool>,
    /// Remote column stores a boolean as an integer
    pub implicit_bool_type: bool,
}

impl ColumnOptions {
    pub fn from_options<K, V>(options: &[(K, V)]) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut parsed = Self::default();
        for_each_option(OptionContext::Column, options, |name, value| {
            match name {
                "column_name" => parsed.column_name = Some(value.to_string()),
                "quote_identifier" => parsed.quote_identifier = Some(bool_option(name, value)?),
                "implicit_bool_type" => parsed.implicit_bool_type = bool_option(name, value)?,
                _ => {}
            }
            Ok(())
        })?;
        Ok(parsed)
    }
}

/// Effective configuration of one foreign relation: server options refined by
/// the table's own options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationOptions {
    pub server: ServerOptions,
    pub table: TableOptions,
}

impl RelationOptions {
    pub fn new(server: ServerOptions, table: TableOptions) -> Self {
        Self { server, table }
    }

    /// Default quoting for this relation's identifiers
    pub fn quote_identifiers(&self) -> bool {
        self.table
            .quote_identifier
            .unwrap_or(self.server.quote_identifiers)
    }

    /// Query-defined relations are never updatable
    pub fn is_updatable(&self) -> bool {
        !self.table.is_query() && self.table.updatable.unwrap_or(self.server.updatable)
    }

    pub fn is_truncatable(&self) -> bool {
        !self.table.is_query() && self.table.truncatable.unwrap_or(self.server.truncatable)
    }

    pub fn pushdowns_enabled(&self) -> bool {
        !self.server.disable_pushdowns
    }

    pub fn implicit_bool_type(&self) -> bool {
        self.server.implicit_bool_type
    }

    /// Rows per remote INSERT batch
    pub fn batch_size(&self) -> u32 {
        self.table
            .batch_size
            .or(self.server.batch_size)
            .unwrap_or(1)
    }

    /// Row estimate supplied by the user, if any
    pub fn estimated_row_count(&self) -> Option<u64> {
        self.table.estimated_row_count
    }
}
