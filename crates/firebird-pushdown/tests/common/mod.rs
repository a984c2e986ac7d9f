#![allow(dead_code)]
//! Shared fixtures for integration tests

use firebird_pushdown::catalog::InMemoryCatalog;
use firebird_pushdown::expressions::{Expression, SqlType};
use firebird_pushdown::options::{ColumnOptions, RelationOptions, ServerOptions, TableOptions};
use firebird_pushdown::relation::{ColumnDescriptor, RelationDescriptor};

/// Relation id used by every fixture relation
pub const REL: u32 = 42;

pub fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::with_builtins()
}

/// `t(a int4, b text, c bool)` with the given server-level boolean emulation
pub fn abc(implicit_bool_type: bool) -> RelationDescriptor {
    RelationDescriptor::new(REL, "t")
        .column("a", SqlType::Int4)
        .column("b", SqlType::Text)
        .column("c", SqlType::Bool)
        .with_options(server(ServerOptions {
            implicit_bool_type,
            ..Default::default()
        }))
}

/// Like [`abc`], with `c` flagged as an integer-backed boolean column
pub fn abc_flagged() -> RelationDescriptor {
    RelationDescriptor::new(REL, "t")
        .column("a", SqlType::Int4)
        .column("b", SqlType::Text)
        .push_column(ColumnDescriptor::new("c", SqlType::Bool).with_options(ColumnOptions {
            implicit_bool_type: true,
            ..Default::default()
        }))
        .with_options(server(ServerOptions {
            implicit_bool_type: true,
            ..Default::default()
        }))
}

/// Relation options carrying only server-level settings
pub fn server(options: ServerOptions) -> RelationOptions {
    RelationOptions::new(options, TableOptions::default())
}

pub fn a() -> Expression {
    Expression::column(REL, 1, SqlType::Int4)
}

pub fn b() -> Expression {
    Expression::column(REL, 2, SqlType::Text)
}

pub fn c() -> Expression {
    Expression::column(REL, 3, SqlType::Bool)
}

pub fn binary(catalog: &InMemoryCatalog, op: &str, left: Expression, right: Expression) -> Expression {
    let id = catalog
        .binary_operator(op)
        .unwrap_or_else(|| panic!("operator {op} missing from fixture catalog"));
    Expression::binary(id, left, right)
}
