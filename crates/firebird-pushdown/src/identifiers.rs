//! Identifier and string literal quoting for generated remote SQL.
//!
//! Unquoted identifiers follow the host's rules: an identifier is left bare only
//! when it starts with a lower-case letter or underscore, contains nothing but
//! lower-case letters, digits and underscores, and is not a reserved word.
//! Everything else is double-quoted with embedded quotes doubled.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Host keywords that force quoting (reserved, column-name and
/// type/function-name categories; unreserved keywords are safe bare).
static QUOTED_KEYWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // reserved
        "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric", "both",
        "case", "cast", "check", "collate", "column", "constraint", "create", "current_catalog",
        "current_date", "current_role", "current_time", "current_timestamp", "current_user",
        "default", "deferrable", "desc", "distinct", "do", "else", "end", "except", "false",
        "fetch", "for", "foreign", "from", "grant", "group", "having", "in", "initially",
        "intersect", "into", "lateral", "leading", "limit", "localtime", "localtimestamp", "not",
        "null", "offset", "on", "only", "or", "order", "placing", "primary", "references",
        "returning", "select", "session_user", "some", "symmetric", "system_user", "table",
        "then", "to", "trailing", "true", "union", "unique", "user", "using", "variadic", "when",
        "where", "window", "with",
        // column names
        "between", "bigint", "bit", "boolean", "char", "character", "coalesce", "dec",
        "decimal", "exists", "extract", "float", "greatest", "grouping", "inout", "int",
        "integer", "interval", "json", "json_array", "json_arrayagg", "json_exists",
        "json_object", "json_objectagg", "json_query", "json_scalar", "json_serialize",
        "json_table", "json_value", "least", "merge_action", "national", "nchar", "none",
        "normalize", "nullif", "numeric", "out", "overlay", "position", "precision", "real",
        "row", "setof", "smallint", "substring", "time", "timestamp", "treat", "trim", "values",
        "varchar", "xmlattributes", "xmlconcat", "xmlelement", "xmlexists", "xmlforest",
        "xmlnamespaces", "xmlparse", "xmlpi", "xmlroot", "xmlserialize", "xmltable",
        // type or function names
        "authorization", "binary", "collation", "concurrently", "cross", "current_schema",
        "freeze", "full", "ilike", "inner", "is", "isnull", "join", "left", "like", "natural",
        "notnull", "outer", "overlaps", "right", "similar", "tablesample", "verbose",
    ]
    .into_iter()
    .collect()
});

/// Whether `ident` is a keyword that must be quoted
pub fn is_quoted_keyword(ident: &str) -> bool {
    QUOTED_KEYWORDS.contains(ident)
}

fn is_safe_bare(ident: &str) -> bool {
    let mut chars = ident.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_lowercase() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !is_quoted_keyword(ident)
}

/// Quote an identifier if needed, or always when `force` is set.
pub fn quote_identifier(ident: &str, force: bool) -> String {
    if !force && is_safe_bare(ident) {
        return ident.to_string();
    }
    let mut out = String::with_capacity(ident.len() + 2);
    out.push('"');
    for c in ident.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Render `value` as a single-quoted SQL string literal, doubling embedded quotes.
pub fn quote_string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    push_string_literal(&mut out, value);
    out
}

/// Append `value` as a single-quoted SQL string literal
pub fn push_string_literal(out: &mut String, value: &str) {
    out.push('\'');
    for c in value.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_identifiers() {
        assert_eq!(quote_identifier("id", false), "id");
        assert_eq!(quote_identifier("_tmp1", false), "_tmp1");
        assert_eq!(quote_identifier("col_2", false), "col_2");
        // unreserved keywords stay bare
        assert_eq!(quote_identifier("name", false), "name");
        assert_eq!(quote_identifier("data", false), "data");
    }

    #[test]
    fn test_identifiers_needing_quotes() {
        assert_eq!(quote_identifier("Mixed", false), "\"Mixed\"");
        assert_eq!(quote_identifier("1st", false), "\"1st\"");
        assert_eq!(quote_identifier("with space", false), "\"with space\"");
        assert_eq!(quote_identifier("select", false), "\"select\"");
        assert_eq!(quote_identifier("position", false), "\"position\"");
        assert_eq!(quote_identifier("like", false), "\"like\"");
        assert_eq!(quote_identifier("", false), "\"\"");
        assert_eq!(quote_identifier("say\"hi", false), "\"say\"\"hi\"");
    }

    #[test]
    fn test_forced_quoting() {
        assert_eq!(quote_identifier("id", true), "\"id\"");
        assert_eq!(quote_identifier("RDB$RELATIONS", true), "\"RDB$RELATIONS\"");
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(quote_string_literal("x%"), "'x%'");
        assert_eq!(quote_string_literal("O'Brien"), "'O''Brien'");
        assert_eq!(quote_string_literal("''"), "''''''");
        assert_eq!(quote_string_literal(""), "''");
    }
}
