//! ZCQL rendering and result decoding for the Catalyst backend
//!
//! ZCQL is the SQL dialect the Catalyst query service accepts. Only the
//! subset the clinic needs is produced here: projection, equality filters,
//! a single `ORDER BY` and `LIMIT offset, count`.

use serde_json::Value;

use crate::query::{Filter, Query};
use crate::row::{Row, ROW_ID};

/// Escape a literal for use inside single quotes
pub fn escape_literal(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('\'', "\\'")
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", escape_literal(s)),
        Value::Bool(b) => format!("'{b}'"),
        other => format!("'{}'", escape_literal(&other.to_string())),
    }
}

fn render_filter(filter: &Filter) -> String {
    if filter.value.is_null() {
        format!("{} IS NULL", filter.column)
    } else {
        format!("{} = {}", filter.column, render_value(&filter.value))
    }
}

fn render_where(filters: &[Filter]) -> String {
    if filters.is_empty() {
        return String::new();
    }
    let clauses: Vec<String> = filters.iter().map(render_filter).collect();
    format!(" WHERE {}", clauses.join(" AND "))
}

/// Render a select statement for the query
pub fn render_select(query: &Query) -> String {
    let projection = if query.columns().is_empty() {
        "*".to_string()
    } else {
        query.columns().join(", ")
    };

    let mut sql = format!(
        "SELECT {} FROM {}{}",
        projection,
        query.table_name(),
        render_where(query.filters())
    );

    if let Some((column, direction)) = query.ordering() {
        sql.push_str(&format!(" ORDER BY {} {}", column, direction.as_keyword()));
    }

    match (query.offset(), query.limit()) {
        (Some(offset), Some(limit)) => sql.push_str(&format!(" LIMIT {offset}, {limit}")),
        (None, Some(limit)) => sql.push_str(&format!(" LIMIT {limit}")),
        _ => {}
    }

    sql
}

/// Render a row count over the query's filters
pub fn render_count(query: &Query) -> String {
    format!(
        "SELECT COUNT({}) FROM {}{}",
        ROW_ID,
        query.table_name(),
        render_where(query.filters())
    )
}

/// Result rows come back wrapped in their table name: `{"Patient": {...}}`
pub fn unwrap_table_row(table: &str, value: Value) -> Option<Row> {
    let Value::Object(mut map) = value else {
        return None;
    };

    if let Some(Value::Object(inner)) = map.remove(table) {
        return Some(Row::from(inner));
    }

    if map.len() == 1 {
        if let Some((_, Value::Object(inner))) = map.iter().next() {
            return Some(Row::from(inner.clone()));
        }
    }

    Some(Row::from(map))
}

/// Pull the first numeric value out of a count result row, at any depth
pub fn extract_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        Value::Object(map) => map.values().find_map(extract_count),
        Value::Array(items) => items.iter().find_map(extract_count),
        _ => None,
    }
}
