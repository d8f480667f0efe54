//! Statement rendering for a single table.
//!
//! Every parameter is bound as text and cast to the column's type on the server, so
//! the same statements work whatever Rust type a field uses.

use crate::gateway::Statement;
use crate::schema::TableSchema;
use crate::value::Value;

/// Upper bound on bound parameters in one PostgreSQL statement.
pub const MAX_PARAMS: usize = 65535;

/// Quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Placeholder for parameter `index` (1-based) cast to `sql_type`.
fn placeholder(index: usize, sql_type: &str) -> String {
    if sql_type == "text" {
        format!("${}::text", index)
    } else {
        format!("${}::text::{}", index, sql_type)
    }
}

fn column_list(schema: &TableSchema) -> String {
    schema
        .columns
        .iter()
        .map(|column| quote_ident(&column.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn select_list(schema: &TableSchema) -> String {
    schema
        .columns
        .iter()
        .map(|column| format!("{}::text", quote_ident(&column.name)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Select every row, each column read back as text.
pub fn select_all(schema: &TableSchema) -> Statement {
    Statement::new(
        format!(
            "SELECT {} FROM {}",
            select_list(schema),
            quote_ident(&schema.table)
        ),
        vec![],
    )
}

/// Select the row whose key equals `key`.
pub fn select_by_key(schema: &TableSchema, key: Value) -> Statement {
    Statement::new(
        format!(
            "SELECT {} FROM {} WHERE {} = {}",
            select_list(schema),
            quote_ident(&schema.table),
            quote_ident(&schema.primary_key),
            placeholder(1, schema.key_type())
        ),
        vec![key],
    )
}

/// Multi-row inserts for `rows`, split so no statement exceeds [`MAX_PARAMS`].
pub fn insert(schema: &TableSchema, rows: Vec<Vec<Value>>) -> Vec<Statement> {
    let width = schema.columns.len().max(1);
    let rows_per_statement = (MAX_PARAMS / width).max(1);

    let mut statements = Vec::new();
    let mut rows = rows.into_iter().peekable();

    while rows.peek().is_some() {
        let mut tuples = Vec::new();
        let mut params = Vec::new();

        for row in rows.by_ref().take(rows_per_statement) {
            let tuple = schema
                .columns
                .iter()
                .enumerate()
                .map(|(offset, column)| placeholder(params.len() + offset + 1, &column.sql_type))
                .collect::<Vec<_>>()
                .join(", ");

            tuples.push(format!("({})", tuple));
            params.extend(row);
        }

        statements.push(Statement::new(
            format!(
                "INSERT INTO {} ({}) VALUES {}",
                quote_ident(&schema.table),
                column_list(schema),
                tuples.join(", ")
            ),
            params,
        ));
    }

    statements
}

/// Update every non-key column of the row matching the key found in `row`.
///
/// Returns `None` when the table has no column besides the key.
pub fn update(schema: &TableSchema, row: Vec<Value>) -> Option<Statement> {
    let key_index = schema.key_index()?;

    let mut assignments = Vec::new();
    let mut params = Vec::new();
    let mut key = Value::Null;

    for (index, (column, value)) in schema.columns.iter().zip(row).enumerate() {
        if index == key_index {
            key = value;
            continue;
        }

        params.push(value);
        assignments.push(format!(
            "{} = {}",
            quote_ident(&column.name),
            placeholder(params.len(), &column.sql_type)
        ));
    }

    if assignments.is_empty() {
        return None;
    }

    params.push(key);

    Some(Statement::new(
        format!(
            "UPDATE {} SET {} WHERE {} = {}",
            quote_ident(&schema.table),
            assignments.join(", "),
            quote_ident(&schema.primary_key),
            placeholder(params.len(), schema.key_type())
        ),
        params,
    ))
}

/// Deletes for the rows matching `keys`, split so no statement exceeds [`MAX_PARAMS`].
pub fn delete(schema: &TableSchema, keys: Vec<Value>) -> Vec<Statement> {
    let mut statements = Vec::new();
    let mut keys = keys.into_iter().peekable();

    while keys.peek().is_some() {
        let chunk: Vec<Value> = keys.by_ref().take(MAX_PARAMS).collect();
        let placeholders = (1..=chunk.len())
            .map(|index| placeholder(index, schema.key_type()))
            .collect::<Vec<_>>()
            .join(", ");

        statements.push(Statement::new(
            format!(
                "DELETE FROM {} WHERE {} IN ({})",
                quote_ident(&schema.table),
                quote_ident(&schema.primary_key),
                placeholders
            ),
            chunk,
        ));
    }

    statements
}

/// Delete every row.
pub fn delete_all(schema: &TableSchema) -> Statement {
    Statement::new(format!("DELETE FROM {}", quote_ident(&schema.table)), vec![])
}
