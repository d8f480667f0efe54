use crate::result::DbResult;
use crate::value::Value;

/// A parameterized SQL statement. Parameters are positional (`$1`, `$2`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// A column of a live table, as reported by the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    /// SQL type name, usable in a cast (`text`, `integer`, `character varying`, ...).
    pub sql_type: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }
}

/// Access to a database: DDL, table introspection and parameterized statements.
///
/// A gateway is shared by every store built on it, so implementations must be safe
/// to call from several threads. Errors are reported with the store's error kinds.
pub trait Gateway: Send + Sync {
    /// Whether a table with this name exists.
    fn table_exists(&self, name: &str) -> DbResult<bool>;

    /// Drop a table. Does nothing if it does not exist.
    fn try_drop_table(&self, name: &str) -> DbResult<()>;

    /// Run DDL inside a transaction.
    fn transact_ddl(&self, sql: &str) -> DbResult<()>;

    /// Columns of a table in ordinal order. Empty if the table does not exist.
    fn table_columns(&self, name: &str) -> DbResult<Vec<ColumnInfo>>;

    /// Run a query and return every row.
    fn query(&self, statement: &Statement) -> DbResult<Vec<Vec<Value>>>;

    /// Run statements in one transaction and return the rows affected by each.
    ///
    /// Either every statement is committed or none is.
    fn transact(&self, statements: &[Statement]) -> DbResult<Vec<u64>>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::result::StoreError;

    /// Gateway double that records every statement and replays scripted results.
    #[derive(Default)]
    pub(crate) struct RecordingGateway {
        pub columns: Vec<ColumnInfo>,
        pub rows: Mutex<VecDeque<Vec<Vec<Value>>>>,
        pub fail_transactions: bool,
        pub queries: Mutex<Vec<Statement>>,
        pub transactions: Mutex<Vec<Vec<Statement>>>,
    }

    impl RecordingGateway {
        pub fn with_columns(columns: &[(&str, &str)]) -> Self {
            Self {
                columns: columns
                    .iter()
                    .map(|(name, sql_type)| ColumnInfo::new(*name, *sql_type))
                    .collect(),
                ..Default::default()
            }
        }

        pub fn push_rows(&self, rows: Vec<Vec<Value>>) {
            self.rows.lock().unwrap().push_back(rows);
        }

        pub fn transactions(&self) -> Vec<Vec<Statement>> {
            self.transactions.lock().unwrap().clone()
        }
    }

    impl Gateway for RecordingGateway {
        fn table_exists(&self, _name: &str) -> DbResult<bool> {
            Ok(!self.columns.is_empty())
        }

        fn try_drop_table(&self, _name: &str) -> DbResult<()> {
            Ok(())
        }

        fn transact_ddl(&self, sql: &str) -> DbResult<()> {
            self.transact(&[Statement::new(sql, vec![])]).map(|_| ())
        }

        fn table_columns(&self, _name: &str) -> DbResult<Vec<ColumnInfo>> {
            Ok(self.columns.clone())
        }

        fn query(&self, statement: &Statement) -> DbResult<Vec<Vec<Value>>> {
            self.queries.lock().unwrap().push(statement.clone());
            Ok(self.rows.lock().unwrap().pop_front().unwrap_or_default())
        }

        fn transact(&self, statements: &[Statement]) -> DbResult<Vec<u64>> {
            if self.fail_transactions {
                return Err(StoreError::ConstraintViolation {
                    table: String::new(),
                    key: None,
                    message: "duplicate key value violates unique constraint".to_owned(),
                });
            }

            self.transactions.lock().unwrap().push(statements.to_vec());
            Ok(statements.iter().map(|_| 1).collect())
        }
    }
}
