use std::error::Error as _;
use std::sync::{Mutex, MutexGuard};

use postgres::error::SqlState;
use postgres::types::ToSql;
use postgres::{Client, NoTls};
use tracing::{debug, info, warn};

use crate::config::PgConfig;
use crate::gateway::{ColumnInfo, Gateway, Statement};
use crate::result::{DbResult, StoreError};
use crate::sql::quote_ident;
use crate::value::Value;

const COLUMNS_SQL: &str = "SELECT a.attname::text, format_type(a.atttypid, a.atttypmod) \
     FROM pg_catalog.pg_attribute a \
     WHERE a.attrelid = to_regclass($1::text) AND a.attnum > 0 AND NOT a.attisdropped \
     ORDER BY a.attnum";

/// [`Gateway`] over a single synchronous PostgreSQL connection.
///
/// Calls are serialised on the connection. Every call is its own transaction.
pub struct PgGateway {
    client: Mutex<Client>,
}

impl PgGateway {
    /// Connect using `config`.
    pub fn connect(config: &PgConfig) -> DbResult<Self> {
        let pg_config = config.to_postgres_config()?;
        let client = pg_config.connect(NoTls).map_err(map_error)?;

        info!(
            dbname = pg_config.get_dbname().unwrap_or_default(),
            "connected to postgres"
        );
        Ok(Self::from_client(client))
    }

    /// Wrap an already connected client.
    pub fn from_client(client: Client) -> Self {
        Self {
            client: Mutex::new(client),
        }
    }

    fn client(&self) -> DbResult<MutexGuard<'_, Client>> {
        let client = self
            .client
            .lock()
            .map_err(|_| StoreError::ConnectionFailure("connection lock poisoned".to_owned()))?;

        if client.is_closed() {
            return Err(StoreError::ConnectionFailure(
                "connection is closed".to_owned(),
            ));
        }

        Ok(client)
    }
}

/// Statement parameters in their text form.
fn text_params(statement: &Statement) -> Vec<Option<String>> {
    statement.params.iter().map(Value::to_text).collect()
}

fn as_sql(params: &[Option<String>]) -> Vec<&(dyn ToSql + Sync)> {
    params
        .iter()
        .map(|param| param as &(dyn ToSql + Sync))
        .collect()
}

/// Sort a driver error into the store's error kinds.
fn map_error(err: postgres::Error) -> StoreError {
    let mapped = if let Some(db) = err.as_db_error() {
        let code = db.code();
        let mut message = db.message().to_owned();
        if let Some(detail) = db.detail() {
            message = format!("{} ({})", message, detail);
        }

        if code.code().starts_with("23") {
            StoreError::ConstraintViolation {
                table: db.table().unwrap_or_default().to_owned(),
                key: None,
                message,
            }
        } else if *code == SqlState::UNDEFINED_TABLE || *code == SqlState::UNDEFINED_COLUMN {
            StoreError::SchemaMismatch {
                table: db.table().unwrap_or_default().to_owned(),
                reason: message,
            }
        } else if code.code().starts_with("08") || *code == SqlState::ADMIN_SHUTDOWN {
            StoreError::ConnectionFailure(message)
        } else {
            StoreError::Gateway(message)
        }
    } else if err.is_closed() || err.source().is_some_and(|source| source.is::<std::io::Error>()) {
        StoreError::ConnectionFailure(err.to_string())
    } else {
        StoreError::Gateway(err.to_string())
    };

    warn!(error = %mapped, "postgres call failed");
    mapped
}

impl Gateway for PgGateway {
    fn table_exists(&self, name: &str) -> DbResult<bool> {
        let row = self
            .client()?
            .query_one(
                "SELECT to_regclass($1::text) IS NOT NULL",
                &[&quote_ident(name)],
            )
            .map_err(map_error)?;

        row.try_get(0).map_err(map_error)
    }

    fn try_drop_table(&self, name: &str) -> DbResult<()> {
        debug!(table = name, "dropping table");
        self.transact_ddl(&format!("DROP TABLE IF EXISTS {}", quote_ident(name)))
    }

    fn transact_ddl(&self, sql: &str) -> DbResult<()> {
        let mut client = self.client()?;
        let mut transaction = client.transaction().map_err(map_error)?;
        transaction.batch_execute(sql).map_err(map_error)?;
        transaction.commit().map_err(map_error)
    }

    fn table_columns(&self, name: &str) -> DbResult<Vec<ColumnInfo>> {
        let rows = self
            .client()?
            .query(COLUMNS_SQL, &[&quote_ident(name)])
            .map_err(map_error)?;

        rows.iter()
            .map(|row| {
                Ok(ColumnInfo {
                    name: row.try_get(0).map_err(map_error)?,
                    sql_type: row.try_get(1).map_err(map_error)?,
                })
            })
            .collect()
    }

    fn query(&self, statement: &Statement) -> DbResult<Vec<Vec<Value>>> {
        let params = text_params(statement);
        let rows = self
            .client()?
            .query(statement.sql.as_str(), &as_sql(&params))
            .map_err(map_error)?;

        rows.iter()
            .map(|row| {
                (0..row.len())
                    .map(|index| {
                        row.try_get::<_, Option<String>>(index)
                            .map(Value::from)
                            .map_err(map_error)
                    })
                    .collect()
            })
            .collect()
    }

    fn transact(&self, statements: &[Statement]) -> DbResult<Vec<u64>> {
        let mut client = self.client()?;
        let mut transaction = client.transaction().map_err(map_error)?;

        let mut affected = Vec::with_capacity(statements.len());
        for statement in statements {
            let params = text_params(statement);
            affected.push(
                transaction
                    .execute(statement.sql.as_str(), &as_sql(&params))
                    .map_err(map_error)?,
            );
        }

        // Dropping an uncommitted transaction rolls it back.
        transaction.commit().map_err(map_error)?;
        Ok(affected)
    }
}
