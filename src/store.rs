use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use tracing::debug;

use crate::gateway::{Gateway, Statement};
use crate::record::Relational;
use crate::result::DbResult;
use crate::schema::TableSchema;
use crate::sql;
use crate::value::Value;

/// Typed CRUD over the table a [`Relational`] type maps to.
///
/// Rows are always identified by their primary-key value, read from the record at call
/// time. The store keeps no cache: every load goes back to the database.
pub struct RelationalStore<T: Relational>(pub(crate) Arc<StoreInner<T>>);

impl<T: Relational> Clone for RelationalStore<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Relational> Deref for RelationalStore<T> {
    type Target = Arc<StoreInner<T>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: Relational> RelationalStore<T> {
    /// Bind a store for `T` to `gateway`.
    ///
    /// # Arguments
    ///
    /// * `gateway` - The database the table named by `T` lives in.
    ///
    /// # Errors
    ///
    /// [`crate::StoreError::SchemaMismatch`] if the table does not exist or lacks a
    /// column `T` maps.
    pub fn new(gateway: Arc<dyn Gateway>) -> DbResult<Self> {
        Ok(Self(Arc::new(StoreInner::new(gateway)?)))
    }
}

pub struct StoreInner<T: Relational> {
    gateway: Arc<dyn Gateway>,
    schema: TableSchema,
    _record: PhantomData<fn() -> T>,
}

impl<T: Relational> StoreInner<T> {
    fn new(gateway: Arc<dyn Gateway>) -> DbResult<Self> {
        let live = gateway
            .table_columns(T::TABLE)
            .map_err(|err| err.in_table(T::TABLE, None))?;
        let schema = TableSchema::resolve::<T>(&live)?;

        debug!(table = T::TABLE, columns = schema.columns.len(), "store bound");

        Ok(Self {
            gateway,
            schema,
            _record: PhantomData,
        })
    }

    /// The schema this store was bound to.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Insert a record.
    ///
    /// # Arguments
    ///
    /// * `record` - The record to insert.
    ///
    /// # Errors
    ///
    /// [`crate::StoreError::ConstraintViolation`] if its key is already taken.
    pub fn add(&self, record: &T) -> DbResult<()> {
        let statements = sql::insert(&self.schema, vec![record.to_values()]);
        self.transact(&statements, Some(&record.key()))?;

        debug!(table = T::TABLE, key = %record.key(), "record added");
        Ok(())
    }

    /// Insert a batch of records in one transaction.
    ///
    /// If any record is rejected, none of the batch is stored.
    ///
    /// # Arguments
    ///
    /// * `records` - The records to insert. An empty slice does not touch the database.
    ///
    /// # Returns
    ///
    /// The number of rows inserted.
    pub fn add_batch(&self, records: &[T]) -> DbResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let rows = records.iter().map(Relational::to_values).collect();
        let statements = sql::insert(&self.schema, rows);
        let inserted = self.transact(&statements, None)?;

        debug!(table = T::TABLE, inserted, "batch added");
        Ok(inserted)
    }

    /// Write every non-key field of `record` to the row with the same key.
    ///
    /// # Arguments
    ///
    /// * `record` - The record to write. Its key field picks the row.
    ///
    /// # Returns
    ///
    /// The number of rows changed, 0 when no row has that key.
    pub fn update(&self, record: &T) -> DbResult<u64> {
        match sql::update(&self.schema, record.to_values()) {
            Some(statement) => {
                let updated = self.transact(&[statement], Some(&record.key()))?;
                debug!(table = T::TABLE, key = %record.key(), updated, "record updated");
                Ok(updated)
            }
            None => Ok(0),
        }
    }

    /// Update a batch of records in one transaction, each matched by key.
    ///
    /// If any update is rejected, no row of the batch changes.
    ///
    /// # Arguments
    ///
    /// * `records` - The records to write. Records with no matching row are ignored.
    ///
    /// # Returns
    ///
    /// The number of rows changed.
    pub fn update_batch(&self, records: &[T]) -> DbResult<u64> {
        let statements: Vec<Statement> = records
            .iter()
            .filter_map(|record| sql::update(&self.schema, record.to_values()))
            .collect();

        if statements.is_empty() {
            return Ok(0);
        }

        let updated = self.transact(&statements, None)?;
        debug!(table = T::TABLE, requested = records.len(), updated, "batch updated");
        Ok(updated)
    }

    /// Delete the row with the same key as `record`.
    ///
    /// # Returns
    ///
    /// The number of rows removed, 0 when no row has that key.
    pub fn delete(&self, record: &T) -> DbResult<u64> {
        let key = record.key();
        let statements = sql::delete(&self.schema, vec![key.clone()]);
        let deleted = self.transact(&statements, Some(&key))?;

        debug!(table = T::TABLE, %key, deleted, "record deleted");
        Ok(deleted)
    }

    /// Delete the rows matching the keys of `records` in one transaction.
    ///
    /// # Arguments
    ///
    /// * `records` - The records whose keys select the rows. Absent keys are ignored.
    ///
    /// # Returns
    ///
    /// The number of rows removed.
    pub fn delete_batch(&self, records: &[T]) -> DbResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }

        let keys = records.iter().map(Relational::key).collect();
        let statements = sql::delete(&self.schema, keys);
        let deleted = self.transact(&statements, None)?;

        debug!(table = T::TABLE, requested = records.len(), deleted, "batch deleted");
        Ok(deleted)
    }

    /// Delete every row in the table. Returns the number of rows removed.
    pub fn delete_all(&self) -> DbResult<u64> {
        let deleted = self.transact(&[sql::delete_all(&self.schema)], None)?;

        debug!(table = T::TABLE, deleted, "table cleared");
        Ok(deleted)
    }

    /// Load every row of the table. An empty table gives an empty `Vec`.
    ///
    /// Rows come back in whatever order the database returns them.
    pub fn try_load_data(&self) -> DbResult<Vec<T>> {
        let rows = self.query(&sql::select_all(&self.schema), None)?;
        debug!(table = T::TABLE, rows = rows.len(), "table loaded");

        rows.into_iter().map(T::from_values).collect()
    }

    /// Load the row whose key equals `key`.
    ///
    /// # Arguments
    ///
    /// * `key` - The primary-key value to look up.
    ///
    /// # Returns
    ///
    /// An [`Option`] containing the record if the row exists, or [`None`] otherwise.
    pub fn find(&self, key: impl Into<Value>) -> DbResult<Option<T>> {
        let key = key.into();
        let rows = self.query(&sql::select_by_key(&self.schema, key.clone()), Some(&key))?;

        rows.into_iter().next().map(T::from_values).transpose()
    }

    fn query(&self, statement: &Statement, key: Option<&Value>) -> DbResult<Vec<Vec<Value>>> {
        self.gateway
            .query(statement)
            .map_err(|err| err.in_table(T::TABLE, key.map(Value::to_string)))
    }

    fn transact(&self, statements: &[Statement], key: Option<&Value>) -> DbResult<u64> {
        let affected = self
            .gateway
            .transact(statements)
            .map_err(|err| err.in_table(T::TABLE, key.map(Value::to_string)))?;

        Ok(affected.iter().sum())
    }
}
