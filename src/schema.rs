use crate::gateway::ColumnInfo;
use crate::record::Relational;
use crate::result::{DbResult, StoreError};
use crate::sql::quote_ident;

/// The shape of the table a record type is stored in.
///
/// Columns follow the record's descriptor order. Their SQL types are either the
/// declared ones ([`TableSchema::declared`]) or the ones the live table reports
/// ([`TableSchema::resolve`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table: String,
    pub primary_key: String,
    pub columns: Vec<ColumnInfo>,
}

impl TableSchema {
    /// Schema as declared by the record descriptor.
    pub fn declared<T: Relational>() -> DbResult<Self> {
        let schema = Self {
            table: T::TABLE.to_owned(),
            primary_key: T::PRIMARY_KEY.to_owned(),
            columns: T::COLUMNS
                .iter()
                .map(|column| ColumnInfo::new(column.name, column.sql_type))
                .collect(),
        };

        schema.check_key()?;
        Ok(schema)
    }

    /// Match the record descriptor against the columns of the live table.
    ///
    /// Every descriptor column must exist in the table. The table may carry extra
    /// columns, which the store leaves alone.
    pub fn resolve<T: Relational>(live: &[ColumnInfo]) -> DbResult<Self> {
        if live.is_empty() {
            return Err(StoreError::schema(T::TABLE, "table does not exist"));
        }

        let mut columns = Vec::with_capacity(T::COLUMNS.len());
        for column in T::COLUMNS {
            let found = live
                .iter()
                .find(|info| info.name == column.name)
                .ok_or_else(|| {
                    StoreError::schema(T::TABLE, format!("missing column '{}'", column.name))
                })?;
            columns.push(found.clone());
        }

        let schema = Self {
            table: T::TABLE.to_owned(),
            primary_key: T::PRIMARY_KEY.to_owned(),
            columns,
        };

        schema.check_key()?;
        Ok(schema)
    }

    fn check_key(&self) -> DbResult<()> {
        if self.key_index().is_none() {
            return Err(StoreError::schema(
                &self.table,
                format!("primary key '{}' is not a mapped column", self.primary_key),
            ));
        }

        Ok(())
    }

    /// Position of the primary-key column.
    pub fn key_index(&self) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.name == self.primary_key)
    }

    /// SQL type of the primary-key column.
    pub fn key_type(&self) -> &str {
        self.key_index()
            .map(|index| self.columns[index].sql_type.as_str())
            .unwrap_or("text")
    }

    /// `CREATE TABLE` statement for this schema.
    ///
    /// The key column is `NOT NULL` and carries a named primary-key constraint.
    pub fn create_table_sql(&self) -> String {
        let mut definitions: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                let mut definition = format!("{} {}", quote_ident(&column.name), column.sql_type);
                if column.name == self.primary_key {
                    definition.push_str(" NOT NULL");
                }
                definition
            })
            .collect();

        definitions.push(format!(
            "CONSTRAINT {} PRIMARY KEY ({})",
            quote_ident(&format!(
                "pk_{}_{}",
                self.table.to_lowercase(),
                self.primary_key.to_lowercase()
            )),
            quote_ident(&self.primary_key)
        ));

        format!(
            "CREATE TABLE {} ({})",
            quote_ident(&self.table),
            definitions.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ColumnInfo;
    use crate::Relational;

    #[derive(Relational, Debug, Clone, PartialEq)]
    #[relational(table = "Building")]
    struct Building {
        #[primary_key]
        #[column(name = "BIN")]
        bin: String,
        #[column(name = "Identifier")]
        identifier: String,
        #[column(name = "PropertyId", sql_type = "text")]
        property_id: i32,
    }

    fn live_building() -> Vec<ColumnInfo> {
        vec![
            ColumnInfo::new("BIN", "text"),
            ColumnInfo::new("Identifier", "text"),
            ColumnInfo::new("PropertyId", "text"),
        ]
    }

    #[test]
    fn create_table_matches_fixture_ddl() {
        let schema = TableSchema::declared::<Building>().unwrap();

        assert_eq!(
            schema.create_table_sql(),
            "CREATE TABLE \"Building\" (\"BIN\" text NOT NULL, \"Identifier\" text, \
             \"PropertyId\" text, CONSTRAINT \"pk_building_bin\" PRIMARY KEY (\"BIN\"))"
        );
    }

    #[test]
    fn resolve_takes_live_types_in_descriptor_order() {
        let mut live = live_building();
        live.reverse();
        live.push(ColumnInfo::new("Notes", "text"));

        let schema = TableSchema::resolve::<Building>(&live).unwrap();

        let names: Vec<&str> = schema.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["BIN", "Identifier", "PropertyId"]);
        assert_eq!(schema.key_index(), Some(0));
        assert_eq!(schema.key_type(), "text");
    }

    #[test]
    fn resolve_rejects_missing_table_and_columns() {
        assert!(matches!(
            TableSchema::resolve::<Building>(&[]),
            Err(StoreError::SchemaMismatch { .. })
        ));

        let mut live = live_building();
        live.remove(1);

        match TableSchema::resolve::<Building>(&live) {
            Err(StoreError::SchemaMismatch { table, reason }) => {
                assert_eq!(table, "Building");
                assert!(reason.contains("Identifier"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
