use std::fmt::Debug;

use crate::result::{DbResult, StoreError};
use crate::value::{FromValue, Value};

/// A column of a [`Relational`] type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column name in the table.
    pub name: &'static str,
    /// SQL type used when the table is created from the descriptor.
    pub sql_type: &'static str,
}

/// Descriptor mapping a record type onto the rows of a single table.
///
/// Usually generated with `#[derive(Relational)]`. Columns are listed in a fixed order
/// and [`Relational::to_values`] and [`Relational::from_values`] use that same order.
pub trait Relational: Sized + Clone + Debug + Send + Sync + 'static {
    /// Name of the table holding the records.
    const TABLE: &'static str;
    /// Name of the primary-key column. Must be one of [`Relational::COLUMNS`].
    const PRIMARY_KEY: &'static str;
    /// Every mapped column, in field order.
    const COLUMNS: &'static [Column];

    /// Value of the primary-key field.
    fn key(&self) -> Value;

    /// Field values, one per column.
    fn to_values(&self) -> Vec<Value>;

    /// Rebuild a record from one row of column values.
    fn from_values(values: Vec<Value>) -> DbResult<Self>;
}

/// Take the next column value from a row and convert it into a field.
///
/// Used by generated [`Relational::from_values`] implementations.
pub fn take_column<F: FromValue>(
    values: &mut impl Iterator<Item = Value>,
    table: &str,
    column: &str,
) -> DbResult<F> {
    let value = values
        .next()
        .ok_or_else(|| StoreError::schema(table, format!("row has no value for '{column}'")))?;

    F::from_value(value).map_err(|value| StoreError::Conversion {
        column: column.to_owned(),
        value: value.to_string(),
        expected: F::EXPECTED,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ToValue;

    #[derive(Debug, Clone, PartialEq)]
    struct Pair {
        code: String,
        rank: Option<i32>,
    }

    impl Relational for Pair {
        const TABLE: &'static str = "pair";
        const PRIMARY_KEY: &'static str = "code";
        const COLUMNS: &'static [Column] = &[
            Column {
                name: "code",
                sql_type: "text",
            },
            Column {
                name: "rank",
                sql_type: "integer",
            },
        ];

        fn key(&self) -> Value {
            self.code.to_value()
        }

        fn to_values(&self) -> Vec<Value> {
            vec![self.code.to_value(), self.rank.to_value()]
        }

        fn from_values(values: Vec<Value>) -> DbResult<Self> {
            let mut values = values.into_iter();
            Ok(Self {
                code: take_column(&mut values, Self::TABLE, "code")?,
                rank: take_column(&mut values, Self::TABLE, "rank")?,
            })
        }
    }

    #[test]
    fn hand_written_descriptor() {
        let pair = Pair {
            code: "a".to_owned(),
            rank: Some(3),
        };

        let rebuilt = Pair::from_values(pair.to_values()).unwrap();
        assert_eq!(rebuilt, pair);
        assert_eq!(pair.key(), Value::Text("a".to_owned()));
    }

    #[test]
    fn short_row_is_a_schema_mismatch() {
        let result = Pair::from_values(vec![Value::Text("a".to_owned())]);
        assert!(matches!(result, Err(StoreError::SchemaMismatch { .. })));
    }

    #[test]
    fn bad_value_names_the_column() {
        let result = Pair::from_values(vec![
            Value::Text("a".to_owned()),
            Value::Text("high".to_owned()),
        ]);

        match result {
            Err(StoreError::Conversion {
                column, expected, ..
            }) => {
                assert_eq!(column, "rank");
                assert_eq!(expected, "i32");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
