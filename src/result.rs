use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database connection failure: {0}")]
    ConnectionFailure(String),
    #[error("constraint violated on table '{table}'{}: {message}", key_clause(.key))]
    ConstraintViolation {
        table: String,
        key: Option<String>,
        message: String,
    },
    #[error("table '{table}' does not match the record shape: {reason}")]
    SchemaMismatch { table: String, reason: String },
    #[error("column '{column}' holds {value:?}, which is not a valid {expected}")]
    Conversion {
        column: String,
        value: String,
        expected: &'static str,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("database error: {0}")]
    Gateway(String),
}

impl StoreError {
    pub(crate) fn schema(table: &str, reason: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            table: table.to_owned(),
            reason: reason.into(),
        }
    }

    /// Attach table (and optionally key) context to an error raised by a gateway.
    ///
    /// Gateways do not know which record a statement was built for, so they report
    /// constraint and schema errors with whatever table name the database gave them.
    pub(crate) fn in_table(self, table: &str, key: Option<String>) -> Self {
        match self {
            Self::ConstraintViolation {
                key: reported,
                message,
                ..
            } => Self::ConstraintViolation {
                table: table.to_owned(),
                key: reported.or(key),
                message,
            },
            Self::SchemaMismatch { reason, .. } => Self::schema(table, reason),
            other => other,
        }
    }
}

fn key_clause(key: &Option<String>) -> String {
    key.as_ref()
        .map(|key| format!(" by key '{}'", key))
        .unwrap_or_default()
}

pub type DbResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_message_names_key_only_when_known() {
        let keyed = StoreError::ConstraintViolation {
            table: "Building".to_owned(),
            key: Some("OR13-22".to_owned()),
            message: "duplicate key value".to_owned(),
        };
        assert_eq!(
            keyed.to_string(),
            "constraint violated on table 'Building' by key 'OR13-22': duplicate key value"
        );

        let batch = StoreError::ConstraintViolation {
            table: "Building".to_owned(),
            key: None,
            message: "duplicate key value".to_owned(),
        };
        assert_eq!(
            batch.to_string(),
            "constraint violated on table 'Building': duplicate key value"
        );
    }
}
