use std::fmt;

/// A single column value as it travels between a record and the database.
///
/// Values are sent to the database in their text form and cast server-side to the
/// column's declared type, so the variant only matters on the Rust side.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Value {
    /// Text representation bound as a statement parameter. `None` binds SQL `NULL`.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Text(text) => Some(text.clone()),
            Value::Int(int) => Some(int.to_string()),
            Value::Float(float) => Some(float.to_string()),
            Value::Bool(boolean) => Some(boolean.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Some(text) => f.write_str(&text),
            None => f.write_str("NULL"),
        }
    }
}

impl From<Option<String>> for Value {
    fn from(text: Option<String>) -> Self {
        text.map_or(Value::Null, Value::Text)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_owned())
    }
}

impl From<i64> for Value {
    fn from(int: i64) -> Self {
        Value::Int(int)
    }
}

impl From<i32> for Value {
    fn from(int: i32) -> Self {
        Value::Int(i64::from(int))
    }
}

impl From<bool> for Value {
    fn from(boolean: bool) -> Self {
        Value::Bool(boolean)
    }
}

/// Conversion of a record field into a [`Value`].
pub trait ToValue {
    fn to_value(&self) -> Value;
}

/// Conversion of a [`Value`] read from the database back into a record field.
///
/// Text values are parsed, since that is how rows come back from PostgreSQL.
/// On failure the original value is handed back so the caller can report it.
pub trait FromValue: Sized {
    /// Human readable name of the target type, used in conversion errors.
    const EXPECTED: &'static str;

    fn from_value(value: Value) -> Result<Self, Value>;
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }
}

impl ToValue for &str {
    fn to_value(&self) -> Value {
        Value::Text((*self).to_owned())
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, ToValue::to_value)
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Text(text) => Ok(text),
            Value::Null => Err(Value::Null),
            other => Ok(other.to_string()),
        }
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Bool(boolean) => Ok(boolean),
            Value::Text(ref text) => match text.as_str() {
                "true" | "t" => Ok(true),
                "false" | "f" => Ok(false),
                _ => Err(value),
            },
            other => Err(other),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

macro_rules! integer_value {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }
            }

            impl FromValue for $ty {
                const EXPECTED: &'static str = stringify!($ty);

                fn from_value(value: Value) -> Result<Self, Value> {
                    match value {
                        Value::Int(int) => <$ty>::try_from(int).map_err(|_| value),
                        Value::Text(ref text) => text.trim().parse().map_err(|_| value),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

integer_value!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! float_value {
    ($($ty:ty),*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::Float(f64::from(*self))
                }
            }

            impl FromValue for $ty {
                const EXPECTED: &'static str = stringify!($ty);

                fn from_value(value: Value) -> Result<Self, Value> {
                    match value {
                        Value::Float(float) => Ok(float as $ty),
                        Value::Int(int) => Ok(int as $ty),
                        Value::Text(ref text) => text.trim().parse().map_err(|_| value),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

float_value!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_parse_from_text_columns() {
        assert_eq!(i32::from_value(Value::Text("42".to_owned())), Ok(42));
        assert_eq!(i64::from_value(Value::Int(-7)), Ok(-7));

        // Out of range for the field type.
        assert_eq!(u8::from_value(Value::Int(300)), Err(Value::Int(300)));
        assert!(i32::from_value(Value::Text("forty".to_owned())).is_err());
    }

    #[test]
    fn null_only_fits_optional_fields() {
        assert_eq!(Option::<String>::from_value(Value::Null), Ok(None));
        assert_eq!(String::from_value(Value::Null), Err(Value::Null));
        assert_eq!(
            Option::<i32>::from_value(Value::Text("3".to_owned())),
            Ok(Some(3))
        );
    }

    #[test]
    fn text_form_of_values() {
        assert_eq!(Value::Int(1).to_text().as_deref(), Some("1"));
        assert_eq!(Value::Bool(false).to_text().as_deref(), Some("false"));
        assert_eq!(Value::Float(2.5).to_text().as_deref(), Some("2.5"));
        assert_eq!(Value::Null.to_text(), None);
        assert_eq!(Some("OR13-22").to_value(), Value::Text("OR13-22".to_owned()));
        assert_eq!(None::<i32>.to_value(), Value::Null);
    }

    #[test]
    fn bools_and_floats_from_postgres_text() {
        assert_eq!(bool::from_value(Value::Text("t".to_owned())), Ok(true));
        assert_eq!(bool::from_value(Value::Text("false".to_owned())), Ok(false));
        assert_eq!(f64::from_value(Value::Text("0.1".to_owned())), Ok(0.1));
        assert_eq!(f32::from_value(Value::Int(2)), Ok(2.0));
    }
}
