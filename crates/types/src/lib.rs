/// Declared type of a table column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SqlType {
    SmallInt,
    Int,
    BigInt,
    Text,
    Bool,
}

impl SqlType {
    /// Integral column types can carry generated surrogate keys.
    pub fn is_integral(&self) -> bool {
        matches!(self, SqlType::SmallInt | SqlType::Int | SqlType::BigInt)
    }
}

/// Scalar stored in a row column.
///
/// Enumerations are stored as their variant name (`Text`).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Value {
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Text(String),
    Bool(bool),
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Widens any integral variant to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::SmallInt(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Converts the value into the representation of the given column type.
    ///
    /// Integers are narrowed with a range check and `0`/`1` are accepted for
    /// booleans, since some transports store booleans as integers. Returns
    /// `None` when the value cannot be represented. `Null` fits every type.
    pub fn coerce_to(&self, ty: &SqlType) -> Option<Value> {
        if self.is_null() {
            return Some(Value::Null);
        }
        match ty {
            SqlType::SmallInt => self
                .as_i64()
                .and_then(|v| i16::try_from(v).ok())
                .map(Value::SmallInt),
            SqlType::Int => self
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(Value::Int),
            SqlType::BigInt => self.as_i64().map(Value::BigInt),
            SqlType::Text => self.as_str().map(|s| Value::Text(s.to_string())),
            SqlType::Bool => match self {
                Value::Bool(b) => Some(Value::Bool(*b)),
                other => match other.as_i64() {
                    Some(0) => Some(Value::Bool(false)),
                    Some(1) => Some(Value::Bool(true)),
                    _ => None,
                },
            },
        }
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::SmallInt(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
