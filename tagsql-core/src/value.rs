//! Value types for SQL parameters and scanned columns

use serde::{Deserialize, Serialize};

/// A SQL value that can be bound as a parameter or read back from a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// Unsigned 64-bit integer
    U64(u64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// String value
    String(String),
    /// Bytes value
    Bytes(Vec<u8>),
    /// JSON value
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the SQL type name for this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::I32(_) => "INTEGER",
            Value::I64(_) => "BIGINT",
            Value::U64(_) => "BIGINT UNSIGNED",
            Value::F32(_) => "REAL",
            Value::F64(_) => "DOUBLE",
            Value::String(_) => "TEXT",
            Value::Bytes(_) => "BLOB",
            Value::Json(_) => "JSON",
        }
    }

    /// Widen any integer variant to `i128` for range-checked narrowing
    pub(crate) fn as_integer(&self) -> Option<i128> {
        match self {
            Value::I32(i) => Some(i128::from(*i)),
            Value::I64(i) => Some(i128::from(*i)),
            Value::U64(u) => Some(i128::from(*u)),
            _ => None,
        }
    }
}

// Implement From for common types
impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Bool(val)
    }
}

macro_rules! from_small_int {
    ($variant:ident, $wide:ty: $($t:ty),+) => {
        $(impl From<$t> for Value {
            fn from(val: $t) -> Self {
                Value::$variant(<$wide>::from(val))
            }
        })+
    };
}

from_small_int!(I32, i32: i8, i16, u8, u16);
from_small_int!(I64, i64: u32);

impl From<i32> for Value {
    fn from(val: i32) -> Self {
        Value::I32(val)
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::I64(val)
    }
}

impl From<u64> for Value {
    fn from(val: u64) -> Self {
        Value::U64(val)
    }
}

impl From<f32> for Value {
    fn from(val: f32) -> Self {
        Value::F32(val)
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::F64(val)
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::String(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::String(val.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(val: Vec<u8>) -> Self {
        Value::Bytes(val)
    }
}

impl From<&[u8]> for Value {
    fn from(val: &[u8]) -> Self {
        Value::Bytes(val.to_vec())
    }
}

impl From<serde_json::Value> for Value {
    fn from(val: serde_json::Value) -> Self {
        Value::Json(val)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

// Extended types travel as text so every driver can bind them.

#[cfg(feature = "uuid-support")]
impl From<uuid::Uuid> for Value {
    fn from(val: uuid::Uuid) -> Self {
        Value::String(val.hyphenated().to_string())
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::NaiveDateTime> for Value {
    fn from(val: chrono::NaiveDateTime) -> Self {
        Value::String(val.format(crate::scan::DATETIME_FORMAT).to_string())
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::NaiveDate> for Value {
    fn from(val: chrono::NaiveDate) -> Self {
        Value::String(val.format(crate::scan::DATE_FORMAT).to_string())
    }
}

#[cfg(feature = "decimal-support")]
impl From<rust_decimal::Decimal> for Value {
    fn from(val: rust_decimal::Decimal) -> Self {
        Value::String(val.to_string())
    }
}
