//! Scan destinations and the row/cursor contracts drivers implement

use std::collections::VecDeque;

use crate::{Error, Result, Value};

#[cfg(feature = "datetime-support")]
pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
#[cfg(feature = "datetime-support")]
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// A field that can receive a scanned column value
///
/// Implemented for the usual scalar types. `Option<T>` maps `NULL` to `None`;
/// every other target rejects `NULL`.
pub trait ScanTarget {
    fn scan(&mut self, value: Value) -> Result<()>;
}

/// A single result row
pub trait RowSource {
    /// Convert the row's columns into `dest`, one destination per column, in order
    fn scan_into(&self, dest: &mut [&mut dyn ScanTarget]) -> Result<()>;
}

/// A forward-only, single-pass result set
///
/// `scan_into` reads the row the cursor was last advanced onto. Once `advance`
/// returns `false` the cursor is exhausted; `take_error` then reports whether it
/// stopped because of a failure.
pub trait Cursor: RowSource {
    fn advance(&mut self) -> bool;

    fn take_error(&mut self) -> Option<Error>;
}

/// Decode every column with `decode` and hand it to the matching destination
pub(crate) fn fill_targets<F>(
    columns: &[&str],
    dest: &mut [&mut dyn ScanTarget],
    mut decode: F,
) -> Result<()>
where
    F: FnMut(usize) -> Result<Value>,
{
    if columns.len() != dest.len() {
        return Err(Error::ColumnCount {
            expected: columns.len(),
            found: dest.len(),
        });
    }

    for (i, target) in dest.iter_mut().enumerate() {
        let value = decode(i).map_err(|e| Error::decode(columns[i], e))?;
        target.scan(value).map_err(|e| Error::decode(columns[i], e))?;
    }

    Ok(())
}

impl ScanTarget for bool {
    fn scan(&mut self, value: Value) -> Result<()> {
        *self = match value {
            Value::Bool(b) => b,
            // MySQL reports BOOLEAN columns as TINYINT(1)
            other => match other.as_integer() {
                Some(i) => i != 0,
                None => return Err(Error::type_mismatch("bool", other.type_name())),
            },
        };
        Ok(())
    }
}

macro_rules! scan_integer {
    ($($t:ty),+) => {
        $(impl ScanTarget for $t {
            fn scan(&mut self, value: Value) -> Result<()> {
                let wide = value
                    .as_integer()
                    .ok_or_else(|| Error::type_mismatch(stringify!($t), value.type_name()))?;
                *self = <$t>::try_from(wide)
                    .map_err(|_| Error::type_mismatch(stringify!($t), "out of range integer"))?;
                Ok(())
            }
        })+
    };
}

scan_integer!(i8, i16, i32, i64, u8, u16, u32, u64);

impl ScanTarget for f64 {
    fn scan(&mut self, value: Value) -> Result<()> {
        *self = match value {
            Value::F64(f) => f,
            Value::F32(f) => f64::from(f),
            other => match other.as_integer() {
                Some(i) => i as f64,
                None => return Err(Error::type_mismatch("f64", other.type_name())),
            },
        };
        Ok(())
    }
}

impl ScanTarget for f32 {
    fn scan(&mut self, value: Value) -> Result<()> {
        *self = match value {
            Value::F32(f) => f,
            Value::F64(f) => f as f32,
            other => match other.as_integer() {
                Some(i) => i as f32,
                None => return Err(Error::type_mismatch("f32", other.type_name())),
            },
        };
        Ok(())
    }
}

impl ScanTarget for String {
    fn scan(&mut self, value: Value) -> Result<()> {
        *self = match value {
            Value::String(s) => s,
            Value::Json(j) => j.to_string(),
            Value::Bytes(b) => {
                String::from_utf8(b).map_err(|_| Error::type_mismatch("String", "non-UTF-8 BLOB"))?
            }
            other => return Err(Error::type_mismatch("String", other.type_name())),
        };
        Ok(())
    }
}

impl ScanTarget for Vec<u8> {
    fn scan(&mut self, value: Value) -> Result<()> {
        *self = match value {
            Value::Bytes(b) => b,
            Value::String(s) => s.into_bytes(),
            other => return Err(Error::type_mismatch("Vec<u8>", other.type_name())),
        };
        Ok(())
    }
}

impl ScanTarget for serde_json::Value {
    fn scan(&mut self, value: Value) -> Result<()> {
        *self = match value {
            Value::Json(j) => j,
            Value::Null => serde_json::Value::Null,
            Value::String(s) => serde_json::from_str(&s)?,
            Value::Bytes(b) => serde_json::from_slice(&b)?,
            other => return Err(Error::type_mismatch("JSON", other.type_name())),
        };
        Ok(())
    }
}

impl<T> ScanTarget for Option<T>
where
    T: ScanTarget + Default,
{
    fn scan(&mut self, value: Value) -> Result<()> {
        if value.is_null() {
            *self = None;
            return Ok(());
        }

        let mut inner = T::default();
        inner.scan(value)?;
        *self = Some(inner);
        Ok(())
    }
}

#[cfg(feature = "uuid-support")]
impl ScanTarget for uuid::Uuid {
    fn scan(&mut self, value: Value) -> Result<()> {
        *self = match value {
            Value::String(s) => uuid::Uuid::parse_str(&s)
                .map_err(|_| Error::type_mismatch("Uuid", "malformed TEXT"))?,
            Value::Bytes(b) => uuid::Uuid::from_slice(&b)
                .map_err(|_| Error::type_mismatch("Uuid", "BLOB of wrong length"))?,
            other => return Err(Error::type_mismatch("Uuid", other.type_name())),
        };
        Ok(())
    }
}

#[cfg(feature = "datetime-support")]
impl ScanTarget for chrono::NaiveDateTime {
    fn scan(&mut self, value: Value) -> Result<()> {
        let text = match value {
            Value::String(s) => s,
            other => return Err(Error::type_mismatch("NaiveDateTime", other.type_name())),
        };
        *self = chrono::NaiveDateTime::parse_from_str(&text, DATETIME_FORMAT)
            .or_else(|_| chrono::NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%.f"))
            .map_err(|_| Error::type_mismatch("NaiveDateTime", "malformed TEXT"))?;
        Ok(())
    }
}

#[cfg(feature = "datetime-support")]
impl ScanTarget for chrono::NaiveDate {
    fn scan(&mut self, value: Value) -> Result<()> {
        let text = match value {
            Value::String(s) => s,
            other => return Err(Error::type_mismatch("NaiveDate", other.type_name())),
        };
        *self = chrono::NaiveDate::parse_from_str(&text, DATE_FORMAT)
            .map_err(|_| Error::type_mismatch("NaiveDate", "malformed TEXT"))?;
        Ok(())
    }
}

#[cfg(feature = "decimal-support")]
impl ScanTarget for rust_decimal::Decimal {
    fn scan(&mut self, value: Value) -> Result<()> {
        *self = match value {
            Value::String(s) => s
                .parse()
                .map_err(|_| Error::type_mismatch("Decimal", "malformed TEXT"))?,
            Value::I32(i) => rust_decimal::Decimal::from(i),
            Value::I64(i) => rust_decimal::Decimal::from(i),
            Value::U64(u) => rust_decimal::Decimal::from(u),
            other => return Err(Error::type_mismatch("Decimal", other.type_name())),
        };
        Ok(())
    }
}

/// A row whose columns are already decoded
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRow {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl ValueRow {
    /// Create a row with positional column names (`#0`, `#1`, ...)
    pub fn new(values: Vec<Value>) -> Self {
        let columns = (0..values.len()).map(|i| format!("#{i}")).collect();
        Self { columns, values }
    }

    /// Create a row with named columns
    ///
    /// Scanning fails with [`Error::ColumnCount`] when the two lists differ in length.
    pub fn with_columns(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl RowSource for ValueRow {
    fn scan_into(&self, dest: &mut [&mut dyn ScanTarget]) -> Result<()> {
        if self.values.len() != self.columns.len() {
            return Err(Error::ColumnCount {
                expected: self.columns.len(),
                found: self.values.len(),
            });
        }

        let columns: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        fill_targets(&columns, dest, |i| Ok(self.values[i].clone()))
    }
}

/// An in-memory cursor over decoded rows, optionally ending in an error
#[derive(Debug, Default)]
pub struct ValueCursor {
    rows: VecDeque<ValueRow>,
    current: Option<ValueRow>,
    error: Option<Error>,
}

impl ValueCursor {
    pub fn new(rows: Vec<ValueRow>) -> Self {
        Self {
            rows: rows.into(),
            current: None,
            error: None,
        }
    }

    /// Report `error` from `take_error` once the rows are exhausted
    pub fn fail_with(mut self, error: Error) -> Self {
        self.error = Some(error);
        self
    }
}

impl From<Vec<Vec<Value>>> for ValueCursor {
    fn from(rows: Vec<Vec<Value>>) -> Self {
        Self::new(rows.into_iter().map(ValueRow::new).collect())
    }
}

impl RowSource for ValueCursor {
    fn scan_into(&self, dest: &mut [&mut dyn ScanTarget]) -> Result<()> {
        match &self.current {
            Some(row) => row.scan_into(dest),
            None => Err(Error::NoCurrentRow),
        }
    }
}

impl Cursor for ValueCursor {
    fn advance(&mut self) -> bool {
        self.current = self.rows.pop_front();
        self.current.is_some()
    }

    fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_targets_range_check() {
        let mut small = 0u8;
        small.scan(Value::I64(200)).unwrap();
        assert_eq!(small, 200);

        let err = small.scan(Value::I64(300)).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { expected: "u8", .. }));

        let mut id = 0i64;
        id.scan(Value::I32(-5)).unwrap();
        assert_eq!(id, -5);
    }

    #[test]
    fn test_null_requires_option() {
        let mut name = String::new();
        let err = name.scan(Value::Null).unwrap_err();
        assert_eq!(err.to_string(), "Type mismatch: expected String, found NULL");

        let mut nickname: Option<String> = Some("old".to_string());
        nickname.scan(Value::Null).unwrap();
        assert_eq!(nickname, None);

        nickname.scan(Value::from("neo")).unwrap();
        assert_eq!(nickname.as_deref(), Some("neo"));
    }

    #[test]
    fn test_bool_from_tinyint() {
        let mut flag = false;
        flag.scan(Value::I64(1)).unwrap();
        assert!(flag);
        flag.scan(Value::Bool(false)).unwrap();
        assert!(!flag);
    }

    #[test]
    fn test_float_widening() {
        let mut ratio = 0f64;
        ratio.scan(Value::F32(0.5)).unwrap();
        assert_eq!(ratio, 0.5);
        ratio.scan(Value::I64(3)).unwrap();
        assert_eq!(ratio, 3.0);
    }

    #[test]
    fn test_json_from_text() {
        let mut doc = serde_json::Value::Null;
        doc.scan(Value::from(r#"{"a":1}"#)).unwrap();
        assert_eq!(doc, serde_json::json!({"a": 1}));
    }

    #[test]
    fn test_value_row_column_count() {
        let row = ValueRow::new(vec![Value::I64(1), Value::from("x")]);
        let mut id = 0i64;
        let mut dest: Vec<&mut dyn ScanTarget> = vec![&mut id];

        let err = row.scan_into(&mut dest).unwrap_err();
        assert!(matches!(err, Error::ColumnCount { expected: 2, found: 1 }));
    }

    #[test]
    fn test_value_row_with_fewer_values_than_columns() {
        let row = ValueRow::with_columns(vec!["a".to_string(), "b".to_string()], vec![Value::I64(1)]);
        let mut a = 0i64;
        let mut b = 0i64;
        let mut dest: Vec<&mut dyn ScanTarget> = vec![&mut a, &mut b];

        let err = row.scan_into(&mut dest).unwrap_err();
        assert!(matches!(err, Error::ColumnCount { expected: 2, found: 1 }));
    }

    #[test]
    fn test_value_row_decode_context() {
        let row = ValueRow::with_columns(
            vec!["id".to_string(), "name".to_string()],
            vec![Value::I64(1), Value::I64(2)],
        );
        let mut id = 0i64;
        let mut name = String::new();
        let mut dest: Vec<&mut dyn ScanTarget> = vec![&mut id, &mut name];

        let err = row.scan_into(&mut dest).unwrap_err();
        assert!(matches!(&err, Error::Decode { column, .. } if column == "name"));
    }

    #[test]
    fn test_value_cursor_surfaces_error_after_rows() {
        let mut cursor = ValueCursor::from(vec![vec![Value::I64(7)]])
            .fail_with(Error::config("connection reset"));

        assert!(cursor.advance());
        let mut id = 0i64;
        {
            let mut dest: Vec<&mut dyn ScanTarget> = vec![&mut id];
            cursor.scan_into(&mut dest).unwrap();
        }
        assert_eq!(id, 7);

        assert!(!cursor.advance());
        assert!(matches!(cursor.take_error(), Some(Error::Config { .. })));
        assert!(cursor.take_error().is_none());
    }

    #[test]
    fn test_scan_without_advance() {
        let cursor = ValueCursor::from(vec![vec![Value::I64(7)]]);
        let mut id = 0i64;
        let mut dest: Vec<&mut dyn ScanTarget> = vec![&mut id];
        assert!(matches!(cursor.scan_into(&mut dest), Err(Error::NoCurrentRow)));
    }
}
