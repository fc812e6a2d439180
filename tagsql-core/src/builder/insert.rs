//! INSERT query builder implementation

use std::fmt;
use std::marker::PhantomData;

use super::common::{placeholders, quote, quote_list, QueryBuilder, Statement};
use crate::record::{column_values, columns, ColumnOptions};
use crate::{BuildError, Error, ExecResult, Executor, Record, Result};

/// INSERT query builder for record type `R`
///
/// Columns and placeholders come from `R`'s tagged fields minus the primary
/// key; the target table is prefixed by [`InsertQuery::into`].
pub struct InsertQuery<R> {
    stmt: Statement,
    table_set: bool,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> InsertQuery<R> {
    pub fn new() -> Self {
        let cols: Vec<_> = columns::<R>(ColumnOptions::WITHOUT_PRIMARY_KEY)
            .into_iter()
            .map(|c| c.name)
            .collect();

        let sql = format!(
            "({}) VALUES ({})",
            quote_list(&cols),
            placeholders(cols.len())
        );

        Self {
            stmt: Statement::new(sql),
            table_set: false,
            _record: PhantomData,
        }
    }

    /// Insert the tagged fields of `record` and report the driver's result
    ///
    /// # Examples
    /// ```ignore
    /// let result = insert::<User>().into("users").exec(&mut db, &user).await?;
    /// let id = result.last_insert_id;
    /// ```
    pub async fn exec<E: Executor>(self, executor: &mut E, record: &R) -> Result<ExecResult> {
        let sql = self.stmt.into_sql()?;
        if !self.table_set {
            return Err(BuildError::NoIntoTable.into());
        }

        let values = column_values(record, &columns::<R>(ColumnOptions::WITHOUT_PRIMARY_KEY))?;
        executor
            .execute(&sql, &values)
            .await
            .map_err(|e| Error::statement(&sql, e))
    }
}

impl<R: Record> Default for InsertQuery<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> InsertQuery<R> {
    /// Name the target table
    pub fn into(mut self, table: &str) -> Self {
        if self.stmt.failed() {
            return self;
        }
        if table.is_empty() {
            self.stmt.fail(BuildError::NoIntoTable);
            return self;
        }

        self.stmt.sql = format!("INSERT INTO {} {}", quote(table), self.stmt.sql);
        self.table_set = true;
        self
    }
}

impl<R> QueryBuilder for InsertQuery<R> {
    fn to_sql(&self) -> Result<String> {
        self.stmt.to_sql()
    }

    fn error(&self) -> Option<&BuildError> {
        self.stmt.error.as_ref()
    }
}

impl<R> Clone for InsertQuery<R> {
    fn clone(&self) -> Self {
        Self {
            stmt: self.stmt.clone(),
            table_set: self.table_set,
            _record: PhantomData,
        }
    }
}

impl<R> fmt::Debug for InsertQuery<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsertQuery")
            .field("sql", &self.stmt.sql)
            .field("error", &self.stmt.error)
            .field("table_set", &self.table_set)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::testing::{Empty, RecordingExecutor, SimpleTable};
    use crate::{insert, FieldMeta, ScanTarget, Value};

    #[test]
    fn test_insert_into() {
        let query = insert::<SimpleTable>().into("T");
        assert_eq!(
            query.to_sql().unwrap(),
            "INSERT INTO `T` (`field0`, `field1`) VALUES (?, ?)"
        );
    }

    #[test]
    fn test_insert_without_table_keeps_fragment() {
        let query = insert::<SimpleTable>();
        assert_eq!(query.to_sql().unwrap(), "(`field0`, `field1`) VALUES (?, ?)");
    }

    #[test]
    fn test_insert_without_tagged_columns() {
        let query = insert::<Empty>().into("T");
        assert_eq!(query.to_sql().unwrap(), "INSERT INTO `T` () VALUES ()");
    }

    #[test]
    fn test_into_empty_table_is_sticky() {
        let query = insert::<SimpleTable>().into("").into("T");
        assert_eq!(query.error(), Some(&BuildError::NoIntoTable));
        assert!(query.to_sql().is_err());
    }

    #[tokio::test]
    async fn test_exec_binds_values_without_primary_key() {
        let mut executor = RecordingExecutor::default();
        let record = SimpleTable {
            id: 99,
            field0: "hello".to_string(),
            field1: 2.5,
        };

        let result = insert::<SimpleTable>()
            .into("T")
            .exec(&mut executor, &record)
            .await
            .unwrap();

        assert_eq!(result.rows_affected, 1);
        assert_eq!(
            executor.last(),
            Some(&(
                "INSERT INTO `T` (`field0`, `field1`) VALUES (?, ?)".to_string(),
                vec![Value::from("hello"), Value::F64(2.5)]
            ))
        );
    }

    #[tokio::test]
    async fn test_exec_requires_table() {
        let mut executor = RecordingExecutor::default();
        let err = insert::<SimpleTable>()
            .exec(&mut executor, &SimpleTable::default())
            .await
            .unwrap_err();

        assert_eq!(err.build_error(), Some(&BuildError::NoIntoTable));
        assert!(executor.statements.is_empty());
    }

    #[derive(Debug, Default)]
    struct Detached {
        id: i64,
    }

    impl Record for Detached {
        const FIELDS: &'static [FieldMeta] =
            &[FieldMeta::new("id", "id"), FieldMeta::new("owner", "owner")];

        fn column_value(&self, column: &str) -> Option<Value> {
            (column == "id").then(|| Value::from(self.id))
        }

        fn scan_targets(&mut self) -> Vec<&mut dyn ScanTarget> {
            vec![&mut self.id]
        }

        fn record_name() -> &'static str {
            "Detached"
        }
    }

    #[tokio::test]
    async fn test_exec_rejects_record_without_column_value() {
        let mut executor = RecordingExecutor::default();
        let err = insert::<Detached>()
            .into("T")
            .exec(&mut executor, &Detached { id: 3 })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::ColumnNotFound { ref column, .. } if column == "owner"
        ));
        assert!(executor.statements.is_empty());
    }
}
