//! SELECT query builder implementation

use std::fmt;
use std::marker::PhantomData;

use super::common::{quote_list, QueryBuilder, Statement};
use crate::record::{columns, ColumnOptions};
use crate::{mapper, BuildError, Error, Executor, Record, Result, Value};

/// SELECT query builder for record type `R`
///
/// The column list comes from `R`'s tagged fields, primary key included, so
/// every selected row scans straight back into an `R`.
pub struct SelectQuery<R> {
    stmt: Statement,
    table_set: bool,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> SelectQuery<R> {
    /// Create a new SELECT builder listing the columns of `R`
    pub fn new() -> Self {
        let cols: Vec<_> = columns::<R>(ColumnOptions::ALL)
            .into_iter()
            .map(|c| c.name)
            .collect();

        Self {
            stmt: Statement::new(format!("SELECT {}", quote_list(&cols))),
            table_set: false,
            _record: PhantomData,
        }
    }
}

impl<R: Record> Default for SelectQuery<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> SelectQuery<R> {
    /// Add the FROM clause
    ///
    /// # Examples
    /// ```
    /// tagsql_core::record! {
    ///     #[derive(Debug, Default)]
    ///     struct User {
    ///         #[column = "id"]
    ///         id: i64,
    ///         #[column = "name"]
    ///         name: String,
    ///     }
    /// }
    ///
    /// use tagsql_core::{select, QueryBuilder};
    ///
    /// let query = select::<User>().from(&["users"]).where_("`id` = ?");
    /// assert_eq!(query.to_sql().unwrap(), "SELECT `id`, `name` FROM `users` WHERE `id` = ?");
    /// ```
    pub fn from(mut self, tables: &[&str]) -> Self {
        if self.stmt.failed() {
            return self;
        }
        if tables.is_empty() {
            self.stmt.fail(BuildError::NoTablesUsed);
            return self;
        }

        self.stmt.sql.push_str(" FROM ");
        self.stmt.sql.push_str(&quote_list(tables));
        self.table_set = true;
        self
    }

    /// Add a WHERE clause; the condition is used verbatim
    pub fn where_(mut self, condition: &str) -> Self {
        self.stmt.push_clause("WHERE", condition);
        self
    }

    pub fn group_by(mut self, columns: &str) -> Self {
        self.stmt.push_clause("GROUP BY", columns);
        self
    }

    pub fn having(mut self, condition: &str) -> Self {
        self.stmt.push_clause("HAVING", condition);
        self
    }

    pub fn order_by(mut self, ordering: &str) -> Self {
        self.stmt.push_clause("ORDER BY", ordering);
        self
    }

    pub fn limit(mut self, limit: &str) -> Self {
        self.stmt.push_clause("LIMIT", limit);
        self
    }

    /// Lock the selected rows for the rest of the transaction
    pub fn for_update(mut self) -> Self {
        if !self.stmt.failed() {
            self.stmt.sql.push_str(" FOR UPDATE");
        }
        self
    }

    fn checked_sql(self) -> Result<String> {
        let sql = self.stmt.into_sql()?;
        if !self.table_set {
            return Err(BuildError::NoTablesUsed.into());
        }
        Ok(sql)
    }
}

impl<R: Record> SelectQuery<R> {
    /// Run the query and map every returned row into an `R`
    ///
    /// Failures from the executor, the mapper or the cursor itself come back
    /// wrapped in [`Error::Statement`] with the SQL text attached.
    pub async fn query<E: Executor>(self, executor: &mut E, args: &[Value]) -> Result<Vec<R>> {
        let sql = self.checked_sql()?;

        let rows = async {
            let mut cursor = executor.query(&sql, args).await?;
            mapper::iterate::<R, _>(&mut cursor).collect::<Result<Vec<R>>>()
        }
        .await;

        rows.map_err(|e| Error::statement(&sql, e))
    }

    /// Run the query and map its first row, `Ok(None)` when nothing matched
    pub async fn query_row<E: Executor>(
        self,
        executor: &mut E,
        args: &[Value],
    ) -> Result<Option<R>> {
        let sql = self.checked_sql()?;

        let row = async {
            match executor.query_one(&sql, args).await? {
                Some(row) => mapper::scan::<R, _>(&row).map(Some),
                None => Ok(None),
            }
        }
        .await;

        row.map_err(|e| Error::statement(&sql, e))
    }
}

impl<R> QueryBuilder for SelectQuery<R> {
    fn to_sql(&self) -> Result<String> {
        self.stmt.to_sql()
    }

    fn error(&self) -> Option<&BuildError> {
        self.stmt.error.as_ref()
    }
}

impl<R> Clone for SelectQuery<R> {
    fn clone(&self) -> Self {
        Self {
            stmt: self.stmt.clone(),
            table_set: self.table_set,
            _record: PhantomData,
        }
    }
}

impl<R> fmt::Debug for SelectQuery<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectQuery")
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
    use crate::select;

    #[test]
    fn test_select_lists_tagged_columns() {
        let query = select::<SimpleTable>().from(&["T"]);
        assert_eq!(
            query.to_sql().unwrap(),
            "SELECT `id`, `field0`, `field1` FROM `T`"
        );
    }

    #[test]
    fn test_select_without_tagged_columns() {
        let query = select::<Empty>().from(&["T"]);
        assert_eq!(query.to_sql().unwrap(), "SELECT  FROM `T`");
    }

    #[test]
    fn test_select_multiple_tables() {
        let query = select::<SimpleTable>().from(&["T1", "T2"]);
        assert!(query.to_sql().unwrap().ends_with(" FROM `T1`, `T2`"));
    }

    #[test]
    fn test_select_all_clauses() {
        let query = select::<SimpleTable>()
            .from(&["T"])
            .where_("`field1` > ?")
            .group_by("`field0`")
            .having("COUNT(*) > 1")
            .order_by("`id` DESC")
            .limit("10")
            .for_update();

        assert_eq!(
            query.to_sql().unwrap(),
            "SELECT `id`, `field0`, `field1` FROM `T` WHERE `field1` > ? GROUP BY `field0` \
             HAVING COUNT(*) > 1 ORDER BY `id` DESC LIMIT 10 FOR UPDATE"
        );
    }

    #[test]
    fn test_empty_clauses_are_ignored() {
        let base = select::<SimpleTable>().from(&["T"]);
        let query = base
            .clone()
            .where_("")
            .group_by("")
            .having("")
            .order_by("")
            .limit("");

        assert_eq!(query.to_sql().unwrap(), base.to_sql().unwrap());
        assert!(query.error().is_none());
    }

    #[test]
    fn test_from_without_tables_is_sticky() {
        let query = select::<SimpleTable>()
            .from(&[])
            .from(&["T"])
            .where_("`id` = ?")
            .for_update();

        assert_eq!(query.error(), Some(&BuildError::NoTablesUsed));
        assert_eq!(query.stmt.sql, "SELECT `id`, `field0`, `field1`");
        assert!(matches!(
            query.to_sql(),
            Err(Error::InvalidQuery(BuildError::NoTablesUsed))
        ));
    }

    #[tokio::test]
    async fn test_query_requires_tables() {
        let mut executor = RecordingExecutor::default();
        let result = select::<SimpleTable>()
            .where_("`id` = ?")
            .query(&mut executor, &[Value::I64(1)])
            .await;

        assert!(matches!(
            result,
            Err(Error::InvalidQuery(BuildError::NoTablesUsed))
        ));
        assert!(executor.statements.is_empty());
    }

    #[tokio::test]
    async fn test_query_maps_rows() {
        let mut executor = RecordingExecutor::with_rows(vec![
            vec![Value::I64(1), Value::from("a"), Value::F64(0.5)],
            vec![Value::I64(2), Value::from("b"), Value::F64(1.5)],
        ]);

        let found = select::<SimpleTable>()
            .from(&["T"])
            .where_("`field1` > ?")
            .query(&mut executor, &[Value::F64(0.0)])
            .await
            .unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[1].field0, "b");
        assert_eq!(
            executor.last(),
            Some(&(
                "SELECT `id`, `field0`, `field1` FROM `T` WHERE `field1` > ?".to_string(),
                vec![Value::F64(0.0)]
            ))
        );
    }

    #[tokio::test]
    async fn test_query_wraps_scan_failure() {
        let mut executor =
            RecordingExecutor::with_rows(vec![vec![Value::from("x"), Value::from("a"), Value::F64(0.5)]]);

        let err = select::<SimpleTable>()
            .from(&["T"])
            .query(&mut executor, &[])
            .await
            .unwrap_err();

        match err {
            Error::Statement { sql, source } => {
                assert_eq!(sql, "SELECT `id`, `field0`, `field1` FROM `T`");
                assert!(matches!(*source, Error::Decode { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_query_wraps_cursor_error() {
        let mut executor = RecordingExecutor::failing_after(
            vec![vec![Value::I64(1), Value::from("a"), Value::F64(0.5)]],
            Error::config("connection reset"),
        );

        let err = select::<SimpleTable>()
            .from(&["T"])
            .query(&mut executor, &[])
            .await
            .unwrap_err();

        match err {
            Error::Statement { sql, source } => {
                assert_eq!(sql, "SELECT `id`, `field0`, `field1` FROM `T`");
                assert!(matches!(*source, Error::Config { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_query_row_without_rows() {
        let mut executor = RecordingExecutor::default();
        let found = tokio_test::block_on(
            select::<SimpleTable>()
                .from(&["T"])
                .where_("`id` = ?")
                .query_row(&mut executor, &[Value::I64(404)]),
        )
        .unwrap();

        assert!(found.is_none());
        assert_eq!(executor.statements.len(), 1);
    }

    #[tokio::test]
    async fn test_query_row_returns_first_row() {
        let mut executor =
            RecordingExecutor::with_rows(vec![vec![Value::I64(7), Value::from("seven"), Value::F64(7.0)]]);

        let found = select::<SimpleTable>()
            .from(&["T"])
            .query_row(&mut executor, &[])
            .await
            .unwrap();

        assert_eq!(
            found,
            Some(SimpleTable {
                id: 7,
                field0: "seven".to_string(),
                field1: 7.0,
            })
        );
    }
}
