//! UPDATE query builder module

use super::common::{quote, quote_list, QueryBuilder, Statement};
use crate::record::{columns, ColumnOptions};
use crate::{BuildError, Error, ExecResult, Executor, Record, Result, Value};

/// UPDATE query builder
///
/// Assignments are bound positionally from a record at execution time, in
/// the order their columns were passed to [`UpdateQuery::set`].
#[derive(Debug, Clone)]
pub struct UpdateQuery {
    stmt: Statement,
    set_columns: Vec<String>,
    multiple_tables: bool,
}

impl UpdateQuery {
    /// Create a new UPDATE query builder
    pub fn new(table: &str) -> Self {
        Self {
            stmt: Statement::new(format!("UPDATE {}", quote(table))),
            set_columns: Vec::new(),
            multiple_tables: false,
        }
    }

    /// Create an UPDATE over several tables
    pub fn multiple(tables: &[&str]) -> Self {
        let mut query = Self {
            stmt: Statement::new(format!("UPDATE {}", quote_list(tables))),
            set_columns: Vec::new(),
            multiple_tables: true,
        };
        if tables.is_empty() {
            query.stmt.fail(BuildError::NoTablesUsed);
        }
        query
    }

    /// Assign placeholders to the given columns
    ///
    /// A `table.column` entry is rendered as `` `table`.`column` `` and only
    /// the column part is remembered for binding.
    ///
    /// # Examples
    /// ```
    /// use tagsql_core::{update, QueryBuilder};
    ///
    /// let query = update("users").set(&["name", "email"]).where_("`id` = ?");
    /// assert_eq!(
    ///     query.to_sql().unwrap(),
    ///     "UPDATE `users` SET `name` = ?, `email` = ? WHERE `id` = ?"
    /// );
    /// ```
    pub fn set<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        if self.stmt.failed() {
            return self;
        }
        if columns.is_empty() {
            self.stmt.fail(BuildError::NoSetColumns);
            return self;
        }

        let mut assignments = Vec::with_capacity(columns.len());
        for column in columns {
            let column = column.as_ref();
            match column.split_once('.') {
                Some((table, name)) => {
                    assignments.push(format!("{}.{} = ?", quote(table), quote(name)));
                    self.set_columns.push(name.to_string());
                }
                None => {
                    assignments.push(format!("{} = ?", quote(column)));
                    self.set_columns.push(column.to_string());
                }
            }
        }

        self.stmt.push_clause("SET", &assignments.join(", "));
        self
    }

    /// Assign every tagged column of `R` except the primary key
    ///
    /// Only valid for single-table updates.
    pub fn set_all<R: Record>(mut self, _record: &R) -> Self {
        if self.stmt.failed() {
            return self;
        }
        if self.multiple_tables {
            self.stmt.fail(BuildError::InappropriateSetAllUsage);
            return self;
        }

        let names: Vec<&str> = columns::<R>(ColumnOptions::WITHOUT_PRIMARY_KEY)
            .into_iter()
            .map(|c| c.name)
            .collect();
        self.set(&names)
    }

    /// Add a WHERE clause
    pub fn where_(mut self, condition: &str) -> Self {
        self.stmt.push_clause("WHERE", condition);
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

    /// Columns bound from the record, in placeholder order
    pub fn set_columns(&self) -> &[String] {
        &self.set_columns
    }

    /// Bind the set-columns from `record`, then `args`, and execute
    ///
    /// Every set-column must be tagged on `R`; `args` fill the placeholders
    /// of the WHERE/ORDER BY/LIMIT clauses.
    pub async fn exec<E, R>(self, executor: &mut E, record: &R, args: &[Value]) -> Result<ExecResult>
    where
        E: Executor,
        R: Record,
    {
        let sql = self.stmt.into_sql()?;
        if self.set_columns.is_empty() {
            return Err(BuildError::NoSetColumns.into());
        }

        let mut values = Vec::with_capacity(self.set_columns.len() + args.len());
        for column in &self.set_columns {
            let value = record
                .column_value(column)
                .ok_or_else(|| Error::column_not_found(R::record_name(), column.as_str()))?;
            values.push(value);
        }
        values.extend_from_slice(args);

        executor
            .execute(&sql, &values)
            .await
            .map_err(|e| Error::statement(&sql, e))
    }
}

impl QueryBuilder for UpdateQuery {
    fn to_sql(&self) -> Result<String> {
        self.stmt.to_sql()
    }

    fn error(&self) -> Option<&BuildError> {
        self.stmt.error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::testing::{RecordingExecutor, SimpleTable};
    use crate::{update, update_multiple};

    #[test]
    fn test_set_without_columns() {
        let query = update("T").set::<&str>(&[]);
        assert_eq!(query.error(), Some(&BuildError::NoSetColumns));
        assert!(query.to_sql().is_err());
    }

    #[test]
    fn test_set_columns() {
        let query = update("T").set(&["a", "b"]);
        assert_eq!(query.to_sql().unwrap(), "UPDATE `T` SET `a` = ?, `b` = ?");
        assert_eq!(query.set_columns(), ["a", "b"]);
    }

    #[test]
    fn test_set_all_uses_record_columns() {
        let query = update("T").set_all(&SimpleTable::default()).where_("`id` = ?");
        assert_eq!(
            query.to_sql().unwrap(),
            "UPDATE `T` SET `field0` = ?, `field1` = ? WHERE `id` = ?"
        );
        assert_eq!(query.set_columns(), ["field0", "field1"]);
    }

    #[test]
    fn test_set_all_on_multiple_tables() {
        let query = update_multiple(&["T1", "T2"]).set_all(&SimpleTable::default());
        assert_eq!(query.error(), Some(&BuildError::InappropriateSetAllUsage));
        assert!(query.to_sql().is_err());
    }

    #[test]
    fn test_set_qualified_column_on_multiple_tables() {
        let query = update_multiple(&["T1", "T2"]).set(&["T2.field0"]);
        assert_eq!(
            query.to_sql().unwrap(),
            "UPDATE `T1`, `T2` SET `T2`.`field0` = ?"
        );
        assert_eq!(query.set_columns(), ["field0"]);
    }

    #[test]
    fn test_update_multiple_without_tables() {
        let query = update_multiple(&[]).set(&["a"]);
        assert_eq!(query.error(), Some(&BuildError::NoTablesUsed));
    }

    #[test]
    fn test_clauses_and_empty_arguments() {
        let query = update("T")
            .set(&["a"])
            .where_("")
            .order_by("")
            .limit("")
            .where_("`id` > ?")
            .order_by("`id`")
            .limit("5");

        assert_eq!(
            query.to_sql().unwrap(),
            "UPDATE `T` SET `a` = ? WHERE `id` > ? ORDER BY `id` LIMIT 5"
        );
    }

    #[tokio::test]
    async fn test_exec_binds_set_columns_then_args() {
        let mut executor = RecordingExecutor::default();
        let record = SimpleTable {
            id: 3,
            field0: "renamed".to_string(),
            field1: 4.5,
        };

        update("T")
            .set(&["field1", "field0"])
            .where_("`id` = ?")
            .exec(&mut executor, &record, &[Value::I64(3)])
            .await
            .unwrap();

        assert_eq!(
            executor.last(),
            Some(&(
                "UPDATE `T` SET `field1` = ?, `field0` = ? WHERE `id` = ?".to_string(),
                vec![Value::F64(4.5), Value::from("renamed"), Value::I64(3)]
            ))
        );
    }

    #[tokio::test]
    async fn test_exec_without_set_columns() {
        let mut executor = RecordingExecutor::default();
        let err = update("T")
            .where_("`id` = ?")
            .exec(&mut executor, &SimpleTable::default(), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidQuery(BuildError::NoSetColumns)));
        assert!(executor.statements.is_empty());
    }

    #[tokio::test]
    async fn test_exec_with_unknown_column() {
        let mut executor = RecordingExecutor::default();
        let err = update("T")
            .set(&["missing"])
            .exec(&mut executor, &SimpleTable::default(), &[])
            .await
            .unwrap_err();

        match err {
            Error::ColumnNotFound { column, .. } => assert_eq!(column, "missing"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(executor.statements.is_empty());
    }
}
