//! DELETE query builder module

use super::common::{quote, QueryBuilder, Statement};
use crate::{BuildError, Error, ExecResult, Executor, Result, Value};

/// DELETE query builder
#[derive(Debug, Clone)]
pub struct DeleteQuery {
    stmt: Statement,
}

impl DeleteQuery {
    pub fn new(table: &str) -> Self {
        Self {
            stmt: Statement::new(format!("DELETE FROM {}", quote(table))),
        }
    }

    /// Add a WHERE clause
    ///
    /// # Examples
    /// ```
    /// use tagsql_core::{delete, QueryBuilder};
    ///
    /// let query = delete("sessions").where_("`expires_at` < ?").limit("100");
    /// assert_eq!(
    ///     query.to_sql().unwrap(),
    ///     "DELETE FROM `sessions` WHERE `expires_at` < ? LIMIT 100"
    /// );
    /// ```
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

    /// Execute with `args` bound positionally
    pub async fn exec<E: Executor>(self, executor: &mut E, args: &[Value]) -> Result<ExecResult> {
        let sql = self.stmt.into_sql()?;
        executor
            .execute(&sql, args)
            .await
            .map_err(|e| Error::statement(&sql, e))
    }
}

impl QueryBuilder for DeleteQuery {
    fn to_sql(&self) -> Result<String> {
        self.stmt.to_sql()
    }

    fn error(&self) -> Option<&BuildError> {
        self.stmt.error.as_ref()
    }
}
