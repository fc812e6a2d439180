//! Statement execution contract and transaction plumbing

use crate::{Cursor, Result, RowSource, Value};
use futures::future::BoxFuture;
use std::future::Future;

/// Summary of a statement that returns no rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    pub last_insert_id: Option<i64>,
}

/// Something that can run parameterized SQL: a pool, a transaction, or a mock
pub trait Executor: Send {
    /// Result set returned by [`Executor::query`]
    type Cursor: Cursor + Send;

    /// Single row returned by [`Executor::query_one`]
    type Row: RowSource + Send;

    /// Execute a statement that returns no rows (INSERT, UPDATE, DELETE)
    fn execute(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<ExecResult>> + Send;

    /// Execute a query that returns any number of rows
    fn query(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Self::Cursor>> + Send;

    /// Execute a query and return its first row, `None` when nothing matched
    fn query_one(
        &mut self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Option<Self::Row>>> + Send;
}

/// Trait for database transactions
pub trait Transaction: Executor {
    /// Commit the transaction
    fn commit(self) -> impl Future<Output = Result<()>> + Send
    where
        Self: Sized;

    /// Rollback the transaction
    fn rollback(self) -> impl Future<Output = Result<()>> + Send
    where
        Self: Sized;
}

/// Trait for database connection pools
///
/// The pool itself is the default connection; transactions share its cursor
/// and row types so either can stand behind a [`Conn`].
pub trait ConnectionPool: Executor + Clone + Sync {
    type Transaction: Transaction<Cursor = Self::Cursor, Row = Self::Row>;

    /// Start a new transaction
    fn begin(&self) -> impl Future<Output = Result<Self::Transaction>> + Send;
}

/// Either the pool's default connection or a caller-supplied transaction
pub enum Conn<'a, P: ConnectionPool> {
    Pool(P),
    Transaction(&'a mut P::Transaction),
}

/// Route statements through `tx` when given, otherwise through `pool`
pub fn resolve<'a, P: ConnectionPool>(pool: &P, tx: Option<&'a mut P::Transaction>) -> Conn<'a, P> {
    match tx {
        Some(tx) => Conn::Transaction(tx),
        None => Conn::Pool(pool.clone()),
    }
}

impl<P: ConnectionPool> Executor for Conn<'_, P> {
    type Cursor = P::Cursor;
    type Row = P::Row;

    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        match self {
            Conn::Pool(pool) => pool.execute(sql, params).await,
            Conn::Transaction(tx) => tx.execute(sql, params).await,
        }
    }

    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Self::Cursor> {
        match self {
            Conn::Pool(pool) => pool.query(sql, params).await,
            Conn::Transaction(tx) => tx.query(sql, params).await,
        }
    }

    async fn query_one(&mut self, sql: &str, params: &[Value]) -> Result<Option<Self::Row>> {
        match self {
            Conn::Pool(pool) => pool.query_one(sql, params).await,
            Conn::Transaction(tx) => tx.query_one(sql, params).await,
        }
    }
}

/// Run `f` inside a transaction
///
/// Commits when `f` succeeds. Any error rolls the transaction back before it
/// is returned; a failed rollback is logged and the original error wins.
///
/// # Examples
/// ```ignore
/// let id = transaction(&db, |tx| Box::pin(async move {
///     let result = insert::<User>().into("users").exec(tx, &user).await?;
///     Ok(result.last_insert_id)
/// })).await?;
/// ```
pub async fn transaction<P, T, F>(pool: &P, f: F) -> Result<T>
where
    P: ConnectionPool,
    F: for<'t> FnOnce(&'t mut P::Transaction) -> BoxFuture<'t, Result<T>>,
{
    let mut txn = pool.begin().await?;
    tracing::debug!("transaction started");

    match f(&mut txn).await {
        Ok(result) => {
            txn.commit().await?;
            tracing::debug!("transaction committed");
            Ok(result)
        }
        Err(e) => {
            match txn.rollback().await {
                Ok(()) => tracing::debug!(error = %e, "transaction rolled back"),
                Err(rollback_err) => {
                    tracing::warn!(error = %e, %rollback_err, "transaction rollback failed")
                }
            }
            Err(e)
        }
    }
}
