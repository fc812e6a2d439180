//! sqlx-backed executor over the `Any` driver
//!
//! Statements use `?` placeholders, so the adapter targets the MySQL and
//! SQLite drivers (enable the `mysql` or `sqlite` feature). On SQLite, declare
//! boolean columns as `INTEGER`: the `Any` driver cannot fetch `BOOLEAN`.

use sqlx::any::{install_default_drivers, Any, AnyArguments, AnyRow};
use sqlx::query::Query;
use sqlx::{AnyConnection, AnyPool, Column, Row, TypeInfo, ValueRef};

use crate::executor::{ConnectionPool, ExecResult, Executor, Transaction};
use crate::scan::fill_targets;
use crate::{Cursor, DatabaseConfig, Error, Result, RowSource, ScanTarget, Value};

/// Connection pool wrapper
#[derive(Debug, Clone)]
pub struct Database {
    pool: AnyPool,
}

impl Database {
    /// Open a pool from `config`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        config.validate()?;
        install_default_drivers();

        let pool = config.pool_options().connect(&config.url).await?;
        tracing::debug!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "database pool opened"
        );
        Ok(Self { pool })
    }

    /// Create from an existing AnyPool
    pub fn from_pool(pool: AnyPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Close every connection; later statements fail
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl Executor for Database {
    type Cursor = SqlxCursor;
    type Row = SqlxRow;

    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        tracing::debug!(sql, args = params.len(), "execute");
        let mut conn = self.pool.acquire().await?;
        execute_on(&mut conn, sql, params).await
    }

    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Self::Cursor> {
        tracing::debug!(sql, args = params.len(), "query");
        let rows = bind_values(sqlx::query(sql), params)
            .fetch_all(&self.pool)
            .await?;
        Ok(SqlxCursor::new(rows))
    }

    async fn query_one(&mut self, sql: &str, params: &[Value]) -> Result<Option<Self::Row>> {
        tracing::debug!(sql, args = params.len(), "query one");
        let row = bind_values(sqlx::query(sql), params)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(SqlxRow))
    }
}

impl ConnectionPool for Database {
    type Transaction = DatabaseTransaction;

    async fn begin(&self) -> Result<Self::Transaction> {
        let inner = self.pool.begin().await?;
        tracing::debug!("begin");
        Ok(DatabaseTransaction { inner })
    }
}

/// Transaction wrapper
///
/// Dropping it without [`Transaction::commit`] rolls it back.
pub struct DatabaseTransaction {
    inner: sqlx::Transaction<'static, Any>,
}

impl Executor for DatabaseTransaction {
    type Cursor = SqlxCursor;
    type Row = SqlxRow;

    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        tracing::debug!(sql, args = params.len(), "execute in transaction");
        execute_on(&mut self.inner, sql, params).await
    }

    async fn query(&mut self, sql: &str, params: &[Value]) -> Result<Self::Cursor> {
        tracing::debug!(sql, args = params.len(), "query in transaction");
        let rows = bind_values(sqlx::query(sql), params)
            .fetch_all(&mut *self.inner)
            .await?;
        Ok(SqlxCursor::new(rows))
    }

    async fn query_one(&mut self, sql: &str, params: &[Value]) -> Result<Option<Self::Row>> {
        tracing::debug!(sql, args = params.len(), "query one in transaction");
        let row = bind_values(sqlx::query(sql), params)
            .fetch_optional(&mut *self.inner)
            .await?;
        Ok(row.map(SqlxRow))
    }
}

impl Transaction for DatabaseTransaction {
    async fn commit(self) -> Result<()> {
        self.inner.commit().await?;
        tracing::debug!("commit");
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.inner.rollback().await?;
        tracing::debug!("rollback");
        Ok(())
    }
}

/// Execute on one connection so the insert id can be read back from it
///
/// The SQLite backend of the `Any` driver never reports an insert id, so
/// after an INSERT it is fetched with `last_insert_rowid()`.
async fn execute_on(conn: &mut AnyConnection, sql: &str, params: &[Value]) -> Result<ExecResult> {
    let result = bind_values(sqlx::query(sql), params)
        .execute(&mut *conn)
        .await?;

    let mut last_insert_id = result.last_insert_id();
    if last_insert_id.is_none() && conn.backend_name() == "SQLite" && is_insert(sql) {
        let row = sqlx::query("SELECT last_insert_rowid()")
            .fetch_one(&mut *conn)
            .await?;
        last_insert_id = Some(row.try_get::<i64, _>(0)?);
    }

    Ok(ExecResult {
        rows_affected: result.rows_affected(),
        last_insert_id,
    })
}

fn is_insert(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("INSERT"))
}

/// Bind values to a sqlx query in placeholder order
fn bind_values<'q>(
    mut query: Query<'q, Any, AnyArguments<'q>>,
    params: &[Value],
) -> Query<'q, Any, AnyArguments<'q>> {
    for param in params {
        query = match param.clone() {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(b),
            Value::I32(i) => query.bind(i),
            Value::I64(i) => query.bind(i),
            Value::U64(u) => match i64::try_from(u) {
                Ok(i) => query.bind(i),
                Err(_) => query.bind(u.to_string()),
            },
            Value::F32(f) => query.bind(f),
            Value::F64(f) => query.bind(f),
            Value::String(s) => query.bind(s),
            Value::Bytes(b) => query.bind(b),
            Value::Json(j) => query.bind(j.to_string()),
        };
    }
    query
}

/// A single row fetched through sqlx
pub struct SqlxRow(AnyRow);

impl SqlxRow {
    pub fn into_inner(self) -> AnyRow {
        self.0
    }
}

impl RowSource for SqlxRow {
    fn scan_into(&self, dest: &mut [&mut dyn ScanTarget]) -> Result<()> {
        let columns: Vec<&str> = self.0.columns().iter().map(|c| c.name()).collect();
        fill_targets(&columns, dest, |i| decode_column(&self.0, i))
    }
}

/// Decode one column by the type the driver reports for it
fn decode_column(row: &AnyRow, index: usize) -> Result<Value> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }

    let type_info = raw.type_info();
    let value = match type_info.name() {
        "BOOLEAN" => Value::Bool(row.try_get(index)?),
        "SMALLINT" => Value::I32(row.try_get::<i16, _>(index)?.into()),
        "INTEGER" => Value::I32(row.try_get(index)?),
        "BIGINT" => Value::I64(row.try_get(index)?),
        "REAL" => Value::F32(row.try_get(index)?),
        "DOUBLE" => Value::F64(row.try_get(index)?),
        "TEXT" => Value::String(row.try_get(index)?),
        "BLOB" => Value::Bytes(row.try_get(index)?),
        "NULL" => Value::Null,
        other => {
            tracing::debug!(column_type = other, "unsupported column type");
            return Err(Error::type_mismatch("a supported column type", "unsupported"));
        }
    };
    Ok(value)
}

/// Fully buffered result set
///
/// Rows are decoded lazily as the cursor advances.
pub struct SqlxCursor {
    rows: std::vec::IntoIter<AnyRow>,
    current: Option<SqlxRow>,
}

impl SqlxCursor {
    fn new(rows: Vec<AnyRow>) -> Self {
        Self {
            rows: rows.into_iter(),
            current: None,
        }
    }
}

impl RowSource for SqlxCursor {
    fn scan_into(&self, dest: &mut [&mut dyn ScanTarget]) -> Result<()> {
        match &self.current {
            Some(row) => row.scan_into(dest),
            None => Err(Error::NoCurrentRow),
        }
    }
}

impl Cursor for SqlxCursor {
    fn advance(&mut self) -> bool {
        self.current = self.rows.next().map(SqlxRow);
        self.current.is_some()
    }

    fn take_error(&mut self) -> Option<Error> {
        None
    }
}
