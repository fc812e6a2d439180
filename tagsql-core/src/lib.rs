//! tagsql Core - tag-driven SQL statement builder and row mapper
//!
//! Records declare which fields map to which columns; builders turn those
//! declarations into MySQL-style SQL with backtick identifiers and `?`
//! placeholders, and the mapper scans result rows back into records.
//!
//! ```
//! tagsql_core::record! {
//!     #[derive(Debug, Clone, Default, PartialEq)]
//!     pub struct Post {
//!         #[column = "id"]
//!         pub id: i64,
//!         #[column = "title"]
//!         pub title: String,
//!     }
//! }
//!
//! use tagsql_core::{insert, select, QueryBuilder};
//!
//! assert_eq!(
//!     insert::<Post>().into("posts").to_sql().unwrap(),
//!     "INSERT INTO `posts` (`title`) VALUES (?)"
//! );
//! assert_eq!(
//!     select::<Post>().from(&["posts"]).limit("1").to_sql().unwrap(),
//!     "SELECT `id`, `title` FROM `posts` LIMIT 1"
//! );
//! ```

pub mod builder;
pub mod config;
pub mod database;
pub mod error;
pub mod executor;
pub mod mapper;
pub mod record;
pub mod scan;
pub mod value;

// Re-export main types
pub use builder::{DeleteQuery, InsertQuery, QueryBuilder, SelectQuery, UpdateQuery};
pub use config::DatabaseConfig;
pub use database::{Database, DatabaseTransaction, SqlxCursor, SqlxRow};
pub use error::{BuildError, Error, Result};
pub use executor::{resolve, transaction, Conn, ConnectionPool, ExecResult, Executor, Transaction};
pub use mapper::{iterate, scan, Records};
pub use record::{columns, columns_of, Column, ColumnOptions, FieldMeta, Record, PRIMARY_KEY};
pub use scan::{Cursor, RowSource, ScanTarget, ValueCursor, ValueRow};
pub use value::Value;

/// Start a SELECT over the tagged columns of `R`
pub fn select<R: Record>() -> SelectQuery<R> {
    SelectQuery::new()
}

/// Start an INSERT of the tagged columns of `R`, primary key excluded
pub fn insert<R: Record>() -> InsertQuery<R> {
    InsertQuery::new()
}

/// Start an UPDATE of a single table
pub fn update(table: &str) -> UpdateQuery {
    UpdateQuery::new(table)
}

/// Start an UPDATE spanning several tables
pub fn update_multiple(tables: &[&str]) -> UpdateQuery {
    UpdateQuery::multiple(tables)
}

/// Start a DELETE from a table
pub fn delete(table: &str) -> DeleteQuery {
    DeleteQuery::new(table)
}
