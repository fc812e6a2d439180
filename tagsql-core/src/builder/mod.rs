//! Statement builders
//!
//! Each builder accumulates SQL text and the first error recorded while
//! chaining. Execution methods refuse to run a failed or incomplete statement.

pub mod common;
pub mod delete;
pub mod insert;
pub mod select;
pub mod update;

pub use common::QueryBuilder;
pub use delete::DeleteQuery;
pub use insert::InsertQuery;
pub use select::SelectQuery;
pub use update::UpdateQuery;
