//! Common types and helpers shared across all statement builders

use crate::{BuildError, Result};

/// Core trait for all statement builders
pub trait QueryBuilder {
    /// Generate the SQL text, or the first error recorded while chaining
    fn to_sql(&self) -> Result<String>;

    /// The first error recorded while chaining, if any
    fn error(&self) -> Option<&BuildError>;
}

/// SQL text under construction plus the sticky error
///
/// Once `error` is set every mutating helper becomes a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Statement {
    pub(crate) sql: String,
    pub(crate) error: Option<BuildError>,
}

impl Statement {
    pub(crate) fn new(sql: String) -> Self {
        Self { sql, error: None }
    }

    pub(crate) fn failed(&self) -> bool {
        self.error.is_some()
    }

    /// Record `error` unless an earlier one is already stored
    pub(crate) fn fail(&mut self, error: BuildError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Append ` KEYWORD condition`; empty conditions are ignored
    pub(crate) fn push_clause(&mut self, keyword: &str, condition: &str) {
        if self.failed() || condition.is_empty() {
            return;
        }

        self.sql.push(' ');
        self.sql.push_str(keyword);
        self.sql.push(' ');
        self.sql.push_str(condition);
    }

    pub(crate) fn to_sql(&self) -> Result<String> {
        match &self.error {
            Some(err) => Err(err.clone().into()),
            None => Ok(self.sql.clone()),
        }
    }

    /// Hand over the finished SQL for execution
    pub(crate) fn into_sql(self) -> Result<String> {
        match self.error {
            Some(err) => Err(err.into()),
            None => Ok(self.sql),
        }
    }
}

/// Wrap an identifier in backticks
pub(crate) fn quote(identifier: &str) -> String {
    format!("`{identifier}`")
}

/// Quote and comma-join a list of identifiers
pub(crate) fn quote_list<S: AsRef<str>>(identifiers: &[S]) -> String {
    identifiers
        .iter()
        .map(|identifier| quote(identifier.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `?, ?, ...` with one placeholder per column
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
