//! Record descriptors and the column metadata derived from them
//!
//! A record is a struct whose fields optionally carry a column tag. The tags
//! drive every generated clause: SELECT lists, INSERT columns and values,
//! `set_all` assignments and the scan destinations of the row mapper. Use the
//! [`record!`](crate::record) macro to declare one, or implement [`Record`] by
//! hand.

use crate::{Error, Result, ScanTarget, Value};

/// Column reserved for the primary key; skipped by INSERT and `set_all`
pub const PRIMARY_KEY: &str = "id";

/// One declared field of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMeta {
    /// Rust field name
    pub name: &'static str,
    /// Column tag; empty when the field is not mapped
    pub column: &'static str,
}

impl FieldMeta {
    pub const fn new(name: &'static str, column: &'static str) -> Self {
        Self { name, column }
    }

    pub fn is_tagged(&self) -> bool {
        !self.column.is_empty()
    }
}

/// A struct mapped to table columns through per-field tags
///
/// Implementations must keep three views in agreement: `FIELDS` lists every
/// field in declaration order, `column_value` answers for every tagged column,
/// and `scan_targets` yields exactly the tagged fields in declaration order.
pub trait Record: Default + Send + Sync {
    /// All declared fields, in declaration order
    const FIELDS: &'static [FieldMeta];

    /// Bind value of the field tagged `column`, or `None` if no field carries it
    fn column_value(&self, column: &str) -> Option<Value>;

    /// Scan destinations for every tagged field, in declaration order
    fn scan_targets(&mut self) -> Vec<&mut dyn ScanTarget>;

    /// Name used in error messages
    fn record_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A tagged field selected by [`columns`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Position of the field in declaration order
    pub index: usize,
    pub name: &'static str,
}

/// Controls which tagged fields [`columns`] returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnOptions {
    pub exclude_primary_key: bool,
}

impl ColumnOptions {
    /// Every tagged field, primary key included (SELECT, scanning)
    pub const ALL: Self = Self {
        exclude_primary_key: false,
    };

    /// Tagged fields without the primary key (INSERT, `set_all`)
    pub const WITHOUT_PRIMARY_KEY: Self = Self {
        exclude_primary_key: true,
    };
}

/// Tagged columns of `R` in declaration order
pub fn columns<R: Record>(opts: ColumnOptions) -> Vec<Column> {
    columns_of(R::FIELDS, opts)
}

/// Tagged columns of a field list in declaration order
pub fn columns_of(fields: &[FieldMeta], opts: ColumnOptions) -> Vec<Column> {
    fields
        .iter()
        .enumerate()
        .filter(|(_, field)| field.is_tagged())
        .filter(|(_, field)| !(opts.exclude_primary_key && field.column == PRIMARY_KEY))
        .map(|(index, field)| Column {
            index,
            name: field.column,
        })
        .collect()
}

/// Values of `record` for the given columns, in the same order
///
/// Fails with [`Error::ColumnNotFound`] when the record has no value for one
/// of them.
pub(crate) fn column_values<R: Record>(record: &R, columns: &[Column]) -> Result<Vec<Value>> {
    columns
        .iter()
        .map(|column| {
            record
                .column_value(column.name)
                .ok_or_else(|| Error::column_not_found(R::record_name(), column.name))
        })
        .collect()
}

/// Declare a struct together with its [`Record`] implementation
///
/// Fields annotated with `#[column = "..."]` are mapped; the rest, including
/// fields tagged with an empty string, are carried along but never appear in
/// SQL. Other field attributes and doc comments pass through to the struct.
/// Mapped field types must implement `Clone`, `Into<Value>` and
/// [`ScanTarget`].
///
/// # Examples
/// ```
/// tagsql_core::record! {
///     #[derive(Debug, Clone, Default, PartialEq)]
///     pub struct User {
///         #[column = "id"]
///         pub id: i64,
///         /// Display name
///         #[column = "name"]
///         pub name: String,
///         pub cached_score: f64,
///     }
/// }
///
/// use tagsql_core::{columns, ColumnOptions};
///
/// let cols = columns::<User>(ColumnOptions::WITHOUT_PRIMARY_KEY);
/// assert_eq!(cols.len(), 1);
/// assert_eq!(cols[0].name, "name");
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($body:tt)*
        }
    ) => {
        $crate::__record_fields! {
            @head { [$(#[$meta])*] [$vis] [$name] }
            @fields []
            @attrs []
            @column []
            @rest $($body)*
        }
    };
}

/// Field parser behind [`record!`]: collects attributes and the column tag
/// of each field, then emits the struct and its `Record` impl.
#[doc(hidden)]
#[macro_export]
macro_rules! __record_fields {
    (
        @head { [$($head_attr:tt)*] [$vis:vis] [$name:ident] }
        @fields [$({
            [$($field_attr:tt)*]
            [$($column:literal)?]
            [$field_vis:vis]
            $field:ident : $ty:ty
        })*]
        @attrs []
        @column []
        @rest
    ) => {
        $($head_attr)*
        $vis struct $name {
            $(
                $($field_attr)*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::Record for $name {
            const FIELDS: &'static [$crate::FieldMeta] = &[
                $($crate::FieldMeta::new(
                    stringify!($field),
                    $crate::__record_column!($($column)?),
                ),)*
            ];

            #[allow(unused_variables)]
            fn column_value(&self, column: &str) -> ::core::option::Option<$crate::Value> {
                $($(
                    if !$column.is_empty() && column == $column {
                        return ::core::option::Option::Some($crate::Value::from(
                            ::core::clone::Clone::clone(&self.$field),
                        ));
                    }
                )?)*
                ::core::option::Option::None
            }

            fn scan_targets(&mut self) -> ::std::vec::Vec<&mut dyn $crate::ScanTarget> {
                #[allow(unused_mut)]
                let mut targets: ::std::vec::Vec<&mut dyn $crate::ScanTarget> =
                    ::std::vec::Vec::new();
                $($(
                    if !$column.is_empty() {
                        targets.push(&mut self.$field);
                    }
                )?)*
                targets
            }
        }
    };

    (
        @head $head:tt
        @fields $fields:tt
        @attrs $attrs:tt
        @column $_old:tt
        @rest #[column = $column:literal] $($rest:tt)*
    ) => {
        $crate::__record_fields! {
            @head $head
            @fields $fields
            @attrs $attrs
            @column [$column]
            @rest $($rest)*
        }
    };

    (
        @head $head:tt
        @fields $fields:tt
        @attrs [$($attr:tt)*]
        @column $column:tt
        @rest #[$($field_attr:tt)*] $($rest:tt)*
    ) => {
        $crate::__record_fields! {
            @head $head
            @fields $fields
            @attrs [$($attr)* #[$($field_attr)*]]
            @column $column
            @rest $($rest)*
        }
    };

    (
        @head $head:tt
        @fields [$($done:tt)*]
        @attrs $attrs:tt
        @column $column:tt
        @rest $field_vis:vis $field:ident : $ty:ty $(, $($rest:tt)*)?
    ) => {
        $crate::__record_fields! {
            @head $head
            @fields [$($done)* { $attrs $column [$field_vis] $field : $ty }]
            @attrs []
            @column []
            @rest $($($rest)*)?
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_column {
    () => {
        ""
    };
    ($column:literal) => {
        $column
    };
}
