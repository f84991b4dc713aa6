//! Row-to-struct mapping
//!
//! A type opts in to mapping by implementing [`Bindable`], which exposes a
//! table of [`FieldBinding`]s: one per field, each with an optional explicit
//! column name and a setter. The [`bindable!`](crate::bindable) macro writes
//! that table, caches it per type, and implements [`Destination`] for the
//! single-struct case. `Vec<T>` is a [`Destination`] for every bindable `T`.
//!
//! ```
//! use quarry_core::bindable;
//!
//! #[derive(Debug, Default)]
//! struct User {
//!     id: i64,
//!     name: String,
//!     created_at: Option<String>,
//! }
//!
//! bindable!(User { id, name, created_at as "created" });
//! ```

use crate::executor::{Row, RowCursor};
use crate::{Error, Result, Value};
use std::collections::HashMap;
use std::future::Future;

/// Describes how one struct field is bound to a result column
pub struct FieldBinding<T> {
    name: &'static str,
    column: Option<&'static str>,
    setter: fn(&mut T, Value) -> Result<()>,
}

impl<T> FieldBinding<T> {
    pub fn new(
        name: &'static str,
        column: Option<&'static str>,
        setter: fn(&mut T, Value) -> Result<()>,
    ) -> Self {
        Self {
            name,
            column,
            setter,
        }
    }

    /// Lower-cased lookup key: the explicit column name if present, else the field name
    pub fn column_key(&self) -> String {
        self.column.unwrap_or(self.name).to_lowercase()
    }

    /// Store `value` into this field of `target`
    pub fn set(&self, target: &mut T, value: Value) -> Result<()> {
        (self.setter)(target, value)
    }
}

impl<T> std::fmt::Debug for FieldBinding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldBinding")
            .field("name", &self.name)
            .field("column", &self.column)
            .finish()
    }
}

/// Types whose fields can be filled from result columns
pub trait Bindable: Default + Send + Sized + 'static {
    /// Field descriptor table for this type, built once
    fn bindings() -> &'static [FieldBinding<Self>];
}

/// Something a query result can be written into
pub trait Destination: Send {
    /// Consume rows from `cursor` into `self`
    fn fill<C: RowCursor>(&mut self, cursor: &mut C) -> impl Future<Output = Result<()>> + Send;
}

impl<T: Bindable> Destination for Vec<T> {
    async fn fill<C: RowCursor>(&mut self, cursor: &mut C) -> Result<()> {
        scan_all(cursor, self).await.map(|_| ())
    }
}

/// Result columns resolved against a type's field bindings, once per mapping call
struct ColumnPlan<T: 'static> {
    columns: Vec<String>,
    slots: Vec<Option<&'static FieldBinding<T>>>,
}

impl<T: Bindable> ColumnPlan<T> {
    fn new(columns: Vec<String>) -> Self {
        let lookup: HashMap<String, &'static FieldBinding<T>> = T::bindings()
            .iter()
            .map(|binding| (binding.column_key(), binding))
            .collect();

        let slots = columns
            .iter()
            .map(|column| {
                let slot = lookup.get(&column.to_lowercase()).copied();
                if slot.is_none() {
                    tracing::trace!(
                        column = %column,
                        destination = std::any::type_name::<T>(),
                        "no field bound to column, value will be discarded"
                    );
                }
                slot
            })
            .collect();

        Self { columns, slots }
    }

    fn bind(&self, target: &mut T, row: Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::ColumnCount {
                expected: self.columns.len(),
                found: row.len(),
            });
        }

        for ((column, slot), value) in self.columns.iter().zip(&self.slots).zip(row) {
            if let Some(binding) = slot {
                binding
                    .set(target, value)
                    .map_err(|err| Error::scan(column.as_str(), err))?;
            }
        }
        Ok(())
    }
}

/// Read exactly one row into `target`.
///
/// Fields without a matching column keep their current value. Fails with
/// [`Error::NoRows`] when the cursor is empty; rows after the first are left
/// unread.
pub async fn scan_into<T, C>(cursor: &mut C, target: &mut T) -> Result<()>
where
    T: Bindable,
    C: RowCursor,
{
    let plan = ColumnPlan::<T>::new(cursor.columns()?);
    match cursor.next_row().await? {
        Some(row) => plan.bind(target, row),
        None => Err(Error::NoRows),
    }
}

/// Read every remaining row, appending one `T::default()`-based item per row.
///
/// Returns the number of rows appended. An empty result is not an error. If a
/// row fails to bind, the items appended before it stay in `dest`.
pub async fn scan_all<T, C>(cursor: &mut C, dest: &mut Vec<T>) -> Result<usize>
where
    T: Bindable,
    C: RowCursor,
{
    let plan = ColumnPlan::<T>::new(cursor.columns()?);
    let mut appended = 0;

    while let Some(row) = cursor.next_row().await? {
        let mut item = T::default();
        plan.bind(&mut item, row)?;
        dest.push(item);
        appended += 1;
    }
    Ok(appended)
}

/// Register a struct's fields for row mapping.
///
/// Each field may carry `as "column"` to name its column explicitly; otherwise
/// the lower-cased field name is used. Field types must implement
/// [`FromValue`](crate::FromValue) and the struct must implement `Default`.
#[macro_export]
macro_rules! bindable {
    (@column) => {
        ::std::option::Option::None
    };
    (@column $column:literal) => {
        ::std::option::Option::Some($column)
    };
    ($ty:ident { $($field:ident $(as $column:literal)?),* $(,)? }) => {
        impl $crate::Bindable for $ty {
            fn bindings() -> &'static [$crate::FieldBinding<Self>] {
                static BINDINGS: ::std::sync::OnceLock<::std::vec::Vec<$crate::FieldBinding<$ty>>> =
                    ::std::sync::OnceLock::new();
                BINDINGS.get_or_init(|| {
                    ::std::vec![$(
                        $crate::FieldBinding::<$ty>::new(
                            ::std::stringify!($field),
                            $crate::bindable!(@column $($column)?),
                            |target: &mut $ty, value: $crate::Value| -> $crate::Result<()> {
                                target.$field = $crate::FromValue::from_value(value)?;
                                ::std::result::Result::Ok(())
                            },
                        ),
                    )*]
                })
            }
        }

        impl $crate::Destination for $ty {
            async fn fill<C: $crate::RowCursor>(&mut self, cursor: &mut C) -> $crate::Result<()> {
                $crate::mapper::scan_into(cursor, self).await
            }
        }
    };
}
