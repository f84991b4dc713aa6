//! Quarry Core - a small SELECT builder that maps rows onto your structs
//!
//! Queries are described fluently, typed conditions are compiled into SQL
//! fragments with `?` placeholders, placeholders are rebound for the active
//! dialect, and the result rows are bound to struct fields by column name.

pub mod error;
pub mod value;
pub mod condition;
pub mod placeholder;
pub mod executor;
pub mod mapper;
pub mod query;

#[cfg(test)]
mod testing;

// Re-export main types
pub use error::{Error, Result};
pub use value::{Value, FromValue};
pub use condition::{cond, compile, CompiledFragment, Condition, Fields};
pub use placeholder::{rebind, Driver};
pub use executor::{BufferedRows, Executor, Row, RowCursor};
pub use mapper::{Bindable, Destination, FieldBinding};
pub use query::{Db, IntoColumns, Query};

#[cfg(any(feature = "postgres", feature = "mysql", feature = "sqlite"))]
pub use executor::any::SqlxPool;
