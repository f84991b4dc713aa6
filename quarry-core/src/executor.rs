//! Query execution interface
//!
//! The builder never talks to a database directly. It hands rendered SQL and
//! its arguments to an [`Executor`] and reads the result through a
//! [`RowCursor`].

use crate::{Error, Result, Value};
use std::collections::VecDeque;
use std::future::Future;

/// One result row, one value per column
pub type Row = Vec<Value>;

/// Iterator over the rows returned by an executor
pub trait RowCursor: Send {
    /// Column names, in the order values appear in each row
    fn columns(&self) -> Result<Vec<String>>;

    /// Advance to the next row; `None` once the result set is exhausted
    fn next_row(&mut self) -> impl Future<Output = Result<Option<Row>>> + Send;

    /// Release the cursor
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// Trait for anything that can run a SQL query.
///
/// Implementations must be safe to share between tasks; one executor usually
/// backs many concurrent queries.
pub trait Executor: Send + Sync {
    /// The cursor type returned by [`Executor::query`]
    type Rows: RowCursor;

    /// Run `sql` with positional `params` and return a cursor over the result
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Result<Self::Rows>> + Send;

    /// Close the underlying connection or pool
    fn close(&self) -> impl Future<Output = Result<()>> + Send;
}

/// A cursor over a fully fetched result set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferedRows {
    columns: Vec<String>,
    rows: VecDeque<Row>,
    closed: bool,
}

impl BufferedRows {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows: rows.into(),
            closed: false,
        }
    }

    /// Rows not yet returned by [`RowCursor::next_row`]
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::execution("row cursor is closed"))
        } else {
            Ok(())
        }
    }
}

impl RowCursor for BufferedRows {
    fn columns(&self) -> Result<Vec<String>> {
        self.ensure_open()?;
        Ok(self.columns.clone())
    }

    async fn next_row(&mut self) -> Result<Option<Row>> {
        self.ensure_open()?;
        Ok(self.rows.pop_front())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.rows.clear();
        Ok(())
    }
}

/// SQLx connection pool adapter over the `Any` driver
#[cfg(any(feature = "postgres", feature = "mysql", feature = "sqlite"))]
pub mod any {
    use super::*;
    use sqlx::any::{AnyArguments, AnyPoolOptions, AnyRow};
    use sqlx::{Any, AnyPool, Column, Row as _, TypeInfo};

    /// Connection pool wrapper implementing [`Executor`]
    #[derive(Clone, Debug)]
    pub struct SqlxPool {
        inner: AnyPool,
    }

    impl SqlxPool {
        /// Create a new pool from a connection URL
        pub async fn connect(database_url: &str) -> Result<Self> {
            Self::connect_with(AnyPoolOptions::new(), database_url).await
        }

        /// Create a new pool with explicit pool options
        pub async fn connect_with(options: AnyPoolOptions, database_url: &str) -> Result<Self> {
            sqlx::any::install_default_drivers();
            let pool = options.connect(database_url).await?;
            Ok(Self { inner: pool })
        }

        /// Create from an existing AnyPool
        pub fn from_pool(pool: AnyPool) -> Self {
            Self { inner: pool }
        }
    }

    impl Executor for SqlxPool {
        type Rows = BufferedRows;

        async fn query(&self, sql: &str, params: &[Value]) -> Result<BufferedRows> {
            let query = bind_values_to_query(sqlx::query(sql), params);
            let rows = query.fetch_all(&self.inner).await?;

            let columns = rows
                .first()
                .map(|row| {
                    row.columns()
                        .iter()
                        .map(|column| column.name().to_string())
                        .collect()
                })
                .unwrap_or_default();

            let mut decoded = Vec::with_capacity(rows.len());
            for row in &rows {
                decoded.push(decode_row(row)?);
            }
            Ok(BufferedRows::new(columns, decoded))
        }

        async fn close(&self) -> Result<()> {
            self.inner.close().await;
            Ok(())
        }
    }

    /// Bind Quarry Values to a SQLx query
    fn bind_values_to_query<'q>(
        mut query: sqlx::query::Query<'q, Any, AnyArguments<'q>>,
        params: &[Value],
    ) -> sqlx::query::Query<'q, Any, AnyArguments<'q>> {
        for param in params {
            query = match param {
                Value::Null => query.bind(None::<i32>),
                Value::Bool(b) => query.bind(*b),
                Value::I32(i) => query.bind(*i),
                Value::I64(i) => query.bind(*i),
                Value::F32(f) => query.bind(*f),
                Value::F64(f) => query.bind(*f),
                Value::String(s) => query.bind(s.clone()),
                Value::Bytes(b) => query.bind(b.clone()),
                // Any has no JSON type; drivers accept the text form
                Value::Json(j) => query.bind(j.to_string()),
            };
        }
        query
    }

    fn decode_row(row: &AnyRow) -> Result<Row> {
        (0..row.len()).map(|index| decode_column(row, index)).collect()
    }

    fn decode_column(row: &AnyRow, index: usize) -> Result<Value> {
        // AnyValueRef never reports NULL; the column type info carries it instead
        let type_info = row.column(index).type_info();
        if type_info.is_null() {
            return Ok(Value::Null);
        }

        let type_name = type_info.name().to_ascii_uppercase();
        let decoded = match type_name.as_str() {
            "BOOLEAN" | "BOOL" => row.try_get::<bool, _>(index).map(Value::Bool).ok(),
            "SMALLINT" | "INTEGER" | "INT" | "BIGINT" => decode_integer(row, index),
            "REAL" | "FLOAT" => row.try_get::<f32, _>(index).map(Value::F32).ok(),
            "DOUBLE" | "DOUBLE PRECISION" => row.try_get::<f64, _>(index).map(Value::F64).ok(),
            "BLOB" | "BYTEA" => row.try_get::<Vec<u8>, _>(index).map(Value::Bytes).ok(),
            _ => None,
        };

        match decoded {
            Some(value) => Ok(value),
            None => decode_fallback(row, index),
        }
    }

    fn decode_integer(row: &AnyRow, index: usize) -> Option<Value> {
        row.try_get::<i64, _>(index)
            .map(Value::I64)
            .or_else(|_| row.try_get::<i32, _>(index).map(Value::I32))
            .or_else(|_| row.try_get::<i16, _>(index).map(|v| Value::I32(v.into())))
            .ok()
    }

    fn decode_fallback(row: &AnyRow, index: usize) -> Result<Value> {
        if let Some(value) = decode_integer(row, index) {
            return Ok(value);
        }
        if let Ok(v) = row.try_get::<f64, _>(index) {
            return Ok(Value::F64(v));
        }
        if let Ok(v) = row.try_get::<bool, _>(index) {
            return Ok(Value::Bool(v));
        }
        if let Ok(v) = row.try_get::<String, _>(index) {
            return Ok(Value::String(v));
        }
        Ok(Value::Bytes(row.try_get::<Vec<u8>, _>(index)?))
    }

}
