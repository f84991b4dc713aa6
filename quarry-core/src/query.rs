//! SELECT query builder and execution context

use crate::condition::{compile, Condition};
use crate::executor::{Executor, RowCursor};
use crate::mapper::{scan_into, Bindable, Destination};
use crate::placeholder::{rebind, Driver};
use crate::{Error, Result, Value};

/// Execution context: an executor plus the dialect its SQL is rebound for
pub struct Db<E: Executor> {
    executor: E,
    driver: String,
}

impl<E: Executor> Db<E> {
    /// Wrap an executor; `driver` picks the placeholder dialect (e.g. `"postgres"`)
    pub fn new(executor: E, driver: impl Into<String>) -> Self {
        Self {
            executor,
            driver: driver.into(),
        }
    }

    /// Active dialect name
    pub fn driver(&self) -> &str {
        &self.driver
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Start a SELECT query against `name`
    ///
    /// # Examples
    /// ```
    /// # use quarry_core::{Db, executor::BufferedRows, Executor, Value, Result};
    /// # struct Noop;
    /// # impl Executor for Noop {
    /// #     type Rows = BufferedRows;
    /// #     async fn query(&self, _: &str, _: &[Value]) -> Result<BufferedRows> { Ok(BufferedRows::default()) }
    /// #     async fn close(&self) -> Result<()> { Ok(()) }
    /// # }
    /// use quarry_core::cond;
    ///
    /// let db = Db::new(Noop, "postgres");
    /// let query = db
    ///     .table("users")
    ///     .select(("id", "name"))
    ///     .where_(cond::gt("age", 18));
    /// assert_eq!(query.to_sql(), "SELECT id, name FROM users WHERE age > ?");
    /// ```
    pub fn table(&self, name: &str) -> Query<'_, E> {
        Query::new(self, name)
    }

    /// Close the underlying executor
    pub async fn close(&self) -> Result<()> {
        self.executor.close().await
    }
}

#[cfg(any(feature = "postgres", feature = "mysql", feature = "sqlite"))]
impl Db<crate::executor::any::SqlxPool> {
    /// Connect through sqlx, taking the dialect from the URL scheme
    pub async fn connect(database_url: &str) -> Result<Self> {
        let driver = Driver::from_url(database_url)?;
        let pool = crate::executor::any::SqlxPool::connect(database_url).await?;
        Ok(Self::new(pool, driver.as_str()))
    }

    /// Connect using the `DATABASE_URL` environment variable
    pub async fn connect_env() -> Result<Self> {
        let url = std::env::var("DATABASE_URL")
            .map_err(|_| Error::invalid_query("DATABASE_URL is not set"))?;
        Self::connect(&url).await
    }
}

impl<E: Executor> From<(E, Driver)> for Db<E> {
    fn from((executor, driver): (E, Driver)) -> Self {
        Self::new(executor, driver.as_str())
    }
}

/// SELECT query builder.
///
/// Builder calls take and return `self`; the fetch methods consume the query,
/// so a query runs at most once.
pub struct Query<'a, E: Executor> {
    db: &'a Db<E>,
    table_name: String,
    selected_columns: Vec<String>,
    where_clauses: Vec<String>,
    parameters: Vec<Value>,
}

impl<E: Executor> Clone for Query<'_, E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db,
            table_name: self.table_name.clone(),
            selected_columns: self.selected_columns.clone(),
            where_clauses: self.where_clauses.clone(),
            parameters: self.parameters.clone(),
        }
    }
}

impl<E: Executor> std::fmt::Debug for Query<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("driver", &self.db.driver)
            .field("table_name", &self.table_name)
            .field("selected_columns", &self.selected_columns)
            .field("where_clauses", &self.where_clauses)
            .field("parameters", &self.parameters)
            .finish()
    }
}

impl<'a, E: Executor> Query<'a, E> {
    /// Create a new SELECT query builder
    pub fn new(db: &'a Db<E>, table: &str) -> Self {
        Self {
            db,
            table_name: table.to_string(),
            selected_columns: Vec::new(),
            where_clauses: Vec::new(),
            parameters: Vec::new(),
        }
    }

    /// Add columns to the select list; repeated calls accumulate
    pub fn select<T>(mut self, columns: T) -> Self
    where
        T: IntoColumns,
    {
        self.selected_columns.extend(columns.into_columns());
        self
    }

    /// Add a typed condition, compiled immediately.
    ///
    /// A condition that compiles to nothing adds neither a clause nor
    /// arguments.
    pub fn where_(mut self, condition: Condition) -> Self {
        let fragment = compile(condition);
        if !fragment.is_empty() {
            self.where_clauses.push(fragment.sql);
            self.parameters.extend(fragment.args);
        }
        self
    }

    /// Add a raw SQL fragment with its positional `?` arguments, stored verbatim
    ///
    /// # Examples
    /// ```
    /// # use quarry_core::{Db, executor::BufferedRows, Executor, Value, Result};
    /// # struct Noop;
    /// # impl Executor for Noop {
    /// #     type Rows = BufferedRows;
    /// #     async fn query(&self, _: &str, _: &[Value]) -> Result<BufferedRows> { Ok(BufferedRows::default()) }
    /// #     async fn close(&self) -> Result<()> { Ok(()) }
    /// # }
    /// let db = Db::new(Noop, "mysql");
    /// let query = db
    ///     .table("orders")
    ///     .where_raw("total BETWEEN ? AND ?", [10, 100]);
    /// assert_eq!(query.to_sql(), "SELECT * FROM orders WHERE total BETWEEN ? AND ?");
    /// assert_eq!(query.parameters().len(), 2);
    /// ```
    pub fn where_raw<I, T>(mut self, sql: &str, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        self.where_clauses.push(sql.to_string());
        self.parameters.extend(args.into_iter().map(Into::into));
        self
    }

    /// Render the statement with generic `?` placeholders
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();

        // SELECT clause
        sql.push_str("SELECT ");
        if self.selected_columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.selected_columns.join(", "));
        }

        // FROM clause
        sql.push_str(" FROM ");
        sql.push_str(&self.table_name);

        // WHERE clause
        if !self.where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clauses.join(" AND "));
        }

        sql
    }

    /// Arguments in placeholder order
    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    /// The statement as it will be sent for the active dialect
    pub fn rebound_sql(&self) -> String {
        rebind(&self.to_sql(), self.db.driver())
    }

    /// Execute and map the result into `dest`.
    ///
    /// `dest` is either a bindable struct (exactly one row is read, none is
    /// [`Error::NoRows`]) or a `Vec` of them (every row is appended). The
    /// cursor is closed whether or not mapping succeeds.
    pub async fn get<D>(self, dest: &mut D) -> Result<()>
    where
        D: Destination,
    {
        let mut rows = self.run().await?;
        let mapped = dest.fill(&mut rows).await;
        finish(rows, mapped).await
    }

    /// Execute and discard any result rows
    pub async fn exec(self) -> Result<()> {
        let rows = self.run().await?;
        finish(rows, Ok(())).await
    }

    /// Execute the query and return all results
    pub async fn fetch_all<T>(self) -> Result<Vec<T>>
    where
        T: Bindable,
    {
        let mut items = Vec::new();
        self.get(&mut items).await?;
        Ok(items)
    }

    /// Execute the query and return the first result
    pub async fn fetch_one<T>(self) -> Result<T>
    where
        T: Bindable,
    {
        let mut rows = self.run().await?;
        let mut item = T::default();
        let mapped = scan_into(&mut rows, &mut item).await;
        finish(rows, mapped).await?;
        Ok(item)
    }

    /// Execute the query and return the first result, if any
    pub async fn fetch_optional<T>(self) -> Result<Option<T>>
    where
        T: Bindable,
    {
        match self.fetch_one().await {
            Ok(item) => Ok(Some(item)),
            Err(Error::NoRows) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn run(&self) -> Result<E::Rows> {
        let sql = self.rebound_sql();
        tracing::debug!(
            driver = %self.db.driver(),
            sql = %sql,
            args = ?self.parameters,
            "executing query"
        );
        self.db.executor.query(&sql, &self.parameters).await
    }
}

/// Close `rows`, preferring the mapping error over a close error
async fn finish<C: RowCursor>(mut rows: C, mapped: Result<()>) -> Result<()> {
    let closed = rows.close().await;
    match (mapped, closed) {
        (Err(err), Err(close_err)) => {
            tracing::warn!(error = %close_err, "failed to close row cursor after mapping error");
            Err(err)
        }
        (Err(err), Ok(())) => Err(err),
        (Ok(()), closed) => closed,
    }
}

/// Trait for types that can be converted to column lists
pub trait IntoColumns {
    fn into_columns(self) -> Vec<String>;
}

impl IntoColumns for &str {
    fn into_columns(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoColumns for String {
    fn into_columns(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoColumns for Vec<&str> {
    fn into_columns(self) -> Vec<String> {
        self.into_iter().map(|s| s.to_string()).collect()
    }
}

impl IntoColumns for Vec<String> {
    fn into_columns(self) -> Vec<String> {
        self
    }
}

impl<const N: usize> IntoColumns for [&str; N] {
    fn into_columns(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl IntoColumns for (&str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string()]
    }
}

impl IntoColumns for (&str, &str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string(), self.2.to_string()]
    }
}

impl IntoColumns for (&str, &str, &str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![
            self.0.to_string(),
            self.1.to_string(),
            self.2.to_string(),
            self.3.to_string(),
        ]
    }
}
