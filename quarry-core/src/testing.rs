//! In-memory executor used by the unit tests

use crate::executor::{BufferedRows, Executor, Row, RowCursor};
use crate::{Error, Result, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Build a row from heterogeneous values
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::Value::from($value)),*]
    };
}
pub(crate) use row;

#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: i32,
}

crate::bindable!(User { id, name, email, age });

/// One recorded `Executor::query` call
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Executed {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Executor returning a fixed result set and recording every call
#[derive(Default)]
pub(crate) struct MockExecutor {
    columns: Vec<String>,
    rows: Vec<Row>,
    failure: Option<String>,
    fail_cursor_close: bool,
    executed: Mutex<Vec<Executed>>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
    shut_down: AtomicBool,
}

impl MockExecutor {
    pub fn new(columns: &[&str], rows: Vec<Row>) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn with_failing_close(mut self) -> Self {
        self.fail_cursor_close = true;
        self
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.executed.lock().unwrap().clone()
    }

    /// Cursors handed out and not yet closed
    pub fn open_cursors(&self) -> usize {
        self.opened.load(Ordering::SeqCst) - self.closed.load(Ordering::SeqCst)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

impl Executor for MockExecutor {
    type Rows = MockRows;

    async fn query(&self, sql: &str, params: &[Value]) -> Result<MockRows> {
        self.executed.lock().unwrap().push(Executed {
            sql: sql.to_string(),
            params: params.to_vec(),
        });

        if let Some(message) = &self.failure {
            return Err(Error::execution(message.clone()));
        }

        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(MockRows {
            inner: BufferedRows::new(self.columns.clone(), self.rows.clone()),
            closed: Arc::clone(&self.closed),
            fail_close: self.fail_cursor_close,
        })
    }

    async fn close(&self) -> Result<()> {
        self.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) struct MockRows {
    inner: BufferedRows,
    closed: Arc<AtomicUsize>,
    fail_close: bool,
}

impl RowCursor for MockRows {
    fn columns(&self) -> Result<Vec<String>> {
        self.inner.columns()
    }

    async fn next_row(&mut self) -> Result<Option<Row>> {
        self.inner.next_row().await
    }

    async fn close(&mut self) -> Result<()> {
        self.inner.close().await?;
        self.closed.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            Err(Error::execution("cursor close failed"))
        } else {
            Ok(())
        }
    }
}
