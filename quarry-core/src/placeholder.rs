//! Dialect-specific placeholder rebinding and driver names

use crate::{Error, Result};
use std::fmt::{self, Display};
use std::str::FromStr;

/// The generic positional placeholder emitted by the builder
pub const PLACEHOLDER: char = '?';

/// Rewrite `?` placeholders into the syntax of `dialect`.
///
/// `postgres` and `postgresql` get `$1, $2, ...` in scan order; every other
/// dialect is returned unchanged. Placeholders inside string literals are
/// rewritten too.
pub fn rebind(sql: &str, dialect: &str) -> String {
    match dialect {
        "postgres" | "postgresql" => rebind_numbered(sql),
        _ => sql.to_string(),
    }
}

fn rebind_numbered(sql: &str) -> String {
    let mut result = String::with_capacity(sql.len() + 8);
    let mut count = 0;

    for ch in sql.chars() {
        if ch == PLACEHOLDER {
            count += 1;
            result.push('$');
            result.push_str(&count.to_string());
        } else {
            result.push(ch);
        }
    }

    result
}

/// Supported database drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Driver {
    Postgres,
    MySql,
    Sqlite,
    MsSql,
}

impl Driver {
    pub const ALL: [Driver; 4] = [Driver::Postgres, Driver::MySql, Driver::Sqlite, Driver::MsSql];

    /// Canonical driver name, also used as the rebinding dialect
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Postgres => "postgres",
            Driver::MySql => "mysql",
            Driver::Sqlite => "sqlite3",
            Driver::MsSql => "sqlserver",
        }
    }

    /// Derive the driver from a connection URL such as `postgres://...` or `sqlite::memory:`
    pub fn from_url(url: &str) -> Result<Self> {
        let scheme = url
            .split_once(':')
            .map(|(scheme, _)| scheme)
            .ok_or_else(|| Error::unsupported_driver(url))?;
        scheme.parse()
    }
}

impl Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Driver {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Driver::Postgres),
            "mysql" | "mariadb" => Ok(Driver::MySql),
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            "sqlserver" | "mssql" => Ok(Driver::MsSql),
            _ => Err(Error::unsupported_driver(name)),
        }
    }
}
