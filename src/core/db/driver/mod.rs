/// Drivers open physical links to a database engine.
///
/// A [`Driver`] is the dialect-specific leaf of the stack: it knows how to
/// build a DSN and how to open a [`Link`]. The link is the only place that
/// talks to the client library, and every failure it reports is a
/// [`DriverError`] carrying the engine's message and code.

pub mod mysql;
pub mod sqlite;

pub use self::mysql::MysqlDriver;
pub use self::sqlite::SqliteDriver;

use crate::config::ConnectionParams;
use crate::core::db::result::ResultSet;
use crate::core::db::value::Value;
use crate::core::DbError;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Failure reported by the client library, before it is rewrapped.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} (code {code})")]
pub struct DriverError {
    pub message: String,
    pub code: i64,
}

impl DriverError {
    pub fn new(message: impl Into<String>, code: i64) -> Self {
        DriverError {
            message: message.into(),
            code,
        }
    }
}

/// SQL dialects with a driver and a pair of grammars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Mysql,
    Sqlite,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Mysql => "mysql",
            Dialect::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(Dialect::Mysql),
            "sqlite" => Ok(Dialect::Sqlite),
            _ => Err(DbError::UnknownDialect(s.to_string())),
        }
    }
}

/// An open physical connection.
///
/// All calls block until the engine answers.
pub trait Link: Send {
    /// Validates `sql` as a prepared statement without running it
    /// and returns how many parameters it takes
    fn prepare(&mut self, sql: &str) -> Result<usize, DriverError>;

    /// Prepares `sql`, binds `params` positionally and executes it
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet, DriverError>;

    /// Runs `sql` directly, without binding anything
    fn query(&mut self, sql: &str) -> Result<ResultSet, DriverError>;

    /// Runs a statement that returns no rows and reports affected rows
    fn exec(&mut self, sql: &str) -> Result<u64, DriverError>;

    fn begin(&mut self) -> Result<bool, DriverError>;

    fn commit(&mut self) -> Result<bool, DriverError>;

    fn rollback(&mut self) -> Result<bool, DriverError>;

    /// Identifier generated by the last insert. `name` selects a sequence
    /// on engines that have them and is ignored elsewhere.
    fn last_inserted_id(&mut self, name: Option<&str>) -> Result<String, DriverError>;

    fn in_transaction(&self) -> bool;

    /// Quotes `text` as a string literal
    fn quote(&self, text: &str) -> Result<String, DriverError>;
}

/// Opens links for one dialect.
pub trait Driver: Send + Sync + fmt::Debug {
    fn dialect(&self) -> Dialect;

    fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn Link>, DriverError>;

    fn make_dsn(&self, params: &ConnectionParams) -> String;
}

/// Appends `key=value;` for every present field, in the order given.
pub(crate) fn append_dsn_fields(dsn: &mut String, fields: &[(&str, Option<String>)]) {
    for (key, value) in fields {
        if let Some(value) = value {
            dsn.push_str(&format!("{}={};", key, value));
        }
    }
}

/// Standard SQL string-literal quoting: wrap in single quotes and double any
/// embedded quote.
pub(crate) fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
