use crate::core::db::connection::Connection;
use crate::core::db::result::ResultSet;
use crate::core::db::value::Value;
use crate::core::{DbError, Result};

/// A prepared statement bound to a connection.
///
/// Parameters are bound by 1-based position, matching `?` placeholders from
/// left to right.
#[derive(Debug)]
pub struct Statement<'c> {
    conn: &'c mut Connection,
    sql: String,
    parameter_count: usize,
    params: Vec<Value>,
}

impl<'c> Statement<'c> {
    pub(crate) fn new(conn: &'c mut Connection, sql: &str, parameter_count: usize) -> Self {
        Statement {
            conn,
            sql: sql.to_string(),
            parameter_count,
            params: Vec::new(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Number of placeholders the engine found when preparing
    pub fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    /// Binds `value` to the placeholder at `position` (1-based).
    ///
    /// Gaps left by binding out of order are filled with NULL. Positions
    /// outside `1..=parameter_count()` fail with `DbError::Compile`.
    pub fn bind_value(&mut self, position: usize, value: impl Into<Value>) -> Result<&mut Self> {
        if position == 0 || position > self.parameter_count {
            return Err(DbError::Compile(format!(
                "parameter position {} is outside 1..={}",
                position, self.parameter_count
            )));
        }
        if self.params.len() < position {
            self.params.resize(position, Value::Null);
        }
        self.params[position - 1] = value.into();
        Ok(self)
    }

    /// Binds every value in order, starting at position 1
    pub fn bind_all<I, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.params = values.into_iter().map(Into::into).collect();
        self
    }

    /// Executes the statement with the bound parameters.
    pub fn run(&mut self) -> Result<ResultSet> {
        self.conn.execute_prepared(&self.sql, &self.params)
    }
}
