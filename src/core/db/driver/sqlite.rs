/// SQLite driver backed by `rusqlite`.

use super::{append_dsn_fields, quote_literal, Dialect, Driver, DriverError, Link};
use crate::config::ConnectionParams;
use crate::core::db::result::ResultSet;
use crate::core::db::value::Value;
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use tracing::debug;

const MEMORY: &str = ":memory:";

/// Opens SQLite databases. `params.name` is the file path; an absent or
/// empty name opens a private in-memory database.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl SqliteDriver {
    pub fn new() -> Self {
        SqliteDriver
    }

    fn path(params: &ConnectionParams) -> &str {
        params
            .name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(MEMORY)
    }
}

impl Driver for SqliteDriver {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn Link>, DriverError> {
        let path = Self::path(params);
        debug!("Opening SQLite database at {}", path);

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        if path != MEMORY {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        }

        Ok(Box::new(SqliteLink { conn }))
    }

    fn make_dsn(&self, params: &ConnectionParams) -> String {
        let mut dsn = String::from("sqlite:");
        append_dsn_fields(&mut dsn, &[("dbname", params.name.clone())]);
        dsn
    }
}

/// A live SQLite connection.
#[derive(Debug)]
pub struct SqliteLink {
    conn: Connection,
}

impl SqliteLink {
    fn run(stmt: &mut rusqlite::Statement<'_>, params: &[Value]) -> rusqlite::Result<ResultSet> {
        if stmt.column_count() == 0 {
            let affected = stmt.execute(params_from_iter(params.iter()))?;
            return Ok(ResultSet::with_affected(affected as u64));
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let column_count = columns.len();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut collected = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(from_value_ref(row.get_ref(i)?));
            }
            collected.push(values);
        }

        Ok(ResultSet::with_rows(columns, collected))
    }
}

impl Link for SqliteLink {
    fn prepare(&mut self, sql: &str) -> Result<usize, DriverError> {
        let stmt = self.conn.prepare_cached(sql)?;
        Ok(stmt.parameter_count())
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet, DriverError> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        Ok(Self::run(&mut stmt, params)?)
    }

    fn query(&mut self, sql: &str) -> Result<ResultSet, DriverError> {
        let mut stmt = self.conn.prepare(sql)?;
        Ok(Self::run(&mut stmt, &[])?)
    }

    fn exec(&mut self, sql: &str) -> Result<u64, DriverError> {
        self.conn.execute_batch(sql)?;
        Ok(self.conn.changes() as u64)
    }

    fn begin(&mut self) -> Result<bool, DriverError> {
        self.conn.execute_batch("BEGIN")?;
        Ok(true)
    }

    fn commit(&mut self) -> Result<bool, DriverError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(true)
    }

    fn rollback(&mut self) -> Result<bool, DriverError> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(true)
    }

    fn last_inserted_id(&mut self, _name: Option<&str>) -> Result<String, DriverError> {
        Ok(self.conn.last_insert_rowid().to_string())
    }

    fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn quote(&self, text: &str) -> Result<String, DriverError> {
        Ok(quote_literal(text))
    }
}

impl From<rusqlite::Error> for DriverError {
    fn from(e: rusqlite::Error) -> Self {
        let code = match &e {
            rusqlite::Error::SqliteFailure(err, _) => i64::from(err.extended_code),
            _ => -1,
        };
        DriverError::new(e.to_string(), code)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Owned(SqlValue::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

fn from_value_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).to_string()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}
