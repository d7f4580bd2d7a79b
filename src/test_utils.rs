/// # Test Utilities Module
///
/// A recording driver whose links never reach an engine. Every call made on
/// the link is appended to a shared log so tests can assert on the exact
/// statement sequence a connection issues.

use crate::config::ConnectionParams;
use crate::core::db::driver::{Dialect, Driver, DriverError, Link};
use crate::core::db::{Connection, ResultSet, Value};
use crate::query::grammar::MysqlGrammar;
use crate::schema::grammar::MysqlSchemaGrammar;
use std::sync::{Arc, Mutex};

/// One call observed on a recording link
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Prepare(String),
    Execute(String, Vec<Value>),
    Query(String),
    Exec(String),
    Begin,
    Commit,
    Rollback,
}

#[derive(Debug, Default)]
struct LogState {
    connects: usize,
    statements: Vec<Recorded>,
    fail_next: Option<DriverError>,
}

/// Shared view of everything the recording driver saw
#[derive(Debug, Clone, Default)]
pub struct RecordingLog {
    state: Arc<Mutex<LogState>>,
}

impl RecordingLog {
    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    pub fn statements(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().statements.clone()
    }

    /// SQL text of every statement, in order
    pub fn sql(&self) -> Vec<String> {
        self.statements()
            .into_iter()
            .filter_map(|r| match r {
                Recorded::Execute(sql, _) | Recorded::Query(sql) | Recorded::Exec(sql) => Some(sql),
                _ => None,
            })
            .collect()
    }

    /// Makes the next link call fail with the given engine error
    pub fn fail_next(&self, message: &str, code: i64) {
        self.state.lock().unwrap().fail_next = Some(DriverError::new(message, code));
    }

    fn record(&self, call: Recorded) -> Result<(), DriverError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.fail_next.take() {
            return Err(err);
        }
        state.statements.push(call);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingDriver {
    log: RecordingLog,
}

impl Driver for RecordingDriver {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    fn connect(&self, _params: &ConnectionParams) -> Result<Box<dyn Link>, DriverError> {
        self.log.state.lock().unwrap().connects += 1;
        Ok(Box::new(RecordingLink {
            log: self.log.clone(),
            in_transaction: false,
        }))
    }

    fn make_dsn(&self, _params: &ConnectionParams) -> String {
        "recording:".to_string()
    }
}

struct RecordingLink {
    log: RecordingLog,
    in_transaction: bool,
}

impl Link for RecordingLink {
    fn prepare(&mut self, sql: &str) -> Result<usize, DriverError> {
        self.log.record(Recorded::Prepare(sql.to_string()))?;
        Ok(sql.matches('?').count())
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet, DriverError> {
        self.log.record(Recorded::Execute(sql.to_string(), params.to_vec()))?;
        Ok(ResultSet::with_affected(1))
    }

    fn query(&mut self, sql: &str) -> Result<ResultSet, DriverError> {
        self.log.record(Recorded::Query(sql.to_string()))?;
        Ok(ResultSet::with_affected(0))
    }

    fn exec(&mut self, sql: &str) -> Result<u64, DriverError> {
        self.log.record(Recorded::Exec(sql.to_string()))?;
        Ok(0)
    }

    fn begin(&mut self) -> Result<bool, DriverError> {
        self.log.record(Recorded::Begin)?;
        self.in_transaction = true;
        Ok(true)
    }

    fn commit(&mut self) -> Result<bool, DriverError> {
        self.log.record(Recorded::Commit)?;
        self.in_transaction = false;
        Ok(true)
    }

    fn rollback(&mut self) -> Result<bool, DriverError> {
        self.log.record(Recorded::Rollback)?;
        self.in_transaction = false;
        Ok(true)
    }

    fn last_inserted_id(&mut self, _name: Option<&str>) -> Result<String, DriverError> {
        Ok("42".to_string())
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    fn quote(&self, text: &str) -> Result<String, DriverError> {
        Ok(format!("'{}'", text.replace('\'', "''")))
    }
}

/// A MySQL-dialect connection backed by the recording driver
pub fn recording_connection() -> (Connection, RecordingLog) {
    let driver = RecordingDriver::default();
    let log = driver.log.clone();
    let mut conn = Connection::new(
        ConnectionParams::for_dialect("mysql"),
        Box::new(driver),
        Arc::new(MysqlGrammar),
        Arc::new(MysqlSchemaGrammar),
    );
    conn.set_schema("shop");
    (conn, log)
}
