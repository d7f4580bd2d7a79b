/// Connection Management Module
///
/// This module provides the `Connection`: one lazily opened physical link,
/// a cache of named SQL text for replay, and nested transaction management
/// through savepoints.
///
/// A connection is meant for one unit of work. The builders borrow it
/// mutably, so it cannot be shared between concurrent callers without
/// external synchronization.

use crate::config::ConnectionParams;
use crate::core::db::driver::{Dialect, Driver, Link};
use crate::core::db::result::ResultSet;
use crate::core::db::statement::Statement;
use crate::core::db::value::Value;
use crate::core::{DbError, Result};
use crate::query::{QueryBuilder, QueryGrammar};
use crate::schema::{SchemaBuilder, SchemaGrammar};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Savepoint name used for the transaction level `depth`.
///
/// Entering depth `d + 1` creates `savepoint_level_{d}`; returning to depth
/// `d` releases or rolls back the same name.
pub fn savepoint_marker(depth: usize) -> String {
    format!("savepoint_level_{}", depth)
}

/// A database connection bound to one dialect.
pub struct Connection {
    driver: Box<dyn Driver>,
    link: Option<Box<dyn Link>>,
    transaction_depth: usize,
    cached_sql: HashMap<String, String>,
    params: ConnectionParams,
    schema: String,
    query_grammar: Arc<dyn QueryGrammar>,
    schema_grammar: Arc<dyn SchemaGrammar>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("dialect", &self.driver.dialect())
            .field("connected", &self.link.is_some())
            .field("transaction_depth", &self.transaction_depth)
            .field("cached_sql", &self.cached_sql.len())
            .field("schema", &self.schema)
            .finish()
    }
}

impl Connection {
    /// Creates a connection. Nothing is opened until first use.
    pub fn new(
        params: ConnectionParams,
        driver: Box<dyn Driver>,
        query_grammar: Arc<dyn QueryGrammar>,
        schema_grammar: Arc<dyn SchemaGrammar>,
    ) -> Self {
        Connection {
            driver,
            link: None,
            transaction_depth: 0,
            cached_sql: HashMap::new(),
            params,
            schema: String::new(),
            query_grammar,
            schema_grammar,
        }
    }

    /// Opens the physical link if it is not open yet.
    ///
    /// # Returns
    ///
    /// `Ok(true)` when a link was opened, `Ok(false)` when one already existed.
    pub fn connect(&mut self) -> Result<bool> {
        if self.link.is_some() {
            return Ok(false);
        }

        info!(
            "Connecting to {} ({})",
            self.driver.dialect(),
            self.driver.make_dsn(&self.params)
        );
        let link = self.driver.connect(&self.params).map_err(|e| {
            warn!("Connection failed: {}", e);
            DbError::from(e)
        })?;
        self.link = Some(link);

        Ok(true)
    }

    /// Drops the physical link. Open transactions are abandoned with it.
    pub fn close(&mut self) {
        if self.link.take().is_some() {
            info!("Closed {} connection", self.driver.dialect());
        }
        self.transaction_depth = 0;
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Returns the physical link, opening it first if needed
    fn link(&mut self) -> Result<&mut dyn Link> {
        self.connect()?;
        match self.link.as_deref_mut() {
            Some(link) => Ok(link),
            None => Err(DbError::Config("connection has no physical link".to_string())),
        }
    }

    /// Prepares `sql` and returns a statement bound to this connection.
    pub fn prepare(&mut self, sql: &str) -> Result<Statement<'_>> {
        let parameter_count = self.link()?.prepare(sql).map_err(DbError::from)?;
        Ok(Statement::new(self, sql, parameter_count))
    }

    /// Runs `sql`. With parameters it goes through a prepared statement,
    /// without them it runs as a direct query.
    pub fn run_query(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet> {
        debug!(sql, params = params.len(), "run_query");
        let link = self.link()?;
        let result = if params.is_empty() {
            link.query(sql)
        } else {
            link.execute(sql, params)
        };

        result.map_err(|e| {
            warn!("Query failed: {} [{}]", e, sql);
            DbError::from(e)
        })
    }

    /// Runs `sql` like [`run_query`](Self::run_query) and caches its text
    /// under `alias` for later replay with [`run_cached_query`](Self::run_cached_query).
    pub fn run_query_cached(&mut self, sql: &str, params: &[Value], alias: &str) -> Result<ResultSet> {
        self.cached_sql.insert(alias.to_string(), sql.to_string());
        self.run_query(sql, params)
    }

    /// Re-executes SQL previously cached under `alias`.
    ///
    /// Fails with `DbError::CacheMiss` before touching the link when the
    /// alias is unknown.
    pub fn run_cached_query(&mut self, alias: &str, params: &[Value]) -> Result<ResultSet> {
        let sql = self
            .cached_sql
            .get(alias)
            .cloned()
            .ok_or_else(|| DbError::CacheMiss(alias.to_string()))?;

        self.run_query(&sql, params)
    }

    pub fn cached_sql(&self, alias: &str) -> Option<&str> {
        self.cached_sql.get(alias).map(String::as_str)
    }

    /// Runs a prepared statement's SQL with its bound parameters
    pub(crate) fn execute_prepared(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet> {
        debug!(sql, params = params.len(), "execute_prepared");
        self.link()?.execute(sql, params).map_err(DbError::from)
    }

    /// Starts a transaction, or a savepoint when one is already open.
    pub fn start_transaction(&mut self) -> Result<()> {
        let depth = self.transaction_depth;
        let link = self.link()?;

        if depth == 0 {
            debug!("BEGIN");
            link.begin()?;
        } else {
            let marker = savepoint_marker(depth);
            debug!("SAVEPOINT {}", marker);
            link.exec(&format!("SAVEPOINT {}", marker))?;
        }

        self.transaction_depth += 1;
        Ok(())
    }

    /// Commits the innermost transaction level.
    ///
    /// The outermost level issues a real COMMIT; inner levels release their
    /// savepoint.
    pub fn commit(&mut self) -> Result<()> {
        let depth = self.leave_level("commit")?;
        let link = self.link()?;

        if depth == 0 {
            debug!("COMMIT");
            link.commit()?;
        } else {
            let marker = savepoint_marker(depth);
            debug!("RELEASE SAVEPOINT {}", marker);
            link.exec(&format!("RELEASE SAVEPOINT {}", marker))?;
        }

        Ok(())
    }

    /// Rolls back the innermost transaction level.
    ///
    /// The outermost level issues a real ROLLBACK; inner levels roll back to
    /// their savepoint.
    pub fn rollback(&mut self) -> Result<()> {
        let depth = self.leave_level("rollback")?;
        let link = self.link()?;

        if depth == 0 {
            warn!("ROLLBACK");
            link.rollback()?;
        } else {
            let marker = savepoint_marker(depth);
            warn!("ROLLBACK TO SAVEPOINT {}", marker);
            link.exec(&format!("ROLLBACK TO SAVEPOINT {}", marker))?;
        }

        Ok(())
    }

    /// Decrements the depth and returns the new value
    fn leave_level(&mut self, action: &str) -> Result<usize> {
        if self.transaction_depth == 0 {
            return Err(DbError::Transaction(format!(
                "cannot {} without an active transaction",
                action
            )));
        }
        self.transaction_depth -= 1;
        Ok(self.transaction_depth)
    }

    /// Runs `f` inside a transaction level, committing when it succeeds and
    /// rolling back when it fails. The error from `f` is returned even if
    /// the rollback fails too.
    pub fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        self.start_transaction()?;
        match f(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = self.rollback() {
                    warn!("Rollback after failed transaction body also failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    pub fn transaction_depth(&self) -> usize {
        self.transaction_depth
    }

    pub fn last_inserted_id(&mut self, name: Option<&str>) -> Result<String> {
        Ok(self.link()?.last_inserted_id(name)?)
    }

    pub fn in_transaction(&mut self) -> Result<bool> {
        Ok(self.link()?.in_transaction())
    }

    pub fn quote(&mut self, text: &str) -> Result<String> {
        Ok(self.link()?.quote(text)?)
    }

    /// Creates a query builder bound to this connection
    pub fn query_builder(&mut self) -> QueryBuilder<'_> {
        QueryBuilder::new(self)
    }

    /// Creates a schema builder bound to this connection
    pub fn schema_builder(&mut self) -> SchemaBuilder<'_> {
        SchemaBuilder::new(self)
    }

    pub fn dialect(&self) -> Dialect {
        self.driver.dialect()
    }

    pub fn dsn(&self) -> String {
        self.driver.make_dsn(&self.params)
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Schema (database) name
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn set_schema(&mut self, schema: impl Into<String>) -> &mut Self {
        self.schema = schema.into();
        self
    }

    pub fn query_grammar(&self) -> Arc<dyn QueryGrammar> {
        Arc::clone(&self.query_grammar)
    }

    pub fn schema_grammar(&self) -> Arc<dyn SchemaGrammar> {
        Arc::clone(&self.schema_grammar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{recording_connection, Recorded};

    #[test]
    fn test_connect_is_idempotent() {
        let (mut conn, log) = recording_connection();
        assert!(!conn.is_connected());
        assert!(conn.connect().unwrap());
        assert!(!conn.connect().unwrap());
        assert_eq!(log.connects(), 1);

        conn.close();
        assert!(!conn.is_connected());
        assert!(conn.connect().unwrap());
        assert_eq!(log.connects(), 2);
    }

    #[test]
    fn test_nested_commit_sequence() {
        let (mut conn, log) = recording_connection();
        conn.start_transaction().unwrap();
        conn.start_transaction().unwrap();
        assert_eq!(conn.transaction_depth(), 2);
        conn.commit().unwrap();
        conn.commit().unwrap();
        assert_eq!(conn.transaction_depth(), 0);

        assert_eq!(
            log.statements(),
            vec![
                Recorded::Begin,
                Recorded::Exec("SAVEPOINT savepoint_level_1".to_string()),
                Recorded::Exec("RELEASE SAVEPOINT savepoint_level_1".to_string()),
                Recorded::Commit,
            ]
        );
    }

    #[test]
    fn test_nested_rollback_sequence() {
        let (mut conn, log) = recording_connection();
        conn.start_transaction().unwrap();
        conn.start_transaction().unwrap();
        conn.start_transaction().unwrap();
        conn.rollback().unwrap();
        conn.commit().unwrap();
        conn.rollback().unwrap();

        assert_eq!(
            log.statements(),
            vec![
                Recorded::Begin,
                Recorded::Exec("SAVEPOINT savepoint_level_1".to_string()),
                Recorded::Exec("SAVEPOINT savepoint_level_2".to_string()),
                Recorded::Exec("ROLLBACK TO SAVEPOINT savepoint_level_2".to_string()),
                Recorded::Exec("RELEASE SAVEPOINT savepoint_level_1".to_string()),
                Recorded::Rollback,
            ]
        );
    }

    #[test]
    fn test_commit_without_transaction_fails() {
        let (mut conn, log) = recording_connection();
        assert!(matches!(conn.commit(), Err(DbError::Transaction(_))));
        assert!(matches!(conn.rollback(), Err(DbError::Transaction(_))));
        assert_eq!(conn.transaction_depth(), 0);
        assert!(log.statements().is_empty());
    }

    #[test]
    fn test_cache_miss_does_not_connect() {
        let (mut conn, log) = recording_connection();
        match conn.run_cached_query("missing-alias", &[]) {
            Err(DbError::CacheMiss(alias)) => assert_eq!(alias, "missing-alias"),
            other => panic!("Expected CacheMiss, got {:?}", other),
        }
        assert!(!conn.is_connected());
        assert_eq!(log.connects(), 0);
    }

    #[test]
    fn test_cached_query_replays_text() {
        let (mut conn, log) = recording_connection();
        conn.run_query_cached("SELECT * FROM users WHERE id = ?", &[Value::from(1)], "user.by_id")
            .unwrap();
        conn.run_cached_query("user.by_id", &[Value::from(2)]).unwrap();

        assert_eq!(conn.cached_sql("user.by_id"), Some("SELECT * FROM users WHERE id = ?"));
        assert_eq!(
            log.statements(),
            vec![
                Recorded::Execute("SELECT * FROM users WHERE id = ?".to_string(), vec![Value::from(1)]),
                Recorded::Execute("SELECT * FROM users WHERE id = ?".to_string(), vec![Value::from(2)]),
            ]
        );
    }

    #[test]
    fn test_direct_query_without_params() {
        let (mut conn, log) = recording_connection();
        conn.run_query("SELECT 1", &[]).unwrap();
        assert_eq!(log.statements(), vec![Recorded::Query("SELECT 1".to_string())]);
    }

    #[test]
    fn test_transaction_closure_rolls_back_on_error() {
        let (mut conn, log) = recording_connection();
        let result: Result<()> = conn.transaction(|c| {
            c.run_query("DELETE FROM users", &[])?;
            Err(DbError::Transaction("abort".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(conn.transaction_depth(), 0);
        assert_eq!(
            log.statements(),
            vec![
                Recorded::Begin,
                Recorded::Query("DELETE FROM users".to_string()),
                Recorded::Rollback,
            ]
        );
    }

    #[test]
    fn test_transaction_keeps_body_error_when_rollback_fails() {
        let (mut conn, _) = recording_connection();
        let result: Result<()> = conn.transaction(|c| {
            c.commit()?;
            c.run_cached_query("missing", &[])?;
            Ok(())
        });
        match result {
            Err(DbError::CacheMiss(alias)) => assert_eq!(alias, "missing"),
            other => panic!("Expected CacheMiss, got {:?}", other),
        }
        assert_eq!(conn.transaction_depth(), 0);
    }

    #[test]
    fn test_engine_failures_are_rewrapped() {
        let (mut conn, log) = recording_connection();
        log.fail_next("deadlock found", 1213);
        match conn.run_query("UPDATE users SET a=1", &[]) {
            Err(DbError::Engine { message, code }) => {
                assert_eq!(message, "deadlock found");
                assert_eq!(code, 1213);
            }
            other => panic!("Expected Engine error, got {:?}", other),
        }
    }

    #[test]
    fn test_sqlite_savepoints_really_nest() {
        let mut conn = crate::core::db::Manager::make(&ConnectionParams::sqlite_memory()).unwrap();
        conn.run_query("CREATE TABLE t (v INTEGER)", &[]).unwrap();

        conn.start_transaction().unwrap();
        conn.run_query("INSERT INTO t (v) VALUES (?)", &[Value::from(1)]).unwrap();
        conn.start_transaction().unwrap();
        conn.run_query("INSERT INTO t (v) VALUES (?)", &[Value::from(2)]).unwrap();
        conn.rollback().unwrap();
        assert!(conn.in_transaction().unwrap());
        conn.commit().unwrap();
        assert!(!conn.in_transaction().unwrap());

        let mut result = conn.run_query("SELECT v FROM t", &[]).unwrap();
        assert_eq!(result.fetch_all_column(0), vec![Value::from(1)]);
    }
}
