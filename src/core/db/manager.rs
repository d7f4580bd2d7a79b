/// Connection Factory
///
/// The manager turns connection parameters into a ready (but not yet
/// connected) [`Connection`], wiring the driver and both grammars for the
/// requested dialect.

use crate::config::{ConnectionParams, DatabaseConfig};
use crate::core::db::connection::Connection;
use crate::core::db::driver::{Dialect, Driver, MysqlDriver, SqliteDriver};
use crate::core::{DbError, Result};
use crate::query::grammar::{MysqlGrammar, QueryGrammar, SqliteGrammar};
use crate::schema::grammar::{MysqlSchemaGrammar, SchemaGrammar, SqliteSchemaGrammar};
use std::sync::Arc;
use tracing::debug;

pub struct Manager;

impl Manager {
    /// Builds a connection for `params.dialect`.
    ///
    /// No connection attempt is made; the link opens on first use.
    ///
    /// # Errors
    ///
    /// * `DbError::DialectRequired` when no dialect is given
    /// * `DbError::UnknownDialect` when the dialect is not supported
    pub fn make(params: &ConnectionParams) -> Result<Connection> {
        let dialect: Dialect = params
            .dialect
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .ok_or(DbError::DialectRequired)?
            .parse()?;

        debug!("Making {} connection", dialect);
        let (driver, query_grammar, schema_grammar) = Self::components(dialect);
        let mut conn = Connection::new(params.clone(), driver, query_grammar, schema_grammar);
        if let Some(name) = &params.name {
            conn.set_schema(name.as_str());
        }

        Ok(conn)
    }

    /// Builds a connection from a named configuration entry, or the default
    /// entry when `name` is `None`.
    pub fn from_config(config: &DatabaseConfig, name: Option<&str>) -> Result<Connection> {
        Self::make(config.connection(name)?)
    }

    fn components(
        dialect: Dialect,
    ) -> (Box<dyn Driver>, Arc<dyn QueryGrammar>, Arc<dyn SchemaGrammar>) {
        match dialect {
            Dialect::Mysql => (
                Box::new(MysqlDriver::new()),
                Arc::new(MysqlGrammar),
                Arc::new(MysqlSchemaGrammar),
            ),
            Dialect::Sqlite => (
                Box::new(SqliteDriver::new()),
                Arc::new(SqliteGrammar),
                Arc::new(SqliteSchemaGrammar),
            ),
        }
    }
}
