/// MySQL driver.
///
/// DSN construction is always available. Opening a link needs the `mysql`
/// cargo feature, which pulls in the synchronous `mysql` client.

use super::{append_dsn_fields, Dialect, Driver, DriverError, Link};
use crate::config::ConnectionParams;

/// Opens MySQL connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDriver;

impl MysqlDriver {
    pub fn new() -> Self {
        MysqlDriver
    }
}

impl Driver for MysqlDriver {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    #[cfg(feature = "mysql")]
    fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn Link>, DriverError> {
        client::connect(params)
    }

    #[cfg(not(feature = "mysql"))]
    fn connect(&self, _params: &ConnectionParams) -> Result<Box<dyn Link>, DriverError> {
        Err(DriverError::new(
            "Connection failed. [MySQL support requires the `mysql` feature]",
            -1,
        ))
    }

    fn make_dsn(&self, params: &ConnectionParams) -> String {
        let mut dsn = String::from("mysql:");
        append_dsn_fields(
            &mut dsn,
            &[
                ("host", params.host.clone().filter(|h| !h.is_empty())),
                ("port", params.port.map(|p| p.to_string())),
                ("dbname", params.name.clone()),
                ("unix_socket", params.unix_socket.clone()),
                ("charset", params.charset.clone()),
            ],
        );
        dsn
    }
}

#[cfg(feature = "mysql")]
mod client {
    use super::super::{quote_literal, DriverError, Link};
    use crate::config::ConnectionParams;
    use crate::core::db::result::ResultSet;
    use crate::core::db::value::Value;
    use ::mysql::prelude::Queryable;
    use tracing::debug;

    pub(super) fn connect(params: &ConnectionParams) -> Result<Box<dyn Link>, DriverError> {
        let mut builder = ::mysql::OptsBuilder::new()
            .ip_or_hostname(params.host.clone().filter(|h| !h.is_empty()))
            .tcp_port(params.port.unwrap_or(3306))
            .db_name(params.name.clone())
            .user(params.user.clone())
            .pass(params.password.clone())
            .socket(params.unix_socket.clone());

        if let Some(charset) = &params.charset {
            builder = builder.init(vec![format!("SET NAMES {}", charset)]);
        }

        if params.options.persistent_connection.unwrap_or(false) {
            debug!("persistent_connection requested; a single link is already kept open");
        }

        debug!("Opening MySQL connection");
        let conn = ::mysql::Conn::new(builder).map_err(|e| {
            let err = DriverError::from(e);
            DriverError::new(format!("Connection failed. [{}]", err.message), err.code)
        })?;

        Ok(Box::new(MysqlLink {
            conn,
            in_transaction: false,
        }))
    }

    pub(super) struct MysqlLink {
        conn: ::mysql::Conn,
        in_transaction: bool,
    }

    impl MysqlLink {
        fn collect<P: ::mysql::prelude::Protocol>(
            mut result: ::mysql::QueryResult<'_, '_, '_, P>,
        ) -> Result<ResultSet, DriverError> {
            let columns: Vec<String> = result
                .columns()
                .as_ref()
                .iter()
                .map(|c| c.name_str().to_string())
                .collect();

            if columns.is_empty() {
                return Ok(ResultSet::with_affected(result.affected_rows()));
            }

            let mut rows = Vec::new();
            if let Some(set) = result.iter() {
                for row in set {
                    rows.push(row?.unwrap().into_iter().map(from_mysql).collect());
                }
            }
            Ok(ResultSet::with_rows(columns, rows))
        }
    }

    impl Link for MysqlLink {
        fn prepare(&mut self, sql: &str) -> Result<usize, DriverError> {
            let stmt = self.conn.prep(sql)?;
            Ok(usize::from(stmt.num_params()))
        }

        fn execute(&mut self, sql: &str, params: &[Value]) -> Result<ResultSet, DriverError> {
            let params: Vec<::mysql::Value> = params.iter().map(to_mysql).collect();
            let result = self.conn.exec_iter(sql, ::mysql::Params::Positional(params))?;
            Self::collect(result)
        }

        fn query(&mut self, sql: &str) -> Result<ResultSet, DriverError> {
            let result = self.conn.query_iter(sql)?;
            Self::collect(result)
        }

        fn exec(&mut self, sql: &str) -> Result<u64, DriverError> {
            self.conn.query_drop(sql)?;
            Ok(self.conn.affected_rows())
        }

        fn begin(&mut self) -> Result<bool, DriverError> {
            self.conn.query_drop("START TRANSACTION")?;
            self.in_transaction = true;
            Ok(true)
        }

        fn commit(&mut self) -> Result<bool, DriverError> {
            self.conn.query_drop("COMMIT")?;
            self.in_transaction = false;
            Ok(true)
        }

        fn rollback(&mut self) -> Result<bool, DriverError> {
            self.conn.query_drop("ROLLBACK")?;
            self.in_transaction = false;
            Ok(true)
        }

        fn last_inserted_id(&mut self, _name: Option<&str>) -> Result<String, DriverError> {
            Ok(self.conn.last_insert_id().to_string())
        }

        fn in_transaction(&self) -> bool {
            self.in_transaction
        }

        fn quote(&self, text: &str) -> Result<String, DriverError> {
            Ok(quote_literal(&text.replace('\\', "\\\\")))
        }
    }

    impl From<::mysql::Error> for DriverError {
        fn from(e: ::mysql::Error) -> Self {
            match &e {
                ::mysql::Error::MySqlError(server) => {
                    DriverError::new(server.message.clone(), i64::from(server.code))
                }
                _ => DriverError::new(e.to_string(), -1),
            }
        }
    }

    fn to_mysql(value: &Value) -> ::mysql::Value {
        match value {
            Value::Null => ::mysql::Value::NULL,
            Value::Integer(i) => ::mysql::Value::Int(*i),
            Value::Real(f) => ::mysql::Value::Double(*f),
            Value::Text(s) => ::mysql::Value::Bytes(s.as_bytes().to_vec()),
            Value::Bool(b) => ::mysql::Value::Int(i64::from(*b)),
            Value::Blob(b) => ::mysql::Value::Bytes(b.clone()),
        }
    }

    fn from_mysql(value: ::mysql::Value) -> Value {
        match value {
            ::mysql::Value::NULL => Value::Null,
            ::mysql::Value::Int(i) => Value::Integer(i),
            ::mysql::Value::UInt(u) => i64::try_from(u).map_or(Value::Text(u.to_string()), Value::Integer),
            ::mysql::Value::Float(f) => Value::Real(f64::from(f)),
            ::mysql::Value::Double(f) => Value::Real(f),
            ::mysql::Value::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(text) => Value::Text(text),
                Err(e) => Value::Blob(e.into_bytes()),
            },
            other => Value::Text(other.as_sql(true).trim_matches('\'').to_string()),
        }
    }
}
