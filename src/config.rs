use crate::core::{DbError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration structure parsed from a TOML file.
///
/// ```toml
/// default = "main"
///
/// [connections.main]
/// dialect = "sqlite"
/// name = "app.db"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// Connection used when a caller does not name one
    pub default: Option<String>,
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionParams>,
}

impl DatabaseConfig {
    /// Looks up a named connection entry, falling back to the default one.
    pub fn connection(&self, name: Option<&str>) -> Result<&ConnectionParams> {
        let key = name
            .or(self.default.as_deref())
            .ok_or_else(|| DbError::Config("no connection named and no default set".to_string()))?;

        self.connections
            .get(key)
            .ok_or_else(|| DbError::Config(format!("no connection named '{}'", key)))
    }
}

/// Parameters for one physical connection.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConnectionParams {
    /// Dialect key, e.g. "mysql" or "sqlite"
    pub dialect: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Database (schema) name; the file path for SQLite
    pub name: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub unix_socket: Option<String>,
    pub charset: Option<String>,
    #[serde(default)]
    pub options: ConnectionOptions,
}

impl ConnectionParams {
    /// Parameters with only the dialect set
    pub fn for_dialect(dialect: &str) -> Self {
        ConnectionParams {
            dialect: Some(dialect.to_string()),
            ..Default::default()
        }
    }

    /// In-memory SQLite parameters, handy for tests and scratch work
    pub fn sqlite_memory() -> Self {
        ConnectionParams {
            dialect: Some("sqlite".to_string()),
            name: Some(":memory:".to_string()),
            ..Default::default()
        }
    }
}

/// Driver options.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConnectionOptions {
    pub persistent_connection: Option<bool>,
}

/// Loads configuration from a TOML file at the given path.
///
/// # Arguments
///
/// * `path` - The file path to the TOML configuration file.
///
/// # Example
///
/// ```no_run
/// let config = sqlforge::config::load_config("database.toml").expect("Failed to load config");
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DatabaseConfig> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Default location of the configuration file:
/// `<config dir>/sqlforge/database.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sqlforge").join("database.toml"))
}
