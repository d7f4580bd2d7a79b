/// Error Module
///
/// This module defines the error type shared by every layer of the crate.
/// Driver failures are rewrapped into [`DbError::Engine`] at the connection
/// boundary so callers only ever match on one type.
use crate::core::db::driver::DriverError;
use thiserror::Error;

/// Comprehensive error type for sqlforge.
///
/// The variants fall into a few groups:
/// - Configuration (missing or unknown dialect, bad config files)
/// - Schema specification (foreign keys without a reference target)
/// - Compilation (builder misuse, commands a dialect cannot express)
/// - Runtime state (cache misses, unbalanced transactions)
/// - Engine failures reported by the underlying client library
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection parameters carry no dialect key
    #[error("Configuration error: a dialect is required")]
    DialectRequired,

    /// Connection parameters name a dialect we have no driver for
    #[error("Configuration error: unknown dialect '{0}'")]
    UnknownDialect(String),

    /// Configuration loading and lookup errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A foreign key column is missing its reference target
    #[error("Foreign key error: {0}")]
    ForeignKey(String),

    /// The builder was asked to compile something incomplete
    #[error("Compile error: {0}")]
    Compile(String),

    /// The selected dialect cannot express the requested command
    #[error("Unsupported by {dialect}: {feature}")]
    Unsupported {
        dialect: &'static str,
        feature: String,
    },

    /// Replay requested for an alias that was never cached
    #[error("Cache error: undefined cache alias '{0}'")]
    CacheMiss(String),

    /// Transaction-related errors
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Failure reported by the database engine
    #[error("Engine error [{code}]: {message}")]
    Engine { message: String, code: i64 },

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML configuration parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON conversion errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DbError {
    pub(crate) fn unsupported(dialect: &'static str, feature: impl Into<String>) -> Self {
        DbError::Unsupported {
            dialect,
            feature: feature.into(),
        }
    }

    /// Returns the engine error code, if this error came from the engine.
    pub fn code(&self) -> Option<i64> {
        match self {
            DbError::Engine { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<DriverError> for DbError {
    fn from(e: DriverError) -> Self {
        DbError::Engine {
            message: e.message,
            code: e.code,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> Self {
        DriverError::from(e).into()
    }
}

/// Type alias for Result to use DbError as the error type.
pub type Result<T> = std::result::Result<T, DbError>;
