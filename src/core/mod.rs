/// Core Module for sqlforge
///
/// This module contains the connection-level infrastructure: the error type,
/// drivers, the connection and its transaction state machine, statement and
/// result wrappers, and the manager that wires a dialect together.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{DbError, Result};
