/// Database Module
///
/// This module provides the connection layer of sqlforge, organized into
/// focused submodules.
///
/// ## Architecture
///
/// - **Drivers** (`driver`): open physical links and build DSN strings
/// - **Connection Management** (`connection.rs`): lazy connect, cached SQL, nested transactions
/// - **Statements and Results** (`statement.rs`, `result.rs`): prepared statements and materialized rows
/// - **Values** (`value.rs`): the dynamically typed value bound to placeholders
/// - **Manager** (`manager.rs`): selects driver and grammars for a dialect
///
/// ## Error Handling
///
/// Driver failures surface as `DriverError` and are rewrapped into
/// `DbError::Engine` when they cross the connection boundary.
pub mod connection;
pub mod driver;
pub mod manager;
pub mod result;
pub mod statement;
pub mod value;

pub use connection::*;
pub use driver::{Dialect, Driver, DriverError, Link};
pub use manager::Manager;
pub use result::{ResultSet, Row};
pub use statement::Statement;
pub use value::Value;
