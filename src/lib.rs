// Core infrastructure modules
pub mod config;
pub mod core;

// Statement building
pub mod query;
pub mod schema;

#[cfg(test)]
mod test_utils;

pub use crate::core::db::{Connection, Dialect, Manager, ResultSet, Row, Statement, Value};
pub use crate::core::{DbError, Result};
pub use crate::query::{Condition, Outcome, QueryBuilder};
pub use crate::schema::{Column, ColumnType, SchemaBuilder, Table};
