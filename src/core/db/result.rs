/// Result Set Module
///
/// Rows are materialized as soon as a statement finishes executing, so a
/// `ResultSet` outlives the statement that produced it and never holds a
/// borrow on the connection. The fetch methods keep a cursor so callers can
/// consume rows one at a time or all at once, whichever shape they need.

use crate::core::db::value::Value;
use crate::core::Result;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// One row of a result set, addressable by position or by column name.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Row { columns, values }
    }

    /// Column names, in select order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Values, in select order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Looks up a value by column name. The first matching column wins.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Renders the row as a JSON object keyed by column name
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .columns
            .iter()
            .zip(self.values.iter())
            .map(|(c, v)| {
                (
                    c.clone(),
                    serde_json::to_value(v).unwrap_or(serde_json::Value::Null),
                )
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

/// The materialized outcome of one executed statement.
#[derive(Debug, Clone)]
pub struct ResultSet {
    columns: Arc<[String]>,
    rows: Vec<Vec<Value>>,
    affected_rows: u64,
    cursor: usize,
}

impl ResultSet {
    /// Creates a result set for a statement that returned rows
    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        ResultSet {
            columns: columns.into(),
            rows,
            affected_rows: 0,
            cursor: 0,
        }
    }

    /// Creates a result set for a statement that only changed rows
    pub fn with_affected(affected_rows: u64) -> Self {
        ResultSet {
            columns: Vec::new().into(),
            rows: Vec::new(),
            affected_rows,
            cursor: 0,
        }
    }

    /// Whether the statement executed. A materialized result always did;
    /// failures surface as errors before a `ResultSet` exists.
    pub fn exec_status(&self) -> bool {
        true
    }

    pub fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows not yet fetched
    pub fn remaining(&self) -> usize {
        self.rows.len().saturating_sub(self.cursor)
    }

    /// Total number of rows returned by the statement
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Fetches the next row as positional values
    pub fn fetch_next_row(&mut self) -> Option<Vec<Value>> {
        let row = self.rows.get(self.cursor).cloned();
        if row.is_some() {
            self.cursor += 1;
        }
        row
    }

    /// Fetches the next row with its column names attached
    pub fn fetch_next_assoc(&mut self) -> Option<Row> {
        let columns = Arc::clone(&self.columns);
        self.fetch_next_row().map(|values| Row::new(columns, values))
    }

    /// Fetches a single column of the next row
    pub fn fetch_single_column(&mut self, column: usize) -> Option<Value> {
        self.fetch_next_row()
            .and_then(|mut values| (column < values.len()).then(|| values.swap_remove(column)))
    }

    /// Fetches every remaining row with column names attached
    pub fn fetch_all_rows(&mut self) -> Vec<Row> {
        let columns = Arc::clone(&self.columns);
        self.drain()
            .map(|values| Row::new(Arc::clone(&columns), values))
            .collect()
    }

    /// Fetches every remaining row as positional values
    pub fn fetch_all_numeric(&mut self) -> Vec<Vec<Value>> {
        self.drain().collect()
    }

    /// Fetches one column from every remaining row
    pub fn fetch_all_column(&mut self, column: usize) -> Vec<Value> {
        self.drain()
            .filter_map(|values| values.into_iter().nth(column))
            .collect()
    }

    /// Maps every remaining row through a callback
    pub fn fetch_all_with<T, F>(&mut self, mut callback: F) -> Vec<T>
    where
        F: FnMut(Row) -> T,
    {
        self.fetch_all_rows().into_iter().map(|r| callback(r)).collect()
    }

    /// Deserializes every remaining row into `T` through its JSON object form
    pub fn fetch_all_as<T: DeserializeOwned>(&mut self) -> Result<Vec<T>> {
        self.fetch_all_rows()
            .iter()
            .map(|row| Ok(serde_json::from_value(row.to_json())?))
            .collect()
    }

    fn drain(&mut self) -> impl Iterator<Item = Vec<Value>> + '_ {
        let start = self.cursor.min(self.rows.len());
        self.cursor = self.rows.len();
        self.rows[start..].iter().cloned()
    }
}
