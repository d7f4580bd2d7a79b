/// Schema Builder Module
///
/// Entry point for DDL. Each call builds a transient [`Table`], compiles it
/// with the connection's schema grammar and runs the statements in order.
/// Compilation finishes before the first statement is sent, so a bad
/// definition never leaves a half-applied change behind.

use crate::core::db::{Connection, Value};
use crate::core::Result;
use crate::schema::grammar::SchemaGrammar;
use crate::schema::table::Table;
use std::sync::Arc;
use tracing::{debug, info};

pub struct SchemaBuilder<'c> {
    conn: &'c mut Connection,
    grammar: Arc<dyn SchemaGrammar>,
}

impl<'c> SchemaBuilder<'c> {
    pub fn new(conn: &'c mut Connection) -> Self {
        let grammar = conn.schema_grammar();
        SchemaBuilder { conn, grammar }
    }

    /// Creates `name`, letting `define` add columns, keys and indexes.
    pub fn create<F>(&mut self, name: &str, define: F) -> Result<()>
    where
        F: FnOnce(&mut Table),
    {
        let mut table = Table::new(name);
        table.create();
        define(&mut table);
        self.build(&table)
    }

    /// Alters an existing table.
    pub fn table<F>(&mut self, name: &str, alter: F) -> Result<()>
    where
        F: FnOnce(&mut Table),
    {
        let mut table = Table::new(name);
        alter(&mut table);
        self.build(&table)
    }

    pub fn drop_if_exists(&mut self, name: &str) -> Result<()> {
        let mut table = Table::new(name);
        table.drop_if_exists();
        self.build(&table)
    }

    pub fn rename_table(&mut self, from: &str, to: &str) -> Result<()> {
        let mut table = Table::new(from);
        table.rename(to);
        self.build(&table)
    }

    /// Whether `name` exists as a base table in the connection's schema
    pub fn exists(&mut self, name: &str) -> Result<bool> {
        let (sql, params) = self.grammar.compile_table_exists(self.conn.schema(), name);
        let mut result = self.conn.run_query(&sql, &params)?;
        Ok(!result.fetch_all_numeric().is_empty())
    }

    /// Names of all base tables
    pub fn tables(&mut self) -> Result<Vec<String>> {
        let sql = self.grammar.compile_tables();
        let mut result = self.conn.run_query(&sql, &[])?;
        Ok(result
            .fetch_all_column(0)
            .into_iter()
            .filter_map(|value| match value {
                Value::Text(name) => Some(name),
                _ => None,
            })
            .collect())
    }

    pub fn enable_foreign_key_checks(&mut self) -> Result<()> {
        let sql = self.grammar.compile_enable_foreign_key_checks();
        self.execute(&sql)
    }

    pub fn disable_foreign_key_checks(&mut self) -> Result<()> {
        let sql = self.grammar.compile_disable_foreign_key_checks();
        self.execute(&sql)
    }

    pub fn create_database_if_not_exists(&mut self, name: &str) -> Result<()> {
        let sql = self.grammar.compile_create_database(name)?;
        self.execute(&sql)
    }

    pub fn drop_database_if_exists(&mut self, name: &str) -> Result<()> {
        let sql = self.grammar.compile_drop_database(name)?;
        self.execute(&sql)
    }

    /// Switches the active database and records it as the connection's schema
    pub fn use_database(&mut self, name: &str) -> Result<()> {
        let sql = self.grammar.compile_use_database(name)?;
        self.execute(&sql)?;
        self.conn.set_schema(name);
        Ok(())
    }

    /// Compiles `table` without running anything
    pub fn to_sql(&self, table: &Table) -> Result<Vec<String>> {
        self.grammar.compile(table)
    }

    fn build(&mut self, table: &Table) -> Result<()> {
        let statements = self.grammar.compile(table)?;
        info!(
            "Applying {} schema statement(s) to {}",
            statements.len(),
            table.name()
        );
        for sql in &statements {
            self.execute(sql)?;
        }
        Ok(())
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        debug!("DDL: {}", sql);
        self.conn.run_query(sql.trim(), &[])?;
        Ok(())
    }
}
