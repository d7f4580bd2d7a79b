use super::{unsupported, SchemaGrammar};
use crate::core::db::driver::quote_literal;
use crate::core::db::{Dialect, Value};
use crate::core::Result;
use crate::schema::arranger::Arranger;
use crate::schema::column::Column;

/// SQLite DDL.
///
/// Auto-increment columns become `INTEGER PRIMARY KEY AUTOINCREMENT` inline,
/// ENUM and SET become `TEXT` guarded by a CHECK, and column additions run as
/// one statement per column. Column modification, key drops and
/// database-level statements have no SQLite form.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteSchemaGrammar;

impl SchemaGrammar for SqliteSchemaGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn compile_add_column(&self, table: &str, columns: &[Column]) -> Result<Vec<String>> {
        let arranged = Arranger::new(table, self).arrange(columns)?;
        if !arranged.constraints.is_empty() {
            return Err(unsupported(self.dialect(), "table constraints in ADD COLUMN"));
        }
        Ok(arranged
            .columns
            .into_iter()
            .map(|column| format!("ALTER TABLE {} ADD COLUMN {}", table, column))
            .collect())
    }

    fn compile_change_column(&self, _table: &str, _columns: &[Column]) -> Result<Vec<String>> {
        Err(unsupported(self.dialect(), "MODIFY COLUMN"))
    }

    fn compile_drop_primary_key(&self, _table: &str) -> Result<String> {
        Err(unsupported(self.dialect(), "DROP PRIMARY KEY"))
    }

    fn compile_drop_foreign_key(&self, _table: &str, _name: &str) -> Result<String> {
        Err(unsupported(self.dialect(), "DROP FOREIGN KEY"))
    }

    fn compile_drop_index(&self, _table: &str, index: &str) -> String {
        format!("DROP INDEX IF EXISTS {}", index)
    }

    fn compile_type(&self, column: &Column) -> String {
        let column_type = column.get_type();
        if column.is_auto_increment() {
            return "INTEGER".to_string();
        }
        if column_type.takes_options() {
            return "TEXT".to_string();
        }
        match column.get_width() {
            Some(width) => format!("{}({})", column_type, width),
            None => column_type.to_string(),
        }
    }

    fn compile_auto_increment(&self) -> &'static str {
        "PRIMARY KEY AUTOINCREMENT"
    }

    fn compile_options_check(&self, column: &Column) -> Option<String> {
        if !column.get_type().takes_options() {
            return None;
        }
        let options: Vec<String> = column.get_options().iter().map(|o| quote_literal(o)).collect();
        Some(self.compile_check(&format!("{} IN ({})", column.name(), options.join(", "))))
    }

    /// An AUTOINCREMENT column is the whole primary key, so it cannot share
    /// it with another key column
    fn check_columns(&self, table: &str, columns: &[Column]) -> Result<()> {
        let auto_increment = columns.iter().filter(|c| c.is_auto_increment()).count();
        let keyed = columns
            .iter()
            .filter(|c| c.is_auto_increment() || c.is_primary_key())
            .count();
        if auto_increment > 0 && keyed > 1 {
            return Err(unsupported(
                self.dialect(),
                &format!("AUTOINCREMENT inside a composite primary key on {}", table),
            ));
        }
        Ok(())
    }

    fn in_table_primary_key(&self, column: &Column) -> bool {
        column.is_primary_key() && !column.is_auto_increment()
    }

    fn compile_enable_foreign_key_checks(&self) -> String {
        "PRAGMA foreign_keys = ON".to_string()
    }

    fn compile_disable_foreign_key_checks(&self) -> String {
        "PRAGMA foreign_keys = OFF".to_string()
    }

    fn compile_table_exists(&self, _schema: &str, table: &str) -> (String, Vec<Value>) {
        (
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?".to_string(),
            vec![Value::from(table)],
        )
    }

    fn compile_tables(&self) -> String {
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'".to_string()
    }

    fn compile_create_database(&self, _name: &str) -> Result<String> {
        Err(unsupported(self.dialect(), "CREATE DATABASE"))
    }

    fn compile_drop_database(&self, _name: &str) -> Result<String> {
        Err(unsupported(self.dialect(), "DROP DATABASE"))
    }

    fn compile_use_database(&self, _name: &str) -> Result<String> {
        Err(unsupported(self.dialect(), "USE"))
    }
}
