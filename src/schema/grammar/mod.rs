/// Schema grammars compile [`Table`] definitions into DDL statements.
///
/// Compilation dispatches on the closed [`Command`] enum. Dialects override
/// the individual pieces where their DDL differs and report commands they
/// cannot express as `DbError::Unsupported`.

mod mysql;
mod sqlite;

pub use mysql::MysqlSchemaGrammar;
pub use sqlite::SqliteSchemaGrammar;

use crate::core::db::driver::quote_literal;
use crate::core::db::{Dialect, Value};
use crate::core::{DbError, Result};
use crate::schema::arranger::{Arrangement, Arranger};
use crate::schema::column::{Column, DefaultValue};
use crate::schema::table::{Command, Table};
use std::fmt;

pub trait SchemaGrammar: Send + Sync + fmt::Debug {
    fn dialect(&self) -> Dialect;

    /// Compiles every planned command of `table`, in order.
    ///
    /// Nothing is returned unless every command compiles.
    fn compile(&self, table: &Table) -> Result<Vec<String>> {
        let name = table.name();
        let mut statements = Vec::new();

        for command in table.planned_commands() {
            match command {
                Command::Create => statements.push(self.compile_create(table)?),
                Command::AddColumn { columns } => {
                    statements.extend(self.compile_add_column(name, &columns)?)
                }
                Command::ChangeColumn { columns } => {
                    statements.extend(self.compile_change_column(name, &columns)?)
                }
                Command::CreateIndex { columns, unique } => {
                    statements.push(self.compile_create_index(name, &columns, unique))
                }
                Command::DropIfExists => statements.push(self.compile_drop_if_exists(name)),
                Command::DropPrimaryKey => statements.push(self.compile_drop_primary_key(name)?),
                Command::DropForeignKey { name: key } => {
                    statements.push(self.compile_drop_foreign_key(name, &key)?)
                }
                Command::DropColumn { name: column } => {
                    statements.push(self.compile_drop_column(name, &column))
                }
                Command::DropIndex { name: index } => {
                    statements.push(self.compile_drop_index(name, &index))
                }
                Command::RenameColumn { from, to } => {
                    statements.push(self.compile_rename_column(name, &from, &to))
                }
                Command::Rename { to } => statements.push(self.compile_rename_table(name, &to)),
            }
        }

        Ok(statements)
    }

    fn compile_create(&self, table: &Table) -> Result<String> {
        let fragments = Arranger::new(table.name(), self).arrange(table.columns())?.into_fragments();
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            table.name(),
            fragments.join(", ")
        ))
    }

    /// `ALTER TABLE t ADD COLUMN a ..., ADD COLUMN b ..., ADD <constraint>`
    fn compile_add_column(&self, table: &str, columns: &[Column]) -> Result<Vec<String>> {
        let arranged = Arranger::new(table, self).arrange(columns)?;
        Ok(vec![alter_with(table, "ADD COLUMN", arranged)])
    }

    fn compile_change_column(&self, table: &str, columns: &[Column]) -> Result<Vec<String>> {
        let arranged = Arranger::new(table, self).arrange(columns)?;
        Ok(vec![alter_with(table, "MODIFY COLUMN", arranged)])
    }

    /// Index name is `idx_<table>_<columns joined by _>`
    fn compile_create_index(&self, table: &str, columns: &[String], unique: bool) -> String {
        format!(
            "CREATE {}INDEX idx_{}_{} ON {} ({})",
            if unique { "UNIQUE " } else { "" },
            table,
            columns.join("_"),
            table,
            columns.join(", ")
        )
    }

    fn compile_drop_if_exists(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", table)
    }

    fn compile_drop_primary_key(&self, table: &str) -> Result<String> {
        Ok(format!("ALTER TABLE {} DROP PRIMARY KEY", table))
    }

    fn compile_drop_foreign_key(&self, table: &str, name: &str) -> Result<String> {
        Ok(format!("ALTER TABLE {} DROP FOREIGN KEY {}", table, name))
    }

    fn compile_drop_column(&self, table: &str, column: &str) -> String {
        format!("ALTER TABLE {} DROP COLUMN {}", table, column)
    }

    fn compile_drop_index(&self, table: &str, index: &str) -> String {
        format!("ALTER TABLE {} DROP INDEX {}", table, index)
    }

    fn compile_rename_column(&self, table: &str, from: &str, to: &str) -> String {
        format!("ALTER TABLE {} RENAME COLUMN {} TO {}", table, from, to)
    }

    fn compile_rename_table(&self, from: &str, to: &str) -> String {
        format!("ALTER TABLE {} RENAME TO {}", from, to)
    }

    /// `<name> <TYPE> <NULL|NOT NULL> [auto increment] [UNIQUE] [DEFAULT v] [CHECK(expr)]`
    fn compile_column(&self, column: &Column) -> Result<String> {
        let mut sql = format!(
            "{} {} {}",
            column.name(),
            self.compile_type(column),
            self.compile_nullable(column.is_nullable())
        );

        if column.is_auto_increment() {
            sql.push(' ');
            sql.push_str(self.compile_auto_increment());
        }
        if column.is_unique() {
            sql.push(' ');
            sql.push_str(self.compile_unique());
        }
        if let Some(default) = column.get_default() {
            sql.push(' ');
            sql.push_str(&self.compile_default(default)?);
        }
        if let Some(check) = self.compile_options_check(column) {
            sql.push(' ');
            sql.push_str(&check);
        }
        if let Some(expression) = column.get_check() {
            sql.push(' ');
            sql.push_str(&self.compile_check(expression));
        }

        Ok(sql)
    }

    fn compile_type(&self, column: &Column) -> String {
        let column_type = column.get_type();
        if column_type.takes_options() {
            let options: Vec<String> = column.get_options().iter().map(|o| quote_literal(o)).collect();
            return format!("{}({})", column_type, options.join(", "));
        }
        match column.get_width() {
            Some(width) => format!("{}({})", column_type, width),
            None => column_type.to_string(),
        }
    }

    fn compile_nullable(&self, nullable: bool) -> &'static str {
        if nullable {
            "NULL"
        } else {
            "NOT NULL"
        }
    }

    fn compile_auto_increment(&self) -> &'static str;

    fn compile_unique(&self) -> &'static str {
        "UNIQUE"
    }

    fn compile_default(&self, default: &DefaultValue) -> Result<String> {
        Ok(match default {
            DefaultValue::Value(value) => format!("DEFAULT {}", literal(value)?),
            DefaultValue::Expression(expression) => format!("DEFAULT {}", expression),
        })
    }

    fn compile_check(&self, expression: &str) -> String {
        format!("CHECK({})", expression)
    }

    /// Extra CHECK for dialects without native ENUM/SET types
    fn compile_options_check(&self, _column: &Column) -> Option<String> {
        None
    }

    /// Rejects column sets the dialect cannot declare; runs before any
    /// fragment is rendered
    fn check_columns(&self, _table: &str, _columns: &[Column]) -> Result<()> {
        Ok(())
    }

    /// Whether the column belongs in the table-level primary key
    fn in_table_primary_key(&self, column: &Column) -> bool {
        column.is_primary_key()
    }

    fn compile_primary_key(&self, columns: &[&str]) -> String {
        format!("PRIMARY KEY({})", columns.join(", "))
    }

    fn compile_primary_key_constraint(&self, table: &str, columns: &[&str]) -> String {
        format!("CONSTRAINT pk_{} PRIMARY KEY ({})", table, columns.join(", "))
    }

    fn compile_foreign_key(&self, table: &str, column: &str, references: &str) -> String {
        format!(
            "CONSTRAINT fk_{}_{} FOREIGN KEY({}) REFERENCES {}",
            table, column, column, references
        )
    }

    fn compile_enable_foreign_key_checks(&self) -> String;

    fn compile_disable_foreign_key_checks(&self) -> String;

    /// Query and parameters answering whether `table` exists in `schema`
    fn compile_table_exists(&self, schema: &str, table: &str) -> (String, Vec<Value>);

    /// Query listing base tables; the name is in the first column
    fn compile_tables(&self) -> String;

    fn compile_create_database(&self, name: &str) -> Result<String>;

    fn compile_drop_database(&self, name: &str) -> Result<String>;

    fn compile_use_database(&self, name: &str) -> Result<String>;
}

/// Renders a literal for DDL. NaN and infinities have no SQL literal.
pub(crate) fn literal(value: &Value) -> Result<String> {
    Ok(match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) if !f.is_finite() => {
            return Err(DbError::Compile(format!("{} has no SQL literal form", f)));
        }
        Value::Real(f) => f.to_string(),
        Value::Text(s) => quote_literal(s),
        Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        Value::Blob(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
            format!("X'{}'", hex)
        }
    })
}

/// One ALTER TABLE with each column behind `keyword` and each constraint
/// behind `ADD`
fn alter_with(table: &str, keyword: &str, arranged: Arrangement) -> String {
    let parts: Vec<String> = arranged
        .columns
        .into_iter()
        .map(|c| format!("{} {}", keyword, c))
        .chain(arranged.constraints.into_iter().map(|c| format!("ADD {}", c)))
        .collect();
    format!("ALTER TABLE {} {}", table, parts.join(", "))
}

pub(crate) fn unsupported(dialect: Dialect, feature: &str) -> DbError {
    DbError::unsupported(dialect.as_str(), feature)
}
