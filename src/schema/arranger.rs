/// Linearizes column specifications into ordered DDL fragments.

use crate::core::{DbError, Result};
use crate::schema::column::Column;
use crate::schema::grammar::SchemaGrammar;

/// Arranged fragments: one definition per column, then the table-level
/// constraints (primary key first, then foreign keys).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arrangement {
    pub columns: Vec<String>,
    pub constraints: Vec<String>,
}

impl Arrangement {
    pub fn into_fragments(self) -> Vec<String> {
        let mut fragments = self.columns;
        fragments.extend(self.constraints);
        fragments
    }
}

pub struct Arranger<'a, G: SchemaGrammar + ?Sized> {
    table: &'a str,
    grammar: &'a G,
}

impl<'a, G: SchemaGrammar + ?Sized> Arranger<'a, G> {
    pub fn new(table: &'a str, grammar: &'a G) -> Self {
        Arranger { table, grammar }
    }

    /// Walks `columns` in declaration order.
    ///
    /// Fails with `DbError::ForeignKey` if any foreign-key column has no
    /// reference target; nothing is returned in that case.
    pub fn arrange(&self, columns: &[Column]) -> Result<Arrangement> {
        self.grammar.check_columns(self.table, columns)?;
        let mut definitions = Vec::with_capacity(columns.len());
        let mut primary_keys: Vec<&str> = Vec::new();
        let mut foreign_keys = Vec::new();

        for column in columns {
            definitions.push(self.grammar.compile_column(column)?);

            if self.grammar.in_table_primary_key(column) {
                primary_keys.push(column.name());
            }

            if column.is_foreign_key() {
                let references = column.get_references().ok_or_else(|| {
                    DbError::ForeignKey(format!(
                        "foreign key references are not set for {}.{}",
                        self.table,
                        column.name()
                    ))
                })?;
                foreign_keys.push(
                    self.grammar
                        .compile_foreign_key(self.table, column.name(), references),
                );
            }
        }

        let mut constraints = Vec::with_capacity(foreign_keys.len() + 1);
        match primary_keys.len() {
            0 => {}
            1 => constraints.push(self.grammar.compile_primary_key(&primary_keys)),
            _ => constraints.push(
                self.grammar
                    .compile_primary_key_constraint(self.table, &primary_keys),
            ),
        }
        constraints.extend(foreign_keys);

        Ok(Arrangement {
            columns: definitions,
            constraints,
        })
    }
}
