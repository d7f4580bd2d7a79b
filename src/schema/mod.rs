/// Schema definition: tables, columns and the DDL they compile to.

pub mod arranger;
pub mod builder;
pub mod column;
pub mod grammar;
pub mod table;

pub use arranger::{Arrangement, Arranger};
pub use builder::SchemaBuilder;
pub use column::{Column, ColumnType, DefaultValue};
pub use grammar::{MysqlSchemaGrammar, SchemaGrammar, SqliteSchemaGrammar};
pub use table::{Command, Table};
