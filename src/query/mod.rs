/// Row-level query building and compilation.

pub mod builder;
pub mod clause;
pub mod command;
pub mod grammar;

pub use builder::{Outcome, QueryBuilder};
pub use clause::{Clauses, Condition, Fragment, IntoConditions, Predicate, Target};
pub use command::{Command, CommandKind};
pub use grammar::{MysqlGrammar, QueryGrammar, SqliteGrammar};
