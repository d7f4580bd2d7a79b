/// Query Builder Module
///
/// A fluent accumulator of one [`Command`], its clause fragments and the
/// positional parameters that go with them. The builder borrows its
/// connection mutably for as long as it lives.

use crate::core::db::{Connection, Row, Value};
use crate::core::{DbError, Result};
use crate::query::clause::{self, Clauses, Conjunction, Fragment, IntoConditions, JoinKind};
use crate::query::command::Command;
use crate::query::grammar::QueryGrammar;
use std::sync::Arc;
use tracing::debug;

/// What running a builder produced
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Execution status of insert, update and delete statements
    Executed(bool),
    /// Rows returned by a select
    Rows(Vec<Row>),
}

impl Outcome {
    pub fn rows(self) -> Vec<Row> {
        match self {
            Outcome::Rows(rows) => rows,
            Outcome::Executed(_) => Vec::new(),
        }
    }
}

/// Fluent statement builder bound to one connection.
///
/// ```no_run
/// use sqlforge::config::ConnectionParams;
/// use sqlforge::core::db::Manager;
///
/// let mut conn = Manager::make(&ConnectionParams::sqlite_memory()).unwrap();
/// let mut qb = conn.query_builder();
/// qb.table("users").select(["id", "name"]).where_(("age", ">", 18));
/// assert_eq!(qb.to_sql().unwrap(), "SELECT id, name FROM users  WHERE age > ? ");
/// ```
pub struct QueryBuilder<'c> {
    conn: &'c mut Connection,
    grammar: Arc<dyn QueryGrammar>,
    command: Option<Command>,
    command_values: Vec<Value>,
    clauses: Clauses,
    clause_values: Vec<Value>,
}

impl<'c> QueryBuilder<'c> {
    pub fn new(conn: &'c mut Connection) -> Self {
        let grammar = conn.query_grammar();
        QueryBuilder {
            conn,
            grammar,
            command: None,
            command_values: Vec::new(),
            clauses: Clauses::new(),
            clause_values: Vec::new(),
        }
    }

    fn set_command(&mut self, command: Command, values: Vec<Value>) -> &mut Self {
        self.command = Some(command);
        self.command_values = values;
        self
    }

    pub fn select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        self.set_command(Command::Select { columns }, Vec::new())
    }

    /// `INSERT` of one row given as `(column, value)` pairs
    pub fn insert<I, K, V>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let (columns, values): (Vec<String>, Vec<Value>) =
            pairs.into_iter().map(|(k, v)| (k.into(), v.into())).unzip();
        let placeholders = columns.len();
        self.set_command(Command::Insert { columns, placeholders }, values)
    }

    /// `INSERT INTO ... (columns)` followed by SQL supplied with [`copy`](Self::copy)
    pub fn insert_with_copy<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        self.set_command(Command::InsertWithCopy { columns }, Vec::new())
    }

    pub fn copy(&mut self, sql: impl Into<String>) -> &mut Self {
        self.clauses.push(Fragment::Copy(sql.into()));
        self
    }

    pub fn update<I, K, V>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let (assignments, values): (Vec<String>, Vec<Value>) = pairs
            .into_iter()
            .map(|(k, v)| (format!("{}=?", k.into()), v.into()))
            .unzip();
        self.set_command(Command::Update { assignments }, values)
    }

    pub fn delete(&mut self) -> &mut Self {
        self.set_command(Command::Delete, Vec::new())
    }

    /// Sets the target table. Clears the clause fragments and their values,
    /// keeps the command.
    pub fn table(&mut self, table: impl Into<String>) -> &mut Self {
        self.table_as(table, "")
    }

    pub fn table_as(&mut self, table: impl Into<String>, alias: impl Into<String>) -> &mut Self {
        self.clauses.reset(table, alias);
        self.clause_values.clear();
        self
    }

    /// Same as [`table_as`](Self::table_as); reads better after `select`
    pub fn from(&mut self, table: impl Into<String>, alias: impl Into<String>) -> &mut Self {
        self.table_as(table, alias)
    }

    pub fn from_table(&mut self, table: impl Into<String>) -> &mut Self {
        self.table_as(table, "")
    }

    fn push_conditions<C: IntoConditions>(&mut self, conditions: C, wrap: impl FnOnce(Vec<clause::Predicate>) -> Fragment) -> &mut Self {
        let predicates = clause::extract(conditions.into_conditions(), &mut self.clause_values);
        if !predicates.is_empty() {
            self.clauses.push(wrap(predicates));
        }
        self
    }

    pub fn where_<C: IntoConditions>(&mut self, conditions: C) -> &mut Self {
        self.push_conditions(conditions, |predicates| Fragment::Where {
            conjunction: Conjunction::And,
            predicates,
        })
    }

    pub fn or_where<C: IntoConditions>(&mut self, conditions: C) -> &mut Self {
        self.push_conditions(conditions, |predicates| Fragment::Where {
            conjunction: Conjunction::Or,
            predicates,
        })
    }

    pub fn and<C: IntoConditions>(&mut self, conditions: C) -> &mut Self {
        self.push_conditions(conditions, Fragment::And)
    }

    pub fn or<C: IntoConditions>(&mut self, conditions: C) -> &mut Self {
        self.push_conditions(conditions, Fragment::Or)
    }

    pub fn having<C: IntoConditions>(&mut self, conditions: C) -> &mut Self {
        self.push_conditions(conditions, |predicates| Fragment::Having {
            conjunction: Conjunction::And,
            predicates,
        })
    }

    pub fn or_having<C: IntoConditions>(&mut self, conditions: C) -> &mut Self {
        self.push_conditions(conditions, |predicates| Fragment::Having {
            conjunction: Conjunction::Or,
            predicates,
        })
    }

    fn push_where(&mut self, predicate: clause::Predicate) -> &mut Self {
        self.clauses.push(Fragment::Where {
            conjunction: Conjunction::And,
            predicates: vec![predicate],
        });
        self
    }

    pub fn where_between(&mut self, column: &str, low: impl Into<Value>, high: impl Into<Value>) -> &mut Self {
        let p = clause::between(column, false, low.into(), high.into(), &mut self.clause_values);
        self.push_where(p)
    }

    pub fn where_not_between(&mut self, column: &str, low: impl Into<Value>, high: impl Into<Value>) -> &mut Self {
        let p = clause::between(column, true, low.into(), high.into(), &mut self.clause_values);
        self.push_where(p)
    }

    pub fn where_in<I, V>(&mut self, column: &str, list: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let list = list.into_iter().map(Into::into).collect();
        let p = clause::in_list(column, false, list, &mut self.clause_values);
        self.push_where(p)
    }

    pub fn where_not_in<I, V>(&mut self, column: &str, list: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let list = list.into_iter().map(Into::into).collect();
        let p = clause::in_list(column, true, list, &mut self.clause_values);
        self.push_where(p)
    }

    pub fn where_like(&mut self, column: &str, pattern: impl Into<Value>) -> &mut Self {
        let p = clause::like(column, false, pattern.into(), &mut self.clause_values);
        self.push_where(p)
    }

    pub fn where_not_like(&mut self, column: &str, pattern: impl Into<Value>) -> &mut Self {
        let p = clause::like(column, true, pattern.into(), &mut self.clause_values);
        self.push_where(p)
    }

    pub fn and_like(&mut self, column: &str, pattern: impl Into<Value>) -> &mut Self {
        let p = clause::like(column, false, pattern.into(), &mut self.clause_values);
        self.clauses.push(Fragment::And(vec![p]));
        self
    }

    pub fn and_not_like(&mut self, column: &str, pattern: impl Into<Value>) -> &mut Self {
        let p = clause::like(column, true, pattern.into(), &mut self.clause_values);
        self.clauses.push(Fragment::And(vec![p]));
        self
    }

    pub fn or_like(&mut self, column: &str, pattern: impl Into<Value>) -> &mut Self {
        let p = clause::like(column, false, pattern.into(), &mut self.clause_values);
        self.clauses.push(Fragment::Or(vec![p]));
        self
    }

    pub fn or_not_like(&mut self, column: &str, pattern: impl Into<Value>) -> &mut Self {
        let p = clause::like(column, true, pattern.into(), &mut self.clause_values);
        self.clauses.push(Fragment::Or(vec![p]));
        self
    }

    /// `ORDER BY` from `(column, direction)` pairs; directions are upper-cased
    pub fn order_by<I, K, D>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, D)>,
        K: Into<String>,
        D: AsRef<str>,
    {
        let pairs = pairs
            .into_iter()
            .map(|(column, direction)| (column.into(), direction.as_ref().to_uppercase()))
            .collect();
        self.clauses.push(Fragment::OrderBy(pairs));
        self
    }

    pub fn group_by<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.clauses
            .push(Fragment::GroupBy(columns.into_iter().map(Into::into).collect()));
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.clauses.push_limit(limit);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.clauses.push_offset(offset);
        self
    }

    fn join(&mut self, kind: JoinKind, table: &str, condition: &str, alias: &str) -> &mut Self {
        self.clauses.push(Fragment::Join {
            kind,
            table: table.to_string(),
            alias: alias.to_string(),
            condition: condition.to_string(),
        });
        self
    }

    pub fn inner_join(&mut self, table: &str, condition: &str, alias: &str) -> &mut Self {
        self.join(JoinKind::Inner, table, condition, alias)
    }

    pub fn left_join(&mut self, table: &str, condition: &str, alias: &str) -> &mut Self {
        self.join(JoinKind::Left, table, condition, alias)
    }

    pub fn right_join(&mut self, table: &str, condition: &str, alias: &str) -> &mut Self {
        self.join(JoinKind::Right, table, condition, alias)
    }

    pub fn full_join(&mut self, table: &str, condition: &str, alias: &str) -> &mut Self {
        self.join(JoinKind::Full, table, condition, alias)
    }

    pub fn union(&mut self, sql: impl Into<String>) -> &mut Self {
        self.clauses.push(Fragment::Union {
            all: false,
            sql: sql.into(),
        });
        self
    }

    pub fn union_all(&mut self, sql: impl Into<String>) -> &mut Self {
        self.clauses.push(Fragment::Union {
            all: true,
            sql: sql.into(),
        });
        self
    }

    /// Compiles the statement without executing it.
    pub fn to_sql(&self) -> Result<String> {
        let command = self
            .command
            .as_ref()
            .ok_or_else(|| DbError::Compile("no command; call select, insert, update or delete first".to_string()))?;
        self.grammar.compile(command, &self.clauses)
    }

    /// The positional parameters, in placeholder order
    pub fn values(&self) -> Vec<Value> {
        self.command_values
            .iter()
            .chain(self.clause_values.iter())
            .cloned()
            .collect()
    }

    pub fn clauses(&self) -> &Clauses {
        &self.clauses
    }

    /// Compiles and executes the statement, then clears the positional
    /// parameters.
    pub fn run(&mut self) -> Result<Outcome> {
        let sql = self.to_sql()?;
        let kind = self
            .command
            .as_ref()
            .map(Command::kind)
            .ok_or_else(|| DbError::Compile("no command".to_string()))?;
        let values = self.values();
        debug!(%kind, sql = sql.trim(), "running builder statement");

        let mut result = self.conn.run_query(sql.trim(), &values)?;
        self.command_values.clear();
        self.clause_values.clear();

        if kind.returns_rows() {
            Ok(Outcome::Rows(result.fetch_all_rows()))
        } else {
            Ok(Outcome::Executed(result.exec_status()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{recording_connection, Recorded};

    #[test]
    fn test_select_where() {
        let (mut conn, _) = recording_connection();
        let mut qb = conn.query_builder();
        qb.table("users").select(["id", "name"]).where_(("age", ">", 18));
        assert_eq!(qb.to_sql().unwrap(), "SELECT id, name FROM users  WHERE age > ? ");
        assert_eq!(qb.values(), vec![Value::from(18)]);
        assert_eq!(qb.to_sql().unwrap(), qb.to_sql().unwrap());
    }

    #[test]
    fn test_command_values_precede_clause_values() {
        let (mut conn, _) = recording_connection();
        let mut qb = conn.query_builder();
        qb.table("users")
            .where_(("id", "=", 7))
            .update([("name", Value::from("Ada")), ("age", Value::from(36))]);
        assert_eq!(qb.to_sql().unwrap(), "UPDATE users SET name=?, age=? WHERE id = ? ");
        assert_eq!(
            qb.values(),
            vec![Value::from("Ada"), Value::from(36), Value::from(7)]
        );
    }

    #[test]
    fn test_table_resets_clauses_not_command() {
        let (mut conn, _) = recording_connection();
        let mut qb = conn.query_builder();
        qb.select(["id"]).table("users").where_(("a", "=", 1)).table("orders");
        assert_eq!(qb.to_sql().unwrap(), "SELECT id FROM orders  ");
        assert!(qb.values().is_empty());
    }

    #[test]
    fn test_missing_command_or_target() {
        let (mut conn, _) = recording_connection();
        let mut qb = conn.query_builder();
        qb.table("users");
        assert!(matches!(qb.to_sql(), Err(DbError::Compile(_))));

        let (mut conn, _) = recording_connection();
        let mut qb = conn.query_builder();
        qb.delete();
        assert!(matches!(qb.to_sql(), Err(DbError::Compile(_))));
    }

    #[test]
    fn test_extended_where_forms_use_placeholders() {
        let (mut conn, _) = recording_connection();
        let mut qb = conn.query_builder();
        qb.table("products")
            .select(Vec::<String>::new())
            .where_between("price", 10, 20)
            .and_like("name", "%phone%")
            .or_not_like("name", "%case%")
            .where_in("category", [1, 2, 3]);
        assert_eq!(
            qb.to_sql().unwrap(),
            "SELECT * FROM products  WHERE price BETWEEN ? AND ? AND name LIKE ? \
             OR name NOT LIKE ? WHERE category IN (?, ?, ?) "
        );
        assert_eq!(qb.values().len(), 7);
    }

    #[test]
    fn test_order_group_limit_offset() {
        let (mut conn, _) = recording_connection();
        let mut qb = conn.query_builder();
        qb.select(["dept", "COUNT(*)"])
            .from("employees", "e")
            .group_by(["dept"])
            .having(("COUNT(*)", ">", 5))
            .order_by([("dept", "desc")])
            .limit(10)
            .offset(20);
        assert_eq!(
            qb.to_sql().unwrap(),
            "SELECT dept, COUNT(*) FROM employees e GROUP BY dept HAVING COUNT(*) > ? \
             ORDER BY dept DESC LIMIT 10 OFFSET 20 "
        );
    }

    #[test]
    fn test_insert_with_copy() {
        let (mut conn, _) = recording_connection();
        let mut qb = conn.query_builder();
        qb.table("archive")
            .insert_with_copy(["id", "name"])
            .copy("SELECT id, name FROM users WHERE active = 0");
        assert_eq!(
            qb.to_sql().unwrap(),
            "INSERT INTO archive (id, name) SELECT id, name FROM users WHERE active = 0 "
        );
    }

    #[test]
    fn test_run_trims_and_clears_values() {
        let (mut conn, log) = recording_connection();
        {
            let mut qb = conn.query_builder();
            qb.table("users").delete().where_(("id", "!=", 1));
            assert_eq!(qb.run().unwrap(), Outcome::Executed(true));
            assert!(qb.values().is_empty());
        }
        assert_eq!(
            log.statements(),
            vec![Recorded::Execute(
                "DELETE FROM users WHERE NOT id = ?".to_string(),
                vec![Value::from(1)]
            )]
        );
    }

    #[test]
    fn test_insert_rejects_conditions() {
        let (mut conn, log) = recording_connection();
        {
            let mut qb = conn.query_builder();
            qb.table("users")
                .insert([("name", "a")])
                .where_(("id", "=", 1));
            assert!(matches!(qb.to_sql(), Err(DbError::Compile(_))));
            assert!(matches!(qb.run(), Err(DbError::Compile(_))));
        }
        assert!(log.statements().is_empty());
    }

    #[test]
    fn test_repeated_offset_keeps_one_limit() {
        let (mut conn, _) = recording_connection();
        let mut qb = conn.query_builder();
        qb.table("users").select(["id"]).limit(10).offset(20).offset(5);
        assert_eq!(qb.to_sql().unwrap(), "SELECT id FROM users  LIMIT 10 OFFSET 5 ");

        qb.table("users").offset(5).limit(10).limit(3);
        assert_eq!(qb.to_sql().unwrap(), "SELECT id FROM users  LIMIT 3 OFFSET 5 ");
    }
}
