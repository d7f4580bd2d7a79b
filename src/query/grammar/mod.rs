/// Query grammars compile a [`Command`] and its [`Clauses`] into SQL text.
///
/// Every dialect shares the default rendering below and overrides only the
/// pieces where its SQL differs.

mod mysql;
mod sqlite;

pub use mysql::MysqlGrammar;
pub use sqlite::SqliteGrammar;

use crate::core::db::Dialect;
use crate::core::{DbError, Result};
use crate::query::clause::{placeholders, Clauses, Conjunction, Fragment, JoinKind, Predicate, Target};
use crate::query::command::Command;
use std::fmt;

pub trait QueryGrammar: Send + Sync + fmt::Debug {
    fn dialect(&self) -> Dialect;

    /// Compiles one statement.
    ///
    /// Fails with `DbError::Compile` when no target table was set, or when
    /// a plain insert carries conditions it has nowhere to put.
    fn compile(&self, command: &Command, clauses: &Clauses) -> Result<String> {
        let target = clauses
            .target()
            .ok_or_else(|| DbError::Compile("no target table; call table() or from() first".to_string()))?;
        let fragments = clauses.fragments();

        match command {
            Command::Select { columns } => self.compile_select(columns, target, fragments),
            Command::Insert { .. } if clauses.has_conditions() => Err(DbError::Compile(
                "INSERT ... VALUES takes no WHERE or HAVING conditions".to_string(),
            )),
            Command::Insert {
                columns,
                placeholders,
            } => self.compile_insert(columns, *placeholders, target),
            Command::InsertWithCopy { columns } => self.compile_insert_with_copy(columns, target, fragments),
            Command::Update { assignments } => self.compile_update(assignments, target, fragments),
            Command::Delete => self.compile_delete(target, fragments),
        }
    }

    fn compile_select(&self, columns: &[String], target: &Target, fragments: &[Fragment]) -> Result<String> {
        let columns = if columns.is_empty() {
            "*".to_string()
        } else {
            columns.join(", ")
        };
        Ok(format!(
            "SELECT {} FROM {} {} {}",
            columns,
            target.table,
            target.alias,
            self.compile_fragments(fragments)?
        ))
    }

    fn compile_insert(&self, columns: &[String], count: usize, target: &Target) -> Result<String> {
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            target.table,
            columns.join(", "),
            placeholders(count)
        ))
    }

    fn compile_insert_with_copy(&self, columns: &[String], target: &Target, fragments: &[Fragment]) -> Result<String> {
        Ok(format!(
            "INSERT INTO {} ({}) {}",
            target.table,
            columns.join(", "),
            self.compile_fragments(fragments)?
        ))
    }

    fn compile_update(&self, assignments: &[String], target: &Target, fragments: &[Fragment]) -> Result<String> {
        Ok(format!(
            "UPDATE {} SET {} {}",
            target.table,
            assignments.join(", "),
            self.compile_fragments(fragments)?
        ))
    }

    fn compile_delete(&self, target: &Target, fragments: &[Fragment]) -> Result<String> {
        Ok(format!("DELETE FROM {} {}", target.table, self.compile_fragments(fragments)?))
    }

    /// Concatenates rendered fragments; each one ends with a single space
    fn compile_fragments(&self, fragments: &[Fragment]) -> Result<String> {
        let mut sql = String::new();
        for fragment in fragments {
            sql.push_str(&self.compile_fragment(fragment)?);
        }
        Ok(sql)
    }

    fn compile_fragment(&self, fragment: &Fragment) -> Result<String> {
        Ok(match fragment {
            Fragment::Where {
                conjunction,
                predicates,
            } => format!("WHERE {} ", self.join_predicates(predicates, *conjunction)),
            Fragment::Having {
                conjunction,
                predicates,
            } => format!("HAVING {} ", self.join_predicates(predicates, *conjunction)),
            Fragment::And(predicates) => self.compile_continuation(predicates, Conjunction::And),
            Fragment::Or(predicates) => self.compile_continuation(predicates, Conjunction::Or),
            Fragment::Join {
                kind,
                table,
                alias,
                condition,
            } => self.compile_join(*kind, table, alias, condition)?,
            Fragment::OrderBy(pairs) => {
                let pairs: Vec<String> = pairs
                    .iter()
                    .map(|(column, direction)| format!("{} {}", column, direction))
                    .collect();
                format!("ORDER BY {} ", pairs.join(", "))
            }
            Fragment::GroupBy(columns) => format!("GROUP BY {} ", columns.join(", ")),
            Fragment::Limit { limit, offset } => match offset {
                Some(offset) => format!("LIMIT {} OFFSET {} ", limit, offset),
                None => format!("LIMIT {} ", limit),
            },
            Fragment::Offset(offset) => self.compile_offset(*offset),
            Fragment::Union { all: false, sql } => format!("UNION {} ", sql),
            Fragment::Union { all: true, sql } => format!("UNION ALL {} ", sql),
            Fragment::Copy(sql) => format!("{} ", sql),
        })
    }

    /// `AND a` for one predicate, `AND (a AND b)` for several
    fn compile_continuation(&self, predicates: &[Predicate], conjunction: Conjunction) -> String {
        let joined = self.join_predicates(predicates, conjunction);
        if predicates.len() > 1 {
            format!("{} ({}) ", conjunction.as_str(), joined)
        } else {
            format!("{} {} ", conjunction.as_str(), joined)
        }
    }

    fn join_predicates(&self, predicates: &[Predicate], conjunction: Conjunction) -> String {
        let separator = format!(" {} ", conjunction.as_str());
        predicates
            .iter()
            .map(|p| self.compile_predicate(p))
            .collect::<Vec<_>>()
            .join(&separator)
    }

    fn compile_predicate(&self, predicate: &Predicate) -> String {
        match predicate {
            Predicate::Compare {
                column,
                operator,
                operand,
            } => format!("{} {} {}", column, operator, operand),
            Predicate::Raw(sql) => sql.clone(),
        }
    }

    fn compile_join(&self, kind: JoinKind, table: &str, alias: &str, condition: &str) -> Result<String> {
        let keyword = match kind {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL OUTER JOIN",
        };
        Ok(format!("{} {} {} ON {} ", keyword, table, alias, condition))
    }

    /// OFFSET without a LIMIT; both dialects need some LIMIT in front
    fn compile_offset(&self, offset: u64) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::Value;
    use crate::query::clause::{extract, IntoConditions};

    fn clauses(table: &str, alias: &str) -> Clauses {
        let mut clauses = Clauses::new();
        clauses.reset(table, alias);
        clauses
    }

    fn predicates<C: IntoConditions>(conditions: C) -> Vec<Predicate> {
        let mut values: Vec<Value> = Vec::new();
        extract(conditions.into_conditions(), &mut values)
    }

    #[test]
    fn test_select_with_where() {
        let mut c = clauses("users", "");
        c.push(Fragment::Where {
            conjunction: Conjunction::And,
            predicates: predicates(("age", ">", 18)),
        });
        let command = Command::Select {
            columns: vec!["id".to_string(), "name".to_string()],
        };
        assert_eq!(
            MysqlGrammar.compile(&command, &c).unwrap(),
            "SELECT id, name FROM users  WHERE age > ? "
        );
    }

    #[test]
    fn test_where_groups_are_not_parenthesized() {
        let mut c = clauses("users", "u");
        c.push(Fragment::Where {
            conjunction: Conjunction::Or,
            predicates: predicates([("a", "=", 1), ("b", "=", 2)]),
        });
        c.push(Fragment::And(predicates([("c", "=", 3), ("d", "=", 4)])));
        c.push(Fragment::Or(predicates(("e", "=", 5))));
        let sql = MysqlGrammar
            .compile(&Command::Select { columns: vec![] }, &c)
            .unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM users u WHERE a = ? OR b = ? AND (c = ? AND d = ?) OR e = ? "
        );
    }

    #[test]
    fn test_insert_update_delete() {
        let c = clauses("users", "");
        let insert = Command::Insert {
            columns: vec!["name".to_string(), "age".to_string()],
            placeholders: 2,
        };
        assert_eq!(
            SqliteGrammar.compile(&insert, &c).unwrap(),
            "INSERT INTO users (name, age) VALUES (?, ?)"
        );

        let mut c = clauses("users", "");
        c.push(Fragment::Where {
            conjunction: Conjunction::And,
            predicates: predicates(("id", "=", 1)),
        });
        let update = Command::Update {
            assignments: vec!["name=?".to_string()],
        };
        assert_eq!(
            SqliteGrammar.compile(&update, &c).unwrap(),
            "UPDATE users SET name=? WHERE id = ? "
        );
        assert_eq!(
            SqliteGrammar.compile(&Command::Delete, &c).unwrap(),
            "DELETE FROM users WHERE id = ? "
        );
    }

    #[test]
    fn test_missing_target() {
        let err = MysqlGrammar
            .compile(&Command::Delete, &Clauses::new())
            .unwrap_err();
        assert!(matches!(err, DbError::Compile(_)));
    }

    #[test]
    fn test_fragments() {
        let g = MysqlGrammar;
        assert_eq!(
            g.compile_fragment(&Fragment::OrderBy(vec![("name".to_string(), "DESC".to_string())]))
                .unwrap(),
            "ORDER BY name DESC "
        );
        assert_eq!(
            g.compile_fragment(&Fragment::GroupBy(vec!["a".to_string(), "b".to_string()]))
                .unwrap(),
            "GROUP BY a, b "
        );
        assert_eq!(
            g.compile_fragment(&Fragment::Join {
                kind: JoinKind::Inner,
                table: "posts".to_string(),
                alias: "p".to_string(),
                condition: "p.user_id = u.id".to_string(),
            })
            .unwrap(),
            "INNER JOIN posts p ON p.user_id = u.id "
        );
        assert_eq!(
            g.compile_fragment(&Fragment::Union {
                all: true,
                sql: "SELECT id FROM archived".to_string(),
            })
            .unwrap(),
            "UNION ALL SELECT id FROM archived "
        );
        assert_eq!(
            g.compile_fragment(&Fragment::Having {
                conjunction: Conjunction::And,
                predicates: predicates(("COUNT(id)", ">", 2)),
            })
            .unwrap(),
            "HAVING COUNT(id) > ? "
        );
    }
}
