/// Clause fragments collected by the query builder.
///
/// The builder never emits SQL text itself. It records structured fragments
/// in call order and the grammar renders them. Conditions pass through
/// extraction first, which moves every value into the positional parameter
/// list and leaves a `?` in its place.

use crate::core::db::Value;

/// Table the statement operates on
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Target {
    pub table: String,
    pub alias: String,
}

/// A condition as supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        column: String,
        operator: String,
        value: Value,
    },
    /// Emitted verbatim; contributes no parameter
    Raw(String),
}

impl Condition {
    pub fn new(column: impl Into<String>, operator: impl Into<String>, value: impl Into<Value>) -> Self {
        Condition::Compare {
            column: column.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        Condition::Raw(sql.into())
    }
}

/// A condition after extraction: the value has become a placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: String,
        operator: String,
        operand: String,
    },
    Raw(String),
}

impl Predicate {
    fn compare(column: impl Into<String>, operator: impl Into<String>, operand: impl Into<String>) -> Self {
        Predicate::Compare {
            column: column.into(),
            operator: operator.into(),
            operand: operand.into(),
        }
    }
}

/// Conversion into a list of conditions, so condition-taking builder calls
/// accept a single tuple, an array of tuples, or prepared [`Condition`]s.
pub trait IntoConditions {
    fn into_conditions(self) -> Vec<Condition>;
}

impl IntoConditions for Condition {
    fn into_conditions(self) -> Vec<Condition> {
        vec![self]
    }
}

impl IntoConditions for Vec<Condition> {
    fn into_conditions(self) -> Vec<Condition> {
        self
    }
}

impl<const N: usize> IntoConditions for [Condition; N] {
    fn into_conditions(self) -> Vec<Condition> {
        self.into_iter().collect()
    }
}

impl<'a, 'b, V: Into<Value>> IntoConditions for (&'a str, &'b str, V) {
    fn into_conditions(self) -> Vec<Condition> {
        vec![Condition::new(self.0, self.1, self.2)]
    }
}

impl<'a, 'b, V: Into<Value>, const N: usize> IntoConditions for [(&'a str, &'b str, V); N] {
    fn into_conditions(self) -> Vec<Condition> {
        self.into_iter()
            .map(|(column, operator, value)| Condition::new(column, operator, value))
            .collect()
    }
}

impl IntoConditions for &str {
    fn into_conditions(self) -> Vec<Condition> {
        vec![Condition::raw(self)]
    }
}

/// Moves each condition's value into `values` and returns the predicates.
///
/// `!=` is rewritten as `NOT <column> = ?`.
pub(crate) fn extract(conditions: Vec<Condition>, values: &mut Vec<Value>) -> Vec<Predicate> {
    conditions
        .into_iter()
        .map(|condition| match condition {
            Condition::Compare {
                column,
                operator,
                value,
            } => {
                values.push(value);
                if operator == "!=" {
                    Predicate::compare(format!("NOT {}", column), "=", "?")
                } else {
                    Predicate::compare(column, operator, "?")
                }
            }
            Condition::Raw(sql) => Predicate::Raw(sql),
        })
        .collect()
}

/// `<column> [NOT ]BETWEEN ? AND ?`
pub(crate) fn between(column: &str, negated: bool, low: Value, high: Value, values: &mut Vec<Value>) -> Predicate {
    values.push(low);
    values.push(high);
    Predicate::compare(column, negate("BETWEEN", negated), "? AND ?")
}

/// `<column> [NOT ]IN (?, ...)`. An empty list renders `(NULL)`, which
/// matches no row.
pub(crate) fn in_list(column: &str, negated: bool, list: Vec<Value>, values: &mut Vec<Value>) -> Predicate {
    let operand = if list.is_empty() {
        "(NULL)".to_string()
    } else {
        format!("({})", placeholders(list.len()))
    };
    values.extend(list);
    Predicate::compare(column, negate("IN", negated), operand)
}

/// `<column> [NOT ]LIKE ?`
pub(crate) fn like(column: &str, negated: bool, pattern: Value, values: &mut Vec<Value>) -> Predicate {
    values.push(pattern);
    Predicate::compare(column, negate("LIKE", negated), "?")
}

fn negate(operator: &str, negated: bool) -> String {
    if negated {
        format!("NOT {}", operator)
    } else {
        operator.to_string()
    }
}

/// `?, ?, ?` for `count` parameters
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// How the predicates of one group are joined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

/// One clause fragment, rendered by the grammar in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// `WHERE a AND b`; the conjunction is `OR` for the `or_where` form
    Where {
        conjunction: Conjunction,
        predicates: Vec<Predicate>,
    },
    Having {
        conjunction: Conjunction,
        predicates: Vec<Predicate>,
    },
    /// Continuation group joined with `AND`
    And(Vec<Predicate>),
    /// Continuation group joined with `OR`
    Or(Vec<Predicate>),
    Join {
        kind: JoinKind,
        table: String,
        alias: String,
        condition: String,
    },
    /// `(column, DIRECTION)` pairs
    OrderBy(Vec<(String, String)>),
    GroupBy(Vec<String>),
    Limit { limit: u64, offset: Option<u64> },
    /// An offset with no preceding limit
    Offset(u64),
    Union { all: bool, sql: String },
    /// Raw SQL consumed by insert-with-copy
    Copy(String),
}

impl Fragment {
    /// WHERE, HAVING and their continuation groups
    pub fn is_conditional(&self) -> bool {
        matches!(
            self,
            Fragment::Where { .. } | Fragment::Having { .. } | Fragment::And(_) | Fragment::Or(_)
        )
    }
}

/// The target slot plus the ordered fragment list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clauses {
    target: Option<Target>,
    fragments: Vec<Fragment>,
}

impl Clauses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target and drops every fragment collected so far
    pub fn reset(&mut self, table: impl Into<String>, alias: impl Into<String>) {
        self.fragments.clear();
        self.target = Some(Target {
            table: table.into(),
            alias: alias.into(),
        });
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn push(&mut self, fragment: Fragment) {
        self.fragments.push(fragment);
    }

    /// Sets the statement's limit, keeping an offset recorded earlier.
    /// A statement carries at most one LIMIT; later calls replace it.
    pub fn push_limit(&mut self, limit: u64) {
        match self.paging_mut() {
            Some(Fragment::Limit { limit: slot, .. }) => *slot = limit,
            Some(fragment) => {
                if let Fragment::Offset(offset) = *fragment {
                    *fragment = Fragment::Limit {
                        limit,
                        offset: Some(offset),
                    };
                }
            }
            None => self.fragments.push(Fragment::Limit { limit, offset: None }),
        }
    }

    /// Sets the statement's offset, attaching it to the limit if there is
    /// one. Later calls replace the earlier offset.
    pub fn push_offset(&mut self, offset: u64) {
        match self.paging_mut() {
            Some(Fragment::Limit { offset: slot, .. }) => *slot = Some(offset),
            Some(fragment) => *fragment = Fragment::Offset(offset),
            None => self.fragments.push(Fragment::Offset(offset)),
        }
    }

    /// The single `Limit` or `Offset` fragment, if any
    fn paging_mut(&mut self) -> Option<&mut Fragment> {
        self.fragments
            .iter_mut()
            .find(|fragment| matches!(fragment, Fragment::Limit { .. } | Fragment::Offset(_)))
    }

    /// Whether any fragment carries conditions (and so positional values)
    pub fn has_conditions(&self) -> bool {
        self.fragments.iter().any(Fragment::is_conditional)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_moves_values() {
        let mut values = Vec::new();
        let predicates = extract(
            [("age", ">", 18), ("score", "<=", 90)].into_conditions(),
            &mut values,
        );
        assert_eq!(values, vec![Value::from(18), Value::from(90)]);
        assert_eq!(
            predicates[0],
            Predicate::Compare {
                column: "age".to_string(),
                operator: ">".to_string(),
                operand: "?".to_string(),
            }
        );
    }

    #[test]
    fn test_extract_rewrites_not_equal() {
        let mut values = Vec::new();
        let predicates = extract(("status", "!=", "banned").into_conditions(), &mut values);
        assert_eq!(
            predicates,
            vec![Predicate::Compare {
                column: "NOT status".to_string(),
                operator: "=".to_string(),
                operand: "?".to_string(),
            }]
        );
        assert_eq!(values, vec![Value::from("banned")]);
    }

    #[test]
    fn test_raw_conditions_take_no_value() {
        let mut values = Vec::new();
        let predicates = extract("u.id = p.user_id".into_conditions(), &mut values);
        assert!(values.is_empty());
        assert_eq!(predicates, vec![Predicate::Raw("u.id = p.user_id".to_string())]);
    }

    #[test]
    fn test_in_list() {
        let mut values = Vec::new();
        let p = in_list("id", true, vec![Value::from(1), Value::from(2)], &mut values);
        assert_eq!(
            p,
            Predicate::Compare {
                column: "id".to_string(),
                operator: "NOT IN".to_string(),
                operand: "(?, ?)".to_string(),
            }
        );
        assert_eq!(values.len(), 2);

        let p = in_list("id", false, vec![], &mut values);
        assert!(matches!(p, Predicate::Compare { ref operand, .. } if operand == "(NULL)"));
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_reset_clears_fragments() {
        let mut clauses = Clauses::new();
        clauses.reset("users", "");
        clauses.push(Fragment::GroupBy(vec!["id".to_string()]));
        clauses.reset("orders", "o");
        assert!(clauses.fragments().is_empty());
        assert_eq!(clauses.target().unwrap().alias, "o");
    }

    #[test]
    fn test_offset_joins_limit() {
        let mut clauses = Clauses::new();
        clauses.push(Fragment::OrderBy(vec![("id".to_string(), "ASC".to_string())]));
        clauses.push_limit(10);
        clauses.push_offset(20);
        clauses.push_offset(5);
        assert_eq!(
            clauses.fragments(),
            &[
                Fragment::OrderBy(vec![("id".to_string(), "ASC".to_string())]),
                Fragment::Limit { limit: 10, offset: Some(5) },
            ]
        );
    }

    #[test]
    fn test_limit_after_offset_keeps_one_fragment() {
        let mut clauses = Clauses::new();
        clauses.push_offset(30);
        clauses.push_offset(40);
        assert_eq!(clauses.fragments(), &[Fragment::Offset(40)]);

        clauses.push_limit(15);
        clauses.push_limit(25);
        assert_eq!(
            clauses.fragments(),
            &[Fragment::Limit { limit: 25, offset: Some(40) }]
        );
    }

    #[test]
    fn test_has_conditions() {
        let mut clauses = Clauses::new();
        clauses.push(Fragment::GroupBy(vec!["city".to_string()]));
        assert!(!clauses.has_conditions());
        clauses.push(Fragment::Or(vec![Predicate::Raw("a = 1".to_string())]));
        assert!(clauses.has_conditions());
    }
}
