//! Property-based tests for query compilation and column arrangement
//!
//! These tests verify that:
//! - Every extracted condition leaves exactly one placeholder behind
//! - A plain insert never compiles with conditions it cannot place
//! - Values line up with placeholders in emission order
//! - Compilation is deterministic
//! - Arranged constraints always follow column definitions

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use sqlforge::config::ConnectionParams;
    use sqlforge::query::Condition;
    use sqlforge::schema::{Arranger, MysqlSchemaGrammar, Table};
    use sqlforge::{DbError, Manager, Value};

    fn arb_identifier() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_]{0,15}".prop_map(|s: String| s)
    }

    fn arb_operator() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("=".to_string()),
            Just("!=".to_string()),
            Just(">".to_string()),
            Just("<".to_string()),
            Just(">=".to_string()),
            Just("<=".to_string()),
        ]
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z ]{0,12}".prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
            Just(Value::Null),
        ]
    }

    fn arb_condition() -> impl Strategy<Value = Condition> {
        (arb_identifier(), arb_operator(), arb_value())
            .prop_map(|(column, operator, value)| Condition::new(column, operator, value))
    }

    /// Where groups followed by And/Or continuation groups
    fn arb_groups() -> impl Strategy<Value = Vec<(u8, Vec<Condition>)>> {
        prop::collection::vec(
            (0u8..4, prop::collection::vec(arb_condition(), 1..4)),
            1..5,
        )
    }

    proptest! {
        #[test]
        fn placeholders_match_values(groups in arb_groups()) {
            let mut conn = Manager::make(&ConnectionParams::sqlite_memory()).unwrap();
            let mut qb = conn.query_builder();
            qb.table("items").select(["id"]);

            let mut expected = Vec::new();
            for (kind, conditions) in groups {
                for condition in &conditions {
                    if let Condition::Compare { value, .. } = condition {
                        expected.push(value.clone());
                    }
                }
                match kind {
                    0 => qb.where_(conditions),
                    1 => qb.or_where(conditions),
                    2 => qb.and(conditions),
                    _ => qb.or(conditions),
                };
            }

            let sql = qb.to_sql().unwrap();
            prop_assert_eq!(sql.matches('?').count(), expected.len());
            prop_assert_eq!(qb.values(), expected);
        }

        #[test]
        fn insert_placeholders_match_values(
            pairs in prop::collection::vec((arb_identifier(), arb_value()), 1..6),
            groups in prop::collection::vec(arb_groups(), 0..2),
        ) {
            let mut conn = Manager::make(&ConnectionParams::sqlite_memory()).unwrap();
            let mut qb = conn.query_builder();
            qb.table("items").insert(pairs.clone());

            let conditioned = !groups.is_empty();
            for (kind, conditions) in groups.into_iter().flatten() {
                match kind {
                    0 => qb.where_(conditions),
                    1 => qb.or_where(conditions),
                    2 => qb.and(conditions),
                    _ => qb.or(conditions),
                };
            }

            match qb.to_sql() {
                Ok(sql) => {
                    prop_assert!(!conditioned);
                    prop_assert_eq!(sql.matches('?').count(), qb.values().len());
                    let expected: Vec<Value> = pairs.into_iter().map(|(_, v)| v).collect();
                    prop_assert_eq!(qb.values(), expected);
                }
                Err(DbError::Compile(_)) => prop_assert!(conditioned),
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }

        #[test]
        fn compilation_is_deterministic(conditions in prop::collection::vec(arb_condition(), 1..6), limit in 1u64..1000) {
            let mut conn = Manager::make(&ConnectionParams::sqlite_memory()).unwrap();
            let mut qb = conn.query_builder();
            qb.table("items").delete().where_(conditions).limit(limit);

            let first = qb.to_sql().unwrap();
            let second = qb.to_sql().unwrap();
            prop_assert_eq!(first, second);
        }

        #[test]
        fn update_values_precede_condition_values(
            assignments in prop::collection::vec((arb_identifier(), arb_value()), 1..5),
            condition in arb_condition(),
        ) {
            let mut conn = Manager::make(&ConnectionParams::sqlite_memory()).unwrap();
            let mut qb = conn.query_builder();
            qb.table("items").where_(condition.clone()).update(assignments.clone());

            let mut expected: Vec<Value> = assignments.into_iter().map(|(_, v)| v).collect();
            if let Condition::Compare { value, .. } = condition {
                expected.push(value);
            }
            prop_assert_eq!(qb.values(), expected);
        }

        #[test]
        fn constraints_follow_columns(flags in prop::collection::vec((any::<bool>(), any::<bool>()), 1..8)) {
            let mut table = Table::new("t");
            for (i, (pk, fk)) in flags.iter().enumerate() {
                let column = table.integer(&format!("c{}", i));
                if *pk {
                    column.primary_key();
                }
                if *fk {
                    column.foreign_key().references("other", "id");
                }
            }

            let arranged = Arranger::new("t", &MysqlSchemaGrammar)
                .arrange(table.columns())
                .unwrap();
            let pk_count = flags.iter().filter(|(pk, _)| *pk).count();
            let fk_count = flags.iter().filter(|(_, fk)| *fk).count();

            prop_assert_eq!(arranged.columns.len(), flags.len());
            prop_assert_eq!(arranged.constraints.len(), usize::from(pk_count > 0) + fk_count);
            if pk_count > 0 {
                prop_assert!(arranged.constraints[0].contains("PRIMARY KEY"));
                prop_assert_eq!(arranged.constraints[0].starts_with("CONSTRAINT pk_t"), pk_count > 1);
            }
        }
    }
}
