use super::QueryGrammar;
use crate::core::db::Dialect;
use crate::core::{DbError, Result};
use crate::query::clause::JoinKind;

/// Largest LIMIT MySQL accepts; used to express "no limit"
const MAX_ROWS: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlGrammar;

impl QueryGrammar for MysqlGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    fn compile_join(&self, kind: JoinKind, table: &str, alias: &str, condition: &str) -> Result<String> {
        let keyword = match kind {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => return Err(DbError::unsupported("mysql", "FULL OUTER JOIN")),
        };
        Ok(format!("{} {} {} ON {} ", keyword, table, alias, condition))
    }

    fn compile_offset(&self, offset: u64) -> String {
        format!("LIMIT {} OFFSET {} ", MAX_ROWS, offset)
    }
}
