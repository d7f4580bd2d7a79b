use super::QueryGrammar;
use crate::core::db::Dialect;

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteGrammar;

impl QueryGrammar for SqliteGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn compile_offset(&self, offset: u64) -> String {
        // a negative LIMIT means unbounded
        format!("LIMIT -1 OFFSET {} ", offset)
    }
}
