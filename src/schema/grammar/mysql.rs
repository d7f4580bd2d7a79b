use super::SchemaGrammar;
use crate::core::db::{Dialect, Value};
use crate::core::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlSchemaGrammar;

impl SchemaGrammar for MysqlSchemaGrammar {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    fn compile_auto_increment(&self) -> &'static str {
        "AUTO_INCREMENT"
    }

    fn compile_enable_foreign_key_checks(&self) -> String {
        "SET FOREIGN_KEY_CHECKS=1;".to_string()
    }

    fn compile_disable_foreign_key_checks(&self) -> String {
        "SET FOREIGN_KEY_CHECKS=0;".to_string()
    }

    fn compile_table_exists(&self, schema: &str, table: &str) -> (String, Vec<Value>) {
        (
            "SELECT * FROM information_schema.tables WHERE table_schema = ? AND table_name = ? \
             AND table_type = 'BASE TABLE'"
                .to_string(),
            vec![Value::from(schema), Value::from(table)],
        )
    }

    fn compile_tables(&self) -> String {
        "SHOW FULL TABLES WHERE table_type = 'BASE TABLE'".to_string()
    }

    fn compile_create_database(&self, name: &str) -> Result<String> {
        Ok(format!("CREATE DATABASE IF NOT EXISTS {}", name))
    }

    fn compile_drop_database(&self, name: &str) -> Result<String> {
        Ok(format!("DROP DATABASE IF EXISTS {}", name))
    }

    fn compile_use_database(&self, name: &str) -> Result<String> {
        Ok(format!("USE {}", name))
    }
}
