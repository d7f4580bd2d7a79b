use crate::core::db::Value;
use std::fmt;

/// Column data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Char,
    Varchar,
    Binary,
    Varbinary,
    TinyBlob,
    MediumBlob,
    LongBlob,
    Blob,
    TinyText,
    MediumText,
    LongText,
    Text,
    Enum,
    Set,
    Int,
    TinyInt,
    MediumInt,
    SmallInt,
    BigInt,
    Double,
    Float,
    Bit,
    Bool,
    Date,
    Time,
    DateTime,
    Year,
    Timestamp,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Char => "CHAR",
            ColumnType::Varchar => "VARCHAR",
            ColumnType::Binary => "BINARY",
            ColumnType::Varbinary => "VARBINARY",
            ColumnType::TinyBlob => "TINYBLOB",
            ColumnType::MediumBlob => "MEDIUMBLOB",
            ColumnType::LongBlob => "LONGBLOB",
            ColumnType::Blob => "BLOB",
            ColumnType::TinyText => "TINYTEXT",
            ColumnType::MediumText => "MEDIUMTEXT",
            ColumnType::LongText => "LONGTEXT",
            ColumnType::Text => "TEXT",
            ColumnType::Enum => "ENUM",
            ColumnType::Set => "SET",
            ColumnType::Int => "INT",
            ColumnType::TinyInt => "TINYINT",
            ColumnType::MediumInt => "MEDIUMINT",
            ColumnType::SmallInt => "SMALLINT",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Double => "DOUBLE",
            ColumnType::Float => "FLOAT",
            ColumnType::Bit => "BIT",
            ColumnType::Bool => "BOOL",
            ColumnType::Date => "DATE",
            ColumnType::Time => "TIME",
            ColumnType::DateTime => "DATETIME",
            ColumnType::Year => "YEAR",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }

    /// Width used when none was set explicitly
    pub fn default_width(&self) -> Option<u32> {
        match self {
            ColumnType::Varchar => Some(255),
            ColumnType::Char => Some(1),
            _ => None,
        }
    }

    /// ENUM and SET carry an option list instead of a width
    pub fn takes_options(&self) -> bool {
        matches!(self, ColumnType::Enum | ColumnType::Set)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column default.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// A literal, quoted by the grammar as needed
    Value(Value),
    /// Emitted verbatim, e.g. `CURRENT_TIMESTAMP`
    Expression(String),
}

/// Specification of one column, built fluently through [`Table`](super::Table).
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    width: Option<u32>,
    nullable: bool,
    unique: bool,
    primary_key: bool,
    foreign_key: bool,
    references: Option<String>,
    auto_increment: bool,
    default: Option<DefaultValue>,
    check: Option<String>,
    options: Vec<String>,
    change: bool,
}

impl Column {
    /// A `VARCHAR(255) NOT NULL` column
    pub fn new(name: impl Into<String>) -> Self {
        Column {
            name: name.into(),
            column_type: ColumnType::Varchar,
            width: None,
            nullable: false,
            unique: false,
            primary_key: false,
            foreign_key: false,
            references: None,
            auto_increment: false,
            default: None,
            check: None,
            options: Vec::new(),
            change: false,
        }
    }

    pub fn column_type(&mut self, column_type: ColumnType) -> &mut Self {
        self.column_type = column_type;
        self
    }

    pub fn width(&mut self, width: u32) -> &mut Self {
        self.width = Some(width);
        self
    }

    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }

    pub fn unique(&mut self) -> &mut Self {
        self.unique = true;
        self
    }

    pub fn auto_increment(&mut self) -> &mut Self {
        self.auto_increment = true;
        self
    }

    pub fn primary_key(&mut self) -> &mut Self {
        self.primary_key = true;
        self
    }

    pub fn foreign_key(&mut self) -> &mut Self {
        self.foreign_key = true;
        self
    }

    /// Sets the reference target to `table(column)`
    pub fn references(&mut self, table: &str, column: &str) -> &mut Self {
        self.references = Some(format!("{}({})", table, column));
        self
    }

    pub fn check(&mut self, expression: impl Into<String>) -> &mut Self {
        self.check = Some(expression.into());
        self
    }

    pub fn default(&mut self, value: impl Into<Value>) -> &mut Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    pub fn default_raw(&mut self, expression: impl Into<String>) -> &mut Self {
        self.default = Some(DefaultValue::Expression(expression.into()));
        self
    }

    /// Allowed values for ENUM and SET columns
    pub fn options<I, S>(&mut self, options: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Marks the column as an alteration of an existing one
    pub fn change(&mut self) -> &mut Self {
        self.change = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_type(&self) -> ColumnType {
        self.column_type
    }

    /// The explicit width, or the type's default width
    pub fn get_width(&self) -> Option<u32> {
        self.width.or_else(|| self.column_type.default_width())
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_foreign_key(&self) -> bool {
        self.foreign_key
    }

    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }

    pub fn get_references(&self) -> Option<&str> {
        self.references.as_deref()
    }

    pub fn get_default(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn get_check(&self) -> Option<&str> {
        self.check.as_deref()
    }

    pub fn get_options(&self) -> &[String] {
        &self.options
    }

    pub fn is_marked_for_change(&self) -> bool {
        self.change
    }
}
