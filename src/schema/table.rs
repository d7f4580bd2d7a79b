use crate::schema::column::{Column, ColumnType};

/// DDL commands queued on a [`Table`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create,
    AddColumn { columns: Vec<Column> },
    ChangeColumn { columns: Vec<Column> },
    CreateIndex { columns: Vec<String>, unique: bool },
    DropIfExists,
    DropPrimaryKey,
    DropForeignKey { name: String },
    DropColumn { name: String },
    DropIndex { name: String },
    RenameColumn { from: String, to: String },
    Rename { to: String },
}

/// A table definition: columns plus the commands to apply to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    commands: Vec<Command>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Table {
            name: name.into(),
            columns: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Commands queued so far, without the column commands added at compile time
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Adds a column and returns it for configuration
    pub fn column(&mut self, name: &str) -> &mut Column {
        let index = self.columns.len();
        self.columns.push(Column::new(name));
        &mut self.columns[index]
    }

    /// Adds a column that alters an existing one
    pub fn change(&mut self, name: &str) -> &mut Column {
        let column = self.column(name);
        column.change();
        column
    }

    /// `INT` auto-increment primary key
    pub fn increments(&mut self, name: &str) -> &mut Column {
        let column = self.column(name);
        column.column_type(ColumnType::Int).auto_increment().primary_key();
        column
    }

    pub fn string(&mut self, name: &str, width: u32) -> &mut Column {
        let column = self.column(name);
        column.column_type(ColumnType::Varchar).width(width);
        column
    }

    pub fn integer(&mut self, name: &str) -> &mut Column {
        let column = self.column(name);
        column.column_type(ColumnType::Int);
        column
    }

    pub fn big_integer(&mut self, name: &str) -> &mut Column {
        let column = self.column(name);
        column.column_type(ColumnType::BigInt);
        column
    }

    pub fn text(&mut self, name: &str) -> &mut Column {
        let column = self.column(name);
        column.column_type(ColumnType::Text);
        column
    }

    pub fn boolean(&mut self, name: &str) -> &mut Column {
        let column = self.column(name);
        column.column_type(ColumnType::Bool);
        column
    }

    pub fn timestamp(&mut self, name: &str) -> &mut Column {
        let column = self.column(name);
        column.column_type(ColumnType::Timestamp);
        column
    }

    pub fn enumeration<I, S>(&mut self, name: &str, options: I) -> &mut Column
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let column = self.column(name);
        column.column_type(ColumnType::Enum).options(options);
        column
    }

    pub fn create(&mut self) -> &mut Self {
        self.commands.push(Command::Create);
        self
    }

    pub fn index<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_index(columns, false)
    }

    pub fn unique_index<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push_index(columns, true)
    }

    fn push_index<I, S>(&mut self, columns: I, unique: bool) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commands.push(Command::CreateIndex {
            columns: columns.into_iter().map(Into::into).collect(),
            unique,
        });
        self
    }

    pub fn drop_if_exists(&mut self) -> &mut Self {
        self.commands.push(Command::DropIfExists);
        self
    }

    pub fn drop_primary_key(&mut self) -> &mut Self {
        self.commands.push(Command::DropPrimaryKey);
        self
    }

    pub fn drop_foreign_key(&mut self, name: &str) -> &mut Self {
        self.commands.push(Command::DropForeignKey {
            name: name.to_string(),
        });
        self
    }

    pub fn drop_column(&mut self, name: &str) -> &mut Self {
        self.commands.push(Command::DropColumn {
            name: name.to_string(),
        });
        self
    }

    pub fn drop_index(&mut self, name: &str) -> &mut Self {
        self.commands.push(Command::DropIndex {
            name: name.to_string(),
        });
        self
    }

    /// Unique constraints are indexes; same as [`drop_index`](Self::drop_index)
    pub fn drop_unique(&mut self, name: &str) -> &mut Self {
        self.drop_index(name)
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> &mut Self {
        self.commands.push(Command::RenameColumn {
            from: from.to_string(),
            to: to.to_string(),
        });
        self
    }

    pub fn rename(&mut self, to: &str) -> &mut Self {
        self.commands.push(Command::Rename { to: to.to_string() });
        self
    }

    fn creating(&self) -> bool {
        self.commands.iter().any(|c| matches!(c, Command::Create))
    }

    pub fn added_columns(&self) -> Vec<Column> {
        self.columns
            .iter()
            .filter(|c| !c.is_marked_for_change())
            .cloned()
            .collect()
    }

    pub fn changed_columns(&self) -> Vec<Column> {
        self.columns
            .iter()
            .filter(|c| c.is_marked_for_change())
            .cloned()
            .collect()
    }

    /// The full command list to compile.
    ///
    /// Unless the table is being created, pending columns become an
    /// `AddColumn` and a `ChangeColumn` command placed ahead of the queue,
    /// change first.
    pub fn planned_commands(&self) -> Vec<Command> {
        let mut planned = Vec::with_capacity(self.commands.len() + 2);

        if !self.creating() {
            let changed = self.changed_columns();
            if !changed.is_empty() {
                planned.push(Command::ChangeColumn { columns: changed });
            }
            let added = self.added_columns();
            if !added.is_empty() {
                planned.push(Command::AddColumn { columns: added });
            }
        }

        planned.extend(self.commands.iter().cloned());
        planned
    }
}
