use std::fmt;

/// The statement a query builder compiles to.
///
/// Exactly one command is active per builder; setting a new one replaces it.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `SELECT <columns> FROM ...`; an empty list selects `*`
    Select { columns: Vec<String> },
    /// `INSERT INTO ... (<columns>) VALUES (<placeholders>)`
    Insert { columns: Vec<String>, placeholders: usize },
    /// `INSERT INTO ... (<columns>) <copied select>`
    InsertWithCopy { columns: Vec<String> },
    /// `UPDATE ... SET <assignments>`, each assignment already `col=?`
    Update { assignments: Vec<String> },
    Delete,
}

/// Command discriminant, used for logging and for choosing how results are
/// returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Select,
    Insert,
    InsertWithCopy,
    Update,
    Delete,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Select { .. } => CommandKind::Select,
            Command::Insert { .. } => CommandKind::Insert,
            Command::InsertWithCopy { .. } => CommandKind::InsertWithCopy,
            Command::Update { .. } => CommandKind::Update,
            Command::Delete => CommandKind::Delete,
        }
    }
}

impl CommandKind {
    /// Whether the command produces rows rather than an execution status
    pub fn returns_rows(&self) -> bool {
        matches!(self, CommandKind::Select)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::Select => "select",
            CommandKind::Insert => "insert",
            CommandKind::InsertWithCopy => "insert_with_copy",
            CommandKind::Update => "update",
            CommandKind::Delete => "delete",
        };
        f.write_str(name)
    }
}
