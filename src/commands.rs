use crate::db_types::{Column, Row};
use crate::predicate::Predicate;
use crate::rows::TableInfo;

/// A validated command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbCommand {
    CreateTable {
        table: String,
        columns: Vec<String>,
    },
    DropTable {
        table: String,
    },
    ListTables,
    Insert {
        table: String,
        values: Vec<String>,
    },
    Select {
        table: String,
        filter: Option<Predicate>,
    },
    Update {
        table: String,
        set: Predicate,
        filter: Option<Predicate>,
    },
    Delete {
        table: String,
        filter: Option<Predicate>,
    },
    Info {
        table: String,
    },
    Help,
    Exit,
}

impl DbCommand {
    pub fn name(&self) -> &'static str {
        match self {
            DbCommand::CreateTable { .. } => "create_table",
            DbCommand::DropTable { .. } => "drop_table",
            DbCommand::ListTables => "list_tables",
            DbCommand::Insert { .. } => "insert",
            DbCommand::Select { .. } => "select",
            DbCommand::Update { .. } => "update",
            DbCommand::Delete { .. } => "delete",
            DbCommand::Info { .. } => "info",
            DbCommand::Help => "help",
            DbCommand::Exit => "exit",
        }
    }

    /// Commands that may be gated behind a confirmation prompt.
    pub fn is_destructive(&self) -> bool {
        matches!(self, DbCommand::DropTable { .. } | DbCommand::Delete { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbResult {
    Created {
        table: String,
        columns: Vec<Column>,
    },
    Dropped {
        table: String,
    },
    Tables(Vec<String>),
    Inserted {
        table: String,
        id: i64,
    },
    Rows {
        columns: Vec<Column>,
        rows: Vec<Row>,
    },
    Updated {
        table: String,
        count: usize,
    },
    Deleted {
        table: String,
        count: usize,
    },
    Info(TableInfo),
    Help,
    Exit,
}
