//! Error types for the record store.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::db_types::ColumnType;

/// Which clause of a command failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseKind {
    Where,
    Set,
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClauseKind::Where => f.write_str("WHERE"),
            ClauseKind::Set => f.write_str("SET"),
        }
    }
}

/// Errors raised by the core. None of them is fatal to the process; the
/// command loop prints the message and reads the next line.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("table \"{0}\" already exists")]
    TableExists(String),

    #[error("table \"{0}\" does not exist")]
    TableNotExists(String),

    #[error("invalid table name \"{0}\"")]
    InvalidTableName(String),

    #[error("invalid column definition \"{0}\", expected <name>:<type>")]
    InvalidColumnSpec(String),

    #[error("unsupported data type \"{0}\", supported types: int, str, bool")]
    InvalidType(String),

    #[error("duplicate column \"{0}\"")]
    DuplicateColumn(String),

    #[error("expected {expected} values, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("malformed {kind} clause \"{text}\", expected <column> = <value>")]
    MalformedClause { kind: ClauseKind, text: String },

    #[error("cannot convert value \"{value}\" to type {expected}")]
    ParseError { value: String, expected: ColumnType },

    #[error("type mismatch for column {column}: expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: ColumnType,
        actual: ColumnType,
    },

    #[error("ID space exhausted, the highest ID is {0}")]
    IdExhausted(i64),

    #[error("unknown command \"{0}\", type help for the list of commands")]
    UnknownCommand(String),

    #[error("invalid command format, usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Failures of the JSON document store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt document {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
