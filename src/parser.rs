//! Turns one input line into a `DbCommand`.
//!
//! Tokens are split on whitespace, except inside single or double quotes.
//! Quotes stay part of the token so that value parsing can tell `"30"` from
//! `30`.

use crate::commands::DbCommand;
use crate::error::{ClauseKind, DbError};
use crate::predicate::Predicate;

pub const CREATE_TABLE_USAGE: &str = "create_table <table> <column:type> [<column:type> ...]";
pub const DROP_TABLE_USAGE: &str = "drop_table <table>";
pub const LIST_TABLES_USAGE: &str = "list_tables";
pub const INSERT_USAGE: &str = "insert into <table> values (<value1>, <value2>, ...)";
pub const SELECT_USAGE: &str = "select from <table> [where <column> = <value>]";
pub const UPDATE_USAGE: &str = "update <table> set <column> = <value> where <column> = <value>";
pub const DELETE_USAGE: &str = "delete from <table> where <column> = <value>";
pub const INFO_USAGE: &str = "info <table>";
pub const HELP_USAGE: &str = "help";
pub const EXIT_USAGE: &str = "exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    /// Byte offset of the token in the line.
    pub start: usize,
}

pub fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = None;
    let mut quote = None;

    for (i, ch) in line.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch.is_whitespace() => {
                if let Some(s) = start.take() {
                    tokens.push(Token {
                        text: &line[s..i],
                        start: s,
                    });
                }
            }
            None => {
                start.get_or_insert(i);
                if ch == '"' || ch == '\'' {
                    quote = Some(ch);
                }
            }
        }
    }
    // An unterminated quote runs to the end of the line.
    if let Some(s) = start {
        tokens.push(Token {
            text: &line[s..],
            start: s,
        });
    }
    tokens
}

/// Splits the inside of `( ... )` on commas that are not quoted. Pieces are
/// trimmed and empty pieces dropped.
pub fn split_values(content: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut quote = None;

    for ch in content.chars() {
        match quote {
            Some(q) if ch == q => {
                quote = None;
                current.push(ch);
            }
            Some(_) => current.push(ch),
            None if ch == ',' => values.push(std::mem::take(&mut current)),
            None => {
                if ch == '"' || ch == '\'' {
                    quote = Some(ch);
                }
                current.push(ch);
            }
        }
    }
    values.push(current);

    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Parses a line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<DbCommand>, DbError> {
    let tokens = tokenize(line);
    let Some((head, rest)) = tokens.split_first() else {
        return Ok(None);
    };
    let args: Vec<&str> = rest.iter().map(|t| t.text).collect();

    let command = match head.text.to_lowercase().as_str() {
        "create_table" => {
            if args.len() < 2 {
                return Err(DbError::Usage(CREATE_TABLE_USAGE));
            }
            DbCommand::CreateTable {
                table: args[0].to_string(),
                columns: args[1..].iter().map(|s| s.to_string()).collect(),
            }
        }
        "drop_table" => DbCommand::DropTable {
            table: single_arg(&args, DROP_TABLE_USAGE)?,
        },
        "list_tables" => {
            no_args(&args, LIST_TABLES_USAGE)?;
            DbCommand::ListTables
        }
        "insert" => {
            if args.len() < 4 || !keyword(args[0], "into") || !keyword(args[2], "values") {
                return Err(DbError::Usage(INSERT_USAGE));
            }
            let values = line[rest[3].start..].trim();
            let content = values
                .strip_prefix('(')
                .and_then(|v| v.strip_suffix(')'))
                .ok_or(DbError::Usage(INSERT_USAGE))?;
            DbCommand::Insert {
                table: args[1].to_string(),
                values: split_values(content),
            }
        }
        "select" => {
            if args.len() < 2 || !keyword(args[0], "from") {
                return Err(DbError::Usage(SELECT_USAGE));
            }
            DbCommand::Select {
                table: args[1].to_string(),
                filter: optional_where(&args[2..], SELECT_USAGE)?,
            }
        }
        "update" => {
            if args.len() < 3 || !keyword(args[1], "set") {
                return Err(DbError::Usage(UPDATE_USAGE));
            }
            let where_at = args
                .iter()
                .skip(2)
                .position(|a| keyword(a, "where"))
                .map(|i| i + 2)
                .ok_or(DbError::Usage(UPDATE_USAGE))?;
            DbCommand::Update {
                table: args[0].to_string(),
                set: Predicate::from_tokens(ClauseKind::Set, &args[2..where_at])?,
                filter: where_clause(&args[where_at + 1..])?,
            }
        }
        "delete" => {
            if args.len() < 2 || !keyword(args[0], "from") {
                return Err(DbError::Usage(DELETE_USAGE));
            }
            DbCommand::Delete {
                table: args[1].to_string(),
                filter: optional_where(&args[2..], DELETE_USAGE)?,
            }
        }
        "info" => DbCommand::Info {
            table: single_arg(&args, INFO_USAGE)?,
        },
        "help" => {
            no_args(&args, HELP_USAGE)?;
            DbCommand::Help
        }
        "exit" => {
            no_args(&args, EXIT_USAGE)?;
            DbCommand::Exit
        }
        other => return Err(DbError::UnknownCommand(other.to_string())),
    };
    Ok(Some(command))
}

fn keyword(token: &str, expected: &str) -> bool {
    token.eq_ignore_ascii_case(expected)
}

fn single_arg(args: &[&str], usage: &'static str) -> Result<String, DbError> {
    match args {
        [table] => Ok(table.to_string()),
        _ => Err(DbError::Usage(usage)),
    }
}

fn no_args(args: &[&str], usage: &'static str) -> Result<(), DbError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(DbError::Usage(usage))
    }
}

/// Trailing `[where [<clause>]]` after the table name.
fn optional_where(rest: &[&str], usage: &'static str) -> Result<Option<Predicate>, DbError> {
    match rest.split_first() {
        None => Ok(None),
        Some((head, clause)) if keyword(head, "where") => where_clause(clause),
        Some(_) => Err(DbError::Usage(usage)),
    }
}

/// An empty WHERE clause means "no filter".
fn where_clause(tokens: &[&str]) -> Result<Option<Predicate>, DbError> {
    if tokens.is_empty() {
        Ok(None)
    } else {
        Predicate::from_tokens(ClauseKind::Where, tokens).map(Some)
    }
}
