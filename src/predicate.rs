//! Single `column = value` clauses, used both to filter rows (WHERE) and to
//! assign a column (SET).
//!
//! Filters are always exactly one equality clause; there is no `AND`/`OR`.

use crate::db_types::{ID_COLUMN, Row, Value, strip_matching_quotes};
use crate::error::{ClauseKind, DbError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub column: String,
    pub value: Value,
}

impl Predicate {
    pub fn new(column: impl Into<String>, value: Value) -> Self {
        Self {
            column: normalize_column(column.into()),
            value,
        }
    }

    /// Builds a clause from exactly three tokens: `<column> = <value>`.
    pub fn from_tokens<S: AsRef<str>>(kind: ClauseKind, tokens: &[S]) -> Result<Self, DbError> {
        match tokens {
            [column, eq, value] if eq.as_ref() == "=" => {
                Ok(Self::new(column.as_ref(), infer_value(value.as_ref())))
            }
            _ => Err(DbError::MalformedClause {
                kind,
                text: tokens
                    .iter()
                    .map(|t| t.as_ref())
                    .collect::<Vec<_>>()
                    .join(" "),
            }),
        }
    }

    /// True iff the row holds this column with an equal value of the same kind.
    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.column) == Some(&self.value)
    }
}

fn normalize_column(column: String) -> String {
    if column.eq_ignore_ascii_case(ID_COLUMN) {
        ID_COLUMN.to_string()
    } else {
        column
    }
}

/// Infers a value from an untyped token: bool, then int, then string.
pub fn infer_value(token: &str) -> Value {
    if token.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if token.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(i) = token.parse::<i64>() {
        return Value::Int(i);
    }
    Value::Str(strip_matching_quotes(token).to_string())
}
