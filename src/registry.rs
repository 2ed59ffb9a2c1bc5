//! Table registry: table name to schema, in creation order.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::db_types::{Column, ID_COLUMN, ordered_map};
use crate::error::DbError;

/// Longest accepted table name, leaving room for the `.json` suffix within
/// the usual 255-byte file name limit.
pub const MAX_TABLE_NAME_LEN: usize = 250;

/// A table name doubles as its rows document's file name, so it must be a
/// single plain path component.
fn validate_table_name(name: &str) -> Result<(), DbError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.len() > MAX_TABLE_NAME_LEN
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(DbError::InvalidTableName(name.to_string()));
    }
    Ok(())
}

/// Ordered columns of one table. The first column is always `ID:int`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// User-facing columns, without the synthetic ID.
    pub fn columns_excluding_id(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.name != ID_COLUMN)
    }

    /// `ID:int, name:str, ...`
    pub fn summary(&self) -> String {
        self.columns
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    tables: Vec<(String, Schema)>,
}

impl Registry {
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.tables
            .iter()
            .find(|(table, _)| table == name)
            .map(|(_, schema)| schema)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Looks up a table, failing with `TableNotExists`.
    pub fn schema(&self, name: &str) -> Result<&Schema, DbError> {
        self.get(name)
            .ok_or_else(|| DbError::TableNotExists(name.to_string()))
    }

    /// Registers a new table. Nothing is changed unless the table name is
    /// usable, every column spec parses and the names are unique.
    pub fn create_table<S: AsRef<str>>(
        &mut self,
        name: &str,
        specs: &[S],
    ) -> Result<&Schema, DbError> {
        validate_table_name(name)?;
        if self.contains(name) {
            return Err(DbError::TableExists(name.to_string()));
        }

        let mut columns = vec![Column::id()];
        for spec in specs {
            let column = Column::parse_spec(spec.as_ref())?;
            if column.name.eq_ignore_ascii_case(ID_COLUMN) {
                return Err(DbError::DuplicateColumn(ID_COLUMN.to_string()));
            }
            if columns.iter().any(|c| c.name == column.name) {
                return Err(DbError::DuplicateColumn(column.name));
            }
            columns.push(column);
        }

        self.tables.push((name.to_string(), Schema { columns }));
        let (_, schema) = &self.tables[self.tables.len() - 1];
        Ok(schema)
    }

    /// Removes the table entry. The table's rows document is the caller's
    /// to clean up.
    pub fn drop_table(&mut self, name: &str) -> Result<Schema, DbError> {
        let index = self
            .tables
            .iter()
            .position(|(table, _)| table == name)
            .ok_or_else(|| DbError::TableNotExists(name.to_string()))?;
        Ok(self.tables.remove(index).1)
    }

    pub fn list_tables(&self) -> Vec<&str> {
        self.tables.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl Serialize for Registry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ordered_map::serialize(&self.tables, serializer)
    }
}

impl<'de> Deserialize<'de> for Registry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ordered_map::deserialize(deserializer).map(|tables| Registry { tables })
    }
}
