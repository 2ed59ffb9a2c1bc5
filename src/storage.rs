//! Whole-document persistence for the registry and the per-table rows.
//!
//! Every save overwrites the full document. There is no atomic rename, so a
//! crash in the middle of a write can leave a truncated file behind.

#[cfg(test)]
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::db_types::Row;
use crate::error::StorageError;
use crate::registry::Registry;

/// What the engine needs from a persistence backend. Missing documents
/// read as empty state.
pub trait DocumentStore {
    fn load_registry(&self) -> Result<Registry, StorageError>;
    fn save_registry(&mut self, registry: &Registry) -> Result<(), StorageError>;
    fn load_rows(&self, table: &str) -> Result<Vec<Row>, StorageError>;
    fn save_rows(&mut self, table: &str, rows: &[Row]) -> Result<(), StorageError>;
    fn delete_rows(&mut self, table: &str) -> Result<(), StorageError>;
}

/// JSON files on disk: one registry document plus `<data_dir>/<table>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    meta_path: PathBuf,
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(meta_path: impl Into<PathBuf>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            meta_path: meta_path.into(),
            data_dir: data_dir.into(),
        }
    }

    pub fn ensure_data_dir(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.data_dir).map_err(|source| StorageError::Io {
            path: self.data_dir.clone(),
            source,
        })
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.data_dir.join(format!("{table}.json"))
    }
}

fn read_document<T: DeserializeOwned + Default>(path: &Path) -> Result<T, StorageError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "document missing, using empty state");
            return Ok(T::default());
        }
        Err(source) => {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&content).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_document<T: Serialize + ?Sized>(path: &Path, document: &T) -> Result<(), StorageError> {
    let io_error = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let content = serde_json::to_string_pretty(document).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, content).map_err(io_error)
}

impl DocumentStore for JsonFileStore {
    fn load_registry(&self) -> Result<Registry, StorageError> {
        read_document(&self.meta_path)
    }

    fn save_registry(&mut self, registry: &Registry) -> Result<(), StorageError> {
        write_document(&self.meta_path, registry)
    }

    fn load_rows(&self, table: &str) -> Result<Vec<Row>, StorageError> {
        read_document(&self.table_path(table))
    }

    fn save_rows(&mut self, table: &str, rows: &[Row]) -> Result<(), StorageError> {
        write_document(&self.table_path(table), rows)
    }

    fn delete_rows(&mut self, table: &str) -> Result<(), StorageError> {
        let path = self.table_path(table);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

/// In-memory store, used by tests.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub registry: Registry,
    pub tables: HashMap<String, Vec<Row>>,
}

#[cfg(test)]
impl DocumentStore for MemoryStore {
    fn load_registry(&self) -> Result<Registry, StorageError> {
        Ok(self.registry.clone())
    }

    fn save_registry(&mut self, registry: &Registry) -> Result<(), StorageError> {
        self.registry = registry.clone();
        Ok(())
    }

    fn load_rows(&self, table: &str) -> Result<Vec<Row>, StorageError> {
        Ok(self.tables.get(table).cloned().unwrap_or_default())
    }

    fn save_rows(&mut self, table: &str, rows: &[Row]) -> Result<(), StorageError> {
        self.tables.insert(table.to_string(), rows.to_vec());
        Ok(())
    }

    fn delete_rows(&mut self, table: &str) -> Result<(), StorageError> {
        self.tables.remove(table);
        Ok(())
    }
}
