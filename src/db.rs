use tracing::{debug, info, warn};

use crate::commands::{DbCommand, DbResult};
use crate::error::DbError;
use crate::registry::Registry;
use crate::rows;
use crate::storage::DocumentStore;

/// Executes commands against a document store. Holds no table state of its
/// own: the registry is read fresh from the store for every command.
#[derive(Debug)]
pub struct Database<S> {
    store: S,
}

impl<S: DocumentStore> Database<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn execute(&mut self, cmd: DbCommand) -> Result<DbResult, DbError> {
        debug!(command = cmd.name(), "executing");
        // help and exit must keep working even with an unreadable registry.
        match cmd {
            DbCommand::Help => return Ok(DbResult::Help),
            DbCommand::Exit => return Ok(DbResult::Exit),
            _ => {}
        }
        let mut registry = self.store.load_registry()?;

        match cmd {
            DbCommand::CreateTable { table, columns } => {
                self.create_table(&mut registry, table, &columns)
            }
            DbCommand::DropTable { table } => self.drop_table(&mut registry, table),
            DbCommand::ListTables => Ok(DbResult::Tables(
                registry.list_tables().into_iter().map(String::from).collect(),
            )),
            DbCommand::Insert { table, values } => {
                let schema = registry.schema(&table)?;
                let mut data = self.store.load_rows(&table)?;
                let row = rows::insert(schema, &mut data, &values)?;
                self.store.save_rows(&table, &data)?;

                let id = row.id().unwrap_or_default();
                info!(table = %table, id, "record inserted");
                Ok(DbResult::Inserted { table, id })
            }
            DbCommand::Select { table, filter } => {
                let schema = registry.schema(&table)?;
                let data = self.store.load_rows(&table)?;
                let rows = rows::select(&data, filter.as_ref())
                    .into_iter()
                    .cloned()
                    .collect();
                Ok(DbResult::Rows {
                    columns: schema.columns().to_vec(),
                    rows,
                })
            }
            DbCommand::Update { table, set, filter } => {
                registry.schema(&table)?;
                let mut data = self.store.load_rows(&table)?;
                let count = rows::update(&mut data, &set, filter.as_ref());
                if count > 0 {
                    self.store.save_rows(&table, &data)?;
                    info!(table = %table, count, "records updated");
                }
                Ok(DbResult::Updated { table, count })
            }
            DbCommand::Delete { table, filter } => {
                registry.schema(&table)?;
                let mut data = self.store.load_rows(&table)?;
                let count = rows::delete(&mut data, filter.as_ref());
                if count > 0 {
                    self.store.save_rows(&table, &data)?;
                    info!(table = %table, count, "records deleted");
                }
                Ok(DbResult::Deleted { table, count })
            }
            DbCommand::Info { table } => {
                let schema = registry.schema(&table)?;
                let data = self.store.load_rows(&table)?;
                Ok(DbResult::Info(rows::table_info(&table, schema, &data)))
            }
            DbCommand::Help => Ok(DbResult::Help),
            DbCommand::Exit => Ok(DbResult::Exit),
        }
    }

    fn create_table(
        &mut self,
        registry: &mut Registry,
        table: String,
        columns: &[String],
    ) -> Result<DbResult, DbError> {
        let columns = registry.create_table(&table, columns)?.columns().to_vec();

        // The rows document goes first: a table must never be registered
        // without one.
        self.store.save_rows(&table, &[])?;
        if let Err(e) = self.store.save_registry(registry) {
            if let Err(cleanup) = self.store.delete_rows(&table) {
                warn!(table = %table, error = %cleanup, "failed to remove rows document");
            }
            return Err(e.into());
        }

        info!(table = %table, "table created");
        Ok(DbResult::Created { table, columns })
    }

    fn drop_table(&mut self, registry: &mut Registry, table: String) -> Result<DbResult, DbError> {
        registry.drop_table(&table)?;
        self.store.save_registry(registry)?;

        // The registry no longer knows the table; a leftover rows document
        // is harmless.
        if let Err(e) = self.store.delete_rows(&table) {
            warn!(table = %table, error = %e, "failed to delete rows document");
        }

        info!(table = %table, "table dropped");
        Ok(DbResult::Dropped { table })
    }
}
