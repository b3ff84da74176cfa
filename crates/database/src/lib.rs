//! Fixture builders for populating and inspecting database tables in tests.
//!
//! [`DatabaseManager`] is the entry point. It wraps a [`StatementExecutor`] and
//! hands out one [`TableManager`] per table, either from a descriptor or by name
//! from a [`Catalog`]. Typed builders with one setter per column are declared
//! with [`table_manager!`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use catalog::{ColumnSpec, TableDescriptor};
//! use database::DatabaseManager;
//! use executor::sqlite::SqliteProvider;
//! use types::SqlType;
//!
//! # fn demo() -> common::DbResult<()> {
//! let db = DatabaseManager::new(Arc::new(SqliteProvider::new("/tmp/fixture.db")));
//! db.execute_update("create table users (id integer, name text)")?;
//!
//! let mut users = db.table_manager(TableDescriptor::try_new(
//!     "users",
//!     vec![
//!         ColumnSpec::new("id", SqlType::BigInt),
//!         ColumnSpec::new("name", SqlType::Text),
//!     ],
//! )?);
//! users
//!     .generate_values_for()?
//!     .set("id", 1)?
//!     .new_insert_with_row()?
//!     .set("name", "a")?
//!     .and_row()?
//!     .set("name", "b")?
//!     .execute()?;
//!
//! db.delete_all_from(&["users"])?;
//! # Ok(())
//! # }
//! ```

pub mod generator;
mod macros;
mod session;

use std::sync::Arc;

use catalog::{Catalog, TableDescriptor};
use common::{Config, DbResult};
use executor::{ConnectionProvider, StatementExecutor};
use tracing::debug;

pub use generator::ValueGenerator;
pub use session::{OperationState, TableManager};

#[doc(hidden)]
pub mod __private {
    pub use catalog::{AttributeConverter, ColumnSpec, TableDescriptor};
    pub use common::{DataSet, DbResult};
    pub use types::{SqlType, Value};
}

/// Shared handle on one database: creates table builders and runs set-up statements.
#[derive(Clone)]
pub struct DatabaseManager {
    executor: Arc<StatementExecutor>,
}

impl DatabaseManager {
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self::with_config(provider, Config::default())
    }

    pub fn with_config(provider: Arc<dyn ConnectionProvider>, config: Config) -> Self {
        Self::from_executor(Arc::new(StatementExecutor::new(provider, config)))
    }

    pub fn from_executor(executor: Arc<StatementExecutor>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &Arc<StatementExecutor> {
        &self.executor
    }

    /// New builder for `table`, with its own session.
    pub fn table_manager(&self, table: TableDescriptor) -> TableManager {
        debug!(table = table.name(), "table manager created");
        TableManager::new(table, Arc::clone(&self.executor))
    }

    /// New builder for the catalog table called `name`.
    pub fn table_manager_for(&self, catalog: &Catalog, name: &str) -> DbResult<TableManager> {
        let table = catalog.table(name)?.clone();
        Ok(self.table_manager(table))
    }

    /// Run one DDL or DML statement in its own transaction.
    pub fn execute_update(&self, sql: &str) -> DbResult<()> {
        self.executor.execute_update(sql)
    }

    /// Empty the named tables in one transaction, in the given order.
    pub fn delete_all_from<S: AsRef<str>>(&self, tables: &[S]) -> DbResult<()> {
        self.executor.delete_all_from(tables)
    }

    pub fn delete_all_from_tables(&self, tables: &[&TableDescriptor]) -> DbResult<()> {
        let names: Vec<&str> = tables.iter().map(|table| table.name()).collect();
        self.delete_all_from(&names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::ColumnSpec;
    use common::{BoxError, DbError};
    use executor::Connection;
    use types::SqlType;

    struct Offline;

    impl ConnectionProvider for Offline {
        fn acquire(&self) -> Result<Box<dyn Connection>, BoxError> {
            Err("offline".into())
        }
    }

    fn manager() -> DatabaseManager {
        DatabaseManager::new(Arc::new(Offline))
    }

    #[test]
    fn table_manager_for_resolves_catalog_tables() {
        let mut catalog = Catalog::new();
        catalog
            .register(
                TableDescriptor::try_new("orders", vec![ColumnSpec::new("id", SqlType::Int)])
                    .unwrap(),
            )
            .unwrap();

        let orders = manager().table_manager_for(&catalog, "orders").unwrap();
        assert_eq!(orders.table_name(), "orders");
        assert_eq!(orders.state(), OperationState::None);
        assert!(manager().table_manager_for(&catalog, "missing").is_err());
    }

    #[test]
    fn managers_share_one_executor() {
        let db = DatabaseManager::with_config(
            Arc::new(Offline),
            Config::builder().atomic_inserts(true).build(),
        );
        let clone = db.clone();
        assert!(Arc::ptr_eq(db.executor(), clone.executor()));
        assert!(clone.executor().config().atomic_inserts);
    }

    #[test]
    fn transport_errors_surface_as_execution_errors() {
        let err = manager().execute_update("create table t (id integer)").unwrap_err();
        assert!(matches!(err, DbError::Execution { .. }));
        assert!(manager().delete_all_from(&["t"]).is_err());
    }
}
