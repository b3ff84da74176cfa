//! Test execution context with an isolated SQLite database.
//!
//! Each context owns a temporary directory holding one database file. The
//! directory and everything in it are removed when the context is dropped.

use std::{path::Path, sync::Arc};

use catalog::Catalog;
use common::{Config, DbResult};
use database::{DatabaseManager, TableManager};
use executor::sqlite::SqliteProvider;
use tempfile::TempDir;
use tracing::debug;

use crate::fixtures;

/// A database manager over a throwaway SQLite file.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
///
/// let ctx = TestContext::with_schema(&["create table t (id integer)"]).unwrap();
/// ctx.db().execute_update("insert into t(id) values(1)").unwrap();
/// ```
pub struct TestContext {
    _temp_dir: TempDir,
    provider: Arc<SqliteProvider>,
    db: DatabaseManager,
    catalog: Catalog,
}

impl TestContext {
    /// Create an empty database with the default configuration.
    pub fn new() -> DbResult<Self> {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> DbResult<Self> {
        let temp_dir = tempfile::tempdir()?;
        let provider = Arc::new(SqliteProvider::new(temp_dir.path().join("fixture.db")));
        let db = DatabaseManager::with_config(provider.clone(), config);
        debug!(path = %provider.path().display(), "test database created");
        Ok(Self {
            _temp_dir: temp_dir,
            provider,
            db,
            catalog: Catalog::new(),
        })
    }

    /// Create a database and run each DDL statement against it.
    pub fn with_schema(ddl: &[&str]) -> DbResult<Self> {
        let ctx = Self::new()?;
        for statement in ddl {
            ctx.db.execute_update(statement)?;
        }
        Ok(ctx)
    }

    /// Database with the `users` and `orders` fixture tables, empty.
    pub fn shop() -> DbResult<Self> {
        Self::shop_with_config(Config::default())
    }

    pub fn shop_with_config(config: Config) -> DbResult<Self> {
        let mut ctx = Self::with_config(config)?;
        ctx.db.execute_update(fixtures::USERS_DDL)?;
        ctx.db.execute_update(fixtures::ORDERS_DDL)?;
        ctx.catalog = fixtures::shop_catalog()?;
        Ok(ctx)
    }

    pub fn db(&self) -> &DatabaseManager {
        &self.db
    }

    pub fn provider(&self) -> &SqliteProvider {
        &self.provider
    }

    pub fn db_path(&self) -> &Path {
        self.provider.path()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    /// Builder for a table registered in this context's catalog.
    pub fn table(&self, name: &str) -> DbResult<TableManager> {
        self.db.table_manager_for(&self.catalog, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_creates_database_file() {
        let ctx = TestContext::with_schema(&["create table t (id integer)"]).unwrap();
        assert!(ctx.db_path().exists());
    }

    #[test]
    fn database_file_is_removed_on_drop() {
        let ctx = TestContext::new().unwrap();
        ctx.db().execute_update("create table t (id integer)").unwrap();
        let path = ctx.db_path().to_path_buf();
        drop(ctx);
        assert!(!path.exists());
    }

    #[test]
    fn shop_registers_fixture_tables() {
        let ctx = TestContext::shop().unwrap();
        assert_eq!(ctx.table("users").unwrap().table_name(), "users");
        assert!(ctx.table("invoices").is_err());
    }

    #[test]
    fn bad_schema_is_an_error() {
        assert!(TestContext::with_schema(&["create tabel t"]).is_err());
    }
}
