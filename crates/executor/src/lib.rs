//! Statement executor: turns rows and conditions into literal SQL and runs it.
//!
//! The executor owns no connection. Each call acquires one from the injected
//! [`ConnectionProvider`], uses it and drops it before returning, whether the
//! call succeeded or not.
//!
//! # Transactions
//!
//! ```text
//! execute_insert   one transaction per row (or per data set with atomic_inserts)
//! execute_update   one transaction
//! delete_all_from  one transaction for the whole batch
//! execute_query    auto-commit, read only
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use common::{row, DataSet};
//! use executor::{sqlite::SqliteProvider, StatementExecutor};
//!
//! let executor = StatementExecutor::builder()
//!     .provider(Arc::new(SqliteProvider::new("/tmp/fixture.db")))
//!     .build();
//! executor.execute_update("create table users (id integer, name text)").unwrap();
//!
//! let data_set = DataSet::try_from(vec![row! { "id" => 1, "name" => "alice" }]).unwrap();
//! executor.execute_insert("users", &data_set).unwrap();
//! ```

pub mod sql;
pub mod sqlite;
pub mod transport;

use std::sync::Arc;

use catalog::TableDescriptor;
use common::{Config, DataSet, DbError, DbResult, Row};
use tracing::{debug, instrument, warn};
use types::Value;

pub use transport::{Connection, ConnectionProvider};

/// Builds and runs SQL statements against connections from a provider.
#[derive(bon::Builder)]
pub struct StatementExecutor {
    provider: Arc<dyn ConnectionProvider>,
    #[builder(default)]
    config: Config,
}

impl StatementExecutor {
    pub fn new(provider: Arc<dyn ConnectionProvider>, config: Config) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Insert every row of `data_set` into `table`.
    ///
    /// Each row uses its own column set. By default every row is committed on
    /// its own: a failing row is rolled back and the error returned, rows
    /// committed before it stay in the table. With
    /// [`Config::atomic_inserts`] the whole data set is one transaction.
    #[instrument(skip_all, fields(table = %table, rows = data_set.row_count()))]
    pub fn execute_insert(&self, table: &str, data_set: &DataSet) -> DbResult<()> {
        let mut conn = self.acquire()?;
        if self.config.atomic_inserts {
            return in_transaction(conn.as_mut(), table, |conn| {
                data_set
                    .iter()
                    .try_for_each(|row| self.insert_row(&mut *conn, table, row))
            });
        }
        for row in data_set {
            in_transaction(conn.as_mut(), table, |conn| {
                self.insert_row(conn, table, row)
            })?;
        }
        Ok(())
    }

    /// Select the table's columns from the rows matching every condition.
    ///
    /// At least one condition is required; use [`StatementExecutor::get_all`]
    /// to read a whole table.
    #[instrument(skip_all, fields(table = %table.name()))]
    pub fn execute_query(&self, table: &TableDescriptor, conditions: &Row) -> DbResult<DataSet> {
        if conditions.is_empty() {
            return Err(DbError::InvalidArgument(format!(
                "query on '{}' needs at least one condition",
                table.name()
            )));
        }
        let sql = sql::select_statement(table.name(), table.column_names(), conditions.column_names());
        let params: Vec<Value> = conditions.values().cloned().collect();
        self.select(table, &sql, &params)
    }

    /// Select the table's columns from every row.
    #[instrument(skip_all, fields(table = %table.name()))]
    pub fn get_all(&self, table: &TableDescriptor) -> DbResult<DataSet> {
        let sql = sql::select_all_statement(table.name(), table.column_names());
        self.select(table, &sql, &[])
    }

    /// Run one update statement in its own transaction.
    pub fn execute_update(&self, sql: &str) -> DbResult<()> {
        self.execute_updates(&[sql.to_string()])
    }

    /// Delete the contents of every table in one transaction.
    ///
    /// A failure on any table rolls back the whole batch.
    pub fn delete_all_from<S: AsRef<str>>(&self, tables: &[S]) -> DbResult<()> {
        let statements: Vec<String> = tables
            .iter()
            .map(|table| sql::delete_all_statement(table.as_ref()))
            .collect();
        self.execute_updates(&statements)
    }

    fn execute_updates(&self, statements: &[String]) -> DbResult<()> {
        let mut conn = self.acquire()?;
        in_transaction(conn.as_mut(), "update batch", |conn| {
            for statement in statements {
                self.log_statement(statement);
                conn.execute(statement, &[])
                    .map_err(|err| DbError::execution(statement.clone(), err))?;
            }
            Ok(())
        })
    }

    fn insert_row(&self, conn: &mut dyn Connection, table: &str, row: &Row) -> DbResult<()> {
        let sql = sql::insert_statement(table, row.column_names());
        let params: Vec<Value> = row.values().cloned().collect();
        self.log_statement(&sql);
        conn.execute(&sql, &params)
            .map_err(|err| DbError::execution(sql.clone(), err))?;
        Ok(())
    }

    fn select(&self, table: &TableDescriptor, sql: &str, params: &[Value]) -> DbResult<DataSet> {
        let mut conn = self.acquire()?;
        self.log_statement(sql);
        let raw_rows = conn
            .query(sql, params)
            .map_err(|err| DbError::execution(sql.to_string(), err))?;

        let mut result = DataSet::new();
        for values in raw_rows {
            if values.len() != table.columns().len() {
                return Err(DbError::Conversion(format!(
                    "expected {} columns from '{}', got {}",
                    table.columns().len(),
                    table.name(),
                    values.len()
                )));
            }
            let mut row = Row::new();
            for (spec, value) in table.columns().iter().zip(values) {
                let coerced = value.coerce_to(&spec.ty).ok_or_else(|| {
                    DbError::Conversion(format!(
                        "column '{}' declared {:?} cannot hold {value:?}",
                        spec.name, spec.ty
                    ))
                })?;
                row.set(spec.name.clone(), coerced);
            }
            result.add_row(row)?;
        }
        debug!(rows = result.row_count(), "query finished");
        Ok(result)
    }

    fn acquire(&self) -> DbResult<Box<dyn Connection>> {
        self.provider
            .acquire()
            .map_err(|err| DbError::execution("acquire connection", err))
    }

    fn log_statement(&self, sql: &str) {
        if self.config.log_statements {
            debug!(sql, "executing statement");
        }
    }
}

/// Runs `work` between `begin` and `commit`, rolling back if any step fails.
fn in_transaction<T>(
    conn: &mut dyn Connection,
    context: &str,
    work: impl FnOnce(&mut dyn Connection) -> DbResult<T>,
) -> DbResult<T> {
    conn.begin()
        .map_err(|err| DbError::execution(format!("begin transaction ({context})"), err))?;
    let result = work(&mut *conn).and_then(|value| {
        conn.commit()
            .map_err(|err| DbError::execution(format!("commit ({context})"), err))?;
        Ok(value)
    });
    if result.is_err() {
        if let Err(err) = conn.rollback() {
            warn!(error = %err, context, "rollback failed");
        }
    }
    result
}
