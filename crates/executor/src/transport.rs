//! Transport contract the statement executor drives.
//!
//! A provider hands out one connection per executor call; the connection is
//! released when it is dropped, on every exit path. Parameters are bound
//! positionally, in the order they are passed.

use common::BoxError;
use types::Value;

/// Source of database connections, injected when a `DatabaseManager` is built.
pub trait ConnectionProvider: Send + Sync {
    fn acquire(&self) -> Result<Box<dyn Connection>, BoxError>;
}

/// One open connection.
///
/// Statements run in auto-commit mode unless a transaction was opened with
/// [`Connection::begin`].
pub trait Connection {
    fn begin(&mut self) -> Result<(), BoxError>;

    /// Prepares `sql`, binds `params` and runs it as an update; returns the affected row count.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, BoxError>;

    /// Prepares `sql`, binds `params` and returns every result row, one value per selected column.
    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Vec<Value>>, BoxError>;

    fn commit(&mut self) -> Result<(), BoxError>;

    fn rollback(&mut self) -> Result<(), BoxError>;
}
