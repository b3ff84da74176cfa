//! SQLite transport built on `rusqlite`.
//!
//! Every [`SqliteProvider::acquire`] opens a fresh connection to the database
//! file, so data is shared between calls the same way it would be through a
//! pooled server connection.

use std::path::{Path, PathBuf};

use common::BoxError;
use rusqlite::{
    params_from_iter,
    types::{ToSqlOutput, ValueRef},
    ToSql,
};
use tracing::{debug, instrument};
use types::Value;

use crate::transport::{Connection, ConnectionProvider};

/// Opens connections to a SQLite database file.
#[derive(Clone, Debug)]
pub struct SqliteProvider {
    path: PathBuf,
}

impl SqliteProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConnectionProvider for SqliteProvider {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn acquire(&self) -> Result<Box<dyn Connection>, BoxError> {
        let conn = rusqlite::Connection::open(&self.path)?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        debug!("opened sqlite connection");
        Ok(Box::new(SqliteConnection { conn }))
    }
}

/// A single SQLite connection; closed on drop.
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl Connection for SqliteConnection {
    fn begin(&mut self) -> Result<(), BoxError> {
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<u64, BoxError> {
        let mut stmt = self.conn.prepare(sql)?;
        let affected = stmt.execute(params_from_iter(params.iter().map(SqlParam)))?;
        Ok(affected as u64)
    }

    fn query(&mut self, sql: &str, params: &[Value]) -> Result<Vec<Vec<Value>>, BoxError> {
        let mut stmt = self.conn.prepare(sql)?;
        let column_count = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(params.iter().map(SqlParam)))?;

        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                values.push(from_value_ref(row.get_ref(idx)?)?);
            }
            result.push(values);
        }
        Ok(result)
    }

    fn commit(&mut self) -> Result<(), BoxError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), BoxError> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

/// Binds a [`Value`] as a statement parameter.
struct SqlParam<'a>(&'a Value);

impl ToSql for SqlParam<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::SmallInt(v) => ToSqlOutput::from(i64::from(*v)),
            Value::Int(v) => ToSqlOutput::from(i64::from(*v)),
            Value::BigInt(v) => ToSqlOutput::from(*v),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
            Value::Bool(b) => ToSqlOutput::from(*b),
            Value::Null => ToSqlOutput::from(rusqlite::types::Null),
        })
    }
}

/// SQLite hands back integers as `i64`; callers narrow them to the declared column type.
fn from_value_ref(value: ValueRef<'_>) -> Result<Value, BoxError> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(n) => Ok(Value::BigInt(n)),
        ValueRef::Text(t) => Ok(Value::Text(std::str::from_utf8(t)?.to_string())),
        ValueRef::Real(f) => Err(format!("unsupported REAL column value {f}").into()),
        ValueRef::Blob(b) => Err(format!("unsupported BLOB column value ({} bytes)", b.len()).into()),
    }
}
