
pub mod pretty;

use serde::{Deserialize, Serialize};
use std::{error::Error as StdError, fmt, io};
use thiserror::Error;
use types::Value;

/// Boxed transport error carried by [`DbError::Execution`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// One record: column names mapped to values, in insertion order.
///
/// Setting a column that is already present replaces its value in place.
/// Equality ignores column order.
/// Examples:
/// - `let row = Row::new().with("id", 1).with("name", "alice");`
/// - `let row = row! { "id" => 1, "active" => true };`
/// - `let row = Row::new().with("deleted_at", Value::Null);`
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<(String, Value)>", into = "Vec<(String, Value)>")]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chaining form of [`Row::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(col, _)| *col == name) {
            Some((_, slot)) => *slot = value,
            None => self.columns.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, value)| value)
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates `(column, value)` pairs in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(col, value)| (col.as_str(), value))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(col, _)| col.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.columns.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// True when every column of `expected` is present here with an equal value.
    ///
    /// With `exact_column_set` the rows must also have the same number of columns.
    pub fn contains_expected_data(&self, expected: &Row, exact_column_set: bool) -> bool {
        if exact_column_set && expected.len() != self.len() {
            return false;
        }
        expected
            .columns()
            .all(|(col, value)| self.get(col) == Some(value))
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.contains_expected_data(other, true)
    }
}

impl Eq for Row {}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.set(name, value);
        }
        row
    }
}

/// Rejects repeated column names; used when deserializing.
impl TryFrom<Vec<(String, Value)>> for Row {
    type Error = DbError;

    fn try_from(columns: Vec<(String, Value)>) -> DbResult<Self> {
        for (idx, (name, _)) in columns.iter().enumerate() {
            if columns[..idx].iter().any(|(prev, _)| prev == name) {
                return Err(DbError::InvalidArgument(format!(
                    "duplicate column '{name}' in row"
                )));
            }
        }
        Ok(Row { columns })
    }
}

impl From<Row> for Vec<(String, Value)> {
    fn from(row: Row) -> Self {
        row.columns
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", pretty::format_row(self))
    }
}

/// Builds a [`Row`] from `column => value` pairs.
///
/// ```
/// use common::{row, Row};
///
/// let row = row! { "id" => 1, "name" => "alice" };
/// assert_eq!(row, Row::new().with("name", "alice").with("id", 1));
/// ```
#[macro_export]
macro_rules! row {
    () => { $crate::Row::new() };
    ($($col:expr => $val:expr),+ $(,)?) => {{
        let mut _row = $crate::Row::new();
        $( _row.set($col, $val); )+
        _row
    }};
}

/// Ordered collection of non-empty rows: a query result or an insert batch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Row>", into = "Vec<Row>")]
pub struct DataSet {
    rows: Vec<Row>,
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row, rejecting rows without columns.
    pub fn add_row(&mut self, row: Row) -> DbResult<&mut Self> {
        if row.is_empty() {
            return Err(DbError::EmptyRow);
        }
        self.rows.push(row);
        Ok(self)
    }

    /// Chaining form of [`DataSet::add_row`].
    pub fn with_row(mut self, row: Row) -> DbResult<Self> {
        self.add_row(row)?;
        Ok(self)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl TryFrom<Vec<Row>> for DataSet {
    type Error = DbError;

    fn try_from(rows: Vec<Row>) -> DbResult<Self> {
        let mut data_set = DataSet::new();
        for row in rows {
            data_set.add_row(row)?;
        }
        Ok(data_set)
    }
}

impl From<DataSet> for Vec<Row> {
    fn from(data_set: DataSet) -> Self {
        data_set.rows
    }
}

impl IntoIterator for DataSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a DataSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl fmt::Display for DataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, row) in self.rows.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{row}")?;
        }
        Ok(())
    }
}

/// Canonical error type shared across the fixture crates.
#[derive(Error, Debug)]
pub enum DbError {
    /// A builder call was issued in a state that does not permit it.
    #[error("wrong operation state, expected: {expected}, actual: {actual}")]
    IllegalSessionState { expected: String, actual: String },
    /// A transport failure; the enclosing transaction was rolled back.
    #[error("exec: {context}: {source}")]
    Execution {
        context: String,
        #[source]
        source: BoxError,
    },
    #[error("{0}")]
    ComparisonMismatch(String),
    #[error("reverse conversion not supported: {0}")]
    UnsupportedReverseConversion(String),
    #[error("row has no columns")]
    EmptyRow,
    #[error("unknown column '{column}' on table '{table}'")]
    UnknownColumn { table: String, column: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("conversion: {0}")]
    Conversion(String),
    #[error("generator: {0}")]
    Generator(String),
    #[error("catalog: {0}")]
    Catalog(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl DbError {
    /// Wraps a transport error together with a description of the failed step.
    pub fn execution(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        DbError::Execution {
            context: context.into(),
            source: source.into(),
        }
    }
}

/// Result alias that carries a `DbError`.
pub type DbResult<T> = Result<T, DbError>;

/// Runtime configuration for statement execution.
///
/// # Example
/// ```
/// use common::Config;
///
/// let config = Config::builder()
///     .atomic_inserts(true)
///     .log_statements(false)
///     .build();
/// assert!(config.atomic_inserts);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, bon::Builder)]
pub struct Config {
    /// Insert a whole data set in one transaction instead of committing each row.
    #[builder(default = false)]
    pub atomic_inserts: bool,
    /// Emit every executed statement at `debug` level.
    #[builder(default = true)]
    pub log_statements: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            atomic_inserts: false,
            log_statements: true,
        }
    }
}

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::{Config, DataSet, DbError, DbResult, Row};
    pub use types::{SqlType, Value};
}
