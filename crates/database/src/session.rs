//! Fluent table builder and its session state machine.

use std::{any::Any, fmt, sync::Arc};

use catalog::TableDescriptor;
use common::{DataSet, DbError, DbResult, Row};
use executor::StatementExecutor;
use tracing::debug;
use types::Value;

use crate::generator::ValueGenerator;

/// What the current session is building; gates which calls are legal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationState {
    None,
    DefaultValues,
    GeneratedValues,
    Query,
    RowInDataSet,
    RowInInsertStmt,
}

impl OperationState {
    /// States in which a column may be set.
    pub const COLUMN_SETTABLE: &'static [OperationState] = &[
        OperationState::DefaultValues,
        OperationState::GeneratedValues,
        OperationState::Query,
        OperationState::RowInDataSet,
        OperationState::RowInInsertStmt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationState::None => "NONE",
            OperationState::DefaultValues => "DEFAULT_VALUES",
            OperationState::GeneratedValues => "GENERATED_VALUES",
            OperationState::Query => "QUERY",
            OperationState::RowInDataSet => "ROW_IN_DATASET",
            OperationState::RowInInsertStmt => "ROW_IN_INSERT_STMT",
        }
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builder for inserts, queries and data sets on one table.
///
/// Every call validates the session state, mutates the pending rows and hands
/// back the same builder. A call made in the wrong state, or any failure while
/// building, discards the whole session before the error is returned, so the
/// next call starts from [`OperationState::None`].
///
/// A `TableManager` holds one private session; it is not meant to be shared
/// between callers.
///
/// # Example
///
/// ```no_run
/// # fn demo(users: &mut database::TableManager) -> common::DbResult<()> {
/// users
///     .generate_values_for()?
///     .set("id", 100)?
///     .new_insert_with_row()?
///     .set("name", "alice")?
///     .and_row()?
///     .set("name", "bob")?
///     .execute()?;
///
/// let alice = users.new_query_where()?.set("name", "alice")?.execute_query()?;
/// assert_eq!(alice.row_count(), 1);
/// # Ok(())
/// # }
/// ```
pub struct TableManager {
    table: TableDescriptor,
    executor: Arc<StatementExecutor>,
    state: OperationState,
    data_set: DataSet,
    current_row: Row,
    default_values: Row,
    generators: Vec<(String, ValueGenerator)>,
}

impl TableManager {
    pub fn new(table: TableDescriptor, executor: Arc<StatementExecutor>) -> Self {
        Self {
            table,
            executor,
            state: OperationState::None,
            data_set: DataSet::new(),
            current_row: Row::new(),
            default_values: Row::new(),
            generators: Vec::new(),
        }
    }

    pub fn table_name(&self) -> &str {
        self.table.name()
    }

    pub fn descriptor(&self) -> &TableDescriptor {
        &self.table
    }

    pub fn state(&self) -> OperationState {
        self.state
    }

    /// Following column settings become defaults for every row of the session.
    pub fn set_default_values(&mut self) -> DbResult<&mut Self> {
        self.check_state(&[OperationState::None, OperationState::GeneratedValues])?;
        self.state = OperationState::DefaultValues;
        Ok(self)
    }

    /// Following column settings declare generated columns and their start value.
    pub fn generate_values_for(&mut self) -> DbResult<&mut Self> {
        self.check_state(&[OperationState::None, OperationState::DefaultValues])?;
        self.state = OperationState::GeneratedValues;
        Ok(self)
    }

    /// Following column settings become equality conditions of a query.
    pub fn new_query_where(&mut self) -> DbResult<&mut Self> {
        self.check_state(&[OperationState::None])?;
        self.state = OperationState::Query;
        Ok(self)
    }

    /// Start the first row of a data set built in memory.
    pub fn new_data_set_with_row(&mut self) -> DbResult<&mut Self> {
        self.check_state(&[
            OperationState::None,
            OperationState::DefaultValues,
            OperationState::GeneratedValues,
        ])?;
        self.state = OperationState::RowInDataSet;
        Ok(self)
    }

    /// Start the first row of an insert.
    pub fn new_insert_with_row(&mut self) -> DbResult<&mut Self> {
        self.check_state(&[
            OperationState::None,
            OperationState::DefaultValues,
            OperationState::GeneratedValues,
        ])?;
        self.state = OperationState::RowInInsertStmt;
        Ok(self)
    }

    /// Set a column in whatever the session is currently building.
    ///
    /// For a column with a converter the value must be the converter's
    /// attribute type; use [`TableManager::set_converted`] for domain values.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> DbResult<&mut Self> {
        let value = value.into();
        self.set_attribute(column, &value)
    }

    /// Set a column from a domain attribute that goes through the column's converter.
    pub fn set_converted<A: Any>(&mut self, column: &str, attribute: A) -> DbResult<&mut Self> {
        self.set_attribute(column, &attribute)
    }

    /// Close the current row and start another one.
    pub fn and_row(&mut self) -> DbResult<&mut Self> {
        self.check_state(&[OperationState::RowInDataSet, OperationState::RowInInsertStmt])?;
        let flushed = self.flush_row();
        self.reset_on_error(flushed)?;
        Ok(self)
    }

    /// Insert every row of the session and end it.
    pub fn execute(&mut self) -> DbResult<()> {
        self.check_state(&[OperationState::RowInInsertStmt])?;
        let result = self
            .flush_row()
            .and_then(|_| self.executor.execute_insert(self.table.name(), &self.data_set));
        self.reset();
        result
    }

    /// Return the rows of the session as a data set and end it.
    pub fn build_data_set(&mut self) -> DbResult<DataSet> {
        self.check_state(&[OperationState::RowInDataSet])?;
        let flushed = self.flush_row();
        self.reset_on_error(flushed)?;
        let data_set = std::mem::take(&mut self.data_set);
        self.reset();
        Ok(data_set)
    }

    /// Run the query built from the session's conditions and end the session.
    pub fn execute_query(&mut self) -> DbResult<DataSet> {
        self.check_state(&[OperationState::Query])?;
        let result = self.executor.execute_query(&self.table, &self.current_row);
        self.reset();
        result
    }

    /// Read every row of the table. Only legal outside a session.
    pub fn get_all(&mut self) -> DbResult<DataSet> {
        self.check_state(&[OperationState::None])?;
        let result = self.executor.get_all(&self.table);
        self.reset();
        result
    }

    fn set_attribute(&mut self, column: &str, attribute: &dyn Any) -> DbResult<&mut Self> {
        self.check_state(OperationState::COLUMN_SETTABLE)?;
        let applied = self.apply_column(column, attribute);
        self.reset_on_error(applied)?;
        Ok(self)
    }

    fn apply_column(&mut self, column: &str, attribute: &dyn Any) -> DbResult<()> {
        let spec = self.table.require_column(column)?;
        let raw = spec.to_column_value(attribute)?;
        // Rows read back are typed by the column, so built rows must be too.
        let value = raw.coerce_to(&spec.ty).ok_or_else(|| {
            DbError::Conversion(format!(
                "column '{}' declared {:?} cannot hold {raw:?}",
                spec.name, spec.ty
            ))
        })?;
        match self.state {
            OperationState::GeneratedValues => {
                let generator = ValueGenerator::new(spec.ty, &value)?;
                let name = spec.name.clone();
                match self.generators.iter_mut().find(|(col, _)| *col == name) {
                    Some((_, slot)) => *slot = generator,
                    None => self.generators.push((name, generator)),
                }
            }
            OperationState::DefaultValues => {
                self.default_values.set(spec.name.clone(), value);
            }
            _ => {
                self.current_row.set(spec.name.clone(), value);
            }
        }
        Ok(())
    }

    /// Complete the current row with defaults and generated values and append it.
    fn flush_row(&mut self) -> DbResult<()> {
        let mut row = std::mem::take(&mut self.current_row);
        merge_defaults(&mut row, &self.default_values);
        for (column, generator) in &mut self.generators {
            let explicit = row.get(column).filter(|v| !v.is_null()).cloned();
            match explicit {
                Some(value) => generator.set_value_greater_than(&value)?,
                None => {
                    row.set(column.clone(), generator.next_value()?);
                }
            }
        }
        merge_defaults(&mut row, &self.default_values);
        self.data_set.add_row(row)?;
        Ok(())
    }

    fn check_state(&mut self, expected: &[OperationState]) -> DbResult<()> {
        if expected.contains(&self.state) {
            return Ok(());
        }
        let err = DbError::IllegalSessionState {
            expected: expected
                .iter()
                .map(OperationState::as_str)
                .collect::<Vec<_>>()
                .join(","),
            actual: self.state.to_string(),
        };
        self.reset();
        Err(err)
    }

    fn reset_on_error<T>(&mut self, result: DbResult<T>) -> DbResult<T> {
        if result.is_err() {
            self.reset();
        }
        result
    }

    fn reset(&mut self) {
        if self.state != OperationState::None {
            debug!(table = self.table.name(), state = %self.state, "session reset");
        }
        self.data_set = DataSet::new();
        self.current_row = Row::new();
        self.default_values = Row::new();
        self.generators.clear();
        self.state = OperationState::None;
    }
}

/// Copy defaults into `row` for every column it does not set itself.
fn merge_defaults(row: &mut Row, defaults: &Row) {
    for (column, value) in defaults.columns() {
        if !row.contains_column(column) {
            row.set(column, value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::ColumnSpec;
    use common::{row, BoxError};
    use executor::{Connection, ConnectionProvider};
    use pretty_assertions::assert_eq;
    use types::SqlType;

    struct Unreachable;

    impl ConnectionProvider for Unreachable {
        fn acquire(&self) -> Result<Box<dyn Connection>, BoxError> {
            Err("no database in unit tests".into())
        }
    }

    fn users() -> TableManager {
        let table = TableDescriptor::try_new(
            "users",
            vec![
                ColumnSpec::new("id", SqlType::Int),
                ColumnSpec::new("name", SqlType::Text),
                ColumnSpec::new("role", SqlType::Text),
            ],
        )
        .unwrap();
        let executor = StatementExecutor::builder()
            .provider(Arc::new(Unreachable))
            .build();
        TableManager::new(table, Arc::new(executor))
    }

    #[test]
    fn builds_rows_in_order() {
        let mut users = users();
        let data_set = users
            .new_data_set_with_row()
            .unwrap()
            .set("id", 1)
            .unwrap()
            .set("name", "a")
            .unwrap()
            .and_row()
            .unwrap()
            .set("id", 2)
            .unwrap()
            .build_data_set()
            .unwrap();

        assert_eq!(
            data_set.rows(),
            &[row! { "id" => 1, "name" => "a" }, row! { "id" => 2 }]
        );
        assert_eq!(users.state(), OperationState::None);
    }

    #[test]
    fn defaults_fill_missing_columns_only() {
        let mut users = users();
        users.set_default_values().unwrap().set("role", "guest").unwrap();
        users
            .new_data_set_with_row()
            .unwrap()
            .set("id", 1)
            .unwrap()
            .and_row()
            .unwrap()
            .set("id", 2)
            .unwrap()
            .set("role", "admin")
            .unwrap();
        let data_set = users.build_data_set().unwrap();

        assert_eq!(data_set.rows()[0].get("role"), Some(&Value::Text("guest".into())));
        assert_eq!(data_set.rows()[1].get("role"), Some(&Value::Text("admin".into())));
    }

    #[test]
    fn explicit_null_overrides_default() {
        let mut users = users();
        users.set_default_values().unwrap().set("role", "guest").unwrap();
        let data_set = users
            .new_data_set_with_row()
            .unwrap()
            .set("role", Value::Null)
            .unwrap()
            .build_data_set()
            .unwrap();
        assert_eq!(data_set.rows()[0].get("role"), Some(&Value::Null));
    }

    #[test]
    fn generated_values_skip_explicit_ones() {
        let mut users = users();
        users.generate_values_for().unwrap().set("id", 5).unwrap();
        users.new_data_set_with_row().unwrap().set("name", "a").unwrap();
        users.and_row().unwrap().set("id", 20).unwrap();
        users.and_row().unwrap().set("name", "c").unwrap();
        let ids: Vec<_> = users
            .build_data_set()
            .unwrap()
            .iter()
            .map(|r| r.get("id").cloned())
            .collect();

        assert_eq!(
            ids,
            vec![Some(Value::Int(5)), Some(Value::Int(20)), Some(Value::Int(21))]
        );
    }

    #[test]
    fn default_for_generated_column_counts_as_explicit() {
        let mut users = users();
        users.set_default_values().unwrap().set("id", 7).unwrap();
        users.generate_values_for().unwrap().set("id", 0).unwrap();
        let data_set = users
            .new_data_set_with_row()
            .unwrap()
            .set("name", "a")
            .unwrap()
            .build_data_set()
            .unwrap();
        assert_eq!(data_set.rows()[0].get("id"), Some(&Value::Int(7)));
    }

    #[test]
    fn setting_a_column_outside_a_session_fails_and_resets() {
        let mut users = users();
        let err = users.set("id", 1).err().unwrap();
        assert!(matches!(err, DbError::IllegalSessionState { .. }));
        assert_eq!(users.state(), OperationState::None);

        let data_set = users
            .new_data_set_with_row()
            .unwrap()
            .set("id", 1)
            .unwrap()
            .build_data_set()
            .unwrap();
        assert_eq!(data_set.rows(), &[row! { "id" => 1 }]);
    }

    #[test]
    fn illegal_transition_names_expected_and_actual_state() {
        let mut users = users();
        users.new_query_where().unwrap();
        let err = users.new_insert_with_row().err().unwrap();
        assert_eq!(
            err.to_string(),
            "wrong operation state, expected: NONE,DEFAULT_VALUES,GENERATED_VALUES, actual: QUERY"
        );
        assert_eq!(users.state(), OperationState::None);
    }

    #[test]
    fn failed_call_discards_pending_rows() {
        let mut users = users();
        users.set_default_values().unwrap().set("role", "guest").unwrap();
        users.new_data_set_with_row().unwrap().set("id", 1).unwrap();
        assert!(users.execute().is_err());

        let data_set = users
            .new_data_set_with_row()
            .unwrap()
            .set("id", 2)
            .unwrap()
            .build_data_set()
            .unwrap();
        assert_eq!(data_set.rows(), &[row! { "id" => 2 }]);
    }

    #[test]
    fn unknown_column_resets_session() {
        let mut users = users();
        users.new_data_set_with_row().unwrap();
        let err = users.set("nope", 1).err().unwrap();
        assert!(matches!(err, DbError::UnknownColumn { .. }));
        assert_eq!(users.state(), OperationState::None);
    }

    #[test]
    fn generator_on_text_column_is_rejected() {
        let mut users = users();
        users.generate_values_for().unwrap();
        let err = users.set("name", "x").err().unwrap();
        assert!(matches!(err, DbError::Generator(_)));
        assert_eq!(users.state(), OperationState::None);
    }

    #[test]
    fn empty_row_is_rejected() {
        let mut users = users();
        users.new_data_set_with_row().unwrap();
        assert!(matches!(users.build_data_set(), Err(DbError::EmptyRow)));
        assert_eq!(users.state(), OperationState::None);
    }

    #[test]
    fn terminal_calls_require_their_state() {
        let mut users = users();
        assert!(users.build_data_set().is_err());
        assert!(users.execute_query().is_err());
        users.new_data_set_with_row().unwrap();
        assert!(users.get_all().is_err());
        assert_eq!(users.state(), OperationState::None);
    }

    #[test]
    fn transport_failure_ends_the_insert_session() {
        let mut users = users();
        let err = users
            .new_insert_with_row()
            .unwrap()
            .set("id", 1)
            .unwrap()
            .execute()
            .unwrap_err();
        assert!(matches!(err, DbError::Execution { .. }));
        assert_eq!(users.state(), OperationState::None);
    }
}
