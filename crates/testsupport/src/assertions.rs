//! Custom assertion helpers for testing.
//!
//! Provides specialized assertion functions for common fixture testing
//! patterns: error messages, session state errors and data set equality.

use common::{pretty, DataSet, DbError, DbResult, Row};
use pretty_assertions::assert_eq;
use types::Value;

/// Assert that an operation returns an error containing a specific substring.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
///
/// let result: Result<(), common::DbError> = Err(common::DbError::EmptyRow);
/// assert_error_contains(result, "no columns");
/// ```
#[track_caller]
pub fn assert_error_contains<T>(result: DbResult<T>, expected_msg: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}', but got Ok", expected_msg),
        Err(e) => {
            let error_string = e.to_string();
            assert!(
                error_string.contains(expected_msg),
                "Expected error to contain '{}', but got: {}",
                expected_msg,
                error_string
            );
        }
    }
}

/// Assert that a builder call failed because the session was in the wrong state.
///
/// `actual` is the state name reported by the error, e.g. `"QUERY"`.
#[track_caller]
pub fn assert_illegal_state<T>(result: DbResult<T>, actual: &str) {
    match result {
        Ok(_) => panic!("Expected illegal session state '{}', but got Ok", actual),
        Err(DbError::IllegalSessionState { actual: found, .. }) => {
            assert_eq!(found, actual, "Illegal state reported a different actual state");
        }
        Err(other) => panic!(
            "Expected illegal session state '{}', but got different error: {}",
            actual, other
        ),
    }
}

/// Assert that two rows hold the same columns and values, in any order.
#[track_caller]
pub fn assert_rows_equal(actual: &Row, expected: &Row) {
    assert!(
        actual == expected,
        "Rows not equal:\nExpected: {}\nActual:   {}",
        expected,
        actual
    );
}

/// Assert that two data sets hold equal rows in the same order.
///
/// # Example
///
/// ```
/// use common::{row, DataSet};
/// use testsupport::prelude::*;
///
/// let a = DataSet::new().with_row(row! { "id" => 1 }).unwrap();
/// let b = DataSet::new().with_row(row! { "id" => 1 }).unwrap();
/// assert_data_sets_equal(&a, &b);
/// ```
#[track_caller]
pub fn assert_data_sets_equal(actual: &DataSet, expected: &DataSet) {
    assert_eq!(
        actual.row_count(),
        expected.row_count(),
        "Row count mismatch: expected {} rows, got {}",
        expected.row_count(),
        actual.row_count()
    );

    for (i, (actual_row, expected_row)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            actual_row == expected_row,
            "Row {} mismatch:\nExpected: {}\nActual:   {}\n\n{}",
            i,
            expected_row,
            actual_row,
            pretty::render_data_set(actual)
        );
    }
}

/// Assert that a column of a row holds an expected value.
#[track_caller]
pub fn assert_column_eq(row: &Row, column: &str, expected: impl Into<Value>) {
    let expected = expected.into();
    assert_eq!(
        row.get(column),
        Some(&expected),
        "column '{}' of {}",
        column,
        row
    );
}
