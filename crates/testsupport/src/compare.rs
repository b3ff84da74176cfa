//! Comparison of an expected data set against the rows a query returned.
//!
//! Matching is by containment: an actual row satisfies an expected row when
//! every expected column is present with an equal value. Each actual row can
//! satisfy at most one expected row.

use common::{pretty::render_data_set, DataSet, DbError, DbResult, Row};

/// How strictly two data sets are compared.
///
/// The default requires equal row counts and nothing else.
///
/// # Example
///
/// ```
/// use testsupport::compare::CompareMode;
///
/// let mode = CompareMode::builder()
///     .exact_column_set(true)
///     .exact_row_sequence(true)
///     .build();
/// assert!(mode.exact_row_set);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, bon::Builder)]
pub struct CompareMode {
    /// Matched rows must have exactly the expected columns, no extras.
    #[builder(default = false)]
    pub exact_column_set: bool,
    /// Both data sets must have the same number of rows.
    #[builder(default = true)]
    pub exact_row_set: bool,
    /// Expected rows must be found in order; skipped actual rows are consumed.
    #[builder(default = false)]
    pub exact_row_sequence: bool,
}

impl CompareMode {
    /// Default mode with the given row sequence requirement.
    pub fn new(exact_row_sequence: bool) -> Self {
        Self {
            exact_row_sequence,
            ..Self::default()
        }
    }
}

impl Default for CompareMode {
    fn default() -> Self {
        Self {
            exact_column_set: false,
            exact_row_set: true,
            exact_row_sequence: false,
        }
    }
}

/// Check that `actual` contains the rows of `expected` under `mode`.
///
/// Returns [`DbError::ComparisonMismatch`] describing the first problem found
/// together with both data sets rendered as tables.
pub fn check_contains_expected_data(
    expected: &DataSet,
    actual: &DataSet,
    mode: CompareMode,
) -> DbResult<()> {
    if mode.exact_row_set && expected.row_count() != actual.row_count() {
        return Err(mismatch(
            format!(
                "expected {} rows but found {}",
                expected.row_count(),
                actual.row_count()
            ),
            expected,
            actual,
        ));
    }

    let mut remaining: Vec<&Row> = actual.iter().collect();
    for (position, expected_row) in expected.iter().enumerate() {
        if !take_match(&mut remaining, expected_row, mode) {
            return Err(mismatch(
                format!("expected row {position} not found: {expected_row}"),
                expected,
                actual,
            ));
        }
    }
    Ok(())
}

/// Panicking form of [`check_contains_expected_data`] with the default mode.
#[track_caller]
pub fn assert_contains_expected_data(expected: &DataSet, actual: &DataSet) {
    assert_contains_expected_data_with(expected, actual, CompareMode::default());
}

#[track_caller]
pub fn assert_contains_expected_data_with(expected: &DataSet, actual: &DataSet, mode: CompareMode) {
    if let Err(err) = check_contains_expected_data(expected, actual, mode) {
        panic!("{err}");
    }
}

/// Remove the first row matching `expected` from `remaining`.
///
/// In sequence mode every row examined before the match is removed too.
fn take_match(remaining: &mut Vec<&Row>, expected: &Row, mode: CompareMode) -> bool {
    let mut idx = 0;
    while idx < remaining.len() {
        if remaining[idx].contains_expected_data(expected, mode.exact_column_set) {
            remaining.remove(idx);
            return true;
        }
        if mode.exact_row_sequence {
            remaining.remove(idx);
        } else {
            idx += 1;
        }
    }
    false
}

fn mismatch(reason: String, expected: &DataSet, actual: &DataSet) -> DbError {
    DbError::ComparisonMismatch(format!(
        "{reason}\nexpected ({} rows):\n{}\nactual ({} rows):\n{}",
        expected.row_count(),
        render_data_set(expected),
        actual.row_count(),
        render_data_set(actual),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proptest_generators::arb_data_set;
    use common::row;
    use proptest::prelude::*;

    fn data_set(rows: Vec<Row>) -> DataSet {
        DataSet::try_from(rows).unwrap()
    }

    fn people() -> DataSet {
        data_set(vec![
            row! { "id" => 1, "name" => "a" },
            row! { "id" => 2, "name" => "b" },
        ])
    }

    #[test]
    fn default_mode_matches_any_order() {
        let actual = data_set(vec![
            row! { "id" => 2, "name" => "b" },
            row! { "id" => 1, "name" => "a" },
        ]);
        check_contains_expected_data(&people(), &actual, CompareMode::default()).unwrap();
    }

    #[test]
    fn row_sequence_rejects_swapped_rows() {
        let actual = data_set(vec![
            row! { "id" => 2, "name" => "b" },
            row! { "id" => 1, "name" => "a" },
        ]);
        let err = check_contains_expected_data(&people(), &actual, CompareMode::new(true))
            .unwrap_err();
        assert!(err.to_string().contains("expected row 1 not found"));
    }

    #[test]
    fn row_count_differs_under_exact_row_set() {
        let mut actual = people();
        actual.add_row(row! { "id" => 3, "name" => "c" }).unwrap();

        let err =
            check_contains_expected_data(&people(), &actual, CompareMode::default()).unwrap_err();
        assert!(err.to_string().contains("expected 2 rows but found 3"));

        let lenient = CompareMode::builder().exact_row_set(false).build();
        check_contains_expected_data(&people(), &actual, lenient).unwrap();
    }

    #[test]
    fn extra_actual_column_only_matters_with_exact_column_set() {
        let expected = data_set(vec![row! { "id" => 1 }]);
        let actual = data_set(vec![row! { "id" => 1, "name" => "a" }]);

        check_contains_expected_data(&expected, &actual, CompareMode::default()).unwrap();
        let strict = CompareMode::builder().exact_column_set(true).build();
        assert!(check_contains_expected_data(&expected, &actual, strict).is_err());
    }

    #[test]
    fn each_actual_row_matches_once() {
        let expected = data_set(vec![row! { "name" => "a" }, row! { "name" => "a" }]);
        let actual = data_set(vec![
            row! { "id" => 1, "name" => "a" },
            row! { "id" => 2, "name" => "b" },
        ]);
        assert!(check_contains_expected_data(&expected, &actual, CompareMode::default()).is_err());
    }

    #[test]
    fn mismatch_renders_both_data_sets() {
        let actual = data_set(vec![row! { "id" => 9, "name" => "z" }]);
        let lenient = CompareMode::builder().exact_row_set(false).build();
        let message = check_contains_expected_data(&people(), &actual, lenient)
            .unwrap_err()
            .to_string();

        assert!(message.contains("{id: 1, name: 'a'}"));
        assert!(message.contains("expected (2 rows)"));
        assert!(message.contains("actual (1 rows)"));
        assert!(message.contains("'z'"));
    }

    #[test]
    #[should_panic(expected = "not found")]
    fn assert_panics_on_mismatch() {
        let actual = data_set(vec![
            row! { "id" => 1, "name" => "a" },
            row! { "id" => 3, "name" => "c" },
        ]);
        assert_contains_expected_data(&people(), &actual);
    }

    #[test]
    fn default_mode_flags() {
        let mode = CompareMode::default();
        assert!(!mode.exact_column_set);
        assert!(mode.exact_row_set);
        assert!(!mode.exact_row_sequence);
        assert_eq!(CompareMode::builder().build(), mode);
    }

    proptest! {
        #[test]
        fn data_set_contains_itself(data_set in arb_data_set()) {
            prop_assert!(check_contains_expected_data(&data_set, &data_set, CompareMode::default()).is_ok());
            let strict = CompareMode::builder()
                .exact_column_set(true)
                .exact_row_sequence(true)
                .build();
            prop_assert!(check_contains_expected_data(&data_set, &data_set, strict).is_ok());
        }

        #[test]
        fn reversed_rows_match_without_sequence(data_set in arb_data_set()) {
            let reversed = DataSet::try_from(data_set.rows().iter().rev().cloned().collect::<Vec<_>>()).unwrap();
            prop_assert!(check_contains_expected_data(&data_set, &reversed, CompareMode::default()).is_ok());
        }
    }
}
