//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random values, rows and data sets for
//! property-based testing of the fixture builders and the comparator.

use common::{DataSet, Row};
use proptest::prelude::*;
use types::{SqlType, Value};

/// Strategy for generating random `Value` instances of every variant.
pub fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i16>().prop_map(Value::SmallInt),
        any::<i32>().prop_map(Value::Int),
        any::<i64>().prop_map(Value::BigInt),
        "[a-z]{1,20}".prop_map(Value::Text),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
    ]
}

/// Strategy for generating a `Value` that fits a column of type `ty`.
pub fn arb_value_for(ty: SqlType) -> BoxedStrategy<Value> {
    match ty {
        SqlType::SmallInt => any::<i16>().prop_map(Value::SmallInt).boxed(),
        SqlType::Int => any::<i32>().prop_map(Value::Int).boxed(),
        SqlType::BigInt => any::<i64>().prop_map(Value::BigInt).boxed(),
        SqlType::Text => "[a-z]{1,20}".prop_map(Value::Text).boxed(),
        SqlType::Bool => any::<bool>().prop_map(Value::Bool).boxed(),
    }
}

/// Strategy for generating random `SqlType` instances.
pub fn arb_sql_type() -> impl Strategy<Value = SqlType> {
    prop_oneof![
        Just(SqlType::SmallInt),
        Just(SqlType::Int),
        Just(SqlType::BigInt),
        Just(SqlType::Text),
        Just(SqlType::Bool),
    ]
}

/// Strategy for generating a row over the columns `c0..c{len}`.
///
/// # Example
///
/// ```
/// use proptest::prelude::*;
/// use testsupport::proptest_generators::arb_row_with_len;
///
/// proptest! {
///     #[test]
///     fn fixed_width(row in arb_row_with_len(3)) {
///         assert_eq!(row.len(), 3);
///     }
/// }
/// ```
pub fn arb_row_with_len(len: usize) -> impl Strategy<Value = Row> {
    prop::collection::vec(arb_value(), len).prop_map(|values| {
        values
            .into_iter()
            .enumerate()
            .map(|(idx, value)| (format!("c{idx}"), value))
            .collect::<Row>()
    })
}

/// Strategy for generating rows with 1-6 columns.
pub fn arb_row() -> impl Strategy<Value = Row> {
    (1usize..6).prop_flat_map(arb_row_with_len)
}

/// Strategy for generating non-empty data sets whose rows share one column set.
///
/// # Example
///
/// ```
/// use proptest::prelude::*;
/// use testsupport::proptest_generators::arb_data_set;
///
/// proptest! {
///     #[test]
///     fn never_empty(data_set in arb_data_set()) {
///         assert!(data_set.row_count() > 0);
///     }
/// }
/// ```
pub fn arb_data_set() -> impl Strategy<Value = DataSet> {
    (1usize..5).prop_flat_map(|width| {
        prop::collection::vec(arb_row_with_len(width), 1..8)
            .prop_filter_map("data set rejected a row", |rows| DataSet::try_from(rows).ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn typed_values_coerce_to_their_type(
            (ty, value) in arb_sql_type().prop_flat_map(|ty| (Just(ty), arb_value_for(ty)))
        ) {
            prop_assert_eq!(value.coerce_to(&ty), Some(value.clone()));
        }

        #[test]
        fn data_set_rows_share_columns(data_set in arb_data_set()) {
            let first: Vec<&str> = data_set.rows()[0].column_names().collect();
            for row in &data_set {
                prop_assert_eq!(row.column_names().collect::<Vec<_>>(), first.clone());
            }
        }

        #[test]
        fn rows_are_never_empty(row in arb_row()) {
            prop_assert!(!row.is_empty());
        }
    }
}
