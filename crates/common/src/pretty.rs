use crate::{DataSet, Row};
use tabled::{builder::Builder, settings::Style};
use types::Value;

/// Render a `DataSet` into a human-friendly table string.
///
/// Rows may carry different column sets; the header is the union of all
/// column names in first-seen order and absent cells stay blank. Borders are
/// plain ASCII.
pub fn render_data_set(data_set: &DataSet) -> String {
    if data_set.is_empty() {
        return "<empty>".into();
    }

    let headers = column_union(data_set);
    let mut builder = Builder::default();
    builder.push_record(headers.iter().cloned());

    for row in data_set {
        builder.push_record(
            headers
                .iter()
                .map(|col| row.get(col).map(format_value).unwrap_or_default()),
        );
    }

    builder.build().with(Style::ascii()).to_string()
}

/// Column names of every row, deduplicated, in first-seen order.
pub fn column_union(data_set: &DataSet) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for name in data_set.iter().flat_map(Row::column_names) {
        if !headers.iter().any(|h| h == name) {
            headers.push(name.to_string());
        }
    }
    headers
}

/// Format a full row as `col: value` pairs.
pub fn format_row(row: &Row) -> String {
    row.columns()
        .map(|(col, value)| format!("{col}: {}", format_value(value)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format a single value for display.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::SmallInt(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::BigInt(v) => v.to_string(),
        Value::Text(text) => format!("'{}'", text),
        Value::Bool(b) => b.to_string(),
        Value::Null => "NULL".into(),
    }
}
