//! Literal SQL text for the statements the executor issues.

/// `insert into t(a, b) values(?, ?)`
pub fn insert_statement<'a>(table: &str, columns: impl IntoIterator<Item = &'a str>) -> String {
    let columns: Vec<&str> = columns.into_iter().collect();
    format!(
        "insert into {table}({}) values({})",
        columns.join(", "),
        vec!["?"; columns.len()].join(", ")
    )
}

/// `select a, b from t where x = ? and y = ?`
pub fn select_statement<'a>(
    table: &str,
    columns: impl IntoIterator<Item = &'a str>,
    conditions: impl IntoIterator<Item = &'a str>,
) -> String {
    let predicate = conditions
        .into_iter()
        .map(|col| format!("{col} = ?"))
        .collect::<Vec<_>>()
        .join(" and ");
    format!("{} where {predicate}", select_all_statement(table, columns))
}

/// `select a, b from t`
pub fn select_all_statement<'a>(table: &str, columns: impl IntoIterator<Item = &'a str>) -> String {
    format!(
        "select {} from {table}",
        columns.into_iter().collect::<Vec<_>>().join(", ")
    )
}

/// `delete from t`
pub fn delete_all_statement(table: &str) -> String {
    format!("delete from {table}")
}
