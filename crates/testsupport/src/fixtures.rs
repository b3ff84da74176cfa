//! Common test fixtures: table layouts, their DDL and sample data.
//!
//! Two tables are provided, `users` and `orders`, each as a descriptor for the
//! dynamic builder, as DDL for SQLite and as a typed builder declared with
//! [`database::table_manager!`].

use catalog::{Catalog, ColumnSpec, EnumName, EnumToNameConverter, TableDescriptor};
use common::{row, DataSet, DbResult, Row};
use database::table_manager;
use types::SqlType;

pub const USERS_DDL: &str = "create table users (
    id integer primary key,
    name text not null,
    status text,
    active integer
)";

pub const ORDERS_DDL: &str = "create table orders (
    id integer primary key,
    user_id integer not null references users(id),
    amount integer,
    note text
)";

/// Account status, stored by variant name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Active,
    Locked,
    Deleted,
}

impl EnumName for Status {
    fn name(&self) -> &'static str {
        match self {
            Status::Active => "ACTIVE",
            Status::Locked => "LOCKED",
            Status::Deleted => "DELETED",
        }
    }
}

table_manager! {
    /// Typed builder for the `users` table.
    pub struct Users for "users" {
        id: BigInt,
        name: Text,
        status: Text => EnumToNameConverter<Status>,
        active: Bool,
    }
}

table_manager! {
    /// Typed builder for the `orders` table; `owner` maps to `user_id`.
    pub struct Orders for "orders" {
        id: BigInt,
        owner: BigInt [name = "user_id"],
        amount: Int,
        note: Text,
    }
}

/// Descriptor of the `users` table, with the status converter attached.
pub fn users_table() -> DbResult<TableDescriptor> {
    TableDescriptor::try_new(
        "users",
        vec![
            ColumnSpec::new("id", SqlType::BigInt),
            ColumnSpec::new("name", SqlType::Text),
            ColumnSpec::new("status", SqlType::Text)
                .with_converter(EnumToNameConverter::<Status>::new()),
            ColumnSpec::new("active", SqlType::Bool),
        ],
    )
}

pub fn orders_table() -> DbResult<TableDescriptor> {
    TableDescriptor::try_new(
        "orders",
        vec![
            ColumnSpec::new("id", SqlType::BigInt),
            ColumnSpec::new("user_id", SqlType::BigInt),
            ColumnSpec::new("amount", SqlType::Int),
            ColumnSpec::new("note", SqlType::Text),
        ],
    )
}

/// Catalog holding both fixture tables.
pub fn shop_catalog() -> DbResult<Catalog> {
    let mut catalog = Catalog::new();
    catalog.register(users_table()?)?;
    catalog.register(orders_table()?)?;
    Ok(catalog)
}

/// A `users` row with every column set.
pub fn user_row(id: i64, name: &str, status: Status, active: bool) -> Row {
    row! {
        "id" => id,
        "name" => name,
        "status" => status.name(),
        "active" => active,
    }
}

/// Three users, one per status.
pub fn sample_users() -> DbResult<DataSet> {
    DataSet::try_from(vec![
        user_row(1, "alice", Status::Active, true),
        user_row(2, "bob", Status::Locked, false),
        user_row(3, "carol", Status::Deleted, false),
    ])
}

/// Orders referencing the users of [`sample_users`].
pub fn sample_orders() -> DbResult<DataSet> {
    DataSet::try_from(vec![
        row! { "id" => 10i64, "user_id" => 1i64, "amount" => 250, "note" => "first" },
        row! { "id" => 11i64, "user_id" => 1i64, "amount" => 75, "note" => types::Value::Null },
        row! { "id" => 12i64, "user_id" => 2i64, "amount" => 120, "note" => "gift" },
    ])
}
