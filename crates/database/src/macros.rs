/// Declares a typed builder for one table.
///
/// Each column becomes a setter named after it. Columns declared with
/// `=> Converter` take the converter's attribute type instead of a plain
/// value, and `[name = "col"]` maps the setter onto a differently named column.
///
/// ```no_run
/// use catalog::{EnumName, EnumToNameConverter};
/// use database::{table_manager, DatabaseManager};
///
/// pub enum Status {
///     Active,
///     Locked,
/// }
///
/// impl EnumName for Status {
///     fn name(&self) -> &'static str {
///         match self {
///             Status::Active => "ACTIVE",
///             Status::Locked => "LOCKED",
///         }
///     }
/// }
///
/// table_manager! {
///     pub struct Users for "users" {
///         id: BigInt,
///         name: Text,
///         status: Text => EnumToNameConverter<Status>,
///         owner: BigInt [name = "owner_id"],
///     }
/// }
///
/// # fn demo(db: &DatabaseManager) -> common::DbResult<()> {
/// let mut users = Users::new(db)?;
/// users
///     .new_insert_with_row()?
///     .id(1)?
///     .name("alice")?
///     .status(Status::Active)?
///     .execute()?;
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! table_manager {
    (@name $field:ident ;) => {
        stringify!($field)
    };
    (@name $field:ident ; $col:literal) => {
        $col
    };

    (@spec $field:ident, $ty:ident ; $($col:literal)?) => {
        $crate::__private::ColumnSpec::new(
            $crate::table_manager!(@name $field ; $($col)?),
            $crate::__private::SqlType::$ty,
        )
    };
    (@spec $field:ident, $ty:ident, $conv:ty ; $($col:literal)?) => {
        $crate::table_manager!(@spec $field, $ty ; $($col)?)
            .with_converter(<$conv as ::core::default::Default>::default())
    };

    (@setter $(#[$meta:meta])* $field:ident ; $($col:literal)?) => {
        $(#[$meta])*
        pub fn $field(
            &mut self,
            value: impl Into<$crate::__private::Value>,
        ) -> $crate::__private::DbResult<&mut Self> {
            self.inner
                .set($crate::table_manager!(@name $field ; $($col)?), value)?;
            Ok(self)
        }
    };
    (@setter $(#[$meta:meta])* $field:ident, $conv:ty ; $($col:literal)?) => {
        $(#[$meta])*
        pub fn $field(
            &mut self,
            attribute: <$conv as $crate::__private::AttributeConverter>::Attribute,
        ) -> $crate::__private::DbResult<&mut Self> {
            self.inner
                .set_converted($crate::table_manager!(@name $field ; $($col)?), attribute)?;
            Ok(self)
        }
    };

    (@control $($method:ident),*) => {
        $(
            pub fn $method(&mut self) -> $crate::__private::DbResult<&mut Self> {
                self.inner.$method()?;
                Ok(self)
            }
        )*
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident for $table:literal {
            $(
                $(#[$fmeta:meta])*
                $field:ident : $ty:ident $(=> $conv:ty)? $([name = $col:literal])?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            inner: $crate::TableManager,
        }

        impl $name {
            pub const TABLE: &'static str = $table;

            pub fn descriptor() -> $crate::__private::DbResult<$crate::__private::TableDescriptor> {
                $crate::__private::TableDescriptor::try_new(
                    $table,
                    vec![$($crate::table_manager!(@spec $field, $ty $(, $conv)? ; $($col)?)),*],
                )
            }

            pub fn new(db: &$crate::DatabaseManager) -> $crate::__private::DbResult<Self> {
                Ok(Self {
                    inner: db.table_manager(Self::descriptor()?),
                })
            }

            $(
                $crate::table_manager!(@setter $(#[$fmeta])* $field $(, $conv)? ; $($col)?);
            )*

            $crate::table_manager!(@control
                set_default_values,
                generate_values_for,
                new_query_where,
                new_data_set_with_row,
                new_insert_with_row,
                and_row
            );

            pub fn execute(&mut self) -> $crate::__private::DbResult<()> {
                self.inner.execute()
            }

            pub fn execute_query(&mut self) -> $crate::__private::DbResult<$crate::__private::DataSet> {
                self.inner.execute_query()
            }

            pub fn build_data_set(&mut self) -> $crate::__private::DbResult<$crate::__private::DataSet> {
                self.inner.build_data_set()
            }

            pub fn get_all(&mut self) -> $crate::__private::DbResult<$crate::__private::DataSet> {
                self.inner.get_all()
            }

            pub fn table_name(&self) -> &str {
                self.inner.table_name()
            }

            pub fn state(&self) -> $crate::OperationState {
                self.inner.state()
            }

            pub fn inner_mut(&mut self) -> &mut $crate::TableManager {
                &mut self.inner
            }
        }
    };
}
