//! One-directional value converters applied when a column value is set.
//!
//! A converter maps a domain attribute (an enum, a newtype, ...) to the scalar
//! stored in the database. The reverse direction exists in the trait so that
//! converters can be shared with code that reads entities back, but the
//! fixture builders never call it.

use std::{any::Any, fmt, marker::PhantomData};

use common::{DbError, DbResult};
use types::Value;

/// Typed conversion between a domain attribute and a stored column value.
pub trait AttributeConverter: Send + Sync + 'static {
    type Attribute: 'static;

    fn to_column(&self, attribute: &Self::Attribute) -> DbResult<Value>;

    fn to_attribute(&self, column: &Value) -> DbResult<Self::Attribute>;
}

/// Object-safe view of an [`AttributeConverter`], as stored in a `ColumnSpec`.
pub trait ValueConverter: Send + Sync {
    /// Converter type name, for diagnostics.
    fn name(&self) -> &'static str;

    /// Converts an attribute; fails if it is not of the converter's attribute type.
    fn convert(&self, attribute: &dyn Any) -> DbResult<Value>;

    fn convert_back(&self, column: &Value) -> DbResult<Box<dyn Any>>;
}

impl<C: AttributeConverter> ValueConverter for C {
    fn name(&self) -> &'static str {
        std::any::type_name::<C>()
    }

    fn convert(&self, attribute: &dyn Any) -> DbResult<Value> {
        let attribute = attribute
            .downcast_ref::<C::Attribute>()
            .ok_or_else(|| {
                DbError::Conversion(format!(
                    "{} expects an attribute of type {}",
                    self.name(),
                    std::any::type_name::<C::Attribute>()
                ))
            })?;
        self.to_column(attribute)
    }

    fn convert_back(&self, column: &Value) -> DbResult<Box<dyn Any>> {
        let attribute = self.to_attribute(column)?;
        Ok(Box::new(attribute))
    }
}

impl fmt::Debug for dyn ValueConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueConverter").field(&self.name()).finish()
    }
}

/// Enumerations that can report the name of their variant.
pub trait EnumName {
    fn name(&self) -> &'static str;
}

/// Stores an enumeration as the name of its variant.
///
/// The reverse direction always fails: a stored name carries no type
/// information to rebuild the variant from.
pub struct EnumToNameConverter<E>(PhantomData<fn() -> E>);

impl<E> EnumToNameConverter<E> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E> Default for EnumToNameConverter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EnumName + 'static> AttributeConverter for EnumToNameConverter<E> {
    type Attribute = E;

    fn to_column(&self, attribute: &E) -> DbResult<Value> {
        Ok(Value::Text(attribute.name().to_string()))
    }

    fn to_attribute(&self, column: &Value) -> DbResult<E> {
        Err(DbError::UnsupportedReverseConversion(format!(
            "cannot restore {} from {column:?}",
            std::any::type_name::<E>()
        )))
    }
}
