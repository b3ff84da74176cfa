//! Monotonic surrogate key generators.

use common::{DbError, DbResult};
use types::{SqlType, Value};

/// Counter for one generated column, sized to the column's integral type.
///
/// Generated values strictly increase and never collide with explicit values
/// the session supplied for the same column: an explicit value at or above
/// the current floor moves the floor past it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueGenerator {
    ty: SqlType,
    /// `None` once the counter ran past the maximum of its width.
    next: Option<i64>,
}

impl ValueGenerator {
    /// Start a generator at `seed`; `Null` starts at zero.
    pub fn new(ty: SqlType, seed: &Value) -> DbResult<Self> {
        if !ty.is_integral() {
            return Err(DbError::Generator(format!(
                "values can only be generated for integral columns, not {ty:?}"
            )));
        }
        let start = match seed.coerce_to(&ty) {
            Some(Value::Null) => 0,
            Some(value) => value.as_i64().unwrap_or_default(),
            None => {
                return Err(DbError::Generator(format!(
                    "seed {seed:?} does not fit a {ty:?} column"
                )))
            }
        };
        Ok(Self {
            ty,
            next: Some(start),
        })
    }

    /// Hand out the current floor and advance it by one.
    pub fn next_value(&mut self) -> DbResult<Value> {
        let current = self.next.ok_or_else(|| {
            DbError::Generator(format!("{:?} generator is exhausted", self.ty))
        })?;
        let value = self.to_value(current)?;
        self.next = self.advance(current);
        Ok(value)
    }

    /// Make sure later generated values are strictly greater than `explicit`.
    pub fn set_value_greater_than(&mut self, explicit: &Value) -> DbResult<()> {
        let explicit = explicit.as_i64().ok_or_else(|| {
            DbError::Generator(format!(
                "explicit value {explicit:?} for a generated {:?} column is not an integer",
                self.ty
            ))
        })?;
        if let Some(floor) = self.next {
            if explicit >= floor {
                self.next = self.advance(explicit);
            }
        }
        Ok(())
    }

    fn advance(&self, from: i64) -> Option<i64> {
        from.checked_add(1).filter(|next| *next <= self.max())
    }

    fn max(&self) -> i64 {
        match self.ty {
            SqlType::SmallInt => i64::from(i16::MAX),
            SqlType::Int => i64::from(i32::MAX),
            _ => i64::MAX,
        }
    }

    fn to_value(&self, raw: i64) -> DbResult<Value> {
        Value::BigInt(raw)
            .coerce_to(&self.ty)
            .ok_or_else(|| DbError::Generator(format!("{raw} does not fit a {:?} column", self.ty)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn null_seed_starts_at_zero() {
        let mut generator = ValueGenerator::new(SqlType::Int, &Value::Null).unwrap();
        assert_eq!(generator.next_value().unwrap(), Value::Int(0));
        assert_eq!(generator.next_value().unwrap(), Value::Int(1));
    }

    #[test]
    fn values_use_the_column_width() {
        let mut small = ValueGenerator::new(SqlType::SmallInt, &Value::Int(5)).unwrap();
        assert_eq!(small.next_value().unwrap(), Value::SmallInt(5));

        let mut big = ValueGenerator::new(SqlType::BigInt, &Value::SmallInt(5)).unwrap();
        assert_eq!(big.next_value().unwrap(), Value::BigInt(5));
    }

    #[test]
    fn explicit_value_moves_floor_past_it() {
        let mut generator = ValueGenerator::new(SqlType::Int, &Value::Int(1)).unwrap();
        generator.set_value_greater_than(&Value::Int(10)).unwrap();
        assert_eq!(generator.next_value().unwrap(), Value::Int(11));
    }

    #[test]
    fn explicit_value_below_floor_is_ignored() {
        let mut generator = ValueGenerator::new(SqlType::Int, &Value::Int(10)).unwrap();
        generator.set_value_greater_than(&Value::Int(3)).unwrap();
        assert_eq!(generator.next_value().unwrap(), Value::Int(10));
    }

    #[test]
    fn non_integral_columns_are_rejected() {
        let err = ValueGenerator::new(SqlType::Text, &Value::Null).unwrap_err();
        assert!(matches!(err, DbError::Generator(_)));

        let err = ValueGenerator::new(SqlType::SmallInt, &Value::Int(100_000)).unwrap_err();
        assert!(format!("{err}").contains("does not fit"));

        let mut generator = ValueGenerator::new(SqlType::Int, &Value::Null).unwrap();
        assert!(generator
            .set_value_greater_than(&Value::Text("x".into()))
            .is_err());
    }

    #[test]
    fn overflow_is_an_error_instead_of_wrapping() {
        let mut generator =
            ValueGenerator::new(SqlType::SmallInt, &Value::SmallInt(i16::MAX)).unwrap();
        assert_eq!(generator.next_value().unwrap(), Value::SmallInt(i16::MAX));
        assert!(generator.next_value().is_err());
    }

    proptest! {
        #[test]
        fn generated_sequence_is_contiguous(seed in -1000i32..1000, n in 1usize..50) {
            let mut generator = ValueGenerator::new(SqlType::Int, &Value::Int(seed)).unwrap();
            for offset in 0..n {
                prop_assert_eq!(generator.next_value().unwrap(), Value::Int(seed + offset as i32));
            }
        }

        #[test]
        fn generated_values_exceed_explicit_values(seed in 0i64..100, explicit in 0i64..1000) {
            let mut generator = ValueGenerator::new(SqlType::BigInt, &Value::BigInt(seed)).unwrap();
            generator.set_value_greater_than(&Value::BigInt(explicit)).unwrap();
            let next = generator.next_value().unwrap().as_i64().unwrap();
            prop_assert!(next > explicit || explicit < seed);
            prop_assert!(next >= seed);
        }
    }
}
