//! Primitive coercion
//!
//! Converts a stored `Value` into a requested Rust type.
//!
//! Scalars are coerced best-effort (numeric strings parse, floats truncate,
//! integers widen to floats). Containers are never coerced: a list or map
//! getter over anything else is a `TypeMismatch`.

use crate::data::DataMap;
use crate::error::{Result, StoreError};

use super::Value;

/// A type that can be read out of a stored `Value`
pub trait FromValue: Sized {
    /// Name used in error messages
    const TYPE_NAME: &'static str;

    fn from_value(value: &Value) -> Result<Self>;
}

fn coercion_error(expected: &'static str, value: &Value) -> StoreError {
    StoreError::Coercion {
        expected,
        found: value.describe(),
    }
}

fn mismatch_error(expected: &'static str, value: &Value) -> StoreError {
    StoreError::TypeMismatch {
        expected,
        found: value.type_name().to_string(),
    }
}

/// Widen any integer-like value to i64
fn coerce_i64(value: &Value, expected: &'static str) -> Result<i64> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::Float(f) if f.is_finite() && *f >= i64::MIN as f64 && *f < i64::MAX as f64 => {
            Ok(f.trunc() as i64)
        }
        Value::Str(s) => s.trim().parse().map_err(|_| coercion_error(expected, value)),
        _ => Err(coercion_error(expected, value)),
    }
}

fn coerce_f64(value: &Value, expected: &'static str) -> Result<f64> {
    match value {
        Value::Int(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        Value::Str(s) => s.trim().parse().map_err(|_| coercion_error(expected, value)),
        _ => Err(coercion_error(expected, value)),
    }
}

impl FromValue for bool {
    const TYPE_NAME: &'static str = "boolean";

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Str(s) if s.trim().eq_ignore_ascii_case("true") => Ok(true),
            Value::Str(s) if s.trim().eq_ignore_ascii_case("false") => Ok(false),
            _ => Err(coercion_error(Self::TYPE_NAME, value)),
        }
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty => $name:literal),*) => {
        $(
            impl FromValue for $ty {
                const TYPE_NAME: &'static str = $name;

                fn from_value(value: &Value) -> Result<Self> {
                    let wide = coerce_i64(value, Self::TYPE_NAME)?;
                    <$ty>::try_from(wide).map_err(|_| coercion_error(Self::TYPE_NAME, value))
                }
            }
        )*
    };
}

impl_from_value_int!(i8 => "byte", i16 => "short", i32 => "int", i64 => "long");

impl FromValue for f64 {
    const TYPE_NAME: &'static str = "double";

    fn from_value(value: &Value) -> Result<Self> {
        coerce_f64(value, Self::TYPE_NAME)
    }
}

impl FromValue for f32 {
    const TYPE_NAME: &'static str = "float";

    fn from_value(value: &Value) -> Result<Self> {
        let wide = coerce_f64(value, Self::TYPE_NAME)?;
        let narrow = wide as f32;
        // Finite doubles beyond f32 range would become infinity
        if wide.is_finite() && narrow.is_infinite() {
            return Err(coercion_error(Self::TYPE_NAME, value));
        }
        Ok(narrow)
    }
}

impl FromValue for String {
    const TYPE_NAME: &'static str = "string";

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            other => Ok(other.to_string()),
        }
    }
}

impl FromValue for Vec<Value> {
    const TYPE_NAME: &'static str = "list";

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::List(items) => Ok(items.clone()),
            other => Err(mismatch_error(Self::TYPE_NAME, other)),
        }
    }
}

impl FromValue for DataMap {
    const TYPE_NAME: &'static str = "map";

    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Map(map) => Ok(map.clone()),
            other => Err(mismatch_error(Self::TYPE_NAME, other)),
        }
    }
}

/// Cast a stored list element by element without coercion.
///
/// `cast` returns `None` for an element of the wrong shape, which fails the
/// whole read.
pub fn list_of<T>(
    value: &Value,
    expected: &'static str,
    cast: impl Fn(&Value) -> Option<T>,
) -> Result<Vec<T>> {
    let items = match value {
        Value::List(items) => items,
        other => return Err(mismatch_error(expected, other)),
    };

    items
        .iter()
        .map(|item| cast(item).ok_or_else(|| mismatch_error(expected, item)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_truncates_to_int() {
        assert_eq!(i32::from_value(&Value::Float(3.9)).unwrap(), 3);
        assert_eq!(i64::from_value(&Value::Float(-2.5)).unwrap(), -2);
    }

    #[test]
    fn test_narrowing_out_of_range_fails() {
        let err = i8::from_value(&Value::Int(300)).unwrap_err();
        assert!(matches!(err, StoreError::Coercion { expected: "byte", .. }));
    }

    #[test]
    fn test_nan_does_not_coerce_to_int() {
        assert!(i64::from_value(&Value::Float(f64::NAN)).is_err());
    }
}
