//! Value conversion between the shared model and CQL driver types

use polystore_core::Value;
use scylla::frame::response::result::{ColumnType as CqlType, CqlValue};

/// Coerce a bound parameter to the driver value expected by the target
/// column. `Int` widens or narrows between `int` and `bigint` so callers
/// never have to care which one the schema uses.
pub(crate) fn to_cql(value: &Value, target: &CqlType) -> Option<CqlValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(CqlValue::Boolean(*b)),
        Value::Int(i) => match target {
            CqlType::Int => Some(CqlValue::Int(*i as i32)),
            CqlType::SmallInt => Some(CqlValue::SmallInt(*i as i16)),
            CqlType::TinyInt => Some(CqlValue::TinyInt(*i as i8)),
            _ => Some(CqlValue::BigInt(*i)),
        },
        Value::Uuid(u) => Some(CqlValue::Uuid(*u)),
        Value::Text(s) => match target {
            CqlType::Ascii => Some(CqlValue::Ascii(s.clone())),
            _ => Some(CqlValue::Text(s.clone())),
        },
    }
}

/// Materialize one driver cell. Driver types outside the shared model
/// degrade to `Null`.
pub(crate) fn from_cql(value: Option<CqlValue>) -> Value {
    match value {
        None => Value::Null,
        Some(CqlValue::Boolean(b)) => Value::Bool(b),
        Some(CqlValue::TinyInt(i)) => Value::Int(i as i64),
        Some(CqlValue::SmallInt(i)) => Value::Int(i as i64),
        Some(CqlValue::Int(i)) => Value::Int(i as i64),
        Some(CqlValue::BigInt(i)) => Value::Int(i),
        Some(CqlValue::Counter(c)) => Value::Int(c.0),
        Some(CqlValue::Uuid(u)) => Value::Uuid(u),
        Some(CqlValue::Text(s)) => Value::Text(s),
        Some(CqlValue::Ascii(s)) => Value::Text(s),
        Some(_) => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn int_adapts_to_target_width() {
        assert_eq!(
            to_cql(&Value::Int(5), &CqlType::Int),
            Some(CqlValue::Int(5))
        );
        assert_eq!(
            to_cql(&Value::Int(5), &CqlType::BigInt),
            Some(CqlValue::BigInt(5))
        );
    }

    #[test]
    fn null_binds_as_none() {
        assert_eq!(to_cql(&Value::Null, &CqlType::Text), None);
        assert_eq!(from_cql(None), Value::Null);
    }

    #[test]
    fn core_kinds_roundtrip() {
        let id = Uuid::new_v4();
        assert_eq!(from_cql(Some(CqlValue::Uuid(id))), Value::Uuid(id));
        assert_eq!(from_cql(Some(CqlValue::Boolean(true))), Value::Bool(true));
        assert_eq!(from_cql(Some(CqlValue::Int(3))), Value::Int(3));
        assert_eq!(
            from_cql(Some(CqlValue::Text("x".to_string()))),
            Value::Text("x".to_string())
        );
    }

    #[test]
    fn exotic_driver_types_degrade_to_null() {
        assert_eq!(from_cql(Some(CqlValue::Double(1.5))), Value::Null);
    }
}
