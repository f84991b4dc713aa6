//! Value types for SQL parameters and result columns

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A SQL value that can be bound as a parameter or read back from a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// String value
    String(String),
    /// Bytes value
    Bytes(Vec<u8>),
    /// JSON value
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the SQL type name for this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::I32(_) => "INTEGER",
            Value::I64(_) => "BIGINT",
            Value::F32(_) => "REAL",
            Value::F64(_) => "DOUBLE PRECISION",
            Value::String(_) => "TEXT",
            Value::Bytes(_) => "BYTEA",
            Value::Json(_) => "JSON",
        }
    }

    /// Short description used in conversion errors
    fn describe(&self) -> String {
        match self {
            Value::String(s) => format!("TEXT '{}'", s),
            Value::I32(v) => format!("INTEGER {}", v),
            Value::I64(v) => format!("BIGINT {}", v),
            other => other.type_name().to_string(),
        }
    }
}

// Implement From for common types
impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Bool(val)
    }
}

impl From<i16> for Value {
    fn from(val: i16) -> Self {
        Value::I32(val.into())
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Self {
        Value::I32(val)
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::I64(val)
    }
}

impl From<u32> for Value {
    fn from(val: u32) -> Self {
        Value::I64(val.into())
    }
}

impl From<f32> for Value {
    fn from(val: f32) -> Self {
        Value::F32(val)
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::F64(val)
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::String(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::String(val.to_string())
    }
}

impl From<&String> for Value {
    fn from(val: &String) -> Self {
        Value::String(val.clone())
    }
}

impl From<Vec<u8>> for Value {
    fn from(val: Vec<u8>) -> Self {
        Value::Bytes(val)
    }
}

impl From<serde_json::Value> for Value {
    fn from(val: serde_json::Value) -> Self {
        Value::Json(val)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::NaiveDateTime> for Value {
    fn from(val: chrono::NaiveDateTime) -> Self {
        Value::String(val.to_string())
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::NaiveDate> for Value {
    fn from(val: chrono::NaiveDate) -> Self {
        Value::String(val.to_string())
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::DateTime<chrono::Utc>> for Value {
    fn from(val: chrono::DateTime<chrono::Utc>) -> Self {
        Value::String(val.to_rfc3339())
    }
}

#[cfg(feature = "uuid-support")]
impl From<uuid::Uuid> for Value {
    fn from(val: uuid::Uuid) -> Self {
        Value::String(val.hyphenated().to_string())
    }
}

#[cfg(feature = "decimal-support")]
impl From<rust_decimal::Decimal> for Value {
    fn from(val: rust_decimal::Decimal) -> Self {
        Value::String(val.to_string())
    }
}

/// Conversion from a column value into a native field type.
///
/// `NULL` converts only into `Option<T>` (and into a JSON null). Integers
/// widen freely and narrow only when the value fits; text is parsed into
/// numbers, booleans and JSON.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// `v` as an i64 when it is whole and inside the i64 range
fn whole_float(v: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63

    if v.fract() == 0.0 && (-LIMIT..LIMIT).contains(&v) {
        Some(v as i64)
    } else {
        None
    }
}

macro_rules! int_from_value {
    ($($ty:ty),* $(,)?) => {$(
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self> {
                let wide: Option<i64> = match &value {
                    Value::I32(v) => Some((*v).into()),
                    Value::I64(v) => Some(*v),
                    Value::F32(v) => whole_float(f64::from(*v)),
                    Value::F64(v) => whole_float(*v),
                    Value::String(s) => s.trim().parse::<i64>().ok(),
                    _ => None,
                };
                wide.and_then(|w| <$ty>::try_from(w).ok())
                    .ok_or_else(|| Error::conversion(stringify!($ty), value.describe()))
            }
        }
    )*};
}

int_from_value!(i16, i32, i64, u32, u64);

macro_rules! float_from_value {
    ($($ty:ty),* $(,)?) => {$(
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self> {
                let parsed: Option<$ty> = match &value {
                    Value::F32(v) => Some(*v as $ty),
                    Value::F64(v) => Some(*v as $ty),
                    Value::I32(v) => Some(*v as $ty),
                    Value::I64(v) => Some(*v as $ty),
                    Value::String(s) => s.trim().parse::<$ty>().ok(),
                    _ => None,
                };
                parsed.ok_or_else(|| Error::conversion(stringify!($ty), value.describe()))
            }
        }
    )*};
}

float_from_value!(f32, f64);

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        let parsed = match &value {
            Value::Bool(b) => Some(*b),
            Value::I32(0) | Value::I64(0) => Some(false),
            Value::I32(1) | Value::I64(1) => Some(true),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "t" | "true" => Some(true),
                "0" | "f" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        };
        parsed.ok_or_else(|| Error::conversion("bool", value.describe()))
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            Value::Bool(b) => Ok(b.to_string()),
            Value::I32(v) => Ok(v.to_string()),
            Value::I64(v) => Ok(v.to_string()),
            Value::F32(v) => Ok(v.to_string()),
            Value::F64(v) => Ok(v.to_string()),
            Value::Json(j) => Ok(j.to_string()),
            Value::Bytes(b) => {
                String::from_utf8(b).map_err(|_| Error::conversion("String", "non UTF-8 BYTEA"))
            }
            Value::Null => Err(Error::conversion("String", "NULL")),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::String(s) => Ok(s.into_bytes()),
            other => Err(Error::conversion("Vec<u8>", other.describe())),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Json(j) => Ok(j),
            Value::Null => Ok(serde_json::Value::Null),
            Value::String(s) => Ok(serde_json::from_str(&s)?),
            Value::Bytes(b) => Ok(serde_json::from_slice(&b)?),
            Value::Bool(b) => Ok(serde_json::Value::Bool(b)),
            Value::I32(v) => Ok(v.into()),
            Value::I64(v) => Ok(v.into()),
            Value::F32(v) => Ok(serde_json::Value::from(f64::from(v))),
            Value::F64(v) => Ok(serde_json::Value::from(v)),
        }
    }
}

#[cfg(feature = "datetime-support")]
mod datetime {
    use super::*;
    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

    fn parse_naive(s: &str) -> Option<NaiveDateTime> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_utc());
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    }

    impl FromValue for NaiveDateTime {
        fn from_value(value: Value) -> Result<Self> {
            match &value {
                Value::String(s) => parse_naive(s.trim()),
                _ => None,
            }
            .ok_or_else(|| Error::conversion("NaiveDateTime", value.describe()))
        }
    }

    impl FromValue for DateTime<Utc> {
        fn from_value(value: Value) -> Result<Self> {
            match &value {
                Value::String(s) => parse_naive(s.trim()).map(|naive| naive.and_utc()),
                _ => None,
            }
            .ok_or_else(|| Error::conversion("DateTime<Utc>", value.describe()))
        }
    }

    impl FromValue for NaiveDate {
        fn from_value(value: Value) -> Result<Self> {
            match &value {
                Value::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .ok()
                    .or_else(|| parse_naive(s.trim()).map(|naive| naive.date())),
                _ => None,
            }
            .ok_or_else(|| Error::conversion("NaiveDate", value.describe()))
        }
    }
}

#[cfg(feature = "uuid-support")]
impl FromValue for uuid::Uuid {
    fn from_value(value: Value) -> Result<Self> {
        match &value {
            Value::String(s) => uuid::Uuid::parse_str(s.trim()).ok(),
            Value::Bytes(b) => uuid::Uuid::from_slice(b).ok(),
            _ => None,
        }
        .ok_or_else(|| Error::conversion("Uuid", value.describe()))
    }
}

#[cfg(feature = "decimal-support")]
impl FromValue for rust_decimal::Decimal {
    fn from_value(value: Value) -> Result<Self> {
        use std::str::FromStr;

        match &value {
            Value::String(s) => rust_decimal::Decimal::from_str(s.trim()).ok(),
            Value::I32(v) => Some((*v).into()),
            Value::I64(v) => Some((*v).into()),
            Value::F64(v) => rust_decimal::Decimal::try_from(*v).ok(),
            Value::F32(v) => rust_decimal::Decimal::try_from(*v).ok(),
            _ => None,
        }
        .ok_or_else(|| Error::conversion("Decimal", value.describe()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_creation() {
        assert_eq!(Value::from(42i32), Value::I32(42));
        assert_eq!(Value::from(7i16), Value::I32(7));
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from("hello"), Value::String("hello".to_string()));
        assert_eq!(Value::from(()), Value::Null);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(Some(42i32)), Value::I32(42));
        assert_eq!(Value::from(None::<i32>), Value::Null);
    }

    #[test]
    fn test_is_null() {
        assert!(Value::Null.is_null());
        assert!(!Value::I32(42).is_null());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::I32(42).type_name(), "INTEGER");
        assert_eq!(Value::String("test".to_string()).type_name(), "TEXT");
        assert_eq!(Value::Bool(true).type_name(), "BOOLEAN");
        assert_eq!(Value::Null.type_name(), "NULL");
    }

    #[test]
    fn test_integer_widening_and_narrowing() {
        assert_eq!(i64::from_value(Value::I32(5)).unwrap(), 5);
        assert_eq!(i32::from_value(Value::I64(5)).unwrap(), 5);
        assert_eq!(i32::from_value(Value::String(" 12 ".into())).unwrap(), 12);

        let err = i32::from_value(Value::I64(i64::MAX)).unwrap_err();
        assert!(matches!(err, Error::Conversion { expected: "i32", .. }));

        let err = u32::from_value(Value::I32(-1)).unwrap_err();
        assert!(matches!(err, Error::Conversion { expected: "u32", .. }));
    }

    #[test]
    fn test_integer_rejects_fractions_and_text() {
        assert!(i64::from_value(Value::F64(2.0)).is_ok());
        assert!(i64::from_value(Value::F64(2.5)).is_err());

        let err = i32::from_value(Value::String("old".into())).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert TEXT 'old' into i32");
    }

    #[test]
    fn test_integer_rejects_out_of_range_floats() {
        assert!(i64::from_value(Value::F64(1e30)).is_err());
        assert!(i64::from_value(Value::F64(-1e30)).is_err());
        assert!(i64::from_value(Value::F32(1e20)).is_err());
        assert!(i64::from_value(Value::F64(f64::INFINITY)).is_err());
        assert!(i64::from_value(Value::F64(f64::NAN)).is_err());
        assert!(i32::from_value(Value::F64(3e9)).is_err());

        assert_eq!(i64::from_value(Value::F64(-9_223_372_036_854_775_808.0)).unwrap(), i64::MIN);
        assert_eq!(i64::from_value(Value::F64(4096.0)).unwrap(), 4096);
    }

    #[test]
    fn test_null_only_into_option() {
        assert_eq!(Option::<i32>::from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i32>::from_value(Value::I32(3)).unwrap(), Some(3));
        assert!(i32::from_value(Value::Null).is_err());
        assert!(String::from_value(Value::Null).is_err());
    }

    #[test]
    fn test_float_conversion() {
        assert_eq!(f64::from_value(Value::I32(3)).unwrap(), 3.0);
        assert_eq!(f64::from_value(Value::F32(1.5)).unwrap(), 1.5);
        assert_eq!(f32::from_value(Value::String("99.5".into())).unwrap(), 99.5);
        assert!(f64::from_value(Value::Bool(true)).is_err());
    }

    #[test]
    fn test_bool_conversion() {
        assert!(bool::from_value(Value::I64(1)).unwrap());
        assert!(!bool::from_value(Value::I32(0)).unwrap());
        assert!(bool::from_value(Value::String("TRUE".into())).unwrap());
        assert!(bool::from_value(Value::I32(2)).is_err());
    }

    #[test]
    fn test_string_conversion() {
        assert_eq!(String::from_value(Value::I64(10)).unwrap(), "10");
        assert_eq!(String::from_value(Value::Bytes(b"abc".to_vec())).unwrap(), "abc");
        assert!(String::from_value(Value::Bytes(vec![0xff, 0xfe])).is_err());
    }

    #[test]
    fn test_bytes_conversion() {
        assert_eq!(Vec::<u8>::from_value(Value::String("hi".into())).unwrap(), b"hi");
        assert!(Vec::<u8>::from_value(Value::I32(1)).is_err());
    }

    #[test]
    fn test_json_conversion() {
        let parsed = serde_json::Value::from_value(Value::String(r#"{"a":1}"#.into())).unwrap();
        assert_eq!(parsed, serde_json::json!({"a": 1}));

        let err = serde_json::Value::from_value(Value::String("{oops".into())).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[cfg(feature = "datetime-support")]
    #[test]
    fn test_datetime_conversion() {
        use chrono::{Datelike, NaiveDateTime, Timelike};

        let dt = NaiveDateTime::from_value(Value::String("2024-03-01 10:20:30".into())).unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 3, 1));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (10, 20, 30));

        let dt = NaiveDateTime::from_value(Value::String("2024-03-01T10:20:30Z".into())).unwrap();
        assert_eq!(dt.hour(), 10);
    }

    #[cfg(feature = "uuid-support")]
    #[test]
    fn test_uuid_conversion() {
        let id = uuid::Uuid::new_v4();
        assert_eq!(uuid::Uuid::from_value(Value::from(id)).unwrap(), id);
    }

    #[cfg(feature = "decimal-support")]
    #[test]
    fn test_decimal_conversion() {
        let price = rust_decimal::Decimal::from_value(Value::String("19.99".into())).unwrap();
        assert_eq!(price.to_string(), "19.99");
    }
}
