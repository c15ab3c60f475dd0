//! Type coercion between stored values and primitive types
//!
//! Two families of functions live here:
//! - `to_*` never fail. Absent values and values that cannot be converted
//!   yield the zero value of the target type. These back the read-time getters.
//! - `try_*` report a [`CoerceError`] instead. These back option registration,
//!   where a mistyped default or file value should stop the program.
//!
//! Integer widths convert by truncation, the same as an `as` cast.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::value::{duration, parse_duration, DurationError, Value, ValueKind};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoerceError {
    #[error("cannot use a {from} value as {to}")]
    Incompatible { from: ValueKind, to: &'static str },
    #[error("cannot parse {input:?} as {to}")]
    Parse { input: String, to: &'static str },
    #[error("{value} is negative and cannot be used as {to}")]
    Negative { value: String, to: &'static str },
    #[error(transparent)]
    Duration(#[from] DurationError),
}

fn incompatible(value: &Value, to: &'static str) -> CoerceError {
    CoerceError::Incompatible { from: value.kind(), to }
}

/// Parse a boolean token: `true`, `false`, `t`, `f`, `1` or `0`, any case.
pub fn parse_bool(input: &str) -> Option<bool> {
    const TRUE: [&str; 3] = ["1", "t", "true"];
    const FALSE: [&str; 3] = ["0", "f", "false"];

    if TRUE.iter().any(|t| input.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if FALSE.iter().any(|t| input.eq_ignore_ascii_case(t)) {
        Some(false)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Strict conversions
// ---------------------------------------------------------------------------

/// Any leaf renders as a string.
pub fn try_string(value: &Value) -> Result<String, CoerceError> {
    match value {
        Value::Map(_) => Err(incompatible(value, "string")),
        other => Ok(other.to_string()),
    }
}

pub fn try_i64(value: &Value) -> Result<i64, CoerceError> {
    match value {
        Value::Int(n) => Ok(*n),
        Value::Uint(n) => Ok(*n as i64),
        Value::Float(x) => Ok(*x as i64),
        Value::String(s) => {
            s.parse().map_err(|_| CoerceError::Parse { input: s.clone(), to: "int" })
        }
        Value::Bool(_) | Value::Duration(_) | Value::List(_) | Value::Map(_) => {
            Err(incompatible(value, "int"))
        }
    }
}

pub fn try_u64(value: &Value) -> Result<u64, CoerceError> {
    match value {
        Value::Uint(n) => Ok(*n),
        Value::Int(n) if *n < 0 => {
            Err(CoerceError::Negative { value: n.to_string(), to: "uint" })
        }
        Value::Int(n) => Ok(*n as u64),
        Value::Float(x) if *x < 0.0 => {
            Err(CoerceError::Negative { value: x.to_string(), to: "uint" })
        }
        Value::Float(x) => Ok(*x as u64),
        Value::String(s) => match s.parse::<u64>() {
            Ok(n) => Ok(n),
            Err(_) if s.parse::<i64>().is_ok() => {
                Err(CoerceError::Negative { value: s.clone(), to: "uint" })
            }
            Err(_) => Err(CoerceError::Parse { input: s.clone(), to: "uint" }),
        },
        Value::Bool(_) | Value::Duration(_) | Value::List(_) | Value::Map(_) => {
            Err(incompatible(value, "uint"))
        }
    }
}

pub fn try_f64(value: &Value) -> Result<f64, CoerceError> {
    match value {
        Value::Float(x) => Ok(*x),
        Value::Int(n) => Ok(*n as f64),
        Value::Uint(n) => Ok(*n as f64),
        Value::String(s) => {
            s.parse().map_err(|_| CoerceError::Parse { input: s.clone(), to: "float" })
        }
        Value::Bool(_) | Value::Duration(_) | Value::List(_) | Value::Map(_) => {
            Err(incompatible(value, "float"))
        }
    }
}

pub fn try_bool(value: &Value) -> Result<bool, CoerceError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) => {
            parse_bool(s).ok_or_else(|| CoerceError::Parse { input: s.clone(), to: "bool" })
        }
        _ => Err(incompatible(value, "bool")),
    }
}

/// Numbers are read as nanoseconds.
pub fn try_duration(value: &Value) -> Result<Duration, CoerceError> {
    match value {
        Value::Duration(d) => Ok(*d),
        Value::String(s) => Ok(parse_duration(s)?),
        Value::Int(n) if *n < 0 => {
            Err(CoerceError::Negative { value: n.to_string(), to: "duration" })
        }
        Value::Int(n) => Ok(Duration::from_nanos(*n as u64)),
        Value::Uint(n) => Ok(Duration::from_nanos(*n)),
        Value::Float(x) if *x < 0.0 => {
            Err(CoerceError::Negative { value: x.to_string(), to: "duration" })
        }
        Value::Float(x) => duration::from_nanos(*x as u128)
            .ok_or_else(|| CoerceError::Parse { input: x.to_string(), to: "duration" }),
        Value::Bool(_) | Value::List(_) | Value::Map(_) => Err(incompatible(value, "duration")),
    }
}

// ---------------------------------------------------------------------------
// Lenient conversions
// ---------------------------------------------------------------------------

pub fn to_string(value: Option<&Value>) -> String {
    value.map(Value::to_string).unwrap_or_default()
}

/// Strings parse at the target width, so `"300"` does not fit an `i8` and
/// yields zero, while a stored `300` truncates.
fn signed<T>(value: Option<&Value>, truncate: fn(i64) -> T) -> T
where
    T: FromStr + Default,
{
    match value {
        None => T::default(),
        Some(Value::String(s)) => s.parse().unwrap_or_default(),
        Some(other) => try_i64(other).map(truncate).unwrap_or_default(),
    }
}

fn unsigned<T>(value: Option<&Value>, truncate: fn(u64) -> T) -> T
where
    T: FromStr + Default,
{
    match value {
        None => T::default(),
        Some(Value::String(s)) => s.parse().unwrap_or_default(),
        Some(other) => try_u64(other).map(truncate).unwrap_or_default(),
    }
}

pub fn to_i8(value: Option<&Value>) -> i8 {
    signed(value, |n| n as i8)
}

pub fn to_i16(value: Option<&Value>) -> i16 {
    signed(value, |n| n as i16)
}

pub fn to_i32(value: Option<&Value>) -> i32 {
    signed(value, |n| n as i32)
}

pub fn to_i64(value: Option<&Value>) -> i64 {
    signed(value, |n| n)
}

pub fn to_isize(value: Option<&Value>) -> isize {
    signed(value, |n| n as isize)
}

pub fn to_u8(value: Option<&Value>) -> u8 {
    unsigned(value, |n| n as u8)
}

pub fn to_u16(value: Option<&Value>) -> u16 {
    unsigned(value, |n| n as u16)
}

pub fn to_u32(value: Option<&Value>) -> u32 {
    unsigned(value, |n| n as u32)
}

pub fn to_u64(value: Option<&Value>) -> u64 {
    unsigned(value, |n| n)
}

pub fn to_usize(value: Option<&Value>) -> usize {
    unsigned(value, |n| n as usize)
}

pub fn to_f64(value: Option<&Value>) -> f64 {
    value.and_then(|v| try_f64(v).ok()).unwrap_or_default()
}

pub fn to_bool(value: Option<&Value>) -> bool {
    value.and_then(|v| try_bool(v).ok()).unwrap_or_default()
}

pub fn to_duration(value: Option<&Value>) -> Duration {
    value.and_then(|v| try_duration(v).ok()).unwrap_or_default()
}

/// Lists map element-wise, a comma-separated string is split and trimmed,
/// any other string becomes a single element.
pub fn to_string_slice(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::List(items)) => items.iter().map(Value::to_string).collect(),
        Some(Value::String(s)) if s.contains(',') => {
            s.split(',').map(|part| part.trim().to_string()).collect()
        }
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Only interior nodes convert; their immediate leaf children are rendered
/// as strings and nested interior children are skipped.
pub fn to_string_map(value: Option<&Value>) -> BTreeMap<String, String> {
    let Some(Value::Map(map)) = value else {
        return BTreeMap::new();
    };
    map.iter()
        .filter(|(_, child)| !child.is_map())
        .map(|(key, child)| (key.clone(), child.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_values_yield_zero() {
        assert_eq!(to_string(None), "");
        assert_eq!(to_i32(None), 0);
        assert_eq!(to_u64(None), 0);
        assert!(!to_bool(None));
        assert_eq!(to_f64(None), 0.0);
        assert_eq!(to_duration(None), Duration::ZERO);
        assert!(to_string_slice(None).is_empty());
        assert!(to_string_map(None).is_empty());
    }

    #[test]
    fn test_integer_widths_truncate() {
        let big = Value::Int(300);
        assert_eq!(to_i8(Some(&big)), 300i64 as i8);
        assert_eq!(to_u8(Some(&big)), 44);
        assert_eq!(to_i64(Some(&Value::Uint(7))), 7);
        assert_eq!(to_i32(Some(&Value::Float(9.9))), 9);
    }

    #[test]
    fn test_strings_parse_at_target_width() {
        assert_eq!(to_i64(Some(&Value::from("123"))), 123);
        assert_eq!(to_i8(Some(&Value::from("300"))), 0);
        assert_eq!(to_u16(Some(&Value::from("456"))), 456);
        assert_eq!(to_i32(Some(&Value::from("twelve"))), 0);
    }

    #[test]
    fn test_negative_to_unsigned_is_zero_when_lenient() {
        assert_eq!(to_u64(Some(&Value::Int(-10))), 0);
        assert_eq!(to_usize(Some(&Value::Float(-1.5))), 0);
        assert_eq!(to_u32(Some(&Value::from("-4"))), 0);
    }

    #[test]
    fn test_negative_to_unsigned_is_error_when_strict() {
        assert_eq!(
            try_u64(&Value::Int(-5)),
            Err(CoerceError::Negative { value: "-5".to_string(), to: "uint" })
        );
        assert!(matches!(try_u64(&Value::from("-5")), Err(CoerceError::Negative { .. })));
        assert!(matches!(try_u64(&Value::from("five")), Err(CoerceError::Parse { .. })));
    }

    #[test]
    fn test_bool_tokens() {
        for token in ["true", "TRUE", "True", "t", "T", "1"] {
            assert_eq!(parse_bool(token), Some(true), "{token}");
        }
        for token in ["false", "FALSE", "f", "F", "0"] {
            assert_eq!(parse_bool(token), Some(false), "{token}");
        }
        assert_eq!(parse_bool("yes"), None);
        assert!(!to_bool(Some(&Value::from("yes"))));
        assert!(try_bool(&Value::Int(1)).is_err());
    }

    #[test]
    fn test_float_from_numbers_and_strings() {
        assert_eq!(to_f64(Some(&Value::Int(123))), 123.0);
        assert_eq!(to_f64(Some(&Value::Uint(2))), 2.0);
        assert_eq!(to_f64(Some(&Value::from("2.5"))), 2.5);
        assert_eq!(to_f64(Some(&Value::Bool(true))), 0.0);
    }

    #[test]
    fn test_duration_sources() {
        assert_eq!(to_duration(Some(&Value::from("1m30s"))), Duration::from_secs(90));
        assert_eq!(to_duration(Some(&Value::Int(1_000))), Duration::from_nanos(1_000));
        assert_eq!(to_duration(Some(&Value::from("soon"))), Duration::ZERO);
        assert!(try_duration(&Value::Int(-1)).is_err());
        assert!(matches!(try_duration(&Value::from("3d")), Err(CoerceError::Duration(_))));
    }

    #[test]
    fn test_string_slice_coercion() {
        let csv = Value::from("three, four");
        assert_eq!(to_string_slice(Some(&csv)), vec!["three", "four"]);
        assert_eq!(to_string_slice(Some(&Value::from("solo"))), vec!["solo"]);
        let list = Value::list([Value::from("a"), Value::Int(2), Value::Bool(true)]);
        assert_eq!(to_string_slice(Some(&list)), vec!["a", "2", "true"]);
        assert!(to_string_slice(Some(&Value::Int(5))).is_empty());
    }

    #[test]
    fn test_string_map_coercion() {
        let value = Value::map([
            ("host", Value::from("db.host.com")),
            ("port", Value::Int(5432)),
            ("enabled", Value::Bool(true)),
            ("pool", Value::map([("size", 4)])),
        ]);
        let map = to_string_map(Some(&value));
        assert_eq!(map.len(), 3);
        assert_eq!(map["host"], "db.host.com");
        assert_eq!(map["port"], "5432");
        assert_eq!(map["enabled"], "true");
        assert!(to_string_map(Some(&Value::from("flat"))).is_empty());
    }

    #[test]
    fn test_try_string_rejects_interior_nodes() {
        assert_eq!(try_string(&Value::list([1, 2])).unwrap(), "[1, 2]");
        assert!(try_string(&Value::map([("a", 1)])).is_err());
    }
}
