//! Command-line option binding
//!
//! Every resolved configuration key is exposed as a long option named after
//! its dotted path. The option parser itself is a collaborator behind the
//! [`OptionParser`] trait; [`ClapOptionParser`] is the default.

use std::ffi::OsString;
use std::fmt;

use crate::coerce::{self, CoerceError};
use crate::error::Result;
use crate::value::{Value, ValueKind};

pub mod clap_parser;

pub use clap_parser::ClapOptionParser;

/// Type of a command-line option. Lists and maps have no option type of
/// their own and are bound as strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Bool,
    Int,
    Uint,
    Float,
    Duration,
}

impl OptionKind {
    pub fn for_value_kind(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Bool => OptionKind::Bool,
            ValueKind::Int => OptionKind::Int,
            ValueKind::Uint => OptionKind::Uint,
            ValueKind::Float => OptionKind::Float,
            ValueKind::Duration => OptionKind::Duration,
            ValueKind::String | ValueKind::List | ValueKind::Map => OptionKind::String,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OptionKind::String => "string",
            OptionKind::Bool => "bool",
            OptionKind::Int => "int",
            OptionKind::Uint => "uint",
            OptionKind::Float => "float",
            OptionKind::Duration => "duration",
        }
    }

    /// Strictly convert a stored value to this option's type.
    pub fn coerce(self, value: &Value) -> std::result::Result<Value, CoerceError> {
        Ok(match self {
            OptionKind::String => Value::String(option_text(value)?),
            OptionKind::Bool => Value::Bool(coerce::try_bool(value)?),
            OptionKind::Int => Value::Int(coerce::try_i64(value)?),
            OptionKind::Uint => Value::Uint(coerce::try_u64(value)?),
            OptionKind::Float => Value::Float(coerce::try_f64(value)?),
            OptionKind::Duration => Value::Duration(coerce::try_duration(value)?),
        })
    }

    /// Parse command-line text for this option.
    pub fn parse(self, raw: &str) -> std::result::Result<Value, CoerceError> {
        self.coerce(&Value::String(raw.to_string()))
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lists are joined with commas so the text splits back into the same list.
fn option_text(value: &Value) -> std::result::Result<String, CoerceError> {
    match value {
        Value::List(items) => Ok(items.iter().map(Value::to_string).collect::<Vec<_>>().join(",")),
        other => coerce::try_string(other),
    }
}

/// Registration record for one option.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSpec {
    pub name: String,
    pub kind: OptionKind,
    pub usage: String,
    pub default: Value,
}

impl OptionSpec {
    /// Usage text for keys that were not defined explicitly.
    pub fn default_usage(key: &str) -> String {
        format!("override configuration for '{}'", key)
    }

    /// The default as it appears on the command line.
    pub fn default_text(&self) -> String {
        match &self.default {
            Value::List(_) => option_text(&self.default).unwrap_or_default(),
            other => other.to_string(),
        }
    }
}

/// Consumes command-line arguments against a set of options.
///
/// `args` includes the program name as its first element. Only options that
/// were given explicitly are returned; options left at their default are not.
pub trait OptionParser {
    fn parse(&self, specs: &[OptionSpec], args: &[OsString]) -> Result<Vec<(String, Value)>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_kind_for_value_kind() {
        assert_eq!(OptionKind::for_value_kind(ValueKind::Uint), OptionKind::Uint);
        assert_eq!(OptionKind::for_value_kind(ValueKind::List), OptionKind::String);
        assert_eq!(OptionKind::for_value_kind(ValueKind::Map), OptionKind::String);
    }

    #[test]
    fn test_coerce_to_option_kind() {
        assert_eq!(OptionKind::Int.coerce(&Value::from("42")).unwrap(), Value::Int(42));
        assert_eq!(OptionKind::Uint.coerce(&Value::Int(10)).unwrap(), Value::Uint(10));
        assert!(OptionKind::Uint.coerce(&Value::Int(-5)).is_err());
        assert_eq!(
            OptionKind::Duration.parse("1m").unwrap(),
            Value::Duration(Duration::from_secs(60))
        );
        assert_eq!(OptionKind::String.coerce(&Value::Int(7)).unwrap(), Value::from("7"));
        assert!(OptionKind::Bool.parse("maybe").is_err());
    }

    #[test]
    fn test_list_default_round_trips_through_text() {
        let spec = OptionSpec {
            name: "features".to_string(),
            kind: OptionKind::String,
            usage: OptionSpec::default_usage("features"),
            default: Value::list(["dark_mode", "beta_testing"]),
        };
        assert_eq!(spec.default_text(), "dark_mode,beta_testing");
        assert_eq!(spec.usage, "override configuration for 'features'");
        assert_eq!(
            coerce::to_string_slice(Some(&Value::String(spec.default_text()))),
            vec!["dark_mode", "beta_testing"]
        );
    }
}
