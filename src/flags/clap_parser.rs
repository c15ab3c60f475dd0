//! `clap`-backed option parser

use std::ffi::OsString;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, Command};

use super::{OptionKind, OptionParser, OptionSpec};
use crate::error::Result;
use crate::value::Value;

/// Builds a fresh `clap::Command` for every parse, so each resolution works
/// against its own option set.
#[derive(Debug, Clone, Default)]
pub struct ClapOptionParser {
    name: Option<String>,
    about: Option<String>,
}

impl ClapOptionParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Program name shown in usage output.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Description shown at the top of `--help`.
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    /// The command that `parse` runs, one long option per spec.
    pub fn command(&self, specs: &[OptionSpec]) -> Command {
        let mut command = Command::new(self.name.clone().unwrap_or_else(|| "flagstack".to_string()));
        if let Some(about) = &self.about {
            command = command.about(about.clone());
        }
        for spec in specs {
            // clap owns --help.
            if spec.name == "help" {
                tracing::warn!("Configuration key 'help' cannot be overridden from the command line");
                continue;
            }
            command = command.arg(build_arg(spec));
        }
        command
    }
}

fn build_arg(spec: &OptionSpec) -> Arg {
    let kind = spec.kind;
    let mut arg = Arg::new(spec.name.clone())
        .long(spec.name.clone())
        .help(spec.usage.clone())
        .value_name(kind.as_str().to_ascii_uppercase())
        .action(ArgAction::Set)
        .value_parser(move |raw: &str| kind.parse(raw));

    let default = spec.default_text();
    if !default.is_empty() {
        arg = arg.default_value(default);
    }

    match kind {
        OptionKind::Bool => arg.num_args(0..=1).require_equals(true).default_missing_value("true"),
        OptionKind::Int | OptionKind::Float => arg.allow_negative_numbers(true),
        OptionKind::String | OptionKind::Uint | OptionKind::Duration => arg,
    }
}

impl OptionParser for ClapOptionParser {
    fn parse(&self, specs: &[OptionSpec], args: &[OsString]) -> Result<Vec<(String, Value)>> {
        let matches = self.command(specs).try_get_matches_from(args)?;

        let provided = specs
            .iter()
            .filter(|spec| matches.value_source(&spec.name) == Some(ValueSource::CommandLine))
            .filter_map(|spec| {
                matches.get_one::<Value>(&spec.name).map(|value| (spec.name.clone(), value.clone()))
            })
            .collect();
        Ok(provided)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use std::time::Duration;

    fn spec(name: &str, kind: OptionKind, default: Value) -> OptionSpec {
        OptionSpec { name: name.to_string(), kind, usage: OptionSpec::default_usage(name), default }
    }

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    fn sample_specs() -> Vec<OptionSpec> {
        vec![
            spec("port", OptionKind::Int, Value::Int(2222)),
            spec("db.host", OptionKind::String, Value::from("config.host")),
            spec("enabled", OptionKind::Bool, Value::Bool(false)),
            spec("workers", OptionKind::Uint, Value::Uint(4)),
            spec("timeout", OptionKind::Duration, Value::Duration(Duration::from_secs(5))),
        ]
    }

    #[test]
    fn test_only_explicit_options_are_returned() {
        let parser = ClapOptionParser::new();
        let provided = parser
            .parse(&sample_specs(), &args(&["app", "--port=3333", "--db.host=flag.host"]))
            .expect("parse");
        assert_eq!(
            provided,
            vec![
                ("port".to_string(), Value::Int(3333)),
                ("db.host".to_string(), Value::from("flag.host")),
            ]
        );
    }

    #[test]
    fn test_bool_flag_forms() {
        let parser = ClapOptionParser::new();
        let provided = parser.parse(&sample_specs(), &args(&["app", "--enabled"])).expect("parse");
        assert_eq!(provided, vec![("enabled".to_string(), Value::Bool(true))]);

        let provided =
            parser.parse(&sample_specs(), &args(&["app", "--enabled=F"])).expect("parse");
        assert_eq!(provided, vec![("enabled".to_string(), Value::Bool(false))]);
    }

    #[test]
    fn test_space_separated_and_negative_values() {
        let parser = ClapOptionParser::new();
        let provided = parser
            .parse(&sample_specs(), &args(&["app", "--port", "-1", "--timeout", "1m30s"]))
            .expect("parse");
        assert_eq!(
            provided,
            vec![
                ("port".to_string(), Value::Int(-1)),
                ("timeout".to_string(), Value::Duration(Duration::from_secs(90))),
            ]
        );
    }

    #[test]
    fn test_option_at_default_value_still_counts_as_provided() {
        let parser = ClapOptionParser::new();
        let provided = parser.parse(&sample_specs(), &args(&["app", "--port=2222"])).expect("parse");
        assert_eq!(provided, vec![("port".to_string(), Value::Int(2222))]);
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        let parser = ClapOptionParser::new();
        let err = parser
            .parse(&sample_specs(), &args(&["app", "--workers=-3"]))
            .expect_err("negative uint");
        assert!(matches!(err, ConfigError::Cli(_)));

        let err = parser
            .parse(&sample_specs(), &args(&["app", "--port=many"]))
            .expect_err("not an int");
        assert!(matches!(err, ConfigError::Cli(_)));
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let parser = ClapOptionParser::new();
        let err = parser.parse(&sample_specs(), &args(&["app", "--nope=1"])).expect_err("unknown");
        assert!(matches!(err, ConfigError::Cli(_)));
    }

    #[test]
    fn test_help_lists_usage_text() {
        let parser = ClapOptionParser::new().name("demo").about("Demo application");
        let help = parser.command(&sample_specs()).render_help().to_string();
        assert!(help.contains("Demo application"));
        assert!(help.contains("--db.host"));
        assert!(help.contains("override configuration for 'db.host'"));
    }

    #[test]
    fn test_key_named_help_is_skipped() {
        let parser = ClapOptionParser::new();
        let specs = vec![spec("help", OptionKind::String, Value::from("x"))];
        let command = parser.command(&specs);
        assert_eq!(command.get_arguments().count(), 0);
        assert!(parser.parse(&specs, &args(&["app"])).expect("parse").is_empty());
    }
}
