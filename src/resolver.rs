//! Precedence resolver
//!
//! A [`Config`] holds three stores: defaults registered in code, values from
//! a config file, and the resolved result. Resolution merges them with
//! `command line > file > defaults` and unlocks the typed getters.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::coerce::CoerceError;
use crate::config::loader;
use crate::error::{ConfigError, Result};
use crate::flags::{ClapOptionParser, OptionKind, OptionParser, OptionSpec};
use crate::store::Store;
use crate::value::{Value, ValueKind};

/// An option defined by name, with its own type and usage text.
#[derive(Debug, Clone)]
struct DefinedOption {
    kind: OptionKind,
    usage: String,
}

pub struct Config {
    defaults: Store,
    file: Store,
    resolved: Store,
    /// Types recorded for every default leaf, so a file value of another
    /// shape cannot change the option type.
    declared: BTreeMap<String, ValueKind>,
    defined: BTreeMap<String, DefinedOption>,
    parsed: bool,
    parser: Box<dyn OptionParser + Send>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self::with_parser(ClapOptionParser::new())
    }

    /// Use a different command-line parser.
    pub fn with_parser(parser: impl OptionParser + Send + 'static) -> Self {
        Self {
            defaults: Store::new(),
            file: Store::new(),
            resolved: Store::new(),
            declared: BTreeMap::new(),
            defined: BTreeMap::new(),
            parsed: false,
            parser: Box::new(parser),
        }
    }

    pub fn set_parser(&mut self, parser: impl OptionParser + Send + 'static) {
        self.parser = Box::new(parser);
    }

    /// Register a default. Defaults have the lowest precedence.
    ///
    /// The type of `value` becomes the declared type of the key (of every
    /// leaf, for a map), which later decides the type of its command-line
    /// option.
    pub fn set_default(&mut self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        if self.parsed {
            warn!("Default for '{}' set after resolution; it applies from the next parse", key);
        }
        forget_kinds(key, &mut self.declared);
        declare_kinds(key, &value, &mut self.declared);
        self.defaults.set(key, value);
    }

    /// Load the config file at `path`. A missing file is not an error.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.file = loader::load_file(path.as_ref())?;
        Ok(())
    }

    /// Define a named option before resolution.
    ///
    /// The option's default comes from the config file if it sets `name`,
    /// then from registered defaults, and only then from `default`, which is
    /// recorded as a default in that case. Returns the effective default.
    pub fn define(&mut self, name: &str, default: impl Into<Value>, usage: &str) -> Result<Value> {
        let default = default.into();
        let kind = OptionKind::for_value_kind(default.kind());

        let current = self.file.get(name).or_else(|| self.defaults.get(name)).cloned();
        let effective = match current {
            Some(value) => value,
            None => {
                self.set_default(name, default.clone());
                default
            }
        };

        let value = kind.coerce(&effective).map_err(|e| ConfigError::Registration {
            errors: vec![registration_error(name, kind, &e)],
        })?;
        self.defined.insert(name.to_string(), DefinedOption { kind, usage: usage.to_string() });
        Ok(value)
    }

    /// Options that resolution would register for the current defaults and
    /// file. Fails with every value that does not fit its option type.
    pub fn option_specs(&self) -> Result<Vec<OptionSpec>> {
        let mut merged = self.defaults.clone();
        merged.merge(&self.file);
        self.specs_for(&merged)
    }

    fn specs_for(&self, merged: &Store) -> Result<Vec<OptionSpec>> {
        let mut specs = Vec::new();
        let mut errors = Vec::new();

        for (key, value) in merged.leaves() {
            let (kind, usage) = match self.defined.get(&key) {
                Some(defined) => (defined.kind, defined.usage.clone()),
                None => {
                    let kind = self.declared.get(&key).copied().unwrap_or_else(|| value.kind());
                    (OptionKind::for_value_kind(kind), OptionSpec::default_usage(&key))
                }
            };
            match kind.coerce(value) {
                Ok(default) => specs.push(OptionSpec { name: key, kind, usage, default }),
                Err(e) => errors.push(registration_error(&key, kind, &e)),
            }
        }

        if !errors.is_empty() {
            return Err(ConfigError::Registration { errors });
        }
        debug!("Registered {} command-line options", specs.len());
        Ok(specs)
    }

    /// Resolve against the process arguments, exiting on failure.
    pub fn parse(&mut self) {
        self.parse_from(std::env::args_os());
    }

    /// Resolve against `args`, exiting on failure. `args` starts with the
    /// program name.
    ///
    /// Command-line errors (including `--help`) exit through clap; values
    /// that do not fit their option type are printed and exit with status 2.
    pub fn parse_from<I, T>(&mut self, args: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        if let Err(err) = self.try_parse_from(args) {
            match err {
                ConfigError::Cli(e) => e.exit(),
                other => {
                    eprintln!("{}", other);
                    std::process::exit(2);
                }
            }
        }
    }

    /// Resolve against the process arguments, returning any failure.
    pub fn try_parse(&mut self) -> Result<()> {
        self.try_parse_from(std::env::args_os())
    }

    /// Resolve against `args`, returning any failure. On failure the
    /// previous resolution state is kept.
    pub fn try_parse_from<I, T>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        if self.parsed {
            debug!("Re-resolving configuration");
        }

        let mut merged = self.defaults.clone();
        merged.merge(&self.file);

        let specs = self.specs_for(&merged)?;
        for (key, value) in self.parser.parse(&specs, &args)? {
            debug!("Command line overrides '{}' with {}", key, value);
            merged.set(&key, value);
        }

        self.resolved = merged;
        self.parsed = true;
        Ok(())
    }

    /// Whether a resolution has completed.
    pub fn parsed(&self) -> bool {
        self.parsed
    }

    /// The resolved store.
    pub fn store(&self) -> Result<&Store> {
        if !self.parsed {
            return Err(ConfigError::NotParsed);
        }
        Ok(&self.resolved)
    }

    pub fn get(&self, key: &str) -> Result<Option<&Value>> {
        Ok(self.store()?.get(key))
    }

    pub fn get_string(&self, key: &str) -> Result<String> {
        Ok(self.store()?.get_string(key))
    }

    pub fn get_i8(&self, key: &str) -> Result<i8> {
        Ok(self.store()?.get_i8(key))
    }

    pub fn get_i16(&self, key: &str) -> Result<i16> {
        Ok(self.store()?.get_i16(key))
    }

    pub fn get_i32(&self, key: &str) -> Result<i32> {
        Ok(self.store()?.get_i32(key))
    }

    pub fn get_i64(&self, key: &str) -> Result<i64> {
        Ok(self.store()?.get_i64(key))
    }

    pub fn get_isize(&self, key: &str) -> Result<isize> {
        Ok(self.store()?.get_isize(key))
    }

    pub fn get_u8(&self, key: &str) -> Result<u8> {
        Ok(self.store()?.get_u8(key))
    }

    pub fn get_u16(&self, key: &str) -> Result<u16> {
        Ok(self.store()?.get_u16(key))
    }

    pub fn get_u32(&self, key: &str) -> Result<u32> {
        Ok(self.store()?.get_u32(key))
    }

    pub fn get_u64(&self, key: &str) -> Result<u64> {
        Ok(self.store()?.get_u64(key))
    }

    pub fn get_usize(&self, key: &str) -> Result<usize> {
        Ok(self.store()?.get_usize(key))
    }

    pub fn get_f64(&self, key: &str) -> Result<f64> {
        Ok(self.store()?.get_f64(key))
    }

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        Ok(self.store()?.get_bool(key))
    }

    pub fn get_duration(&self, key: &str) -> Result<Duration> {
        Ok(self.store()?.get_duration(key))
    }

    pub fn get_string_slice(&self, key: &str) -> Result<Vec<String>> {
        Ok(self.store()?.get_string_slice(key))
    }

    pub fn get_string_map(&self, key: &str) -> Result<BTreeMap<String, String>> {
        Ok(self.store()?.get_string_map(key))
    }

    pub fn is_set(&self, key: &str) -> Result<bool> {
        Ok(self.store()?.is_set(key))
    }

    pub fn all_keys(&self) -> Result<Vec<String>> {
        Ok(self.store()?.all_keys())
    }

    /// Print every resolved key, its value and its type to stdout.
    pub fn debug(&self) -> Result<()> {
        let stdout = io::stdout();
        self.write_debug(&mut stdout.lock())
    }

    pub fn write_debug<W: Write>(&self, out: &mut W) -> Result<()> {
        self.store()?.write_debug(out)?;
        Ok(())
    }

    /// Deserialize the resolved configuration into `T`.
    pub fn unmarshal<T: DeserializeOwned>(&self) -> Result<T> {
        let tree = serde_json::Value::from(&Value::Map(self.store()?.as_map().clone()));
        Ok(serde_json::from_value(tree)?)
    }
}

/// Drop kinds that a new default at `key` replaces: everything below it, and
/// any ancestor leaf that now becomes an interior node.
fn forget_kinds(key: &str, declared: &mut BTreeMap<String, ValueKind>) {
    let prefix = format!("{}.", key);
    declared.retain(|path, _| {
        path != key && !path.starts_with(&prefix) && !key.starts_with(&format!("{}.", path))
    });
}

fn declare_kinds(key: &str, value: &Value, declared: &mut BTreeMap<String, ValueKind>) {
    match value {
        Value::Map(children) => {
            for (child_key, child) in children {
                declare_kinds(&format!("{}.{}", key, child_key), child, declared);
            }
        }
        leaf => {
            declared.insert(key.to_string(), leaf.kind());
        }
    }
}

fn registration_error(key: &str, kind: OptionKind, err: &CoerceError) -> String {
    format!("invalid value for {} flag {:?}: {}", kind, key, err)
}
