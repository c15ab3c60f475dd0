//! Process-wide configuration
//!
//! Free functions over one shared [`Config`], for programs that only ever
//! need a single configuration. The intended sequence in `main` is:
//!
//! 1. register defaults with [`set_default`];
//! 2. load a file with [`init`] (optional);
//! 3. define named options with [`define`] (optional);
//! 4. resolve with [`parse`];
//! 5. read with the `get_*` functions.
//!
//! # Panics
//!
//! Every reader panics when called before [`parse`] has completed. This is
//! the only place where reading early panics; a [`Config`] handle returns
//! [`ConfigError::NotParsed`] instead.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;

use crate::error::{ConfigError, Result};
use crate::flags::OptionParser;
use crate::resolver::Config;
use crate::value::Value;

static GLOBAL: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::new()));

fn lock() -> MutexGuard<'static, Config> {
    GLOBAL.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Unwrap a read, panicking on a lifecycle violation. The lock is released
/// before the panic.
fn must_be_parsed<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{}", err),
    }
}

pub fn set_default(key: &str, value: impl Into<Value>) {
    lock().set_default(key, value);
}

/// Load configuration from `path`. A missing file is not an error.
pub fn init(path: impl AsRef<Path>) -> Result<()> {
    lock().load_file(path)
}

/// See [`Config::define`].
pub fn define(name: &str, default: impl Into<Value>, usage: &str) -> Result<Value> {
    lock().define(name, default, usage)
}

pub fn set_option_parser(parser: impl OptionParser + Send + 'static) {
    lock().set_parser(parser);
}

/// Resolve against the process arguments, exiting on failure.
pub fn parse() {
    parse_from(std::env::args_os());
}

pub fn parse_from<I, T>(args: I)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    // Collected first so the lock is not held while the process exits.
    let result = lock().try_parse_from(args);
    if let Err(err) = result {
        match err {
            ConfigError::Cli(e) => e.exit(),
            other => {
                eprintln!("{}", other);
                std::process::exit(2);
            }
        }
    }
}

/// Resolve against the process arguments, returning any failure to the
/// caller instead of exiting.
pub fn try_parse() -> Result<()> {
    lock().try_parse()
}

pub fn try_parse_from<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    lock().try_parse_from(args)
}

pub fn parsed() -> bool {
    lock().parsed()
}

pub fn get(key: &str) -> Option<Value> {
    let result = lock().get(key).map(|value| value.cloned());
    must_be_parsed(result)
}

pub fn get_string(key: &str) -> String {
    let result = lock().get_string(key);
    must_be_parsed(result)
}

pub fn get_i8(key: &str) -> i8 {
    let result = lock().get_i8(key);
    must_be_parsed(result)
}

pub fn get_i16(key: &str) -> i16 {
    let result = lock().get_i16(key);
    must_be_parsed(result)
}

pub fn get_i32(key: &str) -> i32 {
    let result = lock().get_i32(key);
    must_be_parsed(result)
}

pub fn get_i64(key: &str) -> i64 {
    let result = lock().get_i64(key);
    must_be_parsed(result)
}

pub fn get_isize(key: &str) -> isize {
    let result = lock().get_isize(key);
    must_be_parsed(result)
}

pub fn get_u8(key: &str) -> u8 {
    let result = lock().get_u8(key);
    must_be_parsed(result)
}

pub fn get_u16(key: &str) -> u16 {
    let result = lock().get_u16(key);
    must_be_parsed(result)
}

pub fn get_u32(key: &str) -> u32 {
    let result = lock().get_u32(key);
    must_be_parsed(result)
}

pub fn get_u64(key: &str) -> u64 {
    let result = lock().get_u64(key);
    must_be_parsed(result)
}

pub fn get_usize(key: &str) -> usize {
    let result = lock().get_usize(key);
    must_be_parsed(result)
}

pub fn get_f64(key: &str) -> f64 {
    let result = lock().get_f64(key);
    must_be_parsed(result)
}

pub fn get_bool(key: &str) -> bool {
    let result = lock().get_bool(key);
    must_be_parsed(result)
}

pub fn get_duration(key: &str) -> Duration {
    let result = lock().get_duration(key);
    must_be_parsed(result)
}

pub fn get_string_slice(key: &str) -> Vec<String> {
    let result = lock().get_string_slice(key);
    must_be_parsed(result)
}

pub fn get_string_map(key: &str) -> BTreeMap<String, String> {
    let result = lock().get_string_map(key);
    must_be_parsed(result)
}

pub fn is_set(key: &str) -> bool {
    let result = lock().is_set(key);
    must_be_parsed(result)
}

pub fn all_keys() -> Vec<String> {
    let result = lock().all_keys();
    must_be_parsed(result)
}

/// Print every resolved key, its value and its type to stdout.
pub fn debug() {
    let result = lock().debug();
    must_be_parsed(result)
}

/// Deserialize the resolved configuration into `T`.
pub fn unmarshal<T: DeserializeOwned>() -> Result<T> {
    let result = lock().unmarshal();
    match result {
        Err(err @ ConfigError::NotParsed) => panic!("{}", err),
        other => other,
    }
}

/// Return all process-wide state to empty and unresolved.
#[cfg(test)]
pub(crate) fn reset() {
    *lock() = Config::new();
}
