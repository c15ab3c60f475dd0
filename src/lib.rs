//! flagstack: layered configuration for command-line programs
//!
//! Merges three sources into one queryable store, highest precedence first:
//!
//! 1. command-line options, one per configuration key (`--database.host=...`);
//! 2. a YAML, TOML or JSON config file;
//! 3. defaults registered in code.
//!
//! ```no_run
//! use flagstack::Config;
//!
//! # fn main() -> flagstack::Result<()> {
//! let mut config = Config::new();
//! config.set_default("database.host", "localhost");
//! config.set_default("database.port", 5432u16);
//! config.load_file("configmap.yaml")?;
//! config.try_parse()?;
//!
//! let host = config.get_string("database.host")?;
//! let port = config.get_u16("database.port")?;
//! # let _ = (host, port);
//! # Ok(())
//! # }
//! ```
//!
//! Programs that only need one configuration can use the free functions in
//! [`global`] instead of passing a [`Config`] around.

pub mod coerce;
pub mod config;
pub mod error;
pub mod flags;
pub mod global;
pub mod resolver;
pub mod store;
pub mod value;

pub use error::{ConfigError, Result, NOT_PARSED_MESSAGE};
pub use flags::{ClapOptionParser, OptionKind, OptionParser, OptionSpec};
pub use resolver::Config;
pub use store::Store;
pub use value::{Value, ValueKind};
