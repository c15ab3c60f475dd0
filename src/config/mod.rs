//! Configuration file sources
//!
//! Turns YAML, TOML or JSON files into the nested store the resolver merges
//! over its defaults.

pub mod loader;

pub use loader::{load_file, FileFormat};
