//! Error types

use std::path::PathBuf;

use thiserror::Error;

/// Message of [`ConfigError::NotParsed`]. Callers match on this text.
pub const NOT_PARSED_MESSAGE: &str = "Parse() must be called before using Get* functions";

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A getter was called before resolution.
    #[error("flagstack: {}", NOT_PARSED_MESSAGE)]
    NotParsed,

    #[error("initialization failed: read error: failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("initialization failed: parse error: failed to parse {format} in {}: {message}", .path.display())]
    Parse { path: PathBuf, format: &'static str, message: String },

    /// One or more defaults or file values do not fit their option type.
    #[error("{}", .errors.join("\n"))]
    Registration { errors: Vec<String> },

    /// The command line was rejected, or help was requested.
    #[error(transparent)]
    Cli(#[from] clap::Error),

    #[error("failed to deserialize configuration: {0}")]
    Unmarshal(#[from] serde_json::Error),

    #[error("failed to write configuration dump: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
