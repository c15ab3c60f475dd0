//! Config file loading
//!
//! Reads a structured file into a [`Store`]. The format follows the file
//! extension: `.toml`, `.json`, anything else is read as YAML.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{ConfigError, Result};
use crate::store::Store;
use crate::value::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Yaml,
    Toml,
    Json,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Self {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
        match ext.as_str() {
            "toml" => FileFormat::Toml,
            "json" => FileFormat::Json,
            _ => FileFormat::Yaml,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FileFormat::Yaml => "yaml",
            FileFormat::Toml => "toml",
            FileFormat::Json => "json",
        }
    }
}

/// Load `path` into a store. A missing file is not an error and yields an
/// empty store.
pub fn load_file(path: &Path) -> Result<Store> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("Config file {} not found, continuing without it", path.display());
            return Ok(Store::new());
        }
        Err(source) => return Err(ConfigError::Read { path: path.to_path_buf(), source }),
    };

    let format = FileFormat::from_path(path);
    let content = String::from_utf8(bytes).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        format: format.name(),
        message: e.to_string(),
    })?;
    let data = parse_str(&content, format).map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        format: format.name(),
        message,
    })?;

    tracing::debug!("Loaded {} top-level keys from {}", data.len(), path.display());
    Ok(Store::from_map(data))
}

/// Parse file content into a tree. The top level must be a mapping; an empty
/// YAML document counts as an empty mapping.
pub fn parse_str(content: &str, format: FileFormat) -> std::result::Result<Map, String> {
    match format {
        FileFormat::Yaml => {
            let raw: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
            match raw {
                serde_yaml::Value::Null => Ok(Map::new()),
                serde_yaml::Value::Mapping(mapping) => Ok(from_yaml_mapping(mapping)),
                other => Err(format!("expected a mapping at the top level, found {}", yaml_type(&other))),
            }
        }
        FileFormat::Toml => {
            let table: toml::Table = toml::from_str(content).map_err(|e| e.to_string())?;
            Ok(table.into_iter().map(|(k, v)| (k, from_toml(v))).collect())
        }
        FileFormat::Json => {
            let raw: serde_json::Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
            match raw {
                serde_json::Value::Object(object) => Ok(object
                    .into_iter()
                    .filter_map(|(k, v)| from_json(v).map(|v| (k, v)))
                    .collect()),
                _ => Err("expected an object at the top level".to_string()),
            }
        }
    }
}

fn yaml_type(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

// Nulls carry no value and are dropped.
fn from_yaml(value: serde_yaml::Value) -> Option<Value> {
    match value {
        serde_yaml::Value::Null => None,
        serde_yaml::Value::Bool(b) => Some(Value::Bool(b)),
        serde_yaml::Value::Number(n) => Some(if let Some(i) = n.as_i64() {
            Value::Int(i)
        } else if let Some(u) = n.as_u64() {
            Value::Uint(u)
        } else {
            Value::Float(n.as_f64().unwrap_or_default())
        }),
        serde_yaml::Value::String(s) => Some(Value::String(s)),
        serde_yaml::Value::Sequence(items) => {
            Some(Value::List(items.into_iter().filter_map(from_yaml).collect()))
        }
        serde_yaml::Value::Mapping(mapping) => Some(Value::Map(from_yaml_mapping(mapping))),
        serde_yaml::Value::Tagged(tagged) => from_yaml(tagged.value),
    }
}

/// YAML allows non-string keys; they are addressed by their text.
fn from_yaml_mapping(mapping: serde_yaml::Mapping) -> Map {
    mapping
        .into_iter()
        .filter_map(|(key, value)| {
            let key = match key {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                other => serde_yaml::to_string(&other).ok()?.trim().to_string(),
            };
            from_yaml(value).map(|value| (key, value))
        })
        .collect()
}

fn from_toml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Int(i),
        toml::Value::Float(x) => Value::Float(x),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::List(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => {
            Value::Map(table.into_iter().map(|(k, v)| (k, from_toml(v))).collect())
        }
    }
}

fn from_json(value: serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(Value::Bool(b)),
        serde_json::Value::Number(n) => Some(if let Some(i) = n.as_i64() {
            Value::Int(i)
        } else if let Some(u) = n.as_u64() {
            Value::Uint(u)
        } else {
            Value::Float(n.as_f64().unwrap_or_default())
        }),
        serde_json::Value::String(s) => Some(Value::String(s)),
        serde_json::Value::Array(items) => {
            Some(Value::List(items.into_iter().filter_map(from_json).collect()))
        }
        serde_json::Value::Object(object) => Some(Value::Map(
            object.into_iter().filter_map(|(k, v)| from_json(v).map(|v| (k, v))).collect(),
        )),
    }
}
