//! Provider configuration and value sources.
//!
//! [`ProviderConfig`] controls how a [`BeanInstanceProvider`](crate::BeanInstanceProvider)
//! behaves and where it preloads values from. [`ValueSource`] reads TOML,
//! JSON or `.env` documents (or the process environment) into the value
//! registry, flattening nested tables into dotted keys.
//!
//! # Environment Variables
//!
//! - `BEANBOX_AUTO_MOCK=0|1` - Fabricate doubles for unknown types (default `1`)
//! - `BEANBOX_VALUES_FILE=path` - Value file loaded into every new provider
//! - `BEANBOX_ENV_PREFIX=APP` - Load `APP_*` variables as values

use crate::values::ValueRegistry;
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

fn flag(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Fabricate test doubles for types nobody registered
    pub auto_mock: bool,
    /// Value file loaded when the provider is built
    pub values_file: Option<PathBuf>,
    /// Environment variables with this prefix are loaded as values
    pub env_prefix: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            auto_mock: true,
            values_file: None,
            env_prefix: None,
        }
    }
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            auto_mock: flag("BEANBOX_AUTO_MOCK").unwrap_or(true),
            values_file: env::var_os("BEANBOX_VALUES_FILE").map(PathBuf::from),
            env_prefix: env::var("BEANBOX_ENV_PREFIX").ok(),
        }
    }

    /// Parse config from a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("TOML parse error: {}", e)))
    }

    pub fn auto_mock(mut self, enable: bool) -> Self {
        self.auto_mock = enable;
        self
    }

    pub fn values_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.values_file = Some(path.into());
        self
    }

    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Sources to preload, in load order.
    pub(crate) fn sources(&self) -> Vec<ValueSource> {
        let mut sources = Vec::new();
        if let Some(path) = &self.values_file {
            sources.push(ValueSource::File(path.clone()));
        }
        if let Some(prefix) = &self.env_prefix {
            sources.push(ValueSource::Environment {
                prefix: prefix.clone(),
            });
        }
        sources
    }
}

/// Supported value document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
    Env,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            "env" => Some(FileFormat::Env),
            _ => None,
        }
    }

    fn from_path(path: &Path) -> Result<Self> {
        if path.file_name().and_then(|n| n.to_str()) == Some(".env") {
            return Ok(FileFormat::Env);
        }

        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::Config(format!("No file extension: {}", path.display())))?;

        FileFormat::from_extension(ext)
            .ok_or_else(|| Error::Config(format!("Unsupported format: {}", ext)))
    }
}

/// Where values are loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// An in-memory document
    Document { format: FileFormat, content: String },
    /// A file; the format follows the extension
    File(PathBuf),
    /// Process environment variables starting with `prefix`
    Environment { prefix: String },
}

impl ValueSource {
    pub fn toml(content: impl Into<String>) -> Self {
        ValueSource::Document {
            format: FileFormat::Toml,
            content: content.into(),
        }
    }

    pub fn json(content: impl Into<String>) -> Self {
        ValueSource::Document {
            format: FileFormat::Json,
            content: content.into(),
        }
    }

    pub fn dotenv(content: impl Into<String>) -> Self {
        ValueSource::Document {
            format: FileFormat::Env,
            content: content.into(),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        ValueSource::File(path.into())
    }

    pub fn environment(prefix: impl Into<String>) -> Self {
        ValueSource::Environment {
            prefix: prefix.into(),
        }
    }

    /// Read the source into flat `(key, value)` pairs, sorted by key.
    pub fn entries(&self) -> Result<Vec<(String, Value)>> {
        let document = match self {
            ValueSource::Document { format, content } => parse(*format, content)?,
            ValueSource::File(path) => {
                let format = FileFormat::from_path(path)?;
                let content = fs::read_to_string(path)?;
                parse(format, &content)?
            }
            ValueSource::Environment { prefix } => environment(prefix, env::vars()),
        };

        if !document.is_object() {
            return Err(Error::Config(
                "values document must be a table or object".to_string(),
            ));
        }

        let mut entries = Vec::new();
        flatten(None, document, &mut entries);
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    /// Load every entry into `values`; returns the number of keys set.
    pub(crate) fn load_into(&self, values: &ValueRegistry) -> Result<usize> {
        let entries = self.entries()?;
        let count = entries.len();
        for (key, value) in entries {
            store(values, key, value);
        }

        debug!(source = ?self, value_count = count, "Loaded values");
        Ok(count)
    }
}

fn parse(format: FileFormat, content: &str) -> Result<Value> {
    match format {
        FileFormat::Json => serde_json::from_str(content)
            .map_err(|e| Error::Config(format!("JSON parse error: {}", e))),
        FileFormat::Toml => {
            let table: toml::Table = toml::from_str(content)
                .map_err(|e| Error::Config(format!("TOML parse error: {}", e)))?;
            serde_json::to_value(table)
                .map_err(|e| Error::Config(format!("TOML conversion error: {}", e)))
        }
        FileFormat::Env => Ok(parse_env(content)),
    }
}

fn parse_env(content: &str) -> Value {
    let mut map = serde_json::Map::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            map.insert(key.trim().to_string(), Value::String(value.to_string()));
        }
    }

    Value::Object(map)
}

/// `APP_MAIL_SENDER` with prefix `APP` becomes `mail.sender`.
fn environment(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Value {
    let prefix = format!("{}_", prefix.trim_end_matches('_'));
    let map = vars
        .into_iter()
        .filter_map(|(key, value)| {
            let trimmed = key.strip_prefix(&prefix)?;
            let key = trimmed.to_lowercase().replace('_', ".");
            Some((key, Value::String(value)))
        })
        .collect();

    Value::Object(map)
}

fn flatten(prefix: Option<&str>, value: Value, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let key = match prefix {
                    Some(prefix) => format!("{}.{}", prefix, key),
                    None => key,
                };
                flatten(Some(key.as_str()), child, out);
            }
        }
        // null leaves the key unset
        Value::Null => {}
        other => {
            if let Some(prefix) = prefix {
                out.push((prefix.to_string(), other));
            }
        }
    }
}

/// Scalars are stored as `String`, `i64`, `f64` or `bool`; arrays stay a
/// `serde_json::Value`. Nulls never reach here.
fn store(values: &ValueRegistry, key: String, value: Value) {
    match value {
        Value::String(s) => values.set(key, s),
        Value::Bool(b) => values.set(key, b),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => values.set(key, i),
            (None, Some(f)) => values.set(key, f),
            (None, None) => values.set(key, Value::Number(n)),
        },
        other => values.set(key, other),
    }
}
