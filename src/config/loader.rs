//! Decoding chaos configuration documents.
//!
//! A document is a JSON object with any subset of the [`ChaosConfig`] keys.
//! Decoding always happens relative to a base configuration: keys present in
//! the document replace the base value, absent keys and `null` values keep
//! it. A management write decodes against the zero configuration, the
//! startup file and the watcher decode against the configuration in effect.

use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::ChaosConfig;
use crate::config::validation::ValidationError;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Parse error: expected a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Overlay a JSON document onto `base`.
pub fn overlay(base: &ChaosConfig, document: &[u8]) -> Result<ChaosConfig, ConfigError> {
    let patch: Value = serde_json::from_slice(document)?;
    let Value::Object(patch) = patch else {
        return Err(ConfigError::NotAnObject(json_kind(&patch)));
    };

    let mut merged = match serde_json::to_value(base)? {
        Value::Object(map) => map,
        other => return Err(ConfigError::NotAnObject(json_kind(&other))),
    };
    for (key, value) in patch {
        if !value.is_null() {
            merged.insert(key, value);
        }
    }

    Ok(serde_json::from_value(Value::Object(merged))?)
}

/// Decode a complete configuration; omitted fields take zero values.
pub fn decode_full(document: &[u8]) -> Result<ChaosConfig, ConfigError> {
    overlay(&ChaosConfig::default(), document)
}

/// Read `path` and overlay it onto `base`.
pub fn load_overlay_file(path: &Path, base: &ChaosConfig) -> Result<ChaosConfig, ConfigError> {
    let content = fs::read(path)?;
    overlay(base, &content)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
