//! Supported-release lists read from a JSON build matrix.
//!
//! The same file that fans a build out across releases decides which tags
//! survive cleanup. Accepted shapes, for key `release`:
//!
//! ```text
//! {"release": ["1.0.0", "1.1.0"]}
//! {"include": [{"release": "1.0.0", "base": "alpine"}, ...]}
//! [{"release": "1.0.0"}, ...]
//! ["1.0.0", "1.1.0"]
//! ```
//!
//! An empty matrix yields no releases. Numbers keep their literal JSON text,
//! so `3.10` stays `3.10`.

use crate::error::{ReapError, Result};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;


/// Default key naming the release field in matrix entries.
pub const DEFAULT_MATRIX_KEY: &str = "release";

/// Reads and parses a matrix file.
pub fn load_releases(path: &Path, key: &str) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ReapError::config_with_source(
            "Failed to read matrix file".to_string(),
            Some(path.display().to_string()),
            e,
        )
    })?;
    parse_releases(&content, key)
}

/// Extracts the ordered, de-duplicated release list from matrix JSON.
pub fn parse_releases(json: &str, key: &str) -> Result<Vec<String>> {
    let document: Value = serde_json::from_str(json)
        .map_err(|e| ReapError::validation_with_source("Matrix file is not valid JSON", e))?;

    let mut values = Vec::new();
    let mut found = false;

    match &document {
        Value::Object(map) => {
            if let Some(value) = map.get(key) {
                found = true;
                collect_values(value, key, &mut values)?;
            }
            if let Some(Value::Array(entries)) = map.get("include") {
                found |= entries.is_empty();
                found |= collect_from_entries(entries, key, &mut values)?;
            }
        }
        Value::Array(entries) if entries.is_empty() => found = true,
        Value::Array(entries) if entries.iter().all(Value::is_object) => {
            found = collect_from_entries(entries, key, &mut values)?;
        }
        Value::Array(_) => {
            found = true;
            collect_values(&document, key, &mut values)?;
        }
        _ => {}
    }

    if !found {
        return Err(ReapError::validation(format!(
            "Matrix has no '{}' entries",
            key
        )));
    }

    let mut seen = BTreeSet::new();
    values.retain(|v| seen.insert(v.clone()));
    Ok(values)
}

/// Collects `key` from every object entry; returns whether any entry had it.
fn collect_from_entries(entries: &[Value], key: &str, out: &mut Vec<String>) -> Result<bool> {
    let mut found = false;
    for entry in entries {
        if let Some(value) = entry.get(key) {
            found = true;
            collect_values(value, key, out)?;
        }
    }
    Ok(found)
}

fn collect_values(value: &Value, key: &str, out: &mut Vec<String>) -> Result<()> {
    match value {
        Value::Array(items) => {
            for item in items {
                out.push(scalar_to_string(item, key)?);
            }
        }
        other => out.push(scalar_to_string(other, key)?),
    }
    Ok(())
}

fn scalar_to_string(value: &Value, key: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        // Literal text, kept by serde_json's `arbitrary_precision`
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ReapError::validation(format!(
            "Matrix '{}' value must be a string or number, got {}",
            key, other
        ))),
    }
}
