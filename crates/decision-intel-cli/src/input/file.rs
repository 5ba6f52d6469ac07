use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use decision_intel_core::DecisionInput;

/// Read a record batch: a JSON array of rows, or `{ "records": [...] }`
/// optionally carrying inline `thresholds`.
pub fn read_records(path: &str) -> Result<DecisionInput, Box<dyn std::error::Error>> {
    let value = read_json_value(path)?;
    let input: DecisionInput = serde_json::from_value(value)
        .map_err(|e| format!("'{path}' is not a record batch: {e}"))?;
    log::debug!("read {} records from {}", input.records.len(), path);
    Ok(input)
}

/// Read a JSON file as a generic serde_json::Value.
pub fn read_json_value(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: Value = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Resolve relative paths against the working directory and require a
/// regular file.
pub(crate) fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }
    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}
