use std::fs;
use std::path::Path;

use decision_intel_core::DecisionThresholds;

use super::file::resolve_path;

/// Load thresholds from a JSON or YAML file (by extension) and validate them.
/// Missing keys keep their defaults.
pub fn read_thresholds(path: &str) -> Result<DecisionThresholds, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;

    let thresholds: DecisionThresholds = if is_yaml(&canonical) {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };

    thresholds.validate()?;
    log::debug!("loaded thresholds from {}", canonical.display());
    Ok(thresholds)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
