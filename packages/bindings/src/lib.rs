use napi::Result as NapiResult;
use napi_derive::napi;

use decision_intel_core::records::categorize;
use decision_intel_core::report::{analyze_decision_intelligence as run_analysis, DecisionInput};
use decision_intel_core::DecisionThresholds;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Full report for a record batch: a JSON array of rows, or
/// `{ "records": [...], "thresholds": {...} }`.
#[napi]
pub fn analyze_decision_intelligence(input_json: String) -> NapiResult<String> {
    let input: DecisionInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = run_analysis(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Helpers for the dashboard
// ---------------------------------------------------------------------------

/// Category label for one product description.
#[napi]
pub fn categorize_product(description: Option<String>) -> String {
    categorize(description.as_deref()).label().to_string()
}

#[napi]
pub fn default_thresholds() -> NapiResult<String> {
    serde_json::to_string(&DecisionThresholds::default()).map_err(to_napi_error)
}

/// Parse and validate a thresholds document, returning it with defaults filled in.
#[napi]
pub fn validate_thresholds(thresholds_json: String) -> NapiResult<String> {
    let thresholds: DecisionThresholds =
        serde_json::from_str(&thresholds_json).map_err(to_napi_error)?;
    thresholds.validate().map_err(to_napi_error)?;
    serde_json::to_string(&thresholds).map_err(to_napi_error)
}
