use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecisionIntelError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid configuration: {field} — {reason}")]
    InvalidConfig { field: String, reason: String },

    /// The record batch could not be obtained from the data-access layer.
    /// No partial report is ever produced after this.
    #[error("Upstream fetch failed: {source_name} — {reason}")]
    Upstream { source_name: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for DecisionIntelError {
    fn from(e: serde_json::Error) -> Self {
        DecisionIntelError::SerializationError(e.to_string())
    }
}
