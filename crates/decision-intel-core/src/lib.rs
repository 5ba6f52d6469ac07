pub mod aggregation;
pub mod analytics;
pub mod config;
pub mod error;
pub mod records;
pub mod report;
pub mod source;
pub mod types;

pub use config::DecisionThresholds;
pub use error::DecisionIntelError;
pub use report::{analyze_decision_intelligence, run_pipeline, DecisionInput, DecisionReport};
pub use types::*;

/// Standard result type for all decision-intelligence operations
pub type DecisionResult<T> = Result<T, DecisionIntelError>;
