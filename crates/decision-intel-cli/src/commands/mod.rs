pub mod analyze;
pub mod categorize;
pub mod thresholds;
