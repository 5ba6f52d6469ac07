use clap::Args;
use serde_json::Value;

use decision_intel_core::DecisionThresholds;

use crate::input;

/// Arguments for printing the threshold configuration
#[derive(Args)]
pub struct ThresholdsArgs {
    /// Validate this file (JSON or YAML) and print the effective values
    #[arg(long)]
    pub config: Option<String>,
}

pub fn run_thresholds(args: ThresholdsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let thresholds = match args.config {
        Some(ref path) => input::config::read_thresholds(path)?,
        None => DecisionThresholds::default(),
    };
    Ok(serde_json::to_value(thresholds)?)
}
