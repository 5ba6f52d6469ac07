pub mod assembler;
pub mod pipeline;

pub use assembler::{build_report, DecisionReport, ExecutiveSummary};
pub use pipeline::{analyze_decision_intelligence, run_pipeline, DecisionInput};
