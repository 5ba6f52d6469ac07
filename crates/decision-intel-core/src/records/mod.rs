pub mod categorizer;
pub mod normalizer;

pub use categorizer::{categorize, ProductCategory};
pub use normalizer::{
    normalize, normalize_batch, DataQualityIssue, DisbursementRecord, NormalizedBatch,
    RawDisbursementRecord,
};
