pub mod buckets;
pub mod engine;

pub use buckets::{
    CategoryBucket, CategoryMetrics, CustomerProfile, InstitutionMetrics, RegionKey,
    RegionMetrics,
};
pub use engine::{aggregate, Aggregation};
