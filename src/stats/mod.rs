//! Local branch-length statistics and the outlier classifier built on them.

pub mod local;
pub mod outlier;

pub use local::{local_branch_average, local_branch_max, WeightDecay, UNBOUNDED_RADIUS};
pub use outlier::{
    classify_and_filter, remove_invalid, scrutinize, BlameKind, LocalStats, OutlierCriterion,
    ScrutinyReport, DEFAULT_MULTIPLIER, DEFAULT_RADIUS,
};
