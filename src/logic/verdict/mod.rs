//! Verdicts
//!
//! Per-modality verdict types, the visual aggregation policy and the
//! exhaustive audio/visual fusion table.

pub mod aggregate;
pub mod fusion;
pub mod types;

pub use aggregate::VisualAggregator;
pub use fusion::{fuse, fuse_labels, FusionOutcome};
pub use types::{AudioVerdict, CategoryScores, SafetyLabel, VisualVerdict};
