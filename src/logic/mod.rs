//! Moderation pipeline logic
//!
//! Leaf-first: media decode, frame sampling, batched classification,
//! verdict aggregation and fusion, then the orchestrator on top.

pub mod audio;
pub mod error;
pub mod frames;
pub mod media;
pub mod model;
pub mod pipeline;
pub mod verdict;
