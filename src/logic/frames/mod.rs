//! Frame sampling
//!
//! Selects a deduplicated, time-ordered subset of "interesting" frames
//! from a video: every Nth decoded frame, minus candidates that are
//! structurally similar to a recently retained frame.

pub mod sampler;
pub mod similarity;
pub mod window;

pub use sampler::{stride_for_fps, Frame, FrameSampler, SampledVideo, SamplerConfig};
pub use window::SimilarityWindow;
