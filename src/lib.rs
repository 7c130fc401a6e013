//! Media Moderation Core
//!
//! Decides whether a piece of media is safe to surface. The core is the
//! video pipeline: representative-frame extraction with similarity
//! windowing, batched ONNX visual classification, threshold aggregation
//! and fusion with an audio/text verdict.

pub mod constants;
pub mod logic;
