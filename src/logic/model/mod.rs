//! Visual classification
//!
//! ONNX Runtime integration: the process-lifetime engine handle, frame
//! preprocessing and the batched classifier on top.

pub mod classifier;
pub mod engine;
pub mod preprocess;

pub use classifier::{BatchClassifier, CategoryScore, ClassifierConfig, FrameScores};
pub use engine::{shared_engine, InferenceBackend, VisualEngine};
