//! Batch classifier
//!
//! Groups frames into fixed-size batches, runs the visual model once per
//! batch and maps probability rows back to the frames they came from.
//! Batch boundaries never align with request boundaries, so frame
//! identity (index or supplied name) is carried through explicitly.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::error::ModerationError;
use crate::logic::frames::Frame;

use super::engine::InferenceBackend;
use super::preprocess;

/// Classifier knobs.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub batch_size: usize,
    pub image_size: u32,
    /// Category names in the model's output order.
    pub categories: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            batch_size: constants::DEFAULT_BATCH_SIZE,
            image_size: constants::DEFAULT_IMAGE_SIZE,
            categories: constants::DEFAULT_CATEGORIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

/// One category with its probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub label: String,
    pub probability: f32,
}

/// Per-frame classification result, ranked ascending by probability the
/// way the model orders its own categories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameScores {
    pub ranked: Vec<CategoryScore>,
}

impl FrameScores {
    pub fn probability(&self, label: &str) -> Option<f32> {
        self.ranked
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.probability)
    }

    /// Highest-probability category.
    pub fn top(&self) -> Option<&CategoryScore> {
        self.ranked.last()
    }
}

/// Batched frontend over the inference backend.
pub struct BatchClassifier {
    engine: Arc<dyn InferenceBackend>,
    config: ClassifierConfig,
}

impl BatchClassifier {
    pub fn new(engine: Arc<dyn InferenceBackend>, config: ClassifierConfig) -> Self {
        Self { engine, config }
    }

    /// Classify sampled frames, keyed by frame index.
    pub fn classify_frames(
        &self,
        frames: &[Frame],
    ) -> Result<BTreeMap<u64, FrameScores>, ModerationError> {
        let prepared: Vec<(u64, Vec<f32>)> = frames
            .iter()
            .map(|f| {
                (
                    f.index,
                    preprocess::to_model_input(&f.image, self.config.image_size),
                )
            })
            .collect();
        self.run_batches(prepared)
    }

    /// Classify still images by path, keyed by the supplied path.
    ///
    /// A file that fails to decode is skipped and logged; the remaining
    /// images in its batch are still classified.
    pub fn classify_paths(
        &self,
        paths: &[PathBuf],
    ) -> Result<BTreeMap<String, FrameScores>, ModerationError> {
        let mut prepared = Vec::with_capacity(paths.len());
        for path in paths {
            match preprocess::load_rgb(path) {
                Ok(image) => prepared.push((
                    path.display().to_string(),
                    preprocess::to_model_input(&image, self.config.image_size),
                )),
                Err(e) => log::warn!("skipping undecodable image: {}", e),
            }
        }
        self.run_batches(prepared)
    }

    fn run_batches<K: Ord>(
        &self,
        items: Vec<(K, Vec<f32>)>,
    ) -> Result<BTreeMap<K, FrameScores>, ModerationError> {
        let mut results = BTreeMap::new();
        if items.is_empty() {
            return Ok(results);
        }

        let batch_size = self.config.batch_size.max(1);
        let mut queue = items.into_iter();

        loop {
            let chunk: Vec<(K, Vec<f32>)> = queue.by_ref().take(batch_size).collect();
            if chunk.is_empty() {
                break;
            }

            let inputs: Vec<&[f32]> = chunk.iter().map(|(_, data)| data.as_slice()).collect();
            let tensor = preprocess::batch_tensor(&inputs, self.config.image_size)?;
            let rows = self.engine.run_batch(tensor)?;

            if rows.len() != chunk.len() {
                return Err(ModerationError::engine(format!(
                    "backend returned {} rows for a batch of {}",
                    rows.len(),
                    chunk.len()
                )));
            }

            for ((key, _), row) in chunk.into_iter().zip(rows) {
                results.insert(key, self.rank_row(&row));
            }
        }

        Ok(results)
    }

    /// Ascending argsort of one probability row, re-labeled through the
    /// configured category names.
    fn rank_row(&self, row: &[f32]) -> FrameScores {
        let mut order: Vec<usize> = (0..row.len()).collect();
        order.sort_by(|&a, &b| {
            row[a]
                .partial_cmp(&row[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let ranked = order
            .into_iter()
            .map(|i| CategoryScore {
                label: self
                    .config
                    .categories
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| i.to_string()),
                probability: row[i],
            })
            .collect();

        FrameScores { ranked }
    }
}
