//! Inference Engine - ONNX Runtime Integration
//!
//! Owns the loaded visual classifier session. The model is an expensive
//! process-lifetime resource: `shared_engine()` initializes it at most
//! once, and concurrent first-time callers block on that single load.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::Array4;
use once_cell::sync::OnceCell;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::error::ModerationError;

static SHARED_ENGINE: OnceCell<Arc<VisualEngine>> = OnceCell::new();

/// Engine metadata, mostly for status reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineMetadata {
    pub model_path: String,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

/// Seam over the inference call so the classifier can be exercised
/// without a real checkpoint.
pub trait InferenceBackend: Send + Sync {
    /// Run one batch; returns a probability row per input frame.
    fn run_batch(&self, input: Array4<f32>) -> Result<Vec<Vec<f32>>, ModerationError>;
}

/// Loaded ONNX classifier session.
#[derive(Debug)]
pub struct VisualEngine {
    session: Mutex<Session>,
    output_name: String,
    metadata: EngineMetadata,
}

impl VisualEngine {
    /// Load a checkpoint from disk.
    pub fn load(model_path: &Path) -> Result<Self, ModerationError> {
        log::info!("Loading ONNX model from: {}", model_path.display());

        if !model_path.exists() {
            return Err(ModerationError::engine(format!(
                "model not found: {}",
                model_path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| ModerationError::engine(format!("failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ModerationError::engine(format!("failed to set optimization: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| ModerationError::engine(format!("failed to load model: {}", e)))?;

        let output_name = session
            .outputs()
            .first()
            .map(|o| o.name().to_string())
            .ok_or_else(|| ModerationError::engine("model defines no output"))?;

        log::info!("ONNX model loaded successfully");

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            metadata: EngineMetadata {
                model_path: model_path.display().to_string(),
                loaded_at: chrono::Utc::now(),
            },
        })
    }

    pub fn metadata(&self) -> &EngineMetadata {
        &self.metadata
    }
}

impl InferenceBackend for VisualEngine {
    fn run_batch(&self, input: Array4<f32>) -> Result<Vec<Vec<f32>>, ModerationError> {
        let batch = input.shape()[0];
        if batch == 0 {
            return Ok(Vec::new());
        }

        let mut session = self.session.lock();

        let input_tensor = Value::from_array(input)
            .map_err(|e| ModerationError::engine(format!("tensor error: {}", e)))?;

        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ModerationError::engine(format!("inference failed: {}", e)))?;

        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| ModerationError::engine("no output tensor"))?;

        let output_tensor = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ModerationError::engine(format!("extract error: {}", e)))?;
        let data = output_tensor.1;

        if data.len() % batch != 0 {
            return Err(ModerationError::engine(format!(
                "output size {} not divisible by batch {}",
                data.len(),
                batch
            )));
        }

        let cols = data.len() / batch;
        Ok(data.chunks(cols).map(|row| row.to_vec()).collect())
    }
}

/// Process-wide engine handle.
///
/// The first caller pays the download/load cost; everyone else gets the
/// already-initialized `Arc` without re-acquiring the init guard.
pub fn shared_engine() -> Result<Arc<VisualEngine>, ModerationError> {
    SHARED_ENGINE
        .get_or_try_init(|| {
            let checkpoint = ensure_model_checkpoint()?;
            VisualEngine::load(&checkpoint).map(Arc::new)
        })
        .cloned()
}

/// Resolve the cached checkpoint, downloading it on first use.
fn ensure_model_checkpoint() -> Result<PathBuf, ModerationError> {
    let home = dirs::home_dir().ok_or_else(|| ModerationError::engine("no home directory"))?;
    let cache_dir = home.join(constants::MODEL_CACHE_DIR);
    std::fs::create_dir_all(&cache_dir)
        .map_err(|e| ModerationError::engine(format!("cannot create model cache: {}", e)))?;

    let file_name = constants::MODEL_CHECKPOINT_URL
        .rsplit('/')
        .next()
        .unwrap_or("classifier_model.onnx");
    let model_path = cache_dir.join(file_name);
    if model_path.exists() {
        return Ok(model_path);
    }

    log::info!(
        "Downloading the checkpoint to {}",
        model_path.display()
    );
    let response = ureq::get(constants::MODEL_CHECKPOINT_URL)
        .call()
        .map_err(|e| ModerationError::engine(format!("checkpoint download failed: {}", e)))?;

    // Write to a temp name first so an interrupted download never leaves a
    // truncated checkpoint behind.
    let tmp_path = cache_dir.join(format!("{}.partial", file_name));
    let mut reader = response.into_reader();
    let mut file = std::fs::File::create(&tmp_path)
        .map_err(|e| ModerationError::engine(format!("cannot write checkpoint: {}", e)))?;
    std::io::copy(&mut reader, &mut file)
        .map_err(|e| ModerationError::engine(format!("checkpoint write failed: {}", e)))?;
    std::fs::rename(&tmp_path, &model_path)
        .map_err(|e| ModerationError::engine(format!("checkpoint rename failed: {}", e)))?;

    Ok(model_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_checkpoint_is_engine_error() {
        let err = VisualEngine::load(Path::new("/nonexistent/model.onnx")).unwrap_err();
        assert!(matches!(err, ModerationError::ClassificationEngine(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_metadata_serializes_for_status_reporting() {
        let meta = EngineMetadata {
            model_path: "/tmp/classifier_model.onnx".to_string(),
            loaded_at: chrono::Utc::now(),
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("/tmp/classifier_model.onnx"));
        assert!(json.contains("loaded_at"));
    }
}
