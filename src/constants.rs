//! Central Configuration Constants
//!
//! Single source of truth for all pipeline defaults.
//! To change a threshold or endpoint, only edit this file.

use std::time::Duration;

/// Maximum accepted video duration (seconds). Longer uploads are rejected
/// before any audio or visual processing happens.
pub const DEFAULT_MAX_VIDEO_DURATION_SECS: f64 = 45.0;

/// Two frames scoring at or above this structural similarity are
/// considered near-duplicates.
pub const DEFAULT_FRAME_SIMILARITY_THRESH: f32 = 0.5;

/// How many recently retained frames a candidate is compared against.
pub const DEFAULT_SIMILARITY_WINDOW_DEPTH: usize = 3;

/// Fraction of a second between candidate frames. The effective frame
/// stride is `round(skip_fraction * fps)`, minimum 1.
pub const DEFAULT_SKIP_FRACTION: f64 = 0.5;

/// Frames per inference batch.
pub const DEFAULT_BATCH_SIZE: usize = 4;

/// Model input resolution (square).
pub const DEFAULT_IMAGE_SIZE: u32 = 256;

/// Edge length of the grayscale thumbnails used for similarity scoring.
pub const SIMILARITY_THUMB_SIZE: u32 = 64;

/// A frame counts as unsafe when its "unsafe" probability exceeds this.
pub const UNSAFE_FRAME_PROB_THRESHOLD: f32 = 0.5;

/// The video is visually unsafe when the unsafe-frame ratio exceeds this.
pub const UNSAFE_RATIO_THRESHOLD: f32 = 0.1;

/// Category names in the model's output order.
pub const DEFAULT_CATEGORIES: [&str; 2] = ["unsafe", "safe"];

/// Pivot language the transcript is translated to before text moderation.
pub const PIVOT_LANGUAGE: &str = "en";

/// Classifier checkpoint location (downloaded on first use).
pub const MODEL_CHECKPOINT_URL: &str =
    "https://github.com/notAI-tech/NudeNet/releases/download/v0/classifier_model.onnx";

/// Cache folder under $HOME for the downloaded checkpoint.
pub const MODEL_CACHE_DIR: &str = ".moderation-core";

/// Default timeout for collaborator service calls (seconds).
pub const DEFAULT_SERVICE_TIMEOUT_SECS: u64 = 30;

/// Default hosted text-moderation endpoint.
pub const DEFAULT_MODERATION_URL: &str = "https://api.openai.com/v1/moderations";

/// Default speech-to-text endpoint.
pub const DEFAULT_TRANSCRIPTION_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Default translation endpoint (LibreTranslate-compatible).
pub const DEFAULT_TRANSLATION_URL: &str = "https://libretranslate.com/translate";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "moderation-core";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Frame similarity threshold from environment or default
pub fn frame_similarity_thresh() -> f32 {
    std::env::var("FRAME_SIMILARITY_THRESH")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_FRAME_SIMILARITY_THRESH)
}

/// Candidate skip fraction from environment or default
pub fn skip_fraction() -> f64 {
    std::env::var("SKIP_N_FRAMES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SKIP_FRACTION)
}

/// Maximum video duration from environment or default
pub fn max_video_duration_secs() -> f64 {
    std::env::var("MAX_VIDEO_DURATION_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_MAX_VIDEO_DURATION_SECS)
}

/// Collaborator call timeout from environment or default
pub fn service_timeout() -> Duration {
    let secs = std::env::var("SERVICE_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SERVICE_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// API key for the hosted moderation / transcription services
pub fn openai_api_key() -> String {
    std::env::var("OPENAI_API_KEY").unwrap_or_default()
}

/// Text moderation endpoint from environment or default
pub fn moderation_url() -> String {
    std::env::var("MODERATION_URL").unwrap_or_else(|_| DEFAULT_MODERATION_URL.to_string())
}

/// Speech-to-text endpoint from environment or default
pub fn transcription_url() -> String {
    std::env::var("TRANSCRIPTION_URL").unwrap_or_else(|_| DEFAULT_TRANSCRIPTION_URL.to_string())
}

/// Translation endpoint from environment or default
pub fn translation_url() -> String {
    std::env::var("TRANSLATION_URL").unwrap_or_else(|_| DEFAULT_TRANSLATION_URL.to_string())
}
