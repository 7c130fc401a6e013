//! Error taxonomy
//!
//! Every failure kind the pipeline can surface is a distinct variant so
//! callers can tell a decode problem from an engine problem from a flaky
//! collaborator. Duration rejection and missing audio are NOT errors -
//! they are modeled as states on the verdict types.

use serde::Serialize;

/// Pipeline error taxonomy.
///
/// Per-frame decode failures are recovered by skipping inside the
/// components and never reach callers; a `MediaDecode` error at this level
/// means the container itself could not be read.
#[derive(Debug, Clone, Serialize)]
pub enum ModerationError {
    /// The media container (or a required stream) could not be decoded.
    MediaDecode(String),
    /// The visual classifier failed to load or run. Fatal for the request;
    /// never downgraded to a default Safe verdict.
    ClassificationEngine(String),
    /// A collaborator service (transcription, translation, text
    /// moderation) failed or timed out. Retryable.
    ExternalService { service: String, message: String },
    /// A verdict label pair with no entry in the fusion table. Unreachable
    /// through the typed fusion path; surfaced only when verdicts arrive
    /// as serialized labels.
    UnknownFusionCombination { audio: String, visual: String },
}

impl ModerationError {
    pub fn decode(msg: impl Into<String>) -> Self {
        ModerationError::MediaDecode(msg.into())
    }

    pub fn engine(msg: impl Into<String>) -> Self {
        ModerationError::ClassificationEngine(msg.into())
    }

    pub fn service(service: impl Into<String>, msg: impl Into<String>) -> Self {
        ModerationError::ExternalService {
            service: service.into(),
            message: msg.into(),
        }
    }

    /// Whether retrying the same request can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ModerationError::ExternalService { .. })
    }
}

impl std::fmt::Display for ModerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModerationError::MediaDecode(msg) => write!(f, "media decode error: {}", msg),
            ModerationError::ClassificationEngine(msg) => {
                write!(f, "classification engine error: {}", msg)
            }
            ModerationError::ExternalService { service, message } => {
                write!(f, "external service error ({}): {}", service, message)
            }
            ModerationError::UnknownFusionCombination { audio, visual } => {
                write!(
                    f,
                    "unknown fusion combination: audio={}, visual={}",
                    audio, visual
                )
            }
        }
    }
}

impl std::error::Error for ModerationError {}
