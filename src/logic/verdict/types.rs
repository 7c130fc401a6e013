//! Verdict types
//!
//! Data only - the aggregation and fusion logic lives next door.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Category label to probability.
pub type CategoryScores = BTreeMap<String, f32>;

/// Safe/Unsafe outcome for one modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyLabel {
    Safe,
    Unsafe,
}

impl SafetyLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyLabel::Safe => "Safe",
            SafetyLabel::Unsafe => "Unsafe",
        }
    }
}

impl std::fmt::Display for SafetyLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verdict for the audio modality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AudioVerdict {
    /// Transcript scored safe. The score map may be empty when there was
    /// nothing verbal to score.
    Safe { scores: CategoryScores },
    /// Transcript was flagged by text moderation.
    Unsafe { scores: CategoryScores },
    /// The media has no audio track.
    NoAudio,
    /// The media exceeds the duration policy.
    DurationExceeded,
}

impl AudioVerdict {
    pub fn label(&self) -> &'static str {
        match self {
            AudioVerdict::Safe { .. } => "Safe",
            AudioVerdict::Unsafe { .. } => "Unsafe",
            AudioVerdict::NoAudio => "No audio",
            AudioVerdict::DurationExceeded => "Duration exceeded",
        }
    }

    /// Per-category scores, when audio was actually scored.
    pub fn scores(&self) -> Option<&CategoryScores> {
        match self {
            AudioVerdict::Safe { scores } | AudioVerdict::Unsafe { scores } => Some(scores),
            AudioVerdict::NoAudio | AudioVerdict::DurationExceeded => None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.scores().is_some()
    }
}

/// Verdict for the visual modality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualVerdict {
    pub label: SafetyLabel,
    /// Qualifying-unsafe frames over frames actually classified.
    pub unsafe_ratio: f32,
    pub sampled_frame_count: usize,
}
