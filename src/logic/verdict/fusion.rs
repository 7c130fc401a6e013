//! Fusion engine
//!
//! Combines the audio and visual verdicts into one final outcome. The
//! mapping is a single exhaustive match over the two verdict enums, so
//! the compiler proves the table total - no runtime lookup can miss.

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::error::ModerationError;

use super::types::{AudioVerdict, SafetyLabel, VisualVerdict};

/// Final fused state for one piece of media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FusionOutcome {
    BothSafe,
    BothUnsafe,
    AudioSafeVisualUnsafe,
    AudioUnsafeVisualSafe,
    NoAudioVisualSafe,
    NoAudioVisualUnsafe,
    /// Policy rejection; the visual pipeline is never consulted for this.
    DurationExceeded,
}

impl FusionOutcome {
    /// User-facing message for this outcome.
    pub fn message(&self) -> String {
        match self {
            FusionOutcome::BothSafe => "Audio and Visual Safe".to_string(),
            FusionOutcome::BothUnsafe => "Audio and Visual Unsafe".to_string(),
            FusionOutcome::AudioSafeVisualUnsafe => "Audio Safe and Visual Unsafe".to_string(),
            FusionOutcome::AudioUnsafeVisualSafe => "Audio Unsafe and Visual Safe".to_string(),
            FusionOutcome::NoAudioVisualSafe => {
                "No Audio in Video and Visual Video Safe".to_string()
            }
            FusionOutcome::NoAudioVisualUnsafe => {
                "No Audio in Video and Visual Video Unsafe".to_string()
            }
            FusionOutcome::DurationExceeded => {
                Self::duration_message(constants::max_video_duration_secs())
            }
        }
    }

    /// Rejection message for a specific duration cap. Callers enforcing
    /// a non-default cap report the cap they actually applied.
    pub fn duration_message(max_secs: f64) -> String {
        format!(
            "Please upload video with duration less than {} seconds.",
            max_secs
        )
    }
}

/// Fuse the two verdicts. Total over both variant sets by construction.
pub fn fuse(audio: &AudioVerdict, visual: &VisualVerdict) -> FusionOutcome {
    match (audio, visual.label) {
        (AudioVerdict::Safe { .. }, SafetyLabel::Safe) => FusionOutcome::BothSafe,
        (AudioVerdict::Unsafe { .. }, SafetyLabel::Unsafe) => FusionOutcome::BothUnsafe,
        (AudioVerdict::Safe { .. }, SafetyLabel::Unsafe) => FusionOutcome::AudioSafeVisualUnsafe,
        (AudioVerdict::Unsafe { .. }, SafetyLabel::Safe) => FusionOutcome::AudioUnsafeVisualSafe,
        (AudioVerdict::NoAudio, SafetyLabel::Safe) => FusionOutcome::NoAudioVisualSafe,
        (AudioVerdict::NoAudio, SafetyLabel::Unsafe) => FusionOutcome::NoAudioVisualUnsafe,
        (AudioVerdict::DurationExceeded, _) => FusionOutcome::DurationExceeded,
    }
}

/// Label-based lookup for callers holding serialized verdicts.
///
/// A pair outside the declared label sets is a modeled error, never a
/// panic or missing-key failure.
pub fn fuse_labels(audio: &str, visual: &str) -> Result<FusionOutcome, ModerationError> {
    match (audio, visual) {
        ("Safe", "Safe") => Ok(FusionOutcome::BothSafe),
        ("Unsafe", "Unsafe") => Ok(FusionOutcome::BothUnsafe),
        ("Safe", "Unsafe") => Ok(FusionOutcome::AudioSafeVisualUnsafe),
        ("Unsafe", "Safe") => Ok(FusionOutcome::AudioUnsafeVisualSafe),
        ("No audio", "Safe") => Ok(FusionOutcome::NoAudioVisualSafe),
        ("No audio", "Unsafe") => Ok(FusionOutcome::NoAudioVisualUnsafe),
        ("Duration exceeded", _) => Ok(FusionOutcome::DurationExceeded),
        _ => Err(ModerationError::UnknownFusionCombination {
            audio: audio.to_string(),
            visual: visual.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::verdict::types::CategoryScores;

    fn visual(label: SafetyLabel) -> VisualVerdict {
        VisualVerdict {
            label,
            unsafe_ratio: match label {
                SafetyLabel::Safe => 0.0,
                SafetyLabel::Unsafe => 0.5,
            },
            sampled_frame_count: 10,
        }
    }

    fn audio_variants() -> Vec<AudioVerdict> {
        vec![
            AudioVerdict::Safe {
                scores: CategoryScores::new(),
            },
            AudioVerdict::Unsafe {
                scores: CategoryScores::new(),
            },
            AudioVerdict::NoAudio,
            AudioVerdict::DurationExceeded,
        ]
    }

    #[test]
    fn test_table_is_total() {
        // Every declared combination fuses to a defined outcome with a
        // non-empty message.
        for audio in audio_variants() {
            for label in [SafetyLabel::Safe, SafetyLabel::Unsafe] {
                let outcome = fuse(&audio, &visual(label));
                assert!(!outcome.message().is_empty());
            }
        }
    }

    #[test]
    fn test_expected_messages() {
        let safe_audio = AudioVerdict::Safe {
            scores: CategoryScores::new(),
        };
        assert_eq!(
            fuse(&safe_audio, &visual(SafetyLabel::Safe)).message(),
            "Audio and Visual Safe"
        );
        assert_eq!(
            fuse(&safe_audio, &visual(SafetyLabel::Unsafe)).message(),
            "Audio Safe and Visual Unsafe"
        );
        assert_eq!(
            fuse(&AudioVerdict::NoAudio, &visual(SafetyLabel::Safe)).message(),
            "No Audio in Video and Visual Video Safe"
        );
        assert_eq!(
            fuse(&AudioVerdict::NoAudio, &visual(SafetyLabel::Unsafe)).message(),
            "No Audio in Video and Visual Video Unsafe"
        );
    }

    #[test]
    fn test_duration_exceeded_wins_regardless_of_visual() {
        for label in [SafetyLabel::Safe, SafetyLabel::Unsafe] {
            assert_eq!(
                fuse(&AudioVerdict::DurationExceeded, &visual(label)),
                FusionOutcome::DurationExceeded
            );
        }
        assert!(FusionOutcome::DurationExceeded
            .message()
            .contains("duration less than"));
    }

    #[test]
    fn test_duration_message_reflects_given_cap() {
        assert!(FusionOutcome::duration_message(20.0).contains("less than 20 seconds"));
    }

    #[test]
    fn test_label_lookup_matches_typed_fusion() {
        for audio in audio_variants() {
            for label in [SafetyLabel::Safe, SafetyLabel::Unsafe] {
                let typed = fuse(&audio, &visual(label));
                let looked_up = fuse_labels(audio.label(), label.as_str()).unwrap();
                assert_eq!(typed, looked_up);
            }
        }
    }

    #[test]
    fn test_unknown_label_pair_is_modeled_error() {
        let err = fuse_labels("Maybe", "Safe").unwrap_err();
        match err {
            ModerationError::UnknownFusionCombination { audio, visual } => {
                assert_eq!(audio, "Maybe");
                assert_eq!(visual, "Safe");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
