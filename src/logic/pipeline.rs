//! Orchestrator
//!
//! Sequences one moderation request:
//! duration check -> audio verdict -> frame sampling + classification ->
//! fusion. A duration rejection short-circuits before any decode or
//! inference work. Transient artifacts live in a request workspace that
//! is removed on every exit path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::constants;
use crate::logic::audio::AudioVerdictSource;
use crate::logic::error::ModerationError;
use crate::logic::frames::{FrameSampler, SamplerConfig};
use crate::logic::media::{FfprobeProber, MediaInfo, MediaProber, RequestWorkspace};
use crate::logic::model::{shared_engine, BatchClassifier, ClassifierConfig, InferenceBackend};
use crate::logic::verdict::{fuse, AudioVerdict, CategoryScores, FusionOutcome, VisualAggregator, VisualVerdict};

/// Supplies the visual verdict for one piece of media. The caller
/// supplies the already-probed container metadata.
pub trait VisualVerdictSource: Send + Sync {
    fn visual_verdict(
        &self,
        media: &Path,
        info: &MediaInfo,
        workspace: &RequestWorkspace,
    ) -> Result<VisualVerdict, ModerationError>;
}

/// Sample -> classify -> aggregate.
pub struct VisualModerationPipeline {
    sampler: FrameSampler,
    classifier: BatchClassifier,
    aggregator: VisualAggregator,
}

impl VisualModerationPipeline {
    pub fn new(engine: Arc<dyn InferenceBackend>) -> Self {
        Self::with_parts(
            FrameSampler::new(SamplerConfig::default()),
            BatchClassifier::new(engine, ClassifierConfig::default()),
            VisualAggregator::default(),
        )
    }

    pub fn with_parts(
        sampler: FrameSampler,
        classifier: BatchClassifier,
        aggregator: VisualAggregator,
    ) -> Self {
        Self {
            sampler,
            classifier,
            aggregator,
        }
    }
}

impl VisualVerdictSource for VisualModerationPipeline {
    fn visual_verdict(
        &self,
        media: &Path,
        info: &MediaInfo,
        workspace: &RequestWorkspace,
    ) -> Result<VisualVerdict, ModerationError> {
        let sampled = self.sampler.sample_video(media, info, workspace)?;
        let scores = self.classifier.classify_frames(&sampled.frames)?;
        Ok(self.aggregator.aggregate(&scores))
    }
}

/// Structured result of a completed request.
#[derive(Debug, Clone, Serialize)]
pub struct ModerationReport {
    pub message: String,
    pub audio_available: bool,
    pub audio_scores: Option<CategoryScores>,
    pub visual_unsafe_ratio: f32,
    pub sampled_frame_count: usize,
}

/// Final result: either a policy rejection or a fused report.
#[derive(Debug, Clone, Serialize)]
pub enum ModerationOutcome {
    Rejected { message: String },
    Completed(ModerationReport),
}

impl ModerationOutcome {
    pub fn message(&self) -> &str {
        match self {
            ModerationOutcome::Rejected { message } => message,
            ModerationOutcome::Completed(report) => &report.message,
        }
    }
}

/// Drives one request through the pipeline state machine.
pub struct Orchestrator {
    prober: Box<dyn MediaProber>,
    audio: Box<dyn AudioVerdictSource>,
    visual: Box<dyn VisualVerdictSource>,
    max_duration_secs: f64,
}

impl Orchestrator {
    pub fn new(audio: Box<dyn AudioVerdictSource>, visual: Box<dyn VisualVerdictSource>) -> Self {
        Self::with_parts(
            Box::new(FfprobeProber),
            audio,
            visual,
            constants::max_video_duration_secs(),
        )
    }

    pub fn with_parts(
        prober: Box<dyn MediaProber>,
        audio: Box<dyn AudioVerdictSource>,
        visual: Box<dyn VisualVerdictSource>,
        max_duration_secs: f64,
    ) -> Self {
        Self {
            prober,
            audio,
            visual,
            max_duration_secs,
        }
    }

    /// Moderate one video end to end.
    pub fn moderate(&self, media: &Path) -> Result<ModerationOutcome, ModerationError> {
        // Workspace drops on every return path, taking the extracted
        // audio and frames with it.
        let workspace = RequestWorkspace::new()
            .map_err(|e| ModerationError::decode(format!("cannot create workspace: {}", e)))?;

        let info = self.prober.probe(media)?;
        log::debug!(
            "{}: duration {:.2}s, fps {:.2}, audio: {}",
            media.display(),
            info.duration_secs,
            info.fps,
            info.has_audio
        );

        if info.duration_secs > self.max_duration_secs {
            log::info!(
                "rejecting {}: duration {:.2}s exceeds {:.0}s cap",
                media.display(),
                info.duration_secs,
                self.max_duration_secs
            );
            return Ok(ModerationOutcome::Rejected {
                message: FusionOutcome::duration_message(self.max_duration_secs),
            });
        }

        let audio_verdict = self.audio.audio_verdict(media, &info, &workspace)?;
        if audio_verdict == AudioVerdict::DurationExceeded {
            return Ok(ModerationOutcome::Rejected {
                message: FusionOutcome::duration_message(self.max_duration_secs),
            });
        }

        let visual_verdict = self.visual.visual_verdict(media, &info, &workspace)?;
        let outcome = fuse(&audio_verdict, &visual_verdict);
        log::info!("fused outcome for {}: {:?}", media.display(), outcome);

        Ok(ModerationOutcome::Completed(ModerationReport {
            message: outcome.message(),
            audio_available: audio_verdict.is_available(),
            audio_scores: audio_verdict.scores().cloned(),
            visual_unsafe_ratio: visual_verdict.unsafe_ratio,
            sampled_frame_count: visual_verdict.sampled_frame_count,
        }))
    }
}

/// Orchestrator wired to the shared engine and the hosted collaborators.
pub fn default_orchestrator() -> Result<Orchestrator, ModerationError> {
    let engine = shared_engine()?;
    let meta = engine.metadata();
    log::info!(
        "visual engine ready: {} (loaded {})",
        meta.model_path,
        meta.loaded_at
    );
    Ok(Orchestrator::new(
        Box::new(crate::logic::audio::VerbalModerationPipeline::from_env()?),
        Box::new(VisualModerationPipeline::new(engine)),
    ))
}

/// Async facade: runs the blocking pipeline off the calling runtime
/// thread so concurrent requests do not head-of-line block each other.
pub async fn moderate_video(media: PathBuf) -> Result<ModerationOutcome, ModerationError> {
    tokio::task::spawn_blocking(move || {
        let orchestrator = default_orchestrator()?;
        orchestrator.moderate(&media)
    })
    .await
    .map_err(|e| ModerationError::engine(format!("moderation task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::verdict::SafetyLabel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedProber {
        info: MediaInfo,
        calls: Arc<AtomicUsize>,
    }
    impl FixedProber {
        fn new(info: MediaInfo) -> (Box<Self>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Box::new(Self {
                    info,
                    calls: calls.clone(),
                }),
                calls,
            )
        }
    }
    impl MediaProber for FixedProber {
        fn probe(&self, _path: &Path) -> Result<MediaInfo, ModerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.info.clone())
        }
    }

    struct CountingAudio {
        verdict: AudioVerdict,
        calls: Arc<AtomicUsize>,
    }
    impl AudioVerdictSource for CountingAudio {
        fn audio_verdict(
            &self,
            _media: &Path,
            _info: &MediaInfo,
            _workspace: &RequestWorkspace,
        ) -> Result<AudioVerdict, ModerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.verdict.clone())
        }
    }

    struct CountingVisual {
        verdict: VisualVerdict,
        calls: Arc<AtomicUsize>,
    }
    impl VisualVerdictSource for CountingVisual {
        fn visual_verdict(
            &self,
            _media: &Path,
            _info: &MediaInfo,
            _workspace: &RequestWorkspace,
        ) -> Result<VisualVerdict, ModerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.verdict.clone())
        }
    }

    fn info(duration_secs: f64, has_audio: bool) -> MediaInfo {
        MediaInfo {
            fps: 30.0,
            total_frames: (duration_secs * 30.0) as u64,
            duration_secs,
            has_audio,
        }
    }

    fn visual(label: SafetyLabel, unsafe_ratio: f32, sampled_frame_count: usize) -> VisualVerdict {
        VisualVerdict {
            label,
            unsafe_ratio,
            sampled_frame_count,
        }
    }

    fn orchestrator(
        media_info: MediaInfo,
        audio_verdict: AudioVerdict,
        visual_verdict: VisualVerdict,
    ) -> (Orchestrator, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let audio_calls = Arc::new(AtomicUsize::new(0));
        let visual_calls = Arc::new(AtomicUsize::new(0));
        let (prober, _) = FixedProber::new(media_info);
        let orchestrator = Orchestrator::with_parts(
            prober,
            Box::new(CountingAudio {
                verdict: audio_verdict,
                calls: audio_calls.clone(),
            }),
            Box::new(CountingVisual {
                verdict: visual_verdict,
                calls: visual_calls.clone(),
            }),
            45.0,
        );
        (orchestrator, audio_calls, visual_calls)
    }

    #[test]
    fn test_duration_gate_short_circuits_everything() {
        let (orchestrator, audio_calls, visual_calls) = orchestrator(
            info(50.0, true),
            AudioVerdict::NoAudio,
            visual(SafetyLabel::Safe, 0.0, 0),
        );

        let outcome = orchestrator.moderate(Path::new("long.mp4")).unwrap();
        match outcome {
            ModerationOutcome::Rejected { message } => {
                assert!(message.contains("duration less than"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        // Neither modality pipeline ran.
        assert_eq!(audio_calls.load(Ordering::SeqCst), 0);
        assert_eq!(visual_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_audio_safe_visual_unsafe_scenario() {
        // 2 of 10 frames over threshold -> ratio 0.2 -> visual Unsafe.
        let (orchestrator, _, _) = orchestrator(
            info(20.0, true),
            AudioVerdict::Safe {
                scores: CategoryScores::from([("hate".to_string(), 0.02)]),
            },
            visual(SafetyLabel::Unsafe, 0.2, 10),
        );

        let outcome = orchestrator.moderate(Path::new("clip.mp4")).unwrap();
        match outcome {
            ModerationOutcome::Completed(report) => {
                assert_eq!(report.message, "Audio Safe and Visual Unsafe");
                assert!(report.audio_available);
                assert!(report.audio_scores.unwrap().contains_key("hate"));
                assert!((report.visual_unsafe_ratio - 0.2).abs() < 1e-6);
                assert_eq!(report.sampled_frame_count, 10);
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn test_no_audio_safe_visual_scenario() {
        let (orchestrator, audio_calls, visual_calls) = orchestrator(
            info(10.0, false),
            AudioVerdict::NoAudio,
            visual(SafetyLabel::Safe, 0.0, 5),
        );

        let outcome = orchestrator.moderate(Path::new("silent.mp4")).unwrap();
        match outcome {
            ModerationOutcome::Completed(report) => {
                assert_eq!(report.message, "No Audio in Video and Visual Video Safe");
                assert!(!report.audio_available);
                assert!(report.audio_scores.is_none());
                assert_eq!(report.sampled_frame_count, 5);
            }
            other => panic!("expected completion, got {:?}", other),
        }
        assert_eq!(audio_calls.load(Ordering::SeqCst), 1);
        assert_eq!(visual_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_source_reported_duration_rejection_skips_visual() {
        let (orchestrator, audio_calls, visual_calls) = orchestrator(
            info(30.0, true),
            AudioVerdict::DurationExceeded,
            visual(SafetyLabel::Safe, 0.0, 3),
        );

        let outcome = orchestrator.moderate(Path::new("edge.mp4")).unwrap();
        assert!(matches!(outcome, ModerationOutcome::Rejected { .. }));
        assert_eq!(audio_calls.load(Ordering::SeqCst), 1);
        assert_eq!(visual_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_media_is_probed_once_per_request() {
        let audio_calls = Arc::new(AtomicUsize::new(0));
        let visual_calls = Arc::new(AtomicUsize::new(0));
        let (prober, probe_calls) = FixedProber::new(info(10.0, true));
        let orchestrator = Orchestrator::with_parts(
            prober,
            Box::new(CountingAudio {
                verdict: AudioVerdict::Safe {
                    scores: CategoryScores::new(),
                },
                calls: audio_calls,
            }),
            Box::new(CountingVisual {
                verdict: visual(SafetyLabel::Safe, 0.0, 4),
                calls: visual_calls,
            }),
            45.0,
        );

        let outcome = orchestrator.moderate(Path::new("clip.mp4")).unwrap();
        assert_eq!(outcome.message(), "Audio and Visual Safe");
        // Both verdict sources consume the orchestrator's probe result.
        assert_eq!(probe_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_rejection_message_reports_configured_cap() {
        let (prober, _) = FixedProber::new(info(25.0, true));
        let orchestrator = Orchestrator::with_parts(
            prober,
            Box::new(CountingAudio {
                verdict: AudioVerdict::NoAudio,
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            Box::new(CountingVisual {
                verdict: visual(SafetyLabel::Safe, 0.0, 0),
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            20.0,
        );

        match orchestrator.moderate(Path::new("clip.mp4")).unwrap() {
            ModerationOutcome::Rejected { message } => {
                assert!(message.contains("less than 20 seconds"), "{}", message);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_both_unsafe_scenario() {
        let (orchestrator, _, _) = orchestrator(
            info(15.0, true),
            AudioVerdict::Unsafe {
                scores: CategoryScores::from([("violence".to_string(), 0.93)]),
            },
            visual(SafetyLabel::Unsafe, 0.6, 12),
        );

        let outcome = orchestrator.moderate(Path::new("bad.mp4")).unwrap();
        assert_eq!(outcome.message(), "Audio and Visual Unsafe");
    }
}
