//! Verbal moderation pipeline
//!
//! Turns a media file into an audio verdict: extract the track,
//! transcribe it, translate the transcript to the pivot language and run
//! it through text moderation. The whole chain is opaque to the
//! orchestrator behind `AudioVerdictSource`.

use std::path::Path;

use crate::constants;
use crate::logic::error::ModerationError;
use crate::logic::media::{extract, MediaInfo, RequestWorkspace};
use crate::logic::verdict::AudioVerdict;

use super::collaborators::{SpeechToText, TextModerationScorer, Transcript, Translator};

/// Supplies the audio verdict for one piece of media. The caller
/// supplies the already-probed container metadata.
pub trait AudioVerdictSource: Send + Sync {
    fn audio_verdict(
        &self,
        media: &Path,
        info: &MediaInfo,
        workspace: &RequestWorkspace,
    ) -> Result<AudioVerdict, ModerationError>;
}

/// Transcribe -> translate -> text-moderate.
pub struct VerbalModerationPipeline {
    transcriber: Box<dyn SpeechToText>,
    translator: Box<dyn Translator>,
    scorer: Box<dyn TextModerationScorer>,
    pivot_language: String,
}

impl VerbalModerationPipeline {
    pub fn new(
        transcriber: Box<dyn SpeechToText>,
        translator: Box<dyn Translator>,
        scorer: Box<dyn TextModerationScorer>,
    ) -> Self {
        Self {
            transcriber,
            translator,
            scorer,
            pivot_language: constants::PIVOT_LANGUAGE.to_string(),
        }
    }

    /// Build the default hosted-service pipeline from the environment.
    pub fn from_env() -> Result<Self, ModerationError> {
        Ok(Self::new(
            Box::new(super::WhisperTranscriptionClient::from_env()?),
            Box::new(super::HttpTranslationClient::from_env()?),
            Box::new(super::OpenAiModerationClient::from_env()?),
        ))
    }

    /// Score an already-extracted audio file.
    pub fn moderate_audio_file(&self, audio: &Path) -> Result<AudioVerdict, ModerationError> {
        let transcript = self.transcriber.transcribe(audio)?;
        self.verdict_for_transcript(transcript)
    }

    fn verdict_for_transcript(
        &self,
        transcript: Transcript,
    ) -> Result<AudioVerdict, ModerationError> {
        if transcript.text.trim().is_empty() {
            // Audio track with nothing verbal to score.
            log::info!("no text found in the audio - treating audio as safe");
            return Ok(AudioVerdict::Safe {
                scores: Default::default(),
            });
        }

        log::debug!(
            "transcript ({} chars, language {:?})",
            transcript.text.len(),
            transcript.language
        );

        let translated = self
            .translator
            .translate(&transcript.text, &self.pivot_language)?;
        let moderation = self.scorer.score(&translated)?;

        if moderation.flagged {
            log::info!("verbal verdict: Unsafe");
            Ok(AudioVerdict::Unsafe {
                scores: moderation.category_scores,
            })
        } else {
            log::info!("verbal verdict: Safe");
            Ok(AudioVerdict::Safe {
                scores: moderation.category_scores,
            })
        }
    }
}

impl AudioVerdictSource for VerbalModerationPipeline {
    fn audio_verdict(
        &self,
        media: &Path,
        info: &MediaInfo,
        workspace: &RequestWorkspace,
    ) -> Result<AudioVerdict, ModerationError> {
        if !info.has_audio {
            log::info!("{} has no audio track", media.display());
            return Ok(AudioVerdict::NoAudio);
        }

        let audio_path = workspace.audio_path();
        extract::extract_audio_track(media, &audio_path)?;
        self.moderate_audio_file(&audio_path)
    }
}
