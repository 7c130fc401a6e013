//! Audio moderation
//!
//! The audio verdict is derived from transcription, translation to a
//! pivot language and hosted text moderation - all external
//! collaborators behind narrow trait interfaces.

pub mod collaborators;
pub mod verbal;

pub use collaborators::{
    HttpTranslationClient, OpenAiModerationClient, SpeechToText, TextModeration,
    TextModerationScorer, Transcript, Translator, WhisperTranscriptionClient,
};
pub use verbal::{AudioVerdictSource, VerbalModerationPipeline};
