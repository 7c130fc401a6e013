//! Collaborator service clients
//!
//! Speech-to-text, translation and text moderation are external services
//! the core does not reimplement. Each client carries an explicit request
//! timeout; a failed or timed-out call surfaces as a retryable
//! `ExternalService` error, never as a verdict.

use std::path::Path;

use serde::Deserialize;
use serde_json::json;

use crate::constants;
use crate::logic::error::ModerationError;
use crate::logic::verdict::CategoryScores;

/// Transcription output.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub text: String,
    /// Detected language, when the engine reports one.
    pub language: Option<String>,
}

/// Text moderation output.
#[derive(Debug, Clone)]
pub struct TextModeration {
    pub flagged: bool,
    pub category_scores: CategoryScores,
}

pub trait SpeechToText: Send + Sync {
    fn transcribe(&self, audio: &Path) -> Result<Transcript, ModerationError>;
}

pub trait Translator: Send + Sync {
    fn translate(&self, text: &str, target_language: &str) -> Result<String, ModerationError>;
}

pub trait TextModerationScorer: Send + Sync {
    fn score(&self, text: &str) -> Result<TextModeration, ModerationError>;
}

fn http_client(service: &str) -> Result<reqwest::blocking::Client, ModerationError> {
    reqwest::blocking::Client::builder()
        .timeout(constants::service_timeout())
        .build()
        .map_err(|e| ModerationError::service(service, format!("client build failed: {}", e)))
}

// ============================================================================
// TEXT MODERATION
// ============================================================================

/// Hosted moderation endpoint (OpenAI moderations API shape).
pub struct OpenAiModerationClient {
    http: reqwest::blocking::Client,
    url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ModerationResponse {
    results: Vec<ModerationResult>,
}

#[derive(Debug, Deserialize)]
struct ModerationResult {
    flagged: bool,
    #[serde(default)]
    category_scores: CategoryScores,
}

impl OpenAiModerationClient {
    pub fn from_env() -> Result<Self, ModerationError> {
        Ok(Self {
            http: http_client("moderation")?,
            url: constants::moderation_url(),
            api_key: constants::openai_api_key(),
        })
    }
}

impl TextModerationScorer for OpenAiModerationClient {
    fn score(&self, text: &str) -> Result<TextModeration, ModerationError> {
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "input": text,
                "model": "text-moderation-latest",
            }))
            .send()
            .map_err(|e| ModerationError::service("moderation", e.to_string()))?
            .error_for_status()
            .map_err(|e| ModerationError::service("moderation", e.to_string()))?;

        let body: ModerationResponse = response
            .json()
            .map_err(|e| ModerationError::service("moderation", format!("bad response: {}", e)))?;

        let result = body
            .results
            .into_iter()
            .next()
            .ok_or_else(|| ModerationError::service("moderation", "empty results"))?;

        Ok(TextModeration {
            flagged: result.flagged,
            category_scores: result.category_scores,
        })
    }
}

// ============================================================================
// SPEECH TO TEXT
// ============================================================================

/// Whisper-style transcription endpoint.
pub struct WhisperTranscriptionClient {
    http: reqwest::blocking::Client,
    url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
    language: Option<String>,
}

impl WhisperTranscriptionClient {
    pub fn from_env() -> Result<Self, ModerationError> {
        Ok(Self {
            http: http_client("transcription")?,
            url: constants::transcription_url(),
            api_key: constants::openai_api_key(),
        })
    }
}

impl SpeechToText for WhisperTranscriptionClient {
    fn transcribe(&self, audio: &Path) -> Result<Transcript, ModerationError> {
        log::info!("transcribing {}", audio.display());

        let form = reqwest::blocking::multipart::Form::new()
            .text("model", "whisper-1")
            .text("response_format", "verbose_json")
            .file("file", audio)
            .map_err(|e| {
                ModerationError::service("transcription", format!("cannot read audio: {}", e))
            })?;

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .map_err(|e| ModerationError::service("transcription", e.to_string()))?
            .error_for_status()
            .map_err(|e| ModerationError::service("transcription", e.to_string()))?;

        let body: TranscriptionResponse = response.json().map_err(|e| {
            ModerationError::service("transcription", format!("bad response: {}", e))
        })?;

        Ok(Transcript {
            text: body.text,
            language: body.language,
        })
    }
}

// ============================================================================
// TRANSLATION
// ============================================================================

/// LibreTranslate-compatible translation endpoint.
pub struct HttpTranslationClient {
    http: reqwest::blocking::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct TranslationResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

impl HttpTranslationClient {
    pub fn from_env() -> Result<Self, ModerationError> {
        Ok(Self {
            http: http_client("translation")?,
            url: constants::translation_url(),
        })
    }
}

impl Translator for HttpTranslationClient {
    fn translate(&self, text: &str, target_language: &str) -> Result<String, ModerationError> {
        log::info!("translating transcript to {}", target_language);

        let response = self
            .http
            .post(&self.url)
            .json(&json!({
                "q": text,
                "source": "auto",
                "target": target_language,
                "format": "text",
            }))
            .send()
            .map_err(|e| ModerationError::service("translation", e.to_string()))?
            .error_for_status()
            .map_err(|e| ModerationError::service("translation", e.to_string()))?;

        let body: TranslationResponse = response
            .json()
            .map_err(|e| ModerationError::service("translation", format!("bad response: {}", e)))?;

        Ok(body.translated_text)
    }
}
