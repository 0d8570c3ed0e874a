//! Contracts for the remote cloud collaborators.
//!
//! The pipeline depends on these traits instead of concrete REST clients,
//! which keeps request handling decoupled from Google Cloud specifics and
//! lets tests substitute mocks. Every implementation converts its failures
//! into [`CloudError`] at the component boundary; nothing here is retried.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::language::LanguageCode;

pub mod firestore;
pub mod gemini;
pub mod stt;
pub mod tts;

/// Failure of one remote call, caught at the owning component's boundary.
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned {code}: {message}")]
    Status { code: u16, message: String },
    #[error("unexpected response shape: {0}")]
    Decode(String),
    #[error("audio file too small ({0} bytes)")]
    AudioTooSmall(u64),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no API key configured")]
    NoCredentials,
}

/// Best transcript produced by one recognition call.
#[derive(Debug, Clone)]
pub struct Transcription {
    /// Transcript text. Empty means the call succeeded but no speech was
    /// detected, which is a valid outcome rather than an error.
    pub transcript: String,
    /// Confidence in `[0, 1]`, `0.0` when the service omits it.
    pub confidence: f32,
}

/// Speech-to-text contract.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribes the audio file at `path`. Does not delete or modify it;
    /// cleanup belongs to the pipeline.
    async fn transcribe(&self, path: &Path) -> Result<Transcription, CloudError>;
}

/// Text-to-speech contract. Returns encoded audio bytes.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    async fn synthesize(&self, text: &str, language: LanguageCode)
        -> Result<Vec<u8>, CloudError>;
}

/// Generative-model contract used for intent classification. The raw
/// completion must be validated by the caller.
#[async_trait]
pub trait IntentModel: Send + Sync {
    async fn classify(&self, prompt: &str) -> Result<String, CloudError>;
}

/// Document-store contract: intent id to per-language answer map.
/// `Ok(None)` means the document does not exist.
#[async_trait]
pub trait AnswerDocs: Send + Sync {
    async fn fetch(&self, intent_id: &str)
        -> Result<Option<HashMap<String, String>>, CloudError>;
}

/// Builds the shared HTTP client with the configured per-call timeout budget.
pub fn build_http_client(cfg: &AppConfig) -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(|err| AppError::internal(format!("failed to build HTTP client: {err}")))
}

/// Reads the service's error message out of a non-success response body,
/// falling back to the raw body when it is not the usual Google error shape.
pub(crate) async fn status_error(response: reqwest::Response) -> CloudError {
    let code = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(ToOwned::to_owned))
        .unwrap_or(body);
    CloudError::Status { code, message }
}
