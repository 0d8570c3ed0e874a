//! Per-request voice pipeline: validate the upload, transcribe, resolve the
//! reply, synthesize audio, assemble the response.
//!
//! Control flow is strictly linear and nothing is retried. Every path out of
//! [`VoicePipeline::handle`] produces exactly one response object, and the
//! spooled upload is deleted on every path, including early exits.

use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::answers::{render_reply, AnswerStore};
use crate::cloud::{SpeechToText, TextToSpeech};
use crate::error::AppError;
use crate::intent::{IntentLabel, IntentResolver};
use crate::language::{detect, LanguageCode};

/// MIME types accepted for the uploaded clip (linear-PCM WAV only).
/// `audio/wave` is a WAV variant some browsers declare.
pub const ACCEPTED_MIME_TYPES: &[&str] = &["audio/wav", "audio/x-wav", "audio/wave"];

const TRANSCRIPTION_APOLOGY: &str = "Sorry, I couldn't process the audio. Please try again.";

/// One inbound upload, owned by the pipeline for the request's lifetime.
#[derive(Debug)]
pub struct UploadedAudio {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Outbound payload, constructed exactly once per request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceResponse {
    pub success: bool,
    pub transcript: String,
    pub reply: String,
    pub language: LanguageCode,
    pub intent: IntentLabel,
    pub has_audio: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_content: Option<String>,
    pub session_id: String,
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
}

/// Deletes the spooled upload when dropped. Transcription completion removes
/// the file eagerly; the drop path only covers early exits.
struct UploadGuard {
    path: PathBuf,
    armed: bool,
}

impl UploadGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    /// Removes the file now, best-effort, and disarms the drop path.
    async fn remove(&mut self) {
        self.armed = false;
        if let Err(err) = tokio::fs::remove_file(&self.path).await {
            warn!(path = %self.path.display(), error = %err, "failed to delete upload");
        }
    }
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Request orchestrator. Shared across requests; all fields are read-only.
pub struct VoicePipeline {
    stt: Arc<dyn SpeechToText>,
    resolver: Arc<dyn IntentResolver>,
    answers: AnswerStore,
    tts: Arc<dyn TextToSpeech>,
    upload_dir: PathBuf,
    max_upload_bytes: u64,
}

impl VoicePipeline {
    pub fn new(
        stt: Arc<dyn SpeechToText>,
        resolver: Arc<dyn IntentResolver>,
        answers: AnswerStore,
        tts: Arc<dyn TextToSpeech>,
        upload_dir: impl Into<PathBuf>,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            stt,
            resolver,
            answers,
            tts,
            upload_dir: upload_dir.into(),
            max_upload_bytes,
        }
    }

    /// Runs the full pipeline for one upload. `Err` is only the rejected-input
    /// exit; every post-validation outcome, including transcription failure,
    /// is a `VoiceResponse`.
    pub async fn handle(
        &self,
        upload: UploadedAudio,
        session_id: String,
    ) -> Result<VoiceResponse, AppError> {
        self.validate(&upload)?;

        let path = self
            .upload_dir
            .join(format!("{}.wav", Uuid::new_v4().simple()));
        // Guard exists before the write so a partial write is cleaned up too.
        let mut guard = UploadGuard::new(path.clone());
        tokio::fs::write(&path, &upload.bytes)
            .await
            .map_err(|err| AppError::internal(format!("failed to spool upload: {err}")))?;

        let transcribed = self.stt.transcribe(&path).await;
        // Cleanup is unconditional and happens here, not at request end.
        guard.remove().await;

        let transcription = match transcribed {
            Ok(t) => t,
            Err(err) => {
                warn!(session = %session_id, error = %err, "transcription failed");
                return Ok(self.failure_response(session_id));
            }
        };

        let language = detect(&transcription.transcript);
        let intent = self.resolver.resolve(&transcription.transcript).await;
        let reply = render_reply(&self.answers.get(intent, language).await);
        info!(
            session = %session_id,
            transcript = %transcription.transcript,
            language = %language,
            intent = %intent,
            "reply resolved"
        );

        // Synthesis failure degrades to a text-only response.
        let audio_content = match self.tts.synthesize(&reply, language).await {
            Ok(bytes) => Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
            Err(err) => {
                warn!(session = %session_id, error = %err, "synthesis failed; text-only reply");
                None
            }
        };

        Ok(VoiceResponse {
            success: true,
            transcript: transcription.transcript,
            reply,
            language,
            intent,
            has_audio: audio_content.is_some(),
            audio_content,
            session_id,
            confidence: transcription.confidence,
            timestamp: Utc::now(),
        })
    }

    fn validate(&self, upload: &UploadedAudio) -> Result<(), AppError> {
        if upload.bytes.is_empty() {
            return Err(AppError::invalid_upload("no audio file"));
        }
        if !ACCEPTED_MIME_TYPES.contains(&upload.mime.as_str()) {
            return Err(AppError::invalid_upload(format!(
                "unsupported content type {:?}; only WAV audio is accepted",
                upload.mime
            )));
        }
        if upload.bytes.len() as u64 > self.max_upload_bytes {
            return Err(AppError::payload_too_large(format!(
                "audio exceeds the {} byte limit",
                self.max_upload_bytes
            )));
        }
        Ok(())
    }

    fn failure_response(&self, session_id: String) -> VoiceResponse {
        VoiceResponse {
            success: false,
            transcript: String::new(),
            reply: TRANSCRIPTION_APOLOGY.to_string(),
            language: LanguageCode::En,
            intent: IntentLabel::Unknown,
            has_audio: false,
            audio_content: None,
            session_id,
            confidence: 0.0,
            timestamp: Utc::now(),
        }
    }
}
