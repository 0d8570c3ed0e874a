//! Configuration loading from environment variables.
//!
//! Values are intentionally validated early so startup fails fast with
//! actionable errors. Cloud credentials are optional: without
//! `GOOGLE_API_KEY` the server still starts in demo mode and every remote
//! call degrades at its component boundary instead of crashing.

use crate::error::AppError;
use std::env;

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const MIN_UPLOAD_LIMIT_BYTES: u64 = 1024;
pub const MAX_UPLOAD_LIMIT_BYTES: u64 = 64 * 1024 * 1024;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Selected intent resolution strategy.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum IntentBackend {
    /// Gemini classification with keyword fallback.
    Gemini,
    /// Keyword matching only, no model call.
    Keyword,
}

/// Runtime configuration for the HTTP server and cloud collaborators.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host interface to bind, for example `127.0.0.1`.
    pub host: String,
    /// TCP port to bind.
    pub port: u16,
    /// API key for Google Cloud REST endpoints. `None` means demo mode.
    pub google_api_key: Option<String>,
    /// Firestore project holding the `intents` collection. `None` disables
    /// the remote answer tier.
    pub firestore_project: Option<String>,
    /// Selected intent resolution strategy.
    pub intent_backend: IntentBackend,
    /// Gemini model identifier used for intent classification.
    pub gemini_model: String,
    /// Path to the local fallback answers file.
    pub answers_path: String,
    /// Directory where uploads are spooled before transcription.
    pub upload_dir: String,
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: u64,
    /// Per-cloud-call timeout budget in seconds.
    pub request_timeout_secs: u64,
    /// Base URL of the speech-to-text service.
    pub stt_base_url: String,
    /// Base URL of the text-to-speech service.
    pub tts_base_url: String,
    /// Base URL of the generative-model service.
    pub gemini_base_url: String,
    /// Base URL of the document store.
    pub firestore_base_url: String,
}

impl AppConfig {
    /// Builds configuration from environment variables.
    ///
    /// Variables:
    /// - `HOST` (default `127.0.0.1`)
    /// - `PORT` (default `3000`)
    /// - `GOOGLE_API_KEY` (optional; absent enables demo mode)
    /// - `FIRESTORE_PROJECT` (optional; absent disables remote answers)
    /// - `INTENT_BACKEND` (`gemini` or `keyword`, default `gemini`)
    /// - `GEMINI_MODEL` (default `gemini-1.5-flash`)
    /// - `ANSWERS_PATH` (default `data/intents.json`)
    /// - `UPLOAD_DIR` (default `uploads`)
    /// - `MAX_UPLOAD_BYTES` (default 10 MiB)
    /// - `REQUEST_TIMEOUT_SECS` (default `30`)
    /// - `STT_BASE_URL`, `TTS_BASE_URL`, `GEMINI_BASE_URL`,
    ///   `FIRESTORE_BASE_URL` (default public Google endpoints)
    pub fn from_env() -> Result<Self, AppError> {
        let host = env_str("HOST", "127.0.0.1");
        let port = env_u16("PORT", 3000)?;

        let intent_backend = match env_str("INTENT_BACKEND", "gemini").as_str() {
            "gemini" => IntentBackend::Gemini,
            "keyword" => IntentBackend::Keyword,
            other => {
                return Err(AppError::internal(format!(
                    "invalid INTENT_BACKEND={other:?}; expected gemini or keyword"
                )));
            }
        };

        let max_upload_bytes = env_u64_bounded(
            "MAX_UPLOAD_BYTES",
            DEFAULT_MAX_UPLOAD_BYTES,
            MIN_UPLOAD_LIMIT_BYTES,
            MAX_UPLOAD_LIMIT_BYTES,
        )?;
        let request_timeout_secs = env_u64_bounded(
            "REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
            1,
            MAX_REQUEST_TIMEOUT_SECS,
        )?;

        Ok(Self {
            host,
            port,
            google_api_key: env_opt("GOOGLE_API_KEY"),
            firestore_project: env_opt("FIRESTORE_PROJECT"),
            intent_backend,
            gemini_model: env_str("GEMINI_MODEL", "gemini-1.5-flash"),
            answers_path: env_str("ANSWERS_PATH", "data/intents.json"),
            upload_dir: env_str("UPLOAD_DIR", "uploads"),
            max_upload_bytes,
            request_timeout_secs,
            stt_base_url: env_str("STT_BASE_URL", "https://speech.googleapis.com"),
            tts_base_url: env_str("TTS_BASE_URL", "https://texttospeech.googleapis.com"),
            gemini_base_url: env_str(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com",
            ),
            firestore_base_url: env_str("FIRESTORE_BASE_URL", "https://firestore.googleapis.com"),
        })
    }
}

fn env_str(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                default.to_string()
            } else {
                trimmed.to_string()
            }
        }
        Err(_) => default.to_string(),
    }
}

fn env_opt(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Err(_) => None,
    }
}

fn env_u16(name: &str, default: u16) -> Result<u16, AppError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let parsed = raw.trim().parse::<u16>().map_err(|_| {
        AppError::internal(format!("invalid {name}={raw:?}; expected integer 1-65535"))
    })?;
    if parsed == 0 {
        return Err(AppError::internal(format!(
            "invalid {name}={raw:?}; expected > 0"
        )));
    }
    Ok(parsed)
}

fn env_u64_bounded(name: &str, default: u64, min: u64, max: u64) -> Result<u64, AppError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    parse_u64_bounded(name, &raw, min, max)
}

fn parse_u64_bounded(name: &str, raw: &str, min: u64, max: u64) -> Result<u64, AppError> {
    let trimmed = raw.trim();
    let parsed = trimmed.parse::<u64>().map_err(|_| {
        AppError::internal(format!(
            "invalid {name}={raw:?}; expected integer in range [{min}, {max}]"
        ))
    })?;
    if parsed < min || parsed > max {
        return Err(AppError::internal(format!(
            "invalid {name}={raw:?}; expected integer in range [{min}, {max}]"
        )));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::parse_u64_bounded;

    #[test]
    fn parse_u64_bounded_accepts_in_range_values() {
        assert_eq!(
            parse_u64_bounded("MAX_UPLOAD_BYTES", "1024", 1024, 4096).unwrap(),
            1024
        );
        assert_eq!(
            parse_u64_bounded("MAX_UPLOAD_BYTES", "4096", 1024, 4096).unwrap(),
            4096
        );
    }

    #[test]
    fn parse_u64_bounded_rejects_non_numeric_value() {
        assert!(parse_u64_bounded("MAX_UPLOAD_BYTES", "lots", 1, 8).is_err());
    }

    #[test]
    fn parse_u64_bounded_rejects_out_of_range_values() {
        assert!(parse_u64_bounded("REQUEST_TIMEOUT_SECS", "0", 1, 300).is_err());
        assert!(parse_u64_bounded("REQUEST_TIMEOUT_SECS", "301", 1, 300).is_err());
    }
}
