//! Google Cloud Speech-to-Text v1 REST client (`POST /v1/speech:recognize`).

use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cloud::{status_error, CloudError, SpeechToText, Transcription};
use crate::language::{STT_ALTERNATE_HINTS, STT_PRIMARY_HINT};

/// Uploads smaller than this cannot hold usable 16 kHz PCM; they fail fast
/// without a network call.
pub const MIN_AUDIO_BYTES: u64 = 1000;

const SAMPLE_RATE_HERTZ: u32 = 16_000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: &'static str,
    alternative_language_codes: &'static [&'static str],
    enable_automatic_punctuation: bool,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Serialize)]
struct RecognizeRequest {
    config: RecognitionConfig,
    audio: RecognitionAudio,
}

#[derive(Debug, Deserialize)]
struct RecognitionAlternative {
    #[serde(default)]
    transcript: String,
    #[serde(default)]
    confidence: f32,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<RecognitionAlternative>,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

/// REST client for the recognition service.
pub struct GoogleStt {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleStt {
    pub fn new(client: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn url(&self, key: &str) -> String {
        format!(
            "{}/v1/speech:recognize?key={key}",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl SpeechToText for GoogleStt {
    /// One recognition call with fixed linear-PCM parameters and multiple
    /// language hints. Takes the first alternative of the first result only;
    /// an empty result set is a successful empty transcript.
    async fn transcribe(&self, path: &Path) -> Result<Transcription, CloudError> {
        let size = tokio::fs::metadata(path).await?.len();
        if size < MIN_AUDIO_BYTES {
            return Err(CloudError::AudioTooSmall(size));
        }
        let key = self.api_key.as_deref().ok_or(CloudError::NoCredentials)?;

        debug!(bytes = size, "sending audio for recognition");
        let bytes = tokio::fs::read(path).await?;
        let body = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: SAMPLE_RATE_HERTZ,
                language_code: STT_PRIMARY_HINT,
                alternative_language_codes: STT_ALTERNATE_HINTS,
                enable_automatic_punctuation: true,
            },
            audio: RecognitionAudio {
                content: base64::engine::general_purpose::STANDARD.encode(&bytes),
            },
        };

        let response = self.client.post(self.url(key)).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let parsed = response.json::<RecognizeResponse>().await?;
        let Some(best) = parsed
            .results
            .first()
            .and_then(|result| result.alternatives.first())
        else {
            info!("no speech detected");
            return Ok(Transcription {
                transcript: String::new(),
                confidence: 0.0,
            });
        };

        let transcript = best.transcript.trim().to_string();
        info!(transcript = %transcript, confidence = best.confidence, "transcription complete");
        Ok(Transcription {
            transcript,
            confidence: best.confidence.clamp(0.0, 1.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_file(bytes: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("stt-test-{}.wav", uuid::Uuid::new_v4()));
        let mut f = std::fs::File::create(&path).expect("create temp file");
        f.write_all(bytes).expect("write temp file");
        path
    }

    #[tokio::test]
    async fn rejects_tiny_files_before_any_network_call() {
        // Unroutable base URL: a network attempt would surface as Http, not
        // AudioTooSmall.
        let stt = GoogleStt::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1".to_string(),
            Some("k".to_string()),
        );
        let path = temp_file(&[0u8; 100]);
        let err = stt.transcribe(&path).await.expect_err("too small");
        assert!(matches!(err, CloudError::AudioTooSmall(100)));
        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let stt = GoogleStt::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1".to_string(),
            Some("k".to_string()),
        );
        let err = stt
            .transcribe(Path::new("/nonexistent/clip.wav"))
            .await
            .expect_err("missing file");
        assert!(matches!(err, CloudError::Io(_)));
    }

    #[tokio::test]
    async fn demo_mode_fails_without_credentials() {
        let stt = GoogleStt::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1".to_string(),
            None,
        );
        let path = temp_file(&[0u8; 2048]);
        let err = stt.transcribe(&path).await.expect_err("no key");
        assert!(matches!(err, CloudError::NoCredentials));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn empty_results_deserialize() {
        let parsed: RecognizeResponse = serde_json::from_str("{}").expect("parse");
        assert!(parsed.results.is_empty());
    }

    #[test]
    fn first_alternative_of_first_result_shape() {
        let raw = r#"{"results":[{"alternatives":[
            {"transcript":" hello ","confidence":0.92},
            {"transcript":"yellow","confidence":0.41}
        ]},{"alternatives":[{"transcript":"ignored"}]}]}"#;
        let parsed: RecognizeResponse = serde_json::from_str(raw).expect("parse");
        let best = &parsed.results[0].alternatives[0];
        assert_eq!(best.transcript, " hello ");
        assert!((best.confidence - 0.92).abs() < f32::EPSILON);
    }
}
