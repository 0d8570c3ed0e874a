//! Google Cloud Text-to-Speech v1 REST client (`POST /v1/text:synthesize`).

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cloud::{status_error, CloudError, TextToSpeech};
use crate::language::LanguageCode;

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection {
    language_code: &'static str,
    name: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelection,
    audio_config: AudioConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    #[serde(default)]
    audio_content: String,
}

/// REST client for the synthesis service.
pub struct GoogleTts {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GoogleTts {
    pub fn new(client: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn url(&self, key: &str) -> String {
        format!(
            "{}/v1/text:synthesize?key={key}",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl TextToSpeech for GoogleTts {
    /// One synthesis call requesting MP3 output with the per-language voice
    /// profile. Failures are reported, never retried.
    async fn synthesize(
        &self,
        text: &str,
        language: LanguageCode,
    ) -> Result<Vec<u8>, CloudError> {
        let key = self.api_key.as_deref().ok_or(CloudError::NoCredentials)?;
        let (language_code, name) = language.voice_profile();

        debug!(language = %language, voice = name, "requesting synthesis");
        let body = SynthesizeRequest {
            input: SynthesisInput { text },
            voice: VoiceSelection {
                language_code,
                name,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
            },
        };

        let response = self.client.post(self.url(key)).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let parsed = response.json::<SynthesizeResponse>().await?;
        base64::engine::general_purpose::STANDARD
            .decode(parsed.audio_content.as_bytes())
            .map_err(|err| CloudError::Decode(format!("invalid audioContent base64: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_mode_fails_without_credentials() {
        let tts = GoogleTts::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1".to_string(),
            None,
        );
        let err = tts
            .synthesize("hello", LanguageCode::En)
            .await
            .expect_err("no key");
        assert!(matches!(err, CloudError::NoCredentials));
    }

    #[test]
    fn request_body_uses_camel_case_wire_names() {
        let body = SynthesizeRequest {
            input: SynthesisInput { text: "hello" },
            voice: VoiceSelection {
                language_code: "hi-IN",
                name: "hi-IN-Standard-A",
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
            },
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["voice"]["languageCode"], "hi-IN");
        assert_eq!(json["audioConfig"]["audioEncoding"], "MP3");
    }
}
