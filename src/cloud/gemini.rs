//! Gemini REST client (`POST /v1beta/models/{model}:generateContent`).
//!
//! Used only for intent classification. Low temperature and a small output
//! budget keep completions close to the single-label format the resolver
//! expects; the resolver still validates every completion.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::cloud::{status_error, CloudError, IntentModel};

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// REST client for the generative-model service.
pub struct GeminiModel {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiModel {
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        model: String,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url,
            model,
            api_key,
        }
    }

    fn url(&self, key: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={key}",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl IntentModel for GeminiModel {
    async fn classify(&self, prompt: &str) -> Result<String, CloudError> {
        let key = self.api_key.as_deref().ok_or(CloudError::NoCredentials)?;

        let body = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": {"maxOutputTokens": 100, "temperature": 0.1},
        });

        let response = self.client.post(self.url(key)).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let parsed = response.json::<GenerateContentResponse>().await?;
        let completion = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| CloudError::Decode("response carried no candidates".to_string()))?;

        debug!(completion = %completion.trim(), "model completion received");
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_candidate_first_part_shape() {
        let raw = r#"{"candidates":[
            {"content":{"parts":[{"text":"GREETING"},{"text":"extra"}]}},
            {"content":{"parts":[{"text":"UNKNOWN"}]}}
        ]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).expect("parse");
        let text = &parsed.candidates[0].content.as_ref().unwrap().parts[0].text;
        assert_eq!(text, "GREETING");
    }

    #[test]
    fn empty_candidates_deserialize() {
        let parsed: GenerateContentResponse = serde_json::from_str("{}").expect("parse");
        assert!(parsed.candidates.is_empty());
    }

    #[tokio::test]
    async fn demo_mode_fails_without_credentials() {
        let model = GeminiModel::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1".to_string(),
            "gemini-1.5-flash".to_string(),
            None,
        );
        let err = model.classify("prompt").await.expect_err("no key");
        assert!(matches!(err, CloudError::NoCredentials));
    }
}
