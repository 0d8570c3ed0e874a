//! Firestore REST client for the `intents` collection.
//!
//! Each document holds an `answers` map field keyed by language code. The
//! REST representation wraps every value in a type tag
//! (`{"stringValue": ...}`), which is flattened here into a plain map.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::cloud::{status_error, AnswerDocs, CloudError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirestoreValue {
    string_value: Option<String>,
    map_value: Option<FirestoreMap>,
}

#[derive(Debug, Deserialize)]
struct FirestoreMap {
    #[serde(default)]
    fields: HashMap<String, FirestoreValue>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    #[serde(default)]
    fields: HashMap<String, FirestoreValue>,
}

/// REST client for the document store.
pub struct FirestoreDocs {
    client: reqwest::Client,
    base_url: String,
    project: String,
    api_key: Option<String>,
}

impl FirestoreDocs {
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        project: String,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url,
            project,
            api_key,
        }
    }

    fn url(&self, intent_id: &str, key: &str) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents/intents/{intent_id}?key={key}",
            self.base_url.trim_end_matches('/'),
            self.project
        )
    }
}

#[async_trait]
impl AnswerDocs for FirestoreDocs {
    async fn fetch(
        &self,
        intent_id: &str,
    ) -> Result<Option<HashMap<String, String>>, CloudError> {
        let key = self.api_key.as_deref().ok_or(CloudError::NoCredentials)?;

        let response = self.client.get(self.url(intent_id, key)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(intent = intent_id, "no answer document");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let doc = response.json::<FirestoreDocument>().await?;
        let answers = doc
            .fields
            .get("answers")
            .and_then(|v| v.map_value.as_ref())
            .ok_or_else(|| CloudError::Decode("document is missing answers map".to_string()))?;

        Ok(Some(
            answers
                .fields
                .iter()
                .filter_map(|(lang, value)| {
                    value.string_value.clone().map(|text| (lang.clone(), text))
                })
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattens_typed_answer_values() {
        let raw = r#"{"name":"projects/p/databases/(default)/documents/intents/GREETING",
            "fields":{"answers":{"mapValue":{"fields":{
                "en":{"stringValue":"Hello!"},
                "hi":{"stringValue":"नमस्ते!"},
                "count":{"integerValue":"2"}
            }}}}}"#;
        let doc: FirestoreDocument = serde_json::from_str(raw).expect("parse");
        let answers = doc.fields["answers"].map_value.as_ref().expect("map");
        assert_eq!(
            answers.fields["en"].string_value.as_deref(),
            Some("Hello!")
        );
        // Non-string values are dropped by the flattening filter.
        assert!(answers.fields["count"].string_value.is_none());
    }

    #[tokio::test]
    async fn demo_mode_fails_without_credentials() {
        let docs = FirestoreDocs::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1".to_string(),
            "demo".to_string(),
            None,
        );
        let err = docs.fetch("GREETING").await.expect_err("no key");
        assert!(matches!(err, CloudError::NoCredentials));
    }
}
