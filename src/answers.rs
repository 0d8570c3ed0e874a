//! Two-tier answer lookup: remote document store first, bundled local table
//! as the degraded tier.
//!
//! Lookup is total. Missing documents, missing languages, and remote
//! failures all narrow to a defined string; the caller never sees an error.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::cloud::AnswerDocs;
use crate::error::AppError;
use crate::intent::IntentLabel;
use crate::language::LanguageCode;

const GENERIC_APOLOGY: &str = "Sorry, I cannot retrieve the information at the moment.";

/// One entry of the bundled answers file.
#[derive(Debug, Deserialize)]
struct LocalIntent {
    id: String,
    answers: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct LocalAnswersFile {
    intents: Vec<LocalIntent>,
}

/// Read-only answer store built once at startup. The remote tier is `None`
/// when the document store was not configured; per-call remote failures fall
/// through to the local table.
pub struct AnswerStore {
    remote: Option<Arc<dyn AnswerDocs>>,
    local: HashMap<String, HashMap<String, String>>,
}

impl AnswerStore {
    /// Loads the local table eagerly and attaches the optional remote tier.
    /// Failing to read the local file is a startup error: it is the last
    /// line of defense and must exist.
    pub fn new(answers_path: &str, remote: Option<Arc<dyn AnswerDocs>>) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(answers_path).map_err(|err| {
            AppError::internal(format!("failed to read answers file {answers_path}: {err}"))
        })?;
        let parsed: LocalAnswersFile = serde_json::from_str(&raw).map_err(|err| {
            AppError::internal(format!("invalid answers file {answers_path}: {err}"))
        })?;

        let local: HashMap<_, _> = parsed
            .intents
            .into_iter()
            .map(|intent| (intent.id, intent.answers))
            .collect();

        if remote.is_none() {
            warn!("document store not configured; serving local answers only");
        }
        info!(intents = local.len(), path = answers_path, "answer table loaded");

        Ok(Self { remote, local })
    }

    /// Builds a store directly from an in-memory table. Test seam.
    #[cfg(test)]
    pub fn from_table(
        local: HashMap<String, HashMap<String, String>>,
        remote: Option<Arc<dyn AnswerDocs>>,
    ) -> Self {
        Self { remote, local }
    }

    /// Resolves the answer for an intent/language pair. Total; never errors.
    ///
    /// Order: remote document (requested language, then `en`), local table
    /// (same ordering), generic not-available message. A remote call that
    /// fails outright narrows to the generic apology; a document that simply
    /// does not exist falls through to the local table.
    pub async fn get(&self, intent: IntentLabel, language: LanguageCode) -> String {
        let intent_id = intent.as_str();

        if let Some(remote) = &self.remote {
            match remote.fetch(intent_id).await {
                Ok(Some(answers)) => {
                    if let Some(text) = pick_language(&answers, language) {
                        return text;
                    }
                    // Document exists but has no usable language field.
                    return not_available(intent_id);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(intent = intent_id, error = %err, "remote answer lookup failed");
                    return GENERIC_APOLOGY.to_string();
                }
            }
        }

        match self.local.get(intent_id) {
            Some(answers) => {
                pick_language(answers, language).unwrap_or_else(|| not_available(intent_id))
            }
            None => not_available(intent_id),
        }
    }
}

fn pick_language(answers: &HashMap<String, String>, language: LanguageCode) -> Option<String> {
    answers
        .get(language.as_str())
        .or_else(|| answers.get(LanguageCode::En.as_str()))
        .cloned()
}

fn not_available(intent_id: &str) -> String {
    format!("Information for {intent_id} is not available.")
}

/// Expands the `{time}` placeholder with the current wall-clock time.
/// Answer strings are otherwise returned verbatim.
pub fn render_reply(text: &str) -> String {
    if !text.contains("{time}") {
        return text.to_string();
    }
    let now = chrono::Local::now().format("%H:%M").to_string();
    text.replace("{time}", &now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::cloud::CloudError;

    fn table() -> HashMap<String, HashMap<String, String>> {
        let mut greeting = HashMap::new();
        greeting.insert("en".to_string(), "Hello! I am BharatVoice.".to_string());
        greeting.insert("hi".to_string(), "नमस्ते! मैं भारतवॉयस हूं।".to_string());

        let mut pension = HashMap::new();
        pension.insert("en".to_string(), "For pension, contact your bank.".to_string());

        let mut out = HashMap::new();
        out.insert("GREETING".to_string(), greeting);
        out.insert("PENSION_STATUS".to_string(), pension);
        out
    }

    struct FailingDocs {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AnswerDocs for FailingDocs {
        async fn fetch(
            &self,
            _intent_id: &str,
        ) -> Result<Option<HashMap<String, String>>, CloudError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(CloudError::Decode("store offline".to_string()))
        }
    }

    struct RemoteDocs;

    #[async_trait]
    impl AnswerDocs for RemoteDocs {
        async fn fetch(
            &self,
            intent_id: &str,
        ) -> Result<Option<HashMap<String, String>>, CloudError> {
            if intent_id == "GREETING" {
                let mut answers = HashMap::new();
                answers.insert("en".to_string(), "Hello from the store!".to_string());
                Ok(Some(answers))
            } else {
                Ok(None)
            }
        }
    }

    #[tokio::test]
    async fn remote_document_wins_when_present() {
        let store = AnswerStore::from_table(table(), Some(Arc::new(RemoteDocs)));
        assert_eq!(
            store.get(IntentLabel::Greeting, LanguageCode::En).await,
            "Hello from the store!"
        );
    }

    #[tokio::test]
    async fn missing_remote_document_falls_back_to_local() {
        let store = AnswerStore::from_table(table(), Some(Arc::new(RemoteDocs)));
        assert_eq!(
            store
                .get(IntentLabel::PensionStatus, LanguageCode::En)
                .await,
            "For pension, contact your bank."
        );
    }

    #[tokio::test]
    async fn remote_failure_narrows_to_apology_and_never_raises() {
        let docs = Arc::new(FailingDocs {
            calls: AtomicUsize::new(0),
        });
        let store = AnswerStore::from_table(table(), Some(docs.clone()));
        assert_eq!(
            store.get(IntentLabel::Greeting, LanguageCode::Hi).await,
            GENERIC_APOLOGY
        );
        assert_eq!(docs.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unconfigured_remote_tier_serves_local_answers() {
        let store = AnswerStore::from_table(table(), None);
        assert_eq!(
            store.get(IntentLabel::Greeting, LanguageCode::Hi).await,
            "नमस्ते! मैं भारतवॉयस हूं।"
        );
    }

    #[tokio::test]
    async fn missing_language_falls_back_to_english() {
        let store = AnswerStore::from_table(table(), None);
        assert_eq!(
            store
                .get(IntentLabel::PensionStatus, LanguageCode::Ta)
                .await,
            "For pension, contact your bank."
        );
    }

    #[tokio::test]
    async fn unknown_intent_yields_not_available_message() {
        let store = AnswerStore::from_table(table(), None);
        assert_eq!(
            store.get(IntentLabel::RationCard, LanguageCode::En).await,
            "Information for RATION_CARD is not available."
        );
    }

    #[tokio::test]
    async fn lookup_is_idempotent() {
        let store = AnswerStore::from_table(table(), None);
        let first = store.get(IntentLabel::Greeting, LanguageCode::En).await;
        let second = store.get(IntentLabel::Greeting, LanguageCode::En).await;
        assert_eq!(first, second);
    }

    #[test]
    fn render_substitutes_time_placeholder() {
        let rendered = render_reply("Current time is {time}");
        assert!(!rendered.contains("{time}"));
        assert!(rendered.starts_with("Current time is "));
    }

    #[test]
    fn render_leaves_plain_text_alone() {
        assert_eq!(render_reply("Hello!"), "Hello!");
    }
}
