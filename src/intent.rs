//! Intent resolution for transcripts.
//!
//! Two interchangeable strategies sit behind the [`IntentResolver`] trait:
//! a Gemini-backed classifier constrained to the closed label set, and a
//! keyword matcher. Both are total; the worst outcome is [`IntentLabel::Unknown`],
//! which always has a configured reply.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cloud::IntentModel;

/// Closed set of intents the service answers. `Unknown` is the required
/// fallback member.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize)]
pub enum IntentLabel {
    #[serde(rename = "GREETING")]
    Greeting,
    #[serde(rename = "SCHOLARSHIP_STATUS")]
    ScholarshipStatus,
    #[serde(rename = "RATION_CARD")]
    RationCard,
    #[serde(rename = "AADHAAR_UPDATE")]
    AadhaarUpdate,
    #[serde(rename = "PENSION_STATUS")]
    PensionStatus,
    #[serde(rename = "TIME_QUERY")]
    TimeQuery,
    #[default]
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl IntentLabel {
    /// Returns the wire identifier used in answer documents and responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Greeting => "GREETING",
            Self::ScholarshipStatus => "SCHOLARSHIP_STATUS",
            Self::RationCard => "RATION_CARD",
            Self::AadhaarUpdate => "AADHAAR_UPDATE",
            Self::PensionStatus => "PENSION_STATUS",
            Self::TimeQuery => "TIME_QUERY",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Parses a wire identifier, coercing anything unrecognized to `Unknown`.
    ///
    /// Matching is exact after trimming: lowercase variants, prose, and empty
    /// strings all clamp to `Unknown`.
    pub fn parse_or_unknown(raw: &str) -> Self {
        match raw.trim() {
            "GREETING" => Self::Greeting,
            "SCHOLARSHIP_STATUS" => Self::ScholarshipStatus,
            "RATION_CARD" => Self::RationCard,
            "AADHAAR_UPDATE" => Self::AadhaarUpdate,
            "PENSION_STATUS" => Self::PensionStatus,
            "TIME_QUERY" => Self::TimeQuery,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for IntentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy contract for mapping free text to an intent label.
#[async_trait]
pub trait IntentResolver: Send + Sync {
    /// Resolves an intent. Total; never fails the request.
    async fn resolve(&self, text: &str) -> IntentLabel;
}

/// Per-intent keyword lists in resolution priority order. First match wins.
const KEYWORD_TABLE: &[(IntentLabel, &[&str])] = &[
    (
        IntentLabel::TimeQuery,
        &["time", "நேரம்", "समय", "neram", "samay"],
    ),
    (
        IntentLabel::ScholarshipStatus,
        &[
            "scholarship",
            "உதவித்தொகை",
            "छात्रवृत्ति",
            "udhavithogai",
            "chhatravritti",
        ],
    ),
    (
        IntentLabel::RationCard,
        &["ration", "ரேஷன்", "राशन", "resan", "rashan"],
    ),
    (
        IntentLabel::AadhaarUpdate,
        &["aadhaar", "aadhar", "ஆதார்", "आधार", "athar"],
    ),
    (
        IntentLabel::PensionStatus,
        &["pension", "ஓய்வூதியம்", "पेंशन", "oyyuthiyam"],
    ),
    (
        IntentLabel::Greeting,
        &["hello", "hi", "vanakkam", "namaste", "வணக்கம்", "नमस्ते"],
    ),
];

/// Keyword-only strategy: case-insensitive substring matching in fixed
/// priority order.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordResolver;

impl KeywordResolver {
    /// Synchronous resolution, usable directly as the model fallback.
    pub fn classify(text: &str) -> IntentLabel {
        let lower = text.to_lowercase();
        for (label, keywords) in KEYWORD_TABLE {
            if keywords.iter().any(|w| lower.contains(w)) {
                return *label;
            }
        }
        IntentLabel::Unknown
    }
}

#[async_trait]
impl IntentResolver for KeywordResolver {
    async fn resolve(&self, text: &str) -> IntentLabel {
        Self::classify(text)
    }
}

/// Model-backed strategy: one Gemini call validated against the closed label
/// set, with keyword matching as the failure fallback.
pub struct GeminiResolver {
    model: Arc<dyn IntentModel>,
}

impl GeminiResolver {
    pub fn new(model: Arc<dyn IntentModel>) -> Self {
        Self { model }
    }

    /// Builds the strict classification prompt enumerating every valid label.
    fn prompt(transcript: &str) -> String {
        format!(
            "You are an intent classifier for a verified public information assistant.\n\
             \n\
             USER QUERY: \"{transcript}\"\n\
             \n\
             Available intents (ONLY return one of these):\n\
             - GREETING: user is saying hello (e.g. \"hello\", \"hi\", \"namaste\", \"vanakkam\")\n\
             - SCHOLARSHIP_STATUS: user is asking about scholarships (e.g. \"scholarship status\", \"education aid\")\n\
             - RATION_CARD: user is asking about ration cards (e.g. \"ration card\", \"food card\", \"apply ration\")\n\
             - AADHAAR_UPDATE: user is asking about Aadhaar (e.g. \"aadhaar update\", \"uidai\", \"aadhaar card\")\n\
             - PENSION_STATUS: user is asking about pensions (e.g. \"pension\", \"old age pension\", \"retirement fund\")\n\
             - TIME_QUERY: user is asking for the current time (e.g. \"what is the time\", \"samay\", \"neram\")\n\
             - UNKNOWN: the query does not clearly match any intent above\n\
             \n\
             RULES (STRICT):\n\
             1. Return ONLY the intent ID (e.g. \"SCHOLARSHIP_STATUS\")\n\
             2. NO explanations\n\
             3. NO additional text\n\
             4. If unsure, return \"UNKNOWN\"\n\
             5. Be strict: only match if the query clearly relates to the intent\n\
             \n\
             RESPONSE FORMAT: just the intent ID"
        )
    }
}

#[async_trait]
impl IntentResolver for GeminiResolver {
    async fn resolve(&self, text: &str) -> IntentLabel {
        match self.model.classify(&Self::prompt(text)).await {
            Ok(completion) => {
                let label = IntentLabel::parse_or_unknown(&completion);
                if label == IntentLabel::Unknown && completion.trim() != "UNKNOWN" {
                    warn!(completion = %completion.trim(), "model returned invalid intent");
                }
                label
            }
            Err(err) => {
                warn!(error = %err, "intent model call failed; using keyword fallback");
                let label = KeywordResolver::classify(text);
                debug!(intent = %label, "keyword fallback resolved");
                label
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::CloudError;

    struct FixedModel(Result<&'static str, ()>);

    #[async_trait]
    impl IntentModel for FixedModel {
        async fn classify(&self, _prompt: &str) -> Result<String, CloudError> {
            self.0
                .map(ToOwned::to_owned)
                .map_err(|()| CloudError::Decode("boom".to_string()))
        }
    }

    #[test]
    fn parse_accepts_exact_wire_ids_only() {
        assert_eq!(
            IntentLabel::parse_or_unknown("SCHOLARSHIP_STATUS"),
            IntentLabel::ScholarshipStatus
        );
        assert_eq!(
            IntentLabel::parse_or_unknown("  TIME_QUERY \n"),
            IntentLabel::TimeQuery
        );
        assert_eq!(IntentLabel::parse_or_unknown(""), IntentLabel::Unknown);
        assert_eq!(
            IntentLabel::parse_or_unknown("greeting"),
            IntentLabel::Unknown
        );
        assert_eq!(
            IntentLabel::parse_or_unknown("The intent is GREETING."),
            IntentLabel::Unknown
        );
    }

    #[test]
    fn keyword_priority_order_is_fixed() {
        // Contains both a time and a greeting keyword; time is checked first.
        assert_eq!(
            KeywordResolver::classify("hello what is the time"),
            IntentLabel::TimeQuery
        );
        assert_eq!(
            KeywordResolver::classify("ration card status"),
            IntentLabel::RationCard
        );
        assert_eq!(
            KeywordResolver::classify("vanakkam"),
            IntentLabel::Greeting
        );
    }

    #[test]
    fn keyword_matches_native_script() {
        assert_eq!(
            KeywordResolver::classify("ஓய்வூதியம் நிலை"),
            IntentLabel::PensionStatus
        );
        assert_eq!(
            KeywordResolver::classify("आधार अपडेट"),
            IntentLabel::AadhaarUpdate
        );
    }

    #[test]
    fn empty_transcript_resolves_unknown() {
        assert_eq!(KeywordResolver::classify(""), IntentLabel::Unknown);
        assert_eq!(KeywordResolver::classify("   "), IntentLabel::Unknown);
    }

    #[tokio::test]
    async fn gemini_resolver_accepts_valid_label() {
        let resolver = GeminiResolver::new(Arc::new(FixedModel(Ok("PENSION_STATUS"))));
        assert_eq!(resolver.resolve("anything").await, IntentLabel::PensionStatus);
    }

    #[tokio::test]
    async fn gemini_resolver_clamps_malformed_output() {
        let resolver = GeminiResolver::new(Arc::new(FixedModel(Ok(
            "Sure! This looks like a greeting to me.",
        ))));
        assert_eq!(resolver.resolve("hello").await, IntentLabel::Unknown);
    }

    #[tokio::test]
    async fn gemini_resolver_falls_back_to_keywords_on_error() {
        let resolver = GeminiResolver::new(Arc::new(FixedModel(Err(()))));
        assert_eq!(
            resolver.resolve("scholarship status please").await,
            IntentLabel::ScholarshipStatus
        );
    }
}
