//! Language classification for transcripts.
//!
//! Script-range checks run before lexical heuristics because a native-script
//! character is unambiguous while transliteration keywords are substring
//! matches and can false-positive inside unrelated words. That imprecision is
//! an accepted trade-off of the keyword tier, not something to repair with
//! word-boundary logic.

use serde::Serialize;

/// Closed set of languages the service answers in. Not extensible at runtime.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize)]
pub enum LanguageCode {
    #[default]
    #[serde(rename = "en")]
    En,
    #[serde(rename = "hi")]
    Hi,
    #[serde(rename = "ta")]
    Ta,
}

impl LanguageCode {
    /// Returns the two-letter code used in answer maps and responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Ta => "ta",
        }
    }

    /// Returns the BCP-47 code and voice name for speech synthesis.
    pub fn voice_profile(self) -> (&'static str, &'static str) {
        match self {
            Self::En => ("en-IN", "en-IN-Standard-A"),
            Self::Hi => ("hi-IN", "hi-IN-Standard-A"),
            Self::Ta => ("ta-IN", "ta-IN-Standard-A"),
        }
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary recognition hint sent to the speech service.
pub const STT_PRIMARY_HINT: &str = "en-IN";
/// Alternate hints the speech service disambiguates between on its own.
pub const STT_ALTERNATE_HINTS: &[&str] = &["ta-IN", "hi-IN"];

/// Tamil transliterations plus native-script forms of supported topics.
const TAMIL_KEYWORDS: &[&str] = &[
    "vanakkam",
    "vannakkam",
    "vanakam",
    "neram",
    "enna",
    "udhavi",
    "thogai",
    "udhavithogai",
    "resan",
    "reshan",
    "aathar",
    "athar",
    "oyyuthiyam",
    "oyuthiyam",
    "நேரம்",
    "உதவித்தொகை",
    "ரேஷன்",
    "ஆதார்",
    "ஓய்வூதியம்",
];

/// Hindi transliterations plus native-script forms of supported topics.
const HINDI_KEYWORDS: &[&str] = &[
    "namaste",
    "namaskar",
    "samay",
    "समय",
    "chhatravritti",
    "chhatra",
    "छात्रवृत्ति",
    "rashan",
    "राशन",
    "aadhar",
    "आधार",
    "pension",
    "पेंशन",
];

fn is_tamil_script(c: char) -> bool {
    ('\u{0B80}'..='\u{0BFF}').contains(&c)
}

fn is_devanagari_script(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

/// Classifies free text into a language code. Pure and total.
///
/// Priority order, first match wins: empty input, Tamil script, Devanagari
/// script, Tamil keywords, Hindi keywords, English default.
pub fn detect(text: &str) -> LanguageCode {
    if text.trim().is_empty() {
        return LanguageCode::En;
    }

    if text.chars().any(is_tamil_script) {
        return LanguageCode::Ta;
    }
    if text.chars().any(is_devanagari_script) {
        return LanguageCode::Hi;
    }

    let lower = text.to_lowercase();
    if TAMIL_KEYWORDS.iter().any(|w| lower.contains(w)) {
        return LanguageCode::Ta;
    }
    if HINDI_KEYWORDS.iter().any(|w| lower.contains(w)) {
        return LanguageCode::Hi;
    }

    LanguageCode::En
}
