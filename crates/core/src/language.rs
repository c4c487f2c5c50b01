//! Language definitions and detection
//!
//! Covers the languages the advisory assistant replies in: English, the
//! major scheduled Indian languages the validator accepts, and `hinglish`
//! for romanized Hindi typed in Latin script.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Supported reply languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Hindi,
    Hinglish,
    Bengali,
    Telugu,
    Tamil,
    Gujarati,
    Marathi,
    Kannada,
    Malayalam,
    Punjabi,
    Odia,
}

impl Language {
    /// Get the short language code used on the wire
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Hinglish => "hinglish",
            Self::Bengali => "bn",
            Self::Telugu => "te",
            Self::Tamil => "ta",
            Self::Gujarati => "gu",
            Self::Marathi => "mr",
            Self::Kannada => "kn",
            Self::Malayalam => "ml",
            Self::Punjabi => "pa",
            Self::Odia => "or",
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Hinglish => "Hinglish",
            Self::Bengali => "Bengali",
            Self::Telugu => "Telugu",
            Self::Tamil => "Tamil",
            Self::Gujarati => "Gujarati",
            Self::Marathi => "Marathi",
            Self::Kannada => "Kannada",
            Self::Malayalam => "Malayalam",
            Self::Punjabi => "Punjabi",
            Self::Odia => "Odia",
        }
    }

    /// Parse from a declared language code (case-insensitive).
    ///
    /// Returns `None` for `auto`, unknown codes, and empty strings; callers
    /// treat `None` as "detect from text".
    pub fn from_code(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "en" | "eng" | "english" => Some(Self::English),
            "hi" | "hin" | "hindi" => Some(Self::Hindi),
            "hinglish" => Some(Self::Hinglish),
            "bn" | "ben" | "bengali" | "bangla" => Some(Self::Bengali),
            "te" | "tel" | "telugu" => Some(Self::Telugu),
            "ta" | "tam" | "tamil" => Some(Self::Tamil),
            "gu" | "guj" | "gujarati" => Some(Self::Gujarati),
            "mr" | "mar" | "marathi" => Some(Self::Marathi),
            "kn" | "kan" | "kannada" => Some(Self::Kannada),
            "ml" | "mal" | "malayalam" => Some(Self::Malayalam),
            "pa" | "pan" | "punjabi" | "panjabi" => Some(Self::Punjabi),
            "or" | "ori" | "odia" | "oriya" => Some(Self::Odia),
            _ => None,
        }
    }

    /// All supported languages
    pub fn all() -> &'static [Language] {
        &[
            Self::English,
            Self::Hindi,
            Self::Hinglish,
            Self::Bengali,
            Self::Telugu,
            Self::Tamil,
            Self::Gujarati,
            Self::Marathi,
            Self::Kannada,
            Self::Malayalam,
            Self::Punjabi,
            Self::Odia,
        ]
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Script systems checked during detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    Devanagari,
    Bengali,
    Telugu,
    Tamil,
    Gujarati,
    Kannada,
    Malayalam,
    Gurmukhi,
    Odia,
    Latin,
}

impl Script {
    /// Unicode block for this script (primary block only)
    pub fn unicode_range(&self) -> (u32, u32) {
        match self {
            Self::Devanagari => (0x0900, 0x097F),
            Self::Bengali => (0x0980, 0x09FF),
            Self::Telugu => (0x0C00, 0x0C7F),
            Self::Tamil => (0x0B80, 0x0BFF),
            Self::Gujarati => (0x0A80, 0x0AFF),
            Self::Kannada => (0x0C80, 0x0CFF),
            Self::Malayalam => (0x0D00, 0x0D7F),
            Self::Gurmukhi => (0x0A00, 0x0A7F),
            Self::Odia => (0x0B00, 0x0B7F),
            Self::Latin => (0x0000, 0x007F),
        }
    }

    /// Check if a character belongs to this script's block
    pub fn contains_char(&self, c: char) -> bool {
        let code = c as u32;
        let (start, end) = self.unicode_range();
        code >= start && code <= end
    }

    /// Language tag a script block resolves to
    pub fn language(&self) -> Language {
        match self {
            Self::Devanagari => Language::Hindi,
            Self::Bengali => Language::Bengali,
            Self::Telugu => Language::Telugu,
            Self::Tamil => Language::Tamil,
            Self::Gujarati => Language::Gujarati,
            Self::Kannada => Language::Kannada,
            Self::Malayalam => Language::Malayalam,
            Self::Gurmukhi => Language::Punjabi,
            Self::Odia => Language::Odia,
            Self::Latin => Language::English,
        }
    }
}

/// Script blocks in detection priority order. Mixed-script text resolves to
/// the first block that matches any character.
const DETECTION_ORDER: &[Script] = &[
    Script::Devanagari,
    Script::Bengali,
    Script::Telugu,
    Script::Tamil,
    Script::Gujarati,
    Script::Kannada,
    Script::Malayalam,
    Script::Gurmukhi,
    Script::Odia,
];

/// Romanized-Hindi function words. A whole-token match on any of these in
/// otherwise Latin text yields the `hinglish` tag.
static HINGLISH_LEXICON: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "hai", "hain", "bhai", "mein", "mujhe", "humein", "kya", "kyu", "kaise", "kab",
        "kahan", "kaun", "acha", "accha", "thik", "theek", "bilkul", "zaroor", "pakka",
        "sahi", "galat", "nahi", "nahin", "karein", "chahiye", "batao", "bataiye",
        "lagayein", "lagaye", "ugaye", "kitna", "kitni", "mausam", "fasal", "kheti",
        "mandi", "bhav", "kisan", "yojana",
    ]
    .into_iter()
    .collect()
});

/// Detect the language of free text.
///
/// Pure function of the input: script ranges are checked in a fixed priority
/// order, then the romanized lexicon, then English as the base tag.
pub fn detect(text: &str) -> Language {
    for script in DETECTION_ORDER {
        if text.chars().any(|c| script.contains_char(c)) {
            return script.language();
        }
    }

    let lower = text.to_lowercase();
    let has_hinglish = lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| HINGLISH_LEXICON.contains(token));
    if has_hinglish {
        return Language::Hinglish;
    }

    Language::English
}
