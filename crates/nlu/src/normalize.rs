//! Query normalization
//!
//! Lowercases, collapses whitespace and repeated punctuation, and fixes a
//! small curated table of typos seen in real farmer queries before the
//! classifier and extractor run.

use once_cell::sync::Lazy;
use regex::Regex;

/// Typo table applied on word boundaries. Order matters: longer forms first
/// so e.g. `hii` does not first collapse into `hi` plus a stray `i`.
static TYPO_FIXES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\bwether\b", "weather"),
        (r"\bweatherr\b", "weather"),
        (r"\bfertiliser\b", "fertilizer"),
        (r"\bagricultre\b", "agriculture"),
        (r"\bcroping\b", "cropping"),
        (r"\bhelo\b", "hello"),
        (r"\bhii+\b", "hi"),
        (r"\bthnk\b", "thank"),
        (r"\bpls\b", "please"),
        (r"\bwht\b", "what"),
        (r"\bhw\b", "how"),
        (r"\bprize\b", "price"),
    ]
    .into_iter()
    .map(|(pattern, fix)| {
        (
            Regex::new(pattern).expect("typo pattern compiles"),
            fix,
        )
    })
    .collect()
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));
static BANGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"!+").expect("bang pattern"));
static MARKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?+").expect("question pattern"));

/// Normalize a query for classification. Pure function of the input.
pub fn normalize_query(query: &str) -> String {
    let mut normalized = query.trim().to_lowercase();

    for (pattern, fix) in TYPO_FIXES.iter() {
        normalized = pattern.replace_all(&normalized, *fix).into_owned();
    }

    normalized = BANGS.replace_all(&normalized, "!").into_owned();
    normalized = MARKS.replace_all(&normalized, "?").into_owned();
    WHITESPACE.replace_all(&normalized, " ").trim().to_string()
}
