//! Input validation and sanitization
//!
//! Produces a cleaned copy of the request; the original is never mutated.
//! On failure every violated rule is reported, not just the first, so the
//! caller can surface all problems at once. Markup is reduced to an
//! allow-list of benign inline tags and then escaped, so no tag markup ever
//! survives verbatim into the sanitized text.

use krishimitra_core::{Coordinates, Language, QueryRequest, SanitizedQuery};
use once_cell::sync::Lazy;
use regex::Regex;

/// Constructs that are removed outright, content included where they nest it
static DANGEROUS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?is)<script.*?>.*?</script>",
        r"(?i)javascript:",
        r"(?i)vbscript:",
        r"(?i)data:text/html",
        r"(?is)<iframe.*?>",
        r"(?is)<object.*?>",
        r"(?is)<embed.*?>",
        r"(?is)<link.*?>",
        r"(?is)<meta.*?>",
        r"(?i)\bon\w+\s*=",
        r"(?i)expression\s*\(",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("dangerous pattern compiles"))
    .collect()
});

/// Patterns that merit a warning but do not fail validation
static SUSPICIOUS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(password|pwd|pass)\s*[:=]",
        r"(?i)(token|key|secret)\s*[:=]",
        r"(?i)select\s+.*from",
        r"(?i)union\s+select",
    ]
    .into_iter()
    .map(|p| Regex::new(p).expect("suspicious pattern compiles"))
    .collect()
});

/// Benign inline tags whose inner text is kept when the tag is stripped
const ALLOWED_TAGS: &[&str] = &["b", "i", "em", "strong", "p", "br", "ul", "ol", "li"];

static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"</?([a-zA-Z][a-zA-Z0-9]*)[^>]*>").expect("tag pattern"));
static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("identifier pattern"));
static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").expect("control pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// A request that passed validation
#[derive(Debug, Clone)]
pub struct Validated {
    pub query: SanitizedQuery,
    /// Non-fatal observations (suspicious content); logged by the caller
    pub warnings: Vec<String>,
}

pub struct Validator {
    max_query_length: usize,
    max_identifier_length: usize,
}

impl Validator {
    pub fn new(max_query_length: usize, max_identifier_length: usize) -> Self {
        Self {
            max_query_length,
            max_identifier_length,
        }
    }

    /// Validate and sanitize a request. `Err` carries every violated rule.
    pub fn validate(&self, request: &QueryRequest) -> Result<Validated, Vec<String>> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if request.query.trim().is_empty() {
            errors.push("query text cannot be empty".to_string());
        }
        if request.query.chars().count() > self.max_query_length {
            errors.push(format!(
                "query text too long: maximum {} characters allowed",
                self.max_query_length
            ));
        }

        for pattern in SUSPICIOUS_PATTERNS.iter() {
            if pattern.is_match(&request.query) {
                warnings.push("suspicious content detected".to_string());
                break;
            }
        }

        // Unknown or "auto" language codes fall back to auto-detection
        let language = request
            .language
            .as_deref()
            .and_then(Language::from_code);

        let session_id = self.check_identifier("session_id", &request.session_id, &mut errors);
        let user_id = self.check_identifier("user_id", &request.user_id, &mut errors);
        let coordinates = check_coordinates(request, &mut errors);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Validated {
            query: SanitizedQuery {
                text: sanitize_text(&request.query),
                language,
                session_id,
                user_id,
                coordinates,
            },
            warnings,
        })
    }

    fn check_identifier(
        &self,
        field: &str,
        value: &Option<String>,
        errors: &mut Vec<String>,
    ) -> Option<String> {
        let value = value.as_deref()?;
        if value.len() > self.max_identifier_length {
            errors.push(format!(
                "{field} too long: maximum {} characters allowed",
                self.max_identifier_length
            ));
            return None;
        }
        if !IDENTIFIER.is_match(value) {
            errors.push(format!("{field} contains invalid characters"));
            return None;
        }
        Some(value.to_string())
    }
}

fn check_coordinates(request: &QueryRequest, errors: &mut Vec<String>) -> Option<Coordinates> {
    match (request.latitude, request.longitude) {
        (None, None) => None,
        (Some(lat), Some(lon)) => {
            let mut ok = true;
            if !(-90.0..=90.0).contains(&lat) {
                errors.push("latitude must be between -90 and 90 degrees".to_string());
                ok = false;
            }
            if !(-180.0..=180.0).contains(&lon) {
                errors.push("longitude must be between -180 and 180 degrees".to_string());
                ok = false;
            }
            ok.then(|| Coordinates {
                latitude: round6(lat),
                longitude: round6(lon),
            })
        }
        _ => {
            errors.push("latitude and longitude must be provided together".to_string());
            None
        }
    }
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// Strip dangerous constructs, drop non-allow-listed tags (keeping their
/// inner text), escape what remains, and normalize whitespace.
fn sanitize_text(text: &str) -> String {
    let mut cleaned = text.to_string();

    for pattern in DANGEROUS_PATTERNS.iter() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }

    cleaned = TAG
        .replace_all(&cleaned, |caps: &regex::Captures<'_>| {
            let name = caps[1].to_lowercase();
            if ALLOWED_TAGS.contains(&name.as_str()) {
                caps[0].to_string()
            } else {
                String::new()
            }
        })
        .into_owned();

    cleaned = escape_markup(&cleaned);
    cleaned = CONTROL_CHARS.replace_all(&cleaned, "").into_owned();
    WHITESPACE.replace_all(&cleaned, " ").trim().to_string()
}

fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(query: &str) -> QueryRequest {
        QueryRequest {
            query: query.to_string(),
            language: None,
            session_id: None,
            user_id: None,
            latitude: None,
            longitude: None,
        }
    }

    fn validator() -> Validator {
        Validator::new(2000, 100)
    }

    #[test]
    fn test_accepts_plain_query() {
        let validated = validator().validate(&request("weather in Delhi")).expect("valid");
        assert_eq!(validated.query.text, "weather in Delhi");
        assert!(validated.warnings.is_empty());
    }

    #[test]
    fn test_rejects_empty_query() {
        let errors = validator().validate(&request("   ")).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("empty")));
    }

    #[test]
    fn test_rejects_oversized_query() {
        let long = "a".repeat(2001);
        let errors = validator().validate(&request(&long)).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("too long")));
    }

    #[test]
    fn test_script_tag_never_survives() {
        let validated = validator()
            .validate(&request("weather <script>alert('x')</script> today"))
            .expect("valid after sanitization");
        assert!(!validated.query.text.contains("<script"));
        assert!(!validated.query.text.contains("alert"));
    }

    #[test]
    fn test_benign_tags_are_escaped_not_lost() {
        let validated = validator().validate(&request("<b>wheat</b> price")).expect("valid");
        assert!(validated.query.text.contains("wheat"));
        assert!(!validated.query.text.contains("<b>"));
    }

    #[test]
    fn test_reports_all_violations_at_once() {
        let mut req = request("");
        req.session_id = Some("bad session!".to_string());
        req.latitude = Some(123.0);
        req.longitude = Some(77.0);
        let errors = validator().validate(&req).unwrap_err();
        assert!(errors.len() >= 3, "expected all violations, got {errors:?}");
    }

    #[test]
    fn test_unknown_language_falls_back_to_auto() {
        let mut req = request("hello");
        req.language = Some("klingon".to_string());
        let validated = validator().validate(&req).expect("valid");
        assert!(validated.query.language.is_none());

        req.language = Some("hi".to_string());
        let validated = validator().validate(&req).expect("valid");
        assert_eq!(validated.query.language, Some(Language::Hindi));
    }

    #[test]
    fn test_coordinates_rounded() {
        let mut req = request("weather");
        req.latitude = Some(28.613_939_999_9);
        req.longitude = Some(77.209_021_111_1);
        let validated = validator().validate(&req).expect("valid");
        let coords = validated.query.coordinates.expect("coords");
        assert_eq!(coords.latitude, 28.61394);
        assert_eq!(coords.longitude, 77.209021);
    }

    #[test]
    fn test_lone_coordinate_rejected() {
        let mut req = request("weather");
        req.latitude = Some(28.6);
        let errors = validator().validate(&req).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("together")));
    }

    #[test]
    fn test_suspicious_content_warns_but_passes() {
        let validated = validator()
            .validate(&request("my password: hunter2 and the weather"))
            .expect("valid");
        assert!(!validated.warnings.is_empty());
    }

    #[test]
    fn test_original_request_not_mutated() {
        let req = request("weather <script>x</script>");
        let _ = validator().validate(&req);
        assert!(req.query.contains("<script>"));
    }
}
