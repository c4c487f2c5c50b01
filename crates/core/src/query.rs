//! Query request, analysis, and reply types
//!
//! A `QueryRequest` arrives raw from the web layer, becomes a
//! `SanitizedQuery` after validation, and a `QueryAnalysis` after language
//! detection and classification. The analysis is created fresh per request,
//! never persisted, and immutable once produced.

use crate::intent::Intent;
use crate::language::Language;
use serde::{Deserialize, Serialize};

/// Raw inbound query, exactly as posted to the endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    /// Declared language code; absent or `"auto"` means detect from text
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Validated geocoordinates, rounded to 6 decimals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Cleaned copy of a request that passed validation.
///
/// The original `QueryRequest` is never mutated; the validator returns this
/// fresh value instead.
#[derive(Debug, Clone)]
pub struct SanitizedQuery {
    pub text: String,
    /// `None` means the caller asked for auto-detection
    pub language: Option<Language>,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub coordinates: Option<Coordinates>,
}

/// Entities pulled from the query text, canonical form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMap {
    pub crop: Option<String>,
    pub location: Option<String>,
    pub season: Option<String>,
}

impl EntityMap {
    pub fn is_empty(&self) -> bool {
        self.crop.is_none() && self.location.is_none() && self.season.is_none()
    }
}

/// Derived understanding of one request
#[derive(Debug, Clone)]
pub struct QueryAnalysis {
    pub language: Language,
    pub intent: Intent,
    /// Activated single intents when `intent` is `Complex`, in priority
    /// order; empty otherwise
    pub secondary: Vec<Intent>,
    /// Confidence in [0,1]
    pub confidence: f32,
    pub entities: EntityMap,
}

/// The reply object returned to the caller. Always well-formed; the engine
/// never returns an empty body.
#[derive(Debug, Clone, Serialize)]
pub struct QueryReply {
    pub response: String,
    /// Name of the data source (or responder) that produced the answer
    pub source: String,
    pub confidence: f32,
    pub language: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

impl QueryReply {
    pub fn new(
        response: impl Into<String>,
        source: impl Into<String>,
        confidence: f32,
        language: Language,
    ) -> Self {
        Self {
            response: response.into(),
            source: source.into(),
            confidence: confidence.clamp(0.0, 1.0),
            language: language.code().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_map_empty() {
        assert!(EntityMap::default().is_empty());
        let m = EntityMap {
            location: Some("Delhi".into()),
            ..Default::default()
        };
        assert!(!m.is_empty());
    }

    #[test]
    fn test_reply_clamps_confidence() {
        let reply = QueryReply::new("hi", "test", 1.7, Language::English);
        assert_eq!(reply.confidence, 1.0);
        assert_eq!(reply.language, "en");
        assert!(!reply.timestamp.is_empty());
    }

    #[test]
    fn test_request_deserializes_with_optional_fields() {
        let req: QueryRequest =
            serde_json::from_str(r#"{"query": "hello"}"#).expect("minimal request");
        assert_eq!(req.query, "hello");
        assert!(req.language.is_none());
        assert!(req.latitude.is_none());
    }
}
