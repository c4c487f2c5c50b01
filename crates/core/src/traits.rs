//! Traits at the backend and responder seams
//!
//! External data collaborators (weather, market, scheme, pest services) are
//! reached only through `DataSource::fetch`; the router treats any error,
//! timeout, or malformed payload identically as "unavailable" and moves to
//! the next hop in the fallback chain.

use crate::intent::{Intent, SourceCategory};
use crate::language::Language;
use crate::query::EntityMap;
use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

/// Opaque payload returned by a data source
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Fetch parameters. A `BTreeMap` so iteration order — and therefore the
/// derived cache key — is independent of insertion order.
pub type Params = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("http error: {0}")]
    Http(String),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("timed out")]
    Timeout,

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// A structured-data backend. Implementations never touch cache or
/// rate-limit state; they only return payloads.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Stable name recorded by the usage tracker
    fn name(&self) -> &str;

    async fn fetch(
        &self,
        category: SourceCategory,
        params: &Params,
    ) -> std::result::Result<Payload, SourceError>;
}

/// Renders a language-appropriate reply string from routed data.
pub trait Responder: Send + Sync {
    fn render(
        &self,
        intent: Intent,
        entities: &EntityMap,
        data: Option<&Payload>,
        language: Language,
    ) -> String;
}
