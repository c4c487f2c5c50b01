//! The query engine: orchestrates guards, understanding, caching, fallback
//! chains, and response generation
//!
//! Request flow: validate and sanitize, normalize, detect language,
//! classify and extract entities, rate-limit, then route. Greetings and
//! general chat go straight to the responder. Data intents consult the
//! cache, then walk the category's fallback chain under a per-hop timeout
//! and an overall request budget. Complex queries fan out over every
//! activated data intent and concatenate the sections. Backend failures
//! never surface to the caller; the reply degrades to the localized apology
//! instead.

use crate::templates::{apology, build_responder};
use crate::tracker::{QueryRecord, UsageTracker};
use krishimitra_cache::{cache_key, TtlCache};
use krishimitra_config::{CacheTtlConfig, EngineConfig, RateLimitConfig, Settings};
use krishimitra_core::{
    Error, Intent, Language, Params, Payload, QueryAnalysis, QueryReply, QueryRequest, Responder,
    Result, SourceCategory,
};
use krishimitra_guard::{SlidingWindowLimiter, Validator};
use krishimitra_nlu::{
    nearest_city, normalize_query, parse_coordinates, EntityExtractor, IntentClassifier,
};
use krishimitra_sources::static_data::STATIC_SOURCE_NAME;
use krishimitra_sources::SourceRegistry;
use serde_json::Value;
use std::time::{Duration, Instant};

pub struct QueryEngine {
    validator: Validator,
    limiter: SlidingWindowLimiter,
    classifier: IntentClassifier,
    extractor: EntityExtractor,
    registry: SourceRegistry,
    cache: TtlCache,
    tracker: UsageTracker,
    responder: Box<dyn Responder>,
    engine_cfg: EngineConfig,
    rate_cfg: RateLimitConfig,
    ttl_cfg: CacheTtlConfig,
}

/// Where a data answer came from
struct FetchOutcome {
    payload: Payload,
    source: String,
    cache_hit: bool,
    /// First hop of the chain answered (cache hits count as primary)
    primary: bool,
}

impl QueryEngine {
    /// Build the engine from settings, wiring HTTP endpoints and the static
    /// fallback into every chain.
    pub fn from_settings(settings: &Settings) -> Self {
        let registry = SourceRegistry::from_settings(settings, reqwest::Client::new());
        Self::with_registry(settings, registry)
    }

    /// Build with an explicit registry. The settings still drive guards,
    /// TTLs, and the responder.
    pub fn with_registry(settings: &Settings, registry: SourceRegistry) -> Self {
        Self {
            validator: Validator::new(
                settings.engine.max_query_length,
                settings.engine.max_identifier_length,
            ),
            limiter: SlidingWindowLimiter::new(),
            classifier: IntentClassifier::new(),
            extractor: EntityExtractor::new(),
            registry,
            cache: TtlCache::new(),
            tracker: UsageTracker::new(),
            responder: build_responder(settings.engine.responder),
            engine_cfg: settings.engine.clone(),
            rate_cfg: settings.rate_limit.clone(),
            ttl_cfg: settings.cache.clone(),
        }
    }

    /// Answer one query. `client_id` identifies the caller for rate
    /// limiting when the request carries no user id.
    ///
    /// Only validation and rate-limit failures return `Err`; every other
    /// condition produces a well-formed reply.
    pub async fn handle(&self, request: &QueryRequest, client_id: &str) -> Result<QueryReply> {
        let validated = self
            .validator
            .validate(request)
            .map_err(Error::Validation)?;
        for warning in &validated.warnings {
            tracing::warn!(%warning, "query flagged during validation");
        }
        let query = validated.query;

        let normalized = normalize_query(&query.text);
        let language = query
            .language
            .unwrap_or_else(|| krishimitra_core::detect(&normalized));

        let analysis = self.analyze(&normalized, language, query.coordinates);

        let rate_id = query.user_id.as_deref().unwrap_or(client_id);
        let window = Duration::from_secs(self.rate_cfg.window_seconds);
        if !self
            .limiter
            .allow(rate_id, self.rate_cfg.max_requests, window)
        {
            return Err(Error::RateLimited {
                retry_after_secs: self.limiter.retry_after(rate_id, window),
            });
        }

        tracing::info!(
            intent = %analysis.intent,
            %language,
            confidence = analysis.confidence,
            "query understood"
        );

        let deadline = Instant::now() + Duration::from_secs(self.engine_cfg.request_budget_secs);

        let reply = match analysis.intent.category() {
            None if analysis.intent == Intent::Complex => {
                self.answer_complex(&analysis.secondary, &analysis.entities, language, deadline)
                    .await
            }
            None => {
                let text =
                    self.responder
                        .render(analysis.intent, &analysis.entities, None, language);
                self.tracker.record_query(QueryRecord {
                    intent: analysis.intent,
                    language,
                    source: "responder".to_string(),
                    cache_hit: false,
                    structured: false,
                    primary: false,
                });
                QueryReply::new(text, "responder", analysis.confidence, language)
            }
            Some(category) => {
                let params = build_params(&analysis.entities);
                match self.fetch_with_fallback(category, &params, deadline).await {
                    Some(outcome) => {
                        let text = self.responder.render(
                            analysis.intent,
                            &analysis.entities,
                            Some(&outcome.payload),
                            language,
                        );
                        self.tracker.record_query(QueryRecord {
                            intent: analysis.intent,
                            language,
                            source: outcome.source.clone(),
                            cache_hit: outcome.cache_hit,
                            structured: true,
                            primary: outcome.primary,
                        });
                        QueryReply::new(text, outcome.source, analysis.confidence, language)
                    }
                    None => {
                        self.tracker.record_query(QueryRecord {
                            intent: analysis.intent,
                            language,
                            source: "fallback".to_string(),
                            cache_hit: false,
                            structured: false,
                            primary: false,
                        });
                        QueryReply::new(apology(language), "fallback", 0.0, language)
                    }
                }
            }
        };

        Ok(reply)
    }

    /// Classify and extract; resolve the location from entities, request
    /// coordinates, inline coordinates, or the configured default, in that
    /// order.
    fn analyze(
        &self,
        normalized: &str,
        language: Language,
        coordinates: Option<krishimitra_core::Coordinates>,
    ) -> QueryAnalysis {
        let classification = self.classifier.classify(normalized);
        let mut entities = self.extractor.extract(normalized);
        if entities.location.is_none() {
            let coords = coordinates.or_else(|| parse_coordinates(normalized));
            entities.location = Some(match coords {
                Some(coords) => nearest_city(coords).to_string(),
                None => self.engine_cfg.default_location.clone(),
            });
        }

        // Greetings read as confident even though the per-trigger score is
        // diluted by the set size
        let confidence = if classification.intent == Intent::Greeting {
            classification.confidence.max(0.9)
        } else {
            classification.confidence
        };

        QueryAnalysis {
            language,
            intent: classification.intent,
            secondary: if classification.intent == Intent::Complex {
                classification.activated
            } else {
                Vec::new()
            },
            confidence,
            entities,
        }
    }

    /// Answer each activated data intent and join the sections. A greeting
    /// in the mix renders first; sections whose chains are exhausted are
    /// skipped unless nothing at all answered.
    async fn answer_complex(
        &self,
        activated: &[Intent],
        entities: &krishimitra_core::EntityMap,
        language: Language,
        deadline: Instant,
    ) -> QueryReply {
        let params = build_params(entities);
        let mut sections = Vec::new();
        let mut sources = Vec::new();
        let mut any_cache_hit = false;
        let mut all_primary = true;
        let mut answered = false;

        for intent in activated {
            let Some(category) = intent.category() else {
                sections.push(self.responder.render(*intent, entities, None, language));
                continue;
            };
            match self.fetch_with_fallback(category, &params, deadline).await {
                Some(outcome) => {
                    sections.push(self.responder.render(
                        *intent,
                        entities,
                        Some(&outcome.payload),
                        language,
                    ));
                    any_cache_hit |= outcome.cache_hit;
                    all_primary &= outcome.primary;
                    answered = true;
                    if !sources.contains(&outcome.source) {
                        sources.push(outcome.source);
                    }
                }
                None => {
                    tracing::warn!(%category, "no backend answered for complex section");
                }
            }
        }

        if sections.is_empty() {
            self.tracker.record_query(QueryRecord {
                intent: Intent::Complex,
                language,
                source: "fallback".to_string(),
                cache_hit: false,
                structured: false,
                primary: false,
            });
            return QueryReply::new(apology(language), "fallback", 0.0, language);
        }

        let source = if sources.is_empty() {
            "responder".to_string()
        } else {
            sources.join(",")
        };
        self.tracker.record_query(QueryRecord {
            intent: Intent::Complex,
            language,
            source: source.clone(),
            cache_hit: any_cache_hit,
            structured: answered,
            primary: answered && all_primary,
        });
        QueryReply::new(sections.join("\n\n"), source, 0.8, language)
    }

    /// Cache lookup, then the category's chain front to back. Each hop runs
    /// under the per-hop timeout capped by the remaining request budget.
    async fn fetch_with_fallback(
        &self,
        category: SourceCategory,
        params: &Params,
        deadline: Instant,
    ) -> Option<FetchOutcome> {
        let key = cache_key(category.label(), params);

        if let Some(Value::Object(payload)) = self.cache.get(&key) {
            return Some(FetchOutcome {
                payload,
                source: "cache".to_string(),
                cache_hit: true,
                primary: true,
            });
        }

        let per_hop = Duration::from_secs(self.engine_cfg.fetch_timeout_secs);
        for (index, source) in self.registry.chain(category).iter().enumerate() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!(%category, "request budget exhausted mid-chain");
                break;
            }

            let hop_timeout = per_hop.min(remaining);
            let result = tokio::time::timeout(hop_timeout, source.fetch(category, params)).await;

            match result {
                Ok(Ok(payload)) => {
                    self.tracker.record_source_result(source.name(), true);
                    let ttl = if source.name() == STATIC_SOURCE_NAME {
                        self.ttl_cfg.fallback_ttl()
                    } else {
                        self.ttl_cfg.ttl_for(category)
                    };
                    self.cache.set(key, Value::Object(payload.clone()), ttl);
                    return Some(FetchOutcome {
                        payload,
                        source: source.name().to_string(),
                        cache_hit: false,
                        primary: index == 0,
                    });
                }
                Ok(Err(err)) => {
                    self.tracker.record_source_result(source.name(), false);
                    tracing::warn!(%category, source = source.name(), %err, "source failed, trying next hop");
                }
                Err(_) => {
                    self.tracker.record_source_result(source.name(), false);
                    tracing::warn!(%category, source = source.name(), "source timed out, trying next hop");
                }
            }
        }
        None
    }

    /// Combined usage and cache report for the report endpoint.
    pub fn report(&self) -> Value {
        let usage = self.tracker.report();
        let cache = self.cache.stats();
        serde_json::json!({
            "usage": usage,
            "cache": {
                "hits": cache.hits,
                "misses": cache.misses,
                "sets": cache.sets,
                "entries": self.cache.len(),
            },
        })
    }
}

/// Fetch parameters from extracted entities. The location is always set by
/// the time this runs.
fn build_params(entities: &krishimitra_core::EntityMap) -> Params {
    let mut params = Params::new();
    if let Some(location) = &entities.location {
        params.insert("location".to_string(), location.clone());
    }
    if let Some(crop) = &entities.crop {
        params.insert("crop".to_string(), crop.clone());
    }
    if let Some(season) = &entities.season {
        params.insert("season".to_string(), season.clone());
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use krishimitra_core::{DataSource, SourceError};
    use krishimitra_sources::StaticSource;
    use std::sync::Arc;

    struct Failing;

    #[async_trait]
    impl DataSource for Failing {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn fetch(
            &self,
            _category: SourceCategory,
            _params: &Params,
        ) -> std::result::Result<Payload, SourceError> {
            Err(SourceError::Unavailable("down".to_string()))
        }
    }

    struct Fixed;

    #[async_trait]
    impl DataSource for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch(
            &self,
            _category: SourceCategory,
            _params: &Params,
        ) -> std::result::Result<Payload, SourceError> {
            let value = serde_json::json!({
                "condition": "Sunny",
                "temperature_c": 30,
                "humidity_pct": 50,
                "advisory": "Clear skies ahead.",
            });
            match value {
                Value::Object(map) => Ok(map),
                _ => unreachable!(),
            }
        }
    }

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

    fn engine_with(registry: SourceRegistry) -> QueryEngine {
        QueryEngine::with_registry(&Settings::default(), registry)
    }

    fn static_engine() -> QueryEngine {
        let mut registry = SourceRegistry::new();
        let source: Arc<dyn DataSource> = Arc::new(StaticSource);
        for category in SourceCategory::all() {
            registry.register(*category, Arc::clone(&source));
        }
        engine_with(registry)
    }

    #[tokio::test]
    async fn test_greeting_bypasses_backends() {
        let engine = engine_with(SourceRegistry::new());
        let reply = engine.handle(&request("hello"), "c1").await.expect("reply");
        assert_eq!(reply.source, "responder");
        assert!(reply.confidence >= 0.9);
        assert!(!reply.response.is_empty());
    }

    #[tokio::test]
    async fn test_fallback_chain_walks_to_second_hop() {
        let mut registry = SourceRegistry::new();
        registry.register(SourceCategory::Weather, Arc::new(Failing));
        registry.register(SourceCategory::Weather, Arc::new(Fixed));
        let engine = engine_with(registry);

        let reply = engine
            .handle(&request("What is the weather in Delhi today?"), "c1")
            .await
            .expect("reply");
        assert_eq!(reply.source, "fixed");
        assert!(reply.response.contains("Delhi"));
        assert!(reply.response.contains("Sunny"));
    }

    #[tokio::test]
    async fn test_all_hops_exhausted_yields_apology() {
        let mut registry = SourceRegistry::new();
        registry.register(SourceCategory::Weather, Arc::new(Failing));
        let engine = engine_with(registry);

        let reply = engine
            .handle(&request("weather in Delhi"), "c1")
            .await
            .expect("reply");
        assert_eq!(reply.source, "fallback");
        assert!(reply.response.contains("Sorry"));
    }

    #[tokio::test]
    async fn test_second_identical_query_hits_cache() {
        let mut registry = SourceRegistry::new();
        registry.register(SourceCategory::Weather, Arc::new(Fixed));
        let engine = engine_with(registry);

        let first = engine
            .handle(&request("weather in Delhi"), "c1")
            .await
            .expect("reply");
        assert_eq!(first.source, "fixed");

        let second = engine
            .handle(&request("weather in Delhi"), "c1")
            .await
            .expect("reply");
        assert_eq!(second.source, "cache");
        assert_eq!(first.response, second.response);
    }

    #[tokio::test]
    async fn test_hinglish_mumbai_crop_query() {
        let engine = static_engine();
        let reply = engine
            .handle(&request("Mumbai mein kya fasal lagayein?"), "c1")
            .await
            .expect("reply");
        assert_eq!(reply.language, "hinglish");
        assert!(reply.response.contains("Mumbai"));
        // Crop recommendations from the kharif default of the static payload
        assert!(reply.response.contains("fasalein"));
        assert!(reply.response.contains("Rice"));
    }

    #[tokio::test]
    async fn test_complex_query_concatenates_sections() {
        let engine = static_engine();
        let reply = engine
            .handle(&request("weather and market price in Delhi"), "c1")
            .await
            .expect("reply");
        assert!(reply.response.contains("\n\n"));
        assert!(reply.response.contains("Delhi"));
        // Weather and market sections both rendered
        assert!(reply.response.contains("mausam") || reply.response.contains("Weather"));
        assert!(reply.response.contains("MSP"));
    }

    #[tokio::test]
    async fn test_rate_limit_returns_retry_hint() {
        let mut settings = Settings::default();
        settings.rate_limit.max_requests = 1;
        let engine = QueryEngine::with_registry(&settings, SourceRegistry::new());

        engine.handle(&request("hello"), "c1").await.expect("first");
        let err = engine.handle(&request("hello"), "c1").await.unwrap_err();
        match err {
            Error::RateLimited { retry_after_secs } => assert!(retry_after_secs >= 1),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejected_query_does_not_consume_rate_quota() {
        let mut settings = Settings::default();
        settings.rate_limit.max_requests = 1;
        let engine = QueryEngine::with_registry(&settings, SourceRegistry::new());

        // Validation runs first, so the failed request never reaches the
        // limiter and the single slot stays available
        let err = engine.handle(&request("   "), "c1").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        engine
            .handle(&request("hello"), "c1")
            .await
            .expect("admitted after a rejected request");
    }

    #[tokio::test]
    async fn test_validation_errors_propagate() {
        let engine = engine_with(SourceRegistry::new());
        let err = engine.handle(&request("   "), "c1").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_declared_language_overrides_detection() {
        let mut req = request("What is the weather in Delhi today?");
        req.language = Some("hi".to_string());
        let engine = static_engine();
        let reply = engine.handle(&req, "c1").await.expect("reply");
        assert_eq!(reply.language, "hi");
        assert!(reply.response.contains("मौसम"));
    }

    #[tokio::test]
    async fn test_coordinates_resolve_default_location() {
        let mut req = request("mausam kaisa hai");
        req.latitude = Some(19.03);
        req.longitude = Some(73.0);
        let engine = static_engine();
        let reply = engine.handle(&req, "c1").await.expect("reply");
        assert!(reply.response.contains("Mumbai"));
    }

    #[tokio::test]
    async fn test_inline_coordinates_resolve_location() {
        let engine = static_engine();
        let reply = engine
            .handle(&request("weather at 28.61, 77.21 today"), "c1")
            .await
            .expect("reply");
        assert!(reply.response.contains("Delhi"));
    }

    #[tokio::test]
    async fn test_report_tracks_traffic() {
        let engine = static_engine();
        engine.handle(&request("hello"), "c1").await.expect("reply");
        engine
            .handle(&request("weather in Delhi"), "c1")
            .await
            .expect("reply");

        let report = engine.report();
        assert_eq!(report["usage"]["total_queries"], 2);
        assert_eq!(report["usage"]["structured_queries"], 1);
        assert_eq!(report["cache"]["sets"], 1);
    }
}
