//! Per-category ordered fallback chains

use crate::http::HttpJsonSource;
use crate::static_data::StaticSource;
use krishimitra_core::{DataSource, SourceCategory};
use krishimitra_config::Settings;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Holds the ordered `DataSource` chain for each category. The router
/// walks a chain front to back; registration order is try order.
#[derive(Default)]
pub struct SourceRegistry {
    chains: HashMap<SourceCategory, Vec<Arc<dyn DataSource>>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build chains from configured endpoints, closing every category's
    /// chain with the static fallback so a data intent can always answer.
    pub fn from_settings(settings: &Settings, client: reqwest::Client) -> Self {
        let mut registry = Self::new();
        let timeout = Duration::from_secs(settings.engine.fetch_timeout_secs);

        for endpoint in &settings.sources {
            registry.register(
                endpoint.category,
                Arc::new(HttpJsonSource::new(
                    endpoint.name.clone(),
                    endpoint.url.clone(),
                    client.clone(),
                    timeout,
                )),
            );
        }

        let static_source: Arc<dyn DataSource> = Arc::new(StaticSource);
        for category in SourceCategory::all() {
            registry.register(*category, Arc::clone(&static_source));
        }
        registry
    }

    pub fn register(&mut self, category: SourceCategory, source: Arc<dyn DataSource>) {
        tracing::debug!(%category, source = source.name(), "registered data source");
        self.chains.entry(category).or_default().push(source);
    }

    /// The ordered chain for a category. Empty when nothing is registered.
    pub fn chain(&self, category: SourceCategory) -> &[Arc<dyn DataSource>] {
        self.chains
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings_closes_chains_with_static_fallback() {
        let mut settings = Settings::default();
        settings.sources.push(krishimitra_config::SourceEndpoint {
            name: "imd".to_string(),
            category: SourceCategory::Weather,
            url: "http://localhost:9999/weather".to_string(),
        });

        let registry = SourceRegistry::from_settings(&settings, reqwest::Client::new());

        let weather = registry.chain(SourceCategory::Weather);
        assert_eq!(weather.len(), 2);
        assert_eq!(weather[0].name(), "imd");
        assert_eq!(weather[1].name(), crate::static_data::STATIC_SOURCE_NAME);

        // Categories with no endpoints still end in the static fallback
        let pest = registry.chain(SourceCategory::Pest);
        assert_eq!(pest.len(), 1);
        assert_eq!(pest[0].name(), crate::static_data::STATIC_SOURCE_NAME);
    }

    #[test]
    fn test_registration_order_is_try_order() {
        let mut registry = SourceRegistry::new();
        registry.register(SourceCategory::Market, Arc::new(StaticSource));
        let chain = registry.chain(SourceCategory::Market);
        assert_eq!(chain.len(), 1);
        assert!(registry.chain(SourceCategory::Weather).is_empty());
    }
}
