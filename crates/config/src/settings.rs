//! Settings types and layered loading

use crate::ConfigError;
use config::{Config, Environment, File};
use krishimitra_core::SourceCategory;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub rate_limit: RateLimitConfig,
    pub cache: CacheTtlConfig,
    pub engine: EngineConfig,
    /// Ordered fallback chains: endpoints are tried in list order within
    /// their category before the static fallback payload.
    pub sources: Vec<SourceEndpoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_enabled: bool,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_seconds: 3600,
        }
    }
}

/// Static per-category TTL table. The cache itself is TTL-value-agnostic;
/// the router looks TTLs up here at the call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheTtlConfig {
    pub weather_secs: u64,
    pub market_secs: u64,
    pub crop_recommendation_secs: u64,
    pub scheme_secs: u64,
    pub pest_secs: u64,
    pub fallback_secs: u64,
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            weather_secs: 1800,
            market_secs: 3600,
            crop_recommendation_secs: 7200,
            scheme_secs: 86400,
            pest_secs: 7200,
            fallback_secs: 604_800,
        }
    }
}

impl CacheTtlConfig {
    pub fn ttl_for(&self, category: SourceCategory) -> Duration {
        let secs = match category {
            SourceCategory::Weather => self.weather_secs,
            SourceCategory::Market => self.market_secs,
            SourceCategory::CropRecommendation => self.crop_recommendation_secs,
            SourceCategory::Scheme => self.scheme_secs,
            SourceCategory::Pest => self.pest_secs,
        };
        Duration::from_secs(secs)
    }

    pub fn fallback_ttl(&self) -> Duration {
        Duration::from_secs(self.fallback_secs)
    }
}

/// Which responder answers queries that carry no structured data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponderKind {
    #[default]
    Template,
    RuleBased,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Reject query text longer than this many characters
    pub max_query_length: usize,
    /// Session and user identifiers are capped at this length
    pub max_identifier_length: usize,
    /// Per-hop fetch timeout
    pub fetch_timeout_secs: u64,
    /// Wall-clock ceiling for a whole request; exceeding it aborts the
    /// remaining fallback hops
    pub request_budget_secs: u64,
    /// Location used when neither an entity nor coordinates resolve one
    pub default_location: String,
    pub responder: ResponderKind,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_query_length: 2000,
            max_identifier_length: 100,
            fetch_timeout_secs: 10,
            request_budget_secs: 20,
            default_location: "Delhi".to_string(),
            responder: ResponderKind::Template,
        }
    }
}

/// One external data endpoint in a category's fallback chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEndpoint {
    pub name: String,
    pub category: SourceCategory,
    pub url: String,
}

/// Load settings: defaults, then an optional TOML file, then `KRISHI_`
/// environment variables (`KRISHI_SERVER__PORT=9000` style).
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        builder = builder.add_source(File::from(path));
    }

    let settings: Settings = builder
        .add_source(Environment::with_prefix("KRISHI").separator("__"))
        .build()?
        .try_deserialize()?;

    if settings.engine.max_query_length == 0 {
        return Err(ConfigError::InvalidValue {
            field: "engine.max_query_length".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    if settings.rate_limit.max_requests == 0 {
        return Err(ConfigError::InvalidValue {
            field: "rate_limit.max_requests".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    tracing::debug!(
        port = settings.server.port,
        sources = settings.sources.len(),
        "settings loaded"
    );

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.engine.max_query_length, 2000);
        assert_eq!(settings.cache.scheme_secs, 86400);
        assert_eq!(settings.rate_limit.max_requests, 100);
        assert_eq!(settings.engine.responder, ResponderKind::Template);
    }

    #[test]
    fn test_ttl_lookup() {
        let cache = CacheTtlConfig::default();
        assert_eq!(cache.ttl_for(SourceCategory::Weather), Duration::from_secs(1800));
        assert_eq!(cache.ttl_for(SourceCategory::Scheme), Duration::from_secs(86400));
        assert_eq!(cache.fallback_ttl(), Duration::from_secs(604_800));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("tempfile");
        writeln!(
            file,
            r#"
[server]
port = 9001

[engine]
default_location = "Pune"

[[sources]]
name = "imd"
category = "weather"
url = "http://localhost:9999/weather"
"#
        )
        .expect("write config");

        let settings = load_settings(Some(file.path())).expect("load");
        assert_eq!(settings.server.port, 9001);
        assert_eq!(settings.engine.default_location, "Pune");
        assert_eq!(settings.sources.len(), 1);
        assert_eq!(settings.sources[0].category, SourceCategory::Weather);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_settings(Some(Path::new("/nonexistent/krishi.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
