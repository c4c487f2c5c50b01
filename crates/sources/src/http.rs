//! HTTP JSON data source

use async_trait::async_trait;
use krishimitra_core::{DataSource, Params, Payload, SourceCategory, SourceError};
use std::time::Duration;

/// A single external JSON endpoint. Parameters become query-string pairs
/// and the response body must be a JSON object.
pub struct HttpJsonSource {
    name: String,
    url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpJsonSource {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        client: reqwest::Client,
        timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            client,
            timeout,
        }
    }
}

#[async_trait]
impl DataSource for HttpJsonSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(
        &self,
        category: SourceCategory,
        params: &Params,
    ) -> Result<Payload, SourceError> {
        let pairs: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let response = self
            .client
            .get(&self.url)
            .query(&pairs)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SourceError::Timeout
                } else {
                    SourceError::Http(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http(format!(
                "{} returned {status}",
                self.name
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        match body {
            serde_json::Value::Object(map) => {
                tracing::debug!(source = %self.name, %category, "fetched payload");
                Ok(map)
            }
            other => Err(SourceError::Malformed(format!(
                "expected JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
