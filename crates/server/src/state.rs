//! Shared application state

use krishimitra_config::Settings;
use krishimitra_engine::QueryEngine;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<QueryEngine>,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            engine: Arc::new(QueryEngine::from_settings(settings)),
        }
    }

    pub fn with_engine(engine: QueryEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}
