use std::sync::Arc;

use crate::{
    db::Store,
    middleware::TokenVerifier,
    services::{ModelService, MovieEnricher},
};

/// Tunables handlers read on every request
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub recommendation_top_n: usize,
    pub movies_page_size: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            recommendation_top_n: 10,
            movies_page_size: 15,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub models: Arc<dyn ModelService>,
    pub enricher: Arc<dyn MovieEnricher>,
    pub tokens: TokenVerifier,
    pub settings: Settings,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        models: Arc<dyn ModelService>,
        enricher: Arc<dyn MovieEnricher>,
        tokens: TokenVerifier,
        settings: Settings,
    ) -> Self {
        Self {
            store,
            models,
            enricher,
            tokens,
            settings,
        }
    }
}
