// src/state.rs
use std::sync::Arc;

use reqwest::Client;

use crate::config::Settings;
use crate::services::rate_cache::{FileStore, RateCache};
use crate::services::rate_provider::RateProvider;

/// Everything a handler may touch. Cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub rates: Arc<RateProvider>,
}

impl AppState {
    pub fn new(rates: RateProvider) -> Self {
        Self {
            rates: Arc::new(rates),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let cache = RateCache::new(Box::new(FileStore::new(&settings.cache_path)));
        Self::new(RateProvider::new(
            Client::new(),
            settings.cdi_source_url.clone(),
            settings.fetch_timeout,
            settings.cache_ttl,
            cache,
        ))
    }
}
