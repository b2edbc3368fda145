use std::sync::Arc;

use crate::{
    config::Config,
    db::Store,
    services::{ai::ProviderChain, metadata::MetadataService},
};

/// Shared application state
///
/// Everything is behind an `Arc`, so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub ai: Arc<ProviderChain>,
    pub metadata: Arc<MetadataService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        ai: ProviderChain,
        metadata: MetadataService,
        config: Config,
    ) -> Self {
        Self {
            store,
            ai: Arc::new(ai),
            metadata: Arc::new(metadata),
            config: Arc::new(config),
        }
    }
}
