// libs/shared/store/src/state.rs
use std::sync::Arc;

use shared_config::AppConfig;

use crate::store::ResourceStore;

/// Process-scoped application state: one config, one store handle,
/// constructed at startup and passed into every cell router.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<ResourceStore>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            store: Arc::new(ResourceStore::new()),
        }
    }
}
