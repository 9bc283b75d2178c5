use std::sync::Arc;

use common::IdentityHasher;

use crate::config::AppConfig;
use crate::store::LinkStore;

#[derive(Clone)]
pub struct AppState {
    pub store: LinkStore,
    pub hasher: IdentityHasher,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig, store: LinkStore) -> Self {
        Self {
            hasher: IdentityHasher::new(config.identity.pepper.clone()),
            store,
            config: Arc::new(config),
        }
    }
}
