use crate::core::entries::manager::EntryManager;
use raymon_sensors::StateStore;
use raymon_settings::config::RaymonConfig;
use std::sync::Arc;

pub struct AppState {
    pub config: Arc<RaymonConfig>,
    pub entries: EntryManager,
    pub store: Arc<StateStore>,
}

impl AppState {
    pub fn new(config: RaymonConfig) -> Self {
        let store = Arc::new(StateStore::new());
        let entries = EntryManager::new(
            store.clone(),
            config.request_timeout(),
            config.max_stale_polls,
        );

        Self {
            config: Arc::new(config),
            entries,
            store,
        }
    }
}
