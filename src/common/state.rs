use std::sync::Arc;

use crate::common::Clock;
use crate::config::Config;
use crate::services::{SensorExplorer, TtlPolicy};
use crate::sta::SensorThingsClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub explorer: Arc<SensorExplorer>,
}

impl AppState {
    pub fn new(config: Config, client: SensorThingsClient, clock: Arc<dyn Clock>) -> Self {
        // One cache per process, shared by every handler
        let explorer = SensorExplorer::new(
            client,
            TtlPolicy::from_config(&config),
            config.cache_max_entries,
            clock,
        );

        Self {
            config: Arc::new(config),
            explorer: Arc::new(explorer),
        }
    }
}
