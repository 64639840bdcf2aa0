//! Application state

use common::Config;
use db::StreakStore;
use engine::StreakService;
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub service: StreakService,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn StreakStore>) -> Self {
        Self {
            config,
            service: StreakService::new(store),
        }
    }
}
