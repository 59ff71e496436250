use std::sync::Arc;

use crate::core::AppConfig;
use crate::workflow::EventProcessor;

pub struct AppState {
    pub config: AppConfig,
    pub processor: Arc<EventProcessor>,
}

impl AppState {
    pub fn new(config: AppConfig, processor: Arc<EventProcessor>) -> Self {
        Self { config, processor }
    }
}
