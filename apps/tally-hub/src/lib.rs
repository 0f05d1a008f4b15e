pub mod config;
pub mod error;
pub mod hub;
pub mod models;
pub mod routes;

use std::sync::Arc;

use config::Config;
use hub::Hub;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub hub: Hub,
    pub config: Arc<Config>,
}

impl AppState {
    /// Start the broadcast hub described by `config`.
    ///
    /// Must be called from inside a tokio runtime. The heartbeat is started
    /// separately by the binary so tests can run without it.
    pub fn new(config: Config) -> Self {
        let hub = Hub::spawn(config.hub_config());
        Self {
            hub,
            config: Arc::new(config),
        }
    }
}
