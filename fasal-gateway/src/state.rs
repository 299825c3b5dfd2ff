//! Application state for the gateway server

use std::sync::Arc;

use fasal_core::store::FasalStore;

/// Gateway server state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FasalStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn FasalStore>) -> Self {
        Self { store }
    }
}

/// Gateway server configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            enable_cors: true,
        }
    }
}
