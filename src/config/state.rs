// Application state module
// Everything a request or the watcher needs, passed around explicitly

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::Notify;

use super::site::SiteStore;
use super::types::Config;
use crate::backend::BackendRegistry;

/// Shared application state
///
/// Handlers receive this behind an `Arc`; there is no ambient global state.
pub struct AppState {
    pub config: Config,
    pub site: SiteStore,
    pub backends: BackendRegistry,
    pub shutdown: Arc<Notify>,

    // Cached so the hot path skips the config structure
    pub cached_access_log: AtomicBool,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let site = SiteStore::new(&config.server.site_config);
        let cached_access_log = AtomicBool::new(config.logging.access_log);
        Self {
            config,
            site,
            backends: BackendRegistry::new(),
            shutdown: Arc::new(Notify::new()),
            cached_access_log,
        }
    }
}
