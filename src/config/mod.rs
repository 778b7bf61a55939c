// Configuration module entry point
// Server settings come from config.toml plus environment; the site document
// lives in its own JSON file and is managed by the site store

mod site;
mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use site::{SiteConfigError, SiteStore};
pub use state::AppState;
pub use types::{
    Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, SiteConfig, WatcherConfig,
};

impl Config {
    /// Load server settings from the given file path (without extension)
    ///
    /// Missing file is fine; defaults and `LIVESERVE_*` environment variables
    /// still apply.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("LIVESERVE"))
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.site_config", "config.json")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "liveserve/0.3")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .set_default("watcher.poll_interval", 1)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
