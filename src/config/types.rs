// Configuration types module
// Server settings loaded at startup, and the site document served over the API

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Server settings, fixed for the lifetime of the process
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    pub watcher: WatcherConfig,
}

/// Listener and process settings
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    /// Path of the site document (created with defaults on first run)
    pub site_config: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log file path (stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub enable_cors: bool,
    pub max_body_size: u64,
}

/// Backend watcher configuration
#[derive(Debug, Deserialize, Clone)]
pub struct WatcherConfig {
    /// Seconds between scans of the backend directory
    pub poll_interval: u64,
}

/// The site document
///
/// Persisted as JSON, read on every request and replaced wholesale on update.
/// A document written later may omit keys; reads fill each missing field
/// independently and never rewrite the stored file.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    /// Route that serves the embedded dashboard (empty disables it)
    #[serde(default)]
    pub dashboard_route: String,
    /// Directory whose files are served as site content
    #[serde(default = "default_webroot")]
    pub webroot: String,
    /// Page served for the root path when present (empty means unset)
    #[serde(default)]
    pub default_page: String,
    /// URL path to relative content path, consulted after the built-in rules
    #[serde(default)]
    pub routes: HashMap<String, String>,
}

fn default_webroot() -> String {
    "content".to_string()
}

impl Default for SiteConfig {
    /// First-run document
    fn default() -> Self {
        Self {
            dashboard_route: "/dashboard".to_string(),
            webroot: default_webroot(),
            default_page: "index.html".to_string(),
            routes: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_defaults() {
        let site = SiteConfig::default();
        assert_eq!(site.dashboard_route, "/dashboard");
        assert_eq!(site.webroot, "content");
        assert_eq!(site.default_page, "index.html");
        assert!(site.routes.is_empty());
    }

    #[test]
    fn test_site_document_missing_keys() {
        // A document rewritten without some keys still loads, field by field
        let site: SiteConfig = serde_json::from_str(r#"{"routes":{"/about":"pages/about.html"}}"#)
            .expect("partial document should deserialize");
        assert_eq!(site.webroot, "content");
        assert_eq!(site.dashboard_route, "");
        assert_eq!(site.default_page, "");
        assert_eq!(
            site.routes.get("/about").map(String::as_str),
            Some("pages/about.html")
        );
    }

    #[test]
    fn test_site_document_round_trip() {
        let mut site = SiteConfig::default();
        site.routes
            .insert("/about".to_string(), "pages/about.html".to_string());
        let json = serde_json::to_string(&site).expect("serialize");
        let back: SiteConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(site, back);
    }
}
