//! Logger module
//!
//! Console and file logging for server lifecycle, request access lines, and
//! backend mount/unmount events.

pub mod writer;

use std::net::SocketAddr;

use chrono::Local;
use hyper::{Method, Uri, Version};

use crate::config::Config;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
pub fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Content server started");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Site document: {}", config.server.site_config));
    write_info(&format!("Server name: {}", config.http.server_name));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

/// Log one incoming request as an access line
pub fn log_request(method: &Method, uri: &Uri, version: Version) {
    write_info(&format_access_line(method.as_str(), uri.path(), version));
}

pub fn log_response(bytes: usize) {
    write_info(&format!("[Response] {bytes} bytes"));
}

pub fn log_api_request(method: &str, path: &str, status: u16) {
    write_info(&format!("[API] {method} {path} - {status}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

pub fn log_mount(module: &str, routes: usize) {
    write_info(&format!("[WATCH] Mounted '{module}' ({routes} routes)"));
}

pub fn log_unmount(module: &str) {
    write_info(&format!("[WATCH] Unmounted '{module}'"));
}

pub fn log_watch_error(message: &str) {
    write_error(&format!("[WATCH] {message}"));
}

pub fn log_shutdown(reason: &str) {
    write_info(&format!("\n[SHUTDOWN] {reason}"));
}

/// Format a common-log style access line
fn format_access_line(method: &str, path: &str, version: Version) -> String {
    let ts = Local::now().format("%d/%b/%Y:%H:%M:%S %z");
    format!("[{ts}] \"{method} {path} {version:?}\"")
}
