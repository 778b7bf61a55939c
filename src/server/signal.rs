// Signal handling module
//
// SIGTERM and SIGINT both request a graceful stop of the accept loop.

use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Start the signal listener (Unix)
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let Ok(mut sigterm) = signal(SignalKind::terminate()) else {
            logger::log_error("Failed to register SIGTERM handler");
            return;
        };
        let Ok(mut sigint) = signal(SignalKind::interrupt()) else {
            logger::log_error("Failed to register SIGINT handler");
            return;
        };

        tokio::select! {
            _ = sigterm.recv() => logger::log_shutdown("SIGTERM received"),
            _ = sigint.recv() => logger::log_shutdown("SIGINT received (Ctrl+C)"),
        }
        shutdown.notify_waiters();
    });
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logger::log_shutdown("Ctrl+C received");
            shutdown.notify_waiters();
        }
    });
}
