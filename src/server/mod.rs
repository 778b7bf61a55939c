// Server module entry
// Listener construction, the accept loop, and shutdown signals

pub mod connection;
pub mod listener;
pub mod signal;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::AppState;
use crate::logger;

pub use listener::create_listener;
pub use signal::start_signal_handler;

/// Run the accept loop until a shutdown is requested
pub async fn run(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Arc::clone(&state.shutdown);
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                        );
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = shutdown.notified() => {
                logger::log_shutdown("Stopping accept loop");
                return Ok(());
            }
        }
    }
}
