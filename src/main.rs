use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

mod api;
mod backend;
mod config;
mod content;
mod handler;
mod http;
mod logger;
mod server;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::Config::load_from("config")?;
    logger::init(&cfg)?;

    // Runtime sized from the workers setting, default CPU cores
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;

    let state = Arc::new(config::AppState::new(cfg));

    // First run setup: the site document and the webroot exist before
    // anything reads them
    let site = state.site.ensure().await?;
    content::ContentStore::new(&site.webroot)
        .ensure_root()
        .await?;

    logger::log_server_start(&addr, &state.config);

    server::start_signal_handler(Arc::clone(&state.shutdown));

    // The watcher has no shutdown hook; it runs until process exit
    tokio::spawn(backend::watcher::run(Arc::clone(&state)));

    let connections = Arc::new(AtomicUsize::new(0));
    server::run(listener, state, connections).await
}
