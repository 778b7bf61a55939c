// Backend watcher
// A long-lived task that polls the backend directory and reconciles the
// registry against what is on disk. The reconciliation itself is a pure
// function over (tracked load times, directory scan) so the contract holds
// whatever the scanning mechanism is.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::config::AppState;
use crate::content::BACKEND_SUBDIR;
use crate::logger;

use super::module::{module_name, BackendModule};

/// One module file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    pub name: String,
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// What one reconcile pass decided to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
    /// File not tracked yet
    Load(ScanEntry),
    /// File changed on disk after it was loaded
    Reload(ScanEntry),
    /// Tracked module whose file is gone; its routes go with it
    Unload(String),
}

/// Decide mounts and unmounts for one cycle
///
/// Loads and reloads come in scan order, unloads after them in name order.
pub fn plan(
    tracked: &HashMap<String, SystemTime>,
    scanned: &[ScanEntry],
) -> Vec<ReconcileAction> {
    let mut actions = Vec::new();

    for entry in scanned {
        match tracked.get(&entry.name) {
            None => actions.push(ReconcileAction::Load(entry.clone())),
            Some(loaded_at) if entry.modified > *loaded_at => {
                actions.push(ReconcileAction::Reload(entry.clone()));
            }
            Some(_) => {}
        }
    }

    let mut gone: Vec<String> = tracked
        .keys()
        .filter(|name| scanned.iter().all(|e| &e.name != *name))
        .cloned()
        .collect();
    gone.sort();
    actions.extend(gone.into_iter().map(ReconcileAction::Unload));

    actions
}

/// Run the watch loop until process exit
///
/// There is no shutdown hook; the task dies with the process.
pub async fn run(state: Arc<AppState>) {
    let interval = Duration::from_secs(state.config.watcher.poll_interval.max(1));
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        cycle(&state).await;
    }
}

/// One poll cycle
///
/// Any per-module failure is logged and skipped; one broken file must not
/// stall reloads of the others.
async fn cycle(state: &AppState) {
    let site = match state.site.load().await {
        Ok(site) => site,
        Err(e) => {
            logger::log_watch_error(&format!("site document unavailable: {e}"));
            return;
        }
    };

    let dir = Path::new(&site.webroot).join(BACKEND_SUBDIR);
    let scanned = scan(&dir).await;
    let tracked = state.backends.load_times().await;

    for action in plan(&tracked, &scanned) {
        match action {
            ReconcileAction::Load(entry) | ReconcileAction::Reload(entry) => {
                match BackendModule::load(&entry.path).await {
                    Ok(module) => {
                        let count = state.backends.mount(&module, module.load_time).await;
                        logger::log_mount(&module.name, count);
                    }
                    Err(e) => logger::log_watch_error(&e.to_string()),
                }
            }
            ReconcileAction::Unload(name) => {
                state.backends.unmount(&name).await;
                logger::log_unmount(&name);
            }
        }
    }
}

/// Enumerate module files; a missing directory is simply an empty scan
async fn scan(dir: &Path) -> Vec<ScanEntry> {
    let mut entries = Vec::new();
    let Ok(mut read_dir) = tokio::fs::read_dir(dir).await else {
        return entries;
    };
    while let Ok(Some(entry)) = read_dir.next_entry().await {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            continue;
        }
        let Ok(meta) = entry.metadata().await else { continue };
        if !meta.is_file() {
            continue;
        }
        let Ok(name) = module_name(&path) else { continue };
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        entries.push(ScanEntry {
            name,
            path,
            modified,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}
