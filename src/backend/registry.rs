// Backend registry
// Tracks loaded modules and publishes their routes as an immutable snapshot.
// Readers clone the current Arc and keep serving from it; every mount or
// unmount rebuilds the snapshot and swaps it in, so a request that is mid
// dispatch never observes a half-updated route set.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::RwLock;

use super::module::{BackendRoute, RouteProvider};

/// Immutable view of every mounted route
#[derive(Debug, Default)]
pub struct RouteSet {
    routes: HashMap<String, BackendRoute>,
}

impl RouteSet {
    pub fn find(&self, path: &str) -> Option<&BackendRoute> {
        self.routes.get(path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Per-module bookkeeping
struct ModuleRecord {
    load_time: SystemTime,
    routes: Vec<BackendRoute>,
}

/// Registry of mounted backend modules
pub struct BackendRegistry {
    modules: RwLock<HashMap<String, ModuleRecord>>,
    live: RwLock<Arc<RouteSet>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            modules: RwLock::new(HashMap::new()),
            live: RwLock::new(Arc::new(RouteSet::default())),
        }
    }

    /// Current route snapshot; valid for as long as the caller holds it
    pub async fn snapshot(&self) -> Arc<RouteSet> {
        Arc::clone(&*self.live.read().await)
    }

    /// Load times of every tracked module, keyed by name
    pub async fn load_times(&self) -> HashMap<String, SystemTime> {
        self.modules
            .read()
            .await
            .iter()
            .map(|(name, record)| (name.clone(), record.load_time))
            .collect()
    }

    /// Mount a provider's routes, replacing any prior mount under its name
    pub async fn mount<P: RouteProvider>(&self, provider: &P, load_time: SystemTime) -> usize {
        let mut modules = self.modules.write().await;
        let routes = provider.routes().to_vec();
        let count = routes.len();
        modules.insert(provider.name().to_string(), ModuleRecord { load_time, routes });
        self.republish(&modules).await;
        count
    }

    /// Drop a module and its routes; false when the name was never mounted
    pub async fn unmount(&self, name: &str) -> bool {
        let mut modules = self.modules.write().await;
        let removed = modules.remove(name).is_some();
        if removed {
            self.republish(&modules).await;
        }
        removed
    }

    /// Rebuild the live snapshot from the module table and swap it in
    ///
    /// Modules are folded in name order, so a path claimed by two modules
    /// deterministically belongs to the later name.
    async fn republish(&self, modules: &HashMap<String, ModuleRecord>) {
        let mut names: Vec<&String> = modules.keys().collect();
        names.sort();

        let mut routes = HashMap::new();
        for name in names {
            for route in &modules[name].routes {
                routes.insert(route.path.clone(), route.clone());
            }
        }

        *self.live.write().await = Arc::new(RouteSet { routes });
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::module::RouteAction;

    struct StubProvider {
        name: String,
        routes: Vec<BackendRoute>,
    }

    impl RouteProvider for StubProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn routes(&self) -> &[BackendRoute] {
            &self.routes
        }
    }

    fn direct(path: &str, body: &str) -> BackendRoute {
        BackendRoute {
            path: path.to_string(),
            action: RouteAction::Direct {
                status: 200,
                body: body.to_string(),
                content_type: None,
            },
        }
    }

    fn provider(name: &str, routes: Vec<BackendRoute>) -> StubProvider {
        StubProvider {
            name: name.to_string(),
            routes,
        }
    }

    #[tokio::test]
    async fn test_mount_publishes_routes() {
        let registry = BackendRegistry::new();
        registry
            .mount(&provider("hello", vec![direct("/api/hello", "hi")]), SystemTime::now())
            .await;

        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.find("/api/hello").is_some());
        assert!(snapshot.find("/api/other").is_none());
    }

    #[tokio::test]
    async fn test_remount_replaces_not_duplicates() {
        let registry = BackendRegistry::new();
        registry
            .mount(
                &provider("mod", vec![direct("/one", "v1"), direct("/two", "v1")]),
                SystemTime::now(),
            )
            .await;
        registry
            .mount(&provider("mod", vec![direct("/one", "v2")]), SystemTime::now())
            .await;

        let snapshot = registry.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        // The surviving route answers with the new implementation
        match &snapshot.find("/one").expect("route").action {
            RouteAction::Direct { body, .. } => assert_eq!(body, "v2"),
            other => panic!("unexpected action {other:?}"),
        }
        assert!(snapshot.find("/two").is_none());
    }

    #[tokio::test]
    async fn test_unmount_removes_only_named_module() {
        let registry = BackendRegistry::new();
        registry
            .mount(&provider("a", vec![direct("/a", "")]), SystemTime::now())
            .await;
        registry
            .mount(&provider("b", vec![direct("/b", "")]), SystemTime::now())
            .await;

        assert!(registry.unmount("a").await);
        assert!(!registry.unmount("a").await);

        let snapshot = registry.snapshot().await;
        assert!(snapshot.find("/a").is_none());
        assert!(snapshot.find("/b").is_some());
    }

    #[tokio::test]
    async fn test_held_snapshot_survives_unmount() {
        // A reader that grabbed the snapshot before an unmount keeps a
        // consistent view; the swap never mutates in place
        let registry = BackendRegistry::new();
        registry
            .mount(&provider("m", vec![direct("/r", "")]), SystemTime::now())
            .await;

        let held = registry.snapshot().await;
        registry.unmount("m").await;

        assert!(held.find("/r").is_some());
        assert!(registry.snapshot().await.find("/r").is_none());
    }

    #[tokio::test]
    async fn test_path_collision_resolves_by_name_order() {
        let registry = BackendRegistry::new();
        registry
            .mount(&provider("aaa", vec![direct("/shared", "from aaa")]), SystemTime::now())
            .await;
        registry
            .mount(&provider("zzz", vec![direct("/shared", "from zzz")]), SystemTime::now())
            .await;

        let snapshot = registry.snapshot().await;
        match &snapshot.find("/shared").expect("route").action {
            RouteAction::Direct { body, .. } => assert_eq!(body, "from zzz"),
            other => panic!("unexpected action {other:?}"),
        }
    }
}
