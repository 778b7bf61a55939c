//! Path resolution module
//!
//! The fallback chain that turns a request path into something to serve.
//! Evaluated fresh per request against a freshly loaded site document, so
//! the same document and content tree always resolve the same way.

use std::path::PathBuf;

use crate::config::SiteConfig;
use crate::content::{ContentError, ContentStore};

/// Outcome of the fallback chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Embedded dashboard page
    Dashboard,
    /// Embedded landing page for an empty site
    Placeholder,
    /// A file on disk, with the status to serve it under
    Page { path: PathBuf, status: u16 },
    /// Embedded fallback page, status 404
    NotFound,
}

/// Strip surrounding slashes and re-prefix exactly one
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    format!("/{trimmed}")
}

/// Resolve a normalized request path; first matching rule wins
///
/// Order: dashboard route, empty-site placeholder, default page, first
/// top-level HTML page, route table, direct file, custom 404 page, built-in
/// 404 page.
pub async fn resolve(
    path: &str,
    site: &SiteConfig,
    store: &ContentStore,
) -> Result<Resolution, ContentError> {
    if !site.dashboard_route.is_empty() && path == normalize_path(&site.dashboard_route) {
        return Ok(Resolution::Dashboard);
    }

    if path == "/" {
        if store.is_empty().await? {
            return Ok(Resolution::Placeholder);
        }

        if !site.default_page.is_empty() && store.exists(&site.default_page).await {
            if let Ok(page) = store.resolve(&site.default_page) {
                return Ok(Resolution::Page {
                    path: page,
                    status: 200,
                });
            }
        }

        if let Some(first) = store.first_html().await? {
            if let Ok(page) = store.resolve(&first) {
                return Ok(Resolution::Page {
                    path: page,
                    status: 200,
                });
            }
        }
    }

    if let Some(target) = site.routes.get(path) {
        if store.exists(target).await {
            if let Ok(page) = store.resolve(target) {
                return Ok(Resolution::Page {
                    path: page,
                    status: 200,
                });
            }
        }
    }

    let relative = path.trim_start_matches('/');
    if !relative.is_empty() && store.exists(relative).await {
        if let Ok(page) = store.resolve(relative) {
            return Ok(Resolution::Page {
                path: page,
                status: 200,
            });
        }
    }

    if store.exists("404.html").await {
        if let Ok(page) = store.resolve("404.html") {
            return Ok(Resolution::Page {
                path: page,
                status: 404,
            });
        }
    }

    Ok(Resolution::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(webroot: &std::path::Path) -> SiteConfig {
        SiteConfig {
            dashboard_route: "/dashboard".to_string(),
            webroot: webroot.to_string_lossy().into_owned(),
            default_page: String::new(),
            routes: std::collections::HashMap::new(),
        }
    }

    fn fixture() -> (tempfile::TempDir, SiteConfig, ContentStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let webroot = dir.path().join("content");
        let site = site(&webroot);
        let store = ContentStore::new(&webroot);
        (dir, site, store)
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/about/"), "/about");
        assert_eq!(normalize_path("about"), "/about");
        assert_eq!(normalize_path("//about//"), "/about");
        // Idempotent
        assert_eq!(normalize_path(&normalize_path("/x/")), "/x");
    }

    #[tokio::test]
    async fn test_empty_site_root_gets_placeholder() {
        let (_dir, site, store) = fixture();
        let res = resolve("/", &site, &store).await.expect("resolve");
        assert_eq!(res, Resolution::Placeholder);
    }

    #[tokio::test]
    async fn test_root_serves_first_html_without_default_page() {
        let (_dir, site, store) = fixture();
        store.write("zeta.html", b"z").await.expect("write");
        store.write("index.html", b"i").await.expect("write");

        match resolve("/", &site, &store).await.expect("resolve") {
            Resolution::Page { path, status } => {
                assert_eq!(status, 200);
                assert!(path.ends_with("index.html"));
            }
            other => panic!("expected page, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_root_prefers_configured_default_page() {
        let (_dir, mut site, store) = fixture();
        site.default_page = "home.html".to_string();
        store.write("aaa.html", b"a").await.expect("write");
        store.write("home.html", b"h").await.expect("write");

        match resolve("/", &site, &store).await.expect("resolve") {
            Resolution::Page { path, status } => {
                assert_eq!(status, 200);
                assert!(path.ends_with("home.html"));
            }
            other => panic!("expected page, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_default_page_falls_through() {
        let (_dir, mut site, store) = fixture();
        site.default_page = "gone.html".to_string();
        store.write("first.html", b"f").await.expect("write");

        match resolve("/", &site, &store).await.expect("resolve") {
            Resolution::Page { path, .. } => assert!(path.ends_with("first.html")),
            other => panic!("expected page, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_route_table_entry_serves_target() {
        let (_dir, mut site, store) = fixture();
        site.routes
            .insert("/about".to_string(), "pages/about.html".to_string());
        store
            .write("pages/about.html", b"<h1>about</h1>")
            .await
            .expect("write");

        match resolve("/about", &site, &store).await.expect("resolve") {
            Resolution::Page { path, status } => {
                assert_eq!(status, 200);
                assert!(path.ends_with("pages/about.html"));
            }
            other => panic!("expected page, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_direct_file_match() {
        let (_dir, site, store) = fixture();
        store.write("docs/guide.txt", b"g").await.expect("write");

        match resolve("/docs/guide.txt", &site, &store).await.expect("resolve") {
            Resolution::Page { path, status } => {
                assert_eq!(status, 200);
                assert!(path.ends_with("docs/guide.txt"));
            }
            other => panic!("expected page, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_match_without_custom_page_is_builtin_404() {
        let (_dir, site, store) = fixture();
        store.write("index.html", b"i").await.expect("write");

        let res = resolve("/missing", &site, &store).await.expect("resolve");
        assert_eq!(res, Resolution::NotFound);
    }

    #[tokio::test]
    async fn test_custom_404_page_served_with_404_status() {
        let (_dir, site, store) = fixture();
        store.write("404.html", b"lost").await.expect("write");

        match resolve("/missing", &site, &store).await.expect("resolve") {
            Resolution::Page { path, status } => {
                assert_eq!(status, 404);
                assert!(path.ends_with("404.html"));
            }
            other => panic!("expected page, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dashboard_route_wins_first() {
        let (_dir, site, store) = fixture();
        store.write("dashboard", b"a file named dashboard").await.expect("write");

        let res = resolve("/dashboard", &site, &store).await.expect("resolve");
        assert_eq!(res, Resolution::Dashboard);
    }

    #[tokio::test]
    async fn test_traversal_paths_resolve_to_404() {
        let (_dir, site, store) = fixture();
        store.write("index.html", b"i").await.expect("write");

        let res = resolve("/../secrets.txt", &site, &store).await.expect("resolve");
        assert_eq!(res, Resolution::NotFound);
    }

    #[tokio::test]
    async fn test_resolution_is_deterministic() {
        let (_dir, mut site, store) = fixture();
        site.routes
            .insert("/about".to_string(), "pages/about.html".to_string());
        store.write("pages/about.html", b"a").await.expect("write");
        store.write("index.html", b"i").await.expect("write");

        for path in ["/", "/about", "/index.html", "/missing"] {
            let first = resolve(path, &site, &store).await.expect("resolve");
            let second = resolve(path, &site, &store).await.expect("resolve");
            assert_eq!(first, second, "resolution of {path} changed between calls");
        }
    }
}
