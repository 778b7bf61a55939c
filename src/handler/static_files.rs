//! Static file serving module
//!
//! Turns resolutions and backend routes into responses: file loading, MIME
//! detection, cache validation, and the embedded fallback pages.

use std::path::Path;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use tokio::fs;

use crate::backend::{BackendRoute, RouteAction};
use crate::content::ContentStore;
use crate::handler::resolve::Resolution;
use crate::http::{self, cache, mime};
use crate::logger;

/// Per-request details the serving layer cares about
pub struct ServeContext {
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub access_log: bool,
}

/// Serve whatever the fallback chain resolved to
pub async fn serve_resolution(resolution: Resolution, ctx: &ServeContext) -> Response<Full<Bytes>> {
    match resolution {
        Resolution::Dashboard => {
            http::build_html_response(dashboard_page().to_string(), 200, ctx.is_head)
        }
        Resolution::Placeholder => {
            http::build_html_response(placeholder_page(), 200, ctx.is_head)
        }
        Resolution::Page { path, status } => serve_path(&path, status, ctx).await,
        Resolution::NotFound => {
            http::build_html_response(fallback_not_found_page(), 404, ctx.is_head)
        }
    }
}

/// Serve a route declared by a backend module
pub async fn serve_backend_route(
    route: &BackendRoute,
    store: &ContentStore,
    ctx: &ServeContext,
) -> Response<Full<Bytes>> {
    match &route.action {
        RouteAction::Direct {
            status,
            body,
            content_type,
        } => http::build_direct_response(*status, body, content_type.as_deref(), ctx.is_head),
        RouteAction::File { file } => match store.resolve(file) {
            Ok(path) => serve_path(&path, 200, ctx).await,
            Err(e) => {
                logger::log_warning(&format!("Backend route '{}': {e}", route.path));
                http::build_html_response(fallback_not_found_page(), 404, ctx.is_head)
            }
        },
        RouteAction::Redirect { target } => http::build_redirect_response(target),
    }
}

/// Load a file and answer with cache validation headers
async fn serve_path(path: &Path, status: u16, ctx: &ServeContext) -> Response<Full<Bytes>> {
    let content = match fs::read(path).await {
        Ok(content) => content,
        Err(e) => {
            // Resolved a moment ago but gone now; answer like any other miss
            logger::log_warning(&format!("Failed to read '{}': {e}", path.display()));
            return http::build_html_response(fallback_not_found_page(), 404, ctx.is_head);
        }
    };

    let content_type = mime::get_content_type(path.extension().and_then(|e| e.to_str()));
    let etag = cache::generate_etag(&content);
    if status == 200 && cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
        return http::build_304_response(&etag);
    }

    if ctx.access_log {
        logger::log_response(content.len());
    }
    http::response::build_cached_response(
        Bytes::from(content),
        content_type,
        &etag,
        status,
        ctx.is_head,
    )
}

/// Embedded dashboard page
fn dashboard_page() -> &'static str {
    include_str!("dashboard.html")
}

/// Landing page shown while the site has no content yet
fn placeholder_page() -> String {
    String::from(
        r"<!DOCTYPE html>
<html>
<head>
    <meta charset=utf-8>
    <meta name=viewport content='width=device-width, initial-scale=1'>
    <title>liveserve</title>
    <style>
        body { font-family: -apple-system, 'Segoe UI', Roboto, sans-serif;
               display: flex; align-items: center; justify-content: center;
               min-height: 100vh; margin: 0; background: #f4f4f5; color: #27272a; }
        .card { text-align: center; padding: 3rem; background: white;
                border-radius: 12px; box-shadow: 0 1px 4px rgba(0,0,0,0.1); }
        h1 { margin: 0 0 0.5rem; }
        p { color: #71717a; }
        code { background: #f4f4f5; padding: 0.15rem 0.4rem; border-radius: 4px; }
    </style>
</head>
<body>
    <div class=card>
        <h1>Nothing here yet</h1>
        <p>This site has no content. Upload files through the dashboard
           or <code>POST /api/content/&lt;path&gt;</code> to get started.</p>
    </div>
</body>
</html>",
    )
}

/// Built-in page when nothing matched and the site has no 404.html
fn fallback_not_found_page() -> String {
    String::from(
        r"<!DOCTYPE html>
<html>
<head>
    <meta charset=utf-8>
    <title>404 Not Found</title>
    <style>
        body { font-family: -apple-system, 'Segoe UI', Roboto, sans-serif;
               display: flex; align-items: center; justify-content: center;
               min-height: 100vh; margin: 0; background: #f4f4f5; color: #27272a; }
        .card { text-align: center; }
        h1 { font-size: 4rem; margin: 0; color: #a1a1aa; }
    </style>
</head>
<body>
    <div class=card>
        <h1>404</h1>
        <p>The requested page does not exist.</p>
    </div>
</body>
</html>",
    )
}
