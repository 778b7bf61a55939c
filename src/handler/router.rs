//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. API paths go to the API module;
//! everything else is answered by the backend route snapshot and then the
//! fallback chain, both evaluated against a freshly loaded site document.

use std::convert::Infallible;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};

use crate::api;
use crate::config::AppState;
use crate::content::ContentStore;
use crate::handler::resolve::{normalize_path, resolve};
use crate::handler::static_files::{self, ServeContext};
use crate::http;
use crate::logger;

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let access_log = state
        .cached_access_log
        .load(std::sync::atomic::Ordering::Relaxed);
    if access_log {
        logger::log_request(&method, req.uri(), req.version());
    }

    if let Some(resp) = check_body_size(&req, state.config.http.max_body_size) {
        return Ok(resp);
    }

    // API endpoints carry their own method handling
    if path == "/api" || path.starts_with("/api/") {
        return Ok(api::handle_api(req, &state).await);
    }

    if method == Method::OPTIONS {
        return Ok(http::build_options_response(state.config.http.enable_cors));
    }
    if method != Method::GET && method != Method::HEAD {
        logger::log_warning(&format!("Method not allowed: {method}"));
        return Ok(http::build_405_response());
    }

    let ctx = ServeContext {
        is_head: method == Method::HEAD,
        if_none_match: req
            .headers()
            .get("if-none-match")
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string),
        access_log,
    };

    // The site document is read fresh on every request
    let site = match state.site.load().await {
        Ok(site) => site,
        Err(e) => {
            logger::log_error(&e.to_string());
            return Ok(http::build_500_response());
        }
    };

    let normalized = normalize_path(&path);
    let store = ContentStore::new(&site.webroot);

    // Backend-module routes come ahead of the fallback chain. The snapshot
    // taken here stays valid even if the watcher swaps the live set while
    // this request is in flight.
    let snapshot = state.backends.snapshot().await;
    if let Some(route) = snapshot.find(&normalized) {
        return Ok(static_files::serve_backend_route(route, &store, &ctx).await);
    }

    match resolve(&normalized, &site, &store).await {
        Ok(resolution) => Ok(static_files::serve_resolution(resolution, &ctx).await),
        Err(e) => {
            logger::log_error(&e.to_string());
            Ok(http::build_500_response())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(
    req: &Request<hyper::body::Incoming>,
    max_body_size: u64,
) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}
