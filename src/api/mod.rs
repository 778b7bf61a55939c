// API module entry
// CRUD endpoints over the site document and the content tree

mod handlers;
mod response;
mod upload;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};

use crate::config::AppState;
use crate::logger;

/// API route handler
///
/// Dispatches to handler functions based on request path and method.
pub async fn handle_api(
    req: Request<hyper::body::Incoming>,
    state: &AppState,
) -> Response<Full<Bytes>> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    match (&method, path.as_str()) {
        (&Method::GET, "/api/config") => handlers::config_get(state).await,
        (&Method::POST, "/api/config") => handlers::config_post(req, state).await,
        (&Method::GET, "/api/content") => handlers::content_list(state).await,
        (&Method::POST, "/api/upload") => upload::receive(req, state).await,
        (&Method::GET, "/api/files") => handlers::files(state).await,
        _ => {
            if let Some(relative) = path.strip_prefix("/api/content/") {
                return match method {
                    Method::GET => handlers::content_read(state, relative).await,
                    Method::POST => handlers::content_write(req, state, relative).await,
                    Method::DELETE => handlers::content_delete(state, relative).await,
                    _ => {
                        logger::log_api_request(method.as_str(), &path, 405);
                        crate::http::build_405_response()
                    }
                };
            }
            logger::log_api_request(method.as_str(), &path, 404);
            response::not_found()
        }
    }
}
