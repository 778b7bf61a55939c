// API handlers module
// CRUD over the site document and the content tree

use http_body_util::BodyExt;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};

use super::response::{bad_request, error_response, json_response, server_error};
use crate::config::{AppState, SiteConfig};
use crate::content::{ContentError, ContentStore, UPLOADS_SUBDIR};
use crate::logger;

/// GET /api/config
pub async fn config_get(state: &AppState) -> Response<Full<Bytes>> {
    match state.site.load().await {
        Ok(doc) => {
            logger::log_api_request("GET", "/api/config", 200);
            json_response(StatusCode::OK, &doc)
        }
        Err(e) => {
            logger::log_error(&e.to_string());
            logger::log_api_request("GET", "/api/config", 500);
            server_error("site document unavailable")
        }
    }
}

/// POST /api/config - replace the document wholesale, echo what was written
pub async fn config_post(
    req: Request<hyper::body::Incoming>,
    state: &AppState,
) -> Response<Full<Bytes>> {
    let Ok(collected) = req.collect().await else {
        logger::log_api_request("POST", "/api/config", 400);
        return bad_request("failed to read request body");
    };

    let doc: SiteConfig = match serde_json::from_slice(&collected.to_bytes()) {
        Ok(doc) => doc,
        Err(e) => {
            logger::log_api_request("POST", "/api/config", 400);
            return bad_request(&format!("invalid JSON: {e}"));
        }
    };

    match state.site.save(&doc).await {
        Ok(()) => {
            logger::log_api_request("POST", "/api/config", 200);
            json_response(StatusCode::OK, &doc)
        }
        Err(e) => {
            logger::log_error(&e.to_string());
            logger::log_api_request("POST", "/api/config", 500);
            server_error("failed to persist site document")
        }
    }
}

/// GET /api/content
pub async fn content_list(state: &AppState) -> Response<Full<Bytes>> {
    let store = match content_store(state).await {
        Ok(store) => store,
        Err(resp) => return resp,
    };

    match store.list().await {
        Ok(entries) => {
            logger::log_api_request("GET", "/api/content", 200);
            json_response(StatusCode::OK, &entries)
        }
        Err(e) => {
            logger::log_error(&e.to_string());
            logger::log_api_request("GET", "/api/content", 500);
            server_error("failed to enumerate content")
        }
    }
}

/// GET /api/content/{path}
pub async fn content_read(state: &AppState, relative: &str) -> Response<Full<Bytes>> {
    let store = match content_store(state).await {
        Ok(store) => store,
        Err(resp) => return resp,
    };

    match store.read_text(relative).await {
        Ok(content) => {
            logger::log_api_request("GET", "/api/content/...", 200);
            json_response(
                StatusCode::OK,
                &serde_json::json!({ "path": relative, "content": content }),
            )
        }
        // Missing files answer 200 with an error body on this endpoint
        Err(ContentError::NotFound(_)) => {
            logger::log_api_request("GET", "/api/content/...", 200);
            error_response(StatusCode::OK, "file not found")
        }
        Err(ContentError::InvalidPath(p)) => {
            logger::log_api_request("GET", "/api/content/...", 400);
            bad_request(&format!("invalid content path: {p}"))
        }
        Err(e) => {
            logger::log_error(&e.to_string());
            logger::log_api_request("GET", "/api/content/...", 500);
            server_error("failed to read file")
        }
    }
}

/// POST /api/content/{path} - raw body becomes the file
pub async fn content_write(
    req: Request<hyper::body::Incoming>,
    state: &AppState,
    relative: &str,
) -> Response<Full<Bytes>> {
    let store = match content_store(state).await {
        Ok(store) => store,
        Err(resp) => return resp,
    };

    let Ok(collected) = req.collect().await else {
        logger::log_api_request("POST", "/api/content/...", 400);
        return bad_request("failed to read request body");
    };
    let bytes = collected.to_bytes();

    match store.write(relative, &bytes).await {
        Ok(written) => {
            logger::log_api_request("POST", "/api/content/...", 200);
            json_response(
                StatusCode::OK,
                &serde_json::json!({ "status": "ok", "written": written }),
            )
        }
        Err(ContentError::InvalidPath(p)) => {
            logger::log_api_request("POST", "/api/content/...", 400);
            bad_request(&format!("invalid content path: {p}"))
        }
        Err(e) => {
            logger::log_error(&e.to_string());
            logger::log_api_request("POST", "/api/content/...", 500);
            server_error("failed to write file")
        }
    }
}

/// DELETE /api/content/{path}
pub async fn content_delete(state: &AppState, relative: &str) -> Response<Full<Bytes>> {
    let store = match content_store(state).await {
        Ok(store) => store,
        Err(resp) => return resp,
    };

    match store.delete(relative).await {
        Ok(()) => {
            logger::log_api_request("DELETE", "/api/content/...", 200);
            json_response(StatusCode::OK, &serde_json::json!({ "status": "ok" }))
        }
        Err(ContentError::NotFound(_)) => {
            logger::log_api_request("DELETE", "/api/content/...", 404);
            error_response(StatusCode::NOT_FOUND, "file not found")
        }
        Err(ContentError::InvalidPath(p)) => {
            logger::log_api_request("DELETE", "/api/content/...", 400);
            bad_request(&format!("invalid content path: {p}"))
        }
        Err(e) => {
            logger::log_error(&e.to_string());
            logger::log_api_request("DELETE", "/api/content/...", 500);
            server_error("failed to delete file")
        }
    }
}

/// GET /api/files - map of uploaded file paths to their text content
pub async fn files(state: &AppState) -> Response<Full<Bytes>> {
    let site = match state.site.load().await {
        Ok(site) => site,
        Err(e) => {
            logger::log_error(&e.to_string());
            logger::log_api_request("GET", "/api/files", 500);
            return server_error("site document unavailable");
        }
    };

    let uploads = ContentStore::new(std::path::Path::new(&site.webroot).join(UPLOADS_SUBDIR));
    let entries = match uploads.list().await {
        Ok(entries) => entries,
        Err(e) => {
            logger::log_error(&e.to_string());
            logger::log_api_request("GET", "/api/files", 500);
            return server_error("failed to enumerate uploads");
        }
    };

    let mut map = serde_json::Map::new();
    for entry in entries {
        match uploads.read_text(&entry.path).await {
            Ok(text) => {
                map.insert(entry.path, serde_json::Value::String(text));
            }
            // Raced with a delete; skip the entry
            Err(ContentError::NotFound(_)) => {}
            Err(e) => {
                logger::log_error(&e.to_string());
                logger::log_api_request("GET", "/api/files", 500);
                return server_error("failed to read upload");
            }
        }
    }

    logger::log_api_request("GET", "/api/files", 200);
    json_response(StatusCode::OK, &serde_json::Value::Object(map))
}

/// Build the content store from a freshly loaded site document
async fn content_store(state: &AppState) -> Result<ContentStore, Response<Full<Bytes>>> {
    match state.site.load().await {
        Ok(site) => Ok(ContentStore::new(site.webroot)),
        Err(e) => {
            logger::log_error(&e.to_string());
            Err(server_error("site document unavailable"))
        }
    }
}
