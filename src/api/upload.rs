// Upload receiver module
// Multipart uploads land in a fixed directory under the webroot. The client
// filename is kept after sanitization; a repeated name overwrites the
// previous upload.

use std::convert::Infallible;

use futures::stream;
use http_body_util::BodyExt;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};

use super::response::{bad_request, json_response, server_error};
use crate::config::AppState;
use crate::content::{ContentStore, UPLOADS_SUBDIR};
use crate::logger;

/// POST /api/upload
pub async fn receive(
    req: Request<hyper::body::Incoming>,
    state: &AppState,
) -> Response<Full<Bytes>> {
    let site = match state.site.load().await {
        Ok(site) => site,
        Err(e) => {
            logger::log_error(&e.to_string());
            logger::log_api_request("POST", "/api/upload", 500);
            return server_error("site document unavailable");
        }
    };
    let store = ContentStore::new(site.webroot);

    let boundary = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok());
    let Some(boundary) = boundary else {
        logger::log_api_request("POST", "/api/upload", 400);
        return bad_request("expected multipart/form-data body");
    };

    let Ok(collected) = req.collect().await else {
        logger::log_api_request("POST", "/api/upload", 400);
        return bad_request("failed to read request body");
    };
    let body = collected.to_bytes();

    let mut multipart = multer::Multipart::new(
        stream::once(async move { Ok::<Bytes, Infallible>(body) }),
        boundary,
    );

    let mut accepted = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                logger::log_api_request("POST", "/api/upload", 400);
                return bad_request(&format!("malformed multipart body: {e}"));
            }
        };

        let Some(raw_name) = field.file_name().map(ToString::to_string) else {
            // Non-file form fields are ignored
            continue;
        };
        let Some(name) = sanitize_filename(&raw_name) else {
            logger::log_warning(&format!("Rejected upload filename {raw_name:?}"));
            continue;
        };

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => {
                logger::log_api_request("POST", "/api/upload", 400);
                return bad_request(&format!("failed to read upload: {e}"));
            }
        };

        if let Err(e) = store.write(&format!("{UPLOADS_SUBDIR}/{name}"), &data).await {
            logger::log_error(&e.to_string());
            logger::log_api_request("POST", "/api/upload", 500);
            return server_error("failed to store upload");
        }
        accepted.push(name);
    }

    logger::log_api_request("POST", "/api/upload", 200);
    json_response(
        StatusCode::OK,
        &serde_json::json!({ "status": "success", "files": accepted }),
    )
}

/// Reduce a client-supplied filename to a single safe path component
///
/// Control characters are dropped, separators and shell-hostile characters
/// become underscores, and surrounding dots and spaces are trimmed. Returns
/// `None` when nothing usable remains.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let cleaned: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect();

    let cleaned = cleaned.trim_matches(|c| c == '.' || c == ' ');
    if cleaned.is_empty() {
        return None;
    }

    if cleaned.len() > 255 {
        return Some(cleaned[..255].to_string());
    }
    Some(cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_plain_names() {
        assert_eq!(sanitize_filename("report.html").as_deref(), Some("report.html"));
        assert_eq!(sanitize_filename("notes 2026.txt").as_deref(), Some("notes 2026.txt"));
    }

    #[test]
    fn test_sanitize_flattens_separators() {
        assert_eq!(
            sanitize_filename("../../etc/passwd").as_deref(),
            Some("_.._etc_passwd")
        );
        assert_eq!(sanitize_filename("a\\b/c").as_deref(), Some("a_b_c"));
    }

    #[test]
    fn test_sanitize_rejects_empty_results() {
        assert!(sanitize_filename("").is_none());
        assert!(sanitize_filename("...").is_none());
        assert!(sanitize_filename("  ").is_none());
        assert!(sanitize_filename("\u{1}\u{2}").is_none());
    }
}
