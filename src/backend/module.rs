// Backend module definitions
// A module is a TOML file in the watched directory declaring extra routes.
// Example:
//
//   [[route]]
//   path = "/api/hello"
//   type = "direct"
//   content_type = "application/json"
//   body = '{"message": "hello"}'
//
//   [[route]]
//   path = "/team"
//   type = "file"
//   file = "pages/team.html"

use std::path::Path;
use std::time::SystemTime;

use serde::Deserialize;
use thiserror::Error;

/// Errors loading a module file
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("failed to read module {name}: {source}")]
    Read {
        name: String,
        source: std::io::Error,
    },
    #[error("module {name} is not valid TOML: {source}")]
    Parse {
        name: String,
        source: toml::de::Error,
    },
    #[error("module file has no usable name: {0}")]
    Name(String),
}

/// What a declared route answers with
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteAction {
    /// Inline response body
    Direct {
        #[serde(default = "default_status")]
        status: u16,
        #[serde(default)]
        body: String,
        #[serde(default)]
        content_type: Option<String>,
    },
    /// Serve a file relative to the webroot
    File { file: String },
    /// HTTP redirect
    Redirect { target: String },
}

#[allow(clippy::missing_const_for_fn)]
fn default_status() -> u16 {
    200
}

/// One route declared by a module
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct BackendRoute {
    pub path: String,
    #[serde(flatten)]
    pub action: RouteAction,
}

/// On-disk module document
#[derive(Debug, Deserialize, Default)]
struct ModuleDoc {
    #[serde(default, rename = "route")]
    routes: Vec<BackendRoute>,
}

/// Anything that can contribute routes to the live router
pub trait RouteProvider {
    fn name(&self) -> &str;
    fn routes(&self) -> &[BackendRoute];
}

/// A loaded module file
#[derive(Debug, Clone)]
pub struct BackendModule {
    pub name: String,
    pub load_time: SystemTime,
    pub routes: Vec<BackendRoute>,
}

impl RouteProvider for BackendModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn routes(&self) -> &[BackendRoute] {
        &self.routes
    }
}

impl BackendModule {
    /// Load and parse a module file
    pub async fn load(path: &Path) -> Result<Self, ModuleError> {
        let name = module_name(path)?;
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ModuleError::Read {
                name: name.clone(),
                source,
            })?;
        let routes = parse_module(&name, &text)?;
        Ok(Self {
            name,
            load_time: SystemTime::now(),
            routes,
        })
    }
}

fn parse_module(name: &str, text: &str) -> Result<Vec<BackendRoute>, ModuleError> {
    let doc: ModuleDoc = toml::from_str(text).map_err(|source| ModuleError::Parse {
        name: name.to_string(),
        source,
    })?;
    Ok(doc.routes)
}

/// Module identity is the file stem
pub fn module_name(path: &Path) -> Result<String, ModuleError> {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ModuleError::Name(path.display().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_direct_route() {
        let routes = parse_module(
            "hello",
            r#"
[[route]]
path = "/api/hello"
type = "direct"
content_type = "application/json"
body = '{"message": "hello"}'
"#,
        )
        .expect("parse");
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path, "/api/hello");
        match &routes[0].action {
            RouteAction::Direct {
                status,
                body,
                content_type,
            } => {
                assert_eq!(*status, 200);
                assert_eq!(body, r#"{"message": "hello"}"#);
                assert_eq!(content_type.as_deref(), Some("application/json"));
            }
            other => panic!("expected direct action, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_file_and_redirect_routes() {
        let routes = parse_module(
            "pages",
            r#"
[[route]]
path = "/team"
type = "file"
file = "pages/team.html"

[[route]]
path = "/old"
type = "redirect"
target = "/team"
"#,
        )
        .expect("parse");
        assert_eq!(routes.len(), 2);
        assert_eq!(
            routes[0].action,
            RouteAction::File {
                file: "pages/team.html".to_string()
            }
        );
        assert_eq!(
            routes[1].action,
            RouteAction::Redirect {
                target: "/team".to_string()
            }
        );
    }

    #[test]
    fn test_parse_error_is_reported_not_panicked() {
        match parse_module("broken", "[[route]\npath = ") {
            Err(ModuleError::Parse { name, .. }) => assert_eq!(name, "broken"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_module_declares_no_routes() {
        let routes = parse_module("empty", "").expect("parse");
        assert!(routes.is_empty());
    }

    #[test]
    fn test_module_name_from_stem() {
        assert_eq!(
            module_name(Path::new("content/backend/hello.toml")).expect("name"),
            "hello"
        );
        assert!(module_name(Path::new("")).is_err());
    }
}
