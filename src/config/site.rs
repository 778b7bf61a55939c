// Site document store
// Owns the config.json document: creation with defaults, per-request loads,
// wholesale replacement

use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;

use super::types::SiteConfig;
use crate::logger;

/// Errors from the site document store
#[derive(Debug, Error)]
pub enum SiteConfigError {
    #[error("failed to read site document {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("site document {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("failed to write site document {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Accessor for the persisted site document
///
/// The document is not cached: every `load` reads the file again, so an edit
/// on disk takes effect on the next request.
pub struct SiteStore {
    path: PathBuf,
}

impl SiteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create the document with defaults when it does not exist yet
    pub async fn ensure(&self) -> Result<SiteConfig, SiteConfigError> {
        match fs::try_exists(&self.path).await {
            Ok(true) => self.load().await,
            _ => {
                let doc = SiteConfig::default();
                self.save(&doc).await?;
                logger::write_info(&format!(
                    "[SITE] Created default site document at {}",
                    self.path.display()
                ));
                Ok(doc)
            }
        }
    }

    /// Read the current document
    ///
    /// A malformed document is an error for the caller to surface; no default
    /// is substituted once the file exists.
    pub async fn load(&self) -> Result<SiteConfig, SiteConfigError> {
        let text = fs::read_to_string(&self.path)
            .await
            .map_err(|source| SiteConfigError::Read {
                path: self.path.display().to_string(),
                source,
            })?;
        serde_json::from_str(&text).map_err(|source| SiteConfigError::Parse {
            path: self.path.display().to_string(),
            source,
        })
    }

    /// Replace the document wholesale
    ///
    /// Writes a sibling temp file and renames it over the target, so a crash
    /// mid-write cannot leave a torn document behind.
    pub async fn save(&self, doc: &SiteConfig) -> Result<(), SiteConfigError> {
        let json = serde_json::to_string_pretty(doc).map_err(|source| SiteConfigError::Parse {
            path: self.path.display().to_string(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        let write_err = |source| SiteConfigError::Write {
            path: self.path.display().to_string(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(write_err)?;
            }
        }
        fs::write(&tmp, json).await.map_err(write_err)?;
        fs::rename(&tmp, &self.path).await.map_err(write_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_creates_defaults_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SiteStore::new(dir.path().join("config.json"));

        let created = store.ensure().await.expect("ensure");
        assert_eq!(created, SiteConfig::default());

        // A second ensure keeps an edited document intact
        let mut edited = created;
        edited.default_page = "home.html".to_string();
        store.save(&edited).await.expect("save");
        let kept = store.ensure().await.expect("ensure again");
        assert_eq!(kept.default_page, "home.html");
    }

    #[tokio::test]
    async fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SiteStore::new(dir.path().join("config.json"));

        let mut doc = SiteConfig::default();
        doc.routes
            .insert("/about".to_string(), "pages/about.html".to_string());
        store.save(&doc).await.expect("save");
        let loaded = store.load().await.expect("load");
        assert_eq!(loaded, doc);
        // The temp file does not outlive the rename
        assert!(!dir.path().join("config.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, b"{ not json").await.expect("write");

        let store = SiteStore::new(&path);
        match store.load().await {
            Err(SiteConfigError::Parse { .. }) => {}
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_load_missing_file_is_read_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SiteStore::new(dir.path().join("absent.json"));
        match store.load().await {
            Err(SiteConfigError::Read { .. }) => {}
            other => panic!("expected read error, got {other:?}"),
        }
    }
}
