//! Content store
//!
//! Treats the webroot as a flat map from relative path to bytes. All access
//! goes through `resolve`, which rebuilds the relative path component by
//! component so a request can never name a file outside the webroot.

use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::Serialize;
use thiserror::Error;
use tokio::fs;
use walkdir::WalkDir;

/// Upload destination, relative to the webroot
pub const UPLOADS_SUBDIR: &str = "uploads";

/// Watched backend module directory, relative to the webroot
pub const BACKEND_SUBDIR: &str = "backend";

/// Errors from content operations
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("invalid content path: {0}")]
    InvalidPath(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One file under the webroot
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ContentEntry {
    pub path: String,
    pub size: u64,
    /// Last modification time, unix seconds
    pub modified: u64,
}

/// Handle on the webroot directory
///
/// Cheap to construct; built per request from the freshly loaded site
/// document so webroot changes apply immediately.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(webroot: impl Into<PathBuf>) -> Self {
        Self {
            root: webroot.into(),
        }
    }

    #[allow(clippy::missing_const_for_fn)]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the webroot when absent; reads expect it to exist
    pub async fn ensure_root(&self) -> Result<(), ContentError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Map a relative path to a location under the webroot
    ///
    /// Parent references, absolute components, and NUL bytes are rejected
    /// rather than resolved.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, ContentError> {
        let trimmed = relative.trim_start_matches('/');
        if trimmed.is_empty() {
            return Err(ContentError::InvalidPath(relative.to_string()));
        }

        let mut result = self.root.clone();
        for component in Path::new(trimmed).components() {
            match component {
                Component::Normal(name) => {
                    if name.to_string_lossy().contains('\0') {
                        return Err(ContentError::InvalidPath(relative.to_string()));
                    }
                    result.push(name);
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(ContentError::InvalidPath(relative.to_string()));
                }
            }
        }
        Ok(result)
    }

    /// Enumerate every regular file under the webroot
    ///
    /// Output is sorted by path for stable responses; callers must not rely
    /// on any particular order.
    pub async fn list(&self) -> Result<Vec<ContentEntry>, ContentError> {
        self.ensure_root().await?;
        let root = self.root.clone();
        let entries = tokio::task::spawn_blocking(move || collect_entries(&root))
            .await
            .map_err(|e| ContentError::Io(std::io::Error::other(e.to_string())))?;
        Ok(entries)
    }

    /// Whether the webroot holds no files at all
    pub async fn is_empty(&self) -> Result<bool, ContentError> {
        Ok(self.list().await?.is_empty())
    }

    /// Lexicographically first `.html` file directly under the webroot
    pub async fn first_html(&self) -> Result<Option<String>, ContentError> {
        self.ensure_root().await?;
        let mut names = Vec::new();
        let mut dir = fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(".html") && entry.file_type().await?.is_file() {
                names.push(name);
            }
        }
        names.sort();
        Ok(names.into_iter().next())
    }

    /// Whether a relative path names an existing regular file
    pub async fn exists(&self, relative: &str) -> bool {
        match self.resolve(relative) {
            Ok(path) => fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Read a file as text, replacing invalid UTF-8 rather than failing
    pub async fn read_text(&self, relative: &str) -> Result<String, ContentError> {
        let path = self.resolve(relative)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {
                let bytes = fs::read(&path).await?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            Ok(_) | Err(_) => Err(ContentError::NotFound(relative.to_string())),
        }
    }

    /// Write bytes, creating parent directories and overwriting without check
    pub async fn write(&self, relative: &str, bytes: &[u8]) -> Result<u64, ContentError> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        Ok(bytes.len() as u64)
    }

    /// Remove a single file; directories are never deleted
    pub async fn delete(&self, relative: &str) -> Result<(), ContentError> {
        let path = self.resolve(relative)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(fs::remove_file(&path).await?),
            Ok(_) | Err(_) => Err(ContentError::NotFound(relative.to_string())),
        }
    }
}

/// Walk the webroot, skipping entries that disappear mid-walk
fn collect_entries(root: &Path) -> Vec<ContentEntry> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        let path = entry
            .path()
            .strip_prefix(root)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let modified = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_secs());
        entries.push(ContentEntry {
            path,
            size: meta.len(),
            modified,
        });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ContentStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ContentStore::new(dir.path().join("content"));
        (dir, store)
    }

    #[tokio::test]
    async fn test_write_read_round_trip() {
        let (_dir, store) = store();
        store
            .write("pages/about.html", b"<h1>about</h1>")
            .await
            .expect("write");
        let text = store.read_text("pages/about.html").await.expect("read");
        assert_eq!(text, "<h1>about</h1>");
    }

    #[tokio::test]
    async fn test_read_is_lossy_for_invalid_utf8() {
        // Reads decode as text; bytes that are not UTF-8 come back as the
        // replacement character, not as an error
        let (_dir, store) = store();
        store.write("blob.bin", &[0x68, 0x69, 0xFF]).await.expect("write");
        let text = store.read_text("blob.bin").await.expect("read");
        assert_eq!(text, "hi\u{FFFD}");
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let (_dir, store) = store();
        match store.read_text("nope.txt").await {
            Err(ContentError::NotFound(p)) => assert_eq!(p, "nope.txt"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_semantics() {
        let (_dir, store) = store();
        assert!(matches!(
            store.delete("ghost.txt").await,
            Err(ContentError::NotFound(_))
        ));

        store.write("real.txt", b"x").await.expect("write");
        store.delete("real.txt").await.expect("delete");
        let listed = store.list().await.expect("list");
        assert!(listed.iter().all(|e| e.path != "real.txt"));
    }

    #[tokio::test]
    async fn test_overwrite_is_last_writer_wins() {
        let (_dir, store) = store();
        store.write("f.txt", b"first").await.expect("write");
        store.write("f.txt", b"second").await.expect("overwrite");
        assert_eq!(store.read_text("f.txt").await.expect("read"), "second");
    }

    #[tokio::test]
    async fn test_list_reports_size_and_sorted_paths() {
        let (_dir, store) = store();
        store.write("b.txt", b"bb").await.expect("write");
        store.write("a/a.txt", b"a").await.expect("write");
        let listed = store.list().await.expect("list");
        let paths: Vec<&str> = listed.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a/a.txt", "b.txt"]);
        assert_eq!(listed[0].size, 1);
        assert_eq!(listed[1].size, 2);
    }

    #[tokio::test]
    async fn test_traversal_is_rejected() {
        let (_dir, store) = store();
        for bad in ["../escape.txt", "a/../../escape.txt", "a/\0/b", ""] {
            assert!(
                matches!(store.resolve(bad), Err(ContentError::InvalidPath(_))),
                "path {bad:?} should be rejected"
            );
        }
        // Leading slashes are trimmed, not treated as absolute
        assert!(store.resolve("/index.html").is_ok());
    }

    #[tokio::test]
    async fn test_first_html_is_lexicographic_and_top_level_only() {
        let (_dir, store) = store();
        store.write("zeta.html", b"z").await.expect("write");
        store.write("alpha.html", b"a").await.expect("write");
        store.write("notes.txt", b"n").await.expect("write");
        store.write("sub/aaa.html", b"nested").await.expect("write");
        assert_eq!(
            store.first_html().await.expect("first_html").as_deref(),
            Some("alpha.html")
        );
    }

    #[tokio::test]
    async fn test_empty_webroot_created_on_demand() {
        let (_dir, store) = store();
        assert!(store.is_empty().await.expect("is_empty"));
        assert!(store.root().is_dir());
    }
}
