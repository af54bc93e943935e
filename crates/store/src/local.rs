//! Local document store: generated onboarding data on disk.
//!
//! Layout: `<data_dir>/<repo_name>/`. When the repository directory holds a
//! `manifest.json`, it is authoritative:
//!
//! ```json
//! { "documents": [
//!     { "id": "overview", "title": "Overview", "file": "overview.md",
//!       "priority": 0, "has_code": false, "estimated_tokens": 812 }
//! ] }
//! ```
//!
//! Otherwise the directory's `*.md` pages are read following the
//! generator's page layout (see `layout`).

use crate::layout::{self, PageName};
use async_trait::async_trait;
use onboardctx_core::document::{Document, DocumentSet};
use onboardctx_core::error::StoreError;
use onboardctx_core::store::DocumentStore;
use onboardctx_core::token;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Deserialize)]
struct Manifest {
    documents: Vec<ManifestEntry>,
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    id: String,
    #[serde(default)]
    title: Option<String>,
    file: String,
    #[serde(default)]
    priority: i64,
    #[serde(default)]
    has_code: bool,
    #[serde(default)]
    estimated_tokens: Option<usize>,
}

/// Reads onboarding documents from a data directory.
pub struct LocalStore {
    data_dir: PathBuf,
}

impl LocalStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Repository directory, or `None` if the name would escape the data dir.
    fn repo_dir(&self, repo_name: &str) -> Option<PathBuf> {
        is_relative_inside(Path::new(repo_name)).then(|| self.data_dir.join(repo_name))
    }

    /// Repository names with a directory under the data dir, sorted.
    pub async fn repositories(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.data_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&self.data_dir, e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(&self.data_dir, e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if is_dir {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn load_manifest(
        &self,
        repo_name: &str,
        repo_dir: &Path,
        manifest_path: &Path,
        include_code: bool,
    ) -> Result<Vec<Document>, StoreError> {
        let raw = tokio::fs::read_to_string(manifest_path)
            .await
            .map_err(|e| io_error(manifest_path, e))?;
        let manifest: Manifest = serde_json::from_str(&raw).map_err(|e| {
            StoreError::InvalidData(format!("{}: {e}", manifest_path.display()))
        })?;
        if manifest.documents.is_empty() {
            return Err(StoreError::not_found(repo_name));
        }

        let mut documents = Vec::with_capacity(manifest.documents.len());
        for entry in manifest.documents {
            if entry.has_code && !include_code {
                continue;
            }
            let rel = Path::new(&entry.file);
            if !is_relative_inside(rel) {
                return Err(StoreError::InvalidData(format!(
                    "manifest entry '{}' points outside the repository: {}",
                    entry.id, entry.file
                )));
            }
            let path = repo_dir.join(rel);
            let body = tokio::fs::read_to_string(&path).await.map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    StoreError::InvalidData(format!(
                        "manifest entry '{}' references missing file {}",
                        entry.id,
                        path.display()
                    ))
                } else {
                    io_error(&path, e)
                }
            })?;

            let estimated_tokens = entry
                .estimated_tokens
                .unwrap_or_else(|| token::estimate_tokens(&body));
            let title = entry.title.unwrap_or_else(|| entry.id.clone());
            documents.push(
                Document::new(entry.id, title, body)
                    .with_estimated_tokens(estimated_tokens)
                    .with_priority(entry.priority)
                    .with_code(entry.has_code),
            );
        }
        Ok(documents)
    }

    async fn load_pages(
        &self,
        repo_name: &str,
        repo_dir: &Path,
        include_code: bool,
    ) -> Result<Option<Vec<Document>>, StoreError> {
        let mut entries = tokio::fs::read_dir(repo_dir)
            .await
            .map_err(|e| io_error(repo_dir, e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(repo_dir, e))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(page) = PageName::parse(&entry.file_name().to_string_lossy()) {
                names.push((page, entry.path()));
            }
        }

        if names.is_empty() {
            return Ok(None);
        }

        let mut pages = Vec::with_capacity(names.len());
        for (page, path) in names {
            if page.has_code && !include_code {
                continue;
            }
            let raw = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| io_error(&path, e))?;
            pages.push((page, raw));
        }
        Ok(Some(layout::build_documents(repo_name, pages)))
    }
}

#[async_trait]
impl DocumentStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn list_documents(
        &self,
        repo_name: &str,
        include_code: bool,
    ) -> Result<DocumentSet, StoreError> {
        let repo_dir = self
            .repo_dir(repo_name)
            .ok_or_else(|| StoreError::not_found(repo_name))?;

        match tokio::fs::metadata(&repo_dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(StoreError::not_found(repo_name)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::not_found(repo_name));
            }
            Err(e) => return Err(io_error(&repo_dir, e)),
        }

        let manifest_path = repo_dir.join(MANIFEST_FILE);
        let documents = if tokio::fs::try_exists(&manifest_path)
            .await
            .map_err(|e| io_error(&manifest_path, e))?
        {
            self.load_manifest(repo_name, &repo_dir, &manifest_path, include_code)
                .await?
        } else {
            self.load_pages(repo_name, &repo_dir, include_code)
                .await?
                .ok_or_else(|| StoreError::not_found(repo_name))?
        };

        debug!(
            repo = %repo_name,
            dir = %repo_dir.display(),
            documents = documents.len(),
            include_code,
            "Loaded local onboarding documents"
        );

        DocumentSet::new(repo_name, documents)
    }
}

fn is_relative_inside(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)))
}

fn io_error(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Io(format!("{}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn missing_repository_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());
        let err = store.list_documents("nope", true).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { ref repo_name } if repo_name == "nope"));
    }

    #[tokio::test]
    async fn empty_repository_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Empty")).unwrap();
        write(dir.path(), "Empty/readme.txt", "not markdown");
        let store = LocalStore::new(dir.path());
        let err = store.list_documents("Empty", true).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn traversal_names_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("data"));
        write(dir.path(), "secret/on_boarding.md", "secret");
        let err = store.list_documents("../secret", true).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn pages_are_loaded_in_layout_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Alien/on_boarding.md", "The whole project.");
        write(dir.path(), "Alien/models.md", "Model component.");
        write(dir.path(), "Alien/models.code.md", "```python\nclass Model: ...\n```");

        let store = LocalStore::new(dir.path());
        let set = store.list_documents("Alien", true).await.unwrap();
        let ids: Vec<&str> = set.by_priority().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["on_boarding", "models", "models.code"]);
        assert!(set.get("models.code").unwrap().has_code);
    }

    #[tokio::test]
    async fn code_pages_excluded_without_code() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Alien/on_boarding.md", "The whole project.");
        write(dir.path(), "Alien/models.code.md", "```python\nclass Model: ...\n```");

        let store = LocalStore::new(dir.path());
        let set = store.list_documents("Alien", false).await.unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.documents().iter().all(|d| !d.has_code));
    }

    #[tokio::test]
    async fn manifest_is_authoritative() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Repo/a.md", "alpha alpha");
        write(dir.path(), "Repo/b.md", "beta");
        write(dir.path(), "Repo/ignored.md", "not in manifest");
        write(
            dir.path(),
            "Repo/manifest.json",
            r#"{"documents": [
                {"id": "b", "title": "Beta", "file": "b.md", "priority": 1, "estimated_tokens": 60},
                {"id": "a", "file": "a.md", "priority": 0},
                {"id": "snippets", "title": "Snippets", "file": "a.md", "priority": 2, "has_code": true}
            ]}"#,
        );

        let store = LocalStore::new(dir.path());
        let set = store.list_documents("Repo", true).await.unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.get("ignored").is_none());
        assert_eq!(set.get("b").unwrap().estimated_tokens, 60);
        assert_eq!(set.get("a").unwrap().estimated_tokens, 2);
        assert_eq!(set.get("a").unwrap().title, "a");

        let prose = store.list_documents("Repo", false).await.unwrap();
        assert_eq!(prose.len(), 2);
    }

    #[tokio::test]
    async fn empty_manifest_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Repo/on_boarding.md", "ignored while a manifest exists");
        write(dir.path(), "Repo/manifest.json", r#"{"documents": []}"#);
        let store = LocalStore::new(dir.path());
        for include_code in [true, false] {
            let err = store.list_documents("Repo", include_code).await.unwrap_err();
            assert!(matches!(err, StoreError::NotFound { ref repo_name } if repo_name == "Repo"));
        }
    }

    #[tokio::test]
    async fn code_only_manifest_without_code_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Repo/snippets.md", "fn main() {}");
        write(
            dir.path(),
            "Repo/manifest.json",
            r#"{"documents": [{"id": "snippets", "file": "snippets.md", "has_code": true}]}"#,
        );
        let store = LocalStore::new(dir.path());
        assert!(store.list_documents("Repo", false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn manifest_escaping_repo_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "Repo/manifest.json",
            r#"{"documents": [{"id": "x", "file": "../../etc/passwd"}]}"#,
        );
        let store = LocalStore::new(dir.path());
        let err = store.list_documents("Repo", true).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidData(_)));
    }

    #[tokio::test]
    async fn manifest_duplicate_ids_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Repo/a.md", "alpha");
        write(
            dir.path(),
            "Repo/manifest.json",
            r#"{"documents": [{"id": "a", "file": "a.md"}, {"id": "a", "file": "a.md"}]}"#,
        );
        let store = LocalStore::new(dir.path());
        let err = store.list_documents("Repo", true).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId(_)));
    }

    #[tokio::test]
    async fn repositories_lists_directories() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "B/on_boarding.md", "b");
        write(dir.path(), "A/on_boarding.md", "a");
        write(dir.path(), "stray.md", "not a repo");
        let store = LocalStore::new(dir.path());
        assert_eq!(store.repositories().await.unwrap(), vec!["A", "B"]);

        let missing = LocalStore::new(dir.path().join("missing"));
        assert!(missing.repositories().await.unwrap().is_empty());
    }
}
