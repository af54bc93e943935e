//! DocumentStore trait: the abstraction over onboarding data sources.
//!
//! A store maps a repository name to its generated documents. Local
//! directories, remote repositories, fallback chains and caches all
//! implement this trait and compose freely.

use async_trait::async_trait;
use crate::document::DocumentSet;
use crate::error::StoreError;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short name used in logs and error messages (e.g. "local", "remote").
    fn name(&self) -> &str;

    /// Load every document generated for `repo_name`.
    ///
    /// When `include_code` is false, code-bearing documents are excluded
    /// from the returned set entirely. Absence of data is always reported
    /// as `StoreError::NotFound`, never as an empty set.
    async fn list_documents(
        &self,
        repo_name: &str,
        include_code: bool,
    ) -> Result<DocumentSet, StoreError>;
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn list_documents(
        &self,
        repo_name: &str,
        include_code: bool,
    ) -> Result<DocumentSet, StoreError> {
        (**self).list_documents(repo_name, include_code).await
    }
}

/// An in-memory store keyed by repository name. Handy for tests and demos.
#[derive(Debug, Default, Clone)]
pub struct StaticStore {
    sets: std::collections::HashMap<String, DocumentSet>,
}

impl StaticStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document set under its repository name.
    pub fn insert(mut self, set: DocumentSet) -> Self {
        self.sets.insert(set.repo_name().to_string(), set);
        self
    }
}

#[async_trait]
impl DocumentStore for StaticStore {
    fn name(&self) -> &str {
        "static"
    }

    async fn list_documents(
        &self,
        repo_name: &str,
        include_code: bool,
    ) -> Result<DocumentSet, StoreError> {
        let set = self
            .sets
            .get(repo_name)
            .cloned()
            .ok_or_else(|| StoreError::not_found(repo_name))?;
        Ok(if include_code { set } else { set.without_code() })
    }
}
