//! Onboarding documents and the per-repository document set.

use crate::error::StoreError;
use crate::token;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named section of onboarding content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier within its repository.
    pub id: String,

    /// Human-readable title, e.g. "System Architecture Overview of Component: api".
    pub title: String,

    /// The text content.
    pub body: String,

    /// Size in tokens, as reported by the generator or estimated on load.
    pub estimated_tokens: usize,

    /// Rank; lower is more important.
    #[serde(default)]
    pub priority: i64,

    /// Whether the body carries source code excerpts.
    #[serde(default)]
    pub has_code: bool,
}

impl Document {
    /// Create a prose document, estimating its size from the body.
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            id: id.into(),
            title: title.into(),
            estimated_tokens: token::estimate_tokens(&body),
            body,
            priority: 0,
            has_code: false,
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_code(mut self, has_code: bool) -> Self {
        self.has_code = has_code;
        self
    }

    /// Override the size metadata (used when the generator supplies it).
    pub fn with_estimated_tokens(mut self, tokens: usize) -> Self {
        self.estimated_tokens = tokens;
        self
    }
}

/// The ordered documents belonging to one repository.
///
/// Document ids are unique within a set. Order matters: it breaks ties
/// between documents of equal priority.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSet {
    repo_name: String,
    documents: Vec<Document>,
}

impl DocumentSet {
    /// Build a set, rejecting duplicate ids.
    pub fn new(
        repo_name: impl Into<String>,
        documents: Vec<Document>,
    ) -> Result<Self, StoreError> {
        let mut seen = HashSet::with_capacity(documents.len());
        for doc in &documents {
            if !seen.insert(doc.id.as_str()) {
                return Err(StoreError::DuplicateId(doc.id.clone()));
            }
        }
        Ok(Self {
            repo_name: repo_name.into(),
            documents,
        })
    }

    /// An empty set for a repository.
    pub fn empty(repo_name: impl Into<String>) -> Self {
        Self {
            repo_name: repo_name.into(),
            documents: Vec::new(),
        }
    }

    pub fn repo_name(&self) -> &str {
        &self.repo_name
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Sum of `estimated_tokens` over all documents.
    pub fn total_tokens(&self) -> usize {
        self.documents.iter().map(|d| d.estimated_tokens).sum()
    }

    /// Drop every code-bearing document.
    pub fn without_code(self) -> Self {
        Self {
            repo_name: self.repo_name,
            documents: self.documents.into_iter().filter(|d| !d.has_code).collect(),
        }
    }

    /// Documents in preference order: priority ascending, ties in original order.
    pub fn by_priority(&self) -> Vec<&Document> {
        let mut ordered: Vec<&Document> = self.documents.iter().collect();
        // `sort_by_key` is stable, which keeps ties in insertion order.
        ordered.sort_by_key(|d| d.priority);
        ordered
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }
}
