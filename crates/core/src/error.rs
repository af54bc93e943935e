//! Error types for the onboardctx domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; `ContextError` is the
//! taxonomy callers of the context service see.

use thiserror::Error;

/// The error returned by `get_context` and everything layered on top of it.
#[derive(Debug, Clone, Error)]
pub enum ContextError {
    /// No generated onboarding data exists for the repository.
    #[error("No onboarding data found for repository '{0}'")]
    NotFound(String),

    /// Malformed `token_budget` or `repo_name`. The caller must fix its input.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The data source did not answer in time. The caller may retry later.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Any other failure reported by the document store.
    #[error("Document store error: {0}")]
    Store(StoreError),
}

impl ContextError {
    /// Stable machine-readable kind, used in structured error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Timeout(_) => "timeout",
            Self::Store(_) => "store",
        }
    }
}

impl From<StoreError> for ContextError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { repo_name } => Self::NotFound(repo_name),
            StoreError::Timeout { .. } => Self::Timeout(err.to_string()),
            StoreError::DuplicateId(id) => {
                Self::InvalidArgument(format!("duplicate document id '{id}'"))
            }
            other => Self::Store(other),
        }
    }
}

/// Result type alias using `ContextError`.
pub type Result<T> = std::result::Result<T, ContextError>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Repository not found: {repo_name}")]
    NotFound { repo_name: String },

    #[error("Store '{store}' timed out after {timeout_secs}s")]
    Timeout { store: String, timeout_secs: u64 },

    #[error("Duplicate document id: {0}")]
    DuplicateId(String),

    #[error("Invalid document data: {0}")]
    InvalidData(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Remote source error: {0}")]
    Remote(String),
}

impl StoreError {
    pub fn not_found(repo_name: impl Into<String>) -> Self {
        Self::NotFound {
            repo_name: repo_name.into(),
        }
    }

    /// Whether a fallback chain should move on to its next store.
    pub fn is_fallthrough(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Timeout { .. })
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },
}
