//! The context service: validate a request, load documents, assemble.

use crate::assembler::TokenBudgetAssembler;
use onboardctx_config::AppConfig;
use onboardctx_core::context::Context;
use onboardctx_core::error::{ContextError, Result};
use onboardctx_core::store::DocumentStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Answers `get_context` requests against a document store.
///
/// Cheap to clone; clones share the store.
#[derive(Clone)]
pub struct ContextService {
    store: Arc<dyn DocumentStore>,
    assembler: TokenBudgetAssembler,
    load_timeout: Duration,
}

impl ContextService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        assembler: TokenBudgetAssembler,
        load_timeout: Duration,
    ) -> Self {
        Self {
            store,
            assembler,
            load_timeout,
        }
    }

    /// Build the configured store chain and wrap it in a service.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store = onboardctx_store::build_store(config)?;
        Ok(Self::new(
            store,
            TokenBudgetAssembler::new(config.delimiter.clone()),
            onboardctx_store::request_timeout(config),
        ))
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Assemble the onboarding context for `repo_name` within `token_budget`.
    ///
    /// Absence of data is an error, never an empty context.
    pub async fn get_context(
        &self,
        repo_name: &str,
        token_budget: i64,
        include_code: bool,
    ) -> Result<Context> {
        let result = self.load_and_assemble(repo_name, token_budget, include_code).await;
        match &result {
            Ok(ctx) => info!(
                repo = %repo_name,
                budget = token_budget,
                include_code,
                total_tokens = ctx.total_tokens,
                truncated = ctx.truncated,
                "Context served"
            ),
            Err(e) => warn!(
                repo = %repo_name,
                budget = token_budget,
                include_code,
                kind = e.kind(),
                error = %e,
                "Context request failed"
            ),
        }
        result
    }

    async fn load_and_assemble(
        &self,
        repo_name: &str,
        token_budget: i64,
        include_code: bool,
    ) -> Result<Context> {
        let budget = validate_budget(token_budget)?;
        let repo = normalize_repo_name(repo_name)?;

        let lookup = self.store.list_documents(repo, include_code);
        let set = tokio::time::timeout(self.load_timeout, lookup)
            .await
            .map_err(|_| {
                ContextError::Timeout(format!(
                    "loading documents for '{repo}' took longer than {}s",
                    self.load_timeout.as_secs()
                ))
            })??;

        let set = if include_code { set } else { set.without_code() };
        Ok(self.assembler.assemble(&set, budget))
    }
}

fn validate_budget(token_budget: i64) -> Result<usize> {
    usize::try_from(token_budget).map_err(|_| {
        ContextError::InvalidArgument(format!(
            "token_budget must be a non-negative integer, got {token_budget}"
        ))
    })
}

/// Trim surrounding whitespace and slashes; reject names that could escape
/// the data directory.
pub fn normalize_repo_name(repo_name: &str) -> Result<&str> {
    let invalid = |reason: &str| {
        Err(ContextError::InvalidArgument(format!(
            "repo_name '{repo_name}' {reason}"
        )))
    };

    let trimmed = repo_name.trim();
    if trimmed.starts_with('/') {
        return invalid("must not be an absolute path");
    }
    let name = trimmed.trim_end_matches('/');
    if name.is_empty() {
        return invalid("must not be empty");
    }
    if name.contains('\\') || name.contains('\0') {
        return invalid("contains a forbidden character");
    }
    if name.split('/').any(|part| part == ".." || part == "." || part.is_empty()) {
        return invalid("must be a plain repository name");
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use onboardctx_core::document::{Document, DocumentSet};
    use onboardctx_core::error::StoreError;
    use onboardctx_core::store::StaticStore;
    use onboardctx_store::ChainStore;

    fn service() -> ContextService {
        let store = StaticStore::new().insert(
            DocumentSet::new(
                "Alien",
                vec![
                    Document::new("overview", "Overview", "one two three four five").with_priority(0),
                    Document::new("api", "API", "six seven eight").with_priority(1),
                    Document::new("api.code", "API code", "fn main() {}")
                        .with_priority(2)
                        .with_code(true),
                ],
            )
            .unwrap(),
        );
        ContextService::new(
            Arc::new(store),
            TokenBudgetAssembler::default(),
            Duration::from_secs(5),
        )
    }

    struct SlowStore;

    #[async_trait]
    impl DocumentStore for SlowStore {
        fn name(&self) -> &str {
            "slow"
        }

        async fn list_documents(
            &self,
            repo_name: &str,
            _include_code: bool,
        ) -> std::result::Result<DocumentSet, StoreError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(StoreError::not_found(repo_name))
        }
    }

    #[tokio::test]
    async fn full_context_with_code() {
        let ctx = service().get_context("Alien", 1000, true).await.unwrap();
        assert_eq!(ctx.included_ids, vec!["overview", "api", "api.code"]);
        assert!(!ctx.truncated);
        assert_eq!(ctx.total_tokens, 11);
    }

    #[tokio::test]
    async fn code_excluded_on_request() {
        let ctx = service().get_context("Alien", 1000, false).await.unwrap();
        assert_eq!(ctx.included_ids, vec!["overview", "api"]);
        assert!(!ctx.text.contains("fn main"));
    }

    #[tokio::test]
    async fn budget_limits_the_context() {
        let ctx = service().get_context("Alien", 6, false).await.unwrap();
        assert_eq!(ctx.total_tokens, 6);
        assert!(ctx.truncated);
        assert_eq!(ctx.text, "one two three four five\n\nsix");
    }

    #[tokio::test]
    async fn unknown_repo_is_not_found() {
        let err = service().get_context("Predator", 100, true).await.unwrap_err();
        assert!(matches!(err, ContextError::NotFound(ref name) if name == "Predator"));
    }

    #[tokio::test]
    async fn negative_budget_is_rejected() {
        let err = service().get_context("Alien", -1, true).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
    }

    #[tokio::test]
    async fn zero_budget_is_allowed() {
        let ctx = service().get_context("Alien", 0, false).await.unwrap();
        assert!(ctx.truncated);
        assert!(ctx.text.is_empty());
    }

    #[tokio::test]
    async fn trailing_slash_is_ignored() {
        let ctx = service().get_context(" Alien/ ", 1000, false).await.unwrap();
        assert_eq!(ctx.included_ids.len(), 2);
    }

    #[tokio::test]
    async fn malformed_repo_names_are_rejected() {
        let svc = service();
        for name in ["", "   ", "/", "../etc", "/abs/path", "a/../b", "a\\b", "a\0b", "a//b"] {
            let err = svc.get_context(name, 10, true).await.unwrap_err();
            assert!(
                matches!(err, ContextError::InvalidArgument(_)),
                "{name:?} should be rejected"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_store_times_out() {
        let svc = ContextService::new(
            Arc::new(SlowStore),
            TokenBudgetAssembler::default(),
            Duration::from_secs(2),
        );
        let err = svc.get_context("Alien", 10, true).await.unwrap_err();
        assert_eq!(err.kind(), "timeout");
    }

    #[tokio::test(start_paused = true)]
    async fn slow_first_store_hands_over_within_the_deadline() {
        let fallback = StaticStore::new().insert(
            DocumentSet::new("Alien", vec![Document::new("overview", "Overview", "from remote")])
                .unwrap(),
        );
        let per_store = Duration::from_secs(2);
        let chain = ChainStore::new("chain")
            .add(Arc::new(SlowStore), per_store)
            .add(Arc::new(fallback), per_store);
        let deadline = chain.total_timeout();
        let svc = ContextService::new(Arc::new(chain), TokenBudgetAssembler::default(), deadline);

        let ctx = svc.get_context("Alien", 10, true).await.unwrap();
        assert_eq!(ctx.text, "from remote");
    }

    #[test]
    fn repo_names_with_owner_are_accepted() {
        assert_eq!(normalize_repo_name("acme/widgets/").unwrap(), "acme/widgets");
    }
}
