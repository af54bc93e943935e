//! Store chain: ordered lookup with per-store timeouts.
//!
//! Each store is asked in turn. A store that has no data for the repository,
//! or does not answer within its timeout, hands over to the next one. Any
//! other failure ends the lookup.

use async_trait::async_trait;
use onboardctx_core::document::DocumentSet;
use onboardctx_core::error::StoreError;
use onboardctx_core::store::DocumentStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A store that wraps an ordered list of stores and falls through on absence.
pub struct ChainStore {
    name: String,
    chain: Vec<ChainEntry>,
}

struct ChainEntry {
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
}

impl ChainStore {
    /// Default per-store timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            chain: Vec::new(),
        }
    }

    /// Append a store with its own timeout.
    pub fn add(mut self, store: Arc<dyn DocumentStore>, timeout: Duration) -> Self {
        self.chain.push(ChainEntry { store, timeout });
        self
    }

    pub fn add_default(self, store: Arc<dyn DocumentStore>) -> Self {
        self.add(store, Self::DEFAULT_TIMEOUT)
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Longest a full walk of the chain can take: the sum of the entry timeouts.
    pub fn total_timeout(&self) -> Duration {
        self.chain.iter().map(|e| e.timeout).sum()
    }

    /// Names of the chained stores, in lookup order.
    pub fn store_names(&self) -> Vec<&str> {
        self.chain.iter().map(|e| e.store.name()).collect()
    }
}

#[async_trait]
impl DocumentStore for ChainStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_documents(
        &self,
        repo_name: &str,
        include_code: bool,
    ) -> Result<DocumentSet, StoreError> {
        // A timeout anywhere in the chain outranks a plain "not found".
        let mut last_error = StoreError::not_found(repo_name);

        for (i, entry) in self.chain.iter().enumerate() {
            let store_name = entry.store.name().to_string();

            info!(
                store = %store_name,
                repo = %repo_name,
                attempt = i + 1,
                total = self.chain.len(),
                "Chain: trying store"
            );

            let lookup = entry.store.list_documents(repo_name, include_code);
            match tokio::time::timeout(entry.timeout, lookup).await {
                Ok(Ok(set)) => return Ok(set),
                Ok(Err(e)) if e.is_fallthrough() => {
                    warn!(
                        store = %store_name,
                        error = %e,
                        "Chain: store has no answer, trying next"
                    );
                    if !matches!(last_error, StoreError::Timeout { .. }) {
                        last_error = e;
                    }
                }
                Ok(Err(e)) => {
                    warn!(store = %store_name, error = %e, "Chain: store failed");
                    return Err(e);
                }
                Err(_) => {
                    warn!(
                        store = %store_name,
                        timeout_secs = entry.timeout.as_secs(),
                        "Chain: store timed out, trying next"
                    );
                    last_error = StoreError::Timeout {
                        store: store_name,
                        timeout_secs: entry.timeout.as_secs(),
                    };
                }
            }
        }

        Err(last_error)
    }
}
