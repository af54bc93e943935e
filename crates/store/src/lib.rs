//! # onboardctx store
//!
//! Document stores that turn a repository name into its generated
//! onboarding documents.
//!
//! - `LocalStore` reads a data directory on disk.
//! - `RemoteStore` reads a GitHub repository of generated pages.
//! - `ChainStore` asks several stores in order.
//! - `CachedStore` remembers successful lookups for a while.

pub mod cached;
pub mod chain;
pub mod layout;
pub mod local;
pub mod markdown;
pub mod remote;

pub use cached::CachedStore;
pub use chain::ChainStore;
pub use local::LocalStore;
pub use remote::RemoteStore;

use onboardctx_config::AppConfig;
use onboardctx_core::error::StoreError;
use onboardctx_core::store::DocumentStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Number of stores `build_store` chains for this configuration.
fn chained_stores(config: &AppConfig) -> u32 {
    if config.remote.enabled { 2 } else { 1 }
}

/// Deadline for one lookup through the configured chain.
///
/// Each chained store gets `load_timeout_secs`, so a store that times out
/// still leaves the next one its full share.
pub fn request_timeout(config: &AppConfig) -> Duration {
    Duration::from_secs(config.load_timeout_secs) * chained_stores(config)
}

/// Build the store described by the configuration.
///
/// The local data directory is always consulted first; the remote source,
/// when enabled, backs it up. The cache, when enabled, wraps the whole chain.
pub fn build_store(config: &AppConfig) -> Result<Arc<dyn DocumentStore>, StoreError> {
    let timeout = Duration::from_secs(config.load_timeout_secs);
    let local = LocalStore::new(config.data_dir.clone());
    let mut chain = ChainStore::new("chain").add(Arc::new(local), timeout);
    if config.remote.enabled {
        let remote = RemoteStore::new(config.remote.clone())?;
        chain = chain.add(Arc::new(remote), timeout);
    }

    info!(
        stores = ?chain.store_names(),
        cache = config.cache.enabled,
        "Document store ready"
    );

    if config.cache.enabled {
        let ttl = Duration::from_secs(config.cache.ttl_secs);
        Ok(Arc::new(CachedStore::new(chain, ttl)))
    } else {
        Ok(Arc::new(chain))
    }
}
