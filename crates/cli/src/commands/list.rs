//! `onboardctx list`: List repositories, or one repository's documents.

use onboardctx_config::AppConfig;
use onboardctx_context::{ContextService, normalize_repo_name};
use onboardctx_core::store::DocumentStore;
use onboardctx_store::{LocalStore, RemoteStore};
use std::path::Path;

pub async fn run(
    config_path: &Path,
    repo_name: Option<&str>,
    include_code: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_with_env(config_path)?;
    match repo_name {
        Some(repo_name) => list_documents(&config, repo_name, include_code).await,
        None => list_repositories(&config).await,
    }
}

async fn list_documents(
    config: &AppConfig,
    repo_name: &str,
    include_code: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let repo = normalize_repo_name(repo_name)?;
    let service = ContextService::from_config(config)?;
    let set = service.store().list_documents(repo, include_code).await?;

    println!("📚 {}: {} document(s), {} tokens\n", set.repo_name(), set.len(), set.total_tokens());
    println!("  {:>8}  {:>7}  {:<4}  ID", "PRIORITY", "TOKENS", "CODE");
    for doc in set.by_priority() {
        println!(
            "  {:>8}  {:>7}  {:<4}  {}",
            doc.priority,
            doc.estimated_tokens,
            if doc.has_code { "yes" } else { "no" },
            doc.id
        );
    }
    Ok(())
}

async fn list_repositories(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let local = LocalStore::new(config.data_dir.clone()).repositories().await?;
    println!("📁 Local ({}): {} repositories", config.data_dir.display(), local.len());
    for repo in &local {
        println!("  {repo}");
    }

    if config.remote.enabled {
        let remote = RemoteStore::new(config.remote.clone())?.repositories().await?;
        println!("\n🌐 Remote ({}): {} repositories", config.remote.docs_repo, remote.len());
        for repo in &remote {
            println!("  {repo}");
        }
    }
    Ok(())
}
