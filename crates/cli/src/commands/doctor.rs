//! `onboardctx doctor`: Diagnose configuration and data sources.

use onboardctx_config::AppConfig;
use onboardctx_store::{LocalStore, RemoteStore};
use std::path::Path;

pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 onboardctx doctor");
    println!("===================\n");

    let mut issues = 0;

    if config_path.exists() {
        println!("  ✅ Config file found: {}", config_path.display());
    } else {
        println!("  ⚠️  No config file at {}, using defaults (run `onboardctx init`)", config_path.display());
    }

    let config = match AppConfig::load_with_env(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue found. Fix the config and run again.");
            return Err(format!("invalid config {}: {e}", config_path.display()).into());
        }
    };

    match LocalStore::new(config.data_dir.clone()).repositories().await {
        Ok(repos) if repos.is_empty() => {
            println!("  ⚠️  No local repositories in {}", config.data_dir.display());
            if !config.remote.enabled {
                issues += 1;
            }
        }
        Ok(repos) => println!(
            "  ✅ {} local repositories in {}",
            repos.len(),
            config.data_dir.display()
        ),
        Err(e) => {
            println!("  ❌ Data directory unreadable: {e}");
            issues += 1;
        }
    }

    if config.remote.enabled {
        let probe = match RemoteStore::new(config.remote.clone()) {
            Ok(store) => store.repositories().await,
            Err(e) => Err(e),
        };
        match probe {
            Ok(repos) => println!(
                "  ✅ Remote {} reachable ({} repositories)",
                config.remote.docs_repo,
                repos.len()
            ),
            Err(e) => {
                println!("  ❌ Remote {} unreachable: {e}", config.remote.docs_repo);
                issues += 1;
            }
        }
        if config.remote.github_token.is_none() {
            println!("  ⚠️  No GITHUB_TOKEN set; GitHub API rate limits are strict without one");
        }
    } else {
        println!("  ℹ️  Remote fallback disabled");
    }

    if config.cache.enabled {
        println!("  ✅ Cache enabled (ttl {}s)", config.cache.ttl_secs);
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
        Ok(())
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
        Err(format!("doctor found {issues} issue(s)").into())
    }
}
