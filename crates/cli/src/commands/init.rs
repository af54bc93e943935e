//! `onboardctx init`: Write a default config file and data directory.

use onboardctx_config::AppConfig;
use std::path::Path;

pub async fn run(config_path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("🧭 onboardctx setup");
    println!("===================\n");

    if config_path.exists() && !force {
        println!("  Config file exists: {}", config_path.display());
        println!("  Use --force to overwrite it.");
    } else {
        if let Some(dir) = config_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(config_path, AppConfig::default_toml())?;
        println!("✅ Wrote config: {}", config_path.display());
    }

    let config = AppConfig::load_from(config_path)?;
    if !config.data_dir.exists() {
        std::fs::create_dir_all(&config.data_dir)?;
        println!("✅ Created data directory: {}", config.data_dir.display());
    } else {
        println!("  Data directory exists: {}", config.data_dir.display());
    }

    println!("\nPlace generated onboarding pages under <data_dir>/<repo_name>/.");
    println!("Then try: onboardctx context --repo_name <repo_name> --token_budget 2000");
    Ok(())
}
