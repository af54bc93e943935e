//! `onboardctx context`: Print the onboarding context of a repository.

use onboardctx_config::AppConfig;
use onboardctx_context::ContextService;
use std::path::Path;

pub async fn run(
    config_path: &Path,
    repo_name: &str,
    token_budget: i64,
    include_code: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_with_env(config_path)?;
    let service = ContextService::from_config(&config)?;
    let context = service
        .get_context(repo_name, token_budget, include_code)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&context)?);
    } else {
        println!("{}", context.text);
        if context.truncated {
            tracing::info!(
                total_tokens = context.total_tokens,
                budget = context.token_budget,
                omitted = context.omitted_ids.len(),
                "Context truncated to fit the budget"
            );
        }
    }

    Ok(())
}
