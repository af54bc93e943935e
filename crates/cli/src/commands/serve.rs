//! `onboardctx serve`: Run the MCP tool server on stdin/stdout.

use onboardctx_config::AppConfig;
use std::path::Path;

pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_with_env(config_path)?;
    let handler = onboardctx_mcp::handler_from_config(&config)?;
    tracing::info!(
        server = %config.mcp.server_name,
        data_dir = %config.data_dir.display(),
        remote = config.remote.enabled,
        "Starting MCP server"
    );
    onboardctx_mcp::serve_stdio(&handler).await?;
    Ok(())
}
