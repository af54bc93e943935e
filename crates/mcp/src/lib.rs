//! # onboardctx MCP adapter
//!
//! Exposes the context service as two MCP tools over newline-delimited
//! JSON-RPC on stdio.

pub mod handler;
pub mod server;
pub mod tools;

pub use handler::{McpError, McpHandler, McpRequest, McpResponse};
pub use server::{serve, serve_stdio};

use onboardctx_config::AppConfig;
use onboardctx_context::ContextService;

/// Build a handler serving both context tools from the configured stores.
pub fn handler_from_config(config: &AppConfig) -> onboardctx_core::Result<McpHandler> {
    let service = ContextService::from_config(config)?;
    let default_budget = i64::try_from(config.default_token_budget).unwrap_or(i64::MAX);
    Ok(McpHandler::new(
        tools::registry(service, default_budget),
        config.mcp.server_name.clone(),
    ))
}
