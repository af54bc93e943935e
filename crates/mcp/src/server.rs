//! Stdio transport: one JSON-RPC message per line in, one per line out.

use crate::handler::McpHandler;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

/// Serve MCP on the process's stdin and stdout until stdin closes.
pub async fn serve_stdio(handler: &McpHandler) -> io::Result<()> {
    serve(handler, BufReader::new(io::stdin()), io::stdout()).await
}

/// Serve MCP over any line-oriented reader and writer until EOF.
pub async fn serve<R, W>(handler: &McpHandler, reader: R, mut writer: W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!(tools = handler.registry().len(), "MCP server listening on stdio");
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(response) = handler.handle_line(line).await {
            writer.write_all(response.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }

    info!("MCP client closed the connection");
    Ok(())
}
