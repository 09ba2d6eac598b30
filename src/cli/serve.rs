//! Serve command implementation

use crate::cli::args::GlobalOptions;
use crate::cli::CommandContext;
use crate::error::Result;
use crate::mcp::{McpServer, ToolDispatcher};

/// Run the stdio tool server until the host closes stdin
pub async fn run(opts: &GlobalOptions) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let server = McpServer::new(ToolDispatcher::new(ctx.service));

    server.run(tokio::io::stdin(), tokio::io::stdout()).await
}
