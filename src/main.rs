//! Postmark MCP Server
//!
//! Serves the Postmark tools over stdio, or runs a single tool with `call`.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use rmcp::ServiceExt;
use tracing_subscriber::EnvFilter;

use postmark_mcp::config::{Cli, Command, Config};
use postmark_mcp::{PostmarkClient, PostmarkMcpServer, PostmarkTools};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries the MCP protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("postmark_mcp=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_cli(&cli, &std::env::current_dir()?)
        .context("invalid configuration")?;
    tracing::debug!(?config, "Configuration loaded");

    let client = PostmarkClient::new(
        config.server_token.clone(),
        &config.api_url,
        config.transport.clone(),
    )?;
    tracing::debug!(api = %client.base_url(), "Postmark client ready");
    let tools = PostmarkTools::new(Arc::new(client), Arc::new(config));

    match cli.command {
        Some(Command::Call { tool, args }) => {
            let args: serde_json::Value =
                serde_json::from_str(&args).context("tool arguments must be a JSON object")?;
            let text = tools.call(&tool, args).await?;
            println!("{}", text);
        }
        None | Some(Command::Serve) => {
            let config = tools.config();
            tracing::info!(
                templates_dir = %config.templates_dir.display(),
                sender = %config.default_sender,
                stream = %config.message_stream,
                "postmark-mcp starting (stdio transport)"
            );
            let server = PostmarkMcpServer::new(tools);
            let transport = rmcp::transport::io::stdio();

            let service = server.serve(transport).await?;
            service.waiting().await?;
        }
    }

    Ok(())
}
