//! # postmark-mcp - Postmark tools for LLM agents
//!
//! An MCP server that lets an agent send email through Postmark, manage server
//! templates, read delivery statistics and browse a local library of template files.
//!
//! ## Architecture
//!
//! 1. **[`EmailProvider`]** is the seam to the Postmark HTTP API; [`PostmarkClient`]
//!    implements it over reqwest.
//! 2. **[`TemplateLibrary`]** reads the local template directory tree
//!    (`<base>/<category>/<template>/content.{html,txt}`).
//! 3. **[`PostmarkTools`]** is the tool registry: typed arguments, validation and
//!    text rendering for every tool, dispatched through [`ToolCall`].
//! 4. **[`PostmarkMcpServer`]** exposes the registry over MCP.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use clap::Parser;
//! use postmark_mcp::config::{Cli, Config};
//! use postmark_mcp::options::TransportOptions;
//! use postmark_mcp::{PostmarkClient, PostmarkTools};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_cli(&Cli::parse(), &std::env::current_dir()?)?;
//!     let client = PostmarkClient::new(
//!         config.server_token.clone(),
//!         &config.api_url,
//!         TransportOptions::default(),
//!     )?;
//!
//!     let tools = PostmarkTools::new(Arc::new(client), Arc::new(config));
//!     println!("{}", tools.call("listTemplateCategories", serde_json::Value::Null).await?);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod http;
pub mod library;
pub mod mcp;
pub mod model;
pub mod options;
pub mod tools;

pub use api::PostmarkClient;
pub use client::{EmailProvider, ProviderError};
pub use config::Config;
pub use library::{ErrorCode, StoreError, TemplateLibrary};
pub use mcp::PostmarkMcpServer;
pub use tools::{PostmarkTools, ToolCall, ToolError};

// Re-export rmcp for convenience
pub use rmcp;
