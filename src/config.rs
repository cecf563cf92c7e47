//! Process configuration.
//!
//! Values come from command-line flags with environment fallbacks (a `.env` file is
//! loaded by the binary before parsing). [`Cli`] is validated once into an
//! immutable [`Config`] that is shared by every tool handler.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::api::POSTMARK_API_BASE;
use crate::options::TransportOptions;

/// Directory used when no template path is configured, relative to the working dir.
pub const DEFAULT_TEMPLATES_SUBDIR: &str = "postmark-templates/templates-inlined";

pub const DEFAULT_MESSAGE_STREAM: &str = "outbound";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("DEFAULT_SENDER_EMAIL '{0}' is not an email address")]
    InvalidSender(String),

    #[error("POSTMARK_TIMEOUT_SECS must be greater than zero")]
    ZeroTimeout,
}

#[derive(Debug, Parser)]
#[command(name = "postmark-mcp", version, about = "Postmark tools for LLM agents over MCP")]
pub struct Cli {
    /// Server API token used for sending, templates and statistics.
    #[arg(long, env = "POSTMARK_SERVER_TOKEN", hide_env_values = true)]
    pub server_token: String,

    /// Account API token, only needed for template push between servers.
    #[arg(long, env = "POSTMARK_ACCOUNT_TOKEN", hide_env_values = true)]
    pub account_token: Option<String>,

    /// Sender address used when a tool call does not specify one.
    #[arg(long, env = "DEFAULT_SENDER_EMAIL")]
    pub default_sender: String,

    /// Message stream every outgoing email is sent on.
    #[arg(long, env = "DEFAULT_MESSAGE_STREAM", default_value = DEFAULT_MESSAGE_STREAM)]
    pub message_stream: String,

    /// Root of the local template library.
    #[arg(long, env = "POSTMARK_TEMPLATES_DIR")]
    pub templates_dir: Option<PathBuf>,

    /// Fallback root of the local template library.
    #[arg(long, env = "TEMPLATES_DIR", hide = true)]
    pub fallback_templates_dir: Option<PathBuf>,

    /// Postmark API base URL.
    #[arg(long, env = "POSTMARK_API_URL", default_value = POSTMARK_API_BASE)]
    pub api_url: String,

    /// Per-request timeout for Postmark API calls, in seconds. Unset means no timeout.
    #[arg(long, env = "POSTMARK_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Proxy URL for Postmark API calls.
    #[arg(long, env = "POSTMARK_PROXY")]
    pub proxy: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Serve the tools over MCP on stdin/stdout (default).
    Serve,
    /// Run a single tool and print its rendered result.
    Call {
        /// Tool name, e.g. `listTemplateCategories`.
        tool: String,
        /// JSON object with the tool arguments.
        #[arg(default_value = "{}")]
        args: String,
    },
}

/// Validated, immutable configuration.
#[derive(Clone)]
pub struct Config {
    pub server_token: String,
    pub account_token: Option<String>,
    pub default_sender: String,
    pub message_stream: String,
    pub templates_dir: PathBuf,
    pub api_url: String,
    pub transport: TransportOptions,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_token", &"<redacted>")
            .field(
                "account_token",
                &self.account_token.as_ref().map(|_| "<redacted>"),
            )
            .field("default_sender", &self.default_sender)
            .field("message_stream", &self.message_stream)
            .field("templates_dir", &self.templates_dir)
            .field("api_url", &self.api_url)
            .field("timeout", &self.transport.timeout)
            .field("proxy", &self.transport.proxy)
            .finish()
    }
}

impl Config {
    /// Validate parsed CLI/env values. `cwd` anchors the default template directory.
    pub fn from_cli(cli: &Cli, cwd: &Path) -> Result<Self, ConfigError> {
        let server_token = non_empty("POSTMARK_SERVER_TOKEN", &cli.server_token)?;
        let default_sender = non_empty("DEFAULT_SENDER_EMAIL", &cli.default_sender)?;
        if !default_sender.contains('@') {
            return Err(ConfigError::InvalidSender(default_sender));
        }
        let message_stream = non_empty("DEFAULT_MESSAGE_STREAM", &cli.message_stream)?;
        let api_url = non_empty("POSTMARK_API_URL", &cli.api_url)?;

        let account_token = cli
            .account_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        let mut transport = TransportOptions::new();
        match cli.timeout_secs {
            Some(0) => return Err(ConfigError::ZeroTimeout),
            Some(secs) => transport = transport.with_timeout(Duration::from_secs(secs)),
            None => {}
        }
        if let Some(proxy) = cli.proxy.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            transport = transport.with_proxy(proxy);
        }

        Ok(Self {
            server_token,
            account_token,
            default_sender,
            message_stream,
            templates_dir: resolve_templates_dir(
                cli.templates_dir.as_deref(),
                cli.fallback_templates_dir.as_deref(),
                cwd,
            ),
            api_url,
            transport,
        })
    }
}

/// Pick the template library root: explicit override, then fallback, then the default
/// directory under `cwd`.
pub fn resolve_templates_dir(
    explicit: Option<&Path>,
    fallback: Option<&Path>,
    cwd: &Path,
) -> PathBuf {
    let set = |p: &&Path| !p.as_os_str().is_empty();
    explicit
        .filter(set)
        .or(fallback.filter(set))
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cwd.join(DEFAULT_TEMPLATES_SUBDIR))
}

fn non_empty(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ConfigError::Empty(name))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec![
            "postmark-mcp",
            "--server-token",
            "server-token",
            "--default-sender",
            "sender@example.com",
            "--message-stream",
            "outbound",
            "--api-url",
            POSTMARK_API_BASE,
        ];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_resolve_templates_dir_precedence() {
        let cwd = Path::new("/work");
        assert_eq!(
            resolve_templates_dir(Some(Path::new("/a")), Some(Path::new("/b")), cwd),
            PathBuf::from("/a")
        );
        assert_eq!(
            resolve_templates_dir(None, Some(Path::new("/b")), cwd),
            PathBuf::from("/b")
        );
        assert_eq!(
            resolve_templates_dir(None, None, cwd),
            PathBuf::from("/work/postmark-templates/templates-inlined")
        );
    }

    #[test]
    fn test_config_from_cli() {
        let cli = parse(&["--templates-dir", "/srv/templates", "--account-token", " "]);
        let config = Config::from_cli(&cli, Path::new("/work")).unwrap();

        assert_eq!(config.default_sender, "sender@example.com");
        assert_eq!(config.message_stream, "outbound");
        assert_eq!(config.templates_dir, PathBuf::from("/srv/templates"));
        assert_eq!(config.account_token, None);
        assert_eq!(config.transport.timeout, None);
        assert_eq!(config.transport.proxy, None);
    }

    #[test]
    fn test_config_transport_options() {
        let cli = parse(&["--timeout-secs", "15", "--proxy", "http://proxy.internal:3128"]);
        let config = Config::from_cli(&cli, Path::new("/work")).unwrap();
        assert_eq!(config.transport.timeout, Some(Duration::from_secs(15)));
        assert_eq!(
            config.transport.proxy.as_deref(),
            Some("http://proxy.internal:3128")
        );

        let cli = parse(&["--timeout-secs", "0"]);
        assert_eq!(
            Config::from_cli(&cli, Path::new("/work")).unwrap_err(),
            ConfigError::ZeroTimeout
        );
    }

    #[test]
    fn test_config_rejects_bad_sender() {
        let mut cli = parse(&[]);
        cli.default_sender = "not-an-address".to_string();
        assert_eq!(
            Config::from_cli(&cli, Path::new("/work")).unwrap_err(),
            ConfigError::InvalidSender("not-an-address".to_string())
        );

        cli.default_sender = "   ".to_string();
        assert_eq!(
            Config::from_cli(&cli, Path::new("/work")).unwrap_err(),
            ConfigError::Empty("DEFAULT_SENDER_EMAIL")
        );
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let mut cli = parse(&[]);
        cli.account_token = Some("account-secret".to_string());
        let config = Config::from_cli(&cli, Path::new("/work")).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("server-token"));
        assert!(!debug.contains("account-secret"));
        assert!(debug.contains("sender@example.com"));
    }

    #[test]
    fn test_call_subcommand() {
        let cli = parse(&["call", "getTemplateIdeas", r#"{"topic":"welcome"}"#]);
        assert_eq!(
            cli.command,
            Some(Command::Call {
                tool: "getTemplateIdeas".to_string(),
                args: r#"{"topic":"welcome"}"#.to_string(),
            })
        );
    }
}
