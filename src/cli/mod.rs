//! CLI command definitions and handlers

use clap::{Parser, Subcommand};

pub mod args;
pub mod context;
pub mod selftest;
pub mod serve;
pub mod status;

pub use args::GlobalOptions;
pub use context::CommandContext;

use crate::client::tls::TlsMode;
use crate::config::{DEFAULT_API_URL, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS};

/// Prisma AIRS MCP bridge - real-time AI security scanning for desktop assistants
#[derive(Parser, Debug)]
#[command(name = "airs-mcp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Prisma AIRS API key
    #[arg(long, global = true, env = "PAN_AIRS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// AI security profile name
    #[arg(long, global = true, env = "PAN_AIRS_PROFILE")]
    pub profile: Option<String>,

    /// Scanning service base URL
    #[arg(long, global = true, env = "PAN_AIRS_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// End-user identifier attached to scans
    #[arg(long, global = true, env = "PAN_AIRS_APP_USER")]
    pub app_user: Option<String>,

    /// Per-attempt request timeout in seconds
    #[arg(long, global = true, env = "PAN_AIRS_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Retries for transient failures
    #[arg(long, global = true, env = "PAN_AIRS_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,

    /// Certificate verification mode
    #[arg(long, global = true, env = "PAN_AIRS_TLS_MODE", value_enum, default_value_t = TlsMode::Auto)]
    pub tls_mode: TlsMode,

    /// Enable debug logging
    #[arg(long, global = true, env = "PAN_AIRS_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the MCP tool server on stdio
    Serve,

    /// Test connectivity and credentials against the scanning service
    Test,

    /// Show configuration and TLS status without contacting the service
    Status,

    /// Display version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_no_subcommand() {
        let cli = Cli::try_parse_from(["airs-mcp"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.timeout, 30);
        assert_eq!(cli.max_retries, 3);
        assert_eq!(cli.tls_mode, TlsMode::Auto);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "airs-mcp",
            "test",
            "--profile",
            "prod",
            "--tls-mode",
            "bundled",
            "--timeout",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.command, Some(Commands::Test));
        assert_eq!(cli.profile.as_deref(), Some("prod"));
        assert_eq!(cli.tls_mode, TlsMode::Bundled);
        assert_eq!(cli.timeout, 5);
    }

    #[test]
    fn test_rejects_unknown_tls_mode() {
        assert!(Cli::try_parse_from(["airs-mcp", "--tls-mode", "off"]).is_err());
    }
}
