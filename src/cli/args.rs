//! Global CLI options shared across all commands

use crate::cli::Cli;
use crate::client::tls::TlsMode;

/// Global CLI options passed to all command handlers.
///
/// Captures the CLI/env layer exactly as given; validation happens in
/// `Config::from_options`.
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub api_key: Option<String>,
    pub profile: Option<String>,
    pub api_url: String,
    pub app_user: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub tls_mode: TlsMode,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            api_key: cli.api_key.clone(),
            profile: cli.profile.clone(),
            api_url: cli.api_url.clone(),
            app_user: cli.app_user.clone(),
            timeout_secs: cli.timeout,
            max_retries: cli.max_retries,
            tls_mode: cli.tls_mode,
        }
    }
}
