//! Process configuration for the AIRS bridge
//!
//! Everything here is resolved once at startup from CLI flags and
//! `PAN_AIRS_*` environment variables, then shared read-only.

use std::fmt;
use std::time::Duration;

use log::warn;

use crate::cli::args::GlobalOptions;
use crate::client::tls::TlsMode;
use crate::error::{ConfigError, Result};

/// Default AIRS API base URL
pub const DEFAULT_API_URL: &str = "https://service.api.aisecurity.paloaltonetworks.com";

/// Default per-attempt request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Upper bound accepted for `--max-retries`
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Client identifier attached to every scan as metadata
pub const APP_NAME: &str = "airs-mcp";

/// API key wrapper that never prints its contents
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Raw key for the auth header. Do not log.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Credentials for the scanning service
#[derive(Debug, Clone)]
pub struct Credentials {
    /// API key sent in the `x-pan-token` header
    pub api_key: ApiKey,

    /// AI security profile name applied to every scan
    pub profile: String,

    /// Base URL without trailing slash
    pub base_url: String,
}

/// Transport and request shaping settings
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Per-attempt timeout
    pub timeout: Duration,

    /// Retries after the first attempt for transient failures
    pub max_retries: u32,

    /// Requested TLS trust mode
    pub tls_mode: TlsMode,

    /// Optional end-user identifier forwarded as scan metadata
    pub app_user: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            tls_mode: TlsMode::Auto,
            app_user: None,
        }
    }
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub settings: ClientSettings,
}

impl Config {
    /// Resolve and validate configuration from global CLI options.
    ///
    /// Fails on a missing API key or profile before anything touches the network.
    pub fn from_options(opts: &GlobalOptions) -> Result<Self> {
        let api_key = non_empty(opts.api_key.as_deref()).ok_or(ConfigError::MissingApiKey)?;
        let profile = non_empty(opts.profile.as_deref()).ok_or(ConfigError::MissingProfile)?;
        let base_url = normalize_base_url(&opts.api_url)?;

        if opts.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout must be at least 1 second".to_string()).into());
        }
        if opts.max_retries > MAX_RETRIES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max retries must be at most {}, got {}",
                MAX_RETRIES_LIMIT, opts.max_retries
            ))
            .into());
        }

        Ok(Self {
            credentials: Credentials {
                api_key: ApiKey::new(api_key),
                profile: profile.to_string(),
                base_url,
            },
            settings: ClientSettings {
                timeout: Duration::from_secs(opts.timeout_secs),
                max_retries: opts.max_retries,
                tls_mode: opts.tls_mode,
                app_user: non_empty(opts.app_user.as_deref()).map(str::to_string),
            },
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Validate the scheme and strip trailing slashes so endpoint paths join cleanly.
pub fn normalize_base_url(url: &str) -> Result<String> {
    let trimmed = url.trim().trim_end_matches('/');

    let parsed = reqwest::Url::parse(trimmed).map_err(|e| ConfigError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "https" => {}
        "http" => warn!(
            "API URL {} is not HTTPS; scan content will be sent unencrypted",
            trimmed
        ),
        other => {
            return Err(ConfigError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", other),
            }
            .into());
        }
    }

    Ok(trimmed.to_string())
}
