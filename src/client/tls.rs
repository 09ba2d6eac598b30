//! TLS trust negotiation
//!
//! Picks how server certificates are verified, once at startup:
//! - `StrictOsTrust`: rustls verifying against the OS trust store only.
//! - `FallbackBundledTrust`: rustls verifying against the bundled Mozilla
//!   root set, used when the OS store is unavailable. Logged as a warning.
//! - `InsecureNoVerify`: verification disabled. Only reachable through an
//!   explicit `--tls-mode insecure`, never chosen automatically.

use std::fmt;
use std::time::Duration;

use log::{info, warn};

use crate::config::ClientSettings;
use crate::error::{Error, Result};

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("airs-mcp/", env!("CARGO_PKG_VERSION"));

/// Requested trust mode from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TlsMode {
    /// Probe the OS trust store and fall back to bundled roots
    #[default]
    Auto,
    /// Require the OS trust store
    Strict,
    /// Always use the bundled root set
    Bundled,
    /// Disable certificate verification (unsafe, testing only)
    Insecure,
}

/// Certificate verification strategy injected into the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustStrategy {
    StrictOsTrust,
    FallbackBundledTrust,
    InsecureNoVerify,
}

impl TrustStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustStrategy::StrictOsTrust => "strict (OS trust store)",
            TrustStrategy::FallbackBundledTrust => "fallback (bundled CA roots)",
            TrustStrategy::InsecureNoVerify => "INSECURE (verification disabled)",
        }
    }
}

impl fmt::Display for TrustStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of inspecting the OS trust store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrustStoreProbe {
    /// Certificates loaded from the platform store
    pub roots: usize,
    /// Certificates or sources that failed to load
    pub errors: usize,
}

impl TrustStoreProbe {
    /// Load the platform trust store and count what is usable.
    pub fn os() -> Self {
        let loaded = rustls_native_certs::load_native_certs();
        Self {
            roots: loaded.certs.len(),
            errors: loaded.errors.len(),
        }
    }

    pub fn is_usable(&self) -> bool {
        self.roots > 0
    }
}

/// Immutable transport configuration shared by every request
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub strategy: TrustStrategy,
    pub timeout: Duration,
}

/// Outcome of negotiation: the chosen strategy and the client built for it
#[derive(Debug, Clone)]
pub struct NegotiatedTransport {
    pub strategy: TrustStrategy,
    pub http: reqwest::Client,
}

impl TransportConfig {
    pub fn new(strategy: TrustStrategy, timeout: Duration) -> Self {
        Self { strategy, timeout }
    }

    /// Build an HTTP client honoring the trust strategy.
    pub fn build_http_client(&self) -> Result<reqwest::Client> {
        let builder = reqwest::Client::builder()
            .use_rustls_tls()
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .timeout(self.timeout)
            .user_agent(USER_AGENT);

        let builder = match self.strategy {
            TrustStrategy::StrictOsTrust => builder
                .tls_built_in_webpki_certs(false)
                .tls_built_in_native_certs(true),
            TrustStrategy::FallbackBundledTrust => builder
                .tls_built_in_native_certs(false)
                .tls_built_in_webpki_certs(true),
            TrustStrategy::InsecureNoVerify => {
                warn!("TLS certificate verification is DISABLED (--tls-mode insecure)");
                builder.danger_accept_invalid_certs(true)
            }
        };

        builder
            .build()
            .map_err(|e| Error::Tls(format!("{} client could not be built: {}", self.strategy, e)))
    }
}

/// Choose a strategy for the requested mode given a trust store probe.
pub fn select_strategy(mode: TlsMode, probe: TrustStoreProbe) -> Result<TrustStrategy> {
    match mode {
        TlsMode::Auto if probe.is_usable() => Ok(TrustStrategy::StrictOsTrust),
        TlsMode::Auto => Ok(TrustStrategy::FallbackBundledTrust),
        TlsMode::Strict if probe.is_usable() => Ok(TrustStrategy::StrictOsTrust),
        TlsMode::Strict => Err(Error::Tls(format!(
            "strict mode requested but the OS trust store has no usable certificates ({} load errors)",
            probe.errors
        ))),
        TlsMode::Bundled => Ok(TrustStrategy::FallbackBundledTrust),
        TlsMode::Insecure => Ok(TrustStrategy::InsecureNoVerify),
    }
}

/// Negotiate the TLS strategy for this host and build the HTTP client once.
///
/// Emits one diagnostic line naming the chosen mode. Fails only when no
/// strategy yields a usable client.
pub fn configure_transport(settings: &ClientSettings) -> Result<NegotiatedTransport> {
    let probe = match settings.tls_mode {
        TlsMode::Auto | TlsMode::Strict => TrustStoreProbe::os(),
        TlsMode::Bundled | TlsMode::Insecure => TrustStoreProbe::default(),
    };

    let strategy = select_strategy(settings.tls_mode, probe)?;
    let config = TransportConfig::new(strategy, settings.timeout);

    let negotiated = match (config.build_http_client(), settings.tls_mode) {
        (Ok(http), _) => NegotiatedTransport { strategy, http },
        (Err(err), TlsMode::Auto) if strategy == TrustStrategy::StrictOsTrust => {
            warn!("{}; retrying with bundled roots", err);
            let fallback = TransportConfig::new(TrustStrategy::FallbackBundledTrust, settings.timeout);
            NegotiatedTransport {
                strategy: fallback.strategy,
                http: fallback.build_http_client()?,
            }
        }
        (Err(err), _) => return Err(err),
    };

    match negotiated.strategy {
        TrustStrategy::StrictOsTrust => {
            info!("TLS mode: {} ({} roots)", negotiated.strategy, probe.roots)
        }
        TrustStrategy::FallbackBundledTrust => warn!(
            "TLS mode: {}; the OS trust store was not used, so corporate or custom CAs will not be trusted",
            negotiated.strategy
        ),
        TrustStrategy::InsecureNoVerify => warn!(
            "TLS mode: {}; scan traffic can be intercepted",
            negotiated.strategy
        ),
    }

    Ok(negotiated)
}
