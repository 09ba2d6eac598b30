//! Command execution context
//!
//! Resolves configuration, negotiates TLS and builds the scan service once,
//! so `serve` and `test` share the exact same startup path.

use std::sync::Arc;

use log::info;

use crate::cli::args::GlobalOptions;
use crate::client::retry::RetryPolicy;
use crate::client::tls::{NegotiatedTransport, configure_transport};
use crate::client::AirsClient;
use crate::config::Config;
use crate::error::Result;
use crate::scan::{RequestShaper, ScanService};

pub struct CommandContext {
    /// Validated configuration
    pub config: Config,
    /// Negotiated trust strategy and HTTP client
    pub transport: NegotiatedTransport,
    /// Scan operations bound to the live client
    pub service: ScanService,
}

impl CommandContext {
    /// Build the context.
    ///
    /// # Errors
    /// Missing credentials or an unusable TLS setup; both are fatal and are
    /// detected before any request is sent.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let config = Config::from_options(opts)?;

        info!("Prisma AIRS MCP bridge v{}", env!("CARGO_PKG_VERSION"));
        info!("Profile: {}", config.credentials.profile);
        info!("Endpoint: {}", config.credentials.base_url);

        let transport = configure_transport(&config.settings)?;

        let client = AirsClient::new(
            Arc::new(config.credentials.clone()),
            transport.http.clone(),
            RetryPolicy::with_max_retries(config.settings.max_retries),
        );
        let shaper = RequestShaper::new(
            config.credentials.profile.clone(),
            config.settings.app_user.as_deref(),
        );

        Ok(Self {
            service: ScanService::new(Arc::new(client), shaper),
            config,
            transport,
        })
    }
}
