//! Status command implementation

use colored::Colorize;

use crate::cli::args::GlobalOptions;
use crate::client::tls::{TrustStoreProbe, select_strategy};
use crate::config::normalize_base_url;
use crate::error::Result;

/// Display configuration status. Never contacts the scanning service.
pub fn run(opts: &GlobalOptions) -> Result<()> {
    println!("{}\n", "Prisma AIRS MCP Configuration Status".bold());

    if opts.api_key.as_deref().is_some_and(|k| !k.trim().is_empty()) {
        println!("{} API key configured", "✓".green());
    } else {
        println!("{} API key not configured", "✗".red());
        println!("  → Set PAN_AIRS_API_KEY or pass --api-key");
    }

    match opts.profile.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(profile) => println!("{} Profile: {}", "✓".green(), profile),
        None => {
            println!("{} Profile not configured", "✗".red());
            println!("  → Set PAN_AIRS_PROFILE or pass --profile");
        }
    }

    match normalize_base_url(&opts.api_url) {
        Ok(url) => println!("{} Endpoint: {}", "✓".green(), url.cyan()),
        Err(err) => println!("{} {}", "✗".red(), err),
    }

    let probe = TrustStoreProbe::os();
    println!(
        "{} OS trust store: {} certificate(s), {} load error(s)",
        "○".dimmed(),
        probe.roots,
        probe.errors
    );
    match select_strategy(opts.tls_mode, probe) {
        Ok(strategy) => println!("{} TLS mode: {}", "✓".green(), strategy),
        Err(err) => println!("{} {}", "✗".red(), err),
    }

    println!(
        "{} Timeout: {}s, retries: {}",
        "○".dimmed(),
        opts.timeout_secs,
        opts.max_retries
    );
    println!();

    Ok(())
}
