//! Prisma AIRS MCP bridge - stdio tool server for AI security scanning

use clap::Parser;
use log::{debug, warn};

mod cli;
mod client;
mod config;
mod error;
mod mcp;
mod scan;

use cli::{Cli, Commands, GlobalOptions};
use error::Result;

#[tokio::main]
async fn main() {
    // Variables already in the environment win over .env entries
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.debug);

    match dotenv {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => warn!("Ignoring unreadable .env file: {}", err),
    }

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(err.exit_code());
    }
}

/// Log to stderr; stdout carries the tool protocol.
fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => cli::serve::run(&opts).await,
        Commands::Test => cli::selftest::run(&opts).await,
        Commands::Status => cli::status::run(&opts),
        Commands::Version => {
            println!("airs-mcp version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
