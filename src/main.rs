//! cjump CLI entry point

use clap::Parser;
use cjump::cli::{Cli, Commands};
use cjump::core::error::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout belongs to the terminal host
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("CJUMP_LOG"))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Session(args) => cjump::cli::session::run(args).await,
        Commands::Resolve(args) => cjump::cli::resolve::run(args),
        Commands::Defines(args) => cjump::cli::defines::run(args),
        Commands::Index(args) => cjump::cli::index::run(args),
    }
}
