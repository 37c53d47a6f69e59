use clap::Parser;
use miette::{IntoDiagnostic, Result};
use schooldesk::interfaces::cli::{self, Cli};
use std::io;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so listings on stdout stay clean CSV.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let stdout = io::stdout();
    cli::run(cli, &mut stdout.lock(), &mut io::stderr())
        .await
        .into_diagnostic()?;

    Ok(())
}
