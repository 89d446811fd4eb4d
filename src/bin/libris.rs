//! Libris CLI binary.

use std::process;

use clap::Parser;
use libris::cli::{args::*, commands::*};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = LibrisArgs::parse();

    // RUST_LOG wins over -v/-q when set.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_filter())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = execute_command(args).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
