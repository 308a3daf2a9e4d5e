//! reportdrop - pulls the daily sales report CSV out of Gmail
//!
//! Every outcome, including failures, is reported on stdout and the process
//! exits normally.

mod cli;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,reportdrop=info")),
        )
        .init();

    let args = cli::Cli::parse();

    if let Err(error) = cli::run(args).await {
        println!("An error occurred: {:#}", error);
    }
}
