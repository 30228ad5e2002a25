mod cmd;
mod config;
mod error;

use clap::Parser;
use config::{Cli, Commands};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,kafkaviz_engine=debug".into()),
        )
        .with_target(false)
        .init();

    let result = match Cli::parse().command {
        Commands::Serve(args) => cmd::serve::run(args).await,
    };
    if let Err(e) = result {
        tracing::error!(error = %e, "kafkaviz-server failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
