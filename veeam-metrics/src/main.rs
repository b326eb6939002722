use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use veeam_metrics::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment before parsing so VEEAM_PARAMS from .env is seen.
    dotenvy::dotenv().ok();

    // stdout carries the metrics document only.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("CLI completed successfully"),
        Err(e) => tracing::error!(error = %e, "CLI exited with error"),
    }
    result
}
