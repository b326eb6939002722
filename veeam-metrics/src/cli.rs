///
/// This module implements the CLI interface for veeam-metrics: command parsing,
/// the async entrypoint, and writing the one output document to stdout.
///
/// All pipeline logic (validation, login, enrichment, aggregation) lives in the
/// [`veeam-metrics-core`] crate. This module is strictly CLI glue.
///
/// ## Output contract
/// `collect` always prints exactly one JSON document on stdout, either the
/// metrics document or `{"error": "..."}`. Logs go to stderr.
///
/// [`veeam-metrics-core`]: ../../veeam-metrics-core/
use crate::load_config::{load_params, ParamsSource};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use veeam_metrics_core::aggregate::{render_error, run_params};
use veeam_metrics_core::transport::ReqwestTransport;

/// CLI for veeam-metrics: poll the Veeam REST API and emit one metrics document.
#[derive(Parser)]
#[clap(
    name = "veeam-metrics",
    version,
    about = "Poll the Veeam Backup & Replication REST API and print one consolidated metrics JSON document"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect job, session and repository state once and print it as JSON
    Collect {
        /// Input parameters as a JSON object (falls back to VEEAM_PARAMS)
        #[clap(long)]
        params: Option<String>,
        /// Path to a file holding the JSON parameters
        #[clap(long)]
        params_file: Option<PathBuf>,
    },
}

/// Runs one collection and returns the output document.
pub async fn collect(params: Option<String>, params_file: Option<PathBuf>) -> String {
    match ParamsSource::from_args(params, params_file).and_then(load_params) {
        Ok(params) => run_params(&params, ReqwestTransport::from_config).await,
        Err(e) => {
            tracing::debug!(error = %e, "Could not load input parameters");
            render_error(format!("{e:#}"))
        }
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Collect {
            params,
            params_file,
        } => {
            tracing::info!(command = "collect", "Starting collection");
            let output = collect(params, params_file).await;
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{output}")?;
            stdout.flush()?;
            tracing::info!(command = "collect", "Collection complete");
        }
    }

    Ok(())
}
