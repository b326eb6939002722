#![doc = "veeam-metrics-core: polls the Veeam Backup & Replication REST API and builds one metrics document."]

//! The pipeline for one run, leaf first:
//!
//! - [`config`] validates the raw input into a [`config::RunConfig`]
//! - [`auth`] exchanges credentials for an [`auth::AuthToken`]
//! - [`client`] performs authenticated GETs through a [`contract::HttpTransport`]
//! - [`enrich`] attaches session history to every job, isolating per-job failures
//! - [`aggregate`] drives the above and renders the single JSON output
//!
//! Nothing is shared between runs: config and token are passed explicitly.

pub mod aggregate;
pub mod auth;
pub mod client;
pub mod config;
pub mod contract;
pub mod enrich;
pub mod error;
pub mod transport;

pub use aggregate::{run_params, run_with, ErrorDocument, MetricsDocument};
pub use config::RunConfig;
pub use error::{MetricsError, MetricsResult};
