//! Projection Service Library
//!
//! Orchestration around the projection engine: chunked batch execution with a
//! circuit breaker, the Postgres storage collaborator, JSON seed loading,
//! csv/json export, configuration and logging setup.

use anyhow::{Context, Result};
use std::path::Path;

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod orchestrator;
pub mod pg_store;
pub mod seed;

pub use config::ServiceConfig;
pub use error::{Result as ServiceResult, ServiceError};
pub use export::{export_projections, ExportFilter, ExportFormat};
pub use logging::initialize_logging;
pub use orchestrator::{BatchRunner, RunSummary};
pub use pg_store::PgStatStore;
pub use seed::{apply_seed, load_seed, SeedData};

/// Load configuration from an optional file and environment variables
pub fn load_configuration(path: Option<&Path>) -> Result<ServiceConfig> {
    config::load_config(path).context("Failed to load service configuration")
}
