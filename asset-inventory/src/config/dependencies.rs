//! Dependency initialization and wiring for the asset inventory.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::EtlError;
use asset_inventory_pipeline::{
    collectors::standard_collectors,
    orchestrator::{Orchestrator, OrchestratorConfig},
    scanner::ScanConfig,
    ServiceStrategy,
};
use asset_inventory_repository::{AssetIndexNaming, OpenSearchClient};

use super::clusters::ClustersConfig;
use super::environment::EnvSettings;

/// Default path of the cluster profile file.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// What one run reads from, writes to, and how it collects services.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Cluster to read telemetry from.
    pub read: String,
    /// Cluster to write assets to. Defaults to `read`.
    pub write: Option<String>,
    pub config_path: PathBuf,
    pub service_strategy: ServiceStrategy,
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Initialize all dependencies from the run options and environment.
    ///
    /// Cluster names are validated against the profile file before any
    /// client is built. No request is sent here.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(EtlError)` - If the configuration is invalid or a client cannot be built
    pub async fn new(options: &RunOptions) -> Result<Self, EtlError> {
        let clusters = ClustersConfig::load(&options.config_path)?;
        let (read_profile, write_profile) =
            clusters.resolve(&options.read, options.write.as_deref())?;

        let env = EnvSettings::from_env()?;
        let patterns = env.index_patterns();
        let naming = AssetIndexNaming::default();

        info!(
            read = %options.read,
            write = %options.write.as_deref().unwrap_or(&options.read),
            cross_cluster = patterns.cross_cluster,
            service_strategy = %options.service_strategy,
            "Initializing dependencies"
        );

        let reader = OpenSearchClient::new(&env.reader_settings(read_profile), naming.clone())
            .await
            .map_err(|e| EtlError::config(format!("Failed to create read client: {}", e)))?;

        let writer = OpenSearchClient::new(&env.writer_settings(write_profile), naming.clone())
            .await
            .map_err(|e| EtlError::config(format!("Failed to create write client: {}", e)))?;

        let collectors =
            standard_collectors(patterns, options.service_strategy, ScanConfig::default());

        let orchestrator = Orchestrator::with_config(
            Arc::new(reader),
            Arc::new(writer),
            collectors,
            OrchestratorConfig { naming },
        );

        Ok(Self { orchestrator })
    }
}
