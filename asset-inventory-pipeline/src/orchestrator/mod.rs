//! Orchestrator module for the asset inventory pipeline.
//!
//! Runs the collectors one after another and writes each collector's assets
//! as a single bulk batch.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use asset_inventory_repository::{
    AssetIndexNaming, AssetWriter, BulkCreate, BulkReport, TelemetryReader,
};
use asset_inventory_shared::Asset;

use crate::collectors::Collector;
use crate::errors::PipelineError;

/// Configuration for the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    /// Naming of the indices assets are written to.
    pub naming: AssetIndexNaming,
}

/// What happened to one collector's batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// The bulk request completed. Individual items may still have failed.
    Written(BulkReport),
    /// The bulk request itself failed.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub collector: &'static str,
    pub outcome: BatchOutcome,
}

impl BatchReport {
    /// Whether any part of the batch failed.
    pub fn has_errors(&self) -> bool {
        match &self.outcome {
            BatchOutcome::Written(report) => report.errors,
            BatchOutcome::Failed(_) => true,
        }
    }
}

/// Per-batch outcomes of one run, in write order. Collectors that produced
/// no assets have no batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: Vec<BatchReport>,
}

impl RunSummary {
    pub fn has_errors(&self) -> bool {
        self.batches.iter().any(BatchReport::has_errors)
    }
}

/// Orchestrator that sequences collectors and writes.
///
/// Collectors run strictly in the order given, and each batch is written
/// before the next collector starts. A collector failure aborts the run. A
/// write failure is logged and reported, and the run moves on.
pub struct Orchestrator {
    reader: Arc<dyn TelemetryReader>,
    writer: Arc<dyn AssetWriter>,
    collectors: Vec<Box<dyn Collector>>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(
        reader: Arc<dyn TelemetryReader>,
        writer: Arc<dyn AssetWriter>,
        collectors: Vec<Box<dyn Collector>>,
    ) -> Self {
        Self::with_config(reader, writer, collectors, OrchestratorConfig::default())
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        reader: Arc<dyn TelemetryReader>,
        writer: Arc<dyn AssetWriter>,
        collectors: Vec<Box<dyn Collector>>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            reader,
            writer,
            collectors,
            config,
        }
    }

    /// Run every collector once and write its assets.
    ///
    /// The asset index template is installed first; failing to install it
    /// aborts the run before any collector is queried.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        info!(collectors = self.collectors.len(), "Starting asset inventory run");

        self.writer.ensure_index_template().await?;

        let mut summary = RunSummary::default();

        for collector in &self.collectors {
            let assets = collector.collect(self.reader.as_ref()).await?;

            if assets.is_empty() {
                info!(collector = collector.name(), "No assets collected");
                continue;
            }

            let batch = self.build_batch(&assets)?;
            let outcome = match self.writer.bulk_create(&batch).await {
                Ok(report) => {
                    if report.errors {
                        warn!(
                            collector = collector.name(),
                            items = report.items,
                            "Asset batch written with item errors"
                        );
                    } else {
                        info!(
                            collector = collector.name(),
                            items = report.items,
                            "Asset batch written"
                        );
                    }
                    BatchOutcome::Written(report)
                }
                Err(e) => {
                    error!(
                        collector = collector.name(),
                        assets = batch.len(),
                        error = %e,
                        "Failed to write asset batch"
                    );
                    BatchOutcome::Failed(e.to_string())
                }
            };

            summary.batches.push(BatchReport {
                collector: collector.name(),
                outcome,
            });
        }

        info!(
            batches = summary.batches.len(),
            errors = summary.has_errors(),
            "Asset inventory run complete"
        );
        Ok(summary)
    }

    /// One create operation per asset, addressed by the asset's type.
    fn build_batch(&self, assets: &[Asset]) -> Result<Vec<BulkCreate>, PipelineError> {
        assets
            .iter()
            .map(|asset| {
                let document = serde_json::to_value(asset)
                    .map_err(|e| PipelineError::serialization(e.to_string()))?;
                Ok(BulkCreate {
                    index: self.config.naming.index_for(asset),
                    document,
                })
            })
            .collect()
    }
}
