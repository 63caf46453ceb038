//! # Asset Inventory Pipeline
//!
//! This crate derives infrastructure assets from telemetry and hands them to
//! the asset writer.
//!
//! ## Architecture
//!
//! The pipeline runs strictly forward, one request at a time:
//!
//! 1. **Collectors**: Query telemetry and derive hosts, pods, containers and services
//! 2. **Linker**: Merges edges discovered across documents for the same asset
//! 3. **Scanner**: Exhaustively pages through result sets larger than one page
//! 4. **Orchestrator**: Runs the collectors in order and writes one batch per collector

pub mod collectors;
pub mod errors;
pub mod linker;
pub mod orchestrator;
pub mod scanner;

#[cfg(test)]
mod mock;

pub use collectors::{Collector, ServiceStrategy};
pub use errors::PipelineError;
pub use linker::AssetLinker;
pub use orchestrator::{BatchOutcome, BatchReport, Orchestrator, OrchestratorConfig, RunSummary};
pub use scanner::{PaginatedScanner, ScanConfig, ScanOutcome};
