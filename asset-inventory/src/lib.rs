//! # Asset Inventory
//!
//! Main library for the infrastructure asset inventory ETL.
//!
//! This crate provides the configuration and dependency wiring for one run
//! of the asset inventory pipeline.

pub mod config;

pub use config::Dependencies;

use thiserror::Error;

/// Errors that can occur during ETL initialization or execution.
#[derive(Error, Debug)]
pub enum EtlError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    PipelineError(#[from] asset_inventory_pipeline::PipelineError),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] asset_inventory_repository::SearchError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl EtlError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
