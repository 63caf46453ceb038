//! Error types for the asset inventory pipeline.

use asset_inventory_repository::SearchError;
use thiserror::Error;

/// Errors that can occur in the asset inventory pipeline.
///
/// Any of these aborts the run. Failed asset writes are not errors; they are
/// reported per batch by the orchestrator.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A collector's query failed.
    #[error("Collector {collector} failed: {source}")]
    CollectorError {
        collector: &'static str,
        #[source]
        source: SearchError,
    },

    /// A paginated scan failed part way through.
    #[error("Scan failed after {pages} pages ({retrieved} hits): {source}")]
    ScanError {
        pages: usize,
        retrieved: u64,
        #[source]
        source: SearchError,
    },

    /// Error from the search engine outside of a collector.
    #[error("Search error: {0}")]
    SearchError(#[from] SearchError),

    /// An asset could not be serialized for writing.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl PipelineError {
    /// Create a collector error.
    pub fn collector(collector: &'static str, source: SearchError) -> Self {
        Self::CollectorError { collector, source }
    }

    /// Create a scan error.
    pub fn scan(pages: usize, retrieved: u64, source: SearchError) -> Self {
        Self::ScanError {
            pages,
            retrieved,
            source,
        }
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }
}
