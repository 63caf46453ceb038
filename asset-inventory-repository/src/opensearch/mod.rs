//! OpenSearch implementation of the telemetry reader and asset writer.
//!
//! This module provides the concrete client, the query DSL builders used by
//! the collectors, and the index template for the asset indices.

mod client;
mod index_config;
pub mod queries;

pub use client::{ConnectionSettings, OpenSearchClient, DEFAULT_REQUEST_TIMEOUT};
pub use index_config::{get_index_template, INDEX_TEMPLATE_NAME};
