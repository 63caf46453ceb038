//! # Asset Inventory Repository
//!
//! This crate provides the traits and implementations for talking to the
//! telemetry store: reading logs, traces and metrics, and writing derived
//! assets back. It includes the error types, a typed request/response layer,
//! the index pattern resolver and a concrete implementation for OpenSearch.

pub mod config;
pub mod errors;
pub mod fields;
pub mod interfaces;
pub mod opensearch;
pub mod types;

pub use config::{AssetIndexNaming, IndexPatterns, TelemetryCategory};
pub use errors::SearchError;
pub use fields::HitFields;
pub use interfaces::{AssetWriter, TelemetryReader};
pub use opensearch::OpenSearchClient;
pub use types::{
    BulkCreate, BulkReport, Hit, SearchRequest, SearchResponse, SortCursor, TermsBucket,
};
