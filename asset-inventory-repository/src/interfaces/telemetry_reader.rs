//! Telemetry read trait definition.

use async_trait::async_trait;

use crate::errors::SearchError;
use crate::types::{SearchRequest, SearchResponse};

/// Read access to logs, traces and metrics in the telemetry store.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync` so one handle can be shared by
/// every collector for the lifetime of a run.
#[async_trait]
pub trait TelemetryReader: Send + Sync {
    /// Execute one search request.
    ///
    /// # Arguments
    ///
    /// * `request` - Index patterns plus the full query DSL body
    ///
    /// # Returns
    ///
    /// * `Ok(SearchResponse)` - Hits and aggregations; zero matches is not an error
    /// * `Err(SearchError::QueryError)` - If the query fails, carrying the query body
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError>;
}
