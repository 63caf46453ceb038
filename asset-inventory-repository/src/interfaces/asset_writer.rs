//! Asset write trait definition.

use async_trait::async_trait;

use crate::errors::SearchError;
use crate::types::{BulkCreate, BulkReport};

/// Write access to the asset indices.
///
/// Writes are insert-only: every call creates new documents and never
/// updates an existing asset in place.
#[async_trait]
pub trait AssetWriter: Send + Sync {
    /// Install the index template for the asset indices.
    ///
    /// This should be called once at startup, before any asset is written.
    async fn ensure_index_template(&self) -> Result<(), SearchError>;

    /// Send one batch of create operations.
    ///
    /// # Returns
    ///
    /// * `Ok(BulkReport)` - Item count and aggregate error flag. Failed items
    ///   are reported through the flag, not as an `Err`.
    /// * `Err(SearchError::BulkError)` - If the request as a whole failed
    async fn bulk_create(&self, operations: &[BulkCreate]) -> Result<BulkReport, SearchError>;
}
