//! Error types for the asset inventory repository.

mod search_error;

pub use search_error::SearchError;
