//! Search error types.
//!
//! This module defines the error types that can occur while reading telemetry
//! from, or writing assets to, the search backend.

use thiserror::Error;

/// Errors that can occur during search engine operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Failed to establish connection to the search engine.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Search query execution failed. Carries the serialized query body so the
    /// caller can report exactly what was sent.
    #[error("Query error: {message}")]
    QueryError { message: String, query: String },

    /// The bulk request itself failed (transport or non-2xx status).
    #[error("Bulk error: {0}")]
    BulkError(String),

    /// Failed to install the assets index template.
    #[error("Index template error: {0}")]
    IndexTemplateError(String),

    /// Failed to parse response from search engine.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl SearchError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a query error for the given query body.
    pub fn query(msg: impl Into<String>, query: impl Into<String>) -> Self {
        Self::QueryError {
            message: msg.into(),
            query: query.into(),
        }
    }

    /// Create a bulk error.
    pub fn bulk(msg: impl Into<String>) -> Self {
        Self::BulkError(msg.into())
    }

    /// Create an index template error.
    pub fn index_template(msg: impl Into<String>) -> Self {
        Self::IndexTemplateError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_keeps_body() {
        let err = SearchError::query("status 400", r#"{"size":1000}"#);

        assert_eq!(err.to_string(), "Query error: status 400");
        assert!(matches!(
            err,
            SearchError::QueryError { ref query, .. } if query == r#"{"size":1000}"#
        ));
    }
}
