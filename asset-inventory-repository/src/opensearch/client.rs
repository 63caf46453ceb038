//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `TelemetryReader` and
//! `AssetWriter` using the OpenSearch Rust client.

use std::time::Duration;

use async_trait::async_trait;
use opensearch::{
    auth::Credentials,
    cert::CertificateValidation,
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::IndicesPutIndexTemplateParts,
    BulkParts, OpenSearch, SearchParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::config::AssetIndexNaming;
use crate::errors::SearchError;
use crate::interfaces::{AssetWriter, TelemetryReader};
use crate::opensearch::index_config::{get_index_template, INDEX_TEMPLATE_NAME};
use crate::types::{BulkCreate, BulkReport, SearchRequest, SearchResponse};

/// Default deadline for a single request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything needed to open a connection to one cluster.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Cluster URL, e.g. `https://localhost:9200`.
    pub url: String,
    /// Basic auth username and password.
    pub credentials: Option<(String, String)>,
    /// Reject certificates that fail validation.
    pub validate_certificates: bool,
    /// Deadline applied to every request sent through this client.
    pub request_timeout: Duration,
}

impl ConnectionSettings {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            credentials: None,
            validate_certificates: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }
}

/// OpenSearch client implementation.
///
/// One instance wraps one cluster connection. A run builds one for reading
/// telemetry and one for writing assets (possibly to the same cluster), and
/// passes them explicitly to everything that needs them.
///
/// # Example
///
/// ```ignore
/// let settings = ConnectionSettings::new("https://localhost:9200")
///     .with_credentials("elastic", "changeme");
/// let client = OpenSearchClient::new(&settings, AssetIndexNaming::default()).await?;
///
/// client.ensure_index_template().await?;
/// let response = client.search(&request).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
    naming: AssetIndexNaming,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client for the given cluster.
    ///
    /// No request is sent; connection problems surface on first use.
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchError)` - If the URL is invalid or the transport cannot be built
    pub async fn new(
        settings: &ConnectionSettings,
        naming: AssetIndexNaming,
    ) -> Result<Self, SearchError> {
        let parsed_url =
            Url::parse(&settings.url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .timeout(settings.request_timeout);

        if let Some((username, password)) = &settings.credentials {
            builder = builder.auth(Credentials::Basic(username.clone(), password.clone()));
        }

        if !settings.validate_certificates {
            builder = builder.cert_validation(CertificateValidation::None);
        }

        let transport = builder
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        info!(
            url = %settings.url,
            validate_certificates = settings.validate_certificates,
            timeout_secs = settings.request_timeout.as_secs(),
            "Created OpenSearch client"
        );

        Ok(Self {
            client: OpenSearch::new(transport),
            naming,
        })
    }

    /// Build the bulk body: one `create` action line followed by its document.
    fn bulk_body(operations: &[BulkCreate]) -> Vec<JsonBody<Value>> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(operations.len() * 2);
        for operation in operations {
            body.push(json!({ "create": { "_index": operation.index } }).into());
            body.push(operation.document.clone().into());
        }
        body
    }
}

#[async_trait]
impl TelemetryReader for OpenSearchClient {
    #[instrument(skip(self, request), fields(indices = ?request.indices))]
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        let indices: Vec<&str> = request.indices.iter().map(String::as_str).collect();

        let response = self
            .client
            .search(SearchParts::Index(&indices))
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| SearchError::query(e.to_string(), request.body_json()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Search request failed");
            return Err(SearchError::query(
                format!("Search failed with status {}: {}", status, error_body),
                request.body_json(),
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        let parsed = SearchResponse::from_value(body)?;
        debug!(
            hits = parsed.hits.hits.len(),
            total = ?parsed.total(),
            "Search completed"
        );
        Ok(parsed)
    }
}

#[async_trait]
impl AssetWriter for OpenSearchClient {
    async fn ensure_index_template(&self) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .put_index_template(IndicesPutIndexTemplateParts::Name(INDEX_TEMPLATE_NAME))
            .body(get_index_template(&self.naming))
            .send()
            .await
            .map_err(|e| SearchError::index_template(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Index template request failed");
            return Err(SearchError::index_template(format!(
                "Put index template failed with status {}: {}",
                status, error_body
            )));
        }

        info!(template = INDEX_TEMPLATE_NAME, "Asset index template installed");
        Ok(())
    }

    #[instrument(skip(self, operations), fields(count = operations.len()))]
    async fn bulk_create(&self, operations: &[BulkCreate]) -> Result<BulkReport, SearchError> {
        if operations.is_empty() {
            return Ok(BulkReport::default());
        }

        let response = self
            .client
            .bulk(BulkParts::None)
            .body(Self::bulk_body(operations))
            .send()
            .await
            .map_err(|e| SearchError::bulk(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchError::bulk(format!(
                "Bulk request failed with status {}: {}",
                status, error_body
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::parse(e.to_string()))?;

        Ok(BulkReport::from_response(&body))
    }
}
