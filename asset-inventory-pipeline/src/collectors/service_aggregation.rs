//! Aggregation-based service collector.

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use asset_inventory_repository::opensearch::queries::{
    build_service_aggregation_query, SERVICES_AGG, SERVICE_PARENTS_AGG,
};
use asset_inventory_repository::{IndexPatterns, TelemetryReader, TermsBucket};
use asset_inventory_shared::{Asset, AssetAttributes, AssetKind};

use super::rules::{container_ean, host_ean, identity_term, present_term};
use super::{run_query, Collector};
use crate::errors::PipelineError;

/// Derives services from a server-side (name, environment) grouping.
///
/// Each outer bucket becomes one service. Its (container id, hostname)
/// sub-buckets become `container` parents and `host` references, skipping
/// whichever component was missing on the source documents.
pub struct ServiceAggregationCollector {
    patterns: IndexPatterns,
}

impl ServiceAggregationCollector {
    pub fn new(patterns: IndexPatterns) -> Self {
        Self { patterns }
    }

    fn service_from_bucket(&self, bucket: &TermsBucket) -> Result<Option<Asset>, PipelineError> {
        let key = bucket.key_parts();
        let Some(name) = key.first().and_then(|part| identity_term(part.as_deref())) else {
            debug!(key = %bucket.key, "Skipping service bucket without a name");
            return Ok(None);
        };
        let environment = key.get(1).and_then(|part| present_term(part.as_deref()));

        let mut service = Asset::new(AssetKind::Service, name).with_attributes(AssetAttributes {
            service_environment: environment.map(str::to_string),
            ..Default::default()
        });

        let parents = bucket
            .sub_buckets(SERVICE_PARENTS_AGG)
            .map_err(|e| PipelineError::collector(self.name(), e))?;

        for parent in &parents {
            let parts = parent.key_parts();
            if let Some(container_id) = parts.first().and_then(|p| identity_term(p.as_deref())) {
                service.add_parent(container_ean(container_id));
            }
            if let Some(hostname) = parts.get(1).and_then(|p| identity_term(p.as_deref())) {
                service.add_reference(host_ean(hostname));
            }
        }

        Ok(Some(service))
    }
}

#[async_trait]
impl Collector for ServiceAggregationCollector {
    fn name(&self) -> &'static str {
        "service"
    }

    #[instrument(skip(self, reader))]
    async fn collect(&self, reader: &dyn TelemetryReader) -> Result<Vec<Asset>, PipelineError> {
        let request = build_service_aggregation_query(&self.patterns);
        let response = run_query(self.name(), reader, &request).await?;

        let buckets = response
            .buckets(SERVICES_AGG)
            .map_err(|e| PipelineError::collector(self.name(), e))?;

        let mut assets = Vec::with_capacity(buckets.len());
        for bucket in &buckets {
            if let Some(service) = self.service_from_bucket(bucket)? {
                assets.push(service);
            }
        }

        info!(
            buckets = buckets.len(),
            count = assets.len(),
            "Collected services from aggregation"
        );
        Ok(assets)
    }
}
