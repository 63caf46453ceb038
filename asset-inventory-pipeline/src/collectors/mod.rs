//! Entity collectors.
//!
//! Each collector queries the telemetry store over a trailing time window and
//! derives one kind of asset, plus the edges visible on the same documents.
//! Query failures are logged with the full query body and returned as-is; a
//! query with no matches yields no assets.

mod container;
mod host;
mod pod;
pub mod rules;
mod service;
mod service_aggregation;
pub mod service_summaries;

pub use container::ContainerCollector;
pub use host::HostCollector;
pub use pod::PodCollector;
pub use service::ServiceCollector;
pub use service_aggregation::ServiceAggregationCollector;
pub use service_summaries::ServiceSummaryCollector;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use tracing::error;

use asset_inventory_repository::{IndexPatterns, SearchRequest, SearchResponse, TelemetryReader};
use asset_inventory_shared::Asset;

use crate::errors::PipelineError;
use crate::scanner::ScanConfig;

/// Derives assets of one kind from telemetry.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Short name used in logs and batch reports.
    fn name(&self) -> &'static str;

    /// Query the store and derive assets, in query result order.
    async fn collect(&self, reader: &dyn TelemetryReader) -> Result<Vec<Asset>, PipelineError>;
}

/// How services are collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServiceStrategy {
    /// Server-side (name, environment) buckets with (container, host) sub-buckets.
    #[default]
    Aggregation,
    /// One collapsed document per service, correlated with containers in memory.
    Linear,
    /// Service-summary discovery followed by a parent lookup.
    Summaries,
}

impl ServiceStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStrategy::Aggregation => "aggregation",
            ServiceStrategy::Linear => "linear",
            ServiceStrategy::Summaries => "summaries",
        }
    }

    /// Build the collector for this strategy.
    pub fn collector(&self, patterns: IndexPatterns, scan: ScanConfig) -> Box<dyn Collector> {
        match self {
            ServiceStrategy::Aggregation => Box::new(ServiceAggregationCollector::new(patterns)),
            ServiceStrategy::Linear => Box::new(ServiceCollector::new(patterns)),
            ServiceStrategy::Summaries => Box::new(ServiceSummaryCollector::new(patterns, scan)),
        }
    }
}

impl fmt::Display for ServiceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aggregation" => Ok(ServiceStrategy::Aggregation),
            "linear" => Ok(ServiceStrategy::Linear),
            "summaries" => Ok(ServiceStrategy::Summaries),
            other => Err(format!("unknown service strategy: {}", other)),
        }
    }
}

/// The collectors of one run, in write order: host, pod, container, service.
pub fn standard_collectors(
    patterns: IndexPatterns,
    services: ServiceStrategy,
    scan: ScanConfig,
) -> Vec<Box<dyn Collector>> {
    vec![
        Box::new(HostCollector::new(patterns)),
        Box::new(PodCollector::new(patterns)),
        Box::new(ContainerCollector::new(patterns)),
        services.collector(patterns, scan),
    ]
}

/// Run a single-page query, logging the query body if it fails.
pub(crate) async fn run_query(
    collector: &'static str,
    reader: &dyn TelemetryReader,
    request: &SearchRequest,
) -> Result<SearchResponse, PipelineError> {
    reader.search(request).await.map_err(|e| {
        error!(
            collector,
            error = %e,
            query = %request.body_json(),
            "Collector query failed"
        );
        PipelineError::collector(collector, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_collector_order() {
        let collectors = standard_collectors(
            IndexPatterns::local(),
            ServiceStrategy::default(),
            ScanConfig::default(),
        );
        let names: Vec<&str> = collectors.iter().map(|c| c.name()).collect();

        assert_eq!(names, vec!["host", "pod", "container", "service"]);
    }

    #[test]
    fn test_service_strategy_parsing() {
        assert_eq!("Linear".parse(), Ok(ServiceStrategy::Linear));
        assert_eq!(" summaries ".parse(), Ok(ServiceStrategy::Summaries));
        assert_eq!(
            ServiceStrategy::Aggregation.to_string().parse(),
            Ok(ServiceStrategy::Aggregation)
        );
        assert!("bogus".parse::<ServiceStrategy>().is_err());
    }
}
