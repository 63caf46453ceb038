//! Two-phase service collection from service-summary metrics.
//!
//! Discovery scans the summary documents of the last few minutes and keeps
//! the latest summary per (name, environment). The parent lookup then scans
//! the discovered services' own documents over a wider window and infers the
//! most specific parent each document names. Lookup records are returned as
//! retrieved, one per document, without deduplication.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use asset_inventory_repository::opensearch::queries::{
    build_service_parent_query, build_service_summary_query,
};
use asset_inventory_repository::{Hit, IndexPatterns, TelemetryReader};
use asset_inventory_shared::{Asset, AssetAttributes, AssetKind};

use super::rules::{
    event_timestamp, identity, ServiceParent, CONTAINER_ID, DATA_STREAM_DATASET, EVENT_DATASET,
    HOST_HOSTNAME, HOST_NAME, K8S_POD_UID, SERVICE_ENVIRONMENT, SERVICE_NAME,
};
use super::Collector;
use crate::errors::PipelineError;
use crate::scanner::{dedup_latest, PaginatedScanner, ScanConfig};

/// Latest summary seen for one (name, environment).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSummary {
    pub timestamp: Option<DateTime<Utc>>,
    pub name: String,
    pub environment: Option<String>,
}

impl ServiceSummary {
    fn from_hit(hit: &Hit) -> Option<Self> {
        let fields = hit.fields.as_ref()?;
        Some(Self {
            timestamp: event_timestamp(fields),
            name: identity(fields, SERVICE_NAME)?,
            environment: fields.first_string(SERVICE_ENVIRONMENT),
        })
    }

    fn key(&self) -> (String, Option<String>) {
        (self.name.clone(), self.environment.clone())
    }
}

/// One service document with its inferred parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceParentRecord {
    pub timestamp: Option<DateTime<Utc>>,
    pub name: String,
    pub environment: Option<String>,
    pub parent: ServiceParent,
    pub container_id: Option<String>,
    pub pod_uid: Option<String>,
    pub host_name: Option<String>,
    pub host_hostname: Option<String>,
    pub event_dataset: Option<String>,
    pub data_stream_dataset: Option<String>,
}

impl ServiceParentRecord {
    fn from_hit(hit: &Hit) -> Option<Self> {
        let fields = hit.fields.as_ref()?;
        let container_id = identity(fields, CONTAINER_ID);
        let pod_uid = identity(fields, K8S_POD_UID);
        let host_name = identity(fields, HOST_NAME);
        let host_hostname = identity(fields, HOST_HOSTNAME);

        let parent = ServiceParent::infer(
            container_id.as_deref(),
            pod_uid.as_deref(),
            host_name.as_deref(),
            host_hostname.as_deref(),
        );

        Some(Self {
            timestamp: event_timestamp(fields),
            name: identity(fields, SERVICE_NAME)?,
            environment: fields.first_string(SERVICE_ENVIRONMENT),
            parent,
            container_id,
            pod_uid,
            host_name,
            host_hostname,
            event_dataset: fields.first_string(EVENT_DATASET),
            data_stream_dataset: fields.first_string(DATA_STREAM_DATASET),
        })
    }
}

/// Scan recent service summaries and keep the latest per (name, environment).
pub async fn discover_services(
    reader: &dyn TelemetryReader,
    scanner: &PaginatedScanner,
    patterns: &IndexPatterns,
) -> Result<Vec<ServiceSummary>, PipelineError> {
    let request = build_service_summary_query(patterns, scanner.page_size());
    let outcome = scanner
        .scan(reader, &request, ServiceSummary::from_hit)
        .await?;

    let scanned = outcome.records.len();
    let services = dedup_latest(outcome.records, ServiceSummary::key, |s| s.timestamp);

    info!(scanned, services = services.len(), "Discovered services");
    Ok(services)
}

/// Scan the documents of the given services for parent context.
///
/// Skips the query entirely when there are no services.
pub async fn lookup_service_parents(
    reader: &dyn TelemetryReader,
    scanner: &PaginatedScanner,
    patterns: &IndexPatterns,
    services: &[ServiceSummary],
) -> Result<Vec<ServiceParentRecord>, PipelineError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(services.len());
    let mut names: Vec<String> = Vec::new();
    for service in services {
        if seen.insert(service.name.as_str()) {
            names.push(service.name.clone());
        }
    }

    if names.is_empty() {
        debug!("No services discovered, skipping parent lookup");
        return Ok(Vec::new());
    }

    let request = build_service_parent_query(patterns, &names, scanner.page_size());
    let outcome = scanner
        .scan(reader, &request, ServiceParentRecord::from_hit)
        .await?;

    info!(
        services = names.len(),
        records = outcome.records.len(),
        "Looked up service parents"
    );
    Ok(outcome.records)
}

/// Collects services through discovery followed by a parent lookup.
///
/// Emits one service per discovered (name, environment). A lookup record is
/// attached to the service with the same name and environment, or to every
/// service of that name when its environment matches none of them.
pub struct ServiceSummaryCollector {
    patterns: IndexPatterns,
    scanner: PaginatedScanner,
}

impl ServiceSummaryCollector {
    pub fn new(patterns: IndexPatterns, scan: ScanConfig) -> Self {
        Self {
            patterns,
            scanner: PaginatedScanner::new(scan),
        }
    }

    fn build_assets(
        services: &[ServiceSummary],
        parents: &[ServiceParentRecord],
    ) -> Vec<Asset> {
        let mut assets: Vec<Asset> = Vec::with_capacity(services.len());
        let mut positions: HashMap<(String, Option<String>), usize> = HashMap::new();

        for service in services {
            positions.insert(service.key(), assets.len());
            assets.push(
                Asset::new(AssetKind::Service, service.name.as_str()).with_attributes(
                    AssetAttributes {
                        service_environment: service.environment.clone(),
                        ..Default::default()
                    },
                ),
            );
        }

        for record in parents {
            let Some(parent) = record.parent.ean() else {
                continue;
            };

            let key = (record.name.clone(), record.environment.clone());
            match positions.get(&key) {
                Some(&position) => {
                    assets[position].add_parent(parent);
                }
                None => {
                    for asset in assets.iter_mut().filter(|a| a.id == record.name) {
                        asset.add_parent(parent.clone());
                    }
                }
            }
        }

        assets
    }
}

#[async_trait]
impl Collector for ServiceSummaryCollector {
    fn name(&self) -> &'static str {
        "service"
    }

    #[instrument(skip(self, reader))]
    async fn collect(&self, reader: &dyn TelemetryReader) -> Result<Vec<Asset>, PipelineError> {
        let services = discover_services(reader, &self.scanner, &self.patterns).await?;
        let parents =
            lookup_service_parents(reader, &self.scanner, &self.patterns, &services).await?;

        let assets = Self::build_assets(&services, &parents);
        info!(count = assets.len(), "Collected services from summaries");
        Ok(assets)
    }
}
