//! Linear service collector.

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use asset_inventory_repository::opensearch::queries::build_service_query;
use asset_inventory_repository::{HitFields, IndexPatterns, TelemetryReader};
use asset_inventory_shared::{Asset, AssetAttributes, AssetKind};

use super::rules::{
    container_ean, identity, node_ean, pod_ean, present_term, service_ean, CLOUD_PROVIDER,
    CONTAINER_ID, K8S_NODE_NAME, K8S_POD_UID, SERVICE_ENVIRONMENT, SERVICE_NAME,
};
use super::{run_query, Collector};
use crate::errors::PipelineError;
use crate::linker::AssetLinker;

/// Derives services one document at a time and correlates them with the
/// containers they run in.
///
/// A container is created the first time a service document names it and
/// accumulates every service seen in it as a child. The service itself
/// references the pod and node found on the same document.
pub struct ServiceCollector {
    patterns: IndexPatterns,
}

impl ServiceCollector {
    pub fn new(patterns: IndexPatterns) -> Self {
        Self { patterns }
    }

    fn derive(linker: &mut AssetLinker, fields: &HitFields) {
        let Some(service_name) = identity(fields, SERVICE_NAME) else {
            debug!("Skipping service document without service name");
            return;
        };

        let service = service_ean(&service_name);
        let container = identity(fields, CONTAINER_ID).map(|id| (container_ean(&id), id));
        let pod = identity(fields, K8S_POD_UID).map(|uid| pod_ean(&uid));
        let node = identity(fields, K8S_NODE_NAME).map(|name| node_ean(&name));

        let service_asset = linker.find_or_create(&service, || {
            Asset::new(AssetKind::Service, service_name.as_str()).with_attributes(AssetAttributes {
                cloud_provider: fields.first_string(CLOUD_PROVIDER),
                service_environment: present_term(fields.first_str(SERVICE_ENVIRONMENT))
                    .map(str::to_string),
                ..Default::default()
            })
        });

        if let Some((ean, _)) = &container {
            service_asset.add_parent(ean.clone());
        }
        for reference in pod.iter().chain(node.iter()) {
            service_asset.add_reference(reference.clone());
        }

        let Some((container, container_id)) = container else {
            return;
        };

        let container_asset = linker.find_or_create(&container, || {
            Asset::new(AssetKind::Container, container_id.as_str())
        });
        container_asset.add_child(service);
        if let Some(pod) = pod {
            container_asset.add_parent(pod);
        }
        if let Some(node) = node {
            container_asset.add_reference(node);
        }
    }
}

#[async_trait]
impl Collector for ServiceCollector {
    fn name(&self) -> &'static str {
        "service"
    }

    #[instrument(skip(self, reader))]
    async fn collect(&self, reader: &dyn TelemetryReader) -> Result<Vec<Asset>, PipelineError> {
        let request = build_service_query(&self.patterns);
        let response = run_query(self.name(), reader, &request).await?;

        let mut linker = AssetLinker::new();
        for fields in response.hits.hits.iter().filter_map(|hit| hit.fields.as_ref()) {
            Self::derive(&mut linker, fields);
        }

        let assets = linker.into_assets();
        info!(count = assets.len(), "Collected services and their containers");
        Ok(assets)
    }
}
