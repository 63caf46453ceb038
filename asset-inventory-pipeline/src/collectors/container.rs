//! Container collector.

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use asset_inventory_repository::opensearch::queries::build_container_query;
use asset_inventory_repository::{HitFields, IndexPatterns, TelemetryReader};
use asset_inventory_shared::{Asset, AssetKind};

use super::rules::{container_ean, container_parent, identity, placement_attributes, CONTAINER_ID};
use super::{run_query, Collector};
use crate::errors::PipelineError;
use crate::linker::AssetLinker;

/// Derives containers, parented to their pod or, without orchestrator
/// context, to the host they ran on.
pub struct ContainerCollector {
    patterns: IndexPatterns,
}

impl ContainerCollector {
    pub fn new(patterns: IndexPatterns) -> Self {
        Self { patterns }
    }

    fn derive(linker: &mut AssetLinker, fields: &HitFields) {
        let Some(container_id) = identity(fields, CONTAINER_ID) else {
            debug!("Skipping container document without container id");
            return;
        };

        let container = linker.find_or_create(&container_ean(&container_id), || {
            Asset::new(AssetKind::Container, container_id.as_str())
                .with_attributes(placement_attributes(fields))
        });

        if let Some(parent) = container_parent(fields) {
            container.add_parent(parent);
        }
    }
}

#[async_trait]
impl Collector for ContainerCollector {
    fn name(&self) -> &'static str {
        "container"
    }

    #[instrument(skip(self, reader))]
    async fn collect(&self, reader: &dyn TelemetryReader) -> Result<Vec<Asset>, PipelineError> {
        let request = build_container_query(&self.patterns);
        let response = run_query(self.name(), reader, &request).await?;

        let mut linker = AssetLinker::new();
        for fields in response.hits.hits.iter().filter_map(|hit| hit.fields.as_ref()) {
            Self::derive(&mut linker, fields);
        }

        let assets = linker.into_assets();
        info!(count = assets.len(), "Collected containers");
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{hit, hits_response, MockReader};
    use asset_inventory_shared::Ean;
    use serde_json::json;

    #[tokio::test]
    async fn test_container_parent_precedence() {
        let reader = MockReader::new(vec![hits_response(
            3,
            vec![
                hit(json!({
                    "container.id": ["c1"],
                    "kubernetes.pod.uid": ["P1"],
                    "host.hostname": ["h1"]
                })),
                hit(json!({
                    "container.id": ["c2"],
                    "host.hostname": ["h1"]
                })),
                hit(json!({ "container.id": ["c3"] })),
            ],
        )]);

        let assets = ContainerCollector::new(IndexPatterns::local())
            .collect(&reader)
            .await
            .unwrap();

        assert_eq!(assets.len(), 3);
        assert_eq!(assets[0].ean.as_str(), "container:c1");
        assert_eq!(assets[0].parents, vec![Ean::new("k8s.pod", "P1")]);
        assert_eq!(assets[1].parents, vec![Ean::new("host", "h1")]);
        assert!(assets[2].parents.is_empty());
    }

    #[tokio::test]
    async fn test_hits_without_fields_are_ignored() {
        let reader = MockReader::new(vec![hits_response(
            2,
            vec![json!({ "_index": "logs-app" }), hit(json!({ "container.id": ["c1"] }))],
        )]);

        let assets = ContainerCollector::new(IndexPatterns::local())
            .collect(&reader)
            .await
            .unwrap();

        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].id, "c1");
    }
}
