//! Pod collector.

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use asset_inventory_repository::opensearch::queries::build_pod_query;
use asset_inventory_repository::{HitFields, IndexPatterns, TelemetryReader};
use asset_inventory_shared::{Asset, AssetKind};

use super::rules::{
    cluster_ean, identity, node_ean, placement_attributes, pod_ean, K8S_NODE_NAME, K8S_POD_UID,
    ORCHESTRATOR_CLUSTER_NAME,
};
use super::{run_query, Collector};
use crate::errors::PipelineError;
use crate::linker::AssetLinker;

/// Derives pods and the nodes they run on.
///
/// Every pod gets a parent edge to its node. The node is created as a stub
/// the first time one of its pods is seen and collects every pod as a child.
pub struct PodCollector {
    patterns: IndexPatterns,
}

impl PodCollector {
    pub fn new(patterns: IndexPatterns) -> Self {
        Self { patterns }
    }

    fn derive(linker: &mut AssetLinker, fields: &HitFields) {
        let (Some(pod_uid), Some(node_name)) = (
            identity(fields, K8S_POD_UID),
            identity(fields, K8S_NODE_NAME),
        ) else {
            debug!("Skipping pod document without pod UID or node name");
            return;
        };

        let pod = pod_ean(&pod_uid);
        let node = node_ean(&node_name);

        linker
            .find_or_create(&pod, || {
                Asset::new(AssetKind::K8sPod, pod_uid.as_str())
                    .with_attributes(placement_attributes(fields))
            })
            .add_parent(node.clone());

        let node_asset =
            linker.find_or_create(&node, || Asset::new(AssetKind::K8sNode, node_name.as_str()));
        node_asset.add_child(pod);

        if let Some(cluster_name) = identity(fields, ORCHESTRATOR_CLUSTER_NAME) {
            node_asset.add_parent(cluster_ean(&cluster_name));
        }
    }
}

#[async_trait]
impl Collector for PodCollector {
    fn name(&self) -> &'static str {
        "pod"
    }

    #[instrument(skip(self, reader))]
    async fn collect(&self, reader: &dyn TelemetryReader) -> Result<Vec<Asset>, PipelineError> {
        let request = build_pod_query(&self.patterns);
        let response = run_query(self.name(), reader, &request).await?;

        let mut linker = AssetLinker::new();
        for fields in response.hits.hits.iter().filter_map(|hit| hit.fields.as_ref()) {
            Self::derive(&mut linker, fields);
        }

        let assets = linker.into_assets();
        info!(count = assets.len(), "Collected pods and nodes");
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{hit, hits_response, MockReader};
    use asset_inventory_shared::Ean;
    use serde_json::json;

    async fn collect(hits: Vec<serde_json::Value>) -> Vec<Asset> {
        let reader = MockReader::new(vec![hits_response(hits.len() as u64, hits)]);
        PodCollector::new(IndexPatterns::local())
            .collect(&reader)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_pod_and_node_from_one_document() {
        let assets = collect(vec![hit(json!({
            "kubernetes.pod.uid": ["P1"],
            "kubernetes.node.name": ["N1"]
        }))])
        .await;

        assert_eq!(assets.len(), 2);

        let pod = &assets[0];
        assert_eq!(pod.ean.as_str(), "k8s.pod:P1");
        assert_eq!(pod.parents, vec![Ean::new("k8s.node", "N1")]);

        let node = &assets[1];
        assert_eq!(node.ean.as_str(), "k8s.node:N1");
        assert_eq!(node.kind, AssetKind::K8sNode);
        assert_eq!(node.children, vec![Ean::new("k8s.pod", "P1")]);
        assert!(node.parents.is_empty());
    }

    #[tokio::test]
    async fn test_pods_share_one_node() {
        let assets = collect(vec![
            hit(json!({ "kubernetes.pod.uid": ["P1"], "kubernetes.node.name": ["N1"] })),
            hit(json!({ "kubernetes.pod.uid": ["P2"], "kubernetes.node.name": ["N1"] })),
            hit(json!({ "kubernetes.pod.uid": ["P3"], "kubernetes.node.name": ["N2"] })),
        ])
        .await;

        let eans: Vec<&str> = assets.iter().map(|a| a.ean.as_str()).collect();
        assert_eq!(
            eans,
            vec!["k8s.pod:P1", "k8s.node:N1", "k8s.pod:P2", "k8s.pod:P3", "k8s.node:N2"]
        );
        assert_eq!(
            assets[1].children,
            vec![Ean::new("k8s.pod", "P1"), Ean::new("k8s.pod", "P2")]
        );
    }

    #[tokio::test]
    async fn test_repeated_document_does_not_duplicate_edges() {
        let doc = json!({ "kubernetes.pod.uid": ["P1"], "kubernetes.node.name": ["N1"] });
        let assets = collect(vec![hit(doc.clone()), hit(doc)]).await;

        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].parents.len(), 1);
        assert_eq!(assets[1].children.len(), 1);
    }

    #[tokio::test]
    async fn test_cluster_attribute_and_node_parent() {
        let assets = collect(vec![hit(json!({
            "kubernetes.pod.uid": ["P1"],
            "kubernetes.node.name": ["N1"],
            "orchestrator.cluster.name": ["prod"],
            "cloud.provider": ["gcp"]
        }))])
        .await;

        assert_eq!(
            assets[0].attributes.orchestrator_cluster_name.as_deref(),
            Some("prod")
        );
        assert_eq!(assets[0].attributes.cloud_provider.as_deref(), Some("gcp"));
        assert_eq!(assets[1].parents, vec![Ean::new("k8s.cluster", "prod")]);
    }

    #[tokio::test]
    async fn test_document_without_node_is_skipped() {
        let assets = collect(vec![hit(json!({ "kubernetes.pod.uid": ["P1"] }))]).await;

        assert!(assets.is_empty());
    }
}
