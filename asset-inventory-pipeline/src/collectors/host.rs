//! Host collector.

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use asset_inventory_repository::opensearch::queries::build_host_query;
use asset_inventory_repository::{HitFields, IndexPatterns, TelemetryReader};
use asset_inventory_shared::Asset;

use super::rules::{host_identity, identity, infrastructure_attributes, pod_ean, K8S_POD_UID};
use super::{run_query, Collector};
use crate::errors::PipelineError;
use crate::linker::AssetLinker;

/// Derives hosts and Kubernetes nodes from metrics, logs and APM documents.
///
/// A document with a node name yields a `k8s.node`; otherwise the hostname
/// yields a host typed by its cloud provider and service. A pod UID on the
/// same document becomes a child edge.
pub struct HostCollector {
    patterns: IndexPatterns,
}

impl HostCollector {
    pub fn new(patterns: IndexPatterns) -> Self {
        Self { patterns }
    }

    fn derive(linker: &mut AssetLinker, fields: &HitFields) {
        let Some(host_id) = host_identity(fields) else {
            debug!("Skipping host document without a hostname");
            return;
        };

        let ean = host_id.ean();
        let host = linker.find_or_create(&ean, || {
            Asset::with_type(host_id.kind, host_id.asset_type.clone(), host_id.id.clone())
                .with_attributes(infrastructure_attributes(fields))
        });

        if let Some(pod_uid) = identity(fields, K8S_POD_UID) {
            host.add_child(pod_ean(&pod_uid));
        }
    }
}

#[async_trait]
impl Collector for HostCollector {
    fn name(&self) -> &'static str {
        "host"
    }

    #[instrument(skip(self, reader))]
    async fn collect(&self, reader: &dyn TelemetryReader) -> Result<Vec<Asset>, PipelineError> {
        let request = build_host_query(&self.patterns);
        let response = run_query(self.name(), reader, &request).await?;

        let mut linker = AssetLinker::new();
        for fields in response.hits.hits.iter().filter_map(|hit| hit.fields.as_ref()) {
            Self::derive(&mut linker, fields);
        }

        let assets = linker.into_assets();
        info!(count = assets.len(), "Collected hosts");
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{hit, hits_response, MockReader};
    use asset_inventory_shared::{AssetKind, Ean};
    use serde_json::json;

    #[tokio::test]
    async fn test_cloud_host() {
        let reader = MockReader::new(vec![hits_response(
            1,
            vec![hit(json!({
                "host.hostname": ["ip-10-0-0-1"],
                "cloud.provider": ["AWS"],
                "cloud.service.name": ["EC2"],
                "cloud.region": ["us-east-1"],
                "cloud.instance.id": ["i-0abc"]
            }))],
        )]);

        let assets = HostCollector::new(IndexPatterns::local())
            .collect(&reader)
            .await
            .unwrap();

        assert_eq!(assets.len(), 1);
        let host = &assets[0];
        assert_eq!(host.kind, AssetKind::Host);
        assert_eq!(host.asset_type, "aws.ec2");
        assert_eq!(host.ean.as_str(), "aws.ec2:ip-10-0-0-1");
        assert_eq!(host.name, "ip-10-0-0-1");
        assert_eq!(host.attributes.cloud_provider.as_deref(), Some("AWS"));
        assert_eq!(host.attributes.cloud_instance_id.as_deref(), Some("i-0abc"));
        assert!(host.attributes.orchestrator_cluster_name.is_none());
        assert!(host.children.is_empty());
    }

    #[tokio::test]
    async fn test_node_with_pod_child() {
        let reader = MockReader::new(vec![hits_response(
            2,
            vec![
                hit(json!({
                    "host.hostname": ["ip-10-0-0-2"],
                    "kubernetes.node.name": ["N1"],
                    "kubernetes.pod.uid": ["P1"],
                    "orchestrator.cluster.name": ["prod"]
                })),
                hit(json!({ "host.hostname": ["laptop"] })),
            ],
        )]);

        let assets = HostCollector::new(IndexPatterns::local())
            .collect(&reader)
            .await
            .unwrap();

        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].kind, AssetKind::K8sNode);
        assert_eq!(assets[0].ean.as_str(), "k8s.node:N1");
        assert_eq!(assets[0].children, vec![Ean::new("k8s.pod", "P1")]);
        assert_eq!(
            assets[0].attributes.orchestrator_cluster_name.as_deref(),
            Some("prod")
        );
        assert_eq!(assets[1].ean.as_str(), "host:laptop");
    }

    #[tokio::test]
    async fn test_same_node_from_two_hostnames_is_one_asset() {
        let reader = MockReader::new(vec![hits_response(
            2,
            vec![
                hit(json!({
                    "host.hostname": ["a"],
                    "kubernetes.node.name": ["N1"],
                    "kubernetes.pod.uid": ["P1"]
                })),
                hit(json!({
                    "host.hostname": ["b"],
                    "kubernetes.node.name": ["N1"],
                    "kubernetes.pod.uid": ["P2"]
                })),
            ],
        )]);

        let assets = HostCollector::new(IndexPatterns::local())
            .collect(&reader)
            .await
            .unwrap();

        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].children.len(), 2);
    }

    #[tokio::test]
    async fn test_blank_pod_uid_adds_no_child() {
        let reader = MockReader::new(vec![hits_response(
            1,
            vec![hit(json!({
                "host.hostname": ["web-1"],
                "kubernetes.node.name": [""],
                "kubernetes.pod.uid": [""],
                "cloud.provider": [""],
                "cloud.service.name": ["ec2"]
            }))],
        )]);

        let assets = HostCollector::new(IndexPatterns::local())
            .collect(&reader)
            .await
            .unwrap();

        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].ean.as_str(), "host:web-1");
        assert!(assets[0].children.is_empty());
    }

    #[tokio::test]
    async fn test_no_matches_is_empty() {
        let reader = MockReader::new(vec![hits_response(0, vec![])]);

        let assets = HostCollector::new(IndexPatterns::local())
            .collect(&reader)
            .await
            .unwrap();

        assert!(assets.is_empty());
        assert_eq!(reader.request(0).body["collapse"]["field"], "host.hostname");
    }

    #[tokio::test]
    async fn test_query_failure_propagates() {
        let reader = MockReader::new(vec![]).then_fail("index_not_found_exception");

        let err = HostCollector::new(IndexPatterns::local())
            .collect(&reader)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::CollectorError {
                collector: "host",
                ..
            }
        ));
    }
}
