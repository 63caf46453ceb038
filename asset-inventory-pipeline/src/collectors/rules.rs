//! Identity and edge derivation shared by the collectors.
//!
//! Every EAN a collector writes, whether for the asset itself or for an edge,
//! is built here so both ends of an edge agree on the name.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use asset_inventory_repository::opensearch::queries::MISSING_SENTINEL;
use asset_inventory_repository::HitFields;
use asset_inventory_shared::{AssetAttributes, AssetKind, Ean};

pub const TIMESTAMP: &str = "@timestamp";
pub const HOST_HOSTNAME: &str = "host.hostname";
pub const HOST_NAME: &str = "host.name";
pub const K8S_NODE_NAME: &str = "kubernetes.node.name";
pub const K8S_POD_UID: &str = "kubernetes.pod.uid";
pub const CONTAINER_ID: &str = "container.id";
pub const SERVICE_NAME: &str = "service.name";
pub const SERVICE_ENVIRONMENT: &str = "service.environment";
pub const CLOUD_PROVIDER: &str = "cloud.provider";
pub const CLOUD_SERVICE_NAME: &str = "cloud.service.name";
pub const CLOUD_REGION: &str = "cloud.region";
pub const CLOUD_INSTANCE_ID: &str = "cloud.instance.id";
pub const ORCHESTRATOR_CLUSTER_NAME: &str = "orchestrator.cluster.name";
pub const EVENT_DATASET: &str = "event.dataset";
pub const DATA_STREAM_DATASET: &str = "data_stream.dataset";

/// Kind prefix of the cluster a node belongs to. Clusters are referenced,
/// never emitted as assets.
pub const K8S_CLUSTER: &str = "k8s.cluster";

/// Type of a host that is neither a Kubernetes node nor a known cloud instance.
pub const PLAIN_HOST_TYPE: &str = "host";

pub fn host_ean(hostname: &str) -> Ean {
    Ean::of(AssetKind::Host, hostname)
}

pub fn node_ean(node_name: &str) -> Ean {
    Ean::of(AssetKind::K8sNode, node_name)
}

pub fn pod_ean(pod_uid: &str) -> Ean {
    Ean::of(AssetKind::K8sPod, pod_uid)
}

pub fn container_ean(container_id: &str) -> Ean {
    Ean::of(AssetKind::Container, container_id)
}

pub fn service_ean(service_name: &str) -> Ean {
    Ean::of(AssetKind::Service, service_name)
}

pub fn cluster_ean(cluster_name: &str) -> Ean {
    Ean::new(K8S_CLUSTER, cluster_name)
}

/// The first value of an identity field. Blank values count as absent so
/// they never end up in an EAN.
pub fn identity(fields: &HitFields, name: &str) -> Option<String> {
    fields
        .first_string(name)
        .filter(|value| !value.trim().is_empty())
}

/// Refined host type: `<provider>.<service>` lowercased when both cloud
/// fields are present, `host` otherwise.
pub fn host_type(fields: &HitFields) -> String {
    match (
        identity(fields, CLOUD_PROVIDER),
        identity(fields, CLOUD_SERVICE_NAME),
    ) {
        (Some(provider), Some(service)) => format!("{}.{}", provider, service).to_lowercase(),
        _ => PLAIN_HOST_TYPE.to_string(),
    }
}

/// Who a host document describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    pub kind: AssetKind,
    pub asset_type: String,
    pub id: String,
}

impl HostIdentity {
    pub fn ean(&self) -> Ean {
        Ean::new(&self.asset_type, &self.id)
    }
}

/// Identify a host: a Kubernetes node by node name when present, otherwise a
/// (possibly cloud-refined) host by hostname. `None` if neither is present.
pub fn host_identity(fields: &HitFields) -> Option<HostIdentity> {
    if let Some(node_name) = identity(fields, K8S_NODE_NAME) {
        return Some(HostIdentity {
            kind: AssetKind::K8sNode,
            asset_type: AssetKind::K8sNode.as_str().to_string(),
            id: node_name,
        });
    }

    let hostname = identity(fields, HOST_HOSTNAME)?;
    Some(HostIdentity {
        kind: AssetKind::Host,
        asset_type: host_type(fields),
        id: hostname,
    })
}

/// Cloud and orchestrator attributes, each present only if the document carried it.
pub fn infrastructure_attributes(fields: &HitFields) -> AssetAttributes {
    AssetAttributes {
        cloud_provider: fields.first_string(CLOUD_PROVIDER),
        cloud_service_name: fields.first_string(CLOUD_SERVICE_NAME),
        cloud_region: fields.first_string(CLOUD_REGION),
        cloud_instance_id: fields.first_string(CLOUD_INSTANCE_ID),
        orchestrator_cluster_name: fields.first_string(ORCHESTRATOR_CLUSTER_NAME),
        service_environment: None,
    }
}

/// Only the provider and cluster name, for assets below the host level.
pub fn placement_attributes(fields: &HitFields) -> AssetAttributes {
    AssetAttributes {
        cloud_provider: fields.first_string(CLOUD_PROVIDER),
        orchestrator_cluster_name: fields.first_string(ORCHESTRATOR_CLUSTER_NAME),
        ..Default::default()
    }
}

/// Owner of a container: its pod when known, else the host it ran on.
pub fn container_parent(fields: &HitFields) -> Option<Ean> {
    if let Some(pod_uid) = identity(fields, K8S_POD_UID) {
        return Some(pod_ean(&pod_uid));
    }
    identity(fields, HOST_HOSTNAME).map(|hostname| host_ean(&hostname))
}

/// An aggregation key component, or `None` if it is the missing-value sentinel.
pub fn present_term(term: Option<&str>) -> Option<&str> {
    term.filter(|value| *value != MISSING_SENTINEL)
}

/// An aggregation key component usable in an EAN: present and not blank.
pub fn identity_term(term: Option<&str>) -> Option<&str> {
    present_term(term).filter(|value| !value.trim().is_empty())
}

/// Event time of a hit, accepting RFC 3339 strings and epoch milliseconds.
pub fn event_timestamp(fields: &HitFields) -> Option<DateTime<Utc>> {
    match fields.first(TIMESTAMP)? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

/// Most specific known parent of a service, by fixed precedence:
/// container id, pod UID, host name, host hostname.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceParent {
    Container(String),
    Pod(String),
    HostName(String),
    HostHostname(String),
    Unknown,
}

impl ServiceParent {
    pub fn infer(
        container_id: Option<&str>,
        pod_uid: Option<&str>,
        host_name: Option<&str>,
        host_hostname: Option<&str>,
    ) -> Self {
        if let Some(id) = container_id {
            return Self::Container(id.to_string());
        }
        if let Some(uid) = pod_uid {
            return Self::Pod(uid.to_string());
        }
        if let Some(name) = host_name {
            return Self::HostName(name.to_string());
        }
        if let Some(hostname) = host_hostname {
            return Self::HostHostname(hostname.to_string());
        }
        Self::Unknown
    }

    /// EAN of the parent asset. `None` when the parent is unknown.
    pub fn ean(&self) -> Option<Ean> {
        match self {
            Self::Container(id) => Some(container_ean(id)),
            Self::Pod(uid) => Some(pod_ean(uid)),
            Self::HostName(name) => Some(host_ean(name)),
            Self::HostHostname(hostname) => Some(host_ean(hostname)),
            Self::Unknown => None,
        }
    }
}
