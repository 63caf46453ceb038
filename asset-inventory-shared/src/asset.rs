//! The derived asset record and its persisted document shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Ean;

/// The kinds of infrastructure an asset can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    #[serde(rename = "host")]
    Host,
    #[serde(rename = "k8s.node")]
    K8sNode,
    #[serde(rename = "k8s.pod")]
    K8sPod,
    #[serde(rename = "container")]
    Container,
    #[serde(rename = "service")]
    Service,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Host => "host",
            AssetKind::K8sNode => "k8s.node",
            AssetKind::K8sPod => "k8s.pod",
            AssetKind::Container => "container",
            AssetKind::Service => "service",
        }
    }
}

/// Optional attributes copied from the telemetry document an asset was derived from.
///
/// A field is `Some` only if the source document carried it; `None` fields are
/// left out of the persisted document entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetAttributes {
    #[serde(rename = "cloud.provider", skip_serializing_if = "Option::is_none")]
    pub cloud_provider: Option<String>,
    #[serde(rename = "cloud.service.name", skip_serializing_if = "Option::is_none")]
    pub cloud_service_name: Option<String>,
    #[serde(rename = "cloud.region", skip_serializing_if = "Option::is_none")]
    pub cloud_region: Option<String>,
    #[serde(rename = "cloud.instance.id", skip_serializing_if = "Option::is_none")]
    pub cloud_instance_id: Option<String>,
    #[serde(rename = "orchestrator.cluster.name", skip_serializing_if = "Option::is_none")]
    pub orchestrator_cluster_name: Option<String>,
    #[serde(rename = "service.environment", skip_serializing_if = "Option::is_none")]
    pub service_environment: Option<String>,
}

/// One derived piece of infrastructure: a host, node, pod, container or service.
///
/// `timestamp` is the time the asset was derived, not the time of the
/// underlying telemetry event. Edge lists hold other assets' EANs and never
/// contain the same EAN twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    #[serde(rename = "@timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "asset.ean")]
    pub ean: Ean,
    #[serde(rename = "asset.kind")]
    pub kind: AssetKind,
    /// Refined type, e.g. `aws.ec2` for a host. Equal to the kind otherwise.
    #[serde(rename = "asset.type")]
    pub asset_type: String,
    #[serde(rename = "asset.id")]
    pub id: String,
    #[serde(rename = "asset.name")]
    pub name: String,
    #[serde(rename = "asset.parents", default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<Ean>,
    #[serde(rename = "asset.children", default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Ean>,
    #[serde(rename = "asset.references", default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Ean>,
    #[serde(flatten)]
    pub attributes: AssetAttributes,
}

impl Asset {
    /// Create an asset whose type is its kind.
    pub fn new(kind: AssetKind, id: impl Into<String>) -> Self {
        Self::with_type(kind, kind.as_str(), id)
    }

    /// Create an asset with a refined type. The EAN is built from the type.
    pub fn with_type(kind: AssetKind, asset_type: impl Into<String>, id: impl Into<String>) -> Self {
        let asset_type = asset_type.into();
        let id = id.into();

        Self {
            timestamp: Utc::now(),
            ean: Ean::new(&asset_type, &id),
            kind,
            asset_type,
            name: id.clone(),
            id,
            parents: Vec::new(),
            children: Vec::new(),
            references: Vec::new(),
            attributes: AssetAttributes::default(),
        }
    }

    pub fn with_attributes(mut self, attributes: AssetAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Append a parent edge. Returns `false` if the edge was already present.
    pub fn add_parent(&mut self, ean: Ean) -> bool {
        push_unique(&mut self.parents, ean)
    }

    /// Append a child edge. Returns `false` if the edge was already present.
    pub fn add_child(&mut self, ean: Ean) -> bool {
        push_unique(&mut self.children, ean)
    }

    /// Append a reference edge. Returns `false` if the edge was already present.
    pub fn add_reference(&mut self, ean: Ean) -> bool {
        push_unique(&mut self.references, ean)
    }
}

fn push_unique(edges: &mut Vec<Ean>, ean: Ean) -> bool {
    if edges.contains(&ean) {
        return false;
    }
    edges.push(ean);
    true
}
