//! OpenSearch query builders.
//!
//! One builder per collection strategy. Every query is bounded by a trailing
//! time window, projects only the fields needed for identity and attributes
//! (`_source` is disabled), and most collapse on the entity id so each entity
//! comes back once, represented by its most recent document.

use serde_json::{json, Value};

use crate::config::{IndexPatterns, TelemetryCategory};
use crate::types::SearchRequest;

/// Placeholder substituted for a missing aggregation term.
pub const MISSING_SENTINEL: &str = "__unknown__";

/// Lookback for host, pod and container collection.
pub const ENTITY_LOOKBACK: &str = "now-1h";
/// Lookback for the service aggregation and the service-parent lookup.
pub const SERVICE_LOOKBACK: &str = "now-15m";
/// Lookback for service-summary discovery.
pub const SERVICE_SUMMARY_LOOKBACK: &str = "now-10m";

/// Hits per page for single-page collectors.
pub const DEFAULT_PAGE_SIZE: u64 = 1000;

/// Maximum number of (service, environment) buckets.
pub const SERVICE_BUCKET_LIMIT: u64 = 10_000;
/// Maximum number of (container, host) buckets per service.
pub const PARENT_BUCKET_LIMIT: u64 = 1_000;

/// Name of the outer aggregation in [`build_service_aggregation_query`].
pub const SERVICES_AGG: &str = "services";
/// Name of the inner aggregation in [`build_service_aggregation_query`].
pub const SERVICE_PARENTS_AGG: &str = "parents";

fn exists(field: &str) -> Value {
    json!({ "exists": { "field": field } })
}

fn since(lookback: &str) -> Value {
    json!({ "range": { "@timestamp": { "gte": lookback } } })
}

/// Hosts from metrics, logs and APM data.
///
/// Documents that also carry orchestrator or container context score higher,
/// so the collapsed representative of a host is the richest recent one.
pub fn build_host_query(patterns: &IndexPatterns) -> SearchRequest {
    let indices = patterns.for_categories(&[
        TelemetryCategory::Metrics,
        TelemetryCategory::Logs,
        TelemetryCategory::Apm,
    ]);

    SearchRequest::new(
        indices,
        json!({
            "size": DEFAULT_PAGE_SIZE,
            "collapse": { "field": "host.hostname" },
            "sort": [
                { "_score": "desc" },
                { "@timestamp": "desc" }
            ],
            "_source": false,
            "fields": [
                "@timestamp",
                "cloud.*",
                "container.*",
                "host.hostname",
                "kubernetes.*",
                "orchestrator.cluster.name"
            ],
            "query": {
                "bool": {
                    "filter": [since(ENTITY_LOOKBACK)],
                    "must": [exists("host.hostname")],
                    "should": [
                        exists("kubernetes.node.name"),
                        exists("kubernetes.pod.uid"),
                        exists("container.id")
                    ]
                }
            }
        }),
    )
}

/// Pods that reference the node they run on.
pub fn build_pod_query(patterns: &IndexPatterns) -> SearchRequest {
    let indices = patterns.for_categories(&[TelemetryCategory::Logs, TelemetryCategory::Apm]);

    SearchRequest::new(
        indices,
        json!({
            "size": DEFAULT_PAGE_SIZE,
            "collapse": { "field": "kubernetes.pod.uid" },
            "sort": [{ "@timestamp": "desc" }],
            "_source": false,
            "fields": [
                "kubernetes.pod.uid",
                "kubernetes.pod.name",
                "kubernetes.node.id",
                "kubernetes.node.name",
                "kubernetes.namespace",
                "cloud.provider",
                "orchestrator.cluster.name",
                "host.name",
                "host.hostname"
            ],
            "query": {
                "bool": {
                    "filter": [since(ENTITY_LOOKBACK)],
                    "must": [
                        exists("kubernetes.pod.uid"),
                        exists("kubernetes.node.name")
                    ]
                }
            }
        }),
    )
}

/// Containers, preferring documents that name the owning pod or host.
pub fn build_container_query(patterns: &IndexPatterns) -> SearchRequest {
    let indices = patterns.for_categories(&[
        TelemetryCategory::Logs,
        TelemetryCategory::Apm,
        TelemetryCategory::Metrics,
    ]);

    SearchRequest::new(
        indices,
        json!({
            "size": DEFAULT_PAGE_SIZE,
            "collapse": { "field": "container.id" },
            "sort": [
                { "_score": "desc" },
                { "@timestamp": "desc" }
            ],
            "_source": false,
            "fields": [
                "container.id",
                "kubernetes.*",
                "cloud.provider",
                "orchestrator.cluster.name",
                "host.name",
                "host.hostname"
            ],
            "query": {
                "bool": {
                    "filter": [since(ENTITY_LOOKBACK)],
                    "must": [exists("container.id")],
                    "should": [
                        exists("kubernetes.pod.uid"),
                        exists("host.hostname")
                    ]
                }
            }
        }),
    )
}

/// Services with whatever container, pod or host context their documents carry.
pub fn build_service_query(patterns: &IndexPatterns) -> SearchRequest {
    let indices = patterns.for_category(TelemetryCategory::Apm);

    SearchRequest::new(
        indices,
        json!({
            "size": DEFAULT_PAGE_SIZE,
            "collapse": { "field": "service.name" },
            "sort": [{ "@timestamp": "desc" }],
            "_source": false,
            "fields": [
                "service.name",
                "service.environment",
                "container.*",
                "kubernetes.pod.uid",
                "kubernetes.pod.name",
                "kubernetes.node.id",
                "kubernetes.node.name",
                "kubernetes.namespace",
                "cloud.provider",
                "orchestrator.cluster.name",
                "host.name",
                "host.hostname"
            ],
            "query": {
                "bool": {
                    "filter": [since(ENTITY_LOOKBACK)],
                    "must": [exists("service.name")],
                    "should": [
                        exists("container.id"),
                        exists("kubernetes.pod.uid"),
                        exists("host.name"),
                        exists("host.hostname")
                    ],
                    "minimum_should_match": 1
                }
            }
        }),
    )
}

/// Services grouped server-side by (name, environment), each with its
/// (container id, host hostname) pairs. Missing terms become [`MISSING_SENTINEL`].
pub fn build_service_aggregation_query(patterns: &IndexPatterns) -> SearchRequest {
    let indices = patterns.for_category(TelemetryCategory::Apm);

    SearchRequest::new(
        indices,
        json!({
            "size": 0,
            "query": {
                "bool": {
                    "filter": [since(SERVICE_LOOKBACK)],
                    "must": [exists("service.name")]
                }
            },
            "aggs": {
                SERVICES_AGG: {
                    "multi_terms": {
                        "terms": [
                            { "field": "service.name" },
                            { "field": "service.environment", "missing": MISSING_SENTINEL }
                        ],
                        "size": SERVICE_BUCKET_LIMIT
                    },
                    "aggs": {
                        SERVICE_PARENTS_AGG: {
                            "multi_terms": {
                                "terms": [
                                    { "field": "container.id", "missing": MISSING_SENTINEL },
                                    { "field": "host.hostname", "missing": MISSING_SENTINEL }
                                ],
                                "size": PARENT_BUCKET_LIMIT
                            }
                        }
                    }
                }
            }
        }),
    )
}

/// Service-summary metric documents, scanned in ascending time order.
///
/// Totals are tracked exactly so a paginated scan can tell when it is done.
pub fn build_service_summary_query(patterns: &IndexPatterns, page_size: u64) -> SearchRequest {
    let indices = patterns.for_category(TelemetryCategory::Apm);

    SearchRequest::new(
        indices,
        json!({
            "size": page_size,
            "track_total_hits": true,
            "sort": [
                { "@timestamp": "asc" },
                { "_doc": "asc" }
            ],
            "_source": false,
            "fields": [
                "@timestamp",
                "service.name",
                "service.environment"
            ],
            "query": {
                "bool": {
                    "filter": [since(SERVICE_SUMMARY_LOOKBACK)],
                    "must": [
                        { "term": { "metricset.name": "service_summary" } }
                    ]
                }
            }
        }),
    )
}

/// Documents of the named services that carry any parent context.
pub fn build_service_parent_query(
    patterns: &IndexPatterns,
    service_names: &[String],
    page_size: u64,
) -> SearchRequest {
    let indices = patterns.for_category(TelemetryCategory::Apm);

    SearchRequest::new(
        indices,
        json!({
            "size": page_size,
            "track_total_hits": true,
            "sort": [
                { "@timestamp": "asc" },
                { "_doc": "asc" }
            ],
            "_source": false,
            "fields": [
                "@timestamp",
                "data_stream.dataset",
                "event.dataset",
                "service.name",
                "service.environment",
                "container.id",
                "kubernetes.pod.uid",
                "kubernetes.pod.name",
                "host.*"
            ],
            "query": {
                "bool": {
                    "filter": [since(SERVICE_LOOKBACK)],
                    "must": [
                        { "terms": { "service.name": service_names } }
                    ],
                    "should": [
                        exists("container.id"),
                        exists("kubernetes.pod.uid"),
                        exists("host.name"),
                        exists("host.hostname")
                    ],
                    "minimum_should_match": 1
                }
            }
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_query_structure() {
        let request = build_host_query(&IndexPatterns::local());

        assert_eq!(request.indices.len(), 7);
        assert_eq!(request.body["collapse"]["field"], "host.hostname");
        assert_eq!(request.body["_source"], false);
        assert_eq!(
            request.body["query"]["bool"]["filter"][0]["range"]["@timestamp"]["gte"],
            "now-1h"
        );
        assert_eq!(
            request.body["query"]["bool"]["must"][0]["exists"]["field"],
            "host.hostname"
        );
        assert_eq!(
            request.body["query"]["bool"]["should"]
                .as_array()
                .map(Vec::len),
            Some(3)
        );
    }

    #[test]
    fn test_pod_query_requires_node_name() {
        let request = build_pod_query(&IndexPatterns::local());
        let must = request.body["query"]["bool"]["must"].as_array().unwrap();

        assert!(must.contains(&exists("kubernetes.pod.uid")));
        assert!(must.contains(&exists("kubernetes.node.name")));
        assert_eq!(request.body["collapse"]["field"], "kubernetes.pod.uid");
    }

    #[test]
    fn test_cross_cluster_indices_are_qualified() {
        let request = build_container_query(&IndexPatterns::cross_cluster());

        assert!(request
            .indices
            .iter()
            .all(|index| index.starts_with("remote_cluster:")));
    }

    #[test]
    fn test_service_aggregation_uses_sentinel() {
        let request = build_service_aggregation_query(&IndexPatterns::local());
        let outer = &request.body["aggs"][SERVICES_AGG];
        let inner = &outer["aggs"][SERVICE_PARENTS_AGG];

        assert_eq!(request.body["size"], 0);
        assert_eq!(outer["multi_terms"]["terms"][0]["field"], "service.name");
        assert_eq!(outer["multi_terms"]["terms"][1]["missing"], MISSING_SENTINEL);
        assert_eq!(inner["multi_terms"]["terms"][0]["field"], "container.id");
        assert_eq!(inner["multi_terms"]["terms"][1]["missing"], MISSING_SENTINEL);
    }

    #[test]
    fn test_scan_queries_sort_ascending_and_track_totals() {
        let summary = build_service_summary_query(&IndexPatterns::local(), 500);
        let parents = build_service_parent_query(
            &IndexPatterns::local(),
            &["checkout".to_string(), "cart".to_string()],
            500,
        );

        for request in [&summary, &parents] {
            assert_eq!(request.size(), Some(500));
            assert_eq!(request.body["track_total_hits"], true);
            assert_eq!(request.body["sort"][0]["@timestamp"], "asc");
            assert_eq!(request.body["sort"][1]["_doc"], "asc");
            assert!(request.search_after().is_none());
        }

        assert_eq!(
            summary.body["query"]["bool"]["filter"][0]["range"]["@timestamp"]["gte"],
            "now-10m"
        );
        assert_eq!(
            parents.body["query"]["bool"]["must"][0]["terms"]["service.name"],
            json!(["checkout", "cart"])
        );
    }
}
