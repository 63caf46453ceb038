//! Request and response types for telemetry reads and asset writes.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::SearchError;
use crate::fields::HitFields;

/// Sort-key tuple of a hit, used as a `search_after` cursor.
pub type SortCursor = Vec<Value>;

/// A search against one or more index patterns.
///
/// `body` is the full query DSL. The request is a template: pagination
/// produces new requests from it with [`SearchRequest::with_search_after`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub indices: Vec<String>,
    pub body: Value,
}

impl SearchRequest {
    pub fn new(indices: Vec<String>, body: Value) -> Self {
        Self { indices, body }
    }

    /// A copy of this request resuming after the given sort key.
    pub fn with_search_after(&self, cursor: &[Value]) -> Self {
        let mut next = self.clone();
        if let Value::Object(body) = &mut next.body {
            body.insert("search_after".to_string(), Value::Array(cursor.to_vec()));
        }
        next
    }

    /// The cursor this request resumes after, if any.
    pub fn search_after(&self) -> Option<&[Value]> {
        self.body
            .get("search_after")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
    }

    /// The requested page size.
    pub fn size(&self) -> Option<u64> {
        self.body.get("size").and_then(Value::as_u64)
    }

    /// The query body as compact JSON, for diagnostics.
    pub fn body_json(&self) -> String {
        self.body.to_string()
    }
}

/// How `hits.total.value` relates to the real number of matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TotalRelation {
    Eq,
    Gte,
}

/// `hits.total`, which is a bare number on older servers and an object on newer ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TotalHits {
    Count(u64),
    Tracked { value: u64, relation: TotalRelation },
}

impl TotalHits {
    pub fn value(&self) -> u64 {
        match self {
            TotalHits::Count(value) => *value,
            TotalHits::Tracked { value, .. } => *value,
        }
    }
}

/// One document of a search response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Hit {
    #[serde(rename = "_index", default)]
    pub index: Option<String>,
    #[serde(default)]
    pub fields: Option<HitFields>,
    #[serde(default)]
    pub sort: Option<SortCursor>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HitsEnvelope {
    #[serde(default)]
    pub total: Option<TotalHits>,
    #[serde(default)]
    pub hits: Vec<Hit>,
}

/// A parsed search response: hits and/or raw aggregations.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: HitsEnvelope,
    #[serde(default)]
    pub aggregations: Option<Map<String, Value>>,
}

impl SearchResponse {
    pub fn from_value(value: Value) -> Result<Self, SearchError> {
        serde_json::from_value(value).map_err(|e| SearchError::parse(e.to_string()))
    }

    /// Reported total matches, if the server tracked them.
    pub fn total(&self) -> Option<u64> {
        self.hits.total.map(|total| total.value())
    }

    /// Buckets of a top-level multi-terms aggregation.
    ///
    /// A missing aggregation yields no buckets.
    pub fn buckets(&self, name: &str) -> Result<Vec<TermsBucket>, SearchError> {
        match self.aggregations.as_ref().and_then(|aggs| aggs.get(name)) {
            Some(agg) => parse_buckets(agg),
            None => Ok(Vec::new()),
        }
    }
}

/// One bucket of a (multi-)terms aggregation with its sub-aggregations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TermsBucket {
    pub key: Value,
    #[serde(default)]
    pub doc_count: u64,
    #[serde(flatten)]
    pub sub_aggregations: Map<String, Value>,
}

impl TermsBucket {
    /// The key components as strings. A single-term key is a one-element tuple.
    pub fn key_parts(&self) -> Vec<Option<String>> {
        let parts = match &self.key {
            Value::Array(parts) => parts.iter().collect(),
            other => vec![other],
        };

        parts
            .into_iter()
            .map(|part| match part {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect()
    }

    /// Buckets of a nested aggregation.
    pub fn sub_buckets(&self, name: &str) -> Result<Vec<TermsBucket>, SearchError> {
        match self.sub_aggregations.get(name) {
            Some(agg) => parse_buckets(agg),
            None => Ok(Vec::new()),
        }
    }
}

fn parse_buckets(agg: &Value) -> Result<Vec<TermsBucket>, SearchError> {
    match agg.get("buckets") {
        Some(buckets) => serde_json::from_value(buckets.clone())
            .map_err(|e| SearchError::parse(format!("Invalid aggregation buckets: {}", e))),
        None => Ok(Vec::new()),
    }
}

/// A single create-only write of one serialized asset.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkCreate {
    pub index: String,
    pub document: Value,
}

/// Outcome of one bulk write: item count and whether any item failed.
///
/// Individual item errors are not inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BulkReport {
    pub items: usize,
    pub errors: bool,
}

impl BulkReport {
    /// Read the aggregate outcome from a raw bulk response body.
    pub fn from_response(body: &Value) -> Self {
        Self {
            items: body
                .get("items")
                .and_then(Value::as_array)
                .map(Vec::len)
                .unwrap_or(0),
            errors: body.get("errors").and_then(Value::as_bool).unwrap_or(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_with_search_after_does_not_touch_template() {
        let template = SearchRequest::new(vec!["logs-*".to_string()], json!({ "size": 2 }));
        let next = template.with_search_after(&[json!(1700000000000u64), json!(7)]);

        assert!(template.search_after().is_none());
        assert_eq!(
            next.search_after(),
            Some(&[json!(1700000000000u64), json!(7)][..])
        );
        assert_eq!(next.size(), Some(2));
    }

    #[test]
    fn test_parse_total_shapes() {
        let tracked = SearchResponse::from_value(json!({
            "hits": { "total": { "value": 5, "relation": "eq" }, "hits": [] }
        }))
        .unwrap();
        let legacy = SearchResponse::from_value(json!({
            "hits": { "total": 7, "hits": [] }
        }))
        .unwrap();
        let untracked = SearchResponse::from_value(json!({ "hits": { "hits": [] } })).unwrap();

        assert_eq!(tracked.total(), Some(5));
        assert_eq!(legacy.total(), Some(7));
        assert_eq!(untracked.total(), None);
    }

    #[test]
    fn test_parse_hit_fields_and_sort() {
        let response = SearchResponse::from_value(json!({
            "hits": {
                "total": { "value": 1, "relation": "eq" },
                "hits": [{
                    "_index": "logs-app",
                    "fields": { "host.hostname": ["web-1"] },
                    "sort": [1700000000000u64]
                }]
            }
        }))
        .unwrap();

        let hit = &response.hits.hits[0];
        assert_eq!(hit.index.as_deref(), Some("logs-app"));
        assert_eq!(
            hit.fields.as_ref().and_then(|f| f.first_str("host.hostname")),
            Some("web-1")
        );
        assert_eq!(hit.sort, Some(vec![json!(1700000000000u64)]));
    }

    #[test]
    fn test_nested_buckets() {
        let response = SearchResponse::from_value(json!({
            "hits": { "hits": [] },
            "aggregations": {
                "services": {
                    "buckets": [{
                        "key": ["checkout", "prod"],
                        "doc_count": 3,
                        "parents": {
                            "buckets": [
                                { "key": ["c1", "__unknown__"], "doc_count": 2 }
                            ]
                        }
                    }]
                }
            }
        }))
        .unwrap();

        let buckets = response.buckets("services").unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(
            buckets[0].key_parts(),
            vec![Some("checkout".to_string()), Some("prod".to_string())]
        );

        let inner = buckets[0].sub_buckets("parents").unwrap();
        assert_eq!(inner[0].doc_count, 2);
        assert!(response.buckets("missing").unwrap().is_empty());
    }

    #[test]
    fn test_bulk_report_from_response() {
        let body = json!({
            "took": 3,
            "errors": true,
            "items": [
                { "create": { "status": 201 } },
                { "create": { "status": 400, "error": { "type": "mapper_parsing_exception" } } },
                { "create": { "status": 201 } }
            ]
        });

        let report = BulkReport::from_response(&body);
        assert_eq!(report, BulkReport { items: 3, errors: true });
    }
}
