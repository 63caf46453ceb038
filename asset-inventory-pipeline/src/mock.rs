//! In-memory telemetry reader and asset writer for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use asset_inventory_repository::{
    AssetWriter, BulkCreate, BulkReport, SearchError, SearchRequest, SearchResponse,
    TelemetryReader,
};

/// Replays canned responses in order and records every request.
pub struct MockReader {
    responses: Mutex<VecDeque<Result<Value, String>>>,
    pub requests: Mutex<Vec<SearchRequest>>,
}

impl MockReader {
    pub fn new(responses: Vec<Value>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a failure after whatever responses are already queued.
    pub fn then_fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> SearchRequest {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl TelemetryReader for MockReader {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, SearchError> {
        self.requests.lock().unwrap().push(request.clone());

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(body)) => SearchResponse::from_value(body),
            Some(Err(message)) => Err(SearchError::query(message, request.body_json())),
            None => SearchResponse::from_value(hits_response(0, vec![])),
        }
    }
}

/// Records every batch; items whose index is listed in `failing_indices`
/// are reported as failed through the aggregate flag.
pub struct MockWriter {
    pub batches: Mutex<Vec<Vec<BulkCreate>>>,
    pub template_installs: AtomicUsize,
    failing_indices: Vec<String>,
    reject_requests: bool,
}

impl MockWriter {
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            template_installs: AtomicUsize::new(0),
            failing_indices: Vec::new(),
            reject_requests: false,
        }
    }

    pub fn failing_on(index: &str) -> Self {
        Self {
            failing_indices: vec![index.to_string()],
            ..Self::new()
        }
    }

    /// Every bulk request fails as a whole.
    pub fn rejecting() -> Self {
        Self {
            reject_requests: true,
            ..Self::new()
        }
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

#[async_trait]
impl AssetWriter for MockWriter {
    async fn ensure_index_template(&self) -> Result<(), SearchError> {
        self.template_installs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn bulk_create(&self, operations: &[BulkCreate]) -> Result<BulkReport, SearchError> {
        self.batches.lock().unwrap().push(operations.to_vec());

        if self.reject_requests {
            return Err(SearchError::bulk("connection reset"));
        }

        Ok(BulkReport {
            items: operations.len(),
            errors: operations
                .iter()
                .any(|op| self.failing_indices.contains(&op.index)),
        })
    }
}

/// A search response with the given total and hits.
pub fn hits_response(total: u64, hits: Vec<Value>) -> Value {
    json!({
        "hits": {
            "total": { "value": total, "relation": "eq" },
            "hits": hits
        }
    })
}

/// A hit carrying only projected fields.
pub fn hit(fields: Value) -> Value {
    json!({ "fields": fields })
}

/// A hit with projected fields and a sort key.
pub fn sorted_hit(fields: Value, sort: Value) -> Value {
    json!({ "fields": fields, "sort": sort })
}
