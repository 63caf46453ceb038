//! Paginated scanner.
//!
//! Pages through every document matching a query with `search_after`. The
//! scan stays in `Scanning` while the store reports more matches than have
//! been retrieved and the last page was non-empty; anything else moves it to
//! `Done`. Every page retrieves at least one new hit, so a scan issues at most
//! `ceil(total / page_size)` requests when pages are full, and never loops
//! forever even if the reported total is inexact.

mod dedup;

pub use dedup::dedup_latest;

use tracing::{debug, error, info};

use asset_inventory_repository::{Hit, SearchRequest, SortCursor, TelemetryReader};

use crate::errors::PipelineError;

/// Default number of hits per page.
pub const DEFAULT_SCAN_PAGE_SIZE: u64 = 1000;

/// Configuration for the paginated scanner.
#[derive(Debug, Clone, Copy)]
pub struct ScanConfig {
    /// Hits requested per page.
    pub page_size: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_SCAN_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ScanState {
    Scanning { cursor: Option<SortCursor> },
    Done,
}

/// Everything a finished scan accumulated.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome<T> {
    /// Records extracted from every page, in retrieval order.
    pub records: Vec<T>,
    /// Number of requests issued.
    pub pages: usize,
    /// Number of hits retrieved, including hits the extractor dropped.
    pub retrieved: u64,
    /// Sort key of the last hit retrieved.
    pub last_cursor: Option<SortCursor>,
}

impl<T> Default for ScanOutcome<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            pages: 0,
            retrieved: 0,
            last_cursor: None,
        }
    }
}

/// Cursor-driven exhaustive scan over a query template.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaginatedScanner {
    config: ScanConfig,
}

impl PaginatedScanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn page_size(&self) -> u64 {
        self.config.page_size
    }

    /// Scan every document matching `template`, extracting one record per hit.
    ///
    /// The template must sort ascending on a stable key and should request
    /// exact totals. Hits for which `extract` returns `None` are counted as
    /// retrieved but produce no record.
    ///
    /// A failed page aborts the scan: the query body and the partial scan
    /// state are logged and the error is returned.
    pub async fn scan<T, F>(
        &self,
        reader: &dyn TelemetryReader,
        template: &SearchRequest,
        mut extract: F,
    ) -> Result<ScanOutcome<T>, PipelineError>
    where
        T: Send,
        F: FnMut(&Hit) -> Option<T> + Send,
    {
        let mut outcome = ScanOutcome::default();
        let mut state = ScanState::Scanning { cursor: None };

        while let ScanState::Scanning { cursor } = std::mem::replace(&mut state, ScanState::Done)
        {
            let request = match &cursor {
                Some(cursor) => template.with_search_after(cursor),
                None => template.clone(),
            };

            debug!(
                page = outcome.pages + 1,
                search_after = ?cursor,
                "Requesting scan page"
            );

            let response = match reader.search(&request).await {
                Ok(response) => response,
                Err(e) => {
                    error!(
                        error = %e,
                        query = %request.body_json(),
                        pages = outcome.pages,
                        retrieved = outcome.retrieved,
                        last_cursor = ?outcome.last_cursor,
                        "Paginated scan failed"
                    );
                    return Err(PipelineError::scan(outcome.pages, outcome.retrieved, e));
                }
            };

            let hits = response.hits.hits;
            let page_len = hits.len() as u64;
            outcome.pages += 1;
            outcome.retrieved += page_len;

            let last_sort = hits.last().and_then(|hit| hit.sort.clone());
            outcome
                .records
                .extend(hits.iter().filter_map(|hit| extract(hit)));

            if last_sort.is_some() {
                outcome.last_cursor = last_sort.clone();
            }

            state = match (response.hits.total.map(|t| t.value()), last_sort) {
                (Some(total), Some(next)) if page_len > 0 && total > outcome.retrieved => {
                    ScanState::Scanning { cursor: Some(next) }
                }
                _ => ScanState::Done,
            };
        }

        info!(
            pages = outcome.pages,
            retrieved = outcome.retrieved,
            records = outcome.records.len(),
            "Scan complete"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{hits_response, sorted_hit, MockReader};
    use asset_inventory_repository::SearchError;
    use serde_json::{json, Value};

    fn template() -> SearchRequest {
        SearchRequest::new(
            vec!["traces-*".to_string()],
            json!({ "size": 2, "sort": [{ "@timestamp": "asc" }] }),
        )
    }

    fn page(total: u64, ids: &[u64]) -> Value {
        hits_response(
            total,
            ids.iter()
                .map(|id| sorted_hit(json!({ "doc.id": [id] }), json!([id])))
                .collect(),
        )
    }

    fn doc_id(hit: &Hit) -> Option<u64> {
        hit.fields.as_ref()?.first("doc.id")?.as_u64()
    }

    #[tokio::test]
    async fn test_scan_visits_every_document_once() {
        let reader = MockReader::new(vec![page(5, &[1, 2]), page(5, &[3, 4]), page(5, &[5])]);
        let scanner = PaginatedScanner::new(ScanConfig { page_size: 2 });

        let outcome = scanner.scan(&reader, &template(), doc_id).await.unwrap();

        assert_eq!(outcome.records, vec![1, 2, 3, 4, 5]);
        assert_eq!(outcome.pages, 3);
        assert_eq!(outcome.retrieved, 5);
        assert_eq!(outcome.last_cursor, Some(vec![json!(5)]));
        assert_eq!(reader.request_count(), 3);
    }

    #[tokio::test]
    async fn test_scan_passes_cursor_of_last_hit() {
        let reader = MockReader::new(vec![page(3, &[10, 20]), page(3, &[30])]);
        let scanner = PaginatedScanner::new(ScanConfig { page_size: 2 });

        scanner.scan(&reader, &template(), doc_id).await.unwrap();

        assert!(reader.request(0).search_after().is_none());
        assert_eq!(reader.request(1).search_after(), Some(&[json!(20)][..]));
    }

    #[tokio::test]
    async fn test_scan_stops_at_exact_total() {
        // A fourth page would be an empty response; the scan must not ask for it.
        let reader = MockReader::new(vec![page(4, &[1, 2]), page(4, &[3, 4])]);
        let scanner = PaginatedScanner::new(ScanConfig { page_size: 2 });

        let outcome = scanner.scan(&reader, &template(), doc_id).await.unwrap();

        assert_eq!(outcome.pages, 2);
        assert_eq!(outcome.pages as u64, 4u64.div_ceil(2));
    }

    #[tokio::test]
    async fn test_scan_stops_on_empty_page_with_overstated_total() {
        let reader = MockReader::new(vec![page(10, &[1, 2]), page(10, &[])]);
        let scanner = PaginatedScanner::new(ScanConfig { page_size: 2 });

        let outcome = scanner.scan(&reader, &template(), doc_id).await.unwrap();

        assert_eq!(outcome.records, vec![1, 2]);
        assert_eq!(outcome.pages, 2);
        assert_eq!(outcome.last_cursor, Some(vec![json!(2)]));
    }

    #[tokio::test]
    async fn test_scan_with_zero_matches() {
        let reader = MockReader::new(vec![page(0, &[])]);
        let scanner = PaginatedScanner::default();

        let outcome = scanner.scan(&reader, &template(), doc_id).await.unwrap();

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.pages, 1);
        assert!(outcome.last_cursor.is_none());
    }

    #[tokio::test]
    async fn test_scan_counts_dropped_hits_as_retrieved() {
        let reader = MockReader::new(vec![page(2, &[1, 2])]);
        let scanner = PaginatedScanner::new(ScanConfig { page_size: 2 });

        let outcome = scanner
            .scan(&reader, &template(), |hit| doc_id(hit).filter(|id| *id > 1))
            .await
            .unwrap();

        assert_eq!(outcome.records, vec![2]);
        assert_eq!(outcome.retrieved, 2);
        assert_eq!(outcome.pages, 1);
    }

    #[tokio::test]
    async fn test_scan_failure_aborts_with_partial_state() {
        let reader = MockReader::new(vec![page(6, &[1, 2])]).then_fail("shard failure");
        let scanner = PaginatedScanner::new(ScanConfig { page_size: 2 });

        let err = scanner
            .scan(&reader, &template(), doc_id)
            .await
            .unwrap_err();

        match err {
            PipelineError::ScanError {
                pages,
                retrieved,
                source,
            } => {
                assert_eq!(pages, 1);
                assert_eq!(retrieved, 2);
                assert!(matches!(
                    source,
                    SearchError::QueryError { ref query, .. } if query.contains("search_after")
                ));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
