//! Fan-out/fan-in aggregation over a [`Catalog`].
//!
//! One call fetches a page of references, then fetches every referenced
//! detail concurrently (bounded by [`AggregatorOptions::concurrency`]) and
//! projects the successful ones into summaries. Output order always follows
//! the order of the list response, regardless of which detail finished
//! first. Detail failures are dropped; only the list request, the deadline
//! or cancellation can fail the call.

use crate::error::{AggregateError, DetailFetchError};
use crate::models::{DetailDocument, ListReference, PageRequest, Summary};
use crate::upstream::Catalog;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Tuning for an [`Aggregator`].
#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    /// Maximum number of detail requests in flight at once.
    pub concurrency: usize,
    /// Upper bound on a whole call. `None` waits for the slowest detail.
    pub deadline: Option<Duration>,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            concurrency: 16,
            deadline: Some(Duration::from_secs(60)),
        }
    }
}

/// Aggregates pages of a catalog into summaries.
pub struct Aggregator<C> {
    catalog: C,
    options: AggregatorOptions,
}

impl<C: Catalog> Aggregator<C> {
    pub fn new(catalog: C, options: AggregatorOptions) -> Self {
        Self { catalog, options }
    }

    /// Aggregate one page, honoring the configured deadline.
    pub async fn aggregate(&self, request: PageRequest) -> Result<Vec<Summary>, AggregateError> {
        self.aggregate_until(request, std::future::pending()).await
    }

    /// Aggregate one page, aborting if `cancel` resolves first.
    ///
    /// Dropping the in-flight work aborts every outstanding detail request.
    pub async fn aggregate_until<F>(
        &self,
        request: PageRequest,
        cancel: F,
    ) -> Result<Vec<Summary>, AggregateError>
    where
        F: Future<Output = ()>,
    {
        let bounded = async {
            match self.options.deadline {
                Some(deadline) => tokio::time::timeout(deadline, self.run(request))
                    .await
                    .unwrap_or_else(|_| Err(AggregateError::DeadlineExceeded(deadline))),
                None => self.run(request).await,
            }
        };

        tokio::select! {
            result = bounded => {
                if let Err(AggregateError::DeadlineExceeded(deadline)) = &result {
                    warn!("Aggregation of {} exceeded {:?}", request, deadline);
                }
                result
            }
            () = cancel => {
                warn!("Aggregation of {} cancelled", request);
                Err(AggregateError::Cancelled)
            }
        }
    }

    async fn run(&self, request: PageRequest) -> Result<Vec<Summary>, AggregateError> {
        info!("Fetching {}", request);

        let page = self
            .catalog
            .fetch_list(request.limit, request.offset())
            .await?;

        let requested = page.results.len();
        debug!("List returned {} references", requested);

        // `buffered` yields in input order, so positions survive the fan-out.
        let outcomes: Vec<Result<DetailDocument, DetailFetchError>> =
            stream::iter(page.results.iter())
                .map(|reference| self.fetch_one(reference))
                .buffered(self.options.concurrency.max(1))
                .collect()
                .await;

        let summaries: Vec<Summary> = outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                Ok(detail) => Some(Summary::from_detail(&detail)),
                Err(e) => {
                    debug!("Skipping entry: {}", e);
                    None
                }
            })
            .collect();

        info!(
            "Aggregated {} of {} entries ({} dropped)",
            summaries.len(),
            requested,
            requested - summaries.len()
        );

        Ok(summaries)
    }

    async fn fetch_one(
        &self,
        reference: &ListReference,
    ) -> Result<DetailDocument, DetailFetchError> {
        match reference.url.as_deref() {
            Some(url) => self.catalog.fetch_detail(url).await,
            None => Err(DetailFetchError::MissingUrl),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UpstreamListError;
    use crate::models::ListPage;
    use serde_json::{json, Number, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio_test::{assert_err, assert_ok};

    /// In-memory catalog with per-entry latency and failure injection.
    #[derive(Default)]
    struct FakeCatalog {
        list_entries: Vec<Value>,
        list_status: Option<u16>,
        details: HashMap<String, (u64, Result<Value, u16>)>,
        list_queries: Mutex<Vec<(u32, u64)>>,
        detail_calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak_in_flight: Arc<AtomicUsize>,
    }

    impl FakeCatalog {
        fn with_entry(mut self, url: &str, delay_ms: u64, body: Result<Value, u16>) -> Self {
            self.list_entries.push(json!({ "url": url }));
            self.details.insert(url.to_string(), (delay_ms, body));
            self
        }

        fn with_unlinked_entry(self) -> Self {
            self.with_raw_entry(json!({ "name": "unlinked" }))
        }

        fn with_raw_entry(mut self, entry: Value) -> Self {
            self.list_entries.push(entry);
            self
        }

        fn failing_list(mut self, status: u16) -> Self {
            self.list_status = Some(status);
            self
        }
    }

    impl Catalog for FakeCatalog {
        async fn fetch_list(&self, limit: u32, offset: u64) -> Result<ListPage, UpstreamListError> {
            self.list_queries.lock().unwrap().push((limit, offset));

            if let Some(status) = self.list_status {
                return Err(UpstreamListError::Status {
                    status,
                    body: String::new(),
                });
            }

            Ok(serde_json::from_value(json!({ "results": self.list_entries })).unwrap())
        }

        async fn fetch_detail(&self, url: &str) -> Result<DetailDocument, DetailFetchError> {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

            let (delay_ms, body) = self.details.get(url).cloned().unwrap_or((0, Err(404)));
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            body.map(DetailDocument::new)
                .map_err(|status| DetailFetchError::Status {
                    url: url.to_string(),
                    status,
                })
        }
    }

    fn named(name: &str) -> Result<Value, u16> {
        Ok(json!({ "name": name }))
    }

    fn names(summaries: &[Summary]) -> Vec<&str> {
        summaries
            .iter()
            .map(|s| s.name.as_deref().unwrap_or("<none>"))
            .collect()
    }

    fn unbounded() -> AggregatorOptions {
        AggregatorOptions {
            concurrency: 50,
            deadline: None,
        }
    }

    #[tokio::test]
    async fn test_one_failed_detail_is_dropped() {
        let catalog = FakeCatalog::default()
            .with_entry(
                "a",
                0,
                Ok(json!({
                    "name": "x",
                    "types": [{"type": {"name": "grass"}}],
                    "height": 7,
                    "weight": 69
                })),
            )
            .with_entry("b", 0, Err(500));

        let aggregator = Aggregator::new(catalog, unbounded());
        let result = assert_ok!(aggregator.aggregate(PageRequest::new(1, 2)).await);

        assert_eq!(
            result,
            vec![Summary {
                name: Some("x".to_string()),
                image: None,
                types: vec!["grass".to_string()],
                height: Some(Number::from(7)),
                weight: Some(Number::from(69)),
            }]
        );
        assert_eq!(*aggregator.catalog.list_queries.lock().unwrap(), vec![(2, 0)]);
    }

    #[tokio::test]
    async fn test_order_follows_list_not_completion() {
        // Earlier entries finish last.
        let catalog = FakeCatalog::default()
            .with_entry("1", 60, named("one"))
            .with_entry("2", 40, named("two"))
            .with_entry("3", 20, named("three"))
            .with_entry("4", 0, named("four"));

        let aggregator = Aggregator::new(catalog, unbounded());
        let result = assert_ok!(aggregator.aggregate(PageRequest::new(1, 4)).await);

        assert_eq!(names(&result), vec!["one", "two", "three", "four"]);
        assert_eq!(aggregator.catalog.detail_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_failures_close_gaps_in_order() {
        let catalog = FakeCatalog::default()
            .with_entry("1", 30, named("one"))
            .with_entry("2", 0, Err(404))
            .with_entry("3", 10, named("three"))
            .with_unlinked_entry()
            .with_entry("5", 20, Err(503))
            .with_entry("6", 0, named("six"));

        let aggregator = Aggregator::new(catalog, unbounded());
        let result = assert_ok!(aggregator.aggregate(PageRequest::new(1, 6)).await);

        assert_eq!(names(&result), vec!["one", "three", "six"]);
        // The unlinked entry is never requested.
        assert_eq!(aggregator.catalog.detail_calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_malformed_references_are_dropped() {
        let catalog = FakeCatalog::default()
            .with_entry("1", 10, named("one"))
            .with_raw_entry(json!({ "url": 42 }))
            .with_raw_entry(json!("2"))
            .with_entry("3", 0, named("three"));

        let aggregator = Aggregator::new(catalog, unbounded());
        let result = assert_ok!(aggregator.aggregate(PageRequest::new(1, 4)).await);

        assert_eq!(names(&result), vec!["one", "three"]);
        assert_eq!(aggregator.catalog.detail_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_list_failure_fails_call() {
        let catalog = FakeCatalog::default()
            .with_entry("1", 0, named("one"))
            .failing_list(500);

        let aggregator = Aggregator::new(catalog, unbounded());
        let err = assert_err!(aggregator.aggregate(PageRequest::new(1, 20)).await);

        assert!(matches!(
            err,
            AggregateError::List(UpstreamListError::Status { status: 500, .. })
        ));
        assert_eq!(aggregator.catalog.detail_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_page() {
        let aggregator = Aggregator::new(FakeCatalog::default(), unbounded());
        let result = assert_ok!(aggregator.aggregate(PageRequest::new(9, 50)).await);

        assert!(result.is_empty());
        assert_eq!(*aggregator.catalog.list_queries.lock().unwrap(), vec![(50, 400)]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let peak = Arc::new(AtomicUsize::new(0));
        let mut catalog = FakeCatalog {
            peak_in_flight: peak.clone(),
            ..FakeCatalog::default()
        };
        for i in 0..12 {
            catalog = catalog.with_entry(&i.to_string(), 15, named(&i.to_string()));
        }

        let aggregator = Aggregator::new(
            catalog,
            AggregatorOptions {
                concurrency: 3,
                deadline: None,
            },
        );
        let result = assert_ok!(aggregator.aggregate(PageRequest::new(1, 12)).await);

        assert_eq!(result.len(), 12);
        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak in-flight was {peak}");
        assert!(peak > 1, "details were not fetched concurrently");
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_progresses() {
        let catalog = FakeCatalog::default()
            .with_entry("1", 0, named("one"))
            .with_entry("2", 0, named("two"));

        let aggregator = Aggregator::new(
            catalog,
            AggregatorOptions {
                concurrency: 0,
                deadline: None,
            },
        );
        let result = assert_ok!(aggregator.aggregate(PageRequest::new(1, 2)).await);
        assert_eq!(names(&result), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let catalog = FakeCatalog::default()
            .with_entry("1", 0, named("one"))
            .with_entry("2", 2_000, named("two"));

        let aggregator = Aggregator::new(
            catalog,
            AggregatorOptions {
                concurrency: 4,
                deadline: Some(Duration::from_millis(50)),
            },
        );
        let err = assert_err!(aggregator.aggregate(PageRequest::new(1, 2)).await);

        assert!(matches!(err, AggregateError::DeadlineExceeded(d) if d == Duration::from_millis(50)));
    }

    #[tokio::test]
    async fn test_cancellation_aborts_call() {
        let catalog = FakeCatalog::default().with_entry("1", 2_000, named("one"));

        let aggregator = Aggregator::new(catalog, unbounded());
        let cancel = tokio::time::sleep(Duration::from_millis(30));
        let err = assert_err!(
            aggregator
                .aggregate_until(PageRequest::new(1, 1), cancel)
                .await
        );

        assert!(matches!(err, AggregateError::Cancelled));
        // The aborted request never completed.
        assert_eq!(aggregator.catalog.in_flight.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_repeated_calls_are_identical() {
        let catalog = FakeCatalog::default()
            .with_entry("1", 25, named("one"))
            .with_entry("2", 5, Err(500))
            .with_entry("3", 0, named("three"));

        let aggregator = Aggregator::new(catalog, AggregatorOptions::default());
        let first = assert_ok!(aggregator.aggregate(PageRequest::new(2, 3)).await);
        let second = assert_ok!(aggregator.aggregate(PageRequest::new(2, 3)).await);

        assert_eq!(first, second);
        assert_eq!(
            *aggregator.catalog.list_queries.lock().unwrap(),
            vec![(3, 3), (3, 3)]
        );
    }
}
