use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::app::{Result, SkimmerError};
use crate::backend::Backend;
use crate::crawler::aggregate::{ResultAggregator, TaskOutcome};
use crate::domain::{CrawlRequest, CrawlResult, ErrorKind, ExtractionFailure, PageOutcome};
use crate::extractor::FieldLocatorSet;
use crate::identity::IdentityPool;

/// Fans a crawl request out to one task per (url, locale) pair.
pub struct Crawler<B: Backend + 'static> {
    backend: Arc<B>,
    identities: Arc<IdentityPool>,
    locators: Arc<FieldLocatorSet>,
    max_concurrency: Option<usize>,
    crawl_timeout: Option<Duration>,
}

impl<B: Backend + 'static> Crawler<B> {
    pub fn new(backend: Arc<B>, identities: Arc<IdentityPool>, locators: Arc<FieldLocatorSet>) -> Self {
        Self {
            backend,
            identities,
            locators,
            max_concurrency: None,
            crawl_timeout: None,
        }
    }

    /// Cap the number of tasks talking to the backend at once. `None` is unbounded.
    pub fn with_max_concurrency(mut self, limit: Option<usize>) -> Self {
        self.max_concurrency = limit;
        self
    }

    /// Bound the whole crawl. Tasks still running at the deadline are aborted.
    pub fn with_crawl_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.crawl_timeout = timeout;
        self
    }

    /// Run every task to completion and aggregate the outcomes.
    ///
    /// Only pre-flight problems are returned as errors; anything that goes
    /// wrong inside a task is recorded as that pair's outcome.
    pub async fn run(&self, request: &CrawlRequest) -> Result<CrawlResult> {
        self.identities.ensure_non_empty()?;
        self.locators.validate()?;
        let semaphore = match self.max_concurrency {
            Some(0) => {
                return Err(SkimmerError::Config(
                    "max_concurrency must be at least 1".to_string(),
                ))
            }
            Some(limit) => Some(Arc::new(Semaphore::new(limit))),
            None => None,
        };

        let started = Instant::now();
        let deadline = self.crawl_timeout.map(|timeout| started + timeout);
        info!(
            "Crawling {} urls x {} locales ({} tasks) with {} backend",
            request.urls().len(),
            request.locales().len(),
            request.task_count(),
            request.backend()
        );

        let mut handles = Vec::with_capacity(request.task_count());
        for (url, locale) in request.pairs() {
            let identity = self.identities.pick()?;
            let handle = self.spawn_task(url, locale, identity, semaphore.clone());
            handles.push((url.to_string(), locale.to_string(), handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (url, locale, handle) in handles {
            let outcome = join_task(&url, &locale, handle, deadline).await;
            if let PageOutcome::Failed(failure) = &outcome {
                warn!("{} [{}] failed: {}: {}", url, locale, failure.kind, failure.message);
            }
            outcomes.push(TaskOutcome::new(url, locale, outcome));
        }

        let result = ResultAggregator::collect_for(request.urls(), outcomes);
        info!(
            "Crawl finished in {:.2?}: {} succeeded, {} failed",
            started.elapsed(),
            result.products().count(),
            result.failures().count()
        );
        Ok(result)
    }

    fn spawn_task(
        &self,
        url: &str,
        locale: &str,
        identity: String,
        semaphore: Option<Arc<Semaphore>>,
    ) -> JoinHandle<PageOutcome> {
        let backend = self.backend.clone();
        let locators = self.locators.clone();
        let url = url.to_string();
        let locale = locale.to_string();

        tokio::spawn(async move {
            let _permit = match semaphore {
                Some(semaphore) => match semaphore.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(e) => {
                        return PageOutcome::Failed(ExtractionFailure::new(
                            url,
                            locale,
                            ErrorKind::Internal,
                            e.to_string(),
                        ))
                    }
                },
                None => None,
            };

            let started = Instant::now();
            let outcome = backend
                .fetch_and_extract(&url, &locale, &identity, &locators)
                .await;
            debug!("{} [{}] done in {:.2?}", url, locale, started.elapsed());
            outcome
        })
    }
}

/// Wait for one task, turning a panic or a missed deadline into a failure for its pair.
async fn join_task(
    url: &str,
    locale: &str,
    mut handle: JoinHandle<PageOutcome>,
    deadline: Option<Instant>,
) -> PageOutcome {
    let joined = match deadline {
        Some(deadline) => match tokio::time::timeout_at(deadline, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                return PageOutcome::Failed(ExtractionFailure::new(
                    url,
                    locale,
                    ErrorKind::CrawlTimeout,
                    "crawl deadline passed before the task finished",
                ));
            }
        },
        None => handle.await,
    };

    joined.unwrap_or_else(|e| PageOutcome::Failed(join_failure(url, locale, e)))
}

fn join_failure(url: &str, locale: &str, error: JoinError) -> ExtractionFailure {
    if error.is_panic() {
        ExtractionFailure::new(url, locale, ErrorKind::TaskPanicked, "task panicked")
    } else {
        ExtractionFailure::new(url, locale, ErrorKind::Internal, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::{BackendKind, Field, ProductRecord};

    /// Behaviour is keyed on the url: `panic`, `slow`, `broken`, otherwise success.
    #[derive(Default)]
    struct ScriptedBackend {
        calls: AtomicUsize,
        active: AtomicUsize,
        peak: AtomicUsize,
        identities: Mutex<HashSet<String>>,
        hold: Duration,
    }

    impl ScriptedBackend {
        fn holding(hold: Duration) -> Self {
            Self {
                hold,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Backend for ScriptedBackend {
        async fn fetch_and_extract(
            &self,
            url: &str,
            locale: &str,
            identity: &str,
            _locators: &FieldLocatorSet,
        ) -> PageOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.identities.lock().unwrap().insert(identity.to_string());
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if !self.hold.is_zero() {
                tokio::time::sleep(self.hold).await;
            }
            if url.contains("slow") {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            self.active.fetch_sub(1, Ordering::SeqCst);

            if url.contains("panic") {
                panic!("scripted panic for {}", url);
            }
            if url.contains("broken") {
                return PageOutcome::Failed(ExtractionFailure::new(
                    url,
                    locale,
                    ErrorKind::ElementNotFound(Field::Price),
                    "no price",
                ));
            }
            PageOutcome::Product(ProductRecord {
                full_name: format!("{} @ {}", url, locale),
                price: 10.0,
                image: "https://img.example/w.jpg".to_string(),
                categories: vec!["Home".to_string()],
                url: url.to_string(),
                locale: locale.to_string(),
            })
        }
    }

    fn crawler(backend: ScriptedBackend) -> (Arc<ScriptedBackend>, Crawler<ScriptedBackend>) {
        let backend = Arc::new(backend);
        let identities = Arc::new(IdentityPool::new(vec![
            "agent-a".to_string(),
            "agent-b".to_string(),
        ]));
        let crawler = Crawler::new(backend.clone(), identities, Arc::new(FieldLocatorSet::default()));
        (backend, crawler)
    }

    #[tokio::test]
    async fn test_every_pair_gets_exactly_one_entry() {
        let (backend, crawler) = crawler(ScriptedBackend::default());
        let request = CrawlRequest::new(
            "https://a.example/ok,https://b.example/broken,https://c.example/ok",
            "en-US,es-MX",
            BackendKind::Static,
        );

        let result = crawler.run(&request).await.unwrap();

        assert_eq!(backend.calls.load(Ordering::SeqCst), 6);
        assert_eq!(result.url_count(), 3);
        assert_eq!(result.len(), 6);
        for (url, locale) in request.pairs() {
            assert!(result.get(url, locale).is_some(), "missing {} {}", url, locale);
        }
        assert_eq!(result.products().count(), 4);

        let failure = result
            .get("https://b.example/broken", "es-MX")
            .and_then(PageOutcome::failure)
            .unwrap();
        assert_eq!(failure.kind, ErrorKind::ElementNotFound(Field::Price));
    }

    #[tokio::test]
    async fn test_identities_come_from_the_pool() {
        let (backend, crawler) = crawler(ScriptedBackend::default());
        let request = CrawlRequest::new("https://a.example,https://b.example", "en-US,es-MX", BackendKind::Static);

        crawler.run(&request).await.unwrap();

        let seen = backend.identities.lock().unwrap();
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|id| id == "agent-a" || id == "agent-b"));
    }

    #[tokio::test]
    async fn test_panicking_task_is_isolated() {
        let (_, crawler) = crawler(ScriptedBackend::default());
        let request = CrawlRequest::new(
            "https://a.example/panic,https://b.example/ok",
            "en-US",
            BackendKind::Static,
        );

        let result = crawler.run(&request).await.unwrap();

        assert_eq!(result.len(), 2);
        let failure = result
            .get("https://a.example/panic", "en-US")
            .and_then(PageOutcome::failure)
            .unwrap();
        assert_eq!(failure.kind, ErrorKind::TaskPanicked);
        assert!(result.get("https://b.example/ok", "en-US").unwrap().is_success());
    }

    #[tokio::test]
    async fn test_concurrency_limit_is_respected() {
        let (backend, crawler) = crawler(ScriptedBackend::holding(Duration::from_millis(20)));
        let crawler = crawler.with_max_concurrency(Some(2));
        let request = CrawlRequest::new(
            "https://a.example,https://b.example,https://c.example",
            "en-US,es-MX",
            BackendKind::Static,
        );

        let result = crawler.run(&request).await.unwrap();

        assert_eq!(result.len(), 6);
        let peak = backend.peak.load(Ordering::SeqCst);
        assert!((1..=2).contains(&peak), "peak concurrency was {}", peak);
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_rejected() {
        let (backend, crawler) = crawler(ScriptedBackend::default());
        let crawler = crawler.with_max_concurrency(Some(0));
        let request = CrawlRequest::new("https://a.example", "en-US", BackendKind::Static);

        let err = crawler.run(&request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_crawl_deadline_records_timeouts() {
        let (_, crawler) = crawler(ScriptedBackend::default());
        let crawler = crawler.with_crawl_timeout(Some(Duration::from_millis(200)));
        let request = CrawlRequest::new(
            "https://a.example/slow,https://b.example/ok",
            "en-US",
            BackendKind::Static,
        );

        let result = crawler.run(&request).await.unwrap();

        assert_eq!(result.len(), 2);
        let failure = result
            .get("https://a.example/slow", "en-US")
            .and_then(PageOutcome::failure)
            .unwrap();
        assert_eq!(failure.kind, ErrorKind::CrawlTimeout);
        assert!(result.get("https://b.example/ok", "en-US").unwrap().is_success());
    }

    #[tokio::test]
    async fn test_empty_pool_fails_before_any_task() {
        let backend = Arc::new(ScriptedBackend::default());
        let crawler = Crawler::new(
            backend.clone(),
            Arc::new(IdentityPool::default()),
            Arc::new(FieldLocatorSet::default()),
        );
        let request = CrawlRequest::new("https://a.example", "en-US", BackendKind::Static);

        let err = crawler.run(&request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_locator_fails_before_any_task() {
        let backend = Arc::new(ScriptedBackend::default());
        let locators = FieldLocatorSet {
            title: "span[[".to_string(),
            ..Default::default()
        };
        let crawler = Crawler::new(
            backend.clone(),
            Arc::new(IdentityPool::bundled()),
            Arc::new(locators),
        );
        let request = CrawlRequest::new("https://a.example", "en-US", BackendKind::Static);

        assert!(crawler.run(&request).await.is_err());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_locales_still_keys_every_url() {
        let (backend, crawler) = crawler(ScriptedBackend::default());
        let request = CrawlRequest::new("https://a.example,https://b.example", "", BackendKind::Static);

        let result = crawler.run(&request).await.unwrap();

        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.url_count(), 2);
        assert_eq!(result.len(), 0);
        assert_eq!(
            result.to_json(false).unwrap(),
            r#"{"https://a.example":{},"https://b.example":{}}"#
        );
    }

    #[tokio::test]
    async fn test_empty_request_yields_empty_result() {
        let (backend, crawler) = crawler(ScriptedBackend::default());
        let request = CrawlRequest::new(Vec::<String>::new(), "en-US", BackendKind::Static);

        let result = crawler.run(&request).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }
}
