use std::future::Future;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig as LaunchConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetLocaleOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::app::{Result, SkimmerError};
use crate::config::{BrowserConfig, BudgetConfig};
use crate::domain::{Field, PageOutcome, ProductRecord};
use crate::extractor::{FieldLocatorSet, PageExtractor, ProductPage};

/// Chrome-backed extraction using chromiumoxide.
///
/// One browser instance is shared by every task of a crawl; each task works
/// in its own page, which is closed when the task finishes.
pub struct BrowserBackend {
    browser: Browser,
    handler: JoinHandle<()>,
    budgets: BudgetConfig,
}

impl BrowserBackend {
    /// Launch a browser with the given configuration
    pub async fn launch(config: &BrowserConfig, budgets: BudgetConfig) -> Result<Self> {
        let mut builder = LaunchConfig::builder().request_timeout(budgets.navigation());
        for arg in &config.args {
            builder = builder.arg(arg.as_str());
        }

        if !config.headless {
            builder = builder.with_head();
        }

        let launch_config = builder
            .build()
            .map_err(|e| SkimmerError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(launch_config).await.map_err(|e| {
            SkimmerError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler event error: {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            handler,
            budgets,
        })
    }

    pub async fn fetch_and_extract(
        &self,
        url: &str,
        locale: &str,
        identity: &str,
        locators: &FieldLocatorSet,
    ) -> PageOutcome {
        let page = match self.open_page(identity, locale).await {
            Ok(page) => page,
            Err(e) => return PageOutcome::from_result(url, locale, Err(e)),
        };

        // Closes the page if this task is aborted or panics mid-extraction
        let mut guard = CloseOnDrop::new(page.clone());
        let result = self.extract_from(&page, url, locale, locators).await;
        guard.disarm();

        if let Err(e) = page.close().await {
            warn!("Failed to close page for {} [{}]: {}", url, locale, e);
        }

        PageOutcome::from_result(url, locale, result)
    }

    /// Open a blank page carrying the task's identity and locale.
    async fn open_page(&self, identity: &str, locale: &str) -> Result<Page> {
        let page = self.browser.new_page("about:blank").await?;

        let configured = async {
            let user_agent = SetUserAgentOverrideParams::builder()
                .user_agent(identity)
                .accept_language(locale)
                .build()
                .map_err(SkimmerError::Browser)?;
            page.set_user_agent(user_agent).await?;
            page.execute(SetLocaleOverrideParams {
                locale: Some(locale.to_string()),
            })
            .await?;
            Ok::<_, SkimmerError>(())
        }
        .await;

        match configured {
            Ok(()) => Ok(page),
            Err(e) => {
                if let Err(close_err) = page.close().await {
                    warn!("Failed to close page after setup error: {}", close_err);
                }
                Err(e)
            }
        }
    }

    async fn extract_from(
        &self,
        page: &Page,
        url: &str,
        locale: &str,
        locators: &FieldLocatorSet,
    ) -> Result<ProductRecord> {
        let navigation = self.budgets.navigation();
        match tokio::time::timeout(navigation, page.goto(url)).await {
            Ok(result) => {
                result?;
            }
            Err(_) => {
                return Err(SkimmerError::NavigationTimeout {
                    url: url.to_string(),
                    budget_ms: navigation.as_millis(),
                })
            }
        }

        let landed = page.url().await.ok().flatten().unwrap_or_else(|| url.to_string());
        debug!("Navigated to {} [{}]", landed, locale);

        let live = LivePage {
            page,
            url: landed,
            poll_interval: self.budgets.poll_interval(),
        };

        PageExtractor::new(locators, self.budgets.wait_budgets())
            .extract(&live, url, locale)
            .await
    }

    /// Close the browser once every task has released its page.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed waiting for browser exit: {}", e);
        }
        self.handler.abort();
    }
}

/// A live DOM that may still be rendering; every read polls within its budget.
struct LivePage<'a> {
    page: &'a Page,
    url: String,
    poll_interval: Duration,
}

impl LivePage<'_> {
    /// Poll for the first node matching `locator`. Never resolves if it doesn't appear.
    async fn wait_for(&self, locator: &str) -> Element {
        loop {
            if let Ok(element) = self.page.find_element(locator).await {
                return element;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Run one DOM read, failing with a field timeout if it hangs.
    async fn bounded<T, F>(&self, field: Field, budget: Duration, read: F) -> Result<T>
    where
        F: Future<Output = std::result::Result<T, CdpError>>,
    {
        match tokio::time::timeout(budget, read).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(SkimmerError::FieldTimeout {
                field,
                budget_ms: budget.as_millis(),
            }),
        }
    }
}

impl ProductPage for LivePage<'_> {
    fn page_url(&self) -> &str {
        &self.url
    }

    async fn probe_text(&self, field: Field, locator: &str, budget: Duration) -> Result<Option<String>> {
        let text = probe_within(field, budget, self.wait_for(locator), |element: Element| async move {
            element.inner_text().await
        })
        .await?;
        Ok(text.map(Option::unwrap_or_default))
    }

    async fn probe_attribute(
        &self,
        field: Field,
        locator: &str,
        attribute: &str,
        budget: Duration,
    ) -> Result<Option<String>> {
        let value = probe_within(field, budget, self.wait_for(locator), |element: Element| async move {
            element.attribute(attribute).await
        })
        .await?;
        Ok(value.flatten())
    }

    async fn all_texts(&self, field: Field, locator: &str) -> Result<Vec<String>> {
        let budget = self.poll_interval.max(Duration::from_secs(1));
        let elements = self.bounded(field, budget, self.page.find_elements(locator)).await?;

        let mut texts = Vec::with_capacity(elements.len());
        for element in elements {
            if let Some(text) = self.bounded(field, budget, element.inner_text()).await? {
                texts.push(text);
            }
        }
        Ok(texts)
    }
}

/// Wait for a node, then read from it, both within one `budget`.
///
/// `Ok(None)` if the node never appeared; a field timeout if the read itself
/// ran past what was left of the budget.
async fn probe_within<E, T, W, R, F>(field: Field, budget: Duration, wait: W, read: R) -> Result<Option<T>>
where
    W: Future<Output = E>,
    R: FnOnce(E) -> F,
    F: Future<Output = std::result::Result<T, CdpError>>,
{
    let deadline = Instant::now() + budget;
    let Ok(element) = tokio::time::timeout_at(deadline, wait).await else {
        return Ok(None);
    };
    match tokio::time::timeout_at(deadline, read(element)).await {
        Ok(value) => Ok(Some(value?)),
        Err(_) => Err(SkimmerError::FieldTimeout {
            field,
            budget_ms: budget.as_millis(),
        }),
    }
}

/// Something that can be closed in the background.
trait CloseInBackground: Send + 'static {
    fn close_detached(self) -> BoxFuture<'static, ()>;
}

impl CloseInBackground for Page {
    fn close_detached(self) -> BoxFuture<'static, ()> {
        async move {
            if let Err(e) = self.close().await {
                debug!("Failed to close abandoned page: {}", e);
            }
        }
        .boxed()
    }
}

/// Closes the held page on drop unless disarmed first.
struct CloseOnDrop<P: CloseInBackground> {
    page: Option<P>,
}

impl<P: CloseInBackground> CloseOnDrop<P> {
    fn new(page: P) -> Self {
        Self { page: Some(page) }
    }

    fn disarm(&mut self) {
        self.page = None;
    }
}

impl<P: CloseInBackground> Drop for CloseOnDrop<P> {
    fn drop(&mut self) {
        let Some(page) = self.page.take() else {
            return;
        };
        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(page.close_detached());
            }
            Err(_) => warn!("No runtime to close an abandoned page"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::domain::ErrorKind;

    #[derive(Clone, Default)]
    struct FakePage {
        closed: Arc<AtomicBool>,
    }

    impl CloseInBackground for FakePage {
        fn close_detached(self) -> BoxFuture<'static, ()> {
            async move { self.closed.store(true, Ordering::SeqCst) }.boxed()
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_aborted_task_closes_its_page() {
        let page = FakePage::default();
        let held = page.clone();

        let (started_tx, started_rx) = tokio::sync::oneshot::channel();
        let task = tokio::spawn(async move {
            let _guard = CloseOnDrop::new(held);
            let _ = started_tx.send(());
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        started_rx.await.unwrap();
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        settle().await;

        assert!(page.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_disarmed_guard_leaves_page_alone() {
        let page = FakePage::default();
        let mut guard = CloseOnDrop::new(page.clone());
        guard.disarm();
        drop(guard);
        settle().await;

        assert!(!page.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_probe_shares_one_budget_between_wait_and_read() {
        let budget = Duration::from_millis(100);
        let wait = tokio::time::sleep(Duration::from_millis(60));
        let read = |_| async {
            tokio::time::sleep(Duration::from_millis(60)).await;
            Ok::<_, CdpError>("late")
        };

        let err = probe_within(Field::Title, budget, wait, read).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FieldTimeout(Field::Title));
    }

    #[tokio::test]
    async fn test_probe_absent_node_is_none() {
        let wait = futures::future::pending::<()>();
        let read = |_| async { Ok::<_, CdpError>("never") };

        let found = probe_within(Field::Image, Duration::from_millis(20), wait, read)
            .await
            .unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_probe_found_within_budget() {
        let wait = async { 7 };
        let read = |n: i32| async move { Ok::<_, CdpError>(n * 6) };

        let found = probe_within(Field::Price, Duration::from_secs(1), wait, read)
            .await
            .unwrap();
        assert_eq!(found, Some(42));
    }
}
