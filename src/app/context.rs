use std::sync::Arc;

use tracing::{debug, warn};

use crate::app::error::Result;
use crate::backend::ExtractionBackend;
use crate::config::Config;
use crate::crawler::Crawler;
use crate::domain::{CrawlRequest, CrawlResult};
use crate::extractor::FieldLocatorSet;
use crate::identity::IdentityPool;

/// Everything a crawl needs that outlives a single request.
pub struct AppContext {
    pub config: Config,
    pub identities: Arc<IdentityPool>,
    pub locators: Arc<FieldLocatorSet>,
}

impl AppContext {
    /// Load the identity pool and check the locators named by `config`.
    pub fn new(config: Config) -> Result<Self> {
        let identities = match &config.user_agents_file {
            Some(path) => IdentityPool::load(path)?,
            None => IdentityPool::bundled(),
        };
        Self::with_identities(config, identities)
    }

    pub fn with_identities(config: Config, identities: IdentityPool) -> Result<Self> {
        config.locators.validate()?;
        let locators = Arc::new(config.locators.clone());

        Ok(Self {
            config,
            identities: Arc::new(identities),
            locators,
        })
    }

    /// Open the request's backend, crawl, and shut the backend down.
    pub async fn crawl(&self, request: &CrawlRequest) -> Result<CrawlResult> {
        self.identities.ensure_non_empty()?;

        let backend = Arc::new(ExtractionBackend::open(request.backend(), &self.config).await?);
        let crawler = Crawler::new(backend.clone(), self.identities.clone(), self.locators.clone())
            .with_max_concurrency(self.config.max_concurrency)
            .with_crawl_timeout(self.config.crawl_timeout());

        let result = crawler.run(request).await;
        drop(crawler);
        release(backend).await;
        result
    }
}

/// Shut the backend down once the last task has let go of it.
async fn release(mut backend: Arc<ExtractionBackend>) {
    // Tasks aborted at the crawl deadline drop their handle asynchronously.
    for _ in 0..16 {
        match Arc::try_unwrap(backend) {
            Ok(backend) => {
                debug!("Shutting down {} backend", backend.kind());
                backend.shutdown().await;
                return;
            }
            Err(shared) => {
                backend = shared;
                tokio::task::yield_now().await;
            }
        }
    }
    warn!("Backend still in use after the crawl; dropping it without shutdown");
}
