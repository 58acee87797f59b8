//! Page acquisition backends.
//!
//! A backend turns one (url, locale, identity) triple into a [`PageOutcome`].
//! Failures are captured in the outcome; a backend call never errors out.

mod chrome;
mod http;

pub use chrome::BrowserBackend;
pub use http::StaticBackend;

use async_trait::async_trait;
use tracing::info;

use crate::app::Result;
use crate::config::Config;
use crate::domain::{BackendKind, PageOutcome};
use crate::extractor::FieldLocatorSet;

#[async_trait]
pub trait Backend: Send + Sync {
    /// Load `url` as `identity` in `locale` and extract a product from it.
    async fn fetch_and_extract(
        &self,
        url: &str,
        locale: &str,
        identity: &str,
        locators: &FieldLocatorSet,
    ) -> PageOutcome;
}

/// The backend selected for a crawl.
pub enum ExtractionBackend {
    Browser(BrowserBackend),
    Static(StaticBackend),
}

impl ExtractionBackend {
    /// Set up the backend named by `kind`. The browser is launched here, once per crawl.
    pub async fn open(kind: BackendKind, config: &Config) -> Result<Self> {
        info!("Opening {} backend", kind);
        match kind {
            BackendKind::Browser => Ok(Self::Browser(
                BrowserBackend::launch(&config.browser, config.budgets.clone()).await?,
            )),
            BackendKind::Static => Ok(Self::Static(StaticBackend::new(
                &config.http,
                config.budgets.clone(),
            )?)),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Browser(_) => BackendKind::Browser,
            Self::Static(_) => BackendKind::Static,
        }
    }

    /// Release backend resources. Called after every task has finished.
    pub async fn shutdown(self) {
        match self {
            Self::Browser(browser) => browser.shutdown().await,
            Self::Static(_) => {}
        }
    }
}

#[async_trait]
impl Backend for ExtractionBackend {
    async fn fetch_and_extract(
        &self,
        url: &str,
        locale: &str,
        identity: &str,
        locators: &FieldLocatorSet,
    ) -> PageOutcome {
        match self {
            Self::Browser(browser) => browser.fetch_and_extract(url, locale, identity, locators).await,
            Self::Static(fetcher) => fetcher.fetch_and_extract(url, locale, identity, locators).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_static_backend() {
        let backend = ExtractionBackend::open(BackendKind::Static, &Config::default())
            .await
            .unwrap();
        assert_eq!(backend.kind(), BackendKind::Static);
        backend.shutdown().await;
    }
}
