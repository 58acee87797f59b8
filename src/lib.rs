//! # Skimmer
//!
//! A concurrent product-page crawler. Every url is crawled once per locale,
//! each task under a randomly picked client identity, and the results are
//! collected into a `url -> locale -> record` map.
//!
//! ## Architecture
//!
//! ```text
//! CrawlRequest → Crawler → Backend (browser | static) → PageExtractor → CrawlResult
//! ```
//!
//! - [`backend`]: headless Chrome via chromiumoxide, or plain HTTP via reqwest
//! - [`extractor`]: the per-page field protocol, shared by both backends
//! - [`crawler`]: one task per (url, locale), joined and aggregated
//!
//! ## Quick Start
//!
//! ```bash
//! # Crawl two pages in the default locales with headless Chrome
//! skimmer crawl --urls https://shop.example/p/1,https://shop.example/p/2
//!
//! # Plain HTTP, explicit locales
//! skimmer crawl --urls https://shop.example/p/1 -l en-US fr-FR --method static
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the identity
/// pool, the locators and the backend for each crawl.
pub mod app;

/// Page acquisition backends.
///
/// - [`Backend`](backend::Backend): Async trait for fetch-and-extract
/// - [`BrowserBackend`](backend::BrowserBackend): chromiumoxide implementation
/// - [`StaticBackend`](backend::StaticBackend): reqwest + scraper implementation
pub mod backend;

/// Command-line interface using clap.
///
/// - `crawl --urls <urls> [-l <locales>] [--method browser|static]`
/// - `init-config [--force]`
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/skimmer/config.toml`: default backend and locales,
/// wait budgets, browser and HTTP settings, and the field locators.
pub mod config;

/// Crawl orchestration.
///
/// - [`Crawler`](crawler::Crawler): Concurrent fan-out with optional semaphore
/// - [`ResultAggregator`](crawler::ResultAggregator): Folds outcomes into a [`CrawlResult`]
pub mod crawler;

/// Core domain models.
///
/// - [`CrawlRequest`](domain::CrawlRequest): urls × locales × backend
/// - [`ProductRecord`](domain::ProductRecord): One extracted product
/// - [`PageOutcome`](domain::PageOutcome): Product or failure for one pair
pub mod domain;

pub mod extractor;

pub mod identity;

pub use app::{Result, SkimmerError};
pub use domain::{CrawlRequest, CrawlResult, InputList};

use config::Config;

/// Crawl every url in every locale with the named backend, using default settings.
///
/// `urls` and `locales` may be lists or comma-joined strings. Only setup
/// problems (unknown backend, empty identity pool) are returned as errors;
/// per-page failures are recorded in the result.
pub async fn run_crawl(
    urls: impl Into<InputList>,
    locales: impl Into<InputList>,
    backend: &str,
) -> Result<CrawlResult> {
    run_crawl_with(Config::default(), urls, locales, backend).await
}

/// Like [`run_crawl`], with explicit configuration.
pub async fn run_crawl_with(
    config: Config,
    urls: impl Into<InputList>,
    locales: impl Into<InputList>,
    backend: &str,
) -> Result<CrawlResult> {
    let request = CrawlRequest::from_lists(urls, locales, backend)?;
    app::AppContext::new(config)?.crawl(&request).await
}
