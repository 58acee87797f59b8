//! Configuration management for skimmer.
//!
//! Configuration is read from `~/.config/skimmer/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::BackendKind;
use crate::extractor::{Budgets, FieldLocatorSet};

/// Main configuration struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend used when the command line doesn't pick one
    pub backend: BackendKind,

    /// Locales crawled when the command line doesn't list any
    pub locales: Vec<String>,

    /// File with one user-agent per line; the bundled list is used when unset
    pub user_agents_file: Option<PathBuf>,

    /// Upper bound on concurrently running tasks (unbounded when unset)
    pub max_concurrency: Option<usize>,

    /// Crawl-wide deadline in seconds (none when unset)
    pub crawl_timeout_secs: Option<u64>,

    pub budgets: BudgetConfig,
    pub browser: BrowserConfig,
    pub http: HttpConfig,
    pub locators: FieldLocatorSet,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            locales: vec!["en-US".to_string(), "es-MX".to_string()],
            user_agents_file: None,
            max_concurrency: None,
            crawl_timeout_secs: None,
            budgets: BudgetConfig::default(),
            browser: BrowserConfig::default(),
            http: HttpConfig::default(),
            locators: FieldLocatorSet::default(),
        }
    }
}

/// Wait budgets, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Navigation to the product page (browser backend)
    pub navigation_ms: u64,

    /// Waiting for the title, i.e. for the page to be usable at all
    pub page_ready_ms: u64,

    /// Waiting for any other single field
    pub field_ms: u64,

    /// Probing for the combined price before falling back to the split price
    pub price_probe_ms: u64,

    /// Delay between DOM polls while waiting for a field
    pub poll_interval_ms: u64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            navigation_ms: 30_000,
            page_ready_ms: 5_000,
            field_ms: 2_000,
            price_probe_ms: 1_000,
            poll_interval_ms: 100,
        }
    }
}

impl BudgetConfig {
    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Per-page budgets for the extraction protocol.
    pub fn wait_budgets(&self) -> Budgets {
        Budgets {
            page_ready: Duration::from_millis(self.page_ready_ms),
            field: Duration::from_millis(self.field_ms),
            price_probe: Duration::from_millis(self.price_probe_ms),
        }
    }
}

/// Headless browser settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Extra command line arguments passed to Chrome
    pub args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            args: vec![
                "--no-sandbox".to_string(),
                "--disable-gpu".to_string(),
                "--disable-dev-shm-usage".to_string(),
                "--disable-software-rasterizer".to_string(),
            ],
        }
    }
}

/// HTTP client settings for the static backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// Maximum redirects followed per request (default: 10)
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_redirects: 10,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::write_default(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/skimmer/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("skimmer").join("config.toml"))
    }

    pub fn crawl_timeout(&self) -> Option<Duration> {
        self.crawl_timeout_secs.map(Duration::from_secs)
    }

    /// Write the commented default config file.
    pub fn write_default(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    pub fn default_config_content() -> String {
        r##"# skimmer configuration

# Backend used when --method is not given: "browser" or "static"
backend = "browser"

# Locales crawled when --lang is not given
locales = ["en-US", "es-MX"]

# One user-agent per line; blank lines and lines starting with '#' are ignored.
# The bundled list is used when this is not set.
# user_agents_file = "/path/to/user-agents.txt"

# Upper bound on concurrently running page tasks. Unbounded when not set.
# max_concurrency = 8

# Crawl-wide deadline in seconds. Tasks still running when it passes are
# recorded as CrawlTimeoutError. No deadline when not set.
# crawl_timeout_secs = 120

[budgets]
# Navigation to the product page (browser backend)
navigation_ms = 30000

# Waiting for the product title, i.e. for the page to be usable at all
page_ready_ms = 5000

# Waiting for any other single field
field_ms = 2000

# Probing for the combined price before trying whole + fraction
price_probe_ms = 1000

# Delay between DOM polls while waiting for a field
poll_interval_ms = 100

[browser]
# Run browser in headless mode (no visible window)
headless = true

# Extra Chrome arguments
args = [
    "--no-sandbox",
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--disable-software-rasterizer",
]

[http]
# Whole-request timeout in seconds (static backend)
timeout_secs = 30

# Maximum redirects followed per request
max_redirects = 10

[locators]
# CSS selectors for each product field
title = "span#productTitle"
price = "#corePrice_desktop span.a-price > span:first-child"
price_whole = "span.a-price-whole"
price_fraction = "span.a-price-fraction"
image = "div#imgTagWrapperId > img"
categories = "div#wayfinding-breadcrumbs_container a"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
