use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::app::{Result, SkimmerError};

/// Extraction strategy, chosen once per crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Render the page in headless Chrome and query the live DOM.
    #[default]
    #[serde(alias = "playwright")]
    Browser,
    /// Fetch raw HTML over HTTP and parse it without executing scripts.
    #[serde(alias = "lxml")]
    Static,
}

impl BackendKind {
    pub const SUPPORTED: [&'static str; 2] = ["browser", "static"];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Browser => "browser",
            BackendKind::Static => "static",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = SkimmerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "browser" | "playwright" => Ok(BackendKind::Browser),
            "static" | "lxml" => Ok(BackendKind::Static),
            _ => Err(SkimmerError::Config(format!(
                "backend '{}' not supported, expected one of {:?}",
                s,
                Self::SUPPORTED
            ))),
        }
    }
}

/// Caller input that is either a list or a single comma-joined string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputList(Vec<String>);

impl InputList {
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Split a comma-joined string into trimmed, non-empty parts.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}

impl From<&str> for InputList {
    fn from(s: &str) -> Self {
        Self(split_list(s))
    }
}

impl From<String> for InputList {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<Vec<String>> for InputList {
    fn from(items: Vec<String>) -> Self {
        Self(items)
    }
}

impl From<Vec<&str>> for InputList {
    fn from(items: Vec<&str>) -> Self {
        Self(items.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for InputList {
    fn from(items: &[&str]) -> Self {
        Self(items.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for InputList {
    fn from(items: [&str; N]) -> Self {
        Self(items.iter().map(|s| s.to_string()).collect())
    }
}

/// Immutable description of one crawl: every url is crawled in every locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    urls: Vec<String>,
    locales: Vec<String>,
    backend: BackendKind,
}

impl CrawlRequest {
    /// Build a request. Entries are trimmed; blanks and duplicates are dropped.
    pub fn new(urls: impl Into<InputList>, locales: impl Into<InputList>, backend: BackendKind) -> Self {
        Self {
            urls: dedup(urls.into().into_vec()),
            locales: dedup(locales.into().into_vec()),
            backend,
        }
    }

    /// Build a request from raw caller input, rejecting unknown backend names.
    pub fn from_lists(
        urls: impl Into<InputList>,
        locales: impl Into<InputList>,
        backend: &str,
    ) -> Result<Self> {
        let backend = backend.parse()?;
        Ok(Self::new(urls, locales, backend))
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Number of (url, locale) tasks this request fans out to.
    pub fn task_count(&self) -> usize {
        self.urls.len() * self.locales.len()
    }

    /// Every (url, locale) pair, url-major.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.urls.iter().flat_map(move |url| {
            self.locales
                .iter()
                .map(move |locale| (url.as_str(), locale.as_str()))
        })
    }
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.trim();
        if !item.is_empty() && !out.iter().any(|seen| seen == item) {
            out.push(item.to_string());
        }
    }
    out
}
