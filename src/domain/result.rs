use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{ExtractionFailure, PageOutcome, ProductRecord};

/// Aggregated crawl output: url -> locale -> outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CrawlResult {
    entries: BTreeMap<String, BTreeMap<String, PageOutcome>>,
}

impl CrawlResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for one pair, replacing any earlier entry for it.
    pub fn insert(&mut self, url: String, locale: String, outcome: PageOutcome) {
        self.entries.entry(url).or_default().insert(locale, outcome);
    }

    /// Make sure `url` has an entry, even if no locale was crawled for it.
    pub fn ensure_url(&mut self, url: &str) {
        if !self.entries.contains_key(url) {
            self.entries.insert(url.to_string(), BTreeMap::new());
        }
    }

    pub fn get(&self, url: &str, locale: &str) -> Option<&PageOutcome> {
        self.entries.get(url)?.get(locale)
    }

    pub fn locales_for(&self, url: &str) -> Option<&BTreeMap<String, PageOutcome>> {
        self.entries.get(url)
    }

    /// Number of distinct urls.
    pub fn url_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of (url, locale) entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// True when no url is recorded at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry as (url, locale, outcome).
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &PageOutcome)> {
        self.entries.iter().flat_map(|(url, locales)| {
            locales
                .iter()
                .map(move |(locale, outcome)| (url.as_str(), locale.as_str(), outcome))
        })
    }

    pub fn products(&self) -> impl Iterator<Item = &ProductRecord> {
        self.iter().filter_map(|(_, _, outcome)| outcome.product())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ExtractionFailure> {
        self.iter().filter_map(|(_, _, outcome)| outcome.failure())
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}
