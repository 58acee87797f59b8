use crate::domain::{CrawlResult, PageOutcome};

/// Outcome of one task, tagged with the pair it was spawned for.
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub url: String,
    pub locale: String,
    pub outcome: PageOutcome,
}

impl TaskOutcome {
    pub fn new(url: impl Into<String>, locale: impl Into<String>, outcome: PageOutcome) -> Self {
        Self {
            url: url.into(),
            locale: locale.into(),
            outcome,
        }
    }
}

/// Folds task outcomes into the nested url -> locale map.
pub struct ResultAggregator;

impl ResultAggregator {
    /// Arrival order does not matter; output ordering is by key.
    pub fn collect(outcomes: impl IntoIterator<Item = TaskOutcome>) -> CrawlResult {
        Self::collect_for(&[], outcomes)
    }

    /// Like [`collect`](Self::collect), but every requested url gets a key,
    /// with an empty locale map if no task ran for it.
    pub fn collect_for(
        urls: &[String],
        outcomes: impl IntoIterator<Item = TaskOutcome>,
    ) -> CrawlResult {
        let mut result = CrawlResult::new();
        for url in urls {
            result.ensure_url(url);
        }
        for task in outcomes {
            result.insert(task.url, task.locale, task.outcome);
        }
        result
    }
}
