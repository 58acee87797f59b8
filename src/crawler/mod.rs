//! Crawl orchestration: fan-out, join, aggregate.

mod aggregate;
mod orchestrator;

pub use aggregate::{ResultAggregator, TaskOutcome};
pub use orchestrator::Crawler;
