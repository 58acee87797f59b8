use std::fmt;

use serde::{Serialize, Serializer};

use crate::app::SkimmerError;
use crate::domain::{Field, ProductRecord};

/// Classification of a failed (url, locale) task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    ElementNotFound(Field),
    NavigationTimeout,
    FieldTimeout(Field),
    Value,
    Network,
    Browser,
    CrawlTimeout,
    TaskPanicked,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => f.write_str("ConfigurationError"),
            ErrorKind::ElementNotFound(field) => write!(f, "ElementNotFoundError({})", field),
            ErrorKind::NavigationTimeout => f.write_str("NavigationTimeoutError"),
            ErrorKind::FieldTimeout(field) => write!(f, "FieldTimeoutError({})", field),
            ErrorKind::Value => f.write_str("ValueError"),
            ErrorKind::Network => f.write_str("NetworkError"),
            ErrorKind::Browser => f.write_str("BrowserError"),
            ErrorKind::CrawlTimeout => f.write_str("CrawlTimeoutError"),
            ErrorKind::TaskPanicked => f.write_str("TaskPanicked"),
            ErrorKind::Internal => f.write_str("InternalError"),
        }
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Terminal failure of one (url, locale) task. Never retried.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionFailure {
    #[serde(skip)]
    pub url: String,
    #[serde(skip)]
    pub locale: String,
    #[serde(rename = "error")]
    pub kind: ErrorKind,
    pub message: String,
}

impl ExtractionFailure {
    pub fn new(
        url: impl Into<String>,
        locale: impl Into<String>,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            locale: locale.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn from_error(url: &str, locale: &str, error: &SkimmerError) -> Self {
        Self::new(url, locale, error.kind(), error.to_string())
    }
}

/// Outcome of a single (url, locale) task.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PageOutcome {
    Product(ProductRecord),
    Failed(ExtractionFailure),
}

impl PageOutcome {
    /// Convert an extraction result, capturing any error as a failure tagged with its key.
    pub fn from_result(url: &str, locale: &str, result: crate::app::Result<ProductRecord>) -> Self {
        match result {
            Ok(record) => PageOutcome::Product(record),
            Err(e) => PageOutcome::Failed(ExtractionFailure::from_error(url, locale, &e)),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PageOutcome::Product(_))
    }

    pub fn product(&self) -> Option<&ProductRecord> {
        match self {
            PageOutcome::Product(record) => Some(record),
            PageOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ExtractionFailure> {
        match self {
            PageOutcome::Product(_) => None,
            PageOutcome::Failed(failure) => Some(failure),
        }
    }
}
