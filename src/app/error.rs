use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::{ErrorKind, Field};

#[derive(Error, Debug)]
pub enum SkimmerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Element not found: {0}")]
    ElementNotFound(Field),

    #[error("Timed out reading {field} after {budget_ms}ms")]
    FieldTimeout { field: Field, budget_ms: u128 },

    #[error("Navigation to {url} timed out after {budget_ms}ms")]
    NavigationTimeout { url: String, budget_ms: u128 },

    #[error("Could not parse price from {0:?}")]
    InvalidPrice(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl SkimmerError {
    /// Classify this error for the per-task failure record.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) | Self::ConfigFile(_) => ErrorKind::Configuration,
            Self::ElementNotFound(field) => ErrorKind::ElementNotFound(*field),
            Self::FieldTimeout { field, .. } => ErrorKind::FieldTimeout(*field),
            Self::NavigationTimeout { .. } => ErrorKind::NavigationTimeout,
            Self::InvalidPrice(_) => ErrorKind::Value,
            Self::Http(_) | Self::InvalidUrl(_) => ErrorKind::Network,
            Self::Browser(_) => ErrorKind::Browser,
            Self::Io(_) | Self::Json(_) | Self::Other(_) => ErrorKind::Internal,
        }
    }
}

impl From<chromiumoxide::error::CdpError> for SkimmerError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        Self::Browser(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SkimmerError>;
