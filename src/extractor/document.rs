use std::time::Duration;

use scraper::{ElementRef, Html};

use crate::app::Result;
use crate::domain::Field;
use crate::extractor::locators::compile;
use crate::extractor::ProductPage;

/// A fully parsed, immutable HTML document.
///
/// Fields are either present or absent; wait budgets are ignored.
pub struct StaticDocument {
    html: Html,
    url: String,
}

impl StaticDocument {
    /// Parse `body` once. `url` is the address the body was served from.
    pub fn parse(body: &str, url: impl Into<String>) -> Self {
        Self {
            html: Html::parse_document(body),
            url: url.into(),
        }
    }

    fn first(&self, field: Field, locator: &str) -> Result<Option<ElementRef<'_>>> {
        let selector = compile(field, locator)?;
        Ok(self.html.select(&selector).next())
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

impl ProductPage for StaticDocument {
    fn page_url(&self) -> &str {
        &self.url
    }

    async fn probe_text(&self, field: Field, locator: &str, _budget: Duration) -> Result<Option<String>> {
        Ok(self.first(field, locator)?.map(element_text))
    }

    async fn probe_attribute(
        &self,
        field: Field,
        locator: &str,
        attribute: &str,
        _budget: Duration,
    ) -> Result<Option<String>> {
        Ok(self
            .first(field, locator)?
            .and_then(|element| element.value().attr(attribute))
            .map(String::from))
    }

    async fn all_texts(&self, field: Field, locator: &str) -> Result<Vec<String>> {
        let selector = compile(field, locator)?;
        Ok(self.html.select(&selector).map(element_text).collect())
    }
}
