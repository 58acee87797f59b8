use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::app::{Result, SkimmerError};
use crate::domain::{Field, ProductRecord};
use crate::extractor::price::{join_split_price, parse_price};
use crate::extractor::{FieldLocatorSet, ProductPage};

/// Wait budgets for one page. `page_ready` bounds the first (title) probe and
/// is longer than the per-field budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budgets {
    pub page_ready: Duration,
    pub field: Duration,
    pub price_probe: Duration,
}

impl Default for Budgets {
    fn default() -> Self {
        Self {
            page_ready: Duration::from_millis(5000),
            field: Duration::from_millis(2000),
            price_probe: Duration::from_millis(1000),
        }
    }
}

/// Runs the field protocol for one page.
pub struct PageExtractor<'a> {
    locators: &'a FieldLocatorSet,
    budgets: Budgets,
}

impl<'a> PageExtractor<'a> {
    pub fn new(locators: &'a FieldLocatorSet, budgets: Budgets) -> Self {
        Self { locators, budgets }
    }

    /// Extract a product record from `page`, tagged with the request key.
    pub async fn extract<P: ProductPage>(&self, page: &P, url: &str, locale: &str) -> Result<ProductRecord> {
        let title = page
            .probe_text(Field::Title, &self.locators.title, self.budgets.page_ready)
            .await?
            .ok_or(SkimmerError::ElementNotFound(Field::Title))?;
        let full_name = clean_title(&title);

        let price_text = self.price_text(page).await?;
        let price = parse_price(&price_text)?;

        let src = page
            .probe_attribute(Field::Image, &self.locators.image, "src", self.budgets.field)
            .await?
            .filter(|src| !src.trim().is_empty())
            .ok_or(SkimmerError::ElementNotFound(Field::Image))?;
        let image = resolve_link(page.page_url(), src.trim());

        let categories = page
            .all_texts(Field::Categories, &self.locators.categories)
            .await?
            .iter()
            .map(|text| text.trim())
            .filter(|text| !text.is_empty())
            .map(String::from)
            .collect();

        Ok(ProductRecord {
            full_name,
            price,
            image,
            categories,
            url: url.to_string(),
            locale: locale.to_string(),
        })
    }

    /// Combined price first; split whole/fraction only when it is unavailable.
    async fn price_text<P: ProductPage>(&self, page: &P) -> Result<String> {
        match page
            .probe_text(Field::Price, &self.locators.price, self.budgets.price_probe)
            .await
        {
            Ok(Some(text)) if !text.trim().is_empty() => return Ok(text.trim().to_string()),
            Ok(_) => debug!("Combined price absent on {}, trying split price", page.page_url()),
            Err(e) => debug!("Combined price probe failed on {}: {}", page.page_url(), e),
        }

        let whole = self.split_part(page, Field::PriceWhole).await?;
        let fraction = self.split_part(page, Field::PriceFraction).await?;
        Ok(join_split_price(&whole, &fraction))
    }

    async fn split_part<P: ProductPage>(&self, page: &P, field: Field) -> Result<String> {
        page.probe_text(field, self.locators.locator(field), self.budgets.field)
            .await?
            .filter(|text| !text.trim().is_empty())
            .ok_or(SkimmerError::ElementNotFound(Field::Price))
    }
}

fn clean_title(raw: &str) -> String {
    raw.replace(['\n', '\r'], "").trim().to_string()
}

/// Resolve a possibly relative link against the page address.
fn resolve_link(page_url: &str, link: &str) -> String {
    if Url::parse(link).is_ok() {
        return link.to_string();
    }
    Url::parse(page_url)
        .and_then(|base| base.join(link))
        .map(|resolved| resolved.to_string())
        .unwrap_or_else(|_| link.to_string())
}
