use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::app::{Result, SkimmerError};
use crate::domain::Field;

/// CSS selectors for each logical product field on one target site.
///
/// Defaults target the retail product page layout this tool was built for;
/// override them in the `[locators]` config section for other layouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldLocatorSet {
    /// Product title
    pub title: String,

    /// Combined price text, e.g. `$19.99`
    pub price: String,

    /// Whole-amount part of a split price
    pub price_whole: String,

    /// Fraction part of a split price
    pub price_fraction: String,

    /// Primary product image, read through its `src` attribute
    pub image: String,

    /// Breadcrumb links, in document order
    pub categories: String,
}

impl Default for FieldLocatorSet {
    fn default() -> Self {
        Self {
            title: "span#productTitle".to_string(),
            price: "#corePrice_desktop span.a-price > span:first-child".to_string(),
            price_whole: "span.a-price-whole".to_string(),
            price_fraction: "span.a-price-fraction".to_string(),
            image: "div#imgTagWrapperId > img".to_string(),
            categories: "div#wayfinding-breadcrumbs_container a".to_string(),
        }
    }
}

impl FieldLocatorSet {
    pub fn locator(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Price => &self.price,
            Field::PriceWhole => &self.price_whole,
            Field::PriceFraction => &self.price_fraction,
            Field::Image => &self.image,
            Field::Categories => &self.categories,
        }
    }

    /// Check that every locator is a valid CSS selector.
    pub fn validate(&self) -> Result<()> {
        for field in Field::ALL {
            compile(field, self.locator(field))?;
        }
        Ok(())
    }
}

/// Compile a locator, naming the field it belongs to on failure.
pub(crate) fn compile(field: Field, locator: &str) -> Result<Selector> {
    Selector::parse(locator).map_err(|e| {
        SkimmerError::Config(format!(
            "invalid {} locator {:?}: {}",
            field, locator, e
        ))
    })
}
