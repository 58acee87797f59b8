use serde::Serialize;

/// A product extracted from one (url, locale) page variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub full_name: String,
    pub price: f64,
    pub image: String,
    pub categories: Vec<String>,
    #[serde(skip)]
    pub url: String,
    #[serde(skip)]
    pub locale: String,
}
