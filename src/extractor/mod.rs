//! Per-page product extraction.
//!
//! The extraction protocol runs against any [`ProductPage`]: a live browser
//! tab, where each probe polls until its budget runs out, or a parsed static
//! document, where each probe answers immediately.
//!
//! ```text
//! title → price (combined | whole + fraction) → image → categories
//! ```

mod document;
mod locators;
mod price;
mod protocol;

pub use document::StaticDocument;
pub use locators::FieldLocatorSet;
pub use price::parse_price;
pub use protocol::{Budgets, PageExtractor};

use std::time::Duration;

use crate::app::Result;
use crate::domain::Field;

/// Read-only queries the extraction protocol needs from a page.
///
/// Probes return `Ok(None)` when the locator matches nothing within the
/// budget; errors are reserved for failures of the page itself.
#[allow(async_fn_in_trait)]
pub trait ProductPage {
    /// Address the page content was loaded from, used to resolve relative links.
    fn page_url(&self) -> &str;

    /// Text of the first node matching `locator`.
    async fn probe_text(&self, field: Field, locator: &str, budget: Duration) -> Result<Option<String>>;

    /// Attribute value of the first node matching `locator`.
    async fn probe_attribute(
        &self,
        field: Field,
        locator: &str,
        attribute: &str,
        budget: Duration,
    ) -> Result<Option<String>>;

    /// Text of every node matching `locator`, in document order. Does not wait.
    async fn all_texts(&self, field: Field, locator: &str) -> Result<Vec<String>>;
}
