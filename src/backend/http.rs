use futures::FutureExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::app::{Result, SkimmerError};
use crate::config::{BudgetConfig, HttpConfig};
use crate::domain::{PageOutcome, ProductRecord};
use crate::extractor::{Budgets, FieldLocatorSet, PageExtractor, StaticDocument};

/// Plain HTTP fetch followed by extraction from the parsed document.
///
/// Scripts never run, so content rendered client-side is invisible here.
pub struct StaticBackend {
    client: Client,
    budgets: Budgets,
}

impl StaticBackend {
    pub fn new(config: &HttpConfig, budgets: BudgetConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .redirect(Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            client,
            budgets: budgets.wait_budgets(),
        })
    }

    pub async fn fetch_and_extract(
        &self,
        url: &str,
        locale: &str,
        identity: &str,
        locators: &FieldLocatorSet,
    ) -> PageOutcome {
        let result = match self.fetch(url, locale, identity).await {
            Ok((final_url, body)) => {
                extract_document(&body, &final_url, url, locale, locators, self.budgets)
            }
            Err(e) => Err(e),
        };
        PageOutcome::from_result(url, locale, result)
    }

    /// GET `url` as `identity`, returning the address that served the body and the body.
    async fn fetch(&self, url: &str, locale: &str, identity: &str) -> Result<(String, String)> {
        Url::parse(url)?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value("user-agent", identity)?);
        headers.insert(ACCEPT_LANGUAGE, header_value("locale", locale)?);

        let response = self.client.get(url).headers(headers).send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!("{} [{}] answered {}, parsing body anyway", url, locale, status);
        }

        let final_url = response.url().to_string();
        let body = response.text().await?;
        Ok((final_url, body))
    }
}

fn header_value(what: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| SkimmerError::Config(format!("{} {:?} is not a valid header value", what, value)))
}

/// Parse and extract synchronously; the parsed document never crosses an await.
fn extract_document(
    body: &str,
    final_url: &str,
    url: &str,
    locale: &str,
    locators: &FieldLocatorSet,
    budgets: Budgets,
) -> Result<ProductRecord> {
    let document = StaticDocument::parse(body, final_url);
    PageExtractor::new(locators, budgets)
        .extract(&document, url, locale)
        .now_or_never()
        .unwrap_or_else(|| Err(SkimmerError::Other("static extraction did not complete".to_string())))
}
