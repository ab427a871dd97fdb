use crate::browser::Browser;
use crate::config::HarvestConfig;
use crate::error::BrowserError;
use crate::locators::{FieldLocators, Locator};
use crate::results::{ListingRecord, NOT_AVAILABLE};
use std::time::Duration;

/// Reads the text of the element at `locator` on the current page
pub async fn extract_field<B: Browser>(
    browser: &B,
    locator: &Locator,
    timeout: Duration,
) -> Result<String, BrowserError> {
    let element = browser.find_element(locator, timeout).await?;
    browser.text(&element).await
}

/// Harvests one detail page.
///
/// Each field is read on its own; a failure only costs that field, which
/// falls back to [`NOT_AVAILABLE`]. Nothing is retried.
#[derive(Debug, Clone)]
pub struct ItemExtractor {
    locators: FieldLocators,
    timeout: Duration,
}

impl ItemExtractor {
    pub fn new(config: &HarvestConfig) -> Self {
        Self {
            locators: config.locators.fields.clone(),
            timeout: config.field_timeout(),
        }
    }

    pub async fn extract<B: Browser>(&self, browser: &B, url: &str) -> ListingRecord {
        ::log::info!("Processing link: {}", url);
        if let Err(e) = browser.navigate_to(url).await {
            ::log::warn!("Couldn't open {}: {}", url, e);
            return ListingRecord::unavailable(url);
        }

        let record = ListingRecord {
            link: url.to_string(),
            name: self.field(browser, "name", &self.locators.name).await,
            price: self.field(browser, "price", &self.locators.price).await,
            location: self
                .field(browser, "location", &self.locators.location)
                .await,
            listed_at: self.field(browser, "date", &self.locators.date).await,
            description: self
                .field(browser, "description", &self.locators.description)
                .await,
        };

        ::log::info!(
            "Scraped data: Name={}, Price={}, Location={}, Date={}",
            record.name,
            record.price,
            record.location,
            record.listed_at
        );
        record
    }

    async fn field<B: Browser>(&self, browser: &B, name: &str, locator: &Locator) -> String {
        match extract_field(browser, locator, self.timeout).await {
            Ok(text) => {
                ::log::debug!("{}: {}", name, text);
                text
            }
            Err(e) => {
                ::log::debug!("{} unavailable: {}", name, e);
                NOT_AVAILABLE.to_string()
            }
        }
    }
}
