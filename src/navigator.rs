//! Drives the listing page into its filtered, paginated state.

use crate::browser::{Browser, keys};
use crate::config::HarvestConfig;
use crate::error::{BrowserError, Error, NavigationStep, Result};
use crate::locators::{Locator, NavigationLocators};
use std::time::Duration;

/// Outcome of the "Load more" loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Scroll + "Load more" rounds performed
    pub iterations: usize,
    /// Rounds where the control was found and clicked
    pub clicks: usize,
}

pub struct PageNavigator<'a> {
    base_url: &'a str,
    province: &'a str,
    city: &'a str,
    min_price: u64,
    max_price: u64,
    load_more_cap: usize,
    element_timeout: Duration,
    load_more_timeout: Duration,
    locators: &'a NavigationLocators,
}

impl<'a> PageNavigator<'a> {
    pub fn new(config: &'a HarvestConfig) -> Self {
        Self {
            base_url: &config.base_url,
            province: &config.province,
            city: &config.city,
            min_price: config.min_price,
            max_price: config.max_price,
            load_more_cap: config.load_more_cap,
            element_timeout: config.element_timeout(),
            load_more_timeout: config.load_more_timeout(),
            locators: &config.locators.navigation,
        }
    }

    /// Runs every step in order; the session is left on the loaded listing page
    pub async fn navigate<B: Browser>(&self, browser: &B) -> Result<Pagination> {
        self.open_category(browser).await?;
        self.select_location(browser).await?;
        self.set_price_range(browser).await?;
        self.load_more(browser).await
    }

    pub async fn open_category<B: Browser>(&self, browser: &B) -> Result<()> {
        let step = NavigationStep::Category;
        browser
            .navigate_to(self.base_url)
            .await
            .map_err(Error::navigation(step))?;
        self.click(browser, &self.locators.category, step).await?;
        ::log::info!("Opened category");
        Ok(())
    }

    /// Picks province then city. The city list is only rebuilt after a reload.
    pub async fn select_location<B: Browser>(&self, browser: &B) -> Result<()> {
        let province = self.locators.location_option(self.province);
        self.click(browser, &province, NavigationStep::Province)
            .await?;
        ::log::info!("Selected province {}", self.province);

        browser
            .refresh()
            .await
            .map_err(Error::navigation(NavigationStep::City))?;

        let city = self.locators.location_option(self.city);
        self.click(browser, &city, NavigationStep::City).await?;
        ::log::info!("Selected city {}", self.city);
        Ok(())
    }

    pub async fn set_price_range<B: Browser>(&self, browser: &B) -> Result<()> {
        self.replace_value(
            browser,
            &self.locators.min_price,
            self.min_price,
            NavigationStep::MinPrice,
        )
        .await?;
        ::log::info!("Entered min price {}", self.min_price);

        self.replace_value(
            browser,
            &self.locators.max_price,
            self.max_price,
            NavigationStep::MaxPrice,
        )
        .await?;
        ::log::info!("Entered max price {}", self.max_price);
        Ok(())
    }

    /// Scrolls and looks for "Load more" exactly `load_more_cap` times.
    ///
    /// The cap is the only exit: a missing control is logged and the next
    /// round still runs.
    pub async fn load_more<B: Browser>(&self, browser: &B) -> Result<Pagination> {
        let mut pagination = Pagination {
            iterations: 0,
            clicks: 0,
        };

        while pagination.iterations < self.load_more_cap {
            let round = pagination.iterations + 1;
            pagination.iterations = round;

            browser
                .scroll_to_bottom()
                .await
                .map_err(Error::navigation(NavigationStep::Pagination))?;
            ::log::info!("Scroll {}: scrolled to the bottom of the page", round);

            match self.click_load_more(browser).await {
                Ok(()) => {
                    pagination.clicks += 1;
                    ::log::info!("Scroll {}: clicked 'Load more'", round);
                }
                Err(e) if e.is_not_found() => {
                    ::log::info!("Scroll {}: 'Load more' not found, continuing", round);
                }
                Err(e) => {
                    ::log::warn!("Scroll {}: couldn't click 'Load more': {}", round, e);
                }
            }
        }

        ::log::info!(
            "Pagination finished after {} scrolls ({} loads)",
            pagination.iterations,
            pagination.clicks
        );
        Ok(pagination)
    }

    async fn click_load_more<B: Browser>(&self, browser: &B) -> std::result::Result<(), BrowserError> {
        let button = browser
            .find_element(&self.locators.load_more, self.load_more_timeout)
            .await?;
        browser.click(&button).await
    }

    async fn click<B: Browser>(
        &self,
        browser: &B,
        locator: &Locator,
        step: NavigationStep,
    ) -> Result<()> {
        let element = browser
            .find_element(locator, self.element_timeout)
            .await
            .map_err(Error::navigation(step))?;
        browser
            .click(&element)
            .await
            .map_err(Error::navigation(step))
    }

    /// Clears a possibly pre-filled input with select-all + delete, types `value`, then submits
    async fn replace_value<B: Browser>(
        &self,
        browser: &B,
        locator: &Locator,
        value: u64,
        step: NavigationStep,
    ) -> Result<()> {
        let input = browser
            .find_element(locator, self.element_timeout)
            .await
            .map_err(Error::navigation(step))?;

        let sequence = [
            format!("{}a", keys::CONTROL),
            keys::DELETE.to_string(),
            value.to_string(),
            keys::ENTER.to_string(),
        ];

        browser
            .click(&input)
            .await
            .map_err(Error::navigation(step))?;
        for keystrokes in &sequence {
            browser
                .send_keys(&input, keystrokes)
                .await
                .map_err(Error::navigation(step))?;
        }
        Ok(())
    }
}
