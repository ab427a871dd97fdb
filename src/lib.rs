// Re-export modules
pub mod browser;
pub mod collector;
pub mod config;
pub mod error;
pub mod extractor;
pub mod locators;
pub mod navigator;
pub mod pipeline;
pub mod repository;
pub mod results;
pub mod snapshot;

// Re-export commonly used types for convenience
pub use config::{HarvestConfig, ListingMode};
pub use error::{Error, Result};
pub use repository::Repository;
pub use results::{ListingRecord, NOT_AVAILABLE, RunSummary, StoredListing};

use browser::WebDriverFactory;
use std::path::Path;

/// Main builder for a harvest run against a WebDriver server
pub struct Harvest {
    config: HarvestConfig,
}

impl Default for Harvest {
    fn default() -> Self {
        Self::new(HarvestConfig::default())
    }
}

impl Harvest {
    pub fn new(config: HarvestConfig) -> Self {
        Self { config }
    }

    /// Load configuration from a JSON file
    pub fn with_config_file(self, path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(HarvestConfig::from_file(path)?))
    }

    /// Apply configuration from a JSON string
    pub fn with_config_str(self, json: &str) -> Result<Self> {
        Ok(Self::new(HarvestConfig::from_json(json)?))
    }

    /// Override the number of extraction sessions
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.workers = workers.max(1);
        self
    }

    /// Set the total timeout (maximum runtime)
    pub fn with_total_timeout(mut self, timeout_seconds: u64) -> Self {
        self.config.total_timeout_secs = Some(timeout_seconds);
        self
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut HarvestConfig {
        &mut self.config
    }

    fn open(&self) -> Result<(WebDriverFactory, Repository)> {
        let factory = WebDriverFactory::new(&self.config.webdriver_url, self.config.headless);
        let repository = Repository::with_mode(&self.config.database, self.config.listing_mode)?;
        Ok((factory, repository))
    }

    /// Navigate, collect, extract and persist
    pub async fn run(&self) -> Result<RunSummary> {
        ::log::info!("Starting harvest from {}", self.config.base_url);
        let (factory, repository) = self.open()?;
        pipeline::run(&factory, &self.config, &repository).await
    }

    /// Extract and persist the links already in the links snapshot
    pub async fn run_from_snapshot(&self) -> Result<RunSummary> {
        let (factory, repository) = self.open()?;
        pipeline::harvest_from_snapshot(&factory, &self.config, &repository).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides() {
        let harvest = Harvest::default()
            .with_config_str(r#"{ "province": "Sindh", "workers": 4 }"#)
            .unwrap()
            .with_workers(0)
            .with_total_timeout(600);

        assert_eq!(harvest.config().province, "Sindh");
        assert_eq!(harvest.config().workers, 1);
        assert_eq!(harvest.config().total_timeout_secs, Some(600));
    }

    #[test]
    fn test_bad_config_str() {
        let result = Harvest::default().with_config_str("{ not json");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
