use crate::error::Result;
use crate::locators::LocatorMap;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// How harvested listings are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingMode {
    /// Every processed link adds a new row, re-runs included
    #[default]
    Append,
    /// Rows already holding the same link are updated in place
    UpsertByLink,
}

/// Configuration for a harvest run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Site entry page
    pub base_url: String,

    /// URL for the WebDriver instance
    pub webdriver_url: String,

    /// Ask the browser to run without a window
    pub headless: bool,

    pub province: String,
    pub city: String,
    pub min_price: u64,
    pub max_price: u64,

    /// Flat file of collected links
    pub links_snapshot: PathBuf,

    /// Flat file of harvested records
    pub output_snapshot: PathBuf,

    /// SQLite database file
    pub database: PathBuf,

    /// Number of scroll + "Load more" rounds during pagination
    pub load_more_cap: usize,

    /// Wait for structural elements (category, filters, listing container)
    pub element_timeout_secs: u64,

    /// Wait for the "Load more" control on each round
    pub load_more_timeout_secs: u64,

    /// Wait for each detail page field
    pub field_timeout_millis: u64,

    /// Browser sessions extracting detail pages in parallel
    pub workers: usize,

    pub listing_mode: ListingMode,

    /// Maximum runtime for the whole run
    pub total_timeout_secs: Option<u64>,

    pub locators: LocatorMap,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.olx.com.pk/".to_string(),
            webdriver_url: default_webdriver_url(),
            headless: false,
            province: "Punjab".to_string(),
            city: "Lahore".to_string(),
            min_price: 10000,
            max_price: 50000,
            links_snapshot: PathBuf::from("extracted_links.csv"),
            output_snapshot: PathBuf::from("scrapped_data.csv"),
            database: PathBuf::from("olx_db"),
            load_more_cap: 2,
            element_timeout_secs: 10,
            load_more_timeout_secs: 10,
            field_timeout_millis: 2000,
            workers: 1,
            listing_mode: ListingMode::Append,
            total_timeout_secs: None,
            locators: LocatorMap::default(),
        }
    }
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

impl HarvestConfig {
    /// Load configuration from a JSON file; absent keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_vars(|name| std::env::var(name).ok());
    }

    /// Apply overrides from `lookup`, skipping empty values
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(v) = var("WEBDRIVER_URL") {
            self.webdriver_url = v;
        }
        if let Some(v) = var("province") {
            self.province = v;
        }
        if let Some(v) = var("city") {
            self.city = v;
        }
        if let Some(v) = var("min_price_value") {
            set_parsed(&mut self.min_price, "min_price_value", &v);
        }
        if let Some(v) = var("max_price_value") {
            set_parsed(&mut self.max_price, "max_price_value", &v);
        }
        if let Some(v) = var("input_csv") {
            self.links_snapshot = PathBuf::from(v);
        }
        if let Some(v) = var("output_csv") {
            self.output_snapshot = PathBuf::from(v);
        }
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }

    pub fn load_more_timeout(&self) -> Duration {
        Duration::from_secs(self.load_more_timeout_secs)
    }

    pub fn field_timeout(&self) -> Duration {
        Duration::from_millis(self.field_timeout_millis)
    }

    pub fn total_timeout(&self) -> Option<Duration> {
        self.total_timeout_secs.map(Duration::from_secs)
    }
}

fn set_parsed<T: FromStr>(slot: &mut T, name: &str, value: &str) {
    match value.trim().parse() {
        Ok(parsed) => *slot = parsed,
        Err(_) => ::log::warn!("Ignoring {}={:?}: not a number", name, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = HarvestConfig::default();
        assert_eq!(config.province, "Punjab");
        assert_eq!(config.city, "Lahore");
        assert_eq!(config.min_price, 10000);
        assert_eq!(config.max_price, 50000);
        assert_eq!(config.load_more_cap, 2);
        assert_eq!(config.listing_mode, ListingMode::Append);
        assert_eq!(config.total_timeout(), None);
        assert_eq!(config.links_snapshot, PathBuf::from("extracted_links.csv"));
        assert_eq!(config.output_snapshot, PathBuf::from("scrapped_data.csv"));
    }

    #[test]
    fn test_partial_json() {
        let config =
            HarvestConfig::from_json(r#"{ "city": "Rawalpindi", "listing_mode": "upsert_by_link" }"#)
                .unwrap();
        assert_eq!(config.city, "Rawalpindi");
        assert_eq!(config.province, "Punjab");
        assert_eq!(config.listing_mode, ListingMode::UpsertByLink);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("province", "Sindh"),
            ("city", "Karachi"),
            ("min_price_value", "5000"),
            ("max_price_value", "lots"),
            ("output_csv", "out.csv"),
            ("input_csv", ""),
        ]
        .into_iter()
        .collect();

        let mut config = HarvestConfig::default();
        config.apply_vars(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.province, "Sindh");
        assert_eq!(config.city, "Karachi");
        assert_eq!(config.min_price, 5000);
        // Unparsable values and empty values leave the default in place
        assert_eq!(config.max_price, 50000);
        assert_eq!(config.links_snapshot, PathBuf::from("extracted_links.csv"));
        assert_eq!(config.output_snapshot, PathBuf::from("out.csv"));
    }
}
