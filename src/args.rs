use clap::{Args as ClapArgs, Parser, Subcommand};
use olx_harvest::{HarvestConfig, ListingMode};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "olx-harvest")]
#[command(about = "Harvests mobile phone listings from OLX into SQLite")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Navigate, collect links, then harvest every listing (default)
    Run,
    /// Harvest the listings in the links snapshot without navigating
    Extract,
    /// Print stored links
    Links,
    /// Print stored listings
    Listings,
}

/// Settings that take precedence over the config file and environment
#[derive(ClapArgs, Debug, Default)]
pub struct Overrides {
    /// JSON config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    #[arg(long, global = true)]
    pub webdriver_url: Option<String>,

    /// Run the browser without a window
    #[arg(long, global = true)]
    pub headless: bool,

    /// Browser sessions extracting listings in parallel
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Total timeout in seconds (maximum runtime)
    #[arg(long, global = true)]
    pub total_timeout: Option<u64>,

    #[arg(long, global = true)]
    pub province: Option<String>,

    #[arg(long, global = true)]
    pub city: Option<String>,

    #[arg(long, global = true)]
    pub min_price: Option<u64>,

    #[arg(long, global = true)]
    pub max_price: Option<u64>,

    #[arg(long, global = true)]
    pub links_snapshot: Option<PathBuf>,

    #[arg(long, global = true)]
    pub output_snapshot: Option<PathBuf>,

    /// Update listings already stored for a link instead of appending
    #[arg(long, global = true)]
    pub upsert: bool,
}

impl Overrides {
    pub fn apply(self, config: &mut HarvestConfig) {
        if let Some(v) = self.database {
            config.database = v;
        }
        if let Some(v) = self.webdriver_url {
            config.webdriver_url = v;
        }
        if self.headless {
            config.headless = true;
        }
        if let Some(v) = self.workers {
            config.workers = v.max(1);
        }
        if let Some(v) = self.total_timeout {
            config.total_timeout_secs = Some(v);
        }
        if let Some(v) = self.province {
            config.province = v;
        }
        if let Some(v) = self.city {
            config.city = v;
        }
        if let Some(v) = self.min_price {
            config.min_price = v;
        }
        if let Some(v) = self.max_price {
            config.max_price = v;
        }
        if let Some(v) = self.links_snapshot {
            config.links_snapshot = v;
        }
        if let Some(v) = self.output_snapshot {
            config.output_snapshot = v;
        }
        if self.upsert {
            config.listing_mode = ListingMode::UpsertByLink;
        }
    }
}
