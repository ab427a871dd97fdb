use clap::Parser;
use olx_harvest::{Harvest, HarvestConfig, Repository, Result, RunSummary};
use std::process::ExitCode;

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() -> ExitCode {
    // Variables from a local .env file count as environment overrides
    let _ = dotenvy::dotenv();

    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    match execute(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ::log::error!("Harvest failed: {}", e);
            eprintln!("olx-harvest: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(args: Args) -> Result<()> {
    let mut overrides = args.overrides;
    let mut config = match overrides.config.take() {
        Some(path) => HarvestConfig::from_file(path)?,
        None => HarvestConfig::default(),
    };
    config.apply_env();
    overrides.apply(&mut config);

    let command = args.command.unwrap_or(Command::Run);
    match command {
        Command::Run | Command::Extract => {
            println!("Note: harvesting requires a WebDriver server (e.g., ChromeDriver).");
            println!(
                "Set WEBDRIVER_URL environment variable if not using the default http://localhost:4444"
            );

            let start_time = std::time::Instant::now();
            let harvest = Harvest::new(config);
            let summary = if command == Command::Run {
                harvest.run().await?
            } else {
                harvest.run_from_snapshot().await?
            };
            report(&summary, start_time.elapsed().as_secs_f64());
        }
        Command::Links => {
            let repository = Repository::with_mode(&config.database, config.listing_mode)?;
            for link in repository.links()? {
                println!("{link}");
            }
        }
        Command::Listings => {
            let repository = Repository::with_mode(&config.database, config.listing_mode)?;
            for row in repository.listings()? {
                let price = row.price.map_or_else(|| "-".to_string(), |p| p.to_string());
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}",
                    row.id, row.name, price, row.location, row.listed_at, row.link
                );
            }
        }
    }
    Ok(())
}

fn report(summary: &RunSummary, seconds: f64) {
    ::log::info!(
        "Harvest complete - {} links collected ({} new), {} listings stored in {:.2} seconds",
        summary.links_collected,
        summary.links_recorded,
        summary.listings_persisted,
        seconds
    );
    println!(
        "Collected {} links ({} new, {} 'Load more' clicks)",
        summary.links_collected, summary.links_recorded, summary.load_more_clicks
    );
    println!(
        "Harvested {} listings: {} stored, {} failed",
        summary.listings_extracted, summary.listings_persisted, summary.persistence_failures
    );
}
