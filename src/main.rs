use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dance_scrape_lib::scraping::{self, base::HttpFetcher};
use dance_scrape_lib::AppConfig;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::load();
    let fetcher = HttpFetcher::new(&config)?;

    let mut events = match std::env::args().nth(1) {
        Some(id) => scraping::run_single(&id, &config, &fetcher)?,
        None => scraping::run_all(&config, &fetcher)?,
    };
    events.sort_by_key(|event| event.starts_at);

    println!("{}", serde_json::to_string_pretty(&events)?);
    Ok(())
}
