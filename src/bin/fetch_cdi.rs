// src/bin/fetch_cdi.rs
use anyhow::Result;
use cdi_calculator::config::Settings;
use cdi_calculator::services::cdi::fetch_cdi;
use cdi_calculator::services::rate_cache::{FileStore, RateCache};
use dotenv::dotenv;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let settings = Settings::from_env()?;
    let client = reqwest::Client::new();
    let rate = fetch_cdi(&client, &settings.cdi_source_url, settings.fetch_timeout).await?;

    println!("CDI: {:.4}% ({})", rate.value, rate.observed_at.as_deref().unwrap_or("no date"));

    let cache = RateCache::new(Box::new(FileStore::new(&settings.cache_path)));
    if cache.write(rate.value, rate.observed_at).is_some() {
        info!("Stored in {}", settings.cache_path.display());
    }
    Ok(())
}
