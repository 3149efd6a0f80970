// src/bin/clear_cache.rs
use anyhow::{anyhow, Result};
use cdi_calculator::config::Settings;
use cdi_calculator::services::rate_cache::{FileStore, RateCache};
use dotenv::dotenv;

fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let settings = Settings::from_env()?;
    let cache = RateCache::new(Box::new(FileStore::new(&settings.cache_path)));

    match cache.read() {
        Some(cached) => println!("Removing cached CDI {:.4}% fetched at {}", cached.value, cached.fetched_at),
        None => println!("No cached CDI in {}", settings.cache_path.display()),
    }
    cache.clear().map_err(|e| anyhow!("could not clear cache: {}", e))?;
    println!("Cache cleared!");
    Ok(())
}
