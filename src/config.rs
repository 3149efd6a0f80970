// src/config.rs
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use log::warn;

use crate::services::cdi::{DEFAULT_CDI_URL, DEFAULT_TIMEOUT};

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub cdi_source_url: String,
    pub fetch_timeout: Duration,
    pub cache_path: PathBuf,
    pub cache_ttl: chrono::Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            port: 3030,
            cdi_source_url: DEFAULT_CDI_URL.to_string(),
            fetch_timeout: DEFAULT_TIMEOUT,
            cache_path: PathBuf::from("cdi_cache.json"),
            cache_ttl: chrono::Duration::hours(24),
        }
    }
}

impl Settings {
    /// Read settings from the environment (call `dotenv().ok()` first).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let port = parsed(&lookup, "PORT")?.unwrap_or_else(|| {
            warn!("$PORT not set, defaulting to {}", defaults.port);
            defaults.port
        });
        let cdi_source_url = lookup("CDI_SOURCE_URL").unwrap_or(defaults.cdi_source_url);
        let fetch_timeout = parsed::<u64, _>(&lookup, "CDI_FETCH_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.fetch_timeout);
        let cache_path = lookup("CDI_CACHE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_path);
        let cache_ttl = parsed::<i64, _>(&lookup, "CDI_CACHE_TTL_HOURS")?
            .map(chrono::Duration::hours)
            .unwrap_or(defaults.cache_ttl);

        Ok(Settings {
            port,
            cdi_source_url,
            fetch_timeout,
            cache_path,
            cache_ttl,
        })
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{} must be a number, got {:?}", key, raw)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.port, 3030);
        assert_eq!(settings.cdi_source_url, DEFAULT_CDI_URL);
        assert_eq!(settings.fetch_timeout, Duration::from_secs(7));
        assert_eq!(settings.cache_ttl, chrono::Duration::hours(24));
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("CDI_SOURCE_URL", "http://localhost:9000/cdi"),
            ("CDI_FETCH_TIMEOUT_SECS", "3"),
            ("CDI_CACHE_PATH", "/tmp/cdi.json"),
            ("CDI_CACHE_TTL_HOURS", "6"),
        ]))
        .unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.cdi_source_url, "http://localhost:9000/cdi");
        assert_eq!(settings.fetch_timeout, Duration::from_secs(3));
        assert_eq!(settings.cache_path, PathBuf::from("/tmp/cdi.json"));
        assert_eq!(settings.cache_ttl, chrono::Duration::hours(6));
    }

    #[test]
    fn test_bad_number_is_reported() {
        let err = Settings::from_lookup(lookup(&[("PORT", "http")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
