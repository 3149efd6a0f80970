// src/services/rate_cache.rs
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, SubsecRound, Utc};
use log::{debug, info, warn};

use crate::models::CachedRate;
use crate::BoxError;

pub const CDI_CACHE_KEY: &str = "cdi_cache_v1";

/// String key-value persistence for the rate cache.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, BoxError>;
    fn set(&self, key: &str, value: &str) -> Result<(), BoxError>;
    fn remove(&self, key: &str) -> Result<(), BoxError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, BoxError> {
        let entries = self.entries.lock().map_err(|_| "cache lock poisoned")?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BoxError> {
        let mut entries = self.entries.lock().map_err(|_| "cache lock poisoned")?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BoxError> {
        let mut entries = self.entries.lock().map_err(|_| "cache lock poisoned")?;
        entries.remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten through a temp file on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<HashMap<String, String>, BoxError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(HashMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &HashMap<String, String>) -> Result<(), BoxError> {
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CacheStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, BoxError> {
        let _guard = self.lock.lock().map_err(|_| "cache lock poisoned")?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BoxError> {
        let _guard = self.lock.lock().map_err(|_| "cache lock poisoned")?;
        // a corrupt file is replaced rather than blocking every future write
        let mut entries = self.load().unwrap_or_else(|e| {
            warn!("Discarding unreadable cache file {}: {}", self.path.display(), e);
            HashMap::new()
        });
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), BoxError> {
        let _guard = self.lock.lock().map_err(|_| "cache lock poisoned")?;
        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Discarding unreadable cache file {}: {}", self.path.display(), e);
                return self.save(&HashMap::new());
            }
        };
        if entries.remove(key).is_some() {
            self.save(&entries)?;
        }
        Ok(())
    }
}

/// Typed access to the single cached CDI record.
pub struct RateCache {
    store: Box<dyn CacheStore>,
}

impl RateCache {
    pub fn new(store: Box<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Returns the cached rate, or None when missing or unreadable. Never fails.
    pub fn read(&self) -> Option<CachedRate> {
        let raw = match self.store.get(CDI_CACHE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Error reading CDI cache: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<CachedRate>(&raw) {
            Ok(cached) if cached.value.is_finite() => {
                debug!("Read cached CDI {} fetched at {}", cached.value, cached.fetched_at);
                Some(cached)
            }
            Ok(cached) => {
                warn!("Ignoring cached CDI with non-finite value {}", cached.value);
                None
            }
            Err(e) => {
                warn!("Ignoring malformed CDI cache entry: {}", e);
                None
            }
        }
    }

    /// Store `value` stamped with the current time. Failures are logged, not returned.
    pub fn write(&self, value: f64, observed_at: Option<String>) -> Option<CachedRate> {
        self.write_at(value, observed_at, Utc::now())
    }

    /// Like `write`, stamped with `now` truncated to the stored millisecond precision.
    pub fn write_at(&self, value: f64, observed_at: Option<String>, now: DateTime<Utc>) -> Option<CachedRate> {
        let record = CachedRate {
            value,
            observed_at,
            fetched_at: now.trunc_subsecs(3),
        };

        let stored = serde_json::to_string(&record)
            .map_err(BoxError::from)
            .and_then(|json| self.store.set(CDI_CACHE_KEY, &json));

        match stored {
            Ok(()) => {
                info!("Cached CDI {}", value);
                Some(record)
            }
            Err(e) => {
                warn!("Could not save CDI cache: {}", e);
                None
            }
        }
    }

    pub fn clear(&self) -> Result<(), BoxError> {
        self.store.remove(CDI_CACHE_KEY)?;
        info!("CDI cache cleared");
        Ok(())
    }
}
