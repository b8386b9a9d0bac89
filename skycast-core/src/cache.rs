//! Time-boxed snapshot cache over a pluggable string key-value store.
//!
//! The store is injected into the provider client rather than reached as an
//! ambient singleton, so tests run against [`MemoryStore`]. Key derivation
//! reproduces the historical format exactly: existing entries written by
//! earlier builds keep working.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use directories::ProjectDirs;

use crate::model::{Coordinates, UnitSystem, WeatherSnapshot};

/// A cached snapshot older than this is stale and evicted on read.
pub const CACHE_TTL_MS: i64 = 5 * 60 * 1000;

const KEY_PREFIX: &str = "weather_cache_";

/// Cache key for a coordinate-based lookup. Coordinates are rounded to two
/// decimals so nearby fixes share an entry.
pub fn coordinate_key(coords: Coordinates, unit: UnitSystem) -> String {
    format!("lat_{:.2}_lon_{:.2}_{unit}", coords.latitude, coords.longitude)
}

/// Cache key for a city-name lookup. Deliberately distinct from coordinate
/// keys: a city search and a geolocation hit for the same place never alias.
pub fn city_key(city: &str, unit: UnitSystem) -> String {
    format!("city_{}_{unit}", city.to_lowercase())
}

/// String-keyed, string-valued backing storage. Writes may fail (quota,
/// unavailable backing file); reads and removals never do.
pub trait StringStore: Send + Sync + std::fmt::Debug {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str);
}

/// Session-scoped in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl StringStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries().remove(key);
    }
}

/// Store persisted as a single JSON map under the platform cache directory.
/// Persistence is best-effort: a corrupt or missing file starts empty.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    pub fn open(path: PathBuf) -> Self {
        let entries = fs::read_to_string(&path)
            .ok()
            .and_then(|contents| serde_json::from_str(&contents).ok())
            .unwrap_or_default();

        Self { path, entries: Mutex::new(entries) }
    }

    /// Open the store at its default platform location.
    pub fn open_default() -> Result<Self> {
        let dirs = ProjectDirs::from("dev", "skycast", "skycast")
            .ok_or_else(|| anyhow!("Could not determine platform cache directory"))?;

        Ok(Self::open(dirs.cache_dir().join("snapshots.json")))
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create cache directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string(entries).context("Failed to serialize cache entries")?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write cache file: {}", self.path.display()))?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StringStore for FileStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries();
        entries.remove(key);
        if let Err(err) = self.persist(&entries) {
            tracing::warn!("Failed to persist cache eviction: {err:#}");
        }
    }
}

/// TTL cache for weather snapshots.
///
/// `get` never fails: expired or malformed entries are evicted lazily and
/// reported as a miss. `put` is best-effort: a failing backing write is
/// logged and dropped, never surfaced to the caller.
#[derive(Debug)]
pub struct SnapshotCache {
    store: Box<dyn StringStore>,
}

impl SnapshotCache {
    pub fn new(store: Box<dyn StringStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::default()))
    }

    pub fn get(&self, key: &str) -> Option<WeatherSnapshot> {
        self.get_at(key, Utc::now().timestamp_millis())
    }

    fn get_at(&self, key: &str, now_ms: i64) -> Option<WeatherSnapshot> {
        let storage_key = format!("{KEY_PREFIX}{key}");
        let raw = self.store.read(&storage_key)?;

        let Ok(snapshot) = serde_json::from_str::<WeatherSnapshot>(&raw) else {
            self.store.remove(&storage_key);
            return None;
        };

        if now_ms - snapshot.fetched_at_epoch_ms >= CACHE_TTL_MS {
            self.store.remove(&storage_key);
            return None;
        }

        Some(snapshot)
    }

    pub fn put(&self, key: &str, snapshot: &WeatherSnapshot) {
        let storage_key = format!("{KEY_PREFIX}{key}");
        let json = match serde_json::to_string(snapshot) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(%key, "Failed to serialize snapshot for caching: {err}");
                return;
            }
        };

        if let Err(err) = self.store.write(&storage_key, &json) {
            tracing::warn!(%key, "Dropping cache write: {err:#}");
        }
    }
}
