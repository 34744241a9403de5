// =============================================================================
// Series Cache — keyed get/set with age-based expiry
// =============================================================================
//
// Two layers: an in-memory map for the current process, and JSON files on
// disk so repeated runs within the expiry window skip the vendor entirely.
// Disk writes use the atomic tmp + rename pattern.
//
// The cache is strictly an accelerator: if the directory cannot be created or
// a file cannot be read, callers just see a miss and re-fetch. Scores never
// depend on the cache being present.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::EntitySeries;

/// On-disk envelope for one cached series.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEnvelope {
    stored_at_unix: u64,
    series: EntitySeries,
}

struct MemoryEntry {
    stored_at: SystemTime,
    series: EntitySeries,
}

/// Keyed series cache with a memory layer over optional disk persistence.
pub struct SeriesCache {
    dir: Option<PathBuf>,
    memory: RwLock<HashMap<String, MemoryEntry>>,
}

impl SeriesCache {
    /// Create a cache. When `dir` is `Some`, the directory is created on
    /// first use; failure to create it downgrades to memory-only with a
    /// warning.
    pub fn new(dir: Option<PathBuf>) -> Self {
        let dir = dir.and_then(|d| match std::fs::create_dir_all(&d) {
            Ok(()) => Some(d),
            Err(e) => {
                warn!(dir = %d.display(), error = %e, "cache dir unavailable; memory-only");
                None
            }
        });
        Self {
            dir,
            memory: RwLock::new(HashMap::new()),
        }
    }

    /// Memory-only cache (used when no cache dir is configured).
    pub fn memory_only() -> Self {
        Self::new(None)
    }

    /// Fetch a series no older than `max_age`. Checks memory first, then
    /// disk; a disk hit is promoted into memory.
    pub fn get(&self, key: &str, max_age: Duration) -> Option<EntitySeries> {
        let now = SystemTime::now();

        if let Some(entry) = self.memory.read().get(key) {
            if age_of(entry.stored_at, now) <= max_age {
                debug!(key, "series cache hit (memory)");
                return Some(entry.series.clone());
            }
        }

        let path = self.file_path(key)?;
        let content = std::fs::read_to_string(&path).ok()?;
        let envelope: CacheEnvelope = match serde_json::from_str(&content) {
            Ok(env) => env,
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable cache file");
                let _ = std::fs::remove_file(&path);
                return None;
            }
        };

        let stored_at = UNIX_EPOCH + Duration::from_secs(envelope.stored_at_unix);
        if age_of(stored_at, now) > max_age {
            debug!(key, "series cache entry expired");
            return None;
        }

        self.memory.write().insert(
            key.to_string(),
            MemoryEntry {
                stored_at,
                series: envelope.series.clone(),
            },
        );
        debug!(key, "series cache hit (disk)");
        Some(envelope.series)
    }

    /// Store a series under `key` in memory and, when configured, on disk.
    /// Empty series are not worth keeping.
    pub fn set(&self, key: &str, series: &EntitySeries) {
        if series.is_empty() {
            return;
        }
        let now = SystemTime::now();
        self.memory.write().insert(
            key.to_string(),
            MemoryEntry {
                stored_at: now,
                series: series.clone(),
            },
        );

        let Some(path) = self.file_path(key) else {
            return;
        };
        let envelope = CacheEnvelope {
            stored_at_unix: now
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            series: series.clone(),
        };
        let Ok(content) = serde_json::to_string(&envelope) else {
            return;
        };

        // Atomic write: tmp sibling, then rename.
        let tmp = path.with_extension("json.tmp");
        if let Err(e) = std::fs::write(&tmp, content).and_then(|()| std::fs::rename(&tmp, &path)) {
            warn!(key, error = %e, "failed to persist cache entry");
        }
    }

    fn file_path(&self, key: &str) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        Some(dir.join(format!("{safe}.json")))
    }
}

fn age_of(stored_at: SystemTime, now: SystemTime) -> Duration {
    now.duration_since(stored_at).unwrap_or_default()
}
