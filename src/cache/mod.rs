//! Best-effort TTL cache for feed payloads.
//!
//! The portal ran inside an embedded host with a small persistent-storage
//! quota, so the cache has two tiers: a persistent tier (one JSON file per
//! key, the analogue of the host's key-value storage) for payloads up to
//! 1 MiB, and a small FIFO in-memory tier callers fall back to when the
//! persistent tier refuses a payload as oversized. Both tiers use the same
//! fixed 15-minute TTL, independent of access patterns. Expiry is lazy,
//! evicted on read, with an opportunistic housekeeping pass before writes
//! and at startup rather than on a timer.
//!
//! Nothing here is a correctness dependency: every failure path means "not
//! cached" and the caller refetches.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::CacheError;

/// Fixed entry lifetime for both tiers.
pub const CACHE_TTL_MS: i64 = 15 * 60 * 1000;

/// Persistent-tier payload ceiling. Larger payloads are refused and belong
/// in the memory tier.
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

/// Memory-tier capacity; oldest entry is evicted first.
const MEMORY_TIER_CAPACITY: usize = 10;

/// Key prefixes the housekeeping pass recognizes as ours. Anything else in
/// the cache directory is left alone.
const CACHE_KEY_PREFIXES: &[&str] = &[
    "userData-",
    "enquiries-",
    "matters-",
    "normalizedMatters-",
    "vnetMatters-",
    "allMatters",
    "teamData",
];

/// Wall-clock source, injected so TTL expiry is testable without sleeping.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// The real clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

#[derive(Serialize, Deserialize)]
struct CacheEntry<T> {
    data: T,
    timestamp: i64,
}

struct MemoryEntry {
    key: String,
    value: Value,
    timestamp: i64,
}

/// Two-tier cache store. Constructed once at startup and passed by
/// reference to consumers; `init` runs the startup housekeeping pass and
/// there is no teardown (process lifetime).
pub struct CacheStore {
    dir: PathBuf,
    ttl_ms: i64,
    clock: Arc<dyn Clock>,
    memory: Mutex<VecDeque<MemoryEntry>>,
}

fn cache_file_name(key: &str) -> String {
    let safe: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("{safe}.json")
}

fn is_known_cache_key(key: &str) -> bool {
    CACHE_KEY_PREFIXES
        .iter()
        .any(|prefix| key.starts_with(prefix))
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            dir: dir.into(),
            ttl_ms: CACHE_TTL_MS,
            clock,
            memory: Mutex::new(VecDeque::new()),
        }
    }

    /// Override the TTL. Used by the config layer and tests.
    pub fn with_ttl_ms(mut self, ttl_ms: i64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    /// Create the cache directory and run the startup housekeeping pass.
    pub fn init(&self) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).map_err(|err| CacheError::Storage {
            key: String::new(),
            reason: format!("failed to create cache directory: {err}"),
        })?;
        let removed = self.cleanup_old_cache();
        if removed > 0 {
            debug!(removed, "evicted stale cache entries at startup");
        }
        Ok(())
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(cache_file_name(key))
    }

    fn is_fresh(&self, timestamp: i64) -> bool {
        self.clock.now_ms() - timestamp < self.ttl_ms
    }

    /// Read a persistent-tier entry. Entries past the TTL, or that fail to
    /// parse, are evicted on read and reported as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path_for(key);
        let raw = fs::read_to_string(&path).ok()?;

        match serde_json::from_str::<CacheEntry<T>>(&raw) {
            Ok(entry) if self.is_fresh(entry.timestamp) => Some(entry.data),
            Ok(_) => {
                let _ = fs::remove_file(&path);
                None
            }
            Err(_) => {
                // Corrupt entry; drop it.
                let _ = fs::remove_file(&path);
                None
            }
        }
    }

    /// Write a persistent-tier entry.
    ///
    /// Payloads over [`MAX_PAYLOAD_BYTES`] are refused with
    /// `PayloadTooLarge`; the caller decides whether to fall back to the
    /// memory tier. Storage failures trigger one housekeeping pass and one
    /// retry; a second failure is returned as `Storage`. Every `Err` means
    /// "not cached" and nothing more.
    pub fn set<T: Serialize>(&self, key: &str, data: &T) -> Result<(), CacheError> {
        let entry = CacheEntry {
            data,
            timestamp: self.clock.now_ms(),
        };
        let payload = serde_json::to_string(&entry).map_err(|err| CacheError::Serialize {
            key: key.to_string(),
            reason: err.to_string(),
        })?;

        if payload.len() > MAX_PAYLOAD_BYTES {
            return Err(CacheError::PayloadTooLarge {
                key: key.to_string(),
                size: payload.len(),
                limit: MAX_PAYLOAD_BYTES,
            });
        }

        self.cleanup_old_cache();

        let path = self.path_for(key);
        if fs::write(&path, &payload).is_ok() {
            return Ok(());
        }

        // Likely quota pressure in the host environment: force a cleanup
        // and retry once.
        self.cleanup_old_cache();
        fs::write(&path, &payload).map_err(|err| CacheError::Storage {
            key: key.to_string(),
            reason: err.to_string(),
        })
    }

    /// Hold a value in the memory tier. FIFO eviction by insertion order
    /// once the tier is full; re-setting a key moves it to the back.
    pub fn memory_set(&self, key: &str, value: Value) {
        let Ok(mut memory) = self.memory.lock() else {
            return;
        };
        memory.retain(|entry| entry.key != key);
        if memory.len() >= MEMORY_TIER_CAPACITY {
            memory.pop_front();
        }
        memory.push_back(MemoryEntry {
            key: key.to_string(),
            value,
            timestamp: self.clock.now_ms(),
        });
    }

    /// Read a memory-tier entry, evicting it if past the TTL.
    pub fn memory_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut memory = self.memory.lock().ok()?;
        let idx = memory.iter().position(|entry| entry.key == key)?;
        if !self.is_fresh(memory[idx].timestamp) {
            memory.remove(idx);
            return None;
        }
        serde_json::from_value(memory[idx].value.clone()).ok()
    }

    /// Housekeeping pass over the persistent tier: remove entries under
    /// known cache-key prefixes that are past the TTL or fail to parse.
    /// Returns the number of entries removed. Best-effort throughout.
    pub fn cleanup_old_cache(&self) -> usize {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return 0;
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if !self.is_removable_cache_file(&path) {
                continue;
            }
            let stale = match fs::read_to_string(&path) {
                Ok(raw) => match serde_json::from_str::<CacheEntry<Value>>(&raw) {
                    Ok(parsed) => !self.is_fresh(parsed.timestamp),
                    // Unparseable means corrupt; treat as stale.
                    Err(_) => true,
                },
                Err(_) => false,
            };
            if stale && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(removed, "cleaned up stale cache entries");
        }
        removed
    }

    /// Remove every known cache entry from both tiers. Returns the number
    /// of persistent entries removed.
    pub fn clear_all_cache(&self) -> usize {
        if let Ok(mut memory) = self.memory.lock() {
            memory.clear();
        }

        let Ok(entries) = fs::read_dir(&self.dir) else {
            return 0;
        };
        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if self.is_removable_cache_file(&path) && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    fn is_removable_cache_file(&self, path: &Path) -> bool {
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            return false;
        }
        path.file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(is_known_cache_key)
    }
}
