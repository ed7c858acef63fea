//! semhl-cache: the persistent identifier color cache.
//!
//! Colors survive process restarts through a single JSON file in the
//! user's cache directory. The file carries the settings fingerprint it
//! was written under; a mismatch on load means the colors were generated
//! for different settings and the whole file is discarded.
//!
//! ## Failure posture
//!
//! Cache I/O is never load-bearing: a missing, unreadable, or corrupt
//! file degrades to an empty cache, and write failures are logged at
//! debug level and swallowed. Saves are atomic (sibling temp file, then
//! rename) so concurrent readers see either the old or the new file,
//! never a torn one.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Application directory under the user cache directory.
const APP_DIR: &str = "semhl";

/// Cache file name.
const CACHE_FILENAME: &str = "color_cache.json";

/// Quiet window after the last color change before a save fires.
pub const SAVE_DEBOUNCE: Duration = Duration::from_secs(5);

/// On-disk cache contents.
///
/// `colors` maps identifier text to `#RRGGBB` strings. A `BTreeMap`
/// keeps the serialized file stable across saves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheData {
    /// Fingerprint of the settings the colors were generated under.
    pub settings_hash: String,
    /// Identifier text to hex color.
    pub colors: BTreeMap<String, String>,
}

/// Storage for the color cache.
///
/// The engine talks to this trait so tests can swap in an in-memory
/// store; [`FsCacheStore`] is the production implementation.
pub trait CacheStore {
    /// Loads the cache, degrading to an empty value on any failure.
    fn load(&mut self) -> CacheData;
    /// Persists the cache; failures are swallowed.
    fn save(&mut self, data: &CacheData);
    /// Deletes the persisted cache; absence is not an error.
    fn clear(&mut self);
}

/// Filesystem-backed cache store.
///
/// A store without a path (no resolvable cache directory) is inert:
/// loads yield empty data and saves are dropped.
#[derive(Debug)]
pub struct FsCacheStore {
    path: Option<PathBuf>,
}

impl FsCacheStore {
    /// Creates a store over an explicit file path.
    pub fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    /// Creates a store at the default location, or an inert store when
    /// the user cache directory cannot be determined.
    pub fn at_default_path() -> Self {
        Self {
            path: Self::default_path(),
        }
    }

    /// The default cache file path: `<user_cache>/semhl/color_cache.json`.
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::cache_dir()?.join(APP_DIR).join(CACHE_FILENAME))
    }

    /// The path this store writes to, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, contents)?;
        fs::rename(&temp_path, path)
    }
}

impl CacheStore for FsCacheStore {
    fn load(&mut self) -> CacheData {
        let Some(path) = &self.path else {
            return CacheData::default();
        };
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    tracing::debug!(path = %path.display(), %err, "color cache unreadable");
                }
                return CacheData::default();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(data) => data,
            Err(err) => {
                tracing::debug!(path = %path.display(), %err, "color cache unparsable, starting fresh");
                CacheData::default()
            }
        }
    }

    fn save(&mut self, data: &CacheData) {
        let Some(path) = &self.path else { return };
        let contents = match serde_json::to_string_pretty(data) {
            Ok(contents) => contents,
            Err(err) => {
                tracing::debug!(%err, "color cache serialization failed");
                return;
            }
        };
        if let Err(err) = Self::write_atomic(path, &contents) {
            tracing::debug!(path = %path.display(), %err, "color cache save failed");
        }
    }

    fn clear(&mut self) {
        let Some(path) = &self.path else { return };
        if let Err(err) = fs::remove_file(path) {
            if err.kind() != io::ErrorKind::NotFound {
                tracing::debug!(path = %path.display(), %err, "color cache delete failed");
            }
        }
    }
}

/// In-memory cache store for tests.
#[derive(Debug, Default)]
pub struct MemCacheStore {
    data: Option<CacheData>,
    saves: usize,
}

impl MemCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated as if `data` had been persisted earlier.
    pub fn with_data(data: CacheData) -> Self {
        Self {
            data: Some(data),
            saves: 0,
        }
    }

    /// Number of times `save` has been called.
    pub fn save_count(&self) -> usize {
        self.saves
    }

    /// The currently persisted value, if any.
    pub fn persisted(&self) -> Option<&CacheData> {
        self.data.as_ref()
    }
}

impl CacheStore for MemCacheStore {
    fn load(&mut self) -> CacheData {
        self.data.clone().unwrap_or_default()
    }

    fn save(&mut self, data: &CacheData) {
        self.saves += 1;
        self.data = Some(data.clone());
    }

    fn clear(&mut self) {
        self.data = None;
    }
}

/// Coalesces bursts of color changes into one save.
///
/// Pure data with injected timestamps: each dirty mark resets the quiet
/// window, and `take_ready` reports (and clears) readiness once the
/// window has elapsed. The caller pumps it from its event loop.
#[derive(Debug)]
pub struct SaveDebouncer {
    deadline: Option<Instant>,
    window: Duration,
}

impl SaveDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            deadline: None,
            window,
        }
    }

    /// Marks the cache dirty, resetting the quiet window.
    pub fn mark_dirty(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// True while a save is pending.
    pub fn is_dirty(&self) -> bool {
        self.deadline.is_some()
    }

    /// Clears any pending save without firing it.
    pub fn reset(&mut self) {
        self.deadline = None;
    }

    /// Returns true once per elapsed quiet window.
    pub fn take_ready(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for SaveDebouncer {
    fn default() -> Self {
        Self::new(SAVE_DEBOUNCE)
    }
}
