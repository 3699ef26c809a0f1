//! Best-time persistence
//!
//! A single value outlives the process: the largest elapsed duration ever
//! recorded at a pause or goal-completion event. It is stored as a decimal
//! string of milliseconds in one file under the data directory; an absent
//! file means "no record yet". The store is a trait so tests run against an
//! in-memory substitute.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use tracing::debug;

/// File name holding the persisted best time.
const BEST_TIME_KEY: &str = "chrono_best_ms";

/// Directory under the platform data dir where the key lives.
const APP_DIR: &str = "chrono-goal";

/// Read/write access to the persisted best time.
pub trait BestTimeStore: Send + Sync {
    /// Read the persisted value. `None` when no record has ever been set.
    fn load(&self) -> Option<u64>;

    /// Unconditionally overwrite the persisted value.
    fn save(&self, ms: u64) -> anyhow::Result<()>;
}

/// File-backed store keeping the value as a decimal string.
pub struct FileBestStore {
    path: PathBuf,
}

impl FileBestStore {
    /// Store the key under the given directory, creating it if needed.
    pub fn new(dir: PathBuf) -> anyhow::Result<Self> {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
        Ok(Self {
            path: dir.join(BEST_TIME_KEY),
        })
    }

    /// Store the key under the platform data directory.
    pub fn at_default_location() -> anyhow::Result<Self> {
        let base = dirs::data_dir().context("No platform data directory available")?;
        Self::new(base.join(APP_DIR))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl BestTimeStore for FileBestStore {
    fn load(&self) -> Option<u64> {
        let raw = fs::read_to_string(&self.path).ok()?;
        raw.trim().parse().ok()
    }

    fn save(&self, ms: u64) -> anyhow::Result<()> {
        fs::write(&self.path, ms.to_string())
            .with_context(|| format!("Failed to write best time to {}", self.path.display()))?;
        debug!("Persisted best time: {}ms", ms);
        Ok(())
    }
}

/// In-memory store for tests.
#[cfg(test)]
pub struct MemoryBestStore {
    value: std::sync::Mutex<Option<u64>>,
}

#[cfg(test)]
impl MemoryBestStore {
    pub fn new() -> Self {
        Self {
            value: std::sync::Mutex::new(None),
        }
    }
}

#[cfg(test)]
impl BestTimeStore for MemoryBestStore {
    fn load(&self) -> Option<u64> {
        *self.value.lock().unwrap()
    }

    fn save(&self, ms: u64) -> anyhow::Result<()> {
        *self.value.lock().unwrap() = Some(ms);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_absent_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBestStore::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBestStore::new(dir.path().to_path_buf()).unwrap();
        store.save(60_000).unwrap();
        assert_eq!(store.load(), Some(60_000));

        store.save(61_500).unwrap();
        assert_eq!(store.load(), Some(61_500));
    }

    #[test]
    fn test_value_is_a_decimal_string() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBestStore::new(dir.path().to_path_buf()).unwrap();
        store.save(123_456).unwrap();
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, "123456");
    }

    #[test]
    fn test_garbage_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBestStore::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(store.path(), "not-a-number").unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryBestStore::new();
        assert_eq!(store.load(), None);
        store.save(42).unwrap();
        assert_eq!(store.load(), Some(42));
    }
}
