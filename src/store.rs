//! Durable state store - the single source of truth for triage dispositions
//!
//! Five persisted values: processed ids, liked ids, pending-trash ids, moved
//! ids, and per-folder usage. Membership in `processed` says an item was
//! handled; the disjoint sub-sets say how. "Kept" has no set of its own: a
//! kept item is processed but in none of liked/pending-trash/moved.
//!
//! Small critical sets are written through synchronously on every mutation.
//! Folder usage and the stats aggregate are flushed as debounced snapshots on
//! a background thread. A corrupt or missing blob on load falls back to an
//! empty default, never an error.

use crate::error::TriageError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub const KEY_PROCESSED: &str = "processed_ids";
pub const KEY_LIKED: &str = "liked_ids";
pub const KEY_PENDING_TRASH: &str = "pending_trash_ids";
pub const KEY_MOVED: &str = "moved_ids";
pub const KEY_FOLDER_USAGE: &str = "folder_usage";
pub const KEY_STATS: &str = "stats";

/// Minimum interval between background snapshot flushes
const DEFERRED_FLUSH_DEBOUNCE: Duration = Duration::from_secs(2);

/// Key/value persistence contract. Implementations must tolerate concurrent
/// snapshot writes from detached threads.
pub trait StoreBackend: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), TriageError>;
    /// Fire-and-forget write of an already-serialized snapshot
    fn async_snapshot_write(&self, key: &str, snapshot: String);
}

/// One JSON file per key under a config directory
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// OS-specific default location
    pub fn default_location() -> Self {
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gallery-triage");
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StoreBackend for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), TriageError> {
        fs::create_dir_all(&self.dir).map_err(|e| TriageError::Store {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        fs::write(self.path_for(key), value).map_err(|e| TriageError::Store {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    fn async_snapshot_write(&self, key: &str, snapshot: String) {
        let path = self.path_for(key);
        let dir = self.dir.clone();
        std::thread::spawn(move || {
            if let Err(e) = fs::create_dir_all(&dir).and_then(|_| fs::write(&path, snapshot)) {
                eprintln!("Warning: background write failed for {}: {}", path.display(), e);
            }
        });
    }
}

/// In-memory backend for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStore {
    values: std::sync::Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreBackend for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), TriageError> {
        self.values.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn async_snapshot_write(&self, key: &str, snapshot: String) {
        self.values.lock().unwrap().insert(key.to_string(), snapshot);
    }
}

/// Running counters the UI renders. Re-derivable from the disjoint sets plus
/// item sizes; persisted so a restart does not have to replay anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub processed: u64,
    pub trashed: u64,
    pub skipped: u64,
    pub saved_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FolderUsage {
    pub count: u64,
    /// Seconds since epoch of the most recent move into this folder
    pub last_used: i64,
}

/// Cached in-memory view of the durable sets, written through on mutation
pub struct StateStore {
    backend: Box<dyn StoreBackend>,
    processed: HashSet<i64>,
    liked: HashSet<i64>,
    pending_trash: HashSet<i64>,
    moved: HashSet<i64>,
    folder_usage: HashMap<String, FolderUsage>,
    stats: Stats,
    deferred_dirty: bool,
    last_deferred_flush: Instant,
}

impl StateStore {
    pub fn load(backend: Box<dyn StoreBackend>) -> Self {
        let processed = read_blob(backend.as_ref(), KEY_PROCESSED);
        let liked = read_blob(backend.as_ref(), KEY_LIKED);
        let pending_trash = read_blob(backend.as_ref(), KEY_PENDING_TRASH);
        let moved = read_blob(backend.as_ref(), KEY_MOVED);
        let folder_usage = read_blob(backend.as_ref(), KEY_FOLDER_USAGE);
        let stats = read_blob(backend.as_ref(), KEY_STATS);

        Self {
            backend,
            processed,
            liked,
            pending_trash,
            moved,
            folder_usage,
            stats,
            deferred_dirty: false,
            last_deferred_flush: Instant::now(),
        }
    }

    // ------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn is_processed(&self, id: i64) -> bool {
        self.processed.contains(&id)
    }

    /// Exclusion view shared with the analyzer collaborators: an item handled
    /// in any surface never resurfaces in another
    pub fn processed_ids(&self) -> &HashSet<i64> {
        &self.processed
    }

    pub fn liked_ids(&self) -> &HashSet<i64> {
        &self.liked
    }

    pub fn pending_trash_ids(&self) -> &HashSet<i64> {
        &self.pending_trash
    }

    pub fn moved_ids(&self) -> &HashSet<i64> {
        &self.moved
    }

    pub fn folder_usage(&self) -> &HashMap<String, FolderUsage> {
        &self.folder_usage
    }

    // ------------------------------------------------------------------
    // Processed set (synchronous write-through)
    // ------------------------------------------------------------------

    pub fn mark_processed(&mut self, id: i64) {
        if self.processed.insert(id) {
            self.stats.processed += 1;
            self.write_ids(KEY_PROCESSED, &self.processed);
            self.schedule_deferred();
        }
    }

    pub fn unmark_processed(&mut self, id: i64) {
        if self.processed.remove(&id) {
            self.stats.processed = self.stats.processed.saturating_sub(1);
            self.write_ids(KEY_PROCESSED, &self.processed);
            self.schedule_deferred();
        }
    }

    // ------------------------------------------------------------------
    // Disposition sets
    // ------------------------------------------------------------------

    pub fn add_liked(&mut self, id: i64) {
        if self.liked.insert(id) {
            self.write_ids(KEY_LIKED, &self.liked);
        }
    }

    pub fn remove_liked(&mut self, id: i64) {
        if self.liked.remove(&id) {
            self.write_ids(KEY_LIKED, &self.liked);
        }
    }

    pub fn add_pending_trash(&mut self, id: i64) {
        if self.pending_trash.insert(id) {
            self.write_ids(KEY_PENDING_TRASH, &self.pending_trash);
        }
    }

    pub fn remove_pending_trash(&mut self, id: i64) {
        if self.pending_trash.remove(&id) {
            self.write_ids(KEY_PENDING_TRASH, &self.pending_trash);
        }
    }

    pub fn add_moved(&mut self, id: i64) {
        if self.moved.insert(id) {
            self.write_ids(KEY_MOVED, &self.moved);
        }
    }

    pub fn remove_moved(&mut self, id: i64) {
        if self.moved.remove(&id) {
            self.write_ids(KEY_MOVED, &self.moved);
        }
    }

    // ------------------------------------------------------------------
    // Counters (debounced background flush)
    // ------------------------------------------------------------------

    pub fn count_trashed(&mut self, byte_size: u64) {
        self.stats.trashed += 1;
        self.stats.saved_bytes += byte_size;
        self.schedule_deferred();
    }

    pub fn uncount_trashed(&mut self, byte_size: u64) {
        self.stats.trashed = self.stats.trashed.saturating_sub(1);
        self.stats.saved_bytes = self.stats.saved_bytes.saturating_sub(byte_size);
        self.schedule_deferred();
    }

    pub fn count_skipped(&mut self) {
        self.stats.skipped += 1;
        self.schedule_deferred();
    }

    pub fn uncount_skipped(&mut self) {
        self.stats.skipped = self.stats.skipped.saturating_sub(1);
        self.schedule_deferred();
    }

    // ------------------------------------------------------------------
    // Folder usage (debounced background flush)
    // ------------------------------------------------------------------

    pub fn record_folder_use(&mut self, folder: &str, now: i64) {
        let usage = self.folder_usage.entry(folder.to_string()).or_default();
        usage.count += 1;
        usage.last_used = now;
        self.schedule_deferred();
    }

    /// Reversal of `record_folder_use`. A folder created by the reverted move
    /// loses its entry entirely; a pre-existing one is only decremented.
    pub fn revert_folder_use(&mut self, folder: &str, created: bool) {
        if created {
            self.folder_usage.remove(folder);
        } else if let Some(usage) = self.folder_usage.get_mut(folder) {
            usage.count = usage.count.saturating_sub(1);
        }
        self.schedule_deferred();
    }

    // ------------------------------------------------------------------
    // Bulk operations
    // ------------------------------------------------------------------

    /// Release processed-but-undisposed items back into circulation: every id
    /// in none of liked/pending-trash/moved leaves the processed set.
    /// Recovery action for an exhausted filtered universe.
    pub fn release_kept(&mut self) -> Vec<i64> {
        let released: Vec<i64> = self
            .processed
            .iter()
            .copied()
            .filter(|id| {
                !self.liked.contains(id)
                    && !self.pending_trash.contains(id)
                    && !self.moved.contains(id)
            })
            .collect();

        if !released.is_empty() {
            for id in &released {
                self.processed.remove(id);
            }
            self.stats.processed = self.processed.len() as u64;
            self.write_ids(KEY_PROCESSED, &self.processed);
            self.schedule_deferred();
        }
        released
    }

    /// Drain the pending-trash set for handoff to the platform. Once flushed
    /// the items leave the app's control; the caller must clear its undo
    /// stack because they can no longer be un-trashed here.
    pub fn flush_pending_trash(&mut self) -> Vec<i64> {
        let flushed: Vec<i64> = self.pending_trash.drain().collect();
        if !flushed.is_empty() {
            self.write_ids(KEY_PENDING_TRASH, &self.pending_trash);
        }
        flushed
    }

    // ------------------------------------------------------------------
    // Persistence plumbing
    // ------------------------------------------------------------------

    fn write_ids(&self, key: &str, ids: &HashSet<i64>) {
        match serde_json::to_string(ids) {
            Ok(json) => {
                if let Err(e) = self.backend.set(key, &json) {
                    eprintln!("Warning: failed to persist {}: {}", key, e);
                }
            }
            Err(e) => eprintln!("Warning: failed to serialize {}: {}", key, e),
        }
    }

    fn schedule_deferred(&mut self) {
        self.deferred_dirty = true;
        if self.last_deferred_flush.elapsed() >= DEFERRED_FLUSH_DEBOUNCE {
            self.flush_deferred();
        }
    }

    /// Flush folder usage and stats. Serializing here produces the defensive
    /// snapshot copy the background writer receives; the live maps are never
    /// handed across the thread boundary.
    pub fn flush_deferred(&mut self) {
        if !self.deferred_dirty {
            return;
        }
        if let Ok(snapshot) = serde_json::to_string(&self.folder_usage) {
            self.backend.async_snapshot_write(KEY_FOLDER_USAGE, snapshot);
        }
        if let Ok(snapshot) = serde_json::to_string(&self.stats) {
            self.backend.async_snapshot_write(KEY_STATS, snapshot);
        }
        self.deferred_dirty = false;
        self.last_deferred_flush = Instant::now();
    }
}

impl Drop for StateStore {
    fn drop(&mut self) {
        self.flush_deferred();
    }
}

fn read_blob<T: Default + for<'de> Deserialize<'de>>(backend: &dyn StoreBackend, key: &str) -> T {
    backend
        .get(key)
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_store() -> StateStore {
        StateStore::load(Box::new(MemoryStore::new()))
    }

    #[test]
    fn test_corrupt_blob_falls_back_to_default() {
        let backend = MemoryStore::new();
        backend.set(KEY_PROCESSED, "not json {").unwrap();
        backend.set(KEY_STATS, "[5,").unwrap();

        let store = StateStore::load(Box::new(backend));
        assert!(store.processed_ids().is_empty());
        assert_eq!(store.stats(), Stats::default());
    }

    #[test]
    fn test_mutations_write_through_to_backend() {
        let mut store = memory_store();
        store.mark_processed(7);
        store.add_pending_trash(7);

        let raw = store.backend.get(KEY_PROCESSED).unwrap();
        let ids: HashSet<i64> = serde_json::from_str(&raw).unwrap();
        assert!(ids.contains(&7));

        let raw = store.backend.get(KEY_PENDING_TRASH).unwrap();
        let ids: HashSet<i64> = serde_json::from_str(&raw).unwrap();
        assert!(ids.contains(&7));
    }

    #[test]
    fn test_release_kept_spares_disposed_items() {
        let mut store = memory_store();
        for id in [1, 2, 3, 4] {
            store.mark_processed(id);
        }
        store.add_liked(1);
        store.add_pending_trash(2);

        let mut released = store.release_kept();
        released.sort_unstable();

        assert_eq!(released, vec![3, 4]);
        assert!(store.is_processed(1));
        assert!(store.is_processed(2));
        assert!(!store.is_processed(3));
        assert!(!store.is_processed(4));
        assert!(store.liked_ids().contains(&1));
        assert!(store.pending_trash_ids().contains(&2));
        assert_eq!(store.stats().processed, 2);
    }

    #[test]
    fn test_new_folder_reversal_removes_entry() {
        let mut store = memory_store();
        store.record_folder_use("trip", 1000);
        assert_eq!(store.folder_usage().get("trip").unwrap().count, 1);

        store.revert_folder_use("trip", true);
        assert!(store.folder_usage().get("trip").is_none());
    }

    #[test]
    fn test_existing_folder_reversal_only_decrements() {
        let mut store = memory_store();
        store.record_folder_use("trip", 1000);
        store.record_folder_use("trip", 2000);

        store.revert_folder_use("trip", false);
        let usage = store.folder_usage().get("trip").unwrap();
        assert_eq!(usage.count, 1);
        assert_eq!(usage.last_used, 2000);
    }

    #[test]
    fn test_flush_pending_trash_drains_set() {
        let mut store = memory_store();
        store.add_pending_trash(1);
        store.add_pending_trash(2);

        let mut flushed = store.flush_pending_trash();
        flushed.sort_unstable();

        assert_eq!(flushed, vec![1, 2]);
        assert!(store.pending_trash_ids().is_empty());
    }

    #[test]
    fn test_json_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = JsonFileStore::new(dir.path().to_path_buf());
        backend.set(KEY_LIKED, "[1,2]").unwrap();
        assert_eq!(backend.get(KEY_LIKED).as_deref(), Some("[1,2]"));
        assert!(backend.get(KEY_MOVED).is_none());
    }
}
