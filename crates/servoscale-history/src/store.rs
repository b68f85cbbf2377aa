//! HistoryStore — redb-backed bounded recommendation history.
//!
//! Each task owns one list of serialized [`AnomalyRecommendResult`] entries,
//! newest first, capped at [`HISTORY_CAP`]. Appends use LPUSH semantics:
//! the new entry is prepended and anything past the cap is dropped. The
//! list value is a JSON array of raw entry strings in a redb `&[u8]`
//! column, so one corrupt entry can be skipped on read without losing
//! the rest.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::{debug, warn};

use servo_core::AnomalyRecommendResult;

use crate::error::{HistoryError, HistoryResult};
use crate::tables::RESULTS;

/// Maximum number of retained history entries per task.
pub const HISTORY_CAP: usize = 10;

/// Convert any `Display` error into a `HistoryError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| HistoryError::$variant(e.to_string())
    };
}

/// History list key for a task name.
///
/// Key format is fixed for compatibility with downstream readers of the
/// original deployment.
pub fn result_key(task_name: &str) -> String {
    format!("{task_name}_recomment_results")
}

/// Thread-safe history store backed by redb.
#[derive(Clone)]
pub struct HistoryStore {
    db: Arc<Database>,
}

impl HistoryStore {
    /// Open (or create) a persistent history store at the given path.
    pub fn open(path: &Path) -> HistoryResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "history store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory history store (for testing and
    /// diskless deployments).
    pub fn open_in_memory() -> HistoryResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory history store opened");
        Ok(store)
    }

    fn ensure_tables(&self) -> HistoryResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(RESULTS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Append a result to a task's history, evicting past [`HISTORY_CAP`].
    pub fn append(&self, task_name: &str, result: &AnomalyRecommendResult) -> HistoryResult<()> {
        let raw = serde_json::to_string(result).map_err(map_err!(Serialize))?;
        self.push_capped(&result_key(task_name), raw, HISTORY_CAP)
    }

    /// Read a task's history newest-first, skipping entries that no longer
    /// deserialize. A single corrupt entry must not hide the rest.
    pub fn history(&self, task_name: &str) -> HistoryResult<Vec<AnomalyRecommendResult>> {
        let entries = self.read_all(&result_key(task_name))?;
        let mut results = Vec::with_capacity(entries.len());
        for raw in entries {
            match serde_json::from_str(&raw) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(task = %task_name, error = %e, "skipping corrupt history entry");
                }
            }
        }
        Ok(results)
    }

    /// Prepend a raw entry to the list at `key`, truncating to the `cap`
    /// most recent entries. The write transaction serializes concurrent
    /// same-key appends.
    pub fn push_capped(&self, key: &str, raw: String, cap: usize) -> HistoryResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(RESULTS).map_err(map_err!(Table))?;

            let mut entries: Vec<String> = match table.get(key).map_err(map_err!(Read))? {
                Some(guard) => {
                    serde_json::from_slice(guard.value()).map_err(map_err!(Read))?
                }
                None => Vec::new(),
            };

            entries.insert(0, raw);
            entries.truncate(cap);

            let value = serde_json::to_vec(&entries).map_err(map_err!(Serialize))?;
            table
                .insert(key, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Read all raw entries at `key`, newest first. A missing key reads as
    /// an empty list.
    pub fn read_all(&self, key: &str) -> HistoryResult<Vec<String>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(RESULTS).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => serde_json::from_slice(guard.value()).map_err(map_err!(Read)),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use servo_core::ConfigRecommendResult;

    fn result_with_replicas(replicas: u32) -> AnomalyRecommendResult {
        let config = ConfigRecommendResult {
            max_num_seqs: 256,
            tensor_parallel_size: 1,
            gpu_memory_utilization: 0.9,
            replicas,
        };
        AnomalyRecommendResult {
            timestamp: 1_700_000_000_000 + i64::from(replicas),
            is_anomaly: true,
            recommend: config.clone(),
            current_config: config,
        }
    }

    #[test]
    fn append_and_read_back() {
        let store = HistoryStore::open_in_memory().unwrap();
        store.append("t1", &result_with_replicas(2)).unwrap();
        store.append("t1", &result_with_replicas(4)).unwrap();

        let history = store.history("t1").unwrap();
        assert_eq!(history.len(), 2);
        // Newest first.
        assert_eq!(history[0].recommend.replicas, 4);
        assert_eq!(history[1].recommend.replicas, 2);
    }

    #[test]
    fn history_is_capped_at_ten_newest() {
        let store = HistoryStore::open_in_memory().unwrap();
        for i in 1..=15 {
            store.append("t1", &result_with_replicas(i)).unwrap();
        }

        let history = store.history("t1").unwrap();
        assert_eq!(history.len(), HISTORY_CAP);
        let replicas: Vec<u32> = history.iter().map(|r| r.recommend.replicas).collect();
        assert_eq!(replicas, vec![15, 14, 13, 12, 11, 10, 9, 8, 7, 6]);
    }

    #[test]
    fn unknown_task_reads_empty() {
        let store = HistoryStore::open_in_memory().unwrap();
        assert!(store.history("nope").unwrap().is_empty());
    }

    #[test]
    fn corrupt_entry_is_skipped_not_fatal() {
        let store = HistoryStore::open_in_memory().unwrap();
        store.append("t1", &result_with_replicas(2)).unwrap();
        store
            .push_capped(&result_key("t1"), "{not valid json".to_string(), HISTORY_CAP)
            .unwrap();
        store.append("t1", &result_with_replicas(4)).unwrap();

        let history = store.history("t1").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].recommend.replicas, 4);
        assert_eq!(history[1].recommend.replicas, 2);
    }

    #[test]
    fn task_lists_are_independent() {
        let store = HistoryStore::open_in_memory().unwrap();
        store.append("t1", &result_with_replicas(2)).unwrap();
        store.append("t2", &result_with_replicas(3)).unwrap();

        assert_eq!(store.history("t1").unwrap().len(), 1);
        assert_eq!(store.history("t2").unwrap().len(), 1);
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.redb");

        {
            let store = HistoryStore::open(&path).unwrap();
            store.append("t1", &result_with_replicas(2)).unwrap();
        }

        let store = HistoryStore::open(&path).unwrap();
        assert_eq!(store.history("t1").unwrap().len(), 1);
    }
}
