pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("store codec: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("store poisoned lock")]
    Poisoned,
}

/// Key-value persistence contract shared by the performance tracker and the
/// prediction tracker. Backends are interchangeable; the core never
/// special-cases one.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// All entries whose key starts with `prefix`, in key order.
    fn query_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exercise(store: &dyn KvStore) {
        assert!(store.get("perf:missing").unwrap().is_none());

        store.set("perf:fvg", json!({"wins": 3})).unwrap();
        store.set("perf:sweep", json!({"wins": 1})).unwrap();
        store.set("pred:BTC:1", json!({"outcome": "pending"})).unwrap();

        let got = store.get("perf:fvg").unwrap().unwrap();
        assert_eq!(got["wins"], 3);

        let perf = store.query_prefix("perf:").unwrap();
        assert_eq!(perf.len(), 2);
        assert_eq!(perf[0].0, "perf:fvg");

        // Overwrite is last-writer-wins
        store.set("perf:fvg", json!({"wins": 4})).unwrap();
        assert_eq!(store.get("perf:fvg").unwrap().unwrap()["wins"], 4);
    }

    #[test]
    fn memory_store_contract() {
        let store = MemoryStore::new();
        exercise(&store);
    }

    #[test]
    fn json_file_store_contract() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = JsonFileStore::open(&path).unwrap();
        exercise(&store);

        // Reopen and confirm the data survived
        drop(store);
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("perf:fvg").unwrap().unwrap()["wins"], 4);
    }
}
