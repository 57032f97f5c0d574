//! Settings persistence
//!
//! A small key-value store abstraction over whatever the embedder provides.
//! Values are JSON strings; readers fall back to a default on any failure
//! rather than letting storage problems reach the playback path.

use std::collections::HashMap;
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Storage failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Backend the engine persists settings through.
pub trait KeyValueStore: Debug {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory store, with switchable failure for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored string, bypassing JSON decoding.
    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|s| s.as_str())
    }

    /// Store a raw string, bypassing JSON encoding.
    pub fn put_raw(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.fail_reads {
            return Err(StoreError::Backend("injected read failure".to_string()));
        }
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Backend("injected write failure".to_string()));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Read and decode one key, falling back to `default` if the key is absent,
/// the backend fails, or the stored value does not decode.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str, default: T) -> T {
    match store.load(key) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("discarding unreadable value for {key}: {e}");
                default
            }
        },
        Ok(None) => default,
        Err(e) => {
            tracing::warn!("storage read failed for {key}: {e}");
            default
        }
    }
}

/// Encode and write one key. Failures are logged and swallowed; persistence
/// must never break playback.
pub fn save_json<T: Serialize + ?Sized>(store: &mut dyn KeyValueStore, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(raw) => {
            if let Err(e) = store.save(key, &raw) {
                tracing::warn!("storage write failed for {key}: {e}");
            }
        }
        Err(e) => tracing::warn!("could not encode value for {key}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut store = MemoryStore::new();
        save_json(&mut store, "tempo-playback-rate", &1.75);
        assert_eq!(load_json(&store, "tempo-playback-rate", 1.0), 1.75);
    }

    #[test]
    fn test_missing_key_yields_default() {
        let store = MemoryStore::new();
        assert_eq!(load_json(&store, "tempo-playback-rate", 1.0), 1.0);
    }

    #[test]
    fn test_backend_failure_yields_default() {
        let mut store = MemoryStore::new();
        save_json(&mut store, "tempo-playback-rate", &2.0);
        store.fail_reads = true;
        assert_eq!(load_json(&store, "tempo-playback-rate", 1.0), 1.0);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let mut store = MemoryStore::new();
        store.fail_writes = true;
        save_json(&mut store, "tempo-playback-rate", &2.0);
        assert_eq!(store.get_raw("tempo-playback-rate"), None);
    }
}
