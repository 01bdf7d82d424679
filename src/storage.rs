//! Persistent key-value storage used for attribution fields and sent-event records.
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use serde::{de::DeserializeOwned, Serialize};

/// A synchronous string key-value store with browser local storage semantics: string keys,
/// string values, no TTL, and values survive for the lifetime of the store.
///
/// Implement this trait to back the SDK with `window.localStorage` (e.g., through `web-sys`), a
/// file, or any other persistent storage.
pub trait KeyValueStore {
    /// Get the value stored under `key`. Returns `None` if the key is absent.
    fn get(&self, key: &str) -> Option<String>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str);
    /// Remove `key` from the store.
    fn remove(&self, key: &str);
}

/// `InMemoryStore` is a thread-safe (`Sync`) in-memory [`KeyValueStore`].
///
/// State is lost when the store is dropped, so this is mostly useful for tests and
/// short-lived processes.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        InMemoryStore::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        // Err() is possible only if the lock is poisoned (writer panicked while holding the
        // lock), which should never happen. Still, using .ok()? here to not crash the app.
        let values = self.values.read().ok()?;
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.to_owned(), value.to_owned());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut values) = self.values.write() {
            values.remove(key);
        }
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value)
    }
    fn remove(&self, key: &str) {
        (**self).remove(key)
    }
}

/// A [`KeyValueStore`] handle scoped to a key namespace.
///
/// Every key written by the SDK is `"<namespace>.<name>"`.
#[derive(Clone)]
pub(crate) struct Storage {
    store: Arc<dyn KeyValueStore + Send + Sync>,
    namespace: Arc<str>,
}

impl Storage {
    pub fn new(store: Arc<dyn KeyValueStore + Send + Sync>, namespace: &str) -> Storage {
        Storage {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn key(&self, name: &str) -> String {
        format!("{}.{}", self.namespace, name)
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.store.get(&self.key(name))
    }

    pub fn set(&self, name: &str, value: &str) {
        self.store.set(&self.key(name), value)
    }

    /// Read and decode a JSON value. Values that fail to parse are reported as absent.
    pub fn get_json<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let raw = self.get(name)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!(target: "attribution",
                           key:display = self.key(name);
                           "ignoring corrupt stored value: {}", err);
                None
            }
        }
    }

    /// Encode `value` as JSON and store it.
    pub fn set_json<T: Serialize>(&self, name: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(name, &raw),
            Err(err) => {
                log::warn!(target: "attribution",
                           key:display = self.key(name);
                           "failed to encode value for storage: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::{InMemoryStore, KeyValueStore, Storage};

    #[test]
    fn can_set_value_from_another_thread() {
        let store = Arc::new(InMemoryStore::new());

        assert!(store.get("key").is_none());

        {
            let store = store.clone();
            let _ = std::thread::spawn(move || {
                store.set("key", "value");
            })
            .join();
        }

        assert_eq!(store.get("key").as_deref(), Some("value"));
    }

    #[test]
    fn remove_deletes_key() {
        let store = InMemoryStore::new();
        store.set("key", "value");
        store.remove("key");
        assert!(store.get("key").is_none());
    }

    #[test]
    fn empty_string_is_not_absent() {
        let store = InMemoryStore::new();
        store.set("key", "");
        assert_eq!(store.get("key").as_deref(), Some(""));
    }

    #[test]
    fn storage_prefixes_keys_with_namespace() {
        let store = Arc::new(InMemoryStore::new());
        let storage = Storage::new(store.clone(), "ns");

        storage.set("tracking_id", "abc");

        assert_eq!(store.get("ns.tracking_id").as_deref(), Some("abc"));
        assert_eq!(storage.get("tracking_id").as_deref(), Some("abc"));
    }

    #[test]
    fn corrupt_json_is_treated_as_absent() {
        let store = Arc::new(InMemoryStore::new());
        let storage = Storage::new(store.clone(), "ns");

        store.set("ns.record", "{not json");

        assert_eq!(storage.get_json::<serde_json::Value>("record"), None);
    }

    #[test]
    fn json_values_are_stored_as_strings() {
        let store = Arc::new(InMemoryStore::new());
        let storage = Storage::new(store.clone(), "ns");

        storage.set_json("record", &json!({"a": 1}));

        assert_eq!(store.get("ns.record").as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(
            storage.get_json::<serde_json::Value>("record"),
            Some(json!({"a": 1}))
        );
    }
}
