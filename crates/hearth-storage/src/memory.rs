use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::codec::{decode, encode};
use crate::{ReadError, Retention, Snapshot, StoragePort, WriteError};

/// Session-scoped backend: entries live as long as any clone of the handle.
///
/// Documents are kept JSON-encoded, so every write goes through the same
/// round-trip a durable backend would. An optional byte quota (keys plus
/// documents) makes writes fail the way browser storage does when full.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    entries: HashMap<String, String>,
    quota: Option<usize>,
    writes: usize,
}

impl MemoryInner {
    fn used_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes that would push the total size past `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        let storage = Self::default();
        storage.inner.lock().quota = Some(bytes);
        storage
    }

    pub fn set_quota(&self, bytes: Option<usize>) {
        self.inner.lock().quota = bytes;
    }

    /// Raw stored document, as an out-of-band observer would see it.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.lock().entries.get(key).cloned()
    }

    /// Store a document without validation, e.g. to simulate corruption.
    pub fn insert_raw(&self, key: impl Into<String>, raw: impl Into<String>) {
        self.inner.lock().entries.insert(key.into(), raw.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Drop every entry; later reads see them as absent.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }

    /// Successful writes since creation.
    pub fn write_count(&self) -> usize {
        self.inner.lock().writes
    }
}

impl StoragePort for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<Snapshot>, ReadError> {
        let raw = self.inner.lock().entries.get(key).cloned();
        match raw {
            Some(raw) => decode(key, raw.as_bytes()),
            None => Ok(None),
        }
    }

    fn write(&self, key: &str, snapshot: &Snapshot) -> Result<(), WriteError> {
        let doc = encode(key, snapshot)?;
        let mut inner = self.inner.lock();
        if let Some(quota) = inner.quota {
            let available = quota.saturating_sub(inner.used_without(key));
            let requested = key.len() + doc.len();
            if requested > available {
                log::warn!("session storage full: `{key}` needs {requested} of {available} bytes");
                return Err(WriteError::QuotaExceeded {
                    key: key.to_string(),
                    requested,
                    available,
                });
            }
        }
        inner.entries.insert(key.to_string(), doc);
        inner.writes += 1;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), WriteError> {
        self.inner.lock().entries.remove(key);
        Ok(())
    }

    fn retention(&self) -> Retention {
        Retention::Session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_then_present_then_removed() {
        let s = MemoryStorage::new();
        assert_eq!(s.read("a").unwrap(), None);

        s.write("a", &json!({"x": 1})).unwrap();
        assert_eq!(s.read("a").unwrap(), Some(json!({"x": 1})));
        assert_eq!(s.raw("a").as_deref(), Some(r#"{"x":1}"#));

        s.remove("a").unwrap();
        s.remove("a").unwrap();
        assert_eq!(s.read("a").unwrap(), None);
    }

    #[test]
    fn clones_share_entries() {
        let a = MemoryStorage::new();
        let b = a.clone();
        a.write("k", &json!([1, 2])).unwrap();
        assert_eq!(b.read("k").unwrap(), Some(json!([1, 2])));
        assert_eq!(b.write_count(), 1);
    }

    #[test]
    fn quota_rejects_oversized_write_and_keeps_old_value() {
        let s = MemoryStorage::with_quota(16);
        s.write("k", &json!({"a": 1})).unwrap();

        let err = s.write("k", &json!({"a": "far too long for the quota"})).unwrap_err();
        assert!(matches!(err, WriteError::QuotaExceeded { .. }));
        assert_eq!(s.read("k").unwrap(), Some(json!({"a": 1})));
    }

    #[test]
    fn overwriting_does_not_count_old_value_against_quota() {
        // "k" + {"a":1} is 8 bytes; rewriting it must not need 16.
        let s = MemoryStorage::with_quota(10);
        s.write("k", &json!({"a": 1})).unwrap();
        s.write("k", &json!({"a": 2})).unwrap();
    }

    #[test]
    fn corrupted_entry_reports_malformed() {
        let s = MemoryStorage::new();
        s.insert_raw("k", "{oops");
        assert!(matches!(s.read("k"), Err(ReadError::Malformed { .. })));
    }
}
