use hearth_storage::{ReadError, Snapshot, StoragePort};
use serde_json::Map;

use crate::StoreResult;

/// Where a store's first snapshot came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    /// An existing entry was read back.
    Restored,
    /// Nothing was stored; the default was written.
    Seeded,
    /// The stored entry was malformed and has been replaced by the default.
    Healed,
}

#[derive(Debug)]
pub struct Bootstrap {
    pub snapshot: Snapshot,
    pub origin: Origin,
    /// The parse failure that was recovered from, for `Origin::Healed`.
    pub healed: Option<ReadError>,
}

/// Default snapshot for `key`: objects and arrays as-is, anything else
/// wrapped as `{key: initial}`.
pub fn default_snapshot(key: &str, initial: Snapshot) -> Snapshot {
    match initial {
        Snapshot::Object(_) | Snapshot::Array(_) => initial,
        other => {
            let mut m = Map::new();
            m.insert(key.to_string(), other);
            Snapshot::Object(m)
        }
    }
}

/// Load the snapshot stored under `key`, or write and return the default.
///
/// An existing entry is returned untouched and nothing is written. A
/// malformed entry is treated as absent and overwritten; any other read
/// failure, and a failed seed write, is returned.
pub fn seed<P>(port: &P, key: &str, initial: Snapshot) -> StoreResult<Bootstrap>
where
    P: StoragePort + ?Sized,
{
    let healed = match port.read(key) {
        Ok(Some(snapshot)) => {
            log::debug!("restored `{key}` from {:?} storage", port.retention());
            return Ok(Bootstrap {
                snapshot,
                origin: Origin::Restored,
                healed: None,
            });
        }
        Ok(None) => None,
        Err(e @ ReadError::Malformed { .. }) => {
            log::warn!("{e}; reseeding");
            Some(e)
        }
        Err(e) => return Err(e.into()),
    };

    let snapshot = default_snapshot(key, initial);
    port.write(key, &snapshot)?;
    log::info!("seeded `{key}` in {:?} storage", port.retention());

    Ok(Bootstrap {
        snapshot,
        origin: if healed.is_some() {
            Origin::Healed
        } else {
            Origin::Seeded
        },
        healed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_storage::MemoryStorage;
    use serde_json::json;

    #[test]
    fn primitives_are_wrapped_under_their_key() {
        assert_eq!(default_snapshot("n", json!(3)), json!({"n": 3}));
        assert_eq!(default_snapshot("s", json!("hi")), json!({"s": "hi"}));
        assert_eq!(default_snapshot("z", json!(null)), json!({"z": null}));
        assert_eq!(default_snapshot("o", json!({"a": 1})), json!({"a": 1}));
        assert_eq!(default_snapshot("l", json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn seed_is_idempotent_and_writes_once() {
        let port = MemoryStorage::new();
        let first = seed(&port, "k", json!({"count": 0})).unwrap();
        let second = seed(&port, "k", json!({"count": 99})).unwrap();

        assert_eq!(first.origin, Origin::Seeded);
        assert_eq!(second.origin, Origin::Restored);
        assert_eq!(first.snapshot, second.snapshot);
        assert_eq!(port.write_count(), 1);
    }

    #[test]
    fn malformed_entry_is_reseeded() {
        let port = MemoryStorage::new();
        port.insert_raw("k", "{\"count\":");

        let b = seed(&port, "k", json!(5)).unwrap();
        assert_eq!(b.origin, Origin::Healed);
        assert!(b.healed.is_some());
        assert_eq!(b.snapshot, json!({"k": 5}));
        assert_eq!(port.read("k").unwrap(), Some(json!({"k": 5})));
    }

    #[test]
    fn stored_null_counts_as_absent() {
        let port = MemoryStorage::new();
        port.insert_raw("k", "null");
        let b = seed(&port, "k", json!({"x": 1})).unwrap();
        assert_eq!(b.origin, Origin::Seeded);
    }

    #[test]
    fn failed_seed_write_surfaces() {
        let port = MemoryStorage::with_quota(4);
        let err = seed(&port, "datastore", json!({"count": 0})).unwrap_err();
        assert!(matches!(err, crate::StoreError::Write(_)));
        assert!(!port.contains("datastore"));
    }
}
