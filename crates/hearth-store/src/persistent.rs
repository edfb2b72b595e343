use std::rc::Rc;

use hearth_core::{Dispose, Signal};
use hearth_storage::{Retention, Snapshot, StoragePort, from_snapshot};
use serde::de::DeserializeOwned;

use crate::bootstrap::{self, Origin};
use crate::{Reducer, StoreError, StoreResult};

/// What `reset()` does to a persistent store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResetPolicy {
    /// Write back the snapshot captured at bootstrap; the entry stays present.
    #[default]
    Reseed,
    /// Remove the entry from storage; in-memory state becomes `null`.
    Clear,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PersistOptions {
    pub reset: ResetPolicy,
}

/// Snapshot held in memory and mirrored to one storage key.
struct Persisted {
    key: String,
    port: Rc<dyn StoragePort>,
    state: Signal<Snapshot>,
    initial: Snapshot,
    origin: Origin,
    options: PersistOptions,
}

impl Persisted {
    fn open(
        port: Rc<dyn StoragePort>,
        key: String,
        initial: Snapshot,
        options: PersistOptions,
    ) -> StoreResult<Self> {
        let boot = bootstrap::seed(&*port, &key, initial)?;
        Ok(Self {
            state: Signal::new(boot.snapshot.clone()),
            initial: boot.snapshot,
            origin: boot.origin,
            key,
            port,
            options,
        })
    }

    /// Write first; memory only advances once the backend accepted it.
    fn commit(&self, next: Snapshot) -> StoreResult<()> {
        if let Err(e) = self.port.write(&self.key, &next) {
            log::warn!("write-through rejected, state unchanged: {e}");
            return Err(e.into());
        }
        self.state.set(next);
        Ok(())
    }

    fn reset(&self) -> StoreResult<()> {
        log::info!("reset `{}` ({:?})", self.key, self.options.reset);
        match self.options.reset {
            ResetPolicy::Reseed => self.commit(self.initial.clone()),
            ResetPolicy::Clear => {
                self.port.remove(&self.key)?;
                self.state.set(Snapshot::Null);
                Ok(())
            }
        }
    }
}

macro_rules! persisted_accessors {
    () => {
        pub fn state(&self) -> Snapshot {
            self.core.state.get()
        }

        pub fn with_state<R>(&self, f: impl FnOnce(&Snapshot) -> R) -> R {
            self.core.state.with(f)
        }

        /// Current state decoded as `T`.
        pub fn state_as<T: DeserializeOwned>(&self) -> StoreResult<T> {
            self.core
                .state
                .with(from_snapshot::<T>)
                .map_err(|source| StoreError::Shape {
                    key: self.core.key.clone(),
                    source,
                })
        }

        /// Called with the new state after every committed change.
        pub fn subscribe(&self, f: impl Fn(&Snapshot) + 'static) -> Dispose {
            self.core.state.watch(f)
        }

        /// Apply the configured [`ResetPolicy`].
        pub fn reset(&self) -> StoreResult<()> {
            self.core.reset()
        }

        pub fn key(&self) -> &str {
            &self.core.key
        }

        pub fn origin(&self) -> Origin {
            self.core.origin
        }

        /// The snapshot this store started from.
        pub fn initial(&self) -> &Snapshot {
            &self.core.initial
        }

        pub fn retention(&self) -> Retention {
            self.core.port.retention()
        }
    };
}

/// Reducer store whose every dispatch is written through to storage.
pub struct PersistentReducerStore<A: 'static> {
    core: Rc<Persisted>,
    reducer: Rc<dyn Reducer<Snapshot, A>>,
}

impl<A> Clone for PersistentReducerStore<A> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
            reducer: self.reducer.clone(),
        }
    }
}

impl<A: 'static> PersistentReducerStore<A> {
    pub fn new(
        port: impl StoragePort + 'static,
        key: impl Into<String>,
        initial: Snapshot,
        reducer: impl Reducer<Snapshot, A>,
    ) -> StoreResult<Self> {
        Self::with_options(port, key, initial, reducer, PersistOptions::default())
    }

    pub fn with_options(
        port: impl StoragePort + 'static,
        key: impl Into<String>,
        initial: Snapshot,
        reducer: impl Reducer<Snapshot, A>,
        options: PersistOptions,
    ) -> StoreResult<Self> {
        Self::open_shared(Rc::new(port), key.into(), initial, Rc::new(reducer), options)
    }

    pub(crate) fn open_shared(
        port: Rc<dyn StoragePort>,
        key: String,
        initial: Snapshot,
        reducer: Rc<dyn Reducer<Snapshot, A>>,
        options: PersistOptions,
    ) -> StoreResult<Self> {
        Ok(Self {
            core: Rc::new(Persisted::open(port, key, initial, options)?),
            reducer,
        })
    }

    /// Reduce, persist, then commit. On a failed write nothing changes.
    pub fn dispatch(&self, action: A) -> StoreResult<()> {
        let next = self.core.state.with(|s| self.reducer.reduce(s, action));
        log::debug!("dispatch on `{}`", self.core.key);
        self.core.commit(next)
    }

    persisted_accessors!();
}

/// Single persisted value with write-through `set`.
#[derive(Clone)]
pub struct PersistentValueStore {
    core: Rc<Persisted>,
}

impl PersistentValueStore {
    pub fn new(
        port: impl StoragePort + 'static,
        key: impl Into<String>,
        initial: Snapshot,
    ) -> StoreResult<Self> {
        Self::with_options(port, key, initial, PersistOptions::default())
    }

    pub fn with_options(
        port: impl StoragePort + 'static,
        key: impl Into<String>,
        initial: Snapshot,
        options: PersistOptions,
    ) -> StoreResult<Self> {
        Self::open_shared(Rc::new(port), key.into(), initial, options)
    }

    pub(crate) fn open_shared(
        port: Rc<dyn StoragePort>,
        key: String,
        initial: Snapshot,
        options: PersistOptions,
    ) -> StoreResult<Self> {
        Ok(Self {
            core: Rc::new(Persisted::open(port, key, initial, options)?),
        })
    }

    pub fn set(&self, value: Snapshot) -> StoreResult<()> {
        log::debug!("set `{}`", self.core.key);
        self.core.commit(value)
    }

    /// Compute the next value from the current one, then `set` it.
    pub fn update(&self, f: impl FnOnce(&Snapshot) -> Snapshot) -> StoreResult<()> {
        let next = self.core.state.with(f);
        self.set(next)
    }

    persisted_accessors!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_storage::MemoryStorage;
    use serde_json::json;

    fn counter(state: &Snapshot, by: i64) -> Snapshot {
        let count = state["count"].as_i64().unwrap_or(0);
        json!({ "count": count + by })
    }

    #[test]
    fn every_dispatch_is_mirrored_to_storage() {
        let port = MemoryStorage::new();
        let store = PersistentReducerStore::new(port.clone(), "c", json!({"count": 0}), counter).unwrap();

        for by in [1, 5, -2] {
            store.dispatch(by).unwrap();
            assert_eq!(port.read("c").unwrap(), Some(store.state()));
        }
        assert_eq!(store.state(), json!({"count": 4}));
    }

    #[test]
    fn dispatch_from_subscriber_is_delivered_in_order() {
        let port = MemoryStorage::new();
        let store = PersistentReducerStore::new(port.clone(), "n", json!({"count": 0}), counter).unwrap();
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));

        let _bump = store.subscribe({
            let store = store.clone();
            move |s: &Snapshot| {
                if s["count"] == 1 {
                    store.dispatch(10).unwrap();
                }
            }
        });
        let _record = store.subscribe({
            let seen = seen.clone();
            move |s: &Snapshot| seen.borrow_mut().push(s["count"].as_i64().unwrap())
        });

        store.dispatch(1).unwrap();
        assert_eq!(*seen.borrow(), vec![1, 11]);
        assert_eq!(store.state(), json!({"count": 11}));
        assert_eq!(port.read("n").unwrap(), Some(json!({"count": 11})));
    }

    #[test]
    fn failed_write_leaves_state_alone() {
        let port = MemoryStorage::new();
        let store = PersistentValueStore::new(port.clone(), "v", json!({"name": "a"})).unwrap();
        let notified = Rc::new(std::cell::Cell::new(0));
        let _d = store.subscribe({
            let notified = notified.clone();
            move |_| notified.set(notified.get() + 1)
        });

        port.set_quota(Some(20));
        let err = store.set(json!({"name": "a much longer name than fits"})).unwrap_err();
        assert!(matches!(err, StoreError::Write(_)));
        assert_eq!(store.state(), json!({"name": "a"}));
        assert_eq!(port.read("v").unwrap(), Some(json!({"name": "a"})));
        assert_eq!(notified.get(), 0);
    }

    #[test]
    fn reseed_restores_bootstrap_snapshot_not_constructor_argument() {
        let port = MemoryStorage::new();
        port.write("v", &json!({"theme": "dark"})).unwrap();

        let store = PersistentValueStore::new(port.clone(), "v", json!({"theme": "light"})).unwrap();
        assert_eq!(store.origin(), Origin::Restored);
        store.set(json!({"theme": "blue"})).unwrap();

        store.reset().unwrap();
        assert_eq!(store.state(), json!({"theme": "dark"}));
        assert_eq!(port.read("v").unwrap(), Some(json!({"theme": "dark"})));
    }

    #[test]
    fn clear_policy_removes_entry() {
        let port = MemoryStorage::new();
        let store = PersistentValueStore::with_options(
            port.clone(),
            "v",
            json!(1),
            PersistOptions {
                reset: ResetPolicy::Clear,
            },
        )
        .unwrap();
        assert_eq!(store.state(), json!({"v": 1}));

        store.set(json!({"v": 2})).unwrap();
        store.reset().unwrap();
        assert_eq!(store.state(), Snapshot::Null);
        assert!(!port.contains("v"));

        store.reset().unwrap();
        assert_eq!(store.state(), Snapshot::Null);
    }

    #[test]
    fn typed_view_reports_shape_errors() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Prefs {
            volume: u8,
        }

        let store = PersistentValueStore::new(MemoryStorage::new(), "prefs", json!({"volume": 7})).unwrap();
        assert_eq!(store.state_as::<Prefs>().unwrap(), Prefs { volume: 7 });

        store.update(|_| json!({"volume": "loud"})).unwrap();
        let err = store.state_as::<Prefs>().unwrap_err();
        assert!(matches!(err, StoreError::Shape { ref key, .. } if key == "prefs"));
    }
}
