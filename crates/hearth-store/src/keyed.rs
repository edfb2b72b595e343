use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use hearth_core::{Dispose, Signal};
use hearth_storage::Snapshot;

use crate::{ConfigurationError, StoreResult};

/// Immutable key -> value map. Updates produce a new `MapState`.
///
/// Every update copies the whole map, which is fine for the small maps this
/// is meant for and gets linearly slower as the map grows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapState(Rc<HashMap<String, Snapshot>>);

impl MapState {
    pub fn get(&self, key: &str) -> Option<&Snapshot> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Snapshot)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// A copy of this map with `key` set to `value`; `self` is untouched.
    pub fn with(&self, key: impl Into<String>, value: Snapshot) -> MapState {
        let mut next = (*self.0).clone();
        next.insert(key.into(), value);
        MapState(Rc::new(next))
    }

    /// Both handles refer to the same underlying map.
    pub fn ptr_eq(&self, other: &MapState) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot::Object(self.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

impl FromIterator<(String, Snapshot)> for MapState {
    fn from_iter<I: IntoIterator<Item = (String, Snapshot)>>(iter: I) -> Self {
        MapState(Rc::new(iter.into_iter().collect()))
    }
}

fn kind_of(v: &Snapshot) -> &'static str {
    match v {
        Snapshot::Null => "null",
        Snapshot::Bool(_) => "a boolean",
        Snapshot::Number(_) => "a number",
        Snapshot::String(_) => "a string",
        Snapshot::Array(_) => "an array",
        Snapshot::Object(_) => "an object",
    }
}

/// Shared map-valued store with per-key views.
#[derive(Clone)]
pub struct KeyedMapStore {
    state: Signal<MapState>,
}

impl KeyedMapStore {
    /// `initial` must be a JSON object; its fields become the entries.
    pub fn new(initial: Snapshot) -> StoreResult<Self> {
        match initial {
            Snapshot::Object(fields) => Ok(Self::from_map(fields.into_iter().collect())),
            other => Err(ConfigurationError::NotAMap {
                found: kind_of(&other),
            }
            .into()),
        }
    }

    pub fn from_map(map: MapState) -> Self {
        Self {
            state: Signal::new(map),
        }
    }

    /// The current map. Later updates never change the returned value.
    pub fn map(&self) -> MapState {
        self.state.get()
    }

    pub fn get(&self, key: &str) -> Option<Snapshot> {
        self.state.with(|m| m.get(key).cloned())
    }

    /// Replace the map with a copy where `key` maps to `value`.
    pub fn update_map(&self, key: impl Into<String>, value: Snapshot) {
        let key = key.into();
        log::debug!("update_map `{key}`");
        let next = self.state.with(|m| m.with(key, value));
        self.state.set(next);
    }

    /// Open a local view of `key`, seeded from the map as it is right now.
    ///
    /// The view is not refreshed when someone else updates the same key;
    /// open a new view (or `subscribe`) to observe that.
    pub fn use_key(&self, key: impl Into<String>) -> KeyView {
        let key = key.into();
        let value = self.get(&key).unwrap_or(Snapshot::Null);
        KeyView {
            key,
            local: RefCell::new(value),
            store: self.clone(),
        }
    }

    pub fn subscribe(&self, f: impl Fn(&MapState) + 'static) -> Dispose {
        self.state.watch(f)
    }
}

/// One consumer's mirror of a single map entry.
pub struct KeyView {
    key: String,
    local: RefCell<Snapshot>,
    store: KeyedMapStore,
}

impl KeyView {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Snapshot {
        self.local.borrow().clone()
    }

    /// Set the local mirror, and push to the shared map only if the map
    /// holds something different for this key. Returns whether it pushed.
    pub fn update_value(&self, value: Snapshot) -> bool {
        let changed = self.store.state.with(|m| m.get(&self.key) != Some(&value));
        *self.local.borrow_mut() = value.clone();
        if changed {
            self.store.update_map(self.key.clone(), value);
        }
        changed
    }
}
