//! # Persistent stores
//!
//! Stores that bootstrap from a [`StoragePort`](hearth_storage::StoragePort)
//! and write every change back through it, plus two in-memory companions.
//!
//! - [`PersistentReducerStore`] — reducer-driven; `dispatch` writes through.
//! - [`PersistentValueStore`] — single value; `set` writes through.
//! - [`ReducerStore`] — the same reducer model without persistence.
//! - [`KeyedMapStore`] — immutable map state with per-key [`KeyView`]s.
//! - [`TaskStore`] — named imperative handlers in a [`TaskRegistry`].
//!
//! ## Write-through
//!
//! ```rust
//! use hearth_storage::{MemoryStorage, StoragePort};
//! use hearth_store::*;
//! use serde_json::{Value, json};
//!
//! let port = MemoryStorage::new();
//! let store = PersistentReducerStore::new(
//!     port.clone(),
//!     "datastore",
//!     json!({"count": 0}),
//!     |s: &Value, _inc: ()| json!({"count": s["count"].as_i64().unwrap_or(0) + 1}),
//! )?;
//!
//! store.dispatch(())?;
//! assert_eq!(store.state(), json!({"count": 1}));
//! assert_eq!(port.read("datastore")?, Some(json!({"count": 1})));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! A write the backend rejects is returned as [`StoreError::Write`] and the
//! in-memory state stays where it was. The one error that heals itself is a
//! malformed stored document found at bootstrap: it is logged and replaced
//! with the default snapshot (see [`bootstrap::seed`]).
//!
//! ## Providers
//!
//! [`provider`] pairs a store factory with an accessor. Stores are found
//! through an explicit [`Context`](hearth_core::Context), never through
//! globals:
//!
//! ```rust
//! use hearth_core::Context;
//! use hearth_store::provider::create_data_store;
//!
//! let (provider, use_store) = create_data_store(0i32, |s: &i32, by: i32| s + by);
//!
//! provider.mount(&Context::root(), |cx| {
//!     let store = use_store.get(cx).unwrap();
//!     store.dispatch(2);
//!     assert_eq!(store.state(), 2);
//! })?;
//!
//! assert!(use_store.get(&Context::root()).is_err());
//! # Ok::<(), hearth_store::StoreError>(())
//! ```
//!
//! All stores are single-threaded; every operation runs to completion on the
//! calling thread.

pub mod bootstrap;
pub mod error;
pub mod keyed;
pub mod persistent;
pub mod provider;
pub mod reducer;
pub mod task;

pub use bootstrap::{Bootstrap, Origin};
pub use error::{ConfigurationError, StoreError, StoreResult};
pub use keyed::{KeyView, KeyedMapStore, MapState};
pub use persistent::{PersistOptions, PersistentReducerStore, PersistentValueStore, ResetPolicy};
pub use provider::{Accessor, Provider, create_provider};
pub use reducer::{Reducer, ReducerStore, StateHolder};
pub use task::{MemorySlot, Setter, StateSlot, TaskRegistry, TaskRegistryBuilder, TaskStore};
