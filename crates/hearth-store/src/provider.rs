//! Providers hand one store instance to everything run inside a mount.
//!
//! `create_provider` returns a `(Provider, Accessor)` pair sharing a private
//! [`ContextKey`]. Each `Provider::mount` builds a fresh store, binds it in a
//! child [`Context`] frame, and disposes the mount's [`Scope`] when the
//! closure returns. Nested mounts of the same provider shadow outer ones.

use std::marker::PhantomData;
use std::rc::Rc;

use hearth_core::{Context, ContextKey, MisuseError, Scope};
use hearth_storage::{Snapshot, StoragePort};

use crate::persistent::{PersistOptions, PersistentReducerStore};
use crate::{KeyedMapStore, Reducer, ReducerStore, StoreResult, TaskRegistry, TaskStore};

/// Storage key used by [`create_persistent_data_store`].
pub const DATA_STORE_KEY: &str = "datastore";
/// Storage key used by [`create_persistent_task_runner`].
pub const TASK_STORE_KEY: &str = "taskstore";

#[derive(Clone)]
struct Mounted<S> {
    store: S,
    scope: Scope,
}

pub struct Provider<S: 'static> {
    key: ContextKey,
    factory: Rc<dyn Fn() -> StoreResult<S>>,
}

impl<S> Clone for Provider<S> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            factory: self.factory.clone(),
        }
    }
}

impl<S: Clone + 'static> Provider<S> {
    /// Build one store and run `f` with it in scope.
    ///
    /// Construction errors (e.g. a failed bootstrap) are returned before `f`
    /// runs. Cleanups registered on the mount's scope run when `f` returns.
    pub fn mount<R>(&self, parent: &Context<'_>, f: impl FnOnce(&Context<'_>) -> R) -> StoreResult<R> {
        let store = (self.factory)()?;
        let scope = Scope::new();
        log::trace!("mount {:?}", self.key);

        struct Unmount(Scope);
        impl Drop for Unmount {
            fn drop(&mut self) {
                self.0.dispose();
            }
        }
        let _unmount = Unmount(scope.clone());

        Ok(parent.with_frame(self.key, Mounted { store, scope }, f))
    }

    pub fn name(&self) -> &'static str {
        self.key.name()
    }
}

pub struct Accessor<S: 'static> {
    key: ContextKey,
    _store: PhantomData<fn() -> S>,
}

impl<S> Clone for Accessor<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for Accessor<S> {}

impl<S: Clone + 'static> Accessor<S> {
    /// The store of the nearest enclosing mount.
    ///
    /// Calling this outside any mount is a [`MisuseError`].
    pub fn get(&self, cx: &Context<'_>) -> Result<S, MisuseError> {
        cx.require::<Mounted<S>>(self.key).map(|m| m.store)
    }

    /// Cleanup scope of the nearest enclosing mount.
    pub fn scope(&self, cx: &Context<'_>) -> Result<Scope, MisuseError> {
        cx.require::<Mounted<S>>(self.key).map(|m| m.scope)
    }
}

/// Pair a store factory with a provider and its accessor.
pub fn create_provider<S: Clone + 'static>(
    name: &'static str,
    factory: impl Fn() -> StoreResult<S> + 'static,
) -> (Provider<S>, Accessor<S>) {
    let key = ContextKey::new(name);
    (
        Provider {
            key,
            factory: Rc::new(factory),
        },
        Accessor {
            key,
            _store: PhantomData,
        },
    )
}

/// In-memory reducer store, one per mount.
pub fn create_data_store<S: Clone + 'static, A: 'static>(
    initial: S,
    reducer: impl Reducer<S, A>,
) -> (Provider<ReducerStore<S, A>>, Accessor<ReducerStore<S, A>>) {
    let reducer: Rc<dyn Reducer<S, A>> = Rc::new(reducer);
    create_provider("data store", move || {
        Ok(ReducerStore::with_shared(initial.clone(), reducer.clone()))
    })
}

/// Reducer store persisted under [`DATA_STORE_KEY`]; each mount bootstraps
/// from whatever is stored there.
pub fn create_persistent_data_store<A: 'static>(
    port: impl StoragePort + 'static,
    initial: Snapshot,
    reducer: impl Reducer<Snapshot, A>,
    options: PersistOptions,
) -> (Provider<PersistentReducerStore<A>>, Accessor<PersistentReducerStore<A>>) {
    let port: Rc<dyn StoragePort> = Rc::new(port);
    let reducer: Rc<dyn Reducer<Snapshot, A>> = Rc::new(reducer);
    create_provider("persistent data store", move || {
        PersistentReducerStore::open_shared(
            port.clone(),
            DATA_STORE_KEY.to_string(),
            initial.clone(),
            reducer.clone(),
            options,
        )
    })
}

/// In-memory task runner, one per mount.
pub fn create_task_runner<S: Clone + 'static, P: 'static>(
    initial: S,
    registry: TaskRegistry<S, P>,
) -> (Provider<TaskStore<S, P>>, Accessor<TaskStore<S, P>>) {
    let registry = Rc::new(registry);
    create_provider("task runner", move || {
        Ok(TaskStore::with_shared(initial.clone(), registry.clone()))
    })
}

/// Task runner persisted under [`TASK_STORE_KEY`].
pub fn create_persistent_task_runner<P: 'static>(
    port: impl StoragePort + 'static,
    initial: Snapshot,
    registry: TaskRegistry<Snapshot, P>,
    options: PersistOptions,
) -> (Provider<TaskStore<Snapshot, P>>, Accessor<TaskStore<Snapshot, P>>) {
    let port: Rc<dyn StoragePort> = Rc::new(port);
    let registry = Rc::new(registry);
    create_provider("persistent task runner", move || {
        TaskStore::persistent_shared(
            port.clone(),
            TASK_STORE_KEY.to_string(),
            initial.clone(),
            registry.clone(),
            options,
        )
    })
}

/// Shared keyed map, one per mount. A non-object `initial` is rejected here,
/// not at mount time.
pub fn create_global_map(
    initial: Snapshot,
) -> StoreResult<(Provider<KeyedMapStore>, Accessor<KeyedMapStore>)> {
    let seed = KeyedMapStore::new(initial)?.map();
    Ok(create_provider("global map", move || {
        Ok(KeyedMapStore::from_map(seed.clone()))
    }))
}
