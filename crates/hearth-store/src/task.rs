use std::collections::HashMap;
use std::rc::Rc;

use hearth_core::{Dispose, Signal};
use hearth_storage::{Snapshot, StoragePort};

use crate::persistent::{PersistOptions, PersistentValueStore};
use crate::{ConfigurationError, StoreResult};

/// Where a [`TaskStore`] keeps its state.
pub trait StateSlot<S> {
    fn get(&self) -> S;
    fn replace(&self, next: S) -> StoreResult<()>;
    fn reset(&self) -> StoreResult<()>;
    fn watch(&self, f: Box<dyn Fn(&S)>) -> Dispose;
}

/// In-memory slot; `reset` goes back to the value it was created with.
pub struct MemorySlot<S: 'static> {
    initial: S,
    state: Signal<S>,
}

impl<S: Clone + 'static> MemorySlot<S> {
    pub fn new(initial: S) -> Self {
        Self {
            state: Signal::new(initial.clone()),
            initial,
        }
    }
}

impl<S: Clone + 'static> StateSlot<S> for MemorySlot<S> {
    fn get(&self) -> S {
        self.state.get()
    }

    fn replace(&self, next: S) -> StoreResult<()> {
        self.state.set(next);
        Ok(())
    }

    fn reset(&self) -> StoreResult<()> {
        self.state.set(self.initial.clone());
        Ok(())
    }

    fn watch(&self, f: Box<dyn Fn(&S)>) -> Dispose {
        self.state.watch(f)
    }
}

impl StateSlot<Snapshot> for PersistentValueStore {
    fn get(&self) -> Snapshot {
        self.state()
    }

    fn replace(&self, next: Snapshot) -> StoreResult<()> {
        self.set(next)
    }

    fn reset(&self) -> StoreResult<()> {
        PersistentValueStore::reset(self)
    }

    fn watch(&self, f: Box<dyn Fn(&Snapshot)>) -> Dispose {
        self.subscribe(f)
    }
}

/// Raw state replacement handed to task handlers.
pub struct Setter<S: 'static>(Rc<dyn StateSlot<S>>);

impl<S> Clone for Setter<S> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<S> Setter<S> {
    /// Install `next` as the store's state (written through if persistent).
    pub fn set(&self, next: S) -> StoreResult<()> {
        self.0.replace(next)
    }
}

type TaskFn<S, P> = Rc<dyn Fn(&S, &Setter<S>, P) -> StoreResult<()>>;

/// Named handlers, fixed once built.
pub struct TaskRegistry<S: 'static, P: 'static = Snapshot> {
    tasks: HashMap<String, TaskFn<S, P>>,
}

impl<S: 'static, P: 'static> TaskRegistry<S, P> {
    pub fn builder() -> TaskRegistryBuilder<S, P> {
        TaskRegistryBuilder {
            tasks: HashMap::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Registered task names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tasks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

pub struct TaskRegistryBuilder<S: 'static, P: 'static> {
    tasks: HashMap<String, TaskFn<S, P>>,
}

impl<S: 'static, P: 'static> TaskRegistryBuilder<S, P> {
    /// Register `handler` under `name`. A repeated name replaces the earlier one.
    pub fn task(
        mut self,
        name: impl Into<String>,
        handler: impl Fn(&S, &Setter<S>, P) -> StoreResult<()> + 'static,
    ) -> Self {
        let name = name.into();
        if self.tasks.insert(name.clone(), Rc::new(handler)).is_some() {
            log::warn!("task `{name}` registered twice; keeping the later handler");
        }
        self
    }

    pub fn build(self) -> TaskRegistry<S, P> {
        TaskRegistry { tasks: self.tasks }
    }
}

/// Store driven by named imperative tasks instead of a reducer.
///
/// Each handler receives the current state, a [`Setter`], and the payload,
/// and decides the next state itself.
pub struct TaskStore<S: 'static, P: 'static = Snapshot> {
    slot: Rc<dyn StateSlot<S>>,
    registry: Rc<TaskRegistry<S, P>>,
}

impl<S, P> Clone for TaskStore<S, P> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl<S: Clone + 'static, P: 'static> TaskStore<S, P> {
    pub fn new(initial: S, registry: TaskRegistry<S, P>) -> Self {
        Self::with_shared(initial, Rc::new(registry))
    }

    pub(crate) fn with_shared(initial: S, registry: Rc<TaskRegistry<S, P>>) -> Self {
        Self {
            slot: Rc::new(MemorySlot::new(initial)),
            registry,
        }
    }

    pub fn state(&self) -> S {
        self.slot.get()
    }

    /// Look up `name` and hand it the state, setter, and `payload`.
    pub fn run_task(&self, name: &str, payload: P) -> StoreResult<()> {
        let Some(handler) = self.registry.tasks.get(name).cloned() else {
            log::error!("run_task: `{name}` is not registered");
            return Err(ConfigurationError::UnknownTask {
                name: name.to_string(),
            }
            .into());
        };
        log::debug!("run_task `{name}`");
        let state = self.slot.get();
        handler(&state, &Setter(self.slot.clone()), payload)
    }

    /// Back to the initial state (per the reset policy when persistent).
    pub fn reset(&self) -> StoreResult<()> {
        self.slot.reset()
    }

    pub fn tasks(&self) -> Vec<&str> {
        self.registry.names()
    }

    pub fn subscribe(&self, f: impl Fn(&S) + 'static) -> Dispose {
        self.slot.watch(Box::new(f))
    }
}

impl<P: 'static> TaskStore<Snapshot, P> {
    /// Task store whose state is written through to `key` on every set.
    pub fn persistent(
        port: impl StoragePort + 'static,
        key: impl Into<String>,
        initial: Snapshot,
        registry: TaskRegistry<Snapshot, P>,
        options: PersistOptions,
    ) -> StoreResult<Self> {
        Self::persistent_shared(Rc::new(port), key.into(), initial, Rc::new(registry), options)
    }

    pub(crate) fn persistent_shared(
        port: Rc<dyn StoragePort>,
        key: String,
        initial: Snapshot,
        registry: Rc<TaskRegistry<Snapshot, P>>,
        options: PersistOptions,
    ) -> StoreResult<Self> {
        let slot = PersistentValueStore::open_shared(port, key, initial, options)?;
        Ok(Self {
            slot: Rc::new(slot),
            registry,
        })
    }
}
