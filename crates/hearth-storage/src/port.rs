use std::rc::Rc;
use std::sync::Arc;

use crate::{ReadError, Snapshot, WriteError};

/// How long a backend keeps its entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Retention {
    /// Survives process restarts.
    Durable,
    /// Lives as long as the backend handle (one "session").
    Session,
}

/// Synchronous key/value snapshot backend.
///
/// Implementations must satisfy:
/// - `read` of a key that was never written, or was removed, is `Ok(None)`.
/// - A stored document that does not parse is `ReadError::Malformed`, never a panic.
/// - A stored JSON `null` reads as absent.
/// - `remove` of an absent key succeeds.
/// - Writes to the same key are last-write-wins.
pub trait StoragePort {
    fn read(&self, key: &str) -> Result<Option<Snapshot>, ReadError>;

    fn write(&self, key: &str, snapshot: &Snapshot) -> Result<(), WriteError>;

    fn remove(&self, key: &str) -> Result<(), WriteError>;

    fn retention(&self) -> Retention;
}

impl<P: StoragePort + ?Sized> StoragePort for Rc<P> {
    fn read(&self, key: &str) -> Result<Option<Snapshot>, ReadError> {
        (**self).read(key)
    }
    fn write(&self, key: &str, snapshot: &Snapshot) -> Result<(), WriteError> {
        (**self).write(key, snapshot)
    }
    fn remove(&self, key: &str) -> Result<(), WriteError> {
        (**self).remove(key)
    }
    fn retention(&self) -> Retention {
        (**self).retention()
    }
}

impl<P: StoragePort + ?Sized> StoragePort for Arc<P> {
    fn read(&self, key: &str) -> Result<Option<Snapshot>, ReadError> {
        (**self).read(key)
    }
    fn write(&self, key: &str, snapshot: &Snapshot) -> Result<(), WriteError> {
        (**self).write(key, snapshot)
    }
    fn remove(&self, key: &str) -> Result<(), WriteError> {
        (**self).remove(key)
    }
    fn retention(&self) -> Retention {
        (**self).retention()
    }
}
