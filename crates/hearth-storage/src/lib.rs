//! Snapshot storage for Hearth stores.
//!
//! A [`StoragePort`] is a flat namespace of string keys mapping to JSON
//! documents ([`Snapshot`]s), readable, writable, and removable one key at a
//! time. Stores never touch a backend directly; they are handed a port at
//! construction.
//!
//! Two adapters ship with the crate:
//!
//! - [`MemoryStorage`] — session-scoped, lives as long as its handle.
//! - [`FileStorage`] — durable, one document per key in a directory.
//!
//! There is no schema versioning here. A version field inside the snapshot is
//! an application concern.

pub mod codec;
pub mod error;
pub mod file;
pub mod memory;
pub mod port;

pub use codec::{from_snapshot, to_snapshot};
pub use error::{ReadError, WriteError};
pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use port::{Retention, StoragePort};

/// A store's state as persisted: any JSON value.
pub type Snapshot = serde_json::Value;
