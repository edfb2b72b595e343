//! # Signals, scopes, and contexts
//!
//! `hearth-core` holds the small reactive pieces the stores in `hearth-store`
//! are built from:
//!
//! - `Signal<T>` — observable value cell with keyed subscriptions.
//! - `Dispose` — one-shot cleanup guard (e.g. "unsubscribe").
//! - `Scope` — owns cleanups for a region such as one provider mount.
//! - `Context` — explicit chain of frames used for provider scoping.
//!
//! ## Signals
//!
//! ```rust
//! use hearth_core::*;
//!
//! let count = signal(0);
//! count.set(1);
//! count.update(|v| *v += 1);
//! assert_eq!(count.get(), 2);
//! ```
//!
//! `watch` returns a `Dispose` that removes the subscriber again, which pairs
//! with `Scope` for mount-bound subscriptions:
//!
//! ```rust
//! use hearth_core::*;
//! use std::{cell::Cell, rc::Rc};
//!
//! let count = signal(0);
//! let seen = Rc::new(Cell::new(0));
//! let scope = Scope::new();
//!
//! count.watch({
//!     let seen = seen.clone();
//!     move |v| seen.set(*v)
//! })
//! .bind(&scope);
//!
//! count.set(3);
//! scope.dispose();
//! count.set(4);
//! assert_eq!(seen.get(), 3);
//! ```
//!
//! Everything here is single-threaded (`Rc`/`RefCell`).

pub mod context;
pub mod effects;
pub mod error;
pub mod prelude;
pub mod scope;
pub mod signal;

pub use context::*;
pub use effects::*;
pub use error::*;
pub use scope::*;
pub use signal::*;
