//! # Scoped values
//!
//! A [`Context`] is an explicit chain of frames. Each frame binds values to
//! [`ContextKey`]s; lookups walk from the innermost frame outwards, so a frame
//! shadows any outer binding of the same key for everything run inside it.
//!
//! Contexts are passed by reference down the call graph instead of living in
//! thread-local storage:
//!
//! ```rust
//! use hearth_core::*;
//!
//! let theme = ContextKey::new("theme");
//! let root = Context::root();
//!
//! root.with_frame(theme, "dark", |cx| {
//!     assert_eq!(cx.lookup::<&str>(theme), Some("dark"));
//!     cx.with_frame(theme, "light", |inner| {
//!         assert_eq!(inner.lookup::<&str>(theme), Some("light"));
//!     });
//!     assert_eq!(cx.lookup::<&str>(theme), Some("dark"));
//! });
//!
//! assert!(root.require::<&str>(theme).is_err());
//! ```

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use crate::MisuseError;

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Identity of one kind of scoped value. Two keys created with the same
/// name are still distinct.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextKey {
    id: u64,
    name: &'static str,
}

impl ContextKey {
    pub fn new(name: &'static str) -> Self {
        Self {
            id: NEXT_KEY.fetch_add(1, Ordering::Relaxed),
            name,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContextKey({}#{})", self.name, self.id)
    }
}

type Frame = SmallVec<[(ContextKey, Rc<dyn Any>); 2]>;

pub struct Context<'a> {
    parent: Option<&'a Context<'a>>,
    frame: Frame,
}

impl Context<'static> {
    /// An empty context with no bindings.
    pub fn root() -> Self {
        Self {
            parent: None,
            frame: SmallVec::new(),
        }
    }
}

impl<'a> Context<'a> {
    /// Run `f` with a child frame binding `key` to `value`.
    pub fn with_frame<T: 'static, R>(
        &self,
        key: ContextKey,
        value: T,
        f: impl FnOnce(&Context<'_>) -> R,
    ) -> R {
        let mut frame = Frame::new();
        frame.push((key, Rc::new(value) as Rc<dyn Any>));
        let child = Context {
            parent: Some(self),
            frame,
        };
        f(&child)
    }

    /// Nearest binding for `key`, cloned out.
    pub fn lookup<T: Clone + 'static>(&self, key: ContextKey) -> Option<T> {
        self.find(key).and_then(|v| v.downcast_ref::<T>().cloned())
    }

    /// Like [`Context::lookup`], but a missing binding is a [`MisuseError`].
    pub fn require<T: Clone + 'static>(&self, key: ContextKey) -> Result<T, MisuseError> {
        let found = self.find(key).ok_or(MisuseError::OutsideProvider { name: key.name })?;
        found
            .downcast_ref::<T>()
            .cloned()
            .ok_or(MisuseError::TypeMismatch { name: key.name })
    }

    pub fn is_bound(&self, key: ContextKey) -> bool {
        self.find(key).is_some()
    }

    /// Number of frames between this context and the root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut cur = self.parent;
        while let Some(cx) = cur {
            depth += 1;
            cur = cx.parent;
        }
        depth
    }

    fn find(&self, key: ContextKey) -> Option<&Rc<dyn Any>> {
        let mut cur: Option<&Context<'_>> = Some(self);
        while let Some(cx) = cur {
            if let Some((_, v)) = cx.frame.iter().rev().find(|(k, _)| *k == key) {
                return Some(v);
            }
            cur = cx.parent;
        }
        None
    }
}
