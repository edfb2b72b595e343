use std::cell::RefCell;
use std::rc::Rc;

use crate::Scope;

/// One-shot cleanup guard. Clones share the same cleanup.
#[derive(Clone)]
pub struct Dispose(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    /// Runs at most once (safe to call multiple times).
    pub fn run(&self) {
        // Take first so the cleanup may drop other clones of this guard.
        let f = self.0.borrow_mut().take();
        if let Some(f) = f {
            f()
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.0.borrow().is_none()
    }

    /// Hand the cleanup to `scope`; it runs when the scope is disposed.
    pub fn bind(self, scope: &Scope) {
        scope.add_disposer(move || self.run());
    }
}

/// Helper to build a cleanup guard.
pub fn on_unmount(f: impl FnOnce() + 'static) -> Dispose {
    Dispose::new(f)
}
