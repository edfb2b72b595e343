use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use slotmap::{SlotMap, new_key_type};

use crate::Dispose;

new_key_type! {
    /// Identifies one subscriber on a [`Signal`].
    pub struct SubId;
}

type Subscriber<T> = Rc<dyn Fn(&T)>;

/// Observable value cell shared by cloning.
///
/// Subscribers run synchronously after every `set`/`update`, in registration
/// order, against a clone of the committed value. No borrow is held while
/// they run, so a callback may read the signal or drop its own subscription.
///
/// A `set` made from inside a subscriber commits at once, but its round is
/// queued behind the one in progress: every subscriber sees every committed
/// value, oldest first.
pub struct Signal<T: 'static>(Rc<RefCell<Inner<T>>>);

struct Inner<T> {
    value: T,
    subs: SlotMap<SubId, Subscriber<T>>,
    notifying: bool,
    queued: VecDeque<T>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Signal<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(Inner {
            value,
            subs: SlotMap::with_key(),
            notifying: false,
            queued: VecDeque::new(),
        })))
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.0.borrow().value.clone()
    }

    /// Borrow the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.borrow().value)
    }

    pub fn set(&self, v: T)
    where
        T: Clone,
    {
        self.0.borrow_mut().value = v;
        self.notify();
    }

    pub fn update<F: FnOnce(&mut T)>(&self, f: F)
    where
        T: Clone,
    {
        f(&mut self.0.borrow_mut().value);
        self.notify();
    }

    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> SubId {
        self.0.borrow_mut().subs.insert(Rc::new(f))
    }

    /// Returns `false` if the subscriber was already gone.
    pub fn unsubscribe(&self, id: SubId) -> bool {
        self.0.borrow_mut().subs.remove(id).is_some()
    }

    /// Subscribe and hand back a guard that unsubscribes when run.
    ///
    /// The guard only holds a weak reference, so it never keeps the signal
    /// alive on its own.
    pub fn watch(&self, f: impl Fn(&T) + 'static) -> Dispose {
        let id = self.subscribe(f);
        let weak: Weak<RefCell<Inner<T>>> = Rc::downgrade(&self.0);
        Dispose::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.borrow_mut().subs.remove(id);
            }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.borrow().subs.len()
    }

    fn notify(&self)
    where
        T: Clone,
    {
        let mut next = {
            let mut inner = self.0.borrow_mut();
            if inner.notifying {
                let value = inner.value.clone();
                inner.queued.push_back(value);
                return;
            }
            if inner.subs.is_empty() {
                return;
            }
            inner.notifying = true;
            Some(inner.value.clone())
        };

        // Clears the round state even if a subscriber panics.
        struct Round<'a, T>(&'a RefCell<Inner<T>>);
        impl<T> Drop for Round<'_, T> {
            fn drop(&mut self) {
                let mut inner = self.0.borrow_mut();
                inner.notifying = false;
                inner.queued.clear();
            }
        }
        let _round = Round(&self.0);

        while let Some(value) = next {
            let subs: Vec<Subscriber<T>> = self.0.borrow().subs.values().cloned().collect();
            for s in subs {
                s(&value);
            }
            next = self.0.borrow_mut().queued.pop_front();
        }
    }
}

pub fn signal<T>(t: T) -> Signal<T> {
    Signal::new(t)
}
