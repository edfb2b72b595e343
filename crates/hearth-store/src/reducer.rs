use std::cell::RefCell;
use std::rc::Rc;

use hearth_core::{Dispose, Signal};

/// Pure state transition: next state from the current state and an action.
///
/// Any `Fn(&S, A) -> S` closure is a reducer.
pub trait Reducer<S, A>: 'static {
    fn reduce(&self, state: &S, action: A) -> S;
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(&S, A) -> S + 'static,
{
    fn reduce(&self, state: &S, action: A) -> S {
        self(state, action)
    }
}

/// Reducer state bundled with its transition, in the shape of a type.
pub trait StateHolder: 'static {
    type State: Clone;
    type Action;

    fn initial_state() -> Self::State;
    fn reduce(state: &Self::State, action: Self::Action) -> Self::State;
}

/// In-memory reducer store. Nothing is persisted and dispatch cannot fail.
pub struct ReducerStore<S: 'static, A: 'static> {
    state: Signal<S>,
    reducer: Rc<dyn Reducer<S, A>>,
    // Dispatches issued by subscribers while one is running queue here.
    pending: Rc<RefCell<Option<Vec<A>>>>,
}

impl<S, A> Clone for ReducerStore<S, A> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            reducer: self.reducer.clone(),
            pending: self.pending.clone(),
        }
    }
}

impl<S: Clone + 'static, A: 'static> ReducerStore<S, A> {
    pub fn new(initial: S, reducer: impl Reducer<S, A>) -> Self {
        Self::with_shared(initial, Rc::new(reducer))
    }

    pub(crate) fn with_shared(initial: S, reducer: Rc<dyn Reducer<S, A>>) -> Self {
        Self {
            state: Signal::new(initial),
            reducer,
            pending: Rc::new(RefCell::new(None)),
        }
    }

    /// Build from a [`StateHolder`] type.
    pub fn from_holder<H>() -> Self
    where
        H: StateHolder<State = S, Action = A>,
    {
        Self::new(H::initial_state(), |s: &S, a: A| H::reduce(s, a))
    }

    pub fn state(&self) -> S {
        self.state.get()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        self.state.with(f)
    }

    /// Reduce, commit, and notify subscribers.
    ///
    /// A dispatch made from inside a subscriber is applied after the current
    /// one finishes notifying, so subscribers always see states in order.
    pub fn dispatch(&self, action: A) {
        if let Some(queue) = self.pending.borrow_mut().as_mut() {
            queue.push(action);
            return;
        }
        *self.pending.borrow_mut() = Some(Vec::new());

        let mut next_action = Some(action);
        while let Some(action) = next_action.take() {
            let next = self.state.with(|s| self.reducer.reduce(s, action));
            self.state.set(next);
            next_action = self
                .pending
                .borrow_mut()
                .as_mut()
                .and_then(|q| (!q.is_empty()).then(|| q.remove(0)));
        }
        *self.pending.borrow_mut() = None;
    }

    pub fn subscribe(&self, f: impl Fn(&S) + 'static) -> Dispose {
        self.state.watch(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Clone, Debug, PartialEq)]
    struct Todos(Vec<String>);

    enum TodoAction {
        Add(String),
        Clear,
    }

    struct TodoHolder;

    impl StateHolder for TodoHolder {
        type State = Todos;
        type Action = TodoAction;

        fn initial_state() -> Todos {
            Todos(vec![])
        }

        fn reduce(state: &Todos, action: TodoAction) -> Todos {
            match action {
                TodoAction::Add(t) => {
                    let mut next = state.0.clone();
                    next.push(t);
                    Todos(next)
                }
                TodoAction::Clear => Todos(vec![]),
            }
        }
    }

    #[test]
    fn closure_reducer() {
        let store = ReducerStore::new(0i32, |s: &i32, by: i32| s + by);
        store.dispatch(2);
        store.dispatch(3);
        assert_eq!(store.state(), 5);
    }

    #[test]
    fn holder_reducer_and_subscription() {
        let store = ReducerStore::<Todos, TodoAction>::from_holder::<TodoHolder>();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _d = store.subscribe({
            let seen = seen.clone();
            move |t: &Todos| seen.borrow_mut().push(t.0.len())
        });

        store.dispatch(TodoAction::Add("milk".into()));
        store.dispatch(TodoAction::Add("eggs".into()));
        store.dispatch(TodoAction::Clear);
        assert_eq!(*seen.borrow(), vec![1, 2, 0]);
    }

    #[test]
    fn dispatch_from_subscriber_is_queued_in_order() {
        let store = ReducerStore::new(0i32, |s: &i32, by: i32| s + by);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _d = store.subscribe({
            let store = store.clone();
            let seen = seen.clone();
            move |v: &i32| {
                seen.borrow_mut().push(*v);
                if *v == 1 {
                    store.dispatch(10);
                }
            }
        });

        store.dispatch(1);
        assert_eq!(*seen.borrow(), vec![1, 11]);
        assert_eq!(store.state(), 11);
    }
}
