//! The dispatcher collaborator.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use strata_view::{reuse_if_equal, view_tree, Equality, StructuralEq, View, ViewTree};
use tracing::error;

use crate::action::Action;
use crate::error::{Result, StoreError};
use crate::reducer::reduce;
use crate::select::StackReader;
use crate::stack::Stack;
use crate::state::State;

/// Receives actions the reducer rejected. Never panics the store.
pub type ErrorHandler = Arc<dyn Fn(&StoreError, &Action) + Send + Sync>;

/// Owns a [`State`] and applies actions to it.
pub trait Store: Send + Sync {
    /// Apply one action atomically. Rejections go to the error handler.
    fn dispatch(&self, action: Action);

    /// Read a consistent snapshot.
    fn select<R>(&self, selector: impl FnOnce(&State) -> R) -> R;
}

/// Logs the rejection with `tracing::error!`.
pub fn log_error_handler() -> ErrorHandler {
    Arc::new(|err: &StoreError, action: &Action| {
        error!(
            action = action.kind(),
            graph = action.graph_name(),
            error = %err,
            "action rejected"
        );
    })
}

/// Store backed by a lock around an in-process [`State`].
pub struct InMemoryStore {
    state: RwLock<State>,
    on_error: ErrorHandler,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_state(State::new())
    }

    pub fn with_state(state: State) -> Self {
        Self {
            state: RwLock::new(state),
            on_error: log_error_handler(),
        }
    }

    /// Replace the rejection handler.
    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.on_error = handler;
        self
    }

    /// A clone of the current state.
    pub fn snapshot(&self) -> State {
        self.state.read().clone()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for InMemoryStore {
    fn dispatch(&self, action: Action) {
        let result = {
            let mut state = self.state.write();
            reduce(&mut state, action.clone())
        };
        if let Err(err) = result {
            (self.on_error)(&err, &action);
        }
    }

    fn select<R>(&self, selector: impl FnOnce(&State) -> R) -> R {
        let state = self.state.read();
        selector(&*state)
    }
}

/// Memoized view selector. Reading twice without a relevant change returns
/// the same `Arc`.
pub struct ViewSelector<E = StructuralEq> {
    view: View,
    equality: E,
    last: Mutex<Option<Arc<ViewTree>>>,
}

impl ViewSelector {
    pub fn new(view: View) -> Self {
        Self::with_equality(view, StructuralEq)
    }
}

impl<E: Equality<ViewTree>> ViewSelector<E> {
    pub fn with_equality(view: View, equality: E) -> Self {
        Self {
            view,
            equality,
            last: Mutex::new(None),
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// The view's result tree over `stack`.
    pub fn select<S: Store>(&self, store: &S, stack: &Stack) -> Result<Arc<ViewTree>> {
        let tree = store.select(|state| {
            let reader = StackReader::new(stack, state);
            view_tree(&self.view, &reader, &reader)
        })?;
        let mut last = self.last.lock();
        let tree = reuse_if_equal(last.as_ref(), tree, &self.equality);
        *last = Some(Arc::clone(&tree));
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use strata_graph::Props;
    use strata_view::{AlwaysFresh, Include, ViewQuery};

    fn set_node(graph: &str, id: &str, node: serde_json::Value) -> Action {
        let serde_json::Value::Object(node) = node else {
            panic!("node must be an object")
        };
        Action::SetNode {
            graph_name: graph.into(),
            node_id: id.into(),
            node,
        }
    }

    #[test]
    fn rejected_actions_reach_the_handler() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let store = InMemoryStore::new().with_error_handler(Arc::new(move |_: &StoreError, action: &Action| {
            assert_eq!(action.kind(), "set_node");
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        store.dispatch(set_node("main", "n1", json!({})));
        store.dispatch(Action::SetNode {
            graph_name: "edit".into(),
            node_id: String::new(),
            node: Props::new(),
        });
        store.dispatch(set_node("edit", "n1", json!({"a": 1})));

        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert!(store.select(|s| s.graph("edit").and_then(|g| g.node("n1")).is_some()));
        assert!(store.select(|s| s.graph("main").is_none()));
    }

    #[test]
    fn view_selector_reuses_unchanged_results() {
        let store = InMemoryStore::new();
        store.dispatch(set_node("edit", "n1", json!({"a": 1})));
        let stack = Stack::new(["edit"]).unwrap();
        let view = View::new().root(
            "n1",
            ViewQuery::new().include(Include {
                node: true,
                ..Include::default()
            }),
        );

        let selector = ViewSelector::new(view.clone());
        let first = selector.select(&store, &stack).unwrap();
        let second = selector.select(&store, &stack).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        store.dispatch(set_node("edit", "n1", json!({"a": 2})));
        let third = selector.select(&store, &stack).unwrap();
        assert!(!Arc::ptr_eq(&second, &third));
        assert_eq!(third.get("n1").unwrap().node.as_ref().unwrap()["a"], json!(2));

        let fresh = ViewSelector::with_equality(view, AlwaysFresh);
        let a = fresh.select(&store, &stack).unwrap();
        let b = fresh.select(&store, &stack).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
