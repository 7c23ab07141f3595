//! Container Implementation
//!
//! A Container is the single mutable holder of a shared state value plus the
//! set of listeners interested in it.
//!
//! # How Containers Work
//!
//! 1. `get_state` hands out the current value as an `Arc`, so two reads with
//!    no write in between return the same allocation.
//!
//! 2. `set_state` swaps the value unconditionally. There is no equality check
//!    here; filtering redundant updates is the selector binding's job.
//!
//! 3. After the swap, every registered listener is invoked synchronously
//!    before `set_state` returns.
//!
//! # Re-entrancy
//!
//! No lock is held while listeners run. A listener may read the state,
//! subscribe or unsubscribe, and call `set_state` again. A nested write is
//! applied immediately and fully dispatched before the outer dispatch
//! continues, so later listeners in the outer loop see the newest value.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::listener::{Listener, ListenerSet, Subscription};

/// Counter for generating unique container IDs.
static CONTAINER_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new unique container ID.
fn next_container_id() -> u64 {
    CONTAINER_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

struct Inner<S> {
    id: u64,
    value: RwLock<Arc<S>>,
    listeners: Arc<ListenerSet>,
}

/// A shared state container.
///
/// Cloning a container produces another handle to the same state.
///
/// # Example
///
/// ```rust
/// use selective_core::store::Container;
///
/// let container = Container::new(0);
/// let _subscription = container.subscribe_fn(|| println!("changed"));
///
/// container.set_state(5); // prints "changed"
/// assert_eq!(*container.get_state(), 5);
/// ```
pub struct Container<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Container<S> {
    /// Create a new container holding `initial`.
    pub fn new(initial: S) -> Self {
        let id = next_container_id();
        debug!(container = id, "container created");
        Self {
            inner: Arc::new(Inner {
                id,
                value: RwLock::new(Arc::new(initial)),
                listeners: Arc::new(ListenerSet::default()),
            }),
        }
    }

    /// Get the container's unique ID.
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Get the current value.
    pub fn get_state(&self) -> Arc<S> {
        Arc::clone(&self.inner.value.read())
    }

    /// Replace the value and notify every listener.
    pub fn set_state(&self, next: S) {
        self.set_state_arc(Arc::new(next));
    }

    /// Replace the value with an already shared one and notify every
    /// listener.
    pub fn set_state_arc(&self, next: Arc<S>) {
        *self.inner.value.write() = next;

        let notified = self.inner.listeners.dispatch();
        trace!(container = self.inner.id, notified, "state replaced");
    }

    /// Register a listener.
    ///
    /// If the listener (or a clone of it) is already registered this is a
    /// no-op and the returned subscription refers to the existing
    /// registration.
    pub fn subscribe(&self, listener: &Listener) -> Subscription {
        let added = self.inner.listeners.insert(listener);
        trace!(
            container = self.inner.id,
            listener = ?listener.id(),
            added,
            "subscribed"
        );
        Subscription::new(listener.id(), &self.inner.listeners)
    }

    /// Register a closure as a new listener.
    pub fn subscribe_fn<F>(&self, notify: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe(&Listener::new(notify))
    }

    /// Get the number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.len()
    }

    /// True if both handles refer to the same container.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// A handle that does not keep the container alive.
    pub fn downgrade(&self) -> WeakContainer<S> {
        WeakContainer {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl<S> Clone for Container<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Debug> Debug for Container<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("value", &self.get_state())
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

/// Weak counterpart of [`Container`].
pub struct WeakContainer<S> {
    inner: Weak<Inner<S>>,
}

impl<S> WeakContainer<S> {
    pub fn upgrade(&self) -> Option<Container<S>> {
        self.inner.upgrade().map(|inner| Container { inner })
    }
}

impl<S> Clone for WeakContainer<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
