//! Listener types for the container.
//!
//! A Listener is a zero-argument callback with a stable identity. The
//! container keys its registrations by that identity, so registering the
//! same listener twice keeps a single registration.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::trace;

/// Unique identifier for a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Generate a new unique listener ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// A notification callback.
///
/// Clones share the identity of the original.
#[derive(Clone)]
pub struct Listener {
    id: ListenerId,
    notify: Arc<dyn Fn() + Send + Sync>,
}

impl Listener {
    /// Create a new listener with the given notification callback.
    pub fn new<F>(notify: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            id: ListenerId::new(),
            notify: Arc::new(notify),
        }
    }

    /// Get the listener's unique ID.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Invoke the callback.
    pub fn notify(&self) {
        (self.notify)();
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listener").field("id", &self.id).finish()
    }
}

/// A registered listener plus the flag that tells an in-flight dispatch it
/// has been removed.
struct Registration {
    listener: Listener,
    live: Arc<AtomicBool>,
}

/// The listener set owned by a container.
#[derive(Default)]
pub(crate) struct ListenerSet {
    entries: Mutex<IndexMap<ListenerId, Registration>>,
}

impl ListenerSet {
    /// Add a listener. Returns false if it was already registered.
    pub(crate) fn insert(&self, listener: &Listener) -> bool {
        let mut entries = self.entries.lock();
        if entries.contains_key(&listener.id) {
            return false;
        }
        entries.insert(
            listener.id,
            Registration {
                listener: listener.clone(),
                live: Arc::new(AtomicBool::new(true)),
            },
        );
        true
    }

    /// Remove a listener. Returns false if it was not registered.
    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        match self.entries.lock().swap_remove(&id) {
            Some(registration) => {
                registration.live.store(false, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Notify every listener registered at the start of the call.
    ///
    /// The set is copied out first and the lock released, so listeners may
    /// subscribe, unsubscribe, and write to the container. A listener
    /// removed before its turn is skipped. Returns how many were notified.
    pub(crate) fn dispatch(&self) -> usize {
        let batch: SmallVec<[(Listener, Arc<AtomicBool>); 8]> = self
            .entries
            .lock()
            .values()
            .map(|r| (r.listener.clone(), Arc::clone(&r.live)))
            .collect();

        let mut notified = 0;
        for (listener, live) in batch {
            if live.load(Ordering::SeqCst) {
                listener.notify();
                notified += 1;
            }
        }
        notified
    }
}

/// The capability returned by `subscribe`.
///
/// Calling [`unsubscribe`](Subscription::unsubscribe) removes exactly the
/// registration this subscription was created for; further calls do
/// nothing. Dropping the subscription unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    id: ListenerId,
    listeners: Weak<ListenerSet>,
    done: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(id: ListenerId, listeners: &Arc<ListenerSet>) -> Self {
        Self {
            id,
            listeners: Arc::downgrade(listeners),
            done: AtomicBool::new(false),
        }
    }

    /// ID of the subscribed listener.
    pub fn listener_id(&self) -> ListenerId {
        self.id
    }

    /// True until `unsubscribe` has run.
    pub fn is_active(&self) -> bool {
        !self.done.load(Ordering::SeqCst)
    }

    /// Remove the listener. Idempotent.
    pub fn unsubscribe(&self) {
        if self.done.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(listeners) = self.listeners.upgrade() {
            let removed = listeners.remove(self.id);
            trace!(listener = ?self.id, removed, "unsubscribed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("listener", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI32;

    #[test]
    fn listener_ids_are_unique() {
        let id1 = ListenerId::new();
        let id2 = ListenerId::new();
        let id3 = ListenerId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn listener_notify_calls_callback() {
        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let listener = Listener::new(move || {
            called_clone.store(true, Ordering::SeqCst);
        });

        assert!(!called.load(Ordering::SeqCst));
        listener.notify();
        assert!(called.load(Ordering::SeqCst));
    }

    #[test]
    fn clones_share_identity() {
        let listener = Listener::new(|| {});
        assert_eq!(listener.id(), listener.clone().id());
    }

    #[test]
    fn set_semantics_on_insert() {
        let set = ListenerSet::default();
        let listener = Listener::new(|| {});

        assert!(set.insert(&listener));
        assert!(!set.insert(&listener.clone()));
        assert_eq!(set.len(), 1);

        assert!(set.insert(&Listener::new(|| {})));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn dispatch_reaches_every_listener_once() {
        let set = ListenerSet::default();
        let count = Arc::new(AtomicI32::new(0));

        for _ in 0..3 {
            let count = count.clone();
            set.insert(&Listener::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            }));
        }

        assert_eq!(set.dispatch(), 3);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn listener_removed_mid_dispatch_is_skipped() {
        let set = Arc::new(ListenerSet::default());
        let second_ran = Arc::new(AtomicBool::new(false));

        let second_ran_clone = second_ran.clone();
        let second = Listener::new(move || {
            second_ran_clone.store(true, Ordering::SeqCst);
        });
        let second_id = second.id();

        let set_clone = Arc::downgrade(&set);
        let first = Listener::new(move || {
            if let Some(set) = set_clone.upgrade() {
                set.remove(second_id);
            }
        });

        set.insert(&first);
        set.insert(&second);

        assert_eq!(set.dispatch(), 1);
        assert!(!second_ran.load(Ordering::SeqCst));
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let set = Arc::new(ListenerSet::default());
        let listener = Listener::new(|| {});
        set.insert(&listener);

        let subscription = Subscription::new(listener.id(), &set);
        assert!(subscription.is_active());

        subscription.unsubscribe();
        assert_eq!(set.len(), 0);
        assert!(!subscription.is_active());

        // A later registration of the same listener is not touched by a
        // repeated unsubscribe.
        set.insert(&listener);
        subscription.unsubscribe();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn drop_unsubscribes() {
        let set = Arc::new(ListenerSet::default());
        let listener = Listener::new(|| {});
        set.insert(&listener);

        {
            let _subscription = Subscription::new(listener.id(), &set);
            assert_eq!(set.len(), 1);
        }

        assert_eq!(set.len(), 0);
    }
}
