//! Selector Bindings
//!
//! A SelectorBinding is one consumer's view of a container: a selector that
//! derives a slice from the state, a comparator that decides whether a new
//! slice is a change, and a cache holding the last slice handed out.
//!
//! # How Bindings Work
//!
//! 1. `get_snapshot` derives the slice from the current state.
//!
//! 2. If the comparator judges it equal to the cached slice, the cached `Arc`
//!    is returned and the new slice is discarded. Otherwise the new slice
//!    replaces the cache and is returned.
//!
//! 3. Derivation is skipped entirely while the state is the same allocation
//!    as at the last derivation, so any number of reads between two writes
//!    return the identical `Arc` without calling the selector again.
//!
//! 4. `subscribe` registers a container listener that runs the same
//!    pipeline on every write and calls `on_change` only when the slice
//!    actually changed.
//!
//! # Why This Matters
//!
//! A renderer may read the snapshot many times per pass to check that
//! simultaneous readers agree. Because the cache only moves when the slice
//! changes, those reads can never disagree (no tearing), and consumers whose
//! slice is unaffected by a write are never notified.
//!
//! # Server Snapshot
//!
//! The first slice ever requested through `get_server_snapshot` is pinned.
//! It goes through the same cache, so the first interactive `get_snapshot`
//! after it, absent a write, is the very same `Arc`.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use super::container::{Container, WeakContainer};
use super::listener::{Listener, Subscription};
use crate::equality::{shallow_equal, ShallowEq, Value};
use crate::error::{Error, Result};

type SelectFn<S, T> = Arc<dyn Fn(&S) -> Result<T> + Send + Sync>;
type CompareFn<T> = Arc<dyn Fn(&T, &T) -> Result<bool> + Send + Sync>;

/// Cached state of a binding, shared between clones and the listener.
struct SliceCache<S, T> {
    /// State the cached slice was last derived from.
    seen: Option<Arc<S>>,
    /// Slice returned by the most recent snapshot.
    last: Option<Arc<T>>,
    /// Pinned initial slice.
    server: Option<Arc<T>>,
}

/// The derive / compare / cache pipeline.
struct Pipeline<S, T> {
    selector: SelectFn<S, T>,
    compare: CompareFn<T>,
    cache: Mutex<SliceCache<S, T>>,
}

impl<S, T> Pipeline<S, T> {
    /// Bring the cache up to date with `state`.
    ///
    /// Returns the snapshot and whether it differs from the previous one.
    /// The cache lock is not held while the selector or comparator run.
    fn refresh(&self, state: Arc<S>) -> Result<(Arc<T>, bool)> {
        let previous = {
            let cache = self.cache.lock();
            if let (Some(seen), Some(last)) = (&cache.seen, &cache.last) {
                if Arc::ptr_eq(seen, &state) {
                    return Ok((Arc::clone(last), false));
                }
            }
            cache.last.clone()
        };

        let next = (self.selector)(&*state)?;

        if let Some(previous) = previous {
            if (self.compare)(&*previous, &next)? {
                self.cache.lock().seen = Some(state);
                return Ok((previous, false));
            }
        }

        let next = Arc::new(next);
        let mut cache = self.cache.lock();
        cache.seen = Some(state);
        cache.last = Some(Arc::clone(&next));
        Ok((next, true))
    }
}

/// One consumer's selective view of a container.
///
/// Clones share the cache.
///
/// # Example
///
/// ```rust
/// use selective_core::store::{Container, SelectorBinding};
///
/// #[derive(Clone)]
/// struct State {
///     count: i64,
///     label: String,
/// }
///
/// let container = Container::new(State { count: 1, label: "a".into() });
/// let count = SelectorBinding::new(container.clone(), |s: &State| s.count);
///
/// let before = count.get_snapshot().unwrap();
/// container.set_state(State { count: 1, label: "b".into() });
/// let after = count.get_snapshot().unwrap();
///
/// // The label changed, the count did not: same snapshot.
/// assert!(std::sync::Arc::ptr_eq(&before, &after));
/// ```
pub struct SelectorBinding<S, T> {
    container: Container<S>,
    pipeline: Arc<Pipeline<S, T>>,
}

impl<S, T> SelectorBinding<S, T>
where
    S: Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    /// Bind `selector` with the default shallow comparator.
    pub fn new<F>(container: Container<S>, selector: F) -> Self
    where
        F: Fn(&S) -> T + Send + Sync + 'static,
        T: ShallowEq,
    {
        Self::with_compare(container, selector, |a: &T, b: &T| a.shallow_eq(b))
    }

    /// Bind `selector` with a caller-supplied comparator, used verbatim.
    pub fn with_compare<F, C>(container: Container<S>, selector: F, compare: C) -> Self
    where
        F: Fn(&S) -> T + Send + Sync + 'static,
        C: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Self::from_parts(
            container,
            Arc::new(move |state: &S| -> Result<T> { Ok(selector(state)) }),
            Arc::new(move |a: &T, b: &T| -> Result<bool> { Ok(compare(a, b)) }),
        )
    }

    fn from_parts(container: Container<S>, selector: SelectFn<S, T>, compare: CompareFn<T>) -> Self {
        Self {
            container,
            pipeline: Arc::new(Pipeline {
                selector,
                compare,
                cache: Mutex::new(SliceCache {
                    seen: None,
                    last: None,
                    server: None,
                }),
            }),
        }
    }

    /// The container this binding reads from.
    pub fn container(&self) -> &Container<S> {
        &self.container
    }

    /// Current slice; the cached `Arc` whenever the slice is unchanged.
    pub fn get_snapshot(&self) -> Result<Arc<T>> {
        self.pipeline
            .refresh(self.container.get_state())
            .map(|(slice, _)| slice)
    }

    /// Pinned initial slice for a non-interactive first pass.
    pub fn get_server_snapshot(&self) -> Result<Arc<T>> {
        if let Some(server) = self.pipeline.cache.lock().server.clone() {
            return Ok(server);
        }

        let slice = self.get_snapshot()?;
        let mut cache = self.pipeline.cache.lock();
        Ok(Arc::clone(cache.server.get_or_insert(slice)))
    }

    /// Listen for changes to this binding's slice.
    ///
    /// `on_change` runs only for writes that change the slice. If the slice
    /// cannot be derived, `on_change` runs as well so that the consumer's
    /// next `get_snapshot` reports the error.
    ///
    /// The slice is derived here if no snapshot has been taken yet, so the
    /// first write is compared against the state at subscription time.
    pub fn subscribe<F>(&self, on_change: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        if let Err(err) = self.pipeline.refresh(self.container.get_state()) {
            trace!(container = self.container.id(), %err, "slice derivation failed at subscribe");
        }

        let container: WeakContainer<S> = self.container.downgrade();
        let pipeline = Arc::clone(&self.pipeline);

        let listener = Listener::new(move || {
            let Some(container) = container.upgrade() else {
                return;
            };
            match pipeline.refresh(container.get_state()) {
                Ok((_, true)) => {
                    trace!(container = container.id(), "slice changed");
                    on_change();
                }
                Ok((_, false)) => {
                    trace!(container = container.id(), "slice unchanged, notification suppressed");
                }
                Err(err) => {
                    trace!(container = container.id(), %err, "slice derivation failed");
                    on_change();
                }
            }
        });

        self.container.subscribe(&listener)
    }
}

impl SelectorBinding<Value, Value> {
    /// Bind a dynamic selector and optional comparator.
    ///
    /// Neither is checked here. A `selector` that is not a function fails
    /// with [`Error::Contract`] the first time a snapshot is taken, and so
    /// does a non-function `compare` the first time two slices are compared.
    /// `None` selects [`shallow_equal`]; a function comparator is read for
    /// truthiness.
    pub fn from_values(container: Container<Value>, selector: Value, compare: Option<Value>) -> Self {
        let select: SelectFn<Value, Value> = Arc::new(move |state: &Value| -> Result<Value> {
            match &selector {
                Value::Function(f) => Ok(f.call(std::slice::from_ref(state))),
                _ => Err(Error::contract("selector")),
            }
        });

        let compare: CompareFn<Value> = match compare {
            None => Arc::new(|a: &Value, b: &Value| -> Result<bool> { Ok(shallow_equal(a, b)) }),
            Some(Value::Function(f)) => {
                Arc::new(move |a: &Value, b: &Value| -> Result<bool> {
                    Ok(f.call(&[a.clone(), b.clone()]).is_truthy())
                })
            }
            Some(_) => Arc::new(|_: &Value, _: &Value| -> Result<bool> { Err(Error::contract("compare")) }),
        };

        Self::from_parts(container, select, compare)
    }
}

impl<S, T> Clone for SelectorBinding<S, T> {
    fn clone(&self) -> Self {
        Self {
            container: self.container.clone(),
            pipeline: Arc::clone(&self.pipeline),
        }
    }
}

impl<S, T: Debug> Debug for SelectorBinding<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.pipeline.cache.lock();
        f.debug_struct("SelectorBinding")
            .field("container", &self.container.id())
            .field("last", &cache.last)
            .field("server", &cache.server)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
