//! State Context
//!
//! A StateContext is the explicit slot through which consumers reach a
//! container. A provider attaches a container to it once; every accessor
//! (`use_selector`, `use_mutator`, ...) resolves the container through the
//! slot and fails with a scope error while the slot is empty.
//!
//! # Single Instance
//!
//! `provide` creates the container on the first call only. Later calls,
//! for example from a provider that is re-run, return the existing
//! container and ignore their argument. The container is replaced only
//! after an explicit `withdraw`.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::container::Container;
use super::mutation::Mutator;
use super::selector::SelectorBinding;
use crate::equality::{ShallowEq, Value};
use crate::error::{Error, Result};

struct ContextInner<S> {
    label: Option<String>,
    slot: RwLock<Option<Container<S>>>,
}

/// A handle to one logical piece of shared state.
///
/// Clones refer to the same slot.
///
/// # Example
///
/// ```rust
/// use selective_core::store::StateContext;
///
/// let context = StateContext::<i64>::named("counter");
/// assert!(context.use_mutator().is_err());
///
/// context.provide(1);
/// let doubled = context.use_selector(|n: &i64| n * 2).unwrap();
/// context.use_mutator().unwrap().update(|n| n + 1);
///
/// assert_eq!(*doubled.get_snapshot().unwrap(), 4);
/// ```
pub struct StateContext<S> {
    inner: Arc<ContextInner<S>>,
}

impl<S> StateContext<S> {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::with_label(None)
    }

    /// Create an empty context whose label appears in errors and traces.
    pub fn named(label: impl Into<String>) -> Self {
        Self::with_label(Some(label.into()))
    }

    fn with_label(label: Option<String>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                label,
                slot: RwLock::new(None),
            }),
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.inner.label.as_deref()
    }

    /// Attach a container holding `initial`, or return the one already
    /// attached.
    pub fn provide(&self, initial: S) -> Container<S> {
        self.provide_with(move || initial)
    }

    /// Like [`provide`](StateContext::provide), but only builds the initial
    /// value when a container is actually created.
    pub fn provide_with<F>(&self, init: F) -> Container<S>
    where
        F: FnOnce() -> S,
    {
        if let Some(existing) = self.inner.slot.read().as_ref() {
            debug!(context = ?self.label(), container = existing.id(), "reusing container");
            return existing.clone();
        }

        let mut slot = self.inner.slot.write();
        let container = slot.get_or_insert_with(|| Container::new(init()));
        debug!(context = ?self.label(), container = container.id(), "container provided");
        container.clone()
    }

    /// Detach the container, returning it. Bindings and mutators acquired
    /// earlier keep working against it.
    pub fn withdraw(&self) -> Option<Container<S>> {
        let container = self.inner.slot.write().take();
        if let Some(container) = &container {
            debug!(context = ?self.label(), container = container.id(), "container withdrawn");
        }
        container
    }

    pub fn is_provided(&self) -> bool {
        self.inner.slot.read().is_some()
    }

    /// The attached container.
    pub fn container(&self) -> Result<Container<S>> {
        self.resolve("container")
    }

    fn resolve(&self, accessor: &'static str) -> Result<Container<S>> {
        self.inner
            .slot
            .read()
            .clone()
            .ok_or_else(|| Error::scope(accessor, self.label()))
    }

    /// Writer for the attached container.
    pub fn use_mutator(&self) -> Result<Mutator<S>> {
        self.resolve("use_mutator").map(Mutator::new)
    }

    /// A reusable accessor bound to this context that yields a mutator on
    /// each call.
    pub fn mutator_factory(&self) -> impl Fn() -> Result<Mutator<S>> + Send + Sync + 'static
    where
        S: Send + Sync + 'static,
    {
        let context = self.clone();
        move || context.use_mutator()
    }

    /// A reusable accessor bound to this context that creates bindings.
    pub fn selector_factory(&self) -> SelectorFactory<S> {
        SelectorFactory {
            context: self.clone(),
        }
    }
}

impl<S> StateContext<S>
where
    S: Send + Sync + 'static,
{
    /// Bind `selector` to the attached container with shallow comparison.
    pub fn use_selector<T, F>(&self, selector: F) -> Result<SelectorBinding<S, T>>
    where
        T: ShallowEq + Send + Sync + 'static,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        let container = self.resolve("use_selector")?;
        Ok(SelectorBinding::new(container, selector))
    }

    /// Bind `selector` to the attached container with a custom comparator.
    pub fn use_selector_with<T, F, C>(&self, selector: F, compare: C) -> Result<SelectorBinding<S, T>>
    where
        T: Send + Sync + 'static,
        F: Fn(&S) -> T + Send + Sync + 'static,
        C: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        let container = self.resolve("use_selector")?;
        Ok(SelectorBinding::with_compare(container, selector, compare))
    }
}

impl StateContext<Value> {
    /// Bind a dynamic selector and optional comparator.
    ///
    /// A missing container is reported here; a non-function selector or
    /// comparator on first use (see [`SelectorBinding::from_values`]).
    pub fn use_value_selector(
        &self,
        selector: Value,
        compare: Option<Value>,
    ) -> Result<SelectorBinding<Value, Value>> {
        let container = self.resolve("use_selector")?;
        Ok(SelectorBinding::from_values(container, selector, compare))
    }
}

impl<S> Default for StateContext<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Clone for StateContext<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> Debug for StateContext<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateContext")
            .field("label", &self.inner.label)
            .field("provided", &self.is_provided())
            .finish()
    }
}

/// Creates selector bindings for one context.
pub struct SelectorFactory<S> {
    context: StateContext<S>,
}

impl<S> SelectorFactory<S>
where
    S: Send + Sync + 'static,
{
    pub fn select<T, F>(&self, selector: F) -> Result<SelectorBinding<S, T>>
    where
        T: ShallowEq + Send + Sync + 'static,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        self.context.use_selector(selector)
    }

    pub fn select_with<T, F, C>(&self, selector: F, compare: C) -> Result<SelectorBinding<S, T>>
    where
        T: Send + Sync + 'static,
        F: Fn(&S) -> T + Send + Sync + 'static,
        C: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.context.use_selector_with(selector, compare)
    }
}

impl<S> Clone for SelectorFactory<S> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
        }
    }
}
