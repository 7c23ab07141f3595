//! Mutation dispatch.
//!
//! Writers hold a [`Mutator`] rather than the container itself. A mutation
//! is either a replacement value or an updater that receives the current
//! value; both end in a single `set_state`.

use std::fmt::Debug;

use tracing::trace;

use super::container::Container;
use crate::equality::Value;

/// A pending write.
pub enum Update<S> {
    /// Write this value as is.
    Replace(S),
    /// Derive the next value from the current one.
    With(Box<dyn FnOnce(&S) -> S + Send>),
}

impl<S> Update<S> {
    /// Wrap an updater function.
    pub fn with<F>(f: F) -> Self
    where
        F: FnOnce(&S) -> S + Send + 'static,
    {
        Update::With(Box::new(f))
    }

    /// Resolve against the current value.
    pub fn apply(self, current: &S) -> S {
        match self {
            Update::Replace(next) => next,
            Update::With(f) => f(current),
        }
    }
}

impl<S> From<S> for Update<S> {
    fn from(next: S) -> Self {
        Update::Replace(next)
    }
}

impl<S: Debug> Debug for Update<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Update::Replace(next) => f.debug_tuple("Replace").field(next).finish(),
            Update::With(_) => f.write_str("With(..)"),
        }
    }
}

/// Write access to a container.
///
/// A mutator holds no state of its own. Every mutator for the same container
/// is [`same_as`](Mutator::same_as) every other, so it can be handed out as
/// a stable callback.
pub struct Mutator<S> {
    container: Container<S>,
}

impl<S> Mutator<S> {
    pub fn new(container: Container<S>) -> Self {
        Self { container }
    }

    /// Apply a replacement or an updater.
    pub fn mutate(&self, next: impl Into<Update<S>>) {
        let next = match next.into() {
            Update::Replace(value) => value,
            update @ Update::With(_) => update.apply(&self.container.get_state()),
        };
        trace!(container = self.container.id(), "mutation dispatched");
        self.container.set_state(next);
    }

    /// Write `next` as is.
    pub fn set(&self, next: S) {
        self.mutate(Update::Replace(next));
    }

    /// Derive the next value from the current one.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&S) -> S + Send + 'static,
    {
        self.mutate(Update::with(f));
    }

    /// True if both mutators write to the same container.
    pub fn same_as(&self, other: &Self) -> bool {
        self.container.ptr_eq(&other.container)
    }

    pub fn container(&self) -> &Container<S> {
        &self.container
    }
}

impl Mutator<Value> {
    /// Dynamic form of [`mutate`](Mutator::mutate): a function value is
    /// called with the current state and its result written, anything else
    /// is written as is.
    pub fn mutate_value(&self, next: Value) {
        match next {
            Value::Function(f) => {
                let current = self.container.get_state();
                self.container.set_state(f.call(std::slice::from_ref(&*current)));
            }
            next => self.container.set_state(next),
        }
    }
}

impl<S> Clone for Mutator<S> {
    fn clone(&self) -> Self {
        Self {
            container: self.container.clone(),
        }
    }
}

impl<S> Debug for Mutator<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mutator")
            .field("container", &self.container.id())
            .finish()
    }
}
