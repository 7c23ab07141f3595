//! Selective Store
//!
//! This module implements the subscription engine: a container of shared
//! state, per-consumer selector bindings over it, and the writers and
//! context slot that tie them together.
//!
//! # Concepts
//!
//! ## Containers
//!
//! A Container holds the current state and a set of listeners. Every write
//! replaces the state and synchronously notifies all listeners. The
//! container never filters writes; it has no notion of equality.
//!
//! ## Selector Bindings
//!
//! A SelectorBinding derives a slice of the state for one consumer and
//! caches it. On each write it re-derives the slice and compares it with the
//! cached one; only a real change replaces the cache and reaches the
//! consumer's `on_change`. Reads between writes always return the cached
//! `Arc`, which keeps simultaneous readers consistent.
//!
//! ## Mutators
//!
//! A Mutator turns "set to this value" and "set via this updater" into a
//! single container write.
//!
//! ## Contexts
//!
//! A StateContext is the slot a provider attaches a container to. Accessors
//! go through it and report a scope error when nothing is attached.
//!
//! # Scheduling
//!
//! Everything is synchronous. Nothing here spawns, blocks, or defers work;
//! re-invoking consumers after `on_change` is the embedding renderer's job.

mod container;
mod listener;
mod mutation;
mod scope;
mod selector;

pub use container::{Container, WeakContainer};
pub use listener::{Listener, ListenerId, Subscription};
pub use mutation::{Mutator, Update};
pub use scope::{SelectorFactory, StateContext};
pub use selector::SelectorBinding;
