//! Selective Core
//!
//! This crate provides a selective subscription engine: many consumers read
//! different, possibly overlapping slices of one shared state and are
//! notified only when the slice they read actually changes.
//!
//! It implements:
//!
//! - A state container with synchronous publish/subscribe
//! - Per-consumer selector bindings that memoize their slice
//! - A snapshot protocol with referentially stable reads
//! - A type-dispatching shallow equality comparator
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `store`: containers, listeners, selector bindings, mutators, contexts
//! - `equality`: the shallow comparator and the dynamic `Value` model
//! - `error`: scope and contract errors
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//!
//! use selective_core::impl_shallow_eq;
//! use selective_core::store::StateContext;
//!
//! #[derive(Clone)]
//! struct Cart {
//!     items: u32,
//!     coupon: Option<String>,
//! }
//!
//! struct ItemCount {
//!     items: u32,
//! }
//!
//! impl_shallow_eq!(ItemCount { items });
//!
//! let context = StateContext::<Cart>::new();
//! context.provide(Cart { items: 0, coupon: None });
//!
//! let badge = context
//!     .use_selector(|cart: &Cart| ItemCount { items: cart.items })
//!     .unwrap();
//! let changes = Arc::new(AtomicU32::new(0));
//! let counter = Arc::clone(&changes);
//! let _subscription = badge.subscribe(move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! let mutate = context.use_mutator().unwrap();
//!
//! // Does not touch `items`: the badge is not notified.
//! mutate.update(|cart| Cart { coupon: Some("SAVE".into()), ..cart.clone() });
//! assert_eq!(changes.load(Ordering::SeqCst), 0);
//!
//! mutate.update(|cart| Cart { items: cart.items + 1, ..cart.clone() });
//! assert_eq!(changes.load(Ordering::SeqCst), 1);
//!
//! assert_eq!(badge.get_snapshot().unwrap().items, 1);
//! ```

pub mod equality;
pub mod error;
pub mod store;

pub use error::{Error, Result};
