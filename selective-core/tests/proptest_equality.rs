//! Property-based invariant tests for the shallow comparator and the
//! snapshot cache.
//!
//! These tests verify structural invariants that must hold for any inputs:
//!
//! 1. `shallow_equal` is reflexive.
//! 2. `shallow_equal` is symmetric.
//! 3. A fresh object with the same entries is equal; changing one entry
//!    makes it unequal.
//! 4. Map and set equality ignores insertion order.
//! 5. The typed comparator agrees with the dynamic one on integer vectors.
//! 6. A binding's snapshot only changes allocation when the slice changes.

use std::sync::Arc;

use proptest::prelude::*;

use selective_core::equality::{shallow_equal, Key, ShallowEq, Value};
use selective_core::store::{Container, SelectorBinding};

// ── Helpers ─────────────────────────────────────────────────────────────

fn primitive_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Undefined),
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<f64>().prop_map(Value::Number),
        Just(Value::Number(f64::NAN)),
        "[a-z]{0,4}".prop_map(Value::from),
    ]
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        4 => primitive_strategy(),
        1 => (-1e12f64..1e12).prop_map(Value::date),
        1 => prop::collection::vec(primitive_strategy(), 0..4).prop_map(Value::array),
        1 => prop::collection::vec(("[a-c]", primitive_strategy()), 0..4)
            .prop_map(|entries| Value::object(entries.into_iter().map(|(k, v)| (k, v)))),
        1 => prop::collection::vec(any::<i32>(), 0..4).prop_map(Value::set),
    ]
}

fn entries_strategy() -> impl Strategy<Value = Vec<(String, i32)>> {
    prop::collection::btree_map("[a-f]{1,3}", any::<i32>(), 1..6)
        .prop_map(|m| m.into_iter().collect())
}

// ── Comparator ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn reflexive(v in value_strategy()) {
        prop_assert!(shallow_equal(&v, &v));
    }

    #[test]
    fn symmetric(a in value_strategy(), b in value_strategy()) {
        prop_assert_eq!(shallow_equal(&a, &b), shallow_equal(&b, &a));
    }

    #[test]
    fn copied_object_is_equal(entries in entries_strategy()) {
        let a = Value::object(entries.iter().map(|(k, v)| (k.as_str(), Value::from(*v))));
        let b = Value::object(entries.iter().rev().map(|(k, v)| (k.as_str(), Value::from(*v))));
        prop_assert!(shallow_equal(&a, &b));
    }

    #[test]
    fn one_changed_entry_is_unequal(entries in entries_strategy(), pick in any::<prop::sample::Index>()) {
        let changed = pick.index(entries.len());
        let a = Value::object(entries.iter().map(|(k, v)| (k.as_str(), Value::from(*v))));
        let b = Value::object(entries.iter().enumerate().map(|(i, (k, v))| {
            let v = if i == changed { i64::from(*v) + 1 } else { i64::from(*v) };
            (k.as_str(), Value::from(v))
        }));
        prop_assert!(!shallow_equal(&a, &b));
    }

    #[test]
    fn map_order_is_irrelevant(entries in entries_strategy()) {
        let a = Value::map(entries.iter().map(|(k, v)| (k.as_str(), Value::from(*v))));
        let b = Value::map(entries.iter().rev().map(|(k, v)| (k.as_str(), Value::from(*v))));
        prop_assert!(shallow_equal(&a, &b));
    }

    #[test]
    fn set_order_is_irrelevant(members in prop::collection::hash_set(any::<i32>(), 0..8)) {
        let forward: Vec<Key> = members.iter().copied().map(Key::from).collect();
        let a = Value::set(forward.iter().cloned());
        let b = Value::set(forward.iter().rev().cloned());
        prop_assert!(shallow_equal(&a, &b));
    }

    #[test]
    fn typed_and_dynamic_agree(a in prop::collection::vec(-3i32..3, 0..4), b in prop::collection::vec(-3i32..3, 0..4)) {
        let da = Value::array(a.iter().map(|n| Value::from(*n)));
        let db = Value::array(b.iter().map(|n| Value::from(*n)));
        prop_assert_eq!(a.shallow_eq(&b), shallow_equal(&da, &db));
    }
}

// ── Snapshot cache ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn snapshot_moves_only_on_change(writes in prop::collection::vec(0i32..3, 1..20)) {
        let container = Container::new((0i32, 0u32));
        let binding = SelectorBinding::new(container.clone(), |s: &(i32, u32)| s.0);

        let mut previous = binding.get_snapshot().unwrap();
        for (tick, value) in writes.into_iter().enumerate() {
            container.set_state((value, tick as u32));
            let current = binding.get_snapshot().unwrap();
            if *previous == value {
                prop_assert!(Arc::ptr_eq(&previous, &current));
            } else {
                prop_assert!(!Arc::ptr_eq(&previous, &current));
                prop_assert_eq!(*current, value);
            }
            previous = current;
        }
    }
}
