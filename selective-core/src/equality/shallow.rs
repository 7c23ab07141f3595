//! Typed shallow equality.
//!
//! Two traits split the comparator's rules for statically typed slices:
//!
//! - [`SameValue`] is the identity check: primitives by value, shared
//!   allocations (`Arc`) by pointer. Floats treat NaN as equal to itself and
//!   do not distinguish the sign of zero.
//! - [`ShallowEq`] is the one-level comparison: collections and structs are
//!   equal when their members are `SameValue`-equal. Nested compounds are
//!   compared by reference, never recursively.
//!
//! Plain structs opt in with [`impl_shallow_eq!`](crate::impl_shallow_eq).

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use indexmap::{IndexMap, IndexSet};
use regex::Regex;

use super::value::{Pattern, Value};

/// Identity-or-primitive equality.
pub trait SameValue {
    fn same_value(&self, other: &Self) -> bool;
}

/// One-level equality, the default memoization predicate for slices.
pub trait ShallowEq {
    fn shallow_eq(&self, other: &Self) -> bool;
}

/// Primitives: both traits compare by value.
macro_rules! primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SameValue for $ty {
                #[inline]
                fn same_value(&self, other: &Self) -> bool {
                    self == other
                }
            }

            impl ShallowEq for $ty {
                #[inline]
                fn shallow_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

primitive!(
    (), bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, str, &str, String,
);

// Date-like: equal iff the timestamps are equal.
primitive!(SystemTime, Instant, Duration);

macro_rules! float {
    ($($ty:ty),*) => {
        $(
            impl SameValue for $ty {
                #[inline]
                fn same_value(&self, other: &Self) -> bool {
                    self == other || (self.is_nan() && other.is_nan())
                }
            }

            impl ShallowEq for $ty {
                #[inline]
                fn shallow_eq(&self, other: &Self) -> bool {
                    self.same_value(other)
                }
            }
        )*
    };
}

float!(f32, f64);

impl<T: ?Sized> SameValue for Arc<T> {
    #[inline]
    fn same_value(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

impl<T: ShallowEq + ?Sized> ShallowEq for Arc<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other) || (**self).shallow_eq(other)
    }
}

impl<T: SameValue> SameValue for Option<T> {
    fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a.same_value(b),
            _ => false,
        }
    }
}

impl<T: ShallowEq> ShallowEq for Option<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (None, None) => true,
            (Some(a), Some(b)) => a.shallow_eq(b),
            _ => false,
        }
    }
}

impl SameValue for Value {
    fn same_value(&self, other: &Self) -> bool {
        super::same_value(self, other)
    }
}

impl ShallowEq for Value {
    fn shallow_eq(&self, other: &Self) -> bool {
        super::shallow_equal(self, other)
    }
}

// Pattern matchers: source text and flags.

impl ShallowEq for Pattern {
    fn shallow_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl ShallowEq for Regex {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

// Sequences: same length, members identical position by position.

fn same_sequence<'a, T, I>(len_a: usize, len_b: usize, a: I, b: I) -> bool
where
    T: SameValue + 'a,
    I: Iterator<Item = &'a T>,
{
    len_a == len_b && a.zip(b).all(|(x, y)| x.same_value(y))
}

impl<T: SameValue> ShallowEq for [T] {
    fn shallow_eq(&self, other: &Self) -> bool {
        same_sequence(self.len(), other.len(), self.iter(), other.iter())
    }
}

impl<T: SameValue, const N: usize> ShallowEq for [T; N] {
    fn shallow_eq(&self, other: &Self) -> bool {
        self[..].shallow_eq(&other[..])
    }
}

impl<T: SameValue> ShallowEq for Vec<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        self[..].shallow_eq(&other[..])
    }
}

impl<T: SameValue> ShallowEq for VecDeque<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        same_sequence(self.len(), other.len(), self.iter(), other.iter())
    }
}

// Keyed maps: same size, every key present with an identical value.

impl<K, V, S> ShallowEq for HashMap<K, V, S>
where
    K: Eq + Hash,
    V: SameValue,
    S: BuildHasher,
{
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|w| v.same_value(w)))
    }
}

impl<K: Ord, V: SameValue> ShallowEq for BTreeMap<K, V> {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|w| v.same_value(w)))
    }
}

impl<K, V, S> ShallowEq for IndexMap<K, V, S>
where
    K: Eq + Hash,
    V: SameValue,
    S: BuildHasher,
{
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|w| v.same_value(w)))
    }
}

// Unique sets: same size, every member present.

impl<T: Eq + Hash, S: BuildHasher> ShallowEq for HashSet<T, S> {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|v| other.contains(v))
    }
}

impl<T: Ord> ShallowEq for BTreeSet<T> {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|v| other.contains(v))
    }
}

impl<T: Eq + Hash, S: BuildHasher> ShallowEq for IndexSet<T, S> {
    fn shallow_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|v| other.contains(v))
    }
}

// Tuples are anonymous records.

macro_rules! tuple {
    ($(($($name:ident : $idx:tt),+)),* $(,)?) => {
        $(
            impl<$($name: SameValue),+> ShallowEq for ($($name,)+) {
                fn shallow_eq(&self, other: &Self) -> bool {
                    true $(&& self.$idx.same_value(&other.$idx))+
                }
            }
        )*
    };
}

tuple!(
    (A: 0),
    (A: 0, B: 1),
    (A: 0, B: 1, C: 2),
    (A: 0, B: 1, C: 2, D: 3),
    (A: 0, B: 1, C: 2, D: 3, E: 4),
    (A: 0, B: 1, C: 2, D: 3, E: 4, F: 5),
);

/// Implement [`ShallowEq`] for a plain struct by comparing the listed fields
/// with [`SameValue`].
///
/// ```rust
/// use selective_core::impl_shallow_eq;
///
/// struct Count {
///     count: i64,
/// }
///
/// impl_shallow_eq!(Count { count });
/// ```
#[macro_export]
macro_rules! impl_shallow_eq {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::equality::ShallowEq for $ty {
            fn shallow_eq(&self, other: &Self) -> bool {
                let _ = other;
                true $(&& $crate::equality::SameValue::same_value(&self.$field, &other.$field))*
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Cart {
        total: f64,
        items: Arc<Vec<String>>,
        owner: Option<String>,
    }

    impl_shallow_eq!(Cart { total, items, owner });

    #[test]
    fn floats_fold_nan_and_zero_sign() {
        assert!(f64::NAN.shallow_eq(&f64::NAN));
        assert!(0.0f64.shallow_eq(&-0.0));
        assert!(!1.0f64.shallow_eq(&1.5));
    }

    #[test]
    fn arc_identity_and_pointee() {
        let a = Arc::new(vec![1, 2]);
        let b = Arc::new(vec![1, 2]);
        assert!(a.same_value(&a.clone()));
        assert!(!a.same_value(&b));
        // ShallowEq looks one level through the Arc.
        assert!(a.shallow_eq(&b));
    }

    #[test]
    fn vec_members_compare_by_reference() {
        let shared = Arc::new(String::from("x"));
        let a = vec![Arc::clone(&shared)];
        let b = vec![Arc::clone(&shared)];
        let c = vec![Arc::new(String::from("x"))];
        assert!(a.shallow_eq(&b));
        assert!(!a.shallow_eq(&c));
    }

    #[test]
    fn maps_ignore_order() {
        let a: IndexMap<&str, i32> = [("a", 1), ("b", 2)].into_iter().collect();
        let b: IndexMap<&str, i32> = [("b", 2), ("a", 1)].into_iter().collect();
        let c: IndexMap<&str, i32> = [("a", 1), ("b", 3)].into_iter().collect();
        assert!(a.shallow_eq(&b));
        assert!(!a.shallow_eq(&c));
    }

    #[test]
    fn sets_ignore_order() {
        let a: HashSet<i32> = [1, 2, 3].into_iter().collect();
        let b: HashSet<i32> = [3, 2, 1].into_iter().collect();
        let c: HashSet<i32> = [1, 2].into_iter().collect();
        assert!(a.shallow_eq(&b));
        assert!(!a.shallow_eq(&c));
    }

    #[test]
    fn regex_by_pattern_text() {
        let a = Regex::new("a+b").unwrap();
        let b = Regex::new("a+b").unwrap();
        let c = Regex::new("(?i)a+b").unwrap();
        assert!(a.shallow_eq(&b));
        assert!(!a.shallow_eq(&c));
    }

    #[test]
    fn struct_macro_compares_fields_one_level() {
        let items = Arc::new(vec![String::from("apple")]);
        let a = Cart {
            total: 3.5,
            items: Arc::clone(&items),
            owner: None,
        };
        let b = Cart {
            total: 3.5,
            items: Arc::clone(&items),
            owner: None,
        };
        let c = Cart {
            total: 3.5,
            items: Arc::new(vec![String::from("apple")]),
            owner: None,
        };
        assert!(a.shallow_eq(&b));
        assert!(!a.shallow_eq(&c));
    }

    #[test]
    fn tuples_compare_members() {
        assert!((1, "a", 2.0).shallow_eq(&(1, "a", 2.0)));
        assert!(!(1, "a").shallow_eq(&(1, "b")));
    }
}
