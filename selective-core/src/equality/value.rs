//! Dynamic Values
//!
//! `Value` is a closed model of the shapes a loosely typed state tree can
//! hold. It exists so that containers whose state is not a fixed Rust type
//! (hydrated JSON, plugin payloads, scripted selectors) can still use the
//! shallow comparator, and so that selectors and comparators can arrive as
//! data and be validated at first use.
//!
//! # Shapes
//!
//! - null-like: `Undefined`, `Null` (distinct from each other)
//! - primitives: `Bool`, `Number`, `String`
//! - function references: `Function`
//! - compounds, each behind an `Arc` so identity is observable:
//!   `Date`, `Pattern`, `Map`, `Set`, `Array`, `Object`
//!
//! Map keys and set members are restricted to primitive [`Key`]s.
//!
//! `==` on `Value` is deep structural equality (functions by pointer). The
//! memoization rules live in [`shallow_equal`](super::shallow_equal).

use std::fmt::{self, Debug};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use regex::{Regex, RegexBuilder};

/// A dynamically shaped value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Arc<str>),
    Function(Callable),
    Date(Arc<Date>),
    Pattern(Arc<Pattern>),
    Map(Arc<IndexMap<Key, Value>>),
    Set(Arc<IndexSet<Key>>),
    Array(Arc<Vec<Value>>),
    Object(Arc<IndexMap<Arc<str>, Value>>),
}

impl Value {
    /// Build a plain object from `(key, value)` pairs, keeping insertion order.
    pub fn object<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<Arc<str>>,
    {
        Value::Object(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Build an array.
    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        Value::Array(Arc::new(items.into_iter().collect()))
    }

    /// Build a keyed map.
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<Key>,
    {
        Value::Map(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Build a unique-value set.
    pub fn set<I, K>(members: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        Value::Set(Arc::new(members.into_iter().map(Into::into).collect()))
    }

    /// Build a date from milliseconds since the Unix epoch.
    pub fn date(millis: f64) -> Self {
        Value::Date(Arc::new(Date::from_millis(millis)))
    }

    /// Build a pattern matcher from source text and mode flags.
    pub fn pattern(source: &str, flags: &str) -> Result<Self, regex::Error> {
        Pattern::new(source, flags).map(|p| Value::Pattern(Arc::new(p)))
    }

    /// Wrap a closure as a function value.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Value::Function(Callable::new(f))
    }

    /// Copy of this object with `key` set to `value`.
    ///
    /// Non-objects are treated as empty objects.
    pub fn with(&self, key: impl Into<Arc<str>>, value: Value) -> Self {
        let mut entries = match self {
            Value::Object(entries) => (**entries).clone(),
            _ => IndexMap::new(),
        };
        entries.insert(key.into(), value);
        Value::Object(Arc::new(entries))
    }

    /// Own property lookup on objects.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Element lookup on arrays.
    pub fn index(&self, i: usize) -> Option<&Value> {
        match self {
            Value::Array(items) => items.get(i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Callable> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// `Undefined` or `Null`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Compound shapes are the ones with reference identity.
    pub fn is_compound(&self) -> bool {
        matches!(
            self,
            Value::Date(_)
                | Value::Pattern(_)
                | Value::Map(_)
                | Value::Set(_)
                | Value::Array(_)
                | Value::Object(_)
        )
    }

    /// Truthiness, used to read the result of a dynamic comparator.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Short shape name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
            Value::Date(_) => "date",
            Value::Pattern(_) => "pattern",
            Value::Map(_) => "map",
            Value::Set(_) => "set",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Date(a), Value::Date(b)) => a.millis() == b.millis(),
            (Value::Pattern(a), Value::Pattern(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => Debug::fmt(b, f),
            Value::Number(n) => Debug::fmt(n, f),
            Value::String(s) => Debug::fmt(s, f),
            Value::Function(c) => Debug::fmt(c, f),
            Value::Date(d) => Debug::fmt(d, f),
            Value::Pattern(p) => Debug::fmt(p, f),
            Value::Map(m) => f.debug_map().entries(m.iter()).finish(),
            Value::Set(s) => f.debug_set().entries(s.iter()).finish(),
            Value::Array(a) => f.debug_list().entries(a.iter()).finish(),
            Value::Object(o) => f.debug_map().entries(o.iter()).finish(),
        }
    }
}

macro_rules! number_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

number_from!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::array(items.into_iter().map(Into::into))
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => Value::array(items.into_iter().map(Value::from)),
            serde_json::Value::Object(entries) => {
                Value::object(entries.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Keys
// ----------------------------------------------------------------------------

/// A primitive usable as a map key or set member.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Undefined,
    Null,
    Bool(bool),
    Number(Number),
    String(Arc<str>),
}

impl Key {
    /// The key as a value.
    pub fn to_value(&self) -> Value {
        match self {
            Key::Undefined => Value::Undefined,
            Key::Null => Value::Null,
            Key::Bool(b) => Value::Bool(*b),
            Key::Number(n) => Value::Number(n.get()),
            Key::String(s) => Value::String(Arc::clone(s)),
        }
    }

    /// Primitive values convert; compounds and functions do not.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Undefined => Some(Key::Undefined),
            Value::Null => Some(Key::Null),
            Value::Bool(b) => Some(Key::Bool(*b)),
            Value::Number(n) => Some(Key::Number(Number::new(*n))),
            Value::String(s) => Some(Key::String(Arc::clone(s))),
            _ => None,
        }
    }
}

impl Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.to_value(), f)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::String(Arc::from(s))
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::String(Arc::from(s))
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Key::Bool(b)
    }
}

impl From<f64> for Key {
    fn from(n: f64) -> Self {
        Key::Number(Number::new(n))
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::Number(Number::new(f64::from(n)))
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Number(Number::new(n as f64))
    }
}

/// A float with key semantics: every NaN is the same key and `-0` is `0`.
#[derive(Clone, Copy)]
pub struct Number(f64);

impl Number {
    pub fn new(n: f64) -> Self {
        if n.is_nan() {
            Self(f64::NAN)
        } else if n == 0.0 {
            Self(0.0)
        } else {
            Self(n)
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Number {}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl Debug for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

// ----------------------------------------------------------------------------
// Functions
// ----------------------------------------------------------------------------

/// A shared function reference. Two callables are the same function only
/// if they share an allocation.
#[derive(Clone)]
pub struct Callable(Arc<dyn Fn(&[Value]) -> Value + Send + Sync>);

impl Callable {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function@{:p}", Arc::as_ptr(&self.0).cast::<()>())
    }
}

// ----------------------------------------------------------------------------
// Dates
// ----------------------------------------------------------------------------

/// A point in time as milliseconds since the Unix epoch. NaN marks an
/// invalid date.
#[derive(Clone, Copy, Debug)]
pub struct Date {
    millis: f64,
}

impl Date {
    pub fn from_millis(millis: f64) -> Self {
        Self { millis }
    }

    pub fn millis(&self) -> f64 {
        self.millis
    }

    pub fn is_valid(&self) -> bool {
        !self.millis.is_nan()
    }
}

// ----------------------------------------------------------------------------
// Patterns
// ----------------------------------------------------------------------------

/// Canonical flag order.
const FLAG_ORDER: &str = "dgimsuvy";

/// A compiled pattern matcher that remembers its source text and flags.
///
/// `i`, `m` and `s` change matching; the remaining flags are kept for
/// identity only.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    flags: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str, flags: &str) -> Result<Self, regex::Error> {
        let flags: String = FLAG_ORDER.chars().filter(|c| flags.contains(*c)).collect();
        let regex = RegexBuilder::new(source)
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'))
            .build()?;
        Ok(Self {
            source: source.to_owned(),
            flags,
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.flags == other.flags
    }
}

impl Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_keeps_insertion_order() {
        let value = Value::object([("b", Value::from(1)), ("a", Value::from(2))]);
        let Value::Object(entries) = &value else {
            panic!("expected object");
        };
        let keys: Vec<&str> = entries.keys().map(|k| &**k).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    #[test]
    fn with_replaces_one_key_and_shares_the_rest() {
        let items = Value::array([Value::from(1)]);
        let before = Value::object([("count", Value::from(1)), ("items", items.clone())]);
        let after = before.with("count", Value::from(2));

        assert_eq!(after.get("count"), Some(&Value::from(2)));
        assert_eq!(before.get("count"), Some(&Value::from(1)));

        let (Some(Value::Array(a)), Value::Array(b)) = (after.get("items"), &items) else {
            panic!("expected arrays");
        };
        assert!(Arc::ptr_eq(a, b));
    }

    #[test]
    fn number_keys_fold_nan_and_negative_zero() {
        assert_eq!(Key::from(f64::NAN), Key::from(-f64::NAN));
        assert_eq!(Key::from(0.0), Key::from(-0.0));
        assert_ne!(Key::from(1.0), Key::from(2.0));
    }

    #[test]
    fn pattern_canonicalizes_flags() {
        let p = Pattern::new("ab+c", "mig").unwrap();
        assert_eq!(p.flags(), "gim");
        assert!(p.is_match("xABBC"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(Value::pattern("(", "").is_err());
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::object(Vec::<(&str, Value)>::new()).is_truthy());
    }

    #[test]
    fn accessors_match_only_their_shape() {
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from("x").as_bool(), None);
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::from(1).as_str(), None);

        let f = Value::function(|_| Value::from(7));
        assert_eq!(f.as_function().map(|c| c.call(&[])), Some(Value::from(7)));
        assert!(Value::Null.as_function().is_none());

        assert!(Value::Undefined.is_nullish());
        assert!(Value::Null.is_nullish());
        assert!(!Value::from(0).is_nullish());
        assert!(!Value::from(false).is_nullish());
    }

    #[test]
    fn kind_names_each_shape() {
        let cases = [
            (Value::Undefined, "undefined"),
            (Value::Null, "null"),
            (Value::from(false), "bool"),
            (Value::from(1.5), "number"),
            (Value::from("s"), "string"),
            (Value::function(|_| Value::Null), "function"),
            (Value::date(0.0), "date"),
            (Value::pattern("a", "").unwrap(), "pattern"),
        ];
        for (value, kind) in cases {
            assert_eq!(value.kind(), kind);
        }
    }

    #[test]
    fn keys_convert_from_primitives_only() {
        assert_eq!(Key::from_value(&Value::from("a")), Some(Key::from("a")));
        assert_eq!(Key::from_value(&Value::from(2)), Some(Key::from(2)));
        assert_eq!(Key::from_value(&Value::Null), Some(Key::Null));
        assert_eq!(Key::from_value(&Value::array([])), None);
        assert_eq!(Key::from_value(&Value::function(|_| Value::Null)), None);

        let key = Key::from(true);
        assert_eq!(Key::from_value(&key.to_value()), Some(key));
    }

    #[test]
    fn nan_millis_is_an_invalid_date() {
        assert!(Date::from_millis(0.0).is_valid());
        assert!(!Date::from_millis(f64::NAN).is_valid());
    }

    #[test]
    fn callable_identity_is_by_allocation() {
        let f = Callable::new(|_| Value::Null);
        let g = Callable::new(|_| Value::Null);
        assert!(f.ptr_eq(&f.clone()));
        assert!(!f.ptr_eq(&g));
    }

    #[cfg(feature = "json")]
    #[test]
    fn converts_from_json() {
        let value = Value::from(serde_json::json!({ "count": 5, "tags": ["a"], "none": null }));
        assert_eq!(value.get("count"), Some(&Value::from(5)));
        assert_eq!(value.get("none"), Some(&Value::Null));
        assert_eq!(
            value.get("tags").and_then(|t| t.index(0)),
            Some(&Value::from("a"))
        );
    }
}
