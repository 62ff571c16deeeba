//! State differ
//!
//! Structural comparison of a desired-state tree (the *subset*) against an
//! observed-state tree (the *superset*). The result describes what in the
//! subset is missing from, or different in, the superset; anything the
//! superset has beyond the subset is ignored.
//!
//! Trees are [`serde_json::Value`]s and the comparison recurses on the shape
//! of the subset:
//!
//! - **Mapping**: every declared key is compared with the observed value
//!   under the same key. A key the superset lacks is new, with `null` as its
//!   old value. A key whose observed value has a different container shape
//!   (a mapping observed as a scalar, say) is new as a whole, and the old
//!   side of the delta becomes the entire observed mapping.
//! - **Sequence**: elements are compared by position and only differing
//!   positions are kept, in order. Positions past the end of the observed
//!   sequence are new, with `null` as their old value.
//! - **Scalar**: reported when it differs from the observed value, or when
//!   the observed value is a mapping or a sequence.
//!
//! Missing keys and shape mismatches are ordinary outcomes, never errors.
//! [`diff`] is pure and may be called concurrently on independent inputs.

pub mod keys;

pub use keys::KeyDiff;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Result of [`diff`]
///
/// An unchanged node means no change is needed at or below it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Delta {
    #[default]
    Unchanged,
    Changed {
        /// The parts of the subset that must be applied
        new: Value,
        /// What the superset held in their place
        old: Value,
    },
}

impl Delta {
    pub fn changed(new: Value, old: Value) -> Self {
        Self::Changed { new, old }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Unchanged)
    }

    /// The `new` side, if anything changed
    pub fn new_value(&self) -> Option<&Value> {
        match self {
            Self::Changed { new, .. } => Some(new),
            Self::Unchanged => None,
        }
    }

    /// The `old` side, if anything changed
    pub fn old_value(&self) -> Option<&Value> {
        match self {
            Self::Changed { old, .. } => Some(old),
            Self::Unchanged => None,
        }
    }

    /// `{}` when unchanged, `{"new": …, "old": …}` otherwise
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Self::Changed { new, old } = self {
            map.insert("new".to_string(), new.clone());
            map.insert("old".to_string(), old.clone());
        }
        Value::Object(map)
    }
}

impl Serialize for Delta {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Compare `subset` (desired) against `superset` (observed)
///
/// # Examples
///
/// ```
/// use converge_core::differ::{diff, Delta};
/// use serde_json::json;
///
/// let delta = diff(&json!({"a": 1, "b": 2}), &json!({"a": 1}));
/// assert_eq!(delta, Delta::changed(json!({"b": 2}), json!({"b": null})));
///
/// assert!(diff(&json!(5), &json!(5)).is_empty());
/// ```
pub fn diff(subset: &Value, superset: &Value) -> Delta {
    match subset {
        Value::Object(fields) => diff_mapping(fields, superset),
        Value::Array(items) => diff_sequence(items, superset),
        scalar => diff_scalar(scalar, superset),
    }
}

fn diff_mapping(fields: &Map<String, Value>, superset: &Value) -> Delta {
    let Value::Object(observed) = superset else {
        // No keys to look up: everything declared is new.
        if fields.is_empty() {
            return Delta::Unchanged;
        }
        return Delta::changed(Value::Object(fields.clone()), superset.clone());
    };

    let mut new = Map::new();
    let mut old = Map::new();
    let mut shape_mismatch = false;

    for (key, value) in fields {
        let Some(current) = observed.get(key) else {
            new.insert(key.clone(), value.clone());
            old.insert(key.clone(), Value::Null);
            continue;
        };

        if !same_shape(value, current) {
            if !is_empty_container(value) {
                new.insert(key.clone(), value.clone());
                shape_mismatch = true;
            }
            continue;
        }

        if let Delta::Changed { new: n, old: o } = diff(value, current) {
            new.insert(key.clone(), n);
            old.insert(key.clone(), o);
        }
    }

    if new.is_empty() {
        return Delta::Unchanged;
    }

    let old = if shape_mismatch {
        superset.clone()
    } else {
        Value::Object(old)
    };
    Delta::changed(Value::Object(new), old)
}

fn diff_sequence(items: &[Value], superset: &Value) -> Delta {
    let Value::Array(observed) = superset else {
        if items.is_empty() {
            return Delta::Unchanged;
        }
        return Delta::changed(Value::Array(items.to_vec()), superset.clone());
    };

    let mut new = Vec::new();
    let mut old = Vec::new();

    for (index, value) in items.iter().enumerate() {
        match observed.get(index) {
            Some(current) => {
                if let Delta::Changed { new: n, old: o } = diff(value, current) {
                    new.push(n);
                    old.push(o);
                }
            }
            None => {
                new.push(value.clone());
                old.push(Value::Null);
            }
        }
    }

    if new.is_empty() {
        Delta::Unchanged
    } else {
        Delta::changed(Value::Array(new), Value::Array(old))
    }
}

fn diff_scalar(scalar: &Value, superset: &Value) -> Delta {
    match superset {
        Value::Object(_) | Value::Array(_) => Delta::changed(scalar.clone(), superset.clone()),
        observed if observed == scalar => Delta::Unchanged,
        observed => Delta::changed(scalar.clone(), observed.clone()),
    }
}

/// Whether `current` can be recursed into for `value`
///
/// Scalars compare against anything.
fn same_shape(value: &Value, current: &Value) -> bool {
    match value {
        Value::Object(_) => current.is_object(),
        Value::Array(_) => current.is_array(),
        _ => true,
    }
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
