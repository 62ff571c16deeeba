// # Object Planning
//
// Decides what to do with one cluster object given its declared body and
// what the cluster currently holds.

use serde_json::Value;

use crate::differ::{diff, Delta};

/// How a declared body is applied to an existing object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyMode {
    /// Replace the whole object with the declared body
    #[default]
    Replace,
    /// Only merge in what the object is missing
    Patch,
}

impl ApplyMode {
    pub fn from_patch_flag(patch: bool) -> Self {
        if patch { Self::Patch } else { Self::Replace }
    }
}

/// What the reconciler has to do with an object
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectAction {
    /// The object does not exist yet
    Create { body: Value },
    /// The object differs from its declaration
    Replace { body: Value, delta: Delta },
    /// The object lacks part of its declaration; `patch` is exactly the
    /// `new` side of `delta`
    Patch { patch: Value, delta: Delta },
    /// The object already satisfies its declaration
    Unchanged,
    /// Patch mode was asked for an object that does not exist
    MissingForPatch,
}

/// Plan the action that makes `observed` satisfy `desired`
///
/// "Satisfy" is the differ's subset relation: fields the cluster adds on
/// its own (status, defaults, generated metadata) never cause a change.
pub fn plan_object(desired: &Value, observed: Option<&Value>, mode: ApplyMode) -> ObjectAction {
    let Some(observed) = observed else {
        return match mode {
            ApplyMode::Patch => ObjectAction::MissingForPatch,
            ApplyMode::Replace => ObjectAction::Create {
                body: desired.clone(),
            },
        };
    };

    let delta = diff(desired, observed);
    let Some(patch) = delta.new_value().cloned() else {
        return ObjectAction::Unchanged;
    };

    match mode {
        ApplyMode::Patch => ObjectAction::Patch { patch, delta },
        ApplyMode::Replace => ObjectAction::Replace {
            body: desired.clone(),
            delta,
        },
    }
}
