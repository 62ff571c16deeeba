//! Reconcilers
//!
//! Reconcilers are the orchestration around the pure core: they fetch an
//! observed snapshot from a collaborator, ask a planner what to do, execute
//! the plan and report an [`Outcome`].
//!
//! ## Flow
//!
//! ```text
//!  declaration ──┐
//!                ▼
//!        ┌──────────────┐  show / list   ┌───────────────┐
//!        │  Reconciler  │ ─────────────▶ │  Collaborator │
//!        └──────────────┘ ◀───────────── └───────────────┘
//!                │          snapshot             ▲
//!                ▼                               │
//!        ┌──────────────┐                        │
//!        │   Planner    │ (codec + differ)       │
//!        └──────────────┘                        │
//!                │  plan                         │
//!                └──────── create / replace / ───┘
//!                          patch / change batch
//! ```
//!
//! In dry-run mode no mutating collaborator call is made and the outcome
//! status is [`Status::Pending`].

pub mod object;
pub mod zone;

pub use object::ObjectReconciler;
pub use zone::ZoneReconciler;

use serde::Serialize;
use serde_json::Value;

/// How a reconciliation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Changes were made
    Applied,
    /// Already in the desired state
    Unchanged,
    /// Dry run: changes would be made
    Pending,
    /// The reconciler refused or the collaborator failed
    Failed,
}

/// Report of one reconciliation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    /// Name of the managed zone, record or object
    pub name: String,
    pub status: Status,
    /// What changed, as `{"old": …, "new": …}` or a structural delta
    pub changes: Value,
    pub comment: String,
    /// Skipped declarations and other non-fatal findings
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Outcome {
    fn new(name: impl Into<String>, status: Status, comment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            changes: Value::Object(Default::default()),
            comment: comment.into(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn applied(name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self::new(name, Status::Applied, comment)
    }

    pub(crate) fn unchanged(name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self::new(name, Status::Unchanged, comment)
    }

    pub(crate) fn pending(name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self::new(name, Status::Pending, comment)
    }

    pub(crate) fn failed(name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self::new(name, Status::Failed, comment)
    }

    pub(crate) fn with_changes(mut self, changes: Value) -> Self {
        self.changes = changes;
        self
    }

    pub(crate) fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }

    /// Whether the desired state holds (or would hold, in a dry run)
    pub fn is_success(&self) -> bool {
        self.status != Status::Failed
    }
}

/// `{"old": old, "new": new}`
pub(crate) fn old_new(old: Value, new: Value) -> Value {
    serde_json::json!({ "old": old, "new": new })
}
