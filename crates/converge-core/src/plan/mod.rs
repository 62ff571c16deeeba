//! Change planning
//!
//! Pure decisions built on the codec and the differ. Planners look at an
//! observed snapshot and a declaration and say what must be submitted; they
//! never talk to a provider. The reconcilers in [`crate::reconcile`] fetch
//! the snapshots and execute the plans.

pub mod object;
pub mod zone;

pub use object::{plan_object, ApplyMode, ObjectAction};
pub use zone::{normalize_records, ZoneChanges, ZonePlanner};
