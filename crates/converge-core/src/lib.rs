// # converge-core
//
// Core library for declarative reconciliation of DNS zones and cluster
// objects.
//
// ## Architecture Overview
//
// Given a declared desired state and an observed state, the core computes
// the minimal set of changes that converges one onto the other:
// - **codec**: Type-grouped DNS record declarations ⇄ flat provider record sets
// - **differ**: Structural subset/superset comparison of JSON trees
// - **plan**: Pure change planning for zones and cluster objects
// - **traits**: Narrow interfaces to zone and cluster providers
// - **reconcile**: Reconcilers that fetch snapshots, plan and apply
//
// ## Design Principles
//
// 1. **Pure Core**: codec, differ and planners do no I/O and hold no state
// 2. **Skip, Don't Abort**: unsupported records become diagnostics, not errors
// 3. **Idempotency**: reconciling a converged system submits nothing
// 4. **Library-First**: the CLI is a thin wrapper over this crate

pub mod codec;
pub mod config;
pub mod differ;
pub mod error;
pub mod plan;
pub mod reconcile;
pub mod traits;

// Re-export core types for convenience
pub use codec::{
    from_flat_records, to_flat_records, DesiredRecords, Diagnostic, FlatRecordSet, RecordType,
    RecordValue, Soa, ZoneState,
};
pub use config::{ObjectDeclaration, PollConfig, ReconcileConfig, ZoneDeclaration};
pub use differ::{diff, Delta, KeyDiff};
pub use error::{Error, Result};
pub use plan::{plan_object, ApplyMode, ObjectAction, ZoneChanges, ZonePlanner};
pub use reconcile::{ObjectReconciler, Outcome, Status, ZoneReconciler};
pub use traits::{ClusterProvider, ResourceKind, ZoneProvider};
