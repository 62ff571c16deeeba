//! Collaborator traits
//!
//! The core never performs I/O itself. These are the narrow interfaces to
//! the systems it reconciles:
//!
//! - [`ZoneProvider`]: managed DNS zones and their record sets
//! - [`ClusterProvider`]: cluster objects of the kinds in [`ResourceKind`]

pub mod cluster_provider;
pub mod zone_provider;

pub use cluster_provider::{ClusterProvider, DeleteStatus, ResourceKind};
pub use zone_provider::{ChangeRecord, ChangeStatus, ZoneProvider};
