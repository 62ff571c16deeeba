// # Zone Provider Trait
//
// Defines the interface to a zone-based DNS provider (managed zones holding
// record sets, changed through batched additions/deletions).
//
// ## Usage
//
// ```rust,ignore
// use converge_core::traits::ZoneProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* ZoneProvider implementation */;
//
//     let sets = provider.list_resource_record_sets("example-com", "my-project").await?;
//     let status = provider
//         .submit_change_batch("example-com", "my-project", &[], &sets[..1])
//         .await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::FlatRecordSet;

/// State of a submitted change batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    /// The provider applied every addition and deletion
    Done,
    /// Still being applied; carries the provider's status string
    InProgress(String),
}

impl ChangeStatus {
    /// Interpret a provider status string
    pub fn from_status(status: &str) -> Self {
        if status == "done" {
            Self::Done
        } else {
            Self::InProgress(status.to_string())
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// A change batch as listed by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// When the provider started applying the batch
    pub started: DateTime<Utc>,
    pub status: ChangeStatus,
}

/// Trait for zone provider implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Responsibilities
///
/// Providers perform API calls and translate responses. They never decide
/// whether a change is needed, never retry, and never poll a submitted
/// batch; those are reconciler concerns.
#[async_trait]
pub trait ZoneProvider: Send + Sync {
    /// Names of the zones in a project
    async fn list_zones(&self, project: &str) -> Result<Vec<String>, crate::Error>;

    /// Create a zone
    ///
    /// Providers seed new zones with default SOA and NS record sets.
    async fn create_zone(
        &self,
        name: &str,
        dns_name: &str,
        description: Option<&str>,
        project: &str,
    ) -> Result<(), crate::Error>;

    /// Delete a zone
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: the zone was deleted
    /// - `Ok(false)`: the zone did not exist
    async fn delete_zone(&self, name: &str, project: &str) -> Result<bool, crate::Error>;

    /// Every record set of a zone, SOA and NS included
    async fn list_resource_record_sets(
        &self,
        zone: &str,
        project: &str,
    ) -> Result<Vec<FlatRecordSet>, crate::Error>;

    /// Submit one batch of additions and deletions
    ///
    /// The batch is atomic at the provider. A status other than
    /// [`ChangeStatus::Done`] means the batch was accepted but not yet applied.
    async fn submit_change_batch(
        &self,
        zone: &str,
        project: &str,
        additions: &[FlatRecordSet],
        deletions: &[FlatRecordSet],
    ) -> Result<ChangeStatus, crate::Error>;

    /// Change batches submitted to a zone
    async fn list_changes(
        &self,
        zone: &str,
        project: &str,
    ) -> Result<Vec<ChangeRecord>, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
