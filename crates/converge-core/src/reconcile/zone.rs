// # Zone Reconciler
//
// Converges managed DNS zones through a `ZoneProvider`.
//
// Every change to a zone goes out as one change batch. A batch the provider
// has accepted but not yet applied is reported, not polled.

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{old_new, Outcome};
use crate::codec::{from_flat_records, RecordType, ZoneState};
use crate::config::{ReconcileConfig, ZoneDeclaration};
use crate::error::{Error, Result};
use crate::plan::{ZoneChanges, ZonePlanner};
use crate::traits::{ChangeRecord, ChangeStatus, ZoneProvider};

/// Reconciler for managed zones
pub struct ZoneReconciler {
    provider: Box<dyn ZoneProvider>,
    config: ReconcileConfig,
}

impl ZoneReconciler {
    /// Create a new zone reconciler
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` does not validate.
    pub fn new(provider: Box<dyn ZoneProvider>, config: ReconcileConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { provider, config })
    }

    /// Ensure a zone exists and holds exactly the declared SOA and records
    ///
    /// A missing zone is created and its provider defaults replaced. An
    /// existing zone gets one change batch with the planned additions and
    /// deletions. A plan that would delete every NS record set is refused
    /// with a failed outcome and nothing is submitted.
    pub async fn zone_managed(&self, declaration: &ZoneDeclaration) -> Result<Outcome> {
        declaration.validate()?;

        let name = declaration.name.as_str();
        let project = declaration.project.as_str();
        let desired = ZoneState::new(declaration.soa.clone(), declaration.records.clone());
        let planner = ZonePlanner::new(&declaration.dns_name).with_ttl(self.config.default_ttl);

        let zones = self.provider.list_zones(project).await?;
        if !zones.iter().any(|zone| zone == name) {
            return self.create_zone(declaration, &planner, &desired).await;
        }

        let listed = self.provider.list_resource_record_sets(name, project).await?;
        let changes = match planner.plan_update(&listed, &desired) {
            Ok(changes) => changes,
            Err(err @ Error::LastNameServers { .. }) => {
                warn!("Refusing to update zone {}: {}", name, err);
                return Ok(Outcome::failed(name, format!("Error: {err}")));
            }
            Err(err) => return Err(err),
        };
        let warnings = warnings(&changes);

        if changes.is_empty() {
            debug!("Zone {} is in the desired state", name);
            return Ok(
                Outcome::unchanged(name, format!("Zone {name} is in the desired state"))
                    .with_warnings(warnings),
            );
        }

        let report = changes.delta.to_value();

        if self.config.dry_run {
            return Ok(Outcome::pending(
                name,
                format!(
                    "Zone {name} would get {} additions and {} deletions",
                    changes.additions.len(),
                    changes.deletions.len()
                ),
            )
            .with_changes(report)
            .with_warnings(warnings));
        }

        let comment = self.submit(name, project, &changes).await?;
        Ok(Outcome::applied(name, comment)
            .with_changes(report)
            .with_warnings(warnings))
    }

    /// Ensure a zone does not exist
    pub async fn zone_absent(&self, name: &str, project: &str) -> Result<Outcome> {
        let zones = self.provider.list_zones(project).await?;
        if !zones.iter().any(|zone| zone == name) {
            return Ok(Outcome::unchanged(name, format!("Zone {name} does not exist")));
        }

        if self.config.dry_run {
            return Ok(Outcome::pending(name, format!("Zone {name} is going to be deleted")));
        }

        if self.provider.delete_zone(name, project).await? {
            info!("Deleted zone {}", name);
            Ok(Outcome::applied(name, format!("Zone {name} was deleted"))
                .with_changes(old_new(json!("present"), Value::Null)))
        } else {
            warn!("Provider {} did not delete zone {}", self.provider.provider_name(), name);
            Ok(Outcome::failed(name, format!("Failed to remove zone: {name}")))
        }
    }

    /// Ensure no record set named `name` exists in `zone`
    ///
    /// With `record_type`, only the set of that type is removed; without it,
    /// every set carrying the name is.
    pub async fn record_absent(
        &self,
        name: &str,
        zone: &str,
        project: &str,
        record_type: Option<RecordType>,
    ) -> Result<Outcome> {
        let listed = self.provider.list_resource_record_sets(zone, project).await?;
        let matching: Vec<_> = listed
            .into_iter()
            .filter(|set| set.name == name)
            .filter(|set| {
                record_type
                    .map(|wanted| set.record_type.eq_ignore_ascii_case(wanted.as_str()))
                    .unwrap_or(true)
            })
            .collect();

        if matching.is_empty() {
            return Ok(Outcome::unchanged(name, "Record not found."));
        }

        if self.config.dry_run {
            return Ok(Outcome::pending(
                name,
                format!("{} record sets are going to be removed", matching.len()),
            ));
        }

        let changes = ZoneChanges {
            deletions: matching,
            ..ZoneChanges::default()
        };
        let comment = self.submit(zone, project, &changes).await?;
        Ok(Outcome::applied(name, comment).with_changes(old_new(json!("present"), Value::Null)))
    }

    /// Decoded view of a zone's current contents
    pub async fn show_zone(&self, declaration: &ZoneDeclaration) -> Result<ZoneState> {
        let listed = self
            .provider
            .list_resource_record_sets(&declaration.name, &declaration.project)
            .await?;
        Ok(from_flat_records(&declaration.dns_name, &listed)?.zone)
    }

    /// Change batches of a zone, newest first
    pub async fn change_history(&self, zone: &str, project: &str) -> Result<Vec<ChangeRecord>> {
        let mut changes = self.provider.list_changes(zone, project).await?;
        changes.sort_by(|a, b| b.started.cmp(&a.started));
        Ok(changes)
    }

    async fn create_zone(
        &self,
        declaration: &ZoneDeclaration,
        planner: &ZonePlanner,
        desired: &ZoneState,
    ) -> Result<Outcome> {
        let name = declaration.name.as_str();
        let project = declaration.project.as_str();

        if self.config.dry_run {
            return Ok(Outcome::pending(name, format!("Zone {name} is going to be created"))
                .with_changes(desired.to_value()));
        }

        self.provider
            .create_zone(
                name,
                &declaration.dns_name,
                declaration.description.as_deref(),
                project,
            )
            .await?;
        info!("Created zone {} ({})", name, planner.dns_name());

        let defaults = self.provider.list_resource_record_sets(name, project).await?;
        let changes = planner.plan_new_zone(&defaults, desired)?;
        let mut comment = format!("Zone {name} created.");
        if !changes.is_empty() {
            comment = format!("{comment} {}", self.submit(name, project, &changes).await?);
        }

        Ok(Outcome::applied(name, comment)
            .with_changes(old_new(Value::Null, json!(format!("Zone {name} created."))))
            .with_warnings(warnings(&changes)))
    }

    async fn submit(&self, zone: &str, project: &str, changes: &ZoneChanges) -> Result<String> {
        for set in &changes.additions {
            debug!("Record set to add: {:?}", set);
        }
        for set in &changes.deletions {
            debug!("Record set to remove: {:?}", set);
        }

        let status = self
            .provider
            .submit_change_batch(zone, project, &changes.additions, &changes.deletions)
            .await
            .map_err(|e| Error::provider(self.provider.provider_name(), e.to_string()))?;

        info!(
            "Submitted {} additions and {} deletions to zone {}",
            changes.additions.len(),
            changes.deletions.len(),
            zone
        );

        Ok(match status {
            ChangeStatus::Done => "Changes applied".to_string(),
            ChangeStatus::InProgress(status) => format!("Changes submitted, status: {status}"),
        })
    }
}

fn warnings(changes: &ZoneChanges) -> Vec<String> {
    changes.diagnostics.iter().map(ToString::to_string).collect()
}
