// # Object Reconciler
//
// Converges cluster objects through a `ClusterProvider`.
//
// Deletions may complete asynchronously. After a pending delete the
// reconciler polls `show` until the object is gone or the configured limit
// elapses; running out of time is logged and reported, not treated as an
// error, since the deletion itself was accepted.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{old_new, Outcome};
use crate::config::{ObjectDeclaration, ReconcileConfig};
use crate::error::{Error, Result};
use crate::plan::{plan_object, ApplyMode, ObjectAction};
use crate::traits::{ClusterProvider, DeleteStatus, ResourceKind};

/// Reconciler for cluster objects
pub struct ObjectReconciler {
    provider: Box<dyn ClusterProvider>,
    config: ReconcileConfig,
}

impl ObjectReconciler {
    /// Create a new object reconciler
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` does not validate.
    pub fn new(provider: Box<dyn ClusterProvider>, config: ReconcileConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { provider, config })
    }

    /// Ensure an object exists and satisfies its declared body
    ///
    /// In replace mode a drifted object is replaced with the full body; in
    /// patch mode only the missing or different subtree is sent.
    pub async fn manage_object(&self, declaration: &ObjectDeclaration) -> Result<Outcome> {
        declaration.validate()?;

        let kind = declaration.kind;
        let name = declaration.name.as_str();
        let namespace = declaration.namespace.as_str();
        let body = &declaration.body;

        let observed = self.provider.show(kind, name, namespace).await?;
        let action = plan_object(
            body,
            observed.as_ref(),
            ApplyMode::from_patch_flag(declaration.patch),
        );

        match action {
            ObjectAction::Unchanged => {
                debug!("{} {}/{} satisfies its declaration", kind, namespace, name);
                Ok(Outcome::unchanged(
                    name,
                    format!("The {kind} is already in the desired state"),
                ))
            }
            ObjectAction::MissingForPatch => Ok(Outcome::failed(
                name,
                format!("{kind} does not exist - cannot patch"),
            )),
            ObjectAction::Create { body } => {
                let changes = report(kind, old_new(json!({}), body.clone()));
                if self.config.dry_run {
                    return Ok(Outcome::pending(name, format!("The {kind} is going to be created"))
                        .with_changes(changes));
                }
                self.provider
                    .create(kind, name, &body, namespace)
                    .await
                    .map_err(|e| self.provider_error(e))?;
                info!("Created {} {}/{}", kind, namespace, name);
                Ok(Outcome::applied(name, format!("Created {kind}")).with_changes(changes))
            }
            ObjectAction::Replace { body, delta } => {
                let changes = report(kind, delta.to_value());
                if self.config.dry_run {
                    return Ok(Outcome::pending(name, format!("The {kind} is going to be replaced"))
                        .with_changes(changes));
                }
                self.provider
                    .replace(kind, name, &body, namespace)
                    .await
                    .map_err(|e| self.provider_error(e))?;
                info!("Replaced {} {}/{}", kind, namespace, name);
                Ok(Outcome::applied(name, format!("Replaced {kind}")).with_changes(changes))
            }
            ObjectAction::Patch { patch, delta } => {
                let changes = report(kind, delta.to_value());
                if self.config.dry_run {
                    return Ok(Outcome::pending(name, format!("The {kind} is going to be patched"))
                        .with_changes(changes));
                }
                self.provider
                    .patch(kind, name, &patch, namespace)
                    .await
                    .map_err(|e| self.provider_error(e))?;
                info!("Patched {} {}/{}", kind, namespace, name);
                Ok(Outcome::applied(name, format!("Patched {kind}")).with_changes(changes))
            }
        }
    }

    /// Ensure an object does not exist
    pub async fn object_absent(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: &str,
    ) -> Result<Outcome> {
        if self.provider.show(kind, name, namespace).await?.is_none() {
            return Ok(Outcome::unchanged(name, format!("The {kind} does not exist")));
        }

        if self.config.dry_run {
            return Ok(Outcome::pending(name, format!("The {kind} is going to be deleted")));
        }

        let status = self
            .provider
            .delete(kind, name, namespace)
            .await
            .map_err(|e| self.provider_error(e))?;

        let comment = match status {
            DeleteStatus::Deleted => format!("Deleted {kind}"),
            DeleteStatus::Pending(message) => {
                if self.wait_until_gone(kind, name, namespace).await? {
                    message
                } else {
                    warn!(
                        "Reached polling time limit. {} {}/{} is not yet deleted, backing off",
                        kind, namespace, name
                    );
                    format!(
                        "{message}; {kind} still present after {}s, check manually",
                        self.config.delete_poll.limit_secs
                    )
                }
            }
            DeleteStatus::Failed(message) => {
                return Ok(Outcome::failed(
                    name,
                    format!("Something went wrong, response: {message}"),
                ));
            }
        };

        info!("Deleted {} {}/{}", kind, namespace, name);
        let mut changes = serde_json::Map::new();
        changes.insert(
            format!("kubernetes.{kind}"),
            old_new(json!("present"), json!("absent")),
        );
        Ok(Outcome::applied(name, comment).with_changes(Value::Object(changes)))
    }

    /// Ensure a namespace exists
    pub async fn namespace_present(&self, name: &str) -> Result<Outcome> {
        let kind = ResourceKind::Namespace;
        if self.provider.show(kind, name, "").await?.is_some() {
            return Ok(Outcome::unchanged(name, "The namespace already exists"));
        }

        if self.config.dry_run {
            return Ok(Outcome::pending(name, "The namespace is going to be created"));
        }

        let body = json!({ "metadata": { "name": name } });
        let created = self
            .provider
            .create(kind, name, &body, "")
            .await
            .map_err(|e| self.provider_error(e))?;
        info!("Created namespace {}", name);

        Ok(Outcome::applied(name, "Created namespace")
            .with_changes(json!({ "namespace": old_new(json!({}), created) })))
    }

    /// Poll until the object disappears; `false` if the limit elapsed first
    async fn wait_until_gone(&self, kind: ResourceKind, name: &str, namespace: &str) -> Result<bool> {
        let interval = Duration::from_millis(self.config.delete_poll.interval_ms);
        let limit = Duration::from_secs(self.config.delete_poll.limit_secs);

        let poll = async {
            loop {
                if self.provider.show(kind, name, namespace).await?.is_none() {
                    return Ok::<(), Error>(());
                }
                tokio::time::sleep(interval).await;
            }
        };

        match tokio::time::timeout(limit, poll).await {
            Ok(result) => result.map(|()| true),
            Err(_) => Ok(false),
        }
    }

    fn provider_error(&self, err: Error) -> Error {
        Error::provider(self.provider.provider_name(), err.to_string())
    }
}

/// Changes as reported for `kind`
///
/// Secret payloads are unencrypted, so only their keys are reported.
fn report(kind: ResourceKind, changes: Value) -> Value {
    if kind != ResourceKind::Secret {
        return changes;
    }
    redact(changes)
}

fn redact(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| {
                    let value = match (key.as_str(), value) {
                        ("data" | "stringData", Value::Object(entries)) => {
                            Value::Array(entries.keys().cloned().map(Value::String).collect())
                        }
                        (_, value) => redact(value),
                    };
                    (key, value)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(redact).collect()),
        scalar => scalar,
    }
}
