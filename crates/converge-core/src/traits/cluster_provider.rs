// # Cluster Provider Trait
//
// Defines the interface to a cluster-orchestration API: show, create,
// replace, patch and delete objects of a fixed set of kinds.
//
// Object bodies are plain JSON trees; the core only ever diffs them.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kinds of cluster objects the reconciler manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Deployment,
    Ingress,
    Service,
    Pod,
    Secret,
    Configmap,
    Namespace,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deployment => "deployment",
            Self::Ingress => "ingress",
            Self::Service => "service",
            Self::Pod => "pod",
            Self::Secret => "secret",
            Self::Configmap => "configmap",
            Self::Namespace => "namespace",
        }
    }

    /// Whether objects of this kind live inside a namespace
    pub fn is_namespaced(&self) -> bool {
        !matches!(self, Self::Namespace)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer of the cluster to a delete request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteStatus {
    /// The object is gone
    Deleted,
    /// Deletion was accepted and is still running (e.g., "Terminating")
    Pending(String),
    /// The cluster refused or failed the deletion
    Failed(String),
}

/// Trait for cluster provider implementations
///
/// `namespace` is ignored for kinds that are not namespaced.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait ClusterProvider: Send + Sync {
    /// Current object, or `None` when it does not exist
    async fn show(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: &str,
    ) -> Result<Option<Value>, crate::Error>;

    async fn create(
        &self,
        kind: ResourceKind,
        name: &str,
        body: &Value,
        namespace: &str,
    ) -> Result<Value, crate::Error>;

    /// Replace the whole object with `body`
    async fn replace(
        &self,
        kind: ResourceKind,
        name: &str,
        body: &Value,
        namespace: &str,
    ) -> Result<Value, crate::Error>;

    /// Merge `body` into the existing object
    async fn patch(
        &self,
        kind: ResourceKind,
        name: &str,
        body: &Value,
        namespace: &str,
    ) -> Result<Value, crate::Error>;

    async fn delete(
        &self,
        kind: ResourceKind,
        name: &str,
        namespace: &str,
    ) -> Result<DeleteStatus, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_kind_names() {
        assert_eq!(ResourceKind::Configmap.to_string(), "configmap");
        assert!(ResourceKind::Pod.is_namespaced());
        assert!(!ResourceKind::Namespace.is_namespaced());

        let kind: ResourceKind = serde_json::from_str(r#""ingress""#).unwrap();
        assert_eq!(kind, ResourceKind::Ingress);
    }
}
