//! Configuration types for the reconciliation layer
//!
//! This module defines reconciler settings and the declarations that feed
//! them. Declarations arrive already rendered; templating happens upstream.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::{DesiredRecords, Soa, DEFAULT_TTL};
use crate::traits::ResourceKind;

/// Reconciler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Report what would change without calling any mutating collaborator
    #[serde(default)]
    pub dry_run: bool,

    /// TTL given to every record set the reconciler submits
    #[serde(default = "default_ttl")]
    pub default_ttl: u32,

    /// Bounded wait for asynchronous deletions
    #[serde(default)]
    pub delete_poll: PollConfig,
}

impl ReconcileConfig {
    pub fn new() -> Self {
        Self {
            dry_run: false,
            default_ttl: default_ttl(),
            delete_poll: PollConfig::default(),
        }
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the deletion polling policy
    pub fn with_delete_poll(mut self, delete_poll: PollConfig) -> Self {
        self.delete_poll = delete_poll;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.default_ttl == 0 {
            return Err(crate::Error::config("default_ttl must be > 0"));
        }
        self.delete_poll.validate()
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Polling policy while waiting for a deleted object to disappear
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Delay between two `show` calls (in milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    /// Give up waiting after this many seconds
    ///
    /// The deletion has still been requested; the outcome only notes that
    /// the object was not yet gone.
    #[serde(default = "default_poll_limit_secs")]
    pub limit_secs: u64,
}

impl PollConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_ms == 0 {
            return Err(crate::Error::config("delete_poll.interval_ms must be > 0"));
        }
        Ok(())
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            limit_secs: default_poll_limit_secs(),
        }
    }
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_poll_limit_secs() -> u64 {
    30
}

/// Desired state of one managed zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDeclaration {
    /// Provider-side zone name (e.g., "example-com")
    pub name: String,

    /// DNS name of the zone apex (e.g., "example.com.")
    pub dns_name: String,

    /// Project that owns the zone
    pub project: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Desired SOA; left untouched when absent
    #[serde(default)]
    pub soa: Option<Soa>,

    #[serde(default)]
    pub records: Option<DesiredRecords>,
}

impl ZoneDeclaration {
    pub fn new(
        name: impl Into<String>,
        dns_name: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            dns_name: dns_name.into(),
            project: project.into(),
            description: None,
            soa: None,
            records: None,
        }
    }

    pub fn with_soa(mut self, soa: Soa) -> Self {
        self.soa = Some(soa);
        self
    }

    pub fn with_records(mut self, records: DesiredRecords) -> Self {
        self.records = Some(records);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, crate::Error> {
        let declaration: Self = serde_json::from_str(json)?;
        declaration.validate()?;
        Ok(declaration)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let declaration: Self = load_json(path)?;
        declaration.validate()?;
        Ok(declaration)
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.is_empty() {
            return Err(crate::Error::config("Zone name cannot be empty"));
        }
        if self.dns_name.is_empty() {
            return Err(crate::Error::config(format!(
                "Zone {} has an empty dns_name",
                self.name
            )));
        }
        if self.project.is_empty() {
            return Err(crate::Error::config(format!(
                "Zone {} has an empty project",
                self.name
            )));
        }
        Ok(())
    }
}

/// Desired state of one cluster object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDeclaration {
    pub kind: ResourceKind,

    pub name: String,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Rendered object body
    pub body: Value,

    /// Only ensure the object contains `body`, patching in what is missing
    #[serde(default)]
    pub patch: bool,
}

impl ObjectDeclaration {
    pub fn new(kind: ResourceKind, name: impl Into<String>, body: Value) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace: default_namespace(),
            body,
            patch: false,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_patch(mut self, patch: bool) -> Self {
        self.patch = patch;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, crate::Error> {
        let declaration: Self = serde_json::from_str(json)?;
        declaration.validate()?;
        Ok(declaration)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let declaration: Self = load_json(path)?;
        declaration.validate()?;
        Ok(declaration)
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.is_empty() {
            return Err(crate::Error::config("Object name cannot be empty"));
        }
        if !self.body.is_object() {
            return Err(crate::Error::config(format!(
                "Body of {} {} must be a mapping",
                self.kind, self.name
            )));
        }
        Ok(())
    }
}

fn default_namespace() -> String {
    "default".to_string()
}

/// Read and deserialize a JSON document
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, crate::Error> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
