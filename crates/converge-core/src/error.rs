//! Error types for the reconciliation core
//!
//! This module defines all error types used throughout the crate.
//!
//! Not every condition the core reports is an error: unsupported record
//! types are carried as [`Diagnostic`](crate::codec::Diagnostic)s next to the
//! successful output, and shape mismatches in the differ are ordinary
//! [`Delta`](crate::differ::Delta) values.

use thiserror::Error;

/// Result type alias for reconciliation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the reconciliation layer
#[derive(Error, Debug)]
pub enum Error {
    /// Encode was asked to render neither records nor an SOA
    ///
    /// Callers treat this as a no-op; see [`Error::is_noop`].
    #[error("Records and SOA are both empty: nothing to do")]
    EmptyInput,

    /// An SOA record set whose rrdata is not seven space-separated fields
    #[error("Malformed SOA rrdata {rrdata:?}: {reason}")]
    MalformedSoa {
        /// The offending rrdata string
        rrdata: String,
        /// What was wrong with it
        reason: String,
    },

    /// A plan would delete every NS record set of a zone
    #[error("Cannot remove all NS records from zone {zone}")]
    LastNameServers {
        /// DNS name of the zone
        zone: String,
    },

    /// The zone does not exist at the provider
    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    /// The cluster object does not exist
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// Collaborator-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (declaration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a malformed SOA error
    pub fn malformed_soa(rrdata: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedSoa {
            rrdata: rrdata.into(),
            reason: reason.into(),
        }
    }

    /// Create a "last NS records" refusal
    pub fn last_name_servers(zone: impl Into<String>) -> Self {
        Self::LastNameServers { zone: zone.into() }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error only means "there was nothing to do"
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::EmptyInput)
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
