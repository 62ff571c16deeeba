// # Record Types
//
// Declared (type-grouped) and provider-native (flat) shapes of DNS records.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};

/// Default TTL applied to every encoded record set
pub const DEFAULT_TTL: u32 = 3600;

/// How a record type stores its value in a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordClass {
    /// One scalar string per host (CNAME, TLSA, TXT)
    Single,
    /// An ordered list of strings per host (A, AAAA, CAA, MX, NS)
    Multi,
    /// The fixed-shape zone SOA record
    Soa,
}

/// DNS record types understood by the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Aaaa,
    Caa,
    Cname,
    Mx,
    Ns,
    Soa,
    Tlsa,
    Txt,
}

impl RecordType {
    /// Parse a type name, ignoring case
    ///
    /// Returns `None` for types outside the supported set.
    pub fn from_name(name: &str) -> Option<Self> {
        let record_type = match name.to_ascii_uppercase().as_str() {
            "A" => Self::A,
            "AAAA" => Self::Aaaa,
            "CAA" => Self::Caa,
            "CNAME" => Self::Cname,
            "MX" => Self::Mx,
            "NS" => Self::Ns,
            "SOA" => Self::Soa,
            "TLSA" => Self::Tlsa,
            "TXT" => Self::Txt,
            _ => return None,
        };
        Some(record_type)
    }

    /// Canonical upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Caa => "CAA",
            Self::Cname => "CNAME",
            Self::Mx => "MX",
            Self::Ns => "NS",
            Self::Soa => "SOA",
            Self::Tlsa => "TLSA",
            Self::Txt => "TXT",
        }
    }

    pub fn class(&self) -> RecordClass {
        match self {
            Self::Cname | Self::Tlsa | Self::Txt => RecordClass::Single,
            Self::A | Self::Aaaa | Self::Caa | Self::Mx | Self::Ns => RecordClass::Multi,
            Self::Soa => RecordClass::Soa,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value declared for one host of one record type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordValue {
    /// Scalar value of a single-value type
    Single(String),
    /// Ordered values of a multi-value type
    Multi(Vec<String>),
}

impl From<&str> for RecordValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for RecordValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for RecordValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

impl<const N: usize> From<[&str; N]> for RecordValue {
    fn from(values: [&str; N]) -> Self {
        Self::Multi(values.iter().map(|v| v.to_string()).collect())
    }
}

/// Host token → value, in declaration order
pub type HostRecords = IndexMap<String, RecordValue>;

/// Record type → host records, in declaration order
pub type DesiredRecords = IndexMap<String, HostRecords>;

/// Start of authority for a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Soa {
    /// Primary name server
    pub primary: String,
    /// Responsible mailbox, in DNS name form
    pub contact: String,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expiration: u32,
    pub maxcache: u32,
}

impl Soa {
    /// Render the single rrdata string of the SOA record set
    pub fn to_rrdata(&self) -> String {
        format!(
            "{} {} {} {} {} {} {}",
            self.primary,
            self.contact,
            self.serial,
            self.refresh,
            self.retry,
            self.expiration,
            self.maxcache
        )
    }

    /// Parse an SOA rrdata string
    ///
    /// The string must split on single spaces into exactly seven fields,
    /// the last five of them unsigned integers.
    pub fn from_rrdata(rrdata: &str) -> Result<Self> {
        let fields: Vec<&str> = rrdata.split(' ').collect();
        let [primary, contact, serial, refresh, retry, expiration, maxcache] = fields[..] else {
            return Err(Error::malformed_soa(
                rrdata,
                format!("expected 7 fields, found {}", fields.len()),
            ));
        };

        let number = |field: &str, label: &str| -> Result<u32> {
            field.parse().map_err(|_| {
                Error::malformed_soa(rrdata, format!("{label} {field:?} is not an integer"))
            })
        };

        Ok(Self {
            primary: primary.to_string(),
            contact: contact.to_string(),
            serial: number(serial, "serial")?,
            refresh: number(refresh, "refresh")?,
            retry: number(retry, "retry")?,
            expiration: number(expiration, "expiration")?,
            maxcache: number(maxcache, "maxcache")?,
        })
    }
}

/// Provider-native record set: the unit of add/remove against a zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRecordSet {
    /// Fully-qualified name
    pub name: String,
    /// Record type as reported by the provider
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default = "default_ttl")]
    pub ttl: u32,
    pub rrdatas: Vec<String>,
}

impl FlatRecordSet {
    pub fn new(name: impl Into<String>, record_type: RecordType, rrdatas: Vec<String>) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.as_str().to_string(),
            ttl: DEFAULT_TTL,
            rrdatas,
        }
    }

    /// Override the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }
}

fn default_ttl() -> u32 {
    DEFAULT_TTL
}

/// Declared contents of a zone, as produced by decoding a provider listing
///
/// A missing `soa` means no SOA record set was seen; a missing `records`
/// means the zone holds no record sets besides the SOA.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soa: Option<Soa>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<DesiredRecords>,
}

impl ZoneState {
    pub fn new(soa: Option<Soa>, records: Option<DesiredRecords>) -> Self {
        Self { soa, records }
    }

    /// Tree form of the zone, as compared by the differ
    pub fn to_value(&self) -> Value {
        // Plain strings and integers; serialization cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// An item the codec skipped instead of failing on
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Record type as it appeared in the input
    pub record_type: String,
    /// Host token or record set name
    pub name: String,
    pub reason: String,
}

impl Diagnostic {
    /// Record a skipped item and log it
    pub(crate) fn skipped(
        record_type: impl Into<String>,
        name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let diagnostic = Self {
            record_type: record_type.into(),
            name: name.into(),
            reason: reason.into(),
        };
        warn!("{}", diagnostic);
        diagnostic
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Skipping {} record {}: {}",
            self.record_type, self.name, self.reason
        )
    }
}

/// Upper-case the type keys of a declaration and drop unsupported types
///
/// Hosts declared under two spellings of the same type are merged, later
/// declarations winning. A scalar declared for a multi-value type becomes a
/// one-element list, the shape a provider listing decodes to.
pub fn canonicalize(records: &DesiredRecords) -> (DesiredRecords, Vec<Diagnostic>) {
    let mut canonical = DesiredRecords::new();
    let mut diagnostics = Vec::new();

    for (type_name, hosts) in records {
        match RecordType::from_name(type_name) {
            Some(record_type) if record_type.class() != RecordClass::Soa => {
                let entry = canonical
                    .entry(record_type.as_str().to_string())
                    .or_default();
                for (host, value) in hosts {
                    let value = match (record_type.class(), value) {
                        (RecordClass::Multi, RecordValue::Single(value)) => {
                            RecordValue::Multi(vec![value.clone()])
                        }
                        (_, value) => value.clone(),
                    };
                    entry.insert(host.clone(), value);
                }
            }
            _ if hosts.is_empty() => {
                diagnostics.push(Diagnostic::skipped(
                    type_name.as_str(),
                    "*",
                    "record type not supported",
                ));
            }
            _ => {
                for host in hosts.keys() {
                    diagnostics.push(Diagnostic::skipped(
                        type_name.as_str(),
                        host.as_str(),
                        "record type not supported",
                    ));
                }
            }
        }
    }

    (canonical, diagnostics)
}
