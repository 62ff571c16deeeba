//! Record codec
//!
//! Converts between the human-authored, type-grouped record declaration of a
//! zone and the flat record-set list a zone provider consumes.
//!
//! ```text
//!  DesiredRecords + Soa ── to_flat_records ──▶ Vec<FlatRecordSet>
//!          ▲                                          │
//!          └────────────── from_flat_records ─────────┘
//! ```
//!
//! Both directions are pure. Items the codec cannot express are skipped and
//! returned as [`Diagnostic`]s next to the output, so one bad declaration
//! never aborts a batch.
//!
//! ## Round trip
//!
//! Decoding an encoding reproduces the declaration for every supported type.
//! Long TXT values are split into quoted 255-character chunks on the way out
//! and joined without a separator on the way back.

pub mod decode;
pub mod encode;
pub mod record;

pub use decode::{from_flat_records, host_token, Decoded};
pub use encode::{encode_entry, fqdn, normalize_txt, soa_record_set, to_flat_records, Encoded};
pub use record::{
    canonicalize, DesiredRecords, Diagnostic, FlatRecordSet, HostRecords, RecordClass,
    RecordType, RecordValue, Soa, ZoneState, DEFAULT_TTL,
};
