// # Decoding
//
// Provider record sets → declared records.

use tracing::debug;

use super::record::{
    DesiredRecords, Diagnostic, FlatRecordSet, RecordClass, RecordType, RecordValue, Soa,
    ZoneState,
};
use crate::error::Result;

/// Output of [`from_flat_records`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decoded {
    pub zone: ZoneState,
    /// Record sets that were skipped
    pub diagnostics: Vec<Diagnostic>,
}

/// Host token of a fully-qualified name within the zone
///
/// The apex becomes `"@"`; other names lose their `.<zone_apex>` suffix.
/// Names outside the zone are returned unchanged.
pub fn host_token(zone_apex: &str, name: &str) -> String {
    if name == zone_apex {
        return "@".to_string();
    }
    name.strip_suffix(zone_apex)
        .and_then(|prefix| prefix.strip_suffix('.'))
        .unwrap_or(name)
        .to_string()
}

/// Decode provider record sets into a zone declaration
///
/// Fails only on a malformed SOA rrdata. Unsupported record types are
/// skipped and reported in [`Decoded::diagnostics`].
pub fn from_flat_records(zone_apex: &str, record_sets: &[FlatRecordSet]) -> Result<Decoded> {
    let mut soa = None;
    let mut records = DesiredRecords::new();
    let mut diagnostics = Vec::new();

    for set in record_sets {
        let Some(record_type) = RecordType::from_name(&set.record_type) else {
            diagnostics.push(Diagnostic::skipped(
                set.record_type.as_str(),
                set.name.as_str(),
                "record type not supported",
            ));
            continue;
        };

        let value = match record_type.class() {
            RecordClass::Soa => {
                let rrdata = set.rrdatas.first().map(String::as_str).unwrap_or_default();
                soa = Some(Soa::from_rrdata(rrdata)?);
                continue;
            }
            RecordClass::Single => {
                if set.rrdatas.is_empty() {
                    diagnostics.push(Diagnostic::skipped(
                        record_type.as_str(),
                        set.name.as_str(),
                        "record set has no rrdatas",
                    ));
                    continue;
                }
                // One rrdata is a plain value; several are chunks of one value.
                let joined: String = set.rrdatas.concat();
                RecordValue::Single(joined.replace('"', ""))
            }
            RecordClass::Multi => RecordValue::Multi(set.rrdatas.clone()),
        };

        records
            .entry(record_type.as_str().to_string())
            .or_default()
            .insert(host_token(zone_apex, &set.name), value);
    }

    debug!(
        "Decoded {} record sets for {} ({} skipped)",
        record_sets.len(),
        zone_apex,
        diagnostics.len()
    );

    let records = (!records.is_empty()).then_some(records);
    Ok(Decoded {
        zone: ZoneState { soa, records },
        diagnostics,
    })
}
