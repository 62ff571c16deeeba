// # Encoding
//
// Declared records → provider record sets.

use tracing::debug;

use super::record::{
    canonicalize, DesiredRecords, Diagnostic, FlatRecordSet, RecordClass, RecordType,
    RecordValue, Soa,
};
use crate::error::{Error, Result};

/// TXT values longer than this are split into chunks
const TXT_SPLIT_THRESHOLD: usize = 256;

/// Maximum characters per TXT chunk (RFC 4408 §3.1.3)
const TXT_CHUNK_LEN: usize = 255;

/// Output of [`to_flat_records`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Encoded {
    /// SOA first (if any), then records by type and host in declaration order
    pub record_sets: Vec<FlatRecordSet>,
    /// Declarations that were skipped
    pub diagnostics: Vec<Diagnostic>,
}

/// Fully-qualified name of `host` within the zone
///
/// `"@"` denotes the zone apex.
pub fn fqdn(zone_apex: &str, host: &str) -> String {
    if host == "@" {
        zone_apex.to_string()
    } else {
        format!("{host}.{zone_apex}")
    }
}

/// Encode a declaration into provider record sets
///
/// Returns [`Error::EmptyInput`] when there are neither records nor an SOA;
/// callers should treat that as "nothing to do". Unsupported record types
/// are skipped and reported in [`Encoded::diagnostics`].
pub fn to_flat_records(
    zone_apex: &str,
    records: Option<&DesiredRecords>,
    soa: Option<&Soa>,
) -> Result<Encoded> {
    let records = records.filter(|records| !records.is_empty());
    if records.is_none() && soa.is_none() {
        return Err(Error::EmptyInput);
    }

    let mut encoded = Encoded::default();

    if let Some(soa) = soa {
        encoded.record_sets.push(soa_record_set(zone_apex, soa));
    }

    if let Some(records) = records {
        let (canonical, mut diagnostics) = canonicalize(records);
        encoded.diagnostics.append(&mut diagnostics);

        for (type_name, hosts) in &canonical {
            // canonicalize only keeps parseable names
            let Some(record_type) = RecordType::from_name(type_name) else {
                continue;
            };
            for (host, value) in hosts {
                match encode_entry(zone_apex, record_type, host, value) {
                    Ok(set) => encoded.record_sets.push(set),
                    Err(diagnostic) => encoded.diagnostics.push(diagnostic),
                }
            }
        }
    }

    debug!(
        "Encoded {} record sets for {} ({} skipped)",
        encoded.record_sets.len(),
        zone_apex,
        encoded.diagnostics.len()
    );

    Ok(encoded)
}

/// The SOA record set of a zone
pub fn soa_record_set(zone_apex: &str, soa: &Soa) -> FlatRecordSet {
    FlatRecordSet::new(zone_apex, RecordType::Soa, vec![soa.to_rrdata()])
}

/// Encode the value declared for one host of one record type
pub fn encode_entry(
    zone_apex: &str,
    record_type: RecordType,
    host: &str,
    value: &RecordValue,
) -> std::result::Result<FlatRecordSet, Diagnostic> {
    let rrdatas = match (record_type.class(), value) {
        (RecordClass::Single, RecordValue::Single(value)) => {
            if record_type == RecordType::Txt {
                txt_rrdatas(value)
            } else {
                vec![value.clone()]
            }
        }
        (RecordClass::Single, RecordValue::Multi(_)) => {
            return Err(Diagnostic::skipped(
                record_type.as_str(),
                host,
                "expected a single value, found a list",
            ));
        }
        (RecordClass::Multi, RecordValue::Multi(values)) => values.clone(),
        (RecordClass::Multi, RecordValue::Single(value)) => vec![value.clone()],
        (RecordClass::Soa, _) => {
            return Err(Diagnostic::skipped(
                record_type.as_str(),
                host,
                "SOA must be declared separately from records",
            ));
        }
    };

    Ok(FlatRecordSet::new(fqdn(zone_apex, host), record_type, rrdatas))
}

/// Strip trailing newlines from a declared TXT value
///
/// Both an escaped `\n` sequence and a real newline are removed, which
/// block-style declarations tend to leave behind.
pub fn normalize_txt(value: &str) -> &str {
    value.trim_end_matches("\\n").trim_end_matches('\n')
}

/// Quote a TXT value, splitting long values into 255-character chunks
fn txt_rrdatas(value: &str) -> Vec<String> {
    let value = normalize_txt(value);

    if value.chars().count() <= TXT_SPLIT_THRESHOLD {
        return vec![format!("\"{value}\"")];
    }

    let chars: Vec<char> = value.trim_matches('"').chars().collect();
    chars
        .chunks(TXT_CHUNK_LEN)
        .map(|chunk| format!("\"{}\"", chunk.iter().collect::<String>()))
        .collect()
}
