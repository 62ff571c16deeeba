// # Zone Planning
//
// Turns "what the provider lists" plus "what is declared" into one batch of
// record-set additions and deletions.
//
// Record sets are the atomic unit at the provider, so a changed host is
// planned as "delete the listed set, add the declared one". The SOA is never
// added or removed on its own; it is always swapped.

use tracing::debug;

use crate::codec::{
    canonicalize, encode_entry, from_flat_records, normalize_txt, soa_record_set,
    DesiredRecords, Diagnostic, FlatRecordSet, HostRecords, RecordType, RecordValue, ZoneState,
    DEFAULT_TTL,
};
use crate::differ::{diff, Delta, KeyDiff};
use crate::error::{Error, Result};

/// One batch of work against a zone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneChanges {
    pub additions: Vec<FlatRecordSet>,
    pub deletions: Vec<FlatRecordSet>,
    /// Structural delta of the declared zone against the listed one
    pub delta: Delta,
    /// Declared or listed items that were skipped
    pub diagnostics: Vec<Diagnostic>,
}

impl ZoneChanges {
    /// Whether the batch would do nothing
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.deletions.is_empty()
    }
}

/// Plans change batches for one zone
#[derive(Debug, Clone)]
pub struct ZonePlanner {
    dns_name: String,
    ttl: u32,
}

impl ZonePlanner {
    /// Create a planner for the zone whose apex is `dns_name`
    pub fn new(dns_name: impl Into<String>) -> Self {
        Self {
            dns_name: dns_name.into(),
            ttl: DEFAULT_TTL,
        }
    }

    /// TTL given to added record sets
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn dns_name(&self) -> &str {
        &self.dns_name
    }

    /// Plan the changes that converge an existing zone to `desired`
    ///
    /// `listed` is the provider's full record-set listing. Deletions reuse
    /// the listed sets verbatim so the provider can match them exactly.
    ///
    /// A declaration without records leaves records alone; one without an
    /// SOA leaves the SOA alone.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedSoa`] if the listed SOA cannot be decoded
    /// - [`Error::LastNameServers`] if the plan would delete every NS set
    pub fn plan_update(&self, listed: &[FlatRecordSet], desired: &ZoneState) -> Result<ZoneChanges> {
        let decoded = from_flat_records(&self.dns_name, listed)?;
        let existing = decoded.zone;

        let mut changes = ZoneChanges {
            diagnostics: decoded.diagnostics,
            ..ZoneChanges::default()
        };

        let (desired_records, mut diagnostics) = match &desired.records {
            Some(records) => {
                let (records, diagnostics) = normalize_records(records);
                (Some(records), diagnostics)
            }
            None => (None, Vec::new()),
        };
        changes.diagnostics.append(&mut diagnostics);

        if let Some(soa) = &desired.soa {
            if existing.soa.as_ref() != Some(soa) {
                if let Some(current) = &existing.soa {
                    changes
                        .deletions
                        .push(self.listed_or_encoded(listed, RecordType::Soa, &self.dns_name, || {
                            soa_record_set(&self.dns_name, current)
                        }));
                }
                changes
                    .additions
                    .push(soa_record_set(&self.dns_name, soa).with_ttl(self.ttl));
            }
        }

        if let Some(wanted) = &desired_records {
            let current = existing.records.clone().unwrap_or_default();
            self.plan_records(listed, &current, wanted, &mut changes)?;
        }

        // Compare only what is declared: undeclared parts are not managed.
        let declared = ZoneState::new(
            desired.soa.clone(),
            desired_records.filter(|records| !records.is_empty()),
        );
        changes.delta = diff(&declared.to_value(), &existing.to_value());

        debug!(
            "Planned {} additions and {} deletions for {}",
            changes.additions.len(),
            changes.deletions.len(),
            self.dns_name
        );

        Ok(changes)
    }

    /// Plan the initial contents of a zone that was just created
    ///
    /// `defaults` is the listing of the fresh zone. Its default SOA is
    /// replaced when an SOA is declared, and its default NS set when NS
    /// records are declared.
    pub fn plan_new_zone(
        &self,
        defaults: &[FlatRecordSet],
        desired: &ZoneState,
    ) -> Result<ZoneChanges> {
        let mut changes = ZoneChanges::default();

        let (records, mut diagnostics) = match &desired.records {
            Some(records) => normalize_records(records),
            None => (DesiredRecords::new(), Vec::new()),
        };
        changes.diagnostics.append(&mut diagnostics);

        if let Some(soa) = &desired.soa {
            changes.deletions.extend(self.listed_of_type(defaults, RecordType::Soa));
            changes
                .additions
                .push(soa_record_set(&self.dns_name, soa).with_ttl(self.ttl));
        }

        if records.contains_key(RecordType::Ns.as_str()) {
            changes.deletions.extend(self.listed_of_type(defaults, RecordType::Ns));
        }

        for (type_name, hosts) in &records {
            self.add_hosts(type_name, hosts, hosts.keys(), &mut changes);
        }

        let declared = ZoneState::new(
            desired.soa.clone(),
            (!records.is_empty()).then_some(records),
        );
        changes.delta = Delta::changed(declared.to_value(), serde_json::Value::Null);

        Ok(changes)
    }

    fn plan_records(
        &self,
        listed: &[FlatRecordSet],
        current: &DesiredRecords,
        wanted: &DesiredRecords,
        changes: &mut ZoneChanges,
    ) -> Result<()> {
        let types = KeyDiff::between(current, wanted);

        for type_name in &types.removed {
            if type_name == RecordType::Ns.as_str() {
                return Err(Error::last_name_servers(&self.dns_name));
            }
        }
        for type_name in &types.changed {
            if type_name == RecordType::Ns.as_str() && wanted[type_name].is_empty() {
                return Err(Error::last_name_servers(&self.dns_name));
            }
        }

        for type_name in &types.added {
            let hosts = &wanted[type_name];
            self.add_hosts(type_name, hosts, hosts.keys(), changes);
        }

        for type_name in &types.removed {
            let hosts = &current[type_name];
            self.remove_hosts(listed, type_name, hosts, hosts.keys(), changes);
        }

        for type_name in &types.changed {
            let before = &current[type_name];
            let after = &wanted[type_name];
            let hosts = KeyDiff::between(before, after);

            self.add_hosts(type_name, after, hosts.added.iter(), changes);
            self.remove_hosts(listed, type_name, before, hosts.removed.iter(), changes);
            self.add_hosts(type_name, after, hosts.changed.iter(), changes);
            self.remove_hosts(listed, type_name, before, hosts.changed.iter(), changes);
        }

        Ok(())
    }

    fn add_hosts<'a>(
        &self,
        type_name: &str,
        hosts: &HostRecords,
        which: impl Iterator<Item = &'a String>,
        changes: &mut ZoneChanges,
    ) {
        let Some(record_type) = RecordType::from_name(type_name) else {
            return;
        };
        for host in which {
            let Some(value) = hosts.get(host) else {
                continue;
            };
            match encode_entry(&self.dns_name, record_type, host, value) {
                Ok(set) => {
                    debug!("Adding {} {}", set.record_type, set.name);
                    changes.additions.push(set.with_ttl(self.ttl));
                }
                Err(diagnostic) => changes.diagnostics.push(diagnostic),
            }
        }
    }

    fn remove_hosts<'a>(
        &self,
        listed: &[FlatRecordSet],
        type_name: &str,
        hosts: &HostRecords,
        which: impl Iterator<Item = &'a String>,
        changes: &mut ZoneChanges,
    ) {
        let Some(record_type) = RecordType::from_name(type_name) else {
            return;
        };
        for host in which {
            let Some(value) = hosts.get(host) else {
                continue;
            };
            let name = crate::codec::fqdn(&self.dns_name, host);
            let encoded = encode_entry(&self.dns_name, record_type, host, value);
            let set = match (
                listed.iter().find(|set| is_set(set, &name, record_type)),
                encoded,
            ) {
                (Some(set), _) => set.clone(),
                (None, Ok(set)) => set,
                (None, Err(diagnostic)) => {
                    changes.diagnostics.push(diagnostic);
                    continue;
                }
            };
            debug!("Removing {} {}", set.record_type, set.name);
            changes.deletions.push(set);
        }
    }

    fn listed_or_encoded(
        &self,
        listed: &[FlatRecordSet],
        record_type: RecordType,
        name: &str,
        encode: impl FnOnce() -> FlatRecordSet,
    ) -> FlatRecordSet {
        listed
            .iter()
            .find(|set| is_set(set, name, record_type))
            .cloned()
            .unwrap_or_else(encode)
    }

    fn listed_of_type(&self, listed: &[FlatRecordSet], record_type: RecordType) -> Vec<FlatRecordSet> {
        listed
            .iter()
            .filter(|set| is_set(set, &self.dns_name, record_type))
            .cloned()
            .collect()
    }
}

fn is_set(set: &FlatRecordSet, name: &str, record_type: RecordType) -> bool {
    set.name == name && set.record_type.eq_ignore_ascii_case(record_type.as_str())
}

/// Canonicalize type names and strip trailing newlines from TXT values
///
/// Listed TXT values never carry them, so declared ones must not either or
/// every comparison would report a change.
pub fn normalize_records(records: &DesiredRecords) -> (DesiredRecords, Vec<Diagnostic>) {
    let (mut records, diagnostics) = canonicalize(records);
    if let Some(txt) = records.get_mut(RecordType::Txt.as_str()) {
        for value in txt.values_mut() {
            if let RecordValue::Single(text) = value {
                *text = normalize_txt(text).to_string();
            }
        }
    }
    (records, diagnostics)
}
