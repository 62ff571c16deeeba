// # Key-level differ
//
// Classifies the keys of two ordered mappings, the way zone planning groups
// record types and hosts into add/remove/replace work.

use std::hash::Hash;

use indexmap::IndexMap;

/// Keys added, removed, changed and unchanged between `past` and `current`
///
/// `added`, `changed` and `unchanged` follow the order of `current`;
/// `removed` follows the order of `past`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDiff<K> {
    pub added: Vec<K>,
    pub removed: Vec<K>,
    pub changed: Vec<K>,
    pub unchanged: Vec<K>,
}

impl<K> KeyDiff<K>
where
    K: Clone + Hash + Eq,
{
    pub fn between<V: PartialEq>(past: &IndexMap<K, V>, current: &IndexMap<K, V>) -> Self {
        let mut diff = Self {
            added: Vec::new(),
            removed: Vec::new(),
            changed: Vec::new(),
            unchanged: Vec::new(),
        };

        for (key, value) in current {
            match past.get(key) {
                None => diff.added.push(key.clone()),
                Some(previous) if previous != value => diff.changed.push(key.clone()),
                Some(_) => diff.unchanged.push(key.clone()),
            }
        }

        diff.removed = past
            .keys()
            .filter(|key| !current.contains_key(*key))
            .cloned()
            .collect();

        diff
    }

    /// Whether anything was added, removed or changed
    pub fn has_changes(&self) -> bool {
        !(self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty())
    }
}
