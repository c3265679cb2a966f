use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// tag -> set of session ids. Rebuildable from session frontmatters; this
/// is a cache, not a source of truth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagIndex(pub HashMap<String, BTreeSet<String>>);

impl TagIndex {
    /// `mergeTags(a, mergeTags(a, b)) == mergeTags(a, b)`, idempotent by
    /// construction, since `BTreeSet::insert` of an existing id is a no-op.
    pub fn add(&mut self, tag: &str, session_id: &str) {
        self.0
            .entry(tag.to_string())
            .or_default()
            .insert(session_id.to_string());
    }

    pub fn sessions_for(&self, tag: &str) -> BTreeSet<String> {
        self.0.get(tag).cloned().unwrap_or_default()
    }

    /// Deep union used by Knowledge Sync's `tags.json` merge strategy.
    pub fn merge(&self, other: &TagIndex) -> TagIndex {
        let mut merged = self.clone();
        for (tag, sessions) in &other.0 {
            let entry = merged.0.entry(tag.clone()).or_default();
            for s in sessions {
                entry.insert(s.clone());
            }
        }
        merged
    }
}
