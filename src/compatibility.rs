//! Pairwise species compatibility index
//!
//! Two-level map `species1 → species2 → score` built once per process from
//! the compatibility store and immutable afterwards, so one index can be
//! shared across concurrent requests. Lookups are symmetric and total:
//! `(a, b)` falls back to `(b, a)`, and unknown pairs are neutral (0).

use rustc_hash::FxHashMap;

use crate::catalog::CompatibilityEntry;

#[derive(Debug, Clone, Default)]
pub struct CompatibilityIndex {
    scores: FxHashMap<String, FxHashMap<String, f64>>,
}

impl CompatibilityIndex {
    pub fn from_entries(entries: &[CompatibilityEntry]) -> Self {
        let mut scores: FxHashMap<String, FxHashMap<String, f64>> = FxHashMap::default();
        for entry in entries {
            scores
                .entry(entry.species1.clone())
                .or_default()
                .insert(entry.species2.clone(), entry.score);
        }
        Self { scores }
    }

    /// Affinity in [-1, 1] for an unordered species pair; 0 when unknown.
    pub fn score(&self, a: &str, b: &str) -> f64 {
        if let Some(s) = self.scores.get(a).and_then(|m| m.get(b)) {
            return *s;
        }
        if let Some(s) = self.scores.get(b).and_then(|m| m.get(a)) {
            return *s;
        }
        0.0
    }

    pub fn len(&self) -> usize {
        self.scores.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
