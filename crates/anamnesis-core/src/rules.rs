//! # Diagnosis Rule Set
//!
//! The keyed store of diagnosis rules. Like the question graph, the set is
//! a deterministic `BTreeMap` and all edits are gated through the edit
//! engine.

use crate::types::{Diagnosis, DiagnosisId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Diagnosis ID -> diagnosis rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagnosisSet {
    diagnoses: BTreeMap<DiagnosisId, Diagnosis>,
}

impl DiagnosisSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from an iterator of diagnoses, keyed by their IDs.
    pub fn from_diagnoses(diagnoses: impl IntoIterator<Item = Diagnosis>) -> Self {
        Self {
            diagnoses: diagnoses.into_iter().map(|d| (d.id.clone(), d)).collect(),
        }
    }

    /// Look up a diagnosis by ID.
    #[must_use]
    pub fn get(&self, id: &DiagnosisId) -> Option<&Diagnosis> {
        self.diagnoses.get(id)
    }

    /// Check whether a diagnosis exists.
    #[must_use]
    pub fn contains(&self, id: &DiagnosisId) -> bool {
        self.diagnoses.contains_key(id)
    }

    /// Total number of diagnoses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnoses.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnoses.is_empty()
    }

    /// Iterate all diagnoses in deterministic ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnosis> {
        self.diagnoses.values()
    }

    /// Insert or replace a diagnosis, keyed by its own ID.
    ///
    /// Raw committed write; validation and the rename cascade live in the
    /// edit engine.
    pub fn upsert(&mut self, diagnosis: Diagnosis) -> Option<Diagnosis> {
        self.diagnoses.insert(diagnosis.id.clone(), diagnosis)
    }

    /// Remove a diagnosis.
    pub fn remove(&mut self, id: &DiagnosisId) -> Option<Diagnosis> {
        self.diagnoses.remove(id)
    }

    /// Replace the entire set (used by import).
    pub fn replace(&mut self, other: DiagnosisSet) {
        self.diagnoses = other.diagnoses;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_and_get() {
        let mut set = DiagnosisSet::new();
        set.upsert(Diagnosis::new("mdd", "Major Depression"));

        assert!(set.contains(&DiagnosisId::new("mdd")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn serializes_as_keyed_map() {
        let set = DiagnosisSet::from_diagnoses([
            Diagnosis::new("a", "A"),
            Diagnosis::new("b", "B"),
        ]);
        let json = serde_json::to_value(&set).expect("serialize");
        assert!(json.get("a").is_some());

        let back: DiagnosisSet = serde_json::from_value(json).expect("parse");
        assert_eq!(back, set);
    }
}
