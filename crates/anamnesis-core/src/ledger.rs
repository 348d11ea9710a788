//! # Answer Ledger
//!
//! The record of answers given during one interview session.
//!
//! The ledger is overwrite-only: re-answering a question (e.g. after back
//! navigation) replaces the prior entry in place, never duplicates it, and
//! individual entries are never deleted — only a bulk reset clears it.

use crate::types::{Answer, QuestionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Question ID -> recorded answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerLedger {
    answers: BTreeMap<QuestionId, Answer>,
}

impl AnswerLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer, overwriting any prior entry for the question.
    pub fn record(&mut self, id: QuestionId, answer: Answer) {
        self.answers.insert(id, answer);
    }

    /// Look up the recorded answer for a question.
    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&Answer> {
        self.answers.get(id)
    }

    /// Whether a question has been answered (including skipped).
    #[must_use]
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.answers.contains_key(id)
    }

    /// Number of answered questions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    /// Whether the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Iterate entries in deterministic question-ID order.
    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &Answer)> {
        self.answers.iter()
    }

    /// Bulk reset. The only way entries ever leave the ledger.
    pub fn clear(&mut self) {
        self.answers.clear();
    }

    /// Clone the underlying map (for freezing into a report).
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<QuestionId, Answer> {
        self.answers.clone()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AnswerValue;

    #[test]
    fn record_overwrites_not_appends() {
        let mut ledger = AnswerLedger::new();
        let id = QuestionId::new("a1");

        ledger.record(id.clone(), Answer::new(AnswerValue::Yes));
        ledger.record(id.clone(), Answer::new(AnswerValue::No));

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get(&id).map(|a| a.value), Some(AnswerValue::No));
    }

    #[test]
    fn skipped_counts_as_answered() {
        let mut ledger = AnswerLedger::new();
        ledger.record(QuestionId::new("a1"), Answer::new(AnswerValue::Skipped));

        assert!(ledger.contains(&QuestionId::new("a1")));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn clear_is_the_only_delete() {
        let mut ledger = AnswerLedger::new();
        ledger.record(QuestionId::new("a1"), Answer::new(AnswerValue::Yes));
        ledger.record(QuestionId::new("a2"), Answer::new(AnswerValue::No));

        ledger.clear();
        assert!(ledger.is_empty());
    }

    #[test]
    fn round_trip_preserves_auxiliary_fields() {
        let mut ledger = AnswerLedger::new();
        ledger.record(
            QuestionId::new("a1"),
            Answer::new(AnswerValue::Yes).with_date("2024-03-01").with_notes("onset in spring"),
        );
        ledger.record(QuestionId::new("a2"), Answer::new(AnswerValue::Skipped));

        let json = serde_json::to_string(&ledger).expect("serialize");
        let back: AnswerLedger = serde_json::from_str(&json).expect("parse");
        assert_eq!(back, ledger);
    }
}
