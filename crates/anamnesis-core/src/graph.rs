//! # Question Graph Store
//!
//! The keyed store of interview questions and their branching structure.
//!
//! All structure uses `BTreeMap` for deterministic ordering. Writes coming
//! from the editing surface must go through [`crate::validate::EditEngine`],
//! which enforces the §validation invariants before committing here.

use crate::limits::START_QUESTION_ID;
use crate::rules::DiagnosisSet;
use crate::types::{Question, QuestionId, ReferentialWarning};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The question graph: question ID -> question node.
///
/// Serializes as the keyed-map shape (`{"start": {...}, "A1": {...}}`)
/// used by graph files and backups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionGraph {
    questions: BTreeMap<QuestionId, Question>,
}

impl QuestionGraph {
    /// Create a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from an iterator of questions, keyed by their IDs.
    pub fn from_questions(questions: impl IntoIterator<Item = Question>) -> Self {
        Self {
            questions: questions.into_iter().map(|q| (q.id.clone(), q)).collect(),
        }
    }

    /// Look up a question by ID.
    #[must_use]
    pub fn get(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.get(id)
    }

    /// Check whether a question exists.
    #[must_use]
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.questions.contains_key(id)
    }

    /// The interview entry point, if present.
    #[must_use]
    pub fn start(&self) -> Option<&Question> {
        self.questions.get(&QuestionId::new(START_QUESTION_ID))
    }

    /// Total number of questions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the graph is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Iterate all questions in deterministic ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.values()
    }

    /// Iterate all question IDs in deterministic order.
    pub fn ids(&self) -> impl Iterator<Item = &QuestionId> {
        self.questions.keys()
    }

    /// Insert or replace a question, keyed by its own ID.
    ///
    /// This is the raw committed write; validation happens in the edit
    /// engine before this is called. Returns the replaced question, if any.
    pub fn upsert(&mut self, question: Question) -> Option<Question> {
        self.questions.insert(question.id.clone(), question)
    }

    /// Remove a question.
    ///
    /// References from other questions are deliberately left dangling —
    /// they surface through [`Self::scan_references`] rather than being
    /// silently repaired, since auto-repair could hide a flow design error.
    pub fn remove(&mut self, id: &QuestionId) -> Option<Question> {
        self.questions.remove(id)
    }

    /// Replace the entire graph (used by import and remote reload).
    pub fn replace(&mut self, other: QuestionGraph) {
        self.questions = other.questions;
    }

    /// Mutable iteration for the edit engine's cascade updates.
    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut Question> {
        self.questions.values_mut()
    }

    /// Questions whose `yes_next`/`no_next` point at `target`.
    ///
    /// Used by the edit engine to report which references a deletion left
    /// dangling.
    #[must_use]
    pub fn referencing(&self, target: &QuestionId) -> Vec<&Question> {
        self.questions
            .values()
            .filter(|q| {
                q.yes_next.as_ref() == Some(target) || q.no_next.as_ref() == Some(target)
            })
            .collect()
    }

    /// Scan the graph and rule set for referential problems.
    ///
    /// Findings are warnings, not errors: graphs are authored incrementally
    /// and may be transiently incomplete.
    #[must_use]
    pub fn scan_references(&self, diagnoses: &DiagnosisSet) -> Vec<ReferentialWarning> {
        let mut warnings = Vec::new();

        if self.start().is_none() {
            warnings.push(ReferentialWarning::MissingStart);
        }

        for question in self.questions.values() {
            if let Some(to) = &question.yes_next {
                if !self.contains(to) {
                    warnings.push(ReferentialWarning::DanglingYesNext {
                        from: question.id.clone(),
                        to: to.clone(),
                    });
                }
            }
            if let Some(to) = &question.no_next {
                if !self.contains(to) {
                    warnings.push(ReferentialWarning::DanglingNoNext {
                        from: question.id.clone(),
                        to: to.clone(),
                    });
                }
            }
        }

        for diagnosis in diagnoses.iter() {
            for required in &diagnosis.criteria.required_questions {
                if !self.contains(required) {
                    warnings.push(ReferentialWarning::DanglingRequired {
                        diagnosis: diagnosis.id.clone(),
                        question: required.clone(),
                    });
                }
            }
            for exclusion in &diagnosis.criteria.excluding_questions {
                if !self.contains(&exclusion.question_id) {
                    warnings.push(ReferentialWarning::DanglingExclusion {
                        diagnosis: diagnosis.id.clone(),
                        question: exclusion.question_id.clone(),
                    });
                }
            }
        }

        warnings
    }
}

// =============================================================================
// TESTS
// =============================================================================
