//! # Traversal Session
//!
//! The working state of one interview: the current question, the ordered
//! history of visited questions (for back navigation), the answer ledger,
//! and the patient identity captured at intake.
//!
//! Store handles are injected per call — the session holds no reference to
//! the question graph, so the app layer can keep both behind independent
//! locks and persist the session after every mutation.

use crate::graph::QuestionGraph;
use crate::ledger::AnswerLedger;
use crate::limits::START_QUESTION_ID;
use crate::types::{Answer, AnswerValue, InterviewError, PatientInfo, Question, QuestionId};
use serde::{Deserialize, Serialize};

/// Outcome of one [`Session::advance`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The session moved to the named question.
    Moved(QuestionId),
    /// No next hop: the interview path ends here and the session stays on
    /// the current question. Reaching a result node and running off a
    /// branch with no target are both reported this way.
    End,
}

/// One interview session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Patient identity captured at intake, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_info: Option<PatientInfo>,
    /// The question currently shown.
    current_question_id: QuestionId,
    /// Visited question IDs, oldest first; always contains at least the
    /// current question.
    question_history: Vec<QuestionId>,
    /// The answer ledger.
    answers: AnswerLedger,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create a fresh session positioned at the start question.
    #[must_use]
    pub fn new() -> Self {
        let start = QuestionId::new(START_QUESTION_ID);
        Self {
            patient_info: None,
            current_question_id: start.clone(),
            question_history: vec![start],
            answers: AnswerLedger::new(),
        }
    }

    /// The ID of the question currently shown.
    #[must_use]
    pub fn current(&self) -> &QuestionId {
        &self.current_question_id
    }

    /// Resolve the current question against the graph.
    #[must_use]
    pub fn current_question<'g>(&self, graph: &'g QuestionGraph) -> Option<&'g Question> {
        graph.get(&self.current_question_id)
    }

    /// The visited-question history, oldest first.
    #[must_use]
    pub fn history(&self) -> &[QuestionId] {
        &self.question_history
    }

    /// The answer ledger.
    #[must_use]
    pub fn answers(&self) -> &AnswerLedger {
        &self.answers
    }

    /// Whether back navigation is possible.
    #[must_use]
    pub fn can_go_back(&self) -> bool {
        self.question_history.len() > 1
    }

    /// Record the patient identity for this session.
    pub fn set_patient(&mut self, patient: PatientInfo) {
        self.patient_info = Some(patient);
    }

    /// Drop the patient identity (full intake reset).
    pub fn clear_patient(&mut self) {
        self.patient_info = None;
    }

    // =========================================================================
    // TRAVERSAL
    // =========================================================================

    /// Record an answer for the current question and advance.
    ///
    /// The answer overwrites any prior ledger entry for this question —
    /// re-answering after back navigation never duplicates. The next hop is
    /// `yes_next` for a yes, `no_next` for a no or a skip; informational
    /// nodes always continue through `yes_next`. When the hop target is
    /// absent the session stays put and returns [`Step::End`].
    ///
    /// # Errors
    ///
    /// - [`InterviewError::UnknownQuestion`] if the current question (or a
    ///   named hop target) is missing from the graph — a dangling reference
    ///   the editing surface was warned about.
    /// - [`InterviewError::MissingDate`]/[`InterviewError::MissingNote`] if
    ///   the question demands auxiliary data the answer does not carry.
    ///   Skips are exempt: a skipped question cannot demand annotations.
    pub fn advance(
        &mut self,
        graph: &QuestionGraph,
        answer: Answer,
    ) -> Result<Step, InterviewError> {
        let question = graph
            .get(&self.current_question_id)
            .ok_or_else(|| InterviewError::UnknownQuestion(self.current_question_id.clone()))?;

        if answer.value != AnswerValue::Skipped {
            if question.requires_date && answer.date.as_deref().is_none_or(str::is_empty) {
                return Err(InterviewError::MissingDate(question.id.clone()));
            }
            if question.requires_note && answer.notes.as_deref().is_none_or(str::is_empty) {
                return Err(InterviewError::MissingNote(question.id.clone()));
            }
        }

        let next = if question.is_informational {
            question.yes_next.clone()
        } else {
            match answer.value {
                AnswerValue::Yes => question.yes_next.clone(),
                AnswerValue::No | AnswerValue::Skipped => question.no_next.clone(),
            }
        };

        self.answers.record(self.current_question_id.clone(), answer);

        match next {
            Some(next_id) => {
                if !graph.contains(&next_id) {
                    return Err(InterviewError::UnknownQuestion(next_id));
                }
                self.question_history.push(next_id.clone());
                self.current_question_id = next_id.clone();
                Ok(Step::Moved(next_id))
            }
            None => Ok(Step::End),
        }
    }

    /// Navigate back to the previously visited question.
    ///
    /// Returns `false` (no-op) when already at the first entry. The ledger
    /// entry for the question navigated away from is preserved, so progress
    /// stays accurate and re-answering overwrites in place.
    pub fn back(&mut self) -> bool {
        if self.question_history.len() <= 1 {
            return false;
        }
        self.question_history.pop();
        if let Some(last) = self.question_history.last() {
            self.current_question_id = last.clone();
        }
        true
    }

    /// Reset the interview: history back to `["start"]`, ledger cleared,
    /// current question back to start. Patient identity is kept — use
    /// [`Self::clear_patient`] for a full intake reset.
    pub fn reset(&mut self) {
        let start = QuestionId::new(START_QUESTION_ID);
        self.current_question_id = start.clone();
        self.question_history = vec![start];
        self.answers.clear();
    }

    // =========================================================================
    // METRICS
    // =========================================================================

    /// Interview completion as an integer percentage (0-100).
    ///
    /// Fraction of all questions in the graph with a ledger entry. Tolerant
    /// of an empty graph (returns 0) and of ledger entries for questions
    /// that were since deleted (clamped to 100).
    #[must_use]
    pub fn progress_percent(&self, graph: &QuestionGraph) -> u8 {
        let total = graph.len();
        if total == 0 {
            return 0;
        }
        let answered = self.answers.len();
        let percent = answered.saturating_mul(100) / total;
        percent.min(100) as u8
    }
}

// =============================================================================
// TESTS
// =============================================================================
