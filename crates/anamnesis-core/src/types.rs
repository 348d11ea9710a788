//! # Core Type Definitions
//!
//! This module contains all core types for the Anamnesis interview engine:
//! - Identifiers (`QuestionId`, `DiagnosisId`)
//! - The interview graph node (`Question`)
//! - Recorded answers (`Answer`, `AnswerValue`)
//! - Diagnosis rules (`Diagnosis`, `DiagnosisCriteria`, `ExclusionRule`)
//! - Snapshots (`PatientInfo`, `Report`)
//! - Error and warning types (`InterviewError`, `ReferentialWarning`)
//!
//! ## Determinism Guarantees
//!
//! All collection-bearing types use `BTreeMap`/`Vec` for deterministic
//! ordering, and all counters use integer arithmetic.
//!
//! ## Wire Format
//!
//! Serde representations use camelCase field names (`yesNext`, `noNext`,
//! `requiredQuestions`, ...) so that graph files and backups from earlier
//! deployments of the interview assistant round-trip unchanged.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier of a question node in the interview graph.
///
/// Question IDs are authored strings (`"start"`, `"A1_3"`, ...) and act as
/// the primary key of the graph store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub String);

impl QuestionId {
    /// Create a new question ID from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether the ID is empty (always invalid).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier of a diagnosis rule.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagnosisId(pub String);

impl DiagnosisId {
    /// Create a new diagnosis ID from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether the ID is empty (always invalid).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for DiagnosisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// ANSWERS
// =============================================================================

/// The tri-state outcome of a question.
///
/// `Skipped` means "explicitly left unanswered" and is distinct from `No`:
/// a skipped answer never counts toward a diagnosis threshold and never
/// triggers an exclusion rule. On the wire this is `true`/`false`/`null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum AnswerValue {
    Yes,
    No,
    Skipped,
}

impl AnswerValue {
    /// Whether this answer counts as a positive match for rule evaluation.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        matches!(self, Self::Yes)
    }

    /// Whether this answer equals a boolean exclusion value.
    ///
    /// `Skipped` matches neither `true` nor `false`.
    #[must_use]
    pub const fn matches(self, value: bool) -> bool {
        match self {
            Self::Yes => value,
            Self::No => !value,
            Self::Skipped => false,
        }
    }
}

impl From<Option<bool>> for AnswerValue {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => Self::Yes,
            Some(false) => Self::No,
            None => Self::Skipped,
        }
    }
}

impl From<AnswerValue> for Option<bool> {
    fn from(value: AnswerValue) -> Self {
        match value {
            AnswerValue::Yes => Some(true),
            AnswerValue::No => Some(false),
            AnswerValue::Skipped => None,
        }
    }
}

/// One recorded answer in the ledger.
///
/// `date` and `notes` are free-form auxiliary data; they are mandatory only
/// when the originating [`Question`] carries `requires_date`/`requires_note`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// The tri-state answer value (`null` on the wire means skipped).
    pub value: AnswerValue,
    /// Optional date annotation (e.g. symptom onset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Optional free-form note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Answer {
    /// Create a bare answer with no auxiliary data.
    #[must_use]
    pub const fn new(value: AnswerValue) -> Self {
        Self {
            value,
            date: None,
            notes: None,
        }
    }

    /// Attach a date annotation.
    #[must_use]
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Attach a note.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

// =============================================================================
// QUESTION
// =============================================================================

/// A node in the interview graph.
///
/// `yes_next`/`no_next` name the node reached from each branch; absence
/// means the interview path ends here. Informational nodes have no real
/// branching decision — only `yes_next` is meaningful, as "continue".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique ID, primary key of the graph store.
    pub id: QuestionId,
    /// The prompt shown to the clinician (opaque to the engine).
    pub text: String,
    /// Diagnosis this question contributes evidence toward, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<DiagnosisId>,
    /// Denormalized display name of `diagnosis`; refreshed by the edit
    /// engine whenever the diagnosis is renamed or deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis_name: Option<String>,
    /// The answer recorded here must carry a date.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub requires_date: bool,
    /// The answer recorded here must carry a note.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub requires_note: bool,
    /// Next question when the answer is yes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yes_next: Option<QuestionId>,
    /// Next question when the answer is no (or skipped).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_next: Option<QuestionId>,
    /// Terminal, display-only node.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_result: bool,
    /// Informational node: no branching decision, `yes_next` continues.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_informational: bool,
    /// Supplementary text shown on informational nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info_text: Option<String>,
}

impl Question {
    /// Create a plain yes/no question with the given ID and prompt.
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: QuestionId::new(id),
            text: text.into(),
            diagnosis: None,
            diagnosis_name: None,
            requires_date: false,
            requires_note: false,
            yes_next: None,
            no_next: None,
            is_result: false,
            is_informational: false,
            info_text: None,
        }
    }

    /// Set the yes-branch target.
    #[must_use]
    pub fn with_yes_next(mut self, id: impl Into<String>) -> Self {
        self.yes_next = Some(QuestionId::new(id));
        self
    }

    /// Set the no-branch target.
    #[must_use]
    pub fn with_no_next(mut self, id: impl Into<String>) -> Self {
        self.no_next = Some(QuestionId::new(id));
        self
    }

    /// Link this question to a diagnosis, caching its display name.
    #[must_use]
    pub fn with_diagnosis(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.diagnosis = Some(DiagnosisId::new(id));
        self.diagnosis_name = Some(name.into());
        self
    }
}

// =============================================================================
// DIAGNOSIS RULES
// =============================================================================

/// One exclusion criterion: a question whose recorded answer, when equal to
/// `value`, disqualifies the diagnosis regardless of the positive count.
///
/// The referenced question does NOT have to appear in `required_questions`;
/// exclusion criteria are independent from inclusion criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExclusionRule {
    /// The question whose answer is checked.
    pub question_id: QuestionId,
    /// The answer value that triggers exclusion.
    pub value: bool,
}

impl ExclusionRule {
    /// Create a new exclusion rule.
    #[must_use]
    pub fn new(question_id: impl Into<String>, value: bool) -> Self {
        Self {
            question_id: QuestionId::new(question_id),
            value,
        }
    }
}

/// The rule attached to a diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisCriteria {
    /// Questions whose answers are inputs to the rule, in authored order.
    pub required_questions: Vec<QuestionId>,
    /// Minimum count of required questions answered yes for the diagnosis
    /// to qualify.
    pub min_positive_answers: u32,
    /// Exclusion criteria, checked after the threshold.
    pub excluding_questions: Vec<ExclusionRule>,
}

/// A named clinical conclusion with its qualification rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    /// Unique ID, primary key of the diagnosis set.
    pub id: DiagnosisId,
    /// Display name (also cached on referencing questions).
    pub name: String,
    /// Display description.
    pub description: String,
    /// The qualification rule.
    pub criteria: DiagnosisCriteria,
}

impl Diagnosis {
    /// Create a diagnosis with empty criteria.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: DiagnosisId::new(id),
            name: name.into(),
            description: String::new(),
            criteria: DiagnosisCriteria::default(),
        }
    }
}

// =============================================================================
// PATIENT & REPORT
// =============================================================================

/// Patient identity captured at session start.
///
/// Opaque to the engine; carried through the session and frozen into
/// reports. The optional tail fields were added by later deployments and
/// default to absent so older session snapshots still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    pub full_name: String,
    pub birth_date: String,
    pub gender: String,
    pub education: String,
    pub marital_status: String,
    pub occupation: String,
    pub siblings: u32,
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_therapy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent_signed: Option<bool>,
}

/// One qualifying diagnosis inside a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDiagnosis {
    pub id: DiagnosisId,
    pub name: String,
    pub confirmed: bool,
}

/// A frozen snapshot of one completed (or in-progress) interview.
///
/// Immutable once created; deletable individually. The PDF collaborator
/// consumes this struct as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Unique report ID.
    pub id: String,
    /// Patient key (currently the patient's full name slug).
    pub patient_id: String,
    /// Patient display name.
    pub patient_name: String,
    /// Creation timestamp, `YYYY-MM-DD HH:MM:SS`.
    pub date: String,
    /// Diagnoses qualifying at snapshot time.
    pub diagnoses: Vec<ReportDiagnosis>,
    /// The full answer ledger at snapshot time.
    pub answers: BTreeMap<QuestionId, Answer>,
    /// Optional clinician notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// =============================================================================
// WARNINGS
// =============================================================================

/// A non-fatal referential finding in the graph or rule set.
///
/// Graphs are edited incrementally, so dangling references never block a
/// commit; they are surfaced to the editing surface for inline display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReferentialWarning {
    /// `yes_next` names a question that does not exist.
    DanglingYesNext { from: QuestionId, to: QuestionId },
    /// `no_next` names a question that does not exist.
    DanglingNoNext { from: QuestionId, to: QuestionId },
    /// A diagnosis requires a question that does not exist.
    DanglingRequired {
        diagnosis: DiagnosisId,
        question: QuestionId,
    },
    /// A diagnosis excludes on a question that does not exist.
    DanglingExclusion {
        diagnosis: DiagnosisId,
        question: QuestionId,
    },
    /// The graph has no `start` node, so the interview cannot begin.
    MissingStart,
}

impl std::fmt::Display for ReferentialWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DanglingYesNext { from, to } => {
                write!(f, "question '{from}': yes-branch points to missing '{to}'")
            }
            Self::DanglingNoNext { from, to } => {
                write!(f, "question '{from}': no-branch points to missing '{to}'")
            }
            Self::DanglingRequired {
                diagnosis,
                question,
            } => {
                write!(f, "diagnosis '{diagnosis}': requires missing question '{question}'")
            }
            Self::DanglingExclusion {
                diagnosis,
                question,
            } => {
                write!(f, "diagnosis '{diagnosis}': excludes on missing question '{question}'")
            }
            Self::MissingStart => write!(f, "graph has no 'start' question"),
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors produced by the interview engine.
///
/// - No silent failures
/// - All fallible operations return `Result<T, InterviewError>`
/// - The engine never panics; every error is recoverable by the caller
#[derive(Debug, Error)]
pub enum InterviewError {
    /// A question write carried an empty ID.
    #[error("question ID must not be empty")]
    EmptyQuestionId,

    /// A question write carried empty prompt text.
    #[error("question text must not be empty")]
    EmptyQuestionText,

    /// An add-new collided with an existing question ID.
    #[error("a question with ID '{0}' already exists")]
    DuplicateQuestion(QuestionId),

    /// The named question does not exist.
    #[error("question not found: '{0}'")]
    UnknownQuestion(QuestionId),

    /// A diagnosis write carried an empty ID.
    #[error("diagnosis ID must not be empty")]
    EmptyDiagnosisId,

    /// A diagnosis write carried an empty name.
    #[error("diagnosis name must not be empty")]
    EmptyDiagnosisName,

    /// An add-new collided with an existing diagnosis ID.
    #[error("a diagnosis with ID '{0}' already exists")]
    DuplicateDiagnosis(DiagnosisId),

    /// The named diagnosis does not exist.
    #[error("diagnosis not found: '{0}'")]
    UnknownDiagnosis(DiagnosisId),

    /// The current question demands a date the answer did not carry.
    #[error("question '{0}' requires a date")]
    MissingDate(QuestionId),

    /// The current question demands a note the answer did not carry.
    #[error("question '{0}' requires a note")]
    MissingNote(QuestionId),

    /// An ID or text field exceeded its size limit.
    #[error("field too large: {0}")]
    FieldTooLarge(String),

    /// Sealed data failed to open or to parse afterward. Fatal for that
    /// specific read: the caller must not apply partial data.
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// A decrypted backup does not match the expected backup shape.
    #[error("invalid backup: {0}")]
    ImportSchema(String),

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_value_wire_format_is_nullable_bool() {
        let yes = serde_json::to_string(&AnswerValue::Yes).expect("serialize");
        let no = serde_json::to_string(&AnswerValue::No).expect("serialize");
        let skipped = serde_json::to_string(&AnswerValue::Skipped).expect("serialize");

        assert_eq!(yes, "true");
        assert_eq!(no, "false");
        assert_eq!(skipped, "null");

        let back: AnswerValue = serde_json::from_str("null").expect("parse");
        assert_eq!(back, AnswerValue::Skipped);
    }

    #[test]
    fn skipped_is_not_no() {
        assert!(!AnswerValue::Skipped.matches(false));
        assert!(!AnswerValue::Skipped.matches(true));
        assert!(AnswerValue::No.matches(false));
        assert!(AnswerValue::Yes.matches(true));
        assert!(!AnswerValue::Skipped.is_positive());
    }

    #[test]
    fn question_serializes_camel_case() {
        let q = Question::new("a1", "Feeling down?")
            .with_yes_next("a2")
            .with_no_next("b1");
        let json = serde_json::to_value(&q).expect("serialize");

        assert_eq!(json["yesNext"], "a2");
        assert_eq!(json["noNext"], "b1");
        // Defaulted flags are omitted from the wire format.
        assert!(json.get("isResult").is_none());
        assert!(json.get("requiresDate").is_none());
    }

    #[test]
    fn question_parses_legacy_shape() {
        let json = r#"{
            "id": "A1_3",
            "text": "Depressed mood most of the day?",
            "diagnosis": "current_major_depression",
            "diagnosisName": "Current Major Depression",
            "requiresDate": true,
            "yesNext": "A2_3",
            "noNext": "A2"
        }"#;
        let q: Question = serde_json::from_str(json).expect("parse");

        assert_eq!(q.id.as_str(), "A1_3");
        assert!(q.requires_date);
        assert!(!q.requires_note);
        assert!(!q.is_result);
        assert_eq!(q.yes_next, Some(QuestionId::new("A2_3")));
    }

    #[test]
    fn exclusion_rule_round_trip() {
        let rule = ExclusionRule::new("A12_3", true);
        let json = serde_json::to_string(&rule).expect("serialize");
        assert!(json.contains("questionId"));
        let back: ExclusionRule = serde_json::from_str(&json).expect("parse");
        assert_eq!(back, rule);
    }

    #[test]
    fn warning_display_names_the_reference() {
        let w = ReferentialWarning::DanglingYesNext {
            from: QuestionId::new("a"),
            to: QuestionId::new("gone"),
        };
        assert!(w.to_string().contains("gone"));
    }
}
