//! # Report Snapshots
//!
//! A report freezes one interview at a point in time: patient identity,
//! timestamp, the qualifying diagnoses, and the full answer ledger. Once
//! composed it is immutable; the PDF collaborator receives it as-is and is
//! solely responsible for layout.
//!
//! The engine has no clock — the caller supplies the report ID and the
//! timestamp, which keeps composition deterministic and testable.

use crate::ledger::AnswerLedger;
use crate::types::{Diagnosis, PatientInfo, Report, ReportDiagnosis};

impl Report {
    /// Freeze the current interview state into a report.
    ///
    /// `qualifying` is the evaluator's output at snapshot time; each entry
    /// is recorded as confirmed. Non-qualifying diagnoses are omitted.
    #[must_use]
    pub fn compose(
        id: impl Into<String>,
        date: impl Into<String>,
        patient: &PatientInfo,
        answers: &AnswerLedger,
        qualifying: &[&Diagnosis],
        notes: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            patient_id: patient_slug(&patient.full_name),
            patient_name: patient.full_name.clone(),
            date: date.into(),
            diagnoses: qualifying
                .iter()
                .map(|d| ReportDiagnosis {
                    id: d.id.clone(),
                    name: d.name.clone(),
                    confirmed: true,
                })
                .collect(),
            answers: answers.to_map(),
            notes,
        }
    }
}

/// Derive a stable patient key from the display name.
///
/// Lowercased, with every non-alphanumeric run collapsed to a single
/// underscore and no leading/trailing underscores.
#[must_use]
pub fn patient_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_sep = true;
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            slug.push('_');
            last_was_sep = true;
        }
    }
    slug.trim_end_matches('_').to_string()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Answer, AnswerValue, QuestionId};

    #[test]
    fn compose_freezes_ledger_and_diagnoses() {
        let mut answers = AnswerLedger::new();
        answers.record(QuestionId::new("a1"), Answer::new(AnswerValue::Yes));
        answers.record(QuestionId::new("a2"), Answer::new(AnswerValue::Skipped));

        let patient = PatientInfo {
            full_name: "Jane Doe".into(),
            ..PatientInfo::default()
        };
        let mdd = Diagnosis::new("mdd", "Major Depression");

        let report = Report::compose(
            "r-1",
            "2024-06-02 14:30:00",
            &patient,
            &answers,
            &[&mdd],
            Some("stable".into()),
        );

        assert_eq!(report.patient_id, "jane_doe");
        assert_eq!(report.diagnoses.len(), 1);
        assert!(report.diagnoses[0].confirmed);
        assert_eq!(report.answers.len(), 2);

        // Mutating the live ledger afterwards does not touch the snapshot.
        answers.record(QuestionId::new("a3"), Answer::new(AnswerValue::No));
        assert_eq!(report.answers.len(), 2);
    }

    #[test]
    fn slug_collapses_punctuation() {
        assert_eq!(patient_slug("Jane  Q. Doe"), "jane_q_doe");
        assert_eq!(patient_slug("--"), "");
        assert_eq!(patient_slug("Ärzte Team"), "ärzte_team");
    }
}
