//! # Edit Engine
//!
//! Gates every mutation of the question graph and the diagnosis set coming
//! from the editing surface.
//!
//! All operations are all-or-nothing: every check runs before the first
//! write, so a rejected edit leaves both stores untouched. Structural
//! problems that do not violate a hard invariant (dangling references in an
//! incrementally authored graph) are returned as warnings for inline
//! display, never as errors.

use crate::graph::QuestionGraph;
use crate::limits::{MAX_ID_LENGTH, MAX_TEXT_LENGTH};
use crate::rules::DiagnosisSet;
use crate::types::{
    Diagnosis, DiagnosisId, InterviewError, Question, QuestionId, ReferentialWarning,
};

/// The edit engine. All graph/rule mutations funnel through here.
pub struct EditEngine;

impl EditEngine {
    // =========================================================================
    // QUESTION EDITS
    // =========================================================================

    /// Add a new question. Rejects empty ID/text and ID collisions.
    ///
    /// Returns the post-commit referential warnings so the editor can show
    /// them inline.
    pub fn add_question(
        graph: &mut QuestionGraph,
        diagnoses: &DiagnosisSet,
        question: Question,
    ) -> Result<Vec<ReferentialWarning>, InterviewError> {
        Self::check_question(&question)?;
        if graph.contains(&question.id) {
            return Err(InterviewError::DuplicateQuestion(question.id));
        }
        graph.upsert(question);
        Ok(graph.scan_references(diagnoses))
    }

    /// Update an existing question in place.
    pub fn update_question(
        graph: &mut QuestionGraph,
        diagnoses: &DiagnosisSet,
        question: Question,
    ) -> Result<Vec<ReferentialWarning>, InterviewError> {
        Self::check_question(&question)?;
        if !graph.contains(&question.id) {
            return Err(InterviewError::UnknownQuestion(question.id));
        }
        graph.upsert(question);
        Ok(graph.scan_references(diagnoses))
    }

    /// Delete a question.
    ///
    /// References from other questions or from diagnosis criteria are left
    /// dangling on purpose — silent repair could hide a flow design error —
    /// and come back as warnings naming each one.
    pub fn delete_question(
        graph: &mut QuestionGraph,
        diagnoses: &DiagnosisSet,
        id: &QuestionId,
    ) -> Result<Vec<ReferentialWarning>, InterviewError> {
        if graph.remove(id).is_none() {
            return Err(InterviewError::UnknownQuestion(id.clone()));
        }
        Ok(graph.scan_references(diagnoses))
    }

    fn check_question(question: &Question) -> Result<(), InterviewError> {
        if question.id.is_empty() {
            return Err(InterviewError::EmptyQuestionId);
        }
        if question.text.trim().is_empty() {
            return Err(InterviewError::EmptyQuestionText);
        }
        if question.id.as_str().len() > MAX_ID_LENGTH {
            return Err(InterviewError::FieldTooLarge(format!(
                "question ID exceeds {MAX_ID_LENGTH} bytes"
            )));
        }
        if question.text.len() > MAX_TEXT_LENGTH {
            return Err(InterviewError::FieldTooLarge(format!(
                "question text exceeds {MAX_TEXT_LENGTH} bytes"
            )));
        }
        Ok(())
    }

    // =========================================================================
    // DIAGNOSIS EDITS
    // =========================================================================

    /// Add a new diagnosis. Rejects empty ID/name and ID collisions.
    pub fn add_diagnosis(
        diagnoses: &mut DiagnosisSet,
        diagnosis: Diagnosis,
    ) -> Result<(), InterviewError> {
        Self::check_diagnosis(&diagnosis)?;
        if diagnoses.contains(&diagnosis.id) {
            return Err(InterviewError::DuplicateDiagnosis(diagnosis.id));
        }
        diagnoses.upsert(diagnosis);
        Ok(())
    }

    /// Update an existing diagnosis, propagating a rename to the cached
    /// `diagnosis_name` on every referencing question.
    ///
    /// The cascade and the write commit together, so the denormalized
    /// display name can never go stale.
    pub fn update_diagnosis(
        graph: &mut QuestionGraph,
        diagnoses: &mut DiagnosisSet,
        diagnosis: Diagnosis,
    ) -> Result<(), InterviewError> {
        Self::check_diagnosis(&diagnosis)?;
        if !diagnoses.contains(&diagnosis.id) {
            return Err(InterviewError::UnknownDiagnosis(diagnosis.id));
        }

        for question in graph.values_mut() {
            if question.diagnosis.as_ref() == Some(&diagnosis.id) {
                question.diagnosis_name = Some(diagnosis.name.clone());
            }
        }
        diagnoses.upsert(diagnosis);
        Ok(())
    }

    /// Delete a diagnosis, clearing both `diagnosis` and `diagnosis_name`
    /// on every referencing question.
    pub fn delete_diagnosis(
        graph: &mut QuestionGraph,
        diagnoses: &mut DiagnosisSet,
        id: &DiagnosisId,
    ) -> Result<(), InterviewError> {
        if diagnoses.remove(id).is_none() {
            return Err(InterviewError::UnknownDiagnosis(id.clone()));
        }

        for question in graph.values_mut() {
            if question.diagnosis.as_ref() == Some(id) {
                question.diagnosis = None;
                question.diagnosis_name = None;
            }
        }
        Ok(())
    }

    fn check_diagnosis(diagnosis: &Diagnosis) -> Result<(), InterviewError> {
        if diagnosis.id.is_empty() {
            return Err(InterviewError::EmptyDiagnosisId);
        }
        if diagnosis.name.trim().is_empty() {
            return Err(InterviewError::EmptyDiagnosisName);
        }
        if diagnosis.id.as_str().len() > MAX_ID_LENGTH {
            return Err(InterviewError::FieldTooLarge(format!(
                "diagnosis ID exceeds {MAX_ID_LENGTH} bytes"
            )));
        }
        Ok(())
    }

    // =========================================================================
    // SCANNING
    // =========================================================================

    /// Full referential scan of graph and rules.
    #[must_use]
    pub fn scan(graph: &QuestionGraph, diagnoses: &DiagnosisSet) -> Vec<ReferentialWarning> {
        graph.scan_references(diagnoses)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stores() -> (QuestionGraph, DiagnosisSet) {
        let graph = QuestionGraph::from_questions([
            Question::new("start", "Begin?").with_yes_next("a1"),
            Question::new("a1", "A1?").with_diagnosis("mdd", "Major Depression"),
            Question::new("a2", "A2?").with_diagnosis("mdd", "Major Depression"),
        ]);
        let diagnoses =
            DiagnosisSet::from_diagnoses([Diagnosis::new("mdd", "Major Depression")]);
        (graph, diagnoses)
    }

    #[test]
    fn add_rejects_empty_id_and_text() {
        let (mut graph, diagnoses) = stores();

        let err = EditEngine::add_question(&mut graph, &diagnoses, Question::new("", "x"));
        assert!(matches!(err, Err(InterviewError::EmptyQuestionId)));

        let err = EditEngine::add_question(&mut graph, &diagnoses, Question::new("q", "  "));
        assert!(matches!(err, Err(InterviewError::EmptyQuestionText)));

        assert_eq!(graph.len(), 3); // store unchanged
    }

    #[test]
    fn add_rejects_duplicate_id_but_update_accepts() {
        let (mut graph, diagnoses) = stores();

        let err = EditEngine::add_question(&mut graph, &diagnoses, Question::new("a1", "again?"));
        assert!(matches!(err, Err(InterviewError::DuplicateQuestion(_))));

        EditEngine::update_question(&mut graph, &diagnoses, Question::new("a1", "again?"))
            .expect("update");
        assert_eq!(
            graph.get(&QuestionId::new("a1")).map(|q| q.text.as_str()),
            Some("again?")
        );
    }

    #[test]
    fn update_unknown_question_is_rejected() {
        let (mut graph, diagnoses) = stores();
        let err = EditEngine::update_question(&mut graph, &diagnoses, Question::new("nope", "?"));
        assert!(matches!(err, Err(InterviewError::UnknownQuestion(_))));
    }

    #[test]
    fn dangling_next_warns_but_commits() {
        let (mut graph, diagnoses) = stores();

        let warnings = EditEngine::add_question(
            &mut graph,
            &diagnoses,
            Question::new("b1", "B1?").with_yes_next("not_yet_written"),
        )
        .expect("add");

        assert!(graph.contains(&QuestionId::new("b1")));
        assert!(warnings.iter().any(|w| matches!(
            w,
            ReferentialWarning::DanglingYesNext { to, .. } if to.as_str() == "not_yet_written"
        )));
    }

    #[test]
    fn delete_question_reports_new_danglers() {
        let (mut graph, diagnoses) = stores();

        let warnings =
            EditEngine::delete_question(&mut graph, &diagnoses, &QuestionId::new("a1")).expect("delete");

        // start.yesNext now dangles.
        assert!(warnings.iter().any(|w| matches!(
            w,
            ReferentialWarning::DanglingYesNext { from, .. } if from.as_str() == "start"
        )));
    }

    #[test]
    fn rename_cascades_to_cached_names() {
        let (mut graph, mut diagnoses) = stores();

        let mut renamed = Diagnosis::new("mdd", "Major Depressive Disorder");
        renamed.description = "renamed".into();
        EditEngine::update_diagnosis(&mut graph, &mut diagnoses, renamed).expect("update");

        for id in ["a1", "a2"] {
            assert_eq!(
                graph
                    .get(&QuestionId::new(id))
                    .and_then(|q| q.diagnosis_name.as_deref()),
                Some("Major Depressive Disorder")
            );
        }
    }

    #[test]
    fn delete_diagnosis_clears_both_fields() {
        let (mut graph, mut diagnoses) = stores();

        EditEngine::delete_diagnosis(&mut graph, &mut diagnoses, &DiagnosisId::new("mdd"))
            .expect("delete");

        assert!(diagnoses.is_empty());
        for id in ["a1", "a2"] {
            let q = graph.get(&QuestionId::new(id)).expect("question");
            assert!(q.diagnosis.is_none());
            assert!(q.diagnosis_name.is_none());
        }
    }

    #[test]
    fn diagnosis_checks_mirror_question_checks() {
        let (mut graph, mut diagnoses) = stores();

        let err = EditEngine::add_diagnosis(&mut diagnoses, Diagnosis::new("", "X"));
        assert!(matches!(err, Err(InterviewError::EmptyDiagnosisId)));

        let err = EditEngine::add_diagnosis(&mut diagnoses, Diagnosis::new("x", " "));
        assert!(matches!(err, Err(InterviewError::EmptyDiagnosisName)));

        let err = EditEngine::add_diagnosis(&mut diagnoses, Diagnosis::new("mdd", "Dup"));
        assert!(matches!(err, Err(InterviewError::DuplicateDiagnosis(_))));

        let err = EditEngine::update_diagnosis(
            &mut graph,
            &mut diagnoses,
            Diagnosis::new("ghost", "Ghost"),
        );
        assert!(matches!(err, Err(InterviewError::UnknownDiagnosis(_))));
    }

    #[test]
    fn oversized_id_is_rejected() {
        let (mut graph, diagnoses) = stores();
        let long_id = "q".repeat(MAX_ID_LENGTH + 1);
        let err = EditEngine::add_question(&mut graph, &diagnoses, Question::new(long_id, "?"));
        assert!(matches!(err, Err(InterviewError::FieldTooLarge(_))));
    }
}
