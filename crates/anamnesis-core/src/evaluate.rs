//! # Diagnosis Rule Evaluator
//!
//! Maps the answer ledger and the diagnosis rule set to the set of
//! qualifying diagnoses.
//!
//! The evaluator is a pure function over its inputs: no hidden state, no
//! mutation, deterministic output order (diagnosis ID order). A question
//! absent from the ledger is a non-match for both the positive count and
//! the exclusion check — never treated as an implicit "no".

use crate::ledger::AnswerLedger;
use crate::rules::DiagnosisSet;
use crate::types::{Diagnosis, DiagnosisId};

/// Evaluate every diagnosis rule against the ledger.
///
/// Per diagnosis:
/// 1. count required questions whose recorded answer is yes;
/// 2. below `min_positive_answers` -> not qualified;
/// 3. any exclusion rule matched by a recorded answer -> excluded,
///    regardless of the count;
/// 4. otherwise qualified.
///
/// Exclusion criteria are independent from inclusion criteria: an exclusion
/// may name a question that is not in `required_questions`.
///
/// Multiple diagnoses may qualify simultaneously; all are returned.
#[must_use]
pub fn evaluate<'d>(answers: &AnswerLedger, diagnoses: &'d DiagnosisSet) -> Vec<&'d Diagnosis> {
    diagnoses.iter().filter(|d| qualifies(answers, d)).collect()
}

/// Evaluate and return only the qualifying IDs (for status displays).
#[must_use]
pub fn evaluate_ids(answers: &AnswerLedger, diagnoses: &DiagnosisSet) -> Vec<DiagnosisId> {
    evaluate(answers, diagnoses)
        .into_iter()
        .map(|d| d.id.clone())
        .collect()
}

/// Apply one diagnosis rule to the ledger.
#[must_use]
pub fn qualifies(answers: &AnswerLedger, diagnosis: &Diagnosis) -> bool {
    let criteria = &diagnosis.criteria;

    let positives = criteria
        .required_questions
        .iter()
        .filter(|id| answers.get(id).is_some_and(|a| a.value.is_positive()))
        .count();

    if positives < criteria.min_positive_answers as usize {
        return false;
    }

    let excluded = criteria.excluding_questions.iter().any(|rule| {
        answers
            .get(&rule.question_id)
            .is_some_and(|a| a.value.matches(rule.value))
    });

    !excluded
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Answer, AnswerValue, DiagnosisCriteria, ExclusionRule, QuestionId};

    fn diagnosis(required: &[&str], min: u32, excluding: &[(&str, bool)]) -> Diagnosis {
        let mut d = Diagnosis::new("dep", "Depression");
        d.criteria = DiagnosisCriteria {
            required_questions: required.iter().map(|s| QuestionId::new(*s)).collect(),
            min_positive_answers: min,
            excluding_questions: excluding
                .iter()
                .map(|(id, v)| ExclusionRule::new(*id, *v))
                .collect(),
        };
        d
    }

    fn ledger(entries: &[(&str, AnswerValue)]) -> AnswerLedger {
        let mut ledger = AnswerLedger::new();
        for (id, value) in entries {
            ledger.record(QuestionId::new(*id), Answer::new(*value));
        }
        ledger
    }

    #[test]
    fn threshold_boundary() {
        let d = diagnosis(&["a", "b", "c", "d"], 3, &[]);

        // Exactly 2 of 4 yes -> below threshold.
        let two = ledger(&[("a", AnswerValue::Yes), ("b", AnswerValue::Yes), ("c", AnswerValue::No)]);
        assert!(!qualifies(&two, &d));

        // A third yes tips it over.
        let three = ledger(&[
            ("a", AnswerValue::Yes),
            ("b", AnswerValue::Yes),
            ("c", AnswerValue::Yes),
        ]);
        assert!(qualifies(&three, &d));
    }

    #[test]
    fn exclusion_beats_threshold() {
        let d = diagnosis(&["a"], 1, &[("x", true)]);
        let answers = ledger(&[("a", AnswerValue::Yes), ("x", AnswerValue::Yes)]);

        assert!(!qualifies(&answers, &d));
    }

    #[test]
    fn exclusion_may_target_non_required_question() {
        // "x" is not in requiredQuestions — exclusion still applies.
        let d = diagnosis(&["a", "b"], 1, &[("x", false)]);
        let answers = ledger(&[("a", AnswerValue::Yes), ("x", AnswerValue::No)]);

        assert!(!qualifies(&answers, &d));
    }

    #[test]
    fn unvisited_question_is_a_non_match() {
        let d = diagnosis(&["a", "b"], 1, &[("x", false)]);
        // "x" was never visited: no exclusion. "b" never visited: not positive.
        let answers = ledger(&[("a", AnswerValue::Yes)]);

        assert!(qualifies(&answers, &d));
    }

    #[test]
    fn skipped_neither_counts_nor_excludes() {
        let d = diagnosis(&["a"], 1, &[("x", false)]);
        let answers = ledger(&[("a", AnswerValue::Skipped), ("x", AnswerValue::Skipped)]);

        // Skipped "a" is not positive -> threshold unmet.
        assert!(!qualifies(&answers, &d));

        // With a real positive, skipped "x" still does not exclude.
        let answers = ledger(&[("a", AnswerValue::Yes), ("x", AnswerValue::Skipped)]);
        assert!(qualifies(&answers, &d));
    }

    #[test]
    fn zero_threshold_qualifies_on_empty_ledger() {
        let d = diagnosis(&["a"], 0, &[]);
        assert!(qualifies(&AnswerLedger::new(), &d));
    }

    #[test]
    fn evaluation_is_idempotent() {
        let set = DiagnosisSet::from_diagnoses([
            diagnosis(&["a"], 1, &[]),
            Diagnosis::new("other", "Other"),
        ]);
        let answers = ledger(&[("a", AnswerValue::Yes)]);

        let first = evaluate_ids(&answers, &set);
        let second = evaluate_ids(&answers, &set);
        assert_eq!(first, second);
    }

    #[test]
    fn multiple_diagnoses_can_qualify() {
        let mut a = diagnosis(&["q1"], 1, &[]);
        a.id = crate::types::DiagnosisId::new("a");
        let mut b = diagnosis(&["q1"], 1, &[]);
        b.id = crate::types::DiagnosisId::new("b");
        let set = DiagnosisSet::from_diagnoses([a, b]);

        let answers = ledger(&[("q1", AnswerValue::Yes)]);
        let ids = evaluate_ids(&answers, &set);
        assert_eq!(ids.len(), 2);
    }
}
