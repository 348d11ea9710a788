//! # Bundled Interview Data
//!
//! The depression-module interview shipped with the binary: the last-resort
//! fallback when neither the question file nor the local cache can be
//! loaded. The module covers the current-major-depression screening with
//! its substance/medical exclusion questions.

use anamnesis_core::{
    Diagnosis, DiagnosisCriteria, DiagnosisSet, ExclusionRule, Question, QuestionGraph, QuestionId,
};

/// The bundled default question graph.
#[must_use]
pub fn default_questions() -> QuestionGraph {
    let mut intro = Question::new(
        "start",
        "Now I am going to ask you some questions about your mood.",
    )
    .with_yes_next("A1");
    intro.is_informational = true;
    intro.info_text = Some(
        "Screening module for a current major depressive episode. \
         Answer for the past two weeks unless a question says otherwise."
            .to_string(),
    );

    let mut a1_3 = Question::new(
        "A1_3",
        "Has the depressed mood been present most of the day, nearly every day, for at least two weeks?",
    )
    .with_diagnosis("current_major_depression", "Current Major Depression")
    .with_yes_next("A2")
    .with_no_next("A2");
    a1_3.requires_date = true;

    let mut a12_6 = Question::new(
        "A12_6",
        "Did the symptoms persist only while a medical condition was untreated?",
    )
    .with_diagnosis("substance_induced_depression", "Substance-Induced Depression")
    .with_yes_next("result_review")
    .with_no_next("result_mdd");
    a12_6.requires_note = true;

    let mut result_mdd = Question::new(
        "result_mdd",
        "Screening positive: criteria pattern consistent with a current major depressive episode. Evaluate the diagnosis list before reporting.",
    );
    result_mdd.is_result = true;

    let mut result_review = Question::new(
        "result_review",
        "Screening complete: symptoms are better explained by substance use or a medical condition. Review the exclusion answers.",
    );
    result_review.is_result = true;

    let mut result_negative = Question::new(
        "result_negative",
        "Screening negative: core mood criteria were not met in the past two weeks.",
    );
    result_negative.is_result = true;

    QuestionGraph::from_questions([
        intro,
        Question::new(
            "A1",
            "In the past two weeks, have you felt depressed, sad, or down most of the day?",
        )
        .with_diagnosis("current_major_depression", "Current Major Depression")
        .with_yes_next("A1_3")
        .with_no_next("A2"),
        a1_3,
        Question::new(
            "A2",
            "In the past two weeks, have you lost interest or pleasure in things you usually enjoy?",
        )
        .with_diagnosis("current_major_depression", "Current Major Depression")
        .with_yes_next("A2_3")
        .with_no_next("gate_core"),
        Question::new(
            "A2_3",
            "Has the loss of interest been present most of the day, nearly every day?",
        )
        .with_diagnosis("current_major_depression", "Current Major Depression")
        .with_yes_next("gate_core")
        .with_no_next("gate_core"),
        Question::new(
            "gate_core",
            "Was at least one core symptom (depressed mood or loss of interest) present?",
        )
        .with_yes_next("A3")
        .with_no_next("result_negative"),
        Question::new(
            "A3",
            "Has there been a significant change in appetite or body weight without dieting?",
        )
        .with_diagnosis("current_major_depression", "Current Major Depression")
        .with_yes_next("A4")
        .with_no_next("A4"),
        Question::new("A4", "Have you had trouble sleeping, or slept far more than usual?")
            .with_diagnosis("current_major_depression", "Current Major Depression")
            .with_yes_next("A5")
            .with_no_next("A5"),
        Question::new(
            "A5",
            "Have others noticed that you were restless, or slowed down in speech and movement?",
        )
        .with_diagnosis("current_major_depression", "Current Major Depression")
        .with_yes_next("A6")
        .with_no_next("A6"),
        Question::new("A6", "Have you felt fatigued or lost your energy nearly every day?")
            .with_diagnosis("current_major_depression", "Current Major Depression")
            .with_yes_next("A7")
            .with_no_next("A7"),
        Question::new(
            "A7",
            "Have you felt worthless, or had excessive or inappropriate guilt?",
        )
        .with_diagnosis("current_major_depression", "Current Major Depression")
        .with_yes_next("A8")
        .with_no_next("A8"),
        Question::new(
            "A8",
            "Have you had trouble thinking, concentrating, or making decisions?",
        )
        .with_diagnosis("current_major_depression", "Current Major Depression")
        .with_yes_next("A9")
        .with_no_next("A9"),
        Question::new(
            "A9",
            "Have you had recurrent thoughts of death, or thoughts of harming yourself?",
        )
        .with_diagnosis("current_major_depression", "Current Major Depression")
        .with_yes_next("A12_3")
        .with_no_next("A12_3"),
        Question::new(
            "A12_3",
            "Did the symptoms occur only during heavy use of alcohol or other substances?",
        )
        .with_diagnosis("substance_induced_depression", "Substance-Induced Depression")
        .with_yes_next("A12_5")
        .with_no_next("A12_5"),
        Question::new(
            "A12_5",
            "Could the symptoms be attributable to a medication you were taking?",
        )
        .with_diagnosis("substance_induced_depression", "Substance-Induced Depression")
        .with_yes_next("A12_6")
        .with_no_next("A12_6"),
        a12_6,
        result_mdd,
        result_review,
        result_negative,
    ])
}

/// The bundled default diagnosis rules.
#[must_use]
pub fn default_diagnoses() -> DiagnosisSet {
    let mut substance = Diagnosis::new(
        "substance_induced_depression",
        "Substance-Induced Depression",
    );
    substance.description =
        "Depressive disorder attributable to substance use, medication, or a general medical condition.".to_string();
    substance.criteria = DiagnosisCriteria {
        required_questions: ids(&["A12_3", "A12_5", "A12_6"]),
        min_positive_answers: 1,
        excluding_questions: vec![],
    };

    let mut mdd = Diagnosis::new("current_major_depression", "Current Major Depression");
    mdd.description =
        "Criteria for a current major depressive episode: five or more symptoms over the same two-week period, not better explained by substance use.".to_string();
    mdd.criteria = DiagnosisCriteria {
        required_questions: ids(&[
            "A1_3", "A2_3", "A3", "A4", "A5", "A6", "A7", "A8", "A9",
        ]),
        min_positive_answers: 5,
        excluding_questions: vec![
            ExclusionRule::new("A12_3", true),
            ExclusionRule::new("A12_5", true),
            ExclusionRule::new("A12_6", true),
        ],
    };

    DiagnosisSet::from_diagnoses([substance, mdd])
}

fn ids(raw: &[&str]) -> Vec<QuestionId> {
    raw.iter().map(|s| QuestionId::new(*s)).collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use anamnesis_core::EditEngine;

    #[test]
    fn bundled_data_has_no_referential_warnings() {
        let graph = default_questions();
        let diagnoses = default_diagnoses();

        let warnings = EditEngine::scan(&graph, &diagnoses);
        assert!(warnings.is_empty(), "bundled data must be clean: {warnings:?}");
    }

    #[test]
    fn bundled_graph_starts_at_start() {
        let graph = default_questions();
        assert!(graph.start().is_some());
        assert!(graph.start().is_some_and(|q| q.is_informational));
    }

    #[test]
    fn five_symptoms_without_substance_use_qualify() {
        use anamnesis_core::{Answer, AnswerValue, QuestionId};

        let diagnoses = default_diagnoses();
        let mut answers = anamnesis_core::AnswerLedger::new();
        for id in ["A1_3", "A2_3", "A3", "A4", "A5"] {
            answers.record(QuestionId::new(id), Answer::new(AnswerValue::Yes));
        }
        for id in ["A12_3", "A12_5", "A12_6"] {
            answers.record(QuestionId::new(id), Answer::new(AnswerValue::No));
        }

        let ids = anamnesis_core::evaluate_ids(&answers, &diagnoses);
        assert_eq!(
            ids.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
            vec!["current_major_depression"]
        );
    }
}
