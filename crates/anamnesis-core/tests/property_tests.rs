//! # Property-Based Tests
//!
//! Determinism and invariant checks for the interview engine.

use anamnesis_core::{
    Answer, AnswerLedger, AnswerValue, Diagnosis, DiagnosisCriteria, DiagnosisSet, ExclusionRule,
    PassphraseCipher, Question, QuestionGraph, QuestionId, Session,
    seal::Cipher,
};
use proptest::collection::vec;
use proptest::prelude::*;

// =============================================================================
// STRATEGIES
// =============================================================================

fn answer_value() -> impl Strategy<Value = AnswerValue> {
    prop_oneof![
        Just(AnswerValue::Yes),
        Just(AnswerValue::No),
        Just(AnswerValue::Skipped),
    ]
}

/// A linear chain start -> q1 -> ... -> qN following the yes branch.
fn chain_graph(len: usize) -> QuestionGraph {
    let mut questions = Vec::new();
    for i in 0..len {
        let id = if i == 0 { "start".to_string() } else { format!("q{i}") };
        let mut q = Question::new(&id, format!("Question {i}?"));
        if i + 1 < len {
            let next = format!("q{}", i + 1);
            q.yes_next = Some(QuestionId::new(next));
        }
        questions.push(q);
    }
    QuestionGraph::from_questions(questions)
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Evaluating twice with identical inputs yields identical output.
    #[test]
    fn evaluation_is_deterministic(
        values in vec(answer_value(), 1..12),
        min in 0u32..6,
    ) {
        let mut answers = AnswerLedger::new();
        let mut required = Vec::new();
        for (i, value) in values.iter().enumerate() {
            let id = QuestionId::new(format!("q{i}"));
            answers.record(id.clone(), Answer::new(*value));
            required.push(id);
        }

        let mut diagnosis = Diagnosis::new("d", "D");
        diagnosis.criteria = DiagnosisCriteria {
            required_questions: required,
            min_positive_answers: min,
            excluding_questions: vec![],
        };
        let set = DiagnosisSet::from_diagnoses([diagnosis]);

        let first = anamnesis_core::evaluate_ids(&answers, &set);
        let second = anamnesis_core::evaluate_ids(&answers, &set);
        prop_assert_eq!(first, second);
    }

    /// The threshold rule is exactly "count of yes >= min".
    #[test]
    fn threshold_matches_yes_count(
        values in vec(answer_value(), 1..12),
        min in 0u32..12,
    ) {
        let mut answers = AnswerLedger::new();
        let mut required = Vec::new();
        for (i, value) in values.iter().enumerate() {
            let id = QuestionId::new(format!("q{i}"));
            answers.record(id.clone(), Answer::new(*value));
            required.push(id);
        }
        let yes_count = values.iter().filter(|v| **v == AnswerValue::Yes).count();

        let mut diagnosis = Diagnosis::new("d", "D");
        diagnosis.criteria = DiagnosisCriteria {
            required_questions: required,
            min_positive_answers: min,
            excluding_questions: vec![],
        };

        let qualified = anamnesis_core::qualifies(&answers, &diagnosis);
        prop_assert_eq!(qualified, yes_count >= min as usize);
    }

    /// A matched exclusion disqualifies regardless of the positive count.
    #[test]
    fn exclusion_always_wins(values in vec(answer_value(), 1..12)) {
        let mut answers = AnswerLedger::new();
        let mut required = Vec::new();
        for (i, value) in values.iter().enumerate() {
            let id = QuestionId::new(format!("q{i}"));
            answers.record(id.clone(), Answer::new(*value));
            required.push(id);
        }
        answers.record(QuestionId::new("veto"), Answer::new(AnswerValue::Yes));

        let mut diagnosis = Diagnosis::new("d", "D");
        diagnosis.criteria = DiagnosisCriteria {
            required_questions: required,
            min_positive_answers: 0, // threshold trivially met
            excluding_questions: vec![ExclusionRule::new("veto", true)],
        };

        prop_assert!(!anamnesis_core::qualifies(&answers, &diagnosis));
    }

    /// The ledger never grows beyond the set of distinct question IDs, and
    /// the last write for an ID wins.
    #[test]
    fn ledger_overwrites_in_place(
        writes in vec((0usize..5, answer_value()), 1..40)
    ) {
        let mut ledger = AnswerLedger::new();
        for (slot, value) in &writes {
            ledger.record(QuestionId::new(format!("q{slot}")), Answer::new(*value));
        }

        let distinct = writes.iter().map(|(slot, _)| slot).collect::<std::collections::BTreeSet<_>>();
        prop_assert_eq!(ledger.len(), distinct.len());

        for slot in distinct {
            let last = writes.iter().rev().find(|(s, _)| s == slot).map(|(_, v)| *v);
            let stored = ledger.get(&QuestionId::new(format!("q{slot}"))).map(|a| a.value);
            prop_assert_eq!(stored, last);
        }
    }

    /// Walking a chain: each advance extends history by exactly one, and
    /// progress never decreases.
    #[test]
    fn chain_walk_invariants(len in 2usize..20) {
        let graph = chain_graph(len);
        let mut session = Session::new();
        let mut last_progress = session.progress_percent(&graph);

        for step in 0..len - 1 {
            let before = session.history().len();
            session.advance(&graph, Answer::new(AnswerValue::Yes)).expect("advance");
            prop_assert_eq!(session.history().len(), before + 1);

            let progress = session.progress_percent(&graph);
            prop_assert!(progress >= last_progress);
            last_progress = progress;

            prop_assert_eq!(session.current().as_str(), format!("q{}", step + 1));
        }
    }

    /// back() after advance() restores the previous question and leaves the
    /// ledger entry for the question left behind untouched.
    #[test]
    fn back_restores_previous(len in 2usize..10) {
        let graph = chain_graph(len);
        let mut session = Session::new();

        let before = session.current().clone();
        session.advance(&graph, Answer::new(AnswerValue::Yes)).expect("advance");
        let recorded = session.answers().get(&before).cloned();

        prop_assert!(session.back());
        prop_assert_eq!(session.current(), &before);
        prop_assert_eq!(session.answers().get(&before).cloned(), recorded);
    }

    /// Seal/open is the identity on arbitrary payloads.
    #[test]
    fn seal_round_trip(payload in vec(any::<u8>(), 0..2048), passphrase in "[a-zA-Z0-9]{1,24}") {
        let cipher = PassphraseCipher::new(&passphrase);
        let sealed = cipher.seal(&payload).expect("seal");
        let opened = cipher.open(&sealed).expect("open");
        prop_assert_eq!(opened, payload);
    }

    /// Tampering with any ciphertext byte is always detected.
    #[test]
    fn seal_detects_tamper(payload in vec(any::<u8>(), 1..512), flip in any::<u8>()) {
        let cipher = PassphraseCipher::new("clinic-7");
        let mut sealed = cipher.seal(&payload).expect("seal");
        let index = flip as usize % sealed.ciphertext.len();
        sealed.ciphertext[index] ^= 0x01;
        prop_assert!(cipher.open(&sealed).is_err());
    }
}
