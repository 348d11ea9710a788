//! # End-to-End Interview Flow
//!
//! Walks a miniature depression-module interview through the full engine:
//! traversal, evaluation, report snapshot, sealed backup round-trip.

use anamnesis_core::{
    Answer, AnswerValue, BackupData, Diagnosis, DiagnosisCriteria, DiagnosisSet, EditEngine,
    ExclusionRule, PassphraseCipher, PatientInfo, Question, QuestionGraph, QuestionId, Report,
    Session, Step, export_backup, import_backup,
};

/// A cut-down version of the bundled depression module: two screening
/// questions, three substance questions, a result node.
fn module() -> (QuestionGraph, DiagnosisSet) {
    let graph = QuestionGraph::from_questions([
        Question::new("start", "Depressed mood most of the day, nearly every day?")
            .with_yes_next("a2")
            .with_no_next("a2"),
        Question::new("a2", "Markedly diminished interest in activities?")
            .with_yes_next("a12_3")
            .with_no_next("a12_3"),
        Question::new("a12_3", "Symptoms during substance use?")
            .with_yes_next("a12_5")
            .with_no_next("a12_5"),
        Question::new("a12_5", "Symptoms attributable to medication?")
            .with_yes_next("done")
            .with_no_next("done"),
        {
            let mut q = Question::new("done", "Screening complete.");
            q.is_result = true;
            q
        },
    ]);

    let mut mdd = Diagnosis::new("current_major_depression", "Current Major Depression");
    mdd.criteria = DiagnosisCriteria {
        required_questions: vec![QuestionId::new("start"), QuestionId::new("a2")],
        min_positive_answers: 2,
        excluding_questions: vec![
            ExclusionRule::new("a12_3", true),
            ExclusionRule::new("a12_5", true),
        ],
    };

    let mut substance = Diagnosis::new("substance_induced_depression", "Substance-Induced Depression");
    substance.criteria = DiagnosisCriteria {
        required_questions: vec![QuestionId::new("a12_3"), QuestionId::new("a12_5")],
        min_positive_answers: 1,
        excluding_questions: vec![],
    };

    (graph, DiagnosisSet::from_diagnoses([mdd, substance]))
}

#[test]
fn full_interview_to_report() {
    let (graph, diagnoses) = module();
    let mut session = Session::new();
    session.set_patient(PatientInfo {
        full_name: "Jane Doe".into(),
        birth_date: "1987-04-12".into(),
        ..PatientInfo::default()
    });

    // Both screening questions positive, substance questions negative.
    for value in [AnswerValue::Yes, AnswerValue::Yes, AnswerValue::No, AnswerValue::No] {
        session.advance(&graph, Answer::new(value)).expect("advance");
    }
    assert_eq!(session.current().as_str(), "done");

    // The result node ends the interview.
    let step = session.advance(&graph, Answer::new(AnswerValue::Yes)).expect("advance");
    assert_eq!(step, Step::End);

    let qualifying = anamnesis_core::evaluate(session.answers(), &diagnoses);
    let names: Vec<_> = qualifying.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(names, vec!["current_major_depression"]);

    let patient = session.patient_info.clone().expect("patient");
    let report = Report::compose(
        "r-1",
        "2024-06-02 14:30:00",
        &patient,
        session.answers(),
        &qualifying,
        None,
    );
    assert_eq!(report.patient_name, "Jane Doe");
    assert_eq!(report.diagnoses.len(), 1);
    assert_eq!(report.answers.len(), 5);
}

#[test]
fn substance_use_excludes_major_depression() {
    let (graph, diagnoses) = module();
    let mut session = Session::new();

    // Screening positive, but symptoms occurred during substance use.
    for value in [AnswerValue::Yes, AnswerValue::Yes, AnswerValue::Yes, AnswerValue::No] {
        session.advance(&graph, Answer::new(value)).expect("advance");
    }

    let ids = anamnesis_core::evaluate_ids(session.answers(), &diagnoses);
    assert_eq!(
        ids.iter().map(|d| d.as_str()).collect::<Vec<_>>(),
        vec!["substance_induced_depression"]
    );
}

#[test]
fn backup_round_trip_preserves_everything() {
    let (mut graph, mut diagnoses) = module();
    let cipher = PassphraseCipher::new("clinic-7");

    // Editor touches the stores first: add a question, rename a diagnosis.
    EditEngine::add_question(
        &mut graph,
        &diagnoses,
        Question::new("a3", "Significant weight change?"),
    )
    .expect("add");
    let mut renamed = diagnoses
        .get(&anamnesis_core::DiagnosisId::new("current_major_depression"))
        .expect("diagnosis")
        .clone();
    renamed.name = "Major Depressive Episode (current)".into();
    EditEngine::update_diagnosis(&mut graph, &mut diagnoses, renamed).expect("rename");

    let mut session = Session::new();
    session.set_patient(PatientInfo {
        full_name: "Jane Doe".into(),
        ..PatientInfo::default()
    });
    session
        .advance(&graph, Answer::new(AnswerValue::Skipped))
        .expect("advance");
    let report = Report::compose(
        "r-1",
        "2024-06-02 14:30:00",
        &session.patient_info.clone().expect("patient"),
        session.answers(),
        &[],
        Some("partial interview".into()),
    );

    let data = BackupData::new(graph, diagnoses, vec![report], "2024-06-02 14:31:00");
    let bytes = export_backup(&data, &cipher).expect("export");
    let restored = import_backup(&bytes, &cipher).expect("import");

    assert_eq!(restored, data);
    // The skip survives as an explicit null-valued answer.
    let report_answers = &restored.reports[0].answers;
    assert_eq!(
        report_answers.get(&QuestionId::new("start")).map(|a| a.value),
        Some(AnswerValue::Skipped)
    );
}
