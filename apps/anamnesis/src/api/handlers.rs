//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Every mutation persists the session snapshot before responding, keeping
//! the causal guarantee: an answer recorded by `/answer` is visible to
//! `/status`, `/evaluation`, and a restarted process alike.

use super::{
    AppState,
    types::{
        AnswerRequest, BackupExportResponse, BackupImportRequest, BackupImportResponse,
        CreateReportRequest, CurrentQuestionResponse, DiagnosisJson, EditResponse,
        EvaluationResponse, HealthResponse, OpResponse, ReportListResponse, ReportResponse,
        ResetRequest, SaveResponse, StatusResponse, StepResponse, WarningsResponse,
    },
};
use anamnesis_core::{
    Answer, BackupData, Diagnosis, DiagnosisId, EditEngine, InterviewError, Question, QuestionId,
    Report, Step, evaluate, export_backup, import_backup,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

// =============================================================================
// HELPERS
// =============================================================================

/// Map an engine error to an HTTP status.
fn error_status(e: &InterviewError) -> StatusCode {
    match e {
        InterviewError::DuplicateQuestion(_) | InterviewError::DuplicateDiagnosis(_) => {
            StatusCode::CONFLICT
        }
        InterviewError::UnknownQuestion(_) | InterviewError::UnknownDiagnosis(_) => {
            StatusCode::NOT_FOUND
        }
        InterviewError::Serialization(_) | InterviewError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_REQUEST,
    }
}

/// Wall-clock timestamp in the report format (`YYYY-MM-DD HH:MM:SS`).
fn now_stamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Fresh report ID.
fn new_report_id() -> String {
    format!("r-{}", chrono::Utc::now().timestamp_millis())
}

// =============================================================================
// HEALTH / STATUS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Store counts and session progress.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let core = state.core.read().await;

    let response = StatusResponse {
        question_count: core.graph.len(),
        diagnosis_count: core.diagnoses.len(),
        answered_count: core.session.answers().len(),
        progress_percent: core.session.progress_percent(&core.graph),
        current_question: core.session.current().as_str().to_string(),
        can_go_back: core.session.can_go_back(),
        has_patient: core.session.patient_info.is_some(),
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// INTERVIEW SURFACE
// =============================================================================

/// The question currently shown.
pub async fn question_handler(State(state): State<AppState>) -> impl IntoResponse {
    let core = state.core.read().await;
    let question = core.session.current_question(&core.graph).cloned();

    if question.is_none() {
        tracing::warn!(
            "current question '{}' is missing from the graph",
            core.session.current()
        );
    }

    (
        StatusCode::OK,
        Json(CurrentQuestionResponse::success(
            question,
            core.session.progress_percent(&core.graph),
            core.session.can_go_back(),
        )),
    )
}

/// Record patient intake data.
pub async fn patient_handler(
    State(state): State<AppState>,
    Json(patient): Json<anamnesis_core::PatientInfo>,
) -> impl IntoResponse {
    let mut core = state.core.write().await;
    core.session.set_patient(patient);
    core.persist_session();
    (StatusCode::OK, Json(OpResponse::ok()))
}

/// Answer the current question and advance.
pub async fn answer_handler(
    State(state): State<AppState>,
    Json(request): Json<AnswerRequest>,
) -> impl IntoResponse {
    let mut guard = state.core.write().await;
    let core = &mut *guard;

    let mut answer = Answer::new(request.value.into());
    answer.date = request.date.filter(|d| !d.is_empty());
    answer.notes = request.notes.filter(|n| !n.is_empty());

    match core.session.advance(&core.graph, answer) {
        Ok(step) => {
            core.persist_session();
            let complete = step == Step::End;
            (
                StatusCode::OK,
                Json(StepResponse::success(
                    core.session.current().as_str(),
                    complete,
                    core.session.progress_percent(&core.graph),
                )),
            )
        }
        Err(e) => (
            error_status(&e),
            Json(StepResponse::error(
                core.session.current().as_str(),
                e.to_string(),
            )),
        ),
    }
}

/// Back-navigate one question. A no-op at the start of the interview.
pub async fn back_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut core = state.core.write().await;
    core.session.back();
    core.persist_session();

    (
        StatusCode::OK,
        Json(StepResponse::success(
            core.session.current().as_str(),
            false,
            core.session.progress_percent(&core.graph),
        )),
    )
}

/// Reset the interview; with `full`, also drop the patient.
pub async fn reset_handler(
    State(state): State<AppState>,
    request: Option<Json<ResetRequest>>,
) -> impl IntoResponse {
    let full = request.map(|Json(r)| r.full).unwrap_or(false);

    let mut core = state.core.write().await;
    core.session.reset();
    if full {
        core.session.clear_patient();
    }
    core.persist_session();

    (
        StatusCode::OK,
        Json(StepResponse::success(
            core.session.current().as_str(),
            false,
            0,
        )),
    )
}

/// Currently qualifying diagnoses.
pub async fn evaluation_handler(State(state): State<AppState>) -> impl IntoResponse {
    let core = state.core.read().await;
    let qualifying = evaluate(core.session.answers(), &core.diagnoses);

    (
        StatusCode::OK,
        Json(EvaluationResponse {
            success: true,
            diagnoses: qualifying.into_iter().map(DiagnosisJson::from).collect(),
        }),
    )
}

// =============================================================================
// REPORTS
// =============================================================================

/// Freeze the current interview into a report and archive it.
pub async fn create_report_handler(
    State(state): State<AppState>,
    request: Option<Json<CreateReportRequest>>,
) -> impl IntoResponse {
    let notes = request.and_then(|Json(r)| r.notes);

    let core = state.core.read().await;
    let Some(patient) = core.session.patient_info.clone() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ReportResponse::error("no patient recorded for this session")),
        );
    };

    let qualifying = evaluate(core.session.answers(), &core.diagnoses);
    let report = Report::compose(
        new_report_id(),
        now_stamp(),
        &patient,
        core.session.answers(),
        &qualifying,
        notes,
    );

    match core.vault.put_report(&report) {
        Ok(()) => (StatusCode::OK, Json(ReportResponse::success(report))),
        Err(e) => (error_status(&e), Json(ReportResponse::error(e.to_string()))),
    }
}

/// List all readable reports.
pub async fn list_reports_handler(State(state): State<AppState>) -> impl IntoResponse {
    let core = state.core.read().await;
    match core.vault.list_reports() {
        Ok(reports) => (
            StatusCode::OK,
            Json(ReportListResponse {
                success: true,
                reports,
            }),
        ),
        Err(e) => {
            tracing::warn!("report listing failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ReportListResponse {
                    success: false,
                    reports: vec![],
                }),
            )
        }
    }
}

/// Load a single report.
pub async fn get_report_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let core = state.core.read().await;
    match core.vault.get_report(&id) {
        Ok(Some(report)) => (StatusCode::OK, Json(ReportResponse::success(report))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ReportResponse::error(format!("no report '{id}'"))),
        ),
        Err(e) => (error_status(&e), Json(ReportResponse::error(e.to_string()))),
    }
}

/// Delete a report.
pub async fn delete_report_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let core = state.core.read().await;
    match core.vault.delete_report(&id) {
        Ok(true) => (StatusCode::OK, Json(OpResponse::ok())),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(OpResponse::error(format!("no report '{id}'"))),
        ),
        Err(e) => (error_status(&e), Json(OpResponse::error(e.to_string()))),
    }
}

// =============================================================================
// ADMIN: QUESTIONS
// =============================================================================

/// The full question graph, for the editing surface.
pub async fn list_questions_handler(State(state): State<AppState>) -> impl IntoResponse {
    let core = state.core.read().await;
    (StatusCode::OK, Json(core.graph.clone()))
}

/// Add a new question.
pub async fn add_question_handler(
    State(state): State<AppState>,
    Json(question): Json<Question>,
) -> impl IntoResponse {
    let mut guard = state.core.write().await;
    let core = &mut *guard;

    match EditEngine::add_question(&mut core.graph, &core.diagnoses, question) {
        Ok(warnings) => (StatusCode::OK, Json(EditResponse::success(warnings))),
        Err(e) => (error_status(&e), Json(EditResponse::error(e.to_string()))),
    }
}

/// Update an existing question.
pub async fn update_question_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(question): Json<Question>,
) -> impl IntoResponse {
    if question.id.as_str() != id {
        return (
            StatusCode::BAD_REQUEST,
            Json(EditResponse::error("path and body question ID differ")),
        );
    }

    let mut guard = state.core.write().await;
    let core = &mut *guard;

    match EditEngine::update_question(&mut core.graph, &core.diagnoses, question) {
        Ok(warnings) => (StatusCode::OK, Json(EditResponse::success(warnings))),
        Err(e) => (error_status(&e), Json(EditResponse::error(e.to_string()))),
    }
}

/// Delete a question, reporting the references it left dangling.
pub async fn delete_question_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let mut guard = state.core.write().await;
    let core = &mut *guard;

    match EditEngine::delete_question(&mut core.graph, &core.diagnoses, &QuestionId::new(id)) {
        Ok(warnings) => (StatusCode::OK, Json(EditResponse::success(warnings))),
        Err(e) => (error_status(&e), Json(EditResponse::error(e.to_string()))),
    }
}

// =============================================================================
// ADMIN: DIAGNOSES
// =============================================================================

/// The full diagnosis set, for the editing surface.
pub async fn list_diagnoses_handler(State(state): State<AppState>) -> impl IntoResponse {
    let core = state.core.read().await;
    (StatusCode::OK, Json(core.diagnoses.clone()))
}

/// Add a new diagnosis.
pub async fn add_diagnosis_handler(
    State(state): State<AppState>,
    Json(diagnosis): Json<Diagnosis>,
) -> impl IntoResponse {
    let mut core = state.core.write().await;
    match EditEngine::add_diagnosis(&mut core.diagnoses, diagnosis) {
        Ok(()) => (StatusCode::OK, Json(OpResponse::ok())),
        Err(e) => (error_status(&e), Json(OpResponse::error(e.to_string()))),
    }
}

/// Update a diagnosis; a rename cascades into every referencing question's
/// cached display name.
pub async fn update_diagnosis_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(diagnosis): Json<Diagnosis>,
) -> impl IntoResponse {
    if diagnosis.id.as_str() != id {
        return (
            StatusCode::BAD_REQUEST,
            Json(OpResponse::error("path and body diagnosis ID differ")),
        );
    }

    let mut guard = state.core.write().await;
    let core = &mut *guard;

    match EditEngine::update_diagnosis(&mut core.graph, &mut core.diagnoses, diagnosis) {
        Ok(()) => (StatusCode::OK, Json(OpResponse::ok())),
        Err(e) => (error_status(&e), Json(OpResponse::error(e.to_string()))),
    }
}

/// Delete a diagnosis, clearing the link on every referencing question.
pub async fn delete_diagnosis_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let mut guard = state.core.write().await;
    let core = &mut *guard;

    match EditEngine::delete_diagnosis(&mut core.graph, &mut core.diagnoses, &DiagnosisId::new(id))
    {
        Ok(()) => (StatusCode::OK, Json(OpResponse::ok())),
        Err(e) => (error_status(&e), Json(OpResponse::error(e.to_string()))),
    }
}

// =============================================================================
// ADMIN: WARNINGS / SAVE / BACKUP
// =============================================================================

/// Referential warnings for inline display in the editor.
pub async fn warnings_handler(State(state): State<AppState>) -> impl IntoResponse {
    let core = state.core.read().await;
    (
        StatusCode::OK,
        Json(WarningsResponse {
            success: true,
            warnings: EditEngine::scan(&core.graph, &core.diagnoses),
        }),
    )
}

/// Push the in-memory stores through the question repository.
///
/// A primary-store failure degrades to a local-only save rather than
/// failing; the response says which happened.
pub async fn save_handler(State(state): State<AppState>) -> impl IntoResponse {
    let core = state.core.read().await;

    let outcome = match core.repo.save_questions(&core.graph, &core.vault) {
        Ok(outcome) => outcome,
        Err(e) => {
            return (error_status(&e), Json(SaveResponse::error(e.to_string())));
        }
    };

    if let Err(e) = core.repo.save_diagnoses(&core.diagnoses) {
        return (error_status(&e), Json(SaveResponse::error(e.to_string())));
    }

    (
        StatusCode::OK,
        Json(SaveResponse::saved(outcome == crate::repo::SaveOutcome::LocalOnly)),
    )
}

/// Export the complete editable state as a sealed backup file.
pub async fn backup_export_handler(State(state): State<AppState>) -> impl IntoResponse {
    let core = state.core.read().await;

    let reports = match core.vault.list_reports() {
        Ok(reports) => reports,
        Err(e) => {
            return (
                error_status(&e),
                Json(BackupExportResponse::error(e.to_string())),
            );
        }
    };

    let data = BackupData::new(
        core.graph.clone(),
        core.diagnoses.clone(),
        reports,
        now_stamp(),
    );

    match export_backup(&data, &core.cipher) {
        Ok(bytes) => (StatusCode::OK, Json(BackupExportResponse::success(&bytes))),
        Err(e) => (
            error_status(&e),
            Json(BackupExportResponse::error(e.to_string())),
        ),
    }
}

/// Import a sealed backup file, applying it all-or-nothing.
///
/// The file is fully validated before anything is touched; reports are
/// archived first so a storage failure cannot leave the stores half-swapped.
/// The in-memory stores are replaced; `/admin/save` persists them.
pub async fn backup_import_handler(
    State(state): State<AppState>,
    Json(request): Json<BackupImportRequest>,
) -> impl IntoResponse {
    let Ok(bytes) = BASE64.decode(&request.data) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(BackupImportResponse::error("payload is not valid base64")),
        );
    };

    let mut guard = state.core.write().await;
    let core = &mut *guard;

    let data = match import_backup(&bytes, &core.cipher) {
        Ok(data) => data,
        Err(e) => {
            return (
                error_status(&e),
                Json(BackupImportResponse::error(e.to_string())),
            );
        }
    };

    for report in &data.reports {
        if let Err(e) = core.vault.put_report(report) {
            return (
                error_status(&e),
                Json(BackupImportResponse::error(format!(
                    "backup not applied: report archive failed: {e}"
                ))),
            );
        }
    }

    let question_count = data.questions.len();
    let diagnosis_count = data.diagnoses.len();
    let report_count = data.reports.len();
    core.graph.replace(data.questions);
    core.diagnoses.replace(data.diagnoses);

    tracing::info!(
        questions = question_count,
        diagnoses = diagnosis_count,
        reports = report_count,
        "backup imported"
    );

    (
        StatusCode::OK,
        Json(BackupImportResponse::success(
            question_count,
            diagnosis_count,
            report_count,
        )),
    )
}
