//! # API Request/Response Types
//!
//! JSON structures of the HTTP surface. Response types follow the
//! success/error constructor pattern so handlers stay declarative.

use anamnesis_core::{Diagnosis, Question, ReferentialWarning, Report};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH / STATUS
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Interview/store status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub question_count: usize,
    pub diagnosis_count: usize,
    pub answered_count: usize,
    pub progress_percent: u8,
    pub current_question: String,
    pub can_go_back: bool,
    pub has_patient: bool,
}

// =============================================================================
// INTERVIEW
// =============================================================================

/// The question currently shown, with session context for the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentQuestionResponse {
    pub success: bool,
    /// Absent when the current ID dangles (graph edited mid-session).
    pub question: Option<Question>,
    pub progress_percent: u8,
    pub can_go_back: bool,
    pub error: Option<String>,
}

impl CurrentQuestionResponse {
    pub fn success(question: Option<Question>, progress_percent: u8, can_go_back: bool) -> Self {
        Self {
            success: true,
            question,
            progress_percent,
            can_go_back,
            error: None,
        }
    }
}

/// Answer submission. `value` is the tri-state wire form:
/// `true`/`false`/`null` (null = explicitly skipped).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    pub value: Option<bool>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Reset request. `full` additionally drops the patient record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub full: bool,
}

/// Result of an answer or back/reset operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResponse {
    pub success: bool,
    /// The question now current.
    pub current: String,
    /// True once the interview path has ended (dead end or result node).
    pub complete: bool,
    pub progress_percent: u8,
    pub error: Option<String>,
}

impl StepResponse {
    pub fn success(current: impl Into<String>, complete: bool, progress_percent: u8) -> Self {
        Self {
            success: true,
            current: current.into(),
            complete,
            progress_percent,
            error: None,
        }
    }

    pub fn error(current: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            success: false,
            current: current.into(),
            complete: false,
            progress_percent: 0,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// EVALUATION
// =============================================================================

/// One qualifying diagnosis in an evaluation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosisJson {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl From<&Diagnosis> for DiagnosisJson {
    fn from(d: &Diagnosis) -> Self {
        Self {
            id: d.id.as_str().to_string(),
            name: d.name.clone(),
            description: d.description.clone(),
        }
    }
}

/// Evaluation response: all currently qualifying diagnoses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResponse {
    pub success: bool,
    pub diagnoses: Vec<DiagnosisJson>,
}

// =============================================================================
// REPORTS
// =============================================================================

/// Report creation request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateReportRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

/// Single-report response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    pub success: bool,
    pub report: Option<Report>,
    pub error: Option<String>,
}

impl ReportResponse {
    pub fn success(report: Report) -> Self {
        Self {
            success: true,
            report: Some(report),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            report: None,
            error: Some(msg.into()),
        }
    }
}

/// Report listing response. Unreadable archive entries are skipped by the
/// vault, so this always reflects every readable report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportListResponse {
    pub success: bool,
    pub reports: Vec<Report>,
}

// =============================================================================
// ADMIN: EDITS & WARNINGS
// =============================================================================

/// Generic operation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpResponse {
    pub success: bool,
    pub error: Option<String>,
}

impl OpResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
        }
    }
}

/// Response to a question write: committed plus the current warnings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditResponse {
    pub success: bool,
    pub warnings: Vec<ReferentialWarning>,
    pub error: Option<String>,
}

impl EditResponse {
    pub fn success(warnings: Vec<ReferentialWarning>) -> Self {
        Self {
            success: true,
            warnings,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            warnings: vec![],
            error: Some(msg.into()),
        }
    }
}

/// Referential warning listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningsResponse {
    pub success: bool,
    pub warnings: Vec<ReferentialWarning>,
}

/// Outcome of pushing questions/diagnoses through the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    /// `"saved"` or `"local_only"` ("saved locally only" degraded success).
    pub outcome: Option<String>,
    pub error: Option<String>,
}

impl SaveResponse {
    pub fn saved(local_only: bool) -> Self {
        Self {
            success: true,
            outcome: Some(if local_only { "local_only" } else { "saved" }.to_string()),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            outcome: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// ADMIN: BACKUP
// =============================================================================

/// Backup export response. `data` is the base64-encoded `.json` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupExportResponse {
    pub success: bool,
    pub data: Option<String>,
    pub error: Option<String>,
}

impl BackupExportResponse {
    pub fn success(file_bytes: &[u8]) -> Self {
        Self {
            success: true,
            data: Some(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                file_bytes,
            )),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Backup import request: base64 of the `.json` file bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupImportRequest {
    pub data: String,
}

/// Backup import response: what was applied (all-or-nothing).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupImportResponse {
    pub success: bool,
    pub questions: usize,
    pub diagnoses: usize,
    pub reports: usize,
    pub error: Option<String>,
}

impl BackupImportResponse {
    pub fn success(questions: usize, diagnoses: usize, reports: usize) -> Self {
        Self {
            success: true,
            questions,
            diagnoses,
            reports,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            questions: 0,
            diagnoses: 0,
            reports: 0,
            error: Some(msg.into()),
        }
    }
}
