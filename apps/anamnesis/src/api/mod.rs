//! # Anamnesis HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! Interview surface (open):
//! - `GET  /health` - Health check
//! - `GET  /status` - Store counts and session progress
//! - `GET  /question` - The question currently shown
//! - `POST /patient` - Record patient intake data
//! - `POST /answer` - Answer the current question and advance
//! - `POST /back` - Back-navigate one question
//! - `POST /reset` - Reset the interview
//! - `GET  /evaluation` - Currently qualifying diagnoses
//! - `POST /reports`, `GET /reports`, `GET/DELETE /reports/{id}`
//!
//! Editing surface (gated by `ANAMNESIS_ADMIN_KEY` when set):
//! - `GET/POST /admin/questions`, `PUT/DELETE /admin/questions/{id}`
//! - `GET/POST /admin/diagnoses`, `PUT/DELETE /admin/diagnoses/{id}`
//! - `GET  /admin/warnings` - Referential warnings for inline display
//! - `POST /admin/save` - Push stores through the question repository
//! - `POST /admin/backup/export`, `POST /admin/backup/import`
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `ANAMNESIS_CORS_ORIGINS`: Comma-separated allow-list, or "*" for all
//!   (default: localhost only)
//! - `ANAMNESIS_RATE_LIMIT`: Requests per second (default: 100, 0 disables)
//! - `ANAMNESIS_ADMIN_KEY`: If set, `/admin/*` requires Bearer auth

mod auth;
mod handlers;
mod middleware;
mod types;

// Re-exports for external use
pub use auth::get_admin_key_from_env;
pub use middleware::{create_rate_limiter, get_rate_limit_from_env};
// Re-export handler types for integration tests (via `anamnesis::api::*`)
#[allow(unused_imports)]
pub use types::{
    AnswerRequest, BackupExportResponse, BackupImportRequest, BackupImportResponse,
    CreateReportRequest, CurrentQuestionResponse, DiagnosisJson, EditResponse, EvaluationResponse,
    HealthResponse, OpResponse, ReportListResponse, ReportResponse, ResetRequest, SaveResponse,
    StatusResponse, StepResponse, WarningsResponse,
};

use crate::repo::QuestionRepo;
use anamnesis_core::{DiagnosisSet, PassphraseCipher, QuestionGraph, Session, Vault};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Everything the handlers operate on, behind one lock — all core mutations
/// originate from a single logical session of interaction.
pub struct ServiceCore {
    pub graph: QuestionGraph,
    pub diagnoses: DiagnosisSet,
    pub session: Session,
    pub vault: Vault,
    pub repo: QuestionRepo,
    pub cipher: PassphraseCipher,
}

impl ServiceCore {
    /// Persist the session snapshot after a mutation.
    ///
    /// A persistence failure is a non-blocking notification; the system
    /// keeps operating on its in-memory state.
    pub fn persist_session(&self) {
        if let Err(e) = self.vault.put_session(&self.session) {
            tracing::warn!("session persistence failed: {e}");
        }
    }
}

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// The service core behind a single reader/writer lock.
    pub core: Arc<RwLock<ServiceCore>>,
}

impl AppState {
    /// Create new app state around a service core.
    #[must_use]
    pub fn new(core: ServiceCore) -> Self {
        Self {
            core: Arc::new(RwLock::new(core)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from environment configuration.
///
/// Reads `ANAMNESIS_CORS_ORIGINS`:
/// - If "*": allows all origins (development mode!)
/// - If not set: defaults to localhost only (restrictive default)
/// - Otherwise: parses comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("ANAMNESIS_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (ANAMNESIS_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in ANAMNESIS_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No ANAMNESIS_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let localhost_origins = vec![
        "http://localhost:3000".parse::<HeaderValue>().ok(),
        "http://localhost:8080".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3000".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:8080".parse::<HeaderValue>().ok(),
    ];
    let origins: Vec<HeaderValue> = localhost_origins.into_iter().flatten().collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. CORS - handles preflight requests
/// 2. Tracing - logs all requests
/// 3. Rate Limiting - protects against request floods (if enabled)
/// 4. Admin auth - validates the shared key on `/admin/*` (if configured)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let has_auth = get_admin_key_from_env().is_some();
    if has_auth {
        tracing::info!("Admin key authentication enabled for /admin/*");
    } else {
        tracing::warn!(
            "Admin key authentication DISABLED - the editing surface is open! \
             Set ANAMNESIS_ADMIN_KEY to gate /admin/*."
        );
    }

    let mut router = Router::new()
        // Interview surface
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/question", get(handlers::question_handler))
        .route("/patient", post(handlers::patient_handler))
        .route("/answer", post(handlers::answer_handler))
        .route("/back", post(handlers::back_handler))
        .route("/reset", post(handlers::reset_handler))
        .route("/evaluation", get(handlers::evaluation_handler))
        .route(
            "/reports",
            get(handlers::list_reports_handler).post(handlers::create_report_handler),
        )
        .route(
            "/reports/{id}",
            get(handlers::get_report_handler).delete(handlers::delete_report_handler),
        )
        // Editing surface
        .route(
            "/admin/questions",
            get(handlers::list_questions_handler).post(handlers::add_question_handler),
        )
        .route(
            "/admin/questions/{id}",
            axum::routing::put(handlers::update_question_handler)
                .delete(handlers::delete_question_handler),
        )
        .route(
            "/admin/diagnoses",
            get(handlers::list_diagnoses_handler).post(handlers::add_diagnosis_handler),
        )
        .route(
            "/admin/diagnoses/{id}",
            axum::routing::put(handlers::update_diagnosis_handler)
                .delete(handlers::delete_diagnosis_handler),
        )
        .route("/admin/warnings", get(handlers::warnings_handler))
        .route("/admin/save", post(handlers::save_handler))
        .route("/admin/backup/export", post(handlers::backup_export_handler))
        .route("/admin/backup/import", post(handlers::backup_import_handler));

    // Admin auth middleware (innermost - runs last on request)
    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::admin_auth_middleware));
    }

    // Rate limiting middleware
    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    // Body limit sized for sealed backup uploads, CORS and tracing outermost
    router
        .layer(axum::extract::DefaultBodyLimit::max(16 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, core: ServiceCore) -> Result<(), anamnesis_core::InterviewError> {
    let state = AppState::new(core);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anamnesis_core::InterviewError::Io(format!("Bind failed: {e}")))?;

    tracing::info!("Anamnesis HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| anamnesis_core::InterviewError::Io(format!("Server error: {e}")))
}
