//! # anamnesis-core
//!
//! The interview engine for Anamnesis - THE LOGIC.
//!
//! This crate implements the guided clinical interview: a directed graph of
//! yes/no questions with branching, an overwrite-only answer ledger, a
//! back-navigable traversal session, rule-based diagnosis evaluation, and
//! sealed (encrypted) persistence for sessions, reports, and backups.
//!
//! ## Architectural Constraints
//!
//! - Pure Rust, no async, no network dependencies — the HTTP/CLI surface
//!   lives in the app crate
//! - Deterministic: `BTreeMap` everywhere, integer arithmetic only
//! - Every mutation from the editing surface is gated through the edit
//!   engine; commits are all-or-nothing
//! - Sealed data either opens byte-exact or fails loudly — the engine never
//!   operates on partially decoded state

// =============================================================================
// MODULES
// =============================================================================

pub mod evaluate;
pub mod formats;
pub mod graph;
pub mod ledger;
pub mod limits;
pub mod report;
pub mod rules;
pub mod seal;
pub mod session;
pub mod storage;
pub mod types;
pub mod validate;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Answer, AnswerValue, Diagnosis, DiagnosisCriteria, DiagnosisId, ExclusionRule, InterviewError,
    PatientInfo, Question, QuestionId, ReferentialWarning, Report, ReportDiagnosis,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use evaluate::{evaluate, evaluate_ids, qualifies};
pub use graph::QuestionGraph;
pub use ledger::AnswerLedger;
pub use rules::DiagnosisSet;
pub use session::{Session, Step};
pub use validate::EditEngine;

// =============================================================================
// RE-EXPORTS: Persistence
// =============================================================================

pub use formats::{BackupData, export_backup, import_backup};
pub use seal::{Cipher, PassphraseCipher, SealedBox};
pub use storage::Vault;
