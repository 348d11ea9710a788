//! # Backup Format
//!
//! A backup is one JSON document holding the complete editable state —
//! questions, diagnoses, reports — sealed as a whole and wrapped in a small
//! plaintext envelope so the `.json` file stays self-describing.
//!
//! Import is strict and staged: envelope shape, size limit, seal, plaintext
//! JSON, backup shape — in that order, each failing loudly. A file that
//! fails at any stage is rejected whole; nothing is ever partially merged.

use crate::graph::QuestionGraph;
use crate::limits::{BACKUP_VERSION, MAX_BACKUP_PAYLOAD_SIZE};
use crate::rules::DiagnosisSet;
use crate::seal::{Cipher, SealedBox};
use crate::types::{InterviewError, Report};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

/// Format tag identifying a sealed backup envelope.
pub const ENVELOPE_FORMAT: &str = "anamnesis-backup";

/// Envelope layout version.
pub const ENVELOPE_VERSION: u8 = 1;

// =============================================================================
// BACKUP DATA
// =============================================================================

/// The complete exportable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupData {
    pub questions: QuestionGraph,
    pub diagnoses: DiagnosisSet,
    pub reports: Vec<Report>,
    pub version: String,
    pub timestamp: String,
}

impl BackupData {
    /// Assemble a backup with the current format version.
    #[must_use]
    pub fn new(
        questions: QuestionGraph,
        diagnoses: DiagnosisSet,
        reports: Vec<Report>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            questions,
            diagnoses,
            reports,
            version: BACKUP_VERSION.to_string(),
            timestamp: timestamp.into(),
        }
    }
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// The plaintext wrapper written to disk.
#[derive(Debug, Serialize, Deserialize)]
struct BackupEnvelope {
    format: String,
    version: u8,
    nonce: String,
    data: String,
}

// =============================================================================
// EXPORT / IMPORT
// =============================================================================

/// Serialize and seal a backup into `.json` file bytes.
pub fn export_backup(data: &BackupData, cipher: &dyn Cipher) -> Result<Vec<u8>, InterviewError> {
    let plaintext =
        serde_json::to_vec(data).map_err(|e| InterviewError::Serialization(e.to_string()))?;
    let sealed = cipher.seal(&plaintext)?;

    let envelope = BackupEnvelope {
        format: ENVELOPE_FORMAT.to_string(),
        version: ENVELOPE_VERSION,
        nonce: BASE64.encode(&sealed.nonce),
        data: BASE64.encode(&sealed.ciphertext),
    };
    serde_json::to_vec_pretty(&envelope).map_err(|e| InterviewError::Serialization(e.to_string()))
}

/// Open and validate a backup file.
///
/// Validation order: size limit, envelope shape, seal, plaintext JSON,
/// backup shape. The returned data has NOT been applied to any store — the
/// caller swaps it in atomically.
pub fn import_backup(bytes: &[u8], cipher: &dyn Cipher) -> Result<BackupData, InterviewError> {
    if bytes.len() > MAX_BACKUP_PAYLOAD_SIZE {
        return Err(InterviewError::ImportSchema(format!(
            "backup size {} exceeds maximum {} bytes",
            bytes.len(),
            MAX_BACKUP_PAYLOAD_SIZE
        )));
    }

    let envelope: BackupEnvelope = serde_json::from_slice(bytes)
        .map_err(|_| InterviewError::ImportSchema("not a sealed backup file".to_string()))?;

    if envelope.format != ENVELOPE_FORMAT {
        return Err(InterviewError::ImportSchema(format!(
            "unknown format tag '{}'",
            envelope.format
        )));
    }
    if envelope.version != ENVELOPE_VERSION {
        return Err(InterviewError::ImportSchema(format!(
            "unsupported envelope version {}",
            envelope.version
        )));
    }

    let sealed = SealedBox {
        nonce: BASE64
            .decode(&envelope.nonce)
            .map_err(|_| InterviewError::Decryption("corrupt nonce encoding".to_string()))?,
        ciphertext: BASE64
            .decode(&envelope.data)
            .map_err(|_| InterviewError::Decryption("corrupt payload encoding".to_string()))?,
    };

    let plaintext = cipher.open(&sealed)?;

    // Per the error contract, a payload that decrypts but is not JSON is a
    // decryption failure; a JSON payload of the wrong shape is a schema
    // failure.
    let value: serde_json::Value = serde_json::from_slice(&plaintext)
        .map_err(|_| InterviewError::Decryption("decrypted payload is not JSON".to_string()))?;

    check_shape(&value)?;

    let data: BackupData = serde_json::from_value(value)
        .map_err(|e| InterviewError::ImportSchema(e.to_string()))?;

    if data.version.is_empty() || data.timestamp.is_empty() {
        return Err(InterviewError::ImportSchema(
            "version and timestamp must be non-empty".to_string(),
        ));
    }

    Ok(data)
}

/// Structural pre-check mirroring the typed parse, for precise errors.
fn check_shape(value: &serde_json::Value) -> Result<(), InterviewError> {
    let object = value
        .as_object()
        .ok_or_else(|| InterviewError::ImportSchema("backup root must be an object".to_string()))?;

    for (field, check) in [
        ("questions", serde_json::Value::is_object as fn(&serde_json::Value) -> bool),
        ("diagnoses", serde_json::Value::is_object),
        ("reports", serde_json::Value::is_array),
        ("version", serde_json::Value::is_string),
        ("timestamp", serde_json::Value::is_string),
    ] {
        match object.get(field) {
            Some(v) if check(v) => {}
            Some(_) => {
                return Err(InterviewError::ImportSchema(format!(
                    "field '{field}' has the wrong type"
                )));
            }
            None => {
                return Err(InterviewError::ImportSchema(format!(
                    "missing field '{field}'"
                )));
            }
        }
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
