//! # Engine Constants
//!
//! Hardcoded limits and conventions for the interview engine.
//!
//! These are compiled into the binary and immutable at runtime.

/// ID of the interview entry point.
///
/// The traversal engine starts every session here; a graph without a
/// `start` question is flagged by the reference scan.
pub const START_QUESTION_ID: &str = "start";

/// Version string stamped into exported backups.
///
/// Bump on breaking changes to the backup shape.
pub const BACKUP_VERSION: &str = "1.0.0";

/// Maximum length for question and diagnosis IDs.
///
/// Longer IDs are rejected at the edit boundary to keep keys sane as
/// redb table keys and URL path segments.
pub const MAX_ID_LENGTH: usize = 256;

/// Maximum length for question prompt text.
pub const MAX_TEXT_LENGTH: usize = 16_384;

/// Maximum size of a sealed backup payload accepted by import.
///
/// Validated BEFORE any decryption or parsing to bound allocation from
/// corrupt or hostile files.
pub const MAX_BACKUP_PAYLOAD_SIZE: usize = 50 * 1024 * 1024; // 50 MB

/// Maximum size of a single sealed vault record accepted on read.
pub const MAX_VAULT_RECORD_SIZE: usize = 16 * 1024 * 1024; // 16 MB
