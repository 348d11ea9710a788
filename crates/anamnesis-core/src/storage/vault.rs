//! # redb-backed Vault
//!
//! The encrypted local store: current session, report archive, and the
//! cached copy of the question graph, in one embedded database.
//!
//! redb provides ACID transactions and crash safety; the vault adds the
//! sealing transform. Every value is JSON-serialized, sealed through the
//! configured [`Cipher`], and the resulting envelope postcard-encoded into
//! the table. A record that fails to open reads as a
//! [`InterviewError::Decryption`] for that record only — list operations
//! skip it with a warning instead of failing the whole listing, so one
//! corrupt report never hides the rest.

use crate::graph::QuestionGraph;
use crate::limits::MAX_VAULT_RECORD_SIZE;
use crate::seal::{Cipher, SealedBox};
use crate::session::Session;
use crate::types::{InterviewError, Report};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Table for the current session: fixed key -> sealed session bytes.
const SESSION: TableDefinition<&str, &[u8]> = TableDefinition::new("session");

/// Table for reports: report ID -> sealed report bytes.
const REPORTS: TableDefinition<&str, &[u8]> = TableDefinition::new("reports");

/// Table for the cached question graph: fixed key -> sealed graph bytes.
const GRAPH_CACHE: TableDefinition<&str, &[u8]> = TableDefinition::new("graph_cache");

/// Key of the singleton rows in `SESSION` and `GRAPH_CACHE`.
const CURRENT: &str = "current";

/// The encrypted local store.
pub struct Vault {
    db: Database,
    cipher: Box<dyn Cipher>,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault").finish_non_exhaustive()
    }
}

/// Log a per-record failure and drop the record from a listing.
///
/// Mirrors the engine's no-tracing-dependency rule: structured stderr line,
/// app layer redirects to its subscriber if needed.
fn warn_skip(context: &str, key: &str, err: &InterviewError) {
    eprintln!(
        "{{\"level\":\"warn\",\"target\":\"anamnesis_core::storage\",\"message\":\"skipping {} '{}': {}\"}}",
        context, key, err
    );
}

impl Vault {
    /// Open or create the vault database at the given path.
    pub fn open(path: impl AsRef<Path>, cipher: Box<dyn Cipher>) -> Result<Self, InterviewError> {
        let db = Database::create(path.as_ref()).map_err(|e| InterviewError::Io(e.to_string()))?;

        // Initialize tables so later read transactions never miss them.
        {
            let write_txn = db
                .begin_write()
                .map_err(|e| InterviewError::Io(e.to_string()))?;
            let _ = write_txn
                .open_table(SESSION)
                .map_err(|e| InterviewError::Io(e.to_string()))?;
            let _ = write_txn
                .open_table(REPORTS)
                .map_err(|e| InterviewError::Io(e.to_string()))?;
            let _ = write_txn
                .open_table(GRAPH_CACHE)
                .map_err(|e| InterviewError::Io(e.to_string()))?;
            write_txn
                .commit()
                .map_err(|e| InterviewError::Io(e.to_string()))?;
        }

        Ok(Self { db, cipher })
    }

    // =========================================================================
    // SEALED RECORD CODEC
    // =========================================================================

    fn seal_record<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, InterviewError> {
        let plaintext =
            serde_json::to_vec(value).map_err(|e| InterviewError::Serialization(e.to_string()))?;
        let sealed = self.cipher.seal(&plaintext)?;
        postcard::to_stdvec(&sealed).map_err(|e| InterviewError::Serialization(e.to_string()))
    }

    fn open_record<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, InterviewError> {
        if bytes.len() > MAX_VAULT_RECORD_SIZE {
            return Err(InterviewError::Decryption(format!(
                "record size {} exceeds maximum {} bytes",
                bytes.len(),
                MAX_VAULT_RECORD_SIZE
            )));
        }
        let sealed: SealedBox = postcard::from_bytes(bytes)
            .map_err(|e| InterviewError::Decryption(format!("corrupt record envelope: {e}")))?;
        let plaintext = self.cipher.open(&sealed)?;
        serde_json::from_slice(&plaintext)
            .map_err(|e| InterviewError::Decryption(format!("decrypted record is not valid: {e}")))
    }

    fn put(
        &self,
        table: TableDefinition<'static, &'static str, &'static [u8]>,
        key: &str,
        bytes: &[u8],
    ) -> Result<(), InterviewError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| InterviewError::Io(e.to_string()))?;
        {
            let mut t = write_txn
                .open_table(table)
                .map_err(|e| InterviewError::Io(e.to_string()))?;
            t.insert(key, bytes)
                .map_err(|e| InterviewError::Io(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| InterviewError::Io(e.to_string()))
    }

    fn get_raw(
        &self,
        table: TableDefinition<'static, &'static str, &'static [u8]>,
        key: &str,
    ) -> Result<Option<Vec<u8>>, InterviewError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| InterviewError::Io(e.to_string()))?;
        let t = read_txn
            .open_table(table)
            .map_err(|e| InterviewError::Io(e.to_string()))?;
        let value = t
            .get(key)
            .map_err(|e| InterviewError::Io(e.to_string()))?
            .map(|guard| guard.value().to_vec());
        Ok(value)
    }

    fn delete(
        &self,
        table: TableDefinition<'static, &'static str, &'static [u8]>,
        key: &str,
    ) -> Result<bool, InterviewError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| InterviewError::Io(e.to_string()))?;
        let removed = {
            let mut t = write_txn
                .open_table(table)
                .map_err(|e| InterviewError::Io(e.to_string()))?;
            t.remove(key)
                .map_err(|e| InterviewError::Io(e.to_string()))?
                .is_some()
        };
        write_txn
            .commit()
            .map_err(|e| InterviewError::Io(e.to_string()))?;
        Ok(removed)
    }

    // =========================================================================
    // SESSION
    // =========================================================================

    /// Persist the current session (called after every answer/back/reset).
    pub fn put_session(&self, session: &Session) -> Result<(), InterviewError> {
        let bytes = self.seal_record(session)?;
        self.put(SESSION, CURRENT, &bytes)
    }

    /// Load the persisted session, if any.
    ///
    /// A record that fails to open is an error — the caller decides whether
    /// to start fresh, it must never see a half-decoded session.
    pub fn load_session(&self) -> Result<Option<Session>, InterviewError> {
        match self.get_raw(SESSION, CURRENT)? {
            Some(bytes) => Ok(Some(self.open_record(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Drop the persisted session.
    pub fn clear_session(&self) -> Result<(), InterviewError> {
        self.delete(SESSION, CURRENT).map(|_| ())
    }

    // =========================================================================
    // REPORTS
    // =========================================================================

    /// Archive a report, keyed by its ID.
    pub fn put_report(&self, report: &Report) -> Result<(), InterviewError> {
        let bytes = self.seal_record(report)?;
        self.put(REPORTS, &report.id, &bytes)
    }

    /// Load a single report.
    pub fn get_report(&self, id: &str) -> Result<Option<Report>, InterviewError> {
        match self.get_raw(REPORTS, id)? {
            Some(bytes) => Ok(Some(self.open_record(&bytes)?)),
            None => Ok(None),
        }
    }

    /// List all readable reports in key order.
    ///
    /// Records that fail to open are skipped with a warning; one corrupt
    /// report must not block the rest of the archive.
    pub fn list_reports(&self) -> Result<Vec<Report>, InterviewError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| InterviewError::Io(e.to_string()))?;
        let t = read_txn
            .open_table(REPORTS)
            .map_err(|e| InterviewError::Io(e.to_string()))?;

        let mut reports = Vec::new();
        for entry in t.iter().map_err(|e| InterviewError::Io(e.to_string()))? {
            let (key, value) = entry.map_err(|e| InterviewError::Io(e.to_string()))?;
            match self.open_record::<Report>(value.value()) {
                Ok(report) => reports.push(report),
                Err(e) => warn_skip("report", key.value(), &e),
            }
        }
        Ok(reports)
    }

    /// Delete a report. Returns whether it existed.
    pub fn delete_report(&self, id: &str) -> Result<bool, InterviewError> {
        self.delete(REPORTS, id)
    }

    // =========================================================================
    // QUESTION GRAPH CACHE
    // =========================================================================

    /// Cache the question graph locally (fallback for failed loads, target
    /// for degraded saves).
    pub fn cache_graph(&self, graph: &QuestionGraph) -> Result<(), InterviewError> {
        let bytes = self.seal_record(graph)?;
        self.put(GRAPH_CACHE, CURRENT, &bytes)
    }

    /// Load the cached question graph, if any.
    pub fn load_cached_graph(&self) -> Result<Option<QuestionGraph>, InterviewError> {
        match self.get_raw(GRAPH_CACHE, CURRENT)? {
            Some(bytes) => Ok(Some(self.open_record(&bytes)?)),
            None => Ok(None),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::AnswerLedger;
    use crate::seal::PassphraseCipher;
    use crate::types::{Answer, AnswerValue, PatientInfo, Question, QuestionId};

    fn open_vault(dir: &tempfile::TempDir, passphrase: &str) -> Vault {
        Vault::open(
            dir.path().join("vault.redb"),
            Box::new(PassphraseCipher::new(passphrase)),
        )
        .expect("open vault")
    }

    fn sample_report(id: &str) -> Report {
        let mut answers = AnswerLedger::new();
        answers.record(QuestionId::new("a1"), Answer::new(AnswerValue::Yes));
        let patient = PatientInfo {
            full_name: "Jane Doe".into(),
            ..PatientInfo::default()
        };
        Report::compose(id, "2024-06-02 14:30:00", &patient, &answers, &[], None)
    }

    #[test]
    fn session_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let vault = open_vault(&dir, "clinic-7");

        let graph = QuestionGraph::from_questions([
            Question::new("start", "Begin?").with_yes_next("a1"),
            Question::new("a1", "A1?"),
        ]);
        let mut session = Session::new();
        session
            .advance(&graph, Answer::new(AnswerValue::Yes).with_notes("note"))
            .expect("advance");

        vault.put_session(&session).expect("put");
        let loaded = vault.load_session().expect("load");
        assert_eq!(loaded, Some(session));
    }

    #[test]
    fn missing_session_is_none_not_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let vault = open_vault(&dir, "clinic-7");
        assert!(vault.load_session().expect("load").is_none());
    }

    #[test]
    fn clear_session_removes_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let vault = open_vault(&dir, "clinic-7");

        vault.put_session(&Session::new()).expect("put");
        vault.clear_session().expect("clear");
        assert!(vault.load_session().expect("load").is_none());
    }

    #[test]
    fn reports_archive_and_delete() {
        let dir = tempfile::tempdir().expect("tempdir");
        let vault = open_vault(&dir, "clinic-7");

        vault.put_report(&sample_report("r-1")).expect("put");
        vault.put_report(&sample_report("r-2")).expect("put");

        let listed = vault.list_reports().expect("list");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "r-1");

        assert!(vault.delete_report("r-1").expect("delete"));
        assert!(!vault.delete_report("r-1").expect("delete again"));
        assert_eq!(vault.list_reports().expect("list").len(), 1);
    }

    #[test]
    fn foreign_key_records_are_skipped_in_listings() {
        let dir = tempfile::tempdir().expect("tempdir");

        // Write with one passphrase...
        {
            let vault = open_vault(&dir, "clinic-7");
            vault.put_report(&sample_report("r-1")).expect("put");
        }

        // ...reopen with another: the record is unreadable but listing
        // succeeds (skipping it), and the direct read fails loudly.
        let vault = open_vault(&dir, "other-key");
        assert!(vault.list_reports().expect("list").is_empty());
        assert!(matches!(
            vault.get_report("r-1"),
            Err(InterviewError::Decryption(_))
        ));
    }

    #[test]
    fn graph_cache_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let vault = open_vault(&dir, "clinic-7");

        let graph = QuestionGraph::from_questions([Question::new("start", "Begin?")]);
        vault.cache_graph(&graph).expect("cache");
        assert_eq!(vault.load_cached_graph().expect("load"), Some(graph));
    }

    #[test]
    fn vault_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let vault = open_vault(&dir, "clinic-7");
            vault.put_report(&sample_report("r-1")).expect("put");
        }
        let vault = open_vault(&dir, "clinic-7");
        assert_eq!(vault.list_reports().expect("list").len(), 1);
    }
}
