//! # Question Repository
//!
//! Load/save of the editable interview data (question graph + diagnosis
//! rules) with the degradation policy the interview screen depends on:
//!
//! - load: primary file -> local vault cache -> bundled defaults. The
//!   cache holds the operator's own edits, so it outranks the bundled
//!   module; defaults are the last resort for a fresh install.
//! - save: write the primary file and refresh the cache; if the primary
//!   write fails, keep the cache write and report "saved locally only"
//!   instead of failing — data is never dropped.
//!
//! There is no retry/backoff; a degraded save is surfaced to the caller,
//! who may re-trigger manually.

use crate::defaults;
use anamnesis_core::{DiagnosisSet, InterviewError, QuestionGraph, Vault};
use std::path::{Path, PathBuf};

/// Maximum size of a question/diagnosis file accepted on load.
const MAX_DATA_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// Where a successful load came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    /// The primary file store.
    Primary,
    /// The sealed vault cache.
    Cache,
    /// The bundled default module.
    Bundled,
}

/// Outcome of a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Written to the primary store (and the cache refreshed).
    Saved,
    /// Primary store failed; the data lives only in the local cache.
    LocalOnly,
}

/// File-backed repository for questions and diagnoses.
#[derive(Debug, Clone)]
pub struct QuestionRepo {
    questions_path: PathBuf,
    diagnoses_path: PathBuf,
}

impl QuestionRepo {
    /// Create a repository rooted in the given data directory.
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            questions_path: data_dir.join("questions.json"),
            diagnoses_path: data_dir.join("diagnoses.json"),
        }
    }

    /// Path of the primary question file.
    #[must_use]
    pub fn questions_path(&self) -> &Path {
        &self.questions_path
    }

    // =========================================================================
    // LOAD
    // =========================================================================

    /// Load the question graph, falling back through cache and defaults.
    pub fn load_questions(&self, vault: &Vault) -> (QuestionGraph, LoadOrigin) {
        match read_json::<QuestionGraph>(&self.questions_path) {
            Ok(Some(graph)) => {
                // Keep the cache in step with the primary store.
                if let Err(e) = vault.cache_graph(&graph) {
                    tracing::warn!("failed to refresh question cache: {e}");
                }
                return (graph, LoadOrigin::Primary);
            }
            Ok(None) => {
                tracing::info!("no question file at {:?}", self.questions_path);
            }
            Err(e) => {
                tracing::warn!("failed to load question file: {e}");
            }
        }

        match vault.load_cached_graph() {
            Ok(Some(graph)) => {
                tracing::warn!("question file unavailable, using local cache");
                return (graph, LoadOrigin::Cache);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("question cache unreadable, falling back to bundled module: {e}");
            }
        }

        (defaults::default_questions(), LoadOrigin::Bundled)
    }

    /// Load the diagnosis rules, falling back to the bundled set.
    pub fn load_diagnoses(&self) -> (DiagnosisSet, LoadOrigin) {
        match read_json::<DiagnosisSet>(&self.diagnoses_path) {
            Ok(Some(set)) => (set, LoadOrigin::Primary),
            Ok(None) => (defaults::default_diagnoses(), LoadOrigin::Bundled),
            Err(e) => {
                tracing::warn!("failed to load diagnosis file: {e}");
                (defaults::default_diagnoses(), LoadOrigin::Bundled)
            }
        }
    }

    // =========================================================================
    // SAVE
    // =========================================================================

    /// Persist the question graph.
    ///
    /// The vault cache is refreshed first so a primary-store failure can
    /// degrade to [`SaveOutcome::LocalOnly`] without losing the write.
    pub fn save_questions(
        &self,
        graph: &QuestionGraph,
        vault: &Vault,
    ) -> Result<SaveOutcome, InterviewError> {
        let cache_result = vault.cache_graph(graph);

        match write_json(&self.questions_path, graph) {
            Ok(()) => {
                // Primary write succeeded; a failed cache refresh is only a
                // warning since the primary store is authoritative.
                if let Err(e) = cache_result {
                    tracing::warn!("question cache refresh failed: {e}");
                }
                Ok(SaveOutcome::Saved)
            }
            Err(write_err) => match cache_result {
                Ok(()) => {
                    tracing::warn!(
                        "question file write failed, changes saved locally only: {write_err}"
                    );
                    Ok(SaveOutcome::LocalOnly)
                }
                Err(_) => Err(write_err),
            },
        }
    }

    /// Persist the diagnosis rules.
    pub fn save_diagnoses(&self, diagnoses: &DiagnosisSet) -> Result<(), InterviewError> {
        write_json(&self.diagnoses_path, diagnoses)
    }
}

// =============================================================================
// FILE HELPERS
// =============================================================================

/// Read and parse a JSON file. `Ok(None)` when the file does not exist.
fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, InterviewError> {
    if !path.exists() {
        return Ok(None);
    }

    let metadata =
        std::fs::metadata(path).map_err(|e| InterviewError::Io(format!("stat {path:?}: {e}")))?;
    if metadata.len() > MAX_DATA_FILE_SIZE {
        return Err(InterviewError::Serialization(format!(
            "file size {} exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_DATA_FILE_SIZE
        )));
    }

    let bytes =
        std::fs::read(path).map_err(|e| InterviewError::Io(format!("read {path:?}: {e}")))?;
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| InterviewError::Serialization(format!("parse {path:?}: {e}")))
}

/// Serialize a value to pretty JSON and write it atomically-enough
/// (temp file + rename) next to the target.
fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), InterviewError> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| InterviewError::Serialization(e.to_string()))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| InterviewError::Io(format!("create {parent:?}: {e}")))?;
    }

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &bytes).map_err(|e| InterviewError::Io(format!("write {tmp:?}: {e}")))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| InterviewError::Io(format!("rename {tmp:?} -> {path:?}: {e}")))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use anamnesis_core::{PassphraseCipher, Question};

    fn vault(dir: &tempfile::TempDir) -> Vault {
        Vault::open(
            dir.path().join("vault.redb"),
            Box::new(PassphraseCipher::new("test")),
        )
        .expect("open vault")
    }

    #[test]
    fn fresh_install_loads_bundled_module() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = QuestionRepo::new(dir.path());
        let vault = vault(&dir);

        let (graph, origin) = repo.load_questions(&vault);
        assert_eq!(origin, LoadOrigin::Bundled);
        assert!(graph.start().is_some());

        let (diagnoses, origin) = repo.load_diagnoses();
        assert_eq!(origin, LoadOrigin::Bundled);
        assert_eq!(diagnoses.len(), 2);
    }

    #[test]
    fn save_then_load_uses_primary() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = QuestionRepo::new(dir.path());
        let vault = vault(&dir);

        let graph = QuestionGraph::from_questions([Question::new("start", "Begin?")]);
        let outcome = repo.save_questions(&graph, &vault).expect("save");
        assert_eq!(outcome, SaveOutcome::Saved);

        let (loaded, origin) = repo.load_questions(&vault);
        assert_eq!(origin, LoadOrigin::Primary);
        assert_eq!(loaded, graph);
    }

    #[test]
    fn corrupt_primary_falls_back_to_cache() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = QuestionRepo::new(dir.path());
        let vault = vault(&dir);

        let graph = QuestionGraph::from_questions([Question::new("start", "Begin?")]);
        repo.save_questions(&graph, &vault).expect("save");

        // Corrupt the primary file; the cached copy must take over.
        std::fs::write(repo.questions_path(), b"{ not json").expect("corrupt");

        let (loaded, origin) = repo.load_questions(&vault);
        assert_eq!(origin, LoadOrigin::Cache);
        assert_eq!(loaded, graph);
    }

    #[test]
    fn unwritable_primary_degrades_to_local_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        // Point the "file" at a path whose parent is a regular file, so the
        // primary write must fail while the vault still works.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").expect("blocker");
        let repo = QuestionRepo::new(&blocker.join("nested"));
        let vault = vault(&dir);

        let graph = QuestionGraph::from_questions([Question::new("start", "Begin?")]);
        let outcome = repo.save_questions(&graph, &vault).expect("save");
        assert_eq!(outcome, SaveOutcome::LocalOnly);

        // The degraded write is recoverable from the cache.
        let (loaded, origin) = repo.load_questions(&vault);
        assert_eq!(origin, LoadOrigin::Cache);
        assert_eq!(loaded, graph);
    }

    #[test]
    fn diagnoses_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let repo = QuestionRepo::new(dir.path());

        let set = defaults::default_diagnoses();
        repo.save_diagnoses(&set).expect("save");

        let (loaded, origin) = repo.load_diagnoses();
        assert_eq!(origin, LoadOrigin::Primary);
        assert_eq!(loaded, set);
    }
}
