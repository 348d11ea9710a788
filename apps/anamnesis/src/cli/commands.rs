//! # CLI Command Implementations
//!
//! Each command opens the same vault-backed service core the HTTP server
//! uses, so an interview can be driven from the terminal across
//! invocations: the session snapshot is reloaded at startup and persisted
//! after every mutation.

use crate::api::{self, ServiceCore};
use crate::config::{AppConfig, passphrase_from_env};
use crate::repo::{LoadOrigin, QuestionRepo, SaveOutcome};
use anamnesis_core::{
    Answer, AnswerValue, BackupData, InterviewError, PassphraseCipher, Report, Session, Step,
    Vault, evaluate, export_backup, import_backup, limits::MAX_BACKUP_PAYLOAD_SIZE,
};
use std::path::{Path, PathBuf};

// =============================================================================
// CONTEXT
// =============================================================================

/// Open the service core: vault, repository, stores, persisted session.
pub fn open_core(config: &AppConfig) -> Result<ServiceCore, InterviewError> {
    std::fs::create_dir_all(&config.data_dir)
        .map_err(|e| InterviewError::Io(format!("create {:?}: {e}", config.data_dir)))?;

    let cipher = PassphraseCipher::new(&passphrase_from_env());
    let vault = Vault::open(config.vault_path(), Box::new(cipher.clone()))?;
    let repo = QuestionRepo::new(&config.data_dir);

    let (graph, origin) = repo.load_questions(&vault);
    match origin {
        LoadOrigin::Primary => {}
        LoadOrigin::Cache => tracing::warn!("questions loaded from local cache"),
        LoadOrigin::Bundled => tracing::info!("questions loaded from bundled module"),
    }
    let (diagnoses, _) = repo.load_diagnoses();

    for warning in anamnesis_core::EditEngine::scan(&graph, &diagnoses) {
        tracing::warn!("referential warning: {warning}");
    }

    let session = match vault.load_session() {
        Ok(Some(session)) => session,
        Ok(None) => Session::new(),
        Err(e) => {
            // A snapshot that fails to open must not be half-applied;
            // report it and start fresh.
            tracing::warn!("session snapshot unreadable, starting fresh: {e}");
            Session::new()
        }
    };

    Ok(ServiceCore {
        graph,
        diagnoses,
        session,
        vault,
        repo,
        cipher,
    })
}

fn now_stamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn new_report_id() -> String {
    format!("r-{}", chrono::Utc::now().timestamp_millis())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    config: &AppConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), InterviewError> {
    let core = open_core(config)?;

    let host = host.unwrap_or_else(|| config.host.clone());
    let port = port.unwrap_or(config.port);

    println!("Anamnesis Interview Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:      {}", host);
    println!("  Port:      {}", port);
    println!("  Data dir:  {:?}", config.data_dir);
    println!();
    println!("Endpoints:");
    println!("  GET  /question   - Current question");
    println!("  POST /answer     - Answer and advance");
    println!("  POST /back       - Back-navigate");
    println!("  GET  /evaluation - Qualifying diagnoses");
    println!("  POST /reports    - Freeze a report");
    println!("  /admin/*         - Editing surface (key-gated)");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, core).await
}

// =============================================================================
// STATUS / SHOW
// =============================================================================

/// Show store counts and session progress.
pub fn cmd_status(config: &AppConfig, json_mode: bool) -> Result<(), InterviewError> {
    let core = open_core(config)?;
    let progress = core.session.progress_percent(&core.graph);

    if json_mode {
        let output = serde_json::json!({
            "data_dir": config.data_dir.to_string_lossy(),
            "question_count": core.graph.len(),
            "diagnosis_count": core.diagnoses.len(),
            "answered_count": core.session.answers().len(),
            "progress_percent": progress,
            "current_question": core.session.current().as_str(),
            "has_patient": core.session.patient_info.is_some(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Anamnesis Status");
    println!("================");
    println!("Data dir:  {:?}", config.data_dir);
    println!();
    println!("Questions:  {}", core.graph.len());
    println!("Diagnoses:  {}", core.diagnoses.len());
    println!("Answered:   {}", core.session.answers().len());
    println!("Progress:   {}%", progress);
    println!("Current:    {}", core.session.current());
    if let Some(patient) = &core.session.patient_info {
        println!("Patient:    {}", patient.full_name);
    }

    Ok(())
}

/// Show the question currently on screen.
pub fn cmd_show(config: &AppConfig, json_mode: bool) -> Result<(), InterviewError> {
    let core = open_core(config)?;

    let Some(question) = core.session.current_question(&core.graph) else {
        return Err(InterviewError::UnknownQuestion(core.session.current().clone()));
    };

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(question).unwrap_or_default()
        );
        return Ok(());
    }

    println!("[{}] {}", question.id, question.text);
    if let Some(info) = &question.info_text {
        println!();
        println!("{}", info);
    }
    if question.is_result {
        println!("(result node - the interview ends here)");
    } else if question.is_informational {
        println!("(informational - answer yes to continue)");
    } else {
        let mut requirements = Vec::new();
        if question.requires_date {
            requirements.push("--date");
        }
        if question.requires_note {
            requirements.push("--note");
        }
        if !requirements.is_empty() {
            println!("(this question requires {})", requirements.join(" and "));
        }
    }
    println!();
    println!(
        "Progress: {}%  |  Back available: {}",
        core.session.progress_percent(&core.graph),
        core.session.can_go_back()
    );

    Ok(())
}

// =============================================================================
// INTERVIEW COMMANDS
// =============================================================================

/// Record patient intake data.
pub fn cmd_patient(
    config: &AppConfig,
    name: Option<String>,
    file: Option<PathBuf>,
) -> Result<(), InterviewError> {
    let mut core = open_core(config)?;

    let patient = match (file, name) {
        (Some(path), _) => {
            let bytes = std::fs::read(&path)
                .map_err(|e| InterviewError::Io(format!("read {path:?}: {e}")))?;
            serde_json::from_slice(&bytes)
                .map_err(|e| InterviewError::Serialization(format!("parse {path:?}: {e}")))?
        }
        (None, Some(name)) => anamnesis_core::PatientInfo {
            full_name: name,
            ..anamnesis_core::PatientInfo::default()
        },
        (None, None) => {
            return Err(InterviewError::Serialization(
                "provide --name or --file".to_string(),
            ));
        }
    };

    core.session.set_patient(patient);
    core.vault.put_session(&core.session)?;
    println!("Patient recorded");
    Ok(())
}

/// Answer the current question and advance.
pub fn cmd_answer(
    config: &AppConfig,
    value: &str,
    date: Option<String>,
    note: Option<String>,
    json_mode: bool,
) -> Result<(), InterviewError> {
    let mut core = open_core(config)?;

    let value = parse_answer_value(value)?;
    let mut answer = Answer::new(value);
    answer.date = date.filter(|d| !d.is_empty());
    answer.notes = note.filter(|n| !n.is_empty());

    let step = core.session.advance(&core.graph, answer)?;
    core.vault.put_session(&core.session)?;

    if json_mode {
        let output = serde_json::json!({
            "current": core.session.current().as_str(),
            "complete": step == Step::End,
            "progress_percent": core.session.progress_percent(&core.graph),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    match step {
        Step::Moved(_) => {
            if let Some(question) = core.session.current_question(&core.graph) {
                println!("Next: [{}] {}", question.id, question.text);
            }
        }
        Step::End => {
            println!("Interview path ends here.");
            let qualifying = evaluate(core.session.answers(), &core.diagnoses);
            if qualifying.is_empty() {
                println!("No diagnosis criteria met.");
            } else {
                println!("Qualifying diagnoses:");
                for diagnosis in qualifying {
                    println!("  - {} ({})", diagnosis.name, diagnosis.id);
                }
            }
        }
    }
    println!(
        "Progress: {}%",
        core.session.progress_percent(&core.graph)
    );
    Ok(())
}

fn parse_answer_value(raw: &str) -> Result<AnswerValue, InterviewError> {
    match raw.to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" => Ok(AnswerValue::Yes),
        "no" | "n" | "false" => Ok(AnswerValue::No),
        "skip" | "s" | "null" => Ok(AnswerValue::Skipped),
        other => Err(InterviewError::Serialization(format!(
            "unknown answer '{other}'. Use: yes, no, skip"
        ))),
    }
}

/// Navigate back one question.
pub fn cmd_back(config: &AppConfig) -> Result<(), InterviewError> {
    let mut core = open_core(config)?;

    if core.session.back() {
        core.vault.put_session(&core.session)?;
        if let Some(question) = core.session.current_question(&core.graph) {
            println!("Back at: [{}] {}", question.id, question.text);
        }
    } else {
        println!("Already at the first question");
    }
    Ok(())
}

/// Reset the interview.
pub fn cmd_reset(config: &AppConfig, full: bool) -> Result<(), InterviewError> {
    let mut core = open_core(config)?;

    core.session.reset();
    if full {
        core.session.clear_patient();
    }
    core.vault.put_session(&core.session)?;

    println!("Interview reset{}", if full { " (patient cleared)" } else { "" });
    Ok(())
}

/// Show currently qualifying diagnoses.
pub fn cmd_evaluate(config: &AppConfig, json_mode: bool) -> Result<(), InterviewError> {
    let core = open_core(config)?;
    let qualifying = evaluate(core.session.answers(), &core.diagnoses);

    if json_mode {
        let ids: Vec<_> = qualifying.iter().map(|d| d.id.as_str()).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "diagnoses": ids }))
                .unwrap_or_default()
        );
        return Ok(());
    }

    if qualifying.is_empty() {
        println!("No diagnosis criteria met.");
    } else {
        println!("Qualifying diagnoses:");
        for diagnosis in qualifying {
            println!("  - {} ({})", diagnosis.name, diagnosis.id);
            if !diagnosis.description.is_empty() {
                println!("    {}", diagnosis.description);
            }
        }
    }
    Ok(())
}

// =============================================================================
// REPORT COMMANDS
// =============================================================================

/// Freeze the current interview into a report.
pub fn cmd_report_create(
    config: &AppConfig,
    notes: Option<String>,
    json_mode: bool,
) -> Result<(), InterviewError> {
    let core = open_core(config)?;

    let Some(patient) = core.session.patient_info.clone() else {
        return Err(InterviewError::Serialization(
            "no patient recorded - run `anamnesis patient` first".to_string(),
        ));
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
    core.vault.put_report(&report)?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_default()
        );
    } else {
        println!("Report {} created for {}", report.id, report.patient_name);
        println!(
            "  {} answer(s), {} qualifying diagnosis(es)",
            report.answers.len(),
            report.diagnoses.len()
        );
    }
    Ok(())
}

/// List archived reports.
pub fn cmd_report_list(config: &AppConfig, json_mode: bool) -> Result<(), InterviewError> {
    let core = open_core(config)?;
    let reports = core.vault.list_reports()?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).unwrap_or_default()
        );
        return Ok(());
    }

    if reports.is_empty() {
        println!("No reports archived");
        return Ok(());
    }
    for report in &reports {
        println!(
            "{}  {}  {}  ({} diagnoses)",
            report.id,
            report.date,
            report.patient_name,
            report.diagnoses.len()
        );
    }
    Ok(())
}

/// Delete a report by ID.
pub fn cmd_report_delete(config: &AppConfig, id: &str) -> Result<(), InterviewError> {
    let core = open_core(config)?;
    if core.vault.delete_report(id)? {
        println!("Report {} deleted", id);
        Ok(())
    } else {
        Err(InterviewError::Serialization(format!("no report '{id}'")))
    }
}

// =============================================================================
// VALIDATE COMMAND
// =============================================================================

/// Show referential warnings for the graph and rules.
pub fn cmd_validate(config: &AppConfig, json_mode: bool) -> Result<(), InterviewError> {
    let core = open_core(config)?;
    let warnings = anamnesis_core::EditEngine::scan(&core.graph, &core.diagnoses);

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&warnings).unwrap_or_default()
        );
        return Ok(());
    }

    if warnings.is_empty() {
        println!("Graph and rules are referentially clean");
    } else {
        println!("{} warning(s):", warnings.len());
        for warning in &warnings {
            println!("  - {warning}");
        }
    }
    Ok(())
}

// =============================================================================
// EXPORT / IMPORT COMMANDS
// =============================================================================

/// Export a sealed backup file.
pub fn cmd_export(config: &AppConfig, output: &Path) -> Result<(), InterviewError> {
    let core = open_core(config)?;

    let data = BackupData::new(
        core.graph.clone(),
        core.diagnoses.clone(),
        core.vault.list_reports()?,
        now_stamp(),
    );
    let bytes = export_backup(&data, &core.cipher)?;

    std::fs::write(output, &bytes)
        .map_err(|e| InterviewError::Io(format!("write {output:?}: {e}")))?;

    println!("Exported {} bytes to {:?}", bytes.len(), output);
    println!(
        "  {} questions, {} diagnoses, {} reports",
        data.questions.len(),
        data.diagnoses.len(),
        data.reports.len()
    );
    Ok(())
}

/// Import a sealed backup file. All-or-nothing: a file that fails any
/// validation stage changes nothing.
pub fn cmd_import(config: &AppConfig, input: &Path) -> Result<(), InterviewError> {
    let metadata = std::fs::metadata(input)
        .map_err(|e| InterviewError::Io(format!("stat {input:?}: {e}")))?;
    if metadata.len() > MAX_BACKUP_PAYLOAD_SIZE as u64 {
        return Err(InterviewError::ImportSchema(format!(
            "file size {} exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_BACKUP_PAYLOAD_SIZE
        )));
    }

    let bytes =
        std::fs::read(input).map_err(|e| InterviewError::Io(format!("read {input:?}: {e}")))?;

    let mut core = open_core(config)?;
    let data = import_backup(&bytes, &core.cipher)?;

    // Reports first: a storage failure here leaves the stores untouched.
    for report in &data.reports {
        core.vault.put_report(report)?;
    }

    let question_count = data.questions.len();
    let diagnosis_count = data.diagnoses.len();
    let report_count = data.reports.len();
    core.graph.replace(data.questions);
    core.diagnoses.replace(data.diagnoses);

    match core.repo.save_questions(&core.graph, &core.vault)? {
        SaveOutcome::Saved => {}
        SaveOutcome::LocalOnly => println!("Note: question file unwritable, saved locally only"),
    }
    core.repo.save_diagnoses(&core.diagnoses)?;

    println!(
        "Imported {} questions, {} diagnoses, {} reports",
        question_count, diagnosis_count, report_count
    );
    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize the data directory with the bundled module.
pub fn cmd_init(config: &AppConfig, force: bool) -> Result<(), InterviewError> {
    let repo = QuestionRepo::new(&config.data_dir);

    if repo.questions_path().exists() && !force {
        return Err(InterviewError::Io(
            "question file already exists. Use --force to overwrite.".to_string(),
        ));
    }

    std::fs::create_dir_all(&config.data_dir)
        .map_err(|e| InterviewError::Io(format!("create {:?}: {e}", config.data_dir)))?;

    let cipher = PassphraseCipher::new(&passphrase_from_env());
    let vault = Vault::open(config.vault_path(), Box::new(cipher))?;

    let graph = crate::defaults::default_questions();
    let diagnoses = crate::defaults::default_diagnoses();
    repo.save_questions(&graph, &vault)?;
    repo.save_diagnoses(&diagnoses)?;

    println!("Initialized data directory {:?}", config.data_dir);
    println!(
        "  {} questions, {} diagnoses (bundled depression module)",
        graph.len(),
        diagnoses.len()
    );
    Ok(())
}
