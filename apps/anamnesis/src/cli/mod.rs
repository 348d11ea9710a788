//! # Anamnesis CLI Module
//!
//! This module implements the CLI interface for Anamnesis.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show store counts and session progress
//! - `show` - Show the question currently on screen
//! - `patient` - Record patient intake data
//! - `answer` - Answer the current question and advance
//! - `back` - Navigate back one question
//! - `reset` - Reset the interview
//! - `evaluate` - Show currently qualifying diagnoses
//! - `report` - Create, list, or delete report snapshots
//! - `validate` - Show referential warnings for the graph and rules
//! - `export` - Export a sealed backup file
//! - `import` - Import a sealed backup file
//! - `init` - Initialize the data directory with the bundled module

mod commands;

use anamnesis_core::InterviewError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Anamnesis - guided clinical interview assistant
///
/// Walks a clinician through a decision tree of yes/no questions, records
/// answers, derives candidate diagnoses from rule-based criteria, and
/// produces report snapshots.
#[derive(Parser, Debug)]
#[command(name = "anamnesis")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Data directory (vault, question and diagnosis files)
    #[arg(short = 'D', long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Path to an anamnesis.toml config file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to (overrides config file)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show store counts and session progress
    Status,

    /// Show the question currently on screen
    Show,

    /// Record patient intake data
    Patient {
        /// Patient full name
        #[arg(short, long)]
        name: Option<String>,

        /// Read a full PatientInfo JSON document instead
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Answer the current question and advance
    Answer {
        /// The answer: yes, no, or skip
        #[arg(short = 'a', long)]
        value: String,

        /// Date annotation (required by some questions)
        #[arg(short, long)]
        date: Option<String>,

        /// Note annotation (required by some questions)
        #[arg(short = 'n', long)]
        note: Option<String>,
    },

    /// Navigate back one question (answers are preserved)
    Back,

    /// Reset the interview to the start question
    Reset {
        /// Also drop the recorded patient
        #[arg(long)]
        full: bool,
    },

    /// Show currently qualifying diagnoses
    Evaluate,

    /// Report snapshots
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },

    /// Show referential warnings for the graph and rules
    Validate,

    /// Export a sealed backup file
    Export {
        /// Output file path (.json)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import a sealed backup file (all-or-nothing)
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Initialize the data directory with the bundled module
    Init {
        /// Overwrite existing question/diagnosis files
        #[arg(short, long)]
        force: bool,
    },
}

/// Report subcommands.
#[derive(Subcommand, Debug)]
pub enum ReportAction {
    /// Freeze the current interview into a report
    Create {
        /// Clinician notes to attach
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// List archived reports
    List,
    /// Delete a report by ID
    Delete {
        /// The report ID
        id: String,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), InterviewError> {
    let config = crate::config::AppConfig::resolve(cli.data_dir.clone(), cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Server { host, port }) => cmd_server(&config, host, port).await,
        Some(Commands::Status) => cmd_status(&config, json_mode),
        Some(Commands::Show) => cmd_show(&config, json_mode),
        Some(Commands::Patient { name, file }) => cmd_patient(&config, name, file),
        Some(Commands::Answer { value, date, note }) => {
            cmd_answer(&config, &value, date, note, json_mode)
        }
        Some(Commands::Back) => cmd_back(&config),
        Some(Commands::Reset { full }) => cmd_reset(&config, full),
        Some(Commands::Evaluate) => cmd_evaluate(&config, json_mode),
        Some(Commands::Report { action }) => match action {
            ReportAction::Create { notes } => cmd_report_create(&config, notes, json_mode),
            ReportAction::List => cmd_report_list(&config, json_mode),
            ReportAction::Delete { id } => cmd_report_delete(&config, &id),
        },
        Some(Commands::Validate) => cmd_validate(&config, json_mode),
        Some(Commands::Export { output }) => cmd_export(&config, &output),
        Some(Commands::Import { input }) => cmd_import(&config, &input),
        Some(Commands::Init { force }) => cmd_init(&config, force),
        None => {
            // No subcommand - show status by default
            cmd_status(&config, json_mode)
        }
    }
}
