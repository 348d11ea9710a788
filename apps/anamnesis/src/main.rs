//! # Anamnesis - Clinical Interview Assistant
//!
//! The main binary for the Anamnesis interview engine.
//!
//! This application provides:
//! - HTTP REST API server (axum-based): interview surface + key-gated admin
//! - CLI interface for driving interviews, reports, and backups
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                  apps/anamnesis (THE BINARY)                   │
//! │                                                                │
//! │  ┌─────────────┐    ┌─────────────┐    ┌───────────────────┐  │
//! │  │   CLI       │    │   HTTP API  │    │ Question Repo     │  │
//! │  │  (clap)     │    │   (axum)    │    │ (file + fallback) │  │
//! │  └──────┬──────┘    └──────┬──────┘    └─────────┬─────────┘  │
//! │         │                  │                     │            │
//! │         └──────────────────┼─────────────────────┘            │
//! │                            ▼                                  │
//! │                   ┌────────────────┐                          │
//! │                   │ anamnesis-core │                          │
//! │                   │  (THE ENGINE)  │                          │
//! │                   └────────────────┘                          │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! anamnesis server --host 0.0.0.0 --port 8080
//!
//! # Drive an interview from the terminal
//! anamnesis patient --name "Jane Doe"
//! anamnesis show
//! anamnesis answer --value yes
//! anamnesis evaluate
//! anamnesis report create
//! ```

mod api;
mod cli;
mod config;
mod defaults;
mod repo;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing — ANAMNESIS_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("ANAMNESIS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "anamnesis=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Anamnesis startup banner.
fn print_banner() {
    println!(
        r#"
  Anamnesis v{} - guided clinical interview assistant

  Structured - Rule-based - Sealed at rest
"#,
        env!("CARGO_PKG_VERSION")
    );
}
