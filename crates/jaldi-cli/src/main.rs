//! Jaldi command-line tools.
//!
//! Provides the `jaldi` binary: offline report generation from a saved
//! graph, submission to a running generator server, the starter canvas,
//! and the npm dependency audit with its git pre-commit hook.
//!
//! `report` uses the same `jaldi_core::generate()` the server runs, so a
//! report produced here matches what `POST /generate` writes.

mod audit;
mod client;
mod error;
mod hooks;
mod runner;

use std::path::{Path, PathBuf};
use std::process;

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use jaldi_core::{Editor, Graph};

use crate::audit::{Recommendation, Scanner, DEFAULT_WORKSPACES};
use crate::client::{ClientError, GenerateClient};
use crate::runner::SystemRunner;

/// Jaldi site builder tools.
#[derive(Parser)]
#[command(name = "jaldi", about = "Jaldi site builder tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a website report from a graph file.
    Report {
        /// Graph JSON (`{"nodes": [...], "edges": [...]}`).
        #[arg(short, long)]
        graph: PathBuf,

        /// Write the report here instead of printing it.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Submit a graph file to a running generator server.
    Submit {
        #[arg(short, long)]
        graph: PathBuf,

        /// Base URL of the server.
        #[arg(short, long, default_value = "http://localhost:3001")]
        server: String,
    },

    /// Print the starter canvas graph.
    Starter {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Scan npm workspaces for vulnerable dependencies.
    Audit {
        #[arg(value_enum, default_value_t = AuditMode::Report)]
        mode: AuditMode,

        /// Project root containing the workspaces.
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Workspaces to scan (default: root, client, server).
        #[arg(short, long = "workspace")]
        workspaces: Vec<String>,
    },

    /// Point git at `.githooks` and install the pre-commit hook.
    SetupHooks {
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AuditMode {
    /// Scan and exit non-zero on critical vulnerabilities.
    Check,
    /// Scan and write the report.
    Report,
    /// Run `npm audit fix --force`, then rescan.
    Fix,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Report { graph, out } => run_report(&graph, out.as_deref()),
        Commands::Submit { graph, server } => run_submit(&graph, &server).await,
        Commands::Starter { out } => run_starter(out.as_deref()),
        Commands::Audit {
            mode,
            root,
            workspaces,
        } => run_audit(mode, root, workspaces),
        Commands::SetupHooks { root } => run_setup_hooks(&root),
    };
    process::exit(exit_code);
}

/// Loads a graph file.
///
/// Returns the exit code on failure: 3 if the file cannot be read, 2 if it
/// is not a valid graph.
fn load_graph(path: &Path) -> Result<Graph, i32> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: failed to read '{}': {}", path.display(), e);
        3
    })?;
    serde_json::from_str(&text).map_err(|e| {
        eprintln!("Error: invalid graph in '{}': {}", path.display(), e);
        2
    })
}

fn write_output(out: Option<&Path>, text: &str) -> i32 {
    match out {
        Some(path) => match std::fs::write(path, text) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("Error: failed to write '{}': {}", path.display(), e);
                3
            }
        },
        None => {
            print!("{}", text);
            0
        }
    }
}

/// Execute the report subcommand.
///
/// Returns exit code: 0 = success, 2 = invalid graph, 3 = I/O error.
fn run_report(graph_path: &Path, out: Option<&Path>) -> i32 {
    let graph = match load_graph(graph_path) {
        Ok(g) => g,
        Err(code) => return code,
    };

    let report = jaldi_core::generate(&graph, Utc::now());
    let code = write_output(out, &report.text);
    if code == 0 && out.is_some() {
        // Stats as JSON on stdout, matching the server's response body
        let json = serde_json::to_string_pretty(&report.stats)
            .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize stats: {}\"}}", e));
        println!("{}", json);
    }
    code
}

/// Execute the submit subcommand.
///
/// Returns exit code: 0 = success, 1 = server or transport error,
/// 2 = invalid graph, 3 = I/O error.
async fn run_submit(graph_path: &Path, server: &str) -> i32 {
    let graph = match load_graph(graph_path) {
        Ok(g) => g,
        Err(code) => return code,
    };

    let client = GenerateClient::new(server);
    match client.submit(&graph).await {
        Ok(receipt) => {
            println!("{} {}", "✓".green(), receipt.message);
            println!("  Report: {}", receipt.file_path);
            println!(
                "  Elements: {} ({} pages, {} form, {} ui, {} api, {} database)",
                receipt.stats.total_elements,
                receipt.stats.pages,
                receipt.stats.form_elements,
                receipt.stats.ui_elements,
                receipt.stats.api_elements,
                receipt.stats.database_elements
            );
            println!("  Connections: {}", receipt.stats.connections);
            0
        }
        Err(ClientError::Status { status, body }) => {
            eprintln!("Error: server rejected the graph ({}): {}", status, body);
            if status == 400 {
                2
            } else {
                1
            }
        }
        Err(e) => {
            eprintln!("Error: could not reach {}: {}", client.endpoint(), e);
            1
        }
    }
}

/// Execute the starter subcommand.
fn run_starter(out: Option<&Path>) -> i32 {
    let graph = Editor::starter().submit();
    match serde_json::to_string_pretty(&graph) {
        Ok(json) => write_output(out, &(json + "\n")),
        Err(e) => {
            eprintln!("Error: failed to serialize starter graph: {}", e);
            1
        }
    }
}

/// Execute the audit subcommand.
///
/// Returns exit code: 0 = no critical vulnerabilities (or `fix`, which
/// only reports what remains), 1 = critical vulnerabilities found by
/// `check`/`report`, 3 = the report could not be written.
fn run_audit(mode: AuditMode, root: PathBuf, workspaces: Vec<String>) -> i32 {
    let workspaces = if workspaces.is_empty() {
        DEFAULT_WORKSPACES.iter().map(|s| s.to_string()).collect()
    } else {
        workspaces
    };

    let runner = SystemRunner;
    let scanner = Scanner::new(root, workspaces, &runner);
    println!(
        "{}",
        format!("Starting vulnerability scan... ({:?})", mode)
            .bold()
            .cyan()
    );

    let result = match mode {
        AuditMode::Check | AuditMode::Report => scanner.generate_report(),
        AuditMode::Fix => scanner.fix(),
    };

    match result {
        Ok(report) => audit_exit_code(mode, report.summary.recommendation()),
        Err(e) => {
            eprintln!("Error: {}", e);
            3
        }
    }
}

fn audit_exit_code(mode: AuditMode, recommendation: Recommendation) -> i32 {
    match (mode, recommendation) {
        (AuditMode::Check | AuditMode::Report, Recommendation::Critical) => 1,
        _ => 0,
    }
}

/// Execute the setup-hooks subcommand.
fn run_setup_hooks(root: &Path) -> i32 {
    println!(
        "{}",
        "Setting up Git hooks for vulnerability scanning...".bold()
    );

    let setup = match hooks::install(root, &SystemRunner) {
        Ok(setup) => setup,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 3;
        }
    };

    if setup.hooks_path_configured {
        println!("{}", "✓ Git configured to use .githooks directory".green());
    }
    for path in &setup.created {
        println!("{} created {}", "✓".green(), path.display());
    }
    for path in &setup.installed {
        println!("{} {} installed and made executable", "✓".green(), path.display());
    }
    for warning in &setup.warnings {
        println!("{} {}", "⚠".yellow(), warning.yellow());
    }

    println!("{}", "\nThe pre-commit hook will:".blue());
    println!("  • Block commits if critical vulnerabilities are found");
    println!("  • Run automatically before each commit");
    0
}
