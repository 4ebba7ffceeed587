//! Dependency vulnerability scanning across the project's npm workspaces.
//!
//! For every workspace with a `package-lock.json` the scanner runs
//! `npm audit --json`, totals the severities and writes a JSON report plus
//! a timestamped log next to the project root. Both files are truncated at
//! the start of every run.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use colored::{Color, Colorize};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::error::OpsError;
use crate::runner::CommandRunner;

/// Workspaces scanned when none are given. `root` is the project root.
pub const DEFAULT_WORKSPACES: [&str; 3] = ["root", "client", "server"];
pub const REPORT_FILE: &str = "vulnerability-report.json";
pub const LOG_FILE: &str = "vulnerability-report.log";
const LOCK_FILE: &str = "package-lock.json";

// ---------------------------------------------------------------------------
// npm audit output
// ---------------------------------------------------------------------------

/// Severity totals from one `npm audit` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeverityCounts {
    pub total: u64,
    pub critical: u64,
    pub high: u64,
    pub moderate: u64,
    pub low: u64,
}

/// Reads severity totals from `npm audit --json` output.
///
/// npm 7+ reports `metadata.vulnerabilities` as an object of counts; older
/// versions put a total there and the severities in
/// `metadata.vulnerabilities_<severity>`. Missing numbers count as zero.
pub fn parse_counts(audit: &Value) -> SeverityCounts {
    let metadata = &audit["metadata"];
    let num = |v: &Value, key: &str| v.get(key).and_then(Value::as_u64).unwrap_or(0);

    match &metadata["vulnerabilities"] {
        counts @ Value::Object(_) => SeverityCounts {
            total: num(counts, "total"),
            critical: num(counts, "critical"),
            high: num(counts, "high"),
            moderate: num(counts, "moderate"),
            low: num(counts, "low"),
        },
        total => SeverityCounts {
            total: total.as_u64().unwrap_or(0),
            critical: num(metadata, "vulnerabilities_critical"),
            high: num(metadata, "vulnerabilities_high"),
            moderate: num(metadata, "vulnerabilities_moderate"),
            low: num(metadata, "vulnerabilities_low"),
        },
    }
}

/// Number of distinct vulnerable packages in `npm audit --json` output.
pub fn affected_packages(audit: &Value) -> usize {
    audit
        .get("vulnerabilities")
        .and_then(Value::as_object)
        .map_or(0, |m| m.len())
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceStatus {
    Scanned,
    /// No lock file, or npm produced no usable output.
    NoData,
}

/// Results for one workspace.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceAudit {
    pub status: WorkspaceStatus,
    pub vulnerabilities: u64,
    pub critical: u64,
    pub high: u64,
    pub moderate: u64,
    pub low: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl WorkspaceAudit {
    fn no_data() -> Self {
        WorkspaceAudit {
            status: WorkspaceStatus::NoData,
            vulnerabilities: 0,
            critical: 0,
            high: 0,
            moderate: 0,
            low: 0,
            details: None,
            metadata: None,
        }
    }
}

/// Totals across all workspaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub total_vulnerabilities: u64,
    pub critical: u64,
    pub high: u64,
    pub moderate: u64,
    pub low: u64,
    pub total_affected_packages: usize,
}

/// What the summary asks the developer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    /// Fix before deploying.
    Critical,
    /// Update affected packages soon.
    High,
    /// Only low or moderate findings.
    Monitor,
    Clean,
}

impl AuditSummary {
    fn add(&mut self, counts: SeverityCounts, affected: usize) {
        self.total_vulnerabilities += counts.total;
        self.critical += counts.critical;
        self.high += counts.high;
        self.moderate += counts.moderate;
        self.low += counts.low;
        self.total_affected_packages += affected;
    }

    pub fn recommendation(&self) -> Recommendation {
        if self.critical > 0 {
            Recommendation::Critical
        } else if self.high > 0 {
            Recommendation::High
        } else if self.total_vulnerabilities > 0 {
            Recommendation::Monitor
        } else {
            Recommendation::Clean
        }
    }
}

/// The JSON document written to [`REPORT_FILE`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub timestamp: String,
    pub scan_duration: String,
    pub workspaces: IndexMap<String, WorkspaceAudit>,
    pub summary: AuditSummary,
}

// ---------------------------------------------------------------------------
// Log
// ---------------------------------------------------------------------------

/// Timestamped log mirrored to stdout (colored) and the log file (plain).
pub struct AuditLog {
    path: PathBuf,
    echo: bool,
}

impl AuditLog {
    pub fn new(path: PathBuf) -> Self {
        AuditLog { path, echo: true }
    }

    fn reset(&self) -> Result<(), OpsError> {
        fs::write(&self.path, "").map_err(|e| OpsError::io(&self.path, e))
    }

    /// Logs one line. A failed file append is reported but not fatal.
    pub fn log(&self, message: &str, color: Option<Color>) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let line = format!("[{}] {}", timestamp, message);
        if self.echo {
            match color {
                Some(color) => println!("{}", line.color(color)),
                None => println!("{}", line),
            }
        }
        let appended = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| writeln!(f, "{}", line));
        if let Err(e) = appended {
            tracing::warn!(path = %self.path.display(), "could not append to audit log: {}", e);
        }
    }

    fn heading(&self, title: &str) {
        let rule = "═".repeat(43);
        self.log(&rule, None);
        self.log(title, Some(Color::White));
        self.log(&rule, None);
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Scans a fixed set of workspaces under a project root.
pub struct Scanner<'r, R: CommandRunner + ?Sized> {
    root: PathBuf,
    workspaces: Vec<String>,
    runner: &'r R,
    log: AuditLog,
}

impl<'r, R: CommandRunner + ?Sized> Scanner<'r, R> {
    pub fn new(root: impl Into<PathBuf>, workspaces: Vec<String>, runner: &'r R) -> Self {
        let root = root.into();
        let log = AuditLog::new(root.join(LOG_FILE));
        Scanner {
            root,
            workspaces,
            runner,
            log,
        }
    }

    /// Stops mirroring the log to stdout.
    pub fn quiet(mut self) -> Self {
        self.log.echo = false;
        self
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join(REPORT_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    /// Directory of a workspace: the root itself for `root`.
    pub fn workspace_path(&self, workspace: &str) -> PathBuf {
        if workspace == "root" {
            self.root.clone()
        } else {
            self.root.join(workspace)
        }
    }

    fn has_lock_file(&self, dir: &Path) -> bool {
        dir.join(LOCK_FILE).is_file()
    }

    /// Runs `npm audit --json` in one workspace.
    ///
    /// npm exits with 1 when it finds vulnerabilities, so the exit code is
    /// ignored and only the JSON on stdout matters.
    fn run_audit(&self, workspace: &str) -> Option<Value> {
        let dir = self.workspace_path(workspace);
        self.log.log(&format!("Scanning {}...", workspace), Some(Color::Cyan));

        if !self.has_lock_file(&dir) {
            self.log.log(
                &format!("No {} found in {}, skipping...", LOCK_FILE, workspace),
                Some(Color::Yellow),
            );
            return None;
        }

        let output = match self.runner.run("npm", &["audit", "--json"], &dir) {
            Ok(output) => output,
            Err(e) => {
                self.log
                    .log(&format!("Error scanning {}: {}", workspace, e), Some(Color::Red));
                return None;
            }
        };

        match serde_json::from_str(&output.stdout) {
            Ok(value) => Some(value),
            Err(e) => {
                self.log.log(
                    &format!("Error parsing JSON output from {}: {}", workspace, e),
                    Some(Color::Red),
                );
                None
            }
        }
    }

    /// Scans every workspace and writes the JSON report and log.
    pub fn generate_report(&self) -> Result<AuditReport, OpsError> {
        let report_path = self.report_path();
        fs::write(&report_path, "").map_err(|e| OpsError::io(&report_path, e))?;
        self.log.reset()?;
        self.log.heading("Vulnerability Scan Report");

        let started = Instant::now();
        let mut workspaces = IndexMap::new();
        let mut summary = AuditSummary::default();

        for workspace in &self.workspaces {
            let Some(audit) = self.run_audit(workspace) else {
                workspaces.insert(workspace.clone(), WorkspaceAudit::no_data());
                self.log.log(
                    &format!("✓ {}: No vulnerabilities or unable to scan", workspace),
                    Some(Color::Green),
                );
                continue;
            };

            let counts = parse_counts(&audit);
            let affected = affected_packages(&audit);
            summary.add(counts, affected);
            self.log_workspace(workspace, counts);

            workspaces.insert(
                workspace.clone(),
                WorkspaceAudit {
                    status: WorkspaceStatus::Scanned,
                    vulnerabilities: counts.total,
                    critical: counts.critical,
                    high: counts.high,
                    moderate: counts.moderate,
                    low: counts.low,
                    details: audit.get("vulnerabilities").cloned(),
                    metadata: audit.get("metadata").cloned(),
                },
            );
        }

        let report = AuditReport {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            scan_duration: format!("{}ms", started.elapsed().as_millis()),
            workspaces,
            summary,
        };

        let json = serde_json::to_string_pretty(&report)?;
        fs::write(&report_path, json).map_err(|e| OpsError::io(&report_path, e))?;
        self.log.log(
            &format!("✓ Detailed report saved to: {}", report_path.display()),
            Some(Color::Green),
        );

        self.log_summary(&report);
        Ok(report)
    }

    /// Runs `npm audit fix --force` in every workspace, then rescans.
    pub fn fix(&self) -> Result<AuditReport, OpsError> {
        self.log
            .log("Starting automatic vulnerability fixes...", Some(Color::Cyan));

        for workspace in &self.workspaces {
            let dir = self.workspace_path(workspace);
            if !self.has_lock_file(&dir) {
                self.log.log(
                    &format!("No {} in {}, skipping...", LOCK_FILE, workspace),
                    Some(Color::Yellow),
                );
                continue;
            }

            self.log.log(
                &format!("Fixing vulnerabilities in {}...", workspace),
                Some(Color::Cyan),
            );
            match self.runner.run("npm", &["audit", "fix", "--force"], &dir) {
                Ok(output) if output.success() => self.log.log(
                    &format!("✓ {}: Vulnerabilities fixed", workspace),
                    Some(Color::Green),
                ),
                Ok(output) => self.log.log(
                    &format!(
                        "✗ {}: Error during fix - exit code {}: {}",
                        workspace,
                        output.exit_code,
                        output.stderr.trim()
                    ),
                    Some(Color::Red),
                ),
                Err(e) => self.log.log(
                    &format!("✗ {}: Error during fix - {}", workspace, e),
                    Some(Color::Red),
                ),
            }
        }

        self.log
            .log("Re-generating report after fixes...", Some(Color::Cyan));
        self.generate_report()
    }

    fn log_workspace(&self, workspace: &str, counts: SeverityCounts) {
        if counts.total == 0 {
            self.log.log(
                &format!("✓ {}: No vulnerabilities found!", workspace),
                Some(Color::Green),
            );
            return;
        }
        self.log.log(
            &format!("✗ {}: {} vulnerabilities detected", workspace, counts.total),
            Some(Color::Red),
        );
        self.log
            .log(&format!("  • Critical: {}", counts.critical), Some(Color::Red));
        self.log
            .log(&format!("  • High: {}", counts.high), Some(Color::Yellow));
        self.log
            .log(&format!("  • Moderate: {}", counts.moderate), Some(Color::Yellow));
        self.log
            .log(&format!("  • Low: {}", counts.low), Some(Color::Yellow));
    }

    fn log_summary(&self, report: &AuditReport) {
        let s = &report.summary;
        self.log.heading("Summary");
        self.log.log(
            &format!("Total Vulnerabilities: {}", s.total_vulnerabilities),
            None,
        );
        self.log
            .log(&format!("  • Critical: {}", s.critical), Some(Color::Red));
        self.log
            .log(&format!("  • High: {}", s.high), Some(Color::Yellow));
        self.log
            .log(&format!("  • Moderate: {}", s.moderate), Some(Color::Yellow));
        self.log.log(&format!("  • Low: {}", s.low), Some(Color::Yellow));
        self.log.log(
            &format!("Affected Packages: {}", s.total_affected_packages),
            None,
        );
        self.log
            .log(&format!("Scan Duration: {}", report.scan_duration), None);

        self.log.heading("Recommendations");
        match s.recommendation() {
            Recommendation::Critical => {
                self.log
                    .log("CRITICAL VULNERABILITIES DETECTED!", Some(Color::Red));
                self.log.log(
                    "Please address these immediately before deploying.",
                    Some(Color::Red),
                );
                self.log.log("  Run: jaldi audit fix", Some(Color::Cyan));
            }
            Recommendation::High => {
                self.log
                    .log("High-severity vulnerabilities found.", Some(Color::Yellow));
                self.log.log(
                    "Consider updating affected packages soon.",
                    Some(Color::Yellow),
                );
            }
            Recommendation::Monitor => {
                self.log
                    .log("Only low/moderate vulnerabilities found.", Some(Color::Green));
                self.log.log(
                    "Monitor and update as part of regular maintenance.",
                    Some(Color::Green),
                );
            }
            Recommendation::Clean => self.log.log(
                "No vulnerabilities detected in any workspace.",
                Some(Color::Green),
            ),
        }
        self.log.log(
            &format!(
                "For detailed information, see: {}",
                self.report_path().display()
            ),
            Some(Color::Cyan),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::io;

    use serde_json::json;

    use crate::runner::CommandOutput;

    /// Answers `npm audit --json` per workspace directory and records
    /// every invocation.
    struct CannedRunner {
        outputs: Vec<(PathBuf, Value)>,
        calls: RefCell<Vec<(PathBuf, String)>>,
    }

    impl CannedRunner {
        fn new(outputs: Vec<(PathBuf, Value)>) -> Self {
            CannedRunner {
                outputs,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn calls_with(&self, args: &str) -> Vec<PathBuf> {
            self.calls
                .borrow()
                .iter()
                .filter(|(_, a)| a == args)
                .map(|(dir, _)| dir.clone())
                .collect()
        }
    }

    impl CommandRunner for CannedRunner {
        fn run(&self, _program: &str, args: &[&str], cwd: &Path) -> io::Result<CommandOutput> {
            self.calls
                .borrow_mut()
                .push((cwd.to_path_buf(), args.join(" ")));
            if args.contains(&"fix") {
                return Ok(CommandOutput::default());
            }
            let stdout = self
                .outputs
                .iter()
                .find(|(dir, _)| dir == cwd)
                .map(|(_, v)| v.to_string())
                .unwrap_or_else(|| "not json".to_string());
            Ok(CommandOutput {
                exit_code: 1,
                stdout,
                stderr: String::new(),
            })
        }
    }

    fn project(with_lock: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for ws in ["client", "server"] {
            fs::create_dir(dir.path().join(ws)).unwrap();
        }
        for ws in with_lock {
            let path = if *ws == "root" {
                dir.path().to_path_buf()
            } else {
                dir.path().join(ws)
            };
            fs::write(path.join(LOCK_FILE), "{}").unwrap();
        }
        dir
    }

    fn workspaces() -> Vec<String> {
        DEFAULT_WORKSPACES.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_npm7_counts() {
        let audit = json!({
            "vulnerabilities": { "lodash": {}, "minimist": {} },
            "metadata": { "vulnerabilities": {
                "info": 0, "low": 1, "moderate": 2, "high": 3, "critical": 4, "total": 10
            } }
        });
        assert_eq!(
            parse_counts(&audit),
            SeverityCounts { total: 10, critical: 4, high: 3, moderate: 2, low: 1 }
        );
        assert_eq!(affected_packages(&audit), 2);
    }

    #[test]
    fn parses_legacy_counts() {
        let audit = json!({
            "metadata": {
                "vulnerabilities": 5,
                "vulnerabilities_critical": 1,
                "vulnerabilities_high": 2,
                "vulnerabilities_low": 2
            }
        });
        assert_eq!(
            parse_counts(&audit),
            SeverityCounts { total: 5, critical: 1, high: 2, moderate: 0, low: 2 }
        );
        assert_eq!(affected_packages(&audit), 0);
    }

    #[test]
    fn missing_metadata_counts_as_zero() {
        assert_eq!(parse_counts(&json!({ "error": "E404" })), SeverityCounts::default());
    }

    #[test]
    fn recommendation_follows_worst_severity() {
        let mut s = AuditSummary::default();
        assert_eq!(s.recommendation(), Recommendation::Clean);
        s.total_vulnerabilities = 2;
        s.low = 2;
        assert_eq!(s.recommendation(), Recommendation::Monitor);
        s.high = 1;
        assert_eq!(s.recommendation(), Recommendation::High);
        s.critical = 1;
        assert_eq!(s.recommendation(), Recommendation::Critical);
    }

    #[test]
    fn report_totals_scanned_workspaces_and_skips_unlocked_ones() {
        let dir = project(&["root", "client"]);
        let runner = CannedRunner::new(vec![
            (
                dir.path().to_path_buf(),
                json!({
                    "vulnerabilities": { "a": {} },
                    "metadata": { "vulnerabilities": { "critical": 1, "high": 0, "total": 1 } }
                }),
            ),
            (
                dir.path().join("client"),
                json!({
                    "vulnerabilities": { "b": {}, "c": {} },
                    "metadata": { "vulnerabilities": { "high": 2, "low": 1, "total": 3 } }
                }),
            ),
        ]);

        let scanner = Scanner::new(dir.path(), workspaces(), &runner).quiet();
        let report = scanner.generate_report().unwrap();

        assert_eq!(report.summary.total_vulnerabilities, 4);
        assert_eq!(report.summary.critical, 1);
        assert_eq!(report.summary.high, 2);
        assert_eq!(report.summary.total_affected_packages, 3);
        assert_eq!(report.summary.recommendation(), Recommendation::Critical);
        assert_eq!(report.workspaces["server"].status, WorkspaceStatus::NoData);
        assert_eq!(report.workspaces["client"].status, WorkspaceStatus::Scanned);

        // server has no lock file, so npm never ran there
        assert_eq!(
            runner.calls_with("audit --json"),
            [dir.path().to_path_buf(), dir.path().join("client")]
        );

        let written: Value =
            serde_json::from_str(&fs::read_to_string(scanner.report_path()).unwrap()).unwrap();
        assert_eq!(written["summary"]["totalVulnerabilities"], 4);
        assert_eq!(written["workspaces"]["server"]["status"], "no_data");
        assert_eq!(written["workspaces"]["client"]["vulnerabilities"], 3);

        let log = fs::read_to_string(scanner.log_path()).unwrap();
        assert!(log.contains("client: 3 vulnerabilities detected"));
        assert!(log.lines().all(|l| l.starts_with('[')));
    }

    #[test]
    fn unparsable_output_is_no_data() {
        let dir = project(&["client"]);
        let runner = CannedRunner::new(vec![]);
        let scanner = Scanner::new(dir.path(), vec!["client".to_string()], &runner).quiet();

        let report = scanner.generate_report().unwrap();
        assert_eq!(report.workspaces["client"].status, WorkspaceStatus::NoData);
        assert_eq!(report.summary, AuditSummary::default());
    }

    #[test]
    fn rerun_truncates_previous_log() {
        let dir = project(&[]);
        let runner = CannedRunner::new(vec![]);
        let scanner = Scanner::new(dir.path(), workspaces(), &runner).quiet();

        scanner.generate_report().unwrap();
        let first = fs::read_to_string(scanner.log_path()).unwrap().lines().count();
        scanner.generate_report().unwrap();
        let second = fs::read_to_string(scanner.log_path()).unwrap().lines().count();
        assert_eq!(first, second);
    }

    #[test]
    fn fix_runs_only_where_locked_then_rescans() {
        let dir = project(&["client", "server"]);
        let runner = CannedRunner::new(vec![(
            dir.path().join("server"),
            json!({ "metadata": { "vulnerabilities": { "total": 0 } } }),
        )]);
        let scanner = Scanner::new(dir.path(), workspaces(), &runner).quiet();

        let report = scanner.fix().unwrap();
        assert_eq!(
            runner.calls_with("audit fix --force"),
            [dir.path().join("client"), dir.path().join("server")]
        );
        assert_eq!(report.workspaces["server"].status, WorkspaceStatus::Scanned);
        assert_eq!(report.summary.recommendation(), Recommendation::Clean);
    }
}
