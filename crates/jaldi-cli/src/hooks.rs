//! Git hook installation.
//!
//! Points git at the repository's `.githooks` directory and makes sure the
//! pre-commit hook exists and is executable. Problems with individual steps
//! are collected as warnings; only a failure to write the hook aborts.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::OpsError;
use crate::runner::CommandRunner;

pub const HOOKS_DIR: &str = ".githooks";
pub const HOOKS: [&str; 1] = ["pre-commit"];

/// Installed when the repository has no pre-commit hook of its own.
pub const DEFAULT_PRE_COMMIT: &str = "#!/bin/sh
# Blocks the commit when the dependency audit finds critical vulnerabilities.
echo \"Running vulnerability scan...\"
if ! jaldi audit check; then
  echo \"Commit blocked: critical vulnerabilities found.\"
  echo \"Run 'jaldi audit fix' or review vulnerability-report.json.\"
  exit 1
fi
";

/// What [`install`] did.
#[derive(Debug, Default)]
pub struct HookSetup {
    pub hooks_path_configured: bool,
    /// Hooks that are now present and executable.
    pub installed: Vec<PathBuf>,
    /// Hooks written from the built-in default.
    pub created: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Configures `core.hooksPath` and installs the hooks under `root`.
pub fn install<R: CommandRunner + ?Sized>(root: &Path, runner: &R) -> Result<HookSetup, OpsError> {
    let mut setup = HookSetup::default();

    match runner.run("git", &["config", "core.hooksPath", HOOKS_DIR], root) {
        Ok(output) if output.success() => setup.hooks_path_configured = true,
        Ok(output) => setup.warnings.push(format!(
            "Could not configure git hooks directory: {}",
            output.stderr.trim()
        )),
        Err(e) => setup
            .warnings
            .push(format!("Could not configure git hooks directory: {}", e)),
    }

    let hooks_dir = root.join(HOOKS_DIR);
    for hook in HOOKS {
        let path = hooks_dir.join(hook);
        if !path.exists() {
            fs::create_dir_all(&hooks_dir).map_err(|e| OpsError::io(&hooks_dir, e))?;
            fs::write(&path, DEFAULT_PRE_COMMIT).map_err(|e| OpsError::io(&path, e))?;
            setup.created.push(path.clone());
        }
        match make_executable(&path) {
            Ok(()) => setup.installed.push(path),
            Err(e) => setup
                .warnings
                .push(format!("Could not make {} executable: {}", hook, e)),
        }
    }

    tracing::debug!(?setup, "hook setup finished");
    Ok(setup)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
