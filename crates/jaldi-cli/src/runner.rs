//! External command execution.
//!
//! The audit scanner and hook installer shell out to `npm` and `git`.
//! Going through [`CommandRunner`] lets tests substitute canned output.

use std::io;
use std::path::Path;
use std::process::Command;

/// The output of a finished command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// The exit code of the process, `-1` if it was killed by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs external programs.
pub trait CommandRunner {
    /// Runs `program` with `args` in `cwd` and waits for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be spawned.
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> io::Result<CommandOutput>;
}

/// Runs commands as real child processes.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str], cwd: &Path) -> io::Result<CommandOutput> {
        tracing::debug!(program, ?args, cwd = %cwd.display(), "running command");
        let output = Command::new(program).args(args).current_dir(cwd).output()?;
        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
