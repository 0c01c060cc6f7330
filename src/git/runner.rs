use crate::log_debug;

use std::io;
use std::path::Path;
use std::process::Command;

/// Captured result of one git invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `-1` when the process was terminated by a signal
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Best human-readable explanation of a failure.
    ///
    /// Git writes some refusals (e.g. "nothing to commit") to stdout, so that
    /// is used when stderr is empty.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if stdout.is_empty() {
            format!("git exited with code {}", self.code)
        } else {
            stdout.to_string()
        }
    }
}

/// Executes git subcommands inside a working tree
pub trait GitRunner {
    fn run(&self, dir: &Path, args: &[&str]) -> io::Result<CommandOutput>;
}

impl<T: GitRunner + ?Sized> GitRunner for &T {
    fn run(&self, dir: &Path, args: &[&str]) -> io::Result<CommandOutput> {
        (**self).run(dir, args)
    }
}

/// Spawns the `git` executable
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner;

impl GitRunner for ProcessRunner {
    fn run(&self, dir: &Path, args: &[&str]) -> io::Result<CommandOutput> {
        log_debug!("Running git {} in {}", args.join(" "), dir.display());

        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            // Unattended runs must fail instead of waiting for credentials
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()?;

        Ok(CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
