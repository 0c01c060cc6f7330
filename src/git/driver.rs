use super::runner::{CommandOutput, GitRunner};
use crate::config::RunConfig;
use crate::error::{RunError, RunOutcome};
use crate::{log_debug, log_warn};

use std::fs;
use std::path::{Path, PathBuf};

/// Drives the git operations of a run against one working tree.
///
/// Every operation maps a non-zero exit status to the matching `RunError`
/// carrying git's own diagnostic.
#[derive(Debug)]
pub struct RepositoryDriver<G: GitRunner> {
    runner: G,
    repo_path: PathBuf,
    remote: String,
}

impl<G: GitRunner> RepositoryDriver<G> {
    pub fn new(runner: G, repo_path: impl Into<PathBuf>, remote: impl Into<String>) -> Self {
        Self {
            runner,
            repo_path: repo_path.into(),
            remote: remote.into(),
        }
    }

    pub fn from_config(runner: G, config: &RunConfig) -> Self {
        Self::new(runner, &config.repo_path, &config.remote)
    }

    pub fn runner(&self) -> &G {
        &self.runner
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    fn git(&self, args: &[&str]) -> std::io::Result<CommandOutput> {
        let output = self.runner.run(&self.repo_path, args)?;
        log_debug!("git {} exited with {}", args.join(" "), output.code);
        Ok(output)
    }

    /// Verify that the working tree directory exists, without calling git
    pub fn ensure_path(&self) -> RunOutcome<()> {
        if self.repo_path.is_dir() {
            Ok(())
        } else {
            Err(RunError::RepositoryMissing(format!(
                "{} does not exist",
                self.repo_path.display()
            )))
        }
    }

    /// Verify that the configured path is the root of a git working tree
    pub fn ensure_repo(&self) -> RunOutcome<()> {
        self.ensure_path()?;

        let missing = |detail: String| {
            RunError::RepositoryMissing(format!("{} {detail}", self.repo_path.display()))
        };

        let output = self
            .git(&["rev-parse", "--is-inside-work-tree"])
            .map_err(|e| RunError::RepositoryMissing(format!("failed to execute git: {e}")))?;
        if !output.success() {
            return Err(missing(format!(
                "is not a git repository: {}",
                output.diagnostic()
            )));
        }
        // Prints `false` inside a `.git` directory or a bare repository
        if output.stdout.trim() != "true" {
            return Err(missing("is not a git working tree".to_string()));
        }

        let toplevel = self
            .git(&["rev-parse", "--show-toplevel"])
            .map_err(|e| RunError::RepositoryMissing(format!("failed to execute git: {e}")))?;
        if !toplevel.success() {
            return Err(missing(format!(
                "has no working tree root: {}",
                toplevel.diagnostic()
            )));
        }
        let root = PathBuf::from(toplevel.stdout.trim());
        if !same_location(&root, &self.repo_path) {
            return Err(missing(format!(
                "is inside the repository at {}, not at its root",
                root.display()
            )));
        }

        if self.remote_url().is_none() {
            log_warn!(
                "Remote '{}' is not configured; pushing will fail",
                self.remote
            );
        }
        Ok(())
    }

    /// Verify that HEAD is on `branch`, the branch `push` publishes
    pub fn ensure_branch(&self, branch: &str) -> RunOutcome<()> {
        let output = self
            .git(&["symbolic-ref", "--quiet", "--short", "HEAD"])
            .map_err(|e| RunError::Staging(format!("failed to execute git: {e}")))?;

        let actual = match output.code {
            0 => output.stdout.trim().to_string(),
            1 => "(detached HEAD)".to_string(),
            _ => return Err(RunError::Staging(output.diagnostic())),
        };
        if actual == branch {
            Ok(())
        } else {
            Err(RunError::WrongBranch {
                expected: branch.to_string(),
                actual,
            })
        }
    }

    /// Add `paths` (relative to the working tree) to the index
    pub fn stage(&self, paths: &[PathBuf]) -> RunOutcome<()> {
        if paths.is_empty() {
            return Err(RunError::Staging("no paths to stage".to_string()));
        }

        let paths: Vec<String> = paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        let mut args = vec!["add", "--"];
        args.extend(paths.iter().map(String::as_str));

        let output = self
            .git(&args)
            .map_err(|e| RunError::Staging(format!("failed to execute git: {e}")))?;
        if output.success() {
            Ok(())
        } else {
            Err(RunError::Staging(output.diagnostic()))
        }
    }

    /// Commit the index, returning the short hash of the new commit when git reports it
    pub fn commit(&self, message: &str) -> RunOutcome<Option<String>> {
        let staged = self
            .git(&["diff", "--cached", "--quiet"])
            .map_err(|e| RunError::Commit(format!("failed to execute git: {e}")))?;
        match staged.code {
            0 => return Err(RunError::Commit("nothing to commit".to_string())),
            1 => {}
            _ => return Err(RunError::Commit(staged.diagnostic())),
        }

        let output = self
            .git(&["commit", "-m", message])
            .map_err(|e| RunError::Commit(format!("failed to execute git: {e}")))?;
        if !output.success() {
            return Err(RunError::Commit(output.diagnostic()));
        }

        // The commit exists at this point; a missing hash only loses detail
        match self.git(&["rev-parse", "--short", "HEAD"]) {
            Ok(head) if head.success() => Ok(Some(head.stdout.trim().to_string())),
            Ok(head) => {
                log_warn!("Could not read new commit hash: {}", head.diagnostic());
                Ok(None)
            }
            Err(e) => {
                log_warn!("Could not read new commit hash: {}", e);
                Ok(None)
            }
        }
    }

    /// Push `branch` to the configured remote
    pub fn push(&self, branch: &str) -> RunOutcome<()> {
        let output = self
            .git(&["push", self.remote.as_str(), branch])
            .map_err(|e| RunError::Push(format!("failed to execute git: {e}")))?;
        if output.success() {
            Ok(())
        } else {
            Err(RunError::Push(output.diagnostic()))
        }
    }

    /// URL of the configured remote, if any
    pub fn remote_url(&self) -> Option<String> {
        self.query(&["remote", "get-url", self.remote.as_str()])
    }

    /// `user.name` and `user.email` as git resolves them
    pub fn identity(&self) -> (Option<String>, Option<String>) {
        (
            self.query(&["config", "user.name"]),
            self.query(&["config", "user.email"]),
        )
    }

    fn query(&self, args: &[&str]) -> Option<String> {
        self.git(args)
            .ok()
            .filter(CommandOutput::success)
            .map(|out| out.stdout.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

fn same_location(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
