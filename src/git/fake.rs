//! In-memory stand-in for the git executable.
//!
//! `FakeGit` models just enough of a repository to exercise the driver and
//! the orchestrator: a committed snapshot, an index, a commit log, the
//! checked-out branch, one remote and a user identity. File contents are read
//! from the real working directory when paths are staged, so unchanged files
//! stage nothing.

use super::runner::{CommandOutput, GitRunner};

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A commit recorded by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeCommit {
    pub hash: String,
    pub message: String,
    pub files: Vec<String>,
}

#[derive(Debug)]
struct FakeState {
    is_repo: bool,
    work_tree: bool,
    toplevel: Option<PathBuf>,
    /// Checked-out branch; `None` is a detached HEAD
    branch: Option<String>,
    remote: Option<(String, String)>,
    identity: Option<(String, String)>,
    head: BTreeMap<String, String>,
    index: BTreeMap<String, String>,
    commits: Vec<FakeCommit>,
    pushed: usize,
    failures: HashMap<String, String>,
    invocations: Vec<Vec<String>>,
}

/// Cloneable handle; clones share the same simulated repository
#[derive(Debug, Clone)]
pub struct FakeGit {
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeGit {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeGit {
    /// A repository with an `origin` remote and a configured identity
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                is_repo: true,
                work_tree: true,
                toplevel: None,
                branch: Some("main".to_string()),
                remote: Some((
                    "origin".to_string(),
                    "git@example.com:me/activity.git".to_string(),
                )),
                identity: Some(("Test User".to_string(), "test@example.com".to_string())),
                head: BTreeMap::new(),
                index: BTreeMap::new(),
                commits: Vec::new(),
                pushed: 0,
                failures: HashMap::new(),
                invocations: Vec::new(),
            })),
        }
    }

    pub fn without_repository(self) -> Self {
        self.state.lock().is_repo = false;
        self
    }

    /// Behave as if run inside a `.git` directory or a bare repository
    pub fn outside_work_tree(self) -> Self {
        self.state.lock().work_tree = false;
        self
    }

    /// Report `root` as the working tree root instead of the queried directory
    pub fn with_toplevel(self, root: &Path) -> Self {
        self.state.lock().toplevel = Some(root.to_path_buf());
        self
    }

    pub fn on_branch(self, branch: &str) -> Self {
        self.state.lock().branch = Some(branch.to_string());
        self
    }

    pub fn detached(self) -> Self {
        self.state.lock().branch = None;
        self
    }

    pub fn without_remote(self) -> Self {
        self.state.lock().remote = None;
        self
    }

    pub fn without_identity(self) -> Self {
        self.state.lock().identity = None;
        self
    }

    /// Make every invocation of `subcommand` exit 128 with `stderr`
    pub fn fail_on(self, subcommand: &str, stderr: &str) -> Self {
        self.state
            .lock()
            .failures
            .insert(subcommand.to_string(), stderr.to_string());
        self
    }

    /// Pretend `path` is already committed with `content`
    pub fn with_committed(self, path: &str, content: &str) -> Self {
        self.state
            .lock()
            .head
            .insert(path.to_string(), content.to_string());
        self
    }

    pub fn commits(&self) -> Vec<FakeCommit> {
        self.state.lock().commits.clone()
    }

    /// Number of commits the remote has received
    pub fn pushed_commits(&self) -> usize {
        self.state.lock().pushed
    }

    pub fn staged(&self) -> Vec<String> {
        self.state.lock().index.keys().cloned().collect()
    }

    /// Every invocation, each as its argument list
    pub fn invocations(&self) -> Vec<Vec<String>> {
        self.state.lock().invocations.clone()
    }

    /// Subcommands invoked, in order
    pub fn subcommands(&self) -> Vec<String> {
        self.state
            .lock()
            .invocations
            .iter()
            .filter_map(|args| args.first().cloned())
            .collect()
    }
}

impl GitRunner for FakeGit {
    fn run(&self, dir: &Path, args: &[&str]) -> io::Result<CommandOutput> {
        let mut state = self.state.lock();
        state
            .invocations
            .push(args.iter().map(|a| (*a).to_string()).collect());

        let Some((&subcommand, rest)) = args.split_first() else {
            return Ok(CommandOutput::failed(1, "usage: git <command>"));
        };

        if let Some(stderr) = state.failures.get(subcommand) {
            return Ok(CommandOutput::failed(128, stderr.clone()));
        }
        if !state.is_repo {
            return Ok(CommandOutput::failed(
                128,
                "fatal: not a git repository (or any of the parent directories): .git",
            ));
        }

        Ok(match (subcommand, rest) {
            ("rev-parse", ["--is-inside-work-tree"]) => {
                CommandOutput::ok(format!("{}\n", state.work_tree))
            }
            ("rev-parse", ["--show-toplevel"]) => {
                let root = state.toplevel.as_deref().unwrap_or(dir);
                CommandOutput::ok(format!("{}\n", root.display()))
            }
            ("symbolic-ref", ["--quiet", "--short", "HEAD"]) => match &state.branch {
                Some(branch) => CommandOutput::ok(format!("{branch}\n")),
                None => CommandOutput::failed(1, ""),
            },
            ("rev-parse", ["--short", "HEAD"]) => match state.commits.last() {
                Some(commit) => CommandOutput::ok(format!("{}\n", commit.hash)),
                None => CommandOutput::failed(128, "fatal: ambiguous argument 'HEAD'"),
            },
            ("add", paths) => state.add(dir, paths),
            ("diff", ["--cached", "--quiet"]) => CommandOutput {
                code: i32::from(!state.index.is_empty()),
                stdout: String::new(),
                stderr: String::new(),
            },
            ("commit", ["-m", message]) => state.commit(message),
            ("push", [remote, _branch]) => state.push(remote),
            ("remote", ["get-url", name]) => match &state.remote {
                Some((remote, url)) if remote == name => CommandOutput::ok(format!("{url}\n")),
                _ => CommandOutput::failed(2, format!("error: No such remote '{name}'")),
            },
            ("config", ["user.name"]) => match &state.identity {
                Some((name, _)) => CommandOutput::ok(format!("{name}\n")),
                None => CommandOutput::failed(1, ""),
            },
            ("config", ["user.email"]) => match &state.identity {
                Some((_, email)) => CommandOutput::ok(format!("{email}\n")),
                None => CommandOutput::failed(1, ""),
            },
            _ => CommandOutput::failed(1, format!("fake git: unsupported: {}", args.join(" "))),
        })
    }
}

impl FakeState {
    fn add(&mut self, dir: &Path, paths: &[&str]) -> CommandOutput {
        for path in paths.iter().filter(|p| **p != "--") {
            let Ok(content) = fs::read_to_string(dir.join(path)) else {
                return CommandOutput::failed(
                    128,
                    format!("fatal: pathspec '{path}' did not match any files"),
                );
            };
            if self.head.get(*path) == Some(&content) {
                self.index.remove(*path);
            } else {
                self.index.insert((*path).to_string(), content);
            }
        }
        CommandOutput::ok("")
    }

    fn commit(&mut self, message: &str) -> CommandOutput {
        if self.identity.is_none() {
            return CommandOutput::failed(
                128,
                "Author identity unknown\n\n*** Please tell me who you are.",
            );
        }
        if self.index.is_empty() {
            return CommandOutput {
                code: 1,
                stdout: "nothing to commit, working tree clean\n".to_string(),
                stderr: String::new(),
            };
        }

        let staged = std::mem::take(&mut self.index);
        let files = staged.keys().cloned().collect();
        self.head.extend(staged);
        let hash = format!("{:07x}", 0x00a1_b2c3 + self.commits.len());
        self.commits.push(FakeCommit {
            hash,
            message: message.to_string(),
            files,
        });
        CommandOutput::ok("")
    }

    fn push(&mut self, remote: &str) -> CommandOutput {
        match &self.remote {
            Some((name, _)) if name == remote => {
                self.pushed = self.commits.len();
                CommandOutput::ok("")
            }
            _ => CommandOutput::failed(
                128,
                format!("fatal: '{remote}' does not appear to be a git repository"),
            ),
        }
    }
}
