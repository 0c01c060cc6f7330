//! Git-Cadence - automated daily activity for a git repository
//!
//! Each run picks a few tracked files, appends generated content to them,
//! commits the result with a generated message and pushes it.

#![allow(clippy::uninlined_format_args)] // Style preference
#![allow(clippy::format_push_string)] // Performance improvement but stylistic
#![allow(clippy::return_self_not_must_use)] // Builder pattern is clear enough

pub mod cli;
pub mod composer;
pub mod config;
pub mod content;
pub mod error;
pub mod git;
pub mod journal;
pub mod logger;
pub mod run;
pub mod selector;
pub mod ui;

// Re-export important structs and functions for easier testing
pub use composer::CommitComposer;
pub use config::{FileKind, FileSpec, RunConfig};
pub use error::RunError;
pub use git::{FakeGit, GitRunner, ProcessRunner, RepositoryDriver};
pub use journal::RunJournal;
pub use run::{RunOrchestrator, RunResult, RunStage};
