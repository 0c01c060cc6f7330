//! The top-level run: select, mutate, stage, commit, push, log.

use crate::composer::CommitComposer;
use crate::config::{FileSpec, RunConfig};
use crate::content::{self, GenerationContext};
use crate::error::{RunError, RunOutcome};
use crate::git::{GitRunner, RepositoryDriver};
use crate::journal::RunJournal;
use crate::selector;
use crate::{log_debug, log_error, log_info, log_warn, trace_debug};

use chrono::{DateTime, Local, NaiveDateTime};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Where a run currently is; `Done` and `Failed` are terminal
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Start,
    Selecting,
    Mutating,
    Staging,
    Committing,
    Pushing,
    Logging,
    Done,
    Failed,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Selecting => "selecting",
            Self::Mutating => "mutating",
            Self::Staging => "staging",
            Self::Committing => "committing",
            Self::Pushing => "pushing",
            Self::Logging => "logging",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Outcome of one run
#[derive(Serialize, Debug, Clone)]
pub struct RunResult {
    pub started_at: DateTime<Local>,
    /// Terminal stage: `Done` when a commit was made, `Failed` otherwise
    pub stage: RunStage,
    /// Stage that produced `failure_reason`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<RunStage>,
    pub selected_files: Vec<FileSpec>,
    pub commit_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_hash: Option<String>,
    pub committed: bool,
    pub pushed: bool,
    pub succeeded: bool,
    pub failure_reason: Option<String>,
}

impl RunResult {
    pub fn new(started_at: DateTime<Local>) -> Self {
        Self {
            started_at,
            stage: RunStage::Start,
            failed_stage: None,
            selected_files: Vec::new(),
            commit_message: String::new(),
            commit_hash: None,
            committed: false,
            pushed: false,
            succeeded: false,
            failure_reason: None,
        }
    }

    fn file_list(&self) -> String {
        self.selected_files
            .iter()
            .map(|f| f.path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Runs the daily update against one repository
pub struct RunOrchestrator<G: GitRunner, R: Rng> {
    config: RunConfig,
    driver: RepositoryDriver<G>,
    rng: R,
    journal: Option<RunJournal>,
    stage: RunStage,
}

impl<G: GitRunner, R: Rng> RunOrchestrator<G, R> {
    pub fn new(config: RunConfig, runner: G, rng: R) -> Self {
        let driver = RepositoryDriver::from_config(runner, &config);
        Self {
            config,
            driver,
            rng,
            journal: None,
            stage: RunStage::Start,
        }
    }

    /// Record each run in `journal` as well as the textual log
    pub fn with_journal(mut self, journal: RunJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn stage(&self) -> RunStage {
        self.stage
    }

    pub fn driver(&self) -> &RepositoryDriver<G> {
        &self.driver
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Execute one run using the local clock
    pub fn run(&mut self) -> RunResult {
        self.run_at(Local::now())
    }

    /// Execute one run as if it started at `now`
    pub fn run_at(&mut self, now: DateTime<Local>) -> RunResult {
        let span = tracing::info_span!("run", repo = %self.config.repo_path.display());
        let _enter = span.enter();

        log_info!("Starting daily commit run");
        self.stage = RunStage::Start;
        let mut result = RunResult::new(now);
        let naive = now.naive_local();

        self.advance(RunStage::Selecting);
        let selected = match self.select() {
            Ok(selected) => selected,
            Err(e) => return self.abort(result, &e),
        };
        result.selected_files.clone_from(&selected);
        log_info!("Selected files to update: {}", result.file_list());

        self.advance(RunStage::Mutating);
        if let Err(e) = self.mutate(&selected, naive) {
            return self.abort(result, &e);
        }

        self.advance(RunStage::Staging);
        match self.commit_and_push(&selected, naive, &mut result) {
            Ok(()) => result.succeeded = true,
            Err(e) => {
                log_error!("Run failed while {}: {}", self.stage, e);
                result.failed_stage = Some(self.stage);
                result.failure_reason = Some(e.to_string());
            }
        }

        self.advance(RunStage::Logging);
        self.log_outcome(&result);

        let terminal = if result.committed {
            RunStage::Done
        } else {
            RunStage::Failed
        };
        self.advance(terminal);
        result.stage = terminal;
        result
    }

    fn advance(&mut self, next: RunStage) {
        trace_debug!(target: "git_cadence::run", from = %self.stage, to = %next, "stage transition");
        self.stage = next;
    }

    fn select(&mut self) -> RunOutcome<Vec<FileSpec>> {
        self.config.validate()?;
        selector::select(
            &self.config.files,
            self.config.max_files_per_day,
            &mut self.rng,
        )
    }

    /// Rewrite every selected file with freshly generated content.
    ///
    /// Fails without writing anything when the working tree is missing. A
    /// failure part way through puts the files already written back.
    fn mutate(&mut self, selected: &[FileSpec], now: NaiveDateTime) -> RunOutcome<()> {
        self.driver.ensure_path()?;

        let mut originals = Vec::with_capacity(selected.len());
        for spec in selected {
            if let Err(e) = self.mutate_file(spec, now, &mut originals) {
                restore(&originals);
                return Err(e);
            }
        }
        Ok(())
    }

    fn mutate_file(
        &mut self,
        spec: &FileSpec,
        now: NaiveDateTime,
        originals: &mut Vec<(PathBuf, Option<String>)>,
    ) -> RunOutcome<()> {
        let path = self.config.resolve(spec);
        let file_error = |source| RunError::FileUpdate {
            path: spec.path.clone(),
            source,
        };

        let existing = match fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(file_error(e)),
        };

        let activity = self
            .config
            .activities
            .choose(&mut self.rng)
            .map_or("maintenance", String::as_str);
        let ctx = GenerationContext::new(now, activity, &self.config);
        let updated = content::generate(
            spec.kind,
            existing.as_deref().unwrap_or_default(),
            &ctx,
            &mut self.rng,
        );

        originals.push((path.clone(), existing));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(file_error)?;
        }
        fs::write(&path, updated).map_err(file_error)?;
        log_info!("Updated file: {} ({})", spec.path.display(), spec.kind);
        Ok(())
    }

    /// Staging through pushing. Only a push failure leaves `committed` set.
    fn commit_and_push(
        &mut self,
        selected: &[FileSpec],
        now: NaiveDateTime,
        result: &mut RunResult,
    ) -> RunOutcome<()> {
        self.driver.ensure_repo()?;
        self.driver.ensure_branch(&self.config.branch)?;

        let paths: Vec<PathBuf> = selected.iter().map(|f| f.path.clone()).collect();
        self.driver.stage(&paths)?;

        self.advance(RunStage::Committing);
        let message =
            CommitComposer::from_config(&self.config).compose(&now, selected, &mut self.rng);
        result.commit_message.clone_from(&message);
        result.commit_hash = self.driver.commit(&message)?;
        result.committed = true;
        log_info!(
            "Committed {}: {}",
            result.commit_hash.as_deref().unwrap_or("HEAD"),
            message
        );

        self.advance(RunStage::Pushing);
        self.driver.push(&self.config.branch)?;
        result.pushed = true;
        log_info!("Pushed to {}/{}", self.config.remote, self.config.branch);
        Ok(())
    }

    fn log_outcome(&self, result: &RunResult) {
        if result.succeeded {
            log_info!(
                "Run succeeded. Updated: {} | message: {}",
                result.file_list(),
                result.commit_message
            );
        } else {
            log_warn!(
                "Run did not succeed. Updated: {} | message: {} | committed: {} | reason: {}",
                result.file_list(),
                result.commit_message,
                result.committed,
                result.failure_reason.as_deref().unwrap_or_default()
            );
        }

        if let Some(journal) = &self.journal
            && let Err(e) = journal.record(result)
        {
            log_warn!("Failed to write run journal: {}", e);
        }
    }

    /// Stop before the repository is touched
    fn abort(&mut self, mut result: RunResult, error: &RunError) -> RunResult {
        log_error!("Run aborted while {}: {}", self.stage, error);
        result.failed_stage = Some(self.stage);
        result.failure_reason = Some(error.to_string());
        self.advance(RunStage::Failed);
        result.stage = RunStage::Failed;
        result
    }
}

/// Put back the content of files rewritten before a failed update
fn restore(originals: &[(PathBuf, Option<String>)]) {
    for (path, original) in originals.iter().rev() {
        let restored = match original {
            Some(content) => fs::write(path, content),
            None => fs::remove_file(path),
        };
        match restored {
            Ok(()) => log_debug!("Restored {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => log_warn!("Failed to restore {}: {}", path.display(), e),
        }
    }
}
