use chrono::{DateTime, Local, TimeZone};
use git_cadence::git::CommandOutput;
use git_cadence::{
    FakeGit, FileKind, FileSpec, GitRunner, ProcessRunner, RepositoryDriver, RunConfig,
    RunError, RunOrchestrator, RunStage,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use test_utils::{commit_paths, history, setup_git_repo, setup_git_repo_with_remote};

fn tracked_files() -> Vec<FileSpec> {
    vec![
        FileSpec::new("daily_log.md"),
        FileSpec::new("progress.json"),
        FileSpec::new("notes.txt"),
    ]
}

fn config_for(path: &Path) -> RunConfig {
    RunConfig {
        repo_path: path.to_path_buf(),
        files: tracked_files(),
        max_files_per_day: 3,
        ..RunConfig::default()
    }
}

fn fixed_time() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2025, 3, 5, 14, 30, 0)
        .single()
        .expect("unambiguous local time")
}

#[test]
fn test_run_commits_and_pushes_to_bare_remote() {
    let (temp_dir, repo, remote_dir) = setup_git_repo_with_remote();
    let mut orchestrator = RunOrchestrator::new(
        config_for(temp_dir.path()),
        ProcessRunner,
        StdRng::seed_from_u64(7),
    );

    let result = orchestrator.run_at(fixed_time());

    assert!(result.succeeded, "run failed: {:?}", result.failure_reason);
    assert!(result.failure_reason.is_none());
    assert_eq!(result.stage, RunStage::Done);
    assert!(result.committed && result.pushed);
    assert!(!result.selected_files.is_empty() && result.selected_files.len() <= 3);
    assert!(result.commit_hash.is_some());

    let messages = history(&repo);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0], result.commit_message);

    let remote = git2::Repository::open_bare(remote_dir.path()).expect("open remote");
    let pushed = remote
        .find_reference("refs/heads/main")
        .expect("main was pushed")
        .peel_to_commit()
        .expect("remote main is a commit");
    assert_eq!(pushed.message().map(str::trim_end), Some(result.commit_message.as_str()));
}

#[test]
fn test_push_failure_keeps_local_commit() {
    let (temp_dir, repo) = setup_git_repo();
    let missing = temp_dir.path().join("no-such-remote.git");
    repo.remote("origin", missing.to_str().expect("utf-8 path"))
        .expect("Failed to add origin");

    let mut orchestrator = RunOrchestrator::new(
        config_for(temp_dir.path()),
        ProcessRunner,
        StdRng::seed_from_u64(11),
    );
    let result = orchestrator.run_at(fixed_time());

    assert!(!result.succeeded);
    assert!(result.committed);
    assert!(!result.pushed);
    assert_eq!(result.failed_stage, Some(RunStage::Pushing));
    assert!(
        result
            .failure_reason
            .as_deref()
            .is_some_and(|r| r.starts_with("push failed:")),
        "unexpected reason: {:?}",
        result.failure_reason
    );

    let messages = history(&repo);
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0], result.commit_message);
}

#[test]
fn test_feature_branch_checkout_is_refused() {
    let (temp_dir, repo, remote_dir) = setup_git_repo_with_remote();
    let head_commit = repo
        .head()
        .expect("Failed to get HEAD")
        .peel_to_commit()
        .expect("Failed to peel HEAD to commit");
    repo.branch("feature", &head_commit, false)
        .expect("Failed to create 'feature' branch");
    repo.set_head("refs/heads/feature")
        .expect("Failed to check out 'feature'");

    let mut orchestrator = RunOrchestrator::new(
        config_for(temp_dir.path()),
        ProcessRunner,
        StdRng::seed_from_u64(7),
    );
    let result = orchestrator.run_at(fixed_time());

    assert!(!result.succeeded);
    assert!(!result.committed && !result.pushed);
    assert_eq!(result.failed_stage, Some(RunStage::Staging));
    assert_eq!(
        result.failure_reason.as_deref(),
        Some("wrong branch: HEAD is on 'feature', configured branch is 'main'")
    );
    assert_eq!(history(&repo).len(), 1);

    let remote = git2::Repository::open_bare(remote_dir.path()).expect("open remote");
    assert!(remote.find_reference("refs/heads/main").is_err());
}

#[test]
fn test_directory_nested_in_repository_is_rejected() {
    let (temp_dir, _repo) = setup_git_repo();
    let nested = temp_dir.path().join("activity");
    fs::create_dir(&nested).expect("Failed to create nested directory");

    let driver = RepositoryDriver::new(ProcessRunner, &nested, "origin");
    let err = driver.ensure_repo().expect_err("not a repository root");
    assert!(matches!(err, RunError::RepositoryMissing(_)));
    assert!(err.to_string().contains("not at its root"));

    let git_dir = RepositoryDriver::new(ProcessRunner, temp_dir.path().join(".git"), "origin");
    let err = git_dir.ensure_repo().expect_err("inside .git");
    assert!(err.to_string().ends_with("is not a git working tree"));
}

#[test]
fn test_empty_file_list_never_reaches_git() {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let git = FakeGit::new();
    let config = RunConfig {
        files: Vec::new(),
        ..config_for(temp_dir.path())
    };

    let mut orchestrator = RunOrchestrator::new(config, git.clone(), StdRng::seed_from_u64(0));
    let result = orchestrator.run_at(fixed_time());

    assert!(!result.succeeded);
    assert_eq!(result.stage, RunStage::Failed);
    assert_eq!(result.failure_reason.as_deref(), Some("no files configured"));
    assert!(git.invocations().is_empty());
}

#[test]
fn test_unchanged_file_reports_nothing_to_commit() {
    let (temp_dir, repo) = setup_git_repo();
    fs::write(temp_dir.path().join("notes.txt"), "steady\n").expect("write notes");
    commit_paths(&repo, &["notes.txt"], "Add notes");

    let driver = RepositoryDriver::new(ProcessRunner, temp_dir.path(), "origin");
    driver.ensure_repo().expect("repository is valid");
    driver
        .stage(&[PathBuf::from("notes.txt")])
        .expect("staging an unchanged file succeeds");

    let err = driver.commit("Daily update").expect_err("nothing changed");
    assert!(matches!(err, RunError::Commit(_)));
    assert_eq!(err.to_string(), "commit failed: nothing to commit");
    assert_eq!(history(&repo).len(), 2);
}

/// Real git, except that `add` silently stages nothing
struct IgnoreAdd;

impl GitRunner for IgnoreAdd {
    fn run(&self, dir: &Path, args: &[&str]) -> io::Result<CommandOutput> {
        if args.first() == Some(&"add") {
            return Ok(CommandOutput::ok(""));
        }
        ProcessRunner.run(dir, args)
    }
}

#[test]
fn test_run_with_nothing_staged_fails_at_commit() {
    let (temp_dir, repo, _remote) = setup_git_repo_with_remote();
    let mut orchestrator = RunOrchestrator::new(
        config_for(temp_dir.path()),
        IgnoreAdd,
        StdRng::seed_from_u64(5),
    );

    let result = orchestrator.run_at(fixed_time());

    assert!(!result.succeeded);
    assert!(!result.committed);
    assert_eq!(result.stage, RunStage::Failed);
    assert_eq!(result.failed_stage, Some(RunStage::Committing));
    assert_eq!(
        result.failure_reason.as_deref(),
        Some("commit failed: nothing to commit")
    );
    assert_eq!(history(&repo).len(), 1);
}

#[test]
fn test_missing_repository_path_is_reported() {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let driver = RepositoryDriver::new(ProcessRunner, temp_dir.path().join("gone"), "origin");

    let err = driver.ensure_repo().expect_err("path does not exist");
    assert!(matches!(err, RunError::RepositoryMissing(_)));
}

#[test]
fn test_same_seed_produces_same_run() {
    let first = TempDir::new().expect("Failed to create temporary directory");
    let second = TempDir::new().expect("Failed to create temporary directory");

    let run = |dir: &TempDir| {
        let mut orchestrator = RunOrchestrator::new(
            config_for(dir.path()),
            FakeGit::new(),
            StdRng::seed_from_u64(2024),
        );
        orchestrator.run_at(fixed_time())
    };
    let a = run(&first);
    let b = run(&second);

    assert_eq!(a.selected_files, b.selected_files);
    assert_eq!(a.commit_message, b.commit_message);
    for spec in &a.selected_files {
        let left = fs::read_to_string(first.path().join(&spec.path)).expect("read first");
        let right = fs::read_to_string(second.path().join(&spec.path)).expect("read second");
        assert_eq!(left, right, "{} differs", spec.path.display());
    }
}

#[test]
fn test_json_file_accumulates_entries_across_days() {
    let (temp_dir, _repo, _remote) = setup_git_repo_with_remote();
    let config = RunConfig {
        files: vec![FileSpec::with_kind("data/progress.json", FileKind::Json)],
        max_files_per_day: 1,
        ..config_for(temp_dir.path())
    };

    let mut orchestrator = RunOrchestrator::new(config, ProcessRunner, StdRng::seed_from_u64(3));
    let day_one = orchestrator.run_at(fixed_time());
    let day_two = orchestrator.run_at(fixed_time() + chrono::Duration::days(1));
    assert!(day_one.succeeded, "{:?}", day_one.failure_reason);
    assert!(day_two.succeeded, "{:?}", day_two.failure_reason);

    let content =
        fs::read_to_string(temp_dir.path().join("data/progress.json")).expect("read json");
    let value: serde_json::Value = serde_json::from_str(&content).expect("valid json");
    assert_eq!(value["total_entries"], 2);
    assert!(value["daily_updates"]["2025-03-05"].is_object());
    assert!(value["daily_updates"]["2025-03-06"].is_object());
}
