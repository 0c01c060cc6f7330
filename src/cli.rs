use crate::config::RunConfig;
use crate::git::{ProcessRunner, RepositoryDriver};
use crate::journal::RunJournal;
use crate::run::{RunOrchestrator, RunResult};
use crate::{log_debug, logger, ui};

use anyhow::{Context, Result, anyhow};
use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand, crate_version};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};

const LOG_FILE: &str = "git-cadence.log";

/// CLI structure defining the available commands and global arguments
#[derive(Parser)]
#[command(
    author,
    version = crate_version!(),
    about = "Git-Cadence: small, varied daily commits for a repository",
    long_about = "Git-Cadence updates a few tracked files with fresh content, commits them and pushes the result. Run it once per day from your scheduler of choice.",
    disable_version_flag = true,
    styles = get_styles(),
)]
pub struct Cli {
    /// Subcommands available for the CLI
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to a configuration file
    #[arg(
        short = 'c',
        long = "config",
        global = true,
        help = "Path to a configuration file"
    )]
    pub config: Option<PathBuf>,

    /// Log to a file
    #[arg(short = 'l', long = "log", global = true, help = "Log to a file")]
    pub log: bool,

    /// Specify a custom log file path
    #[arg(
        long = "log-file",
        global = true,
        help = "Specify a custom log file path"
    )]
    pub log_file: Option<PathBuf>,

    /// Suppress non-essential output
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress non-essential output"
    )]
    pub quiet: bool,

    /// Display the version
    #[arg(
        short = 'v',
        long = "version",
        global = true,
        help = "Display the version"
    )]
    pub version: bool,
}

/// Enumeration of available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Update files, commit and push once
    #[command(
        about = "Update files, commit and push once",
        long_about = "Select a few configured files, append generated content, commit with a generated message and push to the configured remote. This is the default command."
    )]
    Run {
        /// Seed for file selection and content generation
        #[arg(long, help = "Seed for reproducible file selection and content")]
        seed: Option<u64>,

        /// Override the configured repository path
        #[arg(long, help = "Override the configured repository path")]
        repo: Option<PathBuf>,
    },

    /// Write the default configuration file
    #[command(about = "Write the default configuration file")]
    Init {
        /// Overwrite an existing configuration file
        #[arg(long, help = "Overwrite an existing configuration file")]
        force: bool,
    },

    /// Print the effective configuration
    #[command(about = "Print the effective configuration as TOML")]
    Config,

    /// Check repository, remote and identity
    #[command(
        about = "Check that the repository is ready for unattended runs",
        long_about = "Verify that the repository exists, the configured branch is checked out, the remote is configured and git knows who you are."
    )]
    Doctor,
}

/// Define custom styles for Clap
fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Magenta.on_default().bold())
        .usage(AnsiColor::Cyan.on_default().bold())
        .literal(AnsiColor::Green.on_default().bold())
        .placeholder(AnsiColor::Yellow.on_default())
        .valid(AnsiColor::Blue.on_default().bold())
        .invalid(AnsiColor::Red.on_default().bold())
        .error(AnsiColor::Red.on_default().bold())
}

/// Parse the command-line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Main function to parse arguments and handle the command.
///
/// Returns whether the command succeeded; errors are reserved for problems
/// that stop the command from running at all.
pub fn main() -> Result<bool> {
    let cli = parse_args();

    if cli.version {
        ui::print_version(crate_version!());
        return Ok(true);
    }

    if cli.quiet {
        ui::set_quiet_mode(true);
    }

    logger::init().map_err(|e| anyhow!("{e}"))?;
    logger::set_log_to_stdout(!cli.quiet);

    let command = cli.command.unwrap_or(Commands::Run {
        seed: None,
        repo: None,
    });

    if let Commands::Init { force } = command {
        return handle_init(cli.config.as_deref(), force);
    }

    let config = RunConfig::load(cli.config.as_deref())?;

    let log_file = cli
        .log_file
        .clone()
        .or_else(|| config.logging.log_file.clone())
        .or_else(|| cli.log.then(|| PathBuf::from(LOG_FILE)));
    if let Some(path) = &log_file {
        logger::set_log_file(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
    }
    if config.logging.verbose {
        logger::set_verbose_logging(true);
    }

    handle_command(command, config)
}

/// Dispatch a parsed subcommand against a loaded configuration
pub fn handle_command(command: Commands, config: RunConfig) -> Result<bool> {
    match command {
        Commands::Run { seed, repo } => Ok(handle_run(config, seed, repo)),
        Commands::Config => {
            ui::print_bordered_content(config.to_toml()?.trim_end());
            Ok(true)
        }
        Commands::Doctor => Ok(handle_doctor(&config)),
        Commands::Init { .. } => Err(anyhow!("init is handled before configuration loads")),
    }
}

fn handle_run(mut config: RunConfig, seed: Option<u64>, repo: Option<PathBuf>) -> bool {
    if let Some(repo) = repo {
        config.repo_path = repo;
    }

    let rng = seed.map_or_else(StdRng::from_os_rng, |seed| {
        log_debug!("Using seed {}", seed);
        StdRng::seed_from_u64(seed)
    });

    let journal = config.logging.journal_file.clone().map(RunJournal::new);
    let mut orchestrator = RunOrchestrator::new(config, ProcessRunner, rng);
    if let Some(journal) = journal {
        orchestrator = orchestrator.with_journal(journal);
    }

    let result = orchestrator.run();
    report(&result);
    result.succeeded
}

fn report(result: &RunResult) {
    let reason = result.failure_reason.as_deref().unwrap_or_default();
    if result.succeeded {
        ui::print_success(&format!(
            "✅ Daily commit completed: {}",
            result.commit_message
        ));
    } else if result.committed {
        ui::print_warning(&format!(
            "⚠️ Committed locally but not pushed: {reason}"
        ));
    } else {
        ui::print_error(&format!("❌ Daily commit failed: {reason}"));
    }
}

fn handle_doctor(config: &RunConfig) -> bool {
    let driver = RepositoryDriver::from_config(ProcessRunner, config);

    let repo = driver.ensure_repo();
    ui::print_check(
        "repository",
        repo.is_ok(),
        &repo.as_ref().map_or_else(
            ToString::to_string,
            |_| driver.repo_path().display().to_string(),
        ),
    );
    if repo.is_err() {
        return false;
    }

    let remote = driver.remote_url();
    ui::print_check(
        "remote",
        remote.is_some(),
        remote
            .as_deref()
            .unwrap_or("not configured: git remote add <name> <url>"),
    );

    let branch = driver.ensure_branch(&config.branch);
    ui::print_check(
        "branch",
        branch.is_ok(),
        &branch
            .as_ref()
            .map_or_else(ToString::to_string, |_| config.branch.clone()),
    );

    let (name, email) = driver.identity();
    let identity_ok = name.is_some() && email.is_some();
    let identity = match (&name, &email) {
        (Some(name), Some(email)) => format!("{name} <{email}>"),
        _ => "set user.name and user.email with git config".to_string(),
    };
    ui::print_check("identity", identity_ok, &identity);

    let valid = config.validate();
    ui::print_check(
        "config",
        valid.is_ok(),
        &valid.as_ref().map_or_else(
            ToString::to_string,
            |_| format!("{} files tracked", config.files.len()),
        ),
    );

    remote.is_some() && branch.is_ok() && identity_ok && valid.is_ok()
}

fn handle_init(explicit: Option<&Path>, force: bool) -> Result<bool> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => RunConfig::get_config_path()?,
    };

    if path.exists() && !force {
        ui::print_error(&format!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        ));
        return Ok(false);
    }

    RunConfig::default().save_to(&path)?;
    ui::print_info(&format!("Wrote default configuration to {}", path.display()));
    Ok(true)
}
