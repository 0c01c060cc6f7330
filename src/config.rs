use crate::composer::unknown_placeholders;
use crate::error::RunError;
use crate::log_debug;

use anyhow::{Context, Result, anyhow};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Name of the personal configuration file under the user's config directory
pub const CONFIG_FILENAME: &str = "config.toml";

/// How synthetic content is generated for a tracked file
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Markdown,
    Json,
    Text,
    Generic,
}

impl FileKind {
    /// Infer the kind from a file extension, falling back to `Generic`
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("md" | "markdown") => Self::Markdown,
            Some("json") => Self::Json,
            Some("txt") => Self::Text,
            _ => Self::Generic,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
            Self::Text => write!(f, "text"),
            Self::Generic => write!(f, "generic"),
        }
    }
}

/// A tracked file, relative to the repository root
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(from = "FileSpecToml")]
pub struct FileSpec {
    pub path: PathBuf,
    pub kind: FileKind,
}

// `kind` may be left out in TOML; it is then inferred from the extension.
#[derive(Deserialize)]
struct FileSpecToml {
    path: PathBuf,
    kind: Option<FileKind>,
}

impl From<FileSpecToml> for FileSpec {
    fn from(raw: FileSpecToml) -> Self {
        let kind = raw.kind.unwrap_or_else(|| FileKind::from_path(&raw.path));
        Self {
            path: raw.path,
            kind,
        }
    }
}

impl FileSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let kind = FileKind::from_path(&path);
        Self { path, kind }
    }

    pub fn with_kind(path: impl Into<PathBuf>, kind: FileKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Where the textual log and the run journal are written
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append-only textual log
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
    /// JSON Lines file receiving one record per run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal_file: Option<PathBuf>,
    /// Include debug output from dependencies
    pub verbose: bool,
}

/// Configuration for a run, loaded once and read-only afterwards
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct RunConfig {
    /// Path to the local git working tree
    pub repo_path: PathBuf,
    /// Branch the commits are pushed to
    pub branch: String,
    /// Remote the commits are pushed to
    pub remote: String,
    /// Upper bound on files touched by a single run
    pub max_files_per_day: usize,
    /// Activity vocabulary used in content and commit messages
    pub activities: Vec<String>,
    /// Short phrases such as "Quick update"
    pub notes: Vec<String>,
    pub emojis: Vec<String>,
    /// Commit message templates with `{placeholder}` tokens
    pub message_templates: Vec<String>,
    /// Files eligible for updates, in configuration order
    pub files: Vec<FileSpec>,
    pub logging: LoggingConfig,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            repo_path: PathBuf::from("."),
            branch: "main".to_string(),
            remote: "origin".to_string(),
            max_files_per_day: 3,
            files: vec![
                FileSpec::new("daily_log.md"),
                FileSpec::new("README.md"),
                FileSpec::new("progress.json"),
                FileSpec::new("notes.txt"),
                FileSpec::new("activities.md"),
            ],
            activities: strings(&[
                "code review",
                "bug fixes",
                "feature development",
                "documentation",
                "testing",
                "refactoring",
                "optimization",
                "research",
                "planning",
                "debugging",
                "cleanup",
                "maintenance",
                "learning",
                "experimentation",
            ]),
            notes: strings(&[
                "Quick update",
                "Minor changes",
                "Small improvement",
                "Tiny fix",
                "Quick note",
                "Brief update",
                "Small addition",
                "Minor tweak",
                "Quick edit",
                "Small change",
                "Brief note",
                "Minor update",
            ]),
            emojis: strings(&[
                "🚀", "✨", "📝", "🔧", "💡", "🎯", "⚡", "🔥", "💪", "🎉", "📚", "🛠️",
            ]),
            message_templates: strings(&[
                "Daily update: {date}",
                "Progress log for {date}",
                "Update: {activity} - {date}",
                "Daily commit: {random_emoji} {date}",
                "Log entry: {timestamp}",
                "Daily sync: {file_updated}",
                "Update {file_updated}: {random_text}",
                "Daily progress: {activity}",
                "Commit: {random_emoji} {activity}",
                "Update: {random_text} - {date}",
            ]),
            logging: LoggingConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load the configuration.
    ///
    /// An explicit path must exist. Without one, the personal config file is
    /// used when present and the built-in defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = if let Some(path) = explicit {
            Self::load_from(path)?
        } else {
            let path = Self::get_config_path()?;
            if path.exists() {
                Self::load_from(&path)?
            } else {
                log_debug!("No config at {}, using defaults", path.display());
                Self::default()
            }
        };

        log_debug!("Configuration loaded: {:?}", config);
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content).map_err(|e| {
            anyhow!(
                "Invalid configuration file format in {}: {}",
                path.display(),
                e
            )
        })
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save the configuration, creating parent directories as needed
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        log_debug!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Get the path to the personal configuration file
    pub fn get_config_path() -> Result<PathBuf> {
        let mut path =
            config_dir().ok_or_else(|| anyhow!("Unable to determine config directory"))?;
        path.push("git-cadence");
        path.push(CONFIG_FILENAME);
        Ok(path)
    }

    /// Check every constraint a run depends on, reporting all problems at once
    pub fn validate(&self) -> Result<(), RunError> {
        let mut problems = Vec::new();

        if self.files.is_empty() {
            problems.push("no files configured".to_string());
        }
        for spec in &self.files {
            if !stays_inside_repository(&spec.path) {
                problems.push(format!(
                    "file {} must be a relative path inside the repository",
                    spec.path.display()
                ));
            }
        }
        if self.max_files_per_day < 1 {
            problems.push("max_files_per_day must be at least 1".to_string());
        }
        if self.activities.is_empty() {
            problems.push("no activities configured".to_string());
        }
        if self.message_templates.is_empty() {
            problems.push("no message templates configured".to_string());
        }
        for template in &self.message_templates {
            let unknown = unknown_placeholders(template);
            if !unknown.is_empty() {
                problems.push(format!(
                    "template {template:?} uses unknown placeholders: {}",
                    unknown.join(", ")
                ));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(RunError::Configuration(problems.join("; ")))
        }
    }

    /// Absolute location of a tracked file inside the working tree
    pub fn resolve(&self, spec: &FileSpec) -> PathBuf {
        self.repo_path.join(&spec.path)
    }
}

fn stays_inside_repository(path: &Path) -> bool {
    !path.as_os_str().is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}
