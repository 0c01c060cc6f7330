use crate::log_debug;
use crate::run::RunResult;

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only JSON Lines record of finished runs
#[derive(Debug, Clone)]
pub struct RunJournal {
    path: PathBuf,
}

impl RunJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record for `result`
    pub fn record(&self, result: &RunResult) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut line = serde_json::to_string(result)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open journal {}", self.path.display()))?;
        file.write_all(line.as_bytes())?;

        log_debug!("Recorded run in {}", self.path.display());
        Ok(())
    }

    /// Read every record back, skipping lines that do not parse
    pub fn entries(&self) -> Result<Vec<serde_json::Value>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileSpec;
    use crate::run::{RunResult, RunStage};
    use chrono::Local;
    use tempfile::TempDir;

    #[test]
    fn appends_one_line_per_run() {
        let dir = TempDir::new().expect("temp dir");
        let journal = RunJournal::new(dir.path().join("logs").join("runs.jsonl"));

        let mut result = RunResult::new(Local::now());
        result.stage = RunStage::Done;
        result.selected_files = vec![FileSpec::new("daily_log.md")];
        result.commit_message = "Daily update: 2025-03-05".to_string();
        result.succeeded = true;
        journal.record(&result).expect("first record");

        result.succeeded = false;
        result.failure_reason = Some("push failed: denied".to_string());
        journal.record(&result).expect("second record");

        let entries = journal.entries().expect("read back");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["succeeded"], true);
        assert_eq!(entries[0]["selected_files"][0]["kind"], "markdown");
        assert_eq!(entries[1]["failure_reason"], "push failed: denied");
    }
}
