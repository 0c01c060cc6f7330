//! Commit message composition from templates and the activity vocabulary.

use crate::config::{FileSpec, RunConfig};

use chrono::NaiveDateTime;
use rand::Rng;
use rand::seq::IndexedRandom;
use regex::Regex;
use std::sync::LazyLock;

/// Placeholders a message template may use
pub const KNOWN_PLACEHOLDERS: &[&str] = &[
    "date",
    "timestamp",
    "activity",
    "random_emoji",
    "emoji",
    "random_text",
    "file_updated",
];

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

static SPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("space pattern is valid"));

/// Placeholder names in `template` that the composer cannot resolve
pub fn unknown_placeholders(template: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| !KNOWN_PLACEHOLDERS.contains(name))
        .map(|name| format!("{{{name}}}"))
        .collect()
}

/// Whether `message` still carries a `{placeholder}` token
pub fn has_unresolved_placeholder(message: &str) -> bool {
    PLACEHOLDER.is_match(message)
}

/// Builds commit messages for a run
pub struct CommitComposer<'a> {
    templates: &'a [String],
    activities: &'a [String],
    notes: &'a [String],
    emojis: &'a [String],
}

impl<'a> CommitComposer<'a> {
    pub fn new(templates: &'a [String], activities: &'a [String]) -> Self {
        Self {
            templates,
            activities,
            notes: &[],
            emojis: &[],
        }
    }

    pub fn from_config(config: &'a RunConfig) -> Self {
        Self {
            templates: &config.message_templates,
            activities: &config.activities,
            notes: &config.notes,
            emojis: &config.emojis,
        }
    }

    /// Pick a template and an activity and fill in every placeholder.
    ///
    /// `updated` feeds `{file_updated}`; the first file wins.
    pub fn compose<R: Rng + ?Sized>(
        &self,
        now: &NaiveDateTime,
        updated: &[FileSpec],
        rng: &mut R,
    ) -> String {
        let date = now.format("%Y-%m-%d").to_string();
        let template = self
            .templates
            .choose(rng)
            .map_or("Daily update: {date}", String::as_str);
        let activity = pick(self.activities, rng, "daily work");
        let emoji = pick(self.emojis, rng, "📝");
        let note = pick(self.notes, rng, "Quick update");
        let file_updated = updated
            .first()
            .map_or_else(|| "files".to_string(), |f| f.path.display().to_string());

        let message = PLACEHOLDER.replace_all(template, |caps: &regex::Captures<'_>| {
            match caps.get(1).map(|m| m.as_str()) {
                Some("date") => date.clone(),
                Some("timestamp") => now.format("%Y-%m-%d %H:%M:%S").to_string(),
                Some("activity") => activity.to_string(),
                Some("random_emoji" | "emoji") => emoji.to_string(),
                Some("random_text") => note.to_string(),
                Some("file_updated") => file_updated.clone(),
                _ => String::new(),
            }
        });

        // Dropped tokens can leave doubled spaces behind; line breaks stay
        let message = SPACE_RUN.replace_all(&message, " ");
        let message = message
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n");
        let message = message.trim();
        if message.is_empty() {
            format!("Daily update: {date}")
        } else {
            message.to_string()
        }
    }
}

fn pick<'v, R: Rng + ?Sized>(items: &'v [String], rng: &mut R, fallback: &'v str) -> &'v str {
    items.choose(rng).map_or(fallback, String::as_str)
}
