//! Synthetic content for tracked files.
//!
//! Everything here is a pure transformation of the current file content;
//! reading and writing the files is the orchestrator's job.

use crate::config::{FileKind, RunConfig};

use chrono::NaiveDateTime;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde_json::{Map, Value, json};

const PROGRESS_PHRASE: &str = "Progress update";
const STATUSES: &[&str] = &["in_progress", "completed", "planned"];

/// Inputs shared by every generator during a run
#[derive(Debug, Clone)]
pub struct GenerationContext<'a> {
    pub now: NaiveDateTime,
    pub activity: &'a str,
    pub notes: &'a [String],
    pub emojis: &'a [String],
}

impl<'a> GenerationContext<'a> {
    pub fn new(now: NaiveDateTime, activity: &'a str, config: &'a RunConfig) -> Self {
        Self {
            now,
            activity,
            notes: &config.notes,
            emojis: &config.emojis,
        }
    }

    fn emoji<R: Rng + ?Sized>(&self, rng: &mut R) -> &'a str {
        self.emojis.choose(rng).map_or("📝", String::as_str)
    }

    fn note<R: Rng + ?Sized>(&self, rng: &mut R) -> &'a str {
        self.notes.choose(rng).map_or("Quick update", String::as_str)
    }
}

/// Produce the new full content of a file of `kind` whose current content is `existing`
pub fn generate<R: Rng + ?Sized>(
    kind: FileKind,
    existing: &str,
    ctx: &GenerationContext<'_>,
    rng: &mut R,
) -> String {
    match kind {
        FileKind::Markdown => append(existing, &markdown_block(ctx, rng), true),
        FileKind::Json => merge_json(existing, ctx, rng),
        FileKind::Text | FileKind::Generic => append(existing, &timestamped_line(ctx, rng), false),
    }
}

/// A dated header and/or weekday subsection followed by one bullet
pub fn markdown_block<R: Rng + ?Sized>(ctx: &GenerationContext<'_>, rng: &mut R) -> String {
    let mut block = String::new();
    let (dated, weekday) = match rng.random_range(0..3) {
        0 => (true, false),
        1 => (false, true),
        _ => (true, true),
    };

    if dated {
        block.push_str(&format!("## {} Update\n", ctx.now.format("%B %-d")));
    }
    if weekday {
        block.push_str(&format!("### {}\n", ctx.now.format("%A")));
    }

    let phrase = if rng.random_bool(0.5) {
        PROGRESS_PHRASE.to_string()
    } else {
        format!("{} completed at {}", ctx.activity, ctx.now.format("%H:%M"))
    };
    block.push_str(&format!("- {} {}\n", ctx.emoji(rng), phrase));
    block
}

/// `[YYYY-MM-DD HH:MM] <note> - <activity>`
pub fn timestamped_line<R: Rng + ?Sized>(ctx: &GenerationContext<'_>, rng: &mut R) -> String {
    format!(
        "[{}] {} - {}\n",
        ctx.now.format("%Y-%m-%d %H:%M"),
        ctx.note(rng),
        ctx.activity
    )
}

/// Record today's entry in a progress document.
///
/// Anything that is not a JSON object is replaced by an empty object first,
/// so the result always parses.
pub fn merge_json<R: Rng + ?Sized>(
    existing: &str,
    ctx: &GenerationContext<'_>,
    rng: &mut R,
) -> String {
    let mut root = match serde_json::from_str::<Value>(existing) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let timestamp = ctx.now.format("%Y-%m-%dT%H:%M:%S").to_string();
    let entry = json!({
        "timestamp": timestamp,
        "activity": ctx.activity,
        "status": STATUSES.choose(rng).copied().unwrap_or("completed"),
        "notes": ctx.note(rng),
        "emoji": ctx.emoji(rng),
    });

    let updates = root
        .entry("daily_updates")
        .or_insert_with(|| Value::Object(Map::new()));
    if !updates.is_object() {
        *updates = Value::Object(Map::new());
    }
    let total = match updates {
        Value::Object(days) => {
            days.insert(ctx.now.format("%Y-%m-%d").to_string(), entry);
            days.len()
        }
        _ => 0,
    };

    root.insert("last_modified".to_string(), Value::String(timestamp));
    root.insert("total_entries".to_string(), Value::from(total));

    // A map of plain values always serializes
    let mut out = serde_json::to_string_pretty(&Value::Object(root)).unwrap_or_default();
    out.push('\n');
    out
}

fn append(existing: &str, fragment: &str, separate: bool) -> String {
    let mut out = String::with_capacity(existing.len() + fragment.len() + 2);
    out.push_str(existing);
    if !existing.is_empty() {
        if !existing.ends_with('\n') {
            out.push('\n');
        }
        if separate {
            out.push('\n');
        }
    }
    out.push_str(fragment);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn context(config: &RunConfig) -> GenerationContext<'_> {
        let now = NaiveDate::from_ymd_opt(2025, 3, 5)
            .and_then(|d| d.and_hms_opt(14, 30, 0))
            .expect("valid timestamp");
        GenerationContext::new(now, "testing", config)
    }

    #[test]
    fn markdown_block_has_header_and_bullet() {
        let config = RunConfig::default();
        let ctx = context(&config);
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let block = markdown_block(&ctx, &mut rng);
            let lines: Vec<&str> = block.lines().collect();

            assert!(
                lines.iter().any(|l| *l == "## March 5 Update" || *l == "### Wednesday"),
                "no header in {block:?}"
            );
            let bullet = lines.last().expect("bullet line");
            assert!(bullet.starts_with("- "));
            assert!(
                bullet.ends_with(PROGRESS_PHRASE) || bullet.ends_with("testing completed at 14:30"),
                "unexpected bullet {bullet:?}"
            );
        }
    }

    #[test]
    fn markdown_appends_after_existing_content() {
        let config = RunConfig::default();
        let ctx = context(&config);
        let mut rng = StdRng::seed_from_u64(11);

        let updated = generate(FileKind::Markdown, "# Log", &ctx, &mut rng);
        assert!(updated.starts_with("# Log\n\n"));
        assert!(updated.ends_with('\n'));
    }

    #[test]
    fn text_and_generic_append_one_line() {
        let config = RunConfig::default();
        let ctx = context(&config);
        let mut rng = StdRng::seed_from_u64(5);

        let text = generate(FileKind::Text, "first line", &ctx, &mut rng);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "first line");
        assert!(lines[1].starts_with("[2025-03-05 14:30] "));
        assert!(lines[1].ends_with(" - testing"));

        let generic = generate(FileKind::Generic, "", &ctx, &mut rng);
        assert_eq!(generic.lines().count(), 1);
        assert!(generic.starts_with("[2025-03-05 14:30] "));
    }

    #[test]
    fn json_is_valid_from_empty_and_invalid_content() {
        let config = RunConfig::default();
        let ctx = context(&config);

        for existing in ["", "not json {", "[1, 2, 3]", "42", "{\"daily_updates\": 7}"] {
            let mut rng = StdRng::seed_from_u64(9);
            let out = merge_json(existing, &ctx, &mut rng);
            let value: Value = serde_json::from_str(&out).expect("output must be valid JSON");
            assert_eq!(value["total_entries"], 1, "from {existing:?}");
            assert_eq!(value["daily_updates"]["2025-03-05"]["activity"], "testing");
            assert_eq!(value["last_modified"], "2025-03-05T14:30:00");
        }
    }

    #[test]
    fn json_keeps_existing_entries_and_fields() {
        let config = RunConfig::default();
        let ctx = context(&config);
        let mut rng = StdRng::seed_from_u64(2);
        let existing = r#"{
            "project": "activity",
            "daily_updates": { "2025-03-04": { "status": "completed" } }
        }"#;

        let out = merge_json(existing, &ctx, &mut rng);
        let value: Value = serde_json::from_str(&out).expect("valid JSON");
        assert_eq!(value["project"], "activity");
        assert_eq!(value["total_entries"], 2);
        assert_eq!(value["daily_updates"]["2025-03-04"]["status"], "completed");
        let status = value["daily_updates"]["2025-03-05"]["status"]
            .as_str()
            .expect("status string");
        assert!(STATUSES.contains(&status));
    }
}
