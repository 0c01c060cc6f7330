use crate::config::FileSpec;
use crate::error::{RunError, RunOutcome};

use rand::Rng;
use rand::seq::index;

/// Choose which files a run touches.
///
/// Draws `k` in `1..=min(max_files_per_day, files.len())`, then `k` distinct
/// files uniformly without replacement. The result keeps configuration order.
pub fn select<R: Rng + ?Sized>(
    files: &[FileSpec],
    max_files_per_day: usize,
    rng: &mut R,
) -> RunOutcome<Vec<FileSpec>> {
    if files.is_empty() {
        return Err(RunError::Configuration("no files configured".to_string()));
    }
    if max_files_per_day < 1 {
        return Err(RunError::Configuration(
            "max_files_per_day must be at least 1".to_string(),
        ));
    }

    let upper = max_files_per_day.min(files.len());
    let count = rng.random_range(1..=upper);

    let mut picked = index::sample(rng, files.len(), count).into_vec();
    picked.sort_unstable();

    Ok(picked
        .into_iter()
        .filter_map(|i| files.get(i).cloned())
        .collect())
}
