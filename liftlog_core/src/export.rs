//! CSV export of logged sessions.
//!
//! One row per performed set, so the file can be pivoted in a spreadsheet
//! without knowing the program structure.

use crate::summary::set_volume;
use crate::{DropSet, ProgramHistory, Result, UNKNOWN_EXERCISE};
use std::fs::File;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    date: String,
    day_name: &'a str,
    exercise_id: &'a str,
    exercise_name: &'a str,
    set_index: usize,
    reps: u32,
    weight: f64,
    completed: bool,
    drops: String,
    volume: f64,
}

/// Write every logged set in `history` to a CSV file at `path`
///
/// The file is replaced if it exists. Sessions are written oldest first.
/// Returns the number of rows written.
pub fn export_day_logs(history: &ProgramHistory, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(file);

    let mut logs: Vec<_> = history.progress.day_logs.iter().collect();
    logs.sort_by_key(|log| log.date);

    let mut rows = 0;
    for log in logs {
        let date = log.date.format("%Y-%m-%d").to_string();
        for exercise in &log.exercises {
            let name = history
                .program
                .find_exercise(exercise)
                .map(|ex| ex.name.as_str())
                .unwrap_or(UNKNOWN_EXERCISE);

            for (index, set) in exercise.sets.iter().enumerate() {
                writer.serialize(CsvRow {
                    date: date.clone(),
                    day_name: &log.day_name,
                    exercise_id: &exercise.exercise_id,
                    exercise_name: name,
                    set_index: index + 1,
                    reps: set.reps,
                    weight: set.weight,
                    completed: set.completed,
                    drops: format_drops(&set.drops),
                    volume: set_volume(set),
                })?;
                rows += 1;
            }
        }
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} sets to {:?}", rows, path);
    Ok(rows)
}

/// `weight x reps` pairs separated by `;`
fn format_drops(drops: &[DropSet]) -> String {
    drops
        .iter()
        .map(|d| format!("{}x{}", d.weight, d.reps))
        .collect::<Vec<_>>()
        .join(";")
}
