//! Progress and volume aggregation.
//!
//! Session level: how many sets are done and how much weight was moved.
//! Program level: how far the user is through the whole program.

use crate::program::DEFAULT_RECOMMENDED_SETS;
use crate::{ExerciseProgress, ExerciseSet, ProgramHistory};
use serde::Serialize;

/// Program length assumed when the program does not state one
pub const DEFAULT_DURATION_WEEKS: u32 = 12;

/// Completion of the session being edited
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    pub completed_sets: usize,
    pub total_sets: usize,
    pub progress_percent: u32,
    pub all_complete: bool,
}

impl SessionProgress {
    /// Drops belong to their parent set and are not counted separately.
    pub fn from_exercises(exercises: &[ExerciseProgress]) -> Self {
        let sets = || exercises.iter().flat_map(|ex| ex.sets.iter());
        let total_sets = sets().count();
        let completed_sets = sets().filter(|s| s.completed).count();

        Self {
            completed_sets,
            total_sets,
            progress_percent: percent(completed_sets, total_sets),
            all_complete: total_sets > 0 && completed_sets == total_sets,
        }
    }
}

/// `weight × reps` of a set plus all of its drops
pub fn set_volume(set: &ExerciseSet) -> f64 {
    set.weight * f64::from(set.reps)
        + set
            .drops
            .iter()
            .map(|d| d.weight * f64::from(d.reps))
            .sum::<f64>()
}

/// Total volume of a session
pub fn session_volume(exercises: &[ExerciseProgress]) -> f64 {
    exercises
        .iter()
        .flat_map(|ex| ex.sets.iter())
        .map(set_volume)
        .sum()
}

/// How far a user is through their program
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramProgressSummary {
    /// Completed sets across all logged sessions, extra sets included
    pub completed_sets: usize,
    /// Sets the full program is expected to take
    pub expected_sets: usize,
    /// Completion percentage, capped at 100
    pub progress_percent: u32,
    pub total_exercises: usize,
    pub sessions_logged: usize,
}

impl ProgramProgressSummary {
    pub fn from_history(history: &ProgramHistory) -> Self {
        let program = &history.program;

        let planned_sets: u32 = program
            .days
            .iter()
            .flat_map(|d| d.exercises())
            .map(|ex| {
                ex.recommended_sets
                    .filter(|&n| n > 0)
                    .unwrap_or(DEFAULT_RECOMMENDED_SETS)
            })
            .sum();
        let sets_per_workout = if program.days.is_empty() {
            0.0
        } else {
            f64::from(planned_sets) / program.days.len() as f64
        };

        let weeks = program
            .duration_weeks
            .filter(|&w| w > 0)
            .unwrap_or(DEFAULT_DURATION_WEEKS);
        let total_workouts = f64::from(program.days_per_week) * f64::from(weeks);
        let expected_sets = (sets_per_workout * total_workouts).round() as usize;

        let completed_sets = history
            .progress
            .day_logs
            .iter()
            .flat_map(|log| log.exercises.iter())
            .flat_map(|ex| ex.sets.iter())
            .filter(|s| s.completed)
            .count();

        Self {
            completed_sets,
            expected_sets,
            progress_percent: percent(completed_sets.min(expected_sets), expected_sets),
            total_exercises: program.days.iter().map(|d| d.exercises().count()).sum(),
            sessions_logged: history.progress.day_logs.len(),
        }
    }
}

fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}
