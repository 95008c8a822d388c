//! Pre-fill resolver for new and edited sessions.
//!
//! When a day is selected the editor needs a starting set list for every
//! exercise of that day. For a new session this comes from the most recent
//! log of the same day name (progressive overload: repeat last time's
//! numbers), falling back to the template's recommended targets.

use crate::program::{DEFAULT_RECOMMENDED_REPS, DEFAULT_RECOMMENDED_SETS};
use crate::{
    Exercise, ExerciseProgress, ExerciseSet, ProgramDay, ProgramDayProgress, TrainingProgram,
    UNKNOWN_EXERCISE,
};

/// Targets used when an exercise template does not specify its own
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrefillDefaults {
    pub sets: u32,
    pub reps: u32,
}

impl Default for PrefillDefaults {
    fn default() -> Self {
        Self {
            sets: DEFAULT_RECOMMENDED_SETS,
            reps: DEFAULT_RECOMMENDED_REPS,
        }
    }
}

/// Most recent log for `day_name`
///
/// Latest `date` wins; among logs sharing that date the one appended last wins.
pub fn latest_log_for_day<'a>(
    day_logs: &'a [ProgramDayProgress],
    day_name: &str,
) -> Option<&'a ProgramDayProgress> {
    day_logs
        .iter()
        .filter(|log| log.day_name == day_name)
        .fold(None, |best, log| match best {
            Some(best) if best.date > log.date => Some(best),
            _ => Some(log),
        })
}

/// Seed a new session for the named day of `program`
///
/// Returns an empty list when the program has no such day.
pub fn prefill_for_day(
    program: &TrainingProgram,
    day_name: &str,
    day_logs: &[ProgramDayProgress],
    defaults: PrefillDefaults,
) -> Vec<ExerciseProgress> {
    match program.day(day_name) {
        Some(day) => prefill_day(day, day_logs, defaults),
        None => {
            tracing::warn!("Day '{}' not found in program '{}'", day_name, program.name);
            Vec::new()
        }
    }
}

/// Seed a new session for `day` from its latest log
pub fn prefill_day(
    day: &ProgramDay,
    day_logs: &[ProgramDayProgress],
    defaults: PrefillDefaults,
) -> Vec<ExerciseProgress> {
    let last = latest_log_for_day(day_logs, &day.name);
    match last {
        Some(log) => tracing::debug!("Pre-filling '{}' from log dated {}", day.name, log.date),
        None => tracing::debug!("No previous log for '{}', using recommended targets", day.name),
    }

    day.exercises()
        .map(|ex| {
            let previous = last
                .and_then(|log| log.exercises.iter().find(|p| p.matches(ex)))
                .filter(|p| !p.sets.is_empty());

            let sets = match previous {
                Some(previous) => previous
                    .sets
                    .iter()
                    .map(|s| ExerciseSet {
                        reps: s.reps,
                        weight: s.weight,
                        completed: false,
                        drops: s.drops.clone(),
                    })
                    .collect(),
                None => recommended_sets(ex, defaults),
            };

            ExerciseProgress {
                exercise_id: ex.key().to_string(),
                sets,
                notes: None,
            }
        })
        .collect()
}

/// Load an existing session for editing
///
/// Recorded sets are kept exactly as logged; exercises added to the day
/// since then get recommended targets. A record logged as
/// `unknown_exercise` is claimed by the first keyed exercise that has no
/// record of its own, each such record at most once.
pub fn load_for_edit(
    day: &ProgramDay,
    initial: &ProgramDayProgress,
    defaults: PrefillDefaults,
) -> Vec<ExerciseProgress> {
    let mut claimed = vec![false; initial.exercises.len()];
    let mut exercises = Vec::new();

    for ex in day.exercises() {
        let has_key = ex.id.as_deref().is_some_and(|id| !id.is_empty());
        let found = initial
            .exercises
            .iter()
            .position(|p| p.matches(ex))
            .or_else(|| {
                if !has_key {
                    return None;
                }
                initial
                    .exercises
                    .iter()
                    .enumerate()
                    .position(|(i, p)| !claimed[i] && p.exercise_id == UNKNOWN_EXERCISE)
            });

        let progress = match found {
            Some(index) => {
                claimed[index] = true;
                let existing = &initial.exercises[index];
                ExerciseProgress {
                    exercise_id: ex.key().to_string(),
                    sets: existing.sets.clone(),
                    notes: existing.notes.clone(),
                }
            }
            None => ExerciseProgress {
                exercise_id: ex.key().to_string(),
                sets: recommended_sets(ex, defaults),
                notes: None,
            },
        };
        exercises.push(progress);
    }

    exercises
}

fn recommended_sets(ex: &Exercise, defaults: PrefillDefaults) -> Vec<ExerciseSet> {
    let sets = ex.recommended_sets.filter(|&n| n > 0).unwrap_or(defaults.sets);
    let reps = ex.recommended_reps.filter(|&n| n > 0).unwrap_or(defaults.reps);
    (0..sets).map(|_| ExerciseSet::new(reps, 0.0)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Block, DropSet};
    use chrono::NaiveDate;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn push_day() -> ProgramDay {
        ProgramDay {
            name: "Push Day".into(),
            blocks: vec![
                Block::single(Exercise {
                    id: Some("bench".into()),
                    recommended_sets: Some(3),
                    recommended_reps: Some(10),
                    ..Exercise::new("Bench Press")
                }),
                Block::superset(
                    vec![Exercise::new("Dips"), Exercise::new("Pushups")],
                    3,
                ),
            ],
        }
    }

    fn log(day_name: &str, day: u32, exercise_id: &str, weight: f64) -> ProgramDayProgress {
        ProgramDayProgress {
            id: None,
            submission_id: None,
            day_name: day_name.into(),
            date: date(day),
            exercises: vec![ExerciseProgress {
                exercise_id: exercise_id.into(),
                sets: vec![ExerciseSet {
                    reps: 8,
                    weight,
                    completed: true,
                    drops: vec![DropSet { weight: weight - 10.0, reps: 6 }],
                }],
                notes: None,
            }],
            notes: None,
        }
    }

    #[test]
    fn test_no_history_uses_recommended_targets() {
        let exercises = prefill_day(&push_day(), &[], PrefillDefaults::default());

        assert_eq!(exercises.len(), 3);
        assert_eq!(exercises[0].exercise_id, "bench");
        assert_eq!(exercises[0].sets.len(), 3);
        for set in &exercises[0].sets {
            assert_eq!(set, &ExerciseSet::new(10, 0.0));
        }
        // Exercises without ids fall back to their names as keys
        assert_eq!(exercises[1].exercise_id, "Dips");
    }

    #[test]
    fn test_missing_recommended_sets_defaults_to_three() {
        let exercises = prefill_day(&push_day(), &[], PrefillDefaults::default());
        assert_eq!(exercises[2].sets.len(), 3);
        assert_eq!(exercises[2].sets[0].reps, 10);
    }

    #[test]
    fn test_prefill_copies_most_recent_matching_log() {
        let logs = vec![
            log("Push Day", 3, "bench", 60.0),
            log("Push Day", 10, "bench", 70.0),
            log("Pull Day", 12, "bench", 90.0),
            log("Push Day", 7, "bench", 65.0),
        ];

        let exercises = prefill_day(&push_day(), &logs, PrefillDefaults::default());
        let bench = &exercises[0];

        assert_eq!(bench.sets.len(), 1);
        assert_eq!(bench.sets[0].weight, 70.0);
        assert_eq!(bench.sets[0].reps, 8);
        assert!(!bench.sets[0].completed);
        assert_eq!(bench.sets[0].drops, vec![DropSet { weight: 60.0, reps: 6 }]);
    }

    #[test]
    fn test_same_date_tie_prefers_last_inserted() {
        let logs = vec![
            log("Push Day", 10, "bench", 70.0),
            log("Push Day", 10, "bench", 72.5),
        ];

        let picked = latest_log_for_day(&logs, "Push Day").unwrap();
        assert_eq!(picked.exercises[0].sets[0].weight, 72.5);
    }

    #[test]
    fn test_prefill_matches_by_name_when_logged_without_id() {
        let logs = vec![log("Push Day", 1, "Bench Press", 55.0)];
        let exercises = prefill_day(&push_day(), &logs, PrefillDefaults::default());
        assert_eq!(exercises[0].sets[0].weight, 55.0);
        assert_eq!(exercises[0].exercise_id, "bench");
    }

    #[test]
    fn test_prefill_is_deterministic() {
        let logs = vec![log("Push Day", 2, "bench", 40.0), log("Push Day", 4, "bench", 45.0)];
        let first = prefill_day(&push_day(), &logs, PrefillDefaults::default());
        let second = prefill_day(&push_day(), &logs, PrefillDefaults::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_logged_exercise_without_sets_falls_back() {
        let mut empty = log("Push Day", 2, "bench", 40.0);
        empty.exercises[0].sets.clear();

        let exercises = prefill_day(&push_day(), &[empty], PrefillDefaults::default());
        assert_eq!(exercises[0].sets.len(), 3);
        assert_eq!(exercises[0].sets[0].weight, 0.0);
    }

    #[test]
    fn test_unknown_day_yields_empty() {
        let program = TrainingProgram {
            days: vec![push_day()],
            ..Default::default()
        };
        let exercises = prefill_for_day(&program, "Leg Day", &[], PrefillDefaults::default());
        assert!(exercises.is_empty());
    }

    #[test]
    fn test_custom_defaults() {
        let defaults = PrefillDefaults { sets: 5, reps: 5 };
        let exercises = prefill_day(&push_day(), &[], defaults);
        assert_eq!(exercises[0].sets.len(), 3);
        assert_eq!(exercises[1].sets.len(), 5);
        assert_eq!(exercises[1].sets[0].reps, 5);
    }

    #[test]
    fn test_edit_mode_keeps_logged_sets_verbatim() {
        let initial = log("Push Day", 9, "bench", 80.0);
        let exercises = load_for_edit(&push_day(), &initial, PrefillDefaults::default());

        assert!(exercises[0].sets[0].completed);
        assert_eq!(exercises[0].sets[0].weight, 80.0);
        assert_eq!(exercises[1].sets.len(), 3);
        assert!(!exercises[1].sets[0].completed);
    }

    #[test]
    fn test_edit_mode_keyed_exercise_claims_unknown_record() {
        let initial = log("Push Day", 9, UNKNOWN_EXERCISE, 70.0);
        let exercises = load_for_edit(&push_day(), &initial, PrefillDefaults::default());

        assert_eq!(exercises[0].exercise_id, "bench");
        assert_eq!(exercises[0].sets.len(), 1);
        assert_eq!(exercises[0].sets[0].weight, 70.0);
        // Exercises without a key never pick up an unknown record
        assert_eq!(exercises[1].sets.len(), 3);
        assert_eq!(exercises[1].sets[0].weight, 0.0);
    }

    #[test]
    fn test_edit_mode_prefers_exact_record_over_unknown() {
        let mut initial = log("Push Day", 9, "bench", 80.0);
        let mut unknown = initial.exercises[0].clone();
        unknown.exercise_id = UNKNOWN_EXERCISE.into();
        unknown.sets[0].weight = 20.0;
        initial.exercises.insert(0, unknown);

        let exercises = load_for_edit(&push_day(), &initial, PrefillDefaults::default());
        assert_eq!(exercises[0].sets[0].weight, 80.0);
    }
}
