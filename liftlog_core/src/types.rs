//! Core domain types for the training session editor.
//!
//! This module defines the fundamental types used throughout the system:
//! - Program templates (programs, days, blocks, exercises)
//! - Performed work (sets, drop sets, exercise progress)
//! - Logged sessions and the program history that aggregates them
//!
//! All types serialize to the backend's JSON shape (camelCase keys,
//! Mongo-style `_id`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identity used when an exercise has neither an id nor a name
pub const UNKNOWN_EXERCISE: &str = "unknown_exercise";

// ============================================================================
// Program Template Types
// ============================================================================

/// Who authored a training program
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CreationType {
    #[default]
    Member,
    Coach,
    Template,
}

/// An exercise template inside a program day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    #[serde(
        rename = "_id",
        alias = "id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_muscles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equipment: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_sets: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_reps: Option<u32>,
}

impl Exercise {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Key recorded as `exerciseId` when this exercise is performed
    ///
    /// Persisted id first, then name, then [`UNKNOWN_EXERCISE`].
    pub fn key(&self) -> &str {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ if !self.name.is_empty() => self.name.as_str(),
            _ => UNKNOWN_EXERCISE,
        }
    }
}

/// Grouping of exercises performed together
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// Exactly one exercise
    #[default]
    Single,
    /// Two or more exercises sharing rounds
    Superset,
}

/// A block of one (`single`) or more (`superset`) exercises
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct Block {
    #[serde(rename = "type", default)]
    pub kind: BlockKind,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounds: Option<u32>,
}

impl Block {
    pub fn single(exercise: Exercise) -> Self {
        Self {
            kind: BlockKind::Single,
            exercises: vec![exercise],
            rounds: None,
        }
    }

    pub fn superset(exercises: Vec<Exercise>, rounds: u32) -> Self {
        Self {
            kind: BlockKind::Superset,
            exercises,
            rounds: Some(rounds),
        }
    }
}

/// A named workout template within a program
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct ProgramDay {
    pub name: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl ProgramDay {
    /// All exercises of the day in block order
    pub fn exercises(&self) -> impl Iterator<Item = &Exercise> {
        self.blocks.iter().flat_map(|b| b.exercises.iter())
    }
}

/// A training program: an ordered list of days
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrainingProgram {
    #[serde(
        rename = "_id",
        alias = "id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub days_per_week: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_weeks: Option<u32>,
    #[serde(default)]
    pub creation_type: CreationType,
    #[serde(default)]
    pub days: Vec<ProgramDay>,
}

impl TrainingProgram {
    pub fn day(&self, name: &str) -> Option<&ProgramDay> {
        self.days.iter().find(|d| d.name == name)
    }

    /// Find the template for a performed exercise anywhere in the program
    pub fn find_exercise(&self, progress: &ExerciseProgress) -> Option<&Exercise> {
        self.days
            .iter()
            .flat_map(|d| d.exercises())
            .find(|ex| progress.matches(ex))
    }
}

// ============================================================================
// Performed Work Types
// ============================================================================

/// A same-set weight drop performed right after its parent set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct DropSet {
    pub weight: f64,
    pub reps: u32,
}

/// One performed set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct ExerciseSet {
    pub reps: u32,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub drops: Vec<DropSet>,
}

impl ExerciseSet {
    pub fn new(reps: u32, weight: f64) -> Self {
        Self {
            reps,
            weight,
            completed: false,
            drops: Vec::new(),
        }
    }
}

/// Performed record of one exercise within a session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseProgress {
    pub exercise_id: String,
    #[serde(default)]
    pub sets: Vec<ExerciseSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ExerciseProgress {
    /// Whether this record belongs to the given template
    ///
    /// Records written by older program versions may carry the exercise
    /// name instead of its id, so both are accepted.
    pub fn matches(&self, exercise: &Exercise) -> bool {
        if let Some(id) = exercise.id.as_deref() {
            if !id.is_empty() && self.exercise_id == id {
                return true;
            }
        }
        !exercise.name.is_empty() && self.exercise_id == exercise.name
    }
}

// ============================================================================
// Session and History Types
// ============================================================================

/// One logged instance of a program day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgramDayProgress {
    #[serde(
        rename = "_id",
        alias = "id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,
    pub day_name: String,
    #[serde(with = "session_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub exercises: Vec<ExerciseProgress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Logged progress against a program
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProgramProgress {
    #[serde(default)]
    pub program_id: String,
    #[serde(
        default,
        with = "session_date::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub days_completed: u32,
    #[serde(default)]
    pub total_days: u32,
    #[serde(default)]
    pub day_logs: Vec<ProgramDayProgress>,
}

/// Lifecycle of a user's program history
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    #[default]
    Active,
    Paused,
    Completed,
    Abandoned,
}

impl HistoryStatus {
    /// Active and paused histories both count as the user's current program
    pub fn is_active(self) -> bool {
        matches!(self, HistoryStatus::Active | HistoryStatus::Paused)
    }
}

/// A program plus the user's logged progress against it
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProgramHistory {
    #[serde(
        rename = "_id",
        alias = "id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub program: TrainingProgram,
    #[serde(default)]
    pub progress: ProgramProgress,
    #[serde(default)]
    pub status: HistoryStatus,
}

// ============================================================================
// Date Serialization
// ============================================================================

/// Session dates travel as `YYYY-MM-DD`; the backend may echo them back as
/// full RFC 3339 timestamps, in which case the date part is kept.
pub mod session_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn parse(raw: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(raw, FORMAT).ok().or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
    }

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&date.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid session date '{}'", raw)))
    }

    pub mod option {
        use super::{parse, FORMAT};
        use chrono::NaiveDate;
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            date: &Option<NaiveDate>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => s.collect_str(&date.format(FORMAT)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<NaiveDate>, D::Error> {
            match Option::<String>::deserialize(d)? {
                Some(raw) => parse(&raw).map(Some).ok_or_else(|| {
                    de::Error::custom(format!("invalid session date '{}'", raw))
                }),
                None => Ok(None),
            }
        }
    }
}
