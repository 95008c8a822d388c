//! Editing operations over the program template tree.
//!
//! Day → Block → Exercise. Every operation keeps the block invariants:
//! - a block with no exercises is removed from its day
//! - a superset left with a single exercise becomes a `single` block
//! - `days_per_week` tracks the number of days after [`TrainingProgram::normalize`]

use crate::{Block, BlockKind, Error, Exercise, Result, TrainingProgram};
use uuid::Uuid;

/// Target sets for newly added exercises and templates that omit them
pub const DEFAULT_RECOMMENDED_SETS: u32 = 3;

/// Target reps for newly added exercises and templates that omit them
pub const DEFAULT_RECOMMENDED_REPS: u32 = 10;

/// Rounds given to a superset created by grouping blocks
pub const GROUPED_SUPERSET_ROUNDS: u32 = 3;

impl TrainingProgram {
    /// Re-establish block invariants and sync `days_per_week` with the day count
    pub fn normalize(&mut self) {
        for day in &mut self.days {
            day.blocks.retain(|b| !b.exercises.is_empty());
            for block in &mut day.blocks {
                match (block.kind, block.exercises.len()) {
                    (BlockKind::Superset, 1) => {
                        block.kind = BlockKind::Single;
                        block.rounds = None;
                    }
                    (BlockKind::Single, n) if n > 1 => {
                        block.kind = BlockKind::Superset;
                        block.rounds.get_or_insert(GROUPED_SUPERSET_ROUNDS);
                    }
                    _ => {}
                }
            }
        }
        self.days_per_week = self.days.len() as u32;
    }

    /// Give every exercise without a persisted id a stable synthetic key
    ///
    /// Returns the number of exercises that received a key.
    pub fn ensure_exercise_keys(&mut self) -> usize {
        let mut assigned = 0;
        for exercise in self
            .days
            .iter_mut()
            .flat_map(|d| d.blocks.iter_mut())
            .flat_map(|b| b.exercises.iter_mut())
        {
            if exercise.id.as_deref().map_or(true, str::is_empty) {
                exercise.id = Some(Uuid::new_v4().to_string());
                assigned += 1;
            }
        }
        if assigned > 0 {
            tracing::debug!("Assigned synthetic keys to {} exercises", assigned);
        }
        assigned
    }

    /// Check the program for structural problems
    ///
    /// Returns a list of human-readable problems; empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Program has empty name".to_string());
        }
        if self.days.is_empty() {
            errors.push("Program has no days".to_string());
        }
        if self.days_per_week as usize != self.days.len() {
            errors.push(format!(
                "daysPerWeek {} does not match {} days",
                self.days_per_week,
                self.days.len()
            ));
        }

        for (i, day) in self.days.iter().enumerate() {
            if day.name.trim().is_empty() {
                errors.push(format!("Day {} has empty name", i + 1));
            }
            if day.blocks.is_empty() {
                errors.push(format!("Day '{}' has no exercises", day.name));
            }
            for (j, block) in day.blocks.iter().enumerate() {
                match (block.kind, block.exercises.len()) {
                    (_, 0) => errors.push(format!("Day '{}' block {} is empty", day.name, j + 1)),
                    (BlockKind::Single, n) if n > 1 => errors.push(format!(
                        "Day '{}' block {} is single but has {} exercises",
                        day.name,
                        j + 1,
                        n
                    )),
                    (BlockKind::Superset, 1) => errors.push(format!(
                        "Day '{}' block {} is a superset with one exercise",
                        day.name,
                        j + 1
                    )),
                    _ => {}
                }
                for ex in &block.exercises {
                    if ex.name.trim().is_empty() {
                        errors.push(format!(
                            "Day '{}' block {} has an unnamed exercise",
                            day.name,
                            j + 1
                        ));
                    }
                }
            }
        }

        errors
    }

    pub fn update_day_name(&mut self, day: usize, name: impl Into<String>) -> Result<()> {
        let len = self.days.len();
        let day = self
            .days
            .get_mut(day)
            .ok_or_else(|| Error::out_of_range("day", day, len))?;
        day.name = name.into();
        Ok(())
    }

    /// Append a new single-exercise block to a day
    ///
    /// Returns the synthetic key of the new exercise.
    pub fn add_exercise(&mut self, day: usize, name: impl Into<String>) -> Result<String> {
        let len = self.days.len();
        let day = self
            .days
            .get_mut(day)
            .ok_or_else(|| Error::out_of_range("day", day, len))?;

        let key = Uuid::new_v4().to_string();
        day.blocks.push(Block::single(Exercise {
            id: Some(key.clone()),
            recommended_sets: Some(DEFAULT_RECOMMENDED_SETS),
            recommended_reps: Some(DEFAULT_RECOMMENDED_REPS),
            ..Exercise::new(name)
        }));
        Ok(key)
    }

    /// Remove one exercise, collapsing its block as needed
    pub fn remove_exercise(&mut self, day: usize, block: usize, exercise: usize) -> Result<Exercise> {
        let days_len = self.days.len();
        let day = self
            .days
            .get_mut(day)
            .ok_or_else(|| Error::out_of_range("day", day, days_len))?;
        let blocks_len = day.blocks.len();
        let target = day
            .blocks
            .get_mut(block)
            .ok_or_else(|| Error::out_of_range("block", block, blocks_len))?;
        if exercise >= target.exercises.len() {
            return Err(Error::out_of_range("exercise", exercise, target.exercises.len()));
        }

        let removed = target.exercises.remove(exercise);

        if target.exercises.is_empty() {
            day.blocks.remove(block);
            tracing::debug!("Removed empty block {} from day '{}'", block, day.name);
        } else if target.kind == BlockKind::Superset && target.exercises.len() == 1 {
            target.kind = BlockKind::Single;
            target.rounds = None;
            tracing::debug!("Downgraded superset {} in day '{}' to single", block, day.name);
        }

        Ok(removed)
    }

    pub fn reorder_block(&mut self, day: usize, from: usize, to: usize) -> Result<()> {
        let len = self.days.len();
        let day = self
            .days
            .get_mut(day)
            .ok_or_else(|| Error::out_of_range("day", day, len))?;
        let blocks = day.blocks.len();
        if from >= blocks {
            return Err(Error::out_of_range("block", from, blocks));
        }
        if to >= blocks {
            return Err(Error::out_of_range("block", to, blocks));
        }

        let moved = day.blocks.remove(from);
        day.blocks.insert(to, moved);
        Ok(())
    }

    /// Merge several blocks of a day into one superset
    ///
    /// Exercises keep ascending block order; the superset takes the place of
    /// the first grouped block.
    pub fn group_blocks(&mut self, day: usize, indices: &[usize]) -> Result<()> {
        let len = self.days.len();
        let day = self
            .days
            .get_mut(day)
            .ok_or_else(|| Error::out_of_range("day", day, len))?;

        let mut ascending = indices.to_vec();
        ascending.sort_unstable();
        ascending.dedup();
        if ascending.len() < 2 {
            return Err(Error::Validation(
                "At least two blocks are needed to form a superset".into(),
            ));
        }
        if let Some(&bad) = ascending.iter().find(|&&i| i >= day.blocks.len()) {
            return Err(Error::out_of_range("block", bad, day.blocks.len()));
        }

        let exercises: Vec<Exercise> = ascending
            .iter()
            .flat_map(|&i| day.blocks[i].exercises.iter().cloned())
            .collect();

        for &i in ascending.iter().rev() {
            day.blocks.remove(i);
        }
        day.blocks
            .insert(ascending[0], Block::superset(exercises, GROUPED_SUPERSET_ROUNDS));
        Ok(())
    }
}
