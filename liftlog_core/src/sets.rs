//! Set and drop-set mutations over a session's exercise list.
//!
//! Every operation takes the current exercises by reference and returns a
//! fresh list; the input is never modified. Indices are positional and an
//! index that does not exist yields [`Error::OutOfRange`].

use crate::{DropSet, Error, ExerciseProgress, ExerciseSet, Result};

/// Reps for a set added to an exercise that has none yet
pub const DEFAULT_SET_REPS: u32 = 10;

/// How much lighter a first drop is than its parent set
pub const DROP_WEIGHT_STEP: f64 = 5.0;

/// A single field edit on a set
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SetField {
    Reps(u32),
    Weight(f64),
    Completed(bool),
}

/// A single field edit on a drop set
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DropField {
    Weight(f64),
    Reps(u32),
}

/// Replace one field of a set
///
/// Entering a weight above zero also marks the set completed and carries
/// that weight into the following sets that are still at zero, stopping at
/// the first set that already has a weight.
pub fn update_set(
    exercises: &[ExerciseProgress],
    ex_index: usize,
    set_index: usize,
    field: SetField,
) -> Result<Vec<ExerciseProgress>> {
    let mut next = exercises.to_vec();
    let sets = sets_mut(&mut next, ex_index)?;
    let len = sets.len();
    let set = sets
        .get_mut(set_index)
        .ok_or_else(|| Error::out_of_range("set", set_index, len))?;

    match field {
        SetField::Reps(reps) => set.reps = reps,
        SetField::Completed(done) => set.completed = done,
        SetField::Weight(weight) => {
            set.weight = weight;
            if weight > 0.0 {
                set.completed = true;
                for later in sets[set_index + 1..].iter_mut() {
                    if later.weight != 0.0 {
                        break;
                    }
                    later.weight = weight;
                }
            }
        }
    }

    Ok(next)
}

/// Append a set copying the last set's reps and weight
pub fn add_set(exercises: &[ExerciseProgress], ex_index: usize) -> Result<Vec<ExerciseProgress>> {
    let mut next = exercises.to_vec();
    let sets = sets_mut(&mut next, ex_index)?;

    let set = match sets.last() {
        Some(previous) => ExerciseSet::new(previous.reps, previous.weight),
        None => ExerciseSet::new(DEFAULT_SET_REPS, 0.0),
    };
    sets.push(set);

    Ok(next)
}

/// Remove a set together with its drops
pub fn remove_set(
    exercises: &[ExerciseProgress],
    ex_index: usize,
    set_index: usize,
) -> Result<Vec<ExerciseProgress>> {
    let mut next = exercises.to_vec();
    let sets = sets_mut(&mut next, ex_index)?;
    if set_index >= sets.len() {
        return Err(Error::out_of_range("set", set_index, sets.len()));
    }
    sets.remove(set_index);
    Ok(next)
}

/// Append a drop to a set
///
/// Repeats the previous drop if there is one; otherwise starts from the
/// parent's reps at [`DROP_WEIGHT_STEP`] lighter, keeping the parent weight
/// when it is too light to drop.
pub fn add_drop_set(
    exercises: &[ExerciseProgress],
    ex_index: usize,
    set_index: usize,
) -> Result<Vec<ExerciseProgress>> {
    let mut next = exercises.to_vec();
    let set = set_mut(&mut next, ex_index, set_index)?;

    let drop = match set.drops.last() {
        Some(previous) => previous.clone(),
        None => DropSet {
            weight: if set.weight > DROP_WEIGHT_STEP {
                set.weight - DROP_WEIGHT_STEP
            } else {
                set.weight
            },
            reps: set.reps,
        },
    };
    set.drops.push(drop);

    Ok(next)
}

pub fn update_drop_set(
    exercises: &[ExerciseProgress],
    ex_index: usize,
    set_index: usize,
    drop_index: usize,
    field: DropField,
) -> Result<Vec<ExerciseProgress>> {
    let mut next = exercises.to_vec();
    let set = set_mut(&mut next, ex_index, set_index)?;
    let len = set.drops.len();
    let drop = set
        .drops
        .get_mut(drop_index)
        .ok_or_else(|| Error::out_of_range("drop", drop_index, len))?;

    match field {
        DropField::Weight(weight) => drop.weight = weight,
        DropField::Reps(reps) => drop.reps = reps,
    }

    Ok(next)
}

pub fn remove_drop_set(
    exercises: &[ExerciseProgress],
    ex_index: usize,
    set_index: usize,
    drop_index: usize,
) -> Result<Vec<ExerciseProgress>> {
    let mut next = exercises.to_vec();
    let set = set_mut(&mut next, ex_index, set_index)?;
    if drop_index >= set.drops.len() {
        return Err(Error::out_of_range("drop", drop_index, set.drops.len()));
    }
    set.drops.remove(drop_index);
    Ok(next)
}

/// Mark every set of every exercise as completed
pub fn complete_all(exercises: &[ExerciseProgress]) -> Vec<ExerciseProgress> {
    let mut next = exercises.to_vec();
    for set in next.iter_mut().flat_map(|ex| ex.sets.iter_mut()) {
        set.completed = true;
    }
    next
}

fn sets_mut(exercises: &mut [ExerciseProgress], ex_index: usize) -> Result<&mut Vec<ExerciseSet>> {
    let len = exercises.len();
    exercises
        .get_mut(ex_index)
        .map(|ex| &mut ex.sets)
        .ok_or_else(|| Error::out_of_range("exercise", ex_index, len))
}

fn set_mut(
    exercises: &mut [ExerciseProgress],
    ex_index: usize,
    set_index: usize,
) -> Result<&mut ExerciseSet> {
    let sets = sets_mut(exercises, ex_index)?;
    let len = sets.len();
    sets.get_mut(set_index)
        .ok_or_else(|| Error::out_of_range("set", set_index, len))
}
