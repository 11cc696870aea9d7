// src/stats.rs
use chrono::NaiveDate;

use crate::model::{Exercise, ExerciseLog, MuscleGroup, SetLog, WeightInput, Workout, WorkoutStats};
use crate::storage::find_exercise;

/// Epley estimate. A single rep is its own max; non-positive input has none.
pub fn estimate_1rm(weight: f64, reps: u32) -> Option<f64> {
    if reps == 0 || weight <= 0.0 {
        return None;
    }
    if reps == 1 {
        return Some(weight);
    }
    Some(weight * (1.0 + f64::from(reps) / 30.0))
}

pub fn set_volume(set: &SetLog, weight_input: WeightInput) -> f64 {
    set.weight * f64::from(set.reps) * weight_input.volume_multiplier()
}

pub fn log_volume(log: &ExerciseLog, weight_input: WeightInput) -> f64 {
    log.sets.iter().map(|s| set_volume(s, weight_input)).sum()
}

fn weight_input_for(exercises: &[Exercise], exercise_id: &str) -> WeightInput {
    find_exercise(exercises, exercise_id).map_or(WeightInput::Total, |e| e.weight_input)
}

/// Totals for a workout. Exercises missing from the library count as
/// total-weight input and contribute no muscles.
#[allow(clippy::cast_possible_truncation)]
pub fn compute_workout_stats(workout: &Workout, exercises: &[Exercise]) -> WorkoutStats {
    let mut total_volume = 0.0;
    let mut muscles_worked: Vec<MuscleGroup> = Vec::new();

    for log in workout.exercises.iter().filter(|l| !l.sets.is_empty()) {
        let definition = find_exercise(exercises, &log.exercise);
        let weight_input = definition.map_or(WeightInput::Total, |e| e.weight_input);
        total_volume += log_volume(log, weight_input);
        for muscle in definition.map(|e| e.muscles.as_slice()).unwrap_or_default() {
            if !muscles_worked.contains(muscle) {
                muscles_worked.push(*muscle);
            }
        }
    }

    WorkoutStats {
        total_sets: workout.total_sets() as u32,
        total_volume,
        muscles_worked,
    }
}

/// A single set singled out as a record, with the date it was performed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordSet {
    pub date: NaiveDate,
    pub weight: f64,
    pub reps: u32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PersonalRecords {
    pub exercise: String,
    pub heaviest: Option<RecordSet>,
    pub best_e1rm: Option<RecordSet>,
    pub most_reps: Option<RecordSet>,
    pub best_set_volume: Option<RecordSet>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum RecordKind {
    #[strum(serialize = "Heaviest weight")]
    Heaviest,
    #[strum(serialize = "Estimated 1RM")]
    Estimated1RM,
    #[strum(serialize = "Most reps")]
    MostReps,
    #[strum(serialize = "Best set volume")]
    SetVolume,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub exercise: String,
    pub kind: RecordKind,
    pub new: RecordSet,
    pub previous: Option<RecordSet>,
}

fn keep_best(slot: &mut Option<RecordSet>, candidate: RecordSet) {
    if slot.map_or(true, |best| candidate.value > best.value) {
        *slot = Some(candidate);
    }
}

impl PersonalRecords {
    pub fn new(exercise: impl Into<String>) -> Self {
        Self {
            exercise: exercise.into(),
            ..Default::default()
        }
    }

    /// Folds the sets of one workout into the records. Ties keep the earlier record.
    pub fn observe(&mut self, date: NaiveDate, log: &ExerciseLog, weight_input: WeightInput) {
        for set in &log.sets {
            let record = |value: f64| RecordSet {
                date,
                weight: set.weight,
                reps: set.reps,
                value,
            };
            keep_best(&mut self.heaviest, record(set.weight));
            if let Some(e1rm) = estimate_1rm(set.weight, set.reps) {
                keep_best(&mut self.best_e1rm, record(e1rm));
            }
            keep_best(&mut self.most_reps, record(f64::from(set.reps)));
            keep_best(&mut self.best_set_volume, record(set_volume(set, weight_input)));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.heaviest.is_none()
    }

    fn slots(&self) -> [(RecordKind, Option<RecordSet>); 4] {
        [
            (RecordKind::Heaviest, self.heaviest),
            (RecordKind::Estimated1RM, self.best_e1rm),
            (RecordKind::MostReps, self.most_reps),
            (RecordKind::SetVolume, self.best_set_volume),
        ]
    }
}

/// Records across finished workouts, oldest first so ties credit the first time.
pub fn personal_records(
    exercise_id: &str,
    history: &[(Workout, ExerciseLog)],
    weight_input: WeightInput,
) -> PersonalRecords {
    let mut records = PersonalRecords::new(exercise_id);
    for (workout, log) in history.iter().rev() {
        records.observe(workout.date, log, weight_input);
    }
    records
}

/// Records in `workout` that beat everything in `previous`. An exercise with no
/// history never reports records; a first session is not a record.
pub fn new_records(
    workout: &Workout,
    previous: &[PersonalRecords],
    exercises: &[Exercise],
) -> Vec<NewRecord> {
    let mut found = Vec::new();
    for log in workout.exercises.iter().filter(|l| !l.sets.is_empty()) {
        let Some(before) = previous
            .iter()
            .find(|r| r.exercise == log.exercise && !r.is_empty())
        else {
            continue;
        };
        let mut now = PersonalRecords::new(log.exercise.clone());
        now.observe(
            workout.date,
            log,
            weight_input_for(exercises, &log.exercise),
        );

        for ((kind, old), (_, current)) in before.slots().into_iter().zip(now.slots()) {
            if let Some(current) = current {
                if old.map_or(true, |old| current.value > old.value) {
                    found.push(NewRecord {
                        exercise: log.exercise.clone(),
                        kind,
                        new: current,
                        previous: old,
                    });
                }
            }
        }
    }
    found
}

/// One row of an exercise's progression: a finished workout's best work.
#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseProgress {
    pub date: NaiveDate,
    pub sets: usize,
    pub top_set: Option<SetLog>,
    pub best_e1rm: Option<f64>,
    pub volume: f64,
}

/// Per-workout summary for one exercise, in the order of `history`.
pub fn exercise_progress(
    history: &[(Workout, ExerciseLog)],
    weight_input: WeightInput,
) -> Vec<ExerciseProgress> {
    history
        .iter()
        .map(|(workout, log)| {
            let top_set = log
                .sets
                .iter()
                .copied()
                .max_by(|a, b| a.weight.total_cmp(&b.weight).then(a.reps.cmp(&b.reps)));
            let best_e1rm = log
                .sets
                .iter()
                .filter_map(|s| estimate_1rm(s.weight, s.reps))
                .max_by(f64::total_cmp);
            ExerciseProgress {
                date: workout.date,
                sets: log.sets.len(),
                top_set,
                best_e1rm,
                volume: log_volume(log, weight_input),
            }
        })
        .collect()
}
