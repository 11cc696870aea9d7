// src/lib.rs
use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

// --- Declare modules ---
mod config;
mod defaults;
pub mod model;
pub mod parse;
pub mod profile;
pub mod stats;
pub mod storage;

// --- Expose public types ---
pub use config::{get_data_dir as get_data_dir_util, Config, Error as ConfigError, Units};
pub use defaults::default_exercises;
pub use model::{
    Equipment, Exercise, ExerciseLog, ExerciseType, ExerciseUpdate, MuscleGroup, SetLog,
    Template, TemplateExercise, TemplateUpdate, WeightInput, Workout, WorkoutStats,
};
pub use parse::{Error as ParseError, WeightSpec};
pub use profile::{Error as ProfileError, Profiles, DEFAULT_PROFILE};
pub use stats::{ExerciseProgress, NewRecord, PersonalRecords, RecordKind, RecordSet};
pub use storage::{Error as StorageError, Storage};

/// Violations of the workout session state machine and of in-session edits.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No active workout. Start one with 'start'.")]
    NoActiveSession,
    #[error("A workout is already in progress ({0}). Use 'done', 'cancel', or 'start --continue'.")]
    ActiveSession(String),
    #[error("Exercise '{0}' is not part of the current workout")]
    ExerciseNotInWorkout(String),
    #[error("Exercise '{0}' is already part of the current workout")]
    ExerciseAlreadyInWorkout(String),
    #[error("Set {set} of '{exercise}' does not exist")]
    SetNotFound { exercise: String, set: usize },
    #[error("There are no logged sets to undo")]
    NoSetsToUndo,
}

#[derive(Default, Debug, Clone)]
pub struct StartParams<'a> {
    pub template: Option<&'a str>,
    /// Return the active session instead of failing.
    pub resume: bool,
    /// Defaults to today (local time).
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct LogSetsParams<'a> {
    pub exercise_identifier: &'a str,
    pub weight: &'a str,
    pub reps: &'a str,
    pub rir: Option<u8>,
}

#[derive(Default, Debug, Clone)]
pub struct EditSetParams<'a> {
    pub exercise_identifier: &'a str,
    /// 1-based, as shown to the user.
    pub set_number: usize,
    pub weight: Option<&'a str>,
    pub reps: Option<u32>,
    pub rir: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct LoggedSets {
    pub exercise: Exercise,
    pub sets: Vec<SetLog>,
    /// Total sets of this exercise in the session after logging.
    pub total_sets: usize,
}

#[derive(Debug, Clone)]
pub struct FinishedWorkout {
    pub workout: Workout,
    pub records: Vec<NewRecord>,
}

/// Application service for one resolved profile. Construct it once per command
/// invocation and pass it down.
pub struct WorkoutService {
    pub config: Config,
    pub storage: Storage,
}

impl WorkoutService {
    /// Finds the data directory, resolves the profile and loads its config.
    /// # Errors
    /// Returns `anyhow::Error` if the data directory, profile or config cannot be resolved.
    pub fn initialize(explicit_profile: Option<&str>) -> Result<Self> {
        let base_dir =
            config::get_data_dir().context("Failed to determine workout data directory")?;
        Self::open(base_dir, explicit_profile)
    }

    /// # Errors
    /// Profile resolution (`ProfileError`) or config loading failures.
    pub fn open(base_dir: impl Into<PathBuf>, explicit_profile: Option<&str>) -> Result<Self> {
        let base_dir = base_dir.into();
        let profile = Profiles::new(&base_dir).resolve(explicit_profile)?;
        log::debug!("Using profile '{profile}' in {}", base_dir.display());
        Self::new(Storage::new(base_dir, profile))
    }

    /// # Errors
    /// Returns `StorageError` if the profile config is malformed.
    pub fn new(storage: Storage) -> Result<Self> {
        let config = storage
            .get_config()
            .with_context(|| format!("Failed to load config for profile '{}'", storage.profile()))?;
        Ok(Self { config, storage })
    }

    pub fn profile(&self) -> &str {
        self.storage.profile()
    }

    pub fn data_dir(&self) -> &Path {
        self.storage.base_dir()
    }

    pub fn config_path(&self) -> PathBuf {
        self.storage.config_path()
    }

    /// # Errors
    /// Returns `StorageError` if saving fails.
    pub fn set_units(&mut self, units: Units) -> Result<(), StorageError> {
        self.config.units = units;
        self.storage.save_config(&self.config)
    }

    // --- Exercise library ---

    /// Resolves an id or alias to its exercise.
    /// # Errors
    /// `StorageError::ExerciseNotFound` if nothing matches.
    pub fn resolve_exercise(&self, identifier: &str) -> Result<Exercise> {
        let trimmed = identifier.trim();
        if trimmed.is_empty() {
            bail!("Exercise identifier cannot be empty.");
        }
        self.storage
            .get_exercise(trimmed)?
            .ok_or_else(|| StorageError::ExerciseNotFound(trimmed.to_string()).into())
    }

    /// # Errors
    /// Returns `anyhow::Error` wrapping storage errors.
    pub fn list_exercises(
        &self,
        muscle: Option<MuscleGroup>,
        type_: Option<ExerciseType>,
    ) -> Result<Vec<Exercise>> {
        let exercises = self
            .storage
            .get_exercises()
            .context("Failed to load exercise library")?;
        Ok(exercises
            .into_iter()
            .filter(|e| muscle.map_or(true, |m| e.muscles.contains(&m)))
            .filter(|e| type_.map_or(true, |t| e.type_ == t))
            .collect())
    }

    /// # Errors
    /// `ExerciseAlreadyExists`, `AliasConflict` or `SchemaValidation`.
    pub fn create_exercise(&self, exercise: Exercise) -> Result<Exercise> {
        self.storage.add_exercise(exercise).map_err(Into::into)
    }

    /// # Errors
    /// `ExerciseNotFound`, `AliasConflict` or `SchemaValidation`.
    pub fn edit_exercise(&self, identifier: &str, update: ExerciseUpdate) -> Result<Exercise> {
        let current = self.resolve_exercise(identifier)?;
        self.storage
            .update_exercise(&current.id, update)
            .map_err(Into::into)
    }

    /// Past workouts keep their references to the deleted id.
    /// # Errors
    /// `ExerciseNotFound` if the identifier does not resolve.
    pub fn delete_exercise(&self, identifier: &str) -> Result<Exercise> {
        let current = self.resolve_exercise(identifier)?;
        self.storage
            .delete_exercise(&current.id)
            .map_err(Into::into)
    }

    // --- Templates ---

    /// # Errors
    /// Returns `anyhow::Error` wrapping storage errors.
    pub fn list_templates(&self) -> Result<Vec<Template>> {
        self.storage
            .get_templates()
            .context("Failed to load templates")
    }

    /// # Errors
    /// `StorageError::TemplateNotFound` if absent.
    pub fn get_template(&self, id: &str) -> Result<Template> {
        self.storage
            .get_template(id)?
            .ok_or_else(|| StorageError::TemplateNotFound(id.to_string()).into())
    }

    /// Template entries may name exercises by alias; they are stored by id.
    /// # Errors
    /// `ExerciseNotFound` for an unknown exercise, `TemplateAlreadyExists`,
    /// or `SchemaValidation`.
    pub fn create_template(&self, mut template: Template) -> Result<Template> {
        template.exercises = self.canonical_template_entries(template.exercises)?;
        self.storage.add_template(template).map_err(Into::into)
    }

    /// # Errors
    /// `TemplateNotFound`, `ExerciseNotFound` or `SchemaValidation`.
    pub fn edit_template(&self, id: &str, mut update: TemplateUpdate) -> Result<Template> {
        if let Some(entries) = update.exercises.take() {
            update.exercises = Some(self.canonical_template_entries(entries)?);
        }
        self.storage
            .update_template(id, update)
            .map_err(Into::into)
    }

    /// # Errors
    /// `TemplateNotFound` if absent.
    pub fn delete_template(&self, id: &str) -> Result<Template> {
        self.storage.delete_template(id).map_err(Into::into)
    }

    fn canonical_template_entries(
        &self,
        entries: Vec<TemplateExercise>,
    ) -> Result<Vec<TemplateExercise>> {
        entries
            .into_iter()
            .map(|mut entry| {
                entry.exercise = self.resolve_exercise(&entry.exercise)?.id;
                Ok(entry)
            })
            .collect()
    }

    // --- Workout session ---

    /// The active session, if any. A session left behind by an interrupted
    /// `done` (its finished record already exists) is cleared here.
    /// # Errors
    /// Returns `StorageError::SchemaValidation` if `current.json` is malformed.
    pub fn current_workout(&self) -> Result<Option<Workout>> {
        let Some(current) = self.storage.get_current_workout()? else {
            return Ok(None);
        };
        if let Some(finished) = self.storage.get_workout(current.date)? {
            if finished.start_time == current.start_time && finished.id == current.id {
                log::warn!(
                    "Current workout '{}' was already finished; clearing the leftover session",
                    current.id
                );
                self.storage.clear_current_workout()?;
                return Ok(None);
            }
        }
        Ok(Some(current))
    }

    fn require_current(&self) -> Result<Workout> {
        self.current_workout()?
            .ok_or_else(|| SessionError::NoActiveSession.into())
    }

    /// # Errors
    /// - `SessionError::ActiveSession` if a session is open and `resume` is false.
    /// - `StorageError::TemplateNotFound` for an unknown template.
    pub fn start_workout(&self, params: StartParams) -> Result<Workout> {
        if let Some(current) = self.current_workout()? {
            if params.resume {
                return Ok(current);
            }
            bail!(SessionError::ActiveSession(current.id));
        }

        let template = params.template.map(|id| self.get_template(id)).transpose()?;
        let date = params.date.unwrap_or_else(|| Local::now().date_naive());
        let workout = Workout::begin(date, template.as_ref(), Utc::now());
        self.storage
            .save_current_workout(&workout)
            .context("Failed to save new workout")?;
        log::info!("Started workout '{}'", workout.id);
        Ok(workout)
    }

    /// Logs one set per entry of `reps` at the parsed weight.
    /// # Errors
    /// `NoActiveSession`, `ExerciseNotFound`, or `ParseError` for malformed input.
    pub fn log_sets(&self, params: LogSetsParams) -> Result<LoggedSets> {
        let mut workout = self.require_current()?;
        let exercise = self.resolve_exercise(params.exercise_identifier)?;
        let weight_spec: WeightSpec = params.weight.parse()?;
        let reps = parse::parse_reps(params.reps)?;
        let rir = parse::validate_rir(params.rir)?;

        let base = if weight_spec.is_relative() {
            self.last_weight(&workout, &exercise.id)?
        } else {
            None
        };
        let weight = weight_spec.resolve(base)?;

        let sets: Vec<SetLog> = reps
            .into_iter()
            .map(|r| SetLog {
                weight,
                reps: r,
                rir,
            })
            .collect();

        if workout.log_for(&exercise.id).is_none() {
            workout.exercises.push(ExerciseLog::new(exercise.id.clone()));
        }
        let total_sets = {
            let log = workout
                .log_for_mut(&exercise.id)
                .context("Exercise log vanished while logging")?;
            log.sets.extend(sets.iter().copied());
            log.sets.len()
        };
        self.storage.save_current_workout(&workout)?;

        Ok(LoggedSets {
            exercise,
            sets,
            total_sets,
        })
    }

    /// Last weight used: this session first, then the most recent finished workout.
    fn last_weight(&self, workout: &Workout, exercise_id: &str) -> Result<Option<f64>> {
        if let Some(set) = workout.log_for(exercise_id).and_then(|l| l.sets.last()) {
            return Ok(Some(set.weight));
        }
        let history = self.storage.get_exercise_history(exercise_id)?;
        Ok(history
            .iter()
            .find_map(|(_, log)| log.sets.last())
            .map(|s| s.weight))
    }

    /// Maps an identifier to the exercise id as logged in `workout`. Ids no
    /// longer in the library still match literally.
    fn exercise_in_workout(&self, workout: &Workout, identifier: &str) -> Result<String> {
        let trimmed = identifier.trim();
        if workout.log_for(trimmed).is_some() {
            return Ok(trimmed.to_string());
        }
        match self.storage.get_exercise(trimmed)? {
            Some(exercise) if workout.log_for(&exercise.id).is_some() => Ok(exercise.id),
            _ => bail!(SessionError::ExerciseNotInWorkout(trimmed.to_string())),
        }
    }

    /// Adds a note to the workout, or to one exercise's log.
    /// # Errors
    /// `NoActiveSession` or `ExerciseNotInWorkout`.
    pub fn add_note(&self, text: &str, exercise_identifier: Option<&str>) -> Result<Workout> {
        let text = text.trim();
        if text.is_empty() {
            bail!("Note text cannot be empty.");
        }
        let mut workout = self.require_current()?;
        match exercise_identifier {
            Some(identifier) => {
                let id = self.exercise_in_workout(&workout, identifier)?;
                if let Some(log) = workout.log_for_mut(&id) {
                    log.add_note(text);
                }
            }
            None => workout.notes.push(text.to_string()),
        }
        self.storage.save_current_workout(&workout)?;
        Ok(workout)
    }

    /// Adds an exercise with no sets yet.
    /// # Errors
    /// `NoActiveSession`, `ExerciseNotFound` or `ExerciseAlreadyInWorkout`.
    pub fn add_exercise_to_workout(&self, identifier: &str) -> Result<Exercise> {
        let mut workout = self.require_current()?;
        let exercise = self.resolve_exercise(identifier)?;
        if workout.log_for(&exercise.id).is_some() {
            bail!(SessionError::ExerciseAlreadyInWorkout(exercise.id));
        }
        workout.exercises.push(ExerciseLog::new(exercise.id.clone()));
        self.storage.save_current_workout(&workout)?;
        Ok(exercise)
    }

    /// Replaces an exercise in the session, keeping its position and sets.
    /// # Errors
    /// `NoActiveSession`, `ExerciseNotInWorkout`, `ExerciseNotFound` or
    /// `ExerciseAlreadyInWorkout`.
    pub fn swap_exercise(&self, old_identifier: &str, new_identifier: &str) -> Result<Exercise> {
        let mut workout = self.require_current()?;
        let old_id = self.exercise_in_workout(&workout, old_identifier)?;
        let replacement = self.resolve_exercise(new_identifier)?;
        if workout.log_for(&replacement.id).is_some() {
            bail!(SessionError::ExerciseAlreadyInWorkout(replacement.id));
        }
        if let Some(log) = workout.log_for_mut(&old_id) {
            log.exercise = replacement.id.clone();
        }
        self.storage.save_current_workout(&workout)?;
        Ok(replacement)
    }

    /// Removes the most recent set of an exercise, or of the last exercise
    /// (in workout order) that has sets.
    /// # Errors
    /// `NoActiveSession`, `ExerciseNotInWorkout` or `NoSetsToUndo`.
    pub fn undo_set(&self, exercise_identifier: Option<&str>) -> Result<(String, SetLog)> {
        let mut workout = self.require_current()?;
        let exercise_id = match exercise_identifier {
            Some(identifier) => self.exercise_in_workout(&workout, identifier)?,
            None => workout
                .exercises
                .iter()
                .rev()
                .find(|l| !l.sets.is_empty())
                .map(|l| l.exercise.clone())
                .ok_or(SessionError::NoSetsToUndo)?,
        };
        let removed = workout
            .log_for_mut(&exercise_id)
            .and_then(|l| l.sets.pop())
            .ok_or(SessionError::NoSetsToUndo)?;
        self.storage.save_current_workout(&workout)?;
        Ok((exercise_id, removed))
    }

    /// Edits one logged set. A relative weight is applied to the set's own weight.
    /// # Errors
    /// `NoActiveSession`, `ExerciseNotInWorkout`, `SetNotFound` or `ParseError`.
    pub fn edit_set(&self, params: EditSetParams) -> Result<SetLog> {
        let mut workout = self.require_current()?;
        let exercise_id = self.exercise_in_workout(&workout, params.exercise_identifier)?;
        let weight_spec = params.weight.map(str::parse::<WeightSpec>).transpose()?;
        let rir = parse::validate_rir(params.rir)?;
        if params.reps == Some(0) {
            bail!(ParseError::InvalidReps("0".to_string()));
        }

        let set = workout
            .log_for_mut(&exercise_id)
            .and_then(|l| l.sets.get_mut(params.set_number.wrapping_sub(1)))
            .ok_or_else(|| SessionError::SetNotFound {
                exercise: exercise_id.clone(),
                set: params.set_number,
            })?;
        if let Some(spec) = weight_spec {
            set.weight = spec.resolve(Some(set.weight))?;
        }
        if let Some(reps) = params.reps {
            set.reps = reps;
        }
        if rir.is_some() {
            set.rir = rir;
        }
        let edited = *set;
        self.storage.save_current_workout(&workout)?;
        Ok(edited)
    }

    /// Deletes one set (1-based) or, without a set number, the whole exercise.
    /// # Errors
    /// `NoActiveSession`, `ExerciseNotInWorkout` or `SetNotFound`.
    pub fn delete_from_workout(&self, identifier: &str, set_number: Option<usize>) -> Result<()> {
        let mut workout = self.require_current()?;
        let exercise_id = self.exercise_in_workout(&workout, identifier)?;
        match set_number {
            Some(number) => {
                let log = workout
                    .log_for_mut(&exercise_id)
                    .context("Exercise log vanished while deleting")?;
                if number == 0 || number > log.sets.len() {
                    bail!(SessionError::SetNotFound {
                        exercise: exercise_id,
                        set: number,
                    });
                }
                log.sets.remove(number - 1);
            }
            None => workout.exercises.retain(|l| l.exercise != exercise_id),
        }
        self.storage.save_current_workout(&workout)?;
        Ok(())
    }

    /// Stamps the end time and stats, stores the workout under its date and
    /// clears the session. Reports personal records beaten by this workout.
    /// # Errors
    /// `NoActiveSession` or storage failures.
    pub fn finish_workout(&self) -> Result<FinishedWorkout> {
        let mut workout = self.require_current()?;
        let exercises = self.storage.get_exercises()?;
        let history = self.storage.get_all_workouts()?;

        let previous: Vec<PersonalRecords> = workout
            .exercises
            .iter()
            .map(|log| {
                let weight_input = storage::find_exercise(&exercises, &log.exercise)
                    .map_or(WeightInput::Total, |e| e.weight_input);
                stats::personal_records(
                    &log.exercise,
                    &history_for(&history, &log.exercise),
                    weight_input,
                )
            })
            .collect();

        workout.end_time = Some(Utc::now().max(workout.start_time));
        workout.stats = Some(stats::compute_workout_stats(&workout, &exercises));
        self.storage
            .finish_workout(&workout)
            .with_context(|| format!("Failed to store finished workout '{}'", workout.id))?;
        log::info!("Finished workout '{}'", workout.id);

        let records = stats::new_records(&workout, &previous, &exercises);
        Ok(FinishedWorkout { workout, records })
    }

    /// Discards the session without storing it.
    /// # Errors
    /// `NoActiveSession` if nothing is in progress.
    pub fn cancel_workout(&self) -> Result<Workout> {
        let workout = self.require_current()?;
        self.storage.clear_current_workout()?;
        log::info!("Cancelled workout '{}'", workout.id);
        Ok(workout)
    }

    // --- History ---

    /// Finished workouts, newest first.
    /// # Errors
    /// Returns `anyhow::Error` wrapping storage errors.
    pub fn list_workouts(&self, limit: Option<usize>) -> Result<Vec<Workout>> {
        let mut workouts = self
            .storage
            .get_all_workouts()
            .context("Failed to load workout history")?;
        if let Some(limit) = limit {
            workouts.truncate(limit);
        }
        Ok(workouts)
    }

    /// # Errors
    /// Returns `anyhow::Error` wrapping storage errors.
    pub fn last_workout(&self) -> Result<Option<Workout>> {
        self.storage.get_last_workout().map_err(Into::into)
    }

    /// # Errors
    /// `ExerciseNotFound` or storage errors.
    pub fn exercise_history(
        &self,
        identifier: &str,
        limit: Option<usize>,
    ) -> Result<(Exercise, Vec<ExerciseProgress>)> {
        let exercise = self.resolve_exercise(identifier)?;
        let mut history = self.storage.get_exercise_history(&exercise.id)?;
        if let Some(limit) = limit {
            history.truncate(limit);
        }
        let progress = stats::exercise_progress(&history, exercise.weight_input);
        Ok((exercise, progress))
    }

    /// # Errors
    /// `ExerciseNotFound` or storage errors.
    pub fn personal_records(&self, identifier: &str) -> Result<PersonalRecords> {
        let exercise = self.resolve_exercise(identifier)?;
        let history = self.storage.get_exercise_history(&exercise.id)?;
        Ok(stats::personal_records(
            &exercise.id,
            &history,
            exercise.weight_input,
        ))
    }

    /// Records for every exercise that appears in history.
    /// # Errors
    /// Returns `anyhow::Error` wrapping storage errors.
    pub fn all_personal_records(&self) -> Result<Vec<PersonalRecords>> {
        let exercises = self.storage.get_exercises()?;
        let history = self.storage.get_all_workouts()?;

        let mut ids: Vec<&str> = Vec::new();
        for log in history.iter().flat_map(|w| w.exercises.iter()) {
            if !ids.contains(&log.exercise.as_str()) {
                ids.push(&log.exercise);
            }
        }
        ids.sort_unstable();

        Ok(ids
            .into_iter()
            .map(|id| {
                let weight_input = storage::find_exercise(&exercises, id)
                    .map_or(WeightInput::Total, |e| e.weight_input);
                stats::personal_records(id, &history_for(&history, id), weight_input)
            })
            .filter(|r| !r.is_empty())
            .collect())
    }
}

/// Workouts containing the exercise paired with its log, preserving order.
fn history_for(workouts: &[Workout], exercise_id: &str) -> Vec<(Workout, ExerciseLog)> {
    workouts
        .iter()
        .filter_map(|w| w.log_for(exercise_id).map(|l| (w.clone(), l.clone())))
        .collect()
}
