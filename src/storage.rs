//src/storage.rs
//! Profile-scoped JSON persistence.
//!
//! ```text
//! <base>/exercises.json                     # shared across profiles
//! <base>/profiles/<name>/config.json
//! <base>/profiles/<name>/templates.json
//! <base>/profiles/<name>/current.json       # absent when no active session
//! <base>/profiles/<name>/workouts/<date>.json
//! ```
//!
//! Every document is validated when read and before it is written. There is
//! no file locking: two processes writing the same profile race, last write wins.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::Config;
use crate::defaults;
use crate::model::{
    Exercise, ExerciseLog, ExerciseUpdate, Template, TemplateUpdate, Validate, Workout,
};

pub const PROFILES_DIR: &str = "profiles";
pub const EXERCISES_FILE: &str = "exercises.json";
pub const CONFIG_FILE: &str = "config.json";
pub const TEMPLATES_FILE: &str = "templates.json";
pub const CURRENT_FILE: &str = "current.json";
pub const WORKOUTS_DIR: &str = "workouts";

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Schema validation failed for {path:?}: {reason}")]
    SchemaValidation { path: PathBuf, reason: String },
    #[error("Exercise not found: {0}")]
    ExerciseNotFound(String),
    #[error("Exercise already exists: {0}")]
    ExerciseAlreadyExists(String),
    #[error("Alias '{alias}' conflicts with exercise '{existing}'")]
    AliasConflict { alias: String, existing: String },
    #[error("Template not found: {0}")]
    TemplateNotFound(String),
    #[error("Template already exists: {0}")]
    TemplateAlreadyExists(String),
    #[error("Workout '{0}' has no end time and cannot be stored as finished")]
    WorkoutNotFinished(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Storage handle for one profile. The exercise library lives at the base
/// directory and is shared by every profile.
#[derive(Debug, Clone)]
pub struct Storage {
    base_dir: PathBuf,
    profile: String,
}

impl Storage {
    pub fn new(base_dir: impl Into<PathBuf>, profile: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            profile: profile.into(),
        }
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn profile_dir(&self) -> PathBuf {
        self.base_dir.join(PROFILES_DIR).join(&self.profile)
    }

    pub fn exercises_path(&self) -> PathBuf {
        self.base_dir.join(EXERCISES_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.profile_dir().join(CONFIG_FILE)
    }

    pub fn templates_path(&self) -> PathBuf {
        self.profile_dir().join(TEMPLATES_FILE)
    }

    pub fn current_path(&self) -> PathBuf {
        self.profile_dir().join(CURRENT_FILE)
    }

    pub fn workouts_dir(&self) -> PathBuf {
        self.profile_dir().join(WORKOUTS_DIR)
    }

    pub fn workout_path(&self, date: NaiveDate) -> PathBuf {
        self.workouts_dir()
            .join(format!("{}.json", date.format("%Y-%m-%d")))
    }

    fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(self.workouts_dir())?;
        Ok(())
    }

    // --- Config ---

    /// # Errors
    /// `SchemaValidation` if `config.json` does not parse; I/O errors otherwise.
    pub fn get_config(&self) -> Result<Config> {
        self.ensure_dirs()?;
        load_or_seed(&self.config_path(), Config::default)
    }

    /// # Errors
    /// I/O or serialization errors.
    pub fn save_config(&self, config: &Config) -> Result<()> {
        self.ensure_dirs()?;
        write_document(&self.config_path(), config)
    }

    // --- Exercises (shared library) ---

    /// Loads the exercise library, seeding the built-in list on first use.
    /// # Errors
    /// `SchemaValidation` if the library is malformed or has duplicate ids.
    pub fn get_exercises(&self) -> Result<Vec<Exercise>> {
        fs::create_dir_all(&self.base_dir)?;
        let path = self.exercises_path();
        let exercises: Vec<Exercise> = load_or_seed(&path, defaults::default_exercises)?;
        check_unique_ids(&path, exercises.iter().map(|e| e.id.as_str()))?;
        Ok(exercises)
    }

    fn save_exercises(&self, exercises: &[Exercise]) -> Result<()> {
        let path = self.exercises_path();
        check_unique_ids(&path, exercises.iter().map(|e| e.id.as_str()))?;
        write_document(&path, exercises)
    }

    /// Looks up by id first, then by alias (case-insensitive).
    /// # Errors
    /// Errors loading the library.
    pub fn get_exercise(&self, identifier: &str) -> Result<Option<Exercise>> {
        let exercises = self.get_exercises()?;
        Ok(find_exercise(&exercises, identifier).cloned())
    }

    /// # Errors
    /// - `ExerciseAlreadyExists` if the id is taken.
    /// - `AliasConflict` if an alias collides with another exercise's id or alias.
    /// - `SchemaValidation` if the exercise is invalid.
    pub fn add_exercise(&self, exercise: Exercise) -> Result<Exercise> {
        let mut exercises = self.get_exercises()?;
        if exercises.iter().any(|e| e.id == exercise.id) {
            return Err(Error::ExerciseAlreadyExists(exercise.id));
        }
        validate_at(&self.exercises_path(), &exercise)?;
        check_alias_conflicts(&exercises, &exercise)?;
        exercises.push(exercise.clone());
        self.save_exercises(&exercises)?;
        log::debug!("Added exercise '{}'", exercise.id);
        Ok(exercise)
    }

    /// Applies `update` over the stored record and revalidates the result.
    /// # Errors
    /// `ExerciseNotFound`, `AliasConflict` or `SchemaValidation`.
    pub fn update_exercise(&self, id: &str, update: ExerciseUpdate) -> Result<Exercise> {
        let mut exercises = self.get_exercises()?;
        let index = exercises
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| Error::ExerciseNotFound(id.to_string()))?;
        let mut updated = exercises[index].clone();
        update.apply_to(&mut updated);
        validate_at(&self.exercises_path(), &updated)?;
        check_alias_conflicts(&exercises, &updated)?;
        exercises[index] = updated.clone();
        self.save_exercises(&exercises)?;
        Ok(updated)
    }

    /// # Errors
    /// `ExerciseNotFound` if no exercise has this id.
    pub fn delete_exercise(&self, id: &str) -> Result<Exercise> {
        let mut exercises = self.get_exercises()?;
        let index = exercises
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| Error::ExerciseNotFound(id.to_string()))?;
        let removed = exercises.remove(index);
        self.save_exercises(&exercises)?;
        Ok(removed)
    }

    // --- Templates ---

    /// # Errors
    /// `SchemaValidation` if malformed or ids repeat.
    pub fn get_templates(&self) -> Result<Vec<Template>> {
        self.ensure_dirs()?;
        let path = self.templates_path();
        let templates: Vec<Template> = load_or_seed(&path, Vec::new)?;
        check_unique_ids(&path, templates.iter().map(|t| t.id.as_str()))?;
        Ok(templates)
    }

    fn save_templates(&self, templates: &[Template]) -> Result<()> {
        let path = self.templates_path();
        check_unique_ids(&path, templates.iter().map(|t| t.id.as_str()))?;
        write_document(&path, templates)
    }

    /// # Errors
    /// Errors loading templates.
    pub fn get_template(&self, id: &str) -> Result<Option<Template>> {
        Ok(self.get_templates()?.into_iter().find(|t| t.id == id))
    }

    /// # Errors
    /// `TemplateAlreadyExists` or `SchemaValidation`.
    pub fn add_template(&self, template: Template) -> Result<Template> {
        let mut templates = self.get_templates()?;
        if templates.iter().any(|t| t.id == template.id) {
            return Err(Error::TemplateAlreadyExists(template.id));
        }
        validate_at(&self.templates_path(), &template)?;
        templates.push(template.clone());
        self.save_templates(&templates)?;
        Ok(template)
    }

    /// # Errors
    /// `TemplateNotFound` or `SchemaValidation` for the merged record.
    pub fn update_template(&self, id: &str, update: TemplateUpdate) -> Result<Template> {
        let mut templates = self.get_templates()?;
        let index = templates
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Error::TemplateNotFound(id.to_string()))?;
        let mut updated = templates[index].clone();
        update.apply_to(&mut updated);
        validate_at(&self.templates_path(), &updated)?;
        templates[index] = updated.clone();
        self.save_templates(&templates)?;
        Ok(updated)
    }

    /// # Errors
    /// `TemplateNotFound` if absent.
    pub fn delete_template(&self, id: &str) -> Result<Template> {
        let mut templates = self.get_templates()?;
        let index = templates
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Error::TemplateNotFound(id.to_string()))?;
        let removed = templates.remove(index);
        self.save_templates(&templates)?;
        Ok(removed)
    }

    // --- Current session ---

    /// `None` is the normal "no active workout" state.
    /// # Errors
    /// `SchemaValidation` if `current.json` is malformed.
    pub fn get_current_workout(&self) -> Result<Option<Workout>> {
        self.ensure_dirs()?;
        let path = self.current_path();
        if !path.exists() {
            return Ok(None);
        }
        read_document(&path).map(Some)
    }

    /// # Errors
    /// I/O or validation errors.
    pub fn save_current_workout(&self, workout: &Workout) -> Result<()> {
        self.ensure_dirs()?;
        write_document(&self.current_path(), workout)
    }

    /// No-op if there is no current session.
    /// # Errors
    /// I/O errors removing the file.
    pub fn clear_current_workout(&self) -> Result<()> {
        match fs::remove_file(self.current_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    // --- Finished workouts ---

    /// Writes the workout under its date, then clears the current session.
    /// A workout already stored for that date is overwritten.
    /// # Errors
    /// `WorkoutNotFinished` if `end_time` is unset; I/O or validation errors.
    pub fn finish_workout(&self, workout: &Workout) -> Result<()> {
        if workout.end_time.is_none() {
            return Err(Error::WorkoutNotFinished(workout.id.clone()));
        }
        self.ensure_dirs()?;
        let path = self.workout_path(workout.date);
        if path.exists() {
            log::warn!(
                "Overwriting finished workout for {} in profile '{}'",
                workout.date,
                self.profile
            );
        }
        write_document(&path, workout)?;
        self.clear_current_workout()
    }

    /// # Errors
    /// `SchemaValidation` if the stored file is malformed.
    pub fn get_workout(&self, date: NaiveDate) -> Result<Option<Workout>> {
        let path = self.workout_path(date);
        if !path.exists() {
            return Ok(None);
        }
        read_document(&path).map(Some)
    }

    /// All finished workouts, newest date first.
    /// # Errors
    /// `SchemaValidation` if any stored workout is malformed.
    pub fn get_all_workouts(&self) -> Result<Vec<Workout>> {
        self.ensure_dirs()?;
        let mut workouts = Vec::new();
        for entry in fs::read_dir(self.workouts_dir())? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            workouts.push(read_document::<Workout>(&path)?);
        }
        workouts.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(workouts)
    }

    /// # Errors
    /// See [`Storage::get_all_workouts`].
    pub fn get_last_workout(&self) -> Result<Option<Workout>> {
        Ok(self.get_all_workouts()?.into_iter().next())
    }

    /// Finished workouts containing `exercise_id`, newest first, each paired
    /// with its first log for that exercise.
    /// # Errors
    /// See [`Storage::get_all_workouts`].
    pub fn get_exercise_history(&self, exercise_id: &str) -> Result<Vec<(Workout, ExerciseLog)>> {
        Ok(self
            .get_all_workouts()?
            .into_iter()
            .filter_map(|w| {
                let log = w.log_for(exercise_id).cloned()?;
                Some((w, log))
            })
            .collect())
    }
}

/// Id match first, then the first exercise carrying the alias. Both ignore ASCII case.
pub fn find_exercise<'a>(exercises: &'a [Exercise], identifier: &str) -> Option<&'a Exercise> {
    let identifier = identifier.trim();
    exercises
        .iter()
        .find(|e| e.id.eq_ignore_ascii_case(identifier))
        .or_else(|| exercises.iter().find(|e| e.has_alias(identifier)))
}

fn check_alias_conflicts(library: &[Exercise], candidate: &Exercise) -> Result<()> {
    let mut seen = HashSet::new();
    for alias in &candidate.aliases {
        if alias.eq_ignore_ascii_case(&candidate.id) || !seen.insert(alias.to_ascii_lowercase()) {
            return Err(Error::AliasConflict {
                alias: alias.clone(),
                existing: candidate.id.clone(),
            });
        }
    }
    for other in library.iter().filter(|e| e.id != candidate.id) {
        if let Some(alias) = candidate
            .aliases
            .iter()
            .find(|a| other.id.eq_ignore_ascii_case(a) || other.has_alias(a))
        {
            return Err(Error::AliasConflict {
                alias: alias.clone(),
                existing: other.id.clone(),
            });
        }
        if other.has_alias(&candidate.id) {
            return Err(Error::AliasConflict {
                alias: candidate.id.clone(),
                existing: other.id.clone(),
            });
        }
    }
    Ok(())
}

fn check_unique_ids<'a>(path: &Path, ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(Error::SchemaValidation {
                path: path.to_path_buf(),
                reason: format!("duplicate id '{id}'"),
            });
        }
    }
    Ok(())
}

fn validate_at<T: Validate + ?Sized>(path: &Path, value: &T) -> Result<()> {
    value.validate().map_err(|reason| Error::SchemaValidation {
        path: path.to_path_buf(),
        reason,
    })
}

fn read_document<T: DeserializeOwned + Validate>(path: &Path) -> Result<T> {
    log::debug!("Reading {}", path.display());
    let content = fs::read_to_string(path)?;
    let value: T = serde_json::from_str(&content).map_err(|e| Error::SchemaValidation {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    validate_at(path, &value)?;
    Ok(value)
}

/// Pretty-printed (2-space) JSON, written to a sibling temp file and renamed
/// into place.
fn write_document<T: Serialize + Validate + ?Sized>(path: &Path, value: &T) -> Result<()> {
    validate_at(path, value)?;
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

fn load_or_seed<T, F>(path: &Path, seed: F) -> Result<T>
where
    T: Serialize + DeserializeOwned + Validate,
    F: FnOnce() -> T,
{
    if path.exists() {
        return read_document(path);
    }
    let value = seed();
    log::debug!("Seeding {}", path.display());
    write_document(path, &value)?;
    Ok(value)
}
