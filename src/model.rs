// src/model.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Muscle group tags an exercise can target.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum MuscleGroup {
    Chest,
    Back,
    Lats,
    Traps,
    Shoulders,
    RearDelts,
    Biceps,
    Triceps,
    Forearms,
    Core,
    Quads,
    Hamstrings,
    Glutes,
    Calves,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExerciseType {
    Compound,
    Isolation,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Equipment {
    Barbell,
    Dumbbell,
    Cable,
    Machine,
    Bodyweight,
    Kettlebell,
    Band,
    Other,
}

/// How the logged weight relates to the load actually moved.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum WeightInput {
    #[default]
    Total,
    /// Weight is per side of a symmetric apparatus; doubled for volume.
    PerSide,
}

impl WeightInput {
    pub const fn volume_multiplier(self) -> f64 {
        match self {
            Self::Total => 1.0,
            Self::PerSide => 2.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub muscles: Vec<MuscleGroup>,
    #[serde(rename = "type")]
    pub type_: ExerciseType,
    pub equipment: Equipment,
    #[serde(default)]
    pub weight_input: WeightInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Exercise {
    pub fn has_alias(&self, alias: &str) -> bool {
        self.aliases.iter().any(|a| a.eq_ignore_ascii_case(alias))
    }
}

/// Partial update for an exercise. `None` leaves the field untouched.
#[derive(Default, Debug, Clone)]
pub struct ExerciseUpdate {
    pub name: Option<String>,
    pub aliases: Option<Vec<String>>,
    pub muscles: Option<Vec<MuscleGroup>>,
    pub type_: Option<ExerciseType>,
    pub equipment: Option<Equipment>,
    pub weight_input: Option<WeightInput>,
    /// `Some(None)` clears the notes.
    pub notes: Option<Option<String>>,
}

impl ExerciseUpdate {
    pub fn apply_to(self, exercise: &mut Exercise) {
        if let Some(name) = self.name {
            exercise.name = name;
        }
        if let Some(aliases) = self.aliases {
            exercise.aliases = aliases;
        }
        if let Some(muscles) = self.muscles {
            exercise.muscles = muscles;
        }
        if let Some(type_) = self.type_ {
            exercise.type_ = type_;
        }
        if let Some(equipment) = self.equipment {
            exercise.equipment = equipment;
        }
        if let Some(weight_input) = self.weight_input {
            exercise.weight_input = weight_input;
        }
        if let Some(notes) = self.notes {
            exercise.notes = notes;
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateExercise {
    pub exercise: String,
    pub sets: u32,
    /// Free text rep target such as "8-12".
    pub reps: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub exercises: Vec<TemplateExercise>,
}

#[derive(Default, Debug, Clone)]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub exercises: Option<Vec<TemplateExercise>>,
}

impl TemplateUpdate {
    pub fn apply_to(self, template: &mut Template) {
        if let Some(name) = self.name {
            template.name = name;
        }
        if let Some(exercises) = self.exercises {
            template.exercises = exercises;
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetLog {
    pub weight: f64,
    pub reps: u32,
    pub rir: Option<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseLog {
    pub exercise: String,
    pub sets: Vec<SetLog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ExerciseLog {
    pub fn new(exercise: impl Into<String>) -> Self {
        Self {
            exercise: exercise.into(),
            sets: Vec::new(),
            notes: None,
        }
    }

    /// Appends to the note, joining repeated notes with "; ".
    pub fn add_note(&mut self, note: &str) {
        self.notes = Some(match self.notes.take() {
            Some(existing) if !existing.is_empty() => format!("{existing}; {note}"),
            _ => note.to_string(),
        });
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutStats {
    pub total_sets: u32,
    pub total_volume: f64,
    pub muscles_worked: Vec<MuscleGroup>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: String,
    pub date: NaiveDate,
    pub template: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub exercises: Vec<ExerciseLog>,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<WorkoutStats>,
}

impl Workout {
    /// Starts a new, empty session. The id is `{date}-{template}` or
    /// `{date}-freestyle`.
    pub fn begin(date: NaiveDate, template: Option<&Template>, start_time: DateTime<Utc>) -> Self {
        let id = format!(
            "{}-{}",
            date.format("%Y-%m-%d"),
            template.map_or("freestyle", |t| t.id.as_str())
        );
        let exercises = template
            .map(|t| {
                t.exercises
                    .iter()
                    .map(|te| ExerciseLog::new(te.exercise.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            id,
            date,
            template: template.map(|t| t.id.clone()),
            start_time,
            end_time: None,
            exercises,
            notes: Vec::new(),
            stats: None,
        }
    }

    /// First log for the exercise. A workout holds at most one log per exercise.
    pub fn log_for(&self, exercise_id: &str) -> Option<&ExerciseLog> {
        self.exercises.iter().find(|l| l.exercise == exercise_id)
    }

    pub fn log_for_mut(&mut self, exercise_id: &str) -> Option<&mut ExerciseLog> {
        self.exercises.iter_mut().find(|l| l.exercise == exercise_id)
    }

    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|l| l.sets.len()).sum()
    }
}

/// Value constraints checked after a document has been parsed into its typed
/// shape, and again before it is written.
pub trait Validate {
    /// # Errors
    /// Returns a human readable reason describing the first violated rule.
    fn validate(&self) -> Result<(), String>;
}

/// Lowercase alphanumeric segments separated by single hyphens.
pub fn is_slug(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('-')
        && !s.ends_with('-')
        && !s.contains("--")
        && s.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

impl Validate for Exercise {
    fn validate(&self) -> Result<(), String> {
        if !is_slug(&self.id) {
            return Err(format!(
                "exercise id '{}' must be lowercase alphanumeric with hyphens",
                self.id
            ));
        }
        if self.name.trim().is_empty() {
            return Err(format!("exercise '{}' has an empty name", self.id));
        }
        if self.muscles.is_empty() {
            return Err(format!("exercise '{}' must target at least one muscle", self.id));
        }
        if self.aliases.iter().any(|a| a.trim().is_empty()) {
            return Err(format!("exercise '{}' has an empty alias", self.id));
        }
        Ok(())
    }
}

impl Validate for Template {
    fn validate(&self) -> Result<(), String> {
        if !is_slug(&self.id) {
            return Err(format!(
                "template id '{}' must be lowercase alphanumeric with hyphens",
                self.id
            ));
        }
        if self.name.trim().is_empty() {
            return Err(format!("template '{}' has an empty name", self.id));
        }
        for entry in &self.exercises {
            if entry.exercise.trim().is_empty() {
                return Err(format!("template '{}' references an empty exercise id", self.id));
            }
            if entry.sets == 0 {
                return Err(format!(
                    "template '{}': sets for '{}' must be positive",
                    self.id, entry.exercise
                ));
            }
            if entry.reps.trim().is_empty() {
                return Err(format!(
                    "template '{}': reps for '{}' must not be empty",
                    self.id, entry.exercise
                ));
            }
        }
        Ok(())
    }
}

impl Validate for SetLog {
    fn validate(&self) -> Result<(), String> {
        if !self.weight.is_finite() {
            return Err("set weight must be a finite number".to_string());
        }
        if self.reps == 0 {
            return Err("set reps must be positive".to_string());
        }
        if let Some(rir) = self.rir {
            if rir > 10 {
                return Err(format!("rir {rir} is outside 0-10"));
            }
        }
        Ok(())
    }
}

impl Validate for Workout {
    fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("workout id must not be empty".to_string());
        }
        if let Some(end) = self.end_time {
            if end < self.start_time {
                return Err(format!("workout '{}' ends before it starts", self.id));
            }
        }
        for log in &self.exercises {
            if log.exercise.trim().is_empty() {
                return Err(format!("workout '{}' has a log without exercise", self.id));
            }
            for set in &log.sets {
                set.validate()
                    .map_err(|e| format!("workout '{}', '{}': {e}", self.id, log.exercise))?;
            }
        }
        Ok(())
    }
}

impl<T: Validate> Validate for [T] {
    fn validate(&self) -> Result<(), String> {
        self.iter().try_for_each(Validate::validate)
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), String> {
        self.as_slice().validate()
    }
}
