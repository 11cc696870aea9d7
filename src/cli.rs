// src/cli.rs
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use workout_lib::{Equipment, ExerciseType, MuscleGroup, TemplateExercise, Units, WeightInput};

#[derive(Parser, Debug)]
#[command(author, version, about = "A CLI tool to track workouts", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Profile to use (required once more than one profile exists)
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Print tables as CSV instead
    #[arg(long, global = true)]
    pub csv: bool,

    /// Show debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a workout, optionally from a template
    Start {
        /// Template id to pre-populate exercises from
        template: Option<String>,
        /// Resume the workout in progress instead of failing
        #[arg(long = "continue")]
        resume: bool,
        /// Date of the workout (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Log sets, e.g. `log bench-press 135 8,8,7` or `log bench +5 3x5`
    Log {
        /// Exercise id or alias
        exercise: String,
        /// Weight (135, 22.5) or a change from the last set (+5, -10)
        #[arg(allow_hyphen_values = true)]
        weight: String,
        /// Reps per set (8,8,7) or sets x reps (3x8)
        reps: String,
        /// Reps in reserve (0-10), applied to every set logged
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=10))]
        rir: Option<u8>,
    },
    /// Add a note to the workout or to one exercise
    Note {
        /// Note text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Attach the note to this exercise instead of the workout
        #[arg(short, long)]
        exercise: Option<String>,
    },
    /// Add an exercise to the workout without logging sets
    Add {
        exercise: String,
    },
    /// Replace an exercise in the workout, keeping its sets
    Swap {
        old: String,
        new: String,
    },
    /// Remove the last logged set
    Undo {
        /// Exercise to undo (defaults to the last exercise with sets)
        exercise: Option<String>,
    },
    /// Edit a logged set
    Edit {
        exercise: String,
        /// Set number as shown by `status` (1-based)
        set: usize,
        /// New weight, or a change (+5, -10)
        #[arg(short, long, allow_hyphen_values = true)]
        weight: Option<String>,
        #[arg(short, long)]
        reps: Option<u32>,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=10))]
        rir: Option<u8>,
    },
    /// Delete a set, or a whole exercise when no set is given
    Delete {
        exercise: String,
        set: Option<usize>,
    },
    /// Finish the workout and save it to history
    Done,
    /// Discard the workout in progress
    Cancel,
    /// Show the workout in progress
    Status,
    /// Show the most recent finished workout
    Last,
    /// List finished workouts
    Workouts {
        /// Show only the last N workouts
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Show progression for an exercise
    History {
        exercise: String,
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show personal records for one or all exercises
    Pr {
        exercise: Option<String>,
    },
    /// Manage the exercise library (shared by all profiles)
    Exercises {
        #[command(subcommand)]
        command: ExerciseCommands,
    },
    /// Manage workout templates
    Templates {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Manage profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Show or change profile settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion script
    #[command(name = "completion", hide = true)]
    GenerateCompletion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ExerciseCommands {
    /// List exercises
    List {
        /// Only exercises targeting this muscle
        #[arg(short, long)]
        muscle: Option<MuscleGroup>,
        #[arg(short = 't', long = "type")]
        type_: Option<ExerciseType>,
    },
    /// Show one exercise by id or alias
    Show { identifier: String },
    /// Define a new exercise
    Add {
        /// Unique id (lowercase, hyphenated), e.g. "cable-fly"
        id: String,
        #[arg(short, long)]
        name: String,
        /// Comma-separated muscles (e.g. "chest,triceps")
        #[arg(short, long, value_delimiter = ',', required = true)]
        muscles: Vec<MuscleGroup>,
        #[arg(short = 't', long = "type")]
        type_: ExerciseType,
        #[arg(short, long)]
        equipment: Equipment,
        /// Weight is logged per side (doubled for volume)
        #[arg(long)]
        per_side: bool,
        /// Comma-separated alternate names
        #[arg(short, long, value_delimiter = ',')]
        aliases: Vec<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Change fields of an exercise
    Edit {
        identifier: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long, value_delimiter = ',')]
        muscles: Option<Vec<MuscleGroup>>,
        #[arg(short = 't', long = "type")]
        type_: Option<ExerciseType>,
        #[arg(short, long)]
        equipment: Option<Equipment>,
        #[arg(long)]
        weight_input: Option<WeightInput>,
        /// Replace the aliases (comma-separated, empty string clears)
        #[arg(short, long)]
        aliases: Option<String>,
        /// Replace the notes (empty string clears)
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete an exercise
    Delete { identifier: String },
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    List,
    Show { id: String },
    /// Create a template, e.g. `create push --name Push -x bench:3:5 -x ohp:3:8-12`
    Create {
        id: String,
        #[arg(short, long)]
        name: String,
        /// Entry as exercise:sets:reps (repeatable, in order)
        #[arg(short = 'x', long = "exercise", value_parser = parse_template_entry)]
        exercises: Vec<TemplateExercise>,
    },
    /// Rename a template or replace its exercises
    Edit {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short = 'x', long = "exercise", value_parser = parse_template_entry)]
        exercises: Vec<TemplateExercise>,
    },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    List,
    Create { name: String },
    /// Delete a profile and all of its workouts
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    Show,
    /// Set the weight units label (lbs or kg)
    Units { units: Units },
}

/// Parses `exercise:sets:reps`, e.g. `bench-press:3:8-12`.
fn parse_template_entry(s: &str) -> Result<TemplateExercise, String> {
    let mut parts = s.splitn(3, ':');
    let (Some(exercise), Some(sets), Some(reps)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("expected exercise:sets:reps, got '{s}'"));
    };
    let sets: u32 = sets
        .trim()
        .parse()
        .map_err(|_| format!("sets must be a positive number in '{s}'"))?;
    Ok(TemplateExercise {
        exercise: exercise.trim().to_string(),
        sets,
        reps: reps.trim().to_string(),
    })
}

// Function to parse CLI arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

pub fn build_cli_command() -> clap::Command {
    Cli::command()
}
