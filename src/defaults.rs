// src/defaults.rs
// Built-in exercise library written to `exercises.json` the first time it is read.
use crate::model::{Equipment, Exercise, ExerciseType, MuscleGroup, WeightInput};

use Equipment::{Barbell, Bodyweight, Cable, Dumbbell, Machine};
use ExerciseType::{Compound, Isolation};
use MuscleGroup::{
    Back, Biceps, Calves, Chest, Core, Glutes, Hamstrings, Lats, Quads, RearDelts, Shoulders,
    Traps, Triceps,
};

fn exercise(
    id: &str,
    name: &str,
    aliases: &[&str],
    muscles: &[MuscleGroup],
    type_: ExerciseType,
    equipment: Equipment,
) -> Exercise {
    Exercise {
        id: id.to_string(),
        name: name.to_string(),
        aliases: aliases.iter().map(ToString::to_string).collect(),
        muscles: muscles.to_vec(),
        type_,
        equipment,
        weight_input: WeightInput::Total,
        notes: None,
    }
}

fn per_side(mut exercise: Exercise) -> Exercise {
    exercise.weight_input = WeightInput::PerSide;
    exercise
}

#[rustfmt::skip]
pub fn default_exercises() -> Vec<Exercise> {
    vec![
        exercise("bench-press", "Bench Press", &["bench", "bp"], &[Chest, Triceps, Shoulders], Compound, Barbell),
        exercise("incline-bench-press", "Incline Bench Press", &["incline"], &[Chest, Shoulders, Triceps], Compound, Barbell),
        per_side(exercise("dumbbell-bench-press", "Dumbbell Bench Press", &["db-bench"], &[Chest, Triceps, Shoulders], Compound, Dumbbell)),
        exercise("overhead-press", "Overhead Press", &["ohp", "press"], &[Shoulders, Triceps], Compound, Barbell),
        exercise("squat", "Back Squat", &["back-squat"], &[Quads, Glutes, Core], Compound, Barbell),
        exercise("front-squat", "Front Squat", &[], &[Quads, Core], Compound, Barbell),
        exercise("deadlift", "Deadlift", &["dl"], &[Hamstrings, Glutes, Back, Traps], Compound, Barbell),
        exercise("romanian-deadlift", "Romanian Deadlift", &["rdl"], &[Hamstrings, Glutes], Compound, Barbell),
        exercise("barbell-row", "Barbell Row", &["row", "bent-over-row"], &[Back, Lats, Biceps], Compound, Barbell),
        exercise("pull-up", "Pull-up", &["pullup", "chin-up"], &[Lats, Biceps], Compound, Bodyweight),
        exercise("lat-pulldown", "Lat Pulldown", &["pulldown"], &[Lats, Biceps], Compound, Cable),
        exercise("dip", "Dip", &["dips"], &[Chest, Triceps], Compound, Bodyweight),
        exercise("leg-press", "Leg Press", &[], &[Quads, Glutes], Compound, Machine),
        exercise("leg-curl", "Leg Curl", &["hamstring-curl"], &[Hamstrings], Isolation, Machine),
        exercise("leg-extension", "Leg Extension", &[], &[Quads], Isolation, Machine),
        per_side(exercise("lateral-raise", "Lateral Raise", &["side-raise"], &[Shoulders], Isolation, Dumbbell)),
        exercise("face-pull", "Face Pull", &[], &[RearDelts, Traps], Isolation, Cable),
        per_side(exercise("bicep-curl", "Bicep Curl", &["curl"], &[Biceps], Isolation, Dumbbell)),
        exercise("tricep-pushdown", "Tricep Pushdown", &["pushdown"], &[Triceps], Isolation, Cable),
        exercise("calf-raise", "Calf Raise", &[], &[Calves], Isolation, Machine),
        exercise("plank", "Plank", &[], &[Core], Isolation, Bodyweight),
    ]
}
