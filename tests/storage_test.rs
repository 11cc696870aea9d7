use anyhow::Result;
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use std::fs;
use tempfile::TempDir;
use workout_lib::{
    ExerciseLog, ExerciseUpdate, SetLog, Storage, StorageError, Template, TemplateExercise,
    TemplateUpdate, Workout,
};

fn create_test_storage() -> Result<(TempDir, Storage)> {
    let dir = tempfile::tempdir()?;
    let storage = Storage::new(dir.path(), "default");
    Ok((dir, storage))
}

fn finished_workout(date: NaiveDate, exercise: &str, weight: f64) -> Workout {
    let start = Utc.from_utc_datetime(&date.and_hms_opt(17, 30, 0).unwrap());
    let mut workout = Workout::begin(date, None, start);
    let mut log = ExerciseLog::new(exercise);
    log.sets.push(SetLog {
        weight,
        reps: 5,
        rir: Some(2),
    });
    workout.exercises.push(log);
    workout.end_time = Some(start + Duration::minutes(45));
    workout
}

#[test]
fn test_exercise_library_is_seeded_once() -> Result<()> {
    let (dir, storage) = create_test_storage()?;
    let seeded = storage.get_exercises()?;
    assert!(seeded.len() > 10);
    assert!(dir.path().join("exercises.json").is_file());

    storage.delete_exercise("plank")?;
    // A second read must not reseed what was deleted
    let again = storage.get_exercises()?;
    assert_eq!(again.len(), seeded.len() - 1);
    assert!(again.iter().all(|e| e.id != "plank"));
    Ok(())
}

#[test]
fn test_exercise_library_is_shared_between_profiles() -> Result<()> {
    let (dir, storage) = create_test_storage()?;
    let mut curl = storage.get_exercise("curl")?.unwrap();
    curl.id = "hammer-curl".to_string();
    curl.name = "Hammer Curl".to_string();
    curl.aliases = vec!["hammer".to_string()];
    storage.add_exercise(curl.clone())?;

    let other = Storage::new(dir.path(), "other");
    assert_eq!(other.get_exercise("hammer-curl")?, Some(curl));
    Ok(())
}

#[test]
fn test_alias_lookup_matches_id_lookup() -> Result<()> {
    let (_dir, storage) = create_test_storage()?;
    let by_id = storage.get_exercise("bench-press")?;
    assert!(by_id.is_some());
    for alias in ["bench", "bp", "BP", " Bench ", "Bench-Press", "BENCH-PRESS"] {
        assert_eq!(storage.get_exercise(alias)?, by_id, "alias '{alias}'");
    }
    assert_eq!(storage.get_exercise("bench-pres")?, None);
    Ok(())
}

#[test]
fn test_exercise_conflicts() -> Result<()> {
    let (_dir, storage) = create_test_storage()?;
    let squat = storage.get_exercise("squat")?.unwrap();

    let err = storage.add_exercise(squat.clone()).unwrap_err();
    assert!(matches!(err, StorageError::ExerciseAlreadyExists(_)));

    // An alias may not shadow another exercise's id
    let err = storage
        .update_exercise(
            "squat",
            ExerciseUpdate {
                aliases: Some(vec!["deadlift".to_string()]),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::AliasConflict { ref existing, .. } if existing == "deadlift"
    ));

    let err = storage
        .update_exercise("nope", ExerciseUpdate::default())
        .unwrap_err();
    assert!(matches!(err, StorageError::ExerciseNotFound(_)));

    let mut bad = squat;
    bad.id = "Hack Squat".to_string();
    bad.aliases.clear();
    let err = storage.add_exercise(bad).unwrap_err();
    assert!(matches!(err, StorageError::SchemaValidation { .. }));
    Ok(())
}

#[test]
fn test_template_round_trip() -> Result<()> {
    let (_dir, storage) = create_test_storage()?;
    let template = Template {
        id: "pull".to_string(),
        name: "Pull".to_string(),
        exercises: vec![TemplateExercise {
            exercise: "deadlift".to_string(),
            sets: 1,
            reps: "5".to_string(),
        }],
    };
    storage.add_template(template.clone())?;
    assert_eq!(storage.get_template("pull")?, Some(template.clone()));

    let err = storage.add_template(template).unwrap_err();
    assert!(matches!(err, StorageError::TemplateAlreadyExists(_)));

    let updated = storage.update_template(
        "pull",
        TemplateUpdate {
            name: Some("Pull Day".to_string()),
            ..Default::default()
        },
    )?;
    assert_eq!(updated.name, "Pull Day");
    assert_eq!(updated.exercises.len(), 1);

    let err = storage
        .update_template(
            "pull",
            TemplateUpdate {
                exercises: Some(vec![TemplateExercise {
                    exercise: "deadlift".to_string(),
                    sets: 0,
                    reps: "5".to_string(),
                }]),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, StorageError::SchemaValidation { .. }));

    storage.delete_template("pull")?;
    assert!(storage.get_templates()?.is_empty());
    assert!(matches!(
        storage.delete_template("pull").unwrap_err(),
        StorageError::TemplateNotFound(_)
    ));
    Ok(())
}

#[test]
fn test_current_workout_round_trip() -> Result<()> {
    let (_dir, storage) = create_test_storage()?;
    assert_eq!(storage.get_current_workout()?, None);
    // Clearing with nothing in progress is fine
    storage.clear_current_workout()?;

    let mut workout = finished_workout(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), "squat", 225.0);
    workout.end_time = None;
    storage.save_current_workout(&workout)?;
    assert_eq!(storage.get_current_workout()?, Some(workout));
    assert!(!storage.current_path().with_extension("json.tmp").exists());

    storage.clear_current_workout()?;
    assert_eq!(storage.get_current_workout()?, None);
    Ok(())
}

#[test]
fn test_finish_requires_end_time() -> Result<()> {
    let (_dir, storage) = create_test_storage()?;
    let mut workout = finished_workout(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), "squat", 225.0);
    workout.end_time = None;
    let err = storage.finish_workout(&workout).unwrap_err();
    assert!(matches!(err, StorageError::WorkoutNotFinished(_)));
    assert!(storage.get_all_workouts()?.is_empty());
    Ok(())
}

#[test]
fn test_finished_workouts_sorted_by_date() -> Result<()> {
    let (_dir, storage) = create_test_storage()?;
    let dates = [
        NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
        NaiveDate::from_ymd_opt(2024, 2, 9).unwrap(),
        NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
    ];
    for (i, date) in dates.iter().enumerate() {
        storage.finish_workout(&finished_workout(*date, "deadlift", 300.0 + i as f64))?;
    }
    fs::write(storage.workouts_dir().join("notes.txt"), "not a workout")?;

    let all = storage.get_all_workouts()?;
    let got: Vec<NaiveDate> = all.iter().map(|w| w.date).collect();
    assert_eq!(got, vec![dates[2], dates[1], dates[0]]);
    assert_eq!(storage.get_last_workout()?.unwrap().date, dates[2]);

    let history = storage.get_exercise_history("deadlift")?;
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].1.sets[0].weight, 302.0);
    assert!(storage.get_exercise_history("squat")?.is_empty());
    Ok(())
}

#[test]
fn test_malformed_documents_fail_validation() -> Result<()> {
    let (_dir, storage) = create_test_storage()?;
    fs::write(storage.exercises_path(), "{ not json")?;
    assert!(matches!(
        storage.get_exercises().unwrap_err(),
        StorageError::SchemaValidation { .. }
    ));

    let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let mut workout = finished_workout(date, "squat", 225.0);
    workout.exercises[0].sets[0].reps = 0;
    fs::create_dir_all(storage.workouts_dir())?;
    fs::write(
        storage.workout_path(date),
        serde_json::to_string_pretty(&workout)?,
    )?;
    let err = storage.get_all_workouts().unwrap_err();
    assert!(err.to_string().contains("reps must be positive"));
    Ok(())
}

#[test]
fn test_documents_are_camel_case_json() -> Result<()> {
    let (_dir, storage) = create_test_storage()?;
    let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    storage.finish_workout(&finished_workout(date, "squat", 225.0))?;

    let raw = fs::read_to_string(storage.workout_path(date))?;
    assert!(raw.contains("\"startTime\""));
    assert!(raw.contains("\"endTime\""));
    assert!(raw.contains("\"date\": \"2024-03-01\""));
    assert!(raw.ends_with('\n'));
    Ok(())
}
