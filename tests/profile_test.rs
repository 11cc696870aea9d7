use anyhow::Result;
use chrono::{NaiveDate, TimeZone, Utc};
use std::fs;
use workout_lib::{ProfileError, Profiles, Storage, Units, Workout, DEFAULT_PROFILE};

#[test]
fn test_create_list_and_exists() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let profiles = Profiles::new(dir.path());
    assert!(profiles.list()?.is_empty());

    profiles.create("lifting")?;
    profiles.create("alex-2")?;
    assert!(profiles.exists("lifting"));
    assert!(profiles.profile_dir("lifting").join("workouts").is_dir());
    assert_eq!(profiles.list()?, vec!["alex-2".to_string(), "lifting".to_string()]);

    let err = profiles.create("lifting").unwrap_err();
    assert!(matches!(err, ProfileError::AlreadyExists(_)));
    Ok(())
}

#[test]
fn test_invalid_names_create_nothing() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let profiles = Profiles::new(dir.path());
    for name in ["", "Alice", "two words", "-lead", "trail-", "dou--ble", "../escape"] {
        let err = profiles.create(name).unwrap_err();
        assert!(
            matches!(err, ProfileError::InvalidName(_)),
            "'{name}' should be rejected"
        );
    }
    assert!(profiles.list()?.is_empty());
    Ok(())
}

#[test]
fn test_delete_keeps_last_profile() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let profiles = Profiles::new(dir.path());
    profiles.create("solo")?;

    let err = profiles.delete("solo").unwrap_err();
    assert!(matches!(err, ProfileError::LastProfile(_)));
    assert!(profiles.exists("solo"));

    profiles.create("other")?;
    profiles.delete("solo")?;
    assert!(!profiles.exists("solo"));

    let err = profiles.delete("ghost").unwrap_err();
    assert!(matches!(err, ProfileError::NotFound(_)));
    Ok(())
}

#[test]
fn test_resolve_rules() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let profiles = Profiles::new(dir.path());

    // Nothing yet: the default profile is created
    assert_eq!(profiles.resolve(None)?, DEFAULT_PROFILE);
    assert!(profiles.exists(DEFAULT_PROFILE));

    // A single profile is picked implicitly
    assert_eq!(profiles.resolve(None)?, DEFAULT_PROFILE);

    profiles.create("bob")?;
    match profiles.resolve(None) {
        Err(ProfileError::Ambiguous(names)) => assert_eq!(names, vec!["bob", "default"]),
        other => panic!("expected an ambiguous profile error, got {other:?}"),
    }
    assert_eq!(profiles.resolve(Some("bob"))?, "bob");

    let err = profiles.resolve(Some("carol")).unwrap_err();
    assert!(err.to_string().contains("carol"));
    Ok(())
}

fn legacy_workout() -> Workout {
    let start = Utc.with_ymd_and_hms(2023, 12, 1, 18, 0, 0).unwrap();
    let mut workout = Workout::begin(NaiveDate::from_ymd_opt(2023, 12, 1).unwrap(), None, start);
    workout.end_time = Some(start);
    workout
}

#[test]
fn test_legacy_layout_is_migrated_once() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let base = dir.path();
    fs::write(base.join("config.json"), r#"{ "units": "kg" }"#)?;
    fs::create_dir_all(base.join("workouts"))?;
    fs::write(
        base.join("workouts/2023-12-01.json"),
        serde_json::to_string_pretty(&legacy_workout())?,
    )?;

    let profiles = Profiles::new(base);
    assert!(profiles.has_legacy_data());
    assert_eq!(profiles.resolve(None)?, DEFAULT_PROFILE);
    assert!(!profiles.has_legacy_data());
    assert!(!base.join("config.json").exists());

    // Running it again changes nothing
    profiles.migrate_legacy_data()?;
    assert_eq!(profiles.list()?, vec![DEFAULT_PROFILE.to_string()]);

    let storage = Storage::new(base, DEFAULT_PROFILE);
    assert_eq!(storage.get_config()?.units, Units::Kg);
    let workouts = storage.get_all_workouts()?;
    assert_eq!(workouts.len(), 1);
    assert_eq!(workouts[0], legacy_workout());
    Ok(())
}

#[test]
fn test_interrupted_migration_resumes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let base = dir.path();
    let profiles = Profiles::new(base);

    // Half-moved: the profile already has a workouts dir, one file is still at the base
    fs::create_dir_all(profiles.profile_dir(DEFAULT_PROFILE).join("workouts"))?;
    fs::create_dir_all(base.join("workouts"))?;
    fs::write(
        base.join("workouts/2023-12-01.json"),
        serde_json::to_string(&legacy_workout())?,
    )?;

    profiles.migrate_legacy_data()?;
    assert!(!base.join("workouts").exists());
    assert!(profiles
        .profile_dir(DEFAULT_PROFILE)
        .join("workouts/2023-12-01.json")
        .is_file());
    Ok(())
}

#[test]
fn test_path_like_names_never_reach_the_filesystem() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let base = dir.path();
    let profiles = Profiles::new(base);
    profiles.create("alice")?;
    profiles.create("bob")?;
    Storage::new(base, "alice").get_exercises()?;

    for name in ["..", ".", "", "../alice", "alice/.."] {
        assert!(!profiles.exists(name), "'{name}' must not exist");
        assert!(
            matches!(profiles.delete(name), Err(ProfileError::InvalidName(_))),
            "deleting '{name}' should be rejected"
        );
        assert!(
            matches!(profiles.resolve(Some(name)), Err(ProfileError::InvalidName(_))),
            "resolving '{name}' should be rejected"
        );
    }

    assert_eq!(profiles.list()?, vec!["alice".to_string(), "bob".to_string()]);
    assert!(base.join("exercises.json").is_file());
    assert!(!base.join("config.json").exists());
    assert!(!profiles.has_legacy_data());
    Ok(())
}
