// src/profile.rs
//! Profile resolution and the one-time move from the flat pre-profile layout.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::is_slug;
use crate::storage::{CONFIG_FILE, CURRENT_FILE, PROFILES_DIR, TEMPLATES_FILE, WORKOUTS_DIR};

pub const DEFAULT_PROFILE: &str = "default";

/// Files and directories that lived directly under the base directory before
/// profiles existed.
const LEGACY_ENTRIES: [&str; 4] = [CONFIG_FILE, TEMPLATES_FILE, CURRENT_FILE, WORKOUTS_DIR];

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid profile name '{0}': use lowercase letters, digits and single inner hyphens")]
    InvalidName(String),
    #[error("Profile '{0}' already exists")]
    AlreadyExists(String),
    #[error("Profile '{0}' not found")]
    NotFound(String),
    #[error("Cannot delete '{0}': it is the only profile left")]
    LastProfile(String),
    #[error("Multiple profiles exist ({}). Choose one with --profile <name>", .0.join(", "))]
    Ambiguous(Vec<String>),
    #[error("I/O error accessing profiles: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Manages the profile directories below `<base>/profiles`.
#[derive(Debug, Clone)]
pub struct Profiles {
    base_dir: PathBuf,
}

impl Profiles {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn profiles_dir(&self) -> PathBuf {
        self.base_dir.join(PROFILES_DIR)
    }

    pub fn profile_dir(&self, name: &str) -> PathBuf {
        self.profiles_dir().join(name)
    }

    /// Names of every profile directory, sorted. Empty if none were created yet.
    /// # Errors
    /// I/O errors other than a missing profiles directory.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(self.profiles_dir()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Only valid profile names can exist; anything else never touches the filesystem.
    pub fn exists(&self, name: &str) -> bool {
        is_slug(name) && self.profile_dir(name).is_dir()
    }

    /// # Errors
    /// - `InvalidName` if `name` is not a lowercase hyphenated slug.
    /// - `AlreadyExists` if the profile directory is present.
    pub fn create(&self, name: &str) -> Result<()> {
        check_name(name)?;
        if self.exists(name) {
            return Err(Error::AlreadyExists(name.to_string()));
        }
        fs::create_dir_all(self.profile_dir(name).join(WORKOUTS_DIR))?;
        log::info!("Created profile '{name}'");
        Ok(())
    }

    /// Removes the profile and everything in it. At least one profile must remain.
    /// # Errors
    /// `InvalidName`, `NotFound` or `LastProfile`.
    pub fn delete(&self, name: &str) -> Result<()> {
        check_name(name)?;
        if !self.exists(name) {
            return Err(Error::NotFound(name.to_string()));
        }
        if self.list()?.len() <= 1 {
            return Err(Error::LastProfile(name.to_string()));
        }
        fs::remove_dir_all(self.profile_dir(name))?;
        log::info!("Deleted profile '{name}'");
        Ok(())
    }

    pub fn has_legacy_data(&self) -> bool {
        LEGACY_ENTRIES
            .iter()
            .any(|entry| self.base_dir.join(entry).exists())
    }

    /// Moves the flat layout into the "default" profile. Safe to repeat: once
    /// nothing legacy is left this is a no-op.
    /// # Errors
    /// I/O errors while moving files.
    pub fn migrate_legacy_data(&self) -> Result<()> {
        if !self.has_legacy_data() {
            return Ok(());
        }
        let target = self.profile_dir(DEFAULT_PROFILE);
        fs::create_dir_all(&target)?;

        for entry in LEGACY_ENTRIES {
            let source = self.base_dir.join(entry);
            if !source.exists() {
                continue;
            }
            move_entry(&source, &target.join(entry))?;
            log::debug!("Migrated {} into profile '{DEFAULT_PROFILE}'", source.display());
        }
        fs::create_dir_all(target.join(WORKOUTS_DIR))?;
        log::info!("Migrated legacy data into profile '{DEFAULT_PROFILE}'");
        Ok(())
    }

    /// Picks the profile a command runs against.
    ///
    /// An explicit name must exist. Otherwise: with no profiles, legacy data is
    /// migrated (or "default" is created); a single profile is used as is; more
    /// than one is ambiguous.
    /// # Errors
    /// `InvalidName`, `NotFound`, `Ambiguous`, or I/O errors while creating/migrating.
    pub fn resolve(&self, explicit: Option<&str>) -> Result<String> {
        if let Some(name) = explicit {
            check_name(name)?;
            if !self.exists(name) {
                return Err(Error::NotFound(name.to_string()));
            }
            return Ok(name.to_string());
        }

        let mut profiles = self.list()?;
        match profiles.len() {
            0 => {
                if self.has_legacy_data() {
                    self.migrate_legacy_data()?;
                } else {
                    self.create(DEFAULT_PROFILE)?;
                }
                Ok(DEFAULT_PROFILE.to_string())
            }
            1 => Ok(profiles.remove(0)),
            _ => Err(Error::Ambiguous(profiles)),
        }
    }
}

fn check_name(name: &str) -> Result<()> {
    if is_slug(name) {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}

/// Renames `source` to `dest`. Directories are merged entry by entry when the
/// destination already exists.
fn move_entry(source: &Path, dest: &Path) -> io::Result<()> {
    if source.is_dir() && dest.is_dir() {
        for entry in fs::read_dir(source)? {
            let entry = entry?;
            move_entry(&entry.path(), &dest.join(entry.file_name()))?;
        }
        return fs::remove_dir(source);
    }
    fs::rename(source, dest)
}
