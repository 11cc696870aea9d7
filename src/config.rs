//src/config.rs
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use strum_macros::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::model::Validate;

const APP_DATA_DIR: &str = ".workout";
const DATA_DIR_ENV_VAR: &str = "WORKOUT_DATA_DIR"; // Environment variable name
const DEFAULT_DATA_DIR_DISPLAY: &str = "~/.workout";

#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not determine the home directory for workout data.")]
    CannotDetermineDataDir,
    #[error("I/O error accessing data directory: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Units {
    #[default]
    Lbs,
    Kg,
}

/// Per-profile preferences, stored as `config.json` inside the profile directory.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")] // Ensure defaults are used if fields are missing
pub struct Config {
    pub units: Units,
    /// Informational only; the effective base directory comes from [`get_data_dir`].
    pub data_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            units: Units::default(),
            data_dir: DEFAULT_DATA_DIR_DISPLAY.to_string(),
        }
    }
}

/// Determines the base directory holding the shared exercise library and
/// all profiles. `WORKOUT_DATA_DIR` overrides the default `~/.workout`.
///
/// # Errors
/// Returns `Error::CannotDetermineDataDir` if no home directory is known, or
/// `Error::Io` if the override directory cannot be created.
pub fn get_data_dir() -> Result<PathBuf, Error> {
    if let Some(path_str) = std::env::var_os(DATA_DIR_ENV_VAR) {
        let path = PathBuf::from(path_str);
        if !path.is_dir() {
            log::warn!(
                "{DATA_DIR_ENV_VAR} points to '{}', which is not a directory. Trying to create it.",
                path.display()
            );
            fs::create_dir_all(&path)?;
        }
        return Ok(path);
    }

    let home = dirs::home_dir().ok_or(Error::CannotDetermineDataDir)?;
    Ok(home.join(APP_DATA_DIR))
}

impl Validate for Config {
    fn validate(&self) -> Result<(), String> {
        if self.data_dir.trim().is_empty() {
            return Err("dataDir must not be empty".to_string());
        }
        Ok(())
    }
}
