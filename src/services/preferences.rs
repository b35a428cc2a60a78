//! Persisted timer preferences

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Six minutes, a medium-boiled egg
pub const DEFAULT_SELECTED_TIME_SECS: u64 = 360;

/// Shortest duration selectable from the preferences
pub const MIN_MINUTES: u64 = 1;
/// Longest duration selectable from the preferences
pub const MAX_MINUTES: u64 = 60;

#[derive(Error, Debug)]
pub enum PreferencesError {
    #[error("Failed to read preferences from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write preferences to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Timer length must be between 1 and 60 minutes, got {0}")]
    OutOfRange(u64),
}

/// User-selected timer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// The time for the egg to be boiled, in seconds
    #[serde(default = "default_selected_time")]
    pub selected_time_secs: u64,
}

fn default_selected_time() -> u64 {
    DEFAULT_SELECTED_TIME_SECS
}

impl Preferences {
    /// Build preferences from a whole number of minutes
    pub fn from_minutes(minutes: u64) -> Result<Self, PreferencesError> {
        if !(MIN_MINUTES..=MAX_MINUTES).contains(&minutes) {
            return Err(PreferencesError::OutOfRange(minutes));
        }
        Ok(Self {
            selected_time_secs: minutes * 60,
        })
    }

    pub fn selected_minutes(&self) -> u64 {
        self.selected_time_secs / 60
    }

    /// Replace a non-positive stored time with the default
    fn sanitized(self) -> Self {
        if self.selected_time_secs == 0 {
            Self::default()
        } else {
            self
        }
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            selected_time_secs: DEFAULT_SELECTED_TIME_SECS,
        }
    }
}

/// Broadcast whenever preferences are saved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesChanged {
    pub preferences: Preferences,
    /// Whether a countdown already running should be reset to the new length
    pub reset_running: bool,
}

/// JSON file backed preference store
#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    current: RwLock<Preferences>,
}

impl PreferenceStore {
    /// Load preferences from `path`.
    ///
    /// A missing file or an unreadable value falls back to the defaults.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, PreferencesError> {
        let path = path.into();

        let preferences = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Preferences>(&bytes) {
                Ok(prefs) => prefs.sanitized(),
                Err(e) => {
                    warn!("Ignoring malformed preferences in {}: {}", path.display(), e);
                    Preferences::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No preferences at {}, using defaults", path.display());
                Preferences::default()
            }
            Err(source) => return Err(PreferencesError::Read { path, source }),
        };

        info!(
            "Loaded preferences: {} minute timer",
            preferences.selected_minutes()
        );

        Ok(Self {
            path,
            current: RwLock::new(preferences),
        })
    }

    /// Store that never touched disk yet, starting from `preferences`
    pub fn in_memory(path: impl Into<PathBuf>, preferences: Preferences) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(preferences.sanitized()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Preferences {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Persist `preferences` and make them current
    pub async fn save(&self, preferences: Preferences) -> Result<(), PreferencesError> {
        let json = serde_json::to_vec_pretty(&preferences)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| PreferencesError::Write {
                path: self.path.clone(),
                source,
            })?;

        *self.current.write().unwrap_or_else(PoisonError::into_inner) = preferences;
        info!(
            "Saved preferences: {} minute timer",
            preferences.selected_minutes()
        );
        Ok(())
    }
}
