//! Completion sound playback

use std::path::PathBuf;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum AlarmError {
    #[error("No completion sound configured")]
    Disabled,

    #[error("Failed to execute {player}: {source}")]
    Spawn {
        player: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{player} failed: {stderr}")]
    Failed { player: String, stderr: String },
}

/// Plays a sound file through an external audio player command
#[derive(Debug, Clone)]
pub struct Alarm {
    player: String,
    sound: Option<PathBuf>,
}

impl Alarm {
    pub fn new(player: impl Into<String>, sound: Option<PathBuf>) -> Self {
        Self {
            player: player.into(),
            sound,
        }
    }

    /// Alarm that never plays anything
    pub fn disabled() -> Self {
        Self::new(String::new(), None)
    }

    pub fn is_enabled(&self) -> bool {
        self.sound.is_some() && !self.player.is_empty()
    }

    /// Play the completion sound and wait for the player to exit
    pub async fn play(&self) -> Result<(), AlarmError> {
        let sound = match &self.sound {
            Some(sound) if !self.player.is_empty() => sound,
            _ => return Err(AlarmError::Disabled),
        };

        debug!("Playing {} with {}", sound.display(), self.player);

        let output = Command::new(&self.player)
            .arg(sound)
            .output()
            .await
            .map_err(|source| AlarmError::Spawn {
                player: self.player.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AlarmError::Failed {
                player: self.player.clone(),
                stderr: stderr.trim().to_string(),
            });
        }

        info!("Completion sound played");
        Ok(())
    }
}

impl Default for Alarm {
    fn default() -> Self {
        Self::disabled()
    }
}
