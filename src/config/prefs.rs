#![warn(clippy::all, clippy::pedantic)]

use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::loader::{ConfigError, read_toml, write_toml};
use crate::game::VOLUME_MAX;

/// Player settings that survive between sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prefs {
    pub volume: u16,
    pub music: bool,
    pub track: usize,
    pub looping: bool,
    // Seconds spent on the game in progress
    pub elapsed: u32,
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            volume: VOLUME_MAX,
            music: true,
            track: 0,
            looping: false,
            elapsed: 0,
        }
    }
}

impl Prefs {
    /// Loads the preferences, silently falling back to defaults.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match read_toml::<Self>(path) {
            Ok(mut prefs) => {
                prefs.volume = prefs.volume.min(VOLUME_MAX);
                prefs
            }
            Err(e) => {
                debug!("Using default preferences: {e}");
                Self::default()
            }
        }
    }

    /// The track to play, or none when music is switched off.
    #[must_use]
    pub fn music_track(&self) -> Option<usize> {
        self.music.then_some(self.track)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        write_toml(path, self)
    }
}
