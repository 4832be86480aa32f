pub mod loader;
pub mod prefs;
pub mod theme;

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;

pub use prefs::Prefs;
pub use theme::ThemeConfig;

// Environment override for the directory holding saves, scores and prefs
pub const HOME_ENV: &str = "COLOR_LINES_HOME";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: ThemeConfig,
}

/// Files the game reads at start-up and writes while playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamePaths {
    pub save: PathBuf,
    pub scores: PathBuf,
    pub prefs: PathBuf,
}

impl GamePaths {
    #[must_use]
    pub fn in_dir(dir: &std::path::Path) -> Self {
        Self {
            save: dir.join("save.toml"),
            scores: dir.join("scores.toml"),
            prefs: dir.join("prefs.toml"),
        }
    }

    /// Resolves the data directory and makes sure it exists.
    pub fn resolve() -> io::Result<Self> {
        let dir = match std::env::var(HOME_ENV) {
            Ok(path) => PathBuf::from(path),
            Err(_) => dirs::config_dir()
                .map(|dir| dir.join("color-lines"))
                .ok_or_else(|| {
                    io::Error::new(io::ErrorKind::NotFound, "Could not find config directory")
                })?,
        };
        fs::create_dir_all(&dir)?;
        Ok(Self::in_dir(&dir))
    }
}
