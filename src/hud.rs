#![warn(clippy::all, clippy::pedantic)]

use bevy_ecs::prelude::*;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::loader::{ConfigError, read_toml, write_toml};
use crate::game::{
    BOARD_H, BOARD_W, BONUS_BLINKS, BONUS_TIMER, DEFAULT_HISCORES, HISCORES_NR, VOLUME_MAX,
};
use crate::sound::{SoundEffect, TRACKS};

pub const HELP_PAGES: usize = 3;

/// Score label that counts up towards the board score and flashes the
/// multiplier when it rises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreTicker {
    shown: i64,
    mul: u32,
    timer: u16,
    banner: Option<u32>,
}

impl Default for ScoreTicker {
    fn default() -> Self {
        Self {
            shown: -1,
            mul: 0,
            timer: 0,
            banner: None,
        }
    }
}

impl ScoreTicker {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Continues counting from just below `score`, as after loading a game.
    pub fn resume(&mut self, score: u32, mul: u32) {
        self.reset();
        self.shown = i64::from(score) - 1;
        self.mul = mul;
    }

    #[must_use]
    pub fn shown(&self) -> i64 {
        self.shown
    }

    #[must_use]
    pub fn is_blinking(&self) -> bool {
        self.timer > 0
    }

    /// Moves the label one tick on. Returns whether it changed and the cue
    /// to play.
    pub fn tick(&mut self, score: u32, mul: u32) -> (bool, Option<SoundEffect>) {
        if self.timer == 0 && mul > self.mul && mul > 1 {
            self.timer = BONUS_TIMER;
            debug!("Bonus x{mul}");
            return (true, Some(SoundEffect::Bonus));
        }
        if self.timer > 0 {
            self.timer -= 1;
            let before = self.banner;
            self.banner = ((self.timer / BONUS_BLINKS) & 1 == 1).then_some(mul);
            if self.timer == 0 {
                self.mul = mul;
                return (true, None);
            }
            return (before != self.banner, None);
        }
        if mul < self.mul {
            self.mul = mul;
        }

        let target = i64::from(score);
        if self.shown < target {
            self.shown += 1;
            let cue = (self.shown != target).then_some(SoundEffect::Click);
            (true, cue)
        } else if self.shown > target {
            self.shown = target;
            (true, None)
        } else {
            (false, None)
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self.banner {
            Some(mul) => format!("Bonus x{mul}"),
            None if self.timer > 0 => String::new(),
            None => format!("Score: {}", self.shown.max(0)),
        }
    }
}

/// The best scores, highest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hiscores {
    pub scores: Vec<u32>,
}

impl Default for Hiscores {
    fn default() -> Self {
        Self {
            scores: DEFAULT_HISCORES.to_vec(),
        }
    }
}

impl Hiscores {
    /// Loads the table, silently falling back to the defaults.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match read_toml::<Self>(path) {
            Ok(mut table) => {
                table.scores.sort_unstable_by(|a, b| b.cmp(a));
                table.scores.resize(HISCORES_NR, 0);
                table
            }
            Err(e) => {
                debug!("Using default high scores: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        write_toml(path, self)
    }

    /// Inserts `score` if it beats an entry, pushing lower ones down.
    pub fn insert(&mut self, score: u32) -> bool {
        let Some(rank) = self.scores.iter().position(|&entry| score > entry) else {
            return false;
        };
        self.scores.insert(rank, score);
        self.scores.truncate(HISCORES_NR);
        debug!("New high score {score} at rank {}", rank + 1);
        true
    }
}

/// Seconds spent on the current game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ElapsedTimer {
    pub seconds: u32,
}

impl ElapsedTimer {
    pub fn tick(&mut self) {
        self.seconds = self.seconds.saturating_add(1);
    }

    #[must_use]
    pub fn label(self) -> String {
        format!("{:02}:{:02}", self.seconds / 60, self.seconds % 60)
    }
}

/// Widget state drawn around the board.
#[derive(Resource, Debug, Clone)]
pub struct Hud {
    pub ticker: ScoreTicker,
    pub hiscores: Hiscores,
    pub timer: ElapsedTimer,
    pub volume: u16,
    pub music: Option<usize>,
    pub track: usize,
    pub looping: bool,
    pub help: Option<usize>,
    pub cursor: (usize, usize),
    pub message: Option<String>,
}

impl Default for Hud {
    fn default() -> Self {
        Self {
            ticker: ScoreTicker::default(),
            hiscores: Hiscores::default(),
            timer: ElapsedTimer::default(),
            volume: VOLUME_MAX,
            music: Some(0),
            track: 0,
            looping: false,
            help: None,
            cursor: (BOARD_W / 2, BOARD_H / 2),
            message: None,
        }
    }
}

impl Hud {
    #[must_use]
    pub fn track_title(&self) -> &'static str {
        TRACKS[self.track % TRACKS.len()]
    }

    /// Turns music off, or back on with the last track played.
    pub fn music_switch(&mut self) -> Option<usize> {
        self.music = match self.music {
            Some(_) => None,
            None => Some(self.track),
        };
        self.music
    }

    /// Picks the next track. A track that ended on its own repeats while
    /// looping is on.
    pub fn track_switch(&mut self, by_user: bool) -> usize {
        if by_user || !self.looping {
            self.track = (self.track + 1) % TRACKS.len();
        }
        if self.music.is_some() {
            self.music = Some(self.track);
        }
        self.track
    }

    pub fn set_volume(&mut self, volume: i32) -> u16 {
        self.volume = u16::try_from(volume.clamp(0, i32::from(VOLUME_MAX))).unwrap_or(VOLUME_MAX);
        self.volume
    }

    #[must_use]
    pub fn help_visible(&self) -> bool {
        self.help.is_some()
    }

    /// Shows the first help page, or steps through the pages and closes
    /// after the last one. Returns whether help is now visible.
    pub fn next_help_page(&mut self) -> bool {
        self.help = match self.help {
            None => Some(0),
            Some(page) if page + 1 < HELP_PAGES => Some(page + 1),
            Some(_) => None,
        };
        self.help.is_some()
    }

    pub fn close_help(&mut self) {
        self.help = None;
    }

    pub fn move_cursor(&mut self, dx: i32, dy: i32) {
        let (x, y) = self.cursor;
        self.cursor = (step(x, dx, BOARD_W), step(y, dy, BOARD_H));
    }
}

fn step(value: usize, delta: i32, len: usize) -> usize {
    let moved = value.saturating_add_signed(isize::try_from(delta).unwrap_or_default());
    moved.min(len - 1)
}
