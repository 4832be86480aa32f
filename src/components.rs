#![warn(clippy::all, clippy::pedantic)]
#![allow(
    // Allow truncation when casting from usize to i32 since board dimensions are always small enough to fit in i32
    clippy::cast_possible_truncation,
    // Allow potential wrapping when casting between types as board coordinates are within reasonable ranges
    clippy::cast_possible_wrap,
    // Records carry several independent flags
    clippy::struct_excessive_bools
)]

use bevy_ecs::prelude::*;

use crate::game::{BOARD_H, BOARD_W, Cell, EMPTY, POOL_SIZE};
use crate::sound::SoundEffect;

/// Where a record lives: a square of the board or a slot of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    Grid { x: usize, y: usize },
    Pool { index: usize },
}

impl Location {
    #[must_use]
    pub fn grid(x: usize, y: usize) -> Self {
        Location::Grid { x, y }
    }

    #[must_use]
    pub fn pool(index: usize) -> Self {
        Location::Pool { index }
    }

    #[must_use]
    pub fn grid_xy(self) -> Option<(usize, usize)> {
        match self {
            Location::Grid { x, y } => Some((x, y)),
            Location::Pool { .. } => None,
        }
    }
}

/// Path token shared with the board module while a ball slides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FlowId(pub u32);

impl FlowId {
    /// Flow ids are named after the square the move starts from.
    #[must_use]
    pub fn from_origin(x: usize, y: usize) -> Self {
        FlowId((y * BOARD_W + x) as u32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Effect {
    #[default]
    None,
    Appearing,
    Disappearing,
    Recoloring,
    Bouncing,
    Sliding,
}

impl Effect {
    #[must_use]
    pub fn is_active(self) -> bool {
        self != Effect::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slide {
    pub origin: (usize, usize),
    pub target: (usize, usize),
    pub flow: FlowId,
}

/// Animation state of one board square or pool slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BallRecord {
    /// The array slot this record belongs to; never changes.
    pub home: Location,
    pub value: Cell,
    /// Previous occupant, only meaningful while recolouring.
    pub from: Cell,
    pub effect: Effect,
    pub step: i32,
    /// Where the ball is drawn; differs from `home` only while sliding.
    pub position: Location,
    pub slide: Option<Slide>,
    pub occupiable: bool,
    pub dirty: bool,
}

impl BallRecord {
    #[must_use]
    pub fn new(home: Location) -> Self {
        Self {
            home,
            value: EMPTY,
            from: EMPTY,
            effect: Effect::None,
            step: 0,
            position: home,
            slide: None,
            occupiable: false,
            dirty: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.home);
    }

    pub fn enable_effect(&mut self, effect: Effect) {
        self.position = self.home;
        self.occupiable = true;
        self.dirty = true;
        self.effect = effect;
        self.step = 0;
    }

    pub fn disable_effect(&mut self) {
        self.dirty = true;
        self.effect = Effect::None;
    }

    /// A record that shows a real ball and can take part in new effects.
    #[must_use]
    pub fn is_idle_ball(&self) -> bool {
        self.effect == Effect::None && self.value != EMPTY && self.occupiable
    }
}

/// Every animation record of the board and the pool, plus the number of
/// slides in flight.
#[derive(Resource, Debug, Clone)]
pub struct BallGrid {
    pub cells: Vec<Vec<BallRecord>>,
    pub pool: Vec<BallRecord>,
    pub moving: usize,
}

impl BallGrid {
    #[must_use]
    pub fn new() -> Self {
        let cells = (0..BOARD_W)
            .map(|x| {
                (0..BOARD_H)
                    .map(|y| BallRecord::new(Location::grid(x, y)))
                    .collect()
            })
            .collect();
        let pool = (0..POOL_SIZE)
            .map(|i| BallRecord::new(Location::pool(i)))
            .collect();

        Self {
            cells,
            pool,
            moving: 0,
        }
    }

    pub fn reset(&mut self) {
        for record in self.cells.iter_mut().flatten() {
            record.reset();
        }
        for record in &mut self.pool {
            record.reset();
        }
        self.moving = 0;
    }

    #[must_use]
    pub fn record(&self, location: Location) -> &BallRecord {
        match location {
            Location::Grid { x, y } => &self.cells[x][y],
            Location::Pool { index } => &self.pool[index],
        }
    }

    pub fn record_mut(&mut self, location: Location) -> &mut BallRecord {
        match location {
            Location::Grid { x, y } => &mut self.cells[x][y],
            Location::Pool { index } => &mut self.pool[index],
        }
    }

    #[must_use]
    pub fn at(&self, x: usize, y: usize) -> &BallRecord {
        &self.cells[x][y]
    }

    /// Number of board records currently sliding.
    #[must_use]
    pub fn sliding_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|record| record.effect == Effect::Sliding)
            .count()
    }

    /// Grid locations in row-major order, the order every scan uses.
    pub fn raster() -> impl Iterator<Item = (usize, usize)> {
        (0..BOARD_H).flat_map(|y| (0..BOARD_W).map(move |x| (x, y)))
    }
}

impl Default for BallGrid {
    fn default() -> Self {
        Self::new()
    }
}

/// Game-wide flags shared by the tick, the clock and the event handlers.
#[derive(Resource, Debug, Clone)]
pub struct Status {
    pub running: bool,
    pub game_over: bool,
    pub update_needed: bool,
    pub store_prefs: bool,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            running: true,
            game_over: false,
            update_needed: false,
            store_prefs: false,
        }
    }
}

/// File work the tick asks for; done by the caller once the lock is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chore {
    DeleteSave,
    SaveHiscores,
    SaveBoard,
    SavePrefs,
}

/// Requests collected while the world is locked.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct Outbox {
    pub cues: Vec<SoundEffect>,
    pub chores: Vec<Chore>,
}
