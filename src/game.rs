#![warn(clippy::all, clippy::pedantic)]

// Board dimensions
pub const BOARD_W: usize = 9;
pub const BOARD_H: usize = 9;
pub const POOL_SIZE: usize = 3;

// Cell values: 0 is empty, 1..=COLORS_NR are plain colours, then the bonus balls
pub type Cell = u8;
pub const EMPTY: Cell = 0;
pub const COLORS_NR: Cell = 7;
pub const BALL_JOKER: Cell = 8;
pub const BALL_BOMB: Cell = 9;
pub const BALL_BRUSH: Cell = 10;
pub const BALL_BOOM: Cell = 11;
pub const BALLS_NR: usize = 11;

// Minimum run length that clears a line
pub const LINE_MIN: usize = 5;

// Chance (out of BONUS_ODDS) that a freshly generated ball is a bonus ball
pub const BONUS_ODDS: u32 = 40;

// Geometry in virtual pixels, shared by the effect engine and the renderer
pub const TILE_WIDTH: i32 = 50;
pub const TILE_HEIGHT: i32 = 50;

// Animation steps
pub const ALPHA_STEPS: i32 = 16;
pub const SIZE_STEPS: i32 = 16;
pub const JUMP_STEPS: i32 = 8;
pub const BALL_STEP: i32 = 25;

// One bounce period, and the tick at which an idle selection is dropped
pub const JUMP_PERIOD: i32 = 3 * JUMP_STEPS;
pub const SELECTION_TIMEOUT: i32 = JUMP_PERIOD * 19 + 2 * JUMP_STEPS;

// Score label blinking
pub const BONUS_BLINKS: u16 = 4;
pub const BONUS_TIMER: u16 = 40;

pub const HISCORES_NR: usize = 5;
pub const DEFAULT_HISCORES: [u32; HISCORES_NR] = [50, 40, 30, 20, 10];

// Timers
pub const TICK_MS: u64 = 20;
pub const CLOCK_MS: u64 = 1000;

// Volume is expressed on a 0..=256 scale
pub const VOLUME_MAX: u16 = 256;
pub const VOLUME_STEP: u16 = 16;
