#![warn(clippy::all, clippy::pedantic)]
#![allow(
    // Grid coordinates are tiny, casts between usize and i32 never wrap
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use log::trace;

use crate::board::Board;
use crate::components::{BallRecord, Effect, Location};
use crate::game::{
    ALPHA_STEPS, BALL_STEP, Cell, EMPTY, JUMP_PERIOD, JUMP_STEPS, SELECTION_TIMEOUT, SIZE_STEPS,
    TILE_HEIGHT, TILE_WIDTH,
};

/// One draw call for the graphics side. Every variant repaints the
/// background tile of `at` before drawing the ball.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOp {
    /// A ball at rest, or a bare tile when `ball` is empty.
    Rest { at: Location, ball: Cell },
    /// A ball growing in; `size` runs 0..SIZE_STEPS.
    Grow { at: Location, ball: Cell, size: i32 },
    /// A ball fading out; `alpha` runs ALPHA_STEPS-1 down to 0.
    Fade { at: Location, ball: Cell, alpha: i32 },
    /// The old colour fading out under the new one fading in.
    Blend {
        at: Location,
        from: Cell,
        to: Cell,
        alpha: i32,
    },
    /// Bouncing ball, `level` indexes the squash table (0 is round).
    Squash { at: Location, ball: Cell, level: i32 },
    /// Bouncing ball lifted off the floor by `dy` pixels.
    Lift { at: Location, ball: Cell, dy: i32 },
    /// Sliding ball at a pixel offset from `at`. `trail` is the square it
    /// just left and `ahead` the one it is heading to; both get repainted.
    Glide {
        at: (usize, usize),
        ball: Cell,
        dx: i32,
        dy: i32,
        trail: Option<(usize, usize)>,
        ahead: Option<(usize, usize)>,
    },
}

impl DrawOp {
    #[must_use]
    pub fn location(&self) -> Location {
        match *self {
            DrawOp::Rest { at, .. }
            | DrawOp::Grow { at, .. }
            | DrawOp::Fade { at, .. }
            | DrawOp::Blend { at, .. }
            | DrawOp::Squash { at, .. }
            | DrawOp::Lift { at, .. } => at,
            DrawOp::Glide { at: (x, y), .. } => Location::grid(x, y),
        }
    }
}

/// Outcome of advancing one record by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Advance {
    pub op: Option<DrawOp>,
    /// The record runs an effect that must finish before board logic may go on.
    pub blocking: bool,
}

impl Advance {
    fn draw(op: DrawOp, blocking: bool) -> Self {
        Self {
            op: Some(op),
            blocking,
        }
    }
}

/// Advances `record` by exactly one tick.
///
/// `moving` is the number of slides in flight; it drops by one when a slide
/// lands.
pub fn advance(record: &mut BallRecord, board: &mut Board, moving: &mut usize) -> Advance {
    match record.effect {
        Effect::None => rest(record),
        Effect::Appearing => appear(record, board),
        Effect::Disappearing => disappear(record),
        Effect::Recoloring => recolor(record),
        Effect::Bouncing => bounce(record, board),
        Effect::Sliding => slide(record, board, moving),
    }
}

fn rest(record: &mut BallRecord) -> Advance {
    if !record.dirty {
        return Advance::default();
    }
    if !record.occupiable {
        record.value = EMPTY;
    }
    record.dirty = false;
    Advance::draw(
        DrawOp::Rest {
            at: record.position,
            ball: record.value,
        },
        false,
    )
}

fn appear(record: &mut BallRecord, board: &Board) -> Advance {
    // A ball dropped onto a square still crossed by a slide waits for it
    if let Some((x, y)) = record.home.grid_xy() {
        if board.has_path(x, y) {
            return Advance::default();
        }
    }

    let op = DrawOp::Grow {
        at: record.position,
        ball: record.value,
        size: record.step,
    };
    record.step += 1;
    if record.step >= SIZE_STEPS {
        record.disable_effect();
    }
    Advance::draw(op, false)
}

fn disappear(record: &mut BallRecord) -> Advance {
    let op = DrawOp::Fade {
        at: record.position,
        ball: record.value,
        alpha: ALPHA_STEPS - record.step - 1,
    };
    record.step += 1;
    if record.step == ALPHA_STEPS {
        record.disable_effect();
        record.occupiable = false;
        record.value = EMPTY;
    }
    // Pool slots fading out never hold back the board
    Advance::draw(op, record.home.grid_xy().is_some())
}

// Ends one step short of ALPHA_STEPS, so a recolour lasts 15 ticks
fn recolor(record: &mut BallRecord) -> Advance {
    let op = DrawOp::Blend {
        at: record.position,
        from: record.from,
        to: record.value,
        alpha: record.step,
    };
    record.step += 1;
    if record.step >= ALPHA_STEPS - 1 {
        record.disable_effect();
    }
    Advance::draw(op, true)
}

fn bounce(record: &mut BallRecord, board: &mut Board) -> Advance {
    let phase = record.step % JUMP_PERIOD;
    let at = record.position;
    let ball = record.value;

    let op = if phase < JUMP_STEPS {
        DrawOp::Squash {
            at,
            ball,
            level: phase,
        }
    } else if phase < 2 * JUMP_STEPS {
        DrawOp::Squash {
            at,
            ball,
            level: 2 * JUMP_STEPS - phase - 1,
        }
    } else if phase < 2 * JUMP_STEPS + 5 {
        DrawOp::Lift {
            at,
            ball,
            dy: 2 * JUMP_STEPS - phase,
        }
    } else {
        DrawOp::Lift {
            at,
            ball,
            dy: phase - (2 * JUMP_STEPS + 10),
        }
    };
    record.step += 1;

    let selected = board.selected().map(|(x, y)| Location::grid(x, y));
    if phase == 2 * JUMP_STEPS && selected != Some(record.home) {
        trace!("Bounce at {:?} ends on deselection", record.home);
        record.disable_effect();
    } else if record.step >= SELECTION_TIMEOUT {
        trace!("Selection at {:?} timed out", record.home);
        record.disable_effect();
        board.deselect();
    }
    Advance::draw(op, false)
}

fn slide(record: &mut BallRecord, board: &mut Board, moving: &mut usize) -> Advance {
    let (Some(slide), Some((mut x, mut y))) = (record.slide, record.position.grid_xy()) else {
        // Nothing to follow, land where the record lives
        land(record, board, moving);
        return Advance::draw(
            DrawOp::Rest {
                at: record.home,
                ball: record.value,
            },
            true,
        );
    };
    let (tx, ty) = slide.target;
    let mut trail = None;
    let mut ahead = None;
    let (mut dx, mut dy) = (0, 0);

    if (x, y) != slide.target {
        match board.follow_path(x, y, slide.flow) {
            Some((nx, ny)) => {
                let distance = (x.abs_diff(tx) + y.abs_diff(ty)) as i32;
                record.step += if distance <= 2 {
                    (BALL_STEP * (TILE_WIDTH * distance - record.step) / (2 * TILE_WIDTH)).max(1)
                } else {
                    BALL_STEP
                };
                dx = (nx as i32 - x as i32) * record.step;
                dy = (ny as i32 - y as i32) * record.step;

                if dx.abs() >= TILE_WIDTH || dy.abs() >= TILE_HEIGHT {
                    board.clear_path(x, y);
                    trail = Some((x, y));
                    (x, y) = (nx, ny);
                    record.position = Location::grid(x, y);
                    record.step = 0;
                    dx = 0;
                    dy = 0;
                } else {
                    ahead = Some((nx, ny));
                }
            }
            None => {
                trace!("Lost path at ({x}, {y}), snapping to {:?}", slide.target);
                board.clear_path(x, y);
                trail = Some((x, y));
                (x, y) = slide.target;
                record.position = Location::grid(x, y);
                record.step = 0;
            }
        }
    }

    let op = DrawOp::Glide {
        at: (x, y),
        ball: record.value,
        dx,
        dy,
        trail,
        ahead,
    };
    if (x, y) == slide.target {
        land(record, board, moving);
    }
    Advance::draw(op, true)
}

fn land(record: &mut BallRecord, board: &mut Board, moving: &mut usize) {
    *moving = moving.saturating_sub(1);
    if let Some((x, y)) = record.home.grid_xy() {
        board.clear_path(x, y);
    }
    record.position = record.home;
    record.slide = None;
    record.disable_effect();
    record.occupiable = true;
    trace!("Slide landed at {:?}", record.home);
}
