#![warn(clippy::all, clippy::pedantic)]

use bevy_ecs::prelude::*;

use crate::components::{BallGrid, Effect, Location};
use crate::effects::DrawOp;
use crate::game::{BOARD_H, BOARD_W, Cell, EMPTY, POOL_SIZE};

/// How a sprite is drawn on its tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Look {
    Solid,
    Scaled(i32),
    Faded(i32),
    Blended { from: Cell, alpha: i32 },
    Squashed(i32),
}

/// A ball painted on a tile, shifted by a pixel offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sprite {
    pub ball: Cell,
    pub dx: i32,
    pub dy: i32,
    pub look: Look,
}

impl Sprite {
    #[must_use]
    pub fn solid(ball: Cell) -> Self {
        Self {
            ball,
            dx: 0,
            dy: 0,
            look: Look::Solid,
        }
    }
}

/// What is currently painted: one optional sprite per board square and
/// per pool slot.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct FrameCanvas {
    pub board: [[Option<Sprite>; BOARD_H]; BOARD_W],
    pub pool: [Option<Sprite>; POOL_SIZE],
}

impl Default for FrameCanvas {
    fn default() -> Self {
        Self {
            board: [[None; BOARD_H]; BOARD_W],
            pool: [None; POOL_SIZE],
        }
    }
}

impl FrameCanvas {
    #[must_use]
    pub fn tile(&self, location: Location) -> Option<Sprite> {
        match location {
            Location::Grid { x, y } => self.board[x][y],
            Location::Pool { index } => self.pool[index],
        }
    }

    fn paint(&mut self, location: Location, sprite: Option<Sprite>) {
        match location {
            Location::Grid { x, y } => self.board[x][y] = sprite,
            Location::Pool { index } => self.pool[index] = sprite,
        }
    }

    /// Paints the background tile of `at` and the sprite the op describes.
    pub fn apply(&mut self, op: &DrawOp) {
        let sprite = |ball, look| Sprite {
            ball,
            dx: 0,
            dy: 0,
            look,
        };

        match *op {
            DrawOp::Rest { at, ball } => {
                self.paint(at, (ball != EMPTY).then(|| Sprite::solid(ball)));
            }
            DrawOp::Grow { at, ball, size } => self.paint(at, Some(sprite(ball, Look::Scaled(size)))),
            DrawOp::Fade { at, ball, alpha } => self.paint(at, Some(sprite(ball, Look::Faded(alpha)))),
            DrawOp::Blend {
                at,
                from,
                to,
                alpha,
            } => self.paint(at, Some(sprite(to, Look::Blended { from, alpha }))),
            DrawOp::Squash { at, ball, level } => {
                self.paint(at, Some(sprite(ball, Look::Squashed(level))));
            }
            DrawOp::Lift { at, ball, dy } => self.paint(
                at,
                Some(Sprite {
                    dy,
                    ..Sprite::solid(ball)
                }),
            ),
            DrawOp::Glide {
                at: (x, y),
                ball,
                dx,
                dy,
                trail,
                ahead,
            } => {
                for (cx, cy) in trail.into_iter().chain(ahead) {
                    self.board[cx][cy] = None;
                }
                self.board[x][y] = Some(Sprite {
                    dx,
                    dy,
                    ..Sprite::solid(ball)
                });
            }
        }
    }

    /// Repaints every tile from the records, as after a restart.
    pub fn redraw(&mut self, grid: &BallGrid) {
        *self = Self::default();
        for record in grid.cells.iter().flatten().chain(&grid.pool) {
            if record.value != EMPTY && record.effect == Effect::None && record.occupiable {
                self.paint(record.position, Some(Sprite::solid(record.value)));
            }
        }
    }
}

/// Draw calls produced by the effect engine during one tick.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawList {
    pub ops: Vec<DrawOp>,
    /// Records running an effect that holds back board logic.
    pub busy: usize,
}

impl DrawList {
    pub fn clear(&mut self) {
        self.ops.clear();
        self.busy = 0;
    }
}

/// Applies the tick's draw calls to the canvas and returns how many there
/// were.
pub fn dispatch(canvas: &mut FrameCanvas, list: &mut DrawList) -> usize {
    let count = list.ops.len();
    for op in list.ops.drain(..) {
        canvas.apply(&op);
    }
    count
}
