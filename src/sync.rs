#![warn(clippy::all, clippy::pedantic)]

use log::{debug, warn};

use crate::board::Board;
use crate::components::{BallGrid, Effect, Location, Slide};
use crate::game::{BALL_BOOM, BALL_BRUSH, Cell, EMPTY, POOL_SIZE};
use crate::sound::SoundEffect;

// The first special ball to vanish in raster order picks the cue; a plain
// fade only sounds when no special went
fn vanish_cue(cue: Option<SoundEffect>, ball: Cell) -> Option<SoundEffect> {
    let special = match ball {
        BALL_BOOM => Some(SoundEffect::Boom),
        BALL_BRUSH => Some(SoundEffect::Paint),
        _ => None,
    };
    match (cue, special) {
        (None | Some(SoundEffect::Fadeout), Some(special)) => Some(special),
        (None, None) => Some(SoundEffect::Fadeout),
        (cue, _) => cue,
    }
}

/// Consumes the board's selection and move requests.
///
/// The selected ball starts bouncing when it is idle. A committed move
/// hands the ball over to the destination record, which slides it along
/// the marked path.
pub fn process_moves(grid: &mut BallGrid, board: &mut Board) {
    if let Some((x, y)) = board.selected() {
        let record = &mut grid.cells[x][y];
        if record.is_idle_ball() {
            record.enable_effect(Effect::Bouncing);
        }
    }

    let Some(request) = board.take_move() else {
        return;
    };
    let (fx, fy) = request.from;
    let (tx, ty) = request.to;
    if grid.cells[tx][ty].value != EMPTY {
        warn!("Move to occupied ({tx}, {ty}) ignored");
        return;
    }

    let value = grid.cells[fx][fy].value;
    grid.moving += 1;

    let target = &mut grid.cells[tx][ty];
    target.value = value;
    target.enable_effect(Effect::Sliding);
    target.occupiable = false;
    target.position = Location::grid(fx, fy);
    target.slide = Some(Slide {
        origin: request.from,
        target: request.to,
        flow: request.flow,
    });

    let source = &mut grid.cells[fx][fy];
    source.disable_effect();
    source.dirty = false;
    source.occupiable = false;
    source.value = EMPTY;

    debug!(
        "Slide {:?} -> {:?} started, {} in flight",
        request.from, request.to, grid.moving
    );
}

/// Starts appear, recolour and disappear effects on board records that
/// no longer match the board. Returns the sound cue to play, if any.
pub fn process_board(grid: &mut BallGrid, board: &Board) -> Option<SoundEffect> {
    let mut cue: Option<SoundEffect> = None;

    for (x, y) in BallGrid::raster() {
        let cell = board.cell(x, y);
        let record = &mut grid.cells[x][y];

        if cell != EMPTY && record.value == EMPTY && record.effect == Effect::None {
            record.enable_effect(Effect::Appearing);
            record.value = cell;
        } else if cell != EMPTY
            && record.value != EMPTY
            && cell != record.value
            && record.effect == Effect::None
        {
            record.enable_effect(Effect::Recoloring);
            record.from = record.value;
            record.value = cell;
        } else if cell == EMPTY
            && record.value != EMPTY
            && matches!(record.effect, Effect::None | Effect::Bouncing)
        {
            cue = vanish_cue(cue, record.value);
            record.enable_effect(Effect::Disappearing);
        }
    }

    cue
}

/// Pool slots only ever appear and disappear.
pub fn process_pool(grid: &mut BallGrid, board: &Board) {
    for index in 0..POOL_SIZE {
        let cell = board.pool_cell(index);
        let record = &mut grid.pool[index];

        if cell != EMPTY && record.value == EMPTY && record.effect == Effect::None {
            record.enable_effect(Effect::Appearing);
            record.value = cell;
        } else if cell == EMPTY && record.value != EMPTY && record.effect == Effect::None {
            record.enable_effect(Effect::Disappearing);
        }
    }
}
