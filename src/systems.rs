use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use log::{debug, info};

use crate::board::Board;
use crate::clock::ClockControl;
use crate::components::{BallGrid, Chore, Outbox, Status};
use crate::effects::advance;
use crate::hud::Hud;
use crate::render::{DrawList, FrameCanvas, dispatch};
use crate::sound::SoundEffect;
use crate::sync::{process_board, process_moves, process_pool};

pub const GAME_OVER_MESSAGE: &str = "Game Over!";

/// The tick pipeline, in the order every tick must run it.
#[must_use]
pub fn build_tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            move_intent_system,
            board_sync_system,
            pool_sync_system,
            score_system,
            effect_system,
            render_system,
            board_logic_system,
        )
            .chain()
            .run_if(help_hidden),
    );
    schedule
}

// Animations stand still while the help overlay covers the board
pub fn help_hidden(hud: Res<Hud>) -> bool {
    !hud.help_visible()
}

pub fn move_intent_system(mut grid: ResMut<BallGrid>, mut board: ResMut<Board>) {
    process_moves(&mut grid, &mut board);
}

pub fn board_sync_system(
    mut grid: ResMut<BallGrid>,
    board: Res<Board>,
    mut outbox: ResMut<Outbox>,
) {
    if let Some(cue) = process_board(&mut grid, &board) {
        outbox.cues.push(cue);
    }
}

pub fn pool_sync_system(mut grid: ResMut<BallGrid>, board: Res<Board>) {
    process_pool(&mut grid, &board);
}

pub fn score_system(
    board: Res<Board>,
    mut hud: ResMut<Hud>,
    mut status: ResMut<Status>,
    mut outbox: ResMut<Outbox>,
) {
    let (changed, cue) = hud.ticker.tick(board.score(), board.score_mul());
    if changed {
        status.update_needed = true;
    }
    if let Some(cue) = cue {
        outbox.cues.push(cue);
    }
}

// Advances every record, board in raster order first, then the pool
pub fn effect_system(
    mut grid: ResMut<BallGrid>,
    mut board: ResMut<Board>,
    mut list: ResMut<DrawList>,
) {
    let grid = &mut *grid;
    list.clear();

    for (x, y) in BallGrid::raster() {
        let step = advance(&mut grid.cells[x][y], &mut board, &mut grid.moving);
        list.ops.extend(step.op);
        list.busy += usize::from(step.blocking);
    }
    for record in &mut grid.pool {
        let step = advance(record, &mut board, &mut grid.moving);
        list.ops.extend(step.op);
        list.busy += usize::from(step.blocking);
    }
}

pub fn render_system(
    mut canvas: ResMut<FrameCanvas>,
    mut list: ResMut<DrawList>,
    mut status: ResMut<Status>,
) {
    if dispatch(&mut canvas, &mut list) > 0 {
        status.update_needed = true;
    }
}

// Board logic only moves on once every blocking effect has finished
pub fn board_logic_system(
    mut board: ResMut<Board>,
    list: Res<DrawList>,
    mut status: ResMut<Status>,
    mut hud: ResMut<Hud>,
    mut clock: ResMut<ClockControl>,
    mut outbox: ResMut<Outbox>,
) {
    if list.busy > 0 {
        return;
    }
    board.logic();

    if board.is_settled() && !board.running() && !status.update_needed && !status.game_over {
        status.game_over = true;
        status.update_needed = true;
        clock.stop();
        hud.message = Some(GAME_OVER_MESSAGE.to_string());

        let score = board.score();
        if hud.hiscores.insert(score) {
            info!("Game over with new high score {score}");
            outbox.cues.push(SoundEffect::Hiscore);
            outbox.chores.push(Chore::SaveHiscores);
        } else {
            info!("Game over with score {score}");
            outbox.cues.push(SoundEffect::GameOver);
        }
        outbox.chores.push(Chore::DeleteSave);
        debug!("Game over after {} seconds", hud.timer.seconds);
    }
}
