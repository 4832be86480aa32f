#![cfg(test)]

use bevy_ecs::prelude::*;

use crate::board::Board;
use crate::clock::ClockControl;
use crate::components::{BallGrid, Chore, Effect, Location, Outbox, Status};
use crate::game::{BALL_BOOM, BALL_BRUSH, BOARD_H, BOARD_W, Cell, POOL_SIZE};
use crate::hud::Hud;
use crate::render::{FrameCanvas, Sprite};
use crate::sound::SoundEffect;
use crate::systems::{GAME_OVER_MESSAGE, build_tick_schedule};
use crate::tests::test_utils::{create_test_world, idle_record, place_ball};

// Runs one tick the way the app does, clearing the redraw flag afterwards
fn run_tick(world: &mut World, schedule: &mut Schedule) -> bool {
    schedule.run(world);
    std::mem::take(&mut world.resource_mut::<Status>().update_needed)
}

fn fill_board(world: &mut World) {
    for x in 0..BOARD_W {
        for y in 0..BOARD_H {
            place_ball(world, x, y, 1 + ((x + 2 * y) % 7) as Cell);
        }
    }
}

#[test]
fn test_move_slides_and_lands() {
    let mut world = create_test_world();
    let mut schedule = build_tick_schedule();
    place_ball(&mut world, 1, 1, 3);

    world.resource_mut::<Board>().select(1, 1);
    run_tick(&mut world, &mut schedule);
    assert_eq!(world.resource::<BallGrid>().at(1, 1).effect, Effect::Bouncing);
    assert_eq!(world.resource::<BallGrid>().at(1, 1).step, 1);

    world.resource_mut::<Board>().select(1, 3);
    let mut landed = false;
    for _ in 0..200 {
        run_tick(&mut world, &mut schedule);

        let grid = world.resource::<BallGrid>();
        assert_eq!(grid.moving, grid.sliding_count());
        if grid.moving > 0 {
            assert!(!world.resource::<Board>().is_settled());
        }

        let target = grid.at(1, 3);
        let canvas = world.resource::<FrameCanvas>();
        if grid.moving == 0
            && target.effect == Effect::None
            && canvas.board[1][3] == Some(Sprite::solid(3))
            && world.resource::<Board>().is_settled()
        {
            landed = true;
            break;
        }
    }

    assert!(landed, "ball never came to rest on (1, 3)");
    let grid = world.resource::<BallGrid>();
    assert_eq!(grid.at(1, 3).value, 3);
    assert!(grid.at(1, 3).occupiable);
    assert_eq!(grid.at(1, 1).value, 0);
    assert_eq!(world.resource::<FrameCanvas>().board[1][1], None);
    assert_eq!(world.resource::<Board>().cell(1, 3), 3);
}

#[test]
fn test_quiet_world_stays_quiet() {
    let mut world = create_test_world();
    let mut schedule = build_tick_schedule();
    place_ball(&mut world, 4, 4, 2);
    place_ball(&mut world, 0, 8, 5);

    run_tick(&mut world, &mut schedule);
    run_tick(&mut world, &mut schedule);
    world.resource_mut::<Outbox>().cues.clear();
    let cells = world.resource::<BallGrid>().cells.clone();
    let canvas = world.resource::<FrameCanvas>().clone();

    assert!(!run_tick(&mut world, &mut schedule));
    assert_eq!(world.resource::<BallGrid>().cells, cells);
    assert_eq!(*world.resource::<FrameCanvas>(), canvas);
    assert_eq!(*world.resource::<Outbox>(), Outbox::default());
}

#[test]
fn test_one_cue_per_tick() {
    let mut world = create_test_world();
    let mut schedule = build_tick_schedule();
    {
        let mut grid = world.resource_mut::<BallGrid>();
        grid.cells[0][0] = idle_record(Location::grid(0, 0), 4);
        grid.cells[1][0] = idle_record(Location::grid(1, 0), BALL_BOOM);
        grid.cells[2][0] = idle_record(Location::grid(2, 0), BALL_BRUSH);
    }

    run_tick(&mut world, &mut schedule);

    assert_eq!(world.resource::<Outbox>().cues, vec![SoundEffect::Boom]);
    let grid = world.resource::<BallGrid>();
    for x in 0..3 {
        assert_eq!(grid.at(x, 0).effect, Effect::Disappearing);
        assert_eq!(grid.at(x, 0).step, 1);
    }
}

#[test]
fn test_fade_out_blocks_board_logic() {
    let mut world = create_test_world();
    let mut schedule = build_tick_schedule();
    world.resource_mut::<Board>().init();
    world.resource_mut::<BallGrid>().cells[5][5] = idle_record(Location::grid(5, 5), 6);

    for _ in 0..15 {
        run_tick(&mut world, &mut schedule);
        assert!(!world.resource::<Board>().is_settled());
        assert_ne!(world.resource::<Board>().pool_cell(0), 0);
    }

    // The last fade step still blocks, the tick after that runs logic
    run_tick(&mut world, &mut schedule);
    let placed = BallGrid::raster()
        .filter(|&(x, y)| world.resource::<Board>().cell(x, y) != 0)
        .count();
    assert_eq!(placed, 0);
    run_tick(&mut world, &mut schedule);
    let placed = BallGrid::raster()
        .filter(|&(x, y)| world.resource::<Board>().cell(x, y) != 0)
        .count();
    assert_eq!(placed, 3);
}

#[test]
fn test_pool_fade_does_not_delay_restock() {
    let mut world = create_test_world();
    let mut schedule = build_tick_schedule();
    world.resource_mut::<Board>().init();
    let pool: Vec<Cell> = (0..POOL_SIZE)
        .map(|i| world.resource::<Board>().pool_cell(i))
        .collect();
    for (index, &ball) in pool.iter().enumerate() {
        world.resource_mut::<BallGrid>().pool[index] = idle_record(Location::pool(index), ball);
    }

    // The first tick drops the pool onto the board
    run_tick(&mut world, &mut schedule);
    assert!((0..POOL_SIZE).all(|i| world.resource::<Board>().pool_cell(i) == 0));

    // The old pool fades out while the next one is already drawn
    run_tick(&mut world, &mut schedule);
    assert!((0..POOL_SIZE).all(|i| world.resource::<Board>().pool_cell(i) != 0));
    let grid = world.resource::<BallGrid>();
    assert!(grid.pool.iter().all(|record| record.effect == Effect::Disappearing));
}

#[test]
fn test_help_overlay_freezes_animation() {
    let mut world = create_test_world();
    let mut schedule = build_tick_schedule();
    world.resource_mut::<Board>().set_cell(2, 2, 5);
    world.resource_mut::<Hud>().help = Some(0);

    for _ in 0..5 {
        run_tick(&mut world, &mut schedule);
    }
    assert_eq!(world.resource::<BallGrid>().at(2, 2).effect, Effect::None);
    assert_eq!(world.resource::<FrameCanvas>().board[2][2], None);

    world.resource_mut::<Hud>().close_help();
    run_tick(&mut world, &mut schedule);
    let record = world.resource::<BallGrid>().at(2, 2).clone();
    assert_eq!(record.effect, Effect::Appearing);
    assert_eq!(record.step, 1);
}

#[test]
fn test_full_board_ends_the_game_once() {
    let mut world = create_test_world();
    let mut schedule = build_tick_schedule();
    fill_board(&mut world);
    world.resource_mut::<ClockControl>().start();

    // The score label still changes on the first tick
    assert!(run_tick(&mut world, &mut schedule));
    assert!(!world.resource::<Status>().game_over);

    run_tick(&mut world, &mut schedule);
    assert!(world.resource::<Status>().game_over);
    assert!(!world.resource::<ClockControl>().is_running());
    assert_eq!(
        world.resource::<Hud>().message.as_deref(),
        Some(GAME_OVER_MESSAGE)
    );
    let outbox = std::mem::take(&mut *world.resource_mut::<Outbox>());
    assert_eq!(outbox.cues, vec![SoundEffect::GameOver]);
    assert_eq!(outbox.chores, vec![Chore::DeleteSave]);

    run_tick(&mut world, &mut schedule);
    assert_eq!(*world.resource::<Outbox>(), Outbox::default());
}

#[test]
fn test_game_over_records_hiscore() {
    let mut world = create_test_world();
    let mut schedule = build_tick_schedule();
    {
        let mut board = world.resource_mut::<Board>();
        for x in 0..5 {
            board.set_cell(x, 0, 2);
        }
        board.remove_lines(&[(0, 0)]);
    }
    fill_board(&mut world);
    world.resource_mut::<Hud>().hiscores.scores = vec![0; 5];

    run_tick(&mut world, &mut schedule);
    for _ in 0..10 {
        if world.resource::<Status>().game_over {
            break;
        }
        run_tick(&mut world, &mut schedule);
    }

    assert!(world.resource::<Status>().game_over);
    let outbox = world.resource::<Outbox>();
    assert!(outbox.cues.contains(&SoundEffect::Hiscore));
    assert_eq!(outbox.chores, vec![Chore::SaveHiscores, Chore::DeleteSave]);
    assert_eq!(world.resource::<Hud>().hiscores.scores[0], 5);
}
