#![warn(clippy::all, clippy::pedantic)]
#![allow(
    // Terminal columns and volume steps are small, casts between them never wrap
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap
)]

use bevy_ecs::prelude::*;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use log::{debug, info, warn};
use std::error;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::board::{Board, BoardSnapshot};
use crate::clock::ClockControl;
use crate::components::{BallGrid, BallRecord, Chore, Effect, Location, Outbox, Status};
use crate::config::loader::write_toml;
use crate::config::{GamePaths, Prefs};
use crate::game::{BOARD_H, BOARD_W, Cell, EMPTY, POOL_SIZE, VOLUME_STEP};
use crate::hud::{Hiscores, Hud};
use crate::render::{DrawList, FrameCanvas};
use crate::sound::{AudioState, SoundEffect};
use crate::systems::build_tick_schedule;
use crate::ui::{Button, Geometry};

pub type AppResult<T> = std::result::Result<T, Box<dyn error::Error>>;

/// File work carried out after the lock has been released.
#[derive(Debug, Clone, PartialEq)]
pub enum FileTask {
    Delete(PathBuf),
    SaveHiscores(PathBuf, Hiscores),
    SaveBoard(PathBuf, BoardSnapshot),
    SavePrefs(PathBuf, Prefs),
}

impl FileTask {
    /// Performs the task. Failures are logged, the game carries on.
    pub fn run(&self) {
        let result = match self {
            FileTask::Delete(path) => match fs::remove_file(path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.to_string()),
                _ => Ok(()),
            },
            FileTask::SaveHiscores(path, table) => table.save(path).map_err(|e| e.to_string()),
            FileTask::SaveBoard(path, snapshot) => {
                write_toml(path, snapshot).map_err(|e| e.to_string())
            }
            FileTask::SavePrefs(path, prefs) => prefs.save(path).map_err(|e| e.to_string()),
        };
        match result {
            Ok(()) => debug!("{self:?} done"),
            Err(e) => warn!("File task failed: {e}"),
        }
    }
}

/// What one tick or one event left for the caller to do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub redraw: bool,
    pub cues: Vec<SoundEffect>,
    pub tasks: Vec<FileTask>,
}

/// Everything the renderer needs, copied out of the world.
#[derive(Debug, Clone)]
pub struct Scene {
    pub canvas: FrameCanvas,
    pub hud: Hud,
    pub selected: Option<(usize, usize)>,
    pub game_over: bool,
    pub audio_available: bool,
}

pub struct App {
    pub world: World,
    schedule: Schedule,
    pub paths: GamePaths,
}

impl App {
    pub fn new(paths: GamePaths, audio: AudioState, clock: ClockControl, board: Board) -> Self {
        let mut world = World::new();
        world.insert_resource(board);
        world.insert_resource(BallGrid::new());
        world.insert_resource(Hud::default());
        world.insert_resource(FrameCanvas::default());
        world.insert_resource(DrawList::default());
        world.insert_resource(Status::default());
        world.insert_resource(Outbox::default());
        world.insert_resource(Geometry::default());
        world.insert_resource(audio);
        world.insert_resource(clock);

        Self {
            world,
            schedule: build_tick_schedule(),
            paths,
        }
    }

    /// Loads preferences, high scores and the saved game, then starts
    /// playing.
    pub fn prepare(&mut self) {
        let prefs = Prefs::load(&self.paths.prefs);
        let hiscores = Hiscores::load(&self.paths.scores);
        {
            let mut hud = self.world.resource_mut::<Hud>();
            hud.volume = prefs.volume;
            hud.music = prefs.music_track();
            hud.track = prefs.track;
            hud.looping = prefs.looping;
            hud.hiscores = hiscores;
        }
        {
            let mut audio = self.world.resource_mut::<AudioState>();
            audio.set_volume(prefs.volume);
            if let Some(track) = prefs.music_track() {
                audio.start_music(track);
            }
        }

        match Board::load(&self.paths.save) {
            Ok(board) => {
                info!("Resuming saved game with score {}", board.score());
                self.world.insert_resource(board);
                self.world.resource_mut::<Hud>().timer.seconds = prefs.elapsed;
                self.restart(false);
            }
            Err(e) => {
                debug!("No saved game: {e}");
                self.restart(true);
            }
        }
    }

    /// Starts a new game, or picks up the board as it stands when `clean`
    /// is false.
    pub fn restart(&mut self, clean: bool) {
        self.world.resource_mut::<ClockControl>().stop();
        {
            let mut status = self.world.resource_mut::<Status>();
            status.game_over = false;
            status.update_needed = true;
        }

        let mut board = self.world.resource_mut::<Board>();
        if clean {
            board.init();
        }
        let board = board.clone();

        let mut grid = self.world.resource_mut::<BallGrid>();
        grid.reset();
        if !clean {
            for (x, y) in BallGrid::raster() {
                settle(grid.record_mut(Location::grid(x, y)), board.cell(x, y));
            }
            for index in 0..POOL_SIZE {
                settle(grid.record_mut(Location::pool(index)), board.pool_cell(index));
            }
        }
        let grid = grid.clone();
        self.world.resource_mut::<FrameCanvas>().redraw(&grid);
        self.world.resource_mut::<DrawList>().clear();

        {
            let mut hud = self.world.resource_mut::<Hud>();
            hud.message = None;
            hud.close_help();
            if clean {
                hud.ticker.reset();
                hud.timer.seconds = 0;
            } else {
                hud.ticker.resume(board.score(), board.score_mul());
            }
        }
        self.world.resource_mut::<ClockControl>().start();
        info!("Game {}", if clean { "started" } else { "resumed" });
    }

    /// Runs one tick of the pipeline.
    pub fn tick(&mut self) -> Outcome {
        if !self.is_running() {
            return Outcome::default();
        }
        self.schedule.run(&mut self.world);
        self.take_outcome()
    }

    /// One second of play has passed.
    pub fn clock_tick(&mut self) {
        self.world.resource_mut::<Hud>().timer.tick();
        self.world.resource_mut::<Status>().update_needed = true;
    }

    /// A music track played to its end.
    pub fn track_finished(&mut self, index: usize) {
        let mut hud = self.world.resource_mut::<Hud>();
        if hud.music != Some(index) {
            return;
        }
        let track = hud.track_switch(false);
        debug!("Track {index} finished, playing {track}");
        self.world.resource_mut::<AudioState>().start_music(track);
        self.world.resource_mut::<Status>().update_needed = true;
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.world.resource::<Status>().running
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.world.resource::<Status>().game_over
    }

    pub fn set_geometry(&mut self, geometry: Geometry) {
        self.world.insert_resource(geometry);
        self.world.resource_mut::<Status>().update_needed = true;
    }

    #[must_use]
    pub fn scene(&self) -> Scene {
        Scene {
            canvas: self.world.resource::<FrameCanvas>().clone(),
            hud: self.world.resource::<Hud>().clone(),
            selected: self.world.resource::<Board>().selected(),
            game_over: self.is_game_over(),
            audio_available: self.world.resource::<AudioState>().is_audio_available(),
        }
    }

    /// Handles one terminal event.
    pub fn handle_event(&mut self, event: &Event) -> Outcome {
        match event {
            Event::Key(key) => self.handle_key(*key),
            Event::Mouse(mouse) => self.handle_mouse(*mouse),
            Event::Resize(..) => self.world.resource_mut::<Status>().update_needed = true,
            _ => {}
        }
        self.take_outcome()
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            KeyCode::Left => self.move_cursor(-1, 0),
            KeyCode::Right => self.move_cursor(1, 0),
            KeyCode::Up => self.move_cursor(0, -1),
            KeyCode::Down => self.move_cursor(0, 1),
            KeyCode::Enter | KeyCode::Char(' ') => {
                let (x, y) = self.world.resource::<Hud>().cursor;
                self.click_cell(x, y);
            }
            KeyCode::Char('m') => self.press(Button::Music),
            KeyCode::Char('t') => self.press(Button::Track),
            KeyCode::Char('l') => self.press(Button::Loop),
            KeyCode::Char('i' | '?') => self.press(Button::Info),
            KeyCode::Char('r') => self.press(Button::Restart),
            KeyCode::Char('+' | '=') => self.change_volume(i32::from(VOLUME_STEP)),
            KeyCode::Char('-') => self.change_volume(-i32::from(VOLUME_STEP)),
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let geometry = *self.world.resource::<Geometry>();
        let (col, row) = (mouse.column, mouse.row);

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(volume) = geometry.volume_at(col, row) {
                    self.set_volume(volume);
                } else if let Some((x, y)) = geometry.cell_at(col, row) {
                    self.world.resource_mut::<Hud>().cursor = (x, y);
                    self.click_cell(x, y);
                } else if let Some(button) = geometry.button_at(col, row) {
                    self.press(button);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(volume) = geometry.volume_at(col, row) {
                    self.set_volume(volume);
                }
            }
            MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
                let up = mouse.kind == MouseEventKind::ScrollUp;
                if geometry.volume_at(col, row).is_some() {
                    let delta = i32::from(VOLUME_STEP);
                    self.change_volume(if up { delta } else { -delta });
                } else if geometry.cell_at(col, row).is_some()
                    && self.world.resource::<Hud>().help_visible()
                {
                    self.page_help();
                }
            }
            _ => {}
        }
    }

    fn move_cursor(&mut self, dx: i32, dy: i32) {
        let mut hud = self.world.resource_mut::<Hud>();
        if !hud.help_visible() {
            hud.move_cursor(dx, dy);
            self.world.resource_mut::<Status>().update_needed = true;
        }
    }

    // A click on the board pages the help, restarts a finished game or
    // selects and moves balls
    fn click_cell(&mut self, x: usize, y: usize) {
        if self.world.resource::<Hud>().help_visible() {
            self.page_help();
        } else if self.is_game_over() {
            self.restart(true);
        } else if x < BOARD_W && y < BOARD_H {
            self.world.resource_mut::<Board>().select(x, y);
            self.world.resource_mut::<Status>().update_needed = true;
        }
    }

    fn press(&mut self, button: Button) {
        match button {
            Button::Music => {
                let music = self.world.resource_mut::<Hud>().music_switch();
                let mut audio = self.world.resource_mut::<AudioState>();
                match music {
                    Some(track) => audio.start_music(track),
                    None => audio.stop_music(),
                }
            }
            Button::Track => {
                let mut hud = self.world.resource_mut::<Hud>();
                let track = hud.track_switch(true);
                let playing = hud.music.is_some();
                if playing {
                    self.world.resource_mut::<AudioState>().start_music(track);
                }
            }
            Button::Loop => {
                let mut hud = self.world.resource_mut::<Hud>();
                hud.looping = !hud.looping;
            }
            Button::Info => {
                if self.world.resource::<Hud>().help_visible() {
                    self.world.resource_mut::<Hud>().close_help();
                    self.resume_clock();
                } else {
                    self.page_help();
                }
            }
            Button::Restart => self.restart(true),
        }
        let mut status = self.world.resource_mut::<Status>();
        status.update_needed = true;
        if button != Button::Restart && button != Button::Info {
            status.store_prefs = true;
        }
    }

    // Steps through the help pages; the clock pauses while they show
    fn page_help(&mut self) {
        if self.world.resource_mut::<Hud>().next_help_page() {
            self.world.resource_mut::<ClockControl>().stop();
        } else {
            self.resume_clock();
        }
        self.world.resource_mut::<Status>().update_needed = true;
    }

    fn resume_clock(&mut self) {
        if !self.is_game_over() {
            self.world.resource_mut::<ClockControl>().start();
        }
    }

    fn change_volume(&mut self, delta: i32) {
        let volume = i32::from(self.world.resource::<Hud>().volume) + delta;
        self.set_volume(volume);
    }

    fn set_volume(&mut self, volume: i32) {
        let volume = self.world.resource_mut::<Hud>().set_volume(volume);
        self.world.resource_mut::<AudioState>().set_volume(volume);
        let mut status = self.world.resource_mut::<Status>();
        status.update_needed = true;
        status.store_prefs = true;
    }

    /// Stops the game. A game in progress is saved, changed preferences too.
    pub fn quit(&mut self) {
        let game_over = self.is_game_over();
        let in_progress = !game_over && self.world.resource::<Board>().running();

        let mut status = self.world.resource_mut::<Status>();
        status.running = false;
        let store_prefs = status.store_prefs;

        let mut outbox = self.world.resource_mut::<Outbox>();
        if in_progress {
            outbox.chores.push(Chore::SaveBoard);
        }
        if store_prefs || in_progress {
            outbox.chores.push(Chore::SavePrefs);
        }
        self.world.resource_mut::<ClockControl>().quit();
        info!("Quitting");
    }

    fn prefs(&self) -> Prefs {
        let hud = self.world.resource::<Hud>();
        Prefs {
            volume: hud.volume,
            music: hud.music.is_some(),
            track: hud.track,
            looping: hud.looping,
            elapsed: hud.timer.seconds,
        }
    }

    fn task(&self, chore: Chore) -> FileTask {
        match chore {
            Chore::DeleteSave => FileTask::Delete(self.paths.save.clone()),
            Chore::SaveHiscores => FileTask::SaveHiscores(
                self.paths.scores.clone(),
                self.world.resource::<Hud>().hiscores.clone(),
            ),
            Chore::SaveBoard => FileTask::SaveBoard(
                self.paths.save.clone(),
                self.world.resource::<Board>().snapshot(),
            ),
            Chore::SavePrefs => FileTask::SavePrefs(self.paths.prefs.clone(), self.prefs()),
        }
    }

    // Plays the queued cues and turns the chores into file tasks
    pub fn take_outcome(&mut self) -> Outcome {
        let outbox = std::mem::take(&mut *self.world.resource_mut::<Outbox>());
        {
            let audio = self.world.resource::<AudioState>();
            for &cue in &outbox.cues {
                audio.play_sound(cue);
            }
        }
        let tasks = outbox.chores.iter().map(|&chore| self.task(chore)).collect();

        let mut status = self.world.resource_mut::<Status>();
        let redraw = std::mem::take(&mut status.update_needed);
        Outcome {
            redraw,
            cues: outbox.cues,
            tasks,
        }
    }
}

// A record showing a ball at rest, without animation
fn settle(record: &mut BallRecord, value: Cell) {
    if value != EMPTY {
        record.value = value;
        record.occupiable = true;
        record.effect = Effect::None;
    }
}
