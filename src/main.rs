#![warn(clippy::all, clippy::pedantic)]

use std::io;
use std::os::fd::AsRawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use colorlines::app::{App, AppResult};
use colorlines::board::Board;
use colorlines::clock::{ClockControl, spawn_clock};
use colorlines::config::{self, Config, GamePaths};
use colorlines::coordinator::{
    RedrawGate, lock, run_event_loop, spawn_input_reader, spawn_ticker,
};
use colorlines::game::{CLOCK_MS, TICK_MS};
use colorlines::sound::AudioState;
use colorlines::ui::{self, Palette};
use crossbeam_channel::unbounded;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, prelude::*};

fn main() -> AppResult<()> {
    // Configuration and assets are checked while stderr still reaches the terminal
    let config = match config::loader::load_config_from_file() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration, using defaults: {e}");
            Config::default()
        }
    };
    let palette =
        Palette::load(&config.theme).map_err(|e| format!("Failed to load assets: {e:#}"))?;
    let paths = GamePaths::resolve()?;

    // Create log file and redirect stderr to it
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("colorlines.log")?;

    // Safety: both descriptors stay open for the duration of the call
    unsafe {
        libc::dup2(log_file.as_raw_fd(), io::stderr().as_raw_fd());
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_module_path(false)
        .init();

    info!("Starting Color Lines");

    let audio = AudioState::new();
    let finished_tracks = audio.finished_tracks();
    let (clock, clock_commands) = ClockControl::channel();
    let mut app = App::new(paths, audio, clock, Board::new());

    // Terminal initialization
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    app.set_geometry(ui::layout(Rect::new(0, 0, size.width, size.height)));
    app.prepare();
    let app = Arc::new(Mutex::new(app));

    let (sender, events) = unbounded();
    let gate = RedrawGate::new(sender.clone());
    let stop_input = Arc::new(AtomicBool::new(false));

    let clock_thread = {
        let app = Arc::clone(&app);
        let gate = gate.clone();
        spawn_clock(clock_commands, Duration::from_millis(CLOCK_MS), move || {
            lock(&app).clock_tick();
            gate.request();
        })
    };
    let tick_thread = spawn_ticker(Arc::clone(&app), gate.clone(), Duration::from_millis(TICK_MS));
    let input_thread = spawn_input_reader(sender, Arc::clone(&stop_input));

    let res = run_event_loop(&mut terminal, &app, &events, &finished_tracks, &gate, &palette);

    stop_input.store(true, Ordering::Release);
    {
        let mut app = lock(&app);
        if app.is_running() {
            // The loop ended on an error; still save what the player has
            app.quit();
            for task in app.take_outcome().tasks {
                task.run();
            }
        }
        app.world.resource_mut::<AudioState>().shutdown();
    }
    for handle in [tick_thread, input_thread, clock_thread] {
        let _ = handle.join();
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Game error: {err:?}");
    }
    info!("Bye");

    Ok(())
}
