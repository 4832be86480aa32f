#![warn(clippy::all, clippy::pedantic)]

use crossbeam_channel::{Receiver, Sender, never, select, tick};
use crossterm::event::{self, Event};
use log::{debug, error, trace};
use ratatui::{Terminal, prelude::*};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::app::{App, AppResult, Outcome};
use crate::ui::{self, Palette};

pub type SharedApp = Arc<Mutex<App>>;

// How long the input reader waits for an event before checking for shutdown
const INPUT_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub enum AppEvent {
    Input(Event),
    Redraw,
}

/// Locks the shared app, recovering it if another thread panicked while
/// holding the lock.
pub fn lock(app: &SharedApp) -> MutexGuard<'_, App> {
    app.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Posts at most one `Redraw` until the event loop has drawn.
#[derive(Debug, Clone)]
pub struct RedrawGate {
    pending: Arc<AtomicBool>,
    sender: Sender<AppEvent>,
}

impl RedrawGate {
    #[must_use]
    pub fn new(sender: Sender<AppEvent>) -> Self {
        Self {
            pending: Arc::new(AtomicBool::new(false)),
            sender,
        }
    }

    /// Returns whether a new redraw event was posted.
    pub fn request(&self) -> bool {
        if self.pending.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.sender.send(AppEvent::Redraw).is_ok()
    }

    /// Called right before drawing; later changes post a new request.
    pub fn drawn(&self) {
        self.pending.store(false, Ordering::Release);
    }
}

// File work and the redraw request happen outside the lock
fn finish(outcome: &Outcome, gate: &RedrawGate) {
    for task in &outcome.tasks {
        task.run();
    }
    if outcome.redraw {
        gate.request();
    }
}

/// Runs one tick of `app` every `period` until the game stops.
pub fn spawn_ticker(app: SharedApp, gate: RedrawGate, period: Duration) -> JoinHandle<()> {
    thread::spawn(move || {
        let ticker = tick(period);
        while ticker.recv().is_ok() {
            let outcome = {
                let mut app = lock(&app);
                if !app.is_running() {
                    break;
                }
                app.tick()
            };
            finish(&outcome, &gate);
        }
        debug!("Tick thread stopped");
    })
}

/// Forwards terminal events until `stop` is raised or the loop is gone.
pub fn spawn_input_reader(sender: Sender<AppEvent>, stop: Arc<AtomicBool>) -> JoinHandle<()> {
    thread::spawn(move || {
        while !stop.load(Ordering::Acquire) {
            match event::poll(INPUT_POLL) {
                Ok(true) => match event::read() {
                    Ok(event) => {
                        if sender.send(AppEvent::Input(event)).is_err() {
                            break;
                        }
                    }
                    Err(e) => error!("Failed to read terminal event: {e}"),
                },
                Ok(false) => {}
                Err(e) => {
                    error!("Failed to poll terminal events: {e}");
                    break;
                }
            }
        }
        debug!("Input thread stopped");
    })
}

fn draw<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &SharedApp,
    gate: &RedrawGate,
    palette: &Palette,
) -> AppResult<()> {
    gate.drawn();
    let scene = lock(app).scene();
    terminal.draw(|f| ui::render(f, &scene, palette))?;
    Ok(())
}

/// The main loop: waits for events and finished tracks, handles each one
/// under the lock and draws outside it.
pub fn run_event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &SharedApp,
    events: &Receiver<AppEvent>,
    finished_tracks: &Receiver<usize>,
    gate: &RedrawGate,
    palette: &Palette,
) -> AppResult<()> {
    draw(terminal, app, gate, palette)?;
    let mut finished = finished_tracks.clone();

    loop {
        select! {
            recv(events) -> event => match event {
                Ok(AppEvent::Input(event)) => {
                    let outcome = {
                        let mut app = lock(app);
                        if let Event::Resize(width, height) = event {
                            app.set_geometry(ui::layout(Rect::new(0, 0, width, height)));
                        }
                        app.handle_event(&event)
                    };
                    for task in &outcome.tasks {
                        task.run();
                    }
                    if outcome.redraw {
                        draw(terminal, app, gate, palette)?;
                    }
                }
                Ok(AppEvent::Redraw) => draw(terminal, app, gate, palette)?,
                Err(_) => break,
            },
            recv(finished) -> index => match index {
                Ok(index) => {
                    trace!("Track {index} finished");
                    lock(app).track_finished(index);
                    draw(terminal, app, gate, palette)?;
                }
                // The audio thread is gone, no more tracks will end
                Err(_) => finished = never(),
            },
        }

        if !lock(app).is_running() {
            break;
        }
    }

    Ok(())
}
