#![warn(clippy::all, clippy::pedantic)]

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, never, select, tick, unbounded};
use log::{debug, trace};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockCommand {
    Start,
    Stop,
    Quit,
}

/// Handle to the one-second clock thread.
#[derive(Resource, Debug)]
pub struct ClockControl {
    sender: Option<Sender<ClockCommand>>,
    running: bool,
}

impl ClockControl {
    /// Creates the handle together with the receiving end for `spawn_clock`.
    #[must_use]
    pub fn channel() -> (Self, Receiver<ClockCommand>) {
        let (sender, receiver) = unbounded();
        (
            Self {
                sender: Some(sender),
                running: false,
            },
            receiver,
        )
    }

    /// A handle with no thread behind it; only the running flag changes.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            sender: None,
            running: false,
        }
    }

    fn send(&self, command: ClockCommand) {
        if let Some(sender) = &self.sender {
            let _ = sender.send(command);
        }
    }

    pub fn start(&mut self) {
        self.running = true;
        self.send(ClockCommand::Start);
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.send(ClockCommand::Stop);
    }

    pub fn quit(&mut self) {
        self.running = false;
        self.send(ClockCommand::Quit);
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// Runs `on_tick` every `period` while started. Starting again restarts
/// the phase, so a resumed clock waits a full period before its next tick.
pub fn spawn_clock<F>(commands: Receiver<ClockCommand>, period: Duration, mut on_tick: F) -> JoinHandle<()>
where
    F: FnMut() + Send + 'static,
{
    thread::spawn(move || {
        let mut ticker: Receiver<Instant> = never();
        loop {
            select! {
                recv(commands) -> command => match command {
                    Ok(ClockCommand::Start) => {
                        trace!("Clock started");
                        ticker = tick(period);
                    }
                    Ok(ClockCommand::Stop) => {
                        trace!("Clock stopped");
                        ticker = never();
                    }
                    Ok(ClockCommand::Quit) | Err(_) => break,
                },
                recv(ticker) -> _ => on_tick(),
            }
        }
        debug!("Clock thread stopped");
    })
}
