#![warn(clippy::all, clippy::pedantic)]
#![allow(
    // Sample counts and rates are converted freely between integer and float types
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use anyhow::Result;
use bevy_ecs::system::Resource;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use crossbeam_channel::{Receiver, Sender, bounded};
use fundsp::hacker32::*;
use log::{debug, error, info};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::game::VOLUME_MAX;

// Sound effects the game can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundEffect {
    Boom,
    Paint,
    Fadeout,
    Click,
    Bonus,
    Hiscore,
    GameOver,
}

impl SoundEffect {
    // How long a voice for this effect stays in the mix
    #[must_use]
    pub fn duration(self) -> f64 {
        match self {
            SoundEffect::Click => 0.05,
            SoundEffect::Fadeout => 0.35,
            SoundEffect::Paint => 0.5,
            SoundEffect::Boom => 0.8,
            SoundEffect::Bonus => 0.8,
            SoundEffect::Hiscore => 1.0,
            SoundEffect::GameOver => 1.6,
        }
    }
}

pub const TRACKS: [&str; 3] = ["Marble Drift", "Five in a Row", "Quiet Board"];
pub const TRACK_SECONDS: f64 = 96.0;

// Command to control the audio thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCommand {
    PlaySound(SoundEffect),
    PlayMusic(Option<usize>), // track to start, none to stop
    SetVolume(u16),           // 0 to 256
    Quit,
}

// Handle to the audio thread
#[derive(Resource)]
pub struct AudioState {
    sender: Option<Sender<AudioCommand>>,
    finished: Receiver<usize>,
    available: Arc<AtomicBool>,
    volume: u16,
    music: Option<usize>,
}

impl AudioState {
    pub fn new() -> Self {
        let (sender, receiver) = bounded(64);
        let (finished_sender, finished) = bounded(4);
        let available = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&available);

        thread::spawn(move || {
            if let Err(e) = run_audio_thread(receiver, finished_sender) {
                error!("Audio thread error: {e}");
                flag.store(false, Ordering::Relaxed);
            }
        });

        Self {
            sender: Some(sender),
            finished,
            available,
            volume: VOLUME_MAX,
            music: None,
        }
    }

    /// A handle that never makes a sound.
    #[must_use]
    pub fn disabled() -> Self {
        let (_, finished) = bounded(1);
        Self {
            sender: None,
            finished,
            available: Arc::new(AtomicBool::new(false)),
            volume: VOLUME_MAX,
            music: None,
        }
    }

    fn send(&self, command: AudioCommand) {
        if let Some(sender) = &self.sender {
            let _ = sender.try_send(command);
        }
    }

    pub fn play_sound(&self, effect: SoundEffect) -> bool {
        if self.is_audio_available() {
            self.send(AudioCommand::PlaySound(effect));
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn is_audio_available(&self) -> bool {
        self.sender.is_some() && self.available.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn get_volume(&self) -> u16 {
        self.volume
    }

    pub fn set_volume(&mut self, volume: u16) {
        self.volume = std::cmp::Ord::min(volume, VOLUME_MAX);
        self.send(AudioCommand::SetVolume(self.volume));
    }

    #[must_use]
    pub fn music(&self) -> Option<usize> {
        self.music
    }

    pub fn start_music(&mut self, track: usize) {
        self.music = Some(track % TRACKS.len());
        self.send(AudioCommand::PlayMusic(self.music));
    }

    pub fn stop_music(&mut self) {
        self.music = None;
        self.send(AudioCommand::PlayMusic(None));
    }

    /// Receives the index of every track that played to its end.
    #[must_use]
    pub fn finished_tracks(&self) -> Receiver<usize> {
        self.finished.clone()
    }

    pub fn shutdown(&mut self) {
        self.send(AudioCommand::Quit);
        self.sender = None;
    }
}

impl Default for AudioState {
    fn default() -> Self {
        Self::new()
    }
}

fn run_audio_thread(receiver: Receiver<AudioCommand>, finished: Sender<usize>) -> Result<()> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("No audio output device found"))?;
    let config = device.default_output_config()?;
    info!("Audio output: {} Hz", config.sample_rate().0);

    let (mixer_sender, mixer_receiver) = bounded::<AudioCommand>(64);

    let _stream = match config.sample_format() {
        cpal::SampleFormat::F32 => {
            run_audio_stream::<f32>(&device, &config.into(), mixer_receiver, finished)?
        }
        cpal::SampleFormat::I16 => {
            run_audio_stream::<i16>(&device, &config.into(), mixer_receiver, finished)?
        }
        cpal::SampleFormat::U16 => {
            run_audio_stream::<u16>(&device, &config.into(), mixer_receiver, finished)?
        }
        _ => return Err(anyhow::anyhow!("Unsupported audio format")),
    };

    // Keep the stream alive and forward commands to the mixer
    while let Ok(command) = receiver.recv() {
        if command == AudioCommand::Quit {
            break;
        }
        let _ = mixer_sender.try_send(command);
    }
    debug!("Audio thread stopped");

    Ok(())
}

fn run_audio_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    commands: Receiver<AudioCommand>,
    finished: Sender<usize>,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = config.channels as usize;
    let mut mixer = Mixer::new(f64::from(config.sample_rate.0), finished);

    let err_fn = |err| error!("Error in audio stream: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            while let Ok(command) = commands.try_recv() {
                mixer.apply(command);
            }
            for frame in data.chunks_mut(channels) {
                let (left, right) = mixer.next_frame();
                let left = T::from_sample(left);
                let right = T::from_sample(right);

                for (channel, sample) in frame.iter_mut().enumerate() {
                    if channel & 1 == 0 {
                        *sample = left;
                    } else {
                        *sample = right;
                    }
                }
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok(stream)
}

struct Voice {
    unit: Box<dyn AudioUnit>,
    remaining: u64,
}

struct Track {
    index: usize,
    unit: Box<dyn AudioUnit>,
    remaining: u64,
}

/// Sums the active effect voices and the music track into stereo frames.
pub struct Mixer {
    sample_rate: f64,
    volume: u16,
    track_seconds: f64,
    voices: Vec<Voice>,
    music: Option<Track>,
    finished: Sender<usize>,
}

impl Mixer {
    #[must_use]
    pub fn new(sample_rate: f64, finished: Sender<usize>) -> Self {
        Self {
            sample_rate,
            volume: VOLUME_MAX,
            track_seconds: TRACK_SECONDS,
            voices: Vec::new(),
            music: None,
            finished,
        }
    }

    #[must_use]
    pub fn with_track_seconds(mut self, seconds: f64) -> Self {
        self.track_seconds = seconds;
        self
    }

    fn samples(&self, seconds: f64) -> u64 {
        (seconds * self.sample_rate) as u64
    }

    pub fn apply(&mut self, command: AudioCommand) {
        match command {
            AudioCommand::PlaySound(effect) => {
                let mut unit = create_sound_effect(effect);
                unit.set_sample_rate(self.sample_rate);
                let remaining = self.samples(effect.duration());
                self.voices.push(Voice { unit, remaining });
            }
            AudioCommand::PlayMusic(Some(index)) => {
                let mut unit = create_track(index);
                unit.set_sample_rate(self.sample_rate);
                let remaining = self.samples(self.track_seconds);
                self.music = Some(Track {
                    index,
                    unit,
                    remaining,
                });
            }
            AudioCommand::PlayMusic(None) => self.music = None,
            AudioCommand::SetVolume(volume) => self.volume = std::cmp::Ord::min(volume, VOLUME_MAX),
            AudioCommand::Quit => {}
        }
    }

    #[must_use]
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    #[must_use]
    pub fn playing_track(&self) -> Option<usize> {
        self.music.as_ref().map(|track| track.index)
    }

    pub fn next_frame(&mut self) -> (f32, f32) {
        let mut left = 0.0;
        let mut right = 0.0;

        for voice in &mut self.voices {
            let (l, r) = voice.unit.get_stereo();
            left += l;
            right += r;
            voice.remaining = voice.remaining.saturating_sub(1);
        }
        self.voices.retain(|voice| voice.remaining > 0);

        if let Some(track) = &mut self.music {
            let (l, r) = track.unit.get_stereo();
            left += l;
            right += r;
            track.remaining = track.remaining.saturating_sub(1);
            if track.remaining == 0 {
                let _ = self.finished.try_send(track.index);
                self.music = None;
            }
        }

        let gain = f32::from(self.volume) / f32::from(VOLUME_MAX);
        (
            (left * gain).clamp(-1.0, 1.0),
            (right * gain).clamp(-1.0, 1.0),
        )
    }
}

// Deep thud with a noisy tail
fn create_boom() -> Box<dyn AudioUnit> {
    let body = sine_hz(60.0) * 0.5 + noise() * 0.3;
    let node = body * envelope(|t| (-5.0 * t).exp());
    Box::new(node >> pan(0.0))
}

// Quick upward sweep for the brush
fn create_paint() -> Box<dyn AudioUnit> {
    let sweep = envelope(|t| 400.0 + 1600.0 * t.min(0.4)) >> sine();
    let node = sweep * envelope(|t| if t < 0.4 { 0.3 } else { 0.0 * t });
    Box::new(node >> pan(-0.2))
}

// Soft falling tone for balls that fade away
fn create_fadeout() -> Box<dyn AudioUnit> {
    let sweep = envelope(|t| (700.0 - 900.0 * t).max(200.0)) >> sine();
    let node = sweep * envelope(|t| (0.35 - t).max(0.0) * 0.8);
    Box::new(node >> pan(0.2))
}

// Short tick for every score point
fn create_click() -> Box<dyn AudioUnit> {
    let node = sine_hz(1200.0) * envelope(|t| if t < 0.02 { 0.15 } else { 0.0 * t });
    Box::new(node >> pan(0.0))
}

// Arpeggio helper: a note sounding between two instants
fn note(freq: f32, start: f32, end: f32, level: f32) -> An<impl AudioNode<Inputs = U0, Outputs = U1>> {
    sine_hz(freq) * envelope(move |t| if t >= start && t < end { level } else { 0.0 * t })
}

fn create_bonus() -> Box<dyn AudioUnit> {
    let node = (note(523.0, 0.0, 0.2, 0.3) + note(659.0, 0.2, 0.4, 0.3) + note(784.0, 0.4, 0.8, 0.3))
        * 0.8;
    Box::new(node >> pan(0.0))
}

fn create_hiscore() -> Box<dyn AudioUnit> {
    let node = (note(330.0, 0.0, 0.2, 1.0)
        + note(392.0, 0.2, 0.4, 1.0)
        + note(494.0, 0.4, 0.6, 1.0)
        + note(659.0, 0.6, 1.0, 1.0))
        * 0.4;
    Box::new(node >> pan(0.0))
}

fn create_game_over() -> Box<dyn AudioUnit> {
    let sweep = envelope(|t| (600.0 - 250.0 * t).max(100.0)) >> sine();
    let node = sweep * envelope(|t| (1.6 - t).max(0.0) * 0.25);
    Box::new(node >> pan(0.0))
}

// Create a sound effect based on type
fn create_sound_effect(effect: SoundEffect) -> Box<dyn AudioUnit> {
    match effect {
        SoundEffect::Boom => create_boom(),
        SoundEffect::Paint => create_paint(),
        SoundEffect::Fadeout => create_fadeout(),
        SoundEffect::Click => create_click(),
        SoundEffect::Bonus => create_bonus(),
        SoundEffect::Hiscore => create_hiscore(),
        SoundEffect::GameOver => create_game_over(),
    }
}

// Background music: each track walks its own scale at its own pace
fn create_track(index: usize) -> Box<dyn AudioUnit> {
    let (scale, pace, root): ([f32; 5], f32, f32) = match index % TRACKS.len() {
        0 => ([220.0, 261.63, 293.66, 349.23, 392.0], 0.5, 110.0),
        1 => ([246.94, 293.66, 329.63, 392.0, 440.0], 1.0, 123.47),
        _ => ([196.0, 233.08, 261.63, 311.13, 349.23], 0.25, 98.0),
    };

    let bass = sine_hz(root) * 0.08;
    let melody = lfo(move |t| {
        let idx = ((t * pace) % 5.0) as usize;
        scale[idx]
    }) >> sine() * 0.1;
    let pad = sine_hz(scale[0]) * 0.03 + sine_hz(scale[2]) * 0.02 + sine_hz(scale[4]) * 0.02;
    let pulse = lfo(move |t| if (t * 2.0 * pace) % 1.0 < 0.1 { 0.05 } else { 0.0 * t })
        * sine_hz(scale[0] * 2.0);

    let music = (bass + melody + pad + pulse) * 0.6;
    Box::new(music >> pan(0.0))
}
