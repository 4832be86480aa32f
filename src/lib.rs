pub mod app;
pub mod board;
pub mod clock;
pub mod components;
pub mod config;
pub mod coordinator;
pub mod effects;
pub mod game;
pub mod hud;
pub mod render;
pub mod sound;
pub mod sync;
pub mod systems;
pub mod ui;

#[cfg(test)]
mod tests;
