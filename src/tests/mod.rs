#![warn(clippy::all, clippy::pedantic)]

pub mod board_tests;
pub mod hud_tests;
pub mod render_tests;
pub mod systems_tests;
