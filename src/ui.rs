#![warn(clippy::all, clippy::pedantic)]
#![allow(
    // Screen coordinates are small, casts between u16, i32 and usize never wrap
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss
)]

use anyhow::{Context, Result, bail};
use bevy_ecs::prelude::Resource;
use ratatui::{
    buffer::Buffer,
    layout::Position,
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use std::str::FromStr;

use crate::app::Scene;
use crate::config::ThemeConfig;
use crate::game::{
    ALPHA_STEPS, BALLS_NR, BOARD_H, BOARD_W, Cell, POOL_SIZE, SIZE_STEPS, TILE_HEIGHT, TILE_WIDTH,
    VOLUME_MAX,
};
use crate::hud::HELP_PAGES;
use crate::render::{Look, Sprite};

// Each tile is drawn as a block of character cells
pub const CELL_COLS: u16 = 4;
pub const CELL_ROWS: u16 = 2;

const BOARD_COLS: u16 = BOARD_W as u16 * CELL_COLS;
const BOARD_ROWS: u16 = BOARD_H as u16 * CELL_ROWS;
const PANEL_X: u16 = BOARD_COLS + 4;
const PANEL_WIDTH: u16 = 24;
const VOLUME_WIDTH: u16 = 17;

pub const MIN_WIDTH: u16 = PANEL_X + PANEL_WIDTH;
pub const MIN_HEIGHT: u16 = BOARD_ROWS + 3;

const HELP_TEXT: [&str; HELP_PAGES] = [
    "COLOR LINES\n\n\
     Move balls to build lines of five or more of one colour, \
     across, down or diagonally. Lines vanish and score.\n\n\
     Every move that clears nothing drops the three balls \
     shown in the pool onto the board.",
    "BONUS BALLS\n\n\
     Joker: fits any line and doubles its score.\n\
     Bomb: fits any line and takes every ball of that colour with it.\n\
     Brush: paints its neighbours one colour.\n\
     Boom: blows up its neighbours.",
    "CONTROLS\n\n\
     Click a ball, then an empty square to move it there.\n\
     Arrows + Enter: same with the keyboard\n\
     m: music   t: next track   l: loop\n\
     +/-: volume   r: new game   i: help   q: quit",
];

/// Clickable controls of the side panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Button {
    Music,
    Track,
    Loop,
    #[default]
    Info,
    Restart,
}

/// Screen areas used for mouse hit-testing.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Geometry {
    pub board: Rect,
    pub pool: Rect,
    pub score: Rect,
    pub hiscores: Rect,
    pub timer: Rect,
    pub volume: Rect,
    pub title: Rect,
    pub buttons: [(Button, Rect); 5],
}

impl Geometry {
    #[must_use]
    pub fn cell_at(&self, col: u16, row: u16) -> Option<(usize, usize)> {
        if !self.board.contains(Position::new(col, row)) {
            return None;
        }
        let x = usize::from((col - self.board.x) / CELL_COLS);
        let y = usize::from((row - self.board.y) / CELL_ROWS);
        (x < BOARD_W && y < BOARD_H).then_some((x, y))
    }

    /// Volume under the pointer, from 0 at the left end to the maximum at
    /// the right end.
    #[must_use]
    pub fn volume_at(&self, col: u16, row: u16) -> Option<i32> {
        if !self.volume.contains(Position::new(col, row)) {
            return None;
        }
        let span = i32::from(self.volume.width.max(2) - 1);
        Some(i32::from(col - self.volume.x) * i32::from(VOLUME_MAX) / span)
    }

    #[must_use]
    pub fn button_at(&self, col: u16, row: u16) -> Option<Button> {
        self.buttons
            .iter()
            .find(|(_, rect)| rect.contains(Position::new(col, row)))
            .map(|&(button, _)| button)
    }

    fn button(&self, button: Button) -> Rect {
        self.buttons
            .iter()
            .find(|(b, _)| *b == button)
            .map(|&(_, rect)| rect)
            .unwrap_or_default()
    }
}

/// Places the board and the side panel inside `area`.
#[must_use]
pub fn layout(area: Rect) -> Geometry {
    let x = area.x;
    let y = area.y;
    let px = x + PANEL_X;
    let row = |n: u16, width: u16| Rect::new(px, y + n, width, 1);

    Geometry {
        board: Rect::new(x + 1, y + 2, BOARD_COLS, BOARD_ROWS),
        pool: Rect::new(px + 1, y + 2, POOL_SIZE as u16 * CELL_COLS, CELL_ROWS),
        score: row(5, PANEL_WIDTH),
        hiscores: Rect::new(px, y + 7, PANEL_WIDTH, 6),
        timer: row(13, PANEL_WIDTH),
        volume: row(15, VOLUME_WIDTH),
        title: row(16, PANEL_WIDTH),
        buttons: [
            (Button::Music, row(18, 7)),
            (Button::Track, Rect::new(px + 8, y + 18, 7, 1)),
            (Button::Loop, row(19, 6)),
            (Button::Info, Rect::new(px + 7, y + 19, 6, 1)),
            (Button::Restart, Rect::new(px + 14, y + 19, 9, 1)),
        ],
    }
}

/// Colours and glyphs, built once from the theme.
#[derive(Debug, Clone)]
pub struct Palette {
    pub balls: Vec<Color>,
    pub tile: Color,
    pub text: Color,
    pub accent: Color,
    pub ball_glyph: String,
    pub small_glyph: String,
    pub squashed_glyph: String,
}

fn parse_color(name: &str) -> Result<Color> {
    Color::from_str(name).with_context(|| format!("Unknown colour '{name}'"))
}

impl Palette {
    pub fn load(theme: &ThemeConfig) -> Result<Self> {
        if theme.ball_colors.len() != BALLS_NR {
            bail!(
                "Theme lists {} ball colours, {BALLS_NR} are needed",
                theme.ball_colors.len()
            );
        }
        for glyph in [&theme.ball_glyph, &theme.small_glyph, &theme.squashed_glyph] {
            if glyph.is_empty() {
                bail!("Theme glyphs must not be empty");
            }
        }

        Ok(Self {
            balls: theme
                .ball_colors
                .iter()
                .map(|name| parse_color(name))
                .collect::<Result<_>>()?,
            tile: parse_color(&theme.tile_color)?,
            text: parse_color(&theme.text_color)?,
            accent: parse_color(&theme.accent_color)?,
            ball_glyph: theme.ball_glyph.clone(),
            small_glyph: theme.small_glyph.clone(),
            squashed_glyph: theme.squashed_glyph.clone(),
        })
    }

    #[must_use]
    pub fn ball(&self, ball: Cell) -> Color {
        usize::from(ball)
            .checked_sub(1)
            .and_then(|index| self.balls.get(index))
            .copied()
            .unwrap_or(self.text)
    }
}

// The area of a block whose inner area is `inner`
fn framed(inner: Rect) -> Rect {
    Rect::new(inner.x - 1, inner.y - 1, inner.width + 2, inner.height + 2)
}

// Pixel offset to character offset, rounded to the nearest cell
fn to_cells(px: i32, cells: u16, tile: i32) -> i32 {
    let scaled = px * i32::from(cells) * 2;
    (scaled + px.signum() * tile) / (2 * tile)
}

pub fn render(f: &mut Frame, scene: &Scene, palette: &Palette) {
    let area = f.area();
    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let warning = Paragraph::new(
            "Terminal too small!\nPlease resize your terminal\nto continue playing.",
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Color Lines"));
        f.render_widget(warning, centered_rect(60, 40, area));
        return;
    }

    let geometry = layout(area);
    let text = Style::default().fg(palette.text);

    let board_block = Block::default()
        .borders(Borders::ALL)
        .title(" COLOR LINES ")
        .border_style(Style::default().fg(palette.tile));
    f.render_widget(board_block, framed(geometry.board));
    let pool_block = Block::default()
        .borders(Borders::ALL)
        .title(" Next ")
        .border_style(Style::default().fg(palette.tile));
    f.render_widget(pool_block, framed(geometry.pool));

    let buf = f.buffer_mut();
    render_tiles(buf, &geometry, scene, palette);

    let score_style = if scene.hud.ticker.is_blinking() {
        Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
    } else {
        text
    };
    f.render_widget(
        Paragraph::new(scene.hud.ticker.label()).style(score_style),
        geometry.score,
    );

    let best: Vec<Line> = std::iter::once(Line::from("Best"))
        .chain(
            scene
                .hud
                .hiscores
                .scores
                .iter()
                .enumerate()
                .map(|(rank, score)| Line::from(format!("{}. {score:>6}", rank + 1))),
        )
        .collect();
    f.render_widget(Paragraph::new(best).style(text), geometry.hiscores);
    f.render_widget(
        Paragraph::new(format!("Time: {}", scene.hud.timer.label())).style(text),
        geometry.timer,
    );

    render_volume(f, &geometry, scene, palette);
    render_buttons(f, &geometry, scene, palette);

    if let Some(message) = &scene.hud.message {
        let board = geometry.board;
        let line = Rect::new(board.x, board.y + board.height / 2, board.width, 1);
        f.render_widget(Clear, line);
        f.render_widget(
            Paragraph::new(message.as_str())
                .alignment(Alignment::Center)
                .style(Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)),
            line,
        );
    }

    if let Some(page) = scene.hud.help {
        let area = geometry.board;
        f.render_widget(Clear, area);
        let help = Paragraph::new(HELP_TEXT[page.min(HELP_PAGES - 1)])
            .style(text)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Help {}/{HELP_PAGES} ", page + 1)),
            );
        f.render_widget(help, area);
    }
}

fn render_tiles(buf: &mut Buffer, geometry: &Geometry, scene: &Scene, palette: &Palette) {
    let tile_style = Style::default().fg(palette.tile);
    let cursor_style = Style::default().fg(palette.accent);

    // Backgrounds first, sprites may reach into neighbouring tiles
    for x in 0..BOARD_W {
        for y in 0..BOARD_H {
            let col = geometry.board.x + x as u16 * CELL_COLS;
            let row = geometry.board.y + y as u16 * CELL_ROWS;
            let style = if scene.hud.cursor == (x, y) && scene.hud.help.is_none() {
                cursor_style
            } else {
                tile_style
            };
            buf.set_string(col, row, "·", style);
        }
    }

    for x in 0..BOARD_W {
        for y in 0..BOARD_H {
            if let Some(sprite) = scene.canvas.board[x][y] {
                let origin = (
                    i32::from(geometry.board.x + x as u16 * CELL_COLS),
                    i32::from(geometry.board.y + y as u16 * CELL_ROWS),
                );
                draw_sprite(buf, geometry.board, origin, sprite, palette);
            }
        }
    }
    for (index, tile) in scene.canvas.pool.iter().enumerate() {
        if let Some(sprite) = *tile {
            let origin = (
                i32::from(geometry.pool.x + index as u16 * CELL_COLS),
                i32::from(geometry.pool.y),
            );
            draw_sprite(buf, geometry.pool, origin, sprite, palette);
        }
    }
}

// Draws one sprite anchored at the top left corner of its tile
fn draw_sprite(buf: &mut Buffer, clip: Rect, origin: (i32, i32), sprite: Sprite, palette: &Palette) {
    let col = origin.0 + 1 + to_cells(sprite.dx, CELL_COLS, TILE_WIDTH);
    let row = origin.1 + to_cells(sprite.dy, CELL_ROWS, TILE_HEIGHT);
    let mut style = Style::default().fg(palette.ball(sprite.ball));

    let ball = palette.ball_glyph.as_str();
    let small = palette.small_glyph.as_str();
    let squashed = palette.squashed_glyph.as_str();

    let (top, bottom) = match sprite.look {
        Look::Scaled(size) if size < SIZE_STEPS / 3 => (None, Some(small)),
        Look::Scaled(size) if size < 2 * SIZE_STEPS / 3 => (None, Some(ball)),
        Look::Faded(alpha) => {
            if alpha < ALPHA_STEPS / 2 {
                style = style.add_modifier(Modifier::DIM);
            }
            if alpha < ALPHA_STEPS / 4 {
                (None, Some(small))
            } else {
                (Some(ball), Some(ball))
            }
        }
        Look::Blended { from, alpha } => {
            if alpha < ALPHA_STEPS / 2 {
                style = style.fg(palette.ball(from));
            }
            (Some(ball), Some(ball))
        }
        Look::Squashed(level) if level >= 4 => (None, Some(squashed)),
        Look::Solid | Look::Scaled(_) | Look::Squashed(_) => (Some(ball), Some(ball)),
    };

    for (offset, glyph) in [(0, top), (1, bottom)] {
        let Some(glyph) = glyph else {
            continue;
        };
        let (c, r) = (col, row + offset);
        let inside = c >= i32::from(clip.x)
            && r >= i32::from(clip.y)
            && c < i32::from(clip.right())
            && r < i32::from(clip.bottom());
        if inside {
            buf.set_string(c as u16, r as u16, glyph, style);
        }
    }
}

fn render_volume(f: &mut Frame, geometry: &Geometry, scene: &Scene, palette: &Palette) {
    let width = usize::from(geometry.volume.width);
    let filled = usize::from(scene.hud.volume) * width / usize::from(VOLUME_MAX);
    let bar = Line::from(vec![
        Span::styled("█".repeat(filled), Style::default().fg(palette.accent)),
        Span::styled("░".repeat(width - filled), Style::default().fg(palette.tile)),
    ]);
    f.render_widget(Paragraph::new(bar), geometry.volume);

    let label = if scene.audio_available {
        format!(" {}", scene.hud.volume)
    } else {
        " mute".to_string()
    };
    let rest = Rect::new(
        geometry.volume.right(),
        geometry.volume.y,
        PANEL_WIDTH - geometry.volume.width,
        1,
    );
    f.render_widget(
        Paragraph::new(label).style(Style::default().fg(palette.text)),
        rest,
    );
    f.render_widget(
        Paragraph::new(format!("♪ {}", scene.hud.track_title()))
            .style(Style::default().fg(palette.text)),
        geometry.title,
    );
}

fn render_buttons(f: &mut Frame, geometry: &Geometry, scene: &Scene, palette: &Palette) {
    let on = Style::default().fg(palette.accent);
    let off = Style::default().fg(palette.tile);
    let labels = [
        (Button::Music, "[Music]", scene.hud.music.is_some()),
        (Button::Track, "[Track]", true),
        (Button::Loop, "[Loop]", scene.hud.looping),
        (Button::Info, "[Info]", scene.hud.help.is_some()),
        (Button::Restart, "[Restart]", scene.game_over),
    ];
    for (button, label, lit) in labels {
        f.render_widget(
            Paragraph::new(label).style(if lit { on } else { off }),
            geometry.button(button),
        );
    }
}

/// Helper function to create a centered rect using up certain percentage of the available rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
