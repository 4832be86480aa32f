#![warn(clippy::all, clippy::pedantic)]
#![allow(
    // Allow truncation when casting from usize to i32 since board dimensions are always small enough to fit in i32
    clippy::cast_possible_truncation,
    // Allow sign loss when going from signed to unsigned types since we validate values are non-negative before casting
    clippy::cast_sign_loss,
    // Allow potential wrapping when casting between types as board coordinates are within reasonable ranges
    clippy::cast_possible_wrap
)]

use std::collections::VecDeque;
use std::path::Path;

use bevy_ecs::prelude::*;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::components::FlowId;
use crate::config::loader::{ConfigError, read_toml, write_toml};
use crate::game::{
    BALL_BOMB, BALL_BOOM, BALL_BRUSH, BALL_JOKER, BOARD_H, BOARD_W, BONUS_ODDS, COLORS_NR, Cell,
    EMPTY, LINE_MIN, POOL_SIZE,
};

const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

const NEIGHBOURS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// A committed move, handed to the animation side exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    pub from: (usize, usize),
    pub to: (usize, usize),
    pub flow: FlowId,
}

// What the next unit of board logic has to do
#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Pending {
    #[default]
    Idle,
    Landed(usize, usize),
    Drop,
    Restock(Vec<(usize, usize)>),
    Settle(Vec<(usize, usize)>),
}

#[must_use]
pub fn is_wild(cell: Cell) -> bool {
    cell == BALL_JOKER || cell == BALL_BOMB
}

#[must_use]
pub fn is_color(cell: Cell) -> bool {
    (1..=COLORS_NR).contains(&cell)
}

/// The logical game: occupancy, moves, paths, line removal and score.
#[derive(Resource, Debug, Clone)]
pub struct Board {
    cells: [[Cell; BOARD_H]; BOARD_W],
    pool: [Cell; POOL_SIZE],
    paths: [[Option<FlowId>; BOARD_H]; BOARD_W],
    selected: Option<(usize, usize)>,
    moved: Option<MoveRequest>,
    pending: Pending,
    score: u32,
    score_mul: u32,
    rng: fastrand::Rng,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub cells: Vec<Vec<Cell>>,
    pub pool: Vec<Cell>,
    pub score: u32,
    pub score_mul: u32,
}

impl Board {
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(fastrand::Rng::with_seed(seed))
    }

    fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            cells: [[EMPTY; BOARD_H]; BOARD_W],
            pool: [EMPTY; POOL_SIZE],
            paths: [[None; BOARD_H]; BOARD_W],
            selected: None,
            moved: None,
            pending: Pending::Idle,
            score: 0,
            score_mul: 1,
            rng,
        }
    }

    /// Starts a fresh game: empty board, full pool, first drop pending.
    pub fn init(&mut self) {
        self.cells = [[EMPTY; BOARD_H]; BOARD_W];
        self.paths = [[None; BOARD_H]; BOARD_W];
        self.selected = None;
        self.moved = None;
        self.score = 0;
        self.score_mul = 1;
        for slot in 0..POOL_SIZE {
            self.pool[slot] = self.random_ball();
        }
        self.pending = Pending::Drop;
        debug!("Board initialised with pool {:?}", self.pool);
    }

    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.cells[x][y]
    }

    #[must_use]
    pub fn pool_cell(&self, index: usize) -> Cell {
        self.pool[index]
    }

    pub fn set_cell(&mut self, x: usize, y: usize, cell: Cell) {
        self.cells[x][y] = cell;
    }

    pub fn set_pool_cell(&mut self, index: usize, cell: Cell) {
        self.pool[index] = cell;
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn score_mul(&self) -> u32 {
        self.score_mul
    }

    /// The game goes on while there is room for at least one more ball.
    #[must_use]
    pub fn running(&self) -> bool {
        self.cells.iter().flatten().any(|&cell| cell == EMPTY)
    }

    #[must_use]
    pub fn selected(&self) -> Option<(usize, usize)> {
        self.selected
    }

    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Selects a ball, or moves the selected ball to an empty square.
    pub fn select(&mut self, x: usize, y: usize) {
        if x >= BOARD_W || y >= BOARD_H || !self.running() {
            return;
        }

        if self.cells[x][y] != EMPTY {
            self.selected = Some((x, y));
            trace!("Selected ({x}, {y})");
            return;
        }

        let Some(from) = self.selected else {
            return;
        };
        if self.cells[from.0][from.1] == EMPTY {
            self.selected = None;
            return;
        }
        if self.pending != Pending::Idle || self.has_any_path() {
            debug!("Move to ({x}, {y}) refused while the board is busy");
            return;
        }

        match self.find_path(from, (x, y)) {
            Some(path) => self.commit_move(from, (x, y), &path),
            None => debug!("No path from {from:?} to ({x}, {y})"),
        }
    }

    /// Returns the pending move, if any, and forgets it.
    pub fn take_move(&mut self) -> Option<MoveRequest> {
        self.moved.take()
    }

    fn commit_move(&mut self, from: (usize, usize), to: (usize, usize), path: &[(usize, usize)]) {
        let flow = FlowId::from_origin(from.0, from.1);
        for &(px, py) in path {
            self.paths[px][py] = Some(flow);
        }
        self.cells[to.0][to.1] = self.cells[from.0][from.1];
        self.cells[from.0][from.1] = EMPTY;
        self.moved = Some(MoveRequest { from, to, flow });
        self.selected = None;
        self.pending = Pending::Landed(to.0, to.1);
        debug!("Ball moved from {from:?} to {to:?} over {} squares", path.len());
    }

    // Breadth-first search over empty squares, origin and destination included
    fn find_path(&self, from: (usize, usize), to: (usize, usize)) -> Option<Vec<(usize, usize)>> {
        let mut previous = [[None::<(usize, usize)>; BOARD_H]; BOARD_W];
        let mut seen = [[false; BOARD_H]; BOARD_W];
        let mut queue = VecDeque::from([from]);
        seen[from.0][from.1] = true;

        while let Some(current) = queue.pop_front() {
            if current == to {
                let mut path = vec![to];
                let mut cursor = to;
                while let Some(prev) = previous[cursor.0][cursor.1] {
                    path.push(prev);
                    cursor = prev;
                }
                path.reverse();
                return Some(path);
            }
            for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let Some((nx, ny)) = offset(current, dx, dy) else {
                    continue;
                };
                if seen[nx][ny] || self.cells[nx][ny] != EMPTY {
                    continue;
                }
                seen[nx][ny] = true;
                previous[nx][ny] = Some(current);
                queue.push_back((nx, ny));
            }
        }
        None
    }

    /// Next square along the marked path for `flow`, seen from `(x, y)`.
    #[must_use]
    pub fn follow_path(&self, x: usize, y: usize, flow: FlowId) -> Option<(usize, usize)> {
        [(1, 0), (-1, 0), (0, 1), (0, -1)]
            .into_iter()
            .filter_map(|(dx, dy)| offset((x, y), dx, dy))
            .find(|&(nx, ny)| self.paths[nx][ny] == Some(flow))
    }

    pub fn clear_path(&mut self, x: usize, y: usize) {
        self.paths[x][y] = None;
    }

    /// Whether a sliding ball still has to pass over `(x, y)`.
    #[must_use]
    pub fn has_path(&self, x: usize, y: usize) -> bool {
        self.paths[x][y].is_some()
    }

    fn has_any_path(&self) -> bool {
        self.paths.iter().flatten().any(Option::is_some)
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.pending == Pending::Idle
    }

    /// Runs one unit of board logic.
    pub fn logic(&mut self) {
        self.step_logic();
        self.forget_vanished_selection();
    }

    fn step_logic(&mut self) {
        match std::mem::take(&mut self.pending) {
            Pending::Idle => {}
            Pending::Landed(x, y) => {
                if self.trigger_special(x, y) {
                    return;
                }
                if self.remove_lines(&[(x, y)]) == 0 {
                    self.pending = Pending::Drop;
                }
            }
            Pending::Drop => {
                let placed = self.drop_pool();
                self.pending = Pending::Restock(placed);
            }
            Pending::Restock(placed) => {
                for slot in 0..POOL_SIZE {
                    self.pool[slot] = self.random_ball();
                }
                self.pending = Pending::Settle(placed);
            }
            Pending::Settle(placed) => {
                for &(x, y) in &placed {
                    self.trigger_special(x, y);
                }
                self.remove_lines(&placed);
            }
        }
    }

    // A selected ball taken by a line or a special is no longer selected
    fn forget_vanished_selection(&mut self) {
        if let Some((x, y)) = self.selected {
            if self.cells[x][y] == EMPTY {
                trace!("Selection at ({x}, {y}) vanished");
                self.selected = None;
            }
        }
    }

    fn random_ball(&mut self) -> Cell {
        if self.rng.u32(0..BONUS_ODDS) == 0 {
            self.rng.u8(BALL_JOKER..=BALL_BOOM)
        } else {
            self.rng.u8(1..=COLORS_NR)
        }
    }

    fn drop_pool(&mut self) -> Vec<(usize, usize)> {
        let mut placed = Vec::with_capacity(POOL_SIZE);
        for slot in 0..POOL_SIZE {
            let ball = std::mem::replace(&mut self.pool[slot], EMPTY);
            if ball == EMPTY {
                continue;
            }
            let empty: Vec<(usize, usize)> = (0..BOARD_H)
                .flat_map(|y| (0..BOARD_W).map(move |x| (x, y)))
                .filter(|&(x, y)| self.cells[x][y] == EMPTY)
                .collect();
            if empty.is_empty() {
                break;
            }
            let (x, y) = empty[self.rng.usize(0..empty.len())];
            self.cells[x][y] = ball;
            placed.push((x, y));
        }
        trace!("Pool dropped onto {placed:?}");
        placed
    }

    // Boom clears its neighbourhood, brush paints it; both vanish
    fn trigger_special(&mut self, x: usize, y: usize) -> bool {
        match self.cells[x][y] {
            BALL_BOOM => {
                let mut removed = 1;
                self.cells[x][y] = EMPTY;
                for (nx, ny) in neighbours(x, y) {
                    if self.cells[nx][ny] != EMPTY {
                        self.cells[nx][ny] = EMPTY;
                        removed += 1;
                    }
                }
                self.score_mul = 1;
                self.score += removed;
                debug!("Boom at ({x}, {y}) removed {removed} balls");
                true
            }
            BALL_BRUSH => {
                let color = self.rng.u8(1..=COLORS_NR);
                self.cells[x][y] = EMPTY;
                let painted: Vec<(usize, usize)> = neighbours(x, y)
                    .filter(|&(nx, ny)| is_color(self.cells[nx][ny]))
                    .collect();
                for &(nx, ny) in &painted {
                    self.cells[nx][ny] = color;
                }
                debug!("Brush at ({x}, {y}) painted {} balls", painted.len());
                if !painted.is_empty() {
                    self.pending = Pending::Settle(painted);
                }
                true
            }
            _ => false,
        }
    }

    /// Removes every line of `LINE_MIN` or more that passes through one of
    /// `origins`. Returns the number of balls removed.
    pub fn remove_lines(&mut self, origins: &[(usize, usize)]) -> u32 {
        let mut doomed = [[false; BOARD_H]; BOARD_W];
        let mut nuked_colors = Vec::new();

        for &(x, y) in origins {
            for (dx, dy) in DIRECTIONS {
                if let Some((run, color)) = self.run_through(x, y, dx, dy) {
                    if run.iter().any(|&(rx, ry)| self.cells[rx][ry] == BALL_BOMB) {
                        nuked_colors.push(color);
                    }
                    for (rx, ry) in run {
                        doomed[rx][ry] = true;
                    }
                }
            }
        }

        for color in nuked_colors {
            for (x, y) in all_squares() {
                if self.cells[x][y] == color {
                    doomed[x][y] = true;
                }
            }
        }

        let mut removed = 0;
        let mut jokers = 0;
        for (x, y) in all_squares() {
            if doomed[x][y] {
                if self.cells[x][y] == BALL_JOKER {
                    jokers += 1;
                }
                self.cells[x][y] = EMPTY;
                removed += 1;
            }
        }

        if removed > 0 {
            self.score_mul = 1 << jokers.min(4);
            self.score += removed * self.score_mul;
            debug!(
                "Removed {removed} balls, multiplier x{}, score {}",
                self.score_mul, self.score
            );
            self.forget_vanished_selection();
        }
        removed
    }

    // Longest line through (x, y) along (dx, dy), wild balls matching any colour
    fn run_through(
        &self,
        x: usize,
        y: usize,
        dx: i32,
        dy: i32,
    ) -> Option<(Vec<(usize, usize)>, Cell)> {
        let ball = self.cells[x][y];
        let candidates: Vec<Cell> = if is_color(ball) {
            vec![ball]
        } else if is_wild(ball) {
            (1..=COLORS_NR).collect()
        } else {
            return None;
        };

        let mut best: Option<(Vec<(usize, usize)>, Cell)> = None;
        for color in candidates {
            let matches = |cell: Cell| cell == color || is_wild(cell);
            let mut run = vec![(x, y)];
            for sign in [1, -1] {
                let mut cursor = (x, y);
                while let Some(next) = offset(cursor, dx * sign, dy * sign) {
                    if !matches(self.cells[next.0][next.1]) {
                        break;
                    }
                    run.push(next);
                    cursor = next;
                }
            }
            if run.len() >= LINE_MIN && best.as_ref().is_none_or(|(b, _)| run.len() > b.len()) {
                best = Some((run, color));
            }
        }
        best
    }

    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            cells: self.cells.iter().map(|column| column.to_vec()).collect(),
            pool: self.pool.to_vec(),
            score: self.score,
            score_mul: self.score_mul,
        }
    }

    /// Rebuilds a settled board from a snapshot.
    pub fn restore(snapshot: &BoardSnapshot) -> Result<Self, ConfigError> {
        if snapshot.cells.len() != BOARD_W
            || snapshot.cells.iter().any(|column| column.len() != BOARD_H)
            || snapshot.pool.len() != POOL_SIZE
        {
            return Err(ConfigError::Invalid("board dimensions do not match".into()));
        }
        let valid = |cell: &Cell| usize::from(*cell) <= crate::game::BALLS_NR;
        if !snapshot.cells.iter().flatten().all(valid) || !snapshot.pool.iter().all(valid) {
            return Err(ConfigError::Invalid("unknown ball in saved board".into()));
        }

        let mut board = Self::new();
        for (x, column) in snapshot.cells.iter().enumerate() {
            board.cells[x].copy_from_slice(column);
        }
        board.pool.copy_from_slice(&snapshot.pool);
        board.score = snapshot.score;
        board.score_mul = snapshot.score_mul.max(1);
        // Saved between a drop and the restock
        if board.pool.contains(&EMPTY) {
            board.pending = Pending::Restock(Vec::new());
        }
        Ok(board)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        write_toml(path, &self.snapshot())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let snapshot: BoardSnapshot = read_toml(path)?;
        Self::restore(&snapshot)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

fn offset(from: (usize, usize), dx: i32, dy: i32) -> Option<(usize, usize)> {
    let x = from.0 as i32 + dx;
    let y = from.1 as i32 + dy;
    if x < 0 || y < 0 || x >= BOARD_W as i32 || y >= BOARD_H as i32 {
        None
    } else {
        Some((x as usize, y as usize))
    }
}

fn neighbours(x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> {
    NEIGHBOURS
        .into_iter()
        .filter_map(move |(dx, dy)| offset((x, y), dx, dy))
}

fn all_squares() -> impl Iterator<Item = (usize, usize)> {
    (0..BOARD_H).flat_map(|y| (0..BOARD_W).map(move |x| (x, y)))
}
