//! Status text, button state and canvas geometry for the browser app.
//!
//! Kept out of the wasm-only `web` module so the formatting and drawing plan
//! can be unit-tested on the host.

use posemaze_game::io::PredictionStatus;
use posemaze_game::{CellKind, MazeSnapshot, Position};

/// Pixels per maze cell.
pub const CELL_SIZE: f64 = 30.0;

pub const WALL_COLOR: &str = "#333";
pub const GOAL_COLOR: &str = "#F44336";
pub const PLAYER_COLOR: &str = "#2196F3";
pub const GRID_LINE_COLOR: &str = "#ddd";

/// The three lines of the prediction panel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusLines {
    pub status: String,
    pub confidence: String,
    pub debug: String,
}

impl StatusLines {
    pub fn new(
        status: impl Into<String>,
        confidence: impl Into<String>,
        debug: impl Into<String>,
    ) -> Self {
        Self {
            status: status.into(),
            confidence: confidence.into(),
            debug: debug.into(),
        }
    }

    pub fn message(status: impl Into<String>) -> Self {
        Self::new(status, "", "")
    }

    pub fn idle() -> Self {
        Self::message("Click \"Start Game\" to begin.")
    }

    pub fn loading_model() -> Self {
        Self::message("Loading model...")
    }

    pub fn starting_webcam() -> Self {
        Self::message("Model loaded. Starting webcam...")
    }

    pub fn ready() -> Self {
        Self::new("Ready to play!", "Make gestures to move", "System active")
    }

    pub fn stopped() -> Self {
        Self::message("Game stopped. Click \"Start Game\" to begin.")
    }

    pub fn goal_reached() -> Self {
        Self::message("🎉 Congratulations! You reached the goal!")
    }

    pub fn error(msg: &str) -> Self {
        Self::new(format!("Error: {msg}"), "Check console for details", "")
    }

    /// Per-frame text. The check mark only reflects the confidence gate; the
    /// stability tag shows whether the window agrees.
    pub fn for_prediction(status: &PredictionStatus, threshold: f32) -> Self {
        match status {
            PredictionStatus::NoPose => {
                Self::new("No pose detected", "Move into view", "Waiting...")
            }
            PredictionStatus::Prediction {
                raw_label,
                confidence,
                stable,
                history_len,
                capacity,
                ..
            } => {
                let mark = if *confidence >= threshold { '✓' } else { '○' };
                let tag = if *stable { "[STABLE]" } else { "[stabilizing...]" };
                Self::new(
                    format!("Direction: {raw_label} {mark}"),
                    format!("Confidence: {:.1}%", confidence * 100.0),
                    format!("{tag} History: {history_len}/{capacity}"),
                )
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Stopped,
    Loading,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Buttons {
    pub start_enabled: bool,
    pub start_label: &'static str,
    pub stop_enabled: bool,
}

impl RunState {
    pub fn buttons(self) -> Buttons {
        match self {
            RunState::Stopped => Buttons {
                start_enabled: true,
                start_label: "Start Game",
                stop_enabled: false,
            },
            RunState::Loading => Buttons {
                start_enabled: false,
                start_label: "Loading...",
                stop_enabled: true,
            },
            RunState::Running => Buttons {
                start_enabled: false,
                start_label: "Game Running",
                stop_enabled: true,
            },
        }
    }
}

/// Canvas side length for a maze of `grid` cells.
pub fn canvas_size(grid: u32) -> u32 {
    grid * CELL_SIZE as u32
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawOp {
    FillRect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        color: &'static str,
    },
    StrokeRect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        color: &'static str,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        color: &'static str,
    },
}

fn marker(pos: Position, color: &'static str) -> DrawOp {
    DrawOp::Circle {
        cx: pos.x as f64 * CELL_SIZE + CELL_SIZE / 2.0,
        cy: pos.y as f64 * CELL_SIZE + CELL_SIZE / 2.0,
        r: CELL_SIZE / 3.0,
        color,
    }
}

/// Draw list for one frame: walls filled, goal as a red dot, every other cell
/// outlined, and the player on top.
pub fn plan_maze(snapshot: &MazeSnapshot) -> Vec<DrawOp> {
    let mut ops = Vec::with_capacity(snapshot.cells.len() + 1);
    for y in 0..snapshot.size {
        for x in 0..snapshot.size {
            let px = x as f64 * CELL_SIZE;
            let py = y as f64 * CELL_SIZE;
            match snapshot.cell(x, y) {
                Some(CellKind::Wall) => ops.push(DrawOp::FillRect {
                    x: px,
                    y: py,
                    w: CELL_SIZE,
                    h: CELL_SIZE,
                    color: WALL_COLOR,
                }),
                Some(CellKind::Goal) => ops.push(marker(Position::new(x, y), GOAL_COLOR)),
                _ => ops.push(DrawOp::StrokeRect {
                    x: px,
                    y: py,
                    w: CELL_SIZE,
                    h: CELL_SIZE,
                    color: GRID_LINE_COLOR,
                }),
            }
        }
    }
    ops.push(marker(snapshot.player, PLAYER_COLOR));
    ops
}
