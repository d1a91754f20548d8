//! Gesture-driven grid maze.
//!
//! A pose classifier produces noisy per-frame `(label, probability)` scores.
//! This crate turns them into debounced movement commands and applies them to a
//! fixed 15×15 maze:
//!
//! ```text
//! ClassScore[] ──best──▶ PredictionSmoother ──committed──▶ MovementGate ──▶ GridMaze
//!                                                                    │
//!                                        GameObserver ◀── GameController
//! ```
//!
//! Everything that touches a camera, a model runtime or a canvas lives behind
//! the traits in [`io`], so the same core runs in the browser app and in the
//! native trace runner.

pub mod config;
pub mod controller;
pub mod direction;
pub mod error;
pub mod gate;
pub mod io;
pub mod maze;
pub mod session;
pub mod smoother;

// WASM-safe monotonic time shim for wall-clock pacing.
pub(crate) mod time;

pub use config::GameConfig;
pub use controller::{GameController, SessionPhase, TickOutcome, TickTicket};
pub use direction::Direction;
pub use error::GameError;
pub use gate::{GateOutcome, MovementGate};
pub use maze::{CellKind, GridMaze, MazeSnapshot, MoveResult, Position, GRID_SIZE};
pub use smoother::{PredictionSample, PredictionSmoother, SmoothedPrediction};
