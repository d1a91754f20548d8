//! Narrow interfaces to the outside world.
//!
//! The core never talks to a camera, a model runtime or a canvas directly.
//! Hosts implement [`FrameSource`], [`Classifier`] and [`Clock`], and receive
//! updates through [`GameObserver`].

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::GameError;
use crate::maze::MazeSnapshot;
use crate::smoother::{PredictionSample, SmoothedPrediction};
use crate::time::Instant;

/// One class probability reported by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    pub label: String,
    #[serde(alias = "probability")]
    pub confidence: f32,
}

impl ClassScore {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Reduce a classifier result to its most confident entry.
///
/// Ties keep the earliest entry. `None` or an empty list means the model saw
/// no usable pose this frame.
pub fn best_prediction(scores: Option<&[ClassScore]>) -> Result<PredictionSample, GameError> {
    let scores = scores.unwrap_or_default();
    let mut best = scores.first().ok_or(GameError::NoPoseDetected)?;
    for s in &scores[1..] {
        if s.confidence > best.confidence {
            best = s;
        }
    }
    Ok(PredictionSample::from_score(best))
}

pub trait Classifier {
    type Frame;

    fn estimate(
        &mut self,
        frame: &Self::Frame,
    ) -> impl Future<Output = Result<Option<Vec<ClassScore>>, GameError>>;
}

pub trait FrameSource {
    type Frame;

    /// Acquire the device. Failing here is fatal to starting a session.
    fn start(&mut self) -> impl Future<Output = Result<(), GameError>>;

    fn next_frame(&mut self) -> Option<Self::Frame>;

    fn stop(&mut self);
}

pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Milliseconds since construction, monotonic on native and wasm alike.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        let elapsed = Instant::now().duration_since(self.origin);
        elapsed.as_millis().min(u64::MAX as u128) as u64
    }
}

/// Externally driven clock for tests and trace replay.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::Relaxed)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateChangeKind {
    Moved,
    GoalReached,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub kind: StateChangeKind,
    pub snapshot: MazeSnapshot,
}

/// Per-tick classifier status for the debug/status line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PredictionStatus {
    NoPose,
    Prediction {
        raw_label: String,
        direction: Direction,
        confidence: f32,
        stable: bool,
        committed: Direction,
        history_len: usize,
        capacity: usize,
    },
}

impl From<&SmoothedPrediction> for PredictionStatus {
    fn from(p: &SmoothedPrediction) -> Self {
        PredictionStatus::Prediction {
            raw_label: p.sample.label.clone(),
            direction: p.sample.direction,
            confidence: p.sample.confidence,
            stable: p.stable,
            committed: p.committed,
            history_len: p.history_len,
            capacity: p.capacity,
        }
    }
}

/// Host-side hooks. Both default to no-ops.
pub trait GameObserver {
    fn on_state_change(&mut self, _change: &StateChange) {}

    fn on_prediction_tick(&mut self, _status: &PredictionStatus) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl GameObserver for NullObserver {}

/// Observer that records every event.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub(crate) struct RecordingObserver {
    pub state_changes: Vec<StateChange>,
    pub ticks: Vec<PredictionStatus>,
}

#[cfg(test)]
impl RecordingObserver {
    pub fn kinds(&self) -> Vec<StateChangeKind> {
        self.state_changes.iter().map(|c| c.kind).collect()
    }

    pub fn clear(&mut self) {
        self.state_changes.clear();
        self.ticks.clear();
    }
}

#[cfg(test)]
impl GameObserver for RecordingObserver {
    fn on_state_change(&mut self, change: &StateChange) {
        self.state_changes.push(change.clone());
    }

    fn on_prediction_tick(&mut self, status: &PredictionStatus) {
        self.ticks.push(status.clone());
    }
}
