use tracing::{debug, info, warn};

use crate::config::GameConfig;
use crate::direction::Direction;
use crate::error::GameError;
use crate::gate::{GateOutcome, MovementGate};
use crate::io::{
    best_prediction, ClassScore, GameObserver, PredictionStatus, StateChange, StateChangeKind,
};
use crate::maze::GridMaze;
use crate::smoother::{PredictionSample, PredictionSmoother, SmoothedPrediction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Running,
    /// Goal reached; the maze resets once `reset_at_ms` has passed.
    GoalReached { reset_at_ms: u64 },
    Stopped,
}

impl SessionPhase {
    pub fn is_active(self) -> bool {
        matches!(self, SessionPhase::Running | SessionPhase::GoalReached { .. })
    }

    pub fn label(self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Running => "running",
            SessionPhase::GoalReached { .. } => "goal_reached",
            SessionPhase::Stopped => "stopped",
        }
    }
}

/// Permission to run one step, tied to the session it was issued in.
///
/// A ticket outlives `stop()`/`start()` only as a stale value: completing it
/// is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct TickTicket {
    generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The ticket was stale or the session is not running; nothing changed.
    Cancelled,
    /// The classifier saw no pose this frame.
    NoPose,
    /// The classifier call failed; the frame was skipped.
    InferenceFailed(GameError),
    Observed {
        prediction: SmoothedPrediction,
        gate: GateOutcome,
    },
}

impl TickOutcome {
    pub fn committed(&self) -> Direction {
        match self {
            TickOutcome::Observed { prediction, .. } => prediction.committed,
            _ => Direction::Neutral,
        }
    }

    pub fn moved(&self) -> bool {
        matches!(self, TickOutcome::Observed { gate, .. } if gate.moved())
    }

    pub fn reached_goal(&self) -> bool {
        matches!(self, TickOutcome::Observed { gate, .. } if gate.reached_goal())
    }
}

/// Owned play session: maze, smoothing window and move gate.
///
/// All mutation happens inside `&mut self` calls made from a single
/// cooperative loop. Asynchronous inference runs between
/// [`GameController::begin_tick`] and [`GameController::complete_tick`]
/// without a borrow held, and the generation check in `complete_tick` keeps
/// late results from touching a stopped or restarted session.
#[derive(Debug)]
pub struct GameController {
    config: GameConfig,
    maze: GridMaze,
    smoother: PredictionSmoother,
    gate: MovementGate,
    phase: SessionPhase,
    generation: u64,
}

impl GameController {
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: GameConfig) -> Self {
        Self {
            maze: GridMaze::new(),
            smoother: PredictionSmoother::new(
                config.stability_frames,
                config.confidence_threshold,
            ),
            gate: MovementGate::new(config.move_interval_ms),
            phase: SessionPhase::Idle,
            generation: 0,
            config,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn maze(&self) -> &GridMaze {
        &self.maze
    }

    pub fn smoother(&self) -> &PredictionSmoother {
        &self.smoother
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase.is_active()
    }

    /// Begin a fresh session: pristine maze, empty window, no cooldown.
    pub fn start(&mut self, obs: &mut dyn GameObserver) {
        self.generation = self.generation.wrapping_add(1);
        self.maze.reset();
        self.smoother.clear();
        self.gate.clear();
        self.phase = SessionPhase::Running;
        info!(generation = self.generation, "session started");
        self.emit(StateChangeKind::Reset, obs);
    }

    /// Halt the session. Any step already in flight becomes stale.
    ///
    /// Stopping during the goal pause runs the pending reset right away, so
    /// the player is never left parked on the goal.
    pub fn stop(&mut self, obs: &mut dyn GameObserver) {
        if self.phase == SessionPhase::Stopped {
            return;
        }
        if let SessionPhase::GoalReached { .. } = self.phase {
            self.maze.reset();
            info!("maze reset after goal");
            self.emit(StateChangeKind::Reset, obs);
        }
        self.generation = self.generation.wrapping_add(1);
        self.smoother.clear();
        self.phase = SessionPhase::Stopped;
        info!(generation = self.generation, "session stopped");
    }

    /// Manual reset of the maze; the session phase and window are kept.
    pub fn reset(&mut self, obs: &mut dyn GameObserver) {
        self.maze.reset();
        if let SessionPhase::GoalReached { .. } = self.phase {
            self.phase = SessionPhase::Running;
        }
        info!("maze reset");
        self.emit(StateChangeKind::Reset, obs);
    }

    pub fn begin_tick(&self) -> Option<TickTicket> {
        self.phase.is_active().then_some(TickTicket {
            generation: self.generation,
        })
    }

    pub fn is_current(&self, ticket: TickTicket) -> bool {
        ticket.generation == self.generation && self.phase.is_active()
    }

    /// Apply the classifier result for a step started with `begin_tick`.
    pub fn complete_tick(
        &mut self,
        ticket: TickTicket,
        inference: Result<Option<Vec<ClassScore>>, GameError>,
        now_ms: u64,
        obs: &mut dyn GameObserver,
    ) -> TickOutcome {
        if !self.is_current(ticket) {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "dropping stale tick"
            );
            return TickOutcome::Cancelled;
        }

        let scores = match inference {
            Ok(scores) => scores,
            Err(e) => {
                warn!(error = %e, "prediction error; skipping frame");
                self.poll(now_ms, obs);
                return TickOutcome::InferenceFailed(e);
            }
        };

        match best_prediction(scores.as_deref()) {
            Ok(sample) => self.observe(sample, now_ms, obs),
            Err(_) => {
                self.poll(now_ms, obs);
                obs.on_prediction_tick(&PredictionStatus::NoPose);
                TickOutcome::NoPose
            }
        }
    }

    /// Feed one classified frame through smoothing, gating and the maze.
    pub fn observe(
        &mut self,
        sample: PredictionSample,
        now_ms: u64,
        obs: &mut dyn GameObserver,
    ) -> TickOutcome {
        if !self.phase.is_active() {
            return TickOutcome::Cancelled;
        }
        self.poll(now_ms, obs);

        let prediction = self.smoother.observe(sample);
        let gate = if self.phase == SessionPhase::Running {
            self.gate.try_move(prediction.committed, now_ms, &mut self.maze)
        } else {
            GateOutcome::Idle
        };

        if gate.moved() {
            debug!(
                direction = %prediction.committed,
                to = %self.maze.player(),
                "player moved"
            );
            self.emit(StateChangeKind::Moved, obs);
        }
        if gate.reached_goal() {
            let reset_at_ms = now_ms.saturating_add(self.config.goal_reset_delay_ms);
            self.phase = SessionPhase::GoalReached { reset_at_ms };
            info!(reset_at_ms, "goal reached");
            self.emit(StateChangeKind::GoalReached, obs);
            self.poll(now_ms, obs);
        }

        obs.on_prediction_tick(&PredictionStatus::from(&prediction));
        TickOutcome::Observed { prediction, gate }
    }

    /// Run the deferred goal reset once its delay has elapsed.
    pub fn poll(&mut self, now_ms: u64, obs: &mut dyn GameObserver) -> bool {
        match self.phase {
            SessionPhase::GoalReached { reset_at_ms } if now_ms >= reset_at_ms => {
                self.maze.reset();
                self.phase = SessionPhase::Running;
                info!("maze reset after goal");
                self.emit(StateChangeKind::Reset, obs);
                true
            }
            _ => false,
        }
    }

    fn emit(&self, kind: StateChangeKind, obs: &mut dyn GameObserver) {
        obs.on_state_change(&StateChange {
            kind,
            snapshot: self.maze.snapshot(),
        });
    }

    #[cfg(test)]
    pub(crate) fn maze_mut(&mut self) -> &mut GridMaze {
        &mut self.maze
    }
}

impl Default for GameController {
    fn default() -> Self {
        Self::build(GameConfig::default())
    }
}
