use crate::direction::Direction;
use crate::maze::{GridMaze, MoveResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Neutral direction; nothing was attempted.
    Idle,
    /// Too soon after the last accepted move; the maze was not touched.
    Throttled { remaining_ms: u64 },
    /// The maze was asked to move.
    Attempted(MoveResult),
}

impl GateOutcome {
    pub fn moved(&self) -> bool {
        matches!(self, GateOutcome::Attempted(r) if r.moved)
    }

    pub fn reached_goal(&self) -> bool {
        matches!(self, GateOutcome::Attempted(r) if r.reached_goal)
    }
}

/// Frame-rate independent limiter on accepted moves.
///
/// Only moves that actually change the player position restart the cooldown;
/// bumping into a wall leaves the previous timestamp in place.
#[derive(Debug, Clone)]
pub struct MovementGate {
    interval_ms: u64,
    last_move_ms: Option<u64>,
}

impl MovementGate {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_move_ms: None,
        }
    }

    pub fn try_move(
        &mut self,
        direction: Direction,
        now_ms: u64,
        maze: &mut GridMaze,
    ) -> GateOutcome {
        if direction.is_neutral() {
            return GateOutcome::Idle;
        }

        if let Some(last) = self.last_move_ms {
            let elapsed = now_ms.saturating_sub(last);
            if elapsed < self.interval_ms {
                return GateOutcome::Throttled {
                    remaining_ms: self.interval_ms - elapsed,
                };
            }
        }

        let result = maze.attempt_move(direction);
        if result.moved {
            self.last_move_ms = Some(now_ms);
        }
        GateOutcome::Attempted(result)
    }

    pub fn last_move_ms(&self) -> Option<u64> {
        self.last_move_ms
    }

    pub fn clear(&mut self) {
        self.last_move_ms = None;
    }
}
