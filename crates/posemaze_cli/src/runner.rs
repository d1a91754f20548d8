use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use posemaze_game::io::{
    Clock, GameObserver, ManualClock, PredictionStatus, StateChange, StateChangeKind,
};
use posemaze_game::session::Session;
use posemaze_game::{GameConfig, GameController, GateOutcome, Position, TickOutcome};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::error::CliError;
use crate::trace::{ReplayCamera, ReplayModel, Trace, Watchdog};

#[derive(Debug, Clone, Copy, Default)]
pub struct ReplayOptions {
    /// Sleep between frames so the replay runs at recorded speed.
    pub realtime: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReplaySummary {
    pub trace: String,
    pub frames: u32,
    pub no_pose: u32,
    pub inference_failures: u32,
    pub commits: u32,
    pub throttled: u32,
    pub moves: u32,
    pub goals: u32,
    pub resets: u32,
    pub final_position: Position,
    pub final_phase: String,
    pub interrupted: bool,
}

/// Logs every game event and keeps the counters for the summary.
#[derive(Debug, Default)]
struct LoggingObserver {
    moves: u32,
    goals: u32,
    resets: u32,
}

impl GameObserver for LoggingObserver {
    fn on_state_change(&mut self, change: &StateChange) {
        match change.kind {
            StateChangeKind::Moved => {
                self.moves += 1;
                debug!("moved to {}", change.snapshot.player);
            }
            StateChangeKind::GoalReached => {
                self.goals += 1;
                info!("🎉 goal reached at {}", change.snapshot.player);
            }
            StateChangeKind::Reset => {
                self.resets += 1;
                debug!("maze reset");
            }
        }
    }

    fn on_prediction_tick(&mut self, status: &PredictionStatus) {
        match status {
            PredictionStatus::NoPose => trace!("no pose detected"),
            PredictionStatus::Prediction {
                raw_label,
                confidence,
                stable,
                history_len,
                capacity,
                ..
            } => trace!(
                "{} {:.1}% {} {}/{}",
                raw_label,
                confidence * 100.0,
                if *stable { "[STABLE]" } else { "[stabilizing...]" },
                history_len,
                capacity
            ),
        }
    }
}

/// Replay `trace` through a fresh session on a simulated clock.
///
/// `shutdown` resolving (Ctrl-C in the binary) stops the session; a step that
/// is still awaiting inference at that point is dropped.
pub async fn run_replay(
    config: GameConfig,
    trace: Trace,
    opts: ReplayOptions,
    shutdown: impl Future<Output = ()>,
) -> Result<ReplaySummary, CliError> {
    if trace.frames.is_empty() {
        return Err(CliError::EmptyTrace(trace.name));
    }

    let clock = Arc::new(ManualClock::new(0));
    let timeout_ms = config.inference_timeout_ms;
    let mut session = Session::new(
        GameController::new(config)?,
        ReplayCamera::new(trace.frames.len()),
        Watchdog::new(ReplayModel::new(trace.frames.clone()), timeout_ms),
        Arc::clone(&clock),
    );
    let handle = session.handle();

    let mut obs = LoggingObserver::default();
    session.start(&mut obs).await?;
    info!("Replaying {:?} ({} frames)", trace.name, trace.frames.len());

    let mut summary = ReplaySummary {
        trace: trace.name.clone(),
        frames: 0,
        no_pose: 0,
        inference_failures: 0,
        commits: 0,
        throttled: 0,
        moves: 0,
        goals: 0,
        resets: 0,
        final_position: Position::new(0, 0),
        final_phase: String::new(),
        interrupted: false,
    };

    tokio::pin!(shutdown);
    for idx in 0..trace.frames.len() {
        let dt = trace.dt_for(idx);
        if opts.realtime {
            tokio::time::sleep(Duration::from_millis(dt)).await;
        }
        clock.advance(dt);

        let outcome = tokio::select! {
            out = session.run_step(&mut obs) => out,
            _ = &mut shutdown => {
                warn!("Interrupted; stopping session");
                handle.stop(&mut obs);
                summary.interrupted = true;
                break;
            }
        };

        summary.frames += 1;
        match outcome {
            TickOutcome::Cancelled => break,
            TickOutcome::NoPose => summary.no_pose += 1,
            TickOutcome::InferenceFailed(_) => summary.inference_failures += 1,
            TickOutcome::Observed { prediction, gate } => {
                if !prediction.committed.is_neutral() {
                    summary.commits += 1;
                }
                if let GateOutcome::Throttled { .. } = gate {
                    summary.throttled += 1;
                }
            }
        }
    }

    // Flush a goal reset that is due by the end of the trace.
    let now = clock.now_ms();
    handle.update(|c| c.poll(now, &mut obs));

    summary.moves = obs.moves;
    summary.goals = obs.goals;
    // The reset emitted by `start` is not a gameplay reset.
    summary.resets = obs.resets.saturating_sub(1);
    summary.final_position = handle.with(|c| c.maze().player());
    summary.final_phase = handle.with(|c| c.phase().label().to_string());
    session.stop(&mut obs);

    info!(
        "Replay finished: {} frames, {} moves, {} goals",
        summary.frames, summary.moves, summary.goals
    );
    Ok(summary)
}
