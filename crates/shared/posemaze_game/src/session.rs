use std::cell::RefCell;
use std::rc::Rc;

use tracing::{info, warn};

use crate::controller::{GameController, TickOutcome};
use crate::error::GameError;
use crate::io::{Classifier, Clock, FrameSource, GameObserver};

/// Cloneable handle to a session's controller.
///
/// UI callbacks (Stop/Reset buttons) hold one of these while a step may be
/// suspended on inference. Borrows are never held across an await.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    inner: Rc<RefCell<GameController>>,
}

impl ControllerHandle {
    pub fn new(controller: GameController) -> Self {
        Self {
            inner: Rc::new(RefCell::new(controller)),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&GameController) -> R) -> R {
        f(&self.inner.borrow())
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut GameController) -> R) -> R {
        f(&mut self.inner.borrow_mut())
    }

    pub fn stop(&self, obs: &mut dyn GameObserver) {
        self.inner.borrow_mut().stop(obs);
    }

    pub fn reset(&self, obs: &mut dyn GameObserver) {
        self.inner.borrow_mut().reset(obs);
    }
}

/// One play session wired to its collaborators.
///
/// `run_step` is the whole per-frame contract: take a ticket, grab a frame,
/// await inference, then hand the result back to the controller, which drops
/// it if the session was stopped or restarted in the meantime.
pub struct Session<S, C, K> {
    controller: ControllerHandle,
    source: S,
    classifier: C,
    clock: K,
}

impl<S, C, K> Session<S, C, K>
where
    S: FrameSource,
    C: Classifier<Frame = S::Frame>,
    K: Clock,
{
    pub fn new(controller: GameController, source: S, classifier: C, clock: K) -> Self {
        Self::from_handle(ControllerHandle::new(controller), source, classifier, clock)
    }

    /// Attach collaborators to a controller the host already shares, e.g. one
    /// the page renders before any camera is started.
    pub fn from_handle(controller: ControllerHandle, source: S, classifier: C, clock: K) -> Self {
        Self {
            controller,
            source,
            classifier,
            clock,
        }
    }

    pub fn handle(&self) -> ControllerHandle {
        self.controller.clone()
    }

    /// Acquire the frame source and start a fresh game.
    ///
    /// Any acquisition failure is reported as `ClassifierUnavailable` and the
    /// session stays where it was.
    pub async fn start(&mut self, obs: &mut dyn GameObserver) -> Result<(), GameError> {
        if let Err(e) = self.source.start().await {
            warn!(error = %e, "frame source failed to start");
            return Err(match e {
                GameError::ClassifierUnavailable(_) => e,
                other => GameError::ClassifierUnavailable(other.to_string()),
            });
        }
        self.controller.update(|c| c.start(obs));
        Ok(())
    }

    pub fn stop(&mut self, obs: &mut dyn GameObserver) {
        self.controller.stop(obs);
        self.source.stop();
        info!("frame source released");
    }

    pub async fn run_step(&mut self, obs: &mut dyn GameObserver) -> TickOutcome {
        let Some(ticket) = self.controller.with(|c| c.begin_tick()) else {
            return TickOutcome::Cancelled;
        };

        let inference = match self.source.next_frame() {
            Some(frame) => self.classifier.estimate(&frame).await,
            // A camera that has no frame yet is the same as no pose.
            None => Ok(None),
        };

        let now = self.clock.now_ms();
        self.controller
            .update(|c| c.complete_tick(ticket, inference, now, obs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;
    use crate::io::{ClassScore, ManualClock, NullObserver, RecordingObserver, StateChangeKind};
    use crate::maze::{Position, START};
    use std::collections::VecDeque;
    use std::sync::Arc;

    struct ScriptedCamera {
        fail_start: bool,
        started: bool,
        frames: u32,
    }

    impl FrameSource for ScriptedCamera {
        type Frame = u32;

        async fn start(&mut self) -> Result<(), GameError> {
            if self.fail_start {
                return Err(GameError::Inference("camera permission denied".into()));
            }
            self.started = true;
            Ok(())
        }

        fn next_frame(&mut self) -> Option<u32> {
            self.started.then(|| {
                self.frames += 1;
                self.frames
            })
        }

        fn stop(&mut self) {
            self.started = false;
        }
    }

    struct ScriptedModel {
        outputs: VecDeque<Option<Vec<ClassScore>>>,
        clock: Arc<ManualClock>,
        // Simulates the Stop button being pressed while inference is pending.
        stop_during: Option<(u32, ControllerHandle)>,
    }

    impl Classifier for ScriptedModel {
        type Frame = u32;

        async fn estimate(&mut self, frame: &u32) -> Result<Option<Vec<ClassScore>>, GameError> {
            self.clock.advance(33);
            if let Some((at, handle)) = &self.stop_during {
                if *at == *frame {
                    handle.stop(&mut NullObserver);
                }
            }
            Ok(self.outputs.pop_front().flatten())
        }
    }

    fn rights(n: usize) -> VecDeque<Option<Vec<ClassScore>>> {
        (0..n)
            .map(|_| Some(vec![ClassScore::new("PointRight", 0.95)]))
            .collect()
    }

    fn session(
        outputs: VecDeque<Option<Vec<ClassScore>>>,
    ) -> Session<ScriptedCamera, ScriptedModel, Arc<ManualClock>> {
        let clock = Arc::new(ManualClock::new(0));
        Session::new(
            GameController::default(),
            ScriptedCamera {
                fail_start: false,
                started: false,
                frames: 0,
            },
            ScriptedModel {
                outputs,
                clock: Arc::clone(&clock),
                stop_during: None,
            },
            clock,
        )
    }

    #[test]
    fn steps_drive_the_player() {
        let mut s = session(rights(3));
        let mut obs = RecordingObserver::default();
        pollster::block_on(s.start(&mut obs)).unwrap();

        let outcomes: Vec<_> = (0..3)
            .map(|_| pollster::block_on(s.run_step(&mut obs)))
            .collect();
        assert_eq!(outcomes[2].committed(), Direction::Right);
        assert_eq!(s.handle().with(|c| c.maze().player()), Position::new(2, 1));
        assert_eq!(
            obs.kinds(),
            vec![StateChangeKind::Reset, StateChangeKind::Moved]
        );
    }

    #[test]
    fn start_failure_is_classifier_unavailable() {
        let mut s = session(rights(3));
        s.source.fail_start = true;
        let mut obs = RecordingObserver::default();
        let err = pollster::block_on(s.start(&mut obs)).unwrap_err();
        assert!(matches!(err, GameError::ClassifierUnavailable(_)));
        assert!(!s.handle().with(|c| c.is_running()));
        assert_eq!(
            pollster::block_on(s.run_step(&mut obs)),
            TickOutcome::Cancelled
        );
    }

    #[test]
    fn stop_while_inference_is_pending_discards_the_result() {
        let mut s = session(rights(3));
        let handle = s.handle();
        s.classifier.stop_during = Some((3, handle.clone()));
        let mut obs = RecordingObserver::default();
        pollster::block_on(s.start(&mut obs)).unwrap();

        for _ in 0..2 {
            pollster::block_on(s.run_step(&mut obs));
        }
        // Third inference would commit Right, but Stop lands first.
        let out = pollster::block_on(s.run_step(&mut obs));
        assert_eq!(out, TickOutcome::Cancelled);
        assert_eq!(handle.with(|c| c.maze().player()), START);
        assert!(handle.with(|c| c.smoother().is_empty()));

        s.stop(&mut obs);
        assert!(!s.source.started);
    }

    #[test]
    fn shared_handle_sees_the_session_moves() {
        let handle = ControllerHandle::new(GameController::default());
        let clock = Arc::new(ManualClock::new(0));
        let mut s = Session::from_handle(
            handle.clone(),
            ScriptedCamera {
                fail_start: false,
                started: false,
                frames: 0,
            },
            ScriptedModel {
                outputs: rights(3),
                clock: Arc::clone(&clock),
                stop_during: None,
            },
            clock,
        );
        let mut obs = RecordingObserver::default();
        pollster::block_on(s.start(&mut obs)).unwrap();
        for _ in 0..3 {
            pollster::block_on(s.run_step(&mut obs));
        }
        assert_eq!(handle.with(|c| c.maze().player()), Position::new(2, 1));

        handle.reset(&mut obs);
        assert_eq!(s.handle().with(|c| c.maze().player()), START);
    }

    #[test]
    fn missing_frames_count_as_no_pose() {
        let mut s = session(rights(3));
        let mut obs = RecordingObserver::default();
        pollster::block_on(s.start(&mut obs)).unwrap();
        s.source.started = false;
        assert_eq!(pollster::block_on(s.run_step(&mut obs)), TickOutcome::NoPose);
    }
}
