//! Recorded classifier output, replayed as if it came from a webcam.

use std::time::Duration;

use posemaze_game::io::{ClassScore, Classifier, FrameSource};
use posemaze_game::GameError;
use serde::{Deserialize, Serialize};

fn default_frame_interval_ms() -> u64 {
    33
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TraceFrame {
    /// Model output for this frame; `null` means no pose was found.
    #[serde(default)]
    pub scores: Option<Vec<ClassScore>>,

    /// Time since the previous frame; falls back to the trace interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dt_ms: Option<u64>,

    /// Simulated inference failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Simulated inference latency.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub latency_ms: u64,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

impl TraceFrame {
    pub fn single(label: &str, confidence: f32) -> Self {
        Self {
            scores: Some(vec![ClassScore::new(label, confidence)]),
            ..Self::default()
        }
    }

    pub fn no_pose() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Trace {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default)]
    pub frames: Vec<TraceFrame>,
}

impl Trace {
    pub fn dt_for(&self, idx: usize) -> u64 {
        self.frames
            .get(idx)
            .and_then(|f| f.dt_ms)
            .unwrap_or(self.frame_interval_ms)
    }

    /// A clean run from start to goal.
    ///
    /// Each step is three identical confident frames (enough to fill the
    /// default stability window) followed by ten neutral frames, which keeps
    /// consecutive moves more than 400 ms apart at 33 ms per frame.
    pub fn builtin_route_to_goal() -> Self {
        const ROUTE: &str = "RRRRRRRRRRRRDDDDDDDDDDDD";

        let mut frames = Vec::new();
        for step in ROUTE.chars() {
            let label = match step {
                'R' => "PointRight",
                'D' => "PointDown",
                'L' => "PointLeft",
                _ => "PointUp",
            };
            for _ in 0..3 {
                frames.push(TraceFrame {
                    scores: Some(vec![
                        ClassScore::new("Neutral", 0.05),
                        ClassScore::new(label, 0.92),
                        ClassScore::new("PointUp", 0.03),
                    ]),
                    ..TraceFrame::default()
                });
            }
            for _ in 0..10 {
                frames.push(TraceFrame::single("Neutral", 0.9));
            }
        }
        // Let the goal celebration pause run out.
        for _ in 0..6 {
            frames.push(TraceFrame::single("Neutral", 0.9));
        }

        Self {
            name: "builtin_route_to_goal".to_string(),
            frame_interval_ms: default_frame_interval_ms(),
            frames,
        }
    }
}

/// Frame source yielding trace indices.
#[derive(Debug)]
pub struct ReplayCamera {
    len: usize,
    next: usize,
    started: bool,
}

impl ReplayCamera {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            next: 0,
            started: false,
        }
    }
}

impl FrameSource for ReplayCamera {
    type Frame = usize;

    async fn start(&mut self) -> Result<(), GameError> {
        if self.len == 0 {
            return Err(GameError::ClassifierUnavailable(
                "trace has no frames".to_string(),
            ));
        }
        self.next = 0;
        self.started = true;
        Ok(())
    }

    fn next_frame(&mut self) -> Option<usize> {
        if !self.started || self.next >= self.len {
            return None;
        }
        let idx = self.next;
        self.next += 1;
        Some(idx)
    }

    fn stop(&mut self) {
        self.started = false;
    }
}

/// Classifier answering from the recorded frames.
#[derive(Debug)]
pub struct ReplayModel {
    frames: Vec<TraceFrame>,
}

impl ReplayModel {
    pub fn new(frames: Vec<TraceFrame>) -> Self {
        Self { frames }
    }
}

impl Classifier for ReplayModel {
    type Frame = usize;

    async fn estimate(&mut self, frame: &usize) -> Result<Option<Vec<ClassScore>>, GameError> {
        let Some(rec) = self.frames.get(*frame) else {
            return Ok(None);
        };
        if rec.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(rec.latency_ms)).await;
        }
        if let Some(msg) = &rec.error {
            return Err(GameError::Inference(msg.clone()));
        }
        Ok(rec.scores.clone())
    }
}

/// Bounds each inference call; 0 disables the limit.
#[derive(Debug)]
pub struct Watchdog<C> {
    inner: C,
    timeout_ms: u64,
}

impl<C> Watchdog<C> {
    pub fn new(inner: C, timeout_ms: u64) -> Self {
        Self { inner, timeout_ms }
    }
}

impl<C: Classifier> Classifier for Watchdog<C> {
    type Frame = C::Frame;

    async fn estimate(
        &mut self,
        frame: &Self::Frame,
    ) -> Result<Option<Vec<ClassScore>>, GameError> {
        if self.timeout_ms == 0 {
            return self.inner.estimate(frame).await;
        }
        let limit = Duration::from_millis(self.timeout_ms);
        match tokio::time::timeout(limit, self.inner.estimate(frame)).await {
            Ok(res) => res,
            Err(_) => Err(GameError::Inference(format!(
                "inference timed out after {} ms",
                self.timeout_ms
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_trace() {
        let json = r#"{
            "name": "wave",
            "frames": [
                { "scores": [ { "label": "PointLeft", "probability": 0.8 } ] },
                { "scores": null, "dt_ms": 50 },
                { "error": "webgl context lost" }
            ]
        }"#;
        let trace: Trace = serde_json::from_str(json).unwrap();
        assert_eq!(trace.frame_interval_ms, 33);
        assert_eq!(trace.frames.len(), 3);
        assert_eq!(trace.dt_for(0), 33);
        assert_eq!(trace.dt_for(1), 50);
        assert_eq!(trace.frames[0].scores.as_ref().unwrap()[0].confidence, 0.8);
        assert!(trace.frames[1].scores.is_none());
        assert_eq!(trace.frames[2].error.as_deref(), Some("webgl context lost"));
    }

    #[test]
    fn builtin_route_has_expected_shape() {
        let trace = Trace::builtin_route_to_goal();
        assert_eq!(trace.frames.len(), 24 * 13 + 6);
    }

    #[tokio::test]
    async fn camera_yields_each_index_once() {
        let mut cam = ReplayCamera::new(2);
        assert_eq!(cam.next_frame(), None);
        cam.start().await.unwrap();
        assert_eq!(cam.next_frame(), Some(0));
        assert_eq!(cam.next_frame(), Some(1));
        assert_eq!(cam.next_frame(), None);
    }

    #[tokio::test]
    async fn empty_camera_is_unavailable() {
        let mut cam = ReplayCamera::new(0);
        assert!(matches!(
            cam.start().await,
            Err(GameError::ClassifierUnavailable(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn watchdog_times_out_slow_inference() {
        let slow = TraceFrame {
            latency_ms: 5_000,
            ..TraceFrame::single("PointUp", 0.9)
        };
        let mut model = Watchdog::new(ReplayModel::new(vec![slow]), 100);
        let res = model.estimate(&0).await;
        assert!(matches!(res, Err(GameError::Inference(msg)) if msg.contains("timed out")));
    }

    #[tokio::test]
    async fn model_reports_recorded_errors() {
        let frame = TraceFrame {
            error: Some("boom".to_string()),
            ..TraceFrame::default()
        };
        let mut model = ReplayModel::new(vec![frame]);
        assert_eq!(
            model.estimate(&0).await,
            Err(GameError::Inference("boom".to_string()))
        );
    }
}
