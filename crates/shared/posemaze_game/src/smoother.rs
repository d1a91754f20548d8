use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::io::ClassScore;

/// One classified frame after label canonicalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSample {
    pub direction: Direction,
    pub confidence: f32,
    /// Class name as reported by the model, kept for display.
    pub label: String,
}

impl PredictionSample {
    pub fn new(direction: Direction, confidence: f32) -> Self {
        Self {
            direction,
            confidence,
            label: direction.as_str().to_string(),
        }
    }

    pub fn from_score(score: &ClassScore) -> Self {
        Self {
            direction: Direction::from_label(&score.label),
            confidence: score.confidence,
            label: score.label.clone(),
        }
    }
}

/// Result of feeding one sample through the smoother.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedPrediction {
    pub sample: PredictionSample,
    pub stable: bool,
    /// Committed direction; `Neutral` unless both gates passed.
    pub committed: Direction,
    pub history_len: usize,
    pub capacity: usize,
}

/// Debounces raw predictions over a sliding window.
///
/// A direction is committed only when the whole window agrees on it exactly
/// and the newest sample clears the confidence threshold. This is a strict
/// debounce, not a majority vote: one dissenting frame anywhere in the window
/// blocks the commit.
#[derive(Debug, Clone)]
pub struct PredictionSmoother {
    history: VecDeque<PredictionSample>,
    capacity: usize,
    threshold: f32,
    last_stable: Direction,
}

impl PredictionSmoother {
    pub fn new(capacity: usize, threshold: f32) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            threshold,
            last_stable: Direction::Neutral,
        }
    }

    pub fn observe(&mut self, sample: PredictionSample) -> SmoothedPrediction {
        self.history.push_back(sample.clone());
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }

        let stable = self.is_stable_for(sample.direction);
        let committed = if stable && sample.confidence >= self.threshold {
            self.last_stable = sample.direction;
            sample.direction
        } else {
            Direction::Neutral
        };

        SmoothedPrediction {
            sample,
            stable,
            committed,
            history_len: self.history.len(),
            capacity: self.capacity,
        }
    }

    /// Direction the current window commits to, recomputed from the history.
    pub fn current_direction(&self) -> Direction {
        match self.history.back() {
            Some(last)
                if self.is_stable_for(last.direction) && last.confidence >= self.threshold =>
            {
                last.direction
            }
            _ => Direction::Neutral,
        }
    }

    pub fn last_stable_direction(&self) -> Direction {
        self.last_stable
    }

    pub fn clear(&mut self) {
        self.history.clear();
        self.last_stable = Direction::Neutral;
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn is_stable_for(&self, direction: Direction) -> bool {
        self.history.len() >= self.capacity
            && self.history.iter().all(|p| p.direction == direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smoother() -> PredictionSmoother {
        PredictionSmoother::new(3, 0.7)
    }

    fn feed(s: &mut PredictionSmoother, samples: &[(Direction, f32)]) -> Vec<Direction> {
        samples
            .iter()
            .map(|&(d, c)| s.observe(PredictionSample::new(d, c)).committed)
            .collect()
    }

    #[test]
    fn commits_on_the_kth_identical_sample() {
        let mut s = smoother();
        let out = feed(
            &mut s,
            &[
                (Direction::Right, 0.9),
                (Direction::Right, 0.9),
                (Direction::Right, 0.9),
            ],
        );
        assert_eq!(
            out,
            vec![Direction::Neutral, Direction::Neutral, Direction::Right]
        );
        assert_eq!(s.last_stable_direction(), Direction::Right);
        assert_eq!(s.current_direction(), Direction::Right);
    }

    #[test]
    fn keeps_committing_while_the_window_agrees() {
        let mut s = smoother();
        let out = feed(&mut s, &[(Direction::Down, 0.95); 6]);
        assert_eq!(&out[2..], &[Direction::Down; 4]);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn mixed_window_stays_neutral() {
        let mut s = smoother();
        let out = feed(
            &mut s,
            &[
                (Direction::Up, 0.9),
                (Direction::Down, 0.9),
                (Direction::Down, 0.9),
            ],
        );
        assert_eq!(out, vec![Direction::Neutral; 3]);
        assert_eq!(s.last_stable_direction(), Direction::Neutral);
    }

    #[test]
    fn low_confidence_blocks_a_stable_window() {
        let mut s = smoother();
        let out = feed(&mut s, &[(Direction::Left, 0.5); 3]);
        assert_eq!(out, vec![Direction::Neutral; 3]);

        let last = s.observe(PredictionSample::new(Direction::Left, 0.5));
        assert!(last.stable);
        assert_eq!(last.committed, Direction::Neutral);
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut s = smoother();
        let out = feed(&mut s, &[(Direction::Up, 0.7); 3]);
        assert_eq!(out[2], Direction::Up);
    }

    #[test]
    fn only_the_newest_confidence_is_gated() {
        let mut s = smoother();
        let out = feed(
            &mut s,
            &[
                (Direction::Up, 0.1),
                (Direction::Up, 0.2),
                (Direction::Up, 0.8),
            ],
        );
        assert_eq!(out[2], Direction::Up);
    }

    #[test]
    fn strict_match_differs_from_majority_vote() {
        // 2 of 3 agree: a majority vote would commit, the strict window does not.
        let mut s = smoother();
        let out = feed(
            &mut s,
            &[
                (Direction::Right, 0.9),
                (Direction::Left, 0.9),
                (Direction::Right, 0.9),
            ],
        );
        assert_eq!(out[2], Direction::Neutral);

        // A single dissenting frame delays the next commit by a full window.
        let out = feed(
            &mut s,
            &[(Direction::Right, 0.9), (Direction::Right, 0.9)],
        );
        assert_eq!(out, vec![Direction::Neutral, Direction::Right]);
    }

    #[test]
    fn old_samples_slide_out() {
        let mut s = smoother();
        feed(&mut s, &[(Direction::Up, 0.9), (Direction::Up, 0.9)]);
        let out = feed(&mut s, &[(Direction::Left, 0.9); 3]);
        assert_eq!(
            out,
            vec![Direction::Neutral, Direction::Neutral, Direction::Left]
        );
    }

    #[test]
    fn synonymous_labels_share_a_window() {
        let mut s = smoother();
        let scores = ["PointLeft", "Left", "left"].map(|label| ClassScore {
            label: label.to_string(),
            confidence: 0.9,
        });
        let committed: Vec<_> = scores
            .iter()
            .map(|sc| s.observe(PredictionSample::from_score(sc)).committed)
            .collect();
        assert_eq!(committed[2], Direction::Left);
    }

    #[test]
    fn neutral_can_be_committed() {
        let mut s = smoother();
        let out = feed(&mut s, &[(Direction::Neutral, 0.99); 3]);
        assert_eq!(out[2], Direction::Neutral);
        let last = s.observe(PredictionSample::new(Direction::Neutral, 0.99));
        assert!(last.stable);
    }

    #[test]
    fn clear_forgets_everything() {
        let mut s = smoother();
        feed(&mut s, &[(Direction::Down, 0.9); 3]);
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.last_stable_direction(), Direction::Neutral);
        assert_eq!(s.current_direction(), Direction::Neutral);

        let first = s.observe(PredictionSample::new(Direction::Down, 0.9));
        assert!(!first.stable);
        assert_eq!(first.history_len, 1);
        assert_eq!(first.capacity, 3);
    }
}
