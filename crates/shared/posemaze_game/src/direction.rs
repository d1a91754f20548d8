use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Movement command derived from a pose class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    #[default]
    Neutral,
}

impl Direction {
    pub const ALL: [Direction; 5] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::Neutral,
    ];

    /// Canonicalize a raw model class name.
    ///
    /// Pose models are trained with whatever class names the author typed
    /// ("PointLeft", "Left", "left", ...). Anything unrecognized is treated as
    /// `Neutral`, i.e. "do nothing".
    pub fn from_label(label: &str) -> Self {
        Self::parse_label(label).unwrap_or(Direction::Neutral)
    }

    fn parse_label(label: &str) -> Option<Self> {
        let lower = label.trim().to_ascii_lowercase();
        let name = lower
            .strip_prefix("point")
            .unwrap_or(&lower)
            .trim_start_matches(['_', '-', ' ']);
        match name {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            "neutral" => Some(Direction::Neutral),
            _ => None,
        }
    }

    /// Unit grid offset; `None` for `Neutral`. Up decreases `y`.
    pub fn offset(self) -> Option<(i32, i32)> {
        match self {
            Direction::Up => Some((0, -1)),
            Direction::Down => Some((0, 1)),
            Direction::Left => Some((-1, 0)),
            Direction::Right => Some((1, 0)),
            Direction::Neutral => None,
        }
    }

    pub fn is_neutral(self) -> bool {
        self == Direction::Neutral
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Neutral => "neutral",
        }
    }
}

impl FromStr for Direction {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_label(s).ok_or_else(|| GameError::InvalidDirection(s.to_string()))
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synonyms_collapse_to_one_direction() {
        for label in ["PointLeft", "Left", "left", " LEFT ", "point_left"] {
            assert_eq!(Direction::from_label(label), Direction::Left, "{label}");
        }
        for label in ["PointRight", "Right", "right"] {
            assert_eq!(Direction::from_label(label), Direction::Right, "{label}");
        }
        for label in ["PointUp", "Up", "up"] {
            assert_eq!(Direction::from_label(label), Direction::Up, "{label}");
        }
        for label in ["PointDown", "Down", "down"] {
            assert_eq!(Direction::from_label(label), Direction::Down, "{label}");
        }
        assert_eq!(Direction::from_label("neutral"), Direction::Neutral);
    }

    #[test]
    fn unknown_labels_are_neutral() {
        assert_eq!(Direction::from_label("Wave"), Direction::Neutral);
        assert_eq!(Direction::from_label(""), Direction::Neutral);
        assert_eq!(Direction::from_label("Pointing"), Direction::Neutral);
    }

    #[test]
    fn strict_parse_reports_invalid_labels() {
        assert_eq!("PointUp".parse::<Direction>(), Ok(Direction::Up));
        assert_eq!(
            "Jump".parse::<Direction>(),
            Err(GameError::InvalidDirection("Jump".to_string()))
        );
    }

    #[test]
    fn only_neutral_has_no_offset() {
        for d in Direction::ALL {
            assert_eq!(d.offset().is_none(), d.is_neutral());
        }
        assert_eq!(Direction::Up.offset(), Some((0, -1)));
        assert_eq!(Direction::Right.offset(), Some((1, 0)));
    }
}
