use thiserror::Error;

/// Failure taxonomy of the maze core.
///
/// Only [`GameError::ClassifierUnavailable`] is fatal (a session cannot start
/// without a model and a camera). The others are per-tick conditions or
/// accessor errors that the controller absorbs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("no pose detected")]
    NoPoseDetected,

    #[error("invalid direction label: {0:?}")]
    InvalidDirection(String),

    #[error("cell ({x}, {y}) is outside the maze")]
    OutOfBounds { x: i32, y: i32 },

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("invalid config: {0}")]
    Config(String),
}
