use std::path::PathBuf;

use posemaze_game::GameError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("could not determine the config directory")]
    NoConfigDir,

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("trace {0:?} has no frames")]
    EmptyTrace(String),

    #[error(transparent)]
    Game(#[from] GameError),
}
