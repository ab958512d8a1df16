//! CLI error type and exit-code mapping.
//!
//! Exit codes: 0 = success, 1 = rejected (locally or by the edit service),
//! 2 = usage or decode error, 3 = I/O or transport error.

use std::path::PathBuf;

use fluir_client::ClientError;
use fluir_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read '{path}': {source}", path = path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("'{path}' is not a program or program status: {source}", path = path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid edit command JSON: {0}")]
    Command(serde_json::Error),

    #[error("invalid zoom: {0}")]
    Zoom(String),

    #[error("could not render output: {0}")]
    Render(serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Read { .. } => 3,
            CliError::Parse { .. }
            | CliError::Command(_)
            | CliError::Zoom(_)
            | CliError::Render(_) => 2,
            CliError::Core(CoreError::Connection(_)) => 1,
            CliError::Core(_) => 2,
            CliError::Client(err) => match err {
                ClientError::ValidationRejected(_)
                | ClientError::CommandRejected { .. }
                | ClientError::NoProgram => 1,
                ClientError::Encode(_) | ClientError::Decode(_) | ClientError::UnknownTarget(_) => 2,
                ClientError::Transport(_) => 3,
            },
        }
    }
}
