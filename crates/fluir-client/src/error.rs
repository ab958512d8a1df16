//! Client error types.
//!
//! Every failure on the way to (or back from) the edit service lands in one
//! [`ClientError`] variant. None of them is fatal to an editing session: the
//! session keeps its last known-good snapshot and records a notice.

use fluir_core::{CommandError, ConnectionRejected, CoreError, LiteralError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// Blocked locally before any request was made.
    #[error("rejected before sending: {0}")]
    ValidationRejected(#[from] CoreError),

    /// The edit service answered with a non-success status.
    #[error("edit service rejected the request ({status}): {message}")]
    CommandRejected { status: u16, message: String },

    /// The edit service could not be reached.
    #[error("edit service unreachable: {0}")]
    Transport(String),

    /// The request body could not be serialized.
    #[error("could not encode edit service request: {0}")]
    Encode(String),

    /// The response body was not a valid program status.
    #[error("could not decode edit service response: {0}")]
    Decode(String),

    /// A command was issued with no program open.
    #[error("no program is open")]
    NoProgram,

    /// An interaction named an element the current snapshot does not have.
    #[error("no editable element '{0}'")]
    UnknownTarget(String),
}

impl ClientError {
    /// True for failures the edit service itself reported or failed to serve.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ClientError::CommandRejected { .. } | ClientError::Transport(_)
        )
    }
}

impl From<ConnectionRejected> for ClientError {
    fn from(err: ConnectionRejected) -> Self {
        ClientError::ValidationRejected(err.into())
    }
}

impl From<LiteralError> for ClientError {
    fn from(err: LiteralError) -> Self {
        ClientError::ValidationRejected(err.into())
    }
}

impl From<CommandError> for ClientError {
    fn from(err: CommandError) -> Self {
        ClientError::ValidationRejected(err.into())
    }
}
