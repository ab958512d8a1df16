//! Wire types exchanged with the edit service.

use fluir_core::{EditCommand, ProgramModel};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Response body of every `/api/module/*` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramStatus {
    pub saved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub program: ProgramModel,
    #[serde(default)]
    pub can_undo: bool,
    #[serde(default)]
    pub can_redo: bool,
}

/// Body of `open` and `save`. An empty path saves in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRequest {
    pub path: String,
}

/// One call against the edit service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceRequest {
    New,
    Open { path: String },
    Edit(EditCommand),
    Undo,
    Redo,
    Save { path: String },
}

impl ServiceRequest {
    /// Last path segment of the endpoint.
    pub fn action(&self) -> &'static str {
        match self {
            ServiceRequest::New => "new",
            ServiceRequest::Open { .. } => "open",
            ServiceRequest::Edit(_) => "edit",
            ServiceRequest::Undo => "undo",
            ServiceRequest::Redo => "redo",
            ServiceRequest::Save { .. } => "save",
        }
    }

    /// JSON body, `None` for body-less calls.
    pub fn body(&self) -> Result<Option<serde_json::Value>, ClientError> {
        match self {
            ServiceRequest::New | ServiceRequest::Undo | ServiceRequest::Redo => Ok(None),
            ServiceRequest::Open { path } | ServiceRequest::Save { path } => {
                encode_body(&PathRequest { path: path.clone() }).map(Some)
            }
            ServiceRequest::Edit(command) => encode_body(command).map(Some),
        }
    }

    /// Whether the call needs an open program.
    pub fn requires_program(&self) -> bool {
        !matches!(self, ServiceRequest::New | ServiceRequest::Open { .. })
    }
}

fn encode_body(value: &impl Serialize) -> Result<serde_json::Value, ClientError> {
    serde_json::to_value(value).map_err(|err| ClientError::Encode(err.to_string()))
}

/// Human-readable message from a failed response body.
///
/// Understands `{"detail": "..."}` and `{"detail": [...]}`; anything else is
/// returned as the raw text.
pub fn error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: serde_json::Value,
    }

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.trim().to_string(),
    }
}
