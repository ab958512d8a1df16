//! Subcommands forwarded to the edit service.
//!
//! Each invocation is a single request against the service's current
//! program; the service owns the program between invocations.

use std::path::PathBuf;

use fluir_client::{EditService, PathPicker, ProgramStatus, ServiceRequest};
use fluir_core::EditCommand;
use uuid::Uuid;

use crate::error::CliError;
use crate::offline::render_json;

/// Parses an edit command from its JSON wire form.
pub fn parse_command(json: &str) -> Result<EditCommand, CliError> {
    serde_json::from_str(json).map_err(CliError::Command)
}

/// Resolves the path for `open`, asking the picker when none was given.
/// `None` means the user cancelled.
pub fn open_path(path: Option<PathBuf>, picker: &mut impl PathPicker) -> Option<PathBuf> {
    path.or_else(|| picker.pick_open())
}

/// Sends one request and renders the resulting program status as JSON.
pub async fn send(
    service: &impl EditService,
    request: ServiceRequest,
) -> Result<String, CliError> {
    let request_id = Uuid::new_v4();
    tracing::info!(%request_id, action = request.action(), "sending");
    let status: ProgramStatus = service.call(request, request_id).await?;
    render_json(&status)
}
