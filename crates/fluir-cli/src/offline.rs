//! Subcommands that work on local files without an edit service.

use std::path::Path;

use serde::Serialize;

use fluir_client::ProgramStatus;
use fluir_core::{
    address, project, validate_handles, ProgramModel, ProjectionInput, ProjectionOptions, Zoom,
    ZOOM_SCALAR,
};

use crate::error::CliError;

/// Reads a program from a JSON file holding either a bare program or a full
/// program status as returned by the edit service.
pub fn load_program(path: &Path) -> Result<ProgramModel, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if let Ok(status) = serde_json::from_str::<ProgramStatus>(&text) {
        return Ok(status.program);
    }
    serde_json::from_str::<ProgramModel>(&text).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Projects the program at `path` and renders the Visual Graph as JSON.
pub fn project_file(path: &Path, zoom: f64, headers: bool) -> Result<String, CliError> {
    let program = load_program(path)?;
    let zoom = Zoom::new(zoom).map_err(|err| CliError::Zoom(err.to_string()))?;
    let options = ProjectionOptions {
        headers,
        scalar: ZOOM_SCALAR,
    };
    let graph = project(ProjectionInput::new(&program, zoom).with_options(options));
    let fingerprint = graph.fingerprint().map_err(CliError::Render)?;
    tracing::debug!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        %fingerprint,
        "projected"
    );
    render_json(&graph)
}

/// Pretty-printed JSON for stdout.
pub fn render_json(value: &impl Serialize) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(CliError::Render)
}

pub fn encode_address(parent: Option<&str>, local: u32) -> String {
    address::encode(parent, local)
}

/// Decodes an address to its integer-array form. Lossy decoding prints
/// `null` for non-numeric segments instead of failing.
pub fn decode_address(text: &str, lossy: bool) -> Result<String, CliError> {
    let value = if lossy {
        serde_json::json!(address::decode_lossy(text))
    } else {
        serde_json::json!(address::decode(text).map_err(fluir_core::CoreError::from)?)
    };
    Ok(value.to_string())
}

/// Checks whether connecting two ports of the program at `path` is allowed.
pub fn check_connection(path: &Path, source: &str, target: &str) -> Result<String, CliError> {
    let program = load_program(path)?;
    let graph = project(ProjectionInput::new(&program, Zoom::default()));
    validate_handles(&graph.edges, source, target).map_err(fluir_core::CoreError::from)?;
    Ok(format!("ok: {} -> {}", source, target))
}
