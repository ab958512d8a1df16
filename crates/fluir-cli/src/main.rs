//! fluir command-line tools.
//!
//! Provides the `fluir` binary. Offline subcommands (`project`, `address`,
//! `check-connection`) work on local program JSON files. Online subcommands
//! (`new`, `open`, `edit`, `undo`, `redo`, `save`) forward one request to the
//! edit service and print the returned program status.
//!
//! The edit service location comes from `FLUIR_SERVER_URL` and
//! `FLUIR_TIMEOUT_SECS`, overridable with `--server` and `--timeout`.
//! Logging goes to stderr and honors `RUST_LOG`.

mod error;
mod offline;
mod online;
mod prompt;

use std::io::Read;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fluir_client::{ClientConfig, HttpEditService, ServiceRequest};

use crate::error::CliError;
use crate::prompt::PromptPicker;

/// fluir visual program tools.
#[derive(Parser)]
#[command(name = "fluir", about = "fluir visual program tools")]
struct Cli {
    /// Edit service base URL (overrides FLUIR_SERVER_URL).
    #[arg(long, global = true)]
    server: Option<String>,

    /// Request timeout in seconds (overrides FLUIR_TIMEOUT_SECS).
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Project a program file to its Visual Graph.
    Project {
        /// Program or program-status JSON file.
        file: PathBuf,

        /// Zoom factor.
        #[arg(short, long, default_value_t = 1.0)]
        zoom: f64,

        /// Emit function header nodes.
        #[arg(long)]
        headers: bool,
    },

    /// Encode or decode qualified addresses.
    Address {
        #[command(subcommand)]
        action: AddressAction,
    },

    /// Check whether connecting two ports would be accepted.
    CheckConnection {
        /// Program or program-status JSON file.
        file: PathBuf,

        /// Producer port handle, e.g. `input-1:2-0`.
        source: String,

        /// Consumer port handle, e.g. `output-1:3-0`.
        target: String,
    },

    /// Start a new program on the edit service.
    New,

    /// Open a program file (prompts when no path is given).
    Open { path: Option<PathBuf> },

    /// Send one edit command given as JSON (`-` reads stdin).
    Edit { command: String },

    /// Undo the last edit.
    Undo,

    /// Redo the last undone edit.
    Redo,

    /// Save the program (in place when no path is given).
    Save {
        path: Option<PathBuf>,

        /// Prompt for the destination.
        #[arg(long, conflicts_with = "path")]
        pick: bool,
    },
}

#[derive(Subcommand)]
enum AddressAction {
    /// Append a local id to a parent address.
    Encode {
        local: u32,

        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Decode an address to its integer array.
    Decode {
        address: String,

        /// Map non-numeric segments to null instead of failing.
        #[arg(long)]
        lossy: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let exit_code = match run(cli).await {
        Ok(Some(output)) => {
            println!("{}", output);
            0
        }
        Ok(None) => {
            eprintln!("Cancelled.");
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    process::exit(exit_code);
}

/// Executes one subcommand. `Ok(None)` means the user cancelled a prompt.
async fn run(cli: Cli) -> Result<Option<String>, CliError> {
    let request = match cli.command {
        Commands::Project {
            file,
            zoom,
            headers,
        } => return offline::project_file(&file, zoom, headers).map(Some),
        Commands::Address { action } => {
            return match action {
                AddressAction::Encode { local, parent } => {
                    Ok(Some(offline::encode_address(parent.as_deref(), local)))
                }
                AddressAction::Decode { address, lossy } => {
                    offline::decode_address(&address, lossy).map(Some)
                }
            }
        }
        Commands::CheckConnection {
            file,
            source,
            target,
        } => return offline::check_connection(&file, &source, &target).map(Some),

        Commands::New => ServiceRequest::New,
        Commands::Open { path } => {
            let mut picker = PromptPicker::new(std::io::stdin().lock(), std::io::stderr());
            match online::open_path(path, &mut picker) {
                Some(path) => ServiceRequest::Open {
                    path: path.display().to_string(),
                },
                None => return Ok(None),
            }
        }
        Commands::Edit { command } => {
            let json = if command == "-" {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .map_err(|source| CliError::Read {
                        path: PathBuf::from("<stdin>"),
                        source,
                    })?;
                buf
            } else {
                command
            };
            ServiceRequest::Edit(online::parse_command(&json)?)
        }
        Commands::Undo => ServiceRequest::Undo,
        Commands::Redo => ServiceRequest::Redo,
        Commands::Save { path, pick } => {
            let path = if pick {
                use fluir_client::PathPicker;
                let mut picker = PromptPicker::new(std::io::stdin().lock(), std::io::stderr());
                match picker.pick_save(None) {
                    Some(path) => Some(path),
                    None => return Ok(None),
                }
            } else {
                path
            };
            ServiceRequest::Save {
                path: path.map(|p| p.display().to_string()).unwrap_or_default(),
            }
        }
    };

    let mut config = ClientConfig::from_env();
    if let Some(server) = cli.server {
        config = config.with_server_url(server);
    }
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    tracing::debug!(server = %config.server_url, "using edit service");

    let service = HttpEditService::new(config)?;
    online::send(&service, request).await.map(Some)
}
