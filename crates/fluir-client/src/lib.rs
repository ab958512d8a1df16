//! Edit-service client and editor session for fluir programs.
//!
//! The editing workflow is a single channel: an interaction produces one
//! [`EditCommand`](fluir_core::EditCommand), the [`EditorSession`] sends it
//! through an [`EditService`], and the service's response replaces the
//! program snapshot and triggers re-projection.
//!
//! # Modules
//!
//! - [`config`]: environment-driven client configuration
//! - [`error`]: [`ClientError`]
//! - [`schema`]: wire types of the edit service
//! - [`service`]: the [`EditService`] seam and its HTTP implementation
//! - [`session`]: snapshot store with request sequencing
//! - [`interaction`]: drag, resize and text-edit state
//! - [`picker`]: the host file-picker seam

pub mod config;
pub mod error;
pub mod interaction;
pub mod picker;
pub mod schema;
pub mod service;
pub mod session;

pub use config::ClientConfig;
pub use error::ClientError;
pub use interaction::{DragInteraction, ResizeInteraction, TextEdit, TextTarget};
pub use picker::{FixedPicker, PathPicker};
pub use schema::{ProgramStatus, ServiceRequest};
pub use service::{EditService, HttpEditService};
pub use session::{ApplyOutcome, CommandQueue, EditorSession, Notice, NoticeKind, Ticket};
