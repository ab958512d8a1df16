pub mod address;
pub mod coords;
pub mod error;
pub mod model;
pub mod visual;
pub mod projector;
pub mod commands;
pub mod validator;
pub mod literal;

// Re-export commonly used types
pub use address::{decode, decode_lossy, encode, LocalId, PortDirection, PortHandle, QualifiedAddress, VisualId};
pub use coords::{ModelDelta, PixelDelta, PixelRect, Point, Size, Zoom, ZOOM_SCALAR};
pub use error::{
    AddressError, CommandError, ConnectionRejected, CoordError, CoreError, HandleError, LiteralError,
};
pub use model::{Declaration, Entity, FlType, Function, Location, Node, Operator, ProgramModel};
pub use visual::{ProjectionDiff, VisualEdge, VisualGraph, VisualKind, VisualNode, VisualPayload};
pub use projector::{project, ProjectionInput, ProjectionOptions};
pub use commands::{CommandLog, CommandSink, EditCommand, Emitter, NewNodeType, OperatorArity};
pub use validator::{validate_connection, validate_handles};
