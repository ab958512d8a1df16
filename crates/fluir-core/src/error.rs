//! Core error types for fluir-core.
//!
//! Uses `thiserror` for structured, matchable error variants. Each component
//! has its own enum so call sites can match precisely; [`CoreError`] gathers
//! them for callers that only need to propagate.

use thiserror::Error;

use crate::model::Operator;

/// A Qualified Address string could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("empty qualified address")]
    Empty,

    /// A segment is not a non-negative integer.
    #[error("invalid segment {position} ('{segment}') in address '{address}'")]
    InvalidSegment {
        address: String,
        position: usize,
        segment: String,
    },
}

/// A port-handle string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    #[error("port handle '{handle}' is not of the form <direction>-<address>-<index>")]
    WrongShape { handle: String },

    #[error("port handle '{handle}' has unknown direction '{direction}'")]
    UnknownDirection { handle: String, direction: String },

    #[error("port handle '{handle}' has a non-numeric port index")]
    InvalidIndex { handle: String },

    #[error("port handle address: {0}")]
    Address(#[from] AddressError),
}

/// Invalid coordinate-transform input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("zoom factor must be finite and positive, got {value}")]
    InvalidZoom { value: f64 },

    #[error("zoom step must be finite and greater than 1, got {value}")]
    InvalidStep { value: f64 },
}

/// A command could not be synthesized from the given input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("operator '{op}' is not allowed on a {arity} operator")]
    OperatorNotAllowed { op: Operator, arity: &'static str },

    #[error("declaration name must not be empty")]
    EmptyName,

    #[error("target address must not be empty")]
    EmptyTarget,
}

/// A literal failed client-side format screening.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("'{text}' is not a valid {expected} literal")]
    Malformed { text: String, expected: &'static str },

    #[error("'{text}' is out of range for {fl_type}")]
    OutOfRange { text: String, fl_type: &'static str },
}

/// A proposed connection was declined before reaching the edit service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionRejected {
    #[error("a node cannot be connected to itself ('{node}')")]
    SelfLoop { node: String },

    #[error("connecting '{source_node}' to '{target_node}' would create a cycle")]
    WouldCycle {
        source_node: String,
        target_node: String,
    },

    #[error("malformed port handle: {0}")]
    MalformedHandle(#[from] HandleError),
}

/// Umbrella error for the core crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Handle(#[from] HandleError),

    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Literal(#[from] LiteralError),

    #[error(transparent)]
    Connection(#[from] ConnectionRejected),
}
