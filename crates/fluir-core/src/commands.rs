//! Edit Command Synthesizer.
//!
//! Every user interaction ends as one [`EditCommand`]: a closed set of
//! address-targeted shapes the edit service accepts. Commands are built
//! either explicitly with the free functions in this module, or through an
//! [`Emitter`], a small capability value that binds a [`CommandSink`] and a
//! target address once and is then reused across many interaction callbacks.
//!
//! Nothing here touches the Program Model. A command describes an intent;
//! only the edit service's response changes the model.

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

use crate::address::{PortHandle, QualifiedAddress};
use crate::coords::{CONSTANT_LIMIT, OPERATOR_LIMIT};
use crate::error::CommandError;
use crate::model::{FlType, Function, Location, Operator};

/// Kinds of node `add_node` can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NewNodeType {
    BinaryOperator,
    UnaryOperator,
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl NewNodeType {
    pub fn constant(fl_type: FlType) -> Self {
        match fl_type {
            FlType::F64 => NewNodeType::F64,
            FlType::I8 => NewNodeType::I8,
            FlType::I16 => NewNodeType::I16,
            FlType::I32 => NewNodeType::I32,
            FlType::I64 => NewNodeType::I64,
            FlType::U8 => NewNodeType::U8,
            FlType::U16 => NewNodeType::U16,
            FlType::U32 => NewNodeType::U32,
            FlType::U64 => NewNodeType::U64,
        }
    }

    /// Constant type, `None` for operators.
    pub fn fl_type(self) -> Option<FlType> {
        match self {
            NewNodeType::BinaryOperator | NewNodeType::UnaryOperator => None,
            NewNodeType::F64 => Some(FlType::F64),
            NewNodeType::I8 => Some(FlType::I8),
            NewNodeType::I16 => Some(FlType::I16),
            NewNodeType::I32 => Some(FlType::I32),
            NewNodeType::I64 => Some(FlType::I64),
            NewNodeType::U8 => Some(FlType::U8),
            NewNodeType::U16 => Some(FlType::U16),
            NewNodeType::U32 => Some(FlType::U32),
            NewNodeType::U64 => Some(FlType::U64),
        }
    }

    /// Default `(width, height)` of a fresh node of this kind.
    pub fn default_size(self) -> (i32, i32) {
        match self {
            NewNodeType::BinaryOperator | NewNodeType::UnaryOperator => {
                OPERATOR_LIMIT.default_size()
            }
            _ => CONSTANT_LIMIT.default_size(),
        }
    }
}

/// Whether an operator node takes one or two inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorArity {
    Binary,
    Unary,
}

impl OperatorArity {
    pub fn allowed(self) -> &'static [Operator] {
        match self {
            OperatorArity::Binary => &Operator::BINARY,
            OperatorArity::Unary => &Operator::UNARY,
        }
    }

    fn name(self) -> &'static str {
        match self {
            OperatorArity::Binary => "binary",
            OperatorArity::Unary => "unary",
        }
    }
}

/// A single edit request for the edit service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "discriminator", rename_all = "snake_case")]
pub enum EditCommand {
    /// Displace an entity by whole model units.
    Move {
        target: QualifiedAddress,
        dx: i32,
        dy: i32,
    },
    /// Set an entity's size; `x`/`y` reposition it when resizing from a
    /// non-anchor corner.
    Resize {
        target: QualifiedAddress,
        width: i32,
        height: i32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<i32>,
    },
    RenameDeclaration {
        target: QualifiedAddress,
        name: String,
    },
    /// The literal travels as typed; it is not re-encoded.
    UpdateConstant {
        target: QualifiedAddress,
        value: String,
    },
    UpdateOperator {
        target: QualifiedAddress,
        value: Operator,
    },
    /// `new_location` is chosen by the caller, including a z above siblings.
    AddNode {
        parent: QualifiedAddress,
        new_type: NewNodeType,
        new_location: Location,
    },
    /// Connects a producer port to a consumer port, by handle string.
    AddConduit { source: String, target: String },
    Remove { target: QualifiedAddress },
}

impl EditCommand {
    /// The wire discriminator.
    pub fn name(&self) -> &'static str {
        match self {
            EditCommand::Move { .. } => "move",
            EditCommand::Resize { .. } => "resize",
            EditCommand::RenameDeclaration { .. } => "rename_declaration",
            EditCommand::UpdateConstant { .. } => "update_constant",
            EditCommand::UpdateOperator { .. } => "update_operator",
            EditCommand::AddNode { .. } => "add_node",
            EditCommand::AddConduit { .. } => "add_conduit",
            EditCommand::Remove { .. } => "remove",
        }
    }

    /// The entity the command is addressed at. `add_conduit` is addressed by
    /// port handles instead.
    pub fn target(&self) -> Option<&QualifiedAddress> {
        match self {
            EditCommand::Move { target, .. }
            | EditCommand::Resize { target, .. }
            | EditCommand::RenameDeclaration { target, .. }
            | EditCommand::UpdateConstant { target, .. }
            | EditCommand::UpdateOperator { target, .. }
            | EditCommand::Remove { target } => Some(target),
            EditCommand::AddNode { parent, .. } => Some(parent),
            EditCommand::AddConduit { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Free-function builders
// ---------------------------------------------------------------------------

pub fn move_by(target: QualifiedAddress, dx: i32, dy: i32) -> EditCommand {
    EditCommand::Move { target, dx, dy }
}

pub fn resize(target: QualifiedAddress, width: i32, height: i32) -> EditCommand {
    EditCommand::Resize {
        target,
        width,
        height,
        x: None,
        y: None,
    }
}

pub fn resize_move(
    target: QualifiedAddress,
    width: i32,
    height: i32,
    x: Option<i32>,
    y: Option<i32>,
) -> EditCommand {
    EditCommand::Resize {
        target,
        width,
        height,
        x,
        y,
    }
}

pub fn rename_declaration(
    target: QualifiedAddress,
    name: &str,
) -> Result<EditCommand, CommandError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CommandError::EmptyName);
    }
    Ok(EditCommand::RenameDeclaration {
        target,
        name: name.to_string(),
    })
}

pub fn update_constant(target: QualifiedAddress, value: impl Into<String>) -> EditCommand {
    EditCommand::UpdateConstant {
        target,
        value: value.into(),
    }
}

/// Fails when `op` is outside the symbol set of `arity`.
pub fn update_operator(
    target: QualifiedAddress,
    arity: OperatorArity,
    op: Operator,
) -> Result<EditCommand, CommandError> {
    if !arity.allowed().contains(&op) {
        return Err(CommandError::OperatorNotAllowed {
            op,
            arity: arity.name(),
        });
    }
    Ok(EditCommand::UpdateOperator { target, value: op })
}

pub fn add_node(
    parent: QualifiedAddress,
    new_type: NewNodeType,
    new_location: Location,
) -> EditCommand {
    EditCommand::AddNode {
        parent,
        new_type,
        new_location,
    }
}

pub fn add_conduit(source: &PortHandle, target: &PortHandle) -> EditCommand {
    EditCommand::AddConduit {
        source: source.to_string(),
        target: target.to_string(),
    }
}

pub fn remove(target: QualifiedAddress) -> Result<EditCommand, CommandError> {
    if target.is_empty() {
        return Err(CommandError::EmptyTarget);
    }
    Ok(EditCommand::Remove { target })
}

/// Location for a new node dropped at `(x, y)` inside `function`: the kind's
/// default size, drawn above every existing sibling.
pub fn placement_above_siblings(function: &Function, x: i32, y: i32, new_type: NewNodeType) -> Location {
    let (width, height) = new_type.default_size();
    let z = function.max_node_z().map_or(0, |z| z + 1);
    Location::new(x, y, z, width, height)
}

// ---------------------------------------------------------------------------
// Sinks and emitters
// ---------------------------------------------------------------------------

/// Receives finished commands. Implementations decide what "commit" means:
/// queueing for the network, recording for a test, printing.
pub trait CommandSink {
    fn commit(&self, command: EditCommand);
}

impl<T: CommandSink + ?Sized> CommandSink for &T {
    fn commit(&self, command: EditCommand) {
        (**self).commit(command)
    }
}

/// In-memory sink that records commands in commit order.
#[derive(Debug, Default)]
pub struct CommandLog {
    commands: RefCell<Vec<EditCommand>>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commands.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.borrow().is_empty()
    }

    /// Drains everything recorded so far.
    pub fn take(&self) -> Vec<EditCommand> {
        std::mem::take(&mut *self.commands.borrow_mut())
    }
}

impl CommandSink for CommandLog {
    fn commit(&self, command: EditCommand) {
        self.commands.borrow_mut().push(command);
    }
}

/// A sink and a target address bound together, offering one method per
/// command kind.
#[derive(Debug, Clone)]
pub struct Emitter<S: CommandSink> {
    sink: S,
    target: QualifiedAddress,
}

impl<S: CommandSink> Emitter<S> {
    pub fn new(sink: S, target: QualifiedAddress) -> Self {
        Emitter { sink, target }
    }

    pub fn target(&self) -> &QualifiedAddress {
        &self.target
    }

    pub fn move_by(&self, dx: i32, dy: i32) {
        self.sink.commit(move_by(self.target.clone(), dx, dy));
    }

    pub fn resize(&self, width: i32, height: i32) {
        self.sink.commit(resize(self.target.clone(), width, height));
    }

    pub fn resize_move(&self, width: i32, height: i32, x: Option<i32>, y: Option<i32>) {
        self.sink
            .commit(resize_move(self.target.clone(), width, height, x, y));
    }

    pub fn rename(&self, name: &str) -> Result<(), CommandError> {
        self.sink
            .commit(rename_declaration(self.target.clone(), name)?);
        Ok(())
    }

    pub fn update_constant(&self, value: impl Into<String>) {
        self.sink
            .commit(update_constant(self.target.clone(), value));
    }

    pub fn update_operator(&self, arity: OperatorArity, op: Operator) -> Result<(), CommandError> {
        self.sink
            .commit(update_operator(self.target.clone(), arity, op)?);
        Ok(())
    }

    /// Adds a node inside the bound (function) address.
    pub fn add_node(&self, new_type: NewNodeType, new_location: Location) {
        self.sink
            .commit(add_node(self.target.clone(), new_type, new_location));
    }

    pub fn remove(&self) -> Result<(), CommandError> {
        self.sink.commit(remove(self.target.clone())?);
        Ok(())
    }
}
