//! Transient interaction state.
//!
//! While the user drags, resizes or types, the Program Model stays untouched.
//! The in-progress state lives here as a presentation override and is
//! reconciled into exactly one [`EditCommand`] (or none) when the interaction
//! ends. Dropping an interaction value cancels it.

use fluir_core::coords::{
    to_model_delta, to_model_point, to_model_size, PixelDelta, PixelRect, Point, Size, SizeLimit,
    Zoom, CONSTANT_LIMIT, OPERATOR_LIMIT,
};
use fluir_core::{
    commands, literal, AddressError, CoreError, EditCommand, FlType, ModelDelta, QualifiedAddress,
    VisualId, VisualKind, VisualNode,
};

// ---------------------------------------------------------------------------
// Drag
// ---------------------------------------------------------------------------

/// A node being dragged. A header drag moves the function the header
/// belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct DragInteraction {
    target: QualifiedAddress,
    node_id: String,
    origin: Point,
    size: Size,
    extent: Option<PixelRect>,
    offset: PixelDelta,
}

impl DragInteraction {
    pub fn begin(node: &VisualNode) -> Result<Self, AddressError> {
        let id = VisualId::parse(&node.id)?;
        Ok(DragInteraction {
            target: id.address,
            node_id: node.id.clone(),
            origin: node.position,
            size: node.size,
            extent: node.extent,
            offset: PixelDelta::default(),
        })
    }

    pub fn target(&self) -> &QualifiedAddress {
        &self.target
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Records the total pointer displacement since the drag began.
    pub fn update(&mut self, offset: PixelDelta) {
        self.offset = offset;
    }

    /// Where the canvas should draw the node right now.
    pub fn position(&self) -> Point {
        let moved = Point {
            x: self.origin.x + self.offset.dx,
            y: self.origin.y + self.offset.dy,
        };
        match &self.extent {
            Some(extent) => extent.clamp_box(moved, self.size),
            None => moved,
        }
    }

    pub fn model_delta(&self, zoom: Zoom, scalar: f64) -> ModelDelta {
        let position = self.position();
        let delta = PixelDelta {
            dx: position.x - self.origin.x,
            dy: position.y - self.origin.y,
        };
        to_model_delta(delta, zoom, scalar)
    }

    /// Ends the drag. Movement that rounds to zero units produces no command.
    pub fn finish(self, zoom: Zoom, scalar: f64) -> Option<EditCommand> {
        let delta = self.model_delta(zoom, scalar);
        if delta.is_zero() {
            return None;
        }
        Some(commands::move_by(self.target, delta.dx, delta.dy))
    }
}

// ---------------------------------------------------------------------------
// Resize
// ---------------------------------------------------------------------------

/// A node being resized from any corner.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeInteraction {
    target: QualifiedAddress,
    start: PixelRect,
    current: PixelRect,
    limit: Option<SizeLimit>,
}

impl ResizeInteraction {
    pub fn begin(node: &VisualNode) -> Result<Self, AddressError> {
        let id = VisualId::parse(&node.id)?;
        let limit = match node.kind {
            VisualKind::Constant => Some(CONSTANT_LIMIT),
            VisualKind::Binary | VisualKind::Unary => Some(OPERATOR_LIMIT),
            VisualKind::Function | VisualKind::FunctionHeader => None,
        };
        let start = PixelRect {
            position: node.position,
            size: node.size,
        };
        Ok(ResizeInteraction {
            target: id.address,
            start,
            current: start,
            limit,
        })
    }

    pub fn target(&self) -> &QualifiedAddress {
        &self.target
    }

    pub fn update(&mut self, rect: PixelRect) {
        self.current = rect;
    }

    pub fn rect(&self) -> PixelRect {
        self.current
    }

    /// Ends the resize. The size is clamped to the node kind's limits; `x`
    /// and `y` are sent only for axes whose origin moved. A moved origin is
    /// recomputed from the clamped size so the opposite edge stays fixed.
    pub fn finish(self, zoom: Zoom, scalar: f64) -> Option<EditCommand> {
        let (mut width, mut height) = to_model_size(self.current.size, zoom, scalar);
        if let Some(limit) = &self.limit {
            width = limit.width.clamp(f64::from(width));
            height = limit.height.clamp(f64::from(height));
        }
        let (start_width, start_height) = to_model_size(self.start.size, zoom, scalar);

        let (start_x, start_y) = to_model_point(self.start.position, zoom, scalar);
        let (x, y) = to_model_point(self.current.position, zoom, scalar);
        let x = anchored_origin(x, start_x, start_width, width);
        let y = anchored_origin(y, start_y, start_height, height);

        if width == start_width && height == start_height && x.is_none() && y.is_none() {
            return None;
        }
        Some(commands::resize_move(self.target, width, height, x, y))
    }
}

/// Origin keeping the far edge (`start + start_size`) in place, or `None` when
/// the origin did not move.
fn anchored_origin(current: i32, start: i32, start_size: i32, size: i32) -> Option<i32> {
    if current == start {
        return None;
    }
    let origin = start + start_size - size;
    (origin != start).then_some(origin)
}

// ---------------------------------------------------------------------------
// Text edit
// ---------------------------------------------------------------------------

/// What a text edit changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTarget {
    Constant(FlType),
    DeclarationName,
}

/// An in-place text edit. The field starts fully selected, so the first
/// typed text replaces the current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    target: QualifiedAddress,
    kind: TextTarget,
    original: String,
    buffer: String,
    selected: bool,
}

impl TextEdit {
    pub fn constant(target: QualifiedAddress, fl_type: FlType, current: &str) -> Self {
        Self::begin(target, TextTarget::Constant(fl_type), current)
    }

    pub fn rename(target: QualifiedAddress, current: &str) -> Self {
        Self::begin(target, TextTarget::DeclarationName, current)
    }

    fn begin(target: QualifiedAddress, kind: TextTarget, current: &str) -> Self {
        TextEdit {
            target,
            kind,
            original: current.to_string(),
            buffer: current.to_string(),
            selected: true,
        }
    }

    pub fn target(&self) -> &QualifiedAddress {
        &self.target
    }

    pub fn kind(&self) -> TextTarget {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn type_text(&mut self, text: &str) {
        if self.selected {
            self.buffer.clear();
            self.selected = false;
        }
        self.buffer.push_str(text);
    }

    pub fn backspace(&mut self) {
        if self.selected {
            self.buffer.clear();
            self.selected = false;
        } else {
            self.buffer.pop();
        }
    }

    /// Submits the edit. An unchanged value produces no command; a value
    /// failing screening produces an error and no command.
    pub fn commit(self) -> Result<Option<EditCommand>, CoreError> {
        if self.buffer == self.original {
            return Ok(None);
        }
        match self.kind {
            TextTarget::Constant(fl_type) => {
                literal::screen(fl_type, &self.buffer)?;
                Ok(Some(commands::update_constant(self.target, self.buffer)))
            }
            TextTarget::DeclarationName => Ok(Some(commands::rename_declaration(
                self.target,
                &self.buffer,
            )?)),
        }
    }

    /// Abandons the edit.
    pub fn cancel(self) {}
}
