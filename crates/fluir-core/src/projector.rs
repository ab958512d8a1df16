//! Graph Projector: Program Model → Visual Graph.
//!
//! [`project`] is a pure pre-order traversal over an immutable
//! [`ProjectionInput`] snapshot. For every function it emits the function's
//! Visual Node, then one node per body node, then one edge per
//! producer→consumer pair of every conduit. Traversal order follows the
//! model's own ordering, so projecting an unchanged model twice gives
//! byte-identical output and the canvas leaves unaffected elements alone.
//!
//! Node addresses are qualified by the owning declaration's address, and a
//! body node's `parent_id` is always its function's Visual Node id. Only
//! functions own nodes, so a node outside a function body cannot be
//! expressed, let alone projected.

use crate::address::{PortHandle, QualifiedAddress, VisualId, HEADER_SUFFIX};
use crate::coords::{to_canvas, PixelRect, Point, Size, Zoom, HEADER_HEIGHT, ZOOM_SCALAR};
use crate::model::{Conduit, Declaration, Function, Node, ProgramModel};
use crate::visual::{VisualEdge, VisualGraph, VisualKind, VisualNode, VisualPayload};

/// Knobs that change the projection's shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionOptions {
    /// Emit a synthetic `"<id>__header"` node above every function.
    pub headers: bool,
    /// Pixels per model unit at zoom 1.0.
    pub scalar: f64,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        ProjectionOptions {
            headers: false,
            scalar: ZOOM_SCALAR,
        }
    }
}

/// Everything the projector reads, captured as one immutable snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionInput<'a> {
    pub program: &'a ProgramModel,
    pub zoom: Zoom,
    pub options: ProjectionOptions,
}

impl<'a> ProjectionInput<'a> {
    pub fn new(program: &'a ProgramModel, zoom: Zoom) -> Self {
        ProjectionInput {
            program,
            zoom,
            options: ProjectionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ProjectionOptions) -> Self {
        self.options = options;
        self
    }
}

/// Projects the whole program.
pub fn project(input: ProjectionInput<'_>) -> VisualGraph {
    let mut graph = VisualGraph::default();
    for decl in &input.program.declarations {
        project_declaration(&input, decl, &mut graph);
    }
    graph
}

fn project_declaration(
    input: &ProjectionInput<'_>,
    decl: &Declaration,
    graph: &mut VisualGraph,
) {
    match decl {
        Declaration::Function(function) => project_function(input, function, graph),
    }
}

fn project_function(
    input: &ProjectionInput<'_>,
    function: &Function,
    graph: &mut VisualGraph,
) {
    // Declarations are top level; nothing nests a function today.
    let address = QualifiedAddress::root(function.id);
    let id = address.to_string();
    let rect = to_canvas(&function.location, input.zoom, input.options.scalar);
    let k = input.zoom.factor() * input.options.scalar;

    if input.options.headers {
        let header_height = f64::from(HEADER_HEIGHT) * k;
        graph.nodes.push(VisualNode {
            id: VisualId::synthetic(&address, HEADER_SUFFIX),
            parent_id: None,
            kind: VisualKind::FunctionHeader,
            position: Point {
                x: rect.position.x,
                y: rect.position.y - header_height,
            },
            size: Size {
                width: rect.size.width,
                height: header_height,
            },
            z_index: function.location.z,
            extent: None,
            payload: VisualPayload::Function {
                name: function.name.clone(),
            },
        });
    }

    graph.nodes.push(VisualNode {
        id: id.clone(),
        parent_id: None,
        kind: VisualKind::Function,
        position: rect.position,
        size: rect.size,
        z_index: function.location.z,
        extent: None,
        payload: VisualPayload::Function {
            name: function.name.clone(),
        },
    });

    // Children may roam the whole body, relative to the function's origin.
    let body = PixelRect {
        position: Point::default(),
        size: rect.size,
    };

    for node in &function.nodes {
        project_node(input, node, &address, &id, body, graph);
    }
    for conduit in &function.conduits {
        project_conduit(conduit, &address, graph);
    }
}

fn project_node(
    input: &ProjectionInput<'_>,
    node: &Node,
    parent: &QualifiedAddress,
    parent_id: &str,
    extent: PixelRect,
    graph: &mut VisualGraph,
) {
    let address = parent.child(node.id());
    let rect = to_canvas(node.location(), input.zoom, input.options.scalar);
    let (kind, payload) = match node {
        Node::Constant(c) => (
            VisualKind::Constant,
            VisualPayload::Constant {
                fl_type: c.fl_type,
                value: c.value.clone(),
            },
        ),
        Node::Binary(b) => (VisualKind::Binary, VisualPayload::Operator { op: b.op }),
        Node::Unary(u) => (VisualKind::Unary, VisualPayload::Operator { op: u.op }),
    };

    debug_assert!(
        address.is_strict_extension_of(parent),
        "node {} escaped its function {}",
        address,
        parent
    );

    graph.nodes.push(VisualNode {
        id: address.to_string(),
        parent_id: Some(parent_id.to_string()),
        kind,
        position: rect.position,
        size: rect.size,
        z_index: node.location().z,
        extent: Some(extent),
        payload,
    });
}

fn project_conduit(conduit: &Conduit, decl: &QualifiedAddress, graph: &mut VisualGraph) {
    let base_id = decl.child(conduit.id).to_string();
    let producer = decl.child(conduit.input);
    let source = producer.to_string();
    let source_handle = PortHandle::producer(producer, conduit.index).to_string();

    for (k, (target, port)) in conduit.outputs().into_iter().enumerate() {
        let consumer = decl.child(target);
        let id = if k == 0 {
            base_id.clone()
        } else {
            format!("{}.{}", base_id, k)
        };
        graph.edges.push(VisualEdge {
            id,
            source: source.clone(),
            source_handle: source_handle.clone(),
            target: consumer.to_string(),
            target_handle: PortHandle::consumer(consumer, port).to_string(),
        });
    }
}
