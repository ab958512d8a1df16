//! The flat Visual Graph consumed by the canvas.
//!
//! [`VisualGraph`] is the output of the [projector](crate::projector). It is
//! derived state: it is rebuilt from the Program Model on every model
//! replacement and never edited in place. Field names serialize in camelCase,
//! the shape the canvas expects.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::coords::{PixelRect, Point, Size};
use crate::model::{FlType, Operator};

/// What a Visual Node renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualKind {
    Function,
    /// Synthetic header strip of a function (drag handle and name).
    FunctionHeader,
    Constant,
    Binary,
    Unary,
}

/// Kind-specific data a node renderer needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VisualPayload {
    Function { name: String },
    Constant {
        #[serde(rename = "flType")]
        fl_type: FlType,
        value: Option<String>,
    },
    Operator { op: Operator },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualNode {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent_id: Option<String>,
    pub kind: VisualKind,
    /// Relative to the parent when `parent_id` is set.
    pub position: Point,
    pub size: Size,
    pub z_index: i32,
    /// Area (relative to the parent) the node may be dragged within.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub extent: Option<PixelRect>,
    pub payload: VisualPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualEdge {
    pub id: String,
    pub source: String,
    pub source_handle: String,
    pub target: String,
    pub target_handle: String,
}

/// Ordered nodes and edges, in traversal order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualGraph {
    pub nodes: Vec<VisualNode>,
    pub edges: Vec<VisualEdge>,
}

/// Element ids that differ between two projections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectionDiff {
    pub added_nodes: Vec<String>,
    pub removed_nodes: Vec<String>,
    pub changed_nodes: Vec<String>,
    pub added_edges: Vec<String>,
    pub removed_edges: Vec<String>,
    pub changed_edges: Vec<String>,
}

impl ProjectionDiff {
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.changed_nodes.is_empty()
            && self.added_edges.is_empty()
            && self.removed_edges.is_empty()
            && self.changed_edges.is_empty()
    }
}

impl VisualGraph {
    pub fn node(&self, id: &str) -> Option<&VisualNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&VisualEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Nodes whose `parent_id` is `id`, in traversal order.
    pub fn children_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a VisualNode> + 'a {
        self.nodes
            .iter()
            .filter(move |n| n.parent_id.as_deref() == Some(id))
    }

    /// Content hash of the projection.
    ///
    /// Deterministic because the graph holds only `Vec`s, so its JSON form is
    /// canonical. Two projections with equal fingerprints render identically.
    pub fn fingerprint(&self) -> Result<blake3::Hash, serde_json::Error> {
        let mut hasher = blake3::Hasher::new();
        serde_json::to_writer(&mut hasher, self)?;
        Ok(hasher.finalize())
    }

    /// Compares `self` against an earlier projection.
    ///
    /// Ids are listed in the order they appear in the respective graph.
    pub fn diff(&self, previous: &VisualGraph) -> ProjectionDiff {
        let mut diff = ProjectionDiff::default();

        let old_nodes: IndexMap<&str, &VisualNode> =
            previous.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        let new_nodes: IndexMap<&str, &VisualNode> =
            self.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        for (id, node) in &new_nodes {
            match old_nodes.get(id) {
                None => diff.added_nodes.push(id.to_string()),
                Some(old) if old != node => diff.changed_nodes.push(id.to_string()),
                Some(_) => {}
            }
        }
        for id in old_nodes.keys() {
            if !new_nodes.contains_key(id) {
                diff.removed_nodes.push(id.to_string());
            }
        }

        let old_edges: IndexMap<&str, &VisualEdge> =
            previous.edges.iter().map(|e| (e.id.as_str(), e)).collect();
        let new_edges: IndexMap<&str, &VisualEdge> =
            self.edges.iter().map(|e| (e.id.as_str(), e)).collect();
        for (id, edge) in &new_edges {
            match old_edges.get(id) {
                None => diff.added_edges.push(id.to_string()),
                Some(old) if old != edge => diff.changed_edges.push(id.to_string()),
                Some(_) => {}
            }
        }
        for id in old_edges.keys() {
            if !new_edges.contains_key(id) {
                diff.removed_edges.push(id.to_string());
            }
        }

        diff
    }
}
