//! Connection Validator.
//!
//! Views the current Visual Edges as a directed graph over Visual Node ids and
//! declines a candidate connection that would close a cycle. The check is
//! purely topological: port types and arity are the edit service's concern.

use petgraph::graphmap::DiGraphMap;
use petgraph::visit::Dfs;

use crate::address::PortHandle;
use crate::error::ConnectionRejected;
use crate::visual::VisualEdge;

/// Accepts `source -> target` unless it is a self loop or `source` is already
/// reachable from `target`.
pub fn validate_connection(
    edges: &[VisualEdge],
    source: &str,
    target: &str,
) -> Result<(), ConnectionRejected> {
    if source == target {
        return Err(ConnectionRejected::SelfLoop {
            node: source.to_string(),
        });
    }

    let graph: DiGraphMap<&str, ()> = edges
        .iter()
        .map(|e| (e.source.as_str(), e.target.as_str()))
        .collect();
    if !graph.contains_node(target) || !graph.contains_node(source) {
        return Ok(());
    }

    let mut dfs = Dfs::new(&graph, target);
    while let Some(node) = dfs.next(&graph) {
        if node == source {
            return Err(ConnectionRejected::WouldCycle {
                source_node: source.to_string(),
                target_node: target.to_string(),
            });
        }
    }
    Ok(())
}

/// Parses both port handles, then validates the connection between their
/// owning nodes. Returns the parsed handles for command synthesis.
pub fn validate_handles(
    edges: &[VisualEdge],
    source_handle: &str,
    target_handle: &str,
) -> Result<(PortHandle, PortHandle), ConnectionRejected> {
    let source: PortHandle = source_handle.parse()?;
    let target: PortHandle = target_handle.parse()?;
    validate_connection(edges, &source.node_id(), &target.node_id())?;
    Ok((source, target))
}
