//! Canonical form and structural equality for workspace documents.
//!
//! `equal` runs cheap checks first, in this order, and only normalizes when
//! every one of them passes:
//! 1. presence (both absent → equal, one absent → unequal)
//! 2. shape (`blocks` / `edges` must be arrays; raw JSON only)
//! 3. block and edge counts
//! 4. block-id and edge-id sets
//! 5. full normalization + deep comparison
//!
//! Malformed input is never an error here, it simply compares unequal.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use crate::types::{Edge, Node, Port, Viewport, WorkspaceDocument};

/// Version assumed for documents that do not carry one.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Comparison-relevant view of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalNode {
    pub id: String,
    pub label: String,
    pub content: String,
}

/// Comparison-relevant view of an edge. Port lists are sorted by id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalEdge {
    pub id: String,
    pub source: Option<String>,
    pub target: Option<String>,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
    pub inputs: Vec<Port>,
    pub outputs: Vec<Port>,
}

/// Deterministically ordered, fully defaulted document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalDoc {
    pub blocks: Vec<CanonicalNode>,
    pub edges: Vec<CanonicalEdge>,
    pub viewport: Viewport,
    pub version: String,
}

/// Produce the canonical form of `doc`.
pub fn normalize(doc: &WorkspaceDocument) -> CanonicalDoc {
    let mut blocks: Vec<CanonicalNode> = doc.blocks.iter().map(canonical_node).collect();
    blocks.sort_by(|a, b| {
        a.id.cmp(&b.id)
            .then_with(|| a.label.cmp(&b.label))
            .then_with(|| a.content.cmp(&b.content))
    });

    let mut edges: Vec<CanonicalEdge> = doc.edges.iter().map(canonical_edge).collect();
    edges.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| tiebreak(a).cmp(&tiebreak(b))));

    CanonicalDoc {
        blocks,
        edges,
        viewport: doc.viewport.unwrap_or_default(),
        version: doc
            .version
            .clone()
            .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
    }
}

/// Structural equality of two optional documents.
pub fn equal(a: Option<&WorkspaceDocument>, b: Option<&WorkspaceDocument>) -> bool {
    let (a, b) = match (a, b) {
        (None, None) => return true,
        (Some(a), Some(b)) => (a, b),
        _ => return false,
    };
    if std::ptr::eq(a, b) {
        return true;
    }

    if a.blocks.len() != b.blocks.len() || a.edges.len() != b.edges.len() {
        return false;
    }

    if !same_ids(
        a.blocks.iter().map(|n| n.id.as_str()),
        b.blocks.iter().map(|n| n.id.as_str()),
    ) || !same_ids(
        a.edges.iter().map(|e| e.id.as_str()),
        b.edges.iter().map(|e| e.id.as_str()),
    ) {
        return false;
    }

    normalize(a) == normalize(b)
}

/// Structural equality of two untyped payloads, e.g. a document read from a
/// file the user edited by hand.
pub fn equal_raw(a: Option<&Value>, b: Option<&Value>) -> bool {
    let (a, b) = match (a, b) {
        (None, None) => return true,
        (Some(a), Some(b)) => (a, b),
        _ => return false,
    };

    let (Some((a_blocks, a_edges)), Some((b_blocks, b_edges))) = (shape(a), shape(b)) else {
        return false;
    };

    if a_blocks.len() != b_blocks.len() || a_edges.len() != b_edges.len() {
        return false;
    }

    let ids = |items: &[Value]| -> Option<Vec<String>> {
        items
            .iter()
            .map(|item| item.get("id").and_then(Value::as_str).map(str::to_owned))
            .collect()
    };
    let (Some(ab), Some(bb), Some(ae), Some(be)) =
        (ids(a_blocks), ids(b_blocks), ids(a_edges), ids(b_edges))
    else {
        return false;
    };
    if !same_ids(ab.iter().map(String::as_str), bb.iter().map(String::as_str))
        || !same_ids(ae.iter().map(String::as_str), be.iter().map(String::as_str))
    {
        return false;
    }

    let (Ok(a), Ok(b)) = (
        serde_json::from_value::<WorkspaceDocument>(a.clone()),
        serde_json::from_value::<WorkspaceDocument>(b.clone()),
    ) else {
        return false;
    };
    normalize(&a) == normalize(&b)
}

/// Pretty JSON of the canonical form, used for human-readable diffs.
pub fn canonical_json(doc: &WorkspaceDocument) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&normalize(doc))
}

fn shape(doc: &Value) -> Option<(&[Value], &[Value])> {
    let blocks = doc.get("blocks")?.as_array()?;
    let edges = doc.get("edges")?.as_array()?;
    Some((blocks.as_slice(), edges.as_slice()))
}

fn same_ids<'a>(
    a: impl Iterator<Item = &'a str>,
    b: impl Iterator<Item = &'a str>,
) -> bool {
    let a: HashSet<&str> = a.collect();
    let b: HashSet<&str> = b.collect();
    a == b
}

fn canonical_node(node: &Node) -> CanonicalNode {
    CanonicalNode {
        id: node.id.clone(),
        label: node.label.clone().unwrap_or_default(),
        content: node.content.clone().unwrap_or_default(),
    }
}

fn canonical_edge(edge: &Edge) -> CanonicalEdge {
    CanonicalEdge {
        id: edge.id.clone(),
        source: edge.source.clone(),
        target: edge.target.clone(),
        source_handle: edge.source_handle.clone(),
        target_handle: edge.target_handle.clone(),
        inputs: sorted_ports(edge.inputs.as_deref()),
        outputs: sorted_ports(edge.outputs.as_deref()),
    }
}

fn sorted_ports(ports: Option<&[Port]>) -> Vec<Port> {
    let mut ports = ports.map(<[Port]>::to_vec).unwrap_or_default();
    ports.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| port_tiebreak(a, b)));
    ports
}

// Only consulted for duplicate ids.
fn tiebreak(edge: &CanonicalEdge) -> String {
    serde_json::to_string(edge).unwrap_or_default()
}

fn port_tiebreak(a: &Port, b: &Port) -> Ordering {
    let a = serde_json::to_string(a).unwrap_or_default();
    let b = serde_json::to_string(b).unwrap_or_default();
    a.cmp(&b)
}
