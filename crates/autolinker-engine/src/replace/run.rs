//! Runs of sibling text nodes and how a match window partitions them.

use crate::tree::{Document, NodeId};

/// Collect the scan run starting at `start`.
///
/// Extends forward through simple text siblings. A sibling containing
/// whitespace is included and ends the run; any other sibling kind ends it
/// exclusively. The starting node itself is not inspected.
pub fn collect_run(doc: &Document, start: NodeId) -> Vec<NodeId> {
    let mut run = vec![start];
    let mut next = doc.next_sibling(start);
    while let Some(node) = next {
        let Some(text) = doc.text_node(node).filter(|t| t.is_simple()) else {
            break;
        };
        run.push(node);
        if text.text.chars().any(char::is_whitespace) {
            break;
        }
        next = doc.next_sibling(node);
    }
    run
}

/// Concatenated text of a run
pub fn run_text(doc: &Document, nodes: &[NodeId]) -> String {
    nodes.iter().filter_map(|&id| doc.text(id)).collect()
}

/// How a `[start, end)` window over a run's text splits the run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Extraction {
    /// Run offset where the first matching node begins
    pub matching_offset: usize,
    pub before: Vec<NodeId>,
    /// Nodes fully or partially overlapping the window
    pub matching: Vec<NodeId>,
    pub after: Vec<NodeId>,
}

/// Partition `nodes` around the window `[start, end)` in one linear pass.
pub fn extract_matching_nodes(
    doc: &Document,
    nodes: &[NodeId],
    start: usize,
    end: usize,
) -> Extraction {
    let mut extraction = Extraction::default();
    let mut offset = 0;
    for &node in nodes {
        let len = doc.text(node).map_or(0, str::len);
        let node_start = offset;
        let node_end = offset + len;
        if node_end <= start {
            extraction.before.push(node);
            extraction.matching_offset += len;
        } else if node_start >= end {
            extraction.after.push(node);
        } else {
            extraction.matching.push(node);
        }
        offset = node_end;
    }
    extraction
}
