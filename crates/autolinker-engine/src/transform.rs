//! Host-side re-dispatch of dirty text nodes.
//!
//! The engine handles one changed node per call. Its own edits dirty further
//! nodes (split pieces, merged text, link children), and [`run_transforms`]
//! keeps feeding those back until the document settles.

use crate::autolink::AutoLinker;
use crate::replace::{ReplaceError, ReplacementEvent, ReplacementStrategy, Replacer};
use crate::tree::{Document, NodeId};

/// Upper bound on dispatch passes before the loop is declared non-terminating
pub const MAX_TRANSFORM_PASSES: usize = 100;

/// Anything that reacts to a changed text node
pub trait NodeTransform {
    fn transform(
        &self,
        doc: &mut Document,
        node: NodeId,
    ) -> Result<Vec<ReplacementEvent>, ReplaceError>;
}

impl<S: ReplacementStrategy> NodeTransform for Replacer<S> {
    fn transform(
        &self,
        doc: &mut Document,
        node: NodeId,
    ) -> Result<Vec<ReplacementEvent>, ReplaceError> {
        self.on_node_changed(doc, node)
    }
}

impl NodeTransform for AutoLinker {
    fn transform(
        &self,
        doc: &mut Document,
        node: NodeId,
    ) -> Result<Vec<ReplacementEvent>, ReplaceError> {
        self.on_node_changed(doc, node)
    }
}

/// Dispatch every dirty text node to each transform until nothing is dirty.
///
/// Returns all events in the order they happened. Nodes removed by an
/// earlier transform in the same pass are skipped by the engine.
pub fn run_transforms(
    doc: &mut Document,
    transforms: &[&dyn NodeTransform],
) -> Result<Vec<ReplacementEvent>, ReplaceError> {
    let mut events = Vec::new();
    for pass in 0..=MAX_TRANSFORM_PASSES {
        let dirty = doc.take_dirty();
        if dirty.is_empty() {
            log::trace!("transforms settled after {pass} passes");
            return Ok(events);
        }
        if pass == MAX_TRANSFORM_PASSES {
            break;
        }
        for node in dirty {
            for transform in transforms {
                events.extend(transform.transform(doc, node)?);
            }
        }
    }
    Err(ReplaceError::TransformLoop {
        passes: MAX_TRANSFORM_PASSES,
    })
}
