use thiserror::Error;

use super::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {0} does not exist")]
    NodeNotFound(NodeId),

    #[error("node {0} cannot have children")]
    NotAContainer(NodeId),

    #[error("node {0} is not a text node")]
    NotText(NodeId),

    #[error("node {0} has no parent")]
    Detached(NodeId),

    #[error("the root node cannot be moved or removed")]
    CannotMoveRoot,

    #[error("moving {node} under {parent} would create a cycle")]
    WouldCreateCycle { node: NodeId, parent: NodeId },

    #[error("invalid split offsets {offsets:?} for node {node} of length {len}")]
    InvalidSplitOffsets {
        node: NodeId,
        offsets: Vec<usize>,
        len: usize,
    },
}
