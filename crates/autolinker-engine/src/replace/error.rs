use thiserror::Error;

use crate::tree::{NodeId, TreeError};

/// A matcher returned a result that does not address its input.
///
/// Never fatal: the pipeline logs it and treats the scan as "no match".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidMatcherResult {
    #[error("zero-length match at {index}")]
    Empty { index: usize },

    #[error("match {index}+{length} exceeds text length {len}")]
    OutOfBounds {
        index: usize,
        length: usize,
        len: usize,
    },

    #[error("match {index}+{length} does not fall on character boundaries")]
    NotCharBoundary { index: usize, length: usize },

    #[error("match text {expected:?} differs from the addressed text {actual:?}")]
    TextMismatch { expected: String, actual: String },
}

#[derive(Debug, Error)]
pub enum ReplaceError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// `create` produced a node whose text does not reproduce the match.
    #[error("replacement {node} reads {actual:?} but the match was {expected:?}")]
    CallbackContractViolation {
        node: NodeId,
        expected: String,
        actual: String,
    },

    #[error("replacement {node} is not a {expected:?} node")]
    WrongReplacementKind { node: NodeId, expected: String },

    #[error("revert left replacement {0} in the tree")]
    RevertIncomplete(NodeId),

    #[error("transforms still dirtied nodes after {passes} passes")]
    TransformLoop { passes: usize },
}
