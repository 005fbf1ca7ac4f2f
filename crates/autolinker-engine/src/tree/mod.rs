//! # Document Tree Model
//!
//! Arena-owned rich-text tree. Every node lives in a slot of [`Document`] and
//! is addressed by a [`NodeId`]; parent, child and sibling links are ids, never
//! ownership.
//!
//! - **`node`**: node kinds (`Text`, `Element`, `LineBreak`, `Replacement`) and text metadata
//! - **`document`**: the arena with navigation, mutation and dirty tracking
//! - **`split`**: node splitter and the inverse text normalization
//! - **`invariants`**: structural assertions for tests

pub mod document;
pub mod error;
pub mod invariants;
pub mod node;
pub mod split;

pub use document::{Children, Document};
pub use error::TreeError;
pub use node::{
    Detail, ElementNode, Format, Node, NodeId, NodeKind, Payload, ReplacementNode, TextMode,
    TextNode,
};
