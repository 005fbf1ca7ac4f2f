use std::collections::BTreeSet;

use super::{ElementNode, Node, NodeId, NodeKind, ReplacementNode, TextMode, TextNode, TreeError};

/// Arena-backed rich-text document tree.
///
/// The arena owns every node; parent and sibling links are plain [`NodeId`]s,
/// so navigation is O(1) in every direction without reference cycles.
/// Nodes that are created but never inserted stay detached until they are
/// attached with [`append`](Self::append) or one of the `insert_*` methods.
///
/// Text mutations and insertions of text nodes mark the node dirty. A host
/// drains the dirty set with [`take_dirty`](Self::take_dirty) and dispatches
/// the ids to its node transforms.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Option<Node>>,
    root: NodeId,
    dirty: BTreeSet<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(Node::new(NodeKind::Root))],
            root: NodeId(0),
            dirty: BTreeSet::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(Node::new(kind)));
        id
    }

    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Element(ElementNode { tag: tag.into() }))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create_text_node(TextNode::new(text))
    }

    pub fn create_text_node(&mut self, text: TextNode) -> NodeId {
        self.alloc(NodeKind::Text(text))
    }

    pub fn create_line_break(&mut self) -> NodeId {
        self.alloc(NodeKind::LineBreak)
    }

    pub fn create_replacement(&mut self, replacement: ReplacementNode) -> NodeId {
        self.alloc(NodeKind::Replacement(replacement))
    }

    // ============ Lookup ============

    /// Whether `id` refers to a live (not removed) node
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    pub(crate) fn get(&self, id: NodeId) -> Result<&Node, TreeError> {
        self.node(id).ok_or(TreeError::NodeNotFound(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(TreeError::NodeNotFound(id))
    }

    /// Number of live nodes, root included
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(Node::kind)
    }

    pub fn text_node(&self, id: NodeId) -> Option<&TextNode> {
        self.node(id).and_then(Node::as_text)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.text_node(id).map(|t| t.text.as_str())
    }

    pub fn text_len(&self, id: NodeId) -> Result<usize, TreeError> {
        self.text(id).map(str::len).ok_or(TreeError::NotText(id))
    }

    pub fn replacement(&self, id: NodeId) -> Option<&ReplacementNode> {
        self.node(id).and_then(Node::as_replacement)
    }

    pub fn replacement_mut(&mut self, id: NodeId) -> Option<&mut ReplacementNode> {
        match self.nodes.get_mut(id.index()).and_then(Option::as_mut) {
            Some(Node {
                kind: NodeKind::Replacement(replacement),
                ..
            }) => Some(replacement),
            _ => None,
        }
    }

    pub fn is_simple_text(&self, id: NodeId) -> bool {
        self.text_node(id).is_some_and(TextNode::is_simple)
    }

    pub fn is_container(&self, id: NodeId) -> bool {
        self.kind(id).is_some_and(NodeKind::is_container)
    }

    pub fn is_line_break(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::LineBreak))
    }

    // ============ Navigation ============

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.prev)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.next)
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.first_child)
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.last_child)
    }

    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(id),
        }
    }

    /// Whether `id` is reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return self.contains(current);
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Deepest first node under `id`. Descends through containers until one has no children.
    pub fn first_descendant(&self, id: NodeId) -> Option<NodeId> {
        let mut node = self.first_child(id)?;
        while self.is_container(node) {
            match self.first_child(node) {
                Some(child) => node = child,
                None => break,
            }
        }
        Some(node)
    }

    /// Deepest last node under `id`. Descends through containers until one has no children.
    pub fn last_descendant(&self, id: NodeId) -> Option<NodeId> {
        let mut node = self.last_child(id)?;
        while self.is_container(node) {
            match self.last_child(node) {
                Some(child) => node = child,
                None => break,
            }
        }
        Some(node)
    }

    /// Concatenated text of `id` and all its descendants. Line breaks count as `\n`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.push_text_content(id, &mut out);
        out
    }

    fn push_text_content(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => out.push_str(&text.text),
            Some(NodeKind::LineBreak) => out.push('\n'),
            Some(_) => {
                for child in self.children(id) {
                    self.push_text_content(child, out);
                }
            }
            None => {}
        }
    }

    // ============ Mutation ============

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), TreeError> {
        match &mut self.get_mut(id)?.kind {
            NodeKind::Text(node) => node.text = text.into(),
            _ => return Err(TreeError::NotText(id)),
        }
        self.dirty.insert(id);
        Ok(())
    }

    pub(crate) fn text_node_mut(&mut self, id: NodeId) -> Result<&mut TextNode, TreeError> {
        match &mut self.get_mut(id)?.kind {
            NodeKind::Text(node) => Ok(node),
            _ => Err(TreeError::NotText(id)),
        }
    }

    fn ensure_container(&self, id: NodeId) -> Result<(), TreeError> {
        if self.get(id)?.kind.is_container() {
            Ok(())
        } else {
            Err(TreeError::NotAContainer(id))
        }
    }

    fn ensure_movable(&self, node: NodeId, new_parent: NodeId) -> Result<(), TreeError> {
        if node == self.root {
            return Err(TreeError::CannotMoveRoot);
        }
        self.get(node)?;
        let mut current = Some(new_parent);
        while let Some(ancestor) = current {
            if ancestor == node {
                return Err(TreeError::WouldCreateCycle {
                    node,
                    parent: new_parent,
                });
            }
            current = self.parent(ancestor);
        }
        Ok(())
    }

    /// Unlink `id` from its parent. The subtree stays alive and can be re-inserted.
    pub fn detach(&mut self, id: NodeId) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::CannotMoveRoot);
        }
        let (parent, prev, next) = {
            let node = self.get(id)?;
            (node.parent, node.prev, node.next)
        };
        let Some(parent) = parent else {
            return Ok(());
        };

        match prev {
            Some(prev) => self.get_mut(prev)?.next = next,
            None => self.get_mut(parent)?.first_child = next,
        }
        match next {
            Some(next) => self.get_mut(next)?.prev = prev,
            None => self.get_mut(parent)?.last_child = prev,
        }

        let node = self.get_mut(id)?;
        node.parent = None;
        node.prev = None;
        node.next = None;
        Ok(())
    }

    /// Link a detached node between two adjacent children of `parent`.
    fn link(
        &mut self,
        parent: NodeId,
        prev: Option<NodeId>,
        next: Option<NodeId>,
        id: NodeId,
    ) -> Result<(), TreeError> {
        {
            let node = self.get_mut(id)?;
            node.parent = Some(parent);
            node.prev = prev;
            node.next = next;
        }
        match prev {
            Some(prev) => self.get_mut(prev)?.next = Some(id),
            None => self.get_mut(parent)?.first_child = Some(id),
        }
        match next {
            Some(next) => self.get_mut(next)?.prev = Some(id),
            None => self.get_mut(parent)?.last_child = Some(id),
        }
        if self.text_node(id).is_some() {
            self.dirty.insert(id);
        }
        Ok(())
    }

    /// Move `child` to the end of `parent`'s children
    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.ensure_container(parent)?;
        self.ensure_movable(child, parent)?;
        self.detach(child)?;
        let last = self.last_child(parent);
        self.link(parent, last, None, child)
    }

    /// Move `child` to the start of `parent`'s children
    pub fn prepend(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.ensure_container(parent)?;
        self.ensure_movable(child, parent)?;
        self.detach(child)?;
        let first = self.first_child(parent);
        self.link(parent, None, first, child)
    }

    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) -> Result<(), TreeError> {
        if anchor == node {
            return Ok(());
        }
        let parent = self.get(anchor)?.parent.ok_or(TreeError::Detached(anchor))?;
        self.ensure_movable(node, parent)?;
        self.detach(node)?;
        let prev = self.prev_sibling(anchor);
        self.link(parent, prev, Some(anchor), node)
    }

    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) -> Result<(), TreeError> {
        if anchor == node {
            return Ok(());
        }
        let parent = self.get(anchor)?.parent.ok_or(TreeError::Detached(anchor))?;
        self.ensure_movable(node, parent)?;
        self.detach(node)?;
        let next = self.next_sibling(anchor);
        self.link(parent, Some(anchor), next, node)
    }

    /// Put `new` where `old` is and remove `old` with its remaining subtree
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), TreeError> {
        if old == new {
            return Ok(());
        }
        self.insert_after(old, new)?;
        self.remove(old)
    }

    /// Detach `id` and free it together with all its descendants
    pub fn remove(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            stack.extend(self.children(current));
            self.nodes[current.index()] = None;
            self.dirty.remove(&current);
        }
        Ok(())
    }

    /// Replace container `id` with its children, in order, then remove it.
    pub fn unwrap(&mut self, id: NodeId) -> Result<Vec<NodeId>, TreeError> {
        self.get(id)?.parent.ok_or(TreeError::Detached(id))?;
        let children: Vec<NodeId> = self.children(id).collect();
        for &child in &children {
            self.insert_before(id, child)?;
        }
        self.remove(id)?;
        Ok(children)
    }

    // ============ Dirty tracking ============

    pub fn mark_dirty(&mut self, id: NodeId) {
        if self.contains(id) {
            self.dirty.insert(id);
        }
    }

    pub fn is_dirty(&self, id: NodeId) -> bool {
        self.dirty.contains(&id)
    }

    /// Drain dirty node ids in ascending id order
    pub fn take_dirty(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }

    // ============ Debug rendering ============

    /// Indented, id-free rendering of the attached tree, one node per line.
    pub fn dump(&self) -> String {
        let mut lines = Vec::new();
        self.dump_node(self.root, 0, &mut lines);
        lines.join("\n")
    }

    fn dump_node(&self, id: NodeId, depth: usize, lines: &mut Vec<String>) {
        let Some(node) = self.node(id) else {
            return;
        };
        let label = match &node.kind {
            NodeKind::Root => "root".to_string(),
            NodeKind::Element(element) => element.tag.clone(),
            NodeKind::LineBreak => "linebreak".to_string(),
            NodeKind::Text(text) => {
                let mut label = format!("text {:?}", text.text);
                if !text.format.is_empty() {
                    label.push_str(&format!(" [{}]", text.format));
                }
                match text.mode {
                    TextMode::Normal => {}
                    TextMode::Token => label.push_str(" (token)"),
                    TextMode::Segmented => label.push_str(" (segmented)"),
                }
                label
            }
            NodeKind::Replacement(replacement) => {
                let mut label = replacement.kind.clone();
                for (key, value) in &replacement.payload {
                    label.push_str(&format!(" {key}={value:?}"));
                }
                label
            }
        };
        lines.push(format!("{}{label}", "  ".repeat(depth)));
        for child in self.children(id) {
            self.dump_node(child, depth + 1, lines);
        }
    }
}

/// Iterator over the direct children of a node, in sibling order
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.next_sibling(current);
        Some(current)
    }
}
