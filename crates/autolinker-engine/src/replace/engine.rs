use crate::tree::{Document, NodeId, Payload, TreeError};

use super::{Match, MatcherPipeline, ReplaceError, Separator, run};

/// Creates and removes the replacement nodes of one kind.
///
/// Injected into a [`Replacer`]; the engine never creates replacement nodes
/// itself.
pub trait ReplacementStrategy {
    /// Type tag of the replacement nodes this strategy owns (`"auto-link"`).
    fn kind(&self) -> &str;

    /// Build a detached replacement node for `match` from the covered text nodes.
    ///
    /// The text content of the returned node must equal `m.text`. Covered nodes
    /// the strategy does not move into the replacement are removed by the engine.
    fn create(&self, doc: &mut Document, covered: &[NodeId], m: &Match)
    -> Result<NodeId, TreeError>;

    /// Replace `node` with its children, in order.
    fn revert(&self, doc: &mut Document, node: NodeId) -> Result<(), TreeError> {
        doc.unwrap(node).map(|_| ())
    }

    /// Update the payload of a still-valid node from a fresh match.
    /// Returns whether anything changed.
    fn refresh(&self, _doc: &mut Document, _node: NodeId, _m: &Match) -> Result<bool, TreeError> {
        Ok(false)
    }
}

/// Structural change made by one engine invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplacementEvent {
    Created {
        node: NodeId,
        payload: Payload,
    },
    /// The node id is no longer live; `text` is what it contained.
    Reverted {
        node: NodeId,
        text: String,
        payload: Payload,
    },
    Refreshed {
        node: NodeId,
        previous: Payload,
        payload: Payload,
    },
}

/// The text-to-node replacement engine for one replacement kind.
///
/// Each call handles a single changed node and touches only its local run
/// and immediate neighbors. Wider propagation is left to the host, which
/// re-dispatches the nodes the call dirtied (see [`crate::transform`]).
pub struct Replacer<S> {
    strategy: S,
    matchers: MatcherPipeline,
    separator: Separator,
}

impl<S: ReplacementStrategy> Replacer<S> {
    pub fn new(strategy: S, matchers: MatcherPipeline) -> Self {
        Self {
            strategy,
            matchers,
            separator: Separator::default(),
        }
    }

    pub fn with_separator(mut self, separator: Separator) -> Self {
        self.separator = separator;
        self
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn matchers(&self) -> &MatcherPipeline {
        &self.matchers
    }

    pub fn separator(&self) -> &Separator {
        &self.separator
    }

    /// Whether `node` is a replacement node owned by this engine's strategy
    pub fn is_replacement(&self, doc: &Document, node: NodeId) -> bool {
        doc.node(node)
            .is_some_and(|n| n.is_replacement_of(self.strategy.kind()))
    }

    /// Single-pass entry point for an "on node changed" notification.
    ///
    /// - A replacement node, or a text node inside one, is re-validated
    ///   (edit mode) and reverted when it no longer holds a valid match.
    /// - A simple text node is scanned together with its forward run for new
    ///   matches (creation mode), then its neighbors are repaired.
    ///
    /// Removed or detached nodes are ignored. An empty simple text node is
    /// removed.
    pub fn on_node_changed(
        &self,
        doc: &mut Document,
        node: NodeId,
    ) -> Result<Vec<ReplacementEvent>, ReplaceError> {
        let mut pass = Pass::new(self, doc);
        pass.node_changed(node)?;
        Ok(pass.events)
    }

    /// Edit-mode validation of an existing replacement node
    pub fn validate(
        &self,
        doc: &mut Document,
        node: NodeId,
    ) -> Result<Vec<ReplacementEvent>, ReplaceError> {
        let mut pass = Pass::new(self, doc);
        pass.expect_replacement(node)?;
        pass.handle_edit(node)?;
        Ok(pass.events)
    }

    /// Unwrap a replacement node back into plain text
    pub fn revert(
        &self,
        doc: &mut Document,
        node: NodeId,
    ) -> Result<Vec<ReplacementEvent>, ReplaceError> {
        let mut pass = Pass::new(self, doc);
        pass.expect_replacement(node)?;
        pass.revert(node)?;
        Ok(pass.events)
    }
}

impl<S> std::fmt::Debug for Replacer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Replacer")
            .field("matchers", &self.matchers)
            .field("separator", &self.separator)
            .finish_non_exhaustive()
    }
}

/// State of one engine invocation
struct Pass<'a, S> {
    replacer: &'a Replacer<S>,
    doc: &'a mut Document,
    events: Vec<ReplacementEvent>,
}

impl<'a, S: ReplacementStrategy> Pass<'a, S> {
    fn new(replacer: &'a Replacer<S>, doc: &'a mut Document) -> Self {
        Self {
            replacer,
            doc,
            events: Vec::new(),
        }
    }

    fn kind(&self) -> &'a str {
        let replacer: &'a Replacer<S> = self.replacer;
        replacer.strategy.kind()
    }

    fn separator(&self) -> &'a Separator {
        let replacer: &'a Replacer<S> = self.replacer;
        &replacer.separator
    }

    fn is_replacement(&self, node: NodeId) -> bool {
        self.replacer.is_replacement(self.doc, node)
    }

    fn expect_replacement(&self, node: NodeId) -> Result<(), ReplaceError> {
        if self.is_replacement(node) {
            Ok(())
        } else if !self.doc.contains(node) {
            Err(TreeError::NodeNotFound(node).into())
        } else {
            Err(ReplaceError::WrongReplacementKind {
                node,
                expected: self.kind().to_string(),
            })
        }
    }

    fn payload(&self, node: NodeId) -> Payload {
        self.doc
            .replacement(node)
            .map(|r| r.payload.clone())
            .unwrap_or_default()
    }

    fn node_changed(&mut self, node: NodeId) -> Result<(), ReplaceError> {
        if !self.doc.is_attached(node) {
            log::trace!("skipping removed or detached node {node}");
            return Ok(());
        }
        if self.is_replacement(node) {
            return self.handle_edit(node);
        }
        let Some(parent) = self.doc.parent(node) else {
            return Ok(());
        };
        if self.is_replacement(parent) {
            return self.handle_edit(parent);
        }

        let Some(text) = self.doc.text_node(node) else {
            return Ok(());
        };
        if !text.is_simple() {
            log::trace!("skipping complex text node {node}");
            return Ok(());
        }
        if text.text.is_empty() {
            log::debug!("removing empty text node {node}");
            self.doc.remove(node)?;
            return Ok(());
        }

        let starts_with_separator = self.separator().starts_with(&text.text);
        let follows_replacement = self
            .doc
            .prev_sibling(node)
            .is_some_and(|previous| self.is_replacement(previous));
        // Text glued onto a replacement is handled by the neighbor repair
        if starts_with_separator || !follows_replacement {
            let run = run::collect_run(self.doc, node);
            self.handle_creation(parent, run)?;
        }

        self.repair_neighbors(node)
    }

    // ============ Creation mode ============

    fn handle_creation(
        &mut self,
        parent: NodeId,
        mut nodes: Vec<NodeId>,
    ) -> Result<(), ReplaceError> {
        let mut text = run::run_text(self.doc, &nodes);
        let mut consumed = 0;

        // Every iteration either advances `consumed` or shrinks `text`
        while consumed < text.len() {
            let ancestor = self.doc.node(parent);
            let Some(m) = self
                .replacer
                .matchers
                .find_first(&text[consumed..], ancestor)
            else {
                break;
            };
            let start = consumed + m.index;
            let end = consumed + m.end();

            if !self.is_content_around_valid(start, end, &text, &nodes) {
                log::trace!("skipping {:?} at {start}..{end}: no separator around it", m.text);
                consumed = end;
                continue;
            }

            let extraction = run::extract_matching_nodes(self.doc, &nodes, start, end);
            let remainder = self.replace_nodes(
                &extraction.matching,
                start - extraction.matching_offset,
                end - extraction.matching_offset,
                &m,
            )?;
            nodes = remainder.into_iter().chain(extraction.after).collect();
            text = run::run_text(self.doc, &nodes);
            consumed = 0;
        }
        Ok(())
    }

    /// Split the matching nodes at the window edges, wrap the covered pieces
    /// in a new replacement node and return the leftover tail piece.
    fn replace_nodes(
        &mut self,
        matching: &[NodeId],
        start: usize,
        end: usize,
        m: &Match,
    ) -> Result<Option<NodeId>, ReplaceError> {
        let mut covered = Vec::new();
        let mut remainder = None;
        let mut offset = 0;

        for &node in matching {
            let len = self.doc.text_len(node)?;
            let cuts: Vec<usize> = [start, end]
                .into_iter()
                .filter(|&cut| cut > offset && cut < offset + len)
                .map(|cut| cut - offset)
                .collect();

            let mut piece_start = offset;
            for piece in self.doc.split_text(node, &cuts)? {
                if piece_start >= end {
                    remainder = Some(piece);
                } else if piece_start >= start {
                    covered.push(piece);
                }
                piece_start += self.doc.text_len(piece)?;
            }
            offset += len;
        }

        let Some(&first) = covered.first() else {
            return Ok(remainder);
        };
        let parent = self.doc.parent(first).ok_or(TreeError::Detached(first))?;
        let anchor = self.doc.prev_sibling(first);

        let replacement = self.replacer.strategy.create(self.doc, &covered, m)?;
        self.expect_replacement(replacement)?;
        match anchor {
            Some(anchor) if self.doc.parent(anchor) == Some(parent) => {
                self.doc.insert_after(anchor, replacement)?
            }
            _ => self.doc.prepend(parent, replacement)?,
        }
        for &node in &covered {
            if self.doc.parent(node) == Some(parent) {
                self.doc.remove(node)?;
            }
        }

        let actual = self.doc.text_content(replacement);
        if actual != m.text {
            return Err(ReplaceError::CallbackContractViolation {
                node: replacement,
                expected: m.text.clone(),
                actual,
            });
        }

        log::debug!("created {} node {replacement} for {:?}", self.kind(), m.text);
        self.events.push(ReplacementEvent::Created {
            node: replacement,
            payload: self.payload(replacement),
        });
        Ok(remainder)
    }

    // ============ Boundary validity ============

    fn is_content_around_valid(
        &self,
        start: usize,
        end: usize,
        text: &str,
        nodes: &[NodeId],
    ) -> bool {
        let separator = self.separator();
        let before_valid = if start > 0 {
            text[..start]
                .chars()
                .next_back()
                .is_some_and(|c| separator.is_separator(c))
        } else {
            nodes
                .first()
                .is_some_and(|&node| self.is_previous_node_valid(node))
        };
        if !before_valid {
            return false;
        }

        if end < text.len() {
            text[end..]
                .chars()
                .next()
                .is_some_and(|c| separator.is_separator(c))
        } else {
            nodes
                .last()
                .is_some_and(|&node| self.is_next_node_valid(node))
        }
    }

    fn is_previous_node_valid(&self, node: NodeId) -> bool {
        let mut previous = self.doc.prev_sibling(node);
        if let Some(container) = previous.filter(|&p| self.doc.is_container(p)) {
            previous = self.doc.last_descendant(container);
        }
        match previous {
            None => true,
            Some(previous) => {
                self.doc.is_line_break(previous)
                    || self
                        .doc
                        .text(previous)
                        .is_some_and(|t| self.separator().ends_with(t))
            }
        }
    }

    fn is_next_node_valid(&self, node: NodeId) -> bool {
        let mut next = self.doc.next_sibling(node);
        if let Some(container) = next.filter(|&n| self.doc.is_container(n)) {
            next = self.doc.first_descendant(container);
        }
        match next {
            None => true,
            Some(next) => {
                self.doc.is_line_break(next)
                    || self
                        .doc
                        .text(next)
                        .is_some_and(|t| self.separator().starts_with(t))
            }
        }
    }

    // ============ Edit mode ============

    fn handle_edit(&mut self, node: NodeId) -> Result<(), ReplaceError> {
        let all_simple = self
            .doc
            .children(node)
            .all(|child| self.doc.is_simple_text(child));
        if !all_simple {
            log::debug!("{node} holds non-simple children");
            return self.revert(node);
        }

        let text = self.doc.text_content(node);
        let found = self.replacer.matchers.find_first(&text, None);
        let Some(m) = found.filter(|m| m.text == text) else {
            log::debug!("{node} no longer matches as a whole: {text:?}");
            return self.revert(node);
        };

        if !self.is_previous_node_valid(node) || !self.is_next_node_valid(node) {
            log::debug!("{node} is glued to its neighbors");
            return self.revert(node);
        }

        let previous = self.payload(node);
        if self.replacer.strategy.refresh(self.doc, node, &m)? {
            self.events.push(ReplacementEvent::Refreshed {
                node,
                previous,
                payload: self.payload(node),
            });
        }
        Ok(())
    }

    /// Unwrap `node` through the strategy, then normalize the text it leaves behind.
    fn revert(&mut self, node: NodeId) -> Result<(), ReplaceError> {
        let payload = self.payload(node);
        let text = self.doc.text_content(node);
        let parent = self.doc.parent(node).ok_or(TreeError::Detached(node))?;
        let before = self.doc.prev_sibling(node);
        let after = self.doc.next_sibling(node);

        self.replacer.strategy.revert(self.doc, node)?;
        if self.doc.contains(node) {
            if self.doc.parent(node).is_some() || self.doc.first_child(node).is_some() {
                return Err(ReplaceError::RevertIncomplete(node));
            }
            self.doc.remove(node)?;
        }

        let first = before
            .filter(|&b| self.doc.parent(b) == Some(parent))
            .or_else(|| self.doc.first_child(parent));
        if let Some(first) = first {
            let stop = after.and_then(|a| self.doc.next_sibling(a));
            self.doc.merge_text_siblings(first, after)?;
            self.remove_empty_text(first, stop)?;
        }

        log::debug!("reverted {} node {node} ({text:?})", self.kind());
        self.events.push(ReplacementEvent::Reverted {
            node,
            text,
            payload,
        });
        Ok(())
    }

    /// Drop zero-length simple text from `first` up to, not including, `stop`.
    fn remove_empty_text(
        &mut self,
        first: NodeId,
        stop: Option<NodeId>,
    ) -> Result<(), ReplaceError> {
        let mut current = Some(first);
        while let Some(id) = current.filter(|&id| Some(id) != stop) {
            current = self.doc.next_sibling(id);
            let empty = self
                .doc
                .text_node(id)
                .is_some_and(|t| t.is_simple() && t.text.is_empty());
            if empty {
                log::debug!("removing empty text node {id}");
                self.doc.remove(id)?;
            }
        }
        Ok(())
    }

    // ============ Neighbor repair ============

    fn repair_neighbors(&mut self, node: NodeId) -> Result<(), ReplaceError> {
        if self.doc.parent(node).is_none() {
            return Ok(());
        }
        let Some(text) = self.doc.text(node) else {
            return Ok(());
        };
        let starts_with_separator = self.separator().starts_with(text);
        let ends_with_separator = self.separator().ends_with(text);
        let previous = self.doc.prev_sibling(node);
        let next = self.doc.next_sibling(node);

        if let Some(previous) = previous.filter(|&p| self.is_replacement(p))
            && !starts_with_separator
        {
            log::debug!("merging {node} into preceding {previous}");
            self.doc.append(previous, node)?;
            self.handle_edit(previous)?;
        }

        if let Some(next) = next.filter(|&n| self.is_replacement(n))
            && !ends_with_separator
        {
            log::debug!("{node} is glued to following {next}");
            self.revert(next)?;
        }
        Ok(())
    }
}
