//! Splitting text nodes at byte offsets and merging them back.

use super::{Document, NodeId, TextNode, TreeError};

impl Document {
    /// Cut a text node at the given byte offsets.
    ///
    /// `offsets` must be strictly increasing, within `0..=len` and on `char`
    /// boundaries. Offsets `0` and `len` produce no cut. The original node keeps
    /// the first piece; every further piece is a new node inheriting format,
    /// detail and mode, inserted right after its predecessor when the original
    /// is attached.
    ///
    /// Returns all pieces in order, the original id first.
    pub fn split_text(&mut self, id: NodeId, offsets: &[usize]) -> Result<Vec<NodeId>, TreeError> {
        let template = self.text_node(id).cloned().ok_or_else(|| {
            if self.contains(id) {
                TreeError::NotText(id)
            } else {
                TreeError::NodeNotFound(id)
            }
        })?;
        let text = template.text.as_str();
        let len = text.len();

        let invalid = offsets.iter().enumerate().any(|(i, &offset)| {
            offset > len || !text.is_char_boundary(offset) || (i > 0 && offset <= offsets[i - 1])
        });
        if invalid {
            return Err(TreeError::InvalidSplitOffsets {
                node: id,
                offsets: offsets.to_vec(),
                len,
            });
        }

        let mut bounds = vec![0];
        bounds.extend(offsets.iter().copied().filter(|&o| o > 0 && o < len));
        bounds.push(len);
        if bounds.len() == 2 {
            return Ok(vec![id]);
        }

        let attached = self.parent(id).is_some();
        self.set_text(id, &text[bounds[0]..bounds[1]])?;
        let mut pieces = vec![id];
        let mut anchor = id;
        for window in bounds.windows(2).skip(1) {
            let piece = self.create_text_node(TextNode {
                text: text[window[0]..window[1]].to_string(),
                ..template.clone()
            });
            if attached {
                self.insert_after(anchor, piece)?;
            }
            anchor = piece;
            pieces.push(piece);
        }
        Ok(pieces)
    }

    /// Merge adjacent mergeable text siblings, starting at `first` and stopping
    /// once `last` has been merged or passed. With `last == None` the walk runs
    /// to the end of the sibling list.
    ///
    /// The surviving node of each merge is the earlier one.
    pub fn merge_text_siblings(
        &mut self,
        first: NodeId,
        last: Option<NodeId>,
    ) -> Result<(), TreeError> {
        let mut current = first;
        loop {
            if Some(current) == last {
                break;
            }
            let Some(next) = self.next_sibling(current) else {
                break;
            };
            let mergeable = match (self.text_node(current), self.text_node(next)) {
                (Some(a), Some(b)) => a.can_merge_with(b),
                _ => false,
            };
            if mergeable {
                let tail = self.text_node_mut(next)?.text.split_off(0);
                self.text_node_mut(current)?.text.push_str(&tail);
                self.mark_dirty(current);
                self.remove(next)?;
                if Some(next) == last {
                    break;
                }
            } else {
                current = next;
            }
        }
        Ok(())
    }
}
