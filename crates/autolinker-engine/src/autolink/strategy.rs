use crate::replace::{Match, ReplacementStrategy};
use crate::tree::{Document, NodeId, ReplacementNode, TextNode, TreeError};

use super::{AUTO_LINK, REL, TARGET, URL};

/// Creates `auto-link` replacement nodes.
///
/// The link gets a single text child holding the match text, formatted like
/// the first covered node. Formatting carried by later covered nodes is lost.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoLinkStrategy;

impl ReplacementStrategy for AutoLinkStrategy {
    fn kind(&self) -> &str {
        AUTO_LINK
    }

    fn create(
        &self,
        doc: &mut Document,
        covered: &[NodeId],
        m: &Match,
    ) -> Result<NodeId, TreeError> {
        let mut inner = TextNode::new(m.text.clone());
        if let Some(template) = covered.first().and_then(|&id| doc.text_node(id)) {
            inner = inner
                .with_format(template.format)
                .with_detail(template.detail);
        }

        let link = doc.create_replacement(
            ReplacementNode::new(AUTO_LINK).with_payload(m.payload.clone()),
        );
        let text = doc.create_text_node(inner);
        doc.append(link, text)?;
        Ok(link)
    }

    fn refresh(&self, doc: &mut Document, node: NodeId, m: &Match) -> Result<bool, TreeError> {
        let link = doc
            .replacement_mut(node)
            .ok_or(TreeError::NodeNotFound(node))?;

        let mut changed = false;
        for key in [URL, REL, TARGET] {
            let fresh = m.payload.get(key);
            if link.payload.get(key) == fresh {
                continue;
            }
            match fresh {
                Some(value) => link.payload.insert(key.to_string(), value.clone()),
                None => link.payload.remove(key),
            };
            changed = true;
        }
        Ok(changed)
    }
}
