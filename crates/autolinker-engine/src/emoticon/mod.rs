//! Emoticon replacement: `:)` typed as text becomes an `emoticon` node
//! carrying the unified emoji id in its payload.

use std::collections::BTreeMap;

use crate::replace::{Match, ReplacementStrategy, TextMatcher};
use crate::tree::{Document, Node, NodeId, NodeKind, ReplacementNode, TextNode, TreeError};

pub const EMOTICON: &str = "emoticon";

/// Payload key of the unified emoji id, e.g. `1f642`
pub const UNIFIED: &str = "unified";

/// Tag of code elements. Emoticons inside them stay literal.
pub const CODE_TAG: &str = "code";

/// Finds catalog entries in text.
///
/// The earliest occurrence wins; among entries starting at the same offset
/// the longest one does.
#[derive(Debug, Clone, Default)]
pub struct EmoticonMatcher {
    catalog: BTreeMap<String, String>,
}

impl EmoticonMatcher {
    pub fn new<K, V>(catalog: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let catalog = catalog
            .into_iter()
            .map(|(text, unified)| (text.into(), unified.into()))
            .filter(|(text, _): &(String, String)| !text.is_empty())
            .collect();
        Self { catalog }
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }
}

impl TextMatcher for EmoticonMatcher {
    fn find(&self, text: &str, ancestor: Option<&Node>) -> Option<Match> {
        let suppressed = match ancestor.map(Node::kind) {
            Some(NodeKind::Replacement(_)) => true,
            Some(NodeKind::Element(element)) => element.tag == CODE_TAG,
            _ => false,
        };
        if suppressed {
            return None;
        }

        let (index, emoticon, unified) = self
            .catalog
            .iter()
            .filter_map(|(emoticon, unified)| {
                text.find(emoticon.as_str())
                    .map(|index| (index, emoticon, unified))
            })
            .min_by(|a, b| a.0.cmp(&b.0).then(b.1.len().cmp(&a.1.len())))?;

        Some(Match::new(index, emoticon.as_str()).with_payload(UNIFIED, unified.as_str()))
    }
}

/// Creates `emoticon` replacement nodes
#[derive(Debug, Clone, Copy, Default)]
pub struct EmoticonStrategy;

impl ReplacementStrategy for EmoticonStrategy {
    fn kind(&self) -> &str {
        EMOTICON
    }

    fn create(
        &self,
        doc: &mut Document,
        covered: &[NodeId],
        m: &Match,
    ) -> Result<NodeId, TreeError> {
        let format = covered
            .first()
            .and_then(|&id| doc.text_node(id))
            .map(|t| t.format)
            .unwrap_or_default();

        let emoticon = doc.create_replacement(
            ReplacementNode::new(EMOTICON).with_payload(m.payload.clone()),
        );
        let text = doc.create_text_node(TextNode::new(m.text.clone()).with_format(format));
        doc.append(emoticon, text)?;
        Ok(emoticon)
    }
}
