//! # Auto-linking
//!
//! Wraps URLs (or anything a [`LinkMatcher`] recognizes) typed into plain text
//! in `auto-link` replacement nodes, and unwraps them again once they stop
//! matching.
//!
//! The payload of every auto-link carries `url` and, when configured, `rel`
//! and `target`.

pub mod matcher;
pub mod strategy;

pub use matcher::{LINK_TAG, LinkMatcher};
pub use strategy::AutoLinkStrategy;

use crate::replace::{MatcherPipeline, ReplaceError, ReplacementEvent, Replacer, Separator};
use crate::tree::{Document, NodeId, Payload};

pub const AUTO_LINK: &str = "auto-link";

pub const URL: &str = "url";
pub const REL: &str = "rel";
pub const TARGET: &str = "target";

/// Called with `(url, previous_url)` whenever an auto-link appears,
/// disappears or changes its URL.
pub type ChangeHandler = Box<dyn Fn(Option<&str>, Option<&str>)>;

/// Auto-link engine with optional change notifications
pub struct AutoLinker {
    replacer: Replacer<AutoLinkStrategy>,
    on_change: Option<ChangeHandler>,
}

impl AutoLinker {
    pub fn new(matchers: impl IntoIterator<Item = LinkMatcher>) -> Self {
        let pipeline = matchers
            .into_iter()
            .fold(MatcherPipeline::new(), |pipeline, matcher| pipeline.with(matcher));
        Self {
            replacer: Replacer::new(AutoLinkStrategy, pipeline),
            on_change: None,
        }
    }

    pub fn with_separator(mut self, separator: Separator) -> Self {
        self.replacer = self.replacer.with_separator(separator);
        self
    }

    pub fn on_change(mut self, handler: impl Fn(Option<&str>, Option<&str>) + 'static) -> Self {
        self.on_change = Some(Box::new(handler));
        self
    }

    pub fn replacer(&self) -> &Replacer<AutoLinkStrategy> {
        &self.replacer
    }

    pub fn on_node_changed(
        &self,
        doc: &mut Document,
        node: NodeId,
    ) -> Result<Vec<ReplacementEvent>, ReplaceError> {
        let events = self.replacer.on_node_changed(doc, node)?;
        self.notify(&events);
        Ok(events)
    }

    fn notify(&self, events: &[ReplacementEvent]) {
        let Some(handler) = &self.on_change else {
            return;
        };
        for event in events {
            match event {
                ReplacementEvent::Created { payload, .. } => handler(url(payload), None),
                ReplacementEvent::Reverted { payload, .. } => handler(None, url(payload)),
                ReplacementEvent::Refreshed {
                    previous, payload, ..
                } => {
                    if url(payload) != url(previous) {
                        handler(url(payload), url(previous));
                    }
                }
            }
        }
    }
}

fn url(payload: &Payload) -> Option<&str> {
    payload.get(URL).map(String::as_str)
}

impl Default for AutoLinker {
    fn default() -> Self {
        Self::new([LinkMatcher::url()])
    }
}

impl std::fmt::Debug for AutoLinker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoLinker")
            .field("replacer", &self.replacer)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}
