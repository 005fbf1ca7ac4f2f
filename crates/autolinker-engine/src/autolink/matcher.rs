use std::sync::OnceLock;

use regex::Regex;

use crate::replace::{Match, TextMatcher};
use crate::tree::{Node, NodeKind};

use super::{AUTO_LINK, REL, TARGET, URL};

/// Tag of manually created link elements. Auto-linking never nests inside them.
pub const LINK_TAG: &str = "link";

type UrlTransformer = Box<dyn Fn(&str) -> String>;

/// Regex-backed link matcher.
///
/// Reports the matched text, the URL derived from it and optional link
/// attributes in the match payload.
pub struct LinkMatcher {
    regex: Regex,
    url_transformer: Option<UrlTransformer>,
    rel: Option<String>,
    target: Option<String>,
    trim_trailing_punctuation: bool,
}

impl LinkMatcher {
    pub fn new(regex: Regex) -> Self {
        Self {
            regex,
            url_transformer: None,
            rel: None,
            target: None,
            trim_trailing_punctuation: false,
        }
    }

    /// HTTP and HTTPS URLs, without trailing sentence punctuation
    pub fn url() -> Self {
        static URL_REGEX: OnceLock<Regex> = OnceLock::new();
        let url_regex = URL_REGEX
            .get_or_init(|| Regex::new(r"https?://[^\s<>\[\]]+").expect("Invalid URL regex"));

        let mut matcher = Self::new(url_regex.clone());
        matcher.trim_trailing_punctuation = true;
        matcher
    }

    /// Derive the link URL from the matched text, e.g. prefix `mailto:`.
    pub fn with_url_transformer(mut self, transformer: impl Fn(&str) -> String + 'static) -> Self {
        self.url_transformer = Some(Box::new(transformer));
        self
    }

    pub fn with_url_prefix(self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.with_url_transformer(move |text| format!("{prefix}{text}"))
    }

    pub fn with_rel(mut self, rel: impl Into<String>) -> Self {
        self.rel = Some(rel.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Strip `.,:;!?)]}` from the end of every match.
    pub fn trimming_trailing_punctuation(mut self) -> Self {
        self.trim_trailing_punctuation = true;
        self
    }

    fn is_suppressed(ancestor: Option<&Node>) -> bool {
        match ancestor.map(Node::kind) {
            Some(NodeKind::Element(element)) => element.tag == LINK_TAG,
            Some(NodeKind::Replacement(replacement)) => replacement.kind == AUTO_LINK,
            _ => false,
        }
    }

    fn trimmed_end(&self, text: &str, start: usize, mut end: usize) -> usize {
        if !self.trim_trailing_punctuation {
            return end;
        }
        while let Some(last_char) = text[start..end].chars().last() {
            if matches!(
                last_char,
                '.' | ',' | ':' | ';' | '!' | '?' | ')' | ']' | '}'
            ) {
                end -= last_char.len_utf8();
            } else {
                break;
            }
        }
        end
    }
}

impl TextMatcher for LinkMatcher {
    fn find(&self, text: &str, ancestor: Option<&Node>) -> Option<Match> {
        if Self::is_suppressed(ancestor) {
            return None;
        }

        let (start, end) = self.regex.find_iter(text).find_map(|found| {
            let end = self.trimmed_end(text, found.start(), found.end());
            (end > found.start()).then_some((found.start(), end))
        })?;

        let matched = &text[start..end];
        let url = match &self.url_transformer {
            Some(transform) => transform(matched),
            None => matched.to_string(),
        };

        let mut m = Match::new(start, matched).with_payload(URL, url);
        if let Some(rel) = &self.rel {
            m = m.with_payload(REL, rel.clone());
        }
        if let Some(target) = &self.target {
            m = m.with_payload(TARGET, target.clone());
        }
        Some(m)
    }
}

impl std::fmt::Debug for LinkMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkMatcher")
            .field("regex", &self.regex.as_str())
            .field("rel", &self.rel)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
