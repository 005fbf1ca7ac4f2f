use crate::tree::{Node, Payload};

use super::InvalidMatcherResult;

/// A candidate span found by a [`TextMatcher`].
///
/// `index` and `length` are byte offsets into the text the matcher was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub index: usize,
    pub length: usize,
    pub text: String,
    pub payload: Payload,
}

impl Match {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            index,
            length: text.len(),
            text,
            payload: Payload::new(),
        }
    }

    pub fn with_payload(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn end(&self) -> usize {
        self.index + self.length
    }

    /// Check that the match addresses a non-empty, char-aligned slice of
    /// `subject` whose content equals `text`.
    pub fn check(&self, subject: &str) -> Result<(), InvalidMatcherResult> {
        if self.length == 0 {
            return Err(InvalidMatcherResult::Empty { index: self.index });
        }
        let end = self
            .index
            .checked_add(self.length)
            .filter(|&end| end <= subject.len())
            .ok_or(InvalidMatcherResult::OutOfBounds {
                index: self.index,
                length: self.length,
                len: subject.len(),
            })?;
        let actual = subject
            .get(self.index..end)
            .ok_or(InvalidMatcherResult::NotCharBoundary {
                index: self.index,
                length: self.length,
            })?;
        if actual != self.text {
            return Err(InvalidMatcherResult::TextMismatch {
                expected: self.text.clone(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }
}

/// Finds the first pattern occurrence in `text`.
///
/// `ancestor` is the parent of the scanned run, or `None` when re-validating
/// an existing replacement. Matchers must not mutate anything.
pub trait TextMatcher {
    fn find(&self, text: &str, ancestor: Option<&Node>) -> Option<Match>;
}

impl<F> TextMatcher for F
where
    F: Fn(&str, Option<&Node>) -> Option<Match>,
{
    fn find(&self, text: &str, ancestor: Option<&Node>) -> Option<Match> {
        self(text, ancestor)
    }
}

/// Ordered list of matchers. The first one returning a result wins.
#[derive(Default)]
pub struct MatcherPipeline {
    matchers: Vec<Box<dyn TextMatcher>>,
}

impl MatcherPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, matcher: impl TextMatcher + 'static) -> Self {
        self.push(matcher);
        self
    }

    pub fn push(&mut self, matcher: impl TextMatcher + 'static) {
        self.matchers.push(Box::new(matcher));
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Run matchers in order and return the first result, if it is valid.
    ///
    /// An invalid winning result ends the search: later matchers are not
    /// consulted.
    pub fn find_first(&self, text: &str, ancestor: Option<&Node>) -> Option<Match> {
        let found = self.matchers.iter().find_map(|m| m.find(text, ancestor))?;
        match found.check(text) {
            Ok(()) => Some(found),
            Err(e) => {
                log::warn!("ignoring matcher result in {text:?}: {e}");
                None
            }
        }
    }
}

impl std::fmt::Debug for MatcherPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatcherPipeline")
            .field("matchers", &self.matchers.len())
            .finish()
    }
}
