//! # Replacement Engine
//!
//! Turns text spans recognized by a [`MatcherPipeline`] into replacement nodes
//! and keeps them valid as the surrounding text is edited.
//!
//! - **`matcher`**: `Match`, the `TextMatcher` trait and the ordered pipeline
//! - **`separator`**: the character class that must surround every match
//! - **`run`**: run collection and match-window partitioning
//! - **`engine`**: the `Replacer` state machine (creation, edit and neighbor repair)
//!
//! ## Usage
//!
//! ```rust
//! use autolinker_engine::autolink::{AutoLinkStrategy, LinkMatcher};
//! use autolinker_engine::replace::{MatcherPipeline, Replacer};
//! use autolinker_engine::tree::Document;
//!
//! let mut doc = Document::new();
//! let p = doc.create_element("paragraph");
//! doc.append(doc.root(), p).unwrap();
//! let text = doc.create_text("Visit https://x.com now");
//! doc.append(p, text).unwrap();
//!
//! let replacer = Replacer::new(
//!     AutoLinkStrategy,
//!     MatcherPipeline::new().with(LinkMatcher::url()),
//! );
//! let events = replacer.on_node_changed(&mut doc, text).unwrap();
//! assert_eq!(events.len(), 1);
//! ```

pub mod engine;
pub mod error;
pub mod matcher;
pub mod run;
pub mod separator;

pub use engine::{ReplacementEvent, ReplacementStrategy, Replacer};
pub use error::{InvalidMatcherResult, ReplaceError};
pub use matcher::{Match, MatcherPipeline, TextMatcher};
pub use separator::{DEFAULT_SEPARATOR_CLASS, Separator};
