pub mod autolink;
pub mod emoticon;
pub mod replace;
pub mod transform;
pub mod tree;

// Re-export key types for easier usage
pub use autolink::{AutoLinkStrategy, AutoLinker, LinkMatcher};
pub use emoticon::{EmoticonMatcher, EmoticonStrategy};
pub use replace::{
    Match, MatcherPipeline, ReplaceError, ReplacementEvent, ReplacementStrategy, Replacer,
    Separator, TextMatcher,
};
pub use transform::{NodeTransform, run_transforms};
pub use tree::{Document, NodeId, TreeError};
