use std::collections::BTreeMap;
use std::fmt;

/// Extra data attached to a replacement node (e.g. the target URL of a link).
pub type Payload = BTreeMap<String, String>;

/// Stable handle to a node in a [`Document`](super::Document) arena.
///
/// Ids are never reused after a node is removed, so a stale handle is
/// detected by [`Document::contains`](super::Document::contains) instead of
/// silently pointing at another node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Get the raw arena index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Text format bitmask (bold, italic, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Format(pub u32);

impl Format {
    pub const NONE: Format = Format(0);
    pub const BOLD: Format = Format(1);
    pub const ITALIC: Format = Format(1 << 1);
    pub const STRIKETHROUGH: Format = Format(1 << 2);
    pub const UNDERLINE: Format = Format(1 << 3);
    pub const CODE: Format = Format(1 << 4);
    pub const SUBSCRIPT: Format = Format(1 << 5);
    pub const SUPERSCRIPT: Format = Format(1 << 6);
    pub const HIGHLIGHT: Format = Format(1 << 7);

    const NAMES: [(Format, &'static str); 8] = [
        (Format::BOLD, "bold"),
        (Format::ITALIC, "italic"),
        (Format::STRIKETHROUGH, "strikethrough"),
        (Format::UNDERLINE, "underline"),
        (Format::CODE, "code"),
        (Format::SUBSCRIPT, "subscript"),
        (Format::SUPERSCRIPT, "superscript"),
        (Format::HIGHLIGHT, "highlight"),
    ];

    pub fn contains(self, other: Format) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for Format {
    type Output = Format;

    fn bitor(self, rhs: Format) -> Format {
        Format(self.0 | rhs.0)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Format::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "{}", names.join("|"))
    }
}

/// Text detail bitmask (directionless, unmergeable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Detail(pub u32);

impl Detail {
    pub const NONE: Detail = Detail(0);
    pub const DIRECTIONLESS: Detail = Detail(1);
    pub const UNMERGEABLE: Detail = Detail(1 << 1);

    pub fn contains(self, other: Detail) -> bool {
        self.0 & other.0 == other.0
    }
}

/// How a text node behaves under editing.
///
/// Only `Normal` text is *simple*: eligible for matching and merging.
/// `Token` and `Segmented` text already carry structural meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    #[default]
    Normal,
    Token,
    Segmented,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub text: String,
    pub format: Format,
    pub detail: Detail,
    pub mode: TextMode,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: Format::NONE,
            detail: Detail::NONE,
            mode: TextMode::Normal,
        }
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_detail(mut self, detail: Detail) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_mode(mut self, mode: TextMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn is_simple(&self) -> bool {
        self.mode == TextMode::Normal
    }

    /// Whether `self` and `other` can be normalized into one text node.
    pub fn can_merge_with(&self, other: &TextNode) -> bool {
        self.is_simple()
            && other.is_simple()
            && self.format == other.format
            && self.detail == other.detail
            && !self.detail.contains(Detail::UNMERGEABLE)
    }
}

/// Generic container, e.g. a paragraph or a manually created link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementNode {
    pub tag: String,
}

/// Container produced by a confirmed match, e.g. an auto-link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementNode {
    /// Type tag identifying which strategy owns the node (`"auto-link"`).
    pub kind: String,
    pub payload: Payload,
}

impl ReplacementNode {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Payload::new(),
        }
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.payload.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Element(ElementNode),
    Text(TextNode),
    LineBreak,
    Replacement(ReplacementNode),
}

impl NodeKind {
    /// Root, elements and replacements own children; text and line breaks are leaves.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Root | NodeKind::Element(_) | NodeKind::Replacement(_)
        )
    }
}

/// A node slot in the arena: its payload plus non-owning navigation links.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            parent: None,
            prev: None,
            next: None,
            first_child: None,
            last_child: None,
            kind,
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match &self.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match &self.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_replacement(&self) -> Option<&ReplacementNode> {
        match &self.kind {
            NodeKind::Replacement(replacement) => Some(replacement),
            _ => None,
        }
    }

    pub fn is_replacement_of(&self, kind: &str) -> bool {
        self.as_replacement().is_some_and(|r| r.kind == kind)
    }
}
