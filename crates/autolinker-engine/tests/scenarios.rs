use std::cell::Cell;
use std::rc::Rc;

use autolinker_engine::autolink::{AUTO_LINK, AutoLinkStrategy, LinkMatcher, URL};
use autolinker_engine::replace::{
    Match, MatcherPipeline, ReplaceError, ReplacementEvent, ReplacementStrategy, Replacer,
    Separator,
};
use autolinker_engine::transform::run_transforms;
use autolinker_engine::tree::{
    Document, Format, Node, NodeId, ReplacementNode, TextMode, TextNode, TreeError, invariants,
};
use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use regex::Regex;
use rstest::rstest;

fn paragraph(doc: &mut Document, texts: Vec<TextNode>) -> (NodeId, Vec<NodeId>) {
    let p = doc.create_element("paragraph");
    doc.append(doc.root(), p).unwrap();
    let ids = texts
        .into_iter()
        .map(|t| {
            let id = doc.create_text_node(t);
            doc.append(p, id).unwrap();
            id
        })
        .collect();
    (p, ids)
}

fn linker(pattern: &str) -> Replacer<AutoLinkStrategy> {
    Replacer::new(
        AutoLinkStrategy,
        MatcherPipeline::new().with(LinkMatcher::new(Regex::new(pattern).unwrap())),
    )
}

fn literal(needle: &'static str) -> impl Fn(&str, Option<&Node>) -> Option<Match> {
    move |text: &str, _: Option<&Node>| text.find(needle).map(|i| Match::new(i, needle))
}

fn created(events: &[ReplacementEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, ReplacementEvent::Created { .. }))
        .count()
}

/// "Visit https://x.com now" linked with a plain `https?://\S+` matcher
fn scenario_a() -> (Document, NodeId, Replacer<AutoLinkStrategy>) {
    let mut doc = Document::new();
    let (p, ids) = paragraph(&mut doc, vec![TextNode::new("Visit https://x.com now")]);
    let replacer = linker(r"https?://\S+");
    replacer.on_node_changed(&mut doc, ids[0]).unwrap();
    (doc, p, replacer)
}

// ============ Creation ============

#[test]
fn creation_wraps_the_match() {
    let (doc, p, _) = scenario_a();

    invariants::check(&doc);
    assert_eq!(doc.children(p).count(), 3);
    assert_snapshot!(doc.dump(), @r#"
    root
      paragraph
        text "Visit "
        auto-link url="https://x.com"
          text "https://x.com"
        text " now"
    "#);
}

#[test]
fn creation_across_nodes_uses_first_node_format() {
    // Only the first covered node's format survives on the link text
    let mut doc = Document::new();
    let (_, ids) = paragraph(
        &mut doc,
        vec![
            TextNode::new("Visit "),
            TextNode::new("https://x.").with_format(Format::BOLD),
            TextNode::new("com now"),
        ],
    );

    let events = linker(r"https?://\S+")
        .on_node_changed(&mut doc, ids[0])
        .unwrap();

    assert_eq!(created(&events), 1);
    invariants::check(&doc);
    assert_snapshot!(doc.dump(), @r#"
    root
      paragraph
        text "Visit "
        auto-link url="https://x.com"
          text "https://x.com" [bold]
        text " now"
    "#);
}

#[test]
fn creation_handles_multibyte_text() {
    let mut doc = Document::new();
    let (p, ids) = paragraph(&mut doc, vec![TextNode::new("café https://ü.com naïve")]);

    linker(r"https?://\S+")
        .on_node_changed(&mut doc, ids[0])
        .unwrap();

    invariants::check(&doc);
    assert_eq!(doc.text_content(p), "café https://ü.com naïve");
    let link = doc.next_sibling(ids[0]).unwrap();
    assert_eq!(doc.replacement(link).unwrap().get(URL), Some("https://ü.com"));
}

#[rstest]
#[case("xfoo ", 0)]
#[case("!foo ", 0)]
#[case(",foo ", 1)]
#[case(" foo.", 1)]
#[case("foo!", 0)]
#[case("foo", 1)]
#[case("foox foo", 1)]
#[case("foo;foo,foo", 3)]
fn matches_need_separators_around_them(#[case] text: &str, #[case] expected: usize) {
    let mut doc = Document::new();
    let (p, ids) = paragraph(&mut doc, vec![TextNode::new(text)]);
    let replacer = Replacer::new(AutoLinkStrategy, MatcherPipeline::new().with(literal("foo")));

    let events = replacer.on_node_changed(&mut doc, ids[0]).unwrap();

    assert_eq!(created(&events), expected);
    assert_eq!(doc.text_content(p), text);
    invariants::check(&doc);
}

#[test]
fn custom_separator_class() {
    let mut doc = Document::new();
    let (_, ids) = paragraph(&mut doc, vec![TextNode::new("!foo! ,foo")]);
    let replacer = Replacer::new(AutoLinkStrategy, MatcherPipeline::new().with(literal("foo")))
        .with_separator(Separator::new(r"[\s!]").unwrap());

    let events = replacer.on_node_changed(&mut doc, ids[0]).unwrap();

    assert_eq!(created(&events), 1);
}

#[test]
fn previous_sibling_decides_leading_boundary() {
    let replacer = Replacer::new(AutoLinkStrategy, MatcherPipeline::new().with(literal("foo")));

    // Line break before the run
    let mut doc = Document::new();
    let (p, ids) = paragraph(&mut doc, vec![TextNode::new("foo")]);
    let br = doc.create_line_break();
    doc.prepend(p, br).unwrap();
    assert_eq!(created(&replacer.on_node_changed(&mut doc, ids[0]).unwrap()), 1);

    // Container whose last text does not end with a separator
    let mut doc = Document::new();
    let (p, ids) = paragraph(&mut doc, vec![TextNode::new("foo")]);
    let span = doc.create_element("span");
    doc.prepend(p, span).unwrap();
    let inner = doc.create_text("x");
    doc.append(span, inner).unwrap();
    assert_eq!(created(&replacer.on_node_changed(&mut doc, ids[0]).unwrap()), 0);

    // Same container ending in a space
    doc.set_text(inner, "x ").unwrap();
    assert_eq!(created(&replacer.on_node_changed(&mut doc, ids[0]).unwrap()), 1);
}

#[test]
fn complex_text_is_never_scanned() {
    let mut doc = Document::new();
    let (p, ids) = paragraph(
        &mut doc,
        vec![TextNode::new("https://x.com").with_mode(TextMode::Token)],
    );

    let events = linker(r"https?://\S+")
        .on_node_changed(&mut doc, ids[0])
        .unwrap();

    assert!(events.is_empty());
    assert_eq!(doc.first_child(p), Some(ids[0]));
}

#[test]
fn empty_text_is_removed() {
    let mut doc = Document::new();
    let (p, ids) = paragraph(&mut doc, vec![TextNode::new("a "), TextNode::new("")]);

    linker(r"https?://\S+")
        .on_node_changed(&mut doc, ids[1])
        .unwrap();

    assert!(!doc.contains(ids[1]));
    assert_eq!(doc.children(p).collect::<Vec<_>>(), vec![ids[0]]);
    invariants::check(&doc);
}

#[test]
fn removed_nodes_are_ignored() {
    let (mut doc, p, replacer) = scenario_a();
    let stale = doc.create_text("https://y.org");
    doc.append(p, stale).unwrap();
    doc.remove(stale).unwrap();
    let before = doc.dump();

    let events = replacer.on_node_changed(&mut doc, stale).unwrap();

    assert!(events.is_empty());
    assert_eq!(doc.dump(), before);
}

// ============ Stability ============

#[test]
fn second_pass_changes_nothing() {
    let (mut doc, p, replacer) = scenario_a();
    let before = doc.dump();
    let link = doc.children(p).nth(1).unwrap();
    let mut nodes: Vec<NodeId> = doc.children(p).collect();
    nodes.extend(doc.children(link));

    for node in nodes {
        let events = replacer.on_node_changed(&mut doc, node).unwrap();
        assert!(events.is_empty(), "{node} produced {events:?}");
    }

    assert_eq!(doc.dump(), before);
}

#[test]
fn fresh_replacement_validates() {
    let (mut doc, p, replacer) = scenario_a();
    let link = doc.children(p).nth(1).unwrap();

    let events = replacer.validate(&mut doc, link).unwrap();

    assert!(events.is_empty());
    assert!(doc.contains(link));
    assert_eq!(doc.parent(link), Some(p));
}

#[test]
fn text_content_survives_every_mode() {
    let (mut doc, p, replacer) = scenario_a();
    assert_eq!(doc.text_content(p), "Visit https://x.com now");

    let link = doc.children(p).nth(1).unwrap();
    replacer.revert(&mut doc, link).unwrap();

    assert_eq!(doc.text_content(p), "Visit https://x.com now");
}

#[test]
fn revert_restores_the_original_tree() {
    let mut original = Document::new();
    paragraph(&mut original, vec![TextNode::new("Visit https://x.com now")]);
    let (mut doc, p, replacer) = scenario_a();
    let link = doc.children(p).nth(1).unwrap();

    let events = replacer.revert(&mut doc, link).unwrap();

    assert_eq!(
        events,
        vec![ReplacementEvent::Reverted {
            node: link,
            text: "https://x.com".to_string(),
            payload: [(URL.to_string(), "https://x.com".to_string())].into(),
        }]
    );
    assert!(!doc.contains(link));
    assert_eq!(doc.dump(), original.dump());
    assert_eq!(doc.children(p).count(), 1);
    invariants::check(&doc);
}

#[test]
fn revert_keeps_the_source_format() {
    let bold = || vec![TextNode::new("Visit https://x.com now").with_format(Format::BOLD)];
    let mut original = Document::new();
    paragraph(&mut original, bold());
    let mut doc = Document::new();
    let (p, ids) = paragraph(&mut doc, bold());
    let replacer = linker(r"https?://\S+");
    replacer.on_node_changed(&mut doc, ids[0]).unwrap();
    let link = doc.children(p).nth(1).unwrap();

    replacer.revert(&mut doc, link).unwrap();

    invariants::check(&doc);
    assert_eq!(doc.dump(), original.dump());
    assert_snapshot!(doc.dump(), @r#"
    root
      paragraph
        text "Visit https://x.com now" [bold]
    "#);
}

#[test]
fn scanning_is_bounded_by_text_length() {
    let calls = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&calls);
    let counting = move |text: &str, _: Option<&Node>| {
        counter.set(counter.get() + 1);
        text.find("foo").map(|i| Match::new(i, "foo"))
    };
    let text = "xfoo ".repeat(50);
    let mut doc = Document::new();
    let (_, ids) = paragraph(&mut doc, vec![TextNode::new(text.clone())]);

    let events = Replacer::new(AutoLinkStrategy, MatcherPipeline::new().with(counting))
        .on_node_changed(&mut doc, ids[0])
        .unwrap();

    assert!(events.is_empty());
    assert!(calls.get() <= text.len() + 1);
}

#[rstest]
#[case::empty(0, 0, "")]
#[case::past_the_end(5, 10, "xx")]
#[case::inside_a_char(1, 1, "é")]
#[case::wrong_text(0, 3, "abc")]
fn degenerate_matcher_results_change_nothing(
    #[case] index: usize,
    #[case] length: usize,
    #[case] text: &'static str,
) {
    let bogus = move |_: &str, _: Option<&Node>| {
        let mut m = Match::new(index, text);
        m.length = length;
        Some(m)
    };
    let mut doc = Document::new();
    let (p, ids) = paragraph(&mut doc, vec![TextNode::new("héllo")]);

    let events = Replacer::new(AutoLinkStrategy, MatcherPipeline::new().with(bogus))
        .on_node_changed(&mut doc, ids[0])
        .unwrap();

    assert!(events.is_empty());
    assert_eq!(doc.children(p).collect::<Vec<_>>(), ids);
}

// ============ Edit mode ============

#[test]
fn edit_invalidation_reverts_to_plain_text() {
    let (mut doc, p, replacer) = scenario_a();
    let link = doc.children(p).nth(1).unwrap();
    let inner = doc.first_child(link).unwrap();

    doc.set_text(inner, "https://x.com/extra junk").unwrap();
    let events = replacer.on_node_changed(&mut doc, inner).unwrap();

    assert!(matches!(
        events.as_slice(),
        [ReplacementEvent::Reverted { text, .. }] if text == "https://x.com/extra junk"
    ));
    invariants::check(&doc);
    assert_snapshot!(doc.dump(), @r#"
    root
      paragraph
        text "Visit https://x.com/extra junk now"
    "#);
}

#[test]
fn emptied_link_leaves_no_empty_text() {
    let mut doc = Document::new();
    let (p, ids) = paragraph(&mut doc, vec![TextNode::new("https://x.com")]);
    let replacer = linker(r"https?://\S+");
    replacer.on_node_changed(&mut doc, ids[0]).unwrap();
    let link = doc.first_child(p).unwrap();
    let inner = doc.first_child(link).unwrap();

    doc.set_text(inner, "").unwrap();
    let events = replacer.on_node_changed(&mut doc, inner).unwrap();

    assert!(matches!(
        events.as_slice(),
        [ReplacementEvent::Reverted { text, .. }] if text.is_empty()
    ));
    assert!(!doc.contains(inner));
    assert_eq!(doc.children(p).count(), 0);
    invariants::check(&doc);
}

#[test]
fn edit_invalidation_then_host_redispatch_relinks() {
    let (mut doc, p, replacer) = scenario_a();
    let link = doc.children(p).nth(1).unwrap();
    let inner = doc.first_child(link).unwrap();
    doc.take_dirty();

    doc.set_text(inner, "https://x.com/extra junk").unwrap();
    run_transforms(&mut doc, &[&replacer]).unwrap();

    invariants::check(&doc);
    assert_snapshot!(doc.dump(), @r#"
    root
      paragraph
        text "Visit "
        auto-link url="https://x.com/extra"
          text "https://x.com/extra"
        text " junk now"
    "#);
}

#[test]
fn complex_child_reverts_the_replacement() {
    let (mut doc, p, replacer) = scenario_a();
    let link = doc.children(p).nth(1).unwrap();
    let token = doc.create_text_node(TextNode::new(":)").with_mode(TextMode::Token));
    doc.append(link, token).unwrap();

    let events = replacer.validate(&mut doc, link).unwrap();

    assert!(matches!(events.as_slice(), [ReplacementEvent::Reverted { .. }]));
    assert_eq!(doc.parent(token), Some(p));
    invariants::check(&doc);
}

#[test]
fn validate_rejects_foreign_nodes() {
    let (mut doc, p, replacer) = scenario_a();
    let plain = doc.first_child(p).unwrap();

    let result = replacer.validate(&mut doc, plain);

    assert!(matches!(
        result,
        Err(ReplaceError::WrongReplacementKind { node, .. }) if node == plain
    ));
}

// ============ Neighbor repair ============

/// Paragraph holding an auto-link for `url` followed by `tail`
fn link_then_text(url: &str, tail: &str) -> (Document, NodeId, NodeId) {
    let mut doc = Document::new();
    let p = doc.create_element("paragraph");
    doc.append(doc.root(), p).unwrap();
    let link = doc.create_replacement(
        ReplacementNode::new(AUTO_LINK).with_payload([(URL.to_string(), url.to_string())].into()),
    );
    doc.append(p, link).unwrap();
    let inner = doc.create_text(url);
    doc.append(link, inner).unwrap();
    let tail = doc.create_text(tail);
    doc.append(p, tail).unwrap();
    (doc, p, tail)
}

#[test]
fn glued_suffix_is_merged_then_reverted() {
    let (mut doc, _, tail) = link_then_text("https://x.com", "z");

    let events = linker(r"https?://\w+\.(?:com|org)\b")
        .on_node_changed(&mut doc, tail)
        .unwrap();

    assert!(matches!(
        events.as_slice(),
        [ReplacementEvent::Reverted { text, .. }] if text == "https://x.comz"
    ));
    invariants::check(&doc);
    assert_snapshot!(doc.dump(), @r#"
    root
      paragraph
        text "https://x.comz"
    "#);
}

#[test]
fn glued_suffix_that_still_matches_extends_the_link() {
    let (mut doc, p, tail) = link_then_text("https://x.com", "/docs");

    let events = linker(r"https?://\S+")
        .on_node_changed(&mut doc, tail)
        .unwrap();

    assert!(matches!(events.as_slice(), [ReplacementEvent::Refreshed { .. }]));
    let link = doc.first_child(p).unwrap();
    assert_eq!(doc.text_content(link), "https://x.com/docs");
    assert_eq!(doc.replacement(link).unwrap().get(URL), Some("https://x.com/docs"));
    invariants::check(&doc);
}

#[test]
fn separated_suffix_leaves_the_link_alone() {
    let (mut doc, p, tail) = link_then_text("https://x.com", " and more");

    let events = linker(r"https?://\S+")
        .on_node_changed(&mut doc, tail)
        .unwrap();

    assert!(events.is_empty());
    assert_eq!(doc.children(p).count(), 2);
}

#[test]
fn glued_prefix_reverts_the_following_link() {
    let mut doc = Document::new();
    let (p, ids) = paragraph(&mut doc, vec![TextNode::new("ab")]);
    let link = doc.create_replacement(ReplacementNode::new(AUTO_LINK));
    doc.append(p, link).unwrap();
    let inner = doc.create_text("https://x.com");
    doc.append(link, inner).unwrap();

    let events = linker(r"https?://\S+")
        .on_node_changed(&mut doc, ids[0])
        .unwrap();

    assert!(matches!(events.as_slice(), [ReplacementEvent::Reverted { .. }]));
    invariants::check(&doc);
    assert_snapshot!(doc.dump(), @r#"
    root
      paragraph
        text "abhttps://x.com"
    "#);
}

// ============ Strategy contract ============

struct Liar;

impl ReplacementStrategy for Liar {
    fn kind(&self) -> &str {
        "liar"
    }

    fn create(&self, doc: &mut Document, _: &[NodeId], _: &Match) -> Result<NodeId, TreeError> {
        let node = doc.create_replacement(ReplacementNode::new("liar"));
        let text = doc.create_text("nope");
        doc.append(node, text)?;
        Ok(node)
    }
}

struct Impostor;

impl ReplacementStrategy for Impostor {
    fn kind(&self) -> &str {
        "impostor"
    }

    fn create(&self, doc: &mut Document, _: &[NodeId], _: &Match) -> Result<NodeId, TreeError> {
        Ok(doc.create_element("span"))
    }
}

#[test]
fn replacement_text_must_reproduce_the_match() {
    let mut doc = Document::new();
    let (_, ids) = paragraph(&mut doc, vec![TextNode::new("a foo b")]);

    let result = Replacer::new(Liar, MatcherPipeline::new().with(literal("foo")))
        .on_node_changed(&mut doc, ids[0]);

    assert!(matches!(
        result,
        Err(ReplaceError::CallbackContractViolation { expected, actual, .. })
            if expected == "foo" && actual == "nope"
    ));
}

#[test]
fn replacement_must_be_of_the_strategy_kind() {
    let mut doc = Document::new();
    let (_, ids) = paragraph(&mut doc, vec![TextNode::new("foo")]);

    let result = Replacer::new(Impostor, MatcherPipeline::new().with(literal("foo")))
        .on_node_changed(&mut doc, ids[0]);

    assert!(matches!(
        result,
        Err(ReplaceError::WrongReplacementKind { expected, .. }) if expected == "impostor"
    ));
}
