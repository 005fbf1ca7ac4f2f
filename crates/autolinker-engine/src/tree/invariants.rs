use super::{Document, NodeId};

/// Assert structural invariants of every node reachable from the root.
///
/// Intended for tests: panics with a descriptive message on the first
/// violation.
pub fn check(doc: &Document) {
    check_node(doc, doc.root(), &mut Vec::new());
}

fn check_node(doc: &Document, id: NodeId, path: &mut Vec<NodeId>) {
    assert!(
        !path.contains(&id),
        "cycle through node {id} (path: {path:?})"
    );
    let node = doc.node(id).unwrap_or_else(|| panic!("dangling link to {id}"));

    if let Some(text) = node.as_text() {
        assert!(!text.text.is_empty(), "attached text node {id} is empty");
    }
    if !node.kind().is_container() {
        assert!(
            doc.first_child(id).is_none(),
            "leaf node {id} has children"
        );
        return;
    }

    path.push(id);
    let mut prev = None;
    for child in doc.children(id) {
        assert_eq!(
            doc.parent(child),
            Some(id),
            "child {child} of {id} points at another parent"
        );
        assert_eq!(
            doc.prev_sibling(child),
            prev,
            "child {child} of {id} has a broken prev link"
        );
        check_node(doc, child, path);
        prev = Some(child);
    }
    assert_eq!(doc.last_child(id), prev, "last child link of {id} is stale");
    path.pop();
}
