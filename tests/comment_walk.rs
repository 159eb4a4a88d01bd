#[path = "common/mod.rs"]
mod common;

use common::*;
use rharvest::{BreadthFirst, CommentNode, WalkStats};

/// Breadth-first across threads: every top-level comment of every thread first,
/// then all second-level replies, and so on.
#[test]
fn walks_level_by_level_across_threads() {
    let a = vec![
        node(
            comment("a1", "ta", 0.0),
            vec![node(comment("a1r", "ta", 0.0), vec![CommentNode::leaf(comment("a1rr", "ta", 0.0))])],
        ),
        CommentNode::leaf(comment("a2", "ta", 0.0)),
    ];
    let b = vec![node(comment("b1", "tb", 0.0), vec![CommentNode::leaf(comment("b1r", "tb", 0.0))])];

    let ids: Vec<String> = BreadthFirst::new(vec![a, b]).map(|c| c.id).collect();
    assert_eq!(ids, vec!["a1", "a2", "b1", "a1r", "b1r", "a1rr"]);
}

/// Repeated ids are emitted once; the duplicate's subtree is not walked again.
/// "More" stubs count every id they stand for.
#[test]
fn dedups_and_counts_more_stubs() {
    let forest = vec![
        node(comment("x", "t", 0.0), vec![CommentNode::leaf(comment("y", "t", 0.0))]),
        node(comment("x", "t", 0.0), vec![CommentNode::leaf(comment("z", "t", 0.0))]),
        CommentNode::More { ids: vec!["m1".into(), "m2".into(), "m3".into()] },
        CommentNode::More { ids: vec![] },
    ];

    let mut walk = BreadthFirst::new(vec![forest]);
    let ids: Vec<String> = walk.by_ref().map(|c| c.id).collect();
    assert_eq!(ids, vec!["x", "y"]);
    assert_eq!(walk.stats(), WalkStats { emitted: 2, duplicates: 1, more_skipped: 4 });
}

#[test]
fn empty_forests_yield_nothing() {
    let mut walk = BreadthFirst::new(vec![Vec::new(), Vec::new()]);
    assert!(walk.next().is_none());
    assert_eq!(walk.stats(), WalkStats::default());
}
