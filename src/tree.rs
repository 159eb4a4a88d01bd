//! Reply forest and its breadth-first flattening.

use crate::models::CommentRecord;
use ahash::AHashSet;
use std::collections::VecDeque;

/// One node in a thread's reply forest.
#[derive(Debug, Clone, PartialEq)]
pub enum CommentNode {
    Comment {
        record: CommentRecord,
        replies: Vec<CommentNode>,
    },
    /// "Load more comments" stub; carries the ids it stands for.
    More { ids: Vec<String> },
}

impl CommentNode {
    pub fn leaf(record: CommentRecord) -> Self {
        CommentNode::Comment { record, replies: Vec::new() }
    }
}

/// Counters collected while walking the forest.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkStats {
    pub emitted: u64,
    pub duplicates: u64,
    pub more_skipped: u64,
}

/// Breadth-first walk over several forests.
///
/// The queue is seeded with every root of every forest, in order, so all
/// top-level comments come out before any reply. Each id is emitted once;
/// `More` stubs are counted and dropped.
pub struct BreadthFirst {
    queue: VecDeque<CommentNode>,
    seen: AHashSet<String>,
    stats: WalkStats,
}

impl BreadthFirst {
    pub fn new<I>(forests: I) -> Self
    where
        I: IntoIterator<Item = Vec<CommentNode>>,
    {
        let queue: VecDeque<CommentNode> = forests.into_iter().flatten().collect();
        Self { queue, seen: AHashSet::new(), stats: WalkStats::default() }
    }

    pub fn stats(&self) -> WalkStats {
        self.stats
    }
}

impl Iterator for BreadthFirst {
    type Item = CommentRecord;

    fn next(&mut self) -> Option<CommentRecord> {
        while let Some(node) = self.queue.pop_front() {
            match node {
                CommentNode::More { ids } => {
                    self.stats.more_skipped += ids.len().max(1) as u64;
                }
                CommentNode::Comment { record, replies } => {
                    if !self.seen.insert(record.id.clone()) {
                        self.stats.duplicates += 1;
                        continue;
                    }
                    self.queue.extend(replies);
                    self.stats.emitted += 1;
                    return Some(record);
                }
            }
        }
        None
    }
}
