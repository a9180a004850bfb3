//! Parent-to-children view over an [`EntityStore`](crate::EntityStore) sequence.
//!
//! The index owns no comments, only positions into the sequence it was built
//! from, and is rebuilt whenever that sequence changes. A reply whose parent
//! is missing from the sequence (an orphan) is still indexed under the
//! missing parent's id.

use std::collections::{HashMap, HashSet};

use crate::model::{Comment, CommentId};

/// Children of each parent key, in sequence order. `None` keys the roots.
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    children: HashMap<Option<CommentId>, Vec<usize>>,
    indexed_len: usize,
}

/// Group `sequence` by parent id, preserving sequence order within each group.
pub fn rebuild_index(sequence: &[Comment]) -> TreeIndex {
    let mut children: HashMap<Option<CommentId>, Vec<usize>> = HashMap::new();
    for (position, comment) in sequence.iter().enumerate() {
        children.entry(comment.parent_id).or_default().push(position);
    }
    TreeIndex {
        children,
        indexed_len: sequence.len(),
    }
}

impl TreeIndex {
    /// Direct replies to `parent`, or the roots when `parent` is `None`.
    /// Unknown ids yield an empty list.
    pub fn replies<'a>(&self, sequence: &'a [Comment], parent: Option<&CommentId>) -> Vec<&'a Comment> {
        debug_assert_eq!(self.indexed_len, sequence.len(), "index is stale");
        self.children
            .get(&parent.copied())
            .map(|positions| positions.iter().filter_map(|&p| sequence.get(p)).collect())
            .unwrap_or_default()
    }

    /// Number of comments anywhere below `root`.
    pub fn subtree_size(&self, sequence: &[Comment], root: &CommentId) -> usize {
        let mut seen = HashSet::new();
        let mut stack = vec![*root];
        let mut total = 0;
        while let Some(parent) = stack.pop() {
            if !seen.insert(parent) {
                continue;
            }
            for child in self.replies(sequence, Some(&parent)) {
                total += 1;
                stack.push(child.id);
            }
        }
        total
    }

    /// Parent ids that have replies but no comment of their own in the sequence.
    pub fn orphan_parents(&self, sequence: &[Comment]) -> Vec<CommentId> {
        let present: HashSet<CommentId> = sequence.iter().map(|c| c.id).collect();
        let mut orphans: Vec<CommentId> = self
            .children
            .keys()
            .filter_map(|key| *key)
            .filter(|id| !present.contains(id))
            .collect();
        orphans.sort();
        orphans
    }
}
