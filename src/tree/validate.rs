//! Structural invariant checker.
//!
//! Walks the tree level by level from the root and collects every violation
//! it finds instead of stopping at the first one. Only used by tests and by
//! callers that want to audit a tree after a batch of mutations.

use crate::error::TreeError;
use crate::tree::node::{NodeId, Sentinel};
use crate::tree::twothree::Tree;

impl<K: Ord + Clone, V> Tree<K, V> {
    /// Verify every structural invariant of the tree.
    ///
    /// Checked:
    ///
    /// - internal nodes have 2 or 3 children and their children point back
    /// - an internal node mirrors the key and sentinel flag of its last child
    /// - sizes equal the number of real leaves below
    /// - all leaves sit at the same depth
    /// - at every depth `sister`/`prev_sister` form the left-to-right order,
    ///   and agree with the sister derived from the structure
    /// - the sentinels are the two outermost leaves and the only ones
    /// - leaf keys are non-decreasing
    /// - no arena slot is unreachable from the root
    pub fn check_invariants(&self) -> Result<(), TreeError> {
        let mut errors: Vec<String> = Vec::new();

        let Some(root) = self.get(self.root()) else {
            return Err(TreeError::Invariant(format!(
                "root {} is not live",
                self.root()
            )));
        };
        if root.parent().is_some() {
            errors.push(format!("root {} has a parent", self.root()));
        }

        let mut level = vec![self.root()];
        let mut reachable = 0;
        let mut depth = 0;
        let leaves = loop {
            reachable += level.len();
            self.check_level(&level, depth, &mut errors);

            let leaf_count = level.iter().filter(|&&id| self.node(id).is_leaf()).count();
            if leaf_count == level.len() {
                break level;
            }
            if leaf_count != 0 {
                errors.push(format!("depth {depth} mixes leaves and internal nodes"));
                break Vec::new();
            }
            if depth > self.node_count() {
                errors.push("tree deeper than its node count".to_string());
                break Vec::new();
            }

            let mut next = Vec::with_capacity(level.len() * 3);
            for &id in &level {
                self.check_children(id, &mut next, &mut errors);
            }
            level = next;
            depth += 1;
        };

        self.check_leaves(&leaves, &mut errors);

        if reachable != self.node_count() {
            errors.push(format!(
                "arena holds {} nodes but {} are reachable",
                self.node_count(),
                reachable
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(TreeError::Invariant(errors.join("; ")))
        }
    }

    /// Sister chain of one depth against its left-to-right order
    fn check_level(&self, level: &[NodeId], depth: usize, errors: &mut Vec<String>) {
        for (i, &id) in level.iter().enumerate() {
            let node = self.node(id);
            let next = level.get(i + 1).copied();
            let prev = i.checked_sub(1).map(|j| level[j]);

            if node.sister() != next {
                errors.push(format!(
                    "depth {depth}: sister of {id} is {:?}, expected {:?}",
                    node.sister(),
                    next
                ));
            }
            if node.prev_sister() != prev {
                errors.push(format!(
                    "depth {depth}: prev_sister of {id} is {:?}, expected {:?}",
                    node.prev_sister(),
                    prev
                ));
            }
            if self.derive_sister(id) != next {
                errors.push(format!("depth {depth}: derived sister of {id} disagrees"));
            }
        }
    }

    /// Degree, back links, key mirror and size of one internal node
    fn check_children(&self, id: NodeId, next: &mut Vec<NodeId>, errors: &mut Vec<String>) {
        let node = self.node(id);
        let degree = node.children().len();
        if !(2..=3).contains(&degree) {
            errors.push(format!("node {id} has {degree} children"));
        }

        let mut size = 0;
        for &child in node.children() {
            let Some(child_node) = self.get(child) else {
                errors.push(format!("node {id} has dead child {child}"));
                continue;
            };
            if child_node.parent() != Some(id) {
                errors.push(format!("child {child} does not point back to {id}"));
            }
            size += child_node.size();
            next.push(child);
        }
        if node.size() != size {
            errors.push(format!("node {id} has size {} but its children hold {size}", node.size()));
        }

        if let Some(last) = node.children().last().and_then(|&c| self.get(c)) {
            if last.key() != node.key() || last.sentinel_kind() != node.sentinel_kind() {
                errors.push(format!("node {id} does not mirror its rightmost child"));
            }
        }
    }

    /// Sentinel placement, leaf sizes and key order
    fn check_leaves(&self, leaves: &[NodeId], errors: &mut Vec<String>) {
        if leaves.first() != Some(&self.min_sentinel()) {
            errors.push("leftmost leaf is not the minimum sentinel".to_string());
        }
        if leaves.last() != Some(&self.max_sentinel()) {
            errors.push("rightmost leaf is not the maximum sentinel".to_string());
        }

        let inner = leaves.len().saturating_sub(2);
        for &id in leaves.iter().skip(1).take(inner) {
            let node = self.node(id);
            if node.sentinel_kind().is_some() {
                errors.push(format!("sentinel {id} inside the leaf level"));
            }
            if node.size() != 1 || node.value().is_none() {
                errors.push(format!("leaf {id} is missing its weight or payload"));
            }
        }
        for (id, kind) in [(self.min_sentinel(), Sentinel::Min), (self.max_sentinel(), Sentinel::Max)] {
            if self.get(id).and_then(|node| node.sentinel_kind()) != Some(kind) {
                errors.push(format!("sentinel {id} lost its {kind:?} flag"));
            }
        }

        for pair in leaves.windows(2) {
            if self.node(pair[0]) > self.node(pair[1]) {
                errors.push(format!("leaves {} and {} are out of order", pair[0], pair[1]));
            }
        }

        if self.len() != inner {
            errors.push(format!("root size {} but {inner} real leaves", self.len()));
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
