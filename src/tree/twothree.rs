//! Leaf-oriented 2-3 tree with subtree sizes and sister links.
//!
//! ## Architecture
//!
//! - **Slab arena**: every node lives in one `Slab<Node>`; links are
//!   [`NodeId`] handles, so parent and sister back-references never own
//!   anything.
//! - **Leaf-oriented**: payloads live only at leaves, all at the same depth.
//!   An internal node's key is the key of its rightmost child, i.e. the
//!   maximum of its subtree.
//! - **Sentinels**: a `Min` and a `Max` leaf bound the key space, so every
//!   real leaf has a neighbour on both sides and every descent has a child
//!   to go to.
//! - **Sizes**: each node counts the real leaves below it, giving O(log n)
//!   rank and select.
//!
//! ## Sister links
//!
//! Nodes at the same depth form a doubly linked chain (`sister` to the
//! right, `prev_sister` to the left). Splits, borrows and merges only move
//! children between parents; they never reorder nodes within a depth. The
//! chains therefore change only when a node is created or destroyed:
//!
//! - a new node is linked by [`Tree::set_sister`] on its left neighbour and
//!   on itself, once the structure is final;
//! - a destroyed node is unlinked from its chain.
//!
//! ## Example
//!
//! ```
//! use stockbook::tree::Tree;
//!
//! let mut tree: Tree<i64, &str> = Tree::new();
//! let b = tree.insert(20, "b");
//! let a = tree.insert(10, "a");
//! tree.insert(30, "c");
//!
//! assert_eq!(tree.len(), 3);
//! assert_eq!(tree.search(&20), Some(b));
//! assert_eq!(tree.rank(b), Some(2));
//! assert_eq!(tree.successor(a), Some(b));
//! assert_eq!(tree.delete(b), Ok("b"));
//! assert_eq!(tree.search(&20), None);
//! ```

use std::cmp::Ordering;
use std::iter::FusedIterator;

use slab::Slab;
use tracing::trace;

use crate::error::TreeError;
use crate::tree::key::DomainBounds;
use crate::tree::node::{Node, NodeId, Sentinel};

/// Size-augmented 2-3 tree over an arena of nodes.
#[derive(Debug, Clone)]
pub struct Tree<K, V> {
    /// Node storage; handles are slab keys
    nodes: Slab<Node<K, V>>,

    /// Current root; replaced when the tree grows or shrinks a level
    root: NodeId,

    /// Minimum sentinel leaf (leftmost, permanent)
    low: NodeId,

    /// Maximum sentinel leaf (rightmost, permanent)
    high: NodeId,
}

impl<K: Ord + Clone + DomainBounds, V> Default for Tree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone + DomainBounds, V> Tree<K, V> {
    /// Create an empty tree bounded by the key type's domain
    pub fn new() -> Self {
        Self::with_sentinels(K::domain_min(), K::domain_max())
    }
}

impl<K: Ord + Clone, V> Tree<K, V> {
    /// Create an empty tree with explicit sentinel keys.
    ///
    /// `min` and `max` only label the sentinel leaves; routing treats them
    /// as below and above every key regardless of their values.
    pub fn with_sentinels(min: K, max: K) -> Self {
        Self::with_capacity(0, min, max)
    }

    /// Create an empty tree with room for `capacity` leaves
    ///
    /// # Example
    ///
    /// ```
    /// use stockbook::tree::Tree;
    ///
    /// let tree: Tree<u64, ()> = Tree::with_capacity(1_000, u64::MIN, u64::MAX);
    /// assert!(tree.capacity() >= 1_000);
    /// assert!(tree.is_empty());
    /// ```
    pub fn with_capacity(capacity: usize, min: K, max: K) -> Self {
        // Leaves plus at most as many internal nodes, plus the skeleton
        let slots = capacity.saturating_mul(2).saturating_add(3);
        let mut nodes = Slab::with_capacity(slots);

        let low = NodeId(nodes.insert(Node::sentinel(min, Sentinel::Min)));
        let high = NodeId(nodes.insert(Node::sentinel(max.clone(), Sentinel::Max)));
        let root = NodeId(nodes.insert(Node::internal(max, Some(Sentinel::Max))));

        let mut tree = Self {
            nodes,
            root,
            low,
            high,
        };
        tree.set_children(root, vec![low, high]);
        tree.set_sister(low);
        tree
    }

    // ========================================================================
    // Capacity and Size
    // ========================================================================

    /// Number of real (non-sentinel) leaves
    #[inline]
    pub fn len(&self) -> usize {
        self.node(self.root).size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live nodes in the arena, sentinels and internal nodes included
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Pre-allocated arena slots
    #[inline]
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Number of edges between the root and any leaf
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let Some(&child) = self.node(current).children.first() {
            current = child;
            height += 1;
        }
        height
    }

    // ========================================================================
    // Node Access
    // ========================================================================

    #[inline]
    pub(super) fn node(&self, id: NodeId) -> &Node<K, V> {
        &self.nodes[id.0]
    }

    #[inline]
    pub(super) fn node_mut(&mut self, id: NodeId) -> &mut Node<K, V> {
        &mut self.nodes[id.0]
    }

    /// Get a node by handle, `None` if the handle is not live
    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node<K, V>> {
        self.nodes.get(id.0)
    }

    #[inline]
    pub fn key(&self, id: NodeId) -> Option<&K> {
        self.get(id).map(Node::key)
    }

    /// Payload of a real leaf
    #[inline]
    pub fn value(&self, id: NodeId) -> Option<&V> {
        self.get(id).and_then(Node::value)
    }

    /// Mutable payload of a real leaf.
    ///
    /// The key is not reachable through this handle, so ordering can't be
    /// broken by editing the value.
    #[inline]
    pub fn value_mut(&mut self, id: NodeId) -> Option<&mut V> {
        self.nodes.get_mut(id.0).and_then(|node| node.value.as_mut())
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn min_sentinel(&self) -> NodeId {
        self.low
    }

    #[inline]
    pub fn max_sentinel(&self) -> NodeId {
        self.high
    }

    // ========================================================================
    // Structural Bookkeeping
    // ========================================================================

    /// Replace the children of `id`, re-parent them, and recompute key and
    /// size for `id` and every ancestor up to the root.
    pub(crate) fn set_children(&mut self, id: NodeId, children: Vec<NodeId>) {
        for &child in &children {
            self.node_mut(child).parent = Some(id);
        }
        self.node_mut(id).children = children;

        let mut current = Some(id);
        while let Some(at) = current {
            self.refresh(at);
            current = self.node(at).parent;
        }
    }

    /// Recompute key, sentinel flag and size of one node from its children
    fn refresh(&mut self, id: NodeId) {
        let node = self.node(id);
        let Some(&last) = node.children.last() else {
            return;
        };
        let size = node.children.iter().map(|&child| self.node(child).size).sum();
        let rightmost = self.node(last);
        let key = rightmost.key.clone();
        let sentinel = rightmost.sentinel;

        let node = self.node_mut(id);
        node.size = size;
        node.key = key;
        node.sentinel = sentinel;
    }

    /// Allocate an internal node over a non-empty run of children
    fn alloc_internal(&mut self, children: Vec<NodeId>) -> NodeId {
        debug_assert!(!children.is_empty(), "internal node without children");
        let rightmost = self.node(children[children.len() - 1]);
        let node = Node::internal(rightmost.key.clone(), rightmost.sentinel);
        let id = NodeId(self.nodes.insert(node));
        self.set_children(id, children);
        id
    }

    /// The node to the right of `id` at the same depth, derived from the
    /// parent/child structure alone.
    ///
    /// Next sibling under the same parent if there is one; otherwise climb to
    /// the nearest ancestor with a next sibling, step across, and descend
    /// through first children back to the starting depth.
    pub fn derive_sister(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        let mut climbed = 0;
        let across = loop {
            let parent = self.get(current)?.parent?;
            let siblings = &self.node(parent).children;
            let at = siblings.iter().position(|&child| child == current)?;
            if let Some(&next) = siblings.get(at + 1) {
                break next;
            }
            current = parent;
            climbed += 1;
        };

        let mut node = across;
        for _ in 0..climbed {
            node = *self.node(node).children.first()?;
        }
        Some(node)
    }

    /// Recompute the sister of `id` from the structure and point the new
    /// sister's `prev_sister` back at `id`.
    pub(crate) fn set_sister(&mut self, id: NodeId) {
        let next = self.derive_sister(id);
        self.node_mut(id).sister = next;
        if let Some(next) = next {
            self.node_mut(next).prev_sister = Some(id);
        }
    }

    /// Remove `id` from its same-depth chain
    fn unlink(&mut self, id: NodeId) {
        let node = self.node(id);
        let (prev, next) = (node.prev_sister, node.sister);
        if let Some(prev) = prev {
            self.node_mut(prev).sister = next;
        }
        if let Some(next) = next {
            self.node_mut(next).prev_sister = prev;
        }
        let node = self.node_mut(id);
        node.sister = None;
        node.prev_sister = None;
    }

    // ========================================================================
    // Descent
    // ========================================================================

    /// First child of `id` accepted by `goes`, falling back to the last child
    pub(super) fn route<F>(&self, id: NodeId, goes: &F) -> Option<NodeId>
    where
        F: Fn(&Node<K, V>) -> bool,
    {
        let children = &self.node(id).children;
        children
            .iter()
            .copied()
            .find(|&child| goes(self.node(child)))
            .or_else(|| children.last().copied())
    }

    /// Descend from the root with `goes` and stop at the internal node whose
    /// children are leaves.
    pub(super) fn bottom_by<F>(&self, goes: &F) -> NodeId
    where
        F: Fn(&Node<K, V>) -> bool,
    {
        let mut current = self.root;
        while let Some(child) = self.route(current, goes) {
            if self.node(child).is_leaf() {
                break;
            }
            current = child;
        }
        current
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// Find the leaf holding `key`.
    ///
    /// At each level the descent takes the first child whose subtree maximum
    /// is >= `key`; with duplicate keys the leftmost match is returned.
    pub fn search(&self, key: &K) -> Option<NodeId> {
        let goes = |node: &Node<K, V>| node.cmp_key(key) != Ordering::Less;
        let bottom = self.bottom_by(&goes);
        let leaf = self.route(bottom, &goes)?;
        let node = self.node(leaf);
        (node.sentinel.is_none() && node.key == *key).then_some(leaf)
    }

    /// Check if a real leaf with `key` exists
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    // ========================================================================
    // Insert
    // ========================================================================

    /// Insert a new leaf and return its handle.
    ///
    /// Equal keys are allowed; a new leaf goes after every existing leaf with
    /// the same key.
    pub fn insert(&mut self, key: K, value: V) -> NodeId {
        let goes = |node: &Node<K, V>| node.cmp_key(&key) == Ordering::Greater;
        let bottom = self.bottom_by(&goes);

        let mut children = self.node(bottom).children.clone();
        let at = children
            .iter()
            .position(|&child| goes(self.node(child)))
            .unwrap_or(children.len());

        // Left neighbour at leaf depth, captured before the structure moves
        let left = match children.get(at) {
            Some(&right) => self.node(right).prev_sister,
            None => children.last().copied(),
        };

        let leaf = NodeId(self.nodes.insert(Node::leaf(key, value)));
        children.insert(at, leaf);
        self.place_children(bottom, children);

        if let Some(left) = left {
            self.set_sister(left);
        }
        self.set_sister(leaf);
        leaf
    }

    /// Give `node` its new children, splitting 4 into 2+2 and pushing the
    /// new right half into the parent until nothing overflows.
    fn place_children(&mut self, node: NodeId, children: Vec<NodeId>) {
        let mut node = node;
        let mut children = children;
        let mut created = Vec::new();

        loop {
            if children.len() <= 3 {
                self.set_children(node, children);
                break;
            }

            let upper = children.split_off(2);
            self.set_children(node, children);
            let sibling = self.alloc_internal(upper);
            trace!(node = %node, sibling = %sibling, "split overflowing node");
            created.push((node, sibling));

            let parent = self.node(node).parent;
            match parent {
                Some(parent) => {
                    let mut siblings = self.node(parent).children.clone();
                    let at = siblings
                        .iter()
                        .position(|&child| child == node)
                        .map_or(siblings.len(), |i| i + 1);
                    siblings.insert(at, sibling);
                    node = parent;
                    children = siblings;
                }
                None => {
                    let root = self.alloc_internal(vec![node, sibling]);
                    self.root = root;
                    trace!(root = %root, "tree grew a level");
                    break;
                }
            }
        }

        for (left, right) in created {
            self.set_sister(left);
            self.set_sister(right);
        }
    }

    // ========================================================================
    // Delete
    // ========================================================================

    /// Remove a real leaf and return its payload.
    ///
    /// The handle must have been issued by this tree. Unknown handles,
    /// internal nodes and sentinels are rejected without touching the tree.
    pub fn delete(&mut self, leaf: NodeId) -> Result<V, TreeError> {
        let node = self.get(leaf).ok_or(TreeError::UnknownNode(leaf))?;
        if !node.is_leaf() {
            return Err(TreeError::NotALeaf(leaf));
        }
        if node.is_sentinel() {
            return Err(TreeError::SentinelLeaf(leaf));
        }
        let parent = node.parent.ok_or(TreeError::UnknownNode(leaf))?;

        self.unlink(leaf);
        let mut children = self.node(parent).children.clone();
        children.retain(|&child| child != leaf);
        let removed = self.nodes.remove(leaf.0);
        self.set_children(parent, children);
        self.rebalance(parent);

        removed.value.ok_or(TreeError::SentinelLeaf(leaf))
    }

    /// Restore the 2-3 invariant upward from a node that may have lost a child
    fn rebalance(&mut self, node: NodeId) {
        let mut node = node;

        while self.node(node).children.len() < 2 {
            let parent = self.node(node).parent;
            let Some(parent) = parent else {
                self.collapse_root(node);
                return;
            };

            let siblings = self.node(parent).children.clone();
            let Some(at) = siblings.iter().position(|&child| child == node) else {
                return;
            };
            // Leftmost nodes lean on their right sibling, all others on the left
            let sibling_at = if at == 0 { 1 } else { at - 1 };
            let Some(&sibling) = siblings.get(sibling_at) else {
                return;
            };
            let from_left = sibling_at < at;

            let orphans = self.node(node).children.clone();
            let mut adopted = self.node(sibling).children.clone();

            if adopted.len() >= 3 {
                let mut kept = orphans;
                if from_left {
                    if let Some(lent) = adopted.pop() {
                        kept.insert(0, lent);
                    }
                } else {
                    kept.push(adopted.remove(0));
                }
                trace!(node = %node, sibling = %sibling, "borrowed child from sibling");
                self.set_children(sibling, adopted);
                self.set_children(node, kept);
                return;
            }

            let merged = if from_left {
                adopted.extend(orphans);
                adopted
            } else {
                let mut merged = orphans;
                merged.extend(adopted);
                merged
            };
            trace!(node = %node, sibling = %sibling, "merged underflowing node into sibling");
            self.set_children(sibling, merged);
            self.unlink(node);
            self.nodes.remove(node.0);

            let mut remaining = siblings;
            remaining.remove(at);
            self.set_children(parent, remaining);
            node = parent;
        }
    }

    /// Replace a root that is down to one child by that child
    fn collapse_root(&mut self, root: NodeId) {
        let Some(&only) = self.node(root).children.first() else {
            return;
        };
        self.node_mut(only).parent = None;
        self.nodes.remove(root.0);
        self.root = only;
        trace!(root = %only, "tree shrank a level");
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Smallest real leaf, `None` for an empty tree
    pub fn minimum(&self) -> Option<NodeId> {
        self.successor(self.low)
    }

    /// Largest real leaf, `None` for an empty tree
    pub fn maximum(&self) -> Option<NodeId> {
        self.predecessor(self.high)
    }

    /// The real leaf right after `leaf` in key order.
    ///
    /// Walks up while `leaf`'s branch is the rightmost child, steps to the
    /// next sibling subtree and descends its leftmost path. `None` when only
    /// the maximum sentinel follows.
    pub fn successor(&self, leaf: NodeId) -> Option<NodeId> {
        let next = self.derive_sister(leaf)?;
        (!self.node(next).is_sentinel()).then_some(next)
    }

    /// The real leaf right before `leaf`, following `prev_sister`
    pub fn predecessor(&self, leaf: NodeId) -> Option<NodeId> {
        let prev = self.get(leaf)?.prev_sister?;
        (!self.node(prev).is_sentinel()).then_some(prev)
    }

    // ========================================================================
    // Order Statistics
    // ========================================================================

    /// 1-based position of a real leaf among all real leaves.
    ///
    /// Walks to the root adding the sizes of every left sibling on the way.
    pub fn rank(&self, leaf: NodeId) -> Option<usize> {
        let node = self.get(leaf)?;
        if !node.is_leaf() || node.is_sentinel() {
            return None;
        }

        let mut rank = 1;
        let mut current = leaf;
        while let Some(parent) = self.node(current).parent {
            rank += self
                .node(parent)
                .children
                .iter()
                .take_while(|&&child| child != current)
                .map(|&child| self.node(child).size)
                .sum::<usize>();
            current = parent;
        }
        Some(rank)
    }

    /// The real leaf with the given 1-based rank
    pub fn select(&self, rank: usize) -> Option<NodeId> {
        if rank == 0 || rank > self.len() {
            return None;
        }

        let mut remaining = rank;
        let mut current = self.root;
        while !self.node(current).is_leaf() {
            let mut next = None;
            for &child in &self.node(current).children {
                let size = self.node(child).size;
                if remaining <= size {
                    next = Some(child);
                    break;
                }
                remaining -= size;
            }
            current = next?;
        }
        Some(current)
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Real leaves in ascending key order, following the leaf sister chain
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            tree: self,
            next: self.node(self.low).sister,
            remaining: self.len(),
        }
    }

    /// Real leaf handles in ascending key order
    pub fn handles(&self) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = self.minimum();
        std::iter::from_fn(move || {
            let current = next?;
            next = self
                .node(current)
                .sister
                .filter(|&id| !self.node(id).is_sentinel());
            Some(current)
        })
    }
}

/// Ascending iterator over `(key, value)` pairs of a [`Tree`]
#[derive(Debug, Clone)]
pub struct Iter<'a, K, V> {
    tree: &'a Tree<K, V>,
    next: Option<NodeId>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let node = self.tree.nodes.get(id.0)?;
        let value = node.value.as_ref()?;
        self.next = node.sister;
        self.remaining = self.remaining.saturating_sub(1);
        Some((&node.key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<'a, K: Ord + Clone, V> IntoIterator for &'a Tree<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
