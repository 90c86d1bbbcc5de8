//! Read-only range queries.
//!
//! A range is located with two descents that never touch the structure:
//!
//! 1. the first leaf whose key satisfies the lower bound predicate;
//! 2. the first leaf beyond the upper bound, stepped back once through
//!    `prev_sister`.
//!
//! Both predicates must be monotone in key order (false, then true). The
//! count comes from the ranks of the two boundary leaves; collecting the
//! leaves walks the leaf chain backward from the upper boundary.

use crate::tree::node::{Node, NodeId};
use crate::tree::twothree::Tree;

/// Boundary leaves and size of a non-empty range.
///
/// Handles go stale once the tree is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Smallest leaf in the range
    pub first: NodeId,
    /// Largest leaf in the range
    pub last: NodeId,
    /// Number of leaves from `first` to `last`, both included
    pub count: usize,
}

impl<K: Ord + Clone, V> Tree<K, V> {
    /// The leftmost leaf whose key satisfies a monotone predicate.
    ///
    /// Returns the maximum sentinel when no real leaf does.
    pub fn locate_first<F>(&self, pred: F) -> NodeId
    where
        F: Fn(&K) -> bool,
    {
        let goes = |node: &Node<K, V>| node.satisfies(&pred);
        let bottom = self.bottom_by(&goes);
        self.route(bottom, &goes).unwrap_or(self.max_sentinel())
    }

    /// Locate the leaves with `reaches_lo(key) && !beyond_hi(key)`.
    ///
    /// `reaches_lo` must flip from false to true at the lower bound and
    /// `beyond_hi` at the upper bound. `None` when no leaf qualifies.
    pub fn span_by<F, G>(&self, reaches_lo: F, beyond_hi: G) -> Option<Span>
    where
        F: Fn(&K) -> bool,
        G: Fn(&K) -> bool,
    {
        let first = self.locate_first(reaches_lo);
        if self.node(first).is_sentinel() {
            return None;
        }

        let after = self.locate_first(beyond_hi);
        let last = self.node(after).prev_sister()?;
        if self.node(last).is_sentinel() {
            return None;
        }

        let lo_rank = self.rank(first)?;
        let hi_rank = self.rank(last)?;
        (hi_rank >= lo_rank).then(|| Span {
            first,
            last,
            count: hi_rank - lo_rank + 1,
        })
    }

    /// Locate the leaves with `lo <= key <= hi`
    ///
    /// # Example
    ///
    /// ```
    /// use stockbook::tree::Tree;
    ///
    /// let mut tree: Tree<i64, ()> = Tree::new();
    /// for key in [10, 20, 30, 40] {
    ///     tree.insert(key, ());
    /// }
    ///
    /// let span = tree.span(&15, &35).unwrap();
    /// assert_eq!(span.count, 2);
    /// assert_eq!(tree.key(span.first), Some(&20));
    /// assert_eq!(tree.key(span.last), Some(&30));
    ///
    /// assert!(tree.span(&41, &50).is_none());
    /// assert!(tree.span(&30, &20).is_none());
    /// ```
    pub fn span(&self, lo: &K, hi: &K) -> Option<Span> {
        self.span_by(|key| key >= lo, |key| key > hi)
    }

    /// Number of leaves with `lo <= key <= hi`; zero for an inverted range
    pub fn count_range(&self, lo: &K, hi: &K) -> usize {
        self.span(lo, hi).map_or(0, |span| span.count)
    }

    /// Number of leaves between two monotone predicates, see [`Tree::span_by`]
    pub fn count_range_by<F, G>(&self, reaches_lo: F, beyond_hi: G) -> usize
    where
        F: Fn(&K) -> bool,
        G: Fn(&K) -> bool,
    {
        self.span_by(reaches_lo, beyond_hi).map_or(0, |span| span.count)
    }

    /// Leaves of a span in ascending key order.
    ///
    /// Walks `prev_sister` from `span.last` for `span.count` leaves.
    pub fn collect_span(&self, span: &Span) -> Vec<NodeId> {
        let mut leaves = Vec::with_capacity(span.count);
        let mut current = Some(span.last);

        while let Some(id) = current {
            if leaves.len() == span.count {
                break;
            }
            let Some(node) = self.get(id) else {
                break;
            };
            if node.is_sentinel() {
                break;
            }
            leaves.push(id);
            current = node.prev_sister();
        }

        leaves.reverse();
        leaves
    }

    /// Leaves with `lo <= key <= hi` in ascending key order
    pub fn range(&self, lo: &K, hi: &K) -> Vec<NodeId> {
        self.span(lo, hi)
            .map(|span| self.collect_span(&span))
            .unwrap_or_default()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
