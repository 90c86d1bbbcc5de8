//! Tree node for slab-based storage.
//!
//! ## Design
//!
//! `Node` is one vertex of the 2-3 tree. All links are slab keys wrapped in
//! [`NodeId`], not references, so the parent/child/sister graph can be
//! cyclic without fighting ownership:
//!
//! - `children`: 2 or 3 handles at quiescent times (none for a leaf)
//! - `parent`: the unique owner (`None` at the root)
//! - `sister` / `prev_sister`: right and left neighbour at the same depth
//!
//! ## Sentinels
//!
//! Every tree carries two sentinel leaves bounding the key space. The
//! sentinel flag is set at construction and never inferred from the key.
//! Internal nodes mirror the key *and* the flag of their rightmost child, so
//! routing comparisons treat a subtree ending in the maximum sentinel as
//! greater than every real key.
//!
//! ```text
//!                 [root: key=MAX*]
//!            /                      \
//!     [key=20]  ------sister------>  [key=MAX*]
//!     /      \                      /     \
//!  [MIN*] -> [20] ------------> [35] -> [MAX*]
//! ```

use std::cmp::Ordering;
use std::fmt;

/// Handle of a node inside a tree's arena.
///
/// Handles are only meaningful for the tree that issued them; slots are
/// reused after a node is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The raw slab key
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which end of the key space a sentinel leaf bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    /// Leftmost leaf, below every real key
    Min,
    /// Rightmost leaf, above every real key
    Max,
}

/// Node stored in the tree arena.
#[derive(Debug, Clone)]
pub struct Node<K, V> {
    /// Leaf key, or the rightmost child's key for an internal node
    pub(crate) key: K,

    /// Set for the two sentinel leaves and mirrored upward with the key
    pub(crate) sentinel: Option<Sentinel>,

    /// Ordered child handles; empty for leaves
    pub(crate) children: Vec<NodeId>,

    pub(crate) parent: Option<NodeId>,

    /// Next node at the same depth, left to right
    pub(crate) sister: Option<NodeId>,

    /// Previous node at the same depth
    pub(crate) prev_sister: Option<NodeId>,

    /// Number of real (non-sentinel) leaves in this subtree
    pub(crate) size: usize,

    /// Payload; only real leaves carry one
    pub(crate) value: Option<V>,
}

impl<K, V> Node<K, V> {
    /// Create a real leaf (size 1, not yet linked)
    ///
    /// # Example
    ///
    /// ```
    /// use stockbook::tree::Node;
    ///
    /// let node: Node<i64, &str> = Node::leaf(7, "seven");
    ///
    /// assert!(node.is_leaf());
    /// assert_eq!(node.size(), 1);
    /// assert!(node.parent().is_none());
    /// assert!(node.sister().is_none());
    /// ```
    #[inline]
    pub fn leaf(key: K, value: V) -> Self {
        Self {
            key,
            sentinel: None,
            children: Vec::new(),
            parent: None,
            sister: None,
            prev_sister: None,
            size: 1,
            value: Some(value),
        }
    }

    /// Create a sentinel leaf (size 0, no payload)
    #[inline]
    pub(crate) fn sentinel(key: K, kind: Sentinel) -> Self {
        Self {
            key,
            sentinel: Some(kind),
            children: Vec::new(),
            parent: None,
            sister: None,
            prev_sister: None,
            size: 0,
            value: None,
        }
    }

    /// Create an internal node; its key is overwritten once children are set
    #[inline]
    pub(crate) fn internal(key: K, sentinel: Option<Sentinel>) -> Self {
        Self {
            key,
            sentinel,
            children: Vec::with_capacity(4),
            parent: None,
            sister: None,
            prev_sister: None,
            size: 0,
            value: None,
        }
    }

    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    #[inline]
    pub fn sentinel_kind(&self) -> Option<Sentinel> {
        self.sentinel
    }

    /// Check if this node is one of the two sentinel leaves
    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.is_leaf() && self.sentinel.is_some()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn sister(&self) -> Option<NodeId> {
        self.sister
    }

    #[inline]
    pub fn prev_sister(&self) -> Option<NodeId> {
        self.prev_sister
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

impl<K: Ord, V> Node<K, V> {
    /// Compare this node's (subtree maximum) key against a bare probe key.
    ///
    /// `Min` is below and `Max` above every probe.
    #[inline]
    pub fn cmp_key(&self, probe: &K) -> Ordering {
        match self.sentinel {
            Some(Sentinel::Min) => Ordering::Less,
            Some(Sentinel::Max) => Ordering::Greater,
            None => self.key.cmp(probe),
        }
    }

    /// Evaluate a predicate that is monotone in key order.
    ///
    /// `Min` never satisfies it and `Max` always does, which keeps the
    /// "first satisfying leaf" well defined for every predicate.
    #[inline]
    pub fn satisfies<F>(&self, pred: F) -> bool
    where
        F: Fn(&K) -> bool,
    {
        match self.sentinel {
            Some(Sentinel::Min) => false,
            Some(Sentinel::Max) => true,
            None => pred(&self.key),
        }
    }
}

impl<K: Ord, V> PartialEq for Node<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: Ord, V> Eq for Node<K, V> {}

impl<K: Ord, V> PartialOrd for Node<K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Total order by key, sentinels at the two ends.
impl<K: Ord, V> Ord for Node<K, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.sentinel, other.sentinel) {
            (Some(Sentinel::Min), Some(Sentinel::Min)) => Ordering::Equal,
            (Some(Sentinel::Max), Some(Sentinel::Max)) => Ordering::Equal,
            (Some(Sentinel::Min), _) | (_, Some(Sentinel::Max)) => Ordering::Less,
            (Some(Sentinel::Max), _) | (_, Some(Sentinel::Min)) => Ordering::Greater,
            (None, None) => self.key.cmp(&other.key),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
