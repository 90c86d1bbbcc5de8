//! Error types for the tree engine and the index manager.
//!
//! Two tiers:
//!
//! - [`TreeError`]: structural misuse of a [`Tree`](crate::tree::Tree)
//!   (stale handles, deleting sentinels) and invariant violations reported by
//!   the checker.
//! - [`IndexError`]: domain validation at the [`IndexManager`] boundary.
//!   Every variant is raised before either index is touched.
//!
//! [`IndexManager`]: crate::index::IndexManager

use thiserror::Error;

use crate::tree::NodeId;

/// Errors raised by the tree engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The handle does not name a live node of this tree
    #[error("node {0} is not live in this tree")]
    UnknownNode(NodeId),

    /// The operation needs a leaf but got an internal node
    #[error("node {0} is an internal node, not a leaf")]
    NotALeaf(NodeId),

    /// Sentinel leaves bound the key space and are never removed
    #[error("node {0} is a sentinel leaf and cannot be removed")]
    SentinelLeaf(NodeId),

    /// A structural invariant does not hold
    #[error("tree invariant violated: {0}")]
    Invariant(String),
}

/// Errors raised by the index manager.
///
/// All of these are invalid-argument failures; none leaves a partial
/// mutation behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("invalid timestamp {0}")]
    InvalidTimestamp(i64),

    #[error("invalid price {0}: prices must be positive")]
    InvalidPrice(i64),

    #[error("record {0:?} is already indexed")]
    DuplicateRecord(String),

    #[error("record {0:?} is not indexed")]
    UnknownRecord(String),

    #[error("price delta must be non-zero")]
    ZeroDelta,

    #[error("record {id:?} has no event at timestamp {timestamp}")]
    UnknownEvent { id: String, timestamp: i64 },

    #[error("event at timestamp {timestamp} is the bootstrap event of {id:?}")]
    BootstrapEvent { id: String, timestamp: i64 },

    #[error("inverted price range: high {hi} is below low {lo}")]
    InvertedRange { lo: i64, hi: i64 },

    #[error("price of {id:?} overflows when applying {delta}")]
    PriceOverflow { id: String, delta: i64 },

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Result alias for index manager operations
pub type Result<T> = std::result::Result<T, IndexError>;
