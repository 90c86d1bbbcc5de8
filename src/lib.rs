//! # Stockbook
//!
//! In-memory stock index on a size-augmented 2-3 tree.
//!
//! ## Architecture
//!
//! - **Tree**: leaf-oriented 2-3 tree in a slab arena, with sentinel leaves,
//!   subtree sizes (rank/select) and sister links at every depth
//! - **Types**: fixed-point prices, stock records with event history, and
//!   the SSZ-encoded index summary
//! - **Index**: manager keeping an identifier index and a price index in
//!   step
//!
//! ## Design Principles
//!
//! 1. **No floating point**: prices are `i64` scaled by 10^8, so keys are
//!    totally ordered and results are reproducible
//! 2. **Handles, not pointers**: nodes link to each other through
//!    [`tree::NodeId`] arena handles
//! 3. **Validate, then mutate**: a rejected index call changes nothing
//! 4. **Read-only queries**: range lookups take `&self`

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tree and the index
pub mod error;

/// Tree engine: nodes, keys, the 2-3 tree, range queries
pub mod tree;

/// Domain types: prices, records, summaries
pub mod types;

/// Index manager over the identifier and price trees
pub mod index;

// ============================================================================
// Re-exports for convenience
// ============================================================================

pub use error::{IndexError, TreeError};
pub use index::IndexManager;
pub use tree::{NodeId, Pair, Span, Tree};
pub use types::{IndexSummary, PriceEvent, StockRecord};
