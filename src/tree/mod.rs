//! Size-augmented 2-3 tree engine.
//!
//! - [`Tree`]: arena-backed leaf-oriented 2-3 tree with sentinels, subtree
//!   sizes and sister links at every depth
//! - [`Node`] / [`NodeId`]: arena vertex and its handle
//! - [`Pair`]: composite key used by the price index
//! - [`Span`]: result of a read-only range lookup

pub mod key;
pub mod node;
pub mod range;
pub mod twothree;
mod validate;

pub use key::{DomainBounds, Pair};
pub use node::{Node, NodeId, Sentinel};
pub use range::Span;
pub use twothree::{Iter, Tree};
