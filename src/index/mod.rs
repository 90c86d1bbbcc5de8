//! Stock index built on two trees.
//!
//! - [`IndexManager`]: keeps the identifier index and the price index in
//!   step across adds, removals and price events

mod manager;

pub use manager::{IndexManager, PriceKey};
