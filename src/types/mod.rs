//! Domain types for the stock index.
//!
//! - [`StockRecord`]: a stock with its current price and event history
//! - [`PriceEvent`]: one recorded price change
//! - [`IndexSummary`]: SSZ-encodable record/event counts plus state root
//!
//! Prices are `i64` fixed-point values scaled by 10^8, see [`price`].

mod receipt;
mod record;
pub mod price;

pub use receipt::IndexSummary;
pub use record::{PriceEvent, StockRecord};
