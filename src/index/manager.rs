//! Index manager: two trees over one set of stock records.
//!
//! ## Indexes
//!
//! - `by_id`: identifier -> [`StockRecord`]
//! - `by_price`: `(price, identifier)` -> identifier
//!
//! Price is part of the price index key, so every price change is a
//! delete-then-reinsert on `by_price`. Both trees must always describe the
//! same set of records at the same prices.
//!
//! ## Validation
//!
//! Every mutation validates all of its arguments and looks up every handle
//! it needs before touching either tree. A rejected call leaves the manager
//! exactly as it was.
//!
//! ## Example
//!
//! ```
//! use stockbook::index::IndexManager;
//! use stockbook::types::price::to_fixed;
//!
//! let mut index = IndexManager::new();
//! index.add_record("A", 1, to_fixed("100").unwrap()).unwrap();
//! index.add_record("B", 2, to_fixed("50").unwrap()).unwrap();
//!
//! let lo = to_fixed("60").unwrap();
//! let hi = to_fixed("160").unwrap();
//! assert_eq!(index.count_in_price_range(lo, hi).unwrap(), 1);
//!
//! index.apply_price_delta("B", 5, to_fixed("20").unwrap()).unwrap();
//! assert_eq!(index.list_in_price_range(lo, hi).unwrap(), vec!["B", "A"]);
//! ```

use tracing::debug;

use crate::error::{IndexError, Result, TreeError};
use crate::tree::{DomainBounds, NodeId, Pair, Tree};
use crate::types::price;
use crate::types::{IndexSummary, PriceEvent, StockRecord};

/// Key of the price index: fixed-point price, then identifier
pub type PriceKey = Pair<i64, String>;

/// Log and return a rejected call
fn reject<T>(err: IndexError) -> Result<T> {
    debug!(error = %err, "rejected index call");
    Err(err)
}

/// Stock index over an identifier tree and a price tree.
#[derive(Debug, Clone)]
pub struct IndexManager {
    by_id: Tree<String, StockRecord>,
    by_price: Tree<PriceKey, String>,
}

impl Default for IndexManager {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexManager {
    /// Create an empty index
    pub fn new() -> Self {
        Self {
            by_id: Tree::new(),
            by_price: Tree::new(),
        }
    }

    /// Create an empty index with room for `capacity` records per tree
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            by_id: Tree::with_capacity(capacity, String::domain_min(), String::domain_max()),
            by_price: Tree::with_capacity(capacity, PriceKey::domain_min(), PriceKey::domain_max()),
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Index a new record listed at `timestamp` with an initial `price`.
    ///
    /// # Errors
    ///
    /// `InvalidTimestamp` if `timestamp <= 0`, `InvalidPrice` if
    /// `price <= 0`, `DuplicateRecord` if `id` is already indexed.
    pub fn add_record(&mut self, id: impl Into<String>, timestamp: i64, price: i64) -> Result<()> {
        let id = id.into();
        if timestamp <= 0 {
            return reject(IndexError::InvalidTimestamp(timestamp));
        }
        if price <= 0 {
            return reject(IndexError::InvalidPrice(price));
        }
        if self.by_id.contains_key(&id) {
            return reject(IndexError::DuplicateRecord(id));
        }

        self.by_price.insert(Pair::new(price, id.clone()), id.clone());
        self.by_id.insert(id.clone(), StockRecord::new(id.clone(), timestamp, price));

        debug!(id = %id, timestamp, price, "added record");
        Ok(())
    }

    /// Remove a record from both indexes and hand it back, history included.
    pub fn remove_record(&mut self, id: &str) -> Result<StockRecord> {
        let (record_at, price_at) = self.locate(id)?;

        self.by_price.delete(price_at)?;
        let record = self.by_id.delete(record_at)?;

        debug!(id, price = record.price(), "removed record");
        Ok(record)
    }

    /// Move a record's price by `delta` and log the change at `timestamp`.
    ///
    /// Returns the new price. Several events may share a timestamp.
    ///
    /// # Errors
    ///
    /// `InvalidTimestamp` if `timestamp < 0`, `ZeroDelta`, `UnknownRecord`,
    /// or `PriceOverflow` if the new price does not fit in an `i64`.
    pub fn apply_price_delta(&mut self, id: &str, timestamp: i64, delta: i64) -> Result<i64> {
        if timestamp < 0 {
            return reject(IndexError::InvalidTimestamp(timestamp));
        }
        if delta == 0 {
            return reject(IndexError::ZeroDelta);
        }
        let (record_at, price_at) = self.locate(id)?;
        let old = self.record_at(record_at)?.price();
        let Some(new) = price::checked_add(old, delta) else {
            return reject(IndexError::PriceOverflow {
                id: id.to_string(),
                delta,
            });
        };

        let record = self
            .by_id
            .value_mut(record_at)
            .ok_or(TreeError::UnknownNode(record_at))?;
        record.push_event(timestamp, delta, new);
        self.reprice(price_at, id, new)?;

        debug!(id, timestamp, delta, old, new, "applied price delta");
        Ok(new)
    }

    /// Drop the event at `timestamp` and take its delta back out of the
    /// price. Returns the new price.
    ///
    /// With several events at one timestamp the earliest recorded goes first.
    ///
    /// # Errors
    ///
    /// `UnknownRecord`, `UnknownEvent` if the record has no event at
    /// `timestamp`, `BootstrapEvent` if it is the listing event.
    pub fn remove_event(&mut self, id: &str, timestamp: i64) -> Result<i64> {
        let (record_at, price_at) = self.locate(id)?;
        let record = self.record_at(record_at)?;

        let Some(delta) = record.event_at(timestamp) else {
            return reject(IndexError::UnknownEvent {
                id: id.to_string(),
                timestamp,
            });
        };
        if timestamp == record.listed_at() {
            return reject(IndexError::BootstrapEvent {
                id: id.to_string(),
                timestamp,
            });
        }
        let Some(new) = price::checked_sub(record.price(), delta) else {
            return reject(IndexError::PriceOverflow {
                id: id.to_string(),
                delta: delta.saturating_neg(),
            });
        };

        let record = self
            .by_id
            .value_mut(record_at)
            .ok_or(TreeError::UnknownNode(record_at))?;
        record
            .take_event(timestamp, new)
            .ok_or_else(|| IndexError::UnknownEvent {
                id: id.to_string(),
                timestamp,
            })?;
        self.reprice(price_at, id, new)?;

        debug!(id, timestamp, delta, new, "removed price event");
        Ok(new)
    }

    /// Reposition a record in the price index
    fn reprice(&mut self, price_at: NodeId, id: &str, new: i64) -> Result<()> {
        self.by_price.delete(price_at)?;
        self.by_price.insert(Pair::new(new, id.to_string()), id.to_string());
        Ok(())
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Handles of a record in the identifier and price indexes
    fn locate(&self, id: &str) -> Result<(NodeId, NodeId)> {
        let key = id.to_string();
        let Some(record_at) = self.by_id.search(&key) else {
            return reject(IndexError::UnknownRecord(key));
        };
        let price = self.record_at(record_at)?.price();
        let price_at = self
            .by_price
            .search(&Pair::new(price, key))
            .ok_or_else(|| TreeError::Invariant(format!("record {id:?} is missing from the price index")))?;
        Ok((record_at, price_at))
    }

    fn record_at(&self, handle: NodeId) -> Result<&StockRecord> {
        Ok(self.by_id.value(handle).ok_or(TreeError::UnknownNode(handle))?)
    }

    /// Current price of a record
    pub fn get_price(&self, id: &str) -> Result<i64> {
        match self.record(id) {
            Some(record) => Ok(record.price()),
            None => reject(IndexError::UnknownRecord(id.to_string())),
        }
    }

    pub fn record(&self, id: &str) -> Option<&StockRecord> {
        let handle = self.by_id.search(&id.to_string())?;
        self.by_id.value(handle)
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.record(id).is_some()
    }

    /// Price events of a record in ascending timestamp order
    pub fn history(&self, id: &str) -> Result<Vec<PriceEvent>> {
        match self.record(id) {
            Some(record) => Ok(record.events().collect()),
            None => reject(IndexError::UnknownRecord(id.to_string())),
        }
    }

    /// Number of indexed records
    #[inline]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Records in identifier order
    pub fn records(&self) -> impl Iterator<Item = &StockRecord> + '_ {
        self.by_id.iter().map(|(_, record)| record)
    }

    // ========================================================================
    // Price Ranges
    // ========================================================================

    /// Number of records with `lo <= price <= hi`
    pub fn count_in_price_range(&self, lo: i64, hi: i64) -> Result<usize> {
        if hi < lo {
            return reject(IndexError::InvertedRange { lo, hi });
        }
        Ok(self
            .by_price
            .count_range_by(|key| key.primary >= lo, |key| key.primary > hi))
    }

    /// Identifiers with `lo <= price <= hi`, ascending by price, ties by
    /// identifier
    pub fn list_in_price_range(&self, lo: i64, hi: i64) -> Result<Vec<String>> {
        if hi < lo {
            return reject(IndexError::InvertedRange { lo, hi });
        }
        let Some(span) = self
            .by_price
            .span_by(|key| key.primary >= lo, |key| key.primary > hi)
        else {
            return Ok(Vec::new());
        };

        Ok(self
            .by_price
            .collect_span(&span)
            .into_iter()
            .filter_map(|handle| self.by_price.value(handle).cloned())
            .collect())
    }

    // ========================================================================
    // State Root
    // ========================================================================

    /// SHA-256 over every record in identifier order.
    ///
    /// Per record: identifier length (u64 LE), identifier bytes, price,
    /// listing timestamp, event count, then each event's timestamp and
    /// delta, all little-endian.
    pub fn state_root(&self) -> [u8; 32] {
        let mut data = Vec::with_capacity(self.len() * 64);
        for (id, record) in self.by_id.iter() {
            data.extend_from_slice(&(id.len() as u64).to_le_bytes());
            data.extend_from_slice(id.as_bytes());
            data.extend_from_slice(&record.price().to_le_bytes());
            data.extend_from_slice(&record.listed_at().to_le_bytes());
            data.extend_from_slice(&(record.event_count() as u64).to_le_bytes());
            for event in record.events() {
                data.extend_from_slice(&event.timestamp.to_le_bytes());
                data.extend_from_slice(&event.delta.to_le_bytes());
            }
        }
        IndexSummary::compute_hash(&data)
    }

    pub fn summary(&self) -> IndexSummary {
        let events: usize = self.records().map(StockRecord::event_count).sum();
        IndexSummary::new(self.len() as u64, events as u64, self.state_root())
    }

    // ========================================================================
    // Consistency
    // ========================================================================

    /// Check both trees, every event tree, and that the two indexes agree
    pub fn check_invariants(&self) -> Result<()> {
        self.by_id.check_invariants()?;
        self.by_price.check_invariants()?;

        if self.by_id.len() != self.by_price.len() {
            return Err(TreeError::Invariant(format!(
                "identifier index holds {} records, price index {}",
                self.by_id.len(),
                self.by_price.len()
            ))
            .into());
        }

        for (id, record) in self.by_id.iter() {
            record.events_tree().check_invariants()?;

            if record.id() != id {
                return Err(TreeError::Invariant(format!("record {:?} filed under {id:?}", record.id())).into());
            }
            let total: i128 = record.events().map(|event| i128::from(event.delta)).sum();
            if total != i128::from(record.price()) {
                return Err(TreeError::Invariant(format!(
                    "events of {id:?} sum to {total}, price is {}",
                    record.price()
                ))
                .into());
            }
            let listed = self.by_price.search(&Pair::new(record.price(), id.clone()));
            if listed.and_then(|handle| self.by_price.value(handle)) != Some(id) {
                return Err(TreeError::Invariant(format!("record {id:?} is missing from the price index")).into());
            }
        }
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::price::to_fixed;

    fn px(s: &str) -> i64 {
        to_fixed(s).unwrap()
    }

    /// A@100, B@50, C@150 listed at 1, 2, 3
    fn scenario() -> IndexManager {
        let mut index = IndexManager::new();
        index.add_record("A", 1, px("100")).unwrap();
        index.add_record("B", 2, px("50")).unwrap();
        index.add_record("C", 3, px("150")).unwrap();
        index
    }

    #[test]
    fn test_scenario_range_after_adds() {
        let index = scenario();

        assert_eq!(index.count_in_price_range(px("60"), px("160")).unwrap(), 2);
        assert_eq!(index.list_in_price_range(px("60"), px("160")).unwrap(), vec!["A", "C"]);
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_scenario_delta_moves_into_range() {
        let mut index = scenario();

        let new = index.apply_price_delta("B", 4, px("20")).unwrap();

        assert_eq!(new, px("70"));
        assert_eq!(index.get_price("B").unwrap(), px("70"));
        assert_eq!(index.count_in_price_range(px("60"), px("160")).unwrap(), 3);
        assert_eq!(index.list_in_price_range(px("60"), px("160")).unwrap(), vec!["B", "A", "C"]);
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_scenario_bootstrap_event_is_permanent() {
        let mut index = scenario();
        let before = index.state_root();

        let err = index.remove_event("A", 1).unwrap_err();

        assert_eq!(
            err,
            IndexError::BootstrapEvent {
                id: "A".to_string(),
                timestamp: 1
            }
        );
        assert_eq!(index.get_price("A").unwrap(), px("100"));
        assert_eq!(index.state_root(), before);
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_scenario_remove_record() {
        let mut index = scenario();

        let removed = index.remove_record("A").unwrap();

        assert_eq!(removed.id(), "A");
        assert_eq!(removed.price(), px("100"));
        assert_eq!(index.get_price("A"), Err(IndexError::UnknownRecord("A".to_string())));
        assert_eq!(index.list_in_price_range(px("0.01"), px("1000")).unwrap(), vec!["B", "C"]);
        assert_eq!(index.len(), 2);
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_add_record_validation() {
        let mut index = scenario();
        let before = index.state_root();

        assert_eq!(index.add_record("D", 0, px("1")), Err(IndexError::InvalidTimestamp(0)));
        assert_eq!(index.add_record("D", -5, px("1")), Err(IndexError::InvalidTimestamp(-5)));
        assert_eq!(index.add_record("D", 1, 0), Err(IndexError::InvalidPrice(0)));
        assert_eq!(index.add_record("D", 1, -px("3")), Err(IndexError::InvalidPrice(-px("3"))));
        assert_eq!(index.add_record("A", 9, px("1")), Err(IndexError::DuplicateRecord("A".to_string())));

        assert_eq!(index.len(), 3);
        assert_eq!(index.state_root(), before);
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_apply_price_delta_validation() {
        let mut index = scenario();
        let before = index.state_root();

        assert_eq!(index.apply_price_delta("A", -1, px("1")), Err(IndexError::InvalidTimestamp(-1)));
        assert_eq!(index.apply_price_delta("A", 5, 0), Err(IndexError::ZeroDelta));
        assert_eq!(index.apply_price_delta("Z", 5, px("1")), Err(IndexError::UnknownRecord("Z".to_string())));
        assert_eq!(
            index.apply_price_delta("A", 5, i64::MAX),
            Err(IndexError::PriceOverflow {
                id: "A".to_string(),
                delta: i64::MAX
            })
        );

        assert_eq!(index.state_root(), before);
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_apply_price_delta_at_time_zero() {
        let mut index = scenario();

        assert_eq!(index.apply_price_delta("A", 0, -px("10")).unwrap(), px("90"));
        // An event before the listing is still not the bootstrap event
        assert_eq!(index.remove_event("A", 0).unwrap(), px("100"));
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_event_reverses_delta() {
        let mut index = scenario();
        index.apply_price_delta("C", 10, -px("100")).unwrap();
        index.apply_price_delta("C", 11, px("5")).unwrap();
        assert_eq!(index.list_in_price_range(px("40"), px("60")).unwrap(), vec!["B", "C"]);

        let new = index.remove_event("C", 10).unwrap();

        assert_eq!(new, px("155"));
        assert_eq!(index.list_in_price_range(px("40"), px("60")).unwrap(), vec!["B"]);
        let timestamps: Vec<i64> = index.history("C").unwrap().iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![3, 11]);
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_event_validation() {
        let mut index = scenario();

        assert_eq!(index.remove_event("Z", 1), Err(IndexError::UnknownRecord("Z".to_string())));
        assert_eq!(
            index.remove_event("A", 42),
            Err(IndexError::UnknownEvent {
                id: "A".to_string(),
                timestamp: 42
            })
        );
    }

    #[test]
    fn test_events_sharing_a_timestamp() {
        let mut index = scenario();
        index.apply_price_delta("A", 7, px("1")).unwrap();
        index.apply_price_delta("A", 7, px("2")).unwrap();

        assert_eq!(index.remove_event("A", 7).unwrap(), px("102"));
        assert_eq!(index.remove_event("A", 7).unwrap(), px("100"));
        assert!(index.remove_event("A", 7).is_err());
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_range_validation_and_edges() {
        let index = scenario();

        assert_eq!(
            index.count_in_price_range(px("10"), px("5")),
            Err(IndexError::InvertedRange { lo: px("10"), hi: px("5") })
        );
        assert!(index.list_in_price_range(px("10"), px("5")).is_err());
        assert_eq!(index.count_in_price_range(px("151"), px("999")).unwrap(), 0);
        assert!(index.list_in_price_range(px("1"), px("49")).unwrap().is_empty());
        assert_eq!(index.count_in_price_range(px("50"), px("50")).unwrap(), 1);
        assert_eq!(index.count_in_price_range(i64::MIN, i64::MAX).unwrap(), 3);
    }

    #[test]
    fn test_equal_prices_order_by_identifier() {
        let mut index = IndexManager::new();
        for id in ["MSFT", "AAPL", "GOOG"] {
            index.add_record(id, 1, px("100")).unwrap();
        }
        index.add_record("AMZN", 1, px("99")).unwrap();

        assert_eq!(
            index.list_in_price_range(px("99"), px("100")).unwrap(),
            vec!["AMZN", "AAPL", "GOOG", "MSFT"]
        );
    }

    #[test]
    fn test_history_and_summary() {
        let mut index = scenario();
        index.apply_price_delta("A", 9, px("1")).unwrap();

        let history = index.history("A").unwrap();
        assert_eq!(
            history,
            vec![
                PriceEvent { timestamp: 1, delta: px("100") },
                PriceEvent { timestamp: 9, delta: px("1") },
            ]
        );
        assert!(index.history("Z").is_err());

        let summary = index.summary();
        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.event_count, 4);
        assert_eq!(summary.state_root, index.state_root());
    }

    #[test]
    fn test_state_root_tracks_content() {
        let mut a = scenario();
        let mut b = IndexManager::with_capacity(16);
        b.add_record("C", 3, px("150")).unwrap();
        b.add_record("A", 1, px("100")).unwrap();
        b.add_record("B", 2, px("50")).unwrap();

        // Insertion order does not matter
        assert_eq!(a.state_root(), b.state_root());

        a.apply_price_delta("A", 5, px("1")).unwrap();
        assert_ne!(a.state_root(), b.state_root());

        b.apply_price_delta("A", 5, px("1")).unwrap();
        assert_eq!(a.state_root(), b.state_root());
    }

    #[test]
    fn test_empty_manager() {
        let index = IndexManager::default();

        assert!(index.is_empty());
        assert!(!index.contains("A"));
        assert!(index.record("A").is_none());
        assert_eq!(index.count_in_price_range(0, i64::MAX).unwrap(), 0);
        assert!(index.summary().is_empty());
        index.check_invariants().unwrap();
    }
}
