//! Stock record and its price event history.

use std::fmt;

use crate::tree::Tree;
use crate::types::price::from_fixed;

/// One price change of a record, in fixed-point units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PriceEvent {
    pub timestamp: i64,
    pub delta: i64,
}

/// A stock tracked by the index.
///
/// `events` is keyed by timestamp and holds price deltas. The bootstrap
/// event at `listed_at` carries the initial price, so the current price is
/// always the sum of all recorded deltas.
#[derive(Debug, Clone)]
pub struct StockRecord {
    id: String,
    price: i64,
    listed_at: i64,
    events: Tree<i64, i64>,
}

impl StockRecord {
    pub(crate) fn new(id: String, listed_at: i64, price: i64) -> Self {
        let mut events = Tree::new();
        events.insert(listed_at, price);
        Self {
            id,
            price,
            listed_at,
            events,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current price (fixed-point)
    #[inline]
    pub fn price(&self) -> i64 {
        self.price
    }

    /// Timestamp of the bootstrap event
    #[inline]
    pub fn listed_at(&self) -> i64 {
        self.listed_at
    }

    /// Number of events, bootstrap included
    #[inline]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Events in ascending timestamp order
    pub fn events(&self) -> impl Iterator<Item = PriceEvent> + '_ {
        self.events.iter().map(|(&timestamp, &delta)| PriceEvent { timestamp, delta })
    }

    /// Delta recorded at `timestamp`, if any
    pub fn event_at(&self, timestamp: i64) -> Option<i64> {
        self.events
            .search(&timestamp)
            .and_then(|id| self.events.value(id))
            .copied()
    }

    pub(crate) fn events_tree(&self) -> &Tree<i64, i64> {
        &self.events
    }

    /// Record a delta and move the price to `price`
    pub(crate) fn push_event(&mut self, timestamp: i64, delta: i64, price: i64) {
        self.events.insert(timestamp, delta);
        self.price = price;
    }

    /// Drop the event at `timestamp` and move the price to `price`.
    ///
    /// Returns the removed delta; `None` leaves the record untouched.
    pub(crate) fn take_event(&mut self, timestamp: i64, price: i64) -> Option<i64> {
        let handle = self.events.search(&timestamp)?;
        let delta = self.events.delete(handle).ok()?;
        self.price = price;
        Some(delta)
    }
}

impl fmt::Display for StockRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} ({} events)",
            self.id,
            from_fixed(self.price),
            self.events.len()
        )
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
