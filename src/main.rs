//! Stockbook - demonstration binary.
//!
//! Builds a small index, walks it through adds, price events and removals,
//! and prints range queries and the final summary.

use stockbook::types::price::{from_fixed_trimmed, to_fixed};
use stockbook::IndexManager;

fn px(s: &str) -> i64 {
    to_fixed(s).unwrap_or_default()
}

fn show_range(index: &IndexManager, lo: &str, hi: &str) {
    match index.list_in_price_range(px(lo), px(hi)) {
        Ok(ids) => println!("  [{lo}, {hi}]: {} -> {:?}", ids.len(), ids),
        Err(e) => println!("  [{lo}, {hi}]: ERROR {e}"),
    }
}

fn main() {
    println!("===========================================");
    println!("  Stockbook - 2-3 tree stock index");
    println!("===========================================");
    println!();

    let mut index = IndexManager::with_capacity(16);

    println!("Adding A@100, B@50, C@150...");
    for (id, timestamp, price) in [("A", 1, "100"), ("B", 2, "50"), ("C", 3, "150")] {
        if let Err(e) = index.add_record(id, timestamp, px(price)) {
            println!("  ERROR: {e}");
        }
    }
    show_range(&index, "60", "160");
    println!();

    println!("Moving B by +20...");
    match index.apply_price_delta("B", 4, px("20")) {
        Ok(price) => println!("  B is now {}", from_fixed_trimmed(price)),
        Err(e) => println!("  ERROR: {e}"),
    }
    show_range(&index, "60", "160");
    println!();

    println!("Removing A's listing event...");
    match index.remove_event("A", 1) {
        Ok(price) => println!("  A is now {}", from_fixed_trimmed(price)),
        Err(e) => println!("  rejected: {e}"),
    }
    println!();

    println!("Removing A...");
    match index.remove_record("A") {
        Ok(record) => println!("  removed {record}"),
        Err(e) => println!("  ERROR: {e}"),
    }
    if let Err(e) = index.get_price("A") {
        println!("  price of A: {e}");
    }
    show_range(&index, "0", "1000");
    println!();

    println!("Records:");
    for record in index.records() {
        println!("  {record}");
    }
    println!();

    let summary = index.summary();
    println!("Summary:");
    println!("  records:    {}", summary.record_count);
    println!("  events:     {}", summary.event_count);
    println!("  state root: {}", summary.state_root_hex());
    match ssz_rs::serialize(&summary) {
        Ok(bytes) => println!("  SSZ:        {} bytes", bytes.len()),
        Err(e) => println!("  ERROR: failed to serialize: {e:?}"),
    }

    if let Err(e) = index.check_invariants() {
        println!();
        println!("Invariant check failed: {e}");
    }
}
