//! Impact-tag reference handling.
//!
//! Conditions reference formulas by stable id; the comma-joined numeric tag
//! list the outside world exchanges is derived here against the order
//! registry. The only rewrite that ever touches condition rows is `prune`,
//! which drops ids whose formula rows were deleted — renumbering needs no
//! rewrite at all, because orders are derived, not stored.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::order::OrderRegistry;
use crate::row::{ConditionRow, RowId};

/// Parse the textual tag form leniently: split on commas, keep positive
/// decimal values, drop everything else. Duplicate values are preserved
/// here and collapse later when resolved into an id set.
pub fn parse_tags(text: &str) -> Vec<u32> {
    text.split(',')
        .filter_map(|part| part.trim().parse::<u32>().ok())
        .filter(|n| *n > 0)
        .collect()
}

/// Ascending, comma-joined, deduplicated textual form.
pub fn format_tags(mut orders: Vec<u32>) -> String {
    orders.sort_unstable();
    orders.dedup();
    let parts: Vec<String> = orders.iter().map(|n| n.to_string()).collect();
    parts.join(",")
}

/// Resolve seed tag text against the declared order values of the seed
/// formulas. Tags with no matching order are dropped.
pub fn resolve_seed_tags(text: &str, by_order: &FxHashMap<u32, RowId>) -> BTreeSet<RowId> {
    parse_tags(text)
        .into_iter()
        .filter_map(|order| by_order.get(&order).copied())
        .collect()
}

/// Derive a condition's rendered tag list from the live registry.
///
/// Never emits a value absent from the registry: a dangling id (which
/// `prune` removes at the end of every delete) is skipped rather than
/// rendered stale.
pub fn render_tags(impact: &BTreeSet<RowId>, orders: &OrderRegistry) -> String {
    format_tags(
        impact
            .iter()
            .filter_map(|id| orders.order_of(*id))
            .collect(),
    )
}

/// Drop impact references to rows that no longer exist. Returns true if any
/// condition changed. Invoked synchronously as part of every formula delete.
pub fn prune(conditions: &mut [ConditionRow], orders: &OrderRegistry) -> bool {
    let mut changed = false;
    for condition in conditions.iter_mut() {
        let before = condition.impact.len();
        condition.impact.retain(|id| orders.contains(*id));
        changed |= condition.impact.len() != before;
    }
    changed
}
