//! Table aggregation.
//!
//! A table holds at most one [`RollEntry`]. New rolls either start the
//! entry, replace it, or are folded into it. History is handled by the
//! store and always gets the unmerged record.

use std::collections::BTreeSet;

use rolltable_protocol::{RollEntry, RollRecord, Visibility};

/// What happened to a table when a roll landed on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The table was empty; it now holds a copy of the roll.
    Started,
    /// The previous entry was discarded and replaced by a copy of the roll.
    /// Mirrors still hold the old entry, so callers must announce a clear
    /// before the new result.
    Reset,
    /// The roll was appended to the existing entry.
    Merged,
}

/// Folds `record` into `table`.
///
/// The entry is replaced rather than extended when `autoclear` is set or
/// when the new roll has a different audience than the entry. Merging
/// across audiences would expose private dice to whoever could see the
/// first roll.
pub fn merge_roll(
    table: &mut Option<RollEntry>,
    record: &RollRecord,
    autoclear: bool,
) -> MergeOutcome {
    let outcome = match table.as_ref() {
        None => MergeOutcome::Started,
        Some(entry) if autoclear || !same_audience(entry, record) => {
            MergeOutcome::Reset
        }
        Some(_) => MergeOutcome::Merged,
    };

    match (outcome, table.as_mut()) {
        (MergeOutcome::Merged, Some(entry)) => {
            // Groups stay separate even when they share a die size.
            entry.dice.extend(record.dice.iter().cloned());
            entry.total += record.total;
            entry.timestamp = record.timestamp;
        }
        _ => *table = Some(RollEntry::from(record)),
    }
    outcome
}

fn same_audience(entry: &RollEntry, record: &RollRecord) -> bool {
    if entry.visibility != record.visibility {
        return false;
    }
    match record.visibility {
        Visibility::Targeted => {
            let a: BTreeSet<_> = entry.targets.iter().collect();
            let b: BTreeSet<_> = record.targets.iter().collect();
            a == b
        }
        Visibility::Public | Visibility::Private => true,
    }
}
