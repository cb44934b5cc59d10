//! Gameweek stats refresh.
//!
//! Merges a squad's persisted state with a gameweek's authoritative rows.
//! Players missing from the rows did not play that gameweek: their actual
//! and predicted points drop to zero and everything else carries over.

use crate::player::{PlayerRecord, Squad};
use std::collections::HashMap;

/// Refresh every squad member from `rows`.
///
/// Duplicate rows for one player (two fixtures in a gameweek) resolve to
/// the last occurrence. `bought_for` is never touched. The output always
/// has the same length as the input squad.
pub fn refresh_squad_stats(squad: &Squad, rows: &[PlayerRecord]) -> Squad {
    let latest = latest_rows(rows);

    squad
        .iter()
        .map(|member| {
            let mut updated = member.clone();
            match latest.get(member.name.as_str()) {
                Some(row) => updated.refresh_from(row),
                None      => updated.mark_absent(),
            }
            updated
        })
        .collect()
}

/// Index rows by player name, keeping the last occurrence of each.
pub fn latest_rows(rows: &[PlayerRecord]) -> HashMap<&str, &PlayerRecord> {
    let mut latest = HashMap::with_capacity(rows.len());
    for row in rows {
        latest.insert(row.name.as_str(), row);
    }
    latest
}
