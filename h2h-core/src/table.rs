/// Full player × player matchup matrix for a goal.
use std::collections::HashMap;

use tracing::debug;

use crate::matchup::compute_matchup;
use crate::store::RecordStore;
use crate::types::MatchupTable;

/// Build the matchup table over every player who raced under `goal`.
///
/// Each unordered pair is computed once; the reverse direction is filled in
/// with the inverse record. Every player gets an inner map, even when empty.
pub fn build_table(store: &RecordStore, goal: &str) -> MatchupTable {
    let players = store.players_for_goal(goal);

    let mut table: MatchupTable = players
        .iter()
        .map(|name| (name.clone(), HashMap::new()))
        .collect();

    let mut computed = 0usize;
    for p1 in &players {
        for p2 in &players {
            if p1 == p2 || table.get(p1).is_some_and(|row| row.contains_key(p2)) {
                continue;
            }
            let Some(matchup) = compute_matchup(store, goal, p1, p2) else { continue };
            computed += 1;

            if let Some(row) = table.get_mut(p1) {
                row.insert(p2.clone(), matchup);
            }
            if let Some(row) = table.get_mut(p2) {
                row.insert(p1.clone(), matchup.inverse());
            }
        }
    }

    debug!(goal, players = players.len(), pairs = computed, "built matchup table");
    table
}
