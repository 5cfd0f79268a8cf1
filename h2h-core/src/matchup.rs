/// Pairwise outcome derivation between two players under one goal.
use std::collections::BTreeSet;

use crate::store::RecordStore;
use crate::types::{EntrantStatus, MatchupRecord};

impl RecordStore {
    /// Indices of races both sets contain whose goal is `goal`.
    fn shared_races_for_goal(
        &self,
        goal: &str,
        a: &BTreeSet<usize>,
        b: &BTreeSet<usize>,
    ) -> Vec<usize> {
        let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        small
            .iter()
            .copied()
            .filter(|idx| large.contains(idx))
            .filter(|&idx| self.race(idx).is_some_and(|race| race.goal == goal))
            .collect()
    }
}

/// Head-to-head record of `player_a` against `player_b` under `goal`.
///
/// Returns `None` when the two names are equal or either player is unknown.
///
/// For every race both entered, the first of the two in finish order decides
/// the result: a finisher takes the win, a non-finisher makes it a draw. The
/// other player's status is not looked at, so a DNF listed ahead of a finisher
/// still counts as a draw.
pub fn compute_matchup(
    store: &RecordStore,
    goal: &str,
    player_a: &str,
    player_b: &str,
) -> Option<MatchupRecord> {
    if player_a == player_b {
        return None;
    }
    let a = store.player(player_a)?;
    let b = store.player(player_b)?;

    let mut matchup = MatchupRecord::default();
    for idx in store.shared_races_for_goal(goal, &a.races, &b.races) {
        let Some(race) = store.race(idx) else { continue };
        let first = race
            .entrants
            .iter()
            .find(|e| e.player.name == player_a || e.player.name == player_b);

        match first {
            Some(e) if e.status == EntrantStatus::DidNotFinish => matchup.draws += 1,
            Some(e) if e.player.name == player_a => matchup.wins += 1,
            Some(_) => matchup.losses += 1,
            None => {}
        }
    }
    Some(matchup)
}
