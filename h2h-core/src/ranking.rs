/// Strength ordering of players from a matchup table.
use std::cmp::Ordering;

use crate::constants::EMPTY_RECORD_WIN_RATE;
use crate::types::{MatchupRecord, MatchupTable};

/// Fraction of games won, with draws counting as half a win.
///
/// An empty record returns [`EMPTY_RECORD_WIN_RATE`].
pub fn win_rate(record: &MatchupRecord) -> f64 {
    let total = record.total();
    if total == 0 {
        return EMPTY_RECORD_WIN_RATE;
    }
    (record.wins as f64 + record.draws as f64 / 2.0) / total as f64
}

/// Sum of `player`'s win rates against every other player in `players`.
fn aggregate_score(table: &MatchupTable, player: &str, players: &[String]) -> f64 {
    players
        .iter()
        .filter(|opponent| opponent.as_str() != player)
        .map(|opponent| {
            table
                .get(player)
                .and_then(|row| row.get(opponent))
                .map_or(EMPTY_RECORD_WIN_RATE, win_rate)
        })
        .sum()
}

/// Players paired with their aggregate score, best first.
///
/// The sort is stable, so tied players keep their order from `players`.
pub fn rank_with_scores(table: &MatchupTable, players: &[String]) -> Vec<(String, f64)> {
    let mut scored: Vec<(String, f64)> = players
        .iter()
        .map(|p| (p.clone(), aggregate_score(table, p, players)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored
}

/// Players ordered by aggregate score, best first.
pub fn rank(table: &MatchupTable, players: &[String]) -> Vec<String> {
    rank_with_scores(table, players).into_iter().map(|(p, _)| p).collect()
}
