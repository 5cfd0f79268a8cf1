/// Append-only race storage with a per-player index.
///
/// Races are identified by their position in the store. Players are keyed by
/// name and kept in first-seen order, which is the order every player list
/// produced here comes out in.
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::IngestError;
use crate::types::{PlayerEntry, RaceRecord};

#[derive(Debug, Default)]
pub struct RecordStore {
    races: Vec<RaceRecord>,
    players: Vec<PlayerEntry>,
    player_index: HashMap<String, usize>,
    active_goal: String,
    /// Records dropped by the finish-order check since the last clear.
    rejected: usize,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a race and index its entrants.
    ///
    /// The recorded flag is not checked here; see [`ingest_recorded_batch`].
    /// Returns whether any entrant was seen for the first time.
    ///
    /// [`ingest_recorded_batch`]: RecordStore::ingest_recorded_batch
    pub fn ingest(&mut self, record: RaceRecord) -> Result<bool, IngestError> {
        record.check_finish_order()?;

        let race_idx = self.races.len();
        let mut new_players_added = false;

        for entrant in &record.entrants {
            let player_idx = match self.player_index.get(&entrant.player.name) {
                Some(&idx) => idx,
                None => {
                    new_players_added = true;
                    let idx = self.players.len();
                    self.player_index.insert(entrant.player.name.clone(), idx);
                    self.players.push(PlayerEntry::new(entrant.player.clone()));
                    idx
                }
            };
            let entry = &mut self.players[player_idx];
            entry.races.insert(race_idx);
            entry.goals.insert(record.goal.clone());
        }

        self.races.push(record);
        Ok(new_players_added)
    }

    /// Ingest every recorded race in `records`, skipping unrecorded ones.
    ///
    /// All eligible records are ingested even after one has reported new
    /// players. Records that fail the finish-order check are logged, counted in
    /// [`rejected_count`](RecordStore::rejected_count) and skipped.
    pub fn ingest_recorded_batch(&mut self, records: Vec<RaceRecord>) -> bool {
        let mut new_players_added = false;
        let mut ingested = 0usize;

        for record in records.into_iter().filter(|r| r.recorded) {
            match self.ingest(record) {
                Ok(added) => {
                    new_players_added |= added;
                    ingested += 1;
                }
                Err(e) => {
                    self.rejected += 1;
                    warn!(error = %e, "skipping race record");
                }
            }
        }

        debug!(
            ingested,
            rejected = self.rejected,
            total_races = self.races.len(),
            new_players_added,
            "ingested recorded batch"
        );
        new_players_added
    }

    /// Drop all races, all players and the active goal.
    pub fn clear(&mut self) {
        self.active_goal.clear();
        self.races.clear();
        self.players.clear();
        self.player_index.clear();
        self.rejected = 0;
    }

    /// Names of players who have raced under `goal`, in first-seen order.
    pub fn players_for_goal(&self, goal: &str) -> Vec<String> {
        self.players
            .iter()
            .filter(|p| p.goals.contains(goal))
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Number of stored races per goal, in the order goals were first seen.
    pub fn goal_race_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for race in &self.races {
            match positions.get(race.goal.as_str()) {
                Some(&pos) => counts[pos].1 += 1,
                None => {
                    positions.insert(race.goal.as_str(), counts.len());
                    counts.push((race.goal.clone(), 1));
                }
            }
        }
        counts
    }

    pub fn active_goal(&self) -> &str {
        &self.active_goal
    }

    pub fn set_active_goal(&mut self, goal: &str) {
        self.active_goal = goal.to_string();
    }

    pub fn player(&self, name: &str) -> Option<&PlayerEntry> {
        self.player_index.get(name).map(|&idx| &self.players[idx])
    }

    pub fn race(&self, idx: usize) -> Option<&RaceRecord> {
        self.races.get(idx)
    }

    pub fn race_count(&self) -> usize {
        self.races.len()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::{Entrant, PlayerProfile};

    /// Recorded race with every listed player finishing in order.
    pub(crate) fn finished_race(goal: &str, players: &[&str]) -> RaceRecord {
        RaceRecord {
            name: format!("test/{goal}-{}", players.join("-")),
            goal: goal.to_string(),
            entrants: players
                .iter()
                .enumerate()
                .map(|(i, p)| Entrant::finished(PlayerProfile::named(*p), i as u32 + 1))
                .collect(),
            recorded: true,
            ended_at: None,
        }
    }

    #[test]
    fn test_ingest_indexes_races_and_goals() {
        let mut store = RecordStore::new();
        assert!(store.ingest(finished_race("any%", &["alice", "bob"])).unwrap());
        assert!(store.ingest(finished_race("100%", &["bob", "carol"])).unwrap());

        assert_eq!(store.race_count(), 2);
        assert_eq!(store.player_count(), 3);

        let bob = store.player("bob").unwrap();
        assert_eq!(bob.races.iter().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert!(bob.goals.contains("any%") && bob.goals.contains("100%"));

        let alice = store.player("alice").unwrap();
        assert_eq!(alice.races.len(), 1);
        assert!(!alice.goals.contains("100%"));
    }

    #[test]
    fn test_ingest_reports_only_unseen_players() {
        let mut store = RecordStore::new();
        assert!(store.ingest(finished_race("any%", &["alice", "bob"])).unwrap());
        assert!(!store.ingest(finished_race("any%", &["bob", "alice"])).unwrap());
        assert!(store.ingest(finished_race("any%", &["bob", "dave"])).unwrap());
    }

    #[test]
    fn test_batch_filters_unrecorded_races() {
        let mut store = RecordStore::new();
        let mut unrecorded = finished_race("any%", &["alice", "zed"]);
        unrecorded.recorded = false;

        let batch = vec![unrecorded, finished_race("any%", &["alice", "bob"])];
        let added = store.ingest_recorded_batch(batch);
        assert!(added);
        assert_eq!(store.race_count(), 1);
        assert!(store.player("zed").is_none());
    }

    #[test]
    fn test_batch_does_not_stop_after_first_new_player() {
        let mut store = RecordStore::new();
        let batch = vec![
            finished_race("any%", &["alice", "bob"]),
            finished_race("any%", &["alice", "bob"]),
            finished_race("any%", &["carol", "dave"]),
        ];
        assert!(store.ingest_recorded_batch(batch));
        assert_eq!(store.race_count(), 3);
        assert!(store.player("carol").is_some(), "later records must still be ingested");
        assert!(store.player("dave").is_some());
    }

    #[test]
    fn test_batch_skips_unordered_record_and_continues() {
        let mut store = RecordStore::new();
        let mut bad = finished_race("any%", &["alice", "bob"]);
        bad.entrants[0].place = Some(3);

        store.ingest_recorded_batch(vec![bad, finished_race("any%", &["carol", "dave"])]);
        assert_eq!(store.race_count(), 1);
        assert!(store.player("alice").is_none());
        assert!(store.player("carol").is_some());
        assert_eq!(store.rejected_count(), 1);

        store.clear();
        assert_eq!(store.rejected_count(), 0);
    }

    #[test]
    fn test_reingesting_batch_adds_no_players() {
        let mut store = RecordStore::new();
        let batch = vec![
            finished_race("any%", &["alice", "bob"]),
            finished_race("any%", &["bob", "carol"]),
        ];
        assert!(store.ingest_recorded_batch(batch.clone()));
        let players_before = store.player_count();

        assert!(!store.ingest_recorded_batch(batch));
        assert_eq!(store.player_count(), players_before);

        // Each delivered record is a new race; every index appears once per player.
        assert_eq!(store.race_count(), 4);
        let bob = store.player("bob").unwrap();
        assert_eq!(bob.races.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut store = RecordStore::new();
        store.ingest(finished_race("any%", &["alice", "bob"])).unwrap();
        store.set_active_goal("any%");

        store.clear();
        assert_eq!(store.race_count(), 0);
        assert_eq!(store.player_count(), 0);
        assert_eq!(store.active_goal(), "");
        assert!(store.players_for_goal("any%").is_empty());
        assert!(store.ingest(finished_race("any%", &["alice"])).unwrap());
    }

    #[test]
    fn test_players_for_goal_in_first_seen_order() {
        let mut store = RecordStore::new();
        store.ingest(finished_race("any%", &["carol", "alice"])).unwrap();
        store.ingest(finished_race("100%", &["bob"])).unwrap();
        store.ingest(finished_race("any%", &["bob", "alice"])).unwrap();

        assert_eq!(store.players_for_goal("any%"), vec!["carol", "alice", "bob"]);
        assert_eq!(store.players_for_goal("100%"), vec!["bob"]);
        assert!(store.players_for_goal("glitchless").is_empty());
    }

    #[test]
    fn test_goal_race_counts() {
        let mut store = RecordStore::new();
        store.ingest(finished_race("any%", &["a", "b"])).unwrap();
        store.ingest(finished_race("100%", &["a", "b"])).unwrap();
        store.ingest(finished_race("any%", &["a", "c"])).unwrap();

        assert_eq!(
            store.goal_race_counts(),
            vec![("any%".to_string(), 2), ("100%".to_string(), 1)]
        );
    }
}
