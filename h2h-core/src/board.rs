/// Presentation-facing state: the record store, the live session, and the
/// last committed table and ranking.
///
/// All reads are synchronous and return whatever the live session last
/// committed. Writes from a superseded session are refused by token.
use tracing::{debug, info, warn};

use crate::constants::PROGRESS_COMPLETE;
use crate::error::SourceError;
use crate::ranking::rank_with_scores;
use crate::session::{LoadSession, SessionManager, SessionState, SessionToken};
use crate::store::RecordStore;
use crate::table::build_table;
use crate::types::{MatchupTable, PlayerEntry, RaceRecord};

/// Result of offering a page of records to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Records were ingested; the board is now at `version`.
    Applied { version: u64, new_players_added: bool },
    /// The committing session is no longer live. Nothing changed.
    Stale,
}

#[derive(Debug)]
pub struct MatchupBoard {
    store: RecordStore,
    sessions: SessionManager,
    table: MatchupTable,
    ranking: Vec<(String, f64)>,
    progress: f64,
    /// Bumped on every accepted commit and goal change.
    version: u64,
    state: SessionState,
    notice: Option<String>,
}

impl Default for MatchupBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchupBoard {
    pub fn new() -> Self {
        MatchupBoard {
            store: RecordStore::new(),
            sessions: SessionManager::default(),
            table: MatchupTable::new(),
            ranking: Vec::new(),
            progress: 0.0,
            version: 0,
            state: SessionState::Idle,
            notice: None,
        }
    }

    /// Begin loading `slug`. Supersedes any running session and resets all
    /// data, including the active goal.
    pub fn start_session(&mut self, slug: &str) -> LoadSession {
        let (token, handle) = self.sessions.start();
        self.store.clear();
        self.table.clear();
        self.ranking.clear();
        self.progress = 0.0;
        self.state = SessionState::Loading;
        self.notice = None;
        info!(token, slug, "starting load session");
        LoadSession::new(token, slug, handle)
    }

    pub fn is_live(&self, token: SessionToken) -> bool {
        self.sessions.is_live(token)
    }

    /// Ingest a page of records on behalf of session `token`.
    ///
    /// Records rejected for out-of-order entrants are reported through
    /// [`last_notice`](MatchupBoard::last_notice) with a running count.
    pub fn commit(
        &mut self,
        token: SessionToken,
        records: Vec<RaceRecord>,
        progress: f64,
    ) -> CommitOutcome {
        if !self.is_live(token) {
            debug!(token, records = records.len(), "refusing commit from stale session");
            return CommitOutcome::Stale;
        }
        let rejected_before = self.store.rejected_count();
        let new_players_added = self.store.ingest_recorded_batch(records);
        let rejected = self.store.rejected_count();
        if rejected > rejected_before {
            let plural = if rejected == 1 { "" } else { "s" };
            self.notice = Some(format!(
                "{rejected} race record{plural} skipped: entrants not in finish order"
            ));
        }
        self.progress = progress;
        self.refresh();
        CommitOutcome::Applied { version: self.version, new_players_added }
    }

    pub(crate) fn complete(&mut self, token: SessionToken) {
        if self.is_live(token) {
            self.state = SessionState::Complete;
            self.progress = PROGRESS_COMPLETE;
        }
    }

    pub(crate) fn fail(&mut self, token: SessionToken, error: &SourceError) {
        if self.is_live(token) {
            self.state = SessionState::Failed;
            self.notice = Some(format!("loading stopped at {:.1}%: {error}", self.progress));
        }
    }

    /// Select the goal the table and ranking are computed for.
    pub fn set_active_goal(&mut self, goal: &str) {
        if !goal.is_empty() && !self.store.goal_race_counts().iter().any(|(g, _)| g == goal) {
            warn!(goal, "no loaded race uses this goal yet");
        }
        self.store.set_active_goal(goal);
        self.refresh();
    }

    fn refresh(&mut self) {
        self.version += 1;
        let goal = self.store.active_goal();
        if goal.is_empty() {
            self.table.clear();
            self.ranking.clear();
            return;
        }
        let players = self.store.players_for_goal(goal);
        self.table = build_table(&self.store, goal);
        self.ranking = rank_with_scores(&self.table, &players);
    }

    pub fn active_goal(&self) -> &str {
        self.store.active_goal()
    }

    /// Player names, strongest first.
    pub fn current_ranking(&self) -> Vec<&str> {
        self.ranking.iter().map(|(p, _)| p.as_str()).collect()
    }

    /// Player names with their aggregate scores, strongest first.
    pub fn current_scores(&self) -> &[(String, f64)] {
        &self.ranking
    }

    pub fn current_table(&self) -> &MatchupTable {
        &self.table
    }

    pub fn load_progress(&self) -> f64 {
        self.progress
    }

    /// Number of players in the current ranking.
    pub fn participant_count(&self) -> usize {
        self.ranking.len()
    }

    pub fn race_count(&self) -> usize {
        self.store.race_count()
    }

    pub fn goal_race_counts(&self) -> Vec<(String, usize)> {
        self.store.goal_race_counts()
    }

    pub fn player(&self, name: &str) -> Option<&PlayerEntry> {
        self.store.player(name)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Records skipped by the finish-order check during this session.
    pub fn rejected_count(&self) -> usize {
        self.store.rejected_count()
    }

    /// Last non-fatal problem, e.g. a failed page fetch or skipped records.
    pub fn last_notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::finished_race;
    use crate::types::MatchupRecord;

    #[test]
    fn test_new_board_is_idle_and_empty() {
        let board = MatchupBoard::new();
        assert_eq!(board.state(), SessionState::Idle);
        assert!(board.current_ranking().is_empty());
        assert!(board.current_table().is_empty());
        assert_eq!(board.participant_count(), 0);
        assert_eq!(board.load_progress(), 0.0);
    }

    #[test]
    fn test_commit_refreshes_table_for_active_goal() {
        let mut board = MatchupBoard::new();
        let session = board.start_session("alpha");
        assert_eq!(board.state(), SessionState::Loading);

        // No goal selected: data is stored but nothing is tabulated.
        let outcome =
            board.commit(session.token(), vec![finished_race("any%", &["p1", "p2"])], 50.0);
        assert!(matches!(outcome, CommitOutcome::Applied { new_players_added: true, .. }));
        assert_eq!(board.race_count(), 1);
        assert!(board.current_table().is_empty());

        board.set_active_goal("any%");
        assert_eq!(board.current_ranking(), vec!["p1", "p2"]);
        assert_eq!(board.participant_count(), 2);

        board.commit(session.token(), vec![finished_race("any%", &["p3", "p2"])], 100.0);
        assert_eq!(board.participant_count(), 3);
        assert_eq!(board.current_table()["p3"]["p2"], MatchupRecord::new(1, 0, 0));
        assert_eq!(board.load_progress(), 100.0);
    }

    #[test]
    fn test_goal_switch_recomputes() {
        let mut board = MatchupBoard::new();
        let session = board.start_session("alpha");
        let batch = vec![
            finished_race("any%", &["p1", "p2"]),
            finished_race("100%", &["p2", "p1", "p3"]),
        ];
        board.commit(session.token(), batch, 100.0);

        board.set_active_goal("100%");
        assert_eq!(board.current_ranking(), vec!["p2", "p1", "p3"]);

        board.set_active_goal("any%");
        assert_eq!(board.current_ranking(), vec!["p1", "p2"]);
        assert_eq!(board.goal_race_counts().len(), 2);

        let before = board.version();
        board.set_active_goal("");
        assert!(board.current_table().is_empty());
        assert!(board.version() > before);
    }

    #[test]
    fn test_new_session_resets_board() {
        let mut board = MatchupBoard::new();
        let first = board.start_session("alpha");
        board.commit(first.token(), vec![finished_race("any%", &["p1", "p2"])], 100.0);
        board.set_active_goal("any%");

        let second = board.start_session("beta");
        assert!(first.handle().is_cancelled());
        assert!(!second.handle().is_cancelled());
        assert_eq!(board.race_count(), 0);
        assert_eq!(board.active_goal(), "");
        assert!(board.current_ranking().is_empty());
        assert_eq!(board.load_progress(), 0.0);
    }

    #[test]
    fn test_failure_from_stale_session_is_ignored() {
        let mut board = MatchupBoard::new();
        let old = board.start_session("alpha");
        let _live = board.start_session("beta");

        board.fail(old.token(), &SourceError::Transport("timeout".to_string()));
        assert_eq!(board.state(), SessionState::Loading);
        assert!(board.last_notice().is_none());
    }

    #[test]
    fn test_skipped_records_are_counted_in_notice() {
        let mut board = MatchupBoard::new();
        let session = board.start_session("alpha");
        let mut bad = finished_race("any%", &["p1", "p2"]);
        bad.entrants[0].place = Some(2);
        bad.entrants[1].place = Some(1);

        let batch = vec![bad.clone(), finished_race("any%", &["p1", "p2"])];
        board.commit(session.token(), batch, 50.0);
        assert_eq!(board.race_count(), 1);
        assert_eq!(
            board.last_notice(),
            Some("1 race record skipped: entrants not in finish order")
        );

        board.commit(session.token(), vec![bad], 100.0);
        assert_eq!(board.rejected_count(), 2);
        assert_eq!(
            board.last_notice(),
            Some("2 race records skipped: entrants not in finish order")
        );

        // A clean page leaves the notice in place; a new session clears it.
        board.commit(session.token(), vec![finished_race("any%", &["p2", "p1"])], 100.0);
        assert!(board.last_notice().is_some());
        board.start_session("beta");
        assert!(board.last_notice().is_none());
        assert_eq!(board.rejected_count(), 0);
    }
}
