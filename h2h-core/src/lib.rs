/// h2h-core: head-to-head matchup engine for race histories.
///
/// Race records go into an append-only store indexed by player. For a chosen
/// goal the engine derives every pairwise win/loss/draw record, lays them out
/// as a symmetric table, and ranks players by their summed win rates.
///
/// Loading is done by [`LoadSession`]s that pull pages from a
/// [`RecordSource`] one at a time. Starting a new session supersedes the old
/// one; whatever the old session fetches afterwards is thrown away.
///
/// # Quick start
///
/// ```rust
/// use h2h_core::{Entrant, MatchupBoard, MatchupRecord, PlayerProfile, RaceRecord};
///
/// let race = RaceRecord {
///     name: "cat/quick-race-0001".to_string(),
///     goal: "any%".to_string(),
///     entrants: vec![
///         Entrant::finished(PlayerProfile::named("alice"), 1),
///         Entrant::finished(PlayerProfile::named("bob"), 2),
///     ],
///     recorded: true,
///     ended_at: None,
/// };
///
/// let mut board = MatchupBoard::new();
/// let session = board.start_session("cat");
/// board.commit(session.token(), vec![race], 100.0);
/// board.set_active_goal("any%");
///
/// assert_eq!(board.current_ranking(), vec!["alice", "bob"]);
/// assert_eq!(board.current_table()["alice"]["bob"], MatchupRecord::new(1, 0, 0));
/// ```

pub mod board;
pub mod constants;
pub mod error;
pub mod matchup;
pub mod ranking;
pub mod session;
pub mod source;
pub mod store;
pub mod table;
pub mod types;

// Re-export primary public API at crate root.
pub use board::{CommitOutcome, MatchupBoard};
pub use error::{IngestError, SourceError};
pub use matchup::compute_matchup;
pub use ranking::{rank, rank_with_scores, win_rate};
pub use session::{
    progress_percent, CancellationHandle, LoadSession, SessionOutcome, SessionState, SessionToken,
};
pub use source::{CategorySource, RecordSource};
pub use store::RecordStore;
pub use table::build_table;
pub use types::{
    CategoryInfo, Entrant, EntrantStatus, MatchupRecord, MatchupTable, PlayerEntry, PlayerProfile,
    RacePage, RaceRecord,
};
