/// Cancellable, page-by-page loading of a category into a [`MatchupBoard`].
///
/// Exactly one session is live per board. Starting a new one cancels the
/// previous session's handle and mints a fresh token; the old session notices
/// after its next suspension point and stops without touching the board.
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::board::{CommitOutcome, MatchupBoard};
use crate::constants::{FIRST_PAGE, PROGRESS_COMPLETE, PROGRESS_RESOLUTION};
use crate::error::SourceError;
use crate::source::RecordSource;
use crate::types::RaceRecord;

/// Opaque identifier of a load session.
pub type SessionToken = u64;

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancellationHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionState {
    Idle,
    Loading,
    Complete,
    Cancelled,
    Failed,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every page (or every page up to the cutoff) was committed.
    Complete { pages_loaded: u32 },
    /// A newer session took over; nothing from the in-flight page was kept.
    Cancelled,
    /// A page fetch failed. Pages committed before it stay on the board.
    Failed(SourceError),
}

/// Mints tokens and tracks which one is live.
#[derive(Debug, Default)]
pub(crate) struct SessionManager {
    next_token: SessionToken,
    live: Option<(SessionToken, CancellationHandle)>,
}

impl SessionManager {
    /// Cancel the live session, if any, and make a new one live.
    pub(crate) fn start(&mut self) -> (SessionToken, CancellationHandle) {
        if let Some((old, handle)) = self.live.take() {
            handle.cancel();
            debug!(token = old, "superseded load session");
        }
        self.next_token += 1;
        let handle = CancellationHandle::new();
        self.live = Some((self.next_token, handle.clone()));
        (self.next_token, handle)
    }

    pub(crate) fn is_live(&self, token: SessionToken) -> bool {
        matches!(self.live, Some((live, _)) if live == token)
    }
}

/// Progress after `page` of `total` pages, truncated to a tenth of a percent.
pub fn progress_percent(page: u32, total: u32) -> f64 {
    if total == 0 {
        return PROGRESS_COMPLETE;
    }
    let tenths = page as u64 * PROGRESS_RESOLUTION / total as u64;
    tenths as f64 / (PROGRESS_RESOLUTION as f64 / PROGRESS_COMPLETE)
}

/// Keep records up to (not including) the first one that ended before `cutoff`.
/// Returns whether the cutoff was reached.
fn truncate_at_cutoff(
    mut records: Vec<RaceRecord>,
    cutoff: Option<DateTime<Utc>>,
) -> (Vec<RaceRecord>, bool) {
    let Some(cutoff) = cutoff else { return (records, false) };
    match records.iter().position(|r| r.ended_at.is_some_and(|t| t < cutoff)) {
        Some(pos) => {
            records.truncate(pos);
            (records, true)
        }
        None => (records, false),
    }
}

/// One load of a category. Created by [`MatchupBoard::start_session`].
#[derive(Debug)]
pub struct LoadSession {
    token: SessionToken,
    slug: String,
    handle: CancellationHandle,
    cutoff: Option<DateTime<Utc>>,
    state: SessionState,
    cursor: u32,
    total_pages: u32,
    progress: f64,
}

impl LoadSession {
    pub(crate) fn new(token: SessionToken, slug: &str, handle: CancellationHandle) -> Self {
        LoadSession {
            token,
            slug: slug.to_string(),
            handle,
            cutoff: None,
            state: SessionState::Loading,
            cursor: 0,
            total_pages: 0,
            progress: 0.0,
        }
    }

    /// Stop loading at the first race that ended before `cutoff`.
    pub fn with_cutoff(mut self, cutoff: DateTime<Utc>) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn handle(&self) -> &CancellationHandle {
        &self.handle
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Last page requested.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    fn is_stale(&self, board: &RefCell<MatchupBoard>) -> bool {
        self.handle.is_cancelled() || !board.borrow().is_live(self.token)
    }

    fn cancelled(&mut self) -> SessionOutcome {
        self.state = SessionState::Cancelled;
        debug!(
            token = self.token,
            slug = %self.slug,
            page = self.cursor,
            "discarding stale load session"
        );
        SessionOutcome::Cancelled
    }

    fn failed(&mut self, board: &RefCell<MatchupBoard>, error: SourceError) -> SessionOutcome {
        self.state = SessionState::Failed;
        warn!(
            token = self.token,
            slug = %self.slug,
            page = self.cursor,
            error = %error,
            "load session failed"
        );
        board.borrow_mut().fail(self.token, &error);
        SessionOutcome::Failed(error)
    }

    /// Load every page of the category into `board`.
    ///
    /// Pages are requested one at a time, in order. After each fetch the
    /// session checks that it is still live before committing anything.
    /// The board is only borrowed between suspension points.
    ///
    /// The session keeps its final [`state`](LoadSession::state),
    /// [`progress`](LoadSession::progress) and [`cursor`](LoadSession::cursor)
    /// for inspection once this returns. A session runs at most once; later
    /// calls return [`SessionOutcome::Cancelled`] without fetching.
    pub async fn run<S: RecordSource>(
        &mut self,
        source: &S,
        board: &RefCell<MatchupBoard>,
    ) -> SessionOutcome {
        if self.state != SessionState::Loading || self.cursor != 0 {
            debug!(token = self.token, state = ?self.state, "load session already ran");
            return SessionOutcome::Cancelled;
        }
        info!(token = self.token, slug = %self.slug, "load session started");

        self.cursor = FIRST_PAGE;
        let first = source.fetch_page(&self.slug, FIRST_PAGE, false).await;
        if self.is_stale(board) {
            return self.cancelled();
        }
        self.total_pages = match first {
            Ok(page) => page.total_pages,
            Err(e) => return self.failed(board, e),
        };

        let mut pages_loaded = 0;
        for page in FIRST_PAGE..=self.total_pages {
            self.cursor = page;
            let fetched = source.fetch_page(&self.slug, page, true).await;
            if self.is_stale(board) {
                return self.cancelled();
            }
            let fetched = match fetched {
                Ok(p) => p,
                Err(e) => return self.failed(board, e),
            };

            let (records, reached_cutoff) = truncate_at_cutoff(fetched.records, self.cutoff);
            self.progress = progress_percent(page, self.total_pages);

            match board.borrow_mut().commit(self.token, records, self.progress) {
                CommitOutcome::Stale => return self.cancelled(),
                CommitOutcome::Applied { version, .. } => {
                    debug!(
                        token = self.token,
                        page,
                        total = self.total_pages,
                        version,
                        progress = self.progress,
                        "committed page"
                    );
                }
            }
            pages_loaded = page;

            if reached_cutoff {
                debug!(token = self.token, page, "reached cutoff date");
                break;
            }
        }

        self.state = SessionState::Complete;
        self.progress = PROGRESS_COMPLETE;
        board.borrow_mut().complete(self.token);
        info!(token = self.token, slug = %self.slug, pages = pages_loaded, "load session complete");
        SessionOutcome::Complete { pages_loaded }
    }
}
