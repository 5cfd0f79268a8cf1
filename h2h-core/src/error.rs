/// Errors reported by a record or category source.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The category slug does not exist upstream.
    #[error("unknown category \"{0}\"")]
    InvalidCategory(String),

    /// The request could not be completed (network, HTTP status, bad body).
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Errors raised while ingesting a race record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    #[error("race {race}: entrant {position} has place {place} after place {previous}; entrants must be in finish order")]
    UnorderedEntrants {
        race: String,
        position: usize,
        place: u32,
        previous: u32,
    },
}
