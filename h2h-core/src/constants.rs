/// Win rate assigned to an empty record (no shared races) when ranking.
///
/// Deliberately below 0.5 so that "never raced" sorts below an even record.
pub const EMPTY_RECORD_WIN_RATE: f64 = 0.25;

/// Progress is reported in tenths of a percent: ⌊page / total × 1000⌋ / 10.
pub const PROGRESS_RESOLUTION: u64 = 1000;

/// Progress value of a finished load.
pub const PROGRESS_COMPLETE: f64 = 100.0;

/// Page queried to learn the total page count of a category.
pub const FIRST_PAGE: u32 = 1;
