use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::error::IngestError;

/// How an entrant's race ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntrantStatus {
    Finished,
    DidNotFinish,
}

/// Public profile of a player as reported by the record source.
///
/// `name` is the player's identity everywhere in this crate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerProfile {
    pub id: String,
    pub name: String,
    pub full_name: String,
    pub discriminator: Option<String>,
    pub url: Option<String>,
    /// Avatar image URL. `None` means the player has no avatar.
    pub avatar: Option<String>,
}

impl PlayerProfile {
    /// Profile carrying only a name; the remaining fields are left empty.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        PlayerProfile {
            id: name.clone(),
            full_name: name.clone(),
            name,
            ..Default::default()
        }
    }
}

/// One participant of a race.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entrant {
    pub player: PlayerProfile,
    pub status: EntrantStatus,
    /// Finishing place reported by the source. Absent for entrants that did not finish.
    pub place: Option<u32>,
}

impl Entrant {
    pub fn finished(player: PlayerProfile, place: u32) -> Self {
        Entrant { player, status: EntrantStatus::Finished, place: Some(place) }
    }

    pub fn did_not_finish(player: PlayerProfile) -> Self {
        Entrant { player, status: EntrantStatus::DidNotFinish, place: None }
    }
}

/// A single historical race.
///
/// `entrants` must be in finish order: the source sorts them and this crate
/// relies on it when deciding who beat whom.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RaceRecord {
    /// Source-side race name (e.g. `lozssr/brave-zelda-1234`).
    pub name: String,
    pub goal: String,
    pub entrants: Vec<Entrant>,
    /// Only recorded races count toward statistics.
    pub recorded: bool,
    pub ended_at: Option<DateTime<Utc>>,
}

impl RaceRecord {
    /// Checks the finish-order precondition.
    ///
    /// Every reported place must be greater than or equal to the previous
    /// reported place. Entrants without a place (non-finishers) are not
    /// constrained.
    pub fn check_finish_order(&self) -> Result<(), IngestError> {
        let mut last_place: Option<u32> = None;
        for (position, entrant) in self.entrants.iter().enumerate() {
            let Some(place) = entrant.place else { continue };
            if let Some(previous) = last_place {
                if place < previous {
                    return Err(IngestError::UnorderedEntrants {
                        race: self.name.clone(),
                        position,
                        place,
                        previous,
                    });
                }
            }
            last_place = Some(place);
        }
        Ok(())
    }
}

/// Index entry for a player seen during ingestion.
#[derive(Debug, Clone)]
pub struct PlayerEntry {
    pub profile: PlayerProfile,
    /// Store indices of every race this player entered.
    pub races: BTreeSet<usize>,
    /// Every goal this player has raced under.
    pub goals: HashSet<String>,
}

impl PlayerEntry {
    pub(crate) fn new(profile: PlayerProfile) -> Self {
        PlayerEntry { profile, races: BTreeSet::new(), goals: HashSet::new() }
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }
}

/// Head-to-head tally from the row player's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatchupRecord {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl MatchupRecord {
    pub fn new(wins: u32, losses: u32, draws: u32) -> Self {
        MatchupRecord { wins, losses, draws }
    }

    pub fn total(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// The same record seen from the opponent's side.
    pub fn inverse(&self) -> Self {
        MatchupRecord { wins: self.losses, losses: self.wins, draws: self.draws }
    }
}

/// Player → opponent → record. Never contains a self-entry.
pub type MatchupTable = HashMap<String, HashMap<String, MatchupRecord>>;

/// One page of races from the record source.
#[derive(Debug, Clone, Default)]
pub struct RacePage {
    pub records: Vec<RaceRecord>,
    pub total_pages: u32,
}

/// Category metadata; only used to surface goal options and names.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CategoryInfo {
    pub display_name: String,
    pub external_url: String,
    pub available_goals: Vec<String>,
}
