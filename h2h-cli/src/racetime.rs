/// racetime.gg client: race history pages and category metadata.
use chrono::{DateTime, Utc};
use h2h_core::{
    CategoryInfo, CategorySource, Entrant, EntrantStatus, PlayerProfile, RacePage, RaceRecord,
    RecordSource, SourceError,
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://racetime.gg";

/// Entrant status value racetime.gg uses for a forfeit.
const STATUS_DNF: &str = "dnf";

#[derive(Debug, Deserialize)]
struct RaceListData {
    num_pages: u32,
    #[serde(default)]
    races: Vec<RaceData>,
}

#[derive(Debug, Deserialize)]
struct RaceData {
    name: String,
    goal: GoalData,
    #[serde(default)]
    recorded: bool,
    ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    entrants: Vec<EntrantData>,
}

#[derive(Debug, Deserialize)]
struct GoalData {
    name: String,
}

#[derive(Debug, Deserialize)]
struct EntrantData {
    user: UserData,
    status: StatusData,
    place: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct StatusData {
    value: String,
}

#[derive(Debug, Deserialize)]
struct UserData {
    id: String,
    name: String,
    full_name: Option<String>,
    discriminator: Option<String>,
    url: Option<String>,
    avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SlugData {
    name: String,
    url: String,
    #[serde(default)]
    goals: Vec<String>,
}

impl From<UserData> for PlayerProfile {
    fn from(user: UserData) -> Self {
        PlayerProfile {
            full_name: user.full_name.unwrap_or_else(|| user.name.clone()),
            id: user.id,
            name: user.name,
            discriminator: user.discriminator,
            url: user.url,
            avatar: user.avatar,
        }
    }
}

impl From<EntrantData> for Entrant {
    fn from(entrant: EntrantData) -> Self {
        let status = if entrant.status.value == STATUS_DNF {
            EntrantStatus::DidNotFinish
        } else {
            EntrantStatus::Finished
        };
        Entrant {
            player: entrant.user.into(),
            status,
            place: entrant.place,
        }
    }
}

impl From<RaceData> for RaceRecord {
    fn from(race: RaceData) -> Self {
        RaceRecord {
            name: race.name,
            goal: race.goal.name,
            entrants: race.entrants.into_iter().map(Entrant::from).collect(),
            recorded: race.recorded,
            ended_at: race.ended_at,
        }
    }
}

impl From<RaceListData> for RacePage {
    fn from(list: RaceListData) -> Self {
        RacePage {
            records: list.races.into_iter().map(RaceRecord::from).collect(),
            total_pages: list.num_pages,
        }
    }
}

/// HTTP client for one racetime.gg instance.
pub struct RacetimeClient {
    client: Client,
    base_url: String,
}

impl RacetimeClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        RacetimeClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn races_url(&self, slug: &str, page: u32, with_entrants: bool) -> String {
        format!("{}/{slug}/races/data?show_entrants={with_entrants}&page={page}", self.base_url)
    }

    pub fn category_url(&self, slug: &str) -> String {
        format!("{}/{slug}/data", self.base_url)
    }

    /// Absolute link for a site-relative path such as a category's `url`.
    pub fn site_link(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn transport(context: &str, e: impl std::fmt::Display) -> SourceError {
    SourceError::Transport(format!("{context}: {e}"))
}

impl RecordSource for RacetimeClient {
    async fn fetch_page(
        &self,
        slug: &str,
        page: u32,
        with_entrants: bool,
    ) -> Result<RacePage, SourceError> {
        let url = self.races_url(slug, page, with_entrants);
        debug!(%url, "fetching race page");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport("HTTP request failed", e))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(SourceError::InvalidCategory(slug.to_string()));
        }
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(SourceError::Transport(format!("racetime.gg returned {status}: {snippet}")));
        }

        let data: RaceListData = resp
            .json()
            .await
            .map_err(|e| transport("failed to parse race page JSON", e))?;
        Ok(data.into())
    }
}

impl CategorySource for RacetimeClient {
    async fn fetch_category_info(&self, slug: &str) -> Result<CategoryInfo, SourceError> {
        let url = self.category_url(slug);
        debug!(%url, "fetching category data");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport("HTTP request failed", e))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(SourceError::InvalidCategory(slug.to_string()));
        }
        if !resp.status().is_success() {
            return Err(SourceError::Transport(format!("racetime.gg returned {}", resp.status())));
        }

        let data: SlugData = resp
            .json()
            .await
            .map_err(|e| transport("failed to parse category JSON", e))?;
        Ok(CategoryInfo {
            display_name: data.name,
            external_url: self.site_link(&data.url),
            available_goals: data.goals,
        })
    }
}
