use crate::error::Result;
use serde::{Deserialize, Serialize};

pub mod tmdb;

pub use tmdb::TmdbClient;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShowDetails {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MovieDetails {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExternalIds {
    #[serde(default)]
    pub imdb_id: Option<String>,
    #[serde(default)]
    pub tvdb_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EpisodeDetails {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    pub season_number: u32,
    pub episode_number: u32,
    #[serde(default)]
    pub air_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SeasonDetails {
    pub season_number: u32,
    #[serde(default)]
    pub episodes: Vec<EpisodeDetails>,
}

/// One entry of a show's list of alternate orderings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EpisodeGroupSummary {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<u32>,
    #[serde(default)]
    pub group_count: u32,
    #[serde(default)]
    pub episode_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EpisodeGroupDetails {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub groups: Vec<EpisodeSubgroup>,
}

/// A sub-group ("season" of the alternate ordering)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EpisodeSubgroup {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub order: Option<u32>,
    #[serde(default)]
    pub episodes: Vec<EpisodeGroupEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EpisodeGroupEntry {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    /// Default-order season, 0 for specials
    #[serde(default)]
    pub season_number: Option<u32>,
    #[serde(default)]
    pub episode_number: Option<u32>,
    /// Zero-based position inside the sub-group
    #[serde(default)]
    pub order: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EpisodeGroupList {
    #[serde(default)]
    pub results: Vec<EpisodeGroupSummary>,
}

/// The external metadata catalog.
///
/// Implementations must return [`crate::error::Error::NotFound`] for missing
/// resources so the resolver can tell them apart from transport failures.
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    async fn get_show(&self, id: u64) -> Result<ShowDetails>;
    async fn get_show_external_ids(&self, id: u64) -> Result<ExternalIds>;
    async fn get_movie(&self, id: u64) -> Result<MovieDetails>;
    async fn get_season(&self, show_id: u64, season_number: u32) -> Result<SeasonDetails>;
    async fn get_episode(
        &self,
        show_id: u64,
        season_number: u32,
        episode_number: u32,
    ) -> Result<EpisodeDetails>;
    async fn get_episode_groups(&self, show_id: u64) -> Result<Vec<EpisodeGroupSummary>>;
    async fn get_episode_group(&self, group_id: &str) -> Result<EpisodeGroupDetails>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_group_payload() {
        let json = r#"{
            "id": "5acf93efc3a368739a0000a9",
            "name": "Production order",
            "groups": [
                {
                    "id": "g1",
                    "name": "Season 1",
                    "order": 1,
                    "episodes": [
                        {"id": 101, "name": "Pilot", "season_number": 1, "episode_number": 2, "order": 0},
                        {"id": 102, "name": null, "season_number": 0, "episode_number": 1, "order": 1}
                    ]
                }
            ]
        }"#;

        let group: EpisodeGroupDetails = serde_json::from_str(json).unwrap();
        assert_eq!(group.groups.len(), 1);
        let entries = &group.groups[0].episodes;
        assert_eq!(entries[0].order, Some(0));
        assert_eq!(entries[1].season_number, Some(0));
        assert_eq!(entries[1].name, None);
    }

    #[test]
    fn test_show_payload_tolerates_missing_fields() {
        let show: ShowDetails = serde_json::from_str(r#"{"id": 1, "name": "Show"}"#).unwrap();
        assert!(show.genres.is_empty());
        assert!(show.first_air_date.is_none());
    }
}
