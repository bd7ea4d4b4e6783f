use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    Catalog, EpisodeDetails, EpisodeGroupDetails, EpisodeGroupList, EpisodeGroupSummary,
    ExternalIds, MovieDetails, SeasonDetails, ShowDetails,
};
use crate::config::CatalogConfig;
use crate::error::{Error, Result};

/// TMDB v3 client
#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: String,
    token: String,
    language: String,
}

impl TmdbClient {
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.resolved_token()?,
            language: config.language.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Catalog request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("language", self.language.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Catalog {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl Catalog for TmdbClient {
    async fn get_show(&self, id: u64) -> Result<ShowDetails> {
        self.get_json(&format!("/tv/{}", id)).await
    }

    async fn get_show_external_ids(&self, id: u64) -> Result<ExternalIds> {
        self.get_json(&format!("/tv/{}/external_ids", id)).await
    }

    async fn get_movie(&self, id: u64) -> Result<MovieDetails> {
        self.get_json(&format!("/movie/{}", id)).await
    }

    async fn get_season(&self, show_id: u64, season_number: u32) -> Result<SeasonDetails> {
        self.get_json(&format!("/tv/{}/season/{}", show_id, season_number))
            .await
    }

    async fn get_episode(
        &self,
        show_id: u64,
        season_number: u32,
        episode_number: u32,
    ) -> Result<EpisodeDetails> {
        self.get_json(&format!(
            "/tv/{}/season/{}/episode/{}",
            show_id, season_number, episode_number
        ))
        .await
    }

    async fn get_episode_groups(&self, show_id: u64) -> Result<Vec<EpisodeGroupSummary>> {
        let list: EpisodeGroupList = self
            .get_json(&format!("/tv/{}/episode_groups", show_id))
            .await?;
        Ok(list.results)
    }

    async fn get_episode_group(&self, group_id: &str) -> Result<EpisodeGroupDetails> {
        self.get_json(&format!("/tv/episode_group/{}", group_id))
            .await
    }
}
