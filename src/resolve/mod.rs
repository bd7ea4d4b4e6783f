//! Turns a catalog id plus loosely numbered source data into one resolved
//! metadata record.
//!
//! Only transport failures leave this module as errors. A catalog NotFound is
//! absorbed where it happens: a missing episode leaves the title empty, a
//! missing secondary episode drops it, a missing season skips compaction and
//! a missing episode group falls back to default order.

pub mod groups;
pub mod remap;

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, ExternalIds, Genre};
use crate::error::Result;
use crate::library::ShowHistory;
use crate::library::parser::{SourceEpisodeTuple, parse_episode_path};
use groups::{EpisodeGroupPlacementCache, GroupEpisodePlacement, GroupPlacementTable};
use remap::{EpisodeRemapInfo, SeasonRemapPlan, apply_season_remap, plan_season_remap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTvMetadata {
    pub tmdb_id: u64,
    /// None when the catalog no longer knows the show
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub year: Option<i32>,
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<u64>,
    pub genres: Vec<String>,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
    pub season_number: u32,
    pub episode_number: u32,
    pub episode_number2: Option<u32>,
    pub episode_title: Option<String>,
    pub episode_group_id: Option<String>,
    pub episode_remap: Option<EpisodeRemapInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMovieMetadata {
    pub tmdb_id: u64,
    pub title: String,
    pub original_title: Option<String>,
    pub year: Option<i32>,
    pub imdb_id: Option<String>,
    pub genres: Vec<String>,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
}

/// Map a catalog NotFound to `None`, keep every other error
fn not_found_as_none<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

fn year_of(date: Option<&str>) -> Option<i32> {
    date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(|d| d.year())
}

fn genre_names(genres: Vec<Genre>) -> Vec<String> {
    genres.into_iter().map(|g| g.name).collect()
}

/// Raw tuple for a resolution. A range in the source file name fills in a
/// missing `episode2` when it agrees on season and first episode.
fn source_tuple(
    season: u32,
    episode: u32,
    episode2: Option<u32>,
    source_path: Option<&Path>,
) -> SourceEpisodeTuple {
    let parsed_second = source_path
        .and_then(parse_episode_path)
        .map(|p| p.tuple)
        .filter(|t| t.season_number == season && t.episode_number == episode)
        .and_then(|t| t.episode_number2);

    SourceEpisodeTuple::new(season, episode, episode2.or(parsed_second))
}

struct PlacedEpisode {
    primary: GroupEpisodePlacement,
    secondary: Option<GroupEpisodePlacement>,
    group_id: Option<String>,
    episode_remap: Option<EpisodeRemapInfo>,
}

pub struct Resolver<C, H> {
    catalog: C,
    history: H,
    group_cache: EpisodeGroupPlacementCache,
}

impl<C: Catalog, H: ShowHistory> Resolver<C, H> {
    pub fn new(catalog: C, history: H) -> Self {
        Self {
            catalog,
            history,
            group_cache: EpisodeGroupPlacementCache::new(),
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Forget every cached episode-group table
    pub async fn clear_group_cache(&self) {
        self.group_cache.clear().await;
    }

    pub async fn resolve_movie(&self, catalog_id: u64) -> Result<ResolvedMovieMetadata> {
        let movie = self.catalog.get_movie(catalog_id).await?;
        info!(movie = %movie.title, id = catalog_id, "Resolved movie");

        Ok(ResolvedMovieMetadata {
            tmdb_id: movie.id,
            year: year_of(movie.release_date.as_deref()),
            title: movie.title,
            original_title: movie.original_title,
            imdb_id: movie.imdb_id,
            genres: genre_names(movie.genres),
            poster_path: movie.poster_path,
            overview: movie.overview,
        })
    }

    pub async fn resolve_tv(
        &self,
        catalog_id: u64,
        season: u32,
        episode: u32,
        episode2: Option<u32>,
        source_path: Option<&Path>,
    ) -> Result<ResolvedTvMetadata> {
        let raw = source_tuple(season, episode, episode2, source_path);

        let (show, external_ids, placed) = tokio::try_join!(
            async { not_found_as_none(self.catalog.get_show(catalog_id).await) },
            async { not_found_as_none(self.catalog.get_show_external_ids(catalog_id).await) },
            self.place_source_episode(catalog_id, raw),
        )?;

        let ExternalIds { imdb_id, tvdb_id } = external_ids.unwrap_or_default();
        let show = show.unwrap_or_else(|| {
            warn!(id = catalog_id, "Show not found in catalog");
            Default::default()
        });

        let PlacedEpisode {
            primary,
            secondary,
            group_id,
            episode_remap,
        } = placed;

        info!(
            show = %show.name,
            season = primary.season_number,
            episode = primary.episode_number,
            remapped = episode_remap.is_some(),
            group = ?group_id,
            "Resolved episode"
        );

        Ok(ResolvedTvMetadata {
            tmdb_id: catalog_id,
            title: Some(show.name).filter(|n| !n.is_empty()),
            original_title: show.original_name,
            year: year_of(show.first_air_date.as_deref()),
            imdb_id,
            tvdb_id,
            genres: genre_names(show.genres),
            poster_path: show.poster_path,
            overview: show.overview,
            season_number: primary.season_number,
            episode_number: primary.episode_number,
            episode_number2: secondary.map(|s| s.episode_number),
            episode_title: primary.name,
            episode_group_id: group_id,
            episode_remap,
        })
    }

    /// Remap the raw tuple, then place both episodes in the selected ordering
    async fn place_source_episode(
        &self,
        catalog_id: u64,
        raw: SourceEpisodeTuple,
    ) -> Result<PlacedEpisode> {
        let (group_id, plan) = tokio::try_join!(
            self.history.selected_episode_group(catalog_id),
            self.plan_remap(catalog_id, raw),
        )?;

        let (tuple, episode_remap) = apply_season_remap(raw, plan.as_ref());
        if let Some(info) = &episode_remap {
            debug!(
                from = ?info.original,
                to = ?info.remapped,
                "Remapped source episode against catalog count"
            );
        }

        let table = match &group_id {
            Some(id) => {
                let built = self.group_cache.get_or_build(&self.catalog, id).await;
                let table = not_found_as_none(built)?;
                if table.is_none() {
                    warn!(show = catalog_id, group = %id, "Selected episode group not found, using default order");
                }
                table
            }
            None => None,
        };
        // Only report an ordering that was actually applied
        let group_id = group_id.filter(|_| table.is_some());

        let primary = self
            .place_episode(catalog_id, table.as_deref(), tuple.season_number, tuple.episode_number)
            .await?
            .unwrap_or_else(|| GroupEpisodePlacement {
                season_number: tuple.season_number,
                episode_number: tuple.episode_number,
                name: None,
            });

        let secondary = match tuple.episode_number2 {
            Some(second) => self
                .place_episode(catalog_id, table.as_deref(), tuple.season_number, second)
                .await?
                .filter(|p| p.season_number == primary.season_number)
                .filter(|p| p.episode_number > primary.episode_number),
            None => None,
        };

        Ok(PlacedEpisode {
            primary,
            secondary,
            group_id,
            episode_remap,
        })
    }

    async fn plan_remap(
        &self,
        catalog_id: u64,
        raw: SourceEpisodeTuple,
    ) -> Result<Option<SeasonRemapPlan>> {
        let (paths, season) = tokio::try_join!(
            self.history.source_paths(catalog_id),
            async {
                not_found_as_none(
                    self.catalog
                        .get_season(catalog_id, raw.season_number)
                        .await,
                )
            },
        )?;

        let Some(season) = season else {
            debug!(id = catalog_id, season = raw.season_number, "Season not in catalog, no remap");
            return Ok(None);
        };

        let mut tuples: Vec<SourceEpisodeTuple> = paths
            .iter()
            .filter_map(|p| parse_episode_path(p))
            .map(|p| p.tuple)
            .collect();
        tuples.push(raw);

        Ok(plan_season_remap(
            raw.season_number,
            season.episodes.len() as u32,
            &tuples,
        ))
    }

    /// Position of a default-order (season, episode) in the selected group.
    ///
    /// `Ok(None)` means the catalog has no such default episode.
    async fn place_episode(
        &self,
        show_id: u64,
        table: Option<&GroupPlacementTable>,
        season: u32,
        episode: u32,
    ) -> Result<Option<GroupEpisodePlacement>> {
        if let Some(hit) = table.and_then(|t| t.lookup_position(season, episode)) {
            return Ok(Some(hit.clone()));
        }

        let fetched = self.catalog.get_episode(show_id, season, episode).await;
        let Some(default) = not_found_as_none(fetched)? else {
            warn!(show = show_id, season, episode, "Episode not found in catalog");
            return Ok(None);
        };

        let placement = match table.and_then(|t| t.lookup_episode_id(default.id)) {
            Some(placed) => GroupEpisodePlacement {
                season_number: placed.season_number,
                episode_number: placed.episode_number,
                name: placed.name.clone().or(default.name),
            },
            None => GroupEpisodePlacement {
                season_number: season,
                episode_number: episode,
                name: default.name,
            },
        };
        Ok(Some(placement))
    }
}
